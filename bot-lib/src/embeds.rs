use crate::{schools::SchoolRecord, selection::render_options};
use poise::serenity_prelude::{Colour, CreateEmbed, User};

pub fn school_options_embed(options: &[String]) -> CreateEmbed {
    CreateEmbed::new()
        .title("Select your school below")
        .description(render_options(options))
}

fn student_field(student: &User) -> String {
    format!("{} - {}", student.tag(), student.id)
}

pub fn joined_school_log_embed(student: &User, school: &SchoolRecord) -> CreateEmbed {
    let mut embed = CreateEmbed::new()
        .title("New school signup!")
        .colour(Colour::DARK_GREEN)
        .field("Student", student_field(student), true)
        .field("School", &school.name, false);

    if let Some(country) = &school.country {
        embed = embed.field("Country", country, true);
    }

    if let Some(website) = school.web_pages.first() {
        embed = embed.url(website);
    }

    embed
}

pub fn left_school_log_embed(student: &User, schools: &[String]) -> CreateEmbed {
    CreateEmbed::new()
        .title("School leave")
        .colour(Colour::ORANGE)
        .field("Student", student_field(student), true)
        .field("Schools", schools.join("\n"), false)
}

pub fn help_embed(title: &str, prefix: &str, help_text: Option<&str>) -> CreateEmbed {
    let description = match help_text {
        Some(help_text) => help_text.to_owned(),
        None => format!(
            "To use these commands, it is pretty self-explanatory.\n\
             `[]` **denotes your input is required.**\n\n\
             `{prefix}school join [school-name]`\n\
             This will fuzzy search a list of known schools for which you can register and gain access to. \
             If your school is not listed, please mention one of the team who will rectify.\n\n\
             `{prefix}school leave`\n\
             This will leave the school you have been registered with."
        ),
    };

    CreateEmbed::new()
        .title(title)
        .colour(Colour::BLUE)
        .description(description)
}
