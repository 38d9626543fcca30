use crate::data::PoiseContext;
use bot_db::guild_settings::GuildSettings;
use color_eyre::eyre::{OptionExt, Result};
use itertools::Itertools;
use poise::{
    CreateReply,
    serenity_prelude::{ChannelType, Colour, CreateEmbed, GuildChannel, Mentionable, Role},
};

/// Moderator settings for school registration
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    required_permissions = "MANAGE_GUILD",
    subcommands(
        "logchannel",
        "defaultrole",
        "category",
        "addschool",
        "removeschool",
        "show"
    ),
    subcommand_required
)]
pub async fn schoolset(_ctx: PoiseContext<'_>) -> Result<()> {
    Ok(())
}

/// Set the channel school signups are logged to, leave empty to stop logging
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    required_permissions = "MANAGE_GUILD"
)]
pub async fn logchannel(
    ctx: PoiseContext<'_>,
    #[description = "A text channel"]
    #[channel_types("Text")]
    channel: Option<GuildChannel>,
) -> Result<()> {
    update_log_channel(ctx, channel).await
}

/// Set the channel school signups are logged to
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    required_permissions = "MANAGE_GUILD"
)]
pub async fn setlogger(
    ctx: PoiseContext<'_>,
    #[description = "A text channel"]
    #[channel_types("Text")]
    channel: Option<GuildChannel>,
) -> Result<()> {
    update_log_channel(ctx, channel).await
}

async fn update_log_channel(ctx: PoiseContext<'_>, channel: Option<GuildChannel>) -> Result<()> {
    let guild_id = ctx.guild_id().ok_or_eyre("Couldn't get guild")?;

    if channel
        .as_ref()
        .is_some_and(|channel| channel.kind != ChannelType::Text)
    {
        ctx.say("The log channel has to be a text channel.").await?;
        return Ok(());
    }

    let channel = channel.map(|channel| channel.id);
    ctx.data()
        .guild_settings
        .set_log_channel(guild_id, channel)?;
    ctx.data().db.flush().await?;

    tracing::info!("{} log channel set to {:?}", guild_id, channel);

    let reply = match channel {
        Some(channel) => format!("School signups are now logged in {}", channel.mention()),
        None => String::from("School signups are no longer logged."),
    };
    ctx.say(reply).await?;

    Ok(())
}

/// Set the role every registered student gets, leave empty to unset
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    required_permissions = "MANAGE_GUILD"
)]
pub async fn defaultrole(
    ctx: PoiseContext<'_>,
    #[description = "The student role"] role: Option<Role>,
) -> Result<()> {
    let guild_id = ctx.guild_id().ok_or_eyre("Couldn't get guild")?;
    let role = role.map(|role| role.id);

    ctx.data().guild_settings.set_default_role(guild_id, role)?;
    ctx.data().db.flush().await?;

    tracing::info!("{} default role set to {:?}", guild_id, role);

    let reply = match role {
        Some(role) => format!("Students will also get {}", role.mention()),
        None => String::from("Students no longer get a default role."),
    };
    ctx.say(reply).await?;

    Ok(())
}

/// Create school channels under one category, leave empty to give each school a category
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    required_permissions = "MANAGE_GUILD"
)]
pub async fn category(
    ctx: PoiseContext<'_>,
    #[description = "A category"]
    #[channel_types("Category")]
    category: Option<GuildChannel>,
) -> Result<()> {
    let guild_id = ctx.guild_id().ok_or_eyre("Couldn't get guild")?;

    if category
        .as_ref()
        .is_some_and(|category| category.kind != ChannelType::Category)
    {
        ctx.say("That isn't a category.").await?;
        return Ok(());
    }

    let category = category.map(|category| category.id);

    ctx.data().guild_settings.set_category(guild_id, category)?;
    ctx.data().db.flush().await?;

    tracing::info!("{} school category set to {:?}", guild_id, category);

    let reply = match category {
        Some(category) => format!(
            "New school channels will be created in {}",
            category.mention()
        ),
        None => String::from("Every new school will get its own category."),
    };
    ctx.say(reply).await?;

    Ok(())
}

/// Add a school that isn't in the school list
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    required_permissions = "MANAGE_GUILD"
)]
pub async fn addschool(
    ctx: PoiseContext<'_>,
    #[description = "The school's full name"]
    #[rest]
    name: String,
) -> Result<()> {
    let guild_id = ctx.guild_id().ok_or_eyre("Couldn't get guild")?;
    let name = name.trim();

    if name.is_empty() {
        ctx.say("Give me the name of the school to add.").await?;
        return Ok(());
    }

    if ctx.data().guild_settings.add_custom_school(guild_id, name)? {
        ctx.data().db.flush().await?;
        tracing::info!("{} added custom school `{}`", guild_id, name);
        ctx.say(format!("Added **{name}**.")).await?;
    } else {
        ctx.say(format!("**{name}** is already on the list.")).await?;
    }

    Ok(())
}

/// Remove a school added with `addschool`
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    required_permissions = "MANAGE_GUILD"
)]
pub async fn removeschool(
    ctx: PoiseContext<'_>,
    #[description = "The school's full name"]
    #[rest]
    name: String,
) -> Result<()> {
    let guild_id = ctx.guild_id().ok_or_eyre("Couldn't get guild")?;
    let name = name.trim();

    if ctx
        .data()
        .guild_settings
        .remove_custom_school(guild_id, name)?
    {
        ctx.data().db.flush().await?;
        tracing::info!("{} removed custom school `{}`", guild_id, name);
        ctx.say(format!("Removed **{name}**.")).await?;
    } else {
        ctx.say(format!("**{name}** isn't on the list.")).await?;
    }

    Ok(())
}

/// Show the current settings
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    required_permissions = "MANAGE_GUILD"
)]
pub async fn show(ctx: PoiseContext<'_>) -> Result<()> {
    let guild_id = ctx.guild_id().ok_or_eyre("Couldn't get guild")?;
    let settings = ctx.data().guild_settings.get(guild_id)?;

    ctx.send(CreateReply::default().embed(settings_embed(&settings)))
        .await?;

    Ok(())
}

fn settings_embed(settings: &GuildSettings) -> CreateEmbed {
    let unset = || String::from("Not set");

    let custom_schools = if settings.custom_schools.is_empty() {
        String::from("None")
    } else {
        settings
            .custom_schools
            .iter()
            .map(|school| format!("- {school}"))
            .join("\n")
    };

    CreateEmbed::new()
        .title("School settings")
        .colour(Colour::BLUE)
        .field(
            "Log channel",
            settings
                .log_channel()
                .map_or_else(unset, |channel| channel.mention().to_string()),
            true,
        )
        .field(
            "Default role",
            settings
                .default_role()
                .map_or_else(unset, |role| role.mention().to_string()),
            true,
        )
        .field(
            "Category",
            settings.category().map_or_else(
                || String::from("One per school"),
                |category| category.mention().to_string(),
            ),
            true,
        )
        .field("Custom schools", custom_schools, false)
}
