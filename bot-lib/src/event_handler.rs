use crate::data::State;
use color_eyre::eyre::{Error, Result};
use poise::serenity_prelude as serenity;

pub async fn event_handler(
    _ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, State, Error>,
    data: &State,
) -> Result<()> {
    match event {
        serenity::FullEvent::Ready { data_about_bot } => {
            let guilds = data_about_bot.guilds.len();
            let schools = match &data.schools {
                crate::lookup::SchoolSource::Local(catalog) => catalog.len().to_string(),
                crate::lookup::SchoolSource::Remote(_) => String::from("remote"),
            };

            tracing::info!(
                "{} is connected to {} guilds, school list: {}",
                data_about_bot.user.name,
                guilds,
                schools
            );
        }
        serenity::FullEvent::Ratelimit { data } => {
            tracing::warn!("Ratelimited: {:?}", data);
        }
        _ => {}
    };

    Ok(())
}
