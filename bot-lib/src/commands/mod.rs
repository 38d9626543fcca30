pub mod help;
pub mod register;
pub mod school;
pub mod settings;

use crate::data::PoiseContext;
use bot_db::guild_settings::GuildSettings;
use bot_traits::ForwardRefToTracing;
use poise::serenity_prelude::{CreateEmbed, CreateMessage};

/// Posts `embed` to the guild's log channel, if it has one.
async fn send_log(ctx: PoiseContext<'_>, settings: &GuildSettings, embed: CreateEmbed) {
    let Some(log_channel) = settings.log_channel() else {
        return;
    };

    log_channel
        .send_message(ctx, CreateMessage::new().embed(embed))
        .await
        .warn_err_ok();
}
