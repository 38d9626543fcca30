use bot_traits::ForwardRefToTracing;
use color_eyre::eyre::{Result, WrapErr};
use data::PoiseContext;
use poise::serenity_prelude::Mentionable;
use std::{sync::Arc, time::Duration};

pub mod commands;
pub mod config;
pub mod data;
mod embeds;
pub mod event_handler;
pub mod lookup;
pub mod matcher;
pub mod provisioning;
pub mod registration;
pub mod schools;
pub mod selection;

/// How long transient replies stay up.
const TRANSIENT_REPLY: Duration = Duration::from_secs(15);

trait SayThenDelete {
    /// Replies with `@author message`, deleting the reply after a while.
    async fn say_then_delete(self, message: impl Into<String>) -> Result<()>;
}

impl SayThenDelete for PoiseContext<'_> {
    async fn say_then_delete(self, message: impl Into<String>) -> Result<()> {
        let message = self
            .say(format!("{} {}", self.author().mention(), message.into()))
            .await?
            .into_message()
            .await
            .wrap_err("Couldn't fetch reply")?;

        let http = Arc::clone(&self.serenity_context().http);

        tokio::spawn(async move {
            tokio::time::sleep(TRANSIENT_REPLY).await;
            message.delete(&*http).await.warn_err_ok();
        });

        Ok(())
    }
}

/// Removes the `!school join ...` message once the command is done with it.
async fn delete_invocation(ctx: PoiseContext<'_>) {
    if let poise::Context::Prefix(prefix) = ctx {
        prefix.msg.delete(ctx).await.warn_err_ok();
    }
}
