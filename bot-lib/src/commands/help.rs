use crate::{data::PoiseContext, embeds::help_embed};
use color_eyre::eyre::Result;
use poise::CreateReply;

/// How to register for a school
#[poise::command(slash_command, prefix_command)]
pub async fn help(ctx: PoiseContext<'_>) -> Result<()> {
    send_help(ctx).await
}

pub(crate) async fn send_help(ctx: PoiseContext<'_>) -> Result<()> {
    let help_text = ctx.data().config.read().await.help_text.clone();

    let embed = help_embed(
        "School registration",
        ctx.prefix(),
        help_text.as_deref().map(String::as_str),
    );

    ctx.send(CreateReply::default().embed(embed)).await?;

    Ok(())
}
