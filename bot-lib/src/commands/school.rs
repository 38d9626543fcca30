use super::{help::send_help, send_log};
use crate::{
    SayThenDelete,
    data::PoiseContext,
    delete_invocation,
    embeds::{joined_school_log_embed, left_school_log_embed},
    provisioning::{DiscordProvisioner, GroupOutcome, GroupPlacement, ProvisionError},
    registration::{JoinOutcome, JoinRequest, join_school, leave_school},
    selection::ReactionPrompt,
};
use color_eyre::eyre::{OptionExt, Result};
use poise::serenity_prelude::{ChannelId, GuildId, Mentionable};

/// Register for a school, or leave it
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    subcommands("join", "leave")
)]
pub async fn school(ctx: PoiseContext<'_>) -> Result<()> {
    send_help(ctx).await
}

fn provision_failure_reply(error: &ProvisionError) -> &'static str {
    match error {
        ProvisionError::Forbidden(_) => {
            "I'm missing the permissions to set up your school, please let a moderator know."
        }
        _ => "Something went wrong setting up your school, please try again later.",
    }
}

async fn provisioner_for(
    ctx: PoiseContext<'_>,
    guild_id: GuildId,
    category: Option<ChannelId>,
) -> DiscordProvisioner<'_> {
    let layout = ctx.data().config.read().await.layout.clone();

    DiscordProvisioner::new(
        ctx.serenity_context(),
        &ctx.data().guild_settings,
        guild_id,
        GroupPlacement::new(category),
        layout,
    )
}

/// Find your school and get access to its channels
#[poise::command(slash_command, prefix_command, guild_only)]
pub async fn join(
    ctx: PoiseContext<'_>,
    #[description = "Your school's name, eg. \"University of Utah\" or \"MIT\""]
    #[rest]
    school: String,
) -> Result<()> {
    ctx.defer().await?;

    let guild_id = ctx.guild_id().ok_or_eyre("Couldn't get guild")?;
    let state = ctx.data();
    let settings = state.guild_settings.get(guild_id)?;

    let (selection_timeout, min_members_for_group) = {
        let config = state.config.read().await;
        (config.selection_timeout, config.min_members_for_group)
    };

    let catalog = match state.schools.candidates(&school).await {
        Ok(catalog) => catalog,
        Err(e) => {
            tracing::error!("School lookup failed: {:?}", e);
            ctx.say_then_delete("the school lookup is unavailable right now, try again later.")
                .await?;
            delete_invocation(ctx).await;
            return Ok(());
        }
    };

    let request = JoinRequest {
        member: ctx.author().id,
        query: &school,
        custom_schools: &settings.custom_schools,
        default_role: settings.default_role(),
        selection_timeout,
        min_members_for_group,
    };

    let provisioner = provisioner_for(ctx, guild_id, settings.category()).await;
    let outcome = join_school(&request, &catalog, &ReactionPrompt::new(ctx), &provisioner).await;

    match outcome {
        Ok(JoinOutcome::AlreadyEnrolled { schools }) => {
            ctx.say_then_delete(format!(
                "you're already part of **{}**. Use `{}school leave` first.",
                schools.join(", "),
                ctx.prefix()
            ))
            .await?;
        }
        Ok(JoinOutcome::NoMatch) => {
            ctx.say_then_delete("🤔 Hmm. Couldn't find any school close to that. Try again.")
                .await?;
        }
        Ok(JoinOutcome::TimedOut) => {
            ctx.say_then_delete("⏲ you took too long to respond. Try again.")
                .await?;
        }
        Ok(JoinOutcome::Joined(enrollment)) => {
            let mut reply = format!(
                "{} welcome to **{}**!",
                ctx.author().mention(),
                enrollment.school.name
            );

            if let GroupOutcome::InsufficientMembers { members, required } = enrollment.group {
                reply.push_str(&format!(
                    " Its channels open once {required} members have joined, {members} so far."
                ));
            }

            ctx.say(reply).await?;

            send_log(
                ctx,
                &settings,
                joined_school_log_embed(ctx.author(), &enrollment.school),
            )
            .await;
        }
        Err(e) => {
            tracing::error!("Joining `{}` failed: {:?}", school, e);
            ctx.say_then_delete(provision_failure_reply(&e)).await?;
        }
    }

    delete_invocation(ctx).await;

    Ok(())
}

/// Leave your school
#[poise::command(slash_command, prefix_command, guild_only)]
pub async fn leave(ctx: PoiseContext<'_>) -> Result<()> {
    ctx.defer().await?;

    let guild_id = ctx.guild_id().ok_or_eyre("Couldn't get guild")?;
    let settings = ctx.data().guild_settings.get(guild_id)?;
    let provisioner = provisioner_for(ctx, guild_id, settings.category()).await;

    match leave_school(ctx.author().id, &provisioner).await {
        Ok(left) if left.is_empty() => {
            ctx.say_then_delete("you aren't part of any school.").await?;
        }
        Ok(left) => {
            ctx.say(format!(
                "{} you are no longer part of any school.",
                ctx.author().mention()
            ))
            .await?;

            send_log(ctx, &settings, left_school_log_embed(ctx.author(), &left)).await;
        }
        Err(e) => {
            tracing::error!("Leaving school failed: {:?}", e);
            ctx.say_then_delete(provision_failure_reply(&e)).await?;
        }
    }

    delete_invocation(ctx).await;

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn forbidden_gets_its_own_reply() {
        let forbidden = ProvisionError::Forbidden("Missing Permissions".to_owned());
        let not_found = ProvisionError::NotFound("Unknown Member".to_owned());

        assert!(provision_failure_reply(&forbidden).contains("permissions"));
        assert_ne!(
            provision_failure_reply(&forbidden),
            provision_failure_reply(&not_found)
        );
    }
}
