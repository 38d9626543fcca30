//! Asking a member to pick one of a few numbered options with a reaction.

use crate::{data::PoiseContext, embeds::school_options_embed, matcher::MAX_CANDIDATES};
use bot_traits::ForwardRefToTracing;
use color_eyre::eyre::{Result, WrapErr};
use poise::{
    CreateReply,
    serenity_prelude::{Mentionable, Message, ReactionType},
};
use std::{fmt::Write, time::Duration};

/// Keycap emojis, index 0 is option `1`.
pub const NUMBER_EMOJIS: [&str; 10] = [
    "1\u{fe0f}\u{20e3}",
    "2\u{fe0f}\u{20e3}",
    "3\u{fe0f}\u{20e3}",
    "4\u{fe0f}\u{20e3}",
    "5\u{fe0f}\u{20e3}",
    "6\u{fe0f}\u{20e3}",
    "7\u{fe0f}\u{20e3}",
    "8\u{fe0f}\u{20e3}",
    "9\u{fe0f}\u{20e3}",
    "\u{1f51f}",
];

const _: () = assert!(MAX_CANDIDATES <= NUMBER_EMOJIS.len());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Zero based index into the offered options.
    Chosen(usize),
    TimedOut,
}

pub trait ChoicePrompt {
    /// Shows `options` and waits at most `timeout` for the requesting member to pick one.
    async fn choose(&self, options: &[String], timeout: Duration) -> Result<Selection>;
}

/// `1` - Harvard University, one line per option.
pub fn render_options(options: &[String]) -> String {
    let mut description = String::new();

    for (number, option) in options.iter().enumerate().map(|(i, o)| (i + 1, o)) {
        writeln!(&mut description, "`{number}` - {option}").ok();
    }

    description
}

/// Maps a reaction back to the option it stands for, if it is one of the first `len`.
pub fn emoji_index(emoji: &str, len: usize) -> Option<usize> {
    let normalized = emojis::get(emoji).map_or(emoji, |emoji| emoji.as_str());

    NUMBER_EMOJIS
        .iter()
        .take(len)
        .position(|&number| number == normalized || number == emoji)
}

/// Reaction based prompt for a poise command invocation.
pub struct ReactionPrompt<'a> {
    ctx: PoiseContext<'a>,
}

impl<'a> ReactionPrompt<'a> {
    pub fn new(ctx: PoiseContext<'a>) -> Self {
        Self { ctx }
    }

    async fn await_choice(
        &self,
        message: &Message,
        len: usize,
        timeout: Duration,
    ) -> Result<Selection> {
        for emoji in NUMBER_EMOJIS.iter().take(len) {
            message
                .react(self.ctx, ReactionType::Unicode((*emoji).to_owned()))
                .await
                .wrap_err("Couldn't add option reaction")?;
        }

        let member = self.ctx.author().id;

        let reaction = message
            .await_reaction(self.ctx.serenity_context())
            .author_id(member)
            .timeout(timeout)
            .filter(move |reaction| {
                reaction.user_id == Some(member)
                    && matches!(&reaction.emoji, ReactionType::Unicode(emoji) if emoji_index(emoji, len).is_some())
            })
            .await;

        let Some(reaction) = reaction else {
            return Ok(Selection::TimedOut);
        };

        Ok(match &reaction.emoji {
            ReactionType::Unicode(emoji) => {
                emoji_index(emoji, len).map_or(Selection::TimedOut, Selection::Chosen)
            }
            _ => Selection::TimedOut,
        })
    }
}

impl ChoicePrompt for ReactionPrompt<'_> {
    async fn choose(&self, options: &[String], timeout: Duration) -> Result<Selection> {
        let reply = CreateReply::default()
            .content(self.ctx.author().mention().to_string())
            .embed(school_options_embed(options));

        let message = self
            .ctx
            .send(reply)
            .await
            .wrap_err("Couldn't send options")?
            .into_message()
            .await
            .wrap_err("Couldn't fetch options message")?;

        let selection = self.await_choice(&message, options.len(), timeout).await;

        message.delete(self.ctx).await.warn_err_ok();

        selection
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn option_k_is_index_k_minus_one() {
        for k in 1..=MAX_CANDIDATES {
            assert_eq!(emoji_index(NUMBER_EMOJIS[k - 1], MAX_CANDIDATES), Some(k - 1));
        }
    }

    #[test]
    fn ignores_emojis_not_offered() {
        assert_eq!(emoji_index(NUMBER_EMOJIS[3], 3), None);
        assert_eq!(emoji_index("👍", 5), None);
    }

    #[test]
    fn renders_numbered_lines() {
        let options = vec![
            "Harvard University".to_owned(),
            "Yale University".to_owned(),
        ];

        assert_eq!(
            render_options(&options),
            "`1` - Harvard University\n`2` - Yale University\n"
        );
    }
}
