//! Get-or-create of the per school role and grouping.

use crate::config::GroupLayout;
use bot_db::guild_settings::GuildSettingsDb;
use poise::serenity_prelude::{
    self as serenity, ChannelId, ChannelType, CreateChannel, EditRole, GuildChannel, GuildId,
    PermissionOverwrite, PermissionOverwriteType, Permissions, RoleId, UserId,
};
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

/// Discord rejects role and channel names longer than this.
pub const MAX_NAME_LEN: usize = 100;

static NOT_SLUG_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\p{L}\p{N}]+").unwrap());

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("missing permissions: {0}")]
    Forbidden(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("discord request failed")]
    Discord(#[source] serenity::Error),
    #[error("{0:?}")]
    Other(color_eyre::Report),
}

impl From<serenity::Error> for ProvisionError {
    fn from(error: serenity::Error) -> Self {
        if let serenity::Error::Model(serenity::ModelError::InvalidPermissions { .. }) = &error {
            return Self::Forbidden(error.to_string());
        }

        let status = match &error {
            serenity::Error::Http(http_error) => http_error.status_code(),
            _ => None,
        };

        match status.map(|status| status.as_u16()) {
            Some(403) => Self::Forbidden(error.to_string()),
            Some(404) => Self::NotFound(error.to_string()),
            _ => Self::Discord(error),
        }
    }
}

impl From<color_eyre::Report> for ProvisionError {
    fn from(report: color_eyre::Report) -> Self {
        Self::Other(report)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleOutcome {
    Created(RoleId),
    Reused(RoleId),
}

impl RoleOutcome {
    pub fn id(self) -> RoleId {
        match self {
            RoleOutcome::Created(id) | RoleOutcome::Reused(id) => id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupOutcome {
    Created(ChannelId),
    Reused(ChannelId),
    /// Not created yet, too few members hold the school role.
    InsufficientMembers { members: usize, required: usize },
}

impl GroupOutcome {
    pub fn id(self) -> Option<ChannelId> {
        match self {
            GroupOutcome::Created(id) | GroupOutcome::Reused(id) => Some(id),
            GroupOutcome::InsufficientMembers { .. } => None,
        }
    }
}

pub trait GuildProvisioner {
    /// Reuses the role named `school`, creating it if there is none.
    /// Either way the role is remembered as a school role.
    async fn ensure_role(&self, school: &str) -> Result<RoleOutcome, ProvisionError>;

    /// Reuses the grouping for `school`. Otherwise creates it, visible only to `role`, once at
    /// least `min_members` members hold that role. `joining` counts as one of them.
    async fn ensure_group(
        &self,
        school: &str,
        role: RoleId,
        joining: UserId,
        min_members: usize,
    ) -> Result<GroupOutcome, ProvisionError>;

    async fn grant_role(&self, member: UserId, role: RoleId) -> Result<(), ProvisionError>;

    async fn revoke_role(&self, member: UserId, role: RoleId) -> Result<(), ProvisionError>;

    /// School roles `member` holds, with their names.
    async fn school_roles(&self, member: UserId) -> Result<Vec<(RoleId, String)>, ProvisionError>;
}

/// Role names and category names are the school name, cut to fit.
pub fn discord_name(school: &str) -> String {
    school.trim().chars().take(MAX_NAME_LEN).collect()
}

/// Text channel version of a school name, eg. `university-of-utah`.
pub fn channel_slug(school: &str) -> String {
    let lowercase = school.to_lowercase();
    let slug: String = NOT_SLUG_REGEX
        .replace_all(&lowercase, "-")
        .trim_matches('-')
        .chars()
        .take(MAX_NAME_LEN)
        .collect();

    if slug.is_empty() {
        String::from("school")
    } else {
        slug
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupPlacement {
    /// Every school gets a category of its own.
    OwnCategory,
    /// Every school gets a text channel in this category.
    UnderCategory(ChannelId),
}

impl GroupPlacement {
    pub fn new(category: Option<ChannelId>) -> Self {
        category.map_or(Self::OwnCategory, Self::UnderCategory)
    }

    pub fn group_name(self, school: &str) -> String {
        match self {
            GroupPlacement::OwnCategory => discord_name(school),
            GroupPlacement::UnderCategory(_) => channel_slug(school),
        }
    }

    fn holds(self, channel: &GuildChannel) -> bool {
        match self {
            GroupPlacement::OwnCategory => channel.kind == ChannelType::Category,
            GroupPlacement::UnderCategory(parent) => {
                channel.kind == ChannelType::Text && channel.parent_id == Some(parent)
            }
        }
    }
}

pub struct DiscordProvisioner<'a> {
    ctx: &'a serenity::Context,
    settings: &'a GuildSettingsDb,
    guild_id: GuildId,
    placement: GroupPlacement,
    layout: GroupLayout,
}

impl<'a> DiscordProvisioner<'a> {
    pub fn new(
        ctx: &'a serenity::Context,
        settings: &'a GuildSettingsDb,
        guild_id: GuildId,
        placement: GroupPlacement,
        layout: GroupLayout,
    ) -> Self {
        Self {
            ctx,
            settings,
            guild_id,
            placement,
            layout,
        }
    }

    /// Counted from the cache, so a role granted a moment ago may not be in there yet.
    fn role_members(&self, role: RoleId, joining: UserId) -> usize {
        let others = self.ctx.cache.guild(self.guild_id).map_or(0, |guild| {
            guild
                .members
                .values()
                .filter(|member| member.user.id != joining && member.roles.contains(&role))
                .count()
        });

        others + 1
    }

    fn remember(&self, role: RoleId) -> Result<(), ProvisionError> {
        if self.settings.add_school_role(self.guild_id, role)? {
            tracing::debug!("{} is now a school role in {}", role, self.guild_id);
        }

        Ok(())
    }

    fn overwrites(&self, role: RoleId) -> Vec<PermissionOverwrite> {
        vec![
            PermissionOverwrite {
                allow: Permissions::empty(),
                deny: Permissions::VIEW_CHANNEL,
                kind: PermissionOverwriteType::Role(self.guild_id.everyone_role()),
            },
            PermissionOverwrite {
                allow: Permissions::VIEW_CHANNEL,
                deny: Permissions::empty(),
                kind: PermissionOverwriteType::Member(self.ctx.cache.current_user().id),
            },
            PermissionOverwrite {
                allow: Permissions::VIEW_CHANNEL,
                deny: Permissions::empty(),
                kind: PermissionOverwriteType::Role(role),
            },
        ]
    }

    async fn fill_category(&self, category: ChannelId) -> Result<(), ProvisionError> {
        for name in &self.layout.text_channels {
            self.guild_id
                .create_channel(
                    self.ctx,
                    CreateChannel::new(name)
                        .kind(ChannelType::Text)
                        .category(category),
                )
                .await?;
        }

        for number in 1..=self.layout.voice_channels {
            self.guild_id
                .create_channel(
                    self.ctx,
                    CreateChannel::new(format!("Voice {number}"))
                        .kind(ChannelType::Voice)
                        .category(category),
                )
                .await?;
        }

        Ok(())
    }
}

impl GuildProvisioner for DiscordProvisioner<'_> {
    async fn ensure_role(&self, school: &str) -> Result<RoleOutcome, ProvisionError> {
        let name = discord_name(school);
        let roles = self.guild_id.roles(self.ctx).await?;

        if let Some(role) = roles.values().find(|role| role.name == name) {
            self.remember(role.id)?;
            return Ok(RoleOutcome::Reused(role.id));
        }

        let role = self
            .guild_id
            .create_role(
                self.ctx,
                EditRole::new()
                    .name(&name)
                    .hoist(true)
                    .audit_log_reason("New school role"),
            )
            .await?;

        tracing::info!("Created school role `{}`", name);
        self.remember(role.id)?;

        Ok(RoleOutcome::Created(role.id))
    }

    async fn ensure_group(
        &self,
        school: &str,
        role: RoleId,
        joining: UserId,
        min_members: usize,
    ) -> Result<GroupOutcome, ProvisionError> {
        let name = self.placement.group_name(school);
        let channels = self.guild_id.channels(self.ctx).await?;

        if let Some(existing) = channels
            .values()
            .find(|channel| self.placement.holds(channel) && channel.name == name)
        {
            return Ok(GroupOutcome::Reused(existing.id));
        }

        let members = self.role_members(role, joining);
        if members < min_members {
            return Ok(GroupOutcome::InsufficientMembers {
                members,
                required: min_members,
            });
        }

        let builder = CreateChannel::new(&name)
            .permissions(self.overwrites(role))
            .audit_log_reason("New school");

        let group = match self.placement {
            GroupPlacement::OwnCategory => {
                let category = self
                    .guild_id
                    .create_channel(self.ctx, builder.kind(ChannelType::Category))
                    .await?;
                self.fill_category(category.id).await?;
                category
            }
            GroupPlacement::UnderCategory(parent) => {
                self.guild_id
                    .create_channel(
                        self.ctx,
                        builder.kind(ChannelType::Text).category(parent),
                    )
                    .await?
            }
        };

        tracing::info!("Created school grouping `{}`", name);

        Ok(GroupOutcome::Created(group.id))
    }

    async fn grant_role(&self, member: UserId, role: RoleId) -> Result<(), ProvisionError> {
        self.ctx
            .http
            .add_member_role(
                self.guild_id,
                member,
                role,
                Some("Granting access to school"),
            )
            .await?;

        Ok(())
    }

    async fn revoke_role(&self, member: UserId, role: RoleId) -> Result<(), ProvisionError> {
        self.ctx
            .http
            .remove_member_role(self.guild_id, member, role, Some("Leaving school requested"))
            .await?;

        Ok(())
    }

    async fn school_roles(&self, member: UserId) -> Result<Vec<(RoleId, String)>, ProvisionError> {
        let settings = self.settings.get(self.guild_id)?;
        let member = self.guild_id.member(self.ctx, member).await?;
        let roles = self.guild_id.roles(self.ctx).await?;

        Ok(member
            .roles
            .iter()
            .filter(|role_id| settings.is_school_role(**role_id))
            .filter_map(|role_id| roles.get(role_id))
            .map(|role| (role.id, role.name.clone()))
            .collect())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn slugs_are_channel_friendly() {
        assert_eq!(channel_slug("University of Utah"), "university-of-utah");
        assert_eq!(channel_slug("  St. John's College! "), "st-john-s-college");
        assert_eq!(channel_slug("Université de Montréal"), "université-de-montréal");
        assert_eq!(channel_slug("???"), "school");
    }

    #[test]
    fn names_fit_discord() {
        let long = "a".repeat(150);

        assert_eq!(discord_name(&long).len(), MAX_NAME_LEN);
        assert_eq!(channel_slug(&long).len(), MAX_NAME_LEN);
        assert_eq!(discord_name(" Yale University "), "Yale University");
    }

    #[test]
    fn placement_names_groups() {
        let category = ChannelId::new(42);

        assert_eq!(
            GroupPlacement::new(None).group_name("Yale University"),
            "Yale University"
        );
        assert_eq!(
            GroupPlacement::new(Some(category)).group_name("Yale University"),
            "yale-university"
        );
    }

    #[test]
    fn outcome_ids() {
        let role = RoleId::new(1);
        let channel = ChannelId::new(2);

        assert_eq!(RoleOutcome::Created(role).id(), role);
        assert_eq!(RoleOutcome::Reused(role).id(), role);
        assert_eq!(GroupOutcome::Reused(channel).id(), Some(channel));
        assert_eq!(
            GroupOutcome::InsufficientMembers {
                members: 1,
                required: 3
            }
            .id(),
            None
        );
    }
}
