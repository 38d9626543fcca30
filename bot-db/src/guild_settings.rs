use crate::{ReadWriteTree, SchoolGateDb};
use color_eyre::eyre::Result;
use poise::serenity_prelude::{ChannelId, GuildId, RoleId};
use serde::{Deserialize, Serialize};
use sled::Tree;

/// Per guild settings, changed only through the moderator commands.
///
/// Ids are stored as raw `u64`s, bincode can't deserialize serenity ids.
#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq, Eq)]
pub struct GuildSettings {
    pub log_channel: Option<u64>,
    pub default_role: Option<u64>,
    pub custom_schools: Vec<String>,
    /// Category every school channel is created under.
    /// When unset, each school gets its own category.
    pub category: Option<u64>,
    /// Every role the bot has handed out as a school role.
    pub school_roles: Vec<u64>,
}

impl GuildSettings {
    pub fn log_channel(&self) -> Option<ChannelId> {
        self.log_channel.map(ChannelId::new)
    }

    pub fn default_role(&self) -> Option<RoleId> {
        self.default_role.map(RoleId::new)
    }

    pub fn category(&self) -> Option<ChannelId> {
        self.category.map(ChannelId::new)
    }

    pub fn is_school_role(&self, role: RoleId) -> bool {
        self.school_roles.contains(&role.get())
    }

    pub fn has_custom_school(&self, name: &str) -> bool {
        self.custom_schools
            .iter()
            .any(|school| same_school_name(school, name))
    }
}

fn same_school_name(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

pub struct GuildSettingsDb(Tree);

impl GuildSettingsDb {
    pub fn new(db: &SchoolGateDb) -> Result<Self> {
        Ok(Self(db.open_tree("guild_settings")?))
    }

    pub fn get(&self, guild_id: GuildId) -> Result<GuildSettings> {
        self.0.typed_get_or_default::<u64, GuildSettings>(&guild_id.get())
    }

    fn update(
        &self,
        guild_id: GuildId,
        update_function: impl FnMut(GuildSettings) -> GuildSettings,
    ) -> Result<GuildSettings> {
        self.0
            .typed_update::<u64, GuildSettings>(&guild_id.get(), update_function)
    }

    pub fn set_log_channel(&self, guild_id: GuildId, channel: Option<ChannelId>) -> Result<()> {
        let channel = channel.map(ChannelId::get);
        self.update(guild_id, |settings| GuildSettings {
            log_channel: channel,
            ..settings
        })
        .map(|_| ())
    }

    pub fn set_default_role(&self, guild_id: GuildId, role: Option<RoleId>) -> Result<()> {
        let role = role.map(RoleId::get);
        self.update(guild_id, |settings| GuildSettings {
            default_role: role,
            ..settings
        })
        .map(|_| ())
    }

    pub fn set_category(&self, guild_id: GuildId, category: Option<ChannelId>) -> Result<()> {
        let category = category.map(ChannelId::get);
        self.update(guild_id, |settings| GuildSettings { category, ..settings })
            .map(|_| ())
    }

    /// Remembers `role` as a school role, returns `false` if it already was one.
    pub fn add_school_role(&self, guild_id: GuildId, role: RoleId) -> Result<bool> {
        let mut added = false;

        self.update(guild_id, |mut settings| {
            added = !settings.is_school_role(role);
            if added {
                settings.school_roles.push(role.get());
            }
            settings
        })?;

        Ok(added)
    }

    /// Returns `false` if the school was already in the list.
    pub fn add_custom_school(&self, guild_id: GuildId, name: &str) -> Result<bool> {
        let name = name.trim();
        let mut added = false;

        self.update(guild_id, |mut settings| {
            added = !settings.has_custom_school(name);
            if added {
                settings.custom_schools.push(name.to_owned());
            }
            settings
        })?;

        Ok(added)
    }

    /// Returns `false` if there was nothing to remove.
    pub fn remove_custom_school(&self, guild_id: GuildId, name: &str) -> Result<bool> {
        let mut removed = false;

        self.update(guild_id, |mut settings| {
            let before = settings.custom_schools.len();
            settings
                .custom_schools
                .retain(|school| !same_school_name(school, name));
            removed = settings.custom_schools.len() != before;
            settings
        })?;

        Ok(removed)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const GUILD: GuildId = GuildId::new(690552296983232554);

    fn settings_db() -> GuildSettingsDb {
        GuildSettingsDb::new(&SchoolGateDb::temporary().unwrap()).unwrap()
    }

    #[test]
    fn unknown_guild_has_default_settings() {
        let db = settings_db();

        assert_eq!(db.get(GUILD).unwrap(), GuildSettings::default());
    }

    #[test]
    fn scalar_settings_are_independent() {
        let db = settings_db();

        db.set_log_channel(GUILD, Some(ChannelId::new(11))).unwrap();
        db.set_default_role(GUILD, Some(RoleId::new(22))).unwrap();
        db.set_category(GUILD, Some(ChannelId::new(33))).unwrap();

        let settings = db.get(GUILD).unwrap();
        assert_eq!(settings.log_channel(), Some(ChannelId::new(11)));
        assert_eq!(settings.default_role(), Some(RoleId::new(22)));
        assert_eq!(settings.category(), Some(ChannelId::new(33)));

        db.set_log_channel(GUILD, None).unwrap();

        let settings = db.get(GUILD).unwrap();
        assert_eq!(settings.log_channel(), None);
        assert_eq!(settings.default_role(), Some(RoleId::new(22)));
    }

    #[test]
    fn custom_schools_are_unique() {
        let db = settings_db();

        assert!(db.add_custom_school(GUILD, "Hogwarts Academy").unwrap());
        assert!(!db.add_custom_school(GUILD, " hogwarts academy ").unwrap());
        assert!(db.add_custom_school(GUILD, "Starfleet Academy").unwrap());

        assert_eq!(
            db.get(GUILD).unwrap().custom_schools,
            vec!["Hogwarts Academy".to_owned(), "Starfleet Academy".to_owned()]
        );
    }

    #[test]
    fn remove_custom_school_reports_missing() {
        let db = settings_db();

        db.add_custom_school(GUILD, "Hogwarts Academy").unwrap();

        assert!(!db.remove_custom_school(GUILD, "Starfleet Academy").unwrap());
        assert!(db.remove_custom_school(GUILD, "HOGWARTS ACADEMY").unwrap());
        assert!(db.get(GUILD).unwrap().custom_schools.is_empty());
    }

    #[test]
    fn custom_school_names_compare_beyond_ascii() {
        let db = settings_db();

        assert!(db.add_custom_school(GUILD, "Université Laval").unwrap());
        assert!(!db.add_custom_school(GUILD, "UNIVERSITÉ LAVAL").unwrap());
        assert!(db.remove_custom_school(GUILD, "université laval").unwrap());
    }

    #[test]
    fn school_roles_are_remembered_once() {
        let db = settings_db();
        let role = RoleId::new(77);

        assert!(db.add_school_role(GUILD, role).unwrap());
        assert!(!db.add_school_role(GUILD, role).unwrap());

        let settings = db.get(GUILD).unwrap();
        assert!(settings.is_school_role(role));
        assert!(!settings.is_school_role(RoleId::new(78)));
        assert_eq!(settings.school_roles, vec![77]);
    }

    #[test]
    fn guilds_do_not_share_settings() {
        let db = settings_db();
        let other = GuildId::new(1);

        db.add_custom_school(GUILD, "Hogwarts Academy").unwrap();

        assert!(db.get(other).unwrap().custom_schools.is_empty());
    }
}
