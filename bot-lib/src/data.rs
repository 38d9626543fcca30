use crate::{config::Config, lookup::SchoolSource};
use bot_db::{SchoolGateDb, guild_settings::GuildSettingsDb};
use color_eyre::eyre::{Error, Result, WrapErr};
use std::{path::Path, sync::Arc};
use tokio::sync::RwLock;

/// The global state of the bot
pub type State = Arc<RawAppState>;

pub struct RawAppState {
    pub config: Arc<RwLock<Config>>,
    /// Config file watcher that refreshes the config if it changes
    ///
    /// Attached to the AppState to keep the watcher alive
    _watcher: notify::RecommendedWatcher,
    pub db: SchoolGateDb,
    pub guild_settings: GuildSettingsDb,
    /// Read on startup, changing the lookup in the config needs a restart.
    pub schools: SchoolSource,
}

impl RawAppState {
    pub fn new(config: Config, config_path: String) -> Result<RawAppState> {
        let db = SchoolGateDb::open(&config.db_path)?;
        let guild_settings = GuildSettingsDb::new(&db)?;
        let schools = SchoolSource::from_config(&config.lookup)?;

        let config = Arc::new(RwLock::new(config));

        use notify::{
            Event, EventKind, RecursiveMode, Watcher,
            event::{AccessKind, AccessMode},
        };

        let config_clone = Arc::clone(&config);
        let reload_config_path = config_path.clone();

        let mut watcher = notify::recommended_watcher(move |res| match res {
            Ok(Event {
                kind: EventKind::Access(AccessKind::Close(AccessMode::Write)),
                ..
            }) => {
                tracing::info!("config changed, reloading...");

                config_clone.blocking_write().reload(&*reload_config_path);
            }
            Err(e) => tracing::error!("watch error: {:?}", e),
            _ => {}
        })
        .wrap_err("Failed to create file watcher")?;

        watcher
            .watch(Path::new(&config_path), RecursiveMode::NonRecursive)
            .wrap_err("Failed to watch config file")?;

        Ok(RawAppState {
            config,
            _watcher: watcher,
            db,
            guild_settings,
            schools,
        })
    }
}

// User data, which is stored and accessible in all command invocations
pub type PoiseContext<'a> = poise::Context<'a, State, Error>;
