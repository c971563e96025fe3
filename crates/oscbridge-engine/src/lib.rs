//! oscbridge engine
//!
//! Coordinates the side effects for inbound telemetry messages:
//! - matches messages against the filter table (substring containment)
//! - gates actions through per-filter dual-threshold rate limiting
//! - dispatches actions: media transport, key synthesis, or shell commands
//!
//! All shared mutable state (the filter table and each filter's limiter)
//! lives behind one async mutex inside [`Engine`]; the UDP listener and the
//! interactive command loop both go through it, so evaluation and
//! bookkeeping never race.

use std::{path::PathBuf, sync::Arc, time::SystemTime};

use keycatalog::{KeyAction, KeyCatalog};
use oscbridge_config::ConfigFile;
use relayinput::InputRelay;
use tracing::{info, trace, warn};

mod dispatch;
mod error;
mod filter;
mod media;
mod ratelimit;

pub use dispatch::ActionDispatcher;
pub use error::{Error, Result};
pub use filter::{
    Filter, FilterRegistry, MAX_FILTERS, RegistryError, Triggered, seconds_ago, unix_seconds,
};
pub use media::{MediaController, MediaState};
pub use ratelimit::RateLimiter;

/// Everything guarded by the engine lock.
struct BridgeState {
    /// Whether per-message logging is enabled.
    printing: bool,
    /// The filter table.
    registry: FilterRegistry,
}

impl BridgeState {
    /// Persisted form, taken under the engine lock.
    fn snapshot(&self) -> ConfigFile {
        let defaults = self.registry.default_limits();
        ConfigFile {
            message_printing_enabled: self.printing,
            rate_limit_count: defaults.0,
            rate_limit_seconds: defaults.1,
            filters: self.registry.to_entries(),
        }
    }

    /// Replace state from a loaded config.
    fn apply(&mut self, cfg: &ConfigFile) {
        self.printing = cfg.message_printing_enabled;
        self.registry
            .set_default_limits(cfg.rate_limit_count, cfg.rate_limit_seconds);
        self.registry.load_entries(&cfg.filters);
    }
}

/// The engine: owns the filter table and drives action dispatch.
///
/// Construct via [`Engine::new`], feed inbound messages through
/// [`Engine::handle_message`], and mutate the table through the command
/// methods. Every mutating command persists the configuration; persistence
/// failures are reported and never abort the command.
#[derive(Clone)]
pub struct Engine {
    /// Guarded mutable state.
    state: Arc<tokio::sync::Mutex<BridgeState>>,
    /// Action resolver.
    dispatcher: ActionDispatcher,
    /// Media transport collaborator, also exposed for status commands.
    media: MediaController,
    /// Key name catalog, exposed for listings and diagnostics.
    catalog: Arc<KeyCatalog>,
    /// Shared virtual device.
    relay: Arc<InputRelay>,
    /// Where the configuration is persisted.
    config_path: PathBuf,
}

impl Engine {
    /// Engine over the real uinput-backed relay.
    pub fn new(config_path: PathBuf) -> Self {
        Self::with_relay(config_path, InputRelay::new())
    }

    /// Engine over a caller-supplied relay. Tests inject a recording sink
    /// through this.
    pub fn with_relay(config_path: PathBuf, relay: InputRelay) -> Self {
        let relay = Arc::new(relay);
        let catalog = Arc::new(KeyCatalog::with_defaults());
        let media = MediaController::new(relay.clone());
        let dispatcher = ActionDispatcher::new(relay.clone(), media.clone(), catalog.clone());
        Self {
            state: Arc::new(tokio::sync::Mutex::new(BridgeState {
                printing: false,
                registry: FilterRegistry::new(),
            })),
            dispatcher,
            media,
            catalog,
            relay,
            config_path,
        }
    }

    /// Run one inbound message through the filter table and dispatch
    /// whatever the limiters approve.
    pub async fn handle_message(&self, message: &str) {
        let triggered = {
            let mut st = self.state.lock().await;
            if st.printing {
                info!(%message, "received message");
            } else {
                trace!(%message, "received message");
            }
            let (_, triggered) = st.registry.match_message(message, SystemTime::now());
            triggered
        };
        for t in triggered {
            info!(pattern = %t.pattern, action = %t.action, "executing action");
            self.dispatcher.execute(&t.action).await;
        }
    }

    /// Add a filter.
    pub async fn add_filter(&self, pattern: &str) -> Result<()> {
        self.mutate(|st| Ok(st.registry.add(pattern)?)).await
    }

    /// Remove a filter.
    pub async fn remove_filter(&self, pattern: &str) -> Result<()> {
        self.mutate(|st| Ok(st.registry.remove(pattern)?)).await
    }

    /// Remove all filters.
    pub async fn clear_filters(&self) -> Result<()> {
        self.mutate(|st| {
            st.registry.clear();
            Ok(())
        })
        .await
    }

    /// Zero all match counts and rate-limit history.
    pub async fn reset_counts(&self) -> Result<()> {
        self.mutate(|st| {
            st.registry.reset_counts();
            Ok(())
        })
        .await
    }

    /// Enable or disable a filter.
    pub async fn set_enabled(&self, pattern: &str, enabled: bool) -> Result<()> {
        self.mutate(|st| Ok(st.registry.set_enabled(pattern, enabled)?))
            .await
    }

    /// Set a filter's action and arm its trigger.
    pub async fn set_action(&self, pattern: &str, action: &str) -> Result<()> {
        self.mutate(|st| Ok(st.registry.set_action(pattern, action)?))
            .await
    }

    /// Flip a filter's trigger; returns the new state.
    pub async fn toggle_action(&self, pattern: &str) -> Result<bool> {
        self.mutate(|st| Ok(st.registry.toggle_action(pattern)?))
            .await
    }

    /// Set a filter's rate limits.
    pub async fn set_rate(&self, pattern: &str, count: u32, seconds: u32) -> Result<()> {
        self.mutate(|st| Ok(st.registry.set_rate(pattern, count, seconds)?))
            .await
    }

    /// Reset a filter's rate limits to the defaults.
    pub async fn reset_rate(&self, pattern: &str) -> Result<()> {
        self.mutate(|st| Ok(st.registry.reset_rate(pattern)?)).await
    }

    /// Install the built-in default filter set; returns how many were added.
    pub async fn install_default_filters(&self) -> Result<usize> {
        self.mutate(|st| Ok(st.registry.install_defaults(oscbridge_config::DEFAULT_FILTERS)))
            .await
    }

    /// Flip per-message logging; returns the new state.
    pub async fn toggle_printing(&self) -> Result<bool> {
        self.mutate(|st| {
            st.printing = !st.printing;
            Ok(st.printing)
        })
        .await
    }

    /// Whether per-message logging is enabled.
    pub async fn printing(&self) -> bool {
        self.state.lock().await.printing
    }

    /// Snapshot of the filter table for display.
    pub async fn filters(&self) -> Vec<Filter> {
        self.state.lock().await.registry.iter().cloned().collect()
    }

    /// Default rate limits applied to new filters.
    pub async fn default_limits(&self) -> (u32, u32) {
        self.state.lock().await.registry.default_limits()
    }

    /// Persist the current state. Used by the explicit `save` command; the
    /// mutating commands persist automatically.
    pub async fn save(&self) -> Result<()> {
        let snapshot = self.state.lock().await.snapshot();
        oscbridge_config::save(&self.config_path, &snapshot)?;
        Ok(())
    }

    /// Reload state from the config file. Returns the number of filters
    /// loaded, or `None` when the file does not exist.
    pub async fn load(&self) -> Result<Option<usize>> {
        let Some(cfg) = oscbridge_config::load(&self.config_path)? else {
            return Ok(None);
        };
        let mut st = self.state.lock().await;
        st.apply(&cfg);
        Ok(Some(st.registry.len()))
    }

    /// Parse and emit a key expression immediately. Returns the action's
    /// description on success. Backs the `test-key` command.
    pub async fn test_key(&self, expression: &str) -> Result<String> {
        let action = KeyAction::parse(&self.catalog, expression)?;
        let description = action.description.clone();
        let relay = self.relay.clone();
        tokio::task::spawn_blocking(move || relay.run(&action)).await??;
        Ok(description)
    }

    /// The key name catalog.
    pub fn catalog(&self) -> &KeyCatalog {
        &self.catalog
    }

    /// The media transport collaborator.
    pub fn media(&self) -> &MediaController {
        &self.media
    }

    /// Path the configuration persists to.
    pub fn config_path(&self) -> &std::path::Path {
        &self.config_path
    }

    /// Run a mutating command under the lock, then persist a snapshot taken
    /// under that same lock. Persistence failures are reported, not
    /// propagated.
    async fn mutate<T>(&self, op: impl FnOnce(&mut BridgeState) -> Result<T>) -> Result<T> {
        let (out, snapshot) = {
            let mut st = self.state.lock().await;
            let out = op(&mut st)?;
            (out, st.snapshot())
        };
        if let Err(e) = oscbridge_config::save(&self.config_path, &snapshot) {
            warn!(error = %e, "failed to persist configuration");
        }
        Ok(out)
    }
}
