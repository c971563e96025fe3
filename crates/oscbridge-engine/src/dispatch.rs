//! Resolves action strings to their side effects.
//!
//! Strings starting with `@` name built-in actions: media transport first,
//! then canned key shortcuts and the generic `@key:<expression>` form.
//! Anything else - including an `@` string that names no built-in - is
//! spawned as a detached `/bin/sh -c` command line. Spawned children are
//! reaped by a background task; the dispatcher never waits on them.

use std::{collections::HashMap, process::Stdio, sync::Arc};

use keycatalog::{KeyAction, KeyCatalog};
use once_cell::sync::Lazy;
use relayinput::InputRelay;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::media::MediaController;

/// Canned key shortcuts reachable as `@<name>`.
static KEY_SHORTCUTS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("copy", "ctrl+c"),
        ("paste", "ctrl+v"),
        ("cut", "ctrl+x"),
        ("undo", "ctrl+z"),
        ("redo", "ctrl+y"),
        ("select-all", "ctrl+a"),
        ("alt-tab", "alt+tab"),
        ("screenshot", "printscreen"),
    ])
});

/// Resolves and executes action strings.
#[derive(Clone)]
pub struct ActionDispatcher {
    /// Shared virtual device for key actions.
    relay: Arc<InputRelay>,
    /// Media transport collaborator.
    media: MediaController,
    /// Key name catalog for expression parsing.
    catalog: Arc<KeyCatalog>,
}

impl ActionDispatcher {
    /// Dispatcher over the shared relay, media controller, and catalog.
    pub fn new(relay: Arc<InputRelay>, media: MediaController, catalog: Arc<KeyCatalog>) -> Self {
        Self {
            relay,
            media,
            catalog,
        }
    }

    /// Execute `action`. Failures are logged; nothing here aborts the
    /// calling flow.
    pub async fn execute(&self, action: &str) {
        if let Some(rest) = action.strip_prefix('@') {
            let (name, param) = match rest.split_once(':') {
                Some((name, param)) => (name, Some(param)),
                None => (rest, None),
            };
            if self.execute_builtin(name, param).await {
                return;
            }
            debug!(action, "no built-in action matched, treating as command line");
        }
        spawn_command(action);
    }

    /// Try the built-in action table. Returns `false` when `name` is not a
    /// built-in at all.
    async fn execute_builtin(&self, name: &str, param: Option<&str>) -> bool {
        match name {
            "media-play" => self.media.play_pause().await,
            "media-stop" => self.media.stop().await,
            "media-next" => self.media.next().await,
            "media-prev" => self.media.previous().await,
            "key" => {
                if let Some(expr) = param {
                    self.run_key_expression(expr).await;
                } else {
                    warn!("@key requires an expression, e.g. @key:ctrl+c");
                }
            }
            _ => {
                if let Some(expr) = KEY_SHORTCUTS.get(name) {
                    self.run_key_expression(expr).await;
                } else {
                    return false;
                }
            }
        }
        true
    }

    /// Parse and emit a key expression. Errors are reported and swallowed;
    /// a recognized built-in never falls through to the shell.
    async fn run_key_expression(&self, expression: &str) {
        let action = match KeyAction::parse(&self.catalog, expression) {
            Ok(action) => action,
            Err(e) => {
                warn!(expression, error = %e, "bad key expression");
                return;
            }
        };
        info!(action = %action.description, "executing key action");
        let relay = self.relay.clone();
        match tokio::task::spawn_blocking(move || relay.run(&action)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(expression, error = %e, "key emission failed"),
            Err(e) => warn!(expression, error = %e, "key emission task failed"),
        }
    }
}

/// Spawn `action` as a detached `/bin/sh -c` child and reap it in the
/// background.
fn spawn_command(action: &str) {
    match Command::new("/bin/sh")
        .arg("-c")
        .arg(action)
        .stdin(Stdio::null())
        .spawn()
    {
        Ok(mut child) => {
            let action = action.to_string();
            tokio::spawn(async move {
                match child.wait().await {
                    Ok(status) => debug!(command = %action, %status, "external command finished"),
                    Err(e) => warn!(command = %action, error = %e, "external command wait failed"),
                }
            });
        }
        Err(e) => warn!(command = action, error = %e, "failed to spawn external command"),
    }
}

#[cfg(test)]
mod tests {
    use relayinput::MockSink;

    use super::*;

    fn dispatcher_with_mock() -> (ActionDispatcher, MockSink) {
        let sink = MockSink::new();
        let relay = Arc::new(InputRelay::with_sink(Box::new(sink.clone())));
        let media = MediaController::new(relay.clone());
        let catalog = Arc::new(KeyCatalog::with_defaults());
        (ActionDispatcher::new(relay, media, catalog), sink)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn key_expression_emits_through_relay() {
        let (dispatcher, sink) = dispatcher_with_mock();
        dispatcher.execute("@key:a").await;
        let cat = KeyCatalog::with_defaults();
        let a = cat.lookup("a").unwrap();
        assert_eq!(sink.events(), vec![(a, true), (a, false)]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn canned_shortcut_expands_to_combo() {
        let (dispatcher, sink) = dispatcher_with_mock();
        dispatcher.execute("@copy").await;
        let cat = KeyCatalog::with_defaults();
        let ctrl = cat.lookup("ctrl").unwrap();
        let c = cat.lookup("c").unwrap();
        assert_eq!(
            sink.events(),
            vec![(ctrl, true), (c, true), (c, false), (ctrl, false)]
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn bad_key_expression_is_swallowed() {
        let (dispatcher, sink) = dispatcher_with_mock();
        dispatcher.execute("@key:nosuchkey").await;
        assert!(sink.events().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn shell_commands_do_not_touch_the_relay() {
        let (dispatcher, sink) = dispatcher_with_mock();
        dispatcher.execute("true").await;
        assert!(sink.events().is_empty());
    }
}
