//! Media transport control via virtual media keys.
//!
//! Transport commands tap the corresponding media key on the shared virtual
//! device. When the device path is down, each command falls back to spawning
//! the equivalent `playerctl` invocation. The current transport state is an
//! opaque external query (`playerctl status`), cached between refreshes.

use std::{
    fmt,
    process::Stdio,
    sync::{Arc, Mutex},
};

use evdev::Key;
use relayinput::InputRelay;
use tokio::process::Command;
use tracing::{debug, warn};

/// Last observed player transport state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaState {
    /// Player reports it is playing.
    Playing,
    /// Player reports it is paused.
    Paused,
    /// Player reports it is stopped.
    Stopped,
    /// No player, or the probe failed.
    Unknown,
}

impl fmt::Display for MediaState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Playing => "PLAYING",
            Self::Paused => "PAUSED",
            Self::Stopped => "STOPPED",
            Self::Unknown => "UNKNOWN",
        };
        write!(f, "{s}")
    }
}

/// High-level media transport commands over the shared input relay.
#[derive(Clone)]
pub struct MediaController {
    /// Shared virtual device.
    relay: Arc<InputRelay>,
    /// Cached transport state, updated by probes and issued commands.
    state: Arc<Mutex<MediaState>>,
}

impl MediaController {
    /// Controller over `relay`.
    pub fn new(relay: Arc<InputRelay>) -> Self {
        Self {
            relay,
            state: Arc::new(Mutex::new(MediaState::Unknown)),
        }
    }

    /// Last observed transport state without probing.
    pub fn state(&self) -> MediaState {
        *self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Query the external player for its transport state and cache it.
    pub async fn refresh_state(&self) -> MediaState {
        let state = match Command::new("playerctl")
            .arg("status")
            .stdin(Stdio::null())
            .output()
            .await
        {
            Ok(output) => match String::from_utf8_lossy(&output.stdout).trim() {
                "Playing" => MediaState::Playing,
                "Paused" => MediaState::Paused,
                "Stopped" => MediaState::Stopped,
                _ => MediaState::Unknown,
            },
            Err(e) => {
                debug!(error = %e, "media status probe failed");
                MediaState::Unknown
            }
        };
        self.set_state(state);
        state
    }

    /// Toggle between play and pause based on a fresh probe.
    pub async fn play_pause(&self) {
        if self.refresh_state().await == MediaState::Playing {
            self.pause().await;
        } else {
            self.play().await;
        }
    }

    /// Start playback.
    pub async fn play(&self) {
        self.transport(Key::KEY_PLAY, "play", Some(MediaState::Playing))
            .await;
    }

    /// Pause playback.
    pub async fn pause(&self) {
        self.transport(Key::KEY_PAUSE, "pause", Some(MediaState::Paused))
            .await;
    }

    /// Stop playback.
    pub async fn stop(&self) {
        self.transport(Key::KEY_STOPCD, "stop", Some(MediaState::Stopped))
            .await;
    }

    /// Skip to the next track.
    pub async fn next(&self) {
        self.transport(Key::KEY_NEXTSONG, "next", None).await;
    }

    /// Skip to the previous track.
    pub async fn previous(&self) {
        self.transport(Key::KEY_PREVIOUSSONG, "previous", None).await;
    }

    /// Tap a media key; fall back to `playerctl <verb>` when the device is
    /// down. Updates the cached state when the command implies one.
    async fn transport(&self, key: Key, verb: &'static str, new_state: Option<MediaState>) {
        let relay = self.relay.clone();
        let code = key.code();
        let tapped = tokio::task::spawn_blocking(move || relay.tap(code))
            .await
            .map(|r| r.is_ok())
            .unwrap_or(false);
        if tapped {
            debug!(verb, "media key tapped");
        } else {
            debug!(verb, "media key unavailable, falling back to playerctl");
            spawn_playerctl(verb);
        }
        if let Some(state) = new_state {
            self.set_state(state);
        }
    }

    /// Update the cached state.
    fn set_state(&self, state: MediaState) {
        *self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = state;
    }
}

/// Fire-and-forget `playerctl` invocation, reaped by a background task.
fn spawn_playerctl(verb: &'static str) {
    match Command::new("playerctl")
        .arg(verb)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
    {
        Ok(mut child) => {
            tokio::spawn(async move {
                if let Err(e) = child.wait().await {
                    warn!(verb, error = %e, "playerctl fallback did not complete");
                }
            });
        }
        Err(e) => warn!(verb, error = %e, "failed to spawn playerctl fallback"),
    }
}
