//! Emits synthesized key events through a Linux uinput virtual keyboard.
//!
//! An [`InputRelay`] owns the process-wide virtual device. The device is
//! created lazily on first use and kept open until shutdown; if creation
//! fails (usually missing permission on `/dev/uinput`) the emission path
//! stays down for the rest of the process - there is no retry.
//!
//! Emission blocks the calling thread for the duration of the action's
//! timed press/release schedule; async callers should run actions through
//! `spawn_blocking`. The device lock is held across a whole action, so
//! concurrent actions never interleave their events.

use std::{
    sync::{Arc, Mutex},
    thread,
    time::Duration,
};

use keycatalog::{KeyAction, KeyActionKind};
use tracing::{debug, warn};

mod error;
mod sys;

pub use error::{Error, Result};
use sys::UinputSink;

/// How long a single tap stays pressed.
const TAP_HOLD_MS: u64 = 10;
/// Stagger between presses (and between releases) within a combo.
const COMBO_STAGGER_MS: u64 = 5;
/// How long a fully-pressed combo is held before release begins.
const COMBO_HOLD_MS: u64 = 20;
/// Pause between elements of a sequence.
const SEQUENCE_GAP_MS: u64 = 50;

/// Destination for key state changes.
///
/// One call is one logical key event; implementations must make the event
/// visible as a complete state transition (the uinput sink emits a
/// SYN_REPORT after each event).
pub trait EventSink: Send {
    /// Report `code` as pressed (`true`) or released (`false`).
    fn key_event(&mut self, code: u16, pressed: bool) -> Result<()>;
}

/// Lifecycle of the process-wide sink.
enum SinkSlot {
    /// No creation attempt yet.
    Unopened,
    /// Device is up.
    Ready(Box<dyn EventSink>),
    /// Creation failed; stays failed for the process lifetime.
    Failed,
}

impl SinkSlot {
    /// Return the live sink, opening the device on first use.
    fn ensure(&mut self) -> Result<&mut dyn EventSink> {
        if matches!(self, Self::Unopened) {
            match UinputSink::open() {
                Ok(sink) => *self = Self::Ready(Box::new(sink)),
                Err(e) => {
                    warn!(error = %e, "virtual input device creation failed; key emulation disabled");
                    *self = Self::Failed;
                    return Err(e);
                }
            }
        }
        match self {
            Self::Ready(sink) => Ok(&mut **sink),
            _ => Err(Error::Unavailable),
        }
    }
}

/// Drives the virtual keyboard for parsed key actions and media key taps.
#[derive(Clone)]
pub struct InputRelay {
    /// Shared slot; the lock is held for a whole emission.
    inner: Arc<Mutex<SinkSlot>>,
}

impl Default for InputRelay {
    fn default() -> Self {
        Self::new()
    }
}

impl InputRelay {
    /// Create a relay that lazily opens the real uinput device.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(SinkSlot::Unopened)),
        }
    }

    /// Create a relay over a caller-supplied sink. Used by tests and
    /// diagnostics to observe emission without a kernel device.
    pub fn with_sink(sink: Box<dyn EventSink>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SinkSlot::Ready(sink))),
        }
    }

    /// Emit the full press/release schedule for `action`.
    pub fn run(&self, action: &KeyAction) -> Result<()> {
        let mut slot = self
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let sink = slot.ensure()?;
        match &action.kind {
            KeyActionKind::Single(code) => tap_timed(sink, *code, TAP_HOLD_MS)?,
            KeyActionKind::Combo(codes) => {
                for code in codes {
                    sink.key_event(*code, true)?;
                    pause(COMBO_STAGGER_MS);
                }
                pause(COMBO_HOLD_MS);
                // Release in reverse order, mirroring how modifiers come up
                // on a physical keyboard.
                for code in codes.iter().rev() {
                    sink.key_event(*code, false)?;
                    pause(COMBO_STAGGER_MS);
                }
            }
            KeyActionKind::Sequence(codes) => {
                for (i, code) in codes.iter().enumerate() {
                    tap_timed(sink, *code, TAP_HOLD_MS)?;
                    if i + 1 < codes.len() {
                        pause(SEQUENCE_GAP_MS);
                    }
                }
            }
            KeyActionKind::Hold { code, duration_ms } => {
                tap_timed(sink, *code, *duration_ms)?;
            }
        }
        debug!(action = %action.description, "emitted key action");
        Ok(())
    }

    /// Press and release `code` with no settling delay. Used for media
    /// transport keys.
    pub fn tap(&self, code: u16) -> Result<()> {
        let mut slot = self
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let sink = slot.ensure()?;
        sink.key_event(code, true)?;
        sink.key_event(code, false)
    }
}

/// Press, wait, release.
fn tap_timed(sink: &mut dyn EventSink, code: u16, hold_ms: u64) -> Result<()> {
    sink.key_event(code, true)?;
    pause(hold_ms);
    sink.key_event(code, false)
}

/// Blocking delay between events.
fn pause(ms: u64) {
    thread::sleep(Duration::from_millis(ms));
}

/// Recording sink for tests.
#[cfg(any(test, feature = "test-utils"))]
#[derive(Clone, Default)]
pub struct MockSink {
    /// Recorded `(code, pressed)` events, in emission order.
    events: Arc<Mutex<Vec<(u16, bool)>>>,
    /// When set, fail after this many events have been recorded.
    fail_after: Option<usize>,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockSink {
    /// Create a sink that records every event.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sink that errors once `limit` events have been recorded.
    pub fn failing_after(limit: usize) -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
            fail_after: Some(limit),
        }
    }

    /// Snapshot of the recorded events.
    pub fn events(&self) -> Vec<(u16, bool)> {
        self.events
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl EventSink for MockSink {
    fn key_event(&mut self, code: u16, pressed: bool) -> Result<()> {
        let mut events = self
            .events
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(limit) = self.fail_after
            && events.len() >= limit
        {
            return Err(Error::Unavailable);
        }
        events.push((code, pressed));
        Ok(())
    }
}
