//! keycatalog: key names, keycodes, and the key-action grammar.
//!
//! - [`KeyCatalog`]: case-insensitive name-to-keycode table, seeded once at
//!   startup with the full set of supported key names.
//! - [`KeyAction`]: a parsed key expression (single/combo/sequence/hold),
//!   built from the action-language grammar via [`KeyAction::parse`].
//!
//! Keycodes are Linux input event codes as exposed by the `evdev` crate; the
//! catalog stores the raw `u16` values so downstream crates can emit them
//! without caring where they came from.

mod action;
mod catalog;
mod seed;

pub use action::{DEFAULT_HOLD_MS, KeyAction, KeyActionKind, MAX_ACTION_KEYS, ParseError};
pub use catalog::{CatalogError, CatalogStats, KeyCatalog, KeyMapping, MAX_KEY_NAME_LEN};
