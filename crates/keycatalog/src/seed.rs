//! Static seed list for the default catalog.

use evdev::Key;

use crate::KeyCatalog;

/// The built-in name set: letters, digits, function keys, navigation and
/// special keys, modifiers, and common symbols. Aliases (return/enter,
/// esc/escape, control/ctrl, win/super) map to the same code.
static SEED: &[(&str, Key, &str)] = &[
    // Letters
    ("a", Key::KEY_A, "Letter A"),
    ("b", Key::KEY_B, "Letter B"),
    ("c", Key::KEY_C, "Letter C"),
    ("d", Key::KEY_D, "Letter D"),
    ("e", Key::KEY_E, "Letter E"),
    ("f", Key::KEY_F, "Letter F"),
    ("g", Key::KEY_G, "Letter G"),
    ("h", Key::KEY_H, "Letter H"),
    ("i", Key::KEY_I, "Letter I"),
    ("j", Key::KEY_J, "Letter J"),
    ("k", Key::KEY_K, "Letter K"),
    ("l", Key::KEY_L, "Letter L"),
    ("m", Key::KEY_M, "Letter M"),
    ("n", Key::KEY_N, "Letter N"),
    ("o", Key::KEY_O, "Letter O"),
    ("p", Key::KEY_P, "Letter P"),
    ("q", Key::KEY_Q, "Letter Q"),
    ("r", Key::KEY_R, "Letter R"),
    ("s", Key::KEY_S, "Letter S"),
    ("t", Key::KEY_T, "Letter T"),
    ("u", Key::KEY_U, "Letter U"),
    ("v", Key::KEY_V, "Letter V"),
    ("w", Key::KEY_W, "Letter W"),
    ("x", Key::KEY_X, "Letter X"),
    ("y", Key::KEY_Y, "Letter Y"),
    ("z", Key::KEY_Z, "Letter Z"),
    // Digits
    ("0", Key::KEY_0, "Number 0"),
    ("1", Key::KEY_1, "Number 1"),
    ("2", Key::KEY_2, "Number 2"),
    ("3", Key::KEY_3, "Number 3"),
    ("4", Key::KEY_4, "Number 4"),
    ("5", Key::KEY_5, "Number 5"),
    ("6", Key::KEY_6, "Number 6"),
    ("7", Key::KEY_7, "Number 7"),
    ("8", Key::KEY_8, "Number 8"),
    ("9", Key::KEY_9, "Number 9"),
    // Function keys
    ("f1", Key::KEY_F1, "Function F1"),
    ("f2", Key::KEY_F2, "Function F2"),
    ("f3", Key::KEY_F3, "Function F3"),
    ("f4", Key::KEY_F4, "Function F4"),
    ("f5", Key::KEY_F5, "Function F5"),
    ("f6", Key::KEY_F6, "Function F6"),
    ("f7", Key::KEY_F7, "Function F7"),
    ("f8", Key::KEY_F8, "Function F8"),
    ("f9", Key::KEY_F9, "Function F9"),
    ("f10", Key::KEY_F10, "Function F10"),
    ("f11", Key::KEY_F11, "Function F11"),
    ("f12", Key::KEY_F12, "Function F12"),
    // Special keys
    ("space", Key::KEY_SPACE, "Space bar"),
    ("enter", Key::KEY_ENTER, "Enter key"),
    ("return", Key::KEY_ENTER, "Return key"),
    ("tab", Key::KEY_TAB, "Tab key"),
    ("escape", Key::KEY_ESC, "Escape key"),
    ("esc", Key::KEY_ESC, "Escape key"),
    ("backspace", Key::KEY_BACKSPACE, "Backspace"),
    ("delete", Key::KEY_DELETE, "Delete key"),
    ("insert", Key::KEY_INSERT, "Insert key"),
    ("home", Key::KEY_HOME, "Home key"),
    ("end", Key::KEY_END, "End key"),
    ("pageup", Key::KEY_PAGEUP, "Page Up"),
    ("pagedown", Key::KEY_PAGEDOWN, "Page Down"),
    ("up", Key::KEY_UP, "Up arrow"),
    ("down", Key::KEY_DOWN, "Down arrow"),
    ("left", Key::KEY_LEFT, "Left arrow"),
    ("right", Key::KEY_RIGHT, "Right arrow"),
    // Modifiers
    ("ctrl", Key::KEY_LEFTCTRL, "Control key"),
    ("control", Key::KEY_LEFTCTRL, "Control key"),
    ("alt", Key::KEY_LEFTALT, "Alt key"),
    ("shift", Key::KEY_LEFTSHIFT, "Shift key"),
    ("super", Key::KEY_LEFTMETA, "Super/Windows key"),
    ("win", Key::KEY_LEFTMETA, "Windows key"),
    ("menu", Key::KEY_MENU, "Menu key"),
    ("printscreen", Key::KEY_SYSRQ, "Print Screen"),
    // Common symbols
    ("minus", Key::KEY_MINUS, "Minus/Hyphen"),
    ("equal", Key::KEY_EQUAL, "Equal sign"),
    ("leftbrace", Key::KEY_LEFTBRACE, "Left bracket"),
    ("rightbrace", Key::KEY_RIGHTBRACE, "Right bracket"),
    ("semicolon", Key::KEY_SEMICOLON, "Semicolon"),
    ("apostrophe", Key::KEY_APOSTROPHE, "Apostrophe"),
    ("grave", Key::KEY_GRAVE, "Grave accent"),
    ("backslash", Key::KEY_BACKSLASH, "Backslash"),
    ("comma", Key::KEY_COMMA, "Comma"),
    ("dot", Key::KEY_DOT, "Period"),
    ("slash", Key::KEY_SLASH, "Forward slash"),
];

impl KeyCatalog {
    /// Build a catalog populated with the built-in name set.
    pub fn with_defaults() -> Self {
        let mut catalog = Self::new();
        for (name, key, description) in SEED {
            catalog
                .insert(name, key.code(), description)
                .expect("seed key names are within the length limit");
        }
        catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_aliases() {
        let cat = KeyCatalog::with_defaults();
        assert_eq!(cat.lookup("enter"), cat.lookup("return"));
        assert_eq!(cat.lookup("esc"), cat.lookup("escape"));
        assert_eq!(cat.lookup("ctrl"), cat.lookup("control"));
        assert_eq!(cat.lookup("super"), cat.lookup("win"));
    }

    #[test]
    fn defaults_use_linux_codes() {
        let cat = KeyCatalog::with_defaults();
        assert_eq!(cat.lookup("a"), Some(Key::KEY_A.code()));
        assert_eq!(cat.lookup("printscreen"), Some(Key::KEY_SYSRQ.code()));
    }

    #[test]
    fn every_seed_name_resolves() {
        let cat = KeyCatalog::with_defaults();
        for (name, _, _) in SEED {
            assert!(cat.lookup(name).is_some(), "seed name {name} must resolve");
        }
    }
}
