use thiserror::Error;

use crate::KeyCatalog;

/// Maximum number of keys in a combo or sequence expression.
pub const MAX_ACTION_KEYS: usize = 8;

/// Hold duration applied when `hold:<key>` omits or garbles the duration.
pub const DEFAULT_HOLD_MS: u64 = 500;

/// Error type for key expression parsing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// The expression contained no key tokens.
    #[error("empty key expression")]
    Empty,
    /// A token did not resolve to a catalog entry.
    #[error("unknown key name '{0}'")]
    UnknownKey(String),
    /// More than [`MAX_ACTION_KEYS`] tokens in a combo or sequence.
    #[error("too many keys in expression: {count} (limit {MAX_ACTION_KEYS})")]
    TooManyKeys {
        /// Number of tokens in the rejected expression.
        count: usize,
    },
}

/// The shape of a parsed key expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyActionKind {
    /// Press and release one key.
    Single(u16),
    /// Press all keys in written order, release in reverse order.
    Combo(Vec<u16>),
    /// Press and release each key in turn.
    Sequence(Vec<u16>),
    /// Hold one key down for a duration.
    Hold {
        /// Keycode to hold.
        code: u16,
        /// Hold duration in milliseconds.
        duration_ms: u64,
    },
}

/// A parsed key expression plus a short human summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyAction {
    /// What to emit.
    pub kind: KeyActionKind,
    /// Human-readable summary for logs and the test-key command.
    pub description: String,
}

impl KeyAction {
    /// Parse a key expression against `catalog`.
    ///
    /// Grammar, first match wins:
    /// 1. `hold:<key>[:<durationMs>]` - duration falls back to
    ///    [`DEFAULT_HOLD_MS`] when omitted or malformed.
    /// 2. Whitespace-separated tokens - a sequence. Each element must be a
    ///    single key name; an embedded combo such as `ctrl+a` is an error.
    /// 3. `+`-separated tokens - a combo, order preserved as written.
    /// 4. A single key name.
    ///
    /// Any token that fails catalog lookup fails the whole parse. Combos and
    /// sequences accept at most [`MAX_ACTION_KEYS`] tokens.
    pub fn parse(catalog: &KeyCatalog, expression: &str) -> Result<Self, ParseError> {
        let expression = expression.trim();
        if expression.is_empty() {
            return Err(ParseError::Empty);
        }

        if let Some(rest) = expression.strip_prefix("hold:") {
            let (name, duration_ms) = match rest.split_once(':') {
                Some((name, duration)) => {
                    (name, duration.parse().unwrap_or(DEFAULT_HOLD_MS))
                }
                None => (rest, DEFAULT_HOLD_MS),
            };
            let code = resolve(catalog, name)?;
            return Ok(Self {
                kind: KeyActionKind::Hold { code, duration_ms },
                description: format!("hold {name} for {duration_ms}ms"),
            });
        }

        if expression.contains(char::is_whitespace) {
            let codes = resolve_all(catalog, expression.split_whitespace())?;
            let description = format!("key sequence of {} keys", codes.len());
            return Ok(Self {
                kind: KeyActionKind::Sequence(codes),
                description,
            });
        }

        if expression.contains('+') {
            let codes = resolve_all(catalog, expression.split('+').filter(|t| !t.is_empty()))?;
            let description = format!("key combo of {} keys", codes.len());
            return Ok(Self {
                kind: KeyActionKind::Combo(codes),
                description,
            });
        }

        let code = resolve(catalog, expression)?;
        Ok(Self {
            kind: KeyActionKind::Single(code),
            description: format!("single key {expression}"),
        })
    }
}

/// Resolve one token or fail the parse.
fn resolve(catalog: &KeyCatalog, name: &str) -> Result<u16, ParseError> {
    catalog
        .lookup(name)
        .ok_or_else(|| ParseError::UnknownKey(name.to_string()))
}

/// Resolve a token stream, enforcing the key-count cap.
fn resolve_all<'a>(
    catalog: &KeyCatalog,
    tokens: impl Iterator<Item = &'a str>,
) -> Result<Vec<u16>, ParseError> {
    let tokens: Vec<&str> = tokens.collect();
    if tokens.is_empty() {
        return Err(ParseError::Empty);
    }
    if tokens.len() > MAX_ACTION_KEYS {
        return Err(ParseError::TooManyKeys {
            count: tokens.len(),
        });
    }
    tokens.into_iter().map(|t| resolve(catalog, t)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> KeyCatalog {
        KeyCatalog::with_defaults()
    }

    #[test]
    fn parse_single() {
        let cat = catalog();
        let action = KeyAction::parse(&cat, "a").expect("parse");
        assert_eq!(action.kind, KeyActionKind::Single(cat.lookup("a").unwrap()));
    }

    #[test]
    fn parse_combo_preserves_written_order() {
        let cat = catalog();
        let action = KeyAction::parse(&cat, "ctrl+c").expect("parse");
        let ctrl = cat.lookup("ctrl").unwrap();
        let c = cat.lookup("c").unwrap();
        assert_eq!(action.kind, KeyActionKind::Combo(vec![ctrl, c]));

        // No modifier-first reordering: write order is press order.
        let action = KeyAction::parse(&cat, "c+ctrl").expect("parse");
        assert_eq!(action.kind, KeyActionKind::Combo(vec![c, ctrl]));
    }

    #[test]
    fn parse_sequence_of_single_keys() {
        let cat = catalog();
        let action = KeyAction::parse(&cat, "a b c").expect("parse");
        let codes = vec![
            cat.lookup("a").unwrap(),
            cat.lookup("b").unwrap(),
            cat.lookup("c").unwrap(),
        ];
        assert_eq!(action.kind, KeyActionKind::Sequence(codes));
    }

    #[test]
    fn combo_inside_sequence_is_rejected() {
        let cat = catalog();
        assert_eq!(
            KeyAction::parse(&cat, "ctrl+a ctrl+c"),
            Err(ParseError::UnknownKey("ctrl+a".to_string()))
        );
    }

    #[test]
    fn parse_hold_with_duration() {
        let cat = catalog();
        let action = KeyAction::parse(&cat, "hold:space:1000").expect("parse");
        assert_eq!(
            action.kind,
            KeyActionKind::Hold {
                code: cat.lookup("space").unwrap(),
                duration_ms: 1000,
            }
        );
    }

    #[test]
    fn hold_duration_defaults_when_omitted_or_malformed() {
        let cat = catalog();
        for spec in ["hold:w", "hold:w:fast"] {
            let action = KeyAction::parse(&cat, spec).expect("parse");
            assert_eq!(
                action.kind,
                KeyActionKind::Hold {
                    code: cat.lookup("w").unwrap(),
                    duration_ms: DEFAULT_HOLD_MS,
                }
            );
        }
    }

    #[test]
    fn unknown_token_fails_whole_parse() {
        let cat = catalog();
        assert_eq!(
            KeyAction::parse(&cat, "ctrl+bogus"),
            Err(ParseError::UnknownKey("bogus".to_string()))
        );
        assert_eq!(
            KeyAction::parse(&cat, "a bogus c"),
            Err(ParseError::UnknownKey("bogus".to_string()))
        );
    }

    #[test]
    fn too_many_tokens_rejected() {
        let cat = catalog();
        assert_eq!(
            KeyAction::parse(&cat, "a b c d e f g h i"),
            Err(ParseError::TooManyKeys { count: 9 })
        );
        assert_eq!(
            KeyAction::parse(&cat, "a+b+c+d+e+f+g+h+i"),
            Err(ParseError::TooManyKeys { count: 9 })
        );
    }

    #[test]
    fn empty_expression_rejected() {
        let cat = catalog();
        assert_eq!(KeyAction::parse(&cat, ""), Err(ParseError::Empty));
        assert_eq!(KeyAction::parse(&cat, "   "), Err(ParseError::Empty));
        assert_eq!(KeyAction::parse(&cat, "+"), Err(ParseError::Empty));
    }

    #[test]
    fn hold_of_unknown_key_rejected() {
        let cat = catalog();
        assert_eq!(
            KeyAction::parse(&cat, "hold:bogus:100"),
            Err(ParseError::UnknownKey("bogus".to_string()))
        );
    }
}
