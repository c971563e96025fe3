use thiserror::Error;

/// Number of hash buckets. Fixed for the life of a catalog; chains grow
/// without bound.
const BUCKET_COUNT: usize = 256;

/// Longest accepted key name, in bytes.
pub const MAX_KEY_NAME_LEN: usize = 31;

/// Error type for catalog mutations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    /// The key name exceeds [`MAX_KEY_NAME_LEN`].
    #[error("key name '{name}' exceeds {MAX_KEY_NAME_LEN} bytes")]
    NameTooLong {
        /// The offending name.
        name: String,
    },
}

/// A single name-to-keycode mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyMapping {
    /// Symbolic key name, stored as given (compared case-insensitively).
    pub name: String,
    /// Linux input event code.
    pub code: u16,
    /// Human-readable description for listings.
    pub description: String,
}

/// Summary statistics for the catalog's hash table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogStats {
    /// Total number of entries.
    pub entries: usize,
    /// Number of fixed buckets.
    pub buckets: usize,
    /// Buckets holding at least one entry.
    pub used_buckets: usize,
    /// Length of the longest chain.
    pub max_chain: usize,
}

/// Case-insensitive name-to-keycode table.
///
/// Uses a fixed-size bucket array with chaining. Lookup is O(1) average;
/// reverse lookup is a linear scan and is only used for diagnostics.
/// Iteration order (bucket order, then insertion order within a chain) is
/// stable for the life of the catalog.
pub struct KeyCatalog {
    /// Bucket chains, indexed by the case-folded name hash.
    buckets: Vec<Vec<KeyMapping>>,
    /// Entry count across all buckets.
    len: usize,
}

/// djb2 over the case-folded name, reduced to a bucket index.
fn bucket_index(name: &str) -> usize {
    let mut hash: u32 = 5381;
    for byte in name.bytes() {
        hash = hash
            .wrapping_mul(33)
            .wrapping_add(u32::from(byte.to_ascii_lowercase()));
    }
    hash as usize % BUCKET_COUNT
}

impl Default for KeyCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self {
            buckets: vec![Vec::new(); BUCKET_COUNT],
            len: 0,
        }
    }

    /// Insert a mapping, or update the code and description of an existing
    /// entry with the same (case-insensitive) name.
    pub fn insert(&mut self, name: &str, code: u16, description: &str) -> Result<(), CatalogError> {
        if name.len() > MAX_KEY_NAME_LEN {
            return Err(CatalogError::NameTooLong {
                name: name.to_string(),
            });
        }
        let chain = &mut self.buckets[bucket_index(name)];
        if let Some(existing) = chain.iter_mut().find(|m| m.name.eq_ignore_ascii_case(name)) {
            existing.code = code;
            existing.description = description.to_string();
            return Ok(());
        }
        chain.push(KeyMapping {
            name: name.to_string(),
            code,
            description: description.to_string(),
        });
        self.len += 1;
        Ok(())
    }

    /// Resolve a key name to its keycode. Case-insensitive.
    pub fn lookup(&self, name: &str) -> Option<u16> {
        self.buckets[bucket_index(name)]
            .iter()
            .find(|m| m.name.eq_ignore_ascii_case(name))
            .map(|m| m.code)
    }

    /// Reverse lookup: first name registered for `code`.
    ///
    /// Linear scan over all buckets; callers render `None` as "unknown".
    pub fn name_for_code(&self, code: u16) -> Option<&str> {
        self.iter().find(|m| m.code == code).map(|m| m.name.as_str())
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterate over all mappings in stable listing order.
    pub fn iter(&self) -> impl Iterator<Item = &KeyMapping> {
        self.buckets.iter().flat_map(|chain| chain.iter())
    }

    /// Hash table statistics for the diagnostics surface.
    pub fn stats(&self) -> CatalogStats {
        let used_buckets = self.buckets.iter().filter(|c| !c.is_empty()).count();
        let max_chain = self.buckets.iter().map(Vec::len).max().unwrap_or(0);
        CatalogStats {
            entries: self.len,
            buckets: BUCKET_COUNT,
            used_buckets,
            max_chain,
        }
    }
}
