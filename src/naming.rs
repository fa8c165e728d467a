//! Canonical identifiers and deterministic collision handling.
//!
//! Collisions are checked case-insensitively because PostgreSQL folds unquoted
//! identifiers to lower case. A colliding name gets `_2`, `_3`, ... appended,
//! counting in generation order.

use std::collections::HashSet;

/// Turn a conceptual name into an identifier: trimmed, whitespace runs
/// collapsed to a single underscore.
pub fn canonical(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join("_")
}

/// Hands out unique names within one namespace (the model's tables, or the
/// columns of a single table).
#[derive(Debug, Clone, Default)]
pub struct NameSet {
    used: HashSet<String>,
}

impl NameSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.used.contains(&name.to_lowercase())
    }

    /// Claim `base`, or the first free suffixed variant of it.
    pub fn claim(&mut self, base: &str) -> String {
        let base = canonical(base);
        if self.used.insert(base.to_lowercase()) {
            return base;
        }

        let mut n = 2;
        loop {
            let candidate = format!("{}_{}", base, n);
            if self.used.insert(candidate.to_lowercase()) {
                log::trace!("name collision on '{}', resolved to '{}'", base, candidate);
                return candidate;
            }
            n += 1;
        }
    }
}
