//! Target SQL dialect.

use serde::{Deserialize, Serialize};
use std::fmt;

/// PostgreSQL reserved key words (lowercase, sorted for `binary_search`).
const POSTGRES_RESERVED: &[&str] = &[
    "all", "analyse", "analyze", "and", "any", "array", "as", "asc", "asymmetric", "both",
    "case", "cast", "check", "collate", "column", "constraint", "create", "current_catalog",
    "current_date", "current_role", "current_time", "current_timestamp", "current_user",
    "default", "deferrable", "desc", "distinct", "do", "else", "end", "except", "false",
    "fetch", "for", "foreign", "from", "grant", "group", "having", "in", "initially",
    "intersect", "into", "lateral", "leading", "limit", "localtime", "localtimestamp", "not",
    "null", "offset", "on", "only", "or", "order", "placing", "primary", "references",
    "returning", "select", "session_user", "some", "symmetric", "system_user", "table", "then",
    "to", "trailing", "true", "union", "unique", "user", "using", "variadic", "when", "where",
    "window", "with",
];

/// SQL dialect variants. Only PostgreSQL is generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    PostgreSQL,
}

impl Dialect {
    /// Parse dialect from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Some(Self::PostgreSQL),
            _ => None,
        }
    }

    /// Whether `ident` is a reserved key word, ignoring case.
    pub fn is_reserved(self, ident: &str) -> bool {
        match self {
            Self::PostgreSQL => POSTGRES_RESERVED
                .binary_search(&ident.to_lowercase().as_str())
                .is_ok(),
        }
    }

    /// Quote an identifier when it is not a plain identifier or is reserved.
    pub fn quote_ident(self, ident: &str) -> String {
        match self {
            Self::PostgreSQL => {
                let plain = ident
                    .chars()
                    .next()
                    .is_some_and(|c| c.is_alphabetic() || c == '_')
                    && ident.chars().all(|c| c.is_alphanumeric() || c == '_')
                    && !self.is_reserved(ident);
                if plain {
                    ident.to_string()
                } else {
                    format!("\"{}\"", ident.replace('"', "\"\""))
                }
            }
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PostgreSQL => f.write_str("PostgreSQL"),
        }
    }
}
