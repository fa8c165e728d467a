//! Logical model to SQL DDL.

mod dialect;
mod emit;
mod types;

pub use dialect::Dialect;
pub use emit::emit_sql;
pub use types::map_type;
