//! Conceptual type to SQL type mapping.

use super::Dialect;
use crate::mcd::SqlType;

/// Map a conceptual type to the dialect's type literal, size included.
pub fn map_type(sql_type: SqlType, dialect: Dialect) -> String {
    match dialect {
        Dialect::PostgreSQL => map_postgres_type(sql_type),
    }
}

fn map_postgres_type(sql_type: SqlType) -> String {
    match sql_type {
        // Integer types
        SqlType::Int => "INT".to_string(),
        SqlType::BigInt => "BIGINT".to_string(),
        SqlType::SmallInt => "SMALLINT".to_string(),

        // String types
        SqlType::Varchar(n) => format!("VARCHAR({})", n),
        SqlType::Char(n) => format!("CHAR({})", n),
        SqlType::Text => "TEXT".to_string(),

        SqlType::Boolean => "BOOLEAN".to_string(),

        // Date/time
        SqlType::Date => "DATE".to_string(),
        SqlType::Time => "TIME".to_string(),
        SqlType::Timestamp => "TIMESTAMP".to_string(),

        // Numeric
        SqlType::Decimal(n) => format!("DECIMAL({})", n),
        SqlType::Float => "REAL".to_string(),
        SqlType::Double => "DOUBLE PRECISION".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_postgres_types() {
        let pg = Dialect::PostgreSQL;
        assert_eq!(map_type(SqlType::Int, pg), "INT");
        assert_eq!(map_type(SqlType::Varchar(255), pg), "VARCHAR(255)");
        assert_eq!(map_type(SqlType::Char(2), pg), "CHAR(2)");
        assert_eq!(map_type(SqlType::Decimal(10), pg), "DECIMAL(10)");
        assert_eq!(map_type(SqlType::Float, pg), "REAL");
        assert_eq!(map_type(SqlType::Double, pg), "DOUBLE PRECISION");
        assert_eq!(map_type(SqlType::Timestamp, pg), "TIMESTAMP");
    }
}
