//! SQL type conversion utilities
//!
//! This module handles conversion between schema descriptors, PostgreSQL
//! type names and placeholder styles.

use crate::types::{ColumnKind, DecodeKind, FieldSpec};

/// Map a schema field to a PostgreSQL column type for DDL generation
pub fn pg_type_for(spec: &FieldSpec) -> String {
    match spec.kind {
        ColumnKind::SmallInt => "SMALLINT".to_string(),
        ColumnKind::Integer if spec.auto_increment => "SERIAL".to_string(),
        ColumnKind::Integer => "INTEGER".to_string(),
        ColumnKind::BigInt if spec.auto_increment => "BIGSERIAL".to_string(),
        ColumnKind::BigInt => "BIGINT".to_string(),
        ColumnKind::Float => "REAL".to_string(),
        ColumnKind::Double => "DOUBLE PRECISION".to_string(),
        ColumnKind::Decimal => match spec.length {
            Some(precision) => format!("NUMERIC({})", precision),
            None => "NUMERIC".to_string(),
        },
        ColumnKind::Boolean => "BOOLEAN".to_string(),
        ColumnKind::Varchar => match spec.length {
            Some(length) => format!("VARCHAR({})", length),
            None => "VARCHAR".to_string(),
        },
        ColumnKind::Text => "TEXT".to_string(),
        ColumnKind::Timestamp => "TIMESTAMP WITH TIME ZONE".to_string(),
        ColumnKind::Date => "DATE".to_string(),
        ColumnKind::Json => "JSONB".to_string(),
        ColumnKind::Uuid => "UUID".to_string(),
    }
}

/// Render one column definition of a CREATE TABLE statement
pub fn column_definition_sql(name: &str, spec: &FieldSpec, primary_key: bool) -> String {
    let mut sql = format!("{} {}", name, pg_type_for(spec));

    if primary_key {
        sql.push_str(" PRIMARY KEY");
    } else if !spec.nullable {
        sql.push_str(" NOT NULL");
    }

    if let Some(default) = &spec.default {
        sql.push_str(" DEFAULT ");
        sql.push_str(default);
    }

    sql
}

/// Decide how to decode a result column from its PostgreSQL type name
pub fn decode_kind_for_pg_type(type_name: &str) -> DecodeKind {
    match type_name.to_ascii_uppercase().as_str() {
        "INT2" | "SMALLINT" | "SMALLSERIAL" => DecodeKind::SmallInt,
        "INT4" | "INT" | "INTEGER" | "SERIAL" => DecodeKind::Integer,
        "INT8" | "BIGINT" | "BIGSERIAL" => DecodeKind::BigInt,
        "FLOAT4" | "REAL" => DecodeKind::Real,
        "FLOAT8" | "DOUBLE PRECISION" => DecodeKind::Double,
        "BOOL" | "BOOLEAN" => DecodeKind::Boolean,
        "TEXT" | "VARCHAR" | "BPCHAR" | "CHAR" | "NAME" | "CITEXT" => DecodeKind::Text,
        "TIMESTAMPTZ" => DecodeKind::TimestampTz,
        "TIMESTAMP" => DecodeKind::Timestamp,
        "DATE" => DecodeKind::Date,
        "UUID" => DecodeKind::Uuid,
        "JSON" | "JSONB" => DecodeKind::Json,
        _ => DecodeKind::Other,
    }
}

/// Rewrite `?` placeholders into PostgreSQL `$1, $2, ...` style.
///
/// Question marks inside single-quoted literals are left untouched.
pub fn numbered_placeholders(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut counter = 0;
    let mut in_literal = false;

    for c in sql.chars() {
        match c {
            '\'' => {
                in_literal = !in_literal;
                out.push(c);
            }
            '?' if !in_literal => {
                counter += 1;
                out.push('$');
                out.push_str(&counter.to_string());
            }
            _ => out.push(c),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pg_type_for_auto_increment() {
        assert_eq!(pg_type_for(&FieldSpec::integer().auto_increment()), "SERIAL");
        assert_eq!(pg_type_for(&FieldSpec::big_integer().auto_increment()), "BIGSERIAL");
        assert_eq!(pg_type_for(&FieldSpec::integer()), "INTEGER");
    }

    #[test]
    fn test_pg_type_for_lengths() {
        assert_eq!(pg_type_for(&FieldSpec::varchar(120)), "VARCHAR(120)");
        assert_eq!(pg_type_for(&FieldSpec::new(ColumnKind::Varchar)), "VARCHAR");
        assert_eq!(
            pg_type_for(&FieldSpec::new(ColumnKind::Decimal).with_length(12)),
            "NUMERIC(12)"
        );
    }

    #[test]
    fn test_column_definition_sql() {
        let sql = column_definition_sql("id", &FieldSpec::integer().auto_increment(), true);
        assert_eq!(sql, "id SERIAL PRIMARY KEY");

        let sql = column_definition_sql(
            "active",
            &FieldSpec::boolean().not_null().with_default("TRUE"),
            false,
        );
        assert_eq!(sql, "active BOOLEAN NOT NULL DEFAULT TRUE");
    }

    #[test]
    fn test_decode_kind_for_pg_type() {
        assert_eq!(decode_kind_for_pg_type("INT4"), DecodeKind::Integer);
        assert_eq!(decode_kind_for_pg_type("timestamptz"), DecodeKind::TimestampTz);
        assert_eq!(decode_kind_for_pg_type("JSONB"), DecodeKind::Json);
        assert_eq!(decode_kind_for_pg_type("INTERVAL"), DecodeKind::Other);
    }

    #[test]
    fn test_numbered_placeholders() {
        assert_eq!(
            numbered_placeholders("a = ? AND b IN (?, ?)"),
            "a = $1 AND b IN ($2, $3)"
        );
        assert_eq!(
            numbered_placeholders("note = 'why?' AND id = ?"),
            "note = 'why?' AND id = $1"
        );
    }
}
