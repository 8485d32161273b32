//! Identifier validation
//!
//! Table and key names are interpolated into SQL text, so they are checked
//! before a model class is accepted.

use thiserror::Error;

/// Longest identifier PostgreSQL keeps without truncating
const MAX_IDENTIFIER_LENGTH: usize = 63;

const RESERVED_WORDS: &[&str] = &[
    "ALL", "ALTER", "AND", "AS", "BETWEEN", "BY", "CHECK", "CONSTRAINT", "CREATE", "DEFAULT",
    "DELETE", "DISTINCT", "DROP", "FALSE", "FOREIGN", "FROM", "GROUP", "HAVING", "IN", "INDEX",
    "INSERT", "JOIN", "LIKE", "LIMIT", "NOT", "NULL", "OFFSET", "ON", "OR", "ORDER", "PRIMARY",
    "REFERENCES", "RETURNING", "SELECT", "TABLE", "TRUE", "UNION", "UNIQUE", "UPDATE", "USER",
    "WHERE",
];

/// Why an identifier can't be placed into generated SQL
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("identifier is empty")]
    Empty,
    #[error("identifier '{name}' is {length} characters long (at most {max_length})")]
    TooLong {
        name: String,
        length: usize,
        max_length: usize,
    },
    #[error("identifier '{0}' must start with a letter or underscore")]
    InvalidStartCharacter(String),
    #[error("identifier '{0}' may only contain ASCII letters, digits and underscores")]
    InvalidCharacters(String),
    #[error("identifier '{0}' is a reserved word")]
    ReservedKeyword(String),
}

/// Column names are bare identifiers (`user_id`)
pub fn validate_column_name(name: &str) -> Result<(), ValidationError> {
    check_identifier(name)
}

/// Table names may carry a schema (`audit.events`); each segment is checked
pub fn validate_table_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::Empty);
    }
    name.split('.').try_for_each(check_identifier)
}

fn check_identifier(name: &str) -> Result<(), ValidationError> {
    let Some(first) = name.chars().next() else {
        return Err(ValidationError::Empty);
    };

    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(ValidationError::TooLong {
            name: name.to_string(),
            length: name.len(),
            max_length: MAX_IDENTIFIER_LENGTH,
        });
    }
    if first != '_' && !first.is_ascii_alphabetic() {
        return Err(ValidationError::InvalidStartCharacter(name.to_string()));
    }
    if name.chars().any(|c| c != '_' && !c.is_ascii_alphanumeric()) {
        return Err(ValidationError::InvalidCharacters(name.to_string()));
    }
    if RESERVED_WORDS
        .iter()
        .any(|word| word.eq_ignore_ascii_case(name))
    {
        return Err(ValidationError::ReservedKeyword(name.to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        for name in ["users", "user_profiles", "_private", "table123", "audit.events"] {
            assert!(validate_table_name(name).is_ok(), "should accept {}", name);
        }
        assert!(validate_column_name(&"a".repeat(63)).is_ok());
    }

    #[test]
    fn test_invalid_names() {
        let test_cases = [
            ("", ValidationError::Empty),
            (
                "123table",
                ValidationError::InvalidStartCharacter("123table".to_string()),
            ),
            (
                "user-name",
                ValidationError::InvalidCharacters("user-name".to_string()),
            ),
            (
                "select",
                ValidationError::ReservedKeyword("select".to_string()),
            ),
            ("audit.", ValidationError::Empty),
        ];

        for (name, expected_error) in test_cases {
            assert_eq!(validate_table_name(name).unwrap_err(), expected_error);
        }
    }

    #[test]
    fn test_qualified_column_names_are_rejected() {
        assert_eq!(
            validate_column_name("users.id").unwrap_err(),
            ValidationError::InvalidCharacters("users.id".to_string())
        );
    }

    #[test]
    fn test_too_long_name() {
        match validate_column_name(&"a".repeat(64)).unwrap_err() {
            ValidationError::TooLong {
                length, max_length, ..
            } => {
                assert_eq!(length, 64);
                assert_eq!(max_length, 63);
            }
            other => panic!("Expected TooLong error, got {:?}", other),
        }
    }
}
