//! Composite key namespacing
//!
//! The store keeps all tables in one flat sorted mapping; a composite key
//! is the table name joined to the item key. Plain concatenation would
//! make `("ab", "c")` and `("a", "bc")` collide, so the two parts are
//! joined with a NUL separator and NUL is rejected in both parts at the
//! call boundary. Table enumeration is then a plain prefix scan.

use cascade_core::{Error, Result};

/// Separator between table name and item key inside a composite key
pub(crate) const SEPARATOR: char = '\u{0}';

/// Validate a table name: non-empty, no separator character
pub(crate) fn validate_table_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidArgument(
            "table name must not be empty".to_string(),
        ));
    }
    if name.contains(SEPARATOR) {
        return Err(Error::InvalidArgument(
            "table name must not contain NUL".to_string(),
        ));
    }
    Ok(())
}

/// Validate an item key: no separator character (empty keys are allowed)
pub(crate) fn validate_item_key(key: &str) -> Result<()> {
    if key.contains(SEPARATOR) {
        return Err(Error::InvalidArgument(
            "item key must not contain NUL".to_string(),
        ));
    }
    Ok(())
}

/// Join a table name and item key into a composite key
pub(crate) fn compose(table: &str, key: &str) -> String {
    let mut composite = String::with_capacity(table.len() + key.len() + 1);
    composite.push_str(table);
    composite.push(SEPARATOR);
    composite.push_str(key);
    composite
}

/// The scan prefix covering every key of `table`
pub(crate) fn table_prefix(table: &str) -> String {
    let mut prefix = String::with_capacity(table.len() + 1);
    prefix.push_str(table);
    prefix.push(SEPARATOR);
    prefix
}

/// Split a composite key back into (table, item key)
pub(crate) fn split(composite: &str) -> (&str, &str) {
    composite.split_once(SEPARATOR).unwrap_or((composite, ""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_and_split() {
        let k = compose("events", "e1");
        assert_eq!(split(&k), ("events", "e1"));
        assert_eq!(split(&compose("t", "")), ("t", ""));
    }

    #[test]
    fn test_namespacing_is_unambiguous() {
        // The collision plain concatenation would produce.
        assert_ne!(compose("ab", "c"), compose("a", "bc"));
    }

    #[test]
    fn test_validation() {
        assert!(validate_table_name("events").is_ok());
        assert!(validate_table_name("").is_err());
        assert!(validate_table_name("a\0b").is_err());
        assert!(validate_item_key("").is_ok());
        assert!(validate_item_key("k\0").is_err());
    }

    #[test]
    fn test_prefix_covers_only_own_table() {
        let prefix = table_prefix("a");
        assert!(compose("a", "bc").starts_with(&prefix));
        assert!(!compose("ab", "c").starts_with(&prefix));
    }
}
