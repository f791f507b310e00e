use std::sync::OnceLock;

use regex::Regex;

/// Utility for parsing PostgreSQL unique-violation messages raised against
/// the JSONB unique indexes created by schema sync.
///
/// Unique indexes are named `{table}_{field}_key` and index the expression
/// `(data ->> 'field')`, so both the constraint name and the message carry the
/// field.
pub struct ConstraintParser;

/// Compiled regex patterns for constraint parsing, cached for performance
struct RegexPatterns {
    key_value: Regex,
    json_field: Regex,
}

impl RegexPatterns {
    fn new() -> Self {
        Self {
            // Matches "Key (expr)=(value) already exists"; expr may nest parentheses
            key_value: Regex::new(r"Key \((.+)\)=\((.*)\) already exists").unwrap(),
            // Matches the field of a `data ->> 'field'` expression
            json_field: Regex::new(r"->>\s*'([^']+)'").unwrap(),
        }
    }
}

static REGEX_PATTERNS: OnceLock<RegexPatterns> = OnceLock::new();

impl ConstraintParser {
    fn patterns() -> &'static RegexPatterns {
        REGEX_PATTERNS.get_or_init(RegexPatterns::new)
    }

    /// Name of the unique index schema sync creates for `table.field`.
    pub fn unique_index_name(table: &str, field: &str) -> String {
        format!("{}_{}_key", table, field)
    }

    /// Parses a unique violation into `(field, value)`.
    ///
    /// # Arguments
    /// * `table` - The table the statement targeted
    /// * `message` - The database error message
    /// * `constraint_name` - Optional constraint name from the database
    ///
    /// # Returns
    /// Optional tuple of (field, value); the value falls back to
    /// `"duplicate_value"` when the message carries no key detail
    pub fn parse_unique_violation(
        table: &str,
        message: &str,
        constraint_name: Option<&str>,
    ) -> Option<(String, String)> {
        let key_value = Self::extract_key_value_from_message(message);

        let field = constraint_name
            .and_then(|name| Self::parse_unique_index_name(table, name))
            .or_else(|| {
                key_value
                    .as_ref()
                    .map(|(expr, _)| Self::field_from_expression(expr))
            })?;

        let value = key_value
            .map(|(_, value)| value)
            .unwrap_or_else(|| "duplicate_value".to_string());

        Some((field, value))
    }

    /// Recovers the field from a `{table}_{field}_key` index name.
    pub fn parse_unique_index_name(table: &str, constraint_name: &str) -> Option<String> {
        let field = constraint_name
            .strip_prefix(table)?
            .strip_prefix('_')?
            .strip_suffix("_key")?;
        (!field.is_empty()).then(|| field.to_string())
    }

    /// Extracts `(expression, value)` from a "Key (...)=(...)" detail.
    pub fn extract_key_value_from_message(message: &str) -> Option<(String, String)> {
        Self::patterns().key_value.captures(message).and_then(|caps| {
            let expr = caps.get(1)?.as_str().to_string();
            let value = caps.get(2)?.as_str().to_string();
            Some((expr, value))
        })
    }

    /// Turns `(data ->> 'email'::text)` into `email`; plain column names pass through.
    fn field_from_expression(expr: &str) -> String {
        Self::patterns()
            .json_field
            .captures(expr)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| expr.to_string())
    }
}
