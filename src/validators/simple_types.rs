//! Simple-type constraints for leaf text
//!
//! Leaf elements carry exactly one constraint: any string, a UTC timestamp
//! in the fixed `YYYY-MM-DDTHH:MM:SSZ` form, or an enumeration of literals.

use std::fmt;

use chrono::{NaiveDate, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::namespaces::QName;
use crate::XSD_NAMESPACE;

static DATETIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4})-(\d{2})-(\d{2})T(\d{2}):(\d{2}):(\d{2})Z$")
        .expect("dateTime pattern is valid")
});

/// Constraint applied to the text of a simple-typed element
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "values", rename_all = "camelCase")]
pub enum SimpleTypeConstraint {
    /// Any text, including none
    AnyString,
    /// `YYYY-MM-DDTHH:MM:SSZ` naming a real calendar instant
    DateTime,
    /// Exactly one of the listed literals, compared verbatim
    Enumeration(Vec<String>),
}

impl SimpleTypeConstraint {
    /// Build an enumeration, dropping repeated literals but keeping order
    pub fn enumeration<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut literals: Vec<String> = Vec::new();
        for value in values {
            let value = value.into();
            if !literals.contains(&value) {
                literals.push(value);
            }
        }
        Self::Enumeration(literals)
    }

    /// Check a leaf value; the error is a human-readable detail.
    pub fn validate_value(&self, value: &str) -> std::result::Result<(), String> {
        match self {
            Self::AnyString => Ok(()),
            Self::DateTime => validate_datetime(value.trim()),
            Self::Enumeration(literals) => {
                if literals.iter().any(|literal| literal == value) {
                    Ok(())
                } else {
                    Err(format!("value must be one of {}", format_literals(literals)))
                }
            }
        }
    }

    /// True if `value` satisfies the constraint
    pub fn is_valid(&self, value: &str) -> bool {
        self.validate_value(value).is_ok()
    }
}

impl fmt::Display for SimpleTypeConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AnyString => write!(f, "xs:string"),
            Self::DateTime => write!(f, "xs:dateTime"),
            Self::Enumeration(literals) => write!(f, "enumeration {}", format_literals(literals)),
        }
    }
}

fn format_literals(literals: &[String]) -> String {
    let quoted: Vec<String> = literals.iter().map(|l| format!("'{}'", l)).collect();
    format!("[{}]", quoted.join(", "))
}

fn validate_datetime(value: &str) -> std::result::Result<(), String> {
    let caps = DATETIME
        .captures(value)
        .ok_or_else(|| "invalid dateTime format, expected YYYY-MM-DDTHH:MM:SSZ".to_string())?;

    // The pattern guarantees every group is a run of ASCII digits.
    let field = |i: usize| caps[i].parse::<u32>().unwrap_or(u32::MAX);
    let year = caps[1].parse::<i32>().unwrap_or(i32::MAX);

    NaiveDate::from_ymd_opt(year, field(2), field(3))
        .ok_or_else(|| format!("invalid calendar date in '{}'", value))?;
    NaiveTime::from_hms_opt(field(4), field(5), field(6))
        .ok_or_else(|| format!("invalid time of day in '{}'", value))?;
    Ok(())
}

/// Map a built-in XSD simple type name to its constraint
pub fn builtin_constraint(name: &QName) -> Option<SimpleTypeConstraint> {
    if !name.is_in(XSD_NAMESPACE) {
        return None;
    }
    match name.local_name.as_str() {
        "string" | "normalizedString" | "token" | "anySimpleType" => {
            Some(SimpleTypeConstraint::AnyString)
        }
        "dateTime" => Some(SimpleTypeConstraint::DateTime),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_any_string() {
        assert!(SimpleTypeConstraint::AnyString.is_valid(""));
        assert!(SimpleTypeConstraint::AnyString.is_valid("boris.gpx"));
    }

    #[test]
    fn test_datetime_accepts_fixed_pattern() {
        let dt = SimpleTypeConstraint::DateTime;
        assert!(dt.is_valid("2023-10-01T12:00:00Z"));
        assert!(dt.is_valid("  2024-02-29T23:59:59Z\n"));
    }

    #[test]
    fn test_datetime_rejects_other_shapes() {
        let dt = SimpleTypeConstraint::DateTime;
        assert!(!dt.is_valid(""));
        assert!(!dt.is_valid("2023-10-01"));
        assert!(!dt.is_valid("2023-10-01T12:00:00"));
        assert!(!dt.is_valid("2023-10-01T12:00:00+02:00"));
        assert!(!dt.is_valid("2023-10-01T12:00:00.5Z"));
        assert!(!dt.is_valid("2023-10-01 12:00:00Z"));
    }

    #[test]
    fn test_datetime_rejects_impossible_instants() {
        let dt = SimpleTypeConstraint::DateTime;
        assert!(!dt.is_valid("2023-13-01T12:00:00Z"));
        assert!(!dt.is_valid("2023-02-29T12:00:00Z"));
        assert!(!dt.is_valid("2023-10-01T24:00:00Z"));
        assert!(!dt.is_valid("2023-10-01T12:60:00Z"));
    }

    #[test]
    fn test_enumeration_is_exact() {
        let kind = SimpleTypeConstraint::enumeration(["Running", "Walking", "Cycling", "Running"]);
        assert_eq!(
            kind,
            SimpleTypeConstraint::Enumeration(vec![
                "Running".to_string(),
                "Walking".to_string(),
                "Cycling".to_string()
            ])
        );
        assert!(kind.is_valid("Walking"));
        assert!(!kind.is_valid("walking"));
        assert!(!kind.is_valid(" Walking"));

        let err = kind.validate_value("Sprinting").unwrap_err();
        assert_eq!(err, "value must be one of ['Running', 'Walking', 'Cycling']");
    }

    #[test]
    fn test_builtin_constraint() {
        assert_eq!(
            builtin_constraint(&QName::namespaced(XSD_NAMESPACE, "dateTime")),
            Some(SimpleTypeConstraint::DateTime)
        );
        assert_eq!(
            builtin_constraint(&QName::namespaced(XSD_NAMESPACE, "string")),
            Some(SimpleTypeConstraint::AnyString)
        );
        assert_eq!(builtin_constraint(&QName::namespaced(XSD_NAMESPACE, "decimal")), None);
        assert_eq!(builtin_constraint(&QName::local("string")), None);
    }
}
