//! String comparisons used by the leaf rules and matchers.

use regex::Regex;

use crate::error::{FilterError, Result};

/// How a candidate string is compared.
#[derive(Debug, Clone)]
pub enum Comparison {
    /// Equality, optionally ignoring case.
    Exact {
        expected: String,
        case_sensitive: bool,
    },
    /// The whole candidate must match the pattern.
    Regex(Regex),
}

impl Comparison {
    /// Case-sensitive equality.
    pub fn exact(expected: impl Into<String>) -> Self {
        Self::Exact {
            expected: expected.into(),
            case_sensitive: true,
        }
    }

    /// Case-insensitive equality (Unicode lowercase folding).
    pub fn exact_ignore_case(expected: impl Into<String>) -> Self {
        Self::Exact {
            expected: expected.into(),
            case_sensitive: false,
        }
    }

    /// Compiles `pattern` anchored at both ends.
    ///
    /// # Errors
    ///
    /// [`FilterError::InvalidConfiguration`] if the pattern does not compile.
    pub fn regex(pattern: &str) -> Result<Self> {
        Regex::new(&format!("^(?:{pattern})$"))
            .map(Self::Regex)
            .map_err(|e| FilterError::invalid_configuration(format!("regex '{pattern}'"), e.to_string()))
    }

    pub fn matches(&self, candidate: &str) -> bool {
        match self {
            Self::Exact {
                expected,
                case_sensitive: true,
            } => candidate == expected,
            Self::Exact {
                expected,
                case_sensitive: false,
            } => candidate
                .chars()
                .flat_map(char::to_lowercase)
                .eq(expected.chars().flat_map(char::to_lowercase)),
            Self::Regex(regex) => regex.is_match(candidate),
        }
    }
}

impl std::fmt::Display for Comparison {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exact {
                expected,
                case_sensitive: true,
            } => write!(f, "equals '{expected}'"),
            Self::Exact { expected, .. } => write!(f, "equals '{expected}' (ignoring case)"),
            Self::Regex(regex) => write!(f, "matches /{}/", regex.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(Comparison::exact("Staff"), "Staff", true; "exact hit")]
    #[test_case(Comparison::exact("Staff"), "staff", false; "exact is case sensitive")]
    #[test_case(Comparison::exact_ignore_case("Staff"), "sTAFF", true; "ignore case")]
    #[test_case(Comparison::exact_ignore_case("STRASSE"), "strasse", true; "ignore case ascii")]
    #[test_case(Comparison::exact_ignore_case("Staff"), "Staffer", false; "ignore case still exact")]
    fn exact(comparison: Comparison, candidate: &str, expected: bool) {
        assert_eq!(comparison.matches(candidate), expected);
    }

    #[test_case("st.*", "staff", true; "prefix")]
    #[test_case("st", "staff", false; "partial match is not enough")]
    #[test_case("a|b", "ab", false; "alternation is anchored as a whole")]
    #[test_case("a|b", "b", true; "alternation")]
    fn regex_is_full_match(pattern: &str, candidate: &str, expected: bool) {
        assert_eq!(Comparison::regex(pattern).unwrap().matches(candidate), expected);
    }

    #[test]
    fn invalid_regex_is_a_configuration_error() {
        let err = Comparison::regex("(unclosed").unwrap_err();
        assert_eq!(err.class(), crate::ErrorClass::Configuration);
    }
}
