use std::{collections::BTreeMap, fmt, sync::OnceLock};

use regex::Regex;

/// A single field constraint. Chains of these run in order and stop at the
/// first failure for a field.
#[derive(Debug, Clone, Copy)]
pub enum Rule {
    Required,
    /// Lets an empty value through and skips the rest of the chain.
    Optional,
    Length(usize, usize),
    Email,
    Url,
}

impl Rule {
    fn check(&self, value: &str) -> Result<(), String> {
        match *self {
            Rule::Required if value.trim().is_empty() => Err("This field is required.".into()),
            Rule::Length(min, max) => {
                let length = value.chars().count();
                if length < min || length > max {
                    Err(format!(
                        "Field must be between {} and {} characters long.",
                        min, max
                    ))
                } else {
                    Ok(())
                }
            }
            Rule::Email if !is_email(value) => Err("Invalid email address.".into()),
            Rule::Url if !is_http_url(value) => Err("Invalid URL.".into()),
            _ => Ok(()),
        }
    }
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s.]+(\.[^@\s.]+)+$").expect("email pattern is valid")
    })
}

fn is_email(value: &str) -> bool {
    email_pattern().is_match(value)
}

fn is_http_url(value: &str) -> bool {
    match url::Url::parse(value) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host_str().is_some(),
        Err(_) => false,
    }
}

/// Field-scoped validation failures, keyed by field name.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ValidationErrors {
    fields: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn field(mut self, field: &str, value: &str, rules: &[Rule]) -> Self {
        if matches!(rules.first(), Some(Rule::Optional)) && value.trim().is_empty() {
            return self;
        }
        for rule in rules {
            if let Err(message) = rule.check(value) {
                self.add(field, message);
                break;
            }
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> &BTreeMap<String, Vec<String>> {
        &self.fields
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    pub fn single(field: &str, message: &str) -> Self {
        let mut errors = Self::default();
        errors.add(field, message);
        errors
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<&str> = self.fields.keys().map(String::as_str).collect();
        write!(f, "invalid fields: {}", fields.join(", "))
    }
}

pub trait Validate {
    fn validate(&self) -> Result<(), ValidationErrors>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_stops_at_first_failure() {
        let errors = ValidationErrors::default().field(
            "author",
            "",
            &[Rule::Required, Rule::Length(1, 30)],
        );
        assert_eq!(errors.fields()["author"], vec!["This field is required."]);
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        let name = "é".repeat(30);
        let errors = ValidationErrors::default().field("name", &name, &[Rule::Length(1, 30)]);
        assert!(errors.is_empty());
        let errors =
            ValidationErrors::default().field("name", &"é".repeat(31), &[Rule::Length(1, 30)]);
        assert!(!errors.is_empty());
    }

    #[test]
    fn optional_skips_empty_values_only() {
        let rules = [Rule::Optional, Rule::Url, Rule::Length(0, 255)];
        assert!(ValidationErrors::default().field("site", "", &rules).is_empty());
        assert!(!ValidationErrors::default().field("site", "not a url", &rules).is_empty());
        assert!(ValidationErrors::default()
            .field("site", "https://example.com/me", &rules)
            .is_empty());
    }

    #[test]
    fn email_shape() {
        assert!(is_email("someone@example.com"));
        assert!(!is_email("someone@localhost"));
        assert!(!is_email("someone.example.com"));
        assert!(!is_email("a@b@example.com"));
        assert!(!is_email("some one@example.com"));
        assert!(!is_email("someone@.example.com"));
        assert!(!is_email("someone@example..com"));
    }

    #[test]
    fn only_http_urls_pass() {
        assert!(is_http_url("http://example.com"));
        assert!(!is_http_url("javascript:alert(1)"));
        assert!(!is_http_url("ftp://example.com/file"));
    }
}
