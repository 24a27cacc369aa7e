//! Field validation and coercion. Pure single-shot checks; retrying is up to the caller.

use chrono::NaiveDate;
use uuid::Uuid;

/// Default date format: day.month.year.
pub const DEFAULT_DATE_FORMAT: &str = "%d.%m.%Y";

const DEFAULT_MAX_LENGTH: usize = 255;

const AFFIRMATIVE: &[&str] = &["y", "yes", "true", "д", "да"];
const NEGATIVE: &[&str] = &["n", "no", "false", "н", "нет"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind<'a> {
    Text { min_len: usize, max_len: usize },
    Integer { min: i64, max: i64 },
    Date { format: &'a str },
    Boolean,
    Uuid,
    Choice(&'a [&'a str]),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldSpec<'a> {
    pub kind: FieldKind<'a>,
    pub required: bool,
}

impl<'a> FieldSpec<'a> {
    pub const fn text() -> Self {
        FieldSpec {
            kind: FieldKind::Text { min_len: 0, max_len: DEFAULT_MAX_LENGTH },
            required: true,
        }
    }

    pub const fn text_bounded(min_len: usize, max_len: usize) -> Self {
        FieldSpec {
            kind: FieldKind::Text { min_len, max_len },
            required: true,
        }
    }

    pub const fn integer(min: i64, max: i64) -> Self {
        FieldSpec {
            kind: FieldKind::Integer { min, max },
            required: true,
        }
    }

    pub const fn date() -> Self {
        FieldSpec {
            kind: FieldKind::Date { format: DEFAULT_DATE_FORMAT },
            required: true,
        }
    }

    pub const fn date_with_format(format: &'a str) -> Self {
        FieldSpec {
            kind: FieldKind::Date { format },
            required: true,
        }
    }

    pub const fn boolean() -> Self {
        FieldSpec { kind: FieldKind::Boolean, required: true }
    }

    pub const fn uuid() -> Self {
        FieldSpec { kind: FieldKind::Uuid, required: true }
    }

    pub const fn choice(options: &'a [&'a str]) -> Self {
        FieldSpec { kind: FieldKind::Choice(options), required: true }
    }

    pub const fn optional(self) -> Self {
        FieldSpec { required: false, ..self }
    }

    /// PostgreSQL type used to cast a bound value of this kind.
    pub fn pg_type(&self) -> &'static str {
        match self.kind {
            FieldKind::Text { .. } | FieldKind::Choice(_) => "text",
            FieldKind::Integer { .. } => "integer",
            FieldKind::Date { .. } => "date",
            FieldKind::Boolean => "boolean",
            FieldKind::Uuid => "uuid",
        }
    }

    /// Short hint for prompts, e.g. "(dd.mm.yyyy)".
    pub fn hint(&self) -> String {
        match self.kind {
            FieldKind::Text { .. } => String::new(),
            FieldKind::Integer { min, max } if min == i64::MIN && max == i64::MAX => String::new(),
            FieldKind::Integer { min, max } if max == i64::MAX => format!("(>= {})", min),
            FieldKind::Integer { min, max } => format!("({}-{})", min, max),
            FieldKind::Date { format } => format!("({})", format),
            FieldKind::Boolean => "(y/n/да/нет)".to_string(),
            FieldKind::Uuid => "(uuid)".to_string(),
            FieldKind::Choice(options) => format!("({})", options.join(", ")),
        }
    }
}

/// A validated value ready to bind. `Absent` is the explicit null marker for optional empty input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Coerced {
    Absent,
    Text(String),
    Integer(i64),
    Boolean(bool),
    Date(NaiveDate),
    Uuid(Uuid),
}

/// Validate `raw` against `spec`, returning the coerced value or a human-readable reason.
pub fn validate(raw: &str, spec: &FieldSpec<'_>) -> Result<Coerced, String> {
    let input = raw.trim();
    if input.is_empty() {
        return if spec.required {
            Err("is required".to_string())
        } else {
            Ok(Coerced::Absent)
        };
    }
    match spec.kind {
        FieldKind::Text { min_len, max_len } => {
            let len = input.chars().count();
            if len < min_len {
                return Err(format!("must be at least {} characters", min_len));
            }
            if len > max_len {
                return Err(format!("must be at most {} characters", max_len));
            }
            Ok(Coerced::Text(input.to_string()))
        }
        FieldKind::Integer { min, max } => {
            let n: i64 = input.parse().map_err(|_| "must be an integer".to_string())?;
            if n < min || n > max {
                return Err(format!("must be between {} and {}", min, max));
            }
            Ok(Coerced::Integer(n))
        }
        FieldKind::Date { format } => NaiveDate::parse_from_str(input, format)
            .map(Coerced::Date)
            .map_err(|_| format!("must be a date in format {}", format)),
        FieldKind::Boolean => {
            let lower = input.to_lowercase();
            if AFFIRMATIVE.contains(&lower.as_str()) {
                Ok(Coerced::Boolean(true))
            } else if NEGATIVE.contains(&lower.as_str()) {
                Ok(Coerced::Boolean(false))
            } else {
                Err(format!(
                    "must be one of: {} / {}",
                    AFFIRMATIVE.join(", "),
                    NEGATIVE.join(", ")
                ))
            }
        }
        FieldKind::Uuid => parse_canonical_uuid(input)
            .map(Coerced::Uuid)
            .ok_or_else(|| "must be a valid UUID (e.g. 550e8400-e29b-41d4-a716-446655440000)".to_string()),
        FieldKind::Choice(options) => options
            .iter()
            .find(|o| o.to_lowercase() == input.to_lowercase())
            .map(|o| Coerced::Text(o.to_string()))
            .ok_or_else(|| format!("must be one of: {}", options.join(", "))),
    }
}

/// Canonical hyphenated form only; `Uuid::parse_str` alone also accepts simple and braced forms.
fn parse_canonical_uuid(s: &str) -> Option<Uuid> {
    if s.len() != 36 {
        return None;
    }
    Uuid::parse_str(s).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_required_and_optional() {
        let spec = FieldSpec::text();
        assert_eq!(validate("  Pushkin ", &spec), Ok(Coerced::Text("Pushkin".into())));
        assert_eq!(validate("   ", &spec), Err("is required".into()));
        assert_eq!(validate("", &spec.optional()), Ok(Coerced::Absent));
    }

    #[test]
    fn text_length_bounds_count_characters() {
        let spec = FieldSpec::text_bounded(2, 4);
        assert!(validate("a", &spec).is_err());
        assert_eq!(validate("Пушк", &spec), Ok(Coerced::Text("Пушк".into())));
        assert!(validate("abcde", &spec).is_err());
    }

    #[test]
    fn integer_bounds() {
        let spec = FieldSpec::integer(1, 10);
        assert_eq!(validate("7", &spec), Ok(Coerced::Integer(7)));
        assert_eq!(validate("11", &spec), Err("must be between 1 and 10".into()));
        assert_eq!(validate("seven", &spec), Err("must be an integer".into()));
    }

    #[test]
    fn date_uses_day_month_year_by_default() {
        let spec = FieldSpec::date();
        assert_eq!(
            validate("06.06.1799", &spec),
            Ok(Coerced::Date(NaiveDate::from_ymd_opt(1799, 6, 6).unwrap()))
        );
        assert!(validate("1799-06-06", &spec).is_err());
        assert!(validate("31.02.2000", &spec).is_err());
        let iso = FieldSpec::date_with_format("%Y-%m-%d");
        assert!(validate("1799-06-06", &iso).is_ok());
    }

    #[test]
    fn boolean_vocabulary_is_case_insensitive() {
        let spec = FieldSpec::boolean();
        for t in ["y", "YES", "True", "Да", "д"] {
            assert_eq!(validate(t, &spec), Ok(Coerced::Boolean(true)), "{}", t);
        }
        for f in ["n", "No", "FALSE", "НЕТ", "н"] {
            assert_eq!(validate(f, &spec), Ok(Coerced::Boolean(false)), "{}", f);
        }
        assert!(validate("maybe", &spec).is_err());
    }

    #[test]
    fn uuid_must_be_canonical() {
        let spec = FieldSpec::uuid();
        assert!(matches!(
            validate("550e8400-e29b-41d4-a716-446655440000", &spec),
            Ok(Coerced::Uuid(_))
        ));
        assert!(validate("550e8400e29b41d4a716446655440000", &spec).is_err());
        assert!(validate("not-a-uuid", &spec).is_err());
    }

    #[test]
    fn choice_returns_canonical_option() {
        let options = ["Hardcover", "Paperback"];
        let spec = FieldSpec::choice(&options);
        assert_eq!(validate("paperback", &spec), Ok(Coerced::Text("Paperback".into())));
        assert_eq!(
            validate("ebook", &spec),
            Err("must be one of: Hardcover, Paperback".into())
        );
    }

    #[test]
    fn empty_optional_non_text_is_absent() {
        assert_eq!(validate("", &FieldSpec::date().optional()), Ok(Coerced::Absent));
        assert_eq!(validate(" ", &FieldSpec::integer(0, 5)), Err("is required".into()));
    }
}
