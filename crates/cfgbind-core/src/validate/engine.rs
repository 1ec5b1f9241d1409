//! Directive-driven validation of bound values

use std::time::Duration;

use crate::coerce::parse_duration;
use crate::directive::DirectiveSet;
use crate::schema::{FieldKind, Schema};
use crate::types::{format_duration, Typed};
use super::error::{ErrorKind, FieldError};

/// Check one bound value against its directives
///
/// Order: `required` (stops on failure), zero-value skip, `min`/`max`, then
/// `oneof`. Bound literals that do not parse for the field's shape are
/// ignored.
pub fn validate_field(value: &Typed, path: &str, directives: &DirectiveSet) -> Vec<FieldError> {
    let mut errors = Vec::new();
    let value = unwrap_present(value);

    let zero = value.map_or(true, Typed::is_zero);
    if zero {
        if directives.required {
            errors.push(FieldError::new(path, ErrorKind::Required, "field is required"));
        }
        return errors;
    }
    let Some(value) = value else {
        return errors;
    };

    if let Some(min) = &directives.min {
        if let Some(message) = check_bound(value, min.trim(), Bound::Min) {
            errors.push(FieldError::new(path, ErrorKind::Min, message));
        }
    }
    if let Some(max) = &directives.max {
        if let Some(message) = check_bound(value, max.trim(), Bound::Max) {
            errors.push(FieldError::new(path, ErrorKind::Max, message));
        }
    }

    if !directives.allowed.is_empty() {
        let allowed = |candidate: &str| directives.allowed.contains(candidate);
        let ok = match value {
            Typed::TextList(items) => items.iter().all(|item| allowed(item)),
            other => allowed(&other.canonical()),
        };
        if !ok {
            errors.push(FieldError::new(
                path,
                ErrorKind::OneOf,
                format!("must be one of: {}", directives.allowed_list()),
            ));
        }
    }

    errors
}

/// Validate every field of a bound instance in declaration order
pub fn validate_tree<T>(schema: &Schema<T>, target: &T) -> Vec<FieldError> {
    let mut out = Vec::new();
    validate_fields(schema, target, "", &mut out);
    out
}

pub(crate) fn validate_fields<T>(schema: &Schema<T>, target: &T, field_prefix: &str, out: &mut Vec<FieldError>) {
    for field in schema.fields() {
        let field_path = field.field_path(field_prefix);
        match field.kind() {
            FieldKind::Leaf(slot) => {
                out.extend(validate_field(&slot.read(target), &field_path, field.directives()));
            }
            FieldKind::Group(slot) => {
                if !slot.is_present(target) {
                    if field.directives().required {
                        out.push(FieldError::new(field_path, ErrorKind::Required, "field is required"));
                    }
                    continue;
                }
                slot.validate(target, &field_path, out);
            }
        }
    }
}

/// Inner value of an optional, `None` when absent
fn unwrap_present(value: &Typed) -> Option<&Typed> {
    match value {
        Typed::Optional(Some(inner)) => unwrap_present(inner),
        Typed::Optional(None) => None,
        other => Some(other),
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Bound {
    Min,
    Max,
}

impl Bound {
    fn violated<V: PartialOrd>(self, actual: V, limit: V) -> bool {
        match self {
            Bound::Min => actual < limit,
            Bound::Max => actual > limit,
        }
    }

    fn word(self) -> &'static str {
        match self {
            Bound::Min => "at least",
            Bound::Max => "at most",
        }
    }
}

/// Message for a violated bound, `None` when satisfied or not applicable
fn check_bound(value: &Typed, literal: &str, bound: Bound) -> Option<String> {
    let violated = match value {
        Typed::Int(i) => compare_number(i128::from(*i), *i as f64, literal, bound)?,
        Typed::Uint(u) => compare_number(i128::from(*u), *u as f64, literal, bound)?,
        Typed::Float(f) => bound.violated(*f, literal.parse::<f64>().ok()?),
        Typed::Text(s) => {
            let limit = literal.parse::<usize>().ok()?;
            if bound.violated(s.chars().count(), limit) {
                return Some(format!("length must be {} {}", bound.word(), limit));
            }
            false
        }
        Typed::TextList(items) => {
            let limit = literal.parse::<usize>().ok()?;
            if bound.violated(items.len(), limit) {
                return Some(format!("must contain {} {} items", bound.word(), limit));
            }
            false
        }
        Typed::Duration(d) => {
            let limit = parse_duration_bound(literal)?;
            if bound.violated(*d, limit) {
                return Some(format!("must be {} {}", bound.word(), format_duration(limit)));
            }
            false
        }
        Typed::Bool(_) | Typed::Timestamp(_) | Typed::Optional(_) | Typed::Group(_) => false,
    };

    violated.then(|| format!("must be {} {}", bound.word(), literal))
}

fn compare_number(wide: i128, float: f64, literal: &str, bound: Bound) -> Option<bool> {
    if let Ok(limit) = literal.parse::<i128>() {
        return Some(bound.violated(wide, limit));
    }
    literal.parse::<f64>().ok().map(|limit| bound.violated(float, limit))
}

/// Duration literal, or a bare integer of nanoseconds
fn parse_duration_bound(literal: &str) -> Option<Duration> {
    parse_duration(literal)
        .ok()
        .or_else(|| literal.parse::<u64>().ok().map(Duration::from_nanos))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directive::parse;
    use crate::fixtures::{AppConfig, Database, Tls};
    use chrono::{DateTime, Utc};

    fn kinds(errors: &[FieldError]) -> Vec<ErrorKind> {
        errors.iter().map(|e| e.kind).collect()
    }

    #[test]
    fn test_required_zero_stops() {
        let directives = parse("required,min:3,oneof:a,b");
        let errors = validate_field(&Typed::Text(String::new()), "Host", &directives);
        assert_eq!(errors, vec![FieldError::new("Host", ErrorKind::Required, "field is required")]);
    }

    #[test]
    fn test_zero_not_required_skips() {
        let directives = parse("min:1024");
        assert!(validate_field(&Typed::Uint(0), "Port", &directives).is_empty());
        assert!(validate_field(&Typed::Optional(None), "MaxConns", &directives).is_empty());
    }

    #[test]
    fn test_numeric_bounds_inclusive() {
        let directives = parse("min:1024,max:65535");
        assert!(validate_field(&Typed::Uint(1024), "Port", &directives).is_empty());
        assert!(validate_field(&Typed::Uint(65535), "Port", &directives).is_empty());

        let errors = validate_field(&Typed::Uint(1023), "Port", &directives);
        assert_eq!(errors, vec![FieldError::new("Port", ErrorKind::Min, "must be at least 1024")]);

        let directives = parse("max:10");
        let errors = validate_field(&Typed::Int(11), "Retries", &directives);
        assert_eq!(kinds(&errors), vec![ErrorKind::Max]);
    }

    #[test]
    fn test_signed_and_float_bounds() {
        let directives = parse("min:-5,max:2.5");
        assert_eq!(kinds(&validate_field(&Typed::Int(-6), "X", &directives)), vec![ErrorKind::Min]);
        assert!(validate_field(&Typed::Int(2), "X", &directives).is_empty());
        assert_eq!(kinds(&validate_field(&Typed::Int(3), "X", &directives)), vec![ErrorKind::Max]);
        assert_eq!(kinds(&validate_field(&Typed::Float(2.75), "X", &directives)), vec![ErrorKind::Max]);
    }

    #[test]
    fn test_text_length_bounds() {
        let directives = parse("min:3,max:5");
        let errors = validate_field(&Typed::Text("ab".into()), "Name", &directives);
        assert_eq!(errors[0].message, "length must be at least 3");
        // counted in characters, not bytes
        assert!(validate_field(&Typed::Text("héllo".into()), "Name", &directives).is_empty());
        let errors = validate_field(&Typed::Text("toolong".into()), "Name", &directives);
        assert_eq!(errors[0].message, "length must be at most 5");
    }

    #[test]
    fn test_list_length_bounds() {
        let directives = parse("min:1");
        let errors = validate_field(&Typed::TextList(vec![]), "Tags", &directives);
        // empty list is the zero value
        assert!(errors.is_empty());

        let directives = parse("max:1");
        let errors = validate_field(&Typed::TextList(vec!["a".into(), "b".into()]), "Tags", &directives);
        assert_eq!(errors[0].message, "must contain at most 1 items");
    }

    #[test]
    fn test_duration_bounds() {
        let directives = parse("min:1s,max:1m");
        assert!(validate_field(&Typed::Duration(Duration::from_secs(30)), "T", &directives).is_empty());
        let errors = validate_field(&Typed::Duration(Duration::from_millis(500)), "T", &directives);
        assert_eq!(errors[0].message, "must be at least 1s");
        let errors = validate_field(&Typed::Duration(Duration::from_secs(90)), "T", &directives);
        assert_eq!(errors[0].message, "must be at most 1m0s");
    }

    #[test]
    fn test_timestamp_bounds_ignored() {
        let directives = parse("min:2020-01-01");
        let ts: DateTime<Utc> = "2019-01-01T00:00:00Z".parse().unwrap();
        assert!(validate_field(&Typed::Timestamp(ts), "At", &directives).is_empty());
    }

    #[test]
    fn test_unparseable_bound_ignored() {
        let directives = parse("min:lots");
        assert!(validate_field(&Typed::Uint(1), "N", &directives).is_empty());
    }

    #[test]
    fn test_oneof_message_lists_sorted_set() {
        let directives = parse("oneof:prod,staging,dev");
        assert!(validate_field(&Typed::Text("dev".into()), "Env", &directives).is_empty());
        let errors = validate_field(&Typed::Text("qa".into()), "Env", &directives);
        assert_eq!(
            errors,
            vec![FieldError::new("Env", ErrorKind::OneOf, "must be one of: dev, prod, staging")]
        );
    }

    #[test]
    fn test_oneof_on_numbers_and_lists() {
        let directives = parse("oneof:1,2,3");
        assert!(validate_field(&Typed::Uint(2), "Level", &directives).is_empty());
        assert_eq!(kinds(&validate_field(&Typed::Uint(4), "Level", &directives)), vec![ErrorKind::OneOf]);

        let directives = parse("oneof:a,b");
        assert!(validate_field(&Typed::TextList(vec!["a".into(), "b".into()]), "Tags", &directives).is_empty());
        let errors = validate_field(&Typed::TextList(vec!["a".into(), "c".into()]), "Tags", &directives);
        assert_eq!(kinds(&errors), vec![ErrorKind::OneOf]);
    }

    #[test]
    fn test_multiple_errors_on_one_field() {
        let directives = parse("min:5,oneof:aa,bbbbbb");
        let errors = validate_field(&Typed::Text("abc".into()), "Code", &directives);
        assert_eq!(kinds(&errors), vec![ErrorKind::Min, ErrorKind::OneOf]);
    }

    #[test]
    fn test_present_optional_unwrapped() {
        let directives = parse("max:1000");
        let value = Typed::Optional(Some(Box::new(Typed::Uint(5000))));
        assert_eq!(kinds(&validate_field(&value, "MaxConns", &directives)), vec![ErrorKind::Max]);
    }

    #[test]
    fn test_tree_walk() {
        let config = AppConfig {
            host: String::new(),
            port: 80,
            env: "qa".into(),
            database: Database { pool: 0, ..Database::default() },
            tls: Some(Tls::default()),
            ..AppConfig::default()
        };
        let schema = Schema::<AppConfig>::of();
        let errors = validate_tree(&schema, &config);
        let summary: Vec<(&str, ErrorKind)> =
            errors.iter().map(|e| (e.field_path.as_str(), e.kind)).collect();
        assert_eq!(
            summary,
            vec![
                ("Host", ErrorKind::Required),
                ("Port", ErrorKind::Min),
                ("Env", ErrorKind::OneOf),
                ("Tls.Cert", ErrorKind::Required),
                ("Tls.Key", ErrorKind::Required),
            ]
        );
    }

    #[test]
    fn test_absent_optional_group_skipped() {
        let config = AppConfig { host: "h".into(), port: 8080, ..AppConfig::default() };
        let schema = Schema::<AppConfig>::of();
        assert!(validate_tree(&schema, &config).is_empty());
    }
}
