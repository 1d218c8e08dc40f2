//! Coercion of loosely-typed request input into typed field values.
//!
//! Request bodies arrive either as JSON objects or as multipart forms whose
//! text parts are all strings. Both are normalized here against a
//! [`ResourceDef`] so the rest of the crate only sees [`FieldValue`]s.
//!
//! Rules:
//!
//! - unknown keys and the managed columns (`id`, `created_at`, `updated_at`)
//!   are ignored
//! - an absent key leaves the field unchanged on update
//! - `null` clears an optional field; booleans clear to `false` and lists to `[]`
//! - an empty string clears optional non-text fields (what an empty form input sends)
//! - required fields must be present on create and can never be cleared

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{Map, Value, json};
use std::collections::{BTreeMap, HashMap};
use validator::{ValidateEmail, ValidateUrl};

use crate::domain::catalog::{FieldDef, FieldKind, MANAGED_COLUMNS, ResourceDef};
use crate::domain::entities::{ContentInput, FieldValue};
use crate::error::AppError;

/// Nesting limit for list normalization (arrays inside JSON-encoded strings).
const MAX_LIST_DEPTH: usize = 4;

/// Whether input is validated for a new record or a partial update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Create,
    Update,
}

/// Validates and converts a raw request object for `resource`.
///
/// All field errors are collected and reported together.
///
/// # Errors
///
/// Returns [`AppError::Validation`] with `details.fields` mapping each
/// offending field to a message.
pub fn coerce(
    resource: &ResourceDef,
    raw: &Map<String, Value>,
    mode: Mode,
) -> Result<ContentInput, AppError> {
    let mut input = ContentInput::default();
    let mut errors: BTreeMap<&str, String> = BTreeMap::new();

    for field in resource.fields {
        if MANAGED_COLUMNS.contains(&field.name) {
            continue;
        }

        let generated = resource.has_slug() && field.name == "slug";

        match raw.get(field.name) {
            None => {
                if mode == Mode::Create && field.required && !generated {
                    errors.insert(field.name, "is required".to_string());
                }
            }
            Some(value) => match coerce_field(field, value) {
                Ok(FieldValue::Null) if field.required => {
                    if !(generated && mode == Mode::Create) {
                        errors.insert(field.name, "cannot be empty".to_string());
                    }
                }
                Ok(v) => {
                    input.values.insert(field.name, v);
                }
                Err(message) => {
                    errors.insert(field.name, message);
                }
            },
        }
    }

    for (assoc, input_key) in resource.link_inputs() {
        let Some(value) = raw.get(input_key) else {
            continue;
        };

        match parse_id_list(value) {
            Ok(ids) => {
                input.links.insert(assoc.key, ids);
            }
            Err(message) => {
                errors.insert(input_key, message);
            }
        }
    }

    if !errors.is_empty() {
        return Err(AppError::bad_request(
            "Validation failed",
            json!({ "resource": resource.name, "fields": errors }),
        ));
    }

    Ok(input)
}

/// Parses `?field=value` list filters for `resource`.
///
/// Only text, boolean, integer and reference fields can be filtered.
///
/// # Errors
///
/// Returns [`AppError::Validation`] for unknown or non-filterable fields and
/// for values that don't match the field type.
pub fn parse_filters(
    resource: &ResourceDef,
    params: &HashMap<String, String>,
) -> Result<Vec<(&'static str, FieldValue)>, AppError> {
    let mut keys: Vec<&String> = params.keys().collect();
    keys.sort();

    let mut filters = Vec::with_capacity(keys.len());

    for key in keys {
        let field = resource
            .field(key)
            .filter(|f| f.kind.is_filterable())
            .ok_or_else(|| {
                AppError::bad_request(
                    "Unknown filter",
                    json!({ "resource": resource.name, "filter": key }),
                )
            })?;

        let value = coerce_value(field.kind, &Value::String(params[key].clone())).map_err(
            |message| {
                AppError::bad_request(
                    "Invalid filter value",
                    json!({ "filter": key, "message": message }),
                )
            },
        )?;

        filters.push((field.name, value));
    }

    Ok(filters)
}

fn coerce_field(field: &FieldDef, value: &Value) -> Result<FieldValue, String> {
    if value.is_null() {
        return Ok(null_value(field.kind));
    }

    if let Value::String(s) = value {
        let blank = s.trim().is_empty();
        match field.kind {
            FieldKind::Text | FieldKind::LongText => {
                if blank && field.required {
                    return Ok(FieldValue::Null);
                }
            }
            FieldKind::List | FieldKind::Boolean => {}
            _ if blank => return Ok(null_value(field.kind)),
            _ => {}
        }
    }

    coerce_value(field.kind, value)
}

fn null_value(kind: FieldKind) -> FieldValue {
    match kind {
        FieldKind::Boolean => FieldValue::Boolean(false),
        FieldKind::List => FieldValue::List(Vec::new()),
        _ => FieldValue::Null,
    }
}

fn coerce_value(kind: FieldKind, value: &Value) -> Result<FieldValue, String> {
    match kind {
        FieldKind::Text | FieldKind::LongText => match value {
            Value::String(s) => Ok(FieldValue::Text(s.clone())),
            Value::Number(n) => Ok(FieldValue::Text(n.to_string())),
            Value::Bool(b) => Ok(FieldValue::Text(b.to_string())),
            _ => Err("expected text".to_string()),
        },
        FieldKind::Email => {
            let s = expect_string(value)?.trim().to_string();
            if !s.validate_email() {
                return Err("invalid email address".to_string());
            }
            Ok(FieldValue::Text(s))
        }
        FieldKind::Url => {
            let s = expect_string(value)?.trim().to_string();
            if !s.validate_url() {
                return Err("invalid URL".to_string());
            }
            Ok(FieldValue::Text(s))
        }
        FieldKind::Image => {
            let s = expect_string(value)?.trim().to_string();
            if !(s.starts_with('/') || s.validate_url()) {
                return Err("expected an image URL or an uploaded file".to_string());
            }
            Ok(FieldValue::Text(s))
        }
        FieldKind::Integer => parse_integer(value).map(FieldValue::Integer),
        FieldKind::Reference(target) => {
            let id = parse_integer(value)?;
            if id <= 0 {
                return Err(format!("expected a {target} id"));
            }
            Ok(FieldValue::Integer(id))
        }
        FieldKind::Float => parse_float(value).map(FieldValue::Float),
        FieldKind::Boolean => parse_bool(value).map(FieldValue::Boolean),
        FieldKind::Timestamp => parse_timestamp(expect_string(value)?).map(FieldValue::Timestamp),
        FieldKind::List => normalize_list(value).map(FieldValue::List),
    }
}

fn expect_string(value: &Value) -> Result<&str, String> {
    value.as_str().ok_or_else(|| "expected a string".to_string())
}

fn parse_integer(value: &Value) -> Result<i64, String> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && (i64::MIN as f64..i64::MAX as f64).contains(f))
                    .map(|f| f as i64)
            })
            .ok_or_else(|| "expected an integer".to_string()),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| "expected an integer".to_string()),
        _ => Err("expected an integer".to_string()),
    }
}

fn parse_float(value: &Value) -> Result<f64, String> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    parsed
        .filter(|f| f.is_finite())
        .ok_or_else(|| "expected a number".to_string())
}

fn parse_bool(value: &Value) -> Result<bool, String> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err("expected a boolean".to_string()),
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "on" | "yes" => Ok(true),
            "false" | "0" | "off" | "no" | "" => Ok(false),
            _ => Err("expected a boolean".to_string()),
        },
        _ => Err("expected a boolean".to_string()),
    }
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, String> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| "expected an RFC 3339 timestamp or YYYY-MM-DD date".to_string())
}

/// Normalizes list input into a flat list of non-empty strings.
///
/// Accepts a JSON array, a string holding a JSON array (possibly encoded more
/// than once), or a comma-separated string. Nested arrays are flattened.
pub fn normalize_list(value: &Value) -> Result<Vec<String>, String> {
    let mut out = Vec::new();
    collect_list(value, &mut out, 0, true)?;
    Ok(out)
}

fn collect_list(
    value: &Value,
    out: &mut Vec<String>,
    depth: usize,
    split_commas: bool,
) -> Result<(), String> {
    if depth > MAX_LIST_DEPTH {
        return Err("list is nested too deeply".to_string());
    }

    match value {
        Value::Null => Ok(()),
        Value::Array(items) => {
            for item in items {
                collect_list(item, out, depth + 1, false)?;
            }
            Ok(())
        }
        Value::String(s) => {
            let trimmed = s.trim();

            if (trimmed.starts_with('[') || trimmed.starts_with('"'))
                && let Ok(parsed) = serde_json::from_str::<Value>(trimmed)
            {
                return collect_list(&parsed, out, depth + 1, split_commas);
            }

            if split_commas {
                out.extend(
                    trimmed
                        .split(',')
                        .map(str::trim)
                        .filter(|p| !p.is_empty())
                        .map(str::to_string),
                );
            } else if !trimmed.is_empty() {
                out.push(trimmed.to_string());
            }
            Ok(())
        }
        Value::Number(n) => {
            out.push(n.to_string());
            Ok(())
        }
        Value::Bool(b) => {
            out.push(b.to_string());
            Ok(())
        }
        Value::Object(_) => Err("expected a list of strings".to_string()),
    }
}

fn parse_id_list(value: &Value) -> Result<Vec<i64>, String> {
    let mut ids = Vec::new();

    for item in normalize_list(value)? {
        let id = item
            .parse::<i64>()
            .ok()
            .filter(|id| *id > 0)
            .ok_or_else(|| format!("'{item}' is not a valid id"))?;

        if !ids.contains(&id) {
            ids.push(id);
        }
    }

    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog;

    fn obj(v: Value) -> Map<String, Value> {
        v.as_object().unwrap().clone()
    }

    fn field_errors(err: AppError) -> Value {
        match err {
            AppError::Validation { details, .. } => details["fields"].clone(),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_create_requires_required_fields() {
        let faqs = catalog::find("faqs").unwrap();

        let err = coerce(faqs, &obj(json!({"question": "Why?"})), Mode::Create).unwrap_err();
        let fields = field_errors(err);

        assert_eq!(fields["answer"], "is required");
        assert!(fields.get("question").is_none());
    }

    #[test]
    fn test_update_allows_missing_required_fields() {
        let faqs = catalog::find("faqs").unwrap();

        let input = coerce(faqs, &obj(json!({"category": "General"})), Mode::Update).unwrap();

        assert_eq!(input.values.len(), 1);
        assert_eq!(
            input.values["category"],
            FieldValue::Text("General".to_string())
        );
    }

    #[test]
    fn test_required_field_cannot_be_cleared() {
        let faqs = catalog::find("faqs").unwrap();

        for value in [json!(null), json!("   ")] {
            let err = coerce(faqs, &obj(json!({ "answer": value })), Mode::Update).unwrap_err();
            assert_eq!(field_errors(err)["answer"], "cannot be empty");
        }
    }

    #[test]
    fn test_unknown_and_managed_keys_are_ignored() {
        let faqs = catalog::find("faqs").unwrap();

        let input = coerce(
            faqs,
            &obj(json!({
                "id": 99,
                "created_at": "2020-01-01T00:00:00Z",
                "question": "Q",
                "answer": "A",
                "bogus": true
            })),
            Mode::Create,
        )
        .unwrap();

        let keys: Vec<_> = input.values.keys().copied().collect();
        assert_eq!(keys, vec!["answer", "question"]);
    }

    #[test]
    fn test_null_clears_optional_fields() {
        let events = catalog::find("events").unwrap();

        let input = coerce(
            events,
            &obj(json!({"location": null, "featured": null, "starts_at": ""})),
            Mode::Update,
        )
        .unwrap();

        assert_eq!(input.values["location"], FieldValue::Null);
        assert_eq!(input.values["featured"], FieldValue::Boolean(false));
        assert_eq!(input.values["starts_at"], FieldValue::Null);
    }

    #[test]
    fn test_numeric_strings_are_coerced() {
        let workshops = catalog::find("workshops").unwrap();

        let input = coerce(
            workshops,
            &obj(json!({"title": "Drones", "center_id": "4", "duration_minutes": 90.0})),
            Mode::Create,
        )
        .unwrap();

        assert_eq!(input.values["center_id"], FieldValue::Integer(4));
        assert_eq!(input.values["duration_minutes"], FieldValue::Integer(90));
    }

    #[test]
    fn test_out_of_range_integer_is_rejected() {
        let workshops = catalog::find("workshops").unwrap();

        for value in [json!(1e20), json!(-1e20), json!(12.5)] {
            let err = coerce(
                workshops,
                &obj(json!({"title": "Drones", "duration_minutes": value})),
                Mode::Create,
            )
            .unwrap_err();

            assert_eq!(field_errors(err)["duration_minutes"], "expected an integer");
        }
    }

    #[test]
    fn test_invalid_reference_is_rejected() {
        let workshops = catalog::find("workshops").unwrap();

        let err = coerce(
            workshops,
            &obj(json!({"title": "Drones", "center_id": "-1"})),
            Mode::Create,
        )
        .unwrap_err();

        assert_eq!(field_errors(err)["center_id"], "expected a centers id");
    }

    #[test]
    fn test_float_fields() {
        let centers = catalog::find("centers").unwrap();

        let input = coerce(
            centers,
            &obj(json!({"latitude": "-33.45", "longitude": -70.66})),
            Mode::Update,
        )
        .unwrap();

        assert_eq!(input.values["latitude"], FieldValue::Float(-33.45));
        assert_eq!(input.values["longitude"], FieldValue::Float(-70.66));

        let err = coerce(centers, &obj(json!({"latitude": "north"})), Mode::Update).unwrap_err();
        assert_eq!(field_errors(err)["latitude"], "expected a number");
    }

    #[test]
    fn test_boolean_form_values() {
        for (raw, expected) in [
            (json!("on"), true),
            (json!("TRUE"), true),
            (json!("1"), true),
            (json!(1), true),
            (json!("off"), false),
            (json!("no"), false),
            (json!(0), false),
            (json!(false), false),
        ] {
            assert_eq!(parse_bool(&raw).unwrap(), expected, "{raw}");
        }

        assert!(parse_bool(&json!("maybe")).is_err());
        assert!(parse_bool(&json!(2)).is_err());
    }

    #[test]
    fn test_timestamp_formats() {
        let ts = parse_timestamp("2026-03-14T09:30:00+02:00").unwrap();
        assert_eq!(ts.to_rfc3339(), "2026-03-14T07:30:00+00:00");

        let date = parse_timestamp("2026-03-14").unwrap();
        assert_eq!(date.to_rfc3339(), "2026-03-14T00:00:00+00:00");

        assert!(parse_timestamp("14/03/2026").is_err());
    }

    #[test]
    fn test_email_and_url_validation() {
        let contact = catalog::find("contact_messages").unwrap();

        let err = coerce(
            contact,
            &obj(json!({"name": "Ana", "email": "not-an-email", "message": "Hi"})),
            Mode::Create,
        )
        .unwrap_err();
        assert_eq!(field_errors(err)["email"], "invalid email address");

        let partners = catalog::find("partners").unwrap();
        let err = coerce(partners, &obj(json!({"website": "nope"})), Mode::Update).unwrap_err();
        assert_eq!(field_errors(err)["website"], "invalid URL");
    }

    #[test]
    fn test_image_accepts_relative_and_absolute_urls() {
        let partners = catalog::find("partners").unwrap();

        let input = coerce(
            partners,
            &obj(json!({"logo": "/uploads/partners/abc.png"})),
            Mode::Update,
        )
        .unwrap();
        assert_eq!(
            input.values["logo"],
            FieldValue::Text("/uploads/partners/abc.png".into())
        );

        let input = coerce(
            partners,
            &obj(json!({"logo": "https://cdn.example.org/logo.svg"})),
            Mode::Update,
        )
        .unwrap();
        assert!(matches!(input.values["logo"], FieldValue::Text(_)));
    }

    #[test]
    fn test_normalize_list_shapes() {
        assert_eq!(
            normalize_list(&json!(["a", " b ", ""])).unwrap(),
            vec!["a", "b"]
        );
        assert_eq!(
            normalize_list(&json!("robots, 3D printing ,")).unwrap(),
            vec!["robots", "3D printing"]
        );
        assert_eq!(
            normalize_list(&json!(r#"["a","b"]"#)).unwrap(),
            vec!["a", "b"]
        );
        assert_eq!(
            normalize_list(&json!(r#""[\"a\",\"b\"]""#)).unwrap(),
            vec!["a", "b"]
        );
        assert_eq!(
            normalize_list(&json!([["a", ["b"]], "c"])).unwrap(),
            vec!["a", "b", "c"]
        );
    }

    #[test]
    fn test_normalize_list_keeps_commas_inside_arrays() {
        assert_eq!(
            normalize_list(&json!(["Robots, drones", "Kits"])).unwrap(),
            vec!["Robots, drones", "Kits"]
        );
    }

    #[test]
    fn test_normalize_list_rejects_objects_and_deep_nesting() {
        assert!(normalize_list(&json!([{"a": 1}])).is_err());
        assert!(normalize_list(&json!([[[[[["x"]]]]]])).is_err());
    }

    #[test]
    fn test_slug_may_be_omitted_on_create() {
        let news = catalog::find("news").unwrap();

        let input = coerce(news, &obj(json!({"title": "Open Day"})), Mode::Create).unwrap();
        assert!(!input.values.contains_key("slug"));

        let err = coerce(news, &obj(json!({"slug": null})), Mode::Update).unwrap_err();
        assert_eq!(field_errors(err)["slug"], "cannot be empty");
    }

    #[test]
    fn test_link_ids() {
        let centers = catalog::find("centers").unwrap();

        let input = coerce(
            centers,
            &obj(json!({"laboratory_ids": "[3, 1, 3]"})),
            Mode::Update,
        )
        .unwrap();
        assert_eq!(input.links["laboratories"], vec![3, 1]);

        let input = coerce(centers, &obj(json!({"laboratory_ids": null})), Mode::Update).unwrap();
        assert!(input.links["laboratories"].is_empty());

        let err = coerce(
            centers,
            &obj(json!({"laboratory_ids": ["x"]})),
            Mode::Update,
        )
        .unwrap_err();
        assert!(field_errors(err)["laboratory_ids"].is_string());
    }

    #[test]
    fn test_parse_filters() {
        let news = catalog::find("news").unwrap();
        let params = HashMap::from([
            ("featured".to_string(), "true".to_string()),
            ("author".to_string(), "Ana".to_string()),
        ]);

        let filters = parse_filters(news, &params).unwrap();
        assert_eq!(
            filters,
            vec![
                ("author", FieldValue::Text("Ana".into())),
                ("featured", FieldValue::Boolean(true)),
            ]
        );
    }

    #[test]
    fn test_parse_filters_rejects_unknown_and_unfilterable() {
        let news = catalog::find("news").unwrap();

        let params = HashMap::from([("nope".to_string(), "1".to_string())]);
        assert!(parse_filters(news, &params).is_err());

        let params = HashMap::from([("published_at".to_string(), "2026-01-01".to_string())]);
        assert!(parse_filters(news, &params).is_err());

        let stats = catalog::find("stats").unwrap();
        let params = HashMap::from([("hero_id".to_string(), "abc".to_string())]);
        assert!(parse_filters(stats, &params).is_err());
    }
}
