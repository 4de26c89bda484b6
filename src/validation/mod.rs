//! Schema validation for candidate records.
//!
//! Each record kind declares its fields in schema order. Validation walks them in
//! that order and reports the first failing constraint as `"<field>" <expectation>`,
//! then rejects any key the schema does not declare. The candidate is never
//! mutated; a normalized, typed copy is returned on success.

mod schemas;

use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::{Map, Value};
use validator::{ValidateEmail, ValidateUrl};

/// A JSON object as received in a request body.
pub type Candidate = Map<String, Value>;

/// The first constraint a candidate failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invalid {
    pub field: String,
    pub expectation: String,
}

impl Invalid {
    pub fn new(field: impl Into<String>, expectation: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            expectation: expectation.into(),
        }
    }
}

impl fmt::Display for Invalid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\" {}", self.field, self.expectation)
    }
}

impl std::error::Error for Invalid {}

/// A record shape that can be validated from a JSON candidate.
pub trait Schema: Sized {
    /// Every key the schema accepts, in the order they are checked.
    const FIELDS: &'static [&'static str];

    fn from_fields(fields: &Fields<'_>) -> Result<Self, Invalid>;
}

/// Validate a candidate against the schema of `S`.
pub fn validate<S: Schema>(candidate: &Candidate) -> Result<S, Invalid> {
    let record = S::from_fields(&Fields::new(candidate))?;

    if let Some(key) = candidate
        .keys()
        .find(|key| !S::FIELDS.contains(&key.as_str()))
    {
        return Err(Invalid::new(key.as_str(), "is not allowed"));
    }

    Ok(record)
}

/// Typed, read-only accessors over a candidate.
pub struct Fields<'a> {
    candidate: &'a Candidate,
}

impl<'a> Fields<'a> {
    pub fn new(candidate: &'a Candidate) -> Self {
        Self { candidate }
    }

    /// `null` is treated the same as a missing key.
    fn get(&self, name: &str) -> Option<&'a Value> {
        self.candidate.get(name).filter(|value| !value.is_null())
    }

    pub fn required_string(&self, name: &str) -> Result<String, Invalid> {
        match self.optional_raw_string(name)? {
            None => Err(Invalid::new(name, "is required")),
            Some(s) if s.trim().is_empty() => Err(Invalid::new(name, "is not allowed to be empty")),
            Some(s) => Ok(s.trim().to_string()),
        }
    }

    /// Empty strings count as absent.
    pub fn optional_string(&self, name: &str) -> Result<Option<String>, Invalid> {
        Ok(self
            .optional_raw_string(name)?
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()))
    }

    fn optional_raw_string(&self, name: &str) -> Result<Option<&'a str>, Invalid> {
        match self.get(name) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(_) => Err(Invalid::new(name, "must be a string")),
        }
    }

    pub fn email(&self, name: &str) -> Result<String, Invalid> {
        let email = self.required_string(name)?;
        if !email.validate_email() {
            return Err(Invalid::new(name, "must be a valid email"));
        }
        Ok(email)
    }

    /// Secrets are taken verbatim, without trimming.
    pub fn secret(&self, name: &str, min_chars: usize) -> Result<String, Invalid> {
        let secret = match self.optional_raw_string(name)? {
            None => return Err(Invalid::new(name, "is required")),
            Some("") => return Err(Invalid::new(name, "is not allowed to be empty")),
            Some(s) => s,
        };
        if secret.chars().count() < min_chars {
            return Err(Invalid::new(
                name,
                format!("length must be at least {} characters long", min_chars),
            ));
        }
        Ok(secret.to_string())
    }

    /// A required string restricted to `allowed`, mapped through `parse`.
    pub fn one_of<T>(
        &self,
        name: &str,
        allowed: &[&str],
        parse: impl Fn(&str) -> Option<T>,
    ) -> Result<T, Invalid> {
        let value = self.required_string(name)?;
        parse(&value).ok_or_else(|| {
            Invalid::new(name, format!("must be one of [{}]", allowed.join(", ")))
        })
    }

    pub fn optional_uri(&self, name: &str) -> Result<Option<String>, Invalid> {
        match self.optional_string(name)? {
            Some(uri) if !uri.validate_url() => Err(Invalid::new(name, "must be a valid uri")),
            other => Ok(other),
        }
    }

    /// Accepts a JSON integer or a string holding one.
    pub fn integer(&self, name: &str) -> Result<i64, Invalid> {
        match self.get(name) {
            None => Err(Invalid::new(name, "is required")),
            Some(Value::Number(n)) => {
                if let Some(i) = n.as_i64() {
                    Ok(i)
                } else {
                    match n.as_f64() {
                        Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(f as i64),
                        _ => Err(Invalid::new(name, "must be an integer")),
                    }
                }
            }
            Some(Value::String(s)) => {
                let s = s.trim();
                if let Ok(i) = s.parse::<i64>() {
                    Ok(i)
                } else if s.parse::<f64>().is_ok() {
                    Err(Invalid::new(name, "must be an integer"))
                } else {
                    Err(Invalid::new(name, "must be a number"))
                }
            }
            Some(_) => Err(Invalid::new(name, "must be a number")),
        }
    }

    /// Accepts a JSON boolean or the strings "true" / "false".
    pub fn boolean(&self, name: &str) -> Result<bool, Invalid> {
        match self.get(name) {
            None => Err(Invalid::new(name, "is required")),
            Some(Value::Bool(b)) => Ok(*b),
            Some(Value::String(s)) if s.trim().eq_ignore_ascii_case("true") => Ok(true),
            Some(Value::String(s)) if s.trim().eq_ignore_ascii_case("false") => Ok(false),
            Some(_) => Err(Invalid::new(name, "must be a boolean")),
        }
    }

    /// A required ISO-8601 string.
    pub fn iso_timestamp(&self, name: &str) -> Result<DateTime<Utc>, Invalid> {
        match self.get(name) {
            None => Err(Invalid::new(name, "is required")),
            Some(Value::String(s)) => parse_iso8601(s)
                .ok_or_else(|| Invalid::new(name, "must be in ISO 8601 date format")),
            Some(_) => Err(Invalid::new(name, "must be in ISO 8601 date format")),
        }
    }

    /// A required date given as ISO-8601 string or epoch milliseconds.
    pub fn timestamp(&self, name: &str) -> Result<DateTime<Utc>, Invalid> {
        match self.get(name) {
            None => Err(Invalid::new(name, "is required")),
            Some(value) => {
                parse_timestamp(value).ok_or_else(|| Invalid::new(name, "must be a valid date"))
            }
        }
    }
}

/// Parse a JSON value as a point in time.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_iso8601(s),
        Value::Number(n) => n
            .as_i64()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
            .filter(in_four_digit_years),
        _ => None,
    }
}

/// Offsets are honoured; timestamps without one are taken as UTC.
fn parse_iso8601(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    let parsed = if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        Some(dt.with_timezone(&Utc))
    } else {
        ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
            .into_iter()
            .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
            .or_else(|| {
                NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .ok()
                    .and_then(|date| date.and_hms_opt(0, 0, 0))
            })
            .map(|naive| naive.and_utc())
    };
    parsed.filter(in_four_digit_years)
}

/// Stored timestamps are written back as RFC 3339 and must parse again,
/// which only holds for years 0 through 9999.
fn in_four_digit_years(dt: &DateTime<Utc>) -> bool {
    (0..=9999).contains(&dt.year())
}
