use bigdecimal::{BigDecimal, ToPrimitive};
use chrono::{NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use serde::{Serialize, Serializer};

/// A single scalar as it came out of a database driver.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Null,
    Text(String),
    Int(i64),
    UInt(u64),
    Float(f64),
    Decimal(BigDecimal),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

/// One result row: column label -> value, in column order.
pub type RawRow = IndexMap<String, RawValue>;

impl RawValue {
    pub fn is_null(&self) -> bool {
        matches!(self, RawValue::Null)
    }

    fn type_name(&self) -> &'static str {
        match self {
            RawValue::Null => "null",
            RawValue::Text(_) => "text",
            RawValue::Int(_) => "int",
            RawValue::UInt(_) => "uint",
            RawValue::Float(_) => "float",
            RawValue::Decimal(_) => "decimal",
            RawValue::Date(_) => "date",
            RawValue::DateTime(_) => "datetime",
        }
    }
}

impl From<&str> for RawValue {
    fn from(v: &str) -> Self {
        RawValue::Text(v.to_string())
    }
}

impl From<String> for RawValue {
    fn from(v: String) -> Self {
        RawValue::Text(v)
    }
}

impl From<i64> for RawValue {
    fn from(v: i64) -> Self {
        RawValue::Int(v)
    }
}

impl From<i32> for RawValue {
    fn from(v: i32) -> Self {
        RawValue::Int(v as i64)
    }
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        RawValue::Float(v)
    }
}

impl From<NaiveDate> for RawValue {
    fn from(v: NaiveDate) -> Self {
        RawValue::Date(v)
    }
}

impl<T: Into<RawValue>> From<Option<T>> for RawValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(RawValue::Null)
    }
}

impl Serialize for RawValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RawValue::Null => serializer.serialize_none(),
            RawValue::Text(s) => serializer.serialize_str(s),
            RawValue::Int(i) => serializer.serialize_i64(*i),
            RawValue::UInt(u) => serializer.serialize_u64(*u),
            RawValue::Float(f) => serializer.serialize_f64(*f),
            // DECIMAL goes out as text, unrounded
            RawValue::Decimal(d) => serializer.serialize_str(&d.to_string()),
            RawValue::Date(d) => serializer.serialize_str(&d.format("%Y-%m-%d").to_string()),
            RawValue::DateTime(dt) => {
                serializer.serialize_str(&dt.format("%Y-%m-%d %H:%M:%S").to_string())
            }
        }
    }
}

/// Numeric interpretation of a raw value.
///
/// Native numeric types convert directly; text is trimmed and parsed, with a
/// single comma accepted as the decimal separator. `None` for null, dates and
/// unparseable text.
pub fn coerce_number(value: &RawValue) -> Option<f64> {
    match value {
        RawValue::Int(i) => Some(*i as f64),
        RawValue::UInt(u) => Some(*u as f64),
        RawValue::Float(f) if f.is_finite() => Some(*f),
        RawValue::Float(_) => None,
        RawValue::Decimal(d) => d.to_f64(),
        RawValue::Text(s) => parse_number_text(s),
        RawValue::Null | RawValue::Date(_) | RawValue::DateTime(_) => None,
    }
}

fn parse_number_text(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    let parsed = match trimmed.parse::<f64>() {
        Ok(v) => Some(v),
        Err(_) if trimmed.matches(',').count() == 1 && !trimmed.contains('.') => {
            trimmed.replace(',', ".").parse::<f64>().ok()
        }
        Err(_) => None,
    };
    parsed.filter(|v| v.is_finite())
}

/// Text interpretation of a raw value. Dates render as `YYYY-MM-DD`.
pub fn coerce_text(value: &RawValue) -> Option<String> {
    match value {
        RawValue::Null => None,
        RawValue::Text(s) => Some(s.clone()),
        RawValue::Int(i) => Some(i.to_string()),
        RawValue::UInt(u) => Some(u.to_string()),
        RawValue::Float(f) => Some(f.to_string()),
        RawValue::Decimal(d) => Some(d.to_string()),
        RawValue::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
        RawValue::DateTime(dt) => Some(dt.date().format("%Y-%m-%d").to_string()),
    }
}

/// Label-driven field reader over a [`RawRow`].
///
/// Every getter degrades to a default instead of failing; the `record` key is
/// only used to make the debug trail readable.
pub struct FieldReader<'a> {
    row: &'a RawRow,
    source: &'static str,
    record: String,
}

impl<'a> FieldReader<'a> {
    pub fn new(row: &'a RawRow, source: &'static str) -> Self {
        Self {
            row,
            source,
            record: String::new(),
        }
    }

    pub fn with_record(mut self, record: &str) -> Self {
        self.record = record.to_string();
        self
    }

    /// First label present with a non-null value.
    fn lookup<'l>(&self, labels: &[&'l str]) -> Option<(&'l str, &'a RawValue)> {
        labels.iter().find_map(|label| {
            self.row
                .get(*label)
                .filter(|v| !v.is_null())
                .map(|v| (*label, v))
        })
    }

    pub fn number(&self, labels: &[&str]) -> f64 {
        match self.lookup(labels) {
            Some((label, value)) => coerce_number(value).unwrap_or_else(|| {
                tracing::debug!(
                    source = self.source,
                    record = %self.record,
                    label,
                    kind = value.type_name(),
                    "could not coerce field to a number, using 0"
                );
                0.0
            }),
            None => 0.0,
        }
    }

    /// Whole number, truncated toward zero.
    pub fn integer(&self, labels: &[&str]) -> i64 {
        self.number(labels) as i64
    }

    pub fn text(&self, labels: &[&str]) -> String {
        self.lookup(labels)
            .and_then(|(_, value)| coerce_text(value))
            .unwrap_or_default()
    }
}
