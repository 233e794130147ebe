//! The type registry: logical value types, their physical partitions, and
//! the inference/coercion rule chain.
//!
//! Six logical types map onto four storage partitions — booleans are stored
//! as 0/1 in the integer partition and json values as serialized text in the
//! text partition. Keeping one narrow, strongly-typed store per partition is
//! the central design decision of the engine; the projection layer pays for
//! it by pivoting the partitions back into rows.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use crate::{Error, Result};

// ─── Logical types ───────────────────────────────────────────────────────────

/// The closed set of logical column types.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
  strum::Display, strum::EnumString, strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ValueType {
  Text,
  Integer,
  Real,
  Boolean,
  Json,
  Timestamp,
}

impl ValueType {
  /// Parse the catalog's `data_type` string.
  pub fn parse(s: &str) -> Result<Self> {
    s.parse()
      .map_err(|_| Error::UnknownDataType(s.to_owned()))
  }

  /// The physical partition this type's values are stored in.
  pub fn partition(self) -> Partition {
    match self {
      Self::Text | Self::Json => Partition::Text,
      Self::Integer | Self::Boolean => Partition::Integer,
      Self::Real => Partition::Real,
      Self::Timestamp => Partition::Timestamp,
    }
  }

  /// Suggest a column type for a sample of values: majority vote, broken by
  /// specificity (timestamp > json > real > integer > boolean > text).
  /// Nulls don't vote. An empty (or all-null) sample suggests text.
  pub fn infer_many<'a, I>(values: I) -> Self
  where
    I: IntoIterator<Item = &'a Value>,
  {
    const HIERARCHY: [ValueType; 6] = [
      ValueType::Timestamp,
      ValueType::Json,
      ValueType::Real,
      ValueType::Integer,
      ValueType::Boolean,
      ValueType::Text,
    ];

    let mut counts = [0usize; 6];
    let mut total = 0usize;
    for value in values {
      if matches!(value, Value::Null) {
        continue;
      }
      let ty = value.infer_type();
      if let Some(slot) = HIERARCHY.iter().position(|h| *h == ty) {
        counts[slot] += 1;
        total += 1;
      }
    }

    if total == 0 {
      return ValueType::Text;
    }
    // A clear majority wins outright.
    for (slot, ty) in HIERARCHY.iter().enumerate() {
      if counts[slot] * 2 > total {
        return *ty;
      }
    }
    // Otherwise the most specific type that appears at all.
    for (slot, ty) in HIERARCHY.iter().enumerate() {
      if counts[slot] > 0 {
        return *ty;
      }
    }
    ValueType::Text
  }
}

// ─── Partitions ──────────────────────────────────────────────────────────────

/// A physical value store. One per storage class, shared by the logical
/// types that coerce into it.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
  strum::Display, strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Partition {
  Text,
  Integer,
  Real,
  Timestamp,
}

impl Partition {
  /// The physical store name. Exposed so the external safe-query layer can
  /// route raw SELECTs; these names are reserved (see [`crate::schema`]).
  pub fn table_name(self) -> &'static str {
    match self {
      Self::Text => "text_values",
      Self::Integer => "integer_values",
      Self::Real => "real_values",
      Self::Timestamp => "timestamp_values",
    }
  }

  /// All partitions, in declaration order.
  pub fn all() -> impl Iterator<Item = Partition> {
    Partition::iter()
  }
}

// ─── Input values ────────────────────────────────────────────────────────────

/// A loosely-typed input value — the tagged union the inference rule chain
/// runs over. Callers construct these directly or deserialize them from
/// JSON-shaped input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
  Null,
  Bool(bool),
  Int(i64),
  Float(f64),
  Timestamp(DateTime<Utc>),
  Text(String),
  Json(serde_json::Value),
}

impl From<bool> for Value {
  fn from(v: bool) -> Self {
    Self::Bool(v)
  }
}

impl From<i64> for Value {
  fn from(v: i64) -> Self {
    Self::Int(v)
  }
}

impl From<f64> for Value {
  fn from(v: f64) -> Self {
    Self::Float(v)
  }
}

impl From<&str> for Value {
  fn from(v: &str) -> Self {
    Self::Text(v.to_owned())
  }
}

impl From<String> for Value {
  fn from(v: String) -> Self {
    Self::Text(v)
  }
}

impl From<DateTime<Utc>> for Value {
  fn from(v: DateTime<Utc>) -> Self {
    Self::Timestamp(v)
  }
}

impl std::fmt::Display for Value {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Null => write!(f, "null"),
      Self::Bool(b) => write!(f, "{b}"),
      Self::Int(i) => write!(f, "{i}"),
      Self::Float(x) => write!(f, "{x}"),
      Self::Timestamp(dt) => write!(f, "{}", dt.to_rfc3339()),
      Self::Text(s) => write!(f, "{s:?}"),
      Self::Json(j) => write!(f, "{j}"),
    }
  }
}

impl Value {
  /// Best-fit logical type for this value. Total and deterministic: text is
  /// the universal fallback, so inference never fails.
  ///
  /// Rule order: boolean-like, then integer (whole number within `i64`
  /// range), then real, then timestamp, then json for compound values, then
  /// text.
  pub fn infer_type(&self) -> ValueType {
    match self {
      Self::Null => ValueType::Text,
      Self::Bool(_) => ValueType::Boolean,
      Self::Int(_) => ValueType::Integer,
      Self::Float(x) => {
        if x.fract() == 0.0 && in_i64_range(*x) {
          ValueType::Integer
        } else {
          ValueType::Real
        }
      }
      Self::Timestamp(_) => ValueType::Timestamp,
      Self::Json(_) => ValueType::Json,
      Self::Text(s) => infer_text(s),
    }
  }

  /// Convert to the physical representation for `target`, losslessly or not
  /// at all. Null coerces to anything.
  pub fn coerce(&self, target: ValueType) -> Result<StoredValue> {
    if matches!(self, Self::Null) {
      return Ok(StoredValue::Null);
    }
    match target {
      ValueType::Text => self.coerce_text(),
      ValueType::Integer => self.coerce_integer(),
      ValueType::Real => self.coerce_real(),
      ValueType::Boolean => self.coerce_boolean(),
      ValueType::Json => self.coerce_json(),
      ValueType::Timestamp => self.coerce_timestamp(),
    }
  }

  fn mismatch(&self, target: ValueType) -> Error {
    Error::TypeMismatch {
      value: self.to_string(),
      target,
    }
  }

  fn coerce_text(&self) -> Result<StoredValue> {
    let text = match self {
      Self::Text(s) => s.clone(),
      Self::Bool(b) => b.to_string(),
      Self::Int(i) => i.to_string(),
      Self::Float(x) => x.to_string(),
      Self::Timestamp(dt) => dt.to_rfc3339(),
      Self::Json(j) => serde_json::to_string(j)?,
      Self::Null => unreachable!("null handled by coerce"),
    };
    Ok(StoredValue::Text(text))
  }

  fn coerce_integer(&self) -> Result<StoredValue> {
    let target = ValueType::Integer;
    match self {
      Self::Int(i) => Ok(StoredValue::Integer(*i)),
      Self::Bool(b) => Ok(StoredValue::Integer(i64::from(*b))),
      Self::Float(x) => {
        if x.fract() != 0.0 {
          Err(self.mismatch(target))
        } else if !in_i64_range(*x) {
          Err(Error::Overflow {
            value: self.to_string(),
            target,
          })
        } else {
          Ok(StoredValue::Integer(*x as i64))
        }
      }
      Self::Text(s) => {
        let trimmed = s.trim();
        if let Ok(i) = trimmed.parse::<i64>() {
          return Ok(StoredValue::Integer(i));
        }
        // "1.0" style literals are still whole numbers.
        match trimmed.parse::<f64>() {
          Ok(x) if x.fract() == 0.0 && in_i64_range(x) => {
            Ok(StoredValue::Integer(x as i64))
          }
          Ok(x) if x.fract() == 0.0 => Err(Error::Overflow {
            value: self.to_string(),
            target,
          }),
          _ => Err(self.mismatch(target)),
        }
      }
      _ => Err(self.mismatch(target)),
    }
  }

  fn coerce_real(&self) -> Result<StoredValue> {
    match self {
      Self::Float(x) => Ok(StoredValue::Real(*x)),
      Self::Int(i) => Ok(StoredValue::Real(*i as f64)),
      Self::Text(s) => s
        .trim()
        .parse::<f64>()
        .map(StoredValue::Real)
        .map_err(|_| self.mismatch(ValueType::Real)),
      _ => Err(self.mismatch(ValueType::Real)),
    }
  }

  fn coerce_boolean(&self) -> Result<StoredValue> {
    let flag = match self {
      Self::Bool(b) => *b,
      Self::Int(0) => false,
      Self::Int(1) => true,
      Self::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => true,
        "false" | "no" | "off" | "0" => false,
        _ => return Err(self.mismatch(ValueType::Boolean)),
      },
      _ => return Err(self.mismatch(ValueType::Boolean)),
    };
    Ok(StoredValue::Integer(i64::from(flag)))
  }

  fn coerce_json(&self) -> Result<StoredValue> {
    let text = match self {
      Self::Json(j) => serde_json::to_string(j)?,
      // Text must itself be valid JSON; it is stored verbatim.
      Self::Text(s) => {
        serde_json::from_str::<serde_json::Value>(s)
          .map_err(|_| self.mismatch(ValueType::Json))?;
        s.clone()
      }
      Self::Bool(b) => b.to_string(),
      Self::Int(i) => i.to_string(),
      Self::Float(x) => x.to_string(),
      Self::Timestamp(dt) => serde_json::to_string(&dt.to_rfc3339())?,
      Self::Null => unreachable!("null handled by coerce"),
    };
    Ok(StoredValue::Text(text))
  }

  fn coerce_timestamp(&self) -> Result<StoredValue> {
    match self {
      Self::Timestamp(dt) => Ok(StoredValue::Timestamp(*dt)),
      Self::Text(s) => parse_timestamp(s.trim())
        .map(StoredValue::Timestamp)
        .ok_or_else(|| self.mismatch(ValueType::Timestamp)),
      _ => Err(self.mismatch(ValueType::Timestamp)),
    }
  }
}

// ─── Stored values ───────────────────────────────────────────────────────────

/// The physical representation of a cell value — what actually lands in a
/// partition. Decoding back to a logical [`Value`] requires the column's
/// declared type, since two logical types can share a partition.
#[derive(Debug, Clone, PartialEq)]
pub enum StoredValue {
  Null,
  Text(String),
  Integer(i64),
  Real(f64),
  Timestamp(DateTime<Utc>),
}

impl StoredValue {
  /// Decode to the logical value for a column of type `ty`.
  pub fn into_value(self, ty: ValueType) -> Result<Value> {
    let mismatch = |sv: &StoredValue| Error::TypeMismatch {
      value: format!("{sv:?}"),
      target: ty,
    };
    match (ty, self) {
      (_, Self::Null) => Ok(Value::Null),
      (ValueType::Text, Self::Text(s)) => Ok(Value::Text(s)),
      (ValueType::Json, Self::Text(s)) => {
        Ok(Value::Json(serde_json::from_str(&s)?))
      }
      (ValueType::Integer, Self::Integer(i)) => Ok(Value::Int(i)),
      (ValueType::Boolean, Self::Integer(i)) => Ok(Value::Bool(i != 0)),
      (ValueType::Real, Self::Real(x)) => Ok(Value::Float(x)),
      (ValueType::Real, Self::Integer(i)) => Ok(Value::Float(i as f64)),
      (ValueType::Timestamp, Self::Timestamp(dt)) => Ok(Value::Timestamp(dt)),
      (ValueType::Timestamp, Self::Text(s)) => parse_timestamp(&s)
        .map(Value::Timestamp)
        .ok_or_else(|| Error::TypeMismatch {
          value: format!("{s:?}"),
          target: ty,
        }),
      (_, other) => Err(mismatch(&other)),
    }
  }
}

// ─── Inference internals ─────────────────────────────────────────────────────

fn in_i64_range(x: f64) -> bool {
  // Exact bounds: i64::MAX as f64 rounds up, so compare in f64 space against
  // the last exactly-representable boundary.
  x >= -(2f64.powi(63)) && x < 2f64.powi(63)
}

fn infer_text(s: &str) -> ValueType {
  let trimmed = s.trim();
  if trimmed.is_empty() {
    return ValueType::Text;
  }

  let lower = trimmed.to_ascii_lowercase();
  if matches!(
    lower.as_str(),
    "true" | "false" | "yes" | "no" | "on" | "off" | "1" | "0"
  ) {
    return ValueType::Boolean;
  }

  if trimmed.parse::<i64>().is_ok() {
    return ValueType::Integer;
  }

  if (trimmed.contains('.') || lower.contains('e'))
    && trimmed.parse::<f64>().is_ok()
  {
    return ValueType::Real;
  }

  let compound = (trimmed.starts_with('{') && trimmed.ends_with('}'))
    || (trimmed.starts_with('[') && trimmed.ends_with(']'));
  if compound && serde_json::from_str::<serde_json::Value>(trimmed).is_ok() {
    return ValueType::Json;
  }

  if parse_timestamp(trimmed).is_some() {
    return ValueType::Timestamp;
  }

  ValueType::Text
}

/// Parse the date/time shapes the engine recognises: RFC 3339,
/// `YYYY-MM-DD[ HH:MM:SS[.fff]]`, and `MM/DD/YYYY`. Naive values are taken
/// as UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
  let b = s.as_bytes();
  let iso_shape = b.len() >= 10
    && b[..4].iter().all(u8::is_ascii_digit)
    && b[4] == b'-'
    && b[7] == b'-';
  let slash_shape = b.len() == 10
    && b[..2].iter().all(u8::is_ascii_digit)
    && b[2] == b'/'
    && b[5] == b'/';
  if !iso_shape && !slash_shape {
    return None;
  }

  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Some(dt.with_timezone(&Utc));
  }
  if let Ok(ndt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
    return Some(Utc.from_utc_datetime(&ndt));
  }
  let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .or_else(|_| NaiveDate::parse_from_str(s, "%m/%d/%Y"))
    .ok()?;
  date
    .and_hms_opt(0, 0, 0)
    .map(|ndt| Utc.from_utc_datetime(&ndt))
}
