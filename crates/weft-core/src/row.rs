//! Row identity.
//!
//! A row is not a physical record — it is the join key that threads one
//! entity's values across the type partitions. This module is identifier
//! hygiene only: generation must be collision-resistant without a central
//! sequence, because independent single-column inserts may each be the
//! "first" write of a new row.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Caller-visible row identifier. Always a UUID: auto-generated ids are v4,
/// and caller-supplied ids are validated on the way in.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
  Deserialize,
)]
#[serde(transparent)]
pub struct RowId(Uuid);

impl RowId {
  /// A fresh, globally unique row id.
  pub fn generate() -> Self {
    Self(Uuid::new_v4())
  }

  /// Validate a caller-supplied id.
  pub fn parse(s: &str) -> Result<Self> {
    Uuid::parse_str(s)
      .map(Self)
      .map_err(|_| Error::InvalidRowId(s.to_owned()))
  }

  pub fn as_uuid(&self) -> Uuid {
    self.0
  }
}

impl From<Uuid> for RowId {
  fn from(id: Uuid) -> Self {
    Self(id)
  }
}

impl fmt::Display for RowId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0.hyphenated())
  }
}
