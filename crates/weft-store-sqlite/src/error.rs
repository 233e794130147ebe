//! Error type for `weft-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] weft_core::Error),

  /// Engine failure — I/O, lock timeout, corruption. Always fatal to the
  /// single operation; never retried here.
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored value could not be read back in the shape its partition
  /// promises (e.g. a blob in a text partition).
  #[error("stored value decode error: {0}")]
  Decode(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

// ─── Closure-side errors ─────────────────────────────────────────────────────

/// Error carried out of connection-thread closures. Domain errors must
/// survive the trip through [`tokio_rusqlite::Error::Other`] intact, so they
/// are kept separate from engine errors until [`reclaim`] unpacks them.
#[derive(Debug)]
pub(crate) enum OpError {
  Domain(weft_core::Error),
  Sqlite(rusqlite::Error),
}

impl From<weft_core::Error> for OpError {
  fn from(e: weft_core::Error) -> Self {
    Self::Domain(e)
  }
}

impl From<rusqlite::Error> for OpError {
  fn from(e: rusqlite::Error) -> Self {
    Self::Sqlite(e)
  }
}

impl From<OpError> for tokio_rusqlite::Error {
  fn from(e: OpError) -> Self {
    match e {
      OpError::Sqlite(e) => tokio_rusqlite::Error::Rusqlite(e),
      OpError::Domain(e) => tokio_rusqlite::Error::Other(Box::new(e)),
    }
  }
}

/// Recover domain errors boxed through `tokio_rusqlite::Error::Other`;
/// everything else really is a database failure.
pub(crate) fn reclaim(e: tokio_rusqlite::Error) -> Error {
  match e {
    tokio_rusqlite::Error::Other(boxed) => {
      match boxed.downcast::<weft_core::Error>() {
        Ok(core) => Error::Core(*core),
        Err(other) => Error::Database(tokio_rusqlite::Error::Other(other)),
      }
    }
    other => Error::Database(other),
  }
}
