//! Error type for `switchboard-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] switchboard_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored row violates an invariant the domain types encode.
  #[error("corrupt row in {table}: {reason}")]
  Corrupt { table: &'static str, reason: String },

  /// A row written a moment ago could not be read back.
  #[error("{table} row {id} vanished after write")]
  Vanished { table: &'static str, id: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
