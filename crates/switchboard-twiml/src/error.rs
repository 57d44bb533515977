//! Error types for the switchboard-twiml serializer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("xml write error: {0}")]
  Io(#[from] std::io::Error),

  #[error("document is not valid UTF-8: {0}")]
  Utf8(#[from] std::string::FromUtf8Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
