//! Validation errors for `switchboard-core`.

use chrono::NaiveTime;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("menu name must be a slug of at most 40 characters: {0:?}")]
  InvalidMenuName(String),

  #[error("menu digit must be between 0 and 9, got {0}")]
  InvalidDigit(u8),

  #[error("phone number must be valid phone number: {0:?}")]
  InvalidPhone(String),

  #[error("invalid email address: {0:?}")]
  InvalidEmail(String),

  #[error("pin must be one or more digits: {0:?}")]
  InvalidPin(String),

  #[error("unknown phone region: {0:?}")]
  UnknownRegion(String),

  #[error("menu item names more than one action: {}", .0.join(", "))]
  ConflictingActions(Vec<String>),

  #[error("notification phone is required when phone list is used")]
  MissingNotificationPhone,

  #[error("must specify either both or neither available times")]
  PartialAvailability,

  #[error("available start {start} is after available stop {stop}")]
  InvertedAvailability { start: NaiveTime, stop: NaiveTime },

  #[error("{0} must not be empty")]
  Empty(&'static str),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
