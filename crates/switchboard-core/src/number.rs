//! Provider phone numbers owned by the call center.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, list::validate_email_list, phone::Region};

/// A number rented from the provider, with the people inbound SMS to it is
/// forwarded to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwilioNumber {
  pub number_id:          Uuid,
  pub name:               String,
  pub phone:              String,
  pub forward_phone_list: Vec<String>,
  pub forward_email_list: Vec<String>,
}

impl fmt::Display for TwilioNumber {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} {}", self.name, self.phone)
  }
}

#[derive(Debug, Clone, Default)]
pub struct NewTwilioNumber {
  pub name:               String,
  pub phone:              String,
  pub forward_phone_list: Vec<String>,
  pub forward_email_list: Vec<String>,
}

impl NewTwilioNumber {
  pub fn validate(&self, region: &Region) -> Result<()> {
    if self.name.trim().is_empty() {
      return Err(Error::Empty("number name"));
    }
    region.validate(&self.phone)?;
    region.validate_list(&self.forward_phone_list)?;
    validate_email_list(&self.forward_email_list)
  }
}
