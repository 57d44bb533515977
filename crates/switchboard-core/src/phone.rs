//! Phone-number parsing, validation and equivalence.
//!
//! Numbers are stored as the operator typed them. Comparison goes through
//! the parsed E.164 form so `720-201-0123` and `+17202010123` match.

use std::str::FromStr;

use phonenumber::{Mode, PhoneNumber, country};

use crate::{Error, Result};

/// Region used to interpret numbers written without a country prefix.
#[derive(Debug, Clone)]
pub struct Region(country::Id);

impl Region {
  /// Parse an ISO 3166 alpha-2 code such as `"US"` or `"gb"`.
  pub fn new(code: &str) -> Result<Self> {
    country::Id::from_str(&code.trim().to_ascii_uppercase())
      .map(Self)
      .map_err(|_| Error::UnknownRegion(code.to_owned()))
  }

  pub fn parse(&self, number: &str) -> Result<PhoneNumber> {
    phonenumber::parse(Some(self.0.clone()), number)
      .map_err(|_| Error::InvalidPhone(number.to_owned()))
  }

  /// Parse and require the number to be a dialable number for its region.
  pub fn validate(&self, number: &str) -> Result<()> {
    let parsed = self.parse(number)?;
    if !phonenumber::is_valid(&parsed) {
      return Err(Error::InvalidPhone(number.to_owned()));
    }
    Ok(())
  }

  pub fn validate_list(&self, numbers: &[String]) -> Result<()> {
    numbers.iter().try_for_each(|n| self.validate(n))
  }

  /// E.164 form of `number`, e.g. `+17202010123`.
  pub fn to_e164(&self, number: &str) -> Result<String> {
    Ok(e164(&self.parse(number)?))
  }

  /// Whether two strings name the same phone number.
  ///
  /// Exact string equality short-circuits; otherwise both sides are parsed
  /// and compared. A parse failure on either side means "not equal".
  pub fn numbers_equal(&self, a: &str, b: &str) -> bool {
    if a == b {
      return true;
    }
    match (self.parse(a), self.parse(b)) {
      (Ok(pa), Ok(pb)) => e164(&pa) == e164(&pb),
      _ => false,
    }
  }
}

impl Default for Region {
  fn default() -> Self { Self(country::Id::US) }
}

fn e164(number: &PhoneNumber) -> String {
  number.format().mode(Mode::E164).to_string()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn national_and_international_forms_are_equal() {
    let us = Region::default();
    assert!(us.numbers_equal("720-201-0123", "+17202010123"));
    assert!(us.numbers_equal("(720) 201-0123", "7202010123"));
  }

  #[test]
  fn different_numbers_are_not_equal() {
    let us = Region::default();
    assert!(!us.numbers_equal("720-201-0123", "720-201-0124"));
  }

  #[test]
  fn unparseable_side_is_not_equal() {
    let us = Region::default();
    assert!(!us.numbers_equal("not a number", "+17202010123"));
    assert!(us.numbers_equal("not a number", "not a number"));
  }

  #[test]
  fn validation_rejects_garbage() {
    let us = Region::default();
    assert!(us.validate("720-201-0123").is_ok());
    assert!(us.validate("12").is_err());
    assert!(us.validate("hello").is_err());
  }

  #[test]
  fn region_codes_are_case_insensitive() {
    assert!(Region::new("gb").is_ok());
    assert!(matches!(Region::new("ZZZ"), Err(Error::UnknownRegion(_))));
  }
}
