//! Comma-separated recipient lists.
//!
//! Configuration stores phone and email lists as a single comma-separated
//! column; the domain types carry them as `Vec<String>`.

use crate::{Error, Result};

/// Split `csv` on commas and trim each entry. An empty string yields an
/// empty list rather than `[""]`.
pub fn split_list_or_empty(csv: &str) -> Vec<String> {
  if csv.trim().is_empty() {
    return Vec::new();
  }
  csv.split(',').map(|s| s.trim().to_owned()).collect()
}

pub fn join_list(items: &[String]) -> String { items.join(",") }

/// Reject anything that does not look like `local@domain.tld`.
///
/// This is a shape check only; deliverability is the mail provider's problem.
pub fn validate_email(address: &str) -> Result<()> {
  let invalid = || Error::InvalidEmail(address.to_owned());
  let (local, domain) = address.split_once('@').ok_or_else(invalid)?;
  if local.is_empty()
    || domain.is_empty()
    || domain.contains('@')
    || !domain.contains('.')
    || domain.starts_with('.')
    || domain.ends_with('.')
    || address.chars().any(char::is_whitespace)
  {
    return Err(invalid());
  }
  Ok(())
}

pub fn validate_email_list(addresses: &[String]) -> Result<()> {
  addresses.iter().try_for_each(|a| validate_email(a))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_string_is_empty_list() {
    assert!(split_list_or_empty("").is_empty());
    assert!(split_list_or_empty("   ").is_empty());
  }

  #[test]
  fn entries_are_trimmed() {
    assert_eq!(
      split_list_or_empty(" a@example.com , b@example.com"),
      vec!["a@example.com".to_string(), "b@example.com".to_string()]
    );
  }

  #[test]
  fn join_is_inverse_of_split() {
    let items = vec!["1234".to_string(), "5678".to_string()];
    assert_eq!(split_list_or_empty(&join_list(&items)), items);
  }

  #[test]
  fn email_shapes() {
    assert!(validate_email("ops@example.com").is_ok());
    assert!(validate_email("ops@example").is_err());
    assert!(validate_email("@example.com").is_err());
    assert!(validate_email("ops example@example.com").is_err());
    assert!(validate_email("ops@@example.com").is_err());
  }

  #[test]
  fn list_validation_names_the_bad_address() {
    let list = vec!["ops@example.com".to_string(), "nobody".to_string()];
    match validate_email_list(&list) {
      Err(Error::InvalidEmail(address)) => assert_eq!(address, "nobody"),
      other => panic!("expected InvalidEmail, got {other:?}"),
    }
  }
}
