//! Webhook paths and the URLs the call flow hands back to the provider.
//!
//! Relative URLs (Gather/Redirect/Record actions) are resolved by the
//! provider against the request URL, so they only carry the mount prefix.
//! Status callbacks are fetched out of band and must be absolute.

use strum::AsRefStr;

use crate::ServerConfig;

/// Voice pages served under `/<menu>/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr)]
#[strum(serialize_all = "kebab-case")]
pub enum Page {
  CallMenu,
  CallAction,
  CallEnd,
}

#[derive(Debug, Clone)]
pub struct Urls {
  prefix:        String,
  callback_base: String,
}

impl Urls {
  pub fn new(config: &ServerConfig) -> Self {
    let base = config
      .debug_callback_url
      .as_deref()
      .filter(|u| !u.trim().is_empty())
      .unwrap_or(&config.base_url);
    Self {
      prefix:        normalize_prefix(&config.path_prefix),
      callback_base: base.trim_end_matches('/').to_owned(),
    }
  }

  /// Mount point of every route; empty or `/segment` without a trailing
  /// slash.
  pub fn prefix(&self) -> &str { &self.prefix }

  pub fn call(&self, menu: &str, page: Page) -> String {
    format!("{}/{menu}/{}", self.prefix, page.as_ref())
  }

  pub fn pin(&self, menu: &str, digit: u8) -> String {
    format!("{}/{menu}/call-pin/{digit}", self.prefix)
  }

  pub fn voicemail(&self, menu: &str, digit: u8) -> String {
    format!("{}/{menu}/voicemail/{digit}", self.prefix)
  }

  pub fn voicemail_sms_cb(&self, menu: &str, digit: u8) -> String {
    self.absolute(&format!("{}/{menu}/voicemail-sms-cb/{digit}", self.prefix))
  }

  pub fn send_sms_cb(&self) -> String {
    self.absolute(&format!("{}/send-sms-cb", self.prefix))
  }

  pub fn sms_forward_cb(&self) -> String {
    self.absolute(&format!("{}/sms-forward-cb", self.prefix))
  }

  fn absolute(&self, path: &str) -> String { format!("{}{path}", self.callback_base) }
}

pub fn normalize_prefix(prefix: &str) -> String {
  let trimmed = prefix.trim().trim_matches('/');
  if trimmed.is_empty() {
    String::new()
  } else {
    format!("/{trimmed}")
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn prefix_is_normalized() {
    assert_eq!(normalize_prefix(""), "");
    assert_eq!(normalize_prefix("/"), "");
    assert_eq!(normalize_prefix("ivr/"), "/ivr");
    assert_eq!(normalize_prefix("/ivr"), "/ivr");
  }

  #[test]
  fn pages_use_kebab_case() {
    assert_eq!(Page::CallMenu.as_ref(), "call-menu");
    assert_eq!(Page::CallAction.as_ref(), "call-action");
    assert_eq!(Page::CallEnd.as_ref(), "call-end");
  }
}
