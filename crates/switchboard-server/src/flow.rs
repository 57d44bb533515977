//! The call flow: menu resolution, announcement, PIN gating and action
//! dispatch.
//!
//! Every voice webhook rebuilds its state here from the stored configuration
//! and the URL; nothing survives between requests.

use chrono::{DateTime, Local};
use switchboard_core::{
  menu::{Action, DEFAULT_TRANSFER_TEXT, Menu, MenuItem},
  store::CallCenterStore,
};
use switchboard_twiml::{Gather, Record, Say, VoiceResponse};
use tracing::{debug, warn};

use crate::{
  error::{Error, Result},
  functions::{FunctionContext, FunctionRegistry},
  routes::{Page, Urls},
};

pub const DEFAULT_PIN_PROMPT: &str = "Enter your pin followed by pound.";
pub const INVALID_ENTRY_TEXT: &str = "Invalid entry.";
pub const UNAVAILABLE_TEXT: &str = "This connection is currently not available.";
pub const LEAVE_MESSAGE_TEXT: &str = "Please leave a message after the beep.";
pub const GOODBYE_TEXT: &str = "Goodbye.";

const GATHER_TIMEOUT_SECS: u32 = 10;

// ─── Menu resolver ───────────────────────────────────────────────────────────

/// An enabled menu and its enabled items in ascending digit order.
#[derive(Debug, Clone)]
pub struct ResolvedMenu {
  pub menu:  Menu,
  pub items: Vec<MenuItem>,
}

impl ResolvedMenu {
  /// The first item configured for `digit`. Later duplicates are unreachable.
  pub fn item_for_digit(&self, digit: u8) -> Option<&MenuItem> {
    self.items.iter().find(|i| i.digit == digit)
  }

  fn voice(&self) -> Option<&str> { Some(self.menu.voice()) }
}

pub async fn resolve_menu<S>(store: &S, name: &str) -> Result<ResolvedMenu>
where
  S: CallCenterStore,
{
  let menu = store
    .find_enabled_menu(name)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| Error::NotFound(format!("Call Center menu {name} doesn't exist.")))?;

  let items = store
    .list_enabled_items(menu.menu_id)
    .await
    .map_err(Error::store)?;
  if items.is_empty() {
    return Err(Error::NotFound(format!("Call Center menu {name} has no items.")));
  }

  Ok(ResolvedMenu { menu, items })
}

/// Parses a keypad digit as submitted by the provider.
pub fn parse_digit(raw: &str) -> Option<u8> {
  raw.trim().parse::<u8>().ok().filter(|d| *d <= 9)
}

// ─── Announce ────────────────────────────────────────────────────────────────

/// The greeting followed by one "Press D ..." per newly reached digit.
pub fn announcement(resolved: &ResolvedMenu) -> String {
  let mut text = String::new();
  if !resolved.menu.greeting_text.is_empty() {
    text.push_str(&resolved.menu.greeting_text);
    text.push('.');
  }

  let mut last_digit: i16 = -1;
  for item in &resolved.items {
    if !item.is_announceable() || i16::from(item.digit) <= last_digit {
      continue;
    }
    last_digit = i16::from(item.digit);
    if !item.menu_text.is_empty() {
      text.push_str(&format!(" Press {} {}.", item.digit, item.menu_text));
    }
  }
  text
}

/// `call-menu`: speak the announcement while collecting a single digit.
pub fn call_menu(resolved: &ResolvedMenu, urls: &Urls) -> VoiceResponse {
  let gather = Gather::new(urls.call(&resolved.menu.name, Page::CallAction))
    .num_digits(1)
    .timeout(GATHER_TIMEOUT_SECS)
    .say(Say::new(announcement(resolved), resolved.voice()));

  let mut response = VoiceResponse::new();
  response.gather(gather);
  response
}

/// `call-end`.
pub fn call_end(resolved: &ResolvedMenu) -> VoiceResponse {
  let mut response = VoiceResponse::new();
  response.say(GOODBYE_TEXT, resolved.voice()).hangup();
  response
}

// ─── Action ──────────────────────────────────────────────────────────────────

/// One `call-action` or `call-pin` request.
#[derive(Debug, Clone, Copy)]
pub struct Selection<'a> {
  pub digit: Option<u8>,
  /// Present only on `call-pin`.
  pub pin:   Option<&'a str>,
  pub now:   DateTime<Local>,
}

/// Where the call goes once the spoken text is done.
enum Next {
  Record(String),
  Dial { phone: String, then: String },
  Redirect(String),
}

pub async fn call_action<S>(
  store: &S,
  functions: &FunctionRegistry,
  urls: &Urls,
  resolved: &ResolvedMenu,
  selection: Selection<'_>,
) -> Result<VoiceResponse>
where
  S: CallCenterStore,
{
  let name = resolved.menu.name.as_str();
  let voice = resolved.voice();
  let mut response = VoiceResponse::new();

  let Some(item) = selection.digit.and_then(|d| resolved.item_for_digit(d)) else {
    debug!(menu = name, digit = ?selection.digit, "no item for digit");
    response.redirect(urls.call(name, Page::CallMenu));
    return Ok(response);
  };

  if item.is_pin_gated() {
    match selection.pin {
      None => {
        let prompt = if item.pin_prompt_text.is_empty() {
          DEFAULT_PIN_PROMPT
        } else {
          item.pin_prompt_text.as_str()
        };
        response.gather(
          Gather::new(urls.pin(name, item.digit))
            .finish_on_key('#')
            .timeout(GATHER_TIMEOUT_SECS)
            .say(Say::new(prompt, voice)),
        );
        return Ok(response);
      }
      Some(pin) if !item.accepts_pin(pin) => {
        debug!(menu = name, digit = item.digit, "rejected pin");
        response
          .say(INVALID_ENTRY_TEXT, voice)
          .pause(1)
          .redirect(urls.call(name, Page::CallMenu));
        return Ok(response);
      }
      Some(_) => {}
    }
  }

  let mut text = non_empty(&item.action_text);
  let mut dial_phone = None;
  let mut voicemail = false;
  let mut url_target = None;
  let mut submenu = None;

  match &item.action {
    Some(Action::Mailbox(mailbox_id)) => {
      match store.get_mailbox(*mailbox_id).await.map_err(Error::store)? {
        Some(mailbox) => {
          let now = selection.now.time();
          if mailbox.should_send_voicemail_at(now) {
            text = Some(if mailbox.unavailable_at(now) {
              format!("{UNAVAILABLE_TEXT} {LEAVE_MESSAGE_TEXT}")
            } else {
              LEAVE_MESSAGE_TEXT.to_owned()
            });
            voicemail = true;
          } else if let Some(phone) = mailbox.phone {
            text.get_or_insert_with(|| DEFAULT_TRANSFER_TEXT.to_owned());
            dial_phone = Some(phone);
          }
        }
        None => warn!(menu = name, digit = item.digit, %mailbox_id, "item names a missing mailbox"),
      }
    }
    Some(Action::Function(function)) => match functions.get(function) {
      Some(handler) => {
        let mut ctx = FunctionContext {
          menu:     &resolved.menu,
          item,
          response: &mut response,
          now:      selection.now,
        };
        if let Some(spoken) = handler.call(&mut ctx) {
          text = Some(spoken);
        }
      }
      None => warn!(menu = name, digit = item.digit, function = %function, "unknown function action"),
    },
    Some(Action::Url(url)) => url_target = Some(url.clone()),
    Some(Action::Submenu(target)) => submenu = Some(target.name.clone()),
    None => {}
  }

  if let Some(text) = &text {
    response.say(terminate_sentence(text), voice);
  }

  let next = if voicemail {
    Next::Record(urls.voicemail(name, item.digit))
  } else if let Some(phone) = dial_phone {
    let then = url_target
      .or_else(|| submenu.map(|m| urls.call(&m, Page::CallMenu)))
      .unwrap_or_else(|| urls.call(name, Page::CallEnd));
    Next::Dial { phone, then }
  } else {
    let menu = submenu.as_deref().unwrap_or(name);
    Next::Redirect(url_target.unwrap_or_else(|| urls.call(menu, Page::CallMenu)))
  };

  match next {
    Next::Record(callback) => {
      if text.is_some() {
        response.pause(1);
      }
      response.record(Record::new(callback.clone()).transcribe_callback(callback));
    }
    Next::Dial { phone, then } => {
      response.dial(phone).redirect(then);
    }
    Next::Redirect(target) => {
      if text.is_some() {
        response.pause(1);
      }
      response.redirect(target);
    }
  }

  Ok(response)
}

fn non_empty(s: &str) -> Option<String> {
  if s.is_empty() { None } else { Some(s.to_owned()) }
}

/// Ends `text` with a period unless it already ends a sentence.
fn terminate_sentence(text: &str) -> String {
  let trimmed = text.trim_end();
  if trimmed.ends_with(['.', '!', '?']) {
    trimmed.to_owned()
  } else {
    format!("{trimmed}.")
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn sentences_get_one_period() {
    assert_eq!(terminate_sentence("Transferring, please wait."), "Transferring, please wait.");
    assert_eq!(terminate_sentence("Hold on"), "Hold on.");
    assert_eq!(terminate_sentence("Really?  "), "Really?");
  }

  #[test]
  fn digits_parse_strictly() {
    assert_eq!(parse_digit("3"), Some(3));
    assert_eq!(parse_digit(" 0 "), Some(0));
    assert_eq!(parse_digit("12"), None);
    assert_eq!(parse_digit("*"), None);
    assert_eq!(parse_digit(""), None);
  }
}
