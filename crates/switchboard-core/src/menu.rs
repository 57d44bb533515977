//! Menus and menu items, the digit-driven configuration a caller navigates.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Voice used by `Say` when a menu does not name one.
pub const DEFAULT_VOICE: &str = "woman";

/// Spoken before dialing a mailbox phone when the item has no action text.
pub const DEFAULT_TRANSFER_TEXT: &str = "Transferring, please wait.";

pub const MENU_NAME_MAX_LEN: usize = 40;

// ─── Menu ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Menu {
  pub menu_id:       Uuid,
  /// Unique, URL-safe; used as the first path segment of every webhook.
  pub name:          String,
  /// Disabled menus are invisible to callers but kept in the store.
  pub enabled:       bool,
  pub greeting_text: String,
  pub voice:         Option<String>,
}

impl Menu {
  pub fn voice(&self) -> &str { self.voice.as_deref().unwrap_or(DEFAULT_VOICE) }
}

/// A weak reference to a menu, carried by items that point at one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuRef {
  pub menu_id: Uuid,
  pub name:    String,
}

#[derive(Debug, Clone)]
pub struct NewMenu {
  pub name:          String,
  pub enabled:       bool,
  pub greeting_text: String,
  pub voice:         Option<String>,
}

impl NewMenu {
  pub fn validate(&self) -> Result<()> { validate_menu_name(&self.name) }
}

/// Slug check: ASCII letters, digits, `-` and `_`.
pub fn validate_menu_name(name: &str) -> Result<()> {
  let ok = !name.is_empty()
    && name.len() <= MENU_NAME_MAX_LEN
    && name
      .bytes()
      .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
  if ok {
    Ok(())
  } else {
    Err(Error::InvalidMenuName(name.to_owned()))
  }
}

// ─── Actions ─────────────────────────────────────────────────────────────────

/// What happens when a caller selects an item. At most one per item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "target", rename_all = "snake_case")]
pub enum Action {
  /// Dial the mailbox phone or record a voicemail, per its policy.
  Mailbox(Uuid),
  /// Announce another menu.
  Submenu(MenuRef),
  /// Redirect the call to an arbitrary URL.
  Url(String),
  /// Invoke a registered function by name; its result may replace the
  /// spoken text.
  Function(String),
}

impl Action {
  pub fn mailbox_id(&self) -> Option<Uuid> {
    match self {
      Action::Mailbox(id) => Some(*id),
      _ => None,
    }
  }
}

/// [`Action`] as supplied on creation; submenus are referenced by id only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewAction {
  Mailbox(Uuid),
  Submenu(Uuid),
  Url(String),
  Function(String),
}

impl NewAction {
  /// Build an action from the four optional fields an operator may fill in,
  /// rejecting more than one.
  pub fn from_fields(
    mailbox:  Option<Uuid>,
    submenu:  Option<Uuid>,
    url:      Option<String>,
    function: Option<String>,
  ) -> Result<Option<Self>> {
    let url      = url.filter(|s| !s.trim().is_empty());
    let function = function.filter(|s| !s.trim().is_empty());

    let mut named = Vec::new();
    if mailbox.is_some() { named.push("mailbox".to_owned()); }
    if submenu.is_some() { named.push("submenu".to_owned()); }
    if url.is_some() { named.push("url".to_owned()); }
    if function.is_some() { named.push("function".to_owned()); }
    if named.len() > 1 {
      return Err(Error::ConflictingActions(named));
    }

    Ok(
      mailbox
        .map(NewAction::Mailbox)
        .or(submenu.map(NewAction::Submenu))
        .or(url.map(NewAction::Url))
        .or(function.map(NewAction::Function)),
    )
  }
}

// ─── Menu items ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuItem {
  pub item_id:         Uuid,
  /// Owning menu; `None` once that menu is deleted.
  pub menu:            Option<MenuRef>,
  pub digit:           u8,
  pub enabled:         bool,
  /// Label announced as "Press D <text>." Empty hides the item from the
  /// announcement; it stays reachable by digit.
  pub menu_text:       String,
  /// Accepted PINs. Empty means the item is not gated.
  pub pin_digits:      Vec<String>,
  pub pin_prompt_text: String,
  pub action:          Option<Action>,
  /// Spoken before the action executes.
  pub action_text:     String,
}

impl MenuItem {
  pub fn is_pin_gated(&self) -> bool { !self.pin_digits.is_empty() }

  /// Exact match after trimming surrounding whitespace.
  pub fn accepts_pin(&self, pin: &str) -> bool {
    let pin = pin.trim();
    self.pin_digits.iter().any(|p| p == pin)
  }

  /// Items with no label, no action text and no mailbox are left out of the
  /// announcement entirely and do not advance the digit cursor.
  pub fn is_announceable(&self) -> bool {
    !self.menu_text.is_empty()
      || !self.action_text.is_empty()
      || matches!(self.action, Some(Action::Mailbox(_)))
  }

  /// `<menu>-<digit>`, used in notifications.
  pub fn label(&self) -> String {
    let menu = self.menu.as_ref().map_or("None", |m| m.name.as_str());
    format!("{menu}-{}", self.digit)
  }
}

#[derive(Debug, Clone)]
pub struct NewMenuItem {
  pub menu_id:         Option<Uuid>,
  pub digit:           u8,
  pub enabled:         bool,
  pub menu_text:       String,
  pub pin_digits:      Vec<String>,
  pub pin_prompt_text: String,
  pub action:          Option<NewAction>,
  pub action_text:     String,
}

impl NewMenuItem {
  pub fn validate(&self) -> Result<()> {
    if self.digit > 9 {
      return Err(Error::InvalidDigit(self.digit));
    }
    for pin in &self.pin_digits {
      if pin.is_empty() || !pin.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::InvalidPin(pin.clone()));
      }
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn item() -> MenuItem {
    MenuItem {
      item_id:         Uuid::new_v4(),
      menu:            Some(MenuRef { menu_id: Uuid::new_v4(), name: "support".into() }),
      digit:           4,
      enabled:         true,
      menu_text:       String::new(),
      pin_digits:      vec![],
      pin_prompt_text: String::new(),
      action:          None,
      action_text:     String::new(),
    }
  }

  #[test]
  fn menu_name_slug_rules() {
    assert!(validate_menu_name("after-hours_2").is_ok());
    assert!(validate_menu_name("").is_err());
    assert!(validate_menu_name("no spaces").is_err());
    assert!(validate_menu_name("slash/y").is_err());
    assert!(validate_menu_name(&"x".repeat(41)).is_err());
  }

  #[test]
  fn default_voice_when_unset() {
    let mut menu = Menu {
      menu_id:       Uuid::new_v4(),
      name:          "support".into(),
      enabled:       true,
      greeting_text: String::new(),
      voice:         None,
    };
    assert_eq!(menu.voice(), "woman");
    menu.voice = Some("man".into());
    assert_eq!(menu.voice(), "man");
  }

  #[test]
  fn pin_match_is_exact_after_trim() {
    let mut i = item();
    i.pin_digits = vec!["1234".into(), "9999".into()];
    assert!(i.is_pin_gated());
    assert!(i.accepts_pin("1234"));
    assert!(i.accepts_pin(" 9999 "));
    assert!(!i.accepts_pin("123"));
    assert!(!i.accepts_pin("12345"));
  }

  #[test]
  fn empty_item_is_not_announceable() {
    let mut i = item();
    i.action = Some(Action::Url("/a".into()));
    assert!(!i.is_announceable());
    i.action = Some(Action::Mailbox(Uuid::new_v4()));
    assert!(i.is_announceable());
    i.action = None;
    i.action_text = "Hold on.".into();
    assert!(i.is_announceable());
  }

  #[test]
  fn label_uses_none_for_orphans() {
    let mut i = item();
    assert_eq!(i.label(), "support-4");
    i.menu = None;
    assert_eq!(i.label(), "None-4");
  }

  #[test]
  fn conflicting_action_fields_are_rejected() {
    let err = NewAction::from_fields(
      Some(Uuid::new_v4()),
      None,
      Some("/a".into()),
      None,
    )
    .unwrap_err();
    assert!(matches!(err, Error::ConflictingActions(ref f) if f == &["mailbox", "url"]));
  }

  #[test]
  fn blank_strings_do_not_count_as_actions() {
    let action = NewAction::from_fields(None, None, Some("  ".into()), Some("clock".into()))
      .unwrap();
    assert_eq!(action, Some(NewAction::Function("clock".into())));
    assert_eq!(NewAction::from_fields(None, None, None, None).unwrap(), None);
  }

  #[test]
  fn pin_must_be_digits() {
    let new = NewMenuItem {
      menu_id:         None,
      digit:           1,
      enabled:         true,
      menu_text:       String::new(),
      pin_digits:      vec!["12a4".into()],
      pin_prompt_text: String::new(),
      action:          None,
      action_text:     String::new(),
    };
    assert!(matches!(new.validate(), Err(Error::InvalidPin(_))));
    let new = NewMenuItem { digit: 10, pin_digits: vec![], ..new };
    assert!(matches!(new.validate(), Err(Error::InvalidDigit(10))));
  }
}
