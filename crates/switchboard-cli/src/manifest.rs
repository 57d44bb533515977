//! The TOML configuration file and its validation.
//!
//! ```toml
//! [[number]]
//! name  = "main"
//! phone = "+17202010000"
//!
//! [[mailbox]]
//! name                = "support"
//! phone               = "720-201-0123"
//! notification_number = "main"
//! phones              = ["720-201-0199"]
//! emails              = ["support@example.com"]
//! available_start     = "09:00"
//! available_stop      = "17:00"
//!
//! [[menu]]
//! name     = "main"
//! greeting = "Thanks for calling"
//!
//!   [[menu.item]]
//!   digit   = 1
//!   text    = "for support"
//!   mailbox = "support"
//! ```
//!
//! Entries refer to each other by name. [`Manifest::plan`] checks every entry
//! and every reference before anything is written.

use std::collections::HashSet;

use anyhow::{Context as _, Result, bail};
use chrono::NaiveTime;
use serde::Deserialize;
use switchboard_core::{
  mailbox::NewMailbox,
  menu::{NewAction, NewMenu, NewMenuItem},
  number::NewTwilioNumber,
  phone::Region,
};
use uuid::Uuid;

// ─── File shape ──────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
  #[serde(default, rename = "number")]
  pub numbers:   Vec<NumberEntry>,
  #[serde(default, rename = "mailbox")]
  pub mailboxes: Vec<MailboxEntry>,
  #[serde(default, rename = "menu")]
  pub menus:     Vec<MenuEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NumberEntry {
  pub name:           String,
  pub phone:          String,
  #[serde(default)]
  pub forward_phones: Vec<String>,
  #[serde(default)]
  pub forward_emails: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MailboxEntry {
  pub name:                  String,
  pub phone:                 Option<String>,
  /// Name of the `[[number]]` SMS notifications are sent from.
  pub notification_number:   Option<String>,
  #[serde(default)]
  pub phones:                Vec<String>,
  #[serde(default)]
  pub emails:                Vec<String>,
  /// `HH:MM`, local time.
  pub available_start:       Option<String>,
  pub available_stop:        Option<String>,
  #[serde(default)]
  pub always_send_voicemail: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MenuEntry {
  pub name:     String,
  #[serde(default = "enabled")]
  pub enabled:  bool,
  #[serde(default)]
  pub greeting: String,
  pub voice:    Option<String>,
  #[serde(default, rename = "item")]
  pub items:    Vec<ItemEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ItemEntry {
  pub digit:       u8,
  #[serde(default = "enabled")]
  pub enabled:     bool,
  #[serde(default)]
  pub text:        String,
  #[serde(default)]
  pub pins:        Vec<String>,
  #[serde(default)]
  pub pin_prompt:  String,
  #[serde(default)]
  pub action_text: String,
  pub mailbox:     Option<String>,
  pub submenu:     Option<String>,
  pub url:         Option<String>,
  pub function:    Option<String>,
}

fn enabled() -> bool { true }

impl Manifest {
  pub fn parse(source: &str) -> Result<Self> {
    toml::from_str(source).context("parsing configuration file")
  }
}

// ─── Validated plan ──────────────────────────────────────────────────────────

/// An item action whose target is still a name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionRef {
  Mailbox(String),
  Submenu(String),
  Url(String),
  Function(String),
}

#[derive(Debug)]
pub struct PlannedMailbox {
  /// `notification_phone` is filled in at write time.
  pub input:               NewMailbox,
  pub notification_number: Option<String>,
}

#[derive(Debug)]
pub struct PlannedItem {
  /// `menu_id` and `action` are filled in at write time.
  pub input:  NewMenuItem,
  pub action: Option<ActionRef>,
}

#[derive(Debug)]
pub struct PlannedMenu {
  pub input: NewMenu,
  pub items: Vec<PlannedItem>,
}

/// Everything in a manifest, validated and in write order.
#[derive(Debug)]
pub struct Plan {
  pub numbers:   Vec<NewTwilioNumber>,
  pub mailboxes: Vec<PlannedMailbox>,
  pub menus:     Vec<PlannedMenu>,
}

impl Plan {
  pub fn item_count(&self) -> usize { self.menus.iter().map(|m| m.items.len()).sum() }
}

impl Manifest {
  /// Validates every entry and reference; the first failure names its entry.
  pub fn plan(self, region: &Region) -> Result<Plan> {
    let number_names = unique_names("number", self.numbers.iter().map(|n| n.name.as_str()))?;
    let mailbox_names = unique_names("mailbox", self.mailboxes.iter().map(|m| m.name.as_str()))?;
    let menu_names = unique_names("menu", self.menus.iter().map(|m| m.name.as_str()))?;

    let numbers = self
      .numbers
      .into_iter()
      .map(|entry| {
        let input = NewTwilioNumber {
          name:               entry.name,
          phone:              entry.phone,
          forward_phone_list: entry.forward_phones,
          forward_email_list: entry.forward_emails,
        };
        input
          .validate(region)
          .with_context(|| format!("number {:?}", input.name))?;
        Ok(input)
      })
      .collect::<Result<Vec<_>>>()?;

    let mailboxes = self
      .mailboxes
      .into_iter()
      .map(|entry| plan_mailbox(entry, region, &number_names))
      .collect::<Result<Vec<_>>>()?;

    let menus = self
      .menus
      .into_iter()
      .map(|entry| plan_menu(entry, &mailbox_names, &menu_names))
      .collect::<Result<Vec<_>>>()?;

    Ok(Plan { numbers, mailboxes, menus })
  }
}

fn unique_names<'a>(
  kind: &str,
  names: impl Iterator<Item = &'a str>,
) -> Result<HashSet<String>> {
  let mut seen = HashSet::new();
  for name in names {
    if !seen.insert(name.to_owned()) {
      bail!("{kind} {name:?} is defined more than once");
    }
  }
  Ok(seen)
}

fn plan_mailbox(
  entry: MailboxEntry,
  region: &Region,
  numbers: &HashSet<String>,
) -> Result<PlannedMailbox> {
  let name = entry.name.clone();
  let context = || format!("mailbox {name:?}");

  if let Some(number) = &entry.notification_number
    && !numbers.contains(number)
  {
    bail!("mailbox {name:?}: unknown notification_number {number:?}");
  }

  // Validation only needs to know a notification phone is present.
  let input = NewMailbox {
    name:                  entry.name,
    phone:                 entry.phone.filter(|p| !p.trim().is_empty()),
    notification_phone:    entry.notification_number.as_ref().map(|_| Uuid::nil()),
    phone_list:            entry.phones,
    email_list:            entry.emails,
    available_start:       parse_time(entry.available_start.as_deref()).with_context(context)?,
    available_stop:        parse_time(entry.available_stop.as_deref()).with_context(context)?,
    always_send_voicemail: entry.always_send_voicemail,
  };
  input.validate(region).with_context(context)?;

  Ok(PlannedMailbox { input, notification_number: entry.notification_number })
}

fn plan_menu(
  entry: MenuEntry,
  mailboxes: &HashSet<String>,
  menus: &HashSet<String>,
) -> Result<PlannedMenu> {
  let input = NewMenu {
    name:          entry.name,
    enabled:       entry.enabled,
    greeting_text: entry.greeting,
    voice:         entry.voice.filter(|v| !v.trim().is_empty()),
  };
  input.validate().with_context(|| format!("menu {:?}", input.name))?;

  let items = entry
    .items
    .into_iter()
    .map(|item| {
      let digit = item.digit;
      plan_item(item, mailboxes, menus)
        .with_context(|| format!("menu {:?}, item {digit}", input.name))
    })
    .collect::<Result<Vec<_>>>()?;

  Ok(PlannedMenu { input, items })
}

fn plan_item(
  entry: ItemEntry,
  mailboxes: &HashSet<String>,
  menus: &HashSet<String>,
) -> Result<PlannedItem> {
  if let Some(mailbox) = &entry.mailbox
    && !mailboxes.contains(mailbox)
  {
    bail!("unknown mailbox {mailbox:?}");
  }
  if let Some(submenu) = &entry.submenu
    && !menus.contains(submenu)
  {
    bail!("unknown submenu {submenu:?}");
  }

  // Rejects more than one action; ids are placeholders until write time.
  let action = NewAction::from_fields(
    entry.mailbox.as_ref().map(|_| Uuid::nil()),
    entry.submenu.as_ref().map(|_| Uuid::nil()),
    entry.url.clone(),
    entry.function.clone(),
  )?
  .map(|action| match action {
    NewAction::Mailbox(_) => ActionRef::Mailbox(entry.mailbox.clone().unwrap_or_default()),
    NewAction::Submenu(_) => ActionRef::Submenu(entry.submenu.clone().unwrap_or_default()),
    NewAction::Url(url) => ActionRef::Url(url),
    NewAction::Function(name) => ActionRef::Function(name),
  });

  let input = NewMenuItem {
    menu_id:         None,
    digit:           entry.digit,
    enabled:         entry.enabled,
    menu_text:       entry.text,
    pin_digits:      entry.pins,
    pin_prompt_text: entry.pin_prompt,
    action:          None,
    action_text:     entry.action_text,
  };
  input.validate()?;

  Ok(PlannedItem { input, action })
}

fn parse_time(raw: Option<&str>) -> Result<Option<NaiveTime>> {
  let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
    return Ok(None);
  };
  NaiveTime::parse_from_str(raw, "%H:%M")
    .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
    .map(Some)
    .with_context(|| format!("invalid time {raw:?}, expected HH:MM"))
}
