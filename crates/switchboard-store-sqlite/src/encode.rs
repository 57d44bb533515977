//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, local times `HH:MM:SS`, UUIDs hyphenated
//! lowercase strings, and recipient/PIN lists comma-separated text.

use chrono::{DateTime, NaiveTime, Utc};
use rusqlite::Row;
use switchboard_core::{
  list::split_list_or_empty,
  mailbox::{Availability, MailboxNumber},
  menu::{Action, Menu, MenuItem, MenuRef},
  number::TwilioNumber,
  record::{SmsMessage, Voicemail},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

fn decode_opt_uuid(s: Option<String>) -> Result<Option<Uuid>> {
  s.as_deref().map(decode_uuid).transpose()
}

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_time(t: NaiveTime) -> String { t.format("%H:%M:%S").to_string() }

pub fn decode_time(s: &str) -> Result<NaiveTime> {
  NaiveTime::parse_from_str(s, "%H:%M:%S").map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Menus ───────────────────────────────────────────────────────────────────

pub const MENU_COLUMNS: &str = "menu_id, name, enabled, greeting_text, voice";

pub struct RawMenu {
  pub menu_id:       String,
  pub name:          String,
  pub enabled:       bool,
  pub greeting_text: String,
  pub voice:         Option<String>,
}

impl RawMenu {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      menu_id:       row.get(0)?,
      name:          row.get(1)?,
      enabled:       row.get(2)?,
      greeting_text: row.get(3)?,
      voice:         row.get(4)?,
    })
  }

  pub fn into_menu(self) -> Result<Menu> {
    Ok(Menu {
      menu_id:       decode_uuid(&self.menu_id)?,
      name:          self.name,
      enabled:       self.enabled,
      greeting_text: self.greeting_text,
      voice:         self.voice,
    })
  }
}

// ─── Menu items ──────────────────────────────────────────────────────────────

/// Item columns joined with the owning and target menu names.
pub const ITEM_SELECT: &str = "
  SELECT i.item_id, i.menu_id, m.name, i.digit, i.enabled, i.menu_text,
         i.pin_digits, i.pin_prompt_text, i.action_text,
         i.action_mailbox, i.action_submenu, sm.name,
         i.action_url, i.action_function
  FROM menu_items i
  LEFT JOIN menus m  ON m.menu_id  = i.menu_id
  LEFT JOIN menus sm ON sm.menu_id = i.action_submenu";

pub struct RawItem {
  pub item_id:         String,
  pub menu_id:         Option<String>,
  pub menu_name:       Option<String>,
  pub digit:           u8,
  pub enabled:         bool,
  pub menu_text:       String,
  pub pin_digits:      String,
  pub pin_prompt_text: String,
  pub action_text:     String,
  pub action_mailbox:  Option<String>,
  pub action_submenu:  Option<String>,
  pub submenu_name:    Option<String>,
  pub action_url:      Option<String>,
  pub action_function: Option<String>,
}

impl RawItem {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      item_id:         row.get(0)?,
      menu_id:         row.get(1)?,
      menu_name:       row.get(2)?,
      digit:           row.get(3)?,
      enabled:         row.get(4)?,
      menu_text:       row.get(5)?,
      pin_digits:      row.get(6)?,
      pin_prompt_text: row.get(7)?,
      action_text:     row.get(8)?,
      action_mailbox:  row.get(9)?,
      action_submenu:  row.get(10)?,
      submenu_name:    row.get(11)?,
      action_url:      row.get(12)?,
      action_function: row.get(13)?,
    })
  }

  pub fn into_item(self) -> Result<MenuItem> {
    let corrupt = |reason: String| Error::Corrupt { table: "menu_items", reason };

    let menu = match (self.menu_id, self.menu_name) {
      (Some(id), Some(name)) => Some(MenuRef { menu_id: decode_uuid(&id)?, name }),
      (None, _) => None,
      (Some(id), None) => return Err(corrupt(format!("dangling menu {id}"))),
    };

    let mut actions = Vec::new();
    if let Some(id) = self.action_mailbox {
      actions.push(Action::Mailbox(decode_uuid(&id)?));
    }
    if let Some(id) = self.action_submenu {
      let name = self
        .submenu_name
        .ok_or_else(|| corrupt(format!("dangling submenu {id}")))?;
      actions.push(Action::Submenu(MenuRef { menu_id: decode_uuid(&id)?, name }));
    }
    if let Some(url) = self.action_url {
      actions.push(Action::Url(url));
    }
    if let Some(func) = self.action_function {
      actions.push(Action::Function(func));
    }
    if actions.len() > 1 {
      return Err(corrupt(format!("item {} has {} actions", self.item_id, actions.len())));
    }

    Ok(MenuItem {
      item_id:         decode_uuid(&self.item_id)?,
      menu,
      digit:           self.digit,
      enabled:         self.enabled,
      menu_text:       self.menu_text,
      pin_digits:      split_list_or_empty(&self.pin_digits),
      pin_prompt_text: self.pin_prompt_text,
      action:          actions.pop(),
      action_text:     self.action_text,
    })
  }
}

// ─── Mailboxes ───────────────────────────────────────────────────────────────

pub const MAILBOX_COLUMNS: &str = "mailbox_id, name, phone, notification_phone, phone_list, \
   email_list, available_start, available_stop, always_send_voicemail";

pub struct RawMailbox {
  pub mailbox_id:            String,
  pub name:                  String,
  pub phone:                 Option<String>,
  pub notification_phone:    Option<String>,
  pub phone_list:            String,
  pub email_list:            String,
  pub available_start:       Option<String>,
  pub available_stop:        Option<String>,
  pub always_send_voicemail: bool,
}

impl RawMailbox {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      mailbox_id:            row.get(0)?,
      name:                  row.get(1)?,
      phone:                 row.get(2)?,
      notification_phone:    row.get(3)?,
      phone_list:            row.get(4)?,
      email_list:            row.get(5)?,
      available_start:       row.get(6)?,
      available_stop:        row.get(7)?,
      always_send_voicemail: row.get(8)?,
    })
  }

  pub fn into_mailbox(self) -> Result<MailboxNumber> {
    let availability = match (self.available_start, self.available_stop) {
      (Some(start), Some(stop)) => Some(Availability {
        start: decode_time(&start)?,
        stop:  decode_time(&stop)?,
      }),
      _ => None,
    };

    Ok(MailboxNumber {
      mailbox_id: decode_uuid(&self.mailbox_id)?,
      name: self.name,
      // The column is nullable, but be lenient with blank strings.
      phone: self.phone.filter(|p| !p.trim().is_empty()),
      notification_phone: decode_opt_uuid(self.notification_phone)?,
      phone_list: split_list_or_empty(&self.phone_list),
      email_list: split_list_or_empty(&self.email_list),
      availability,
      always_send_voicemail: self.always_send_voicemail,
    })
  }
}

// ─── Twilio numbers ──────────────────────────────────────────────────────────

pub const NUMBER_COLUMNS: &str = "number_id, name, phone, forward_phone_list, forward_email_list";

pub struct RawNumber {
  pub number_id:          String,
  pub name:               String,
  pub phone:              String,
  pub forward_phone_list: String,
  pub forward_email_list: String,
}

impl RawNumber {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      number_id:          row.get(0)?,
      name:               row.get(1)?,
      phone:              row.get(2)?,
      forward_phone_list: row.get(3)?,
      forward_email_list: row.get(4)?,
    })
  }

  pub fn into_number(self) -> Result<TwilioNumber> {
    Ok(TwilioNumber {
      number_id:          decode_uuid(&self.number_id)?,
      name:               self.name,
      phone:              self.phone,
      forward_phone_list: split_list_or_empty(&self.forward_phone_list),
      forward_email_list: split_list_or_empty(&self.forward_email_list),
    })
  }
}

// ─── Voicemails ──────────────────────────────────────────────────────────────

pub const VOICEMAIL_COLUMNS: &str = "sid, call_sid, menu_item, mailbox, from_phone, to_phone, \
   url, status, transcription, transcription_status, last_activity, removed_from_provider";

pub struct RawVoicemail {
  pub sid:                   String,
  pub call_sid:              String,
  pub menu_item:             Option<String>,
  pub mailbox:               Option<String>,
  pub from_phone:            String,
  pub to_phone:              String,
  pub url:                   String,
  pub status:                String,
  pub transcription:         String,
  pub transcription_status:  Option<String>,
  pub last_activity:         String,
  pub removed_from_provider: bool,
}

impl RawVoicemail {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      sid:                   row.get(0)?,
      call_sid:              row.get(1)?,
      menu_item:             row.get(2)?,
      mailbox:               row.get(3)?,
      from_phone:            row.get(4)?,
      to_phone:              row.get(5)?,
      url:                   row.get(6)?,
      status:                row.get(7)?,
      transcription:         row.get(8)?,
      transcription_status:  row.get(9)?,
      last_activity:         row.get(10)?,
      removed_from_provider: row.get(11)?,
    })
  }

  pub fn into_voicemail(self) -> Result<Voicemail> {
    Ok(Voicemail {
      sid:                   self.sid,
      call_sid:              self.call_sid,
      menu_item:             decode_opt_uuid(self.menu_item)?,
      mailbox:               decode_opt_uuid(self.mailbox)?,
      from_phone:            self.from_phone,
      to_phone:              self.to_phone,
      url:                   self.url,
      status:                self.status,
      transcription:         self.transcription,
      transcription_status:  self.transcription_status,
      last_activity:         decode_dt(&self.last_activity)?,
      removed_from_provider: self.removed_from_provider,
    })
  }
}

// ─── SMS ─────────────────────────────────────────────────────────────────────

pub const SMS_COLUMNS: &str = "sid, from_phone, to_phone, message, status, last_activity";

pub struct RawSms {
  pub sid:           String,
  pub from_phone:    String,
  pub to_phone:      String,
  pub message:       String,
  pub status:        String,
  pub last_activity: String,
}

impl RawSms {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      sid:           row.get(0)?,
      from_phone:    row.get(1)?,
      to_phone:      row.get(2)?,
      message:       row.get(3)?,
      status:        row.get(4)?,
      last_activity: row.get(5)?,
    })
  }

  pub fn into_sms(self) -> Result<SmsMessage> {
    Ok(SmsMessage {
      sid:           self.sid,
      from_phone:    self.from_phone,
      to_phone:      self.to_phone,
      message:       self.message,
      status:        self.status,
      last_activity: decode_dt(&self.last_activity)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn time_round_trips_through_text() {
    let t = NaiveTime::from_hms_opt(17, 30, 0).unwrap();
    assert_eq!(encode_time(t), "17:30:00");
    assert_eq!(decode_time("17:30:00").unwrap(), t);
    assert!(decode_time("5pm").is_err());
  }
}
