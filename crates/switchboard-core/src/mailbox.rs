//! Mailboxes: a destination phone plus voicemail policy and the people who
//! hear about new voicemail.

use std::fmt;

use chrono::{Local, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, list::validate_email_list, phone::Region};

/// Local-time window during which the mailbox phone is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
  pub start: NaiveTime,
  pub stop:  NaiveTime,
}

impl Availability {
  /// Inclusive on both ends.
  pub fn contains(&self, now: NaiveTime) -> bool {
    now >= self.start && now <= self.stop
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailboxNumber {
  pub mailbox_id:            Uuid,
  pub name:                  String,
  /// Phone to connect to. `None` means every call goes to voicemail.
  pub phone:                 Option<String>,
  /// The [`TwilioNumber`](crate::number::TwilioNumber) used as the sender of
  /// SMS notifications.
  pub notification_phone:    Option<Uuid>,
  pub phone_list:            Vec<String>,
  pub email_list:            Vec<String>,
  /// `None` means always available.
  pub availability:          Option<Availability>,
  pub always_send_voicemail: bool,
}

impl MailboxNumber {
  /// Evaluated against the local wall clock at call time; never cached.
  pub fn should_send_voicemail(&self) -> bool {
    self.should_send_voicemail_at(Local::now().time())
  }

  pub fn should_send_voicemail_at(&self, now: NaiveTime) -> bool {
    self.always_send_voicemail || self.phone.is_none() || self.unavailable_at(now)
  }

  /// True only when a window is configured and `now` is outside it.
  pub fn unavailable_at(&self, now: NaiveTime) -> bool {
    self.availability.is_some_and(|w| !w.contains(now))
  }
}

impl fmt::Display for MailboxNumber {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.phone {
      Some(phone) => write!(f, "{}-{}", self.name, phone),
      None => f.write_str(&self.name),
    }
  }
}

/// Input for creating a mailbox; see [`NewMailbox::validate`].
#[derive(Debug, Clone, Default)]
pub struct NewMailbox {
  pub name:                  String,
  pub phone:                 Option<String>,
  pub notification_phone:    Option<Uuid>,
  pub phone_list:            Vec<String>,
  pub email_list:            Vec<String>,
  pub available_start:       Option<NaiveTime>,
  pub available_stop:        Option<NaiveTime>,
  pub always_send_voicemail: bool,
}

impl NewMailbox {
  pub fn validate(&self, region: &Region) -> Result<()> {
    if self.name.trim().is_empty() {
      return Err(Error::Empty("mailbox name"));
    }
    if let Some(phone) = &self.phone {
      region.validate(phone)?;
    }
    region.validate_list(&self.phone_list)?;
    validate_email_list(&self.email_list)?;
    if !self.phone_list.is_empty() && self.notification_phone.is_none() {
      return Err(Error::MissingNotificationPhone);
    }
    self.availability()?;
    Ok(())
  }

  /// Both bounds or neither; `start` may not come after `stop`.
  pub fn availability(&self) -> Result<Option<Availability>> {
    match (self.available_start, self.available_stop) {
      (None, None) => Ok(None),
      (Some(start), Some(stop)) if start > stop => {
        Err(Error::InvertedAvailability { start, stop })
      }
      (Some(start), Some(stop)) => Ok(Some(Availability { start, stop })),
      _ => Err(Error::PartialAvailability),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn t(h: u32, m: u32) -> NaiveTime { NaiveTime::from_hms_opt(h, m, 0).unwrap() }

  fn mailbox(phone: Option<&str>, always: bool, window: Option<(u32, u32)>) -> MailboxNumber {
    MailboxNumber {
      mailbox_id:            Uuid::new_v4(),
      name:                  "front-desk".into(),
      phone:                 phone.map(str::to_owned),
      notification_phone:    None,
      phone_list:            vec![],
      email_list:            vec![],
      availability:          window.map(|(a, b)| Availability { start: t(a, 0), stop: t(b, 0) }),
      always_send_voicemail: always,
    }
  }

  #[test]
  fn always_send_voicemail_wins() {
    let m = mailbox(Some("720-201-0123"), true, Some((9, 17)));
    assert!(m.should_send_voicemail_at(t(12, 0)));
  }

  #[test]
  fn no_phone_means_voicemail() {
    let m = mailbox(None, false, None);
    assert!(m.should_send_voicemail_at(t(12, 0)));
    assert!(m.should_send_voicemail());
  }

  #[test]
  fn phone_without_window_dials() {
    let m = mailbox(Some("720-201-0123"), false, None);
    assert!(!m.should_send_voicemail_at(t(3, 0)));
    assert!(!m.should_send_voicemail_at(t(23, 59)));
    assert!(!m.should_send_voicemail());
  }

  #[test]
  fn window_decides_when_phone_set() {
    let m = mailbox(Some("720-201-0123"), false, Some((9, 17)));
    assert!(m.should_send_voicemail_at(t(20, 0)));
    assert!(!m.should_send_voicemail_at(t(12, 0)));
    assert!(!m.should_send_voicemail_at(t(9, 0)));
    assert!(!m.should_send_voicemail_at(t(17, 0)));
    assert!(m.should_send_voicemail_at(t(8, 59)));
  }

  #[test]
  fn display_includes_phone_when_set() {
    assert_eq!(mailbox(None, false, None).to_string(), "front-desk");
    assert_eq!(
      mailbox(Some("720-201-0123"), false, None).to_string(),
      "front-desk-720-201-0123"
    );
  }

  #[test]
  fn phone_list_requires_notification_phone() {
    let new = NewMailbox {
      name: "sales".into(),
      phone_list: vec!["720-201-0123".into()],
      ..Default::default()
    };
    assert!(matches!(
      new.validate(&Region::default()),
      Err(Error::MissingNotificationPhone)
    ));
  }

  #[test]
  fn half_a_window_is_rejected() {
    let new = NewMailbox {
      name: "sales".into(),
      available_start: Some(t(9, 0)),
      ..Default::default()
    };
    assert!(matches!(new.validate(&Region::default()), Err(Error::PartialAvailability)));
  }

  #[test]
  fn inverted_window_is_rejected() {
    let new = NewMailbox {
      name:            "sales".into(),
      available_start: Some(t(17, 0)),
      available_stop:  Some(t(9, 0)),
      ..Default::default()
    };
    assert!(matches!(
      new.validate(&Region::default()),
      Err(Error::InvertedAvailability { .. })
    ));
  }

  #[test]
  fn bad_email_is_rejected() {
    let new = NewMailbox {
      name:       "sales".into(),
      email_list: vec!["nobody".into()],
      ..Default::default()
    };
    assert!(matches!(new.validate(&Region::default()), Err(Error::InvalidEmail(_))));
  }
}
