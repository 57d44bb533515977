//! Runtime logs: voicemail recordings and SMS messages.
//!
//! Both are keyed by the provider's `sid` and written with upsert semantics:
//! every webhook about the same `sid` merges into one row.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

/// Transcription status that carries usable text.
pub const TRANSCRIPTION_COMPLETED: &str = "completed";

// ─── Voicemail ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Voicemail {
  /// Provider recording id.
  pub sid:                   String,
  pub call_sid:              String,
  /// The item that routed the call here.
  pub menu_item:             Option<Uuid>,
  pub mailbox:               Option<Uuid>,
  pub from_phone:            String,
  pub to_phone:              String,
  pub url:                   String,
  pub status:                String,
  pub transcription:         String,
  /// `None` until the transcription callback arrives.
  pub transcription_status:  Option<String>,
  pub last_activity:         DateTime<Utc>,
  /// Set once the recording has been purged from the provider.
  pub removed_from_provider: bool,
}

impl Voicemail {
  pub fn is_expired(&self, lifespan: Duration, now: DateTime<Utc>) -> bool {
    now >= self.last_activity + lifespan
  }

  pub fn is_transcribed(&self) -> bool {
    self.transcription_status.as_deref() == Some(TRANSCRIPTION_COMPLETED)
  }
}

impl fmt::Display for Voicemail {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.sid) }
}

/// One recording or transcription callback's worth of fields.
///
/// `None` leaves the stored value untouched; `Some` overwrites it.
#[derive(Debug, Clone, Default)]
pub struct VoicemailUpsert {
  pub sid:                  String,
  pub call_sid:             Option<String>,
  pub menu_item:            Option<Uuid>,
  pub mailbox:              Option<Uuid>,
  pub from_phone:           Option<String>,
  pub to_phone:             Option<String>,
  pub url:                  Option<String>,
  pub status:               Option<String>,
  pub transcription:        Option<String>,
  pub transcription_status: Option<String>,
  pub last_activity:        Option<DateTime<Utc>>,
}

// ─── SMS ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmsMessage {
  pub sid:           String,
  pub from_phone:    String,
  pub to_phone:      String,
  pub message:       String,
  pub status:        String,
  pub last_activity: DateTime<Utc>,
}

/// Same merge rules as [`VoicemailUpsert`].
#[derive(Debug, Clone, Default)]
pub struct SmsUpsert {
  pub sid:           String,
  pub from_phone:    Option<String>,
  pub to_phone:      Option<String>,
  pub message:       Option<String>,
  pub status:        Option<String>,
  pub last_activity: Option<DateTime<Utc>>,
}

/// Message states reported by the provider in `MessageStatus`/`SmsStatus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum DeliveryStatus {
  Accepted,
  Scheduled,
  Canceled,
  Queued,
  Sending,
  Sent,
  Failed,
  Delivered,
  Undelivered,
  Receiving,
  Received,
  Read,
}

impl DeliveryStatus {
  pub fn is_failure(self) -> bool {
    matches!(self, DeliveryStatus::Failed | DeliveryStatus::Undelivered)
  }
}
