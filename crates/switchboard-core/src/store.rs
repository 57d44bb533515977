//! The `CallCenterStore` trait.
//!
//! Implemented by storage backends (e.g. `switchboard-store-sqlite`). The
//! webhook server reads configuration and writes the voicemail/SMS logs
//! through this abstraction only.
//!
//! Configuration writes take the `New*` input types and assume the caller
//! already ran their `validate` methods; backends enforce only what their
//! schema can (uniqueness, the single-action rule).

use std::future::Future;

use uuid::Uuid;

use crate::{
  mailbox::{MailboxNumber, NewMailbox},
  menu::{Menu, MenuItem, NewMenu, NewMenuItem},
  number::{NewTwilioNumber, TwilioNumber},
  record::{SmsMessage, SmsUpsert, Voicemail, VoicemailUpsert},
};

/// All methods return `Send` futures so the trait can back axum handlers on
/// a multi-threaded runtime.
pub trait CallCenterStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Configuration reads ───────────────────────────────────────────────

  /// The enabled menu called `name`, if any.
  fn find_enabled_menu<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Option<Menu>, Self::Error>> + Send + 'a;

  fn get_menu(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Menu>, Self::Error>> + Send + '_;

  /// Enabled items of a menu, ascending by digit. Items sharing a digit keep
  /// their creation order.
  fn list_enabled_items(
    &self,
    menu_id: Uuid,
  ) -> impl Future<Output = Result<Vec<MenuItem>, Self::Error>> + Send + '_;

  fn get_menu_item(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<MenuItem>, Self::Error>> + Send + '_;

  fn get_mailbox(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<MailboxNumber>, Self::Error>> + Send + '_;

  fn get_twilio_number(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<TwilioNumber>, Self::Error>> + Send + '_;

  fn list_twilio_numbers(
    &self,
  ) -> impl Future<Output = Result<Vec<TwilioNumber>, Self::Error>> + Send + '_;

  /// Every distinct function name referenced by a menu item, sorted.
  fn list_function_names(
    &self,
  ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + '_;

  // ── Configuration writes ──────────────────────────────────────────────

  fn add_menu(
    &self,
    input: NewMenu,
  ) -> impl Future<Output = Result<Menu, Self::Error>> + Send + '_;

  fn add_menu_item(
    &self,
    input: NewMenuItem,
  ) -> impl Future<Output = Result<MenuItem, Self::Error>> + Send + '_;

  fn add_mailbox(
    &self,
    input: NewMailbox,
  ) -> impl Future<Output = Result<MailboxNumber, Self::Error>> + Send + '_;

  fn add_twilio_number(
    &self,
    input: NewTwilioNumber,
  ) -> impl Future<Output = Result<TwilioNumber, Self::Error>> + Send + '_;

  // ── Voicemail log ─────────────────────────────────────────────────────

  /// Create the row for `input.sid` or merge the supplied fields into it.
  fn upsert_voicemail(
    &self,
    input: VoicemailUpsert,
  ) -> impl Future<Output = Result<Voicemail, Self::Error>> + Send + '_;

  fn get_voicemail<'a>(
    &'a self,
    sid: &'a str,
  ) -> impl Future<Output = Result<Option<Voicemail>, Self::Error>> + Send + 'a;

  /// Voicemails whose recording is still held by the provider.
  fn list_unremoved_voicemails(
    &self,
  ) -> impl Future<Output = Result<Vec<Voicemail>, Self::Error>> + Send + '_;

  fn mark_voicemail_removed<'a>(
    &'a self,
    sid: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  // ── SMS log ───────────────────────────────────────────────────────────

  fn upsert_sms(
    &self,
    input: SmsUpsert,
  ) -> impl Future<Output = Result<SmsMessage, Self::Error>> + Send + '_;

  fn get_sms<'a>(
    &'a self,
    sid: &'a str,
  ) -> impl Future<Output = Result<Option<SmsMessage>, Self::Error>> + Send + 'a;
}
