//! [`SqliteStore`], the SQLite implementation of [`CallCenterStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use switchboard_core::{
  list::join_list,
  mailbox::{MailboxNumber, NewMailbox},
  menu::{Menu, MenuItem, NewAction, NewMenu, NewMenuItem},
  number::{NewTwilioNumber, TwilioNumber},
  record::{SmsMessage, SmsUpsert, Voicemail, VoicemailUpsert},
  store::CallCenterStore,
};
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{
    ITEM_SELECT, MAILBOX_COLUMNS, MENU_COLUMNS, NUMBER_COLUMNS, RawItem, RawMailbox, RawMenu,
    RawNumber, RawSms, RawVoicemail, SMS_COLUMNS, VOICEMAIL_COLUMNS, encode_dt, encode_time,
    encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A call-center store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn required_item(&self, id: Uuid) -> Result<MenuItem> {
    self
      .get_menu_item(id)
      .await?
      .ok_or_else(|| Error::Vanished { table: "menu_items", id: id.to_string() })
  }

  async fn required_voicemail(&self, sid: &str) -> Result<Voicemail> {
    self
      .get_voicemail(sid)
      .await?
      .ok_or_else(|| Error::Vanished { table: "voicemails", id: sid.to_owned() })
  }

  async fn required_sms(&self, sid: &str) -> Result<SmsMessage> {
    self
      .get_sms(sid)
      .await?
      .ok_or_else(|| Error::Vanished { table: "sms_messages", id: sid.to_owned() })
  }
}

// ─── CallCenterStore impl ────────────────────────────────────────────────────

impl CallCenterStore for SqliteStore {
  type Error = Error;

  // ── Configuration reads ───────────────────────────────────────────────────

  async fn find_enabled_menu(&self, name: &str) -> Result<Option<Menu>> {
    let name = name.to_owned();

    let raw: Option<RawMenu> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {MENU_COLUMNS} FROM menus WHERE name = ?1 AND enabled = 1"),
              rusqlite::params![name],
              RawMenu::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawMenu::into_menu).transpose()
  }

  async fn get_menu(&self, id: Uuid) -> Result<Option<Menu>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawMenu> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {MENU_COLUMNS} FROM menus WHERE menu_id = ?1"),
              rusqlite::params![id_str],
              RawMenu::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawMenu::into_menu).transpose()
  }

  async fn list_enabled_items(&self, menu_id: Uuid) -> Result<Vec<MenuItem>> {
    let id_str = encode_uuid(menu_id);

    let raws: Vec<RawItem> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "{ITEM_SELECT}
           WHERE i.menu_id = ?1 AND i.enabled = 1
           ORDER BY i.digit ASC, i.rowid ASC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], RawItem::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawItem::into_item).collect()
  }

  async fn get_menu_item(&self, id: Uuid) -> Result<Option<MenuItem>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawItem> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("{ITEM_SELECT} WHERE i.item_id = ?1"),
              rusqlite::params![id_str],
              RawItem::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawItem::into_item).transpose()
  }

  async fn get_mailbox(&self, id: Uuid) -> Result<Option<MailboxNumber>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawMailbox> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {MAILBOX_COLUMNS} FROM mailboxes WHERE mailbox_id = ?1"),
              rusqlite::params![id_str],
              RawMailbox::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawMailbox::into_mailbox).transpose()
  }

  async fn get_twilio_number(&self, id: Uuid) -> Result<Option<TwilioNumber>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawNumber> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {NUMBER_COLUMNS} FROM twilio_numbers WHERE number_id = ?1"),
              rusqlite::params![id_str],
              RawNumber::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawNumber::into_number).transpose()
  }

  async fn list_twilio_numbers(&self) -> Result<Vec<TwilioNumber>> {
    let raws: Vec<RawNumber> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {NUMBER_COLUMNS} FROM twilio_numbers ORDER BY rowid ASC"
        ))?;
        let rows = stmt
          .query_map([], RawNumber::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawNumber::into_number).collect()
  }

  async fn list_function_names(&self) -> Result<Vec<String>> {
    let names = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT DISTINCT action_function FROM menu_items
           WHERE action_function IS NOT NULL
           ORDER BY action_function ASC",
        )?;
        let rows = stmt
          .query_map([], |row| row.get::<_, String>(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(names)
  }

  // ── Configuration writes ──────────────────────────────────────────────────

  async fn add_menu(&self, input: NewMenu) -> Result<Menu> {
    let menu = Menu {
      menu_id:       Uuid::new_v4(),
      name:          input.name,
      enabled:       input.enabled,
      greeting_text: input.greeting_text,
      voice:         input.voice,
    };

    let id_str   = encode_uuid(menu.menu_id);
    let name     = menu.name.clone();
    let enabled  = menu.enabled;
    let greeting = menu.greeting_text.clone();
    let voice    = menu.voice.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO menus (menu_id, name, enabled, greeting_text, voice)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, name, enabled, greeting, voice],
        )?;
        Ok(())
      })
      .await?;

    Ok(menu)
  }

  async fn add_menu_item(&self, input: NewMenuItem) -> Result<MenuItem> {
    let item_id = Uuid::new_v4();

    let (mailbox, submenu, url, function) = match input.action {
      Some(NewAction::Mailbox(id)) => (Some(encode_uuid(id)), None, None, None),
      Some(NewAction::Submenu(id)) => (None, Some(encode_uuid(id)), None, None),
      Some(NewAction::Url(u)) => (None, None, Some(u), None),
      Some(NewAction::Function(f)) => (None, None, None, Some(f)),
      None => (None, None, None, None),
    };

    let id_str     = encode_uuid(item_id);
    let menu_str   = input.menu_id.map(encode_uuid);
    let digit      = input.digit;
    let enabled    = input.enabled;
    let menu_text  = input.menu_text;
    let pins       = join_list(&input.pin_digits);
    let pin_prompt = input.pin_prompt_text;
    let act_text   = input.action_text;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO menu_items (
             item_id, menu_id, digit, enabled, menu_text, pin_digits,
             pin_prompt_text, action_text,
             action_mailbox, action_submenu, action_url, action_function
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
          rusqlite::params![
            id_str, menu_str, digit, enabled, menu_text, pins, pin_prompt, act_text,
            mailbox, submenu, url, function,
          ],
        )?;
        Ok(())
      })
      .await?;

    self.required_item(item_id).await
  }

  async fn add_mailbox(&self, input: NewMailbox) -> Result<MailboxNumber> {
    let availability = input.availability()?;
    let mailbox = MailboxNumber {
      mailbox_id:            Uuid::new_v4(),
      name:                  input.name,
      phone:                 input.phone.filter(|p| !p.trim().is_empty()),
      notification_phone:    input.notification_phone,
      phone_list:            input.phone_list,
      email_list:            input.email_list,
      availability,
      always_send_voicemail: input.always_send_voicemail,
    };

    let id_str       = encode_uuid(mailbox.mailbox_id);
    let name         = mailbox.name.clone();
    let phone        = mailbox.phone.clone();
    let notif        = mailbox.notification_phone.map(encode_uuid);
    let phone_list   = join_list(&mailbox.phone_list);
    let email_list   = join_list(&mailbox.email_list);
    let start        = availability.map(|w| encode_time(w.start));
    let stop         = availability.map(|w| encode_time(w.stop));
    let always       = mailbox.always_send_voicemail;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO mailboxes (
             mailbox_id, name, phone, notification_phone, phone_list, email_list,
             available_start, available_stop, always_send_voicemail
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          rusqlite::params![
            id_str, name, phone, notif, phone_list, email_list, start, stop, always,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(mailbox)
  }

  async fn add_twilio_number(&self, input: NewTwilioNumber) -> Result<TwilioNumber> {
    let number = TwilioNumber {
      number_id:          Uuid::new_v4(),
      name:               input.name,
      phone:              input.phone,
      forward_phone_list: input.forward_phone_list,
      forward_email_list: input.forward_email_list,
    };

    let id_str  = encode_uuid(number.number_id);
    let name    = number.name.clone();
    let phone   = number.phone.clone();
    let phones  = join_list(&number.forward_phone_list);
    let emails  = join_list(&number.forward_email_list);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO twilio_numbers (
             number_id, name, phone, forward_phone_list, forward_email_list
           ) VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, name, phone, phones, emails],
        )?;
        Ok(())
      })
      .await?;

    Ok(number)
  }

  // ── Voicemail log ─────────────────────────────────────────────────────────

  async fn upsert_voicemail(&self, input: VoicemailUpsert) -> Result<Voicemail> {
    let sid       = input.sid.clone();
    let menu_item = input.menu_item.map(encode_uuid);
    let mailbox   = input.mailbox.map(encode_uuid);
    let at_str    = encode_dt(input.last_activity.unwrap_or_else(Utc::now));

    self
      .conn
      .call(move |conn| {
        // Absent fields keep whatever an earlier callback stored.
        conn.execute(
          "INSERT INTO voicemails (
             sid, call_sid, menu_item, mailbox, from_phone, to_phone, url,
             status, transcription, transcription_status, last_activity
           ) VALUES (
             ?1, COALESCE(?2, ''), ?3, ?4, COALESCE(?5, ''), COALESCE(?6, ''),
             COALESCE(?7, ''), COALESCE(?8, ''), COALESCE(?9, ''), ?10, ?11
           )
           ON CONFLICT (sid) DO UPDATE SET
             call_sid             = COALESCE(?2,  call_sid),
             menu_item            = COALESCE(?3,  menu_item),
             mailbox              = COALESCE(?4,  mailbox),
             from_phone           = COALESCE(?5,  from_phone),
             to_phone             = COALESCE(?6,  to_phone),
             url                  = COALESCE(?7,  url),
             status               = COALESCE(?8,  status),
             transcription        = COALESCE(?9,  transcription),
             transcription_status = COALESCE(?10, transcription_status),
             last_activity        = ?11",
          rusqlite::params![
            input.sid,
            input.call_sid,
            menu_item,
            mailbox,
            input.from_phone,
            input.to_phone,
            input.url,
            input.status,
            input.transcription,
            input.transcription_status,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    self.required_voicemail(&sid).await
  }

  async fn get_voicemail(&self, sid: &str) -> Result<Option<Voicemail>> {
    let sid = sid.to_owned();

    let raw: Option<RawVoicemail> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {VOICEMAIL_COLUMNS} FROM voicemails WHERE sid = ?1"),
              rusqlite::params![sid],
              RawVoicemail::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawVoicemail::into_voicemail).transpose()
  }

  async fn list_unremoved_voicemails(&self) -> Result<Vec<Voicemail>> {
    let raws: Vec<RawVoicemail> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {VOICEMAIL_COLUMNS} FROM voicemails
           WHERE removed_from_provider = 0
           ORDER BY last_activity ASC"
        ))?;
        let rows = stmt
          .query_map([], RawVoicemail::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawVoicemail::into_voicemail).collect()
  }

  async fn mark_voicemail_removed(&self, sid: &str) -> Result<()> {
    let sid = sid.to_owned();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE voicemails SET removed_from_provider = 1 WHERE sid = ?1",
          rusqlite::params![sid],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── SMS log ───────────────────────────────────────────────────────────────

  async fn upsert_sms(&self, input: SmsUpsert) -> Result<SmsMessage> {
    let sid    = input.sid.clone();
    let at_str = encode_dt(input.last_activity.unwrap_or_else(Utc::now));

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO sms_messages (sid, from_phone, to_phone, message, status, last_activity)
           VALUES (?1, COALESCE(?2, ''), COALESCE(?3, ''), COALESCE(?4, ''), COALESCE(?5, ''), ?6)
           ON CONFLICT (sid) DO UPDATE SET
             from_phone    = COALESCE(?2, from_phone),
             to_phone      = COALESCE(?3, to_phone),
             message       = COALESCE(?4, message),
             status        = COALESCE(?5, status),
             last_activity = ?6",
          rusqlite::params![
            input.sid,
            input.from_phone,
            input.to_phone,
            input.message,
            input.status,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    self.required_sms(&sid).await
  }

  async fn get_sms(&self, sid: &str) -> Result<Option<SmsMessage>> {
    let sid = sid.to_owned();

    let raw: Option<RawSms> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {SMS_COLUMNS} FROM sms_messages WHERE sid = ?1"),
              rusqlite::params![sid],
              RawSms::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawSms::into_sms).transpose()
  }
}
