//! Voicemail lifecycle: capture, deferred or immediate notification, and the
//! race between the two.
//!
//! The provider calls the voicemail webhook once when the recording is done
//! and again when its transcription is ready. The first call schedules a
//! notification job under `transcript-<sid>`; a call carrying a transcription
//! status cancels that job and delivers at once. If cancellation loses the
//! race the job still finds the stored row and delivers, so a duplicate is
//! possible and tolerated.

use chrono::Utc;
use switchboard_core::{
  jobs::{Job, transcript_job_key},
  mailbox::MailboxNumber,
  notify::{EmailMessage, Notifier, OutboundSms},
  record::{Voicemail, VoicemailUpsert},
  store::CallCenterStore,
};
use switchboard_twiml::VoiceResponse;
use tracing::{debug, error, info, warn};

use crate::{
  AppState, Provider,
  error::{Error, Result},
  flow::ResolvedMenu,
  markup::escape_html,
  routes::Urls,
};

pub const THANKS_TEXT: &str = "Thanks for the voicemail. Goodbye.";

/// Fields of a recording or transcription callback.
#[derive(Debug, Clone, Default)]
pub struct RecordingEvent {
  pub recording_sid:        String,
  pub call_sid:             Option<String>,
  pub from:                 Option<String>,
  pub to:                   Option<String>,
  pub recording_url:        Option<String>,
  pub call_status:          Option<String>,
  pub transcription_text:   Option<String>,
  pub transcription_status: Option<String>,
}

/// Handles one voicemail webhook and answers with the closing verbs.
pub async fn capture<S, P>(
  state: &AppState<S, P>,
  resolved: &ResolvedMenu,
  digit: Option<u8>,
  event: RecordingEvent,
) -> Result<VoiceResponse>
where
  S: CallCenterStore + 'static,
  P: Provider,
{
  let item = digit.and_then(|d| resolved.item_for_digit(d));
  let transcription_status = event.transcription_status.filter(|s| !s.is_empty());
  let transcribed = transcription_status.is_some();

  let voicemail = state
    .store
    .upsert_voicemail(VoicemailUpsert {
      sid: event.recording_sid.clone(),
      call_sid: event.call_sid,
      menu_item: item.map(|i| i.item_id),
      mailbox: item.and_then(|i| i.action.as_ref()).and_then(|a| a.mailbox_id()),
      from_phone: event.from,
      to_phone: event.to,
      url: event.recording_url,
      status: event.call_status,
      transcription: event.transcription_text,
      transcription_status,
      last_activity: Some(Utc::now()),
    })
    .await
    .map_err(Error::store)?;
  info!(sid = %voicemail.sid, menu = %resolved.menu.name, transcribed, "voicemail captured");

  let sender = voicemail_sender(state)?;

  let key = transcript_job_key(&voicemail.sid);
  if transcribed {
    if state.jobs.cancel(&key) {
      debug!(key = %key, "cancelled pending notification");
    }
    deliver_notifications(
      state.store.as_ref(),
      state.provider.as_ref(),
      &state.urls,
      sender,
      &voicemail,
    )
    .await?;
  } else {
    let job = Job::VoicemailNotification { sid: voicemail.sid.clone() };
    state.jobs.schedule_once(&key, state.config.transcription_wait(), job);
    debug!(key = %key, "scheduled deferred notification");
  }

  let mut response = VoiceResponse::new();
  response.say(THANKS_TEXT, Some(resolved.menu.voice())).hangup();
  Ok(response)
}

/// Body of the deferred `transcript-<sid>` job.
pub async fn notification_job<S, P>(state: &AppState<S, P>, sid: &str) -> Result<()>
where
  S: CallCenterStore + 'static,
  P: Provider,
{
  let Some(voicemail) = state.store.get_voicemail(sid).await.map_err(Error::store)? else {
    warn!(sid, "voicemail vanished before notification");
    return Ok(());
  };
  let sender = voicemail_sender(state)?;
  deliver_notifications(
    state.store.as_ref(),
    state.provider.as_ref(),
    &state.urls,
    sender,
    &voicemail,
  )
  .await
}

fn voicemail_sender<S, P>(state: &AppState<S, P>) -> Result<&str> {
  match state.config.voicemail_email.as_deref().map(str::trim) {
    Some(sender) if !sender.is_empty() => Ok(sender),
    _ => {
      error!("voicemail_email is not set; voicemail notifications cannot be sent");
      Err(Error::MissingConfig("voicemail_email"))
    }
  }
}

/// Emails and texts everyone subscribed to the voicemail's mailbox.
///
/// Provider failures are logged and swallowed; only store errors propagate.
pub async fn deliver_notifications<S, N>(
  store: &S,
  notifier: &N,
  urls: &Urls,
  sender: &str,
  voicemail: &Voicemail,
) -> Result<()>
where
  S: CallCenterStore,
  N: Notifier,
{
  let Some(mailbox_id) = voicemail.mailbox else {
    debug!(sid = %voicemail.sid, "voicemail has no mailbox; nothing to notify");
    return Ok(());
  };
  let Some(mailbox) = store.get_mailbox(mailbox_id).await.map_err(Error::store)? else {
    warn!(sid = %voicemail.sid, %mailbox_id, "voicemail mailbox no longer exists");
    return Ok(());
  };
  if mailbox.email_list.is_empty() && mailbox.phone_list.is_empty() {
    return Ok(());
  }

  let item = match voicemail.menu_item {
    Some(id) => store.get_menu_item(id).await.map_err(Error::store)?,
    None => None,
  };
  let item_label = item.as_ref().map_or_else(|| "None".to_owned(), |i| i.label());

  let html = notification_body(&item_label, &mailbox, voicemail, Markup::Html);
  let text = notification_body(&item_label, &mailbox, voicemail, Markup::Text);

  if !mailbox.email_list.is_empty() {
    let email = EmailMessage {
      from:    sender.to_owned(),
      to:      mailbox.email_list.clone(),
      subject: format!("Received {item_label} voicemail from {}", voicemail.from_phone),
      text:    text.clone(),
      html:    Some(html),
    };
    match notifier.send_email(email).await {
      Ok(()) => info!(sid = %voicemail.sid, to = mailbox.email_list.len(), "voicemail email sent"),
      Err(e) => error!(sid = %voicemail.sid, error = %e, "voicemail email failed"),
    }
  }

  if !mailbox.phone_list.is_empty() {
    let from = match mailbox.notification_phone {
      Some(id) => store.get_twilio_number(id).await.map_err(Error::store)?,
      None => None,
    };
    let Some(from) = from else {
      error!(sid = %voicemail.sid, mailbox = %mailbox, "mailbox has a phone list but no notification phone");
      return Ok(());
    };

    let status_callback = item
      .as_ref()
      .and_then(|i| i.menu.as_ref().map(|m| urls.voicemail_sms_cb(&m.name, i.digit)));

    for to in &mailbox.phone_list {
      let sms = OutboundSms {
        from:            from.phone.clone(),
        to:              to.clone(),
        body:            text.clone(),
        media_urls:      vec![],
        status_callback: status_callback.clone(),
      };
      match notifier.send_sms(sms).await {
        Ok(sent) => info!(sid = %voicemail.sid, to = %to, sms = %sent.sid, "voicemail sms sent"),
        Err(e) => error!(sid = %voicemail.sid, to = %to, error = %e, "voicemail sms failed"),
      }
    }
  }

  Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Markup {
  Html,
  Text,
}

impl Markup {
  fn line_break(self) -> &'static str {
    match self {
      Markup::Html => "<br>\n",
      Markup::Text => "\n",
    }
  }

  fn value(self, raw: &str) -> String {
    match self {
      Markup::Html => escape_html(raw),
      Markup::Text => raw.to_owned(),
    }
  }
}

/// The notification in either form. Caller-supplied values are escaped in
/// the HTML body only.
fn notification_body(
  item_label: &str,
  mailbox: &MailboxNumber,
  voicemail: &Voicemail,
  markup: Markup,
) -> String {
  let br = markup.line_break();
  let mut body = format!(
    "Hello,{br}{br}Call center option [{}] mailbox [{}] received voicemail from {}.{br}{br}\
     Recording is at {}",
    markup.value(item_label),
    markup.value(&mailbox.to_string()),
    markup.value(&voicemail.from_phone),
    markup.value(&voicemail.url),
  );
  if let Some(status) = &voicemail.transcription_status {
    body.push_str(&format!("{br}{br}Transcription {}", markup.value(status)));
    if voicemail.is_transcribed() {
      body.push_str(&format!(":{br}{}", markup.value(&voicemail.transcription)));
    }
  }
  body
}

#[cfg(test)]
mod tests {
  use uuid::Uuid;

  use super::*;

  fn mailbox() -> MailboxNumber {
    MailboxNumber {
      mailbox_id:            Uuid::new_v4(),
      name:                  "front-desk".into(),
      phone:                 None,
      notification_phone:    None,
      phone_list:            vec![],
      email_list:            vec!["desk@example.com".into()],
      availability:          None,
      always_send_voicemail: false,
    }
  }

  fn voicemail(status: Option<&str>, transcription: &str) -> Voicemail {
    Voicemail {
      sid:                   "RE1".into(),
      call_sid:              "CA1".into(),
      menu_item:             None,
      mailbox:               None,
      from_phone:            "+17205550000".into(),
      to_phone:              "+17202010000".into(),
      url:                   "https://api.example.com/RE1".into(),
      status:                "completed".into(),
      transcription:         transcription.into(),
      transcription_status:  status.map(str::to_owned),
      last_activity:         Utc::now(),
      removed_from_provider: false,
    }
  }

  #[test]
  fn untranscribed_body_omits_transcription() {
    let html = notification_body("support-3", &mailbox(), &voicemail(None, ""), Markup::Html);
    assert_eq!(
      html,
      "Hello,<br>\n<br>\nCall center option [support-3] mailbox [front-desk] received voicemail \
       from +17205550000.<br>\n<br>\nRecording is at https://api.example.com/RE1"
    );
  }

  #[test]
  fn completed_transcription_includes_text() {
    let vm = voicemail(Some("completed"), "call me");
    let html = notification_body("support-3", &mailbox(), &vm, Markup::Html);
    assert!(html.ends_with("Transcription completed:<br>\ncall me"), "{html}");
  }

  #[test]
  fn failed_transcription_reports_status_only() {
    let vm = voicemail(Some("failed"), "garbled");
    let html = notification_body("support-3", &mailbox(), &vm, Markup::Html);
    assert!(html.ends_with("<br>\n<br>\nTranscription failed"), "{html}");
    assert!(!html.contains("garbled"));
  }

  #[test]
  fn caller_text_is_escaped_in_html_but_kept_in_text() {
    let mut vm = voicemail(Some("completed"), "x < y & <b>bold</b>");
    vm.from_phone = "<script>".into();

    let html = notification_body("support-3", &mailbox(), &vm, Markup::Html);
    assert!(html.contains("from &lt;script&gt;."), "{html}");
    assert!(html.ends_with(":<br>\nx &lt; y &amp; &lt;b&gt;bold&lt;/b&gt;"), "{html}");
    assert!(!html.contains("<script>"), "{html}");

    let text = notification_body("support-3", &mailbox(), &vm, Markup::Text);
    assert!(text.starts_with("Hello,\n\nCall center option [support-3]"), "{text}");
    assert!(text.ends_with("Transcription completed:\nx < y & <b>bold</b>"), "{text}");
  }
}
