//! SMS router: inbound forwarding, operator-initiated sends, and delivery
//! status tracking.

use std::collections::HashMap;

use chrono::Utc;
use switchboard_core::{
  notify::{EmailMessage, Notifier, OutboundSms, SentSms},
  number::TwilioNumber,
  record::{DeliveryStatus, SmsMessage, SmsUpsert},
  store::CallCenterStore,
};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
  AppState, Provider,
  error::{Error, Result},
  markup::escape_html,
};

pub const MAX_MESSAGE_CHARS: usize = 1600;

/// The provider attaches at most this many media items to one message.
pub const MAX_MEDIA: usize = 10;

// ─── Inbound ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Media {
  pub url:          String,
  pub content_type: String,
}

impl Media {
  pub fn is_image(&self) -> bool { self.content_type.starts_with("image/") }
}

#[derive(Debug, Clone)]
pub struct InboundSms {
  pub sid:    String,
  pub from:   String,
  pub to:     String,
  pub body:   String,
  pub status: Option<String>,
  pub media:  Vec<Media>,
}

impl InboundSms {
  /// Reads the provider's form fields, including the numbered
  /// `MediaUrl{i}`/`MediaContentType{i}` pairs.
  pub fn from_params(params: &HashMap<String, String>) -> Result<Self> {
    let field = |name: &str| params.get(name).cloned();
    let required = |name: &'static str| {
      field(name).ok_or_else(|| Error::BadRequest(format!("missing {name}")))
    };

    let num_media = match params.get("NumMedia").map(|n| n.trim()) {
      None | Some("") => 0,
      Some(n) => n
        .parse::<usize>()
        .map_err(|_| Error::BadRequest(format!("invalid NumMedia {n:?}")))?,
    };
    if num_media > MAX_MEDIA {
      return Err(Error::BadRequest(format!(
        "NumMedia {num_media} exceeds the limit of {MAX_MEDIA}"
      )));
    }
    let media = (0..num_media)
      .filter_map(|i| {
        let url = field(&format!("MediaUrl{i}"))?;
        let content_type = field(&format!("MediaContentType{i}")).unwrap_or_default();
        Some(Media { url, content_type })
      })
      .collect();

    Ok(Self {
      sid: required("MessageSid")?,
      from: required("From")?,
      to: required("To")?,
      body: field("Body").unwrap_or_default(),
      status: field("SmsStatus").filter(|s| !s.is_empty()),
      media,
    })
  }
}

/// Logs and forwards one inbound message. Unmatched numbers are a no-op.
pub async fn route_incoming<S, P>(state: &AppState<S, P>, sms: InboundSms) -> Result<()>
where
  S: CallCenterStore + 'static,
  P: Provider,
{
  let numbers = state.store.list_twilio_numbers().await.map_err(Error::store)?;
  let Some(number) = numbers
    .into_iter()
    .find(|n| state.region.numbers_equal(&n.phone, &sms.to))
  else {
    warn!(to = %sms.to, from = %sms.from, "inbound sms for unknown number");
    return Ok(());
  };

  state
    .store
    .upsert_sms(SmsUpsert {
      sid:           sms.sid.clone(),
      from_phone:    Some(sms.from.clone()),
      to_phone:      Some(sms.to.clone()),
      message:       Some(sms.body.clone()),
      status:        Some(sms.status.clone().unwrap_or_else(|| DeliveryStatus::Received.to_string())),
      last_activity: Some(Utc::now()),
    })
    .await
    .map_err(Error::store)?;
  info!(sid = %sms.sid, number = %number.name, "inbound sms");

  if !number.forward_email_list.is_empty() {
    forward_by_email(state, &number, &sms).await;
  }
  for to in &number.forward_phone_list {
    forward_by_sms(state, &number, &sms, to).await?;
  }
  Ok(())
}

async fn forward_by_email<S, P>(state: &AppState<S, P>, number: &TwilioNumber, sms: &InboundSms)
where
  S: CallCenterStore + 'static,
  P: Provider,
{
  let Some(sender) = state.config.sms_sender() else {
    error!(sid = %sms.sid, "no sender address configured for sms forwarding email");
    return;
  };

  let email = EmailMessage {
    from:    sender.to_owned(),
    to:      number.forward_email_list.clone(),
    subject: format!("Received SMS from {} to {}", sms.from, number.name),
    text:    forward_text(number, sms),
    html:    Some(forward_html(number, sms)),
  };
  match state.provider.send_email(email).await {
    Ok(()) => debug!(sid = %sms.sid, "sms forwarded by email"),
    Err(e) => error!(sid = %sms.sid, error = %e, "sms forward email failed"),
  }
}

async fn forward_by_sms<S, P>(
  state: &AppState<S, P>,
  number: &TwilioNumber,
  sms: &InboundSms,
  to: &str,
) -> Result<()>
where
  S: CallCenterStore + 'static,
  P: Provider,
{
  let outbound = OutboundSms {
    from:            number.phone.clone(),
    to:              to.to_owned(),
    body:            sms.body.clone(),
    media_urls:      sms.media.iter().map(|m| m.url.clone()).collect(),
    status_callback: Some(state.urls.sms_forward_cb()),
  };
  match state.provider.send_sms(outbound).await {
    Ok(sent) => {
      record_sent(state.store.as_ref(), &sent).await?;
      debug!(sid = %sms.sid, forward = %sent.sid, to, "sms forwarded");
    }
    Err(e) => error!(sid = %sms.sid, to, error = %e, "sms forward failed"),
  }
  Ok(())
}

fn forward_text(number: &TwilioNumber, sms: &InboundSms) -> String {
  let mut text = format!("SMS from {} to {number}:\n\n{}", sms.from, sms.body);
  for media in &sms.media {
    text.push_str(&format!("\n\n{}", media.url));
  }
  text
}

fn forward_html(number: &TwilioNumber, sms: &InboundSms) -> String {
  let mut html = format!(
    "SMS from {} to {}:<br>\n<br>\n{}",
    escape_html(&sms.from),
    escape_html(&number.to_string()),
    escape_html(&sms.body).replace('\n', "<br>\n"),
  );
  for media in &sms.media {
    let url = escape_html(&media.url);
    if media.is_image() {
      html.push_str(&format!(
        "<br>\n<br>\n<a href=\"{url}\"><img src=\"{url}\" alt=\"attachment\" width=\"200\"></a>"
      ));
    } else {
      html.push_str(&format!("<br>\n<br>\n<a href=\"{url}\">{url}</a>"));
    }
  }
  html
}

// ─── Outbound ────────────────────────────────────────────────────────────────

/// An operator request to text someone from one of the configured numbers.
#[derive(Debug, Clone)]
pub struct SendRequest {
  pub from_number: String,
  pub to_phone:    String,
  pub message:     String,
}

/// Validates and sends; the stored row tracks later status callbacks.
pub async fn send<S, P>(state: &AppState<S, P>, request: SendRequest) -> Result<SmsMessage>
where
  S: CallCenterStore + 'static,
  P: Provider,
{
  let length = request.message.chars().count();
  if length == 0 || length > MAX_MESSAGE_CHARS {
    return Err(Error::BadRequest(format!(
      "message must be 1 to {MAX_MESSAGE_CHARS} characters, got {length}"
    )));
  }

  let to = state
    .region
    .to_e164(&request.to_phone)
    .map_err(|e| Error::BadRequest(e.to_string()))?;

  let number_id = Uuid::parse_str(request.from_number.trim())
    .map_err(|_| Error::BadRequest(format!("invalid from_phone {:?}", request.from_number)))?;
  let number = state
    .store
    .get_twilio_number(number_id)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| Error::BadRequest(format!("unknown from_phone {number_id}")))?;

  let sent = state
    .provider
    .send_sms(OutboundSms {
      from:            number.phone,
      to,
      body:            request.message,
      media_urls:      vec![],
      status_callback: Some(state.urls.send_sms_cb()),
    })
    .await?;
  info!(sid = %sent.sid, to = %sent.to, status = %sent.status, "sms sent");

  record_sent(state.store.as_ref(), &sent).await
}

async fn record_sent<S>(store: &S, sent: &SentSms) -> Result<SmsMessage>
where
  S: CallCenterStore,
{
  store
    .upsert_sms(SmsUpsert {
      sid:           sent.sid.clone(),
      from_phone:    Some(sent.from.clone()),
      to_phone:      Some(sent.to.clone()),
      message:       Some(sent.body.clone()),
      status:        Some(sent.status.clone()),
      last_activity: Some(Utc::now()),
    })
    .await
    .map_err(Error::store)
}

// ─── Status callbacks ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct StatusUpdate {
  pub sid:        Option<String>,
  pub status:     Option<String>,
  pub from:       Option<String>,
  pub to:         Option<String>,
  pub error_code: Option<String>,
}

/// Logs a delivery status report; `failed`, `undelivered` or no status at
/// all is an error.
pub fn log_status(source: &str, update: &StatusUpdate) {
  let sid = update.sid.as_deref().unwrap_or("-");
  let to = update.to.as_deref().unwrap_or("-");
  match update.status.as_deref().filter(|s| !s.is_empty()) {
    None => error!(source, sid, to, "sms status callback without status"),
    Some(raw) => match raw.parse::<DeliveryStatus>() {
      Ok(status) if status.is_failure() => error!(
        source,
        sid,
        to,
        status = raw,
        error_code = update.error_code.as_deref().unwrap_or("-"),
        "sms delivery failed"
      ),
      Ok(_) => debug!(source, sid, to, status = raw, "sms status"),
      Err(_) => warn!(source, sid, to, status = raw, "unrecognised sms status"),
    },
  }
}

/// Merges a status callback into the message log.
pub async fn track_status<S>(store: &S, source: &str, update: StatusUpdate) -> Result<()>
where
  S: CallCenterStore,
{
  log_status(source, &update);
  let Some(sid) = update.sid.filter(|s| !s.is_empty()) else {
    return Ok(());
  };
  store
    .upsert_sms(SmsUpsert {
      sid,
      from_phone: update.from,
      to_phone: update.to,
      message: None,
      status: update.status.filter(|s| !s.is_empty()),
      last_activity: Some(Utc::now()),
    })
    .await
    .map_err(Error::store)?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
  }

  #[test]
  fn inbound_reads_numbered_media() {
    let sms = InboundSms::from_params(&params(&[
      ("MessageSid", "SM1"),
      ("From", "+17205550000"),
      ("To", "+17202010000"),
      ("Body", "look"),
      ("NumMedia", "2"),
      ("MediaUrl0", "https://media.example.com/0"),
      ("MediaContentType0", "image/jpeg"),
      ("MediaUrl1", "https://media.example.com/1"),
      ("MediaContentType1", "application/pdf"),
    ]))
    .unwrap();

    assert_eq!(sms.media.len(), 2);
    assert!(sms.media[0].is_image());
    assert!(!sms.media[1].is_image());
    assert!(sms.status.is_none());
  }

  #[test]
  fn inbound_rejects_media_counts_over_the_limit() {
    let base = [("MessageSid", "SM1"), ("From", "+17205550000"), ("To", "+17202010000")];
    for count in ["11", "18446744073709551615"] {
      let mut pairs = base.to_vec();
      pairs.push(("NumMedia", count));
      let err = InboundSms::from_params(&params(&pairs)).unwrap_err();
      assert!(matches!(err, Error::BadRequest(_)), "{count}: {err:?}");
    }

    let mut pairs = base.to_vec();
    pairs.push(("NumMedia", "10"));
    assert!(InboundSms::from_params(&params(&pairs)).unwrap().media.is_empty());
  }

  #[test]
  fn inbound_requires_sid_and_numbers() {
    let err = InboundSms::from_params(&params(&[("From", "+17205550000")])).unwrap_err();
    assert!(matches!(err, Error::BadRequest(_)));
  }

  #[test]
  fn forward_html_embeds_image_thumbnails() {
    let number = TwilioNumber {
      number_id:          Uuid::new_v4(),
      name:               "main".into(),
      phone:              "+17202010000".into(),
      forward_phone_list: vec![],
      forward_email_list: vec!["ops@example.com".into()],
    };
    let sms = InboundSms {
      sid:    "SM1".into(),
      from:   "+17205550000".into(),
      to:     "+17202010000".into(),
      body:   "a < b".into(),
      status: None,
      media:  vec![Media {
        url:          "https://media.example.com/0".into(),
        content_type: "image/png".into(),
      }],
    };

    let html = forward_html(&number, &sms);
    assert!(html.contains("a &lt; b"), "{html}");
    assert!(html.contains("<img src=\"https://media.example.com/0\""), "{html}");
    let text = forward_text(&number, &sms);
    assert!(text.starts_with("SMS from +17205550000 to main +17202010000:"), "{text}");
    assert!(text.ends_with("https://media.example.com/0"));
  }
}
