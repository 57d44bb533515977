//! HTTP client for the telephony provider's REST API and the transactional
//! email API.
//!
//! Cheap to clone: the inner [`reqwest::Client`] is `Arc`-based.

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use switchboard_core::notify::{
  EmailMessage, Notifier, OutboundSms, ProviderError, Recordings, SentSms,
};

use crate::ServerConfig;

/// REST error code for a resource that does not exist.
const NOT_FOUND_CODE: i64 = 20404;

#[derive(Clone)]
pub struct TwilioProvider {
  client:        Client,
  api_base:      String,
  account_sid:   String,
  auth_token:    String,
  email_base:    String,
  email_api_key: Option<String>,
}

impl TwilioProvider {
  pub fn new(config: &ServerConfig) -> Result<Self, ProviderError> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .map_err(|e| ProviderError::Transport(e.to_string()))?;
    Ok(Self {
      client,
      api_base: config.twilio_api_base.trim_end_matches('/').to_owned(),
      account_sid: config.twilio_account_sid.clone(),
      auth_token: config.twilio_auth_token.clone(),
      email_base: config.email_api_base.trim_end_matches('/').to_owned(),
      email_api_key: config.email_api_key.clone().filter(|k| !k.is_empty()),
    })
  }

  fn account_url(&self, path: &str) -> String {
    format!("{}/2010-04-01/Accounts/{}{path}", self.api_base, self.account_sid)
  }

  fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    req.basic_auth(&self.account_sid, Some(&self.auth_token))
  }
}

fn transport(e: reqwest::Error) -> ProviderError { ProviderError::Transport(e.to_string()) }

/// Shape of the provider's JSON error body.
#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
  code:    Option<i64>,
  message: Option<String>,
}

/// Maps a non-success response to a [`ProviderError`].
async fn api_error(resp: Response) -> ProviderError {
  let status = resp.status();
  let body = resp.text().await.unwrap_or_default();
  let parsed: ApiErrorBody = serde_json::from_str(&body).unwrap_or_default();

  if status == StatusCode::NOT_FOUND || parsed.code == Some(NOT_FOUND_CODE) {
    return ProviderError::NotFound;
  }
  ProviderError::Api {
    status:  status.as_u16(),
    code:    parsed.code,
    message: parsed.message.unwrap_or(body),
  }
}

#[derive(Debug, Deserialize)]
struct MessageResource {
  sid:    String,
  from:   Option<String>,
  to:     Option<String>,
  body:   Option<String>,
  status: Option<String>,
}

impl Notifier for TwilioProvider {
  async fn send_email(&self, message: EmailMessage) -> Result<(), ProviderError> {
    let key = self
      .email_api_key
      .as_deref()
      .ok_or(ProviderError::NotConfigured("email_api_key"))?;

    let mut content = vec![json!({ "type": "text/plain", "value": message.text })];
    if let Some(html) = &message.html {
      content.push(json!({ "type": "text/html", "value": html }));
    }
    let to: Vec<_> = message.to.iter().map(|addr| json!({ "email": addr })).collect();
    let payload = json!({
      "personalizations": [{ "to": to }],
      "from": { "email": message.from },
      "subject": message.subject,
      "content": content,
    });

    let resp = self
      .client
      .post(format!("{}/v3/mail/send", self.email_base))
      .bearer_auth(key)
      .json(&payload)
      .send()
      .await
      .map_err(transport)?;

    if !resp.status().is_success() {
      return Err(api_error(resp).await);
    }
    Ok(())
  }

  async fn send_sms(&self, sms: OutboundSms) -> Result<SentSms, ProviderError> {
    let mut form = vec![
      ("To", sms.to.clone()),
      ("From", sms.from.clone()),
      ("Body", sms.body.clone()),
    ];
    form.extend(sms.media_urls.iter().map(|u| ("MediaUrl", u.clone())));
    if let Some(callback) = &sms.status_callback {
      form.push(("StatusCallback", callback.clone()));
    }

    let resp = self
      .authed(self.client.post(self.account_url("/Messages.json")))
      .form(&form)
      .send()
      .await
      .map_err(transport)?;

    if !resp.status().is_success() {
      return Err(api_error(resp).await);
    }
    let message: MessageResource = resp.json().await.map_err(transport)?;
    Ok(SentSms {
      sid:    message.sid,
      from:   message.from.unwrap_or(sms.from),
      to:     message.to.unwrap_or(sms.to),
      body:   message.body.unwrap_or(sms.body),
      status: message.status.unwrap_or_default(),
    })
  }
}

impl Recordings for TwilioProvider {
  async fn delete_recording(&self, sid: &str) -> Result<(), ProviderError> {
    let resp = self
      .authed(self.client.delete(self.account_url(&format!("/Recordings/{sid}.json"))))
      .send()
      .await
      .map_err(transport)?;

    if !resp.status().is_success() {
      return Err(api_error(resp).await);
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_string_contains, header_exists, method, path},
  };

  use super::*;
  use crate::tests::test_config;

  async fn provider(server: &MockServer, email_key: Option<&str>) -> TwilioProvider {
    let mut config = test_config();
    config.twilio_api_base = server.uri();
    config.email_api_base = server.uri();
    config.email_api_key = email_key.map(str::to_owned);
    TwilioProvider::new(&config).unwrap()
  }

  fn sms() -> OutboundSms {
    OutboundSms {
      from:            "+17202010000".into(),
      to:              "+17205550100".into(),
      body:            "hello".into(),
      media_urls:      vec!["https://media.example.com/0".into()],
      status_callback: Some("https://ivr.example.com/send-sms-cb".into()),
    }
  }

  #[tokio::test]
  async fn send_sms_posts_form_and_reads_sid() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/2010-04-01/Accounts/AC123/Messages.json"))
      .and(header_exists("authorization"))
      .and(body_string_contains("MediaUrl=https"))
      .and(body_string_contains("StatusCallback="))
      .respond_with(ResponseTemplate::new(201).set_body_json(json!({
        "sid": "SM42",
        "from": "+17202010000",
        "to": "+17205550100",
        "body": "hello",
        "status": "queued",
      })))
      .expect(1)
      .mount(&server)
      .await;

    let sent = provider(&server, None).await.send_sms(sms()).await.unwrap();
    assert_eq!(sent.sid, "SM42");
    assert_eq!(sent.status, "queued");
  }

  #[tokio::test]
  async fn api_errors_carry_code_and_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/2010-04-01/Accounts/AC123/Messages.json"))
      .respond_with(ResponseTemplate::new(400).set_body_json(json!({
        "code": 21211,
        "message": "Invalid 'To' Phone Number",
        "status": 400,
      })))
      .mount(&server)
      .await;

    let err = provider(&server, None).await.send_sms(sms()).await.unwrap_err();
    match err {
      ProviderError::Api { status, code, message } => {
        assert_eq!(status, 400);
        assert_eq!(code, Some(21211));
        assert!(message.contains("Invalid"));
      }
      other => panic!("expected api error, got {other:?}"),
    }
  }

  #[tokio::test]
  async fn deleting_a_missing_recording_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
      .and(path("/2010-04-01/Accounts/AC123/Recordings/RE1.json"))
      .respond_with(ResponseTemplate::new(404).set_body_json(json!({
        "code": 20404,
        "message": "The requested resource was not found",
      })))
      .mount(&server)
      .await;
    Mock::given(method("DELETE"))
      .and(path("/2010-04-01/Accounts/AC123/Recordings/RE2.json"))
      .respond_with(ResponseTemplate::new(204))
      .mount(&server)
      .await;

    let p = provider(&server, None).await;
    assert!(matches!(p.delete_recording("RE1").await, Err(ProviderError::NotFound)));
    assert!(p.delete_recording("RE2").await.is_ok());
  }

  #[tokio::test]
  async fn email_requires_an_api_key() {
    let server = MockServer::start().await;
    let message = EmailMessage {
      from:    "ivr@example.com".into(),
      to:      vec!["desk@example.com".into()],
      subject: "s".into(),
      text:    "t".into(),
      html:    None,
    };

    let err = provider(&server, None).await.send_email(message.clone()).await.unwrap_err();
    assert!(matches!(err, ProviderError::NotConfigured("email_api_key")));

    Mock::given(method("POST"))
      .and(path("/v3/mail/send"))
      .and(header_exists("authorization"))
      .and(body_string_contains("desk@example.com"))
      .respond_with(ResponseTemplate::new(202))
      .expect(1)
      .mount(&server)
      .await;
    provider(&server, Some("SG.key")).await.send_email(message).await.unwrap();
  }
}
