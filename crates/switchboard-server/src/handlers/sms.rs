//! SMS webhooks and the operator endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/sms-incoming` | Provider webhook; answers an empty messaging response |
//! | `GET`  | `/sms-status?sid=` | Operator; JSON message or 404 |
//! | `POST` | `/send-sms` | Operator form; 303 back to `redirect` |
//! | `POST` | `/send-sms-cb`, `/sms-forward-cb` | Status callbacks; 204 |

use std::collections::HashMap;

use axum::{
  Form, Json,
  extract::{Query, State},
  http::StatusCode,
  response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use serde_json::json;
use switchboard_core::store::CallCenterStore;
use switchboard_twiml::MessagingResponse;
use tracing::warn;

use crate::{
  AppState, Provider,
  auth::Operator,
  error::{Error, Result},
  handlers::Twiml,
  sms::{self, InboundSms, SendRequest, StatusUpdate},
};

/// Provider status callback fields.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StatusForm {
  pub message_sid:    Option<String>,
  pub message_status: Option<String>,
  pub from:           Option<String>,
  pub to:             Option<String>,
  pub error_code:     Option<String>,
}

impl From<StatusForm> for StatusUpdate {
  fn from(form: StatusForm) -> Self {
    StatusUpdate {
      sid:        form.message_sid,
      status:     form.message_status,
      from:       form.from,
      to:         form.to,
      error_code: form.error_code,
    }
  }
}

/// `POST /sms-incoming`
pub async fn incoming<S, P>(
  State(state): State<AppState<S, P>>,
  Form(params): Form<HashMap<String, String>>,
) -> Result<Twiml>
where
  S: CallCenterStore + 'static,
  P: Provider,
{
  let sms = InboundSms::from_params(&params)?;
  sms::route_incoming(&state, sms).await?;
  Twiml::messaging(&MessagingResponse::new())
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
  pub sid: String,
}

/// `GET /sms-status?sid=<sid>`
pub async fn status<S, P>(
  _operator: Operator,
  State(state): State<AppState<S, P>>,
  Query(query): Query<StatusQuery>,
) -> Result<Response>
where
  S: CallCenterStore + 'static,
  P: Provider,
{
  let message = state
    .store
    .get_sms(&query.sid)
    .await
    .map_err(Error::store)?;
  Ok(match message {
    Some(message) => Json(message).into_response(),
    None => (
      StatusCode::NOT_FOUND,
      Json(json!({ "error": format!("sms {} not found", query.sid) })),
    )
      .into_response(),
  })
}

#[derive(Debug, Deserialize)]
pub struct SendSmsForm {
  /// Id of the configured number to send from.
  pub from_phone: String,
  pub to_phone:   String,
  pub message:    String,
  pub redirect:   Option<String>,
}

/// `POST /send-sms`
///
/// Validation and provider failures come back as `sms_status=failed` on the
/// redirect; only store failures are a 500.
pub async fn send<S, P>(
  _operator: Operator,
  State(state): State<AppState<S, P>>,
  Form(form): Form<SendSmsForm>,
) -> Result<Redirect>
where
  S: CallCenterStore + 'static,
  P: Provider,
{
  let redirect = form
    .redirect
    .filter(|r| !r.trim().is_empty())
    .unwrap_or_else(|| "/".to_owned());
  let request = SendRequest {
    from_number: form.from_phone,
    to_phone:    form.to_phone,
    message:     form.message,
  };

  let (status, detail) = match sms::send(&state, request).await {
    Ok(message) => ("sent", message.sid),
    Err(e @ (Error::BadRequest(_) | Error::Provider(_))) => {
      warn!(error = %e, "send-sms failed");
      ("failed", e.to_string())
    }
    Err(e) => return Err(e),
  };

  let query = url::form_urlencoded::Serializer::new(String::new())
    .append_pair("sms_status", status)
    .append_pair("sms_detail", &detail)
    .finish();
  let separator = if redirect.contains('?') { '&' } else { '?' };
  Ok(Redirect::to(&format!("{redirect}{separator}{query}")))
}

/// `POST /send-sms-cb`
pub async fn send_callback<S, P>(
  State(state): State<AppState<S, P>>,
  Form(form): Form<StatusForm>,
) -> Result<StatusCode>
where
  S: CallCenterStore + 'static,
  P: Provider,
{
  sms::track_status(state.store.as_ref(), "send-sms", form.into()).await?;
  Ok(StatusCode::NO_CONTENT)
}

/// `POST /sms-forward-cb`
pub async fn forward_callback<S, P>(
  State(state): State<AppState<S, P>>,
  Form(form): Form<StatusForm>,
) -> Result<StatusCode>
where
  S: CallCenterStore + 'static,
  P: Provider,
{
  sms::track_status(state.store.as_ref(), "sms-forward", form.into()).await?;
  Ok(StatusCode::NO_CONTENT)
}
