//! Recording and transcription callbacks, plus the status callback for the
//! SMS notifications they trigger.

use axum::{
  Form,
  extract::{Path, State},
  http::StatusCode,
};
use serde::Deserialize;
use switchboard_core::store::CallCenterStore;

use crate::{
  AppState, Provider,
  error::Result,
  flow::{self, parse_digit},
  handlers::{Twiml, sms::StatusForm},
  sms::log_status,
  voicemail::{self, RecordingEvent},
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RecordingForm {
  pub recording_sid:        String,
  pub call_sid:             Option<String>,
  pub from:                 Option<String>,
  pub to:                   Option<String>,
  pub recording_url:        Option<String>,
  pub call_status:          Option<String>,
  pub transcription_text:   Option<String>,
  pub transcription_status: Option<String>,
}

impl From<RecordingForm> for RecordingEvent {
  fn from(form: RecordingForm) -> Self {
    RecordingEvent {
      recording_sid:        form.recording_sid,
      call_sid:             form.call_sid,
      from:                 form.from,
      to:                   form.to,
      recording_url:        form.recording_url,
      call_status:          form.call_status,
      transcription_text:   form.transcription_text,
      transcription_status: form.transcription_status,
    }
  }
}

/// `/{menu}/voicemail/{digit}`
pub async fn recording<S, P>(
  State(state): State<AppState<S, P>>,
  Path((menu, digit)): Path<(String, String)>,
  Form(form): Form<RecordingForm>,
) -> Result<Twiml>
where
  S: CallCenterStore + 'static,
  P: Provider,
{
  let resolved = flow::resolve_menu(state.store.as_ref(), &menu).await?;
  let response = voicemail::capture(&state, &resolved, parse_digit(&digit), form.into()).await?;
  Twiml::voice(&response)
}

/// `/{menu}/voicemail-sms-cb/{digit}`
pub async fn sms_callback<S, P>(
  State(_state): State<AppState<S, P>>,
  Path((menu, digit)): Path<(String, String)>,
  Form(form): Form<StatusForm>,
) -> StatusCode
where
  S: CallCenterStore + 'static,
  P: Provider,
{
  log_status(&format!("voicemail {menu}-{digit}"), &form.into());
  StatusCode::NO_CONTENT
}
