//! axum handlers, one module per webhook family.

pub mod call;
pub mod sms;
pub mod voicemail;

use axum::{
  http::header,
  response::{IntoResponse, Response},
};
use switchboard_twiml::{MessagingResponse, VoiceResponse};

use crate::error::Result;

/// A serialized response document.
#[derive(Debug)]
pub struct Twiml(pub String);

impl Twiml {
  pub fn voice(response: &VoiceResponse) -> Result<Self> { Ok(Self(response.to_xml()?)) }

  pub fn messaging(response: &MessagingResponse) -> Result<Self> {
    Ok(Self(response.to_xml()?))
  }
}

impl IntoResponse for Twiml {
  fn into_response(self) -> Response {
    ([(header::CONTENT_TYPE, switchboard_twiml::CONTENT_TYPE)], self.0).into_response()
  }
}
