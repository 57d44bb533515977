//! Outbound delivery seams: email/SMS notification and recording removal.

use std::future::Future;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
  pub from:    String,
  pub to:      Vec<String>,
  pub subject: String,
  pub text:    String,
  pub html:    Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundSms {
  pub from:            String,
  pub to:              String,
  pub body:            String,
  pub media_urls:      Vec<String>,
  /// Absolute URL the provider reports delivery status to.
  pub status_callback: Option<String>,
}

/// What the provider accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentSms {
  pub sid:    String,
  pub from:   String,
  pub to:     String,
  pub body:   String,
  pub status: String,
}

#[derive(Debug, Error)]
pub enum ProviderError {
  /// The remote resource does not exist (or no longer does).
  #[error("not found")]
  NotFound,

  #[error("provider rejected request ({status}): {message}")]
  Api {
    status:  u16,
    code:    Option<i64>,
    message: String,
  },

  #[error("transport error: {0}")]
  Transport(String),

  #[error("{0} is not configured")]
  NotConfigured(&'static str),
}

/// Sends voicemail and SMS-forward notifications.
pub trait Notifier: Send + Sync {
  fn send_email(
    &self,
    message: EmailMessage,
  ) -> impl Future<Output = Result<(), ProviderError>> + Send + '_;

  fn send_sms(
    &self,
    sms: OutboundSms,
  ) -> impl Future<Output = Result<SentSms, ProviderError>> + Send + '_;
}

/// Access to recordings held by the provider.
pub trait Recordings: Send + Sync {
  /// Delete a recording. [`ProviderError::NotFound`] means it is already gone.
  fn delete_recording<'a>(
    &'a self,
    sid: &'a str,
  ) -> impl Future<Output = Result<(), ProviderError>> + Send + 'a;
}
