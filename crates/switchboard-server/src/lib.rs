//! Webhook server for the switchboard call center.
//!
//! Exposes an axum [`Router`] serving the provider's voice and messaging
//! webhooks, backed by any [`CallCenterStore`] and any [`Provider`].

pub mod auth;
pub mod error;
pub mod flow;
pub mod functions;
pub mod handlers;
pub mod markup;
pub mod provider;
pub mod routes;
pub mod scheduler;
pub mod sms;
pub mod sweeper;
pub mod voicemail;
pub mod worker;

pub use error::Error;

use std::{path::PathBuf, sync::Arc, time::Duration};

use axum::{
  Router,
  routing::{get, post},
};
use serde::Deserialize;
use switchboard_core::{
  jobs::JobQueue,
  notify::{Notifier, Recordings},
  phone::Region,
  store::CallCenterStore,
};
use tower_http::trace::TraceLayer;

use auth::AuthConfig;
use error::Result;
use functions::FunctionRegistry;
use handlers::{call, sms as sms_handlers, voicemail as voicemail_handlers};
use routes::Urls;
use sweeper::ExpirySweeper;

/// Everything the server needs from the outside world: notification
/// delivery and recording removal.
pub trait Provider: Notifier + Recordings + 'static {}

impl<T> Provider for T where T: Notifier + Recordings + 'static {}

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `SWITCHBOARD_*` environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:                    String,
  pub port:                    u16,
  /// Public base URL; status callbacks are built on it.
  pub base_url:                String,
  /// Overrides `base_url` for callbacks, e.g. a tunnel during development.
  pub debug_callback_url:      Option<String>,
  #[serde(default)]
  pub path_prefix:             String,
  pub store_path:              PathBuf,
  pub auth_username:           String,
  pub auth_password_hash:      String,
  #[serde(default = "default_region")]
  pub default_region:          String,
  /// Sender of voicemail notification email.
  pub voicemail_email:         Option<String>,
  /// Sender of forwarded-SMS email; falls back to `voicemail_email`.
  pub sms_forward_email:       Option<String>,
  /// Unset disables the expiry sweeper.
  pub voicemail_lifespan_days: Option<i64>,
  #[serde(default = "default_transcription_wait_secs")]
  pub transcription_wait_secs: u64,
  pub twilio_account_sid:      String,
  pub twilio_auth_token:       String,
  #[serde(default = "default_twilio_api_base")]
  pub twilio_api_base:         String,
  pub email_api_key:           Option<String>,
  #[serde(default = "default_email_api_base")]
  pub email_api_base:          String,
}

fn default_region() -> String { "US".to_owned() }
fn default_transcription_wait_secs() -> u64 { 300 }
fn default_twilio_api_base() -> String { "https://api.twilio.com".to_owned() }
fn default_email_api_base() -> String { "https://api.sendgrid.com".to_owned() }

impl ServerConfig {
  /// How long a recording waits for its transcription before notifying
  /// without one.
  pub fn transcription_wait(&self) -> Duration { Duration::from_secs(self.transcription_wait_secs) }

  pub fn sms_sender(&self) -> Option<&str> {
    [&self.sms_forward_email, &self.voicemail_email]
      .into_iter()
      .flatten()
      .map(|s| s.trim())
      .find(|s| !s.is_empty())
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers and the job worker.
pub struct AppState<S, P> {
  pub store:     Arc<S>,
  pub provider:  Arc<P>,
  pub jobs:      Arc<dyn JobQueue>,
  pub functions: Arc<FunctionRegistry>,
  /// `None` when `voicemail_lifespan_days` is unset.
  pub sweeper:   Option<Arc<ExpirySweeper>>,
  pub region:    Arc<Region>,
  pub urls:      Arc<Urls>,
  pub config:    Arc<ServerConfig>,
  pub auth:      Arc<AuthConfig>,
}

impl<S, P> Clone for AppState<S, P> {
  fn clone(&self) -> Self {
    Self {
      store:     Arc::clone(&self.store),
      provider:  Arc::clone(&self.provider),
      jobs:      Arc::clone(&self.jobs),
      functions: Arc::clone(&self.functions),
      sweeper:   self.sweeper.clone(),
      region:    Arc::clone(&self.region),
      urls:      Arc::clone(&self.urls),
      config:    Arc::clone(&self.config),
      auth:      Arc::clone(&self.auth),
    }
  }
}

impl<S, P> AppState<S, P> {
  /// Derives the region, URLs, credentials and sweeper from `config`.
  /// Function actions get the builtin registry until
  /// [`with_functions`](Self::with_functions) replaces it.
  pub fn new(config: ServerConfig, store: S, provider: P, jobs: Arc<dyn JobQueue>) -> Result<Self> {
    let region = Region::new(&config.default_region)
      .map_err(|e| Error::InvalidConfig(e.to_string()))?;
    let sweeper = ExpirySweeper::from_lifespan_days(config.voicemail_lifespan_days)?;
    Ok(Self {
      store: Arc::new(store),
      provider: Arc::new(provider),
      jobs,
      functions: Arc::new(FunctionRegistry::with_builtins()),
      sweeper: sweeper.map(Arc::new),
      region: Arc::new(region),
      urls: Arc::new(Urls::new(&config)),
      auth: Arc::new(AuthConfig {
        username:      config.auth_username.clone(),
        password_hash: config.auth_password_hash.clone(),
      }),
      config: Arc::new(config),
    })
  }

  /// Installs the handlers function actions dispatch to.
  pub fn with_functions(mut self, functions: FunctionRegistry) -> Self {
    self.functions = Arc::new(functions);
    self
  }
}

impl<S, P> AppState<S, P>
where
  S: CallCenterStore,
{
  /// Fails if a stored menu item names a function the registry lacks.
  pub async fn check_functions(&self) -> Result<()> {
    let names = self.store.list_function_names().await.map_err(Error::store)?;
    let missing: Vec<_> = names
      .into_iter()
      .filter(|name| !self.functions.contains(name))
      .collect();
    if !missing.is_empty() {
      return Err(Error::InvalidConfig(format!(
        "menu items name unregistered functions: {}",
        missing.join(", ")
      )));
    }
    Ok(())
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build an axum [`Router`] for every webhook, mounted under `path_prefix`.
pub fn router<S, P>(state: AppState<S, P>) -> Router
where
  S: CallCenterStore + 'static,
  P: Provider,
{
  let prefix = state.urls.prefix().to_owned();

  let routes = Router::new()
    .route("/{menu}/call-menu",              get(call::menu::<S, P>).post(call::menu::<S, P>))
    .route("/{menu}/call-action",            get(call::action::<S, P>).post(call::action::<S, P>))
    .route("/{menu}/call-pin/{digit}",       get(call::pin::<S, P>).post(call::pin::<S, P>))
    .route("/{menu}/call-end",               get(call::end::<S, P>).post(call::end::<S, P>))
    .route(
      "/{menu}/voicemail/{digit}",
      get(voicemail_handlers::recording::<S, P>).post(voicemail_handlers::recording::<S, P>),
    )
    .route(
      "/{menu}/voicemail-sms-cb/{digit}",
      get(voicemail_handlers::sms_callback::<S, P>).post(voicemail_handlers::sms_callback::<S, P>),
    )
    .route("/sms-incoming",                  post(sms_handlers::incoming::<S, P>))
    .route("/sms-status",                    get(sms_handlers::status::<S, P>))
    .route("/send-sms",                      post(sms_handlers::send::<S, P>))
    .route("/send-sms-cb",                   post(sms_handlers::send_callback::<S, P>))
    .route("/sms-forward-cb",                post(sms_handlers::forward_callback::<S, P>))
    .with_state(state);

  let app = if prefix.is_empty() { routes } else { Router::new().nest(&prefix, routes) };
  app.layer(TraceLayer::new_for_http())
}
