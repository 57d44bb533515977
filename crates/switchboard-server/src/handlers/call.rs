//! Voice menu webhooks.
//!
//! | Path | Notes |
//! |------|-------|
//! | `/{menu}/call-menu` | Announce and collect one digit |
//! | `/{menu}/call-action` | `Digits` selects an item |
//! | `/{menu}/call-pin/{digit}` | `Digits` carries the PIN for `digit` |
//! | `/{menu}/call-end` | Goodbye and hang up |
//!
//! Each accepts GET (fields in the query) or POST (form body).

use axum::{
  Form,
  extract::{Path, State},
};
use chrono::Local;
use serde::Deserialize;
use switchboard_core::store::CallCenterStore;
use tracing::debug;

use crate::{
  AppState, Provider,
  error::Result,
  flow::{self, Selection, parse_digit},
  handlers::Twiml,
};

#[derive(Debug, Default, Deserialize)]
pub struct DigitsForm {
  #[serde(rename = "Digits")]
  pub digits: Option<String>,
}

pub async fn menu<S, P>(
  State(state): State<AppState<S, P>>,
  Path(menu): Path<String>,
) -> Result<Twiml>
where
  S: CallCenterStore + 'static,
  P: Provider,
{
  let resolved = flow::resolve_menu(state.store.as_ref(), &menu).await?;
  Twiml::voice(&flow::call_menu(&resolved, &state.urls))
}

pub async fn action<S, P>(
  State(state): State<AppState<S, P>>,
  Path(menu): Path<String>,
  Form(form): Form<DigitsForm>,
) -> Result<Twiml>
where
  S: CallCenterStore + 'static,
  P: Provider,
{
  let digit = form.digits.as_deref().and_then(parse_digit);
  debug!(menu = %menu, ?digit, "call action");
  respond(&state, &menu, Selection { digit, pin: None, now: Local::now() }).await
}

pub async fn pin<S, P>(
  State(state): State<AppState<S, P>>,
  Path((menu, digit)): Path<(String, String)>,
  Form(form): Form<DigitsForm>,
) -> Result<Twiml>
where
  S: CallCenterStore + 'static,
  P: Provider,
{
  // Missing `Digits` is an empty, and therefore rejected, PIN.
  let pin = form.digits.unwrap_or_default();
  let selection = Selection {
    digit: parse_digit(&digit),
    pin:   Some(pin.as_str()),
    now:   Local::now(),
  };
  respond(&state, &menu, selection).await
}

async fn respond<S, P>(state: &AppState<S, P>, menu: &str, selection: Selection<'_>) -> Result<Twiml>
where
  S: CallCenterStore + 'static,
  P: Provider,
{
  let resolved = flow::resolve_menu(state.store.as_ref(), menu).await?;
  let response = flow::call_action(
    state.store.as_ref(),
    &state.functions,
    &state.urls,
    &resolved,
    selection,
  )
  .await?;
  Twiml::voice(&response)
}

pub async fn end<S, P>(
  State(state): State<AppState<S, P>>,
  Path(menu): Path<String>,
) -> Result<Twiml>
where
  S: CallCenterStore + 'static,
  P: Provider,
{
  let resolved = flow::resolve_menu(state.store.as_ref(), &menu).await?;
  Twiml::voice(&flow::call_end(&resolved))
}
