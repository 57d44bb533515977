//! Named handlers for function actions.
//!
//! A menu item's `Function` action names an entry in the [`FunctionRegistry`].
//! Handlers are registered in code before the router is built; the call flow
//! only ever looks them up by name.

use std::{collections::HashMap, fmt, sync::Arc};

use chrono::{DateTime, Local};
use switchboard_core::menu::{Menu, MenuItem};
use switchboard_twiml::VoiceResponse;

/// What a handler sees when its item is selected.
pub struct FunctionContext<'a> {
  pub menu:     &'a Menu,
  pub item:     &'a MenuItem,
  /// The response being built; verbs pushed here precede the spoken text.
  pub response: &'a mut VoiceResponse,
  pub now:      DateTime<Local>,
}

/// Returns text that replaces the item's `action_text`, or `None` to keep it.
pub trait ActionFunction: Send + Sync {
  fn call(&self, ctx: &mut FunctionContext<'_>) -> Option<String>;
}

impl<F> ActionFunction for F
where
  F: Fn(&mut FunctionContext<'_>) -> Option<String> + Send + Sync,
{
  fn call(&self, ctx: &mut FunctionContext<'_>) -> Option<String> { self(ctx) }
}

#[derive(Clone, Default)]
pub struct FunctionRegistry {
  functions: HashMap<String, Arc<dyn ActionFunction>>,
}

impl FunctionRegistry {
  pub fn new() -> Self { Self::default() }

  /// A registry holding the builtin handlers.
  pub fn with_builtins() -> Self {
    let mut registry = Self::new();
    registry.register("current_time", current_time);
    registry
  }

  /// Registers `function` under `name`, replacing any previous entry.
  pub fn register(&mut self, name: impl Into<String>, function: impl ActionFunction + 'static) {
    self.functions.insert(name.into(), Arc::new(function));
  }

  pub fn get(&self, name: &str) -> Option<&dyn ActionFunction> {
    self.functions.get(name).map(|f| f.as_ref())
  }

  pub fn contains(&self, name: &str) -> bool { self.functions.contains_key(name) }
}

impl fmt::Debug for FunctionRegistry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut names: Vec<_> = self.functions.keys().collect();
    names.sort();
    f.debug_struct("FunctionRegistry").field("functions", &names).finish()
  }
}

/// Speaks the local wall-clock time.
fn current_time(ctx: &mut FunctionContext<'_>) -> Option<String> {
  Some(format!("The time is {}", ctx.now.format("%-I:%M %p")))
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;
  use uuid::Uuid;

  use super::*;

  fn menu() -> Menu {
    Menu {
      menu_id:       Uuid::new_v4(),
      name:          "main".into(),
      enabled:       true,
      greeting_text: String::new(),
      voice:         None,
    }
  }

  fn item() -> MenuItem {
    MenuItem {
      item_id:         Uuid::new_v4(),
      menu:            None,
      digit:           5,
      enabled:         true,
      menu_text:       String::new(),
      pin_digits:      vec![],
      pin_prompt_text: String::new(),
      action:          None,
      action_text:     String::new(),
    }
  }

  #[test]
  fn current_time_speaks_twelve_hour_clock() {
    let registry = FunctionRegistry::with_builtins();
    let (menu, item) = (menu(), item());
    let mut response = VoiceResponse::new();
    let mut ctx = FunctionContext {
      menu:     &menu,
      item:     &item,
      response: &mut response,
      now:      Local.with_ymd_and_hms(2024, 3, 1, 15, 7, 0).unwrap(),
    };

    let spoken = registry.get("current_time").unwrap().call(&mut ctx);
    assert_eq!(spoken.as_deref(), Some("The time is 3:07 PM"));
  }

  #[test]
  fn closures_register_and_may_push_verbs() {
    let mut registry = FunctionRegistry::new();
    registry.register("beep", |ctx: &mut FunctionContext<'_>| {
      ctx.response.pause(2);
      None
    });
    assert!(registry.contains("beep"));
    assert!(registry.get("missing").is_none());

    let (menu, item) = (menu(), item());
    let mut response = VoiceResponse::new();
    let mut ctx = FunctionContext {
      menu:     &menu,
      item:     &item,
      response: &mut response,
      now:      Local::now(),
    };
    assert!(registry.get("beep").unwrap().call(&mut ctx).is_none());
    assert_eq!(response.verbs().len(), 1);
  }
}
