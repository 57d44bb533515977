//! Writes a validated [`Plan`] into a store.

use std::collections::HashMap;

use anyhow::{Context as _, Result};
use switchboard_core::{menu::NewAction, store::CallCenterStore};
use tracing::debug;
use uuid::Uuid;

use crate::manifest::{ActionRef, Plan};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
  pub numbers:   usize,
  pub mailboxes: usize,
  pub menus:     usize,
  pub items:     usize,
}

/// Numbers first, then mailboxes, menus, and finally items, so every
/// reference points at a row that already exists.
pub async fn apply<S>(plan: Plan, store: &S) -> Result<Summary>
where
  S: CallCenterStore,
{
  let mut summary = Summary::default();

  let mut numbers = HashMap::new();
  for input in plan.numbers {
    let name = input.name.clone();
    let number = store
      .add_twilio_number(input)
      .await
      .with_context(|| format!("writing number {name:?}"))?;
    debug!(name = %name, id = %number.number_id, "number added");
    numbers.insert(name, number.number_id);
    summary.numbers += 1;
  }

  let mut mailboxes = HashMap::new();
  for planned in plan.mailboxes {
    let mut input = planned.input;
    input.notification_phone = match &planned.notification_number {
      Some(name) => Some(lookup(&numbers, "number", name)?),
      None => None,
    };
    let name = input.name.clone();
    let mailbox = store
      .add_mailbox(input)
      .await
      .with_context(|| format!("writing mailbox {name:?}"))?;
    mailboxes.insert(name, mailbox.mailbox_id);
    summary.mailboxes += 1;
  }

  let mut menus = HashMap::new();
  let mut pending_items = Vec::new();
  for planned in plan.menus {
    let name = planned.input.name.clone();
    let menu = store
      .add_menu(planned.input)
      .await
      .with_context(|| format!("writing menu {name:?}"))?;
    menus.insert(name.clone(), menu.menu_id);
    pending_items.push((name, menu.menu_id, planned.items));
    summary.menus += 1;
  }

  for (menu_name, menu_id, items) in pending_items {
    for planned in items {
      let mut input = planned.input;
      let digit = input.digit;
      input.menu_id = Some(menu_id);
      input.action = match planned.action {
        None => None,
        Some(ActionRef::Mailbox(name)) => Some(NewAction::Mailbox(lookup(&mailboxes, "mailbox", &name)?)),
        Some(ActionRef::Submenu(name)) => Some(NewAction::Submenu(lookup(&menus, "menu", &name)?)),
        Some(ActionRef::Url(url)) => Some(NewAction::Url(url)),
        Some(ActionRef::Function(function)) => Some(NewAction::Function(function)),
      };
      store
        .add_menu_item(input)
        .await
        .with_context(|| format!("writing menu {menu_name:?}, item {digit}"))?;
      summary.items += 1;
    }
  }

  Ok(summary)
}

fn lookup(ids: &HashMap<String, Uuid>, kind: &str, name: &str) -> Result<Uuid> {
  ids
    .get(name)
    .copied()
    .with_context(|| format!("{kind} {name:?} was not written"))
}

#[cfg(test)]
mod tests {
  use switchboard_core::{menu::Action, phone::Region};
  use switchboard_store_sqlite::SqliteStore;

  use super::*;
  use crate::manifest::Manifest;

  const SAMPLE: &str = r#"
    [[number]]
    name           = "main"
    phone          = "+17202010000"
    forward_emails = ["ops@example.com"]

    [[mailbox]]
    name                = "support"
    phone               = "720-201-0123"
    notification_number = "main"
    phones              = ["720-201-0199"]

    [[menu]]
    name     = "main"
    greeting = "Thanks for calling"

      [[menu.item]]
      digit   = 1
      text    = "for support"
      mailbox = "support"

      [[menu.item]]
      digit   = 2
      text    = "for billing"
      submenu = "billing"

    [[menu]]
    name     = "billing"
    greeting = "Billing"

      [[menu.item]]
      digit = 1
      text  = "to go back"
      url   = "/main/call-menu"
  "#;

  async fn imported() -> (SqliteStore, Summary) {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let plan = Manifest::parse(SAMPLE).unwrap().plan(&Region::default()).unwrap();
    let summary = apply(plan, &store).await.unwrap();
    (store, summary)
  }

  #[tokio::test]
  async fn import_writes_every_entry() {
    let (_, summary) = imported().await;
    assert_eq!(summary, Summary { numbers: 1, mailboxes: 1, menus: 2, items: 3 });
  }

  #[tokio::test]
  async fn references_resolve_to_written_rows() {
    let (store, _) = imported().await;

    let main = store.find_enabled_menu("main").await.unwrap().unwrap();
    let items = store.list_enabled_items(main.menu_id).await.unwrap();
    assert_eq!(items.iter().map(|i| i.digit).collect::<Vec<_>>(), vec![1, 2]);

    let Some(Action::Mailbox(mailbox_id)) = items[0].action.clone() else {
      panic!("expected a mailbox action, got {:?}", items[0].action);
    };
    let mailbox = store.get_mailbox(mailbox_id).await.unwrap().unwrap();
    assert_eq!(mailbox.name, "support");
    let number = store
      .get_twilio_number(mailbox.notification_phone.unwrap())
      .await
      .unwrap()
      .unwrap();
    assert_eq!(number.name, "main");
    assert_eq!(number.forward_email_list, vec!["ops@example.com".to_string()]);

    match &items[1].action {
      Some(Action::Submenu(target)) => assert_eq!(target.name, "billing"),
      other => panic!("expected a submenu action, got {other:?}"),
    }
  }

  #[tokio::test]
  async fn importing_twice_fails_on_the_duplicate_menu() {
    let (store, _) = imported().await;
    let plan = Manifest::parse(
      "[[menu]]\nname = \"main\"\n",
    )
    .unwrap()
    .plan(&Region::default())
    .unwrap();
    let err = apply(plan, &store).await.unwrap_err();
    assert!(format!("{err:#}").starts_with("writing menu \"main\""), "{err:#}");
  }
}
