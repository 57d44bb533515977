//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{Duration, NaiveTime, Utc};
use switchboard_core::{
  mailbox::NewMailbox,
  menu::{Action, NewAction, NewMenu, NewMenuItem},
  number::NewTwilioNumber,
  record::{SmsUpsert, VoicemailUpsert},
  store::CallCenterStore,
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn new_menu(name: &str, enabled: bool) -> NewMenu {
  NewMenu {
    name: name.into(),
    enabled,
    greeting_text: format!("Welcome to {name}"),
    voice: None,
  }
}

fn new_item(menu_id: Uuid, digit: u8, text: &str) -> NewMenuItem {
  NewMenuItem {
    menu_id: Some(menu_id),
    digit,
    enabled: true,
    menu_text: text.into(),
    pin_digits: vec![],
    pin_prompt_text: String::new(),
    action: None,
    action_text: String::new(),
  }
}

// ─── Menus ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn enabled_menu_is_found_by_name() {
  let s = store().await;
  let menu = s.add_menu(new_menu("support", true)).await.unwrap();

  let found = s.find_enabled_menu("support").await.unwrap().unwrap();
  assert_eq!(found.menu_id, menu.menu_id);
  assert_eq!(found.greeting_text, "Welcome to support");
  assert_eq!(found.voice(), "woman");
}

#[tokio::test]
async fn disabled_menu_is_invisible_by_name() {
  let s = store().await;
  let menu = s.add_menu(new_menu("closed", false)).await.unwrap();

  assert!(s.find_enabled_menu("closed").await.unwrap().is_none());
  // Still present for direct lookup.
  assert!(s.get_menu(menu.menu_id).await.unwrap().is_some());
}

#[tokio::test]
async fn duplicate_menu_name_is_rejected() {
  let s = store().await;
  s.add_menu(new_menu("support", true)).await.unwrap();
  assert!(s.add_menu(new_menu("support", true)).await.is_err());
}

// ─── Menu items ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn items_list_by_digit_then_insertion_order() {
  let s = store().await;
  let menu = s.add_menu(new_menu("support", true)).await.unwrap();

  s.add_menu_item(new_item(menu.menu_id, 3, "third")).await.unwrap();
  s.add_menu_item(new_item(menu.menu_id, 1, "first")).await.unwrap();
  s.add_menu_item(new_item(menu.menu_id, 3, "third again")).await.unwrap();

  let items = s.list_enabled_items(menu.menu_id).await.unwrap();
  let texts: Vec<_> = items.iter().map(|i| i.menu_text.as_str()).collect();
  assert_eq!(texts, ["first", "third", "third again"]);
  assert_eq!(items[0].menu.as_ref().unwrap().name, "support");
}

#[tokio::test]
async fn disabled_items_are_not_listed() {
  let s = store().await;
  let menu = s.add_menu(new_menu("support", true)).await.unwrap();

  let mut hidden = new_item(menu.menu_id, 2, "hidden");
  hidden.enabled = false;
  let hidden = s.add_menu_item(hidden).await.unwrap();
  s.add_menu_item(new_item(menu.menu_id, 1, "shown")).await.unwrap();

  let items = s.list_enabled_items(menu.menu_id).await.unwrap();
  assert_eq!(items.len(), 1);
  assert_eq!(items[0].menu_text, "shown");
  assert!(!s.get_menu_item(hidden.item_id).await.unwrap().unwrap().enabled);
}

#[tokio::test]
async fn submenu_action_carries_target_name() {
  let s = store().await;
  let main = s.add_menu(new_menu("main", true)).await.unwrap();
  let billing = s.add_menu(new_menu("billing", true)).await.unwrap();

  let mut item = new_item(main.menu_id, 2, "for billing");
  item.action = Some(NewAction::Submenu(billing.menu_id));
  let item = s.add_menu_item(item).await.unwrap();

  match item.action {
    Some(Action::Submenu(target)) => {
      assert_eq!(target.menu_id, billing.menu_id);
      assert_eq!(target.name, "billing");
    }
    other => panic!("expected submenu action, got {other:?}"),
  }
}

#[tokio::test]
async fn pin_and_url_actions_round_trip() {
  let s = store().await;
  let menu = s.add_menu(new_menu("main", true)).await.unwrap();

  let mut item = new_item(menu.menu_id, 9, "staff line");
  item.pin_digits = vec!["1234".into(), "9876".into()];
  item.action = Some(NewAction::Url("https://example.com/ivr".into()));
  let item = s.add_menu_item(item).await.unwrap();

  let fetched = s.get_menu_item(item.item_id).await.unwrap().unwrap();
  assert!(fetched.accepts_pin("9876"));
  assert!(!fetched.accepts_pin("0000"));
  assert_eq!(fetched.action, Some(Action::Url("https://example.com/ivr".into())));
}

#[tokio::test]
async fn function_names_are_distinct_and_sorted() {
  let s = store().await;
  let menu = s.add_menu(new_menu("main", true)).await.unwrap();
  for (digit, function) in [(1, "weather"), (2, "current_time"), (3, "weather")] {
    let mut item = new_item(menu.menu_id, digit, "fn");
    item.action = Some(NewAction::Function(function.into()));
    s.add_menu_item(item).await.unwrap();
  }
  s.add_menu_item(new_item(menu.menu_id, 4, "plain")).await.unwrap();

  assert_eq!(s.list_function_names().await.unwrap(), vec!["current_time", "weather"]);
}

#[tokio::test]
async fn item_without_menu_is_allowed() {
  let s = store().await;
  let mut item = new_item(Uuid::nil(), 0, "orphan");
  item.menu_id = None;
  let item = s.add_menu_item(item).await.unwrap();
  assert!(item.menu.is_none());
  assert_eq!(item.label(), "None-0");
}

// ─── Mailboxes and numbers ───────────────────────────────────────────────────

#[tokio::test]
async fn mailbox_keeps_window_and_lists() {
  let s = store().await;
  let number = s
    .add_twilio_number(NewTwilioNumber {
      name: "main line".into(),
      phone: "+17202010000".into(),
      ..Default::default()
    })
    .await
    .unwrap();

  let start = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
  let stop  = NaiveTime::from_hms_opt(17, 0, 0).unwrap();
  let mailbox = s
    .add_mailbox(NewMailbox {
      name: "front-desk".into(),
      phone: Some("720-201-0123".into()),
      notification_phone: Some(number.number_id),
      phone_list: vec!["720-201-0124".into()],
      email_list: vec!["desk@example.com".into(), "boss@example.com".into()],
      available_start: Some(start),
      available_stop: Some(stop),
      always_send_voicemail: false,
    })
    .await
    .unwrap();

  let fetched = s.get_mailbox(mailbox.mailbox_id).await.unwrap().unwrap();
  assert_eq!(fetched.notification_phone, Some(number.number_id));
  assert_eq!(fetched.email_list, ["desk@example.com", "boss@example.com"]);
  assert_eq!(fetched.availability.unwrap().start, start);
  assert!(fetched.should_send_voicemail_at(NaiveTime::from_hms_opt(20, 0, 0).unwrap()));
  assert!(!fetched.should_send_voicemail_at(NaiveTime::from_hms_opt(12, 0, 0).unwrap()));
}

#[tokio::test]
async fn blank_mailbox_phone_is_stored_as_none() {
  let s = store().await;
  let mailbox = s
    .add_mailbox(NewMailbox {
      name: "after-hours".into(),
      phone: Some("  ".into()),
      ..Default::default()
    })
    .await
    .unwrap();

  let fetched = s.get_mailbox(mailbox.mailbox_id).await.unwrap().unwrap();
  assert!(fetched.phone.is_none());
  assert!(fetched.should_send_voicemail());
}

#[tokio::test]
async fn twilio_numbers_list_in_creation_order() {
  let s = store().await;
  for (name, phone) in [("a", "+17202010001"), ("b", "+17202010002")] {
    s.add_twilio_number(NewTwilioNumber {
      name: name.into(),
      phone: phone.into(),
      forward_phone_list: vec!["+17205550100".into()],
      ..Default::default()
    })
    .await
    .unwrap();
  }

  let numbers = s.list_twilio_numbers().await.unwrap();
  let names: Vec<_> = numbers.iter().map(|n| n.name.as_str()).collect();
  assert_eq!(names, ["a", "b"]);
  assert_eq!(numbers[1].forward_phone_list, ["+17205550100"]);
}

// ─── Voicemail log ───────────────────────────────────────────────────────────

#[tokio::test]
async fn voicemail_upsert_merges_by_sid() {
  let s = store().await;

  let recorded = s
    .upsert_voicemail(VoicemailUpsert {
      sid: "RE100".into(),
      call_sid: Some("CA100".into()),
      from_phone: Some("+17205550000".into()),
      url: Some("https://api.example.com/RE100".into()),
      status: Some("completed".into()),
      ..Default::default()
    })
    .await
    .unwrap();
  assert!(recorded.transcription_status.is_none());

  let merged = s
    .upsert_voicemail(VoicemailUpsert {
      sid: "RE100".into(),
      transcription: Some("call me back".into()),
      transcription_status: Some("completed".into()),
      ..Default::default()
    })
    .await
    .unwrap();

  assert_eq!(merged.call_sid, "CA100");
  assert_eq!(merged.from_phone, "+17205550000");
  assert_eq!(merged.url, "https://api.example.com/RE100");
  assert_eq!(merged.transcription, "call me back");
  assert!(merged.is_transcribed());
  assert!(merged.last_activity >= recorded.last_activity);
}

#[tokio::test]
async fn get_voicemail_missing_returns_none() {
  let s = store().await;
  assert!(s.get_voicemail("RE404").await.unwrap().is_none());
}

#[tokio::test]
async fn removed_voicemails_drop_out_of_listing() {
  let s = store().await;
  let old = Utc::now() - Duration::days(40);
  for sid in ["RE1", "RE2"] {
    s.upsert_voicemail(VoicemailUpsert {
      sid: sid.into(),
      last_activity: Some(old),
      ..Default::default()
    })
    .await
    .unwrap();
  }

  s.mark_voicemail_removed("RE1").await.unwrap();

  let alive = s.list_unremoved_voicemails().await.unwrap();
  assert_eq!(alive.len(), 1);
  assert_eq!(alive[0].sid, "RE2");
  assert!(alive[0].is_expired(Duration::days(30), Utc::now()));
  assert!(s.get_voicemail("RE1").await.unwrap().unwrap().removed_from_provider);
}

// ─── SMS log ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn sms_status_updates_keep_body() {
  let s = store().await;
  s.upsert_sms(SmsUpsert {
    sid: "SM1".into(),
    from_phone: Some("+17202010001".into()),
    to_phone: Some("+17205550100".into()),
    message: Some("hello".into()),
    status: Some("queued".into()),
    ..Default::default()
  })
  .await
  .unwrap();

  let updated = s
    .upsert_sms(SmsUpsert {
      sid: "SM1".into(),
      status: Some("delivered".into()),
      ..Default::default()
    })
    .await
    .unwrap();

  assert_eq!(updated.status, "delivered");
  assert_eq!(updated.message, "hello");
  assert_eq!(s.get_sms("SM1").await.unwrap().unwrap().to_phone, "+17205550100");
  assert!(s.get_sms("SM2").await.unwrap().is_none());
}
