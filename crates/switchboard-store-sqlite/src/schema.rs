//! SQL schema for the switchboard SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS twilio_numbers (
    number_id          TEXT PRIMARY KEY,
    name               TEXT NOT NULL UNIQUE,
    phone              TEXT NOT NULL UNIQUE,
    forward_phone_list TEXT NOT NULL DEFAULT '',   -- comma separated
    forward_email_list TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS menus (
    menu_id       TEXT PRIMARY KEY,
    name          TEXT NOT NULL UNIQUE,
    enabled       INTEGER NOT NULL DEFAULT 1,
    greeting_text TEXT NOT NULL DEFAULT '',
    voice         TEXT
);

CREATE TABLE IF NOT EXISTS mailboxes (
    mailbox_id            TEXT PRIMARY KEY,
    name                  TEXT NOT NULL,
    phone                 TEXT,                    -- NULL: always voicemail
    notification_phone    TEXT REFERENCES twilio_numbers(number_id) ON DELETE SET NULL,
    phone_list            TEXT NOT NULL DEFAULT '',
    email_list            TEXT NOT NULL DEFAULT '',
    available_start       TEXT,                    -- HH:MM:SS local time
    available_stop        TEXT,
    always_send_voicemail INTEGER NOT NULL DEFAULT 0,
    CHECK ((available_start IS NULL) = (available_stop IS NULL))
);

-- Digits are not unique per menu; ties resolve by insertion order (rowid).
CREATE TABLE IF NOT EXISTS menu_items (
    item_id         TEXT PRIMARY KEY,
    menu_id         TEXT REFERENCES menus(menu_id) ON DELETE SET NULL,
    digit           INTEGER NOT NULL CHECK (digit BETWEEN 0 AND 9),
    enabled         INTEGER NOT NULL DEFAULT 1,
    menu_text       TEXT NOT NULL DEFAULT '',
    pin_digits      TEXT NOT NULL DEFAULT '',      -- comma separated
    pin_prompt_text TEXT NOT NULL DEFAULT '',
    action_text     TEXT NOT NULL DEFAULT '',
    action_mailbox  TEXT REFERENCES mailboxes(mailbox_id) ON DELETE SET NULL,
    action_submenu  TEXT REFERENCES menus(menu_id) ON DELETE SET NULL,
    action_url      TEXT,
    action_function TEXT,
    CHECK ((action_mailbox  IS NOT NULL)
         + (action_submenu  IS NOT NULL)
         + (action_url      IS NOT NULL)
         + (action_function IS NOT NULL) <= 1)
);

CREATE TABLE IF NOT EXISTS voicemails (
    sid                   TEXT PRIMARY KEY,        -- provider recording id
    call_sid              TEXT NOT NULL DEFAULT '',
    menu_item             TEXT REFERENCES menu_items(item_id) ON DELETE SET NULL,
    mailbox               TEXT REFERENCES mailboxes(mailbox_id) ON DELETE SET NULL,
    from_phone            TEXT NOT NULL DEFAULT '',
    to_phone              TEXT NOT NULL DEFAULT '',
    url                   TEXT NOT NULL DEFAULT '',
    status                TEXT NOT NULL DEFAULT '',
    transcription         TEXT NOT NULL DEFAULT '',
    transcription_status  TEXT,
    last_activity         TEXT NOT NULL,           -- RFC 3339 UTC
    removed_from_provider INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS sms_messages (
    sid           TEXT PRIMARY KEY,
    from_phone    TEXT NOT NULL DEFAULT '',
    to_phone      TEXT NOT NULL DEFAULT '',
    message       TEXT NOT NULL DEFAULT '',
    status        TEXT NOT NULL DEFAULT '',
    last_activity TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS menu_items_menu_idx  ON menu_items(menu_id, digit);
CREATE INDEX IF NOT EXISTS voicemails_call_idx  ON voicemails(call_sid);
CREATE INDEX IF NOT EXISTS voicemails_alive_idx ON voicemails(removed_from_provider);

PRAGMA user_version = 1;
";
