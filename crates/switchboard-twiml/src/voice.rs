//! Voice response documents.

use strum::{AsRefStr, Display};

use crate::{
  Result,
  write::{self, XmlWriter},
};

/// HTTP method the provider uses when following an `action` URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, AsRefStr, Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Method {
  Get,
  #[default]
  Post,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Say {
  pub text:  String,
  pub voice: Option<String>,
}

impl Say {
  pub fn new(text: impl Into<String>, voice: Option<&str>) -> Self {
    Self { text: text.into(), voice: voice.map(str::to_owned) }
  }
}

/// Collect keypad digits, speaking the nested prompts while waiting.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Gather {
  pub action:        String,
  pub method:        Method,
  pub num_digits:    Option<u8>,
  pub finish_on_key: Option<char>,
  /// Seconds of silence before giving up.
  pub timeout:       Option<u32>,
  pub prompts:       Vec<Say>,
}

impl Gather {
  pub fn new(action: impl Into<String>) -> Self {
    Self { action: action.into(), ..Default::default() }
  }

  pub fn num_digits(mut self, n: u8) -> Self {
    self.num_digits = Some(n);
    self
  }

  pub fn finish_on_key(mut self, key: char) -> Self {
    self.finish_on_key = Some(key);
    self
  }

  pub fn timeout(mut self, secs: u32) -> Self {
    self.timeout = Some(secs);
    self
  }

  pub fn say(mut self, say: Say) -> Self {
    self.prompts.push(say);
    self
  }
}

/// Record the caller; the provider posts the result to `action` and, when
/// set, the transcription to `transcribe_callback`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Record {
  pub action:              String,
  pub method:              Method,
  pub transcribe_callback: Option<String>,
  pub max_length:          Option<u32>,
}

impl Record {
  pub fn new(action: impl Into<String>) -> Self {
    Self { action: action.into(), ..Default::default() }
  }

  pub fn transcribe_callback(mut self, url: impl Into<String>) -> Self {
    self.transcribe_callback = Some(url.into());
    self
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verb {
  Say(Say),
  Gather(Gather),
  Pause { length: u32 },
  Redirect { url: String },
  Dial { number: String },
  Record(Record),
  Hangup,
}

/// An ordered list of verbs answering one voice webhook.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VoiceResponse {
  verbs: Vec<Verb>,
}

impl VoiceResponse {
  pub fn new() -> Self { Self::default() }

  pub fn verbs(&self) -> &[Verb] { &self.verbs }

  pub fn push(&mut self, verb: Verb) -> &mut Self {
    self.verbs.push(verb);
    self
  }

  pub fn say(&mut self, text: impl Into<String>, voice: Option<&str>) -> &mut Self {
    self.push(Verb::Say(Say::new(text, voice)))
  }

  pub fn gather(&mut self, gather: Gather) -> &mut Self { self.push(Verb::Gather(gather)) }

  pub fn pause(&mut self, length: u32) -> &mut Self { self.push(Verb::Pause { length }) }

  pub fn redirect(&mut self, url: impl Into<String>) -> &mut Self {
    self.push(Verb::Redirect { url: url.into() })
  }

  pub fn dial(&mut self, number: impl Into<String>) -> &mut Self {
    self.push(Verb::Dial { number: number.into() })
  }

  pub fn record(&mut self, record: Record) -> &mut Self { self.push(Verb::Record(record)) }

  pub fn hangup(&mut self) -> &mut Self { self.push(Verb::Hangup) }

  /// All spoken text, in document order, including Gather prompts.
  pub fn spoken(&self) -> Vec<&str> {
    let mut out = Vec::new();
    for verb in &self.verbs {
      match verb {
        Verb::Say(say) => out.push(say.text.as_str()),
        Verb::Gather(g) => out.extend(g.prompts.iter().map(|s| s.text.as_str())),
        _ => {}
      }
    }
    out
  }

  pub fn to_xml(&self) -> Result<String> {
    let mut w = write::document()?;
    if self.verbs.is_empty() {
      write::empty(&mut w, "Response", &[])?;
    } else {
      write::start(&mut w, "Response", &[])?;
      for verb in &self.verbs {
        write_verb(&mut w, verb)?;
      }
      write::end(&mut w, "Response")?;
    }
    write::finish(w)
  }
}

fn write_say(w: &mut XmlWriter, say: &Say) -> Result<()> {
  match &say.voice {
    Some(voice) => write::text_elem(w, "Say", &[("voice", voice.as_str())], &say.text),
    None => write::text_elem(w, "Say", &[], &say.text),
  }
}

fn write_verb(w: &mut XmlWriter, verb: &Verb) -> Result<()> {
  match verb {
    Verb::Say(say) => write_say(w, say),
    Verb::Gather(g) => {
      let num_digits = g.num_digits.map(|n| n.to_string());
      let finish     = g.finish_on_key.map(|c| c.to_string());
      let timeout    = g.timeout.map(|t| t.to_string());

      let mut attrs = vec![("action", g.action.as_str()), ("method", g.method.as_ref())];
      if let Some(n) = &num_digits {
        attrs.push(("numDigits", n.as_str()));
      }
      if let Some(k) = &finish {
        attrs.push(("finishOnKey", k.as_str()));
      }
      if let Some(t) = &timeout {
        attrs.push(("timeout", t.as_str()));
      }

      write::start(w, "Gather", &attrs)?;
      for say in &g.prompts {
        write_say(w, say)?;
      }
      write::end(w, "Gather")
    }
    Verb::Pause { length } => write::empty(w, "Pause", &[("length", length.to_string().as_str())]),
    Verb::Redirect { url } => write::text_elem(w, "Redirect", &[], url),
    Verb::Dial { number } => write::text_elem(w, "Dial", &[], number),
    Verb::Record(r) => {
      let max_length = r.max_length.map(|m| m.to_string());
      let mut attrs = vec![("action", r.action.as_str()), ("method", r.method.as_ref())];
      if let Some(cb) = &r.transcribe_callback {
        attrs.push(("transcribe", "true"));
        attrs.push(("transcribeCallback", cb.as_str()));
      }
      if let Some(m) = &max_length {
        attrs.push(("maxLength", m.as_str()));
      }
      write::empty(w, "Record", &attrs)
    }
    Verb::Hangup => write::empty(w, "Hangup", &[]),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_response_is_self_closing() {
    let xml = VoiceResponse::new().to_xml().unwrap();
    assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"), "{xml}");
    assert!(xml.ends_with("<Response/>"), "{xml}");
  }

  #[test]
  fn gather_nests_prompt_and_carries_attributes() {
    let mut r = VoiceResponse::new();
    r.gather(
      Gather::new("/support/call-action")
        .num_digits(1)
        .timeout(10)
        .say(Say::new("Press 1 for sales.", Some("woman"))),
    );
    let xml = r.to_xml().unwrap();
    assert!(
      xml.contains(
        r#"<Gather action="/support/call-action" method="POST" numDigits="1" timeout="10"><Say voice="woman">Press 1 for sales.</Say></Gather>"#
      ),
      "{xml}"
    );
  }

  #[test]
  fn record_with_transcription() {
    let mut r = VoiceResponse::new();
    r.record(Record::new("/support/voicemail/3").transcribe_callback("/support/voicemail/3"));
    let xml = r.to_xml().unwrap();
    assert!(
      xml.contains(
        r#"<Record action="/support/voicemail/3" method="POST" transcribe="true" transcribeCallback="/support/voicemail/3"/>"#
      ),
      "{xml}"
    );
  }

  #[test]
  fn text_and_attributes_are_escaped() {
    let mut r = VoiceResponse::new();
    r.say("Tom & Jerry <3", Some("a\"b")).redirect("/x?a=1&b=2");
    let xml = r.to_xml().unwrap();
    assert!(xml.contains("Tom &amp; Jerry &lt;3"), "{xml}");
    assert!(xml.contains("/x?a=1&amp;b=2"), "{xml}");
    assert!(xml.contains("voice=\"a&quot;b\""), "{xml}");
  }

  #[test]
  fn verbs_serialize_in_order() {
    let mut r = VoiceResponse::new();
    r.say("Transferring, please wait.", None).dial("+17202010123").redirect("/m/call-end");
    r.pause(1).hangup();
    let xml = r.to_xml().unwrap();
    let say    = xml.find("<Say>").unwrap();
    let dial   = xml.find("<Dial>+17202010123</Dial>").unwrap();
    let redir  = xml.find("<Redirect>/m/call-end</Redirect>").unwrap();
    let pause  = xml.find("<Pause length=\"1\"/>").unwrap();
    let hangup = xml.find("<Hangup/>").unwrap();
    assert!(say < dial && dial < redir && redir < pause && pause < hangup, "{xml}");
  }

  #[test]
  fn spoken_collects_gather_prompts() {
    let mut r = VoiceResponse::new();
    r.say("Invalid entry.", None);
    r.gather(Gather::new("/a").say(Say::new("Enter your pin followed by pound.", None)));
    assert_eq!(r.spoken(), vec!["Invalid entry.", "Enter your pin followed by pound."]);
  }
}
