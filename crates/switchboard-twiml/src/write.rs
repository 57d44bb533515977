//! Thin helpers over `quick_xml::Writer`.

use std::io::Cursor;

use quick_xml::{
  Writer,
  events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
};

use crate::Result;

pub(crate) type XmlWriter = Writer<Cursor<Vec<u8>>>;

pub(crate) fn document() -> Result<XmlWriter> {
  let mut writer = Writer::new(Cursor::new(Vec::new()));
  writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
  Ok(writer)
}

pub(crate) fn finish(writer: XmlWriter) -> Result<String> {
  Ok(String::from_utf8(writer.into_inner().into_inner())?)
}

pub(crate) fn start(w: &mut XmlWriter, tag: &str, attrs: &[(&str, &str)]) -> Result<()> {
  w.write_event(Event::Start(element(tag, attrs)))?;
  Ok(())
}

pub(crate) fn end(w: &mut XmlWriter, tag: &str) -> Result<()> {
  w.write_event(Event::End(BytesEnd::new(tag)))?;
  Ok(())
}

pub(crate) fn empty(w: &mut XmlWriter, tag: &str, attrs: &[(&str, &str)]) -> Result<()> {
  w.write_event(Event::Empty(element(tag, attrs)))?;
  Ok(())
}

pub(crate) fn text_elem(
  w: &mut XmlWriter,
  tag: &str,
  attrs: &[(&str, &str)],
  text: &str,
) -> Result<()> {
  start(w, tag, attrs)?;
  w.write_event(Event::Text(BytesText::new(text)))?;
  end(w, tag)
}

fn element<'a>(tag: &'a str, attrs: &[(&'a str, &'a str)]) -> BytesStart<'a> {
  let mut el = BytesStart::new(tag);
  for (k, v) in attrs {
    el.push_attribute((*k, *v));
  }
  el
}
