//! Markup writer shared by all node serializers.
//!
//! Wraps a quick-xml [`Writer`] over an in-memory chunk together with the
//! chunk's [`FragmentBuffer`]. Text goes through quick-xml's escaping; raw
//! markup goes through the fragment buffer and is restored when the chunk is
//! finished.

use quick_xml::Writer;
use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::error::Result;
use crate::fragments::FragmentBuffer;
use crate::sanitize::{ParagraphMode, Sanitized, Sanitizer};

/// Ordered element attributes.
#[derive(Debug, Clone, Default)]
pub(crate) struct Attrs(Vec<(&'static str, String)>);

impl Attrs {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Add an attribute unconditionally.
    pub fn with(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.0.push((name, value.into()));
        self
    }

    /// Add an attribute unless the value is missing, empty or `"null"`.
    pub fn opt(self, name: &'static str, value: Option<&str>) -> Self {
        match value {
            Some(v) if !v.is_empty() && v != "null" => self.with(name, v),
            _ => self,
        }
    }

    /// Mark unpublished content for internal audiences.
    pub fn internal_if(self, unpublished: bool) -> Self {
        if unpublished {
            self.with("audience", "internal")
        } else {
            self
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn start<'a>(&'a self, name: &'a str) -> BytesStart<'a> {
        let mut start = BytesStart::new(name);
        for (key, value) in &self.0 {
            start.push_attribute((*key, value.as_str()));
        }
        start
    }
}

/// Writer for one output chunk.
pub(crate) struct EadWriter {
    xml: Writer<Vec<u8>>,
    fragments: FragmentBuffer,
    sanitizer: Sanitizer,
}

impl EadWriter {
    pub fn new(nonce: u64, sanitizer: Sanitizer) -> Self {
        Self {
            xml: Writer::new(Vec::new()),
            fragments: FragmentBuffer::new(nonce),
            sanitizer,
        }
    }

    pub fn declaration(&mut self) -> Result<()> {
        self.xml
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        self.xml.get_mut().push(b'\n');
        Ok(())
    }

    /// Write a doctype line verbatim.
    pub fn doctype(&mut self, doctype: &str) -> Result<()> {
        let out = self.xml.get_mut();
        out.extend_from_slice(b"<!DOCTYPE ");
        out.extend_from_slice(doctype.as_bytes());
        out.extend_from_slice(b">\n");
        Ok(())
    }

    pub fn start(&mut self, name: &str, attrs: &Attrs) -> Result<()> {
        self.xml.write_event(Event::Start(attrs.start(name)))?;
        Ok(())
    }

    pub fn end(&mut self, name: &str) -> Result<()> {
        self.xml.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }

    /// Write `<name attrs>`, the body, then `</name>`.
    pub fn element<F>(&mut self, name: &str, attrs: &Attrs, body: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        self.start(name, attrs)?;
        body(self)?;
        self.end(name)
    }

    pub fn empty(&mut self, name: &str, attrs: &Attrs) -> Result<()> {
        self.xml.write_event(Event::Empty(attrs.start(name)))?;
        Ok(())
    }

    /// Escaped text.
    pub fn text(&mut self, text: &str) -> Result<()> {
        self.xml
            .write_event(Event::Text(BytesText::from_escaped(partial_escape(text))))?;
        Ok(())
    }

    /// Markup inserted verbatim when the chunk is finished.
    pub fn raw(&mut self, markup: &str) -> Result<()> {
        let token = self.fragments.push(markup);
        self.xml.get_mut().extend_from_slice(token.as_bytes());
        Ok(())
    }

    pub fn cdata(&mut self, text: &str) -> Result<()> {
        // "]]>" cannot appear inside a CDATA section; split around it
        let parts: Vec<&str> = text.split("]]>").collect();
        let last = parts.len() - 1;
        for (i, part) in parts.iter().enumerate() {
            let mut section = String::with_capacity(part.len() + 3);
            if i > 0 {
                section.push('>');
            }
            section.push_str(part);
            if i < last {
                section.push_str("]]");
            }
            self.xml
                .write_event(Event::CData(BytesCData::new(section.as_str())))?;
        }
        Ok(())
    }

    /// Sanitize free-text content and write it.
    pub fn mixed(&mut self, content: &str, mode: ParagraphMode) -> Result<()> {
        match self.sanitizer.sanitize(content, mode) {
            Sanitized::Markup(markup) => self.raw(&markup),
            Sanitized::Text(text) => self.text(&text),
            Sanitized::CData(text) => self.cdata(&text),
        }
    }

    /// `<name attrs>content</name>` with sanitized content.
    pub fn mixed_element(
        &mut self,
        name: &str,
        attrs: &Attrs,
        content: &str,
        mode: ParagraphMode,
    ) -> Result<()> {
        self.element(name, attrs, |w| w.mixed(content, mode))
    }

    /// Finish the chunk, restoring raw fragments.
    pub fn finish(self) -> Vec<u8> {
        self.fragments.resolve(self.xml.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finish_str(w: EadWriter) -> String {
        String::from_utf8(w.finish()).unwrap()
    }

    #[test]
    fn test_attrs_skip_empty_and_null() {
        let mut w = EadWriter::new(1, Sanitizer::bhl());
        let attrs = Attrs::new()
            .opt("a", Some("x"))
            .opt("b", Some(""))
            .opt("c", Some("null"))
            .opt("d", None)
            .internal_if(true);
        w.empty("e", &attrs).unwrap();
        assert_eq!(finish_str(w), r#"<e a="x" audience="internal"/>"#);
    }

    #[test]
    fn test_text_is_escaped_markup_is_not() {
        let mut w = EadWriter::new(2, Sanitizer::bhl());
        w.mixed_element("unittitle", &Attrs::new(), "Smith & Sons", ParagraphMode::Strip)
            .unwrap();
        w.mixed_element(
            "unittitle",
            &Attrs::new(),
            "<title render=\"italic\">Ensian</title>",
            ParagraphMode::Strip,
        )
        .unwrap();
        assert_eq!(
            finish_str(w),
            "<unittitle>Smith &amp; Sons</unittitle><unittitle><title render=\"italic\">Ensian</title></unittitle>"
        );
    }

    #[test]
    fn test_cdata_fallback() {
        let mut w = EadWriter::new(3, Sanitizer::bhl());
        w.mixed("bell\u{7}", ParagraphMode::Strip).unwrap();
        assert_eq!(finish_str(w), "<![CDATA[bell\u{7}]]>");
    }

    #[test]
    fn test_cdata_splits_terminator() {
        let mut w = EadWriter::new(4, Sanitizer::bhl());
        w.cdata("a]]>b").unwrap();
        assert_eq!(finish_str(w), "<![CDATA[a]]]]><![CDATA[>b]]>");
    }
}
