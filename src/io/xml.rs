//! Small wrapper over the quick-xml writer for the XML formats we emit.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::error::{Result, WallError};

/// Builds an indented XML document in memory.
///
/// Errors carry the path of the file the document is meant for.
pub(crate) struct XmlDocument {
    writer: Writer<Cursor<Vec<u8>>>,
    target: PathBuf,
}

impl XmlDocument {
    /// Start a document with a 2-space indent and an XML declaration.
    pub(crate) fn new(target: &Path) -> Result<Self> {
        let mut doc = Self {
            writer: Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2),
            target: target.to_path_buf(),
        };
        doc.write(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
        Ok(doc)
    }

    fn write(&mut self, event: Event<'_>) -> Result<()> {
        self.writer
            .write_event(event)
            .map_err(|e| WallError::save_error(&self.target, format!("failed to write XML: {e}")))
    }

    fn element<'a>(name: &'a str, attrs: &[(&str, &str)]) -> BytesStart<'a> {
        let mut element = BytesStart::new(name);
        for &attr in attrs {
            element.push_attribute(attr);
        }
        element
    }

    /// Open an element.
    pub(crate) fn start(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        self.write(Event::Start(Self::element(name, attrs)))
    }

    /// Close an element.
    pub(crate) fn end(&mut self, name: &str) -> Result<()> {
        self.write(Event::End(BytesEnd::new(name)))
    }

    /// Write a self-closing element.
    pub(crate) fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        self.write(Event::Empty(Self::element(name, attrs)))
    }

    /// Write an element holding escaped text. Empty text gives an empty
    /// element.
    pub(crate) fn text(&mut self, name: &str, attrs: &[(&str, &str)], text: &str) -> Result<()> {
        if text.is_empty() {
            return self.empty(name, attrs);
        }
        self.start(name, attrs)?;
        self.write(Event::Text(BytesText::new(text)))?;
        self.end(name)
    }

    /// Finish the document and return it with a trailing newline.
    pub(crate) fn finish(self) -> Result<String> {
        let mut bytes = self.writer.into_inner().into_inner();
        bytes.push(b'\n');
        String::from_utf8(bytes).map_err(|e| WallError::save_error(&self.target, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_document() {
        let mut doc = XmlDocument::new(Path::new("test.xml")).unwrap();
        doc.start("model", &[("name", "a&b")]).unwrap();
        doc.text("static", &[], "true").unwrap();
        doc.text("description", &[], "").unwrap();
        doc.end("model").unwrap();
        let xml = doc.finish().unwrap();

        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));
        assert!(xml.contains("<model name=\"a&amp;b\">"));
        assert!(xml.contains("\n  <static>true</static>"));
        assert!(xml.contains("<description/>"));
        assert!(xml.ends_with("</model>\n"));
    }
}
