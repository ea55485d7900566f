use std::collections::HashSet;
use std::io::Write;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use rust_decimal::Decimal;

use crate::core::InvoiceError;

pub(crate) fn xml_io(e: impl std::fmt::Display) -> InvoiceError {
    InvoiceError::Xml(format!("XML write error: {e}"))
}

/// XML comments may not contain `--` or end with `-`.
pub(crate) fn check_comment(text: &str) -> Result<(), InvoiceError> {
    if text.contains("--") || text.ends_with('-') {
        return Err(InvoiceError::Xml(format!(
            "comment {text:?} contains \"--\" or ends with \"-\""
        )));
    }
    Ok(())
}

/// Sequential XML emission primitive.
///
/// Names are qualified (`"ram:ID"`). A namespace passed to
/// [`XmlSink::start_element`] is declared for the element's prefix unless the
/// prefix is already bound.
pub trait XmlSink {
    fn start_element(&mut self, name: &str, namespace: Option<&str>) -> Result<(), InvoiceError>;

    fn end_element(&mut self) -> Result<(), InvoiceError>;

    /// Must directly follow `start_element` or another attribute.
    fn attribute(&mut self, name: &str, value: &str) -> Result<(), InvoiceError>;

    /// Escaped character data inside the current element.
    fn value(&mut self, text: &str) -> Result<(), InvoiceError>;

    fn comment(&mut self, text: &str) -> Result<(), InvoiceError>;
}

/// [`XmlSink`] on top of a `quick_xml::Writer`.
///
/// The start tag is held back until the next non-attribute call so that
/// attributes can be added after the element was opened.
pub struct QuickXmlSink<W: Write> {
    writer: Writer<W>,
    pending: Option<BytesStart<'static>>,
    open: Vec<String>,
    bound_prefixes: HashSet<String>,
}

impl<W: Write> QuickXmlSink<W> {
    /// Create a sink and write the UTF-8 XML declaration.
    pub fn new(inner: W, indent: bool) -> Result<Self, InvoiceError> {
        let mut writer = if indent {
            Writer::new_with_indent(inner, b' ', 2)
        } else {
            Writer::new(inner)
        };
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(xml_io)?;
        Ok(Self {
            writer,
            pending: None,
            open: Vec::new(),
            bound_prefixes: HashSet::new(),
        })
    }

    /// Return the underlying writer. Fails if elements are still open.
    pub fn into_inner(mut self) -> Result<W, InvoiceError> {
        self.flush_pending()?;
        if let Some(name) = self.open.last() {
            return Err(InvoiceError::Xml(format!("element <{name}> was never closed")));
        }
        Ok(self.writer.into_inner())
    }

    fn flush_pending(&mut self) -> Result<(), InvoiceError> {
        if let Some(start) = self.pending.take() {
            self.writer.write_event(Event::Start(start)).map_err(xml_io)?;
        }
        Ok(())
    }
}

impl<W: Write> XmlSink for QuickXmlSink<W> {
    fn start_element(&mut self, name: &str, namespace: Option<&str>) -> Result<(), InvoiceError> {
        self.flush_pending()?;
        let mut start = BytesStart::new(name.to_string());
        if let Some(ns) = namespace {
            match name.split_once(':') {
                Some((prefix, _)) => {
                    if self.bound_prefixes.insert(prefix.to_string()) {
                        start.push_attribute((format!("xmlns:{prefix}").as_str(), ns));
                    }
                }
                None => {
                    if self.bound_prefixes.insert(String::new()) {
                        start.push_attribute(("xmlns", ns));
                    }
                }
            }
        }
        self.pending = Some(start);
        self.open.push(name.to_string());
        Ok(())
    }

    fn end_element(&mut self) -> Result<(), InvoiceError> {
        let name = self
            .open
            .pop()
            .ok_or(InvoiceError::UnbalancedElement("end_element without open element"))?;
        match self.pending.take() {
            Some(start) => self.writer.write_event(Event::Empty(start)).map_err(xml_io)?,
            None => self
                .writer
                .write_event(Event::End(BytesEnd::new(name)))
                .map_err(xml_io)?,
        };
        Ok(())
    }

    fn attribute(&mut self, name: &str, value: &str) -> Result<(), InvoiceError> {
        let start = self.pending.as_mut().ok_or_else(|| {
            InvoiceError::Xml(format!("attribute {name} written after element content"))
        })?;
        start.push_attribute((name, value));
        Ok(())
    }

    fn value(&mut self, text: &str) -> Result<(), InvoiceError> {
        self.flush_pending()?;
        self.writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(xml_io)?;
        Ok(())
    }

    fn comment(&mut self, text: &str) -> Result<(), InvoiceError> {
        check_comment(text)?;
        self.flush_pending()?;
        self.writer
            .write_event(Event::Comment(BytesText::from_escaped(text)))
            .map_err(xml_io)?;
        Ok(())
    }
}

/// Format a Decimal for XML output: at least 2 decimal places, trailing
/// zeros beyond that stripped.
pub fn format_decimal(d: Decimal) -> String {
    let s = d.normalize().to_string();
    if let Some(dot_pos) = s.find('.') {
        let decimals = s.len() - dot_pos - 1;
        if decimals < 2 {
            format!("{s}{}", "0".repeat(2 - decimals))
        } else {
            s
        }
    } else {
        format!("{s}.00")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn render(f: impl FnOnce(&mut QuickXmlSink<Vec<u8>>) -> Result<(), InvoiceError>) -> String {
        let mut sink = QuickXmlSink::new(Vec::new(), false).unwrap();
        f(&mut sink).unwrap();
        String::from_utf8(sink.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn attributes_follow_start_tag() {
        let xml = render(|s| {
            s.start_element("ram:Amount", None)?;
            s.attribute("currencyID", "EUR")?;
            s.value("10.00")?;
            s.end_element()
        });
        assert!(xml.ends_with(r#"<ram:Amount currencyID="EUR">10.00</ram:Amount>"#));
    }

    #[test]
    fn namespace_declared_once_per_prefix() {
        let xml = render(|s| {
            s.start_element("rsm:Root", Some("urn:a"))?;
            s.start_element("rsm:Child", Some("urn:a"))?;
            s.end_element()?;
            s.end_element()
        });
        assert_eq!(xml.matches("xmlns:rsm").count(), 1);
        assert!(xml.contains("<rsm:Child/>"));
    }

    #[test]
    fn text_is_escaped() {
        let xml = render(|s| {
            s.start_element("Note", None)?;
            s.value("A & B <C>")?;
            s.end_element()
        });
        assert!(xml.contains("A &amp; B &lt;C&gt;"));
    }

    #[test]
    fn attribute_after_content_is_rejected() {
        let mut sink = QuickXmlSink::new(Vec::new(), false).unwrap();
        sink.start_element("a", None).unwrap();
        sink.value("x").unwrap();
        assert!(sink.attribute("k", "v").is_err());
    }

    #[test]
    fn unclosed_element_detected() {
        let mut sink = QuickXmlSink::new(Vec::new(), false).unwrap();
        sink.start_element("a", None).unwrap();
        assert!(sink.into_inner().is_err());
    }

    #[test]
    fn comments_that_would_break_the_document_are_rejected() {
        let mut sink = QuickXmlSink::new(Vec::new(), false).unwrap();
        assert!(sink.comment("a -- b").is_err());
        assert!(sink.comment("ends-").is_err());
        sink.comment("a - b").unwrap();
    }

    #[test]
    fn format_decimal_cases() {
        assert_eq!(format_decimal(dec!(100)), "100.00");
        assert_eq!(format_decimal(dec!(1500.0)), "1500.00");
        assert_eq!(format_decimal(dec!(49.90)), "49.90");
        assert_eq!(format_decimal(dec!(0.005)), "0.005");
        assert_eq!(format_decimal(dec!(19)), "19.00");
    }
}
