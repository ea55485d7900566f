//! Lightweight header reader for CII (1.0 and 2.x) and UBL documents.
//!
//! Reads just enough to route a document: syntax, version, profile and the
//! key header fields. Line items and parties are not parsed.

use chrono::NaiveDateTime;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::core::{InvoiceError, InvoiceTypeCode};
use crate::date::parse_date;
use crate::profile::{Format, FormatVersion, Profile, profile_from_urn, version_from_urn};

/// Header fields of a serialized invoice.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentHeader {
    pub format: Format,
    /// `Version1` for `CrossIndustryDocument`; otherwise guessed from the
    /// guideline URN, falling back to [`FormatVersion::LATEST`].
    pub version: FormatVersion,
    /// [`Profile::UNKNOWN`] when the guideline URN is not recognised.
    pub profile: Profile,
    pub guideline_urn: Option<String>,
    pub number: Option<String>,
    /// `None` for codes outside UNTDID 1001 as modelled here.
    pub type_code: Option<InvoiceTypeCode>,
    pub currency: Option<String>,
    pub issue_date: Option<NaiveDateTime>,
    pub due_date: Option<NaiveDateTime>,
}

fn xml_err(e: impl std::fmt::Display) -> InvoiceError {
    InvoiceError::Xml(format!("XML parse error: {e}"))
}

fn local_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

#[derive(Default)]
struct HeaderParsed {
    root: Option<(Format, bool)>,
    urn: Option<String>,
    number: Option<String>,
    type_code: Option<String>,
    currency: Option<String>,
    issue_date: Option<NaiveDateTime>,
    due_date: Option<NaiveDateTime>,
    /// `format` attribute of the innermost `DateTimeString`.
    date_format: Option<String>,
}

/// Read the header of a CII or UBL invoice.
///
/// Dates are decoded with [`parse_date`], honouring the `format` attribute of
/// CII `DateTimeString` elements, so malformed fixed-width dates are errors.
pub fn read_header(xml: &str) -> Result<DocumentHeader, InvoiceError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut p = HeaderParsed::default();
    let mut path: Vec<String> = Vec::new();

    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Start(ref e) => {
                let name = local_name(e);
                if path.is_empty() {
                    p.root = Some(root_format(&name)?);
                }
                if name == "DateTimeString" {
                    p.date_format = e
                        .try_get_attribute("format")
                        .map_err(xml_err)?
                        .map(|a| String::from_utf8_lossy(&a.value).into_owned());
                }
                path.push(name);
            }
            Event::Empty(ref e) => {
                if path.is_empty() {
                    p.root = Some(root_format(&local_name(e))?);
                }
            }
            Event::Text(ref e) => {
                let text = e.unescape().map_err(xml_err)?;
                if !text.is_empty() {
                    p.handle_text(&path, &text)?;
                }
            }
            Event::End(_) => {
                path.pop();
            }
            Event::Eof => break,
            _ => {}
        }
    }

    let (format, is_cii1) = p
        .root
        .ok_or_else(|| InvoiceError::Xml("document has no root element".into()))?;
    let urn = p.urn;
    let version = if is_cii1 {
        FormatVersion::Version1
    } else {
        urn.as_deref()
            .and_then(version_from_urn)
            .filter(|v| v.is_cii_100())
            .unwrap_or(FormatVersion::LATEST)
    };
    let profile = urn
        .as_deref()
        .map_or(Profile::UNKNOWN, |u| profile_from_urn(version, u));

    Ok(DocumentHeader {
        format,
        version,
        profile,
        guideline_urn: urn,
        number: p.number,
        type_code: p
            .type_code
            .and_then(|c| c.trim().parse().ok())
            .and_then(InvoiceTypeCode::from_code),
        currency: p.currency,
        issue_date: p.issue_date,
        due_date: p.due_date,
    })
}

/// Map a root element's local name to its syntax; the flag marks ZUGFeRD 1.0.
fn root_format(name: &str) -> Result<(Format, bool), InvoiceError> {
    match name {
        "CrossIndustryDocument" => Ok((Format::Cii, true)),
        "CrossIndustryInvoice" => Ok((Format::Cii, false)),
        "Invoice" | "CreditNote" => Ok((Format::Ubl, false)),
        other => Err(InvoiceError::Xml(format!("unrecognised root element <{other}>"))),
    }
}

impl HeaderParsed {
    fn handle_text(&mut self, path: &[String], text: &str) -> Result<(), InvoiceError> {
        let path: Vec<&str> = path.iter().map(String::as_str).collect();

        match path.as_slice() {
            // CII 2.x and 1.0 context
            [
                _,
                "ExchangedDocumentContext" | "SpecifiedExchangedDocumentContext",
                "GuidelineSpecifiedDocumentContextParameter",
                "ID",
            ] => self.urn = Some(text.to_string()),
            [_, "ExchangedDocument" | "HeaderExchangedDocument", "ID"] => {
                self.number = Some(text.to_string())
            }
            [_, "ExchangedDocument" | "HeaderExchangedDocument", "TypeCode"] => {
                self.type_code = Some(text.to_string())
            }
            [
                _,
                "ExchangedDocument" | "HeaderExchangedDocument",
                "IssueDateTime",
                "DateTimeString",
            ] => self.issue_date = parse_date(text, self.date_format.as_deref())?,
            [.., "InvoiceCurrencyCode"] if self.currency.is_none() => {
                self.currency = Some(text.to_string())
            }
            [.., "SpecifiedTradePaymentTerms", "DueDateDateTime", "DateTimeString"]
                if self.due_date.is_none() =>
            {
                self.due_date = parse_date(text, self.date_format.as_deref())?
            }

            // UBL
            [_, "CustomizationID"] => self.urn = Some(text.to_string()),
            [_, "ID"] => self.number = Some(text.to_string()),
            [_, "InvoiceTypeCode" | "CreditNoteTypeCode"] => {
                self.type_code = Some(text.to_string())
            }
            [_, "IssueDate"] => self.issue_date = parse_date(text, None)?,
            [_, "DocumentCurrencyCode"] => self.currency = Some(text.to_string()),
            [_, "DueDate"] | [_, "PaymentMeans", "PaymentDueDate"] => {
                self.due_date = parse_date(text, None)?
            }
            _ => {}
        }
        Ok(())
    }
}
