//! ZUGFeRD / Factur-X / XRechnung XML serialization.
//!
//! # Supported combinations
//!
//! | Format | Versions | Profiles |
//! |--------|----------|----------|
//! | CII `CrossIndustryDocument` | 1.0 | Basic, Comfort, Extended |
//! | CII `CrossIndustryInvoice` | 2.0 – 2.3 | every profile with a URN for the version |
//! | UBL 2.1 Invoice / CreditNote | 2.2, 2.3 | XRechnung |
//!
//! # Example
//!
//! ```no_run
//! use zugferd_codec::core::*;
//! use zugferd_codec::profile::{Format, FormatVersion, Profile};
//! use zugferd_codec::xml::{self, SaveOptions};
//!
//! let invoice: Invoice = todo!(); // build via InvoiceBuilder
//! let options = SaveOptions::new()
//!     .with_format(Format::Cii)
//!     .with_version(FormatVersion::Version23)
//!     .with_profile(Profile::EXTENDED);
//! let xml = xml::save_to_string(&invoice, &options).unwrap();
//! ```

mod cii;
mod cii1;
mod reader;
mod sink;
mod ubl;
mod validate;
mod writer;

use std::io::Write;

use chrono::{Local, NaiveDate};

use crate::core::{Invoice, InvoiceError};
use crate::profile::{Format, FormatVersion, Profile, urn_from_profile};

pub use reader::{DocumentHeader, read_header};
pub use sink::{QuickXmlSink, XmlSink, format_decimal};
pub use validate::validate;
pub use writer::ProfileAwareXmlWriter;

/// Peppol BIS Billing 3.0 business process identifier (BT-23).
pub const PEPPOL_PROFILE_ID: &str = "urn:fdc:peppol.eu:2017:poacc:billing:01:1.0";

/// UBL 2.1 namespace URIs.
pub mod ubl_ns {
    pub const INVOICE: &str = "urn:oasis:names:specification:ubl:schema:xsd:Invoice-2";
    pub const CREDIT_NOTE: &str = "urn:oasis:names:specification:ubl:schema:xsd:CreditNote-2";
    pub const CAC: &str =
        "urn:oasis:names:specification:ubl:schema:xsd:CommonAggregateComponents-2";
    pub const CBC: &str = "urn:oasis:names:specification:ubl:schema:xsd:CommonBasicComponents-2";
}

/// CII D16B namespace URIs (ZUGFeRD 2.x).
pub mod cii_ns {
    pub const RSM: &str = "urn:un:unece:uncefact:data:standard:CrossIndustryInvoice:100";
    pub const RAM: &str =
        "urn:un:unece:uncefact:data:standard:ReusableAggregateBusinessInformationEntity:100";
    pub const QDT: &str = "urn:un:unece:uncefact:data:standard:QualifiedDataType:100";
    pub const UDT: &str = "urn:un:unece:uncefact:data:standard:UnqualifiedDataType:100";
}

/// ZUGFeRD 1.0 namespace URIs.
pub mod cii1_ns {
    pub const RSM: &str = "urn:ferd:CrossIndustryDocument:invoice:1p0";
    pub const RAM: &str =
        "urn:un:unece:uncefact:data:standard:ReusableAggregateBusinessInformationEntity:12";
    pub const UDT: &str = "urn:un:unece:uncefact:data:standard:UnqualifiedDataType:15";
}

/// Options for [`save`] and [`save_to_string`].
#[derive(Debug, Clone)]
pub struct SaveOptions {
    pub format: Format,
    pub version: FormatVersion,
    /// Output profile; `None` uses the invoice's own profile.
    pub profile: Option<Profile>,
    /// Fail on validation errors instead of skipping the write.
    pub strict: bool,
    /// Indent the output with two spaces.
    pub indent: bool,
    /// Comments written between the XML declaration and the root element.
    pub header_comments: Vec<String>,
    /// Date that selects the XRechnung identifier; `None` means today.
    pub reference_date: Option<NaiveDate>,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            format: Format::Cii,
            version: FormatVersion::LATEST,
            profile: None,
            strict: true,
            indent: true,
            header_comments: Vec::new(),
            reference_date: None,
        }
    }
}

impl SaveOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    pub fn with_version(mut self, version: FormatVersion) -> Self {
        self.version = version;
        self
    }

    /// Write with `profile` instead of the invoice's profile.
    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.profile = Some(profile);
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_indent(mut self, indent: bool) -> Self {
        self.indent = indent;
        self
    }

    pub fn with_header_comment(mut self, comment: impl Into<String>) -> Self {
        self.header_comments.push(comment.into());
        self
    }

    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = Some(date);
        self
    }
}

/// Serialize `invoice` to `sink`.
///
/// Every precondition (writer selection, URN lookup, validation) is checked
/// and the document fully rendered before the first byte reaches `sink`.
/// Returns `Ok(false)` if non-strict validation failed and nothing was written.
pub fn save<W: Write>(
    invoice: &Invoice,
    mut sink: W,
    options: &SaveOptions,
) -> Result<bool, InvoiceError> {
    match render(invoice, options)? {
        Some(bytes) => {
            sink.write_all(&bytes)?;
            sink.flush()?;
            Ok(true)
        }
        None => Ok(false),
    }
}

/// [`save`] into a `String`; `None` if non-strict validation failed.
pub fn save_to_string(
    invoice: &Invoice,
    options: &SaveOptions,
) -> Result<Option<String>, InvoiceError> {
    render(invoice, options)?
        .map(|bytes| String::from_utf8(bytes).map_err(|e| InvoiceError::Xml(e.to_string())))
        .transpose()
}

#[derive(Debug, Clone, Copy)]
enum Target {
    Cii1,
    Cii,
    Ubl,
}

fn select_target(
    format: Format,
    version: FormatVersion,
    profile: Profile,
) -> Result<Target, InvoiceError> {
    match (format, version) {
        (Format::Cii, FormatVersion::Version1) => Ok(Target::Cii1),
        (Format::Cii, _) => Ok(Target::Cii),
        (Format::Ubl, FormatVersion::Version22 | FormatVersion::Version23)
            if profile == Profile::XRECHNUNG =>
        {
            Ok(Target::Ubl)
        }
        _ => Err(InvoiceError::UnsupportedCombination {
            format,
            version,
            profile,
        }),
    }
}

fn render(invoice: &Invoice, options: &SaveOptions) -> Result<Option<Vec<u8>>, InvoiceError> {
    for comment in &options.header_comments {
        sink::check_comment(comment)?;
    }
    let profile = options.profile.unwrap_or(invoice.profile);
    let target = select_target(options.format, options.version, profile)?;
    let today = options
        .reference_date
        .unwrap_or_else(|| Local::now().date_naive());
    let urn = urn_from_profile(options.version, profile, today)?;

    if !validate(invoice, profile, options.format, options.strict)? {
        tracing::warn!(
            invoice = %invoice.number,
            %profile,
            format = %options.format,
            "validation failed, document not written"
        );
        return Ok(None);
    }

    tracing::debug!(
        invoice = %invoice.number,
        ?target,
        %profile,
        version = %options.version,
        urn,
        "writing invoice"
    );

    let sink = QuickXmlSink::new(Vec::new(), options.indent)?;
    let mut w = ProfileAwareXmlWriter::new(sink, profile);
    for comment in &options.header_comments {
        w.comment(comment)?;
    }
    match target {
        Target::Cii1 => cii1::write_cii1(&mut w, invoice, urn)?,
        Target::Cii => cii::write_cii(&mut w, invoice, options.version, urn)?,
        Target::Ubl => ubl::write_ubl(&mut w, invoice, urn)?,
    }
    let bytes = w.into_sink()?.into_inner()?;

    tracing::debug!(invoice = %invoice.number, bytes = bytes.len(), "invoice written");
    Ok(Some(bytes))
}
