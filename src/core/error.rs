use thiserror::Error;

use super::types::{InvoiceTypeCode, TaxType};
use crate::profile::{Format, FormatVersion, Profile};

/// Errors that can occur while building, validating or serializing an invoice.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InvoiceError {
    /// A date or numeric field did not match its declared format.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// A date string without format code had a length no known encoding uses.
    #[error("unsupported date format: {0:?}")]
    UnsupportedFormat(String),

    /// The profile has no URN under the requested format version.
    #[error("profile {profile} is not defined for {version}")]
    UnsupportedProfileForVersion {
        profile: Profile,
        version: FormatVersion,
    },

    /// No writer exists for this format/version/profile combination.
    #[error("no {format} writer for profile {profile} under {version}")]
    UnsupportedCombination {
        format: Format,
        version: FormatVersion,
        profile: Profile,
    },

    /// The profile is never a legal output profile for the chosen writer.
    #[error("profile {0} cannot be used for output")]
    UnsupportedProfile(Profile),

    /// Only the Extended profile allows tax types other than VAT.
    #[error("line {line_id}: tax type {tax_type} requires the Extended profile")]
    UnsupportedTaxType { line_id: String, tax_type: TaxType },

    /// A field required by the output profile is missing or blank.
    #[error("[{rule}] {term}: {message}")]
    MissingRequiredField {
        /// Business rule id (e.g. "BR-DE-7").
        rule: &'static str,
        /// EN 16931 business term or group (e.g. "BT-43").
        term: &'static str,
        message: &'static str,
    },

    /// The invoice type code is not allowed for the output profile.
    #[error("[BR-DE-17] invoice type code {} is not allowed for XRechnung", .0.code())]
    UnsupportedInvoiceType(InvoiceTypeCode),

    /// An element was closed that was never opened.
    #[error("unbalanced element: {0}")]
    UnbalancedElement(&'static str),

    /// Builder encountered invalid or missing configuration.
    #[error("builder error: {0}")]
    Builder(String),

    /// XML generation or parsing error.
    #[error("XML error: {0}")]
    Xml(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A single validation error with field path and message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dot-separated path to the invalid field (e.g. "totals.net_total").
    pub field: String,
    /// Human-readable error description.
    pub message: String,
    /// EN 16931 business rule ID if applicable (e.g. "BR-CO-10").
    pub rule: Option<String>,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.rule {
            Some(rule) => write!(f, "[{}] {}: {}", rule, self.field, self.message),
            None => write!(f, "{}: {}", self.field, self.message),
        }
    }
}

impl ValidationError {
    /// Create a validation error without a rule ID.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            rule: None,
        }
    }

    /// Create a validation error with an EN 16931 rule ID.
    pub fn with_rule(
        field: impl Into<String>,
        message: impl Into<String>,
        rule: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            rule: Some(rule.into()),
        }
    }
}
