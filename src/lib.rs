//! # zugferd-codec
//!
//! Invoice model and profile-aware XML writers for ZUGFeRD 1.0 / 2.x,
//! Factur-X and XRechnung.
//!
//! All monetary values use [`rust_decimal::Decimal`]; never floating point.
//! A single tree walk per syntax serves every profile: the
//! [`xml::ProfileAwareXmlWriter`] drops whatever the active profile may not
//! carry.
//!
//! ## Quick Start
//!
//! ```rust
//! # #[cfg(feature = "xml")] {
//! use chrono::NaiveDate;
//! use rust_decimal_macros::dec;
//! use zugferd_codec::core::*;
//! use zugferd_codec::profile::{FormatVersion, Profile};
//! use zugferd_codec::xml::{self, SaveOptions};
//!
//! let invoice = InvoiceBuilder::new("RE-2024-001", NaiveDate::from_ymd_opt(2024, 6, 15).unwrap())
//!     .profile(Profile::BASIC)
//!     .seller(PartyBuilder::new("ACME GmbH", AddressBuilder::new("Berlin", "10115", "DE").build())
//!         .vat_id("DE123456789").build())
//!     .buyer(PartyBuilder::new("Kunde AG", AddressBuilder::new("München", "80331", "DE").build()).build())
//!     .add_line(LineItemBuilder::new("1", "Beratung", dec!(10), "HUR", dec!(150))
//!         .tax(TaxCategory::StandardRate, dec!(19)).build())
//!     .build()
//!     .unwrap();
//!
//! let options = SaveOptions::new().with_version(FormatVersion::Version22);
//! let xml = xml::save_to_string(&invoice, &options).unwrap().unwrap();
//! assert!(xml.contains("urn:factur-x.eu:1p0:basic"));
//! assert_eq!(invoice.totals.unwrap().gross_total, dec!(1785.00));
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `core` (default) | Invoice types, builders, arithmetic, profiles, date codec |
//! | `xml` (default) | CII / UBL writers, validation, header reader |
//! | `all` | Everything |

#[cfg(feature = "core")]
pub mod core;

#[cfg(feature = "core")]
pub mod date;

#[cfg(feature = "core")]
pub mod profile;

#[cfg(feature = "xml")]
pub mod xml;

// Re-export core types at crate root for convenience
#[cfg(feature = "core")]
pub use crate::core::*;
