//! Invoice profiles, format versions and their URN identifiers.
//!
//! # Profiles
//!
//! | Profile | Use case |
//! |---------|----------|
//! | Minimum | Minimal machine-readable data |
//! | BasicWL | Basic without line items |
//! | Basic | Line items without full EN 16931 |
//! | Comfort | Full European norm (EN 16931) |
//! | Extended | Beyond EN 16931 |
//! | XRechnung / XRechnung1 | German public sector |
//! | EReporting | French e-reporting |
//!
//! A [`Profile`] is a bit set, so a writer can annotate an element with every
//! profile that may carry it and test the active profile against that gate.

mod urn;

use serde::{Deserialize, Serialize};

pub use urn::{XRECHNUNG_3_CUTOVER, profile_from_urn, urn_from_profile, version_from_urn};

bitflags::bitflags! {
    /// Set of invoice profiles.
    ///
    /// A document has exactly one profile; unions are used as gates on
    /// individual write calls. [`Profile::UNKNOWN`] is the empty set and is
    /// never combined with other flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct Profile: u16 {
        const MINIMUM = 1;
        const BASIC = 1 << 1;
        const COMFORT = 1 << 2;
        const EXTENDED = 1 << 3;
        const XRECHNUNG1 = 1 << 4;
        const XRECHNUNG = 1 << 5;
        const BASIC_WL = 1 << 6;
        const EREPORTING = 1 << 7;
    }
}

impl Profile {
    /// No profile could be determined. Also used as "no restriction" gate.
    pub const UNKNOWN: Self = Self::empty();

    /// Gate for content every profile carries.
    pub const ANY: Self = Self::all();

    pub const BASIC_WL_AND_UP: Self = Self::BASIC_WL
        .union(Self::BASIC)
        .union(Self::COMFORT)
        .union(Self::EXTENDED)
        .union(Self::XRECHNUNG1)
        .union(Self::XRECHNUNG);

    pub const BASIC_AND_UP: Self = Self::BASIC
        .union(Self::COMFORT)
        .union(Self::EXTENDED)
        .union(Self::XRECHNUNG1)
        .union(Self::XRECHNUNG);

    pub const COMFORT_AND_UP: Self = Self::COMFORT
        .union(Self::EXTENDED)
        .union(Self::XRECHNUNG1)
        .union(Self::XRECHNUNG);

    pub const XRECHNUNG_ANY: Self = Self::XRECHNUNG.union(Self::XRECHNUNG1);

    /// Whether `gate` admits content for `self` as the active profile.
    ///
    /// An empty gate admits everything. Otherwise every bit of the active
    /// profile must be present in the gate.
    pub fn is_admitted_by(self, gate: Profile) -> bool {
        gate.is_empty() || gate.contains(self)
    }

    /// Display name used in the XMP `fx:ConformanceLevel` metadata.
    pub fn xmp_display_name(self) -> &'static str {
        if self == Self::MINIMUM {
            "MINIMUM"
        } else if self == Self::BASIC_WL {
            "BASIC WL"
        } else if self == Self::BASIC {
            "BASIC"
        } else if self == Self::COMFORT || self == Self::XRECHNUNG || self == Self::XRECHNUNG1 {
            "EN 16931"
        } else if self == Self::EXTENDED {
            "EXTENDED"
        } else if self == Self::EREPORTING {
            "EREPORTING"
        } else {
            "UNKNOWN"
        }
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return f.write_str("Unknown");
        }
        let names: Vec<&str> = self.iter_names().map(|(name, _)| name).collect();
        f.write_str(&names.join(" | "))
    }
}

/// ZUGFeRD / Factur-X format version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FormatVersion {
    /// ZUGFeRD 1.0 (`CrossIndustryDocument`).
    Version1,
    /// ZUGFeRD 2.0.
    Version20,
    /// ZUGFeRD 2.1 / Factur-X 1.0 (withdrawn).
    Version21,
    /// ZUGFeRD 2.2.
    Version22,
    /// ZUGFeRD 2.3.
    Version23,
}

impl FormatVersion {
    pub const LATEST: Self = Self::Version23;

    /// Whether the version uses the `CrossIndustryInvoice:100` vocabulary.
    pub fn is_cii_100(self) -> bool {
        self >= Self::Version20
    }
}

impl std::fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Version1 => "ZUGFeRD 1.0",
            Self::Version20 => "ZUGFeRD 2.0",
            Self::Version21 => "ZUGFeRD 2.1",
            Self::Version22 => "ZUGFeRD 2.2",
            Self::Version23 => "ZUGFeRD 2.3",
        })
    }
}

/// XML syntax of the serialized invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Format {
    /// UN/CEFACT Cross Industry Invoice.
    Cii,
    /// OASIS Universal Business Language 2.1.
    Ubl,
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Cii => "CII",
            Self::Ubl => "UBL",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_gate_admits_everything() {
        for p in Profile::all().iter() {
            assert!(p.is_admitted_by(Profile::UNKNOWN));
        }
    }

    #[test]
    fn gate_requires_every_active_bit() {
        assert!(Profile::COMFORT.is_admitted_by(Profile::COMFORT_AND_UP));
        assert!(!Profile::BASIC.is_admitted_by(Profile::COMFORT_AND_UP));
        let active = Profile::COMFORT | Profile::EXTENDED;
        assert!(!active.is_admitted_by(Profile::COMFORT));
        assert!(active.is_admitted_by(Profile::COMFORT_AND_UP));
    }

    #[test]
    fn xmp_names() {
        assert_eq!(Profile::BASIC_WL.xmp_display_name(), "BASIC WL");
        assert_eq!(Profile::COMFORT.xmp_display_name(), "EN 16931");
        assert_eq!(Profile::XRECHNUNG.xmp_display_name(), "EN 16931");
        assert_eq!(Profile::XRECHNUNG1.xmp_display_name(), "EN 16931");
        assert_eq!(Profile::EXTENDED.xmp_display_name(), "EXTENDED");
        assert_eq!(Profile::MINIMUM.xmp_display_name(), "MINIMUM");
    }

    #[test]
    fn display_lists_flag_names() {
        assert_eq!(Profile::UNKNOWN.to_string(), "Unknown");
        assert_eq!(Profile::XRECHNUNG.to_string(), "XRECHNUNG");
        assert_eq!(
            (Profile::BASIC | Profile::COMFORT).to_string(),
            "BASIC | COMFORT"
        );
    }

    #[test]
    fn versions_are_ordered() {
        assert!(FormatVersion::Version1 < FormatVersion::Version20);
        assert!(FormatVersion::Version22 < FormatVersion::LATEST);
        assert!(!FormatVersion::Version1.is_cii_100());
        assert!(FormatVersion::Version21.is_cii_100());
    }
}
