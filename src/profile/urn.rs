use std::collections::HashMap;
use std::sync::LazyLock;

use chrono::NaiveDate;

use super::{FormatVersion, Profile};
use crate::core::InvoiceError;

/// From this date on the latest version writes the XRechnung 3.0 identifier.
pub const XRECHNUNG_3_CUTOVER: NaiveDate = match NaiveDate::from_ymd_opt(2024, 2, 1) {
    Some(d) => d,
    None => panic!("invalid cutover date"),
};

const XRECHNUNG_2_3: &str =
    "urn:cen.eu:en16931:2017#compliant#urn:xoev-de:kosit:standard:xrechnung_2.3";
const XRECHNUNG_3_0: &str = "urn:cen.eu:en16931:2017#compliant#urn:xeinkauf.de:kosit:xrechnung_3.0";

use FormatVersion::*;

/// Every (version, profile, URN) triple the writers emit. The latest
/// version's XRechnung row holds the post-cutover identifier; the pre-cutover
/// one is resolved in [`urn_from_profile`].
const URN_TABLE: &[(FormatVersion, Profile, &str)] = &[
    (Version1, Profile::BASIC, "urn:ferd:CrossIndustryDocument:invoice:1p0:basic"),
    (Version1, Profile::COMFORT, "urn:ferd:CrossIndustryDocument:invoice:1p0:comfort"),
    (Version1, Profile::EXTENDED, "urn:ferd:CrossIndustryDocument:invoice:1p0:extended"),
    (Version20, Profile::MINIMUM, "urn:zugferd.de:2p0:minimum"),
    (Version20, Profile::BASIC_WL, "urn:zugferd.de:2p0:basicwl"),
    (Version20, Profile::BASIC, "urn:cen.eu:en16931:2017#compliant#urn:zugferd.de:2p0:basic"),
    (Version20, Profile::COMFORT, "urn:cen.eu:en16931:2017"),
    (Version20, Profile::EXTENDED, "urn:cen.eu:en16931:2017#conformant#urn:zugferd.de:2p0:extended"),
    (Version20, Profile::XRECHNUNG1, "urn:cen.eu:en16931:2017#compliant#urn:xoev-de:kosit:standard:xrechnung_1.2"),
    (Version20, Profile::XRECHNUNG, "urn:cen.eu:en16931:2017#compliant#urn:xoev-de:kosit:standard:xrechnung_2.0"),
    (Version21, Profile::MINIMUM, "urn:factur-x.eu:1p0:minimum"),
    (Version21, Profile::BASIC_WL, "urn:factur-x.eu:1p0:basicwl"),
    (Version21, Profile::BASIC, "urn:cen.eu:en16931:2017#compliant#urn:factur-x.eu:1p0:basic"),
    (Version21, Profile::COMFORT, "urn:cen.eu:en16931:2017"),
    (Version21, Profile::EXTENDED, "urn:cen.eu:en16931:2017#conformant#urn:factur-x.eu:1p0:extended"),
    (Version21, Profile::XRECHNUNG1, "urn:cen.eu:en16931:2017#compliant#urn:xoev-de:kosit:standard:xrechnung_1.2"),
    (Version21, Profile::XRECHNUNG, "urn:cen.eu:en16931:2017#compliant#urn:xoev-de:kosit:standard:xrechnung_2.1"),
    (Version22, Profile::MINIMUM, "urn:factur-x.eu:1p0:minimum"),
    (Version22, Profile::BASIC_WL, "urn:factur-x.eu:1p0:basicwl"),
    (Version22, Profile::BASIC, "urn:cen.eu:en16931:2017#compliant#urn:factur-x.eu:1p0:basic"),
    (Version22, Profile::COMFORT, "urn:cen.eu:en16931:2017"),
    (Version22, Profile::EXTENDED, "urn:cen.eu:en16931:2017#conformant#urn:factur-x.eu:1p0:extended"),
    (Version22, Profile::XRECHNUNG1, "urn:cen.eu:en16931:2017#compliant#urn:xoev-de:kosit:standard:xrechnung_1.2"),
    (Version22, Profile::XRECHNUNG, "urn:cen.eu:en16931:2017#compliant#urn:xoev-de:kosit:standard:xrechnung_2.2"),
    (Version22, Profile::EREPORTING, "urn.cpro.gouv.fr:1p0:ereporting"),
    (Version23, Profile::MINIMUM, "urn:factur-x.eu:1p0:minimum"),
    (Version23, Profile::BASIC_WL, "urn:factur-x.eu:1p0:basicwl"),
    (Version23, Profile::BASIC, "urn:cen.eu:en16931:2017#compliant#urn:factur-x.eu:1p0:basic"),
    (Version23, Profile::COMFORT, "urn:cen.eu:en16931:2017"),
    (Version23, Profile::EXTENDED, "urn:cen.eu:en16931:2017#conformant#urn:factur-x.eu:1p0:extended"),
    (Version23, Profile::XRECHNUNG1, "urn:cen.eu:en16931:2017#compliant#urn:xoev-de:kosit:standard:xrechnung_1.2"),
    (Version23, Profile::XRECHNUNG, XRECHNUNG_3_0),
    (Version23, Profile::EREPORTING, "urn.cpro.gouv.fr:1p0:ereporting"),
];

/// Reverse index over [`URN_TABLE`] plus the pre-cutover XRechnung identifier.
static PROFILE_BY_URN: LazyLock<HashMap<&'static str, Profile>> = LazyLock::new(|| {
    let mut map: HashMap<&'static str, Profile> = URN_TABLE
        .iter()
        .map(|(_, profile, urn)| (*urn, *profile))
        .collect();
    map.insert(XRECHNUNG_2_3, Profile::XRECHNUNG);
    map
});

/// Look up the profile identified by a guideline URN.
///
/// URNs are unique across versions, so `version` does not influence the
/// result. Unrecognised input yields [`Profile::UNKNOWN`].
pub fn profile_from_urn(_version: FormatVersion, urn: &str) -> Profile {
    PROFILE_BY_URN
        .get(urn.trim())
        .copied()
        .unwrap_or(Profile::UNKNOWN)
}

/// Newest format version whose table defines `urn`.
///
/// Several versions share identifiers (Factur-X 1.0 spans 2.1 to 2.3), so
/// this is the best guess a reader can make from the URN alone.
pub fn version_from_urn(urn: &str) -> Option<FormatVersion> {
    let urn = urn.trim();
    if urn == XRECHNUNG_2_3 {
        return Some(FormatVersion::LATEST);
    }
    URN_TABLE
        .iter()
        .rev()
        .find(|(_, _, u)| *u == urn)
        .map(|(v, _, _)| *v)
}

/// Canonical URN for `profile` under `version`.
///
/// `today` selects between the XRechnung 2.3 and 3.0 identifiers for the
/// latest version.
pub fn urn_from_profile(
    version: FormatVersion,
    profile: Profile,
    today: NaiveDate,
) -> Result<&'static str, InvoiceError> {
    if version == FormatVersion::LATEST
        && profile == Profile::XRECHNUNG
        && today < XRECHNUNG_3_CUTOVER
    {
        return Ok(XRECHNUNG_2_3);
    }

    URN_TABLE
        .iter()
        .find(|(v, p, _)| *v == version && *p == profile)
        .map(|(_, _, urn)| *urn)
        .ok_or(InvoiceError::UnsupportedProfileForVersion { profile, version })
}
