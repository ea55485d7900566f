#![cfg(feature = "core")]

use chrono::NaiveDate;
use rust_decimal_macros::dec;
use zugferd_codec::core::*;
use zugferd_codec::profile::{FormatVersion, Profile, profile_from_urn, urn_from_profile};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn seller() -> Party {
    PartyBuilder::new(
        "ACME GmbH",
        AddressBuilder::new("Berlin", "10115", "DE").build(),
    )
    .vat_id("DE123456789")
    .build()
}

// ---------------------------------------------------------------------------
// Builder + totals
// ---------------------------------------------------------------------------

#[test]
fn mixed_rates_split_into_breakdown_groups() {
    let invoice = InvoiceBuilder::new("RE-1", date(2024, 6, 15))
        .seller(seller())
        .add_line(LineItemBuilder::new("1", "Software", dec!(1), "C62", dec!(1000)).build())
        .add_line(
            LineItemBuilder::new("2", "Fachbuch", dec!(3), "C62", dec!(20))
                .tax(TaxCategory::StandardRate, dec!(7))
                .build(),
        )
        .add_line(
            LineItemBuilder::new("3", "Export", dec!(1), "C62", dec!(500))
                .tax(TaxCategory::Export, dec!(0))
                .build(),
        )
        .prepaid(dec!(200))
        .build()
        .unwrap();

    let totals = invoice.totals.as_ref().unwrap();
    assert_eq!(totals.line_net_total, dec!(1560));
    assert_eq!(totals.vat_breakdown.len(), 3);
    assert_eq!(totals.vat_total, dec!(194.20));
    assert_eq!(totals.gross_total, dec!(1754.20));
    assert_eq!(totals.amount_due, dec!(1554.20));

    let export = totals
        .vat_breakdown
        .iter()
        .find(|b| b.category == TaxCategory::Export)
        .unwrap();
    assert!(export.exemption_reason_code.is_some());
    assert!(validate_arithmetic(&invoice).is_empty());
}

#[test]
fn charges_raise_net_total() {
    let invoice = InvoiceBuilder::new("RE-2", date(2024, 6, 15))
        .add_line(LineItemBuilder::new("1", "Ware", dec!(2), "C62", dec!(50)).build())
        .add_charge(AllowanceCharge {
            is_charge: true,
            amount: dec!(10),
            percentage: None,
            base_amount: None,
            tax_category: TaxCategory::StandardRate,
            tax_rate: dec!(19),
            reason: Some("Versand".into()),
            reason_code: Some("DL".into()),
        })
        .build()
        .unwrap();
    let totals = invoice.totals.unwrap();
    assert_eq!(totals.charges_total, dec!(10));
    assert_eq!(totals.net_total, dec!(110));
    assert_eq!(totals.vat_total, dec!(20.90));
}

#[test]
fn builder_rejects_invalid_input() {
    assert!(matches!(
        InvoiceBuilder::new("  ", date(2024, 1, 1)).build(),
        Err(InvoiceError::Builder(_))
    ));
    assert!(
        InvoiceBuilder::new("RE-3", date(2024, 1, 1))
            .invoicing_period(date(2024, 2, 1), date(2024, 1, 1))
            .build()
            .is_err()
    );
}

#[test]
fn tampered_amount_due_reported() {
    let mut invoice = InvoiceBuilder::new("RE-4", date(2024, 6, 15))
        .add_line(LineItemBuilder::new("1", "Ware", dec!(1), "C62", dec!(100)).build())
        .build()
        .unwrap();
    if let Some(t) = invoice.totals.as_mut() {
        t.amount_due = dec!(1);
    }
    let errors = validate_arithmetic(&invoice);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].rule.as_deref(), Some("BR-CO-16"));
}

#[test]
fn type_codes_round_trip() {
    for code in [380u16, 381, 383, 384, 386, 389, 261, 326, 875, 876, 877] {
        assert_eq!(InvoiceTypeCode::from_code(code).unwrap().code(), code);
    }
    assert!(InvoiceTypeCode::from_code(999).is_none());
    assert!(InvoiceTypeCode::SelfBilledCreditNote.is_credit_note());
}

// ---------------------------------------------------------------------------
// Profiles and URNs
// ---------------------------------------------------------------------------

#[test]
fn comfort_urn_is_stable_across_2x() {
    let today = date(2025, 1, 1);
    for version in [
        FormatVersion::Version20,
        FormatVersion::Version21,
        FormatVersion::Version22,
        FormatVersion::Version23,
    ] {
        let urn = urn_from_profile(version, Profile::COMFORT, today).unwrap();
        assert_eq!(urn, "urn:cen.eu:en16931:2017");
        assert_eq!(profile_from_urn(version, urn), Profile::COMFORT);
    }
}

#[test]
fn ereporting_only_from_2_2() {
    let today = date(2025, 1, 1);
    assert!(urn_from_profile(FormatVersion::Version21, Profile::EREPORTING, today).is_err());
    assert_eq!(
        urn_from_profile(FormatVersion::Version22, Profile::EREPORTING, today).unwrap(),
        "urn.cpro.gouv.fr:1p0:ereporting"
    );
}

#[test]
fn surrounding_whitespace_in_urn_is_ignored() {
    assert_eq!(
        profile_from_urn(FormatVersion::LATEST, "  urn:factur-x.eu:1p0:basicwl\n"),
        Profile::BASIC_WL
    );
}
