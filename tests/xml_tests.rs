#![cfg(feature = "xml")]

use chrono::NaiveDate;
use rust_decimal_macros::dec;
use zugferd_codec::core::*;
use zugferd_codec::profile::{Format, FormatVersion, Profile};
use zugferd_codec::xml::{self, SaveOptions};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn seller() -> Party {
    PartyBuilder::new(
        "ACME GmbH",
        AddressBuilder::new("Berlin", "10115", "DE")
            .street("Friedrichstraße 123")
            .build(),
    )
    .vat_id("DE123456789")
    .electronic_address("EM", "billing@acme.de")
    .contact(Contact {
        name: Some("Max Mustermann".into()),
        org_unit: None,
        phone: Some("+49 30 12345678".into()),
        email: Some("max@acme.de".into()),
    })
    .build()
}

fn buyer() -> Party {
    PartyBuilder::new(
        "Kunde AG",
        AddressBuilder::new("München", "80331", "DE")
            .street("Marienplatz 1")
            .build(),
    )
    .build()
}

fn invoice(profile: Profile) -> Invoice {
    InvoiceBuilder::new("RE-2024-001", date(2024, 6, 15))
        .profile(profile)
        .note("Lieferung & Leistung")
        .buyer_reference("04011000-12345-03")
        .order_reference("PO-77")
        .tax_point_date(date(2024, 6, 10))
        .invoicing_period(date(2024, 6, 1), date(2024, 6, 30))
        .seller(seller())
        .buyer(buyer())
        .add_line(
            LineItemBuilder::new("1", "Beratung", dec!(10), "HUR", dec!(150))
                .description("Consulting, June")
                .seller_item_id("CONS-01")
                .build(),
        )
        .add_line(
            LineItemBuilder::new("2", "Schulung", dec!(2), "C62", dec!(50))
                .gross_price(dec!(55))
                .build(),
        )
        .add_allowance(AllowanceCharge {
            is_charge: false,
            amount: dec!(100),
            percentage: None,
            base_amount: None,
            tax_category: TaxCategory::StandardRate,
            tax_rate: dec!(19),
            reason: Some("Treuerabatt".into()),
            reason_code: Some("95".into()),
        })
        .payment_terms("Zahlbar innerhalb 30 Tagen", Some(date(2024, 7, 15)))
        .payment(PaymentInstructions {
            means_code: PaymentMeansCode::SepaCreditTransfer,
            means_text: Some("SEPA".into()),
            remittance_info: Some("RE-2024-001".into()),
            credit_transfer: Some(CreditTransfer {
                iban: "DE89370400440532013000".into(),
                bic: Some("COBADEFFXXX".into()),
                account_name: Some("ACME GmbH".into()),
            }),
        })
        .build()
        .unwrap()
}

fn options(version: FormatVersion) -> SaveOptions {
    SaveOptions::new()
        .with_version(version)
        .with_indent(false)
        .with_reference_date(date(2025, 1, 1))
}

fn cii(profile: Profile, version: FormatVersion) -> String {
    xml::save_to_string(&invoice(profile), &options(version))
        .unwrap()
        .unwrap()
}

// ---------------------------------------------------------------------------
// CII 2.x per profile
// ---------------------------------------------------------------------------

#[test]
fn minimum_keeps_only_header_data() {
    let xml = cii(Profile::MINIMUM, FormatVersion::Version23);
    assert!(xml.contains("<ram:ID>urn:factur-x.eu:1p0:minimum</ram:ID>"));
    assert!(xml.contains("<ram:ID>RE-2024-001</ram:ID>"));
    assert!(xml.contains("<ram:BuyerReference>04011000-12345-03</ram:BuyerReference>"));
    assert!(xml.contains("<ram:CountryID>DE</ram:CountryID>"));
    assert!(xml.contains("<ram:DuePayableAmount>1785.00</ram:DuePayableAmount>"));
    assert!(xml.contains(r#"<ram:TaxTotalAmount currencyID="EUR">285.00</ram:TaxTotalAmount>"#));

    assert!(!xml.contains("IncludedSupplyChainTradeLineItem"));
    assert!(!xml.contains("IncludedNote"));
    assert!(!xml.contains("LineTotalAmount"));
    assert!(!xml.contains("<ram:CityName>"));
    assert!(!xml.contains("SpecifiedTradeSettlementPaymentMeans"));
    assert!(!xml.contains("IBANID"));
}

#[test]
fn basic_wl_under_ubl_is_not_a_writer() {
    let err = xml::save_to_string(
        &invoice(Profile::BASIC_WL),
        &options(FormatVersion::Version23).with_format(Format::Ubl),
    )
    .unwrap_err();
    assert!(matches!(err, InvoiceError::UnsupportedCombination { .. }));
}

#[test]
fn basic_has_lines_without_comfort_details() {
    let xml = cii(Profile::BASIC, FormatVersion::Version22);
    assert!(xml.contains("urn:cen.eu:en16931:2017#compliant#urn:factur-x.eu:1p0:basic"));
    assert_eq!(xml.matches("<ram:IncludedSupplyChainTradeLineItem>").count(), 2);
    assert!(xml.contains(r#"<ram:BilledQuantity unitCode="HUR">10.00</ram:BilledQuantity>"#));
    assert!(xml.contains("<ram:IBANID>DE89370400440532013000</ram:IBANID>"));
    assert!(xml.contains("<ram:Content>Lieferung &amp; Leistung</ram:Content>"));

    assert!(!xml.contains("DefinedTradeContact"));
    assert!(!xml.contains("<ram:Description>"));
    assert!(!xml.contains("SellerAssignedID"));
    assert!(!xml.contains("BICID"));
}

#[test]
fn comfort_adds_contact_and_item_details() {
    let xml = cii(Profile::COMFORT, FormatVersion::Version23);
    assert!(xml.contains("<ram:ID>urn:cen.eu:en16931:2017</ram:ID>"));
    assert!(xml.contains("<ram:PersonName>Max Mustermann</ram:PersonName>"));
    assert!(xml.contains("<ram:Description>Consulting, June</ram:Description>"));
    assert!(xml.contains("<ram:SellerAssignedID>CONS-01</ram:SellerAssignedID>"));
    assert!(xml.contains("<ram:BICID>COBADEFFXXX</ram:BICID>"));
    assert!(!xml.contains("BusinessProcessSpecifiedDocumentContextParameter"));
}

#[test]
fn xrechnung_identifier_follows_reference_date() {
    let inv = invoice(Profile::XRECHNUNG);
    let after = xml::save_to_string(&inv, &options(FormatVersion::Version23))
        .unwrap()
        .unwrap();
    assert!(after.contains("urn:xeinkauf.de:kosit:xrechnung_3.0"));
    assert!(after.contains("<ram:ID>urn:fdc:peppol.eu:2017:poacc:billing:01:1.0</ram:ID>"));

    let before = xml::save_to_string(
        &inv,
        &options(FormatVersion::Version23).with_reference_date(date(2024, 1, 31)),
    )
    .unwrap()
    .unwrap();
    assert!(before.contains("urn:xoev-de:kosit:standard:xrechnung_2.3"));
}

#[test]
fn xrechnung_2_0_has_no_business_process() {
    let xml = cii(Profile::XRECHNUNG, FormatVersion::Version20);
    assert!(xml.contains("xrechnung_2.0"));
    assert!(!xml.contains("BusinessProcessSpecifiedDocumentContextParameter"));
}

#[test]
fn extended_writes_non_vat_tax_type() {
    let mut inv = invoice(Profile::EXTENDED);
    inv.lines[0].tax_type = Some(TaxType::ExciseDuty);
    let xml = xml::save_to_string(&inv, &options(FormatVersion::Version23))
        .unwrap()
        .unwrap();
    assert!(xml.contains("<ram:TypeCode>EXC</ram:TypeCode>"));
}

#[test]
fn namespaces_declared_once() {
    let xml = cii(Profile::EXTENDED, FormatVersion::Version23);
    assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
    assert_eq!(xml.matches("xmlns:rsm=").count(), 1);
    assert_eq!(xml.matches("xmlns:ram=").count(), 1);
}

#[test]
fn header_comments_precede_root() {
    let opts = options(FormatVersion::Version23).with_header_comment("generated by test");
    let xml = xml::save_to_string(&invoice(Profile::COMFORT), &opts)
        .unwrap()
        .unwrap();
    let comment = xml.find("<!--generated by test-->").unwrap();
    let root = xml.find("<rsm:CrossIndustryInvoice").unwrap();
    assert!(comment < root);
}

#[test]
fn malformed_header_comments_rejected_before_output() {
    for comment in ["a -- b", "ends-"] {
        let opts = options(FormatVersion::Version23).with_header_comment(comment);
        let mut out = Vec::new();
        let result = xml::save(&invoice(Profile::COMFORT), &mut out, &opts);
        assert!(matches!(result, Err(InvoiceError::Xml(_))), "{comment:?}");
        assert!(out.is_empty());
    }
}

#[test]
fn profile_override_wins() {
    let opts = options(FormatVersion::Version23).with_profile(Profile::MINIMUM);
    let xml = xml::save_to_string(&invoice(Profile::EXTENDED), &opts)
        .unwrap()
        .unwrap();
    assert!(xml.contains("urn:factur-x.eu:1p0:minimum"));
    assert!(!xml.contains("IncludedSupplyChainTradeLineItem"));
}

// ---------------------------------------------------------------------------
// ZUGFeRD 1.0
// ---------------------------------------------------------------------------

#[test]
fn version1_comfort_document() {
    let xml = cii(Profile::COMFORT, FormatVersion::Version1);
    assert!(xml.contains("<rsm:CrossIndustryDocument"));
    assert!(xml.contains("urn:ferd:CrossIndustryDocument:invoice:1p0:comfort"));
    assert!(xml.contains("<ram:Name>RECHNUNG</ram:Name>"));
    assert!(xml.contains(r#"<ram:GrandTotalAmount currencyID="EUR">1785.00</ram:GrandTotalAmount>"#));

    let header = xml::read_header(&xml).unwrap();
    assert_eq!(header.version, FormatVersion::Version1);
    assert_eq!(header.profile, Profile::COMFORT);
}

#[test]
fn version1_basic_drops_comfort_blocks() {
    let xml = cii(Profile::BASIC, FormatVersion::Version1);
    assert!(xml.contains("IncludedSupplyChainTradeLineItem"));
    assert!(!xml.contains("SpecifiedSupplyChainTradeAgreement"));
    assert!(!xml.contains("SpecifiedTradePaymentTerms"));
    assert!(!xml.contains("DuePayableAmount"));
}

#[test]
fn version1_has_no_minimum() {
    let mut sink = Vec::new();
    let err = xml::save(
        &invoice(Profile::MINIMUM),
        &mut sink,
        &options(FormatVersion::Version1),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        InvoiceError::UnsupportedProfileForVersion {
            version: FormatVersion::Version1,
            ..
        }
    ));
    assert!(sink.is_empty());
}

// ---------------------------------------------------------------------------
// UBL
// ---------------------------------------------------------------------------

fn ubl(inv: &Invoice) -> String {
    xml::save_to_string(inv, &options(FormatVersion::Version23).with_format(Format::Ubl))
        .unwrap()
        .unwrap()
}

#[test]
fn ubl_xrechnung_invoice() {
    let xml = ubl(&invoice(Profile::XRECHNUNG));
    assert!(xml.contains("<ubl:Invoice"));
    assert!(xml.contains(
        "<cbc:CustomizationID>urn:cen.eu:en16931:2017#compliant#urn:xeinkauf.de:kosit:xrechnung_3.0</cbc:CustomizationID>"
    ));
    assert!(xml.contains(r#"<cbc:EndpointID schemeID="EM">billing@acme.de</cbc:EndpointID>"#));
    assert!(xml.contains("<cbc:DueDate>2024-07-15</cbc:DueDate>"));
    assert!(xml.contains(r#"<cbc:PaymentMeansCode name="SEPA">58</cbc:PaymentMeansCode>"#));
    assert!(xml.contains(r#"<cbc:PayableAmount currencyID="EUR">1785.00</cbc:PayableAmount>"#));
    assert_eq!(xml.matches("<cac:InvoiceLine>").count(), 2);
    // gross 55, net 50
    assert!(xml.contains(r#"<cbc:Amount currencyID="EUR">5.00</cbc:Amount>"#));
}

#[test]
fn ubl_credit_note() {
    let mut inv = invoice(Profile::XRECHNUNG);
    inv.type_code = InvoiceTypeCode::CreditNote;
    let xml = ubl(&inv);
    assert!(xml.contains("<ubl:CreditNote"));
    assert!(xml.contains("<cbc:CreditNoteTypeCode>381</cbc:CreditNoteTypeCode>"));
    assert!(xml.contains("<cac:CreditNoteLine>"));
    assert!(xml.contains("<cbc:PaymentDueDate>2024-07-15</cbc:PaymentDueDate>"));
    assert!(!xml.contains("<cbc:DueDate>"));

    let header = xml::read_header(&xml).unwrap();
    assert_eq!(header.format, Format::Ubl);
    assert_eq!(header.type_code, Some(InvoiceTypeCode::CreditNote));
    assert_eq!(header.due_date.map(|d| d.date()), Some(date(2024, 7, 15)));
}

#[test]
fn ubl_requires_xrechnung() {
    let mut sink = Vec::new();
    let err = xml::save(
        &invoice(Profile::COMFORT),
        &mut sink,
        &options(FormatVersion::Version23).with_format(Format::Ubl),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        InvoiceError::UnsupportedCombination {
            format: Format::Ubl,
            profile: Profile::COMFORT,
            ..
        }
    ));
    assert!(sink.is_empty());
}

// ---------------------------------------------------------------------------
// Validation gating
// ---------------------------------------------------------------------------

#[test]
fn basic_wl_strict_and_lenient() {
    let inv = invoice(Profile::BASIC_WL);

    let mut sink = Vec::new();
    let err = xml::save(&inv, &mut sink, &options(FormatVersion::Version23)).unwrap_err();
    assert!(matches!(err, InvoiceError::UnsupportedProfile(Profile::BASIC_WL)));
    assert!(sink.is_empty());

    let lenient = options(FormatVersion::Version23).with_strict(false);
    assert!(!xml::save(&inv, &mut sink, &lenient).unwrap());
    assert!(sink.is_empty());
    assert_eq!(xml::save_to_string(&inv, &lenient).unwrap(), None);
}

#[test]
fn xrechnung_without_seller_contact_fails() {
    let mut inv = invoice(Profile::XRECHNUNG);
    if let Some(s) = inv.seller.as_mut() {
        s.contact = None;
    }
    let err = xml::save_to_string(&inv, &options(FormatVersion::Version23)).unwrap_err();
    assert!(matches!(
        err,
        InvoiceError::MissingRequiredField { rule: "BR-DE-2", .. }
    ));
}

#[test]
fn non_vat_outside_extended_fails() {
    let mut inv = invoice(Profile::COMFORT);
    inv.lines[1].tax_type = Some(TaxType::SalesTax);
    let err = xml::save_to_string(&inv, &options(FormatVersion::Version23)).unwrap_err();
    match err {
        InvoiceError::UnsupportedTaxType { line_id, tax_type } => {
            assert_eq!(line_id, "2");
            assert_eq!(tax_type, TaxType::SalesTax);
        }
        other => panic!("unexpected error: {other}"),
    }
}

// ---------------------------------------------------------------------------
// Header round trip
// ---------------------------------------------------------------------------

#[test]
fn written_header_reads_back() {
    for (profile, version) in [
        (Profile::MINIMUM, FormatVersion::Version20),
        (Profile::BASIC, FormatVersion::Version23),
        (Profile::EXTENDED, FormatVersion::Version22),
        (Profile::XRECHNUNG, FormatVersion::Version21),
    ] {
        let xml = cii(profile, version);
        let header = xml::read_header(&xml).unwrap();
        assert_eq!(header.format, Format::Cii);
        assert_eq!(header.profile, profile, "{version}");
        assert_eq!(header.number.as_deref(), Some("RE-2024-001"));
        assert_eq!(header.type_code, Some(InvoiceTypeCode::Invoice));
        assert_eq!(header.currency.as_deref(), Some("EUR"));
        assert_eq!(header.issue_date.map(|d| d.date()), Some(date(2024, 6, 15)));
    }
}

#[test]
fn due_date_only_from_basic_wl_up() {
    let minimum = xml::read_header(&cii(Profile::MINIMUM, FormatVersion::Version23)).unwrap();
    assert_eq!(minimum.due_date, None);
    let basic = xml::read_header(&cii(Profile::BASIC, FormatVersion::Version23)).unwrap();
    assert_eq!(basic.due_date.map(|d| d.date()), Some(date(2024, 7, 15)));
}

#[test]
fn save_writes_same_bytes_as_string() {
    let inv = invoice(Profile::COMFORT);
    let opts = options(FormatVersion::Version23);
    let mut sink = Vec::new();
    assert!(xml::save(&inv, &mut sink, &opts).unwrap());
    assert_eq!(
        String::from_utf8(sink).unwrap(),
        xml::save_to_string(&inv, &opts).unwrap().unwrap()
    );
}
