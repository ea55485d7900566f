use crate::core::*;
use crate::profile::{Format, Profile};

/// Invoice type codes XRechnung accepts (BR-DE-17).
const XRECHNUNG_TYPE_CODES: &[InvoiceTypeCode] = &[
    InvoiceTypeCode::Invoice,
    InvoiceTypeCode::Correction,
    InvoiceTypeCode::SelfBilledInvoice,
    InvoiceTypeCode::CreditNote,
    InvoiceTypeCode::PartialInvoice,
    InvoiceTypeCode::PartialConstructionInvoice,
    InvoiceTypeCode::PartialFinalConstructionInvoice,
    InvoiceTypeCode::FinalConstructionInvoice,
];

/// Structural checks that must pass before `invoice` is written with
/// `profile` in `format`.
///
/// In strict mode the first failing rule is returned as an error. Otherwise
/// a failure yields `Ok(false)`.
pub fn validate(
    invoice: &Invoice,
    profile: Profile,
    format: Format,
    strict: bool,
) -> Result<bool, InvoiceError> {
    match check(invoice, profile, format) {
        Ok(()) => Ok(true),
        Err(e) if strict => Err(e),
        Err(e) => {
            tracing::debug!(error = %e, "validation failed in non-strict mode");
            Ok(false)
        }
    }
}

fn check(invoice: &Invoice, profile: Profile, format: Format) -> Result<(), InvoiceError> {
    if format == Format::Cii && profile == Profile::BASIC_WL {
        return Err(InvoiceError::UnsupportedProfile(profile));
    }

    if profile != Profile::EXTENDED {
        for line in &invoice.lines {
            if let Some(tax_type) = line.tax_type {
                if tax_type != TaxType::ValueAddedTax {
                    return Err(InvoiceError::UnsupportedTaxType {
                        line_id: line.id.clone(),
                        tax_type,
                    });
                }
            }
        }
    }

    if profile.intersects(Profile::XRECHNUNG_ANY) {
        if let Some(seller) = &invoice.seller {
            check_seller_contact(seller)?;
        }
        if !XRECHNUNG_TYPE_CODES.contains(&invoice.type_code) {
            return Err(InvoiceError::UnsupportedInvoiceType(invoice.type_code));
        }
    }

    Ok(())
}

fn check_seller_contact(seller: &Party) -> Result<(), InvoiceError> {
    let contact = seller.contact.as_ref().ok_or(InvoiceError::MissingRequiredField {
        rule: "BR-DE-2",
        term: "BG-6",
        message: "seller contact is required",
    })?;
    if is_blank(contact.email.as_deref()) {
        return Err(InvoiceError::MissingRequiredField {
            rule: "BR-DE-7",
            term: "BT-43",
            message: "seller contact email is required",
        });
    }
    if is_blank(contact.phone.as_deref()) {
        return Err(InvoiceError::MissingRequiredField {
            rule: "BR-DE-6",
            term: "BT-42",
            message: "seller contact telephone is required",
        });
    }
    if is_blank(contact.name.as_deref()) && is_blank(contact.org_unit.as_deref()) {
        return Err(InvoiceError::MissingRequiredField {
            rule: "BR-DE-5",
            term: "BT-41",
            message: "seller contact name or department is required",
        });
    }
    Ok(())
}

fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn seller(contact: Option<Contact>) -> Party {
        let mut party = PartyBuilder::new(
            "ACME GmbH",
            AddressBuilder::new("Berlin", "10115", "DE").build(),
        )
        .vat_id("DE123456789")
        .build();
        party.contact = contact;
        party
    }

    fn full_contact() -> Contact {
        Contact {
            name: Some("Max Mustermann".into()),
            org_unit: None,
            phone: Some("+49 30 1234567".into()),
            email: Some("max@acme.de".into()),
        }
    }

    fn invoice(profile: Profile, contact: Option<Contact>) -> Invoice {
        InvoiceBuilder::new("RE-1", NaiveDate::from_ymd_opt(2024, 6, 15).unwrap())
            .profile(profile)
            .seller(seller(contact))
            .add_line(LineItemBuilder::new("1", "Widget", dec!(1), "C62", dec!(10)).build())
            .build()
            .unwrap()
    }

    #[test]
    fn basic_wl_rejected_for_cii() {
        let inv = invoice(Profile::BASIC_WL, None);
        assert!(matches!(
            validate(&inv, Profile::BASIC_WL, Format::Cii, true),
            Err(InvoiceError::UnsupportedProfile(_))
        ));
        assert!(!validate(&inv, Profile::BASIC_WL, Format::Cii, false).unwrap());
    }

    #[test]
    fn non_vat_tax_only_in_extended() {
        let mut inv = invoice(Profile::COMFORT, None);
        inv.lines[0].tax_type = Some(TaxType::ExciseDuty);
        assert!(matches!(
            validate(&inv, Profile::COMFORT, Format::Cii, true),
            Err(InvoiceError::UnsupportedTaxType { tax_type: TaxType::ExciseDuty, .. })
        ));
        assert!(validate(&inv, Profile::EXTENDED, Format::Cii, true).unwrap());
    }

    #[test]
    fn xrechnung_seller_contact_rules() {
        let cases: [(Option<Contact>, &str); 4] = [
            (None, "BR-DE-2"),
            (Some(Contact { email: None, ..full_contact() }), "BR-DE-7"),
            (Some(Contact { phone: Some("  ".into()), ..full_contact() }), "BR-DE-6"),
            (Some(Contact { name: None, org_unit: None, ..full_contact() }), "BR-DE-5"),
        ];
        for (contact, expected) in cases {
            let inv = invoice(Profile::XRECHNUNG, contact);
            match validate(&inv, Profile::XRECHNUNG, Format::Cii, true) {
                Err(InvoiceError::MissingRequiredField { rule, .. }) => assert_eq!(rule, expected),
                other => panic!("expected {expected}, got {other:?}"),
            }
        }
    }

    #[test]
    fn org_unit_satisfies_contact_name() {
        let contact = Contact { name: None, org_unit: Some("Billing".into()), ..full_contact() };
        let inv = invoice(Profile::XRECHNUNG1, Some(contact));
        assert!(validate(&inv, Profile::XRECHNUNG1, Format::Ubl, true).unwrap());
    }

    #[test]
    fn xrechnung_type_code_allow_list() {
        let mut inv = invoice(Profile::XRECHNUNG, Some(full_contact()));
        inv.type_code = InvoiceTypeCode::DebitNote;
        assert!(matches!(
            validate(&inv, Profile::XRECHNUNG, Format::Ubl, true),
            Err(InvoiceError::UnsupportedInvoiceType(InvoiceTypeCode::DebitNote))
        ));
        inv.type_code = InvoiceTypeCode::FinalConstructionInvoice;
        assert!(validate(&inv, Profile::XRECHNUNG, Format::Ubl, true).unwrap());
    }

    #[test]
    fn contact_rules_only_apply_to_xrechnung() {
        let inv = invoice(Profile::COMFORT, None);
        assert!(validate(&inv, Profile::COMFORT, Format::Cii, true).unwrap());
    }
}
