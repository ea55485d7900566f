//! UBL 2.1 writer for the XRechnung profiles.
//!
//! UBL output is only produced for XRechnung, so most calls use the
//! unrestricted gate; the profile filter still decides the few elements
//! that differ between XRechnung generations.

use rust_decimal::Decimal;

use super::sink::{XmlSink, format_decimal};
use super::writer::ProfileAwareXmlWriter;
use super::{PEPPOL_PROFILE_ID, ubl_ns};
use crate::core::*;
use crate::profile::Profile;

const ANY: Profile = Profile::ANY;

pub(crate) fn write_ubl<S: XmlSink>(
    w: &mut ProfileAwareXmlWriter<S>,
    invoice: &Invoice,
    customization_id: &str,
) -> Result<(), InvoiceError> {
    let totals = invoice.totals.as_ref().ok_or_else(|| {
        InvoiceError::Builder("totals must be calculated before XML generation".into())
    })?;
    let currency = invoice.currency_code.as_str();

    let credit_note = invoice.type_code.is_credit_note();
    let (root_tag, root_ns) = if credit_note {
        ("ubl:CreditNote", ubl_ns::CREDIT_NOTE)
    } else {
        ("ubl:Invoice", ubl_ns::INVOICE)
    };

    w.start_element_ns(root_tag, root_ns, ANY)?;
    w.attribute("xmlns:cac", ubl_ns::CAC, ANY)?;
    w.attribute("xmlns:cbc", ubl_ns::CBC, ANY)?;

    // BT-24 / BT-23
    w.text_element("cbc:CustomizationID", customization_id, ANY)?;
    w.text_element("cbc:ProfileID", PEPPOL_PROFILE_ID, Profile::XRECHNUNG)?;
    w.text_element("cbc:ID", &invoice.number, ANY)?;
    w.text_element("cbc:IssueDate", &invoice.issue_date.to_string(), ANY)?;
    // BT-9 moves into PaymentMeans for credit notes
    if !credit_note {
        if let Some(due) = invoice.payment_terms.as_ref().and_then(|t| t.due_date) {
            w.text_element("cbc:DueDate", &due.to_string(), ANY)?;
        }
    }
    let type_element = if credit_note {
        "cbc:CreditNoteTypeCode"
    } else {
        "cbc:InvoiceTypeCode"
    };
    w.text_element(type_element, &invoice.type_code.code().to_string(), ANY)?;
    for note in &invoice.notes {
        w.text_element("cbc:Note", note, ANY)?;
    }
    if let Some(tpd) = &invoice.tax_point_date {
        w.text_element("cbc:TaxPointDate", &tpd.to_string(), ANY)?;
    }
    w.text_element("cbc:DocumentCurrencyCode", currency, ANY)?;
    w.optional_text_element("cbc:BuyerReference", invoice.buyer_reference.as_deref(), ANY)?;

    if let Some(period) = &invoice.invoicing_period {
        w.start_element("cac:InvoicePeriod", ANY)?;
        w.text_element("cbc:StartDate", &period.start.to_string(), ANY)?;
        w.text_element("cbc:EndDate", &period.end.to_string(), ANY)?;
        w.end_element()?;
    }

    if let Some(order) = &invoice.order_reference {
        w.start_element("cac:OrderReference", ANY)?;
        w.text_element("cbc:ID", order, ANY)?;
        w.end_element()?;
    }

    for pi in &invoice.preceding_invoices {
        w.start_element("cac:BillingReference", ANY)?;
        w.start_element("cac:InvoiceDocumentReference", ANY)?;
        w.text_element("cbc:ID", &pi.number, ANY)?;
        if let Some(d) = &pi.issue_date {
            w.text_element("cbc:IssueDate", &d.to_string(), ANY)?;
        }
        w.end_element()?;
        w.end_element()?;
    }

    if let Some(seller) = &invoice.seller {
        write_party(w, seller, "cac:AccountingSupplierParty")?;
    }
    if let Some(buyer) = &invoice.buyer {
        write_party(w, buyer, "cac:AccountingCustomerParty")?;
    }

    if let Some(tpd) = &invoice.tax_point_date {
        w.start_element("cac:Delivery", ANY)?;
        w.text_element("cbc:ActualDeliveryDate", &tpd.to_string(), ANY)?;
        w.end_element()?;
    }

    if let Some(payment) = &invoice.payment {
        w.start_element("cac:PaymentMeans", ANY)?;
        w.start_element("cbc:PaymentMeansCode", ANY)?;
        w.optional_attribute("name", payment.means_text.as_deref(), ANY)?;
        w.value(&payment.means_code.code().to_string())?;
        w.end_element()?;
        if credit_note {
            if let Some(due) = invoice.payment_terms.as_ref().and_then(|t| t.due_date) {
                w.text_element("cbc:PaymentDueDate", &due.to_string(), ANY)?;
            }
        }
        w.optional_text_element("cbc:PaymentID", payment.remittance_info.as_deref(), ANY)?;
        if let Some(ct) = &payment.credit_transfer {
            w.start_element("cac:PayeeFinancialAccount", ANY)?;
            w.text_element("cbc:ID", &ct.iban, ANY)?;
            w.optional_text_element("cbc:Name", ct.account_name.as_deref(), ANY)?;
            if let Some(bic) = &ct.bic {
                w.start_element("cac:FinancialInstitutionBranch", ANY)?;
                w.text_element("cbc:ID", bic, ANY)?;
                w.end_element()?;
            }
            w.end_element()?;
        }
        w.end_element()?;
    }

    if let Some(terms) = &invoice.payment_terms {
        if let Some(note) = &terms.description {
            w.start_element("cac:PaymentTerms", ANY)?;
            w.text_element("cbc:Note", note, ANY)?;
            w.end_element()?;
        }
    }

    for ac in invoice.allowances.iter().chain(invoice.charges.iter()) {
        write_allowance_charge(w, ac, currency, true)?;
    }

    w.start_element("cac:TaxTotal", ANY)?;
    w.amount_element("cbc:TaxAmount", totals.vat_total, Some(currency), ANY)?;
    for bd in &totals.vat_breakdown {
        w.start_element("cac:TaxSubtotal", ANY)?;
        w.amount_element("cbc:TaxableAmount", bd.taxable_amount, Some(currency), ANY)?;
        w.amount_element("cbc:TaxAmount", bd.tax_amount, Some(currency), ANY)?;
        w.start_element("cac:TaxCategory", ANY)?;
        w.text_element("cbc:ID", bd.category.code(), ANY)?;
        w.text_element("cbc:Percent", &format_decimal(bd.rate), ANY)?;
        w.optional_text_element(
            "cbc:TaxExemptionReasonCode",
            bd.exemption_reason_code.as_deref(),
            ANY,
        )?;
        w.optional_text_element("cbc:TaxExemptionReason", bd.exemption_reason.as_deref(), ANY)?;
        write_tax_scheme(w, TaxType::ValueAddedTax)?;
        w.end_element()?;
        w.end_element()?;
    }
    w.end_element()?;

    w.start_element("cac:LegalMonetaryTotal", ANY)?;
    w.amount_element("cbc:LineExtensionAmount", totals.line_net_total, Some(currency), ANY)?;
    w.amount_element("cbc:TaxExclusiveAmount", totals.net_total, Some(currency), ANY)?;
    w.amount_element("cbc:TaxInclusiveAmount", totals.gross_total, Some(currency), ANY)?;
    if totals.allowances_total > Decimal::ZERO {
        w.amount_element(
            "cbc:AllowanceTotalAmount",
            totals.allowances_total,
            Some(currency),
            ANY,
        )?;
    }
    if totals.charges_total > Decimal::ZERO {
        w.amount_element("cbc:ChargeTotalAmount", totals.charges_total, Some(currency), ANY)?;
    }
    if totals.prepaid > Decimal::ZERO {
        w.amount_element("cbc:PrepaidAmount", totals.prepaid, Some(currency), ANY)?;
    }
    w.amount_element("cbc:PayableAmount", totals.amount_due, Some(currency), ANY)?;
    w.end_element()?;

    for line in &invoice.lines {
        write_line(w, line, currency, credit_note)?;
    }

    w.end_element()?;
    Ok(())
}

fn write_tax_scheme<S: XmlSink>(
    w: &mut ProfileAwareXmlWriter<S>,
    tax_type: TaxType,
) -> Result<(), InvoiceError> {
    w.start_element("cac:TaxScheme", ANY)?;
    w.text_element("cbc:ID", tax_type.code(), ANY)?;
    w.end_element()?;
    Ok(())
}

fn write_party<S: XmlSink>(
    w: &mut ProfileAwareXmlWriter<S>,
    party: &Party,
    wrapper: &str,
) -> Result<(), InvoiceError> {
    w.start_element(wrapper, ANY)?;
    w.start_element("cac:Party", ANY)?;

    if let Some(ea) = &party.electronic_address {
        w.text_element_with_attrs(
            "cbc:EndpointID",
            &ea.value,
            &[("schemeID", ea.scheme.as_str())],
            ANY,
        )?;
    }
    if let Some(id) = &party.id {
        w.start_element("cac:PartyIdentification", ANY)?;
        w.text_element("cbc:ID", id, ANY)?;
        w.end_element()?;
    }

    w.start_element("cac:PostalAddress", ANY)?;
    w.optional_text_element("cbc:StreetName", party.address.street.as_deref(), ANY)?;
    w.optional_text_element(
        "cbc:AdditionalStreetName",
        party.address.additional.as_deref(),
        ANY,
    )?;
    w.text_element("cbc:CityName", &party.address.city, ANY)?;
    w.text_element("cbc:PostalZone", &party.address.postal_code, ANY)?;
    w.start_element("cac:Country", ANY)?;
    w.text_element("cbc:IdentificationCode", &party.address.country_code, ANY)?;
    w.end_element()?;
    w.end_element()?;

    for (id, scheme) in [(&party.vat_id, "VAT"), (&party.tax_number, "FC")] {
        if let Some(id) = id {
            w.start_element("cac:PartyTaxScheme", ANY)?;
            w.text_element("cbc:CompanyID", id, ANY)?;
            w.start_element("cac:TaxScheme", ANY)?;
            w.text_element("cbc:ID", scheme, ANY)?;
            w.end_element()?;
            w.end_element()?;
        }
    }

    w.start_element("cac:PartyLegalEntity", ANY)?;
    w.text_element("cbc:RegistrationName", &party.name, ANY)?;
    w.optional_text_element("cbc:CompanyID", party.registration_id.as_deref(), ANY)?;
    w.end_element()?;

    if let Some(contact) = &party.contact {
        // UBL has a single contact name; the department stands in for a person
        let name = contact.name.as_deref().or(contact.org_unit.as_deref());
        w.start_element("cac:Contact", ANY)?;
        w.optional_text_element("cbc:Name", name, ANY)?;
        w.optional_text_element("cbc:Telephone", contact.phone.as_deref(), ANY)?;
        w.optional_text_element("cbc:ElectronicMail", contact.email.as_deref(), ANY)?;
        w.end_element()?;
    }

    w.end_element()?;
    w.end_element()?;
    Ok(())
}

fn write_allowance_charge<S: XmlSink>(
    w: &mut ProfileAwareXmlWriter<S>,
    ac: &AllowanceCharge,
    currency: &str,
    with_tax: bool,
) -> Result<(), InvoiceError> {
    w.start_element("cac:AllowanceCharge", ANY)?;
    w.text_element("cbc:ChargeIndicator", if ac.is_charge { "true" } else { "false" }, ANY)?;
    w.optional_text_element("cbc:AllowanceChargeReasonCode", ac.reason_code.as_deref(), ANY)?;
    w.optional_text_element("cbc:AllowanceChargeReason", ac.reason.as_deref(), ANY)?;
    if let Some(pct) = ac.percentage {
        w.text_element("cbc:MultiplierFactorNumeric", &format_decimal(pct), ANY)?;
    }
    w.amount_element("cbc:Amount", ac.amount, Some(currency), ANY)?;
    if let Some(base) = ac.base_amount {
        w.amount_element("cbc:BaseAmount", base, Some(currency), ANY)?;
    }
    if with_tax {
        w.start_element("cac:TaxCategory", ANY)?;
        w.text_element("cbc:ID", ac.tax_category.code(), ANY)?;
        w.text_element("cbc:Percent", &format_decimal(ac.tax_rate), ANY)?;
        write_tax_scheme(w, TaxType::ValueAddedTax)?;
        w.end_element()?;
    }
    w.end_element()?;
    Ok(())
}

fn write_line<S: XmlSink>(
    w: &mut ProfileAwareXmlWriter<S>,
    line: &LineItem,
    currency: &str,
    credit_note: bool,
) -> Result<(), InvoiceError> {
    let (line_tag, qty_tag) = if credit_note {
        ("cac:CreditNoteLine", "cbc:CreditedQuantity")
    } else {
        ("cac:InvoiceLine", "cbc:InvoicedQuantity")
    };
    w.start_element(line_tag, ANY)?;
    w.text_element("cbc:ID", &line.id, ANY)?;
    w.optional_text_element("cbc:Note", line.note.as_deref(), ANY)?;
    w.quantity_element(qty_tag, line.quantity, &line.unit, ANY)?;
    w.amount_element(
        "cbc:LineExtensionAmount",
        line.line_amount.unwrap_or(Decimal::ZERO),
        Some(currency),
        ANY,
    )?;

    for ac in line.allowances.iter().chain(line.charges.iter()) {
        write_allowance_charge(w, ac, currency, false)?;
    }

    w.start_element("cac:Item", ANY)?;
    w.optional_text_element("cbc:Description", line.description.as_deref(), ANY)?;
    w.text_element("cbc:Name", &line.item_name, ANY)?;
    if let Some(bid) = &line.buyer_item_id {
        w.start_element("cac:BuyersItemIdentification", ANY)?;
        w.text_element("cbc:ID", bid, ANY)?;
        w.end_element()?;
    }
    if let Some(sid) = &line.seller_item_id {
        w.start_element("cac:SellersItemIdentification", ANY)?;
        w.text_element("cbc:ID", sid, ANY)?;
        w.end_element()?;
    }
    if let Some(std_id) = &line.standard_item_id {
        w.start_element("cac:StandardItemIdentification", ANY)?;
        w.text_element_with_attrs("cbc:ID", std_id, &[("schemeID", "0160")], ANY)?;
        w.end_element()?;
    }
    w.start_element("cac:ClassifiedTaxCategory", ANY)?;
    w.text_element("cbc:ID", line.tax_category.code(), ANY)?;
    w.text_element("cbc:Percent", &format_decimal(line.tax_rate), ANY)?;
    write_tax_scheme(w, line.tax_type.unwrap_or(TaxType::ValueAddedTax))?;
    w.end_element()?;
    w.end_element()?;

    w.start_element("cac:Price", ANY)?;
    w.amount_element("cbc:PriceAmount", line.unit_price, Some(currency), ANY)?;
    if let Some(gp) = line.gross_price {
        let discount = gp - line.unit_price;
        if discount > Decimal::ZERO {
            w.start_element("cac:AllowanceCharge", ANY)?;
            w.text_element("cbc:ChargeIndicator", "false", ANY)?;
            w.amount_element("cbc:Amount", discount, Some(currency), ANY)?;
            w.amount_element("cbc:BaseAmount", gp, Some(currency), ANY)?;
            w.end_element()?;
        }
    }
    w.end_element()?;

    w.end_element()?;
    Ok(())
}
