//! CII `CrossIndustryInvoice:100` writer for ZUGFeRD 2.0 – 2.3.
//!
//! One tree walk serves every profile: each element is annotated with the
//! profiles allowed to carry it and [`ProfileAwareXmlWriter`] drops the rest.
//! Element order follows the CII D16B schema.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::sink::XmlSink;
use super::writer::ProfileAwareXmlWriter;
use super::{PEPPOL_PROFILE_ID, cii_ns};
use crate::core::*;
use crate::date::{FORMAT_102, format_naive_date};
use crate::profile::{FormatVersion, Profile};

const ANY: Profile = Profile::ANY;
const BASIC_WL: Profile = Profile::BASIC_WL_AND_UP;
const BASIC: Profile = Profile::BASIC_AND_UP;
const COMFORT: Profile = Profile::COMFORT_AND_UP;

/// Serialize `invoice` as CII. `guideline_urn` goes into the document context.
pub(crate) fn write_cii<S: XmlSink>(
    w: &mut ProfileAwareXmlWriter<S>,
    invoice: &Invoice,
    version: FormatVersion,
    guideline_urn: &str,
) -> Result<(), InvoiceError> {
    let totals = invoice.totals.as_ref().ok_or_else(|| {
        InvoiceError::Builder("totals must be calculated before XML generation".into())
    })?;
    let currency = invoice.currency_code.as_str();

    w.start_element_ns("rsm:CrossIndustryInvoice", cii_ns::RSM, ANY)?;
    w.attribute("xmlns:ram", cii_ns::RAM, ANY)?;
    w.attribute("xmlns:qdt", cii_ns::QDT, ANY)?;
    w.attribute("xmlns:udt", cii_ns::UDT, ANY)?;

    // --- ExchangedDocumentContext ---
    w.start_element("rsm:ExchangedDocumentContext", ANY)?;
    if version >= FormatVersion::Version21 {
        w.start_element(
            "ram:BusinessProcessSpecifiedDocumentContextParameter",
            Profile::XRECHNUNG_ANY,
        )?;
        w.text_element("ram:ID", PEPPOL_PROFILE_ID, ANY)?;
        w.end_element()?;
    }
    w.start_element("ram:GuidelineSpecifiedDocumentContextParameter", ANY)?;
    w.text_element("ram:ID", guideline_urn, ANY)?;
    w.end_element()?;
    w.end_element()?;

    // --- ExchangedDocument ---
    w.start_element("rsm:ExchangedDocument", ANY)?;
    w.text_element("ram:ID", &invoice.number, ANY)?;
    w.text_element("ram:TypeCode", &invoice.type_code.code().to_string(), ANY)?;
    write_date(w, "ram:IssueDateTime", &invoice.issue_date, ANY)?;
    for note in &invoice.notes {
        w.start_element("ram:IncludedNote", BASIC_WL)?;
        w.text_element("ram:Content", note, ANY)?;
        w.end_element()?;
    }
    w.end_element()?;

    // --- SupplyChainTradeTransaction ---
    w.start_element("rsm:SupplyChainTradeTransaction", ANY)?;

    for line in &invoice.lines {
        write_line(w, line)?;
    }

    // --- ApplicableHeaderTradeAgreement ---
    w.start_element("ram:ApplicableHeaderTradeAgreement", ANY)?;
    w.optional_text_element("ram:BuyerReference", invoice.buyer_reference.as_deref(), ANY)?;
    if let Some(seller) = &invoice.seller {
        write_party(w, seller, "ram:SellerTradeParty", ANY)?;
    }
    if let Some(buyer) = &invoice.buyer {
        write_party(w, buyer, "ram:BuyerTradeParty", BASIC_WL)?;
    }
    if let Some(order) = &invoice.order_reference {
        w.start_element("ram:BuyerOrderReferencedDocument", ANY)?;
        w.text_element("ram:IssuerAssignedID", order, ANY)?;
        w.end_element()?;
    }
    w.end_element()?;

    // --- ApplicableHeaderTradeDelivery ---
    w.start_element("ram:ApplicableHeaderTradeDelivery", ANY)?;
    if let Some(tpd) = &invoice.tax_point_date {
        w.start_element("ram:ActualDeliverySupplyChainEvent", BASIC_WL)?;
        write_date(w, "ram:OccurrenceDateTime", tpd, ANY)?;
        w.end_element()?;
    }
    w.end_element()?;

    // --- ApplicableHeaderTradeSettlement ---
    w.start_element("ram:ApplicableHeaderTradeSettlement", ANY)?;
    if let Some(payment) = &invoice.payment {
        w.optional_text_element(
            "ram:PaymentReference",
            payment.remittance_info.as_deref(),
            BASIC_WL,
        )?;
    }
    w.text_element("ram:InvoiceCurrencyCode", currency, ANY)?;

    if let Some(payment) = &invoice.payment {
        write_payment_means(w, payment)?;
    }

    for bd in &totals.vat_breakdown {
        w.start_element("ram:ApplicableTradeTax", BASIC_WL)?;
        w.amount_element("ram:CalculatedAmount", bd.tax_amount, None, ANY)?;
        w.text_element("ram:TypeCode", TaxType::ValueAddedTax.code(), ANY)?;
        w.optional_text_element("ram:ExemptionReason", bd.exemption_reason.as_deref(), ANY)?;
        w.amount_element("ram:BasisAmount", bd.taxable_amount, None, ANY)?;
        w.text_element("ram:CategoryCode", bd.category.code(), ANY)?;
        w.optional_text_element(
            "ram:ExemptionReasonCode",
            bd.exemption_reason_code.as_deref(),
            COMFORT,
        )?;
        w.amount_element("ram:RateApplicablePercent", bd.rate, None, ANY)?;
        w.end_element()?;
    }

    if let Some(period) = &invoice.invoicing_period {
        w.start_element("ram:BillingSpecifiedPeriod", BASIC_WL)?;
        write_date(w, "ram:StartDateTime", &period.start, ANY)?;
        write_date(w, "ram:EndDateTime", &period.end, ANY)?;
        w.end_element()?;
    }

    for ac in invoice.allowances.iter().chain(invoice.charges.iter()) {
        write_allowance_charge(w, ac, true, BASIC_WL)?;
    }

    if let Some(terms) = &invoice.payment_terms {
        w.start_element("ram:SpecifiedTradePaymentTerms", BASIC_WL)?;
        w.optional_text_element("ram:Description", terms.description.as_deref(), COMFORT)?;
        if let Some(due) = &terms.due_date {
            write_date(w, "ram:DueDateDateTime", due, ANY)?;
        }
        w.end_element()?;
    }

    w.start_element("ram:SpecifiedTradeSettlementHeaderMonetarySummation", ANY)?;
    w.amount_element("ram:LineTotalAmount", totals.line_net_total, None, BASIC_WL)?;
    if totals.charges_total > Decimal::ZERO {
        w.amount_element("ram:ChargeTotalAmount", totals.charges_total, None, BASIC_WL)?;
    }
    if totals.allowances_total > Decimal::ZERO {
        w.amount_element("ram:AllowanceTotalAmount", totals.allowances_total, None, BASIC_WL)?;
    }
    w.amount_element("ram:TaxBasisTotalAmount", totals.net_total, None, ANY)?;
    w.amount_element("ram:TaxTotalAmount", totals.vat_total, Some(currency), ANY)?;
    w.amount_element("ram:GrandTotalAmount", totals.gross_total, None, ANY)?;
    if totals.prepaid > Decimal::ZERO {
        w.amount_element("ram:TotalPrepaidAmount", totals.prepaid, None, BASIC_WL)?;
    }
    w.amount_element("ram:DuePayableAmount", totals.amount_due, None, ANY)?;
    w.end_element()?;

    for preceding in &invoice.preceding_invoices {
        w.start_element("ram:InvoiceReferencedDocument", BASIC_WL)?;
        w.text_element("ram:IssuerAssignedID", &preceding.number, ANY)?;
        if let Some(d) = &preceding.issue_date {
            write_date(w, "ram:FormattedIssueDateTime", d, ANY)?;
        }
        w.end_element()?;
    }

    w.end_element()?; // ApplicableHeaderTradeSettlement
    w.end_element()?; // SupplyChainTradeTransaction
    w.end_element()?; // CrossIndustryInvoice
    Ok(())
}

fn write_date<S: XmlSink>(
    w: &mut ProfileAwareXmlWriter<S>,
    element: &str,
    date: &NaiveDate,
    gate: Profile,
) -> Result<(), InvoiceError> {
    w.start_element(element, gate)?;
    w.text_element_with_attrs(
        "udt:DateTimeString",
        &format_naive_date(date, true),
        &[("format", FORMAT_102)],
        ANY,
    )?;
    w.end_element()?;
    Ok(())
}

/// `address_gate` controls the postal details below the country code, which
/// the Minimum profile only carries for the seller.
fn write_party<S: XmlSink>(
    w: &mut ProfileAwareXmlWriter<S>,
    party: &Party,
    element: &str,
    address_gate: Profile,
) -> Result<(), InvoiceError> {
    w.start_element(element, ANY)?;
    w.optional_text_element("ram:ID", party.id.as_deref(), BASIC_WL)?;
    w.text_element("ram:Name", &party.name, ANY)?;

    if let Some(reg_id) = &party.registration_id {
        w.start_element("ram:SpecifiedLegalOrganization", ANY)?;
        w.text_element("ram:ID", reg_id, ANY)?;
        w.end_element()?;
    }

    if let Some(contact) = &party.contact {
        w.start_element("ram:DefinedTradeContact", COMFORT)?;
        w.optional_text_element("ram:PersonName", contact.name.as_deref(), ANY)?;
        w.optional_text_element("ram:DepartmentName", contact.org_unit.as_deref(), ANY)?;
        if let Some(phone) = &contact.phone {
            w.start_element("ram:TelephoneUniversalCommunication", ANY)?;
            w.text_element("ram:CompleteNumber", phone, ANY)?;
            w.end_element()?;
        }
        if let Some(email) = &contact.email {
            w.start_element("ram:EmailURIUniversalCommunication", ANY)?;
            w.text_element("ram:URIID", email, ANY)?;
            w.end_element()?;
        }
        w.end_element()?;
    }

    w.start_element("ram:PostalTradeAddress", address_gate)?;
    w.text_element("ram:PostcodeCode", &party.address.postal_code, BASIC_WL)?;
    w.optional_text_element("ram:LineOne", party.address.street.as_deref(), BASIC_WL)?;
    w.optional_text_element("ram:LineTwo", party.address.additional.as_deref(), BASIC_WL)?;
    w.text_element("ram:CityName", &party.address.city, BASIC_WL)?;
    w.text_element("ram:CountryID", &party.address.country_code, ANY)?;
    w.end_element()?;

    if let Some(ea) = &party.electronic_address {
        w.start_element("ram:URIUniversalCommunication", BASIC_WL)?;
        w.text_element_with_attrs(
            "ram:URIID",
            &ea.value,
            &[("schemeID", ea.scheme.as_str())],
            ANY,
        )?;
        w.end_element()?;
    }

    // Tax registrations must come last
    if let Some(vat_id) = &party.vat_id {
        w.start_element("ram:SpecifiedTaxRegistration", ANY)?;
        w.text_element_with_attrs("ram:ID", vat_id, &[("schemeID", "VA")], ANY)?;
        w.end_element()?;
    }
    if let Some(tax_num) = &party.tax_number {
        w.start_element("ram:SpecifiedTaxRegistration", ANY)?;
        w.text_element_with_attrs("ram:ID", tax_num, &[("schemeID", "FC")], ANY)?;
        w.end_element()?;
    }

    w.end_element()?;
    Ok(())
}

fn write_payment_means<S: XmlSink>(
    w: &mut ProfileAwareXmlWriter<S>,
    payment: &PaymentInstructions,
) -> Result<(), InvoiceError> {
    w.start_element("ram:SpecifiedTradeSettlementPaymentMeans", BASIC_WL)?;
    w.text_element("ram:TypeCode", &payment.means_code.code().to_string(), ANY)?;
    w.optional_text_element("ram:Information", payment.means_text.as_deref(), COMFORT)?;
    if let Some(ct) = &payment.credit_transfer {
        w.start_element("ram:PayeePartyCreditorFinancialAccount", ANY)?;
        w.text_element("ram:IBANID", &ct.iban, ANY)?;
        w.optional_text_element("ram:AccountName", ct.account_name.as_deref(), COMFORT)?;
        w.end_element()?;
        if let Some(bic) = &ct.bic {
            w.start_element("ram:PayeeSpecifiedCreditorFinancialInstitution", COMFORT)?;
            w.text_element("ram:BICID", bic, ANY)?;
            w.end_element()?;
        }
    }
    w.end_element()?;
    Ok(())
}

fn write_allowance_charge<S: XmlSink>(
    w: &mut ProfileAwareXmlWriter<S>,
    ac: &AllowanceCharge,
    with_tax: bool,
    gate: Profile,
) -> Result<(), InvoiceError> {
    w.start_element("ram:SpecifiedTradeAllowanceCharge", gate)?;
    w.start_element("ram:ChargeIndicator", ANY)?;
    w.text_element("udt:Indicator", if ac.is_charge { "true" } else { "false" }, ANY)?;
    w.end_element()?;
    if let Some(pct) = ac.percentage {
        w.amount_element("ram:CalculationPercent", pct, None, COMFORT)?;
    }
    if let Some(base) = ac.base_amount {
        w.amount_element("ram:BasisAmount", base, None, COMFORT)?;
    }
    w.amount_element("ram:ActualAmount", ac.amount, None, ANY)?;
    w.optional_text_element("ram:ReasonCode", ac.reason_code.as_deref(), ANY)?;
    w.optional_text_element("ram:Reason", ac.reason.as_deref(), ANY)?;
    if with_tax {
        w.start_element("ram:CategoryTradeTax", ANY)?;
        w.text_element("ram:TypeCode", TaxType::ValueAddedTax.code(), ANY)?;
        w.text_element("ram:CategoryCode", ac.tax_category.code(), ANY)?;
        w.amount_element("ram:RateApplicablePercent", ac.tax_rate, None, ANY)?;
        w.end_element()?;
    }
    w.end_element()?;
    Ok(())
}

fn write_line<S: XmlSink>(
    w: &mut ProfileAwareXmlWriter<S>,
    line: &LineItem,
) -> Result<(), InvoiceError> {
    w.start_element("ram:IncludedSupplyChainTradeLineItem", BASIC)?;

    w.start_element("ram:AssociatedDocumentLineDocument", ANY)?;
    w.text_element("ram:LineID", &line.id, ANY)?;
    if let Some(note) = &line.note {
        w.start_element("ram:IncludedNote", ANY)?;
        w.text_element("ram:Content", note, ANY)?;
        w.end_element()?;
    }
    w.end_element()?;

    w.start_element("ram:SpecifiedTradeProduct", ANY)?;
    if let Some(gtin) = &line.standard_item_id {
        w.text_element_with_attrs("ram:GlobalID", gtin, &[("schemeID", "0160")], ANY)?;
    }
    w.optional_text_element("ram:SellerAssignedID", line.seller_item_id.as_deref(), COMFORT)?;
    w.optional_text_element("ram:BuyerAssignedID", line.buyer_item_id.as_deref(), COMFORT)?;
    w.text_element("ram:Name", &line.item_name, ANY)?;
    w.optional_text_element("ram:Description", line.description.as_deref(), COMFORT)?;
    w.end_element()?;

    w.start_element("ram:SpecifiedLineTradeAgreement", ANY)?;
    if let Some(gross) = line.gross_price {
        w.start_element("ram:GrossPriceProductTradePrice", ANY)?;
        w.amount_element("ram:ChargeAmount", gross, None, ANY)?;
        let discount = gross - line.unit_price;
        if discount > Decimal::ZERO {
            w.start_element("ram:AppliedTradeAllowanceCharge", ANY)?;
            w.start_element("ram:ChargeIndicator", ANY)?;
            w.text_element("udt:Indicator", "false", ANY)?;
            w.end_element()?;
            w.amount_element("ram:ActualAmount", discount, None, ANY)?;
            w.end_element()?;
        }
        w.end_element()?;
    }
    w.start_element("ram:NetPriceProductTradePrice", ANY)?;
    w.amount_element("ram:ChargeAmount", line.unit_price, None, ANY)?;
    w.end_element()?;
    w.end_element()?;

    w.start_element("ram:SpecifiedLineTradeDelivery", ANY)?;
    w.quantity_element("ram:BilledQuantity", line.quantity, &line.unit, ANY)?;
    w.end_element()?;

    w.start_element("ram:SpecifiedLineTradeSettlement", ANY)?;
    w.start_element("ram:ApplicableTradeTax", ANY)?;
    let tax_type = line.tax_type.unwrap_or(TaxType::ValueAddedTax);
    w.text_element("ram:TypeCode", tax_type.code(), ANY)?;
    w.text_element("ram:CategoryCode", line.tax_category.code(), ANY)?;
    w.amount_element("ram:RateApplicablePercent", line.tax_rate, None, ANY)?;
    w.end_element()?;
    for ac in line.allowances.iter().chain(line.charges.iter()) {
        write_allowance_charge(w, ac, false, ANY)?;
    }
    w.start_element("ram:SpecifiedTradeSettlementLineMonetarySummation", ANY)?;
    w.amount_element(
        "ram:LineTotalAmount",
        line.line_amount.unwrap_or(Decimal::ZERO),
        None,
        ANY,
    )?;
    w.end_element()?;
    w.end_element()?;

    w.end_element()?;
    Ok(())
}
