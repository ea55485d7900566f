//! ZUGFeRD 1.0 `CrossIndustryDocument` writer.
//!
//! Same gating scheme as the 2.x writer, but 1.0 only knows Basic, Comfort
//! and Extended. Amounts always carry `currencyID` and line items follow the
//! settlement block.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::cii1_ns;
use super::sink::XmlSink;
use super::writer::ProfileAwareXmlWriter;
use crate::core::*;
use crate::date::{FORMAT_102, format_naive_date};
use crate::profile::Profile;

const ANY: Profile = Profile::ANY;
const COMFORT: Profile = Profile::COMFORT_AND_UP;

pub(crate) fn write_cii1<S: XmlSink>(
    w: &mut ProfileAwareXmlWriter<S>,
    invoice: &Invoice,
    guideline_urn: &str,
) -> Result<(), InvoiceError> {
    let totals = invoice.totals.as_ref().ok_or_else(|| {
        InvoiceError::Builder("totals must be calculated before XML generation".into())
    })?;
    let cur = invoice.currency_code.as_str();

    w.start_element_ns("rsm:CrossIndustryDocument", cii1_ns::RSM, ANY)?;
    w.attribute("xmlns:ram", cii1_ns::RAM, ANY)?;
    w.attribute("xmlns:udt", cii1_ns::UDT, ANY)?;

    w.start_element("rsm:SpecifiedExchangedDocumentContext", ANY)?;
    w.start_element("ram:GuidelineSpecifiedDocumentContextParameter", ANY)?;
    w.text_element("ram:ID", guideline_urn, ANY)?;
    w.end_element()?;
    w.end_element()?;

    w.start_element("rsm:HeaderExchangedDocument", ANY)?;
    w.text_element("ram:ID", &invoice.number, ANY)?;
    w.text_element("ram:Name", document_name(invoice.type_code), ANY)?;
    w.text_element("ram:TypeCode", &invoice.type_code.code().to_string(), ANY)?;
    write_date(w, "ram:IssueDateTime", &invoice.issue_date)?;
    for note in &invoice.notes {
        w.start_element("ram:IncludedNote", ANY)?;
        w.text_element("ram:Content", note, ANY)?;
        w.end_element()?;
    }
    w.end_element()?;

    w.start_element("rsm:SpecifiedSupplyChainTradeTransaction", ANY)?;

    // --- Agreement ---
    w.start_element("ram:ApplicableSupplyChainTradeAgreement", ANY)?;
    w.optional_text_element("ram:BuyerReference", invoice.buyer_reference.as_deref(), ANY)?;
    if let Some(seller) = &invoice.seller {
        write_party(w, seller, "ram:SellerTradeParty")?;
    }
    if let Some(buyer) = &invoice.buyer {
        write_party(w, buyer, "ram:BuyerTradeParty")?;
    }
    if let Some(order) = &invoice.order_reference {
        w.start_element("ram:BuyerOrderReferencedDocument", COMFORT)?;
        w.text_element("ram:ID", order, ANY)?;
        w.end_element()?;
    }
    w.end_element()?;

    // --- Delivery ---
    w.start_element("ram:ApplicableSupplyChainTradeDelivery", ANY)?;
    if let Some(tpd) = &invoice.tax_point_date {
        w.start_element("ram:ActualDeliverySupplyChainEvent", ANY)?;
        write_date(w, "ram:OccurrenceDateTime", tpd)?;
        w.end_element()?;
    }
    w.end_element()?;

    // --- Settlement ---
    w.start_element("ram:ApplicableSupplyChainTradeSettlement", ANY)?;
    if let Some(payment) = &invoice.payment {
        w.optional_text_element(
            "ram:PaymentReference",
            payment.remittance_info.as_deref(),
            ANY,
        )?;
    }
    w.text_element("ram:InvoiceCurrencyCode", cur, ANY)?;

    if let Some(payment) = &invoice.payment {
        w.start_element("ram:SpecifiedTradeSettlementPaymentMeans", ANY)?;
        w.text_element("ram:TypeCode", &payment.means_code.code().to_string(), COMFORT)?;
        w.optional_text_element("ram:Information", payment.means_text.as_deref(), COMFORT)?;
        if let Some(ct) = &payment.credit_transfer {
            w.start_element("ram:PayeePartyCreditorFinancialAccount", ANY)?;
            w.text_element("ram:IBANID", &ct.iban, ANY)?;
            w.optional_text_element("ram:AccountName", ct.account_name.as_deref(), COMFORT)?;
            w.end_element()?;
            if let Some(bic) = &ct.bic {
                w.start_element("ram:PayeeSpecifiedCreditorFinancialInstitution", ANY)?;
                w.text_element("ram:BICID", bic, ANY)?;
                w.end_element()?;
            }
        }
        w.end_element()?;
    }

    for bd in &totals.vat_breakdown {
        w.start_element("ram:ApplicableTradeTax", ANY)?;
        w.amount_element("ram:CalculatedAmount", bd.tax_amount, Some(cur), ANY)?;
        w.text_element("ram:TypeCode", TaxType::ValueAddedTax.code(), ANY)?;
        w.optional_text_element("ram:ExemptionReason", bd.exemption_reason.as_deref(), COMFORT)?;
        w.amount_element("ram:BasisAmount", bd.taxable_amount, Some(cur), ANY)?;
        w.text_element("ram:CategoryCode", bd.category.code(), COMFORT)?;
        w.amount_element("ram:ApplicablePercent", bd.rate, None, ANY)?;
        w.end_element()?;
    }

    if let Some(period) = &invoice.invoicing_period {
        w.start_element("ram:BillingSpecifiedPeriod", COMFORT)?;
        write_date(w, "ram:StartDateTime", &period.start)?;
        write_date(w, "ram:EndDateTime", &period.end)?;
        w.end_element()?;
    }

    for ac in invoice.allowances.iter().chain(invoice.charges.iter()) {
        w.start_element("ram:SpecifiedTradeAllowanceCharge", COMFORT)?;
        write_allowance_charge_body(w, ac, cur)?;
        w.start_element("ram:CategoryTradeTax", ANY)?;
        w.text_element("ram:TypeCode", TaxType::ValueAddedTax.code(), ANY)?;
        w.text_element("ram:CategoryCode", ac.tax_category.code(), ANY)?;
        w.amount_element("ram:ApplicablePercent", ac.tax_rate, None, ANY)?;
        w.end_element()?;
        w.end_element()?;
    }

    if let Some(terms) = &invoice.payment_terms {
        w.start_element("ram:SpecifiedTradePaymentTerms", COMFORT)?;
        w.optional_text_element("ram:Description", terms.description.as_deref(), ANY)?;
        if let Some(due) = &terms.due_date {
            write_date(w, "ram:DueDateDateTime", due)?;
        }
        w.end_element()?;
    }

    w.start_element("ram:SpecifiedTradeSettlementMonetarySummation", ANY)?;
    w.amount_element("ram:LineTotalAmount", totals.line_net_total, Some(cur), ANY)?;
    w.amount_element("ram:ChargeTotalAmount", totals.charges_total, Some(cur), ANY)?;
    w.amount_element("ram:AllowanceTotalAmount", totals.allowances_total, Some(cur), ANY)?;
    w.amount_element("ram:TaxBasisTotalAmount", totals.net_total, Some(cur), ANY)?;
    w.amount_element("ram:TaxTotalAmount", totals.vat_total, Some(cur), ANY)?;
    w.amount_element("ram:GrandTotalAmount", totals.gross_total, Some(cur), ANY)?;
    if totals.prepaid > Decimal::ZERO {
        w.amount_element("ram:TotalPrepaidAmount", totals.prepaid, Some(cur), COMFORT)?;
    }
    w.amount_element("ram:DuePayableAmount", totals.amount_due, Some(cur), COMFORT)?;
    w.end_element()?;

    w.end_element()?; // settlement

    for line in &invoice.lines {
        write_line(w, line, cur)?;
    }

    w.end_element()?; // transaction
    w.end_element()?; // root
    Ok(())
}

fn document_name(code: InvoiceTypeCode) -> &'static str {
    if code.is_credit_note() {
        "GUTSCHRIFT"
    } else {
        "RECHNUNG"
    }
}

fn write_date<S: XmlSink>(
    w: &mut ProfileAwareXmlWriter<S>,
    element: &str,
    date: &NaiveDate,
) -> Result<(), InvoiceError> {
    w.start_element(element, ANY)?;
    w.text_element_with_attrs(
        "udt:DateTimeString",
        &format_naive_date(date, true),
        &[("format", FORMAT_102)],
        ANY,
    )?;
    w.end_element()?;
    Ok(())
}

fn write_party<S: XmlSink>(
    w: &mut ProfileAwareXmlWriter<S>,
    party: &Party,
    element: &str,
) -> Result<(), InvoiceError> {
    w.start_element(element, ANY)?;
    w.optional_text_element("ram:ID", party.id.as_deref(), COMFORT)?;
    w.text_element("ram:Name", &party.name, ANY)?;

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

    w.start_element("ram:PostalTradeAddress", ANY)?;
    w.text_element("ram:PostcodeCode", &party.address.postal_code, ANY)?;
    w.optional_text_element("ram:LineOne", party.address.street.as_deref(), ANY)?;
    w.optional_text_element("ram:LineTwo", party.address.additional.as_deref(), ANY)?;
    w.text_element("ram:CityName", &party.address.city, ANY)?;
    w.text_element("ram:CountryID", &party.address.country_code, ANY)?;
    w.end_element()?;

    for (id, scheme) in [(&party.vat_id, "VA"), (&party.tax_number, "FC")] {
        if let Some(id) = id {
            w.start_element("ram:SpecifiedTaxRegistration", ANY)?;
            w.text_element_with_attrs("ram:ID", id, &[("schemeID", scheme)], ANY)?;
            w.end_element()?;
        }
    }

    w.end_element()?;
    Ok(())
}

fn write_allowance_charge_body<S: XmlSink>(
    w: &mut ProfileAwareXmlWriter<S>,
    ac: &AllowanceCharge,
    cur: &str,
) -> Result<(), InvoiceError> {
    w.start_element("ram:ChargeIndicator", ANY)?;
    w.text_element("udt:Indicator", if ac.is_charge { "true" } else { "false" }, ANY)?;
    w.end_element()?;
    if let Some(base) = ac.base_amount {
        w.amount_element("ram:BasisAmount", base, Some(cur), ANY)?;
    }
    w.amount_element("ram:ActualAmount", ac.amount, Some(cur), ANY)?;
    w.optional_text_element("ram:ReasonCode", ac.reason_code.as_deref(), ANY)?;
    w.optional_text_element("ram:Reason", ac.reason.as_deref(), ANY)?;
    Ok(())
}

fn write_line<S: XmlSink>(
    w: &mut ProfileAwareXmlWriter<S>,
    line: &LineItem,
    cur: &str,
) -> Result<(), InvoiceError> {
    w.start_element("ram:IncludedSupplyChainTradeLineItem", ANY)?;

    w.start_element("ram:AssociatedDocumentLineDocument", COMFORT)?;
    w.text_element("ram:LineID", &line.id, ANY)?;
    if let Some(note) = &line.note {
        w.start_element("ram:IncludedNote", ANY)?;
        w.text_element("ram:Content", note, ANY)?;
        w.end_element()?;
    }
    w.end_element()?;

    w.start_element("ram:SpecifiedSupplyChainTradeAgreement", COMFORT)?;
    if let Some(gross) = line.gross_price {
        w.start_element("ram:GrossPriceProductTradePrice", ANY)?;
        w.amount_element("ram:ChargeAmount", gross, Some(cur), ANY)?;
        w.end_element()?;
    }
    w.start_element("ram:NetPriceProductTradePrice", ANY)?;
    w.amount_element("ram:ChargeAmount", line.unit_price, Some(cur), ANY)?;
    w.end_element()?;
    w.end_element()?;

    w.start_element("ram:SpecifiedSupplyChainTradeDelivery", ANY)?;
    w.quantity_element("ram:BilledQuantity", line.quantity, &line.unit, ANY)?;
    w.end_element()?;

    w.start_element("ram:SpecifiedSupplyChainTradeSettlement", ANY)?;
    w.start_element("ram:ApplicableTradeTax", COMFORT)?;
    let tax_type = line.tax_type.unwrap_or(TaxType::ValueAddedTax);
    w.text_element("ram:TypeCode", tax_type.code(), ANY)?;
    w.text_element("ram:CategoryCode", line.tax_category.code(), ANY)?;
    w.amount_element("ram:ApplicablePercent", line.tax_rate, None, ANY)?;
    w.end_element()?;
    for ac in line.allowances.iter().chain(line.charges.iter()) {
        w.start_element("ram:SpecifiedTradeAllowanceCharge", Profile::EXTENDED)?;
        write_allowance_charge_body(w, ac, cur)?;
        w.end_element()?;
    }
    w.start_element("ram:SpecifiedTradeSettlementMonetarySummation", ANY)?;
    w.amount_element(
        "ram:LineTotalAmount",
        line.line_amount.unwrap_or(Decimal::ZERO),
        Some(cur),
        ANY,
    )?;
    w.end_element()?;
    w.end_element()?;

    w.start_element("ram:SpecifiedTradeProduct", ANY)?;
    if let Some(gtin) = &line.standard_item_id {
        w.text_element_with_attrs("ram:GlobalID", gtin, &[("schemeID", "0160")], COMFORT)?;
    }
    w.optional_text_element("ram:SellerAssignedID", line.seller_item_id.as_deref(), COMFORT)?;
    w.optional_text_element("ram:BuyerAssignedID", line.buyer_item_id.as_deref(), COMFORT)?;
    w.text_element("ram:Name", &line.item_name, ANY)?;
    w.optional_text_element("ram:Description", line.description.as_deref(), COMFORT)?;
    w.end_element()?;

    w.end_element()?;
    Ok(())
}
