use std::collections::HashMap;

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use super::error::ValidationError;
use super::types::*;

/// Fill in every line amount, the VAT breakdown and the document totals.
///
/// Amounts are rounded to two places, half away from zero, per line and per
/// breakdown group; the document sums are exact sums of those.
pub fn calculate_totals(invoice: &mut Invoice, prepaid: Decimal) {
    for line in &mut invoice.lines {
        line.line_amount = Some(line_amount(line));
    }

    let line_net_total = sum(invoice.lines.iter().filter_map(|l| l.line_amount));
    let allowances_total = sum(invoice.allowances.iter().map(|a| a.amount));
    let charges_total = sum(invoice.charges.iter().map(|c| c.amount));
    let net_total = line_net_total - allowances_total + charges_total;

    let vat_breakdown = vat_breakdown(invoice);
    let vat_total = sum(vat_breakdown.iter().map(|b| b.tax_amount));
    let gross_total = net_total + vat_total;

    invoice.totals = Some(Totals {
        line_net_total,
        allowances_total,
        charges_total,
        net_total,
        vat_total,
        gross_total,
        prepaid,
        amount_due: gross_total - prepaid,
        vat_breakdown,
    });
}

/// Recompute the document arithmetic and report each stored value that
/// disagrees. Nothing is corrected.
pub fn validate_arithmetic(invoice: &Invoice) -> Vec<ValidationError> {
    let Some(totals) = &invoice.totals else {
        return vec![ValidationError::with_rule(
            "totals",
            "totals must be calculated before validation (call calculate_totals first)",
            "BR-CO-10",
        )];
    };

    let mut errors: Vec<ValidationError> = invoice
        .lines
        .iter()
        .enumerate()
        .filter_map(|(i, line)| {
            let stored = line.line_amount?;
            let expected = line_amount(line);
            (stored != expected).then(|| {
                ValidationError::with_rule(
                    format!("lines[{i}].line_amount"),
                    format!("line amount {stored} does not match quantity x price {expected}"),
                    "BR-LIN-04",
                )
            })
        })
        .collect();

    let checks = [
        (
            "totals.line_net_total",
            "BR-CO-10",
            totals.line_net_total,
            sum(invoice.lines.iter().filter_map(|l| l.line_amount)),
        ),
        (
            "totals.net_total",
            "BR-CO-13",
            totals.net_total,
            totals.line_net_total - totals.allowances_total + totals.charges_total,
        ),
        (
            "totals.vat_total",
            "BR-CO-14",
            totals.vat_total,
            sum(totals.vat_breakdown.iter().map(|b| b.tax_amount)),
        ),
        (
            "totals.gross_total",
            "BR-CO-15",
            totals.gross_total,
            totals.net_total + totals.vat_total,
        ),
        (
            "totals.amount_due",
            "BR-CO-16",
            totals.amount_due,
            totals.gross_total - totals.prepaid,
        ),
    ];
    for (field, rule, stored, expected) in checks {
        if stored != expected {
            errors.push(ValidationError::with_rule(
                field,
                format!("stored value {stored} does not match computed {expected}"),
                rule,
            ));
        }
    }

    errors
}

fn sum(values: impl Iterator<Item = Decimal>) -> Decimal {
    values.fold(Decimal::ZERO, |acc, v| acc + v)
}

fn line_amount(line: &LineItem) -> Decimal {
    let allowances = sum(line.allowances.iter().map(|a| a.amount));
    let charges = sum(line.charges.iter().map(|c| c.amount));
    round2(line.quantity * line.unit_price - allowances + charges)
}

/// Group taxable amounts by (category, rate). Document allowances reduce and
/// charges raise the basis of their own group.
fn vat_breakdown(invoice: &Invoice) -> Vec<VatBreakdown> {
    let lines = invoice.lines.iter().map(|l| {
        (l.tax_category, l.tax_rate, l.line_amount.unwrap_or(Decimal::ZERO))
    });
    let allowances = invoice
        .allowances
        .iter()
        .map(|a| (a.tax_category, a.tax_rate, -a.amount));
    let charges = invoice
        .charges
        .iter()
        .map(|c| (c.tax_category, c.tax_rate, c.amount));

    let mut groups: HashMap<(TaxCategory, Decimal), Decimal> = HashMap::new();
    for (category, rate, amount) in lines.chain(allowances).chain(charges) {
        *groups.entry((category, rate)).or_default() += amount;
    }

    let mut breakdown: Vec<VatBreakdown> = groups
        .into_iter()
        .map(|((category, rate), taxable_amount)| VatBreakdown {
            category,
            rate,
            taxable_amount,
            tax_amount: round2(taxable_amount * rate / dec!(100)),
            exemption_reason: exemption_reason(category).map(String::from),
            exemption_reason_code: vatex_code(category).map(String::from),
        })
        .collect();
    breakdown.sort_by(|a, b| {
        a.category
            .code()
            .cmp(b.category.code())
            .then(a.rate.cmp(&b.rate))
    });
    breakdown
}

fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// German default wording for BT-120.
fn exemption_reason(category: TaxCategory) -> Option<&'static str> {
    Some(match category {
        TaxCategory::ReverseCharge => "Steuerschuldnerschaft des Leistungsempfängers gemäß §13b UStG",
        TaxCategory::IntraCommunitySupply => {
            "Steuerfreie innergemeinschaftliche Lieferung gemäß §4 Nr. 1b UStG"
        }
        TaxCategory::Export => "Steuerfreie Ausfuhrlieferung gemäß §4 Nr. 1a UStG",
        TaxCategory::Exempt => "Umsatzsteuerbefreit",
        TaxCategory::NotSubjectToVat => "Nicht steuerbar",
        TaxCategory::StandardRate | TaxCategory::ZeroRated => return None,
    })
}

fn vatex_code(category: TaxCategory) -> Option<&'static str> {
    Some(match category {
        TaxCategory::NotSubjectToVat => "vatex-eu-o",
        TaxCategory::ReverseCharge => "vatex-eu-ae",
        TaxCategory::IntraCommunitySupply => "vatex-eu-ic",
        TaxCategory::Export => "vatex-eu-g",
        TaxCategory::Exempt => "vatex-eu-e",
        TaxCategory::StandardRate | TaxCategory::ZeroRated => return None,
    })
}
