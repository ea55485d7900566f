use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::profile::Profile;

/// An invoice as the writers see it. Terms reference the EN 16931 semantic
/// model (BT = business term, BG = business group).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    /// Profile the invoice was built for; output may override it.
    pub profile: Profile,
    /// BT-1
    pub number: String,
    /// BT-2
    pub issue_date: NaiveDate,
    /// BT-3
    pub type_code: InvoiceTypeCode,
    /// BT-5, ISO 4217.
    pub currency_code: String,
    /// BT-22, free text in document order.
    pub notes: Vec<String>,
    /// BT-10. XRechnung carries the Leitweg-ID here.
    pub buyer_reference: Option<String>,
    /// BT-13
    pub order_reference: Option<String>,
    /// BG-3
    pub preceding_invoices: Vec<DocumentReference>,
    /// BG-4
    pub seller: Option<Party>,
    /// BG-7
    pub buyer: Option<Party>,
    /// BG-25
    pub lines: Vec<LineItem>,
    /// BG-20
    pub allowances: Vec<AllowanceCharge>,
    /// BG-21
    pub charges: Vec<AllowanceCharge>,
    /// BG-22. `None` until [`super::calculate_totals`] ran.
    pub totals: Option<Totals>,
    /// BT-20 and BT-9.
    pub payment_terms: Option<PaymentTerms>,
    /// BG-16
    pub payment: Option<PaymentInstructions>,
    /// BT-72, written as the actual delivery event.
    pub tax_point_date: Option<NaiveDate>,
    /// BG-14
    pub invoicing_period: Option<Period>,
}

/// Seller (BG-4) or buyer (BG-7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Party {
    pub name: String,
    /// Global or seller-assigned party id.
    pub id: Option<String>,
    /// Written with scheme `VA`.
    pub vat_id: Option<String>,
    /// German Steuernummer, written with scheme `FC`.
    pub tax_number: Option<String>,
    /// Legal registration (commercial register) id.
    pub registration_id: Option<String>,
    pub address: Address,
    /// Mandatory on the seller for XRechnung.
    pub contact: Option<Contact>,
    /// Endpoint for electronic delivery (BT-34 / BT-49).
    pub electronic_address: Option<ElectronicAddress>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Address {
    pub street: Option<String>,
    pub additional: Option<String>,
    pub city: String,
    pub postal_code: String,
    /// ISO 3166-1 alpha-2.
    pub country_code: String,
}

/// Contact point (BG-6 / BG-9).
///
/// XRechnung accepts either a person name or a department for BT-41.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Contact {
    pub name: Option<String>,
    pub org_unit: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElectronicAddress {
    /// EAS scheme, e.g. `EM` for email.
    pub scheme: String,
    pub value: String,
}

/// Preceding invoice (BT-25 / BT-26).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentReference {
    pub number: String,
    pub issue_date: Option<NaiveDate>,
}

/// Invoice line (BG-25).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    pub id: String,
    pub note: Option<String>,
    pub quantity: Decimal,
    /// UN/ECE Recommendation 20 unit code, e.g. `C62` or `HUR`.
    pub unit: String,
    /// Net price per unit.
    pub unit_price: Decimal,
    /// Price before the item discount; the difference to `unit_price` is
    /// written as a price allowance.
    pub gross_price: Option<Decimal>,
    pub allowances: Vec<AllowanceCharge>,
    pub charges: Vec<AllowanceCharge>,
    /// `None` means VAT. Anything else needs the Extended profile.
    pub tax_type: Option<TaxType>,
    pub tax_category: TaxCategory,
    pub tax_rate: Decimal,
    pub item_name: String,
    pub description: Option<String>,
    pub seller_item_id: Option<String>,
    pub buyer_item_id: Option<String>,
    /// GTIN, written with scheme `0160`.
    pub standard_item_id: Option<String>,
    /// Net line amount. Filled in by [`super::calculate_totals`].
    pub line_amount: Option<Decimal>,
}

/// Declares a closed code list: the enum, `code()`, `from_code()` and a
/// `Display` that prints the code.
macro_rules! code_list {
    (
        $(#[$meta:meta])*
        $name:ident : $code_ty:ty, from $arg_ty:ty {
            $( $(#[$vmeta:meta])* $variant:ident = $code:literal, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )+
        }

        impl $name {
            pub fn code(&self) -> $code_ty {
                match self {
                    $( Self::$variant => $code, )+
                }
            }

            pub fn from_code(code: $arg_ty) -> Option<Self> {
                match code {
                    $( $code => Some(Self::$variant), )+
                    _ => None,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.code())
            }
        }
    };
}

code_list! {
    /// UNTDID 5153 duty / tax / fee type.
    TaxType: &'static str, from &str {
        ValueAddedTax = "VAT",
        GoodsAndServicesTax = "GST",
        SalesTax = "SAL",
        ExciseDuty = "EXC",
        EnvironmentalTax = "ENV",
        CustomsDuty = "CUD",
        OtherTaxes = "OTH",
    }
}

code_list! {
    /// UNTDID 5305 VAT category.
    TaxCategory: &'static str, from &str {
        StandardRate = "S",
        ZeroRated = "Z",
        Exempt = "E",
        ReverseCharge = "AE",
        /// Intra-community supply.
        IntraCommunitySupply = "K",
        /// Export outside the EU.
        Export = "G",
        NotSubjectToVat = "O",
    }
}

code_list! {
    /// UNTDID 1001 document type.
    InvoiceTypeCode: u16, from u16 {
        Invoice = 380,
        CreditNote = 381,
        DebitNote = 383,
        /// Corrected invoice.
        Correction = 384,
        Prepayment = 386,
        SelfBilledInvoice = 389,
        SelfBilledCreditNote = 261,
        PartialInvoice = 326,
        PartialConstructionInvoice = 875,
        PartialFinalConstructionInvoice = 876,
        FinalConstructionInvoice = 877,
    }
}

impl InvoiceTypeCode {
    /// Written as UBL `CreditNote` and named `GUTSCHRIFT` in ZUGFeRD 1.0.
    pub fn is_credit_note(&self) -> bool {
        matches!(self, Self::CreditNote | Self::SelfBilledCreditNote)
    }
}

/// Allowance (`is_charge == false`) or charge, on the document or a line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllowanceCharge {
    pub is_charge: bool,
    pub amount: Decimal,
    pub percentage: Option<Decimal>,
    /// Base the percentage applies to.
    pub base_amount: Option<Decimal>,
    pub tax_category: TaxCategory,
    pub tax_rate: Decimal,
    pub reason: Option<String>,
    /// UNTDID 5189 for allowances, 7161 for charges.
    pub reason_code: Option<String>,
}

/// Document totals (BG-22).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Totals {
    /// BT-106
    pub line_net_total: Decimal,
    /// BT-107
    pub allowances_total: Decimal,
    /// BT-108
    pub charges_total: Decimal,
    /// BT-109, the tax basis.
    pub net_total: Decimal,
    /// BT-110
    pub vat_total: Decimal,
    /// BT-112
    pub gross_total: Decimal,
    /// BT-113
    pub prepaid: Decimal,
    /// BT-115
    pub amount_due: Decimal,
    /// One entry per (category, rate) pair, sorted by category code and rate.
    pub vat_breakdown: Vec<VatBreakdown>,
}

/// VAT breakdown entry (BG-23).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VatBreakdown {
    pub category: TaxCategory,
    pub rate: Decimal,
    pub taxable_amount: Decimal,
    pub tax_amount: Decimal,
    pub exemption_reason: Option<String>,
    /// VATEX code, derived from the category.
    pub exemption_reason_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentTerms {
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
}

/// Payment instructions (BG-16).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentInstructions {
    pub means_code: PaymentMeansCode,
    /// Free-text name of the payment means.
    pub means_text: Option<String>,
    /// Verwendungszweck; written as the payment reference.
    pub remittance_info: Option<String>,
    pub credit_transfer: Option<CreditTransfer>,
}

/// Payee bank account (BG-17).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditTransfer {
    pub iban: String,
    pub bic: Option<String>,
    pub account_name: Option<String>,
}

/// UNTDID 4461 payment means. Codes without a named variant survive as
/// [`PaymentMeansCode::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMeansCode {
    Cash,
    CreditTransfer,
    PaymentToBankAccount,
    BankCard,
    DirectDebit,
    SepaCreditTransfer,
    SepaDirectDebit,
    Other(u16),
}

const PAYMENT_MEANS: [(PaymentMeansCode, u16); 7] = [
    (PaymentMeansCode::Cash, 10),
    (PaymentMeansCode::CreditTransfer, 30),
    (PaymentMeansCode::PaymentToBankAccount, 42),
    (PaymentMeansCode::BankCard, 48),
    (PaymentMeansCode::DirectDebit, 49),
    (PaymentMeansCode::SepaCreditTransfer, 58),
    (PaymentMeansCode::SepaDirectDebit, 59),
];

impl PaymentMeansCode {
    pub fn code(&self) -> u16 {
        match self {
            Self::Other(c) => *c,
            named => PAYMENT_MEANS
                .iter()
                .find(|(m, _)| m == named)
                .map_or(0, |(_, c)| *c),
        }
    }

    pub fn from_code(code: u16) -> Self {
        PAYMENT_MEANS
            .iter()
            .find(|(_, c)| *c == code)
            .map_or(Self::Other(code), |(m, _)| *m)
    }
}

/// Invoicing period (BG-14), both ends inclusive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
}
