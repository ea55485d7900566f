use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::error::InvoiceError;
use super::totals;
use super::types::*;
use crate::profile::Profile;

/// Upper bound on line items per invoice.
const MAX_LINES: usize = 10_000;
/// Upper bound on the invoice number length.
const MAX_NUMBER_LEN: usize = 200;

/// Builder for [`Invoice`]; [`InvoiceBuilder::build`] calculates the totals.
///
/// ```
/// use zugferd_codec::core::*;
/// use zugferd_codec::profile::Profile;
/// use rust_decimal_macros::dec;
/// use chrono::NaiveDate;
///
/// let invoice = InvoiceBuilder::new("RE-2024-001", NaiveDate::from_ymd_opt(2024, 1, 15).unwrap())
///     .profile(Profile::COMFORT)
///     .seller(PartyBuilder::new("ACME GmbH", AddressBuilder::new("Berlin", "10115", "DE").build())
///         .vat_id("DE123456789")
///         .build())
///     .add_line(LineItemBuilder::new("1", "Beratung", dec!(10), "HUR", dec!(150.00))
///         .tax(TaxCategory::StandardRate, dec!(19))
///         .build())
///     .build()
///     .unwrap();
///
/// assert_eq!(invoice.totals.unwrap().gross_total, dec!(1785.00));
/// ```
pub struct InvoiceBuilder {
    invoice: Invoice,
    prepaid: Decimal,
}

impl InvoiceBuilder {
    /// Start a Comfort-profile EUR commercial invoice.
    pub fn new(number: impl Into<String>, issue_date: NaiveDate) -> Self {
        Self {
            invoice: Invoice {
                profile: Profile::COMFORT,
                number: number.into(),
                issue_date,
                type_code: InvoiceTypeCode::Invoice,
                currency_code: "EUR".to_string(),
                notes: Vec::new(),
                buyer_reference: None,
                order_reference: None,
                preceding_invoices: Vec::new(),
                seller: None,
                buyer: None,
                lines: Vec::new(),
                allowances: Vec::new(),
                charges: Vec::new(),
                totals: None,
                payment_terms: None,
                payment: None,
                tax_point_date: None,
                invoicing_period: None,
            },
            prepaid: Decimal::ZERO,
        }
    }

    pub fn profile(mut self, profile: Profile) -> Self {
        self.invoice.profile = profile;
        self
    }

    pub fn type_code(mut self, code: InvoiceTypeCode) -> Self {
        self.invoice.type_code = code;
        self
    }

    pub fn currency(mut self, code: impl Into<String>) -> Self {
        self.invoice.currency_code = code.into();
        self
    }

    /// Append a document note. May be called repeatedly.
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.invoice.notes.push(note.into());
        self
    }

    pub fn buyer_reference(mut self, reference: impl Into<String>) -> Self {
        self.invoice.buyer_reference = Some(reference.into());
        self
    }

    pub fn order_reference(mut self, reference: impl Into<String>) -> Self {
        self.invoice.order_reference = Some(reference.into());
        self
    }

    pub fn preceding_invoice(mut self, number: impl Into<String>, date: Option<NaiveDate>) -> Self {
        self.invoice.preceding_invoices.push(DocumentReference {
            number: number.into(),
            issue_date: date,
        });
        self
    }

    pub fn seller(mut self, party: Party) -> Self {
        self.invoice.seller = Some(party);
        self
    }

    pub fn buyer(mut self, party: Party) -> Self {
        self.invoice.buyer = Some(party);
        self
    }

    pub fn add_line(mut self, line: LineItem) -> Self {
        self.invoice.lines.push(line);
        self
    }

    /// Add a document-level allowance. `is_charge` is forced to `false`.
    pub fn add_allowance(mut self, allowance: AllowanceCharge) -> Self {
        self.invoice.allowances.push(AllowanceCharge {
            is_charge: false,
            ..allowance
        });
        self
    }

    /// Add a document-level charge. `is_charge` is forced to `true`.
    pub fn add_charge(mut self, charge: AllowanceCharge) -> Self {
        self.invoice.charges.push(AllowanceCharge {
            is_charge: true,
            ..charge
        });
        self
    }

    pub fn payment_terms(mut self, description: impl Into<String>, due_date: Option<NaiveDate>) -> Self {
        self.invoice.payment_terms = Some(PaymentTerms {
            description: Some(description.into()),
            due_date,
        });
        self
    }

    pub fn payment(mut self, payment: PaymentInstructions) -> Self {
        self.invoice.payment = Some(payment);
        self
    }

    pub fn tax_point_date(mut self, date: NaiveDate) -> Self {
        self.invoice.tax_point_date = Some(date);
        self
    }

    pub fn invoicing_period(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.invoice.invoicing_period = Some(Period { start, end });
        self
    }

    /// Amount already paid; subtracted from the gross total.
    pub fn prepaid(mut self, amount: Decimal) -> Self {
        self.prepaid = amount;
        self
    }

    pub fn build(self) -> Result<Invoice, InvoiceError> {
        let Self {
            mut invoice,
            prepaid,
        } = self;

        if invoice.number.trim().is_empty() {
            return Err(InvoiceError::Builder("invoice number is required".into()));
        }
        if invoice.number.len() > MAX_NUMBER_LEN {
            return Err(InvoiceError::Builder(format!(
                "invoice number cannot exceed {MAX_NUMBER_LEN} characters"
            )));
        }
        if invoice.lines.len() > MAX_LINES {
            return Err(InvoiceError::Builder(format!(
                "invoice cannot have more than {MAX_LINES} line items"
            )));
        }
        if invoice
            .invoicing_period
            .as_ref()
            .is_some_and(|p| p.end < p.start)
        {
            return Err(InvoiceError::Builder(
                "invoicing period ends before it starts".into(),
            ));
        }

        totals::calculate_totals(&mut invoice, prepaid);
        Ok(invoice)
    }
}

/// Builder for a seller or buyer [`Party`].
pub struct PartyBuilder(Party);

impl PartyBuilder {
    pub fn new(name: impl Into<String>, address: Address) -> Self {
        Self(Party {
            name: name.into(),
            id: None,
            vat_id: None,
            tax_number: None,
            registration_id: None,
            address,
            contact: None,
            electronic_address: None,
        })
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.0.id = Some(id.into());
        self
    }

    pub fn vat_id(mut self, id: impl Into<String>) -> Self {
        self.0.vat_id = Some(id.into());
        self
    }

    pub fn tax_number(mut self, number: impl Into<String>) -> Self {
        self.0.tax_number = Some(number.into());
        self
    }

    pub fn registration_id(mut self, id: impl Into<String>) -> Self {
        self.0.registration_id = Some(id.into());
        self
    }

    pub fn contact(mut self, contact: Contact) -> Self {
        self.0.contact = Some(contact);
        self
    }

    /// Electronic address, e.g. `("EM", "billing@example.com")`.
    pub fn electronic_address(
        mut self,
        scheme: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.0.electronic_address = Some(ElectronicAddress {
            scheme: scheme.into(),
            value: value.into(),
        });
        self
    }

    pub fn build(self) -> Party {
        self.0
    }
}

pub struct AddressBuilder(Address);

impl AddressBuilder {
    pub fn new(
        city: impl Into<String>,
        postal_code: impl Into<String>,
        country_code: impl Into<String>,
    ) -> Self {
        Self(Address {
            street: None,
            additional: None,
            city: city.into(),
            postal_code: postal_code.into(),
            country_code: country_code.into(),
        })
    }

    pub fn street(mut self, street: impl Into<String>) -> Self {
        self.0.street = Some(street.into());
        self
    }

    pub fn additional(mut self, line: impl Into<String>) -> Self {
        self.0.additional = Some(line.into());
        self
    }

    pub fn build(self) -> Address {
        self.0
    }
}

/// Builder for a [`LineItem`]. Defaults to VAT, category `S`, 19 %.
pub struct LineItemBuilder(LineItem);

impl LineItemBuilder {
    pub fn new(
        id: impl Into<String>,
        item_name: impl Into<String>,
        quantity: Decimal,
        unit: impl Into<String>,
        unit_price: Decimal,
    ) -> Self {
        Self(LineItem {
            id: id.into(),
            note: None,
            quantity,
            unit: unit.into(),
            unit_price,
            gross_price: None,
            allowances: Vec::new(),
            charges: Vec::new(),
            tax_type: Some(TaxType::ValueAddedTax),
            tax_category: TaxCategory::StandardRate,
            tax_rate: Decimal::new(19, 0),
            item_name: item_name.into(),
            description: None,
            seller_item_id: None,
            buyer_item_id: None,
            standard_item_id: None,
            line_amount: None,
        })
    }

    pub fn tax(mut self, category: TaxCategory, rate: Decimal) -> Self {
        self.0.tax_category = category;
        self.0.tax_rate = rate;
        self
    }

    pub fn tax_type(mut self, tax_type: TaxType) -> Self {
        self.0.tax_type = Some(tax_type);
        self
    }

    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.0.note = Some(note.into());
        self
    }

    /// Price before the item discount.
    pub fn gross_price(mut self, price: Decimal) -> Self {
        self.0.gross_price = Some(price);
        self
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.0.description = Some(text.into());
        self
    }

    pub fn seller_item_id(mut self, id: impl Into<String>) -> Self {
        self.0.seller_item_id = Some(id.into());
        self
    }

    pub fn buyer_item_id(mut self, id: impl Into<String>) -> Self {
        self.0.buyer_item_id = Some(id.into());
        self
    }

    /// GTIN of the item.
    pub fn standard_item_id(mut self, gtin: impl Into<String>) -> Self {
        self.0.standard_item_id = Some(gtin.into());
        self
    }

    pub fn add_allowance(mut self, allowance: AllowanceCharge) -> Self {
        self.0.allowances.push(AllowanceCharge {
            is_charge: false,
            ..allowance
        });
        self
    }

    pub fn add_charge(mut self, charge: AllowanceCharge) -> Self {
        self.0.charges.push(AllowanceCharge {
            is_charge: true,
            ..charge
        });
        self
    }

    /// The line amount stays unset until the invoice is built.
    pub fn build(self) -> LineItem {
        self.0
    }
}
