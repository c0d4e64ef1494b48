//! Command structs for engine operations.
//!
//! These types group parameters for write operations (invoice create/update,
//! payments, returns, catalog seeding), keeping call sites readable and
//! avoiding long argument lists.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{DiscountRate, InvoiceStatus, PaymentMethod};

/// A requested invoice line: a product looked up by name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineRequest {
    pub product: String,
    pub quantity: i64,
}

/// Body shared by invoice create and update.
#[derive(Clone, Debug, PartialEq)]
pub struct InvoiceDraft {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub items: Vec<LineRequest>,
    /// Amount paid up front, in minor units.
    pub amount: i64,
    pub discount: DiscountRate,
}

impl InvoiceDraft {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: None,
            phone: None,
            items: Vec::new(),
            amount: 0,
            discount: DiscountRate::NONE,
        }
    }

    #[must_use]
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    #[must_use]
    pub fn phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    #[must_use]
    pub fn item(mut self, product: impl Into<String>, quantity: i64) -> Self {
        self.items.push(LineRequest {
            product: product.into(),
            quantity,
        });
        self
    }

    #[must_use]
    pub fn amount(mut self, amount: i64) -> Self {
        self.amount = amount;
        self
    }

    #[must_use]
    pub fn discount(mut self, discount: DiscountRate) -> Self {
        self.discount = discount;
        self
    }
}

/// Create an invoice.
#[derive(Clone, Debug, PartialEq)]
pub struct CreateInvoiceCmd {
    pub draft: InvoiceDraft,
    pub issued_at: DateTime<Utc>,
}

impl CreateInvoiceCmd {
    #[must_use]
    pub fn new(draft: InvoiceDraft, issued_at: DateTime<Utc>) -> Self {
        Self { draft, issued_at }
    }
}

/// Rewrite an existing invoice with a new body.
#[derive(Clone, Debug, PartialEq)]
pub struct UpdateInvoiceCmd {
    pub invoice_id: Uuid,
    pub draft: InvoiceDraft,
    pub updated_at: DateTime<Utc>,
}

impl UpdateInvoiceCmd {
    #[must_use]
    pub fn new(invoice_id: Uuid, draft: InvoiceDraft, updated_at: DateTime<Utc>) -> Self {
        Self {
            invoice_id,
            draft,
            updated_at,
        }
    }
}

/// Set an invoice status, optionally recording a final payment.
#[derive(Clone, Debug, PartialEq)]
pub struct UpdateInvoiceStatusCmd {
    pub invoice_id: Uuid,
    pub status: InvoiceStatus,
    pub payment_amount: Option<i64>,
    pub method: PaymentMethod,
    pub at: DateTime<Utc>,
}

impl UpdateInvoiceStatusCmd {
    #[must_use]
    pub fn new(invoice_id: Uuid, status: InvoiceStatus, at: DateTime<Utc>) -> Self {
        Self {
            invoice_id,
            status,
            payment_amount: None,
            method: PaymentMethod::default(),
            at,
        }
    }

    #[must_use]
    pub fn payment_amount(mut self, amount: i64) -> Self {
        self.payment_amount = Some(amount);
        self
    }

    #[must_use]
    pub fn method(mut self, method: PaymentMethod) -> Self {
        self.method = method;
        self
    }
}

/// Record a payment from a customer.
///
/// Without an invoice number the amount is spread over the customer's open
/// invoices, oldest first.
#[derive(Clone, Debug, PartialEq)]
pub struct AddPaymentCmd {
    pub name: String,
    pub amount: i64,
    pub invoice_number: Option<i64>,
    pub method: PaymentMethod,
    pub paid_at: DateTime<Utc>,
}

impl AddPaymentCmd {
    #[must_use]
    pub fn new(name: impl Into<String>, amount: i64, paid_at: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            amount,
            invoice_number: None,
            method: PaymentMethod::default(),
            paid_at,
        }
    }

    #[must_use]
    pub fn invoice_number(mut self, number: i64) -> Self {
        self.invoice_number = Some(number);
        self
    }

    #[must_use]
    pub fn method(mut self, method: PaymentMethod) -> Self {
        self.method = method;
        self
    }
}

/// How a caller points at an invoice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InvoiceRef {
    Number(i64),
    Id(Uuid),
}

/// Return some units of a product sold on an invoice.
#[derive(Clone, Debug, PartialEq)]
pub struct AddReturnCmd {
    pub invoice: InvoiceRef,
    pub product_name: String,
    pub name: String,
    pub quantity: i64,
    pub reason: Option<String>,
    pub returned_at: DateTime<Utc>,
}

impl AddReturnCmd {
    #[must_use]
    pub fn new(
        invoice: InvoiceRef,
        product_name: impl Into<String>,
        name: impl Into<String>,
        quantity: i64,
        returned_at: DateTime<Utc>,
    ) -> Self {
        Self {
            invoice,
            product_name: product_name.into(),
            name: name.into(),
            quantity,
            reason: None,
            returned_at,
        }
    }

    #[must_use]
    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// Add a product to the catalog, with its initial stock.
#[derive(Clone, Debug, PartialEq)]
pub struct NewProductCmd {
    pub name: String,
    pub product_code: String,
    pub cost_price: i64,
    pub selling_price: i64,
    pub tax_rate: u32,
    pub category: Option<String>,
    pub supplier: Option<String>,
    pub initial_stock: i64,
    pub created_at: DateTime<Utc>,
}

impl NewProductCmd {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        product_code: impl Into<String>,
        selling_price: i64,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            product_code: product_code.into(),
            cost_price: 0,
            selling_price,
            tax_rate: 0,
            category: None,
            supplier: None,
            initial_stock: 0,
            created_at,
        }
    }

    #[must_use]
    pub fn cost_price(mut self, cost_price: i64) -> Self {
        self.cost_price = cost_price;
        self
    }

    #[must_use]
    pub fn tax_rate(mut self, basis_points: u32) -> Self {
        self.tax_rate = basis_points;
        self
    }

    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn supplier(mut self, supplier: impl Into<String>) -> Self {
        self.supplier = Some(supplier.into());
        self
    }

    #[must_use]
    pub fn initial_stock(mut self, quantity: i64) -> Self {
        self.initial_stock = quantity;
        self
    }
}
