use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Body of every error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

/// Plain acknowledgement.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageBody {
    pub message: String,
}

pub mod invoice {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum InvoiceStatus {
        Paid,
        PartiallyPaid,
        Unpaid,
        Overdue,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LineItem {
        pub product: String,
        pub quantity: i64,
    }

    /// Request body for invoice create and update.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct InvoiceBody {
        pub name: String,
        pub email: Option<String>,
        pub phone: Option<String>,
        pub items: Vec<LineItem>,
        /// Amount paid up front, in minor units.
        #[serde(default)]
        pub amount: i64,
        /// Discount percentage, `0..=100`.
        pub discount: Option<f64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct InvoiceLineView {
        pub product_id: Uuid,
        pub product_name: String,
        pub quantity: i64,
        pub unit_price: i64,
        /// Basis points.
        pub tax_rate: u32,
        pub line_total: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct InvoiceView {
        pub id: Uuid,
        pub invoice_number: i64,
        /// Formatted number, e.g. `INV-000042`.
        pub number: String,
        pub customer_name: String,
        pub customer_email: String,
        pub customer_phone: String,
        pub items: Vec<InvoiceLineView>,
        pub subtotal: i64,
        /// Percentage.
        pub discount: f64,
        pub discount_amount: i64,
        pub total_amount: i64,
        pub amount_paid: i64,
        pub balance_due: i64,
        pub refunded_amount: i64,
        pub status: InvoiceStatus,
        pub issue_date: DateTime<Utc>,
        pub due_date: DateTime<Utc>,
        pub payment_terms: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct InvoiceResponse {
        pub invoice: InvoiceView,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct InvoiceListQuery {
        pub limit: Option<u64>,
        /// Opaque pagination cursor (base64), from `next_cursor`.
        pub cursor: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct InvoiceListResponse {
        pub invoices: Vec<InvoiceView>,
        /// Opaque cursor for fetching the next page (older invoices).
        pub next_cursor: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct StatusUpdate {
        pub status: InvoiceStatus,
        pub payment_amount: Option<i64>,
        pub method: Option<super::payment::PaymentMethod>,
    }
}

pub mod payment {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum PaymentMethod {
        Cash,
        CreditCard,
        BankTransfer,
        Other,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PaymentNew {
        pub name: String,
        pub amount: i64,
        pub invoice_number: Option<i64>,
        pub method: Option<PaymentMethod>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PaymentView {
        pub id: Uuid,
        pub invoice_id: Option<Uuid>,
        pub amount: i64,
        pub method: PaymentMethod,
        pub paid_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PaymentsResponse {
        pub payments: Vec<PaymentView>,
    }
}

pub mod returns {
    use super::*;

    /// Either `invoice_number` or `invoice_id` must be given.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ReturnNew {
        pub invoice_number: Option<i64>,
        pub invoice_id: Option<Uuid>,
        pub product_name: String,
        pub name: String,
        pub quantity: i64,
        pub reason: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ReturnView {
        pub id: Uuid,
        pub invoice_id: Uuid,
        pub product_id: Uuid,
        pub quantity: i64,
        pub unit_price: i64,
        pub refund_amount: i64,
        pub cash_refund: i64,
        pub reason: Option<String>,
        pub returned_at: DateTime<Utc>,
        pub cancelled_at: Option<DateTime<Utc>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ReturnResponse {
        #[serde(rename = "return")]
        pub return_: ReturnView,
    }
}

pub mod customer {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CustomerView {
        pub id: Uuid,
        pub name: String,
        pub email: String,
        pub phone: String,
        pub address: Option<String>,
        pub balance: i64,
        pub outstanding_balance: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountResponse {
        pub customer: CustomerView,
        pub invoices: Vec<Uuid>,
        pub payments: Vec<Uuid>,
        pub returns: Vec<Uuid>,
        pub transactions: Vec<Uuid>,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum EntryKind {
        Invoice,
        Payment,
        Discount,
        Return,
        ReturnCancellation,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum EntryStatus {
        Debit,
        Credit,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct EntryItemView {
        pub product_id: Uuid,
        pub quantity: i64,
        pub price: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LedgerEntryView {
        pub id: Uuid,
        pub kind: EntryKind,
        pub reference_id: Uuid,
        pub invoice_id: Option<Uuid>,
        pub amount: i64,
        pub status: EntryStatus,
        pub details: String,
        pub items: Option<Vec<EntryItemView>>,
        pub recorded_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct StatementResponse {
        pub customer: CustomerView,
        pub entries: Vec<LedgerEntryView>,
        pub total_debit: i64,
        pub total_credit: i64,
        pub balance: i64,
    }
}

pub mod catalog {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ProductNew {
        pub name: String,
        pub product_code: String,
        #[serde(default)]
        pub cost_price: i64,
        pub selling_price: i64,
        /// Basis points.
        #[serde(default)]
        pub tax_rate: u32,
        pub category: Option<String>,
        pub supplier: Option<String>,
        #[serde(default)]
        pub initial_stock: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ProductView {
        pub id: Uuid,
        pub name: String,
        pub product_code: String,
        pub cost_price: i64,
        pub selling_price: i64,
        pub tax_rate: u32,
        pub category: Option<String>,
        pub supplier: Option<String>,
        pub stock: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ProductResponse {
        pub product: ProductView,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ProductsResponse {
        pub products: Vec<ProductView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct StockSet {
        pub quantity: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct StockView {
        pub product_id: Uuid,
        pub quantity: i64,
        pub last_stock_update: DateTime<Utc>,
    }
}

pub mod sales {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SalesOrderView {
        pub order_number: i64,
        pub product_id: Uuid,
        pub product_name: String,
        pub customer_id: Uuid,
        pub count: i64,
        pub subtotal: i64,
        pub last_update: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SalesResponse {
        pub sales: Vec<SalesOrderView>,
    }
}
