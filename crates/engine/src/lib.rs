//! Invoicing and inventory engine.
//!
//! The [`Engine`] owns the database connection and runs every mutating flow
//! (invoice create/update/delete, payments, returns) inside one database
//! transaction, keeping stock, customer balances, payments, sales aggregates
//! and the ledger consistent with each other.

pub use commands::{
    AddPaymentCmd, AddReturnCmd, CreateInvoiceCmd, InvoiceDraft, InvoiceRef, LineRequest,
    NewProductCmd, UpdateInvoiceCmd, UpdateInvoiceStatusCmd,
};
pub use customers::{Customer, CustomerAccount};
pub use error::EngineError;
pub use invoices::{Invoice, InvoiceLine, InvoiceStatus, PAYMENT_TERM_DAYS, format_invoice_number};
pub use ledger::{EntryItem, EntryKind, EntryStatus, LedgerEntry};
pub use money::{DiscountRate, Money};
pub use ops::{
    CustomerStatement, Engine, EngineBuilder, InvoiceListPage, InvoiceView, SalesSummary,
};
pub use payments::{Payment, PaymentMethod};
pub use pricing::InvoiceTotals;
pub use products::Product;
pub use returns::Return;
pub use sales::SalesOrder;
pub use stocks::Stock;

mod commands;
mod counters;
mod customers;
mod error;
mod invoice_items;
mod invoices;
mod ledger;
mod money;
mod ops;
mod payments;
mod pricing;
mod products;
mod returns;
mod sales;
mod stocks;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
