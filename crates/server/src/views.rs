//! Mapping from engine values to API bodies.

use api_types::{
    catalog::{ProductView, StockView},
    customer::{
        AccountResponse, CustomerView, EntryItemView, EntryKind as ApiEntryKind,
        EntryStatus as ApiEntryStatus, LedgerEntryView, StatementResponse,
    },
    invoice::{InvoiceLineView, InvoiceStatus as ApiStatus, InvoiceView},
    payment::{PaymentMethod as ApiMethod, PaymentView},
    returns::ReturnView,
    sales::SalesOrderView,
};
use chrono::{DateTime, Utc};
use engine::{DiscountRate, EntryKind, EntryStatus, InvoiceStatus, PaymentMethod};

pub(crate) fn map_status(status: InvoiceStatus) -> ApiStatus {
    match status {
        InvoiceStatus::Paid => ApiStatus::Paid,
        InvoiceStatus::PartiallyPaid => ApiStatus::PartiallyPaid,
        InvoiceStatus::Unpaid => ApiStatus::Unpaid,
        InvoiceStatus::Overdue => ApiStatus::Overdue,
    }
}

pub(crate) fn status_from_api(status: ApiStatus) -> InvoiceStatus {
    match status {
        ApiStatus::Paid => InvoiceStatus::Paid,
        ApiStatus::PartiallyPaid => InvoiceStatus::PartiallyPaid,
        ApiStatus::Unpaid => InvoiceStatus::Unpaid,
        ApiStatus::Overdue => InvoiceStatus::Overdue,
    }
}

pub(crate) fn method_from_api(method: Option<ApiMethod>) -> PaymentMethod {
    match method {
        None | Some(ApiMethod::Cash) => PaymentMethod::Cash,
        Some(ApiMethod::CreditCard) => PaymentMethod::CreditCard,
        Some(ApiMethod::BankTransfer) => PaymentMethod::BankTransfer,
        Some(ApiMethod::Other) => PaymentMethod::Other,
    }
}

fn map_method(method: PaymentMethod) -> ApiMethod {
    match method {
        PaymentMethod::Cash => ApiMethod::Cash,
        PaymentMethod::CreditCard => ApiMethod::CreditCard,
        PaymentMethod::BankTransfer => ApiMethod::BankTransfer,
        PaymentMethod::Other => ApiMethod::Other,
    }
}

fn map_kind(kind: EntryKind) -> ApiEntryKind {
    match kind {
        EntryKind::Invoice => ApiEntryKind::Invoice,
        EntryKind::Payment => ApiEntryKind::Payment,
        EntryKind::Discount => ApiEntryKind::Discount,
        EntryKind::Return => ApiEntryKind::Return,
        EntryKind::ReturnCancellation => ApiEntryKind::ReturnCancellation,
    }
}

fn map_entry_status(status: EntryStatus) -> ApiEntryStatus {
    match status {
        EntryStatus::Debit => ApiEntryStatus::Debit,
        EntryStatus::Credit => ApiEntryStatus::Credit,
    }
}

/// Invoice body as served; the status reads `overdue` once the due date has
/// passed with a balance still open.
pub(crate) fn invoice_view(view: engine::InvoiceView, now: DateTime<Utc>) -> InvoiceView {
    let invoice = view.invoice;
    let discount = DiscountRate::from_basis_points(invoice.discount_rate)
        .map(DiscountRate::percent)
        .unwrap_or_default();

    InvoiceView {
        id: invoice.id,
        invoice_number: invoice.invoice_number,
        number: invoice.display_number(),
        customer_name: view.customer_name,
        customer_email: view.customer_email,
        customer_phone: view.customer_phone,
        status: map_status(invoice.status_at(now)),
        items: invoice
            .lines
            .into_iter()
            .map(|line| InvoiceLineView {
                product_id: line.product_id,
                product_name: line.product_name,
                quantity: line.quantity,
                unit_price: line.unit_price,
                tax_rate: line.tax_rate,
                line_total: line.line_total,
            })
            .collect(),
        subtotal: invoice.subtotal,
        discount,
        discount_amount: invoice.discount_amount,
        total_amount: invoice.total_amount,
        amount_paid: invoice.amount_paid,
        balance_due: invoice.balance_due,
        refunded_amount: invoice.refunded_amount,
        issue_date: invoice.issue_date,
        due_date: invoice.due_date,
        payment_terms: invoice.payment_terms,
    }
}

pub(crate) fn payment_view(payment: engine::Payment) -> PaymentView {
    PaymentView {
        id: payment.id,
        invoice_id: payment.invoice_id,
        amount: payment.amount,
        method: map_method(payment.method),
        paid_at: payment.paid_at,
    }
}

pub(crate) fn return_view(ret: engine::Return) -> ReturnView {
    ReturnView {
        id: ret.id,
        invoice_id: ret.invoice_id,
        product_id: ret.product_id,
        quantity: ret.quantity,
        unit_price: ret.unit_price,
        refund_amount: ret.refund_amount,
        cash_refund: ret.cash_refund,
        reason: ret.reason,
        returned_at: ret.returned_at,
        cancelled_at: ret.cancelled_at,
    }
}

fn customer_view(customer: engine::Customer) -> CustomerView {
    CustomerView {
        id: customer.id,
        name: customer.name,
        email: customer.email,
        phone: customer.phone,
        address: customer.address,
        balance: customer.balance,
        outstanding_balance: customer.outstanding_balance,
    }
}

pub(crate) fn account_response(account: engine::CustomerAccount) -> AccountResponse {
    AccountResponse {
        customer: customer_view(account.customer),
        invoices: account.invoices,
        payments: account.payments,
        returns: account.returns,
        transactions: account.transactions,
    }
}

pub(crate) fn statement_response(statement: engine::CustomerStatement) -> StatementResponse {
    StatementResponse {
        customer: customer_view(statement.customer),
        entries: statement
            .entries
            .into_iter()
            .map(|entry| LedgerEntryView {
                id: entry.id,
                kind: map_kind(entry.kind),
                reference_id: entry.reference_id,
                invoice_id: entry.invoice_id,
                amount: entry.amount,
                status: map_entry_status(entry.status),
                details: entry.details,
                items: entry.items.map(|items| {
                    items
                        .into_iter()
                        .map(|item| EntryItemView {
                            product_id: item.product_id,
                            quantity: item.quantity,
                            price: item.price,
                        })
                        .collect()
                }),
                recorded_at: entry.recorded_at,
            })
            .collect(),
        total_debit: statement.total_debit,
        total_credit: statement.total_credit,
        balance: statement.balance,
    }
}

pub(crate) fn product_view(product: engine::Product, stock: i64) -> ProductView {
    ProductView {
        id: product.id,
        name: product.name,
        product_code: product.product_code,
        cost_price: product.cost_price,
        selling_price: product.selling_price,
        tax_rate: product.tax_rate,
        category: product.category,
        supplier: product.supplier,
        stock,
    }
}

pub(crate) fn stock_view(stock: engine::Stock) -> StockView {
    StockView {
        product_id: stock.product_id,
        quantity: stock.quantity,
        last_stock_update: stock.last_stock_update,
    }
}

pub(crate) fn sales_view(summary: engine::SalesSummary) -> SalesOrderView {
    SalesOrderView {
        order_number: summary.order.order_number,
        product_id: summary.order.product_id,
        product_name: summary.product_name,
        customer_id: summary.order.customer_id,
        count: summary.order.count,
        subtotal: summary.order.subtotal,
        last_update: summary.order.last_update,
    }
}
