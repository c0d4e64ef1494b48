//! Invoice lifecycle: create, update, delete and status changes.
//!
//! Every write goes through [`apply_invoice_effects`]. Creating applies the
//! effects of the new invoice, deleting reverts the stored one, and updating
//! reverts the stored invoice before applying the rewritten one, all inside
//! the caller's transaction.

use std::collections::BTreeMap;

use base64::Engine as _;
use chrono::{DateTime, Utc};
use sea_orm::{
    DatabaseTransaction, QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Customer, DiscountRate, EngineError, EntryItem, EntryKind, EntryStatus, Invoice, InvoiceDraft,
    InvoiceLine, InvoiceRef, InvoiceTotals, LedgerEntry, Money, Payment, PaymentMethod, ResultEngine,
    invoice_items, invoices, ledger, payments,
    pricing::{per_product, price_line},
    returns,
    util::{normalize_optional_text, normalize_required_name, parse_uuid},
};

use super::{
    Engine,
    catalog::products_by_names,
    customers::{adjust_customer_balance, require_customer},
    sales::{add_contribution, remove_invoice_contributions},
    stock::{decrement_stock, ensure_available, increment_stock},
    with_tx,
};

mod create;
mod delete;
mod status;
mod update;

/// An invoice with its customer's contact details.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InvoiceView {
    pub invoice: Invoice,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
}

impl InvoiceView {
    pub(super) fn new(invoice: Invoice, customer: &Customer) -> Self {
        Self {
            invoice,
            customer_name: customer.name.clone(),
            customer_email: customer.email.clone(),
            customer_phone: customer.phone.clone(),
        }
    }
}

/// One page of invoices, newest first.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InvoiceListPage {
    pub invoices: Vec<InvoiceView>,
    pub next_cursor: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum EffectSign {
    Apply,
    Revert,
}

/// What an invoice does to stock, sales, payments, the ledger and its
/// customer's balances.
pub(super) struct InvoiceEffects<'a> {
    invoice: &'a Invoice,
    /// Units of each product already put back on the shelf by active returns.
    returned: BTreeMap<Uuid, i64>,
}

impl<'a> InvoiceEffects<'a> {
    pub(super) fn new(invoice: &'a Invoice) -> Self {
        Self {
            invoice,
            returned: BTreeMap::new(),
        }
    }

    pub(super) fn returned(mut self, returned: BTreeMap<Uuid, i64>) -> Self {
        self.returned = returned;
        self
    }
}

/// Apply or revert the effects of an invoice inside `db_tx`.
///
/// Applying decrements stock (guarded), adds sales contributions, records the
/// up-front payment, writes the ledger entries and raises the customer's
/// balances by `balance_due`. Reverting restocks net of returned units and
/// removes the contributions, payments and ledger entries of the invoice
/// before lowering the balances by the same `balance_due`.
pub(super) async fn apply_invoice_effects(
    db_tx: &DatabaseTransaction,
    effects: &InvoiceEffects<'_>,
    sign: EffectSign,
    at: DateTime<Utc>,
) -> ResultEngine<()> {
    let invoice = effects.invoice;
    let per_product = per_product(&invoice.lines);
    let names: BTreeMap<Uuid, &str> = invoice
        .lines
        .iter()
        .map(|line| (line.product_id, line.product_name.as_str()))
        .collect();

    match sign {
        EffectSign::Apply => {
            for (product_id, (quantity, _)) in &per_product {
                let name = names.get(product_id).copied().unwrap_or_default();
                decrement_stock(db_tx, *product_id, name, *quantity, at).await?;
            }
            for (product_id, (quantity, subtotal)) in &per_product {
                add_contribution(
                    db_tx,
                    *product_id,
                    invoice.id,
                    invoice.customer_id,
                    *quantity,
                    *subtotal,
                    at,
                )
                .await?;
            }
            write_invoice_entries(db_tx, invoice, at).await?;
            adjust_customer_balance(db_tx, invoice.customer_id, invoice.balance_due).await?;
        }
        EffectSign::Revert => {
            for (product_id, (quantity, _)) in &per_product {
                let returned = effects.returned.get(product_id).copied().unwrap_or(0);
                let restock = quantity - returned;
                if restock > 0 {
                    increment_stock(db_tx, *product_id, restock, at).await?;
                }
            }
            remove_invoice_contributions(db_tx, invoice.id, at).await?;
            payments::Entity::delete_many()
                .filter(payments::Column::InvoiceId.eq(invoice.id.to_string()))
                .exec(db_tx)
                .await?;
            ledger::Entity::delete_many()
                .filter(ledger::Column::InvoiceId.eq(invoice.id.to_string()))
                .exec(db_tx)
                .await?;
            adjust_customer_balance(db_tx, invoice.customer_id, -invoice.balance_due).await?;
        }
    }
    Ok(())
}

async fn write_invoice_entries(
    db_tx: &DatabaseTransaction,
    invoice: &Invoice,
    at: DateTime<Utc>,
) -> ResultEngine<()> {
    let number = invoice.display_number();
    let items = invoice
        .lines
        .iter()
        .map(|line| EntryItem {
            product_id: line.product_id,
            quantity: line.quantity,
            price: line.unit_price,
        })
        .collect();

    let mut entries = vec![
        LedgerEntry::new(
            invoice.customer_id,
            EntryKind::Invoice,
            invoice.id,
            invoice.subtotal,
            EntryStatus::Debit,
            format!("Invoice {number}"),
            at,
        )
        .for_invoice(invoice.id)
        .with_items(items),
    ];
    if invoice.discount_amount > 0 {
        entries.push(
            LedgerEntry::new(
                invoice.customer_id,
                EntryKind::Discount,
                invoice.id,
                invoice.discount_amount,
                EntryStatus::Credit,
                format!(
                    "Discount of {} on invoice {number}",
                    DiscountRate::from_basis_points(invoice.discount_rate)?
                ),
                at,
            )
            .for_invoice(invoice.id),
        );
    }
    for entry in &entries {
        ledger::ActiveModel::try_from(entry)?.insert(db_tx).await?;
    }

    if invoice.amount_paid > 0 {
        insert_payment(
            db_tx,
            invoice,
            invoice.amount_paid,
            PaymentMethod::default(),
            at,
        )
        .await?;
    }
    Ok(())
}

/// Store a payment against `invoice` with its credit ledger entry.
///
/// Only writes the payment and the entry; the caller updates the invoice
/// and the customer's balances.
pub(super) async fn insert_payment(
    db_tx: &DatabaseTransaction,
    invoice: &Invoice,
    amount: i64,
    method: PaymentMethod,
    at: DateTime<Utc>,
) -> ResultEngine<Payment> {
    let payment = Payment::new(invoice.customer_id, Some(invoice.id), amount, method, at);
    payments::ActiveModel::from(&payment).insert(db_tx).await?;

    insert_payment_entry(
        db_tx,
        invoice,
        payment.id,
        amount,
        EntryStatus::Credit,
        format!(
            "Payment of {} for invoice {}",
            Money::new(amount),
            invoice.display_number()
        ),
        at,
    )
    .await?;
    Ok(payment)
}

/// Ledger entry of kind `payment` on `invoice`. Debit entries record cash
/// going back to the customer.
pub(super) async fn insert_payment_entry(
    db_tx: &DatabaseTransaction,
    invoice: &Invoice,
    reference_id: Uuid,
    amount: i64,
    status: EntryStatus,
    details: String,
    at: DateTime<Utc>,
) -> ResultEngine<()> {
    let entry = LedgerEntry::new(
        invoice.customer_id,
        EntryKind::Payment,
        reference_id,
        amount,
        status,
        details,
        at,
    )
    .for_invoice(invoice.id);
    ledger::ActiveModel::try_from(&entry)?.insert(db_tx).await?;
    Ok(())
}

/// Record a payment on an open invoice and move every total it touches.
pub(super) async fn pay_invoice(
    db_tx: &DatabaseTransaction,
    invoice: &mut Invoice,
    amount: i64,
    method: PaymentMethod,
    at: DateTime<Utc>,
) -> ResultEngine<Payment> {
    if amount <= 0 {
        return Err(EngineError::Validation(
            "Payment amount must be positive".to_string(),
        ));
    }
    if amount > invoice.balance_due {
        return Err(EngineError::Overpayment(format!(
            "Payment exceeds remaining invoice amount. Remaining: {}",
            invoice.balance_due
        )));
    }

    let payment = insert_payment(db_tx, invoice, amount, method, at).await?;
    invoice.amount_paid += amount;
    invoice.balance_due -= amount;
    invoice.refresh_status(at);
    invoice.check_money_identities()?;
    save_invoice(db_tx, invoice).await?;
    adjust_customer_balance(db_tx, invoice.customer_id, -amount).await?;
    Ok(payment)
}

/// Trimmed and checked invoice body.
pub(super) struct ValidDraft {
    pub(super) name: String,
    pub(super) email: Option<String>,
    pub(super) phone: Option<String>,
    pub(super) items: Vec<(String, i64)>,
    pub(super) amount: i64,
    pub(super) discount: DiscountRate,
}

/// Validate an invoice body before any write happens.
pub(super) fn validate_draft(draft: &InvoiceDraft) -> ResultEngine<ValidDraft> {
    let name = normalize_required_name(&draft.name, "customer")?;
    if draft.items.is_empty() {
        return Err(EngineError::Validation(
            "Invoice must contain at least one item".to_string(),
        ));
    }
    let mut items = Vec::with_capacity(draft.items.len());
    for item in &draft.items {
        let product = normalize_required_name(&item.product, "product")?;
        if item.quantity <= 0 {
            return Err(EngineError::Validation(format!(
                "Invalid quantity for product: {product}"
            )));
        }
        items.push((product, item.quantity));
    }
    if draft.amount < 0 {
        return Err(EngineError::Validation(
            "Payment amount cannot be negative".to_string(),
        ));
    }

    Ok(ValidDraft {
        name,
        email: normalize_optional_text(draft.email.as_deref()),
        phone: normalize_optional_text(draft.phone.as_deref()),
        items,
        amount: draft.amount,
        discount: draft.discount,
    })
}

/// Resolve products and stock for the draft lines and compute the totals.
pub(super) async fn price_draft(
    db_tx: &DatabaseTransaction,
    draft: &ValidDraft,
) -> ResultEngine<(Vec<InvoiceLine>, InvoiceTotals)> {
    let names: Vec<String> = draft.items.iter().map(|(name, _)| name.clone()).collect();
    let products = products_by_names(db_tx, &names).await?;

    let mut lines = Vec::with_capacity(draft.items.len());
    for (name, quantity) in &draft.items {
        let product = products
            .get(name)
            .ok_or_else(|| EngineError::NotFound(format!("Product not found: {name}")))?;
        lines.push(price_line(product, *quantity)?);
    }

    let mut requested: BTreeMap<Uuid, (String, i64)> = BTreeMap::new();
    for line in &lines {
        requested
            .entry(line.product_id)
            .or_insert_with(|| (line.product_name.clone(), 0))
            .1 += line.quantity;
    }
    ensure_available(db_tx, &requested).await?;

    let totals = InvoiceTotals::compute(&lines, draft.discount, draft.amount)?;
    Ok((lines, totals))
}

pub(super) async fn load_invoice(
    db_tx: &DatabaseTransaction,
    invoice_id: Uuid,
) -> ResultEngine<Invoice> {
    let model = invoices::Entity::find_by_id(invoice_id.to_string())
        .one(db_tx)
        .await?
        .ok_or_else(|| EngineError::NotFound("Invoice not found".to_string()))?;
    hydrate(db_tx, model).await
}

pub(super) async fn load_invoice_by_number(
    db_tx: &DatabaseTransaction,
    number: i64,
) -> ResultEngine<Invoice> {
    let model = invoices::Entity::find()
        .filter(invoices::Column::InvoiceNumber.eq(number))
        .one(db_tx)
        .await?
        .ok_or_else(|| EngineError::NotFound("Invoice not found".to_string()))?;
    hydrate(db_tx, model).await
}

pub(super) async fn load_invoice_ref(
    db_tx: &DatabaseTransaction,
    invoice: InvoiceRef,
) -> ResultEngine<Invoice> {
    match invoice {
        InvoiceRef::Number(number) => load_invoice_by_number(db_tx, number).await,
        InvoiceRef::Id(id) => load_invoice(db_tx, id).await,
    }
}

/// Open invoices of a customer, oldest first.
pub(super) async fn open_invoices(
    db_tx: &DatabaseTransaction,
    customer_id: Uuid,
) -> ResultEngine<Vec<Invoice>> {
    let models = invoices::Entity::find()
        .filter(invoices::Column::CustomerId.eq(customer_id.to_string()))
        .filter(invoices::Column::BalanceDue.gt(0))
        .order_by_asc(invoices::Column::IssueDate)
        .order_by_asc(invoices::Column::InvoiceNumber)
        .all(db_tx)
        .await?;
    hydrate_all(db_tx, models).await
}

async fn hydrate(db_tx: &DatabaseTransaction, model: invoices::Model) -> ResultEngine<Invoice> {
    let items = invoice_items::Entity::find()
        .filter(invoice_items::Column::InvoiceId.eq(model.id.clone()))
        .all(db_tx)
        .await?;
    Invoice::from_models(model, items)
}

async fn hydrate_all(
    db_tx: &DatabaseTransaction,
    models: Vec<invoices::Model>,
) -> ResultEngine<Vec<Invoice>> {
    let ids: Vec<String> = models.iter().map(|model| model.id.clone()).collect();
    let mut items: BTreeMap<String, Vec<invoice_items::Model>> = BTreeMap::new();
    for item in invoice_items::Entity::find()
        .filter(invoice_items::Column::InvoiceId.is_in(ids))
        .all(db_tx)
        .await?
    {
        items.entry(item.invoice_id.clone()).or_default().push(item);
    }

    models
        .into_iter()
        .map(|model| {
            let lines = items.remove(&model.id).unwrap_or_default();
            Invoice::from_models(model, lines)
        })
        .collect()
}

/// Persist the invoice row (not its lines).
pub(super) async fn save_invoice(db_tx: &DatabaseTransaction, invoice: &Invoice) -> ResultEngine<()> {
    invoices::ActiveModel::from(invoice).update(db_tx).await?;
    Ok(())
}

/// Replace the stored lines of an invoice with `invoice.lines`.
pub(super) async fn write_lines(db_tx: &DatabaseTransaction, invoice: &Invoice) -> ResultEngine<()> {
    invoice_items::Entity::delete_many()
        .filter(invoice_items::Column::InvoiceId.eq(invoice.id.to_string()))
        .exec(db_tx)
        .await?;
    if invoice.lines.is_empty() {
        return Ok(());
    }
    invoice_items::Entity::insert_many(
        invoice
            .lines
            .iter()
            .enumerate()
            .map(|(position, line)| invoice_items::active_model(invoice.id, position, line)),
    )
    .exec_without_returning(db_tx)
    .await?;
    Ok(())
}

/// Units of each product returned from an invoice and not cancelled.
pub(super) async fn active_returned_quantities(
    db_tx: &DatabaseTransaction,
    invoice_id: Uuid,
) -> ResultEngine<BTreeMap<Uuid, i64>> {
    let rows = returns::Entity::find()
        .filter(returns::Column::InvoiceId.eq(invoice_id.to_string()))
        .filter(returns::Column::CancelledAt.is_null())
        .all(db_tx)
        .await?;
    let mut returned = BTreeMap::new();
    for row in rows {
        *returned
            .entry(parse_uuid(&row.product_id, "product")?)
            .or_insert(0) += row.quantity;
    }
    Ok(returned)
}

pub(super) async fn view(db_tx: &DatabaseTransaction, invoice: Invoice) -> ResultEngine<InvoiceView> {
    let customer = require_customer(db_tx, invoice.customer_id).await?;
    Ok(InvoiceView::new(invoice, &customer))
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct InvoicesCursor {
    invoice_number: i64,
}

impl InvoicesCursor {
    fn encode(&self) -> ResultEngine<String> {
        let bytes = serde_json::to_vec(self)
            .map_err(|_| EngineError::InvalidCursor("invalid invoices cursor".to_string()))?;
        Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
    }

    fn decode(input: &str) -> ResultEngine<Self> {
        let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(input.as_bytes())
            .map_err(|_| EngineError::InvalidCursor("invalid invoices cursor".to_string()))?;
        serde_json::from_slice::<Self>(&bytes)
            .map_err(|_| EngineError::InvalidCursor("invalid invoices cursor".to_string()))
    }
}

impl Engine {
    pub async fn invoice(&self, invoice_id: Uuid) -> ResultEngine<InvoiceView> {
        with_tx!(self, "invoice", |db_tx| {
            let invoice = load_invoice(&db_tx, invoice_id).await?;
            view(&db_tx, invoice).await
        })
    }

    pub async fn invoice_by_number(&self, number: i64) -> ResultEngine<InvoiceView> {
        with_tx!(self, "invoice_by_number", |db_tx| {
            let invoice = load_invoice_by_number(&db_tx, number).await?;
            view(&db_tx, invoice).await
        })
    }

    /// Lists invoices with cursor-based pagination.
    ///
    /// Pagination is newest → older by `invoice_number DESC`.
    pub async fn list_invoices(
        &self,
        limit: u64,
        cursor: Option<&str>,
    ) -> ResultEngine<InvoiceListPage> {
        let cursor = cursor.map(InvoicesCursor::decode).transpose()?;
        with_tx!(self, "list_invoices", |db_tx| {
            let limit_plus_one = limit.saturating_add(1);
            let mut query = invoices::Entity::find()
                .order_by_desc(invoices::Column::InvoiceNumber)
                .limit(limit_plus_one);
            if let Some(cursor) = &cursor {
                query = query.filter(invoices::Column::InvoiceNumber.lt(cursor.invoice_number));
            }

            let rows = query.all(&db_tx).await?;
            let has_more = rows.len() > limit as usize;
            let invoices =
                hydrate_all(&db_tx, rows.into_iter().take(limit as usize).collect()).await?;

            let mut out = Vec::with_capacity(invoices.len());
            for invoice in invoices {
                out.push(view(&db_tx, invoice).await?);
            }

            let next_cursor = if has_more {
                out.last()
                    .map(|view| InvoicesCursor {
                        invoice_number: view.invoice.invoice_number,
                    })
                    .map(|c| c.encode())
                    .transpose()?
            } else {
                None
            };

            Ok(InvoiceListPage {
                invoices: out,
                next_cursor,
            })
        })
    }
}
