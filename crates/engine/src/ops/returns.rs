use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    AddReturnCmd, EngineError, EntryKind, EntryStatus, LedgerEntry, Money, ResultEngine, Return,
    ledger, returns,
    util::{normalize_optional_text, normalize_required_name},
};

use super::{
    Engine,
    catalog::require_product_by_name,
    customers::{adjust_customer_balance, require_customer_by_name},
    invoices::{active_returned_quantities, insert_payment_entry, load_invoice, load_invoice_ref, save_invoice},
    sales::{add_contribution, reduce_contribution},
    stock::{decrement_stock, increment_stock},
    with_tx,
};

impl Engine {
    /// Takes units of a product back from an invoice.
    ///
    /// The refund is `unit_price × quantity`, capped at the invoice's current
    /// total. It first reduces the balance due; whatever exceeds it is paid
    /// back in cash out of `amount_paid`. Stock, the sales aggregate, the
    /// ledger and the customer's balances follow.
    pub async fn add_return(&self, cmd: AddReturnCmd) -> ResultEngine<Return> {
        let name = normalize_required_name(&cmd.name, "customer")?;
        let product_name = normalize_required_name(&cmd.product_name, "product")?;
        if cmd.quantity < 1 {
            return Err(EngineError::Validation(
                "Return quantity must be at least 1".to_string(),
            ));
        }
        let reason = normalize_optional_text(cmd.reason.as_deref());
        let at = cmd.returned_at;

        with_tx!(self, "add_return", |db_tx| {
            let customer = require_customer_by_name(&db_tx, &name).await?;
            let mut invoice = load_invoice_ref(&db_tx, cmd.invoice).await?;
            if invoice.customer_id != customer.id {
                return Err(EngineError::BusinessRule(format!(
                    "Invoice {} does not belong to {}",
                    invoice.display_number(),
                    customer.name
                )));
            }
            let product = require_product_by_name(&db_tx, &product_name).await?;

            let invoiced = invoice.quantity_of(product.id);
            let Some(line) = invoice.lines.iter().find(|l| l.product_id == product.id) else {
                return Err(EngineError::BusinessRule(format!(
                    "{} is not on invoice {}",
                    product.name,
                    invoice.display_number()
                )));
            };
            let unit_price = line.unit_price;
            let already = active_returned_quantities(&db_tx, invoice.id)
                .await?
                .get(&product.id)
                .copied()
                .unwrap_or(0);
            if already + cmd.quantity > invoiced {
                return Err(EngineError::ReturnExceeded(format!(
                    "Invalid return quantity. Returnable: {}",
                    invoiced - already
                )));
            }

            let gross = unit_price
                .checked_mul(cmd.quantity)
                .ok_or_else(|| EngineError::Validation("refund too large".to_string()))?;
            let refund = gross.min(invoice.total_amount);
            let reduction = refund.min(invoice.balance_due);
            let cash_refund = refund - reduction;

            increment_stock(&db_tx, product.id, cmd.quantity, at).await?;

            let ret = Return {
                id: Uuid::now_v7(),
                customer_id: customer.id,
                invoice_id: invoice.id,
                product_id: product.id,
                quantity: cmd.quantity,
                unit_price,
                refund_amount: refund,
                cash_refund,
                reason,
                returned_at: at,
                cancelled_at: None,
            };
            returns::ActiveModel::from(&ret).insert(&db_tx).await?;

            let entry = LedgerEntry::new(
                customer.id,
                EntryKind::Return,
                ret.id,
                -refund,
                EntryStatus::Debit,
                format!(
                    "Refund of {} for {} x {} from invoice {}",
                    Money::new(refund),
                    cmd.quantity,
                    product.name,
                    invoice.display_number()
                ),
                at,
            )
            .for_invoice(invoice.id);
            ledger::ActiveModel::try_from(&entry)?.insert(&db_tx).await?;
            if cash_refund > 0 {
                insert_payment_entry(
                    &db_tx,
                    &invoice,
                    ret.id,
                    cash_refund,
                    EntryStatus::Debit,
                    format!(
                        "Cash refund of {} for invoice {}",
                        Money::new(cash_refund),
                        invoice.display_number()
                    ),
                    at,
                )
                .await?;
            }

            invoice.total_amount -= refund;
            invoice.refunded_amount += refund;
            invoice.balance_due -= reduction;
            invoice.amount_paid -= cash_refund;
            invoice.refresh_status(at);
            invoice.check_money_identities()?;
            save_invoice(&db_tx, &invoice).await?;

            reduce_contribution(&db_tx, product.id, invoice.id, cmd.quantity, gross, at).await?;
            adjust_customer_balance(&db_tx, customer.id, -reduction).await?;

            tracing::info!(
                invoice = %invoice.display_number(),
                product = %product.name,
                quantity = cmd.quantity,
                refund,
                cash_refund,
                "return recorded"
            );
            Ok(ret)
        })
    }

    /// Reverses an active return: the units leave the shelf again and the
    /// invoice, sales aggregate, ledger and balances are restored.
    pub async fn cancel_return(&self, return_id: Uuid, at: DateTime<Utc>) -> ResultEngine<Return> {
        with_tx!(self, "cancel_return", |db_tx| {
            let mut ret = returns::Entity::find_by_id(return_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::NotFound("Return not found".to_string()))
                .and_then(Return::try_from)?;
            if !ret.is_active() {
                return Err(EngineError::BusinessRule(
                    "Return already cancelled".to_string(),
                ));
            }
            let mut invoice = load_invoice(&db_tx, ret.invoice_id).await?;
            let product_name = invoice
                .lines
                .iter()
                .find(|line| line.product_id == ret.product_id)
                .map(|line| line.product_name.clone())
                .unwrap_or_default();

            decrement_stock(&db_tx, ret.product_id, &product_name, ret.quantity, at).await?;

            let restored = ret.refund_amount - ret.cash_refund;
            invoice.total_amount += ret.refund_amount;
            invoice.refunded_amount -= ret.refund_amount;
            invoice.balance_due += restored;
            invoice.amount_paid += ret.cash_refund;
            invoice.refresh_status(at);
            invoice.check_money_identities()?;
            save_invoice(&db_tx, &invoice).await?;

            let entry = LedgerEntry::new(
                ret.customer_id,
                EntryKind::ReturnCancellation,
                ret.id,
                -ret.refund_amount,
                EntryStatus::Credit,
                format!(
                    "Cancelled refund of {} on invoice {}",
                    Money::new(ret.refund_amount),
                    invoice.display_number()
                ),
                at,
            )
            .for_invoice(invoice.id);
            ledger::ActiveModel::try_from(&entry)?.insert(&db_tx).await?;
            if ret.cash_refund > 0 {
                insert_payment_entry(
                    &db_tx,
                    &invoice,
                    ret.id,
                    ret.cash_refund,
                    EntryStatus::Credit,
                    format!(
                        "Cash refund of {} on invoice {} taken back",
                        Money::new(ret.cash_refund),
                        invoice.display_number()
                    ),
                    at,
                )
                .await?;
            }

            add_contribution(
                &db_tx,
                ret.product_id,
                invoice.id,
                invoice.customer_id,
                ret.quantity,
                ret.unit_price * ret.quantity,
                at,
            )
            .await?;
            adjust_customer_balance(&db_tx, ret.customer_id, restored).await?;

            returns::ActiveModel {
                id: ActiveValue::Unchanged(ret.id.to_string()),
                cancelled_at: ActiveValue::Set(Some(at)),
                ..Default::default()
            }
            .update(&db_tx)
            .await?;
            ret.cancelled_at = Some(at);

            tracing::info!(
                invoice = %invoice.display_number(),
                quantity = ret.quantity,
                "return cancelled"
            );
            Ok(ret)
        })
    }
}
