use sea_orm::{QueryFilter, TransactionTrait, prelude::*};

use crate::{EngineError, ResultEngine, UpdateInvoiceCmd, returns};

use super::{
    super::customers::{
        apply_contact_changes, find_customer_by_name, rename_customer, require_customer,
    },
    EffectSign, Engine, InvoiceEffects, InvoiceView, apply_invoice_effects, load_invoice,
    price_draft, save_invoice, validate_draft, with_tx, write_lines,
};

impl Engine {
    /// Rewrites an invoice with a new body.
    ///
    /// The stored invoice's effects are reverted first (stock back on the
    /// shelf, contributions, payments and ledger entries removed, balances
    /// lowered), then the new body is priced against the restored stock and
    /// its effects are applied. Invoice number and issue date are kept.
    ///
    /// A new customer name that belongs to another customer moves the invoice
    /// to that customer; any other new name renames the current customer.
    ///
    /// Invoices with active returns cannot be rewritten.
    pub async fn update_invoice(&self, cmd: UpdateInvoiceCmd) -> ResultEngine<InvoiceView> {
        let draft = validate_draft(&cmd.draft)?;
        let at = cmd.updated_at;

        with_tx!(self, "update_invoice", |db_tx| {
            let mut invoice = load_invoice(&db_tx, cmd.invoice_id).await?;

            let active_return = returns::Entity::find()
                .filter(returns::Column::InvoiceId.eq(invoice.id.to_string()))
                .filter(returns::Column::CancelledAt.is_null())
                .one(&db_tx)
                .await?;
            if active_return.is_some() {
                return Err(EngineError::BusinessRule(format!(
                    "Invoice {} has returns; cancel them before editing",
                    invoice.display_number()
                )));
            }

            apply_invoice_effects(
                &db_tx,
                &InvoiceEffects::new(&invoice),
                EffectSign::Revert,
                at,
            )
            .await?;

            let current = require_customer(&db_tx, invoice.customer_id).await?;
            let customer = if current.name == draft.name {
                current
            } else {
                match find_customer_by_name(&db_tx, &draft.name).await? {
                    Some(other) => other,
                    None => rename_customer(&db_tx, current, &draft.name).await?,
                }
            };
            let customer =
                apply_contact_changes(&db_tx, customer, draft.email.clone(), draft.phone.clone())
                    .await?;

            let (lines, totals) = price_draft(&db_tx, &draft).await?;
            invoice.customer_id = customer.id;
            invoice.lines = lines;
            invoice.subtotal = totals.subtotal;
            invoice.discount_rate = draft.discount.basis_points();
            invoice.discount_amount = totals.discount_amount;
            invoice.total_amount = totals.total_amount;
            invoice.amount_paid = totals.amount_paid;
            invoice.balance_due = totals.balance_due;
            invoice.refunded_amount = 0;
            invoice.refresh_status(at);
            invoice.check_money_identities()?;

            save_invoice(&db_tx, &invoice).await?;
            write_lines(&db_tx, &invoice).await?;
            apply_invoice_effects(
                &db_tx,
                &InvoiceEffects::new(&invoice),
                EffectSign::Apply,
                at,
            )
            .await?;

            tracing::info!(
                invoice = %invoice.display_number(),
                customer = %customer.name,
                total = invoice.total_amount,
                balance_due = invoice.balance_due,
                "invoice updated"
            );
            Ok(InvoiceView::new(invoice, &customer))
        })
    }
}
