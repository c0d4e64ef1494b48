use chrono::{DateTime, Utc};
use uuid::Uuid;

use sea_orm::{QueryFilter, TransactionTrait, prelude::*};

use crate::{ResultEngine, invoice_items, invoices, returns};

use super::{
    EffectSign, Engine, InvoiceEffects, active_returned_quantities, apply_invoice_effects,
    load_invoice, with_tx,
};

impl Engine {
    /// Deletes an invoice and undoes everything it did.
    ///
    /// Stock is restored net of units already returned, contributions,
    /// payments and ledger entries are removed and the customer's balances are
    /// lowered by the invoice's `balance_due`. The invoice's returns go with
    /// it.
    pub async fn delete_invoice(&self, invoice_id: Uuid, at: DateTime<Utc>) -> ResultEngine<()> {
        with_tx!(self, "delete_invoice", |db_tx| {
            let invoice = load_invoice(&db_tx, invoice_id).await?;
            let returned = active_returned_quantities(&db_tx, invoice.id).await?;

            apply_invoice_effects(
                &db_tx,
                &InvoiceEffects::new(&invoice).returned(returned),
                EffectSign::Revert,
                at,
            )
            .await?;

            returns::Entity::delete_many()
                .filter(returns::Column::InvoiceId.eq(invoice.id.to_string()))
                .exec(&db_tx)
                .await?;
            invoice_items::Entity::delete_many()
                .filter(invoice_items::Column::InvoiceId.eq(invoice.id.to_string()))
                .exec(&db_tx)
                .await?;
            invoices::Entity::delete_by_id(invoice.id.to_string())
                .exec(&db_tx)
                .await?;

            tracing::info!(invoice = %invoice.display_number(), "invoice deleted");
            Ok(())
        })
    }
}
