use uuid::Uuid;

use sea_orm::{TransactionTrait, prelude::*};

use crate::{
    CreateInvoiceCmd, Invoice, ResultEngine, counters::INVOICE_SEQUENCE, invoices,
    invoices::{PAYMENT_TERMS, due_date_for},
};

use super::{
    super::{customers::resolve_customer, sequence::next_sequence},
    EffectSign, Engine, InvoiceEffects, InvoiceView, apply_invoice_effects, price_draft,
    validate_draft, with_tx, write_lines,
};

impl Engine {
    /// Creates an invoice.
    ///
    /// In one transaction this:
    /// - finds or creates the customer by name
    /// - prices the lines at the current selling prices and checks stock
    /// - draws the next invoice number
    /// - stores the invoice and applies its effects (stock, sales, payment,
    ///   ledger, customer balances)
    ///
    /// Nothing is written if any step fails, the invoice counter included.
    pub async fn create_invoice(&self, cmd: CreateInvoiceCmd) -> ResultEngine<InvoiceView> {
        let draft = validate_draft(&cmd.draft)?;
        let issued_at = cmd.issued_at;

        with_tx!(self, "create_invoice", |db_tx| {
            let customer = resolve_customer(
                &db_tx,
                &draft.name,
                draft.email.as_deref(),
                draft.phone.as_deref(),
                issued_at,
            )
            .await?;
            let (lines, totals) = price_draft(&db_tx, &draft).await?;
            let invoice_number = next_sequence(&db_tx, INVOICE_SEQUENCE).await?;

            let mut invoice = Invoice {
                id: Uuid::new_v4(),
                invoice_number,
                customer_id: customer.id,
                lines,
                subtotal: totals.subtotal,
                discount_rate: draft.discount.basis_points(),
                discount_amount: totals.discount_amount,
                total_amount: totals.total_amount,
                amount_paid: totals.amount_paid,
                balance_due: totals.balance_due,
                refunded_amount: 0,
                status: crate::InvoiceStatus::Unpaid,
                issue_date: issued_at,
                due_date: due_date_for(issued_at),
                payment_terms: PAYMENT_TERMS.to_string(),
                updated_at: issued_at,
            };
            invoice.refresh_status(issued_at);
            invoice.check_money_identities()?;

            invoices::ActiveModel::from(&invoice).insert(&db_tx).await?;
            write_lines(&db_tx, &invoice).await?;
            apply_invoice_effects(
                &db_tx,
                &InvoiceEffects::new(&invoice),
                EffectSign::Apply,
                issued_at,
            )
            .await?;

            tracing::info!(
                invoice = %invoice.display_number(),
                customer = %customer.name,
                total = invoice.total_amount,
                balance_due = invoice.balance_due,
                "invoice created"
            );
            Ok(InvoiceView::new(invoice, &customer))
        })
    }
}
