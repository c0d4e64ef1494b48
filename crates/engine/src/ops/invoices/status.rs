use sea_orm::TransactionTrait;

use crate::{EngineError, InvoiceStatus, ResultEngine, UpdateInvoiceStatusCmd};

use super::{Engine, InvoiceView, load_invoice, pay_invoice, save_invoice, view, with_tx};

impl Engine {
    /// Changes the status of an invoice.
    ///
    /// `paid` with a payment amount records that payment against the invoice
    /// (the amount may not exceed the balance due) and re-derives the status.
    /// Any other combination stores the requested status as given, except
    /// that `paid` is refused while a balance is still due.
    pub async fn update_invoice_status(
        &self,
        cmd: UpdateInvoiceStatusCmd,
    ) -> ResultEngine<InvoiceView> {
        with_tx!(self, "update_invoice_status", |db_tx| {
            let mut invoice = load_invoice(&db_tx, cmd.invoice_id).await?;

            match (cmd.status, cmd.payment_amount) {
                (InvoiceStatus::Paid, Some(amount)) => {
                    if amount > invoice.balance_due {
                        return Err(EngineError::Overpayment(
                            "Payment amount exceeds balance due".to_string(),
                        ));
                    }
                    pay_invoice(&db_tx, &mut invoice, amount, cmd.method, cmd.at).await?;
                }
                (InvoiceStatus::Paid, None) if invoice.balance_due > 0 => {
                    return Err(EngineError::BusinessRule(format!(
                        "Invoice {} still has {} due; record a payment to mark it paid",
                        invoice.display_number(),
                        crate::Money::new(invoice.balance_due)
                    )));
                }
                (status, _) => {
                    invoice.status = status;
                    invoice.updated_at = cmd.at;
                    save_invoice(&db_tx, &invoice).await?;
                }
            }

            tracing::info!(
                invoice = %invoice.display_number(),
                status = invoice.status.as_str(),
                "invoice status updated"
            );
            view(&db_tx, invoice).await
        })
    }
}
