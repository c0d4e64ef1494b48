use sea_orm::TransactionTrait;

use crate::{
    AddPaymentCmd, EngineError, Money, Payment, ResultEngine, util::normalize_required_name,
};

use super::{
    Engine,
    customers::require_customer_by_name,
    invoices::{load_invoice_by_number, open_invoices, pay_invoice},
    with_tx,
};

impl Engine {
    /// Records a customer payment.
    ///
    /// With an invoice number the whole amount goes to that invoice. Without
    /// one it is spread over the customer's open invoices, oldest first, with
    /// one payment per invoice touched. Either way the amount may not exceed
    /// what is owed.
    pub async fn add_payment(&self, cmd: AddPaymentCmd) -> ResultEngine<Vec<Payment>> {
        let name = normalize_required_name(&cmd.name, "customer")?;
        if cmd.amount <= 0 {
            return Err(EngineError::Validation(
                "Payment amount must be positive".to_string(),
            ));
        }

        with_tx!(self, "add_payment", |db_tx| {
            let customer = require_customer_by_name(&db_tx, &name).await?;

            let payments = match cmd.invoice_number {
                Some(number) => {
                    let mut invoice = load_invoice_by_number(&db_tx, number).await?;
                    if invoice.customer_id != customer.id {
                        return Err(EngineError::BusinessRule(format!(
                            "Invoice {} does not belong to {}",
                            invoice.display_number(),
                            customer.name
                        )));
                    }
                    vec![pay_invoice(&db_tx, &mut invoice, cmd.amount, cmd.method, cmd.paid_at).await?]
                }
                None => {
                    if cmd.amount > customer.outstanding_balance {
                        return Err(EngineError::Overpayment(format!(
                            "Payment exceeds outstanding balance. Outstanding: {}",
                            customer.outstanding_balance
                        )));
                    }
                    let mut remaining = cmd.amount;
                    let mut payments = Vec::new();
                    for mut invoice in open_invoices(&db_tx, customer.id).await? {
                        if remaining == 0 {
                            break;
                        }
                        let share = remaining.min(invoice.balance_due);
                        payments.push(
                            pay_invoice(&db_tx, &mut invoice, share, cmd.method, cmd.paid_at)
                                .await?,
                        );
                        remaining -= share;
                    }
                    if remaining > 0 {
                        return Err(EngineError::BusinessRule(format!(
                            "{} could not be allocated to open invoices",
                            Money::new(remaining)
                        )));
                    }
                    payments
                }
            };

            tracing::info!(
                customer = %customer.name,
                amount = cmd.amount,
                payments = payments.len(),
                "payment recorded"
            );
            Ok(payments)
        })
    }
}
