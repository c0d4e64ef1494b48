use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    Customer, CustomerAccount, EngineError, LedgerEntry, ResultEngine, customers, invoices,
    ledger, payments, returns,
    util::{normalize_optional_text, normalize_required_name, parse_uuid},
};

use super::{Engine, with_tx};

/// A customer's ledger with its running totals.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CustomerStatement {
    pub customer: Customer,
    pub entries: Vec<LedgerEntry>,
    pub total_debit: i64,
    pub total_credit: i64,
    /// `total_credit - total_debit`; equals `-outstanding_balance`.
    pub balance: i64,
}

pub(super) async fn find_customer_by_name(
    db_tx: &DatabaseTransaction,
    name: &str,
) -> ResultEngine<Option<Customer>> {
    customers::Entity::find()
        .filter(customers::Column::Name.eq(name))
        .one(db_tx)
        .await?
        .map(Customer::try_from)
        .transpose()
}

pub(super) async fn require_customer_by_name(
    db_tx: &DatabaseTransaction,
    name: &str,
) -> ResultEngine<Customer> {
    find_customer_by_name(db_tx, name)
        .await?
        .ok_or_else(|| EngineError::NotFound("Customer not found".to_string()))
}

pub(super) async fn require_customer(
    db_tx: &DatabaseTransaction,
    customer_id: Uuid,
) -> ResultEngine<Customer> {
    customers::Entity::find_by_id(customer_id.to_string())
        .one(db_tx)
        .await?
        .ok_or_else(|| EngineError::NotFound("Customer not found".to_string()))
        .and_then(Customer::try_from)
}

/// Find the customer by name, creating it when absent.
///
/// New customers need both email and phone. For existing customers, a
/// provided email or phone that differs from the stored one replaces it.
pub(super) async fn resolve_customer(
    db_tx: &DatabaseTransaction,
    name: &str,
    email: Option<&str>,
    phone: Option<&str>,
    at: DateTime<Utc>,
) -> ResultEngine<Customer> {
    let email = normalize_optional_text(email);
    let phone = normalize_optional_text(phone);

    match find_customer_by_name(db_tx, name).await? {
        Some(customer) => apply_contact_changes(db_tx, customer, email, phone).await,
        None => {
            let (Some(email), Some(phone)) = (email, phone) else {
                return Err(EngineError::Validation(
                    "Email and phone are required for new customers.".to_string(),
                ));
            };
            let customer = Customer::new(name.to_string(), email, phone, at);
            customers::ActiveModel::from(&customer).insert(db_tx).await?;
            tracing::info!(customer = %customer.name, "customer created");
            Ok(customer)
        }
    }
}

pub(super) async fn apply_contact_changes(
    db_tx: &DatabaseTransaction,
    mut customer: Customer,
    email: Option<String>,
    phone: Option<String>,
) -> ResultEngine<Customer> {
    let mut active = customers::ActiveModel {
        id: ActiveValue::Unchanged(customer.id.to_string()),
        ..Default::default()
    };
    let mut changed = false;
    if let Some(email) = email.filter(|email| *email != customer.email) {
        active.email = ActiveValue::Set(email.clone());
        customer.email = email;
        changed = true;
    }
    if let Some(phone) = phone.filter(|phone| *phone != customer.phone) {
        active.phone = ActiveValue::Set(phone.clone());
        customer.phone = phone;
        changed = true;
    }
    if changed {
        active.update(db_tx).await?;
    }
    Ok(customer)
}

pub(super) async fn rename_customer(
    db_tx: &DatabaseTransaction,
    mut customer: Customer,
    name: &str,
) -> ResultEngine<Customer> {
    customers::ActiveModel {
        id: ActiveValue::Unchanged(customer.id.to_string()),
        name: ActiveValue::Set(name.to_string()),
        ..Default::default()
    }
    .update(db_tx)
    .await?;
    tracing::info!(from = %customer.name, to = %name, "customer renamed");
    customer.name = name.to_string();
    Ok(customer)
}

/// Move both running totals of a customer by `delta`.
pub(super) async fn adjust_customer_balance(
    db_tx: &DatabaseTransaction,
    customer_id: Uuid,
    delta: i64,
) -> ResultEngine<()> {
    if delta == 0 {
        return Ok(());
    }
    let result = customers::Entity::update_many()
        .col_expr(
            customers::Column::OutstandingBalance,
            Expr::col(customers::Column::OutstandingBalance).add(delta),
        )
        .col_expr(
            customers::Column::Balance,
            Expr::col(customers::Column::Balance).add(delta),
        )
        .filter(customers::Column::Id.eq(customer_id.to_string()))
        .exec(db_tx)
        .await?;
    if result.rows_affected != 1 {
        return Err(EngineError::NotFound("Customer not found".to_string()));
    }
    Ok(())
}

impl Engine {
    /// A customer with the ordered ids of its invoices, payments, returns and
    /// ledger entries.
    pub async fn customer_account(&self, name: &str) -> ResultEngine<CustomerAccount> {
        let name = normalize_required_name(name, "customer")?;
        with_tx!(self, "customer_account", |db_tx| {
            let customer = require_customer_by_name(&db_tx, &name).await?;
            let owner = customer.id.to_string();

            let invoices = invoices::Entity::find()
                .filter(invoices::Column::CustomerId.eq(owner.clone()))
                .order_by_asc(invoices::Column::IssueDate)
                .order_by_asc(invoices::Column::InvoiceNumber)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(|model| parse_uuid(&model.id, "invoice"))
                .collect::<ResultEngine<Vec<_>>>()?;
            let payments = payments::Entity::find()
                .filter(payments::Column::CustomerId.eq(owner.clone()))
                .order_by_asc(payments::Column::PaidAt)
                .order_by_asc(payments::Column::Id)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(|model| parse_uuid(&model.id, "payment"))
                .collect::<ResultEngine<Vec<_>>>()?;
            let returns = returns::Entity::find()
                .filter(returns::Column::CustomerId.eq(owner.clone()))
                .order_by_asc(returns::Column::ReturnedAt)
                .order_by_asc(returns::Column::Id)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(|model| parse_uuid(&model.id, "return"))
                .collect::<ResultEngine<Vec<_>>>()?;
            let transactions = ledger_for(&db_tx, customer.id)
                .await?
                .into_iter()
                .map(|entry| entry.id)
                .collect();

            Ok(CustomerAccount {
                customer,
                invoices,
                payments,
                returns,
                transactions,
            })
        })
    }

    /// The customer's ledger entries in recording order, with totals.
    pub async fn customer_statement(&self, name: &str) -> ResultEngine<CustomerStatement> {
        let name = normalize_required_name(name, "customer")?;
        with_tx!(self, "customer_statement", |db_tx| {
            let customer = require_customer_by_name(&db_tx, &name).await?;
            let entries = ledger_for(&db_tx, customer.id).await?;
            let (total_debit, total_credit) =
                entries
                    .iter()
                    .fold((0, 0), |(debit, credit), entry| match entry.status {
                        crate::EntryStatus::Debit => (debit + entry.amount, credit),
                        crate::EntryStatus::Credit => (debit, credit + entry.amount),
                    });

            Ok(CustomerStatement {
                customer,
                entries,
                total_debit,
                total_credit,
                balance: total_credit - total_debit,
            })
        })
    }
}

async fn ledger_for(
    db_tx: &DatabaseTransaction,
    customer_id: Uuid,
) -> ResultEngine<Vec<LedgerEntry>> {
    ledger::Entity::find()
        .filter(ledger::Column::CustomerId.eq(customer_id.to_string()))
        .order_by_asc(ledger::Column::RecordedAt)
        .order_by_asc(ledger::Column::Id)
        .all(db_tx)
        .await?
        .into_iter()
        .map(LedgerEntry::try_from)
        .collect()
}
