//! Invoices and their line items.
//!
//! An `Invoice` exclusively owns its ordered [`InvoiceLine`]s. Money fields
//! obey two identities at all times:
//!
//! - `total_amount = subtotal - discount_amount` (minus refunds from returns)
//! - `balance_due = total_amount - amount_paid`

use chrono::{DateTime, Duration, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, util::parse_uuid};

/// Days between issue date and due date.
pub const PAYMENT_TERM_DAYS: i64 = 30;
pub const PAYMENT_TERMS: &str = "net_30";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Paid,
    PartiallyPaid,
    Unpaid,
    Overdue,
}

impl InvoiceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Paid => "paid",
            Self::PartiallyPaid => "partially_paid",
            Self::Unpaid => "unpaid",
            Self::Overdue => "overdue",
        }
    }

    /// Derive the status from the money fields, evaluated at `at`.
    pub fn derive(
        balance_due: i64,
        amount_paid: i64,
        due_date: DateTime<Utc>,
        at: DateTime<Utc>,
    ) -> Self {
        if balance_due <= 0 {
            Self::Paid
        } else if at > due_date {
            Self::Overdue
        } else if amount_paid > 0 {
            Self::PartiallyPaid
        } else {
            Self::Unpaid
        }
    }
}

impl TryFrom<&str> for InvoiceStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "paid" => Ok(Self::Paid),
            "partially_paid" => Ok(Self::PartiallyPaid),
            "unpaid" => Ok(Self::Unpaid),
            "overdue" => Ok(Self::Overdue),
            other => Err(EngineError::Validation(format!(
                "invalid invoice status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: i64,
    pub tax_rate: u32,
    pub line_total: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: Uuid,
    pub invoice_number: i64,
    pub customer_id: Uuid,
    pub lines: Vec<InvoiceLine>,
    pub subtotal: i64,
    pub discount_rate: u32,
    pub discount_amount: i64,
    pub total_amount: i64,
    pub amount_paid: i64,
    pub balance_due: i64,
    pub refunded_amount: i64,
    pub status: InvoiceStatus,
    pub issue_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub payment_terms: String,
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    /// Human-facing invoice number, e.g. `INV-000042`.
    pub fn display_number(&self) -> String {
        format_invoice_number(self.invoice_number)
    }

    /// Status as seen at `at`: the stored status, except that an open
    /// invoice past its due date reads as overdue.
    pub fn status_at(&self, at: DateTime<Utc>) -> InvoiceStatus {
        if self.balance_due > 0 && at > self.due_date {
            InvoiceStatus::Overdue
        } else {
            self.status
        }
    }

    /// Re-derive and store the status after the money fields changed.
    pub(crate) fn refresh_status(&mut self, at: DateTime<Utc>) {
        self.status = InvoiceStatus::derive(self.balance_due, self.amount_paid, self.due_date, at);
        self.updated_at = at;
    }

    /// Total quantity of `product_id` across the invoice lines.
    pub fn quantity_of(&self, product_id: Uuid) -> i64 {
        self.lines
            .iter()
            .filter(|line| line.product_id == product_id)
            .map(|line| line.quantity)
            .sum()
    }

    pub(crate) fn check_money_identities(&self) -> ResultEngine<()> {
        if self.balance_due != self.total_amount - self.amount_paid
            || self.amount_paid < 0
            || self.amount_paid > self.total_amount
        {
            return Err(EngineError::BusinessRule(format!(
                "invoice {} totals are inconsistent",
                self.display_number()
            )));
        }
        Ok(())
    }
}

pub fn format_invoice_number(number: i64) -> String {
    format!("INV-{number:06}")
}

pub(crate) fn due_date_for(issue_date: DateTime<Utc>) -> DateTime<Utc> {
    issue_date + Duration::days(PAYMENT_TERM_DAYS)
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "invoices")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub invoice_number: i64,
    pub customer_id: String,
    pub subtotal: i64,
    pub discount_rate: i32,
    pub discount_amount: i64,
    pub total_amount: i64,
    pub amount_paid: i64,
    pub balance_due: i64,
    pub refunded_amount: i64,
    pub status: String,
    pub issue_date: DateTimeUtc,
    pub due_date: DateTimeUtc,
    pub payment_terms: String,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::customers::Entity",
        from = "Column::CustomerId",
        to = "super::customers::Column::Id"
    )]
    Customer,
    #[sea_orm(has_many = "super::invoice_items::Entity")]
    Items,
}

impl Related<super::customers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
    }
}

impl Related<super::invoice_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Invoice> for ActiveModel {
    fn from(invoice: &Invoice) -> Self {
        Self {
            id: ActiveValue::Set(invoice.id.to_string()),
            invoice_number: ActiveValue::Set(invoice.invoice_number),
            customer_id: ActiveValue::Set(invoice.customer_id.to_string()),
            subtotal: ActiveValue::Set(invoice.subtotal),
            discount_rate: ActiveValue::Set(invoice.discount_rate as i32),
            discount_amount: ActiveValue::Set(invoice.discount_amount),
            total_amount: ActiveValue::Set(invoice.total_amount),
            amount_paid: ActiveValue::Set(invoice.amount_paid),
            balance_due: ActiveValue::Set(invoice.balance_due),
            refunded_amount: ActiveValue::Set(invoice.refunded_amount),
            status: ActiveValue::Set(invoice.status.as_str().to_string()),
            issue_date: ActiveValue::Set(invoice.issue_date),
            due_date: ActiveValue::Set(invoice.due_date),
            payment_terms: ActiveValue::Set(invoice.payment_terms.clone()),
            updated_at: ActiveValue::Set(invoice.updated_at),
        }
    }
}

impl Invoice {
    /// Rebuild an invoice from its row and its line rows (any order).
    pub(crate) fn from_models(
        model: Model,
        mut items: Vec<super::invoice_items::Model>,
    ) -> ResultEngine<Self> {
        items.sort_by_key(|item| item.position);
        let lines = items
            .into_iter()
            .map(InvoiceLine::try_from)
            .collect::<ResultEngine<Vec<_>>>()?;

        Ok(Self {
            id: parse_uuid(&model.id, "invoice")?,
            invoice_number: model.invoice_number,
            customer_id: parse_uuid(&model.customer_id, "customer")?,
            lines,
            subtotal: model.subtotal,
            discount_rate: u32::try_from(model.discount_rate).unwrap_or_default(),
            discount_amount: model.discount_amount,
            total_amount: model.total_amount,
            amount_paid: model.amount_paid,
            balance_due: model.balance_due,
            refunded_amount: model.refunded_amount,
            status: InvoiceStatus::try_from(model.status.as_str())?,
            issue_date: model.issue_date,
            due_date: model.due_date,
            payment_terms: model.payment_terms,
            updated_at: model.updated_at,
        })
    }
}

impl TryFrom<super::invoice_items::Model> for InvoiceLine {
    type Error = EngineError;

    fn try_from(model: super::invoice_items::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            product_id: parse_uuid(&model.product_id, "product")?,
            product_name: model.product_name,
            quantity: model.quantity,
            unit_price: model.unit_price,
            tax_rate: u32::try_from(model.tax_rate).unwrap_or_default(),
            line_total: model.line_total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, day, 12, 0, 0).single().unwrap()
    }

    #[test]
    fn status_is_derived_from_money_and_due_date() {
        let due = at(20);
        assert_eq!(InvoiceStatus::derive(0, 100, due, at(1)), InvoiceStatus::Paid);
        assert_eq!(InvoiceStatus::derive(0, 100, due, at(25)), InvoiceStatus::Paid);
        assert_eq!(InvoiceStatus::derive(50, 0, due, at(1)), InvoiceStatus::Unpaid);
        assert_eq!(
            InvoiceStatus::derive(50, 10, due, at(1)),
            InvoiceStatus::PartiallyPaid
        );
        assert_eq!(InvoiceStatus::derive(50, 10, due, at(21)), InvoiceStatus::Overdue);
    }

    #[test]
    fn due_date_is_thirty_days_later() {
        assert_eq!(due_date_for(at(1)), at(31));
    }

    #[test]
    fn invoice_numbers_are_zero_padded() {
        assert_eq!(format_invoice_number(42), "INV-000042");
        assert_eq!(format_invoice_number(1_234_567), "INV-1234567");
    }

    #[test]
    fn status_round_trips_through_storage_strings() {
        for status in [
            InvoiceStatus::Paid,
            InvoiceStatus::PartiallyPaid,
            InvoiceStatus::Unpaid,
            InvoiceStatus::Overdue,
        ] {
            assert_eq!(InvoiceStatus::try_from(status.as_str()).unwrap(), status);
        }
        assert!(InvoiceStatus::try_from("cancelled").is_err());
    }
}
