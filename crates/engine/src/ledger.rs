//! The customer transaction ledger.
//!
//! Every money movement on a customer account leaves one `LedgerEntry`.
//! Entries are append-only, except that rewriting or deleting an invoice
//! removes the entries that reference it. For every customer:
//!
//! `sum(credit) - sum(debit) == -outstanding_balance`

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, util::parse_uuid};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Invoice,
    Payment,
    Discount,
    Return,
    ReturnCancellation,
}

impl EntryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Invoice => "invoice",
            Self::Payment => "payment",
            Self::Discount => "discount",
            Self::Return => "return",
            Self::ReturnCancellation => "return_cancellation",
        }
    }
}

impl TryFrom<&str> for EntryKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "invoice" => Ok(Self::Invoice),
            "payment" => Ok(Self::Payment),
            "discount" => Ok(Self::Discount),
            "return" => Ok(Self::Return),
            "return_cancellation" => Ok(Self::ReturnCancellation),
            other => Err(EngineError::Validation(format!(
                "invalid ledger entry kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Debit,
    Credit,
}

impl EntryStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debit => "debit",
            Self::Credit => "credit",
        }
    }
}

impl TryFrom<&str> for EntryStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "debit" => Ok(Self::Debit),
            "credit" => Ok(Self::Credit),
            other => Err(EngineError::Validation(format!(
                "invalid ledger entry status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryItem {
    pub product_id: Uuid,
    pub quantity: i64,
    pub price: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Time-ordered, so entries written in one flow keep their write order.
    pub id: Uuid,
    pub customer_id: Uuid,
    pub kind: EntryKind,
    /// Invoice, payment or return this entry was written for.
    pub reference_id: Uuid,
    /// Invoice whose balance this entry moves, if any.
    pub invoice_id: Option<Uuid>,
    pub amount: i64,
    pub status: EntryStatus,
    pub details: String,
    pub items: Option<Vec<EntryItem>>,
    pub recorded_at: DateTime<Utc>,
}

impl LedgerEntry {
    pub fn new(
        customer_id: Uuid,
        kind: EntryKind,
        reference_id: Uuid,
        amount: i64,
        status: EntryStatus,
        details: String,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            customer_id,
            kind,
            reference_id,
            invoice_id: None,
            amount,
            status,
            details,
            items: None,
            recorded_at,
        }
    }

    pub fn for_invoice(mut self, invoice_id: Uuid) -> Self {
        self.invoice_id = Some(invoice_id);
        self
    }

    pub fn with_items(mut self, items: Vec<EntryItem>) -> Self {
        self.items = Some(items);
        self
    }

    /// Contribution of this entry to `sum(credit) - sum(debit)`.
    pub fn signed_amount(&self) -> i64 {
        match self.status {
            EntryStatus::Credit => self.amount,
            EntryStatus::Debit => -self.amount,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "ledger_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub customer_id: String,
    pub kind: String,
    pub reference_id: String,
    pub invoice_id: Option<String>,
    pub amount: i64,
    pub status: String,
    pub details: String,
    pub items: Option<String>,
    pub recorded_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<&LedgerEntry> for ActiveModel {
    type Error = EngineError;

    fn try_from(entry: &LedgerEntry) -> Result<Self, Self::Error> {
        let items = entry
            .items
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|err| EngineError::Validation(format!("invalid ledger items: {err}")))?;

        Ok(Self {
            id: ActiveValue::Set(entry.id.to_string()),
            customer_id: ActiveValue::Set(entry.customer_id.to_string()),
            kind: ActiveValue::Set(entry.kind.as_str().to_string()),
            reference_id: ActiveValue::Set(entry.reference_id.to_string()),
            invoice_id: ActiveValue::Set(entry.invoice_id.map(|id| id.to_string())),
            amount: ActiveValue::Set(entry.amount),
            status: ActiveValue::Set(entry.status.as_str().to_string()),
            details: ActiveValue::Set(entry.details.clone()),
            items: ActiveValue::Set(items),
            recorded_at: ActiveValue::Set(entry.recorded_at),
        })
    }
}

impl TryFrom<Model> for LedgerEntry {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let items = model
            .items
            .as_deref()
            .map(serde_json::from_str::<Vec<EntryItem>>)
            .transpose()
            .map_err(|err| EngineError::Validation(format!("invalid ledger items: {err}")))?;

        Ok(Self {
            id: parse_uuid(&model.id, "ledger entry")?,
            customer_id: parse_uuid(&model.customer_id, "customer")?,
            kind: EntryKind::try_from(model.kind.as_str())?,
            reference_id: parse_uuid(&model.reference_id, "reference")?,
            invoice_id: model
                .invoice_id
                .as_deref()
                .map(|id| parse_uuid(id, "invoice"))
                .transpose()?,
            amount: model.amount,
            status: EntryStatus::try_from(model.status.as_str())?,
            details: model.details,
            items,
            recorded_at: model.recorded_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credit_counts_positive_debit_negative() {
        let now = Utc::now();
        let customer = Uuid::new_v4();
        let reference = Uuid::new_v4();
        let debit = LedgerEntry::new(
            customer,
            EntryKind::Invoice,
            reference,
            1_000,
            EntryStatus::Debit,
            "Invoice INV-000001".to_string(),
            now,
        );
        let credit = LedgerEntry::new(
            customer,
            EntryKind::Payment,
            reference,
            400,
            EntryStatus::Credit,
            "Payment for INV-000001".to_string(),
            now,
        );
        assert_eq!(debit.signed_amount() + credit.signed_amount(), -600);
    }

    #[test]
    fn negative_return_debit_reduces_what_is_owed() {
        let entry = LedgerEntry::new(
            Uuid::new_v4(),
            EntryKind::Return,
            Uuid::new_v4(),
            -250,
            EntryStatus::Debit,
            "Return".to_string(),
            Utc::now(),
        );
        assert_eq!(entry.signed_amount(), 250);
    }

    #[test]
    fn entries_recorded_together_sort_in_write_order() {
        let now = Utc::now();
        let customer = Uuid::new_v4();
        let ids: Vec<String> = (0..50)
            .map(|n| {
                LedgerEntry::new(
                    customer,
                    EntryKind::Payment,
                    customer,
                    n,
                    EntryStatus::Credit,
                    format!("Payment {n}"),
                    now,
                )
                .id
                .to_string()
            })
            .collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn items_survive_storage_conversion() {
        let product_id = Uuid::new_v4();
        let entry = LedgerEntry::new(
            Uuid::new_v4(),
            EntryKind::Invoice,
            Uuid::new_v4(),
            300,
            EntryStatus::Debit,
            "Invoice".to_string(),
            Utc::now(),
        )
        .with_items(vec![EntryItem {
            product_id,
            quantity: 3,
            price: 100,
        }]);

        let active = ActiveModel::try_from(&entry).unwrap();
        let ActiveValue::Set(Some(stored)) = active.items else {
            panic!("items not set");
        };
        let items: Vec<EntryItem> = serde_json::from_str(&stored).unwrap();
        assert_eq!(items[0].product_id, product_id);
        assert_eq!(items[0].quantity, 3);
    }
}
