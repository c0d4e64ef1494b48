//! Product returns against an invoice.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, util::parse_uuid};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Return {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub invoice_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i64,
    pub unit_price: i64,
    pub refund_amount: i64,
    /// Part of `refund_amount` paid back because it exceeded the balance due.
    pub cash_refund: i64,
    pub reason: Option<String>,
    pub returned_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl Return {
    pub fn is_active(&self) -> bool {
        self.cancelled_at.is_none()
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "returns")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub customer_id: String,
    pub invoice_id: String,
    pub product_id: String,
    pub quantity: i64,
    pub unit_price: i64,
    pub refund_amount: i64,
    pub cash_refund: i64,
    pub reason: Option<String>,
    pub returned_at: DateTimeUtc,
    pub cancelled_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Return> for ActiveModel {
    fn from(ret: &Return) -> Self {
        Self {
            id: ActiveValue::Set(ret.id.to_string()),
            customer_id: ActiveValue::Set(ret.customer_id.to_string()),
            invoice_id: ActiveValue::Set(ret.invoice_id.to_string()),
            product_id: ActiveValue::Set(ret.product_id.to_string()),
            quantity: ActiveValue::Set(ret.quantity),
            unit_price: ActiveValue::Set(ret.unit_price),
            refund_amount: ActiveValue::Set(ret.refund_amount),
            cash_refund: ActiveValue::Set(ret.cash_refund),
            reason: ActiveValue::Set(ret.reason.clone()),
            returned_at: ActiveValue::Set(ret.returned_at),
            cancelled_at: ActiveValue::Set(ret.cancelled_at),
        }
    }
}

impl TryFrom<Model> for Return {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "return")?,
            customer_id: parse_uuid(&model.customer_id, "customer")?,
            invoice_id: parse_uuid(&model.invoice_id, "invoice")?,
            product_id: parse_uuid(&model.product_id, "product")?,
            quantity: model.quantity,
            unit_price: model.unit_price,
            refund_amount: model.refund_amount,
            cash_refund: model.cash_refund,
            reason: model.reason,
            returned_at: model.returned_at,
            cancelled_at: model.cancelled_at,
        })
    }
}
