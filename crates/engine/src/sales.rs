//! Per-product sales aggregates.
//!
//! A `SalesOrder` holds the running `{count, subtotal}` for one product.
//! Each invoice that sells the product leaves a contribution row, so the
//! aggregate can be reconciled exactly when the invoice is rewritten, deleted
//! or partially returned.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, util::parse_uuid};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesOrder {
    pub id: Uuid,
    pub order_number: i64,
    pub product_id: Uuid,
    /// Customer of the first invoice that sold the product.
    pub customer_id: Uuid,
    pub count: i64,
    pub subtotal: i64,
    pub last_update: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "sales_orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub order_number: i64,
    #[sea_orm(unique)]
    pub product_id: String,
    pub customer_id: String,
    pub count: i64,
    pub subtotal: i64,
    pub last_update: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&SalesOrder> for ActiveModel {
    fn from(order: &SalesOrder) -> Self {
        Self {
            id: ActiveValue::Set(order.id.to_string()),
            order_number: ActiveValue::Set(order.order_number),
            product_id: ActiveValue::Set(order.product_id.to_string()),
            customer_id: ActiveValue::Set(order.customer_id.to_string()),
            count: ActiveValue::Set(order.count),
            subtotal: ActiveValue::Set(order.subtotal),
            last_update: ActiveValue::Set(order.last_update),
        }
    }
}

impl TryFrom<Model> for SalesOrder {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "sales order")?,
            order_number: model.order_number,
            product_id: parse_uuid(&model.product_id, "product")?,
            customer_id: parse_uuid(&model.customer_id, "customer")?,
            count: model.count,
            subtotal: model.subtotal,
            last_update: model.last_update,
        })
    }
}

/// One invoice's share of a sales order.
pub mod contributions {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "sales_contributions")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub sales_order_id: String,
        #[sea_orm(primary_key, auto_increment = false)]
        pub invoice_id: String,
        pub quantity: i64,
        pub subtotal: i64,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}
