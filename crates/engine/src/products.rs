//! Catalog products.
//!
//! Products are read-only for the invoice flows; prices are copied onto the
//! invoice lines when an invoice is written.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, util::parse_uuid};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub product_code: String,
    pub cost_price: i64,
    pub selling_price: i64,
    /// Tax rate in basis points. Informational: invoices are not taxed.
    pub tax_rate: u32,
    pub category: Option<String>,
    pub supplier: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub name: String,
    #[sea_orm(unique)]
    pub product_code: String,
    pub cost_price: i64,
    pub selling_price: i64,
    pub tax_rate: i32,
    pub category: Option<String>,
    pub supplier: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::stocks::Entity")]
    Stock,
}

impl Related<super::stocks::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Stock.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Product> for ActiveModel {
    fn from(product: &Product) -> Self {
        Self {
            id: ActiveValue::Set(product.id.to_string()),
            name: ActiveValue::Set(product.name.clone()),
            product_code: ActiveValue::Set(product.product_code.clone()),
            cost_price: ActiveValue::Set(product.cost_price),
            selling_price: ActiveValue::Set(product.selling_price),
            tax_rate: ActiveValue::Set(product.tax_rate as i32),
            category: ActiveValue::Set(product.category.clone()),
            supplier: ActiveValue::Set(product.supplier.clone()),
            created_at: ActiveValue::Set(product.created_at),
        }
    }
}

impl TryFrom<Model> for Product {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "product")?,
            name: model.name,
            product_code: model.product_code,
            cost_price: model.cost_price,
            selling_price: model.selling_price,
            tax_rate: u32::try_from(model.tax_rate).unwrap_or_default(),
            category: model.category,
            supplier: model.supplier,
            created_at: model.created_at,
        })
    }
}
