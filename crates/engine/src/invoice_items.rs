//! Storage for invoice line items.

use sea_orm::{ActiveValue, entity::prelude::*};
use uuid::Uuid;

use crate::InvoiceLine;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "invoice_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub invoice_id: String,
    pub position: i32,
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: i64,
    pub tax_rate: i32,
    pub line_total: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::invoices::Entity",
        from = "Column::InvoiceId",
        to = "super::invoices::Column::Id"
    )]
    Invoice,
}

impl Related<super::invoices::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Invoice.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub(crate) fn active_model(invoice_id: Uuid, position: usize, line: &InvoiceLine) -> ActiveModel {
    ActiveModel {
        id: ActiveValue::Set(Uuid::new_v4().to_string()),
        invoice_id: ActiveValue::Set(invoice_id.to_string()),
        position: ActiveValue::Set(position as i32),
        product_id: ActiveValue::Set(line.product_id.to_string()),
        product_name: ActiveValue::Set(line.product_name.clone()),
        quantity: ActiveValue::Set(line.quantity),
        unit_price: ActiveValue::Set(line.unit_price),
        tax_rate: ActiveValue::Set(line.tax_rate as i32),
        line_total: ActiveValue::Set(line.line_total),
    }
}
