//! Named persistent counters backing the invoice and sales order numbers.

use sea_orm::entity::prelude::*;

pub const INVOICE_SEQUENCE: &str = "invoice";
pub const SALES_ORDER_SEQUENCE: &str = "sales_order";

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "counters")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub name: String,
    pub value: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
