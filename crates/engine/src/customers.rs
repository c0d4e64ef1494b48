//! Customer accounts.
//!
//! A customer is matched by its unique name. It carries two running totals:
//! `outstanding_balance` is the authoritative amount owed across all invoices;
//! `balance` is moved by the same deltas and kept for compatibility with
//! clients that still read it.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, util::parse_uuid};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: Option<String>,
    pub balance: i64,
    pub outstanding_balance: i64,
    pub created_at: DateTime<Utc>,
}

impl Customer {
    pub fn new(name: String, email: String, phone: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            phone,
            address: None,
            balance: 0,
            outstanding_balance: 0,
            created_at,
        }
    }
}

/// A customer with the ordered ids of everything it owns.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerAccount {
    pub customer: Customer,
    pub invoices: Vec<Uuid>,
    pub payments: Vec<Uuid>,
    pub returns: Vec<Uuid>,
    pub transactions: Vec<Uuid>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "customers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: Option<String>,
    pub balance: i64,
    pub outstanding_balance: i64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::invoices::Entity")]
    Invoices,
}

impl Related<super::invoices::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Invoices.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Customer> for ActiveModel {
    fn from(customer: &Customer) -> Self {
        Self {
            id: ActiveValue::Set(customer.id.to_string()),
            name: ActiveValue::Set(customer.name.clone()),
            email: ActiveValue::Set(customer.email.clone()),
            phone: ActiveValue::Set(customer.phone.clone()),
            address: ActiveValue::Set(customer.address.clone()),
            balance: ActiveValue::Set(customer.balance),
            outstanding_balance: ActiveValue::Set(customer.outstanding_balance),
            created_at: ActiveValue::Set(customer.created_at),
        }
    }
}

impl TryFrom<Model> for Customer {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "customer")?,
            name: model.name,
            email: model.email,
            phone: model.phone,
            address: model.address,
            balance: model.balance,
            outstanding_balance: model.outstanding_balance,
            created_at: model.created_at,
        })
    }
}
