use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine, SalesOrder, counters::SALES_ORDER_SEQUENCE, products,
    sales::{self, contributions},
};

use super::{Engine, sequence::next_sequence, with_tx};

/// A sales aggregate with the product's name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SalesSummary {
    pub order: SalesOrder,
    pub product_name: String,
}

async fn order_for_product(
    db_tx: &DatabaseTransaction,
    product_id: Uuid,
) -> ResultEngine<Option<sales::Model>> {
    Ok(sales::Entity::find()
        .filter(sales::Column::ProductId.eq(product_id.to_string()))
        .one(db_tx)
        .await?)
}

/// Add an invoice's share of a product to its sales order.
///
/// Creates the order (drawing a sales order number) when the product has none
/// and merges into an existing contribution of the same invoice.
pub(super) async fn add_contribution(
    db_tx: &DatabaseTransaction,
    product_id: Uuid,
    invoice_id: Uuid,
    customer_id: Uuid,
    quantity: i64,
    subtotal: i64,
    at: DateTime<Utc>,
) -> ResultEngine<()> {
    let order_id = match order_for_product(db_tx, product_id).await? {
        Some(order) => {
            let order_id = order.id.clone();
            let mut active: sales::ActiveModel = order.clone().into();
            active.count = ActiveValue::Set(order.count + quantity);
            active.subtotal = ActiveValue::Set(order.subtotal + subtotal);
            active.last_update = ActiveValue::Set(at);
            active.update(db_tx).await?;
            order_id
        }
        None => {
            let order = SalesOrder {
                id: Uuid::new_v4(),
                order_number: next_sequence(db_tx, SALES_ORDER_SEQUENCE).await?,
                product_id,
                customer_id,
                count: quantity,
                subtotal,
                last_update: at,
            };
            sales::ActiveModel::from(&order).insert(db_tx).await?;
            order.id.to_string()
        }
    };

    let existing = contributions::Entity::find_by_id((order_id.clone(), invoice_id.to_string()))
        .one(db_tx)
        .await?;
    match existing {
        Some(contribution) => {
            let mut active: contributions::ActiveModel = contribution.clone().into();
            active.quantity = ActiveValue::Set(contribution.quantity + quantity);
            active.subtotal = ActiveValue::Set(contribution.subtotal + subtotal);
            active.update(db_tx).await?;
        }
        None => {
            contributions::ActiveModel {
                sales_order_id: ActiveValue::Set(order_id),
                invoice_id: ActiveValue::Set(invoice_id.to_string()),
                quantity: ActiveValue::Set(quantity),
                subtotal: ActiveValue::Set(subtotal),
            }
            .insert(db_tx)
            .await?;
        }
    }
    Ok(())
}

/// Take part of an invoice's contribution back out of the sales order.
///
/// Rows that reach zero are deleted, the order included.
pub(super) async fn reduce_contribution(
    db_tx: &DatabaseTransaction,
    product_id: Uuid,
    invoice_id: Uuid,
    quantity: i64,
    subtotal: i64,
    at: DateTime<Utc>,
) -> ResultEngine<()> {
    let order = order_for_product(db_tx, product_id)
        .await?
        .ok_or_else(|| EngineError::NotFound("sales order not found".to_string()))?;
    let contribution =
        contributions::Entity::find_by_id((order.id.clone(), invoice_id.to_string()))
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::NotFound("sales contribution not found".to_string()))?;

    let quantity = quantity.min(contribution.quantity);
    let subtotal = subtotal.min(contribution.subtotal);
    if contribution.quantity - quantity == 0 {
        contributions::Entity::delete_by_id((order.id.clone(), invoice_id.to_string()))
            .exec(db_tx)
            .await?;
    } else {
        let mut active: contributions::ActiveModel = contribution.clone().into();
        active.quantity = ActiveValue::Set(contribution.quantity - quantity);
        active.subtotal = ActiveValue::Set(contribution.subtotal - subtotal);
        active.update(db_tx).await?;
    }

    shrink_order(db_tx, order, quantity, subtotal, at).await
}

/// Remove every contribution of an invoice.
pub(super) async fn remove_invoice_contributions(
    db_tx: &DatabaseTransaction,
    invoice_id: Uuid,
    at: DateTime<Utc>,
) -> ResultEngine<()> {
    let rows = contributions::Entity::find()
        .filter(contributions::Column::InvoiceId.eq(invoice_id.to_string()))
        .all(db_tx)
        .await?;

    for row in rows {
        let order = sales::Entity::find_by_id(row.sales_order_id.clone())
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::NotFound("sales order not found".to_string()))?;
        contributions::Entity::delete_by_id((row.sales_order_id.clone(), row.invoice_id.clone()))
            .exec(db_tx)
            .await?;
        shrink_order(db_tx, order, row.quantity, row.subtotal, at).await?;
    }
    Ok(())
}

async fn shrink_order(
    db_tx: &DatabaseTransaction,
    order: sales::Model,
    quantity: i64,
    subtotal: i64,
    at: DateTime<Utc>,
) -> ResultEngine<()> {
    let count = order.count - quantity;
    if count <= 0 {
        sales::Entity::delete_by_id(order.id).exec(db_tx).await?;
        return Ok(());
    }
    let remaining = order.subtotal - subtotal;
    let mut active: sales::ActiveModel = order.into();
    active.count = ActiveValue::Set(count);
    active.subtotal = ActiveValue::Set(remaining);
    active.last_update = ActiveValue::Set(at);
    active.update(db_tx).await?;
    Ok(())
}

impl Engine {
    /// Sales aggregates ordered by order number.
    pub async fn list_sales(&self) -> ResultEngine<Vec<SalesSummary>> {
        with_tx!(self, "list_sales", |db_tx| {
            let orders = sales::Entity::find()
                .order_by_asc(sales::Column::OrderNumber)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(SalesOrder::try_from)
                .collect::<ResultEngine<Vec<_>>>()?;
            let names: HashMap<String, String> = products::Entity::find()
                .filter(
                    products::Column::Id
                        .is_in(orders.iter().map(|order| order.product_id.to_string())),
                )
                .all(&db_tx)
                .await?
                .into_iter()
                .map(|product| (product.id, product.name))
                .collect();

            Ok(orders
                .into_iter()
                .map(|order| SalesSummary {
                    product_name: names
                        .get(&order.product_id.to_string())
                        .cloned()
                        .unwrap_or_default(),
                    order,
                })
                .collect())
        })
    }
}
