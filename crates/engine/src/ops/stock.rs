use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use sea_orm::{DatabaseTransaction, QueryFilter, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, Stock, products, stocks, util::normalize_required_name};

use super::{Engine, with_tx};

/// Stock rows for `product_ids`, keyed by product. Missing rows are absent.
pub(super) async fn stocks_by_product(
    db_tx: &DatabaseTransaction,
    product_ids: impl IntoIterator<Item = Uuid>,
) -> ResultEngine<HashMap<Uuid, Stock>> {
    let ids: Vec<String> = product_ids.into_iter().map(|id| id.to_string()).collect();
    let models = stocks::Entity::find()
        .filter(stocks::Column::ProductId.is_in(ids))
        .all(db_tx)
        .await?;

    models
        .into_iter()
        .map(|model| Stock::try_from(model).map(|stock| (stock.product_id, stock)))
        .collect()
}

/// Check every requested quantity against on-hand stock before any write.
///
/// `requested` maps product id to `(product name, quantity)`.
pub(super) async fn ensure_available(
    db_tx: &DatabaseTransaction,
    requested: &BTreeMap<Uuid, (String, i64)>,
) -> ResultEngine<()> {
    let stocks = stocks_by_product(db_tx, requested.keys().copied()).await?;
    for (product_id, (name, quantity)) in requested {
        let stock = stocks.get(product_id).ok_or_else(|| {
            EngineError::NotFound(format!("Stock not found for product: {name}"))
        })?;
        if stock.quantity < *quantity {
            return Err(EngineError::InsufficientStock {
                product: name.clone(),
                available: stock.quantity,
            });
        }
    }
    Ok(())
}

/// Guarded decrement: the row is only touched while `quantity >= n`.
pub(super) async fn decrement_stock(
    db_tx: &DatabaseTransaction,
    product_id: Uuid,
    product_name: &str,
    quantity: i64,
    at: DateTime<Utc>,
) -> ResultEngine<()> {
    let result = stocks::Entity::update_many()
        .col_expr(
            stocks::Column::Quantity,
            Expr::col(stocks::Column::Quantity).sub(quantity),
        )
        .col_expr(stocks::Column::LastStockUpdate, Expr::value(at))
        .filter(stocks::Column::ProductId.eq(product_id.to_string()))
        .filter(stocks::Column::Quantity.gte(quantity))
        .exec(db_tx)
        .await?;
    if result.rows_affected == 1 {
        return Ok(());
    }

    let available = stocks::Entity::find()
        .filter(stocks::Column::ProductId.eq(product_id.to_string()))
        .one(db_tx)
        .await?
        .ok_or_else(|| {
            EngineError::NotFound(format!("Stock not found for product: {product_name}"))
        })?
        .quantity;
    Err(EngineError::InsufficientStock {
        product: product_name.to_string(),
        available,
    })
}

pub(super) async fn increment_stock(
    db_tx: &DatabaseTransaction,
    product_id: Uuid,
    quantity: i64,
    at: DateTime<Utc>,
) -> ResultEngine<()> {
    let result = stocks::Entity::update_many()
        .col_expr(
            stocks::Column::Quantity,
            Expr::col(stocks::Column::Quantity).add(quantity),
        )
        .col_expr(stocks::Column::LastStockUpdate, Expr::value(at))
        .filter(stocks::Column::ProductId.eq(product_id.to_string()))
        .exec(db_tx)
        .await?;
    if result.rows_affected != 1 {
        return Err(EngineError::NotFound(format!(
            "Stock not found for product: {product_id}"
        )));
    }
    Ok(())
}

impl Engine {
    /// Current stock of a product, looked up by product name.
    pub async fn stock(&self, product_name: &str) -> ResultEngine<Stock> {
        let product_name = normalize_required_name(product_name, "product")?;
        with_tx!(self, "stock", |db_tx| {
            let product = products::Entity::find()
                .filter(products::Column::Name.eq(product_name.clone()))
                .one(&db_tx)
                .await?
                .ok_or_else(|| {
                    EngineError::NotFound(format!("Product not found: {product_name}"))
                })?;
            let stock = stocks::Entity::find()
                .filter(stocks::Column::ProductId.eq(product.id))
                .one(&db_tx)
                .await?
                .ok_or_else(|| {
                    EngineError::NotFound(format!("Stock not found for product: {product_name}"))
                })?;
            Stock::try_from(stock)
        })
    }

    /// Overwrite the on-hand quantity of a product.
    pub async fn set_stock(
        &self,
        product_name: &str,
        quantity: i64,
        at: DateTime<Utc>,
    ) -> ResultEngine<Stock> {
        let product_name = normalize_required_name(product_name, "product")?;
        if quantity < 0 {
            return Err(EngineError::Validation(
                "Stock quantity cannot be negative".to_string(),
            ));
        }

        with_tx!(self, "set_stock", |db_tx| {
            let product = products::Entity::find()
                .filter(products::Column::Name.eq(product_name.clone()))
                .one(&db_tx)
                .await?
                .ok_or_else(|| {
                    EngineError::NotFound(format!("Product not found: {product_name}"))
                })?;
            let existing = stocks::Entity::find()
                .filter(stocks::Column::ProductId.eq(product.id.clone()))
                .one(&db_tx)
                .await?;

            let model = match existing {
                Some(model) => {
                    let mut active: stocks::ActiveModel = model.into();
                    active.quantity = sea_orm::ActiveValue::Set(quantity);
                    active.last_stock_update = sea_orm::ActiveValue::Set(at);
                    active.update(&db_tx).await?
                }
                None => {
                    stocks::ActiveModel {
                        id: sea_orm::ActiveValue::Set(Uuid::new_v4().to_string()),
                        product_id: sea_orm::ActiveValue::Set(product.id),
                        quantity: sea_orm::ActiveValue::Set(quantity),
                        last_stock_update: sea_orm::ActiveValue::Set(at),
                    }
                    .insert(&db_tx)
                    .await?
                }
            };

            tracing::info!(product = %product_name, quantity, "stock set");
            Stock::try_from(model)
        })
    }
}
