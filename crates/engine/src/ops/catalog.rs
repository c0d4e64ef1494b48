use std::collections::{BTreeSet, HashMap};

use sea_orm::{ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, NewProductCmd, Product, ResultEngine, Stock, products, stocks,
    util::{normalize_optional_text, normalize_required_name},
};

use super::{Engine, stock::stocks_by_product, with_tx};

/// Resolve products by name in one query.
///
/// Fails with every missing name listed, in request order.
pub(super) async fn products_by_names(
    db_tx: &DatabaseTransaction,
    names: &[String],
) -> ResultEngine<HashMap<String, Product>> {
    let unique: BTreeSet<&String> = names.iter().collect();
    let found = products::Entity::find()
        .filter(products::Column::Name.is_in(unique.iter().map(|name| name.to_string())))
        .all(db_tx)
        .await?
        .into_iter()
        .map(|model| Product::try_from(model).map(|product| (product.name.clone(), product)))
        .collect::<ResultEngine<HashMap<_, _>>>()?;

    let mut missing: Vec<&str> = Vec::new();
    for name in names {
        if !found.contains_key(name) && !missing.contains(&name.as_str()) {
            missing.push(name);
        }
    }
    if !missing.is_empty() {
        return Err(EngineError::NotFound(format!(
            "Products not found: {}",
            missing.join(", ")
        )));
    }
    Ok(found)
}

pub(super) async fn require_product_by_name(
    db_tx: &DatabaseTransaction,
    name: &str,
) -> ResultEngine<Product> {
    products::Entity::find()
        .filter(products::Column::Name.eq(name))
        .one(db_tx)
        .await?
        .ok_or_else(|| EngineError::NotFound(format!("Product not found: {name}")))
        .and_then(Product::try_from)
}

impl Engine {
    /// Add a product to the catalog together with its stock row.
    pub async fn create_product(&self, cmd: NewProductCmd) -> ResultEngine<(Product, Stock)> {
        let name = normalize_required_name(&cmd.name, "product")?;
        let product_code = cmd.product_code.trim().to_string();
        if product_code.is_empty() {
            return Err(EngineError::Validation(
                "product code must not be empty".to_string(),
            ));
        }
        if cmd.cost_price < 0 || cmd.selling_price < 0 {
            return Err(EngineError::Validation(
                "prices cannot be negative".to_string(),
            ));
        }
        if cmd.initial_stock < 0 {
            return Err(EngineError::Validation(
                "Stock quantity cannot be negative".to_string(),
            ));
        }

        with_tx!(self, "create_product", |db_tx| {
            let duplicate = products::Entity::find()
                .filter(
                    sea_orm::Condition::any()
                        .add(products::Column::Name.eq(name.clone()))
                        .add(products::Column::ProductCode.eq(product_code.clone())),
                )
                .one(&db_tx)
                .await?;
            if let Some(existing) = duplicate {
                let key = if existing.name == name {
                    name.clone()
                } else {
                    product_code.clone()
                };
                return Err(EngineError::ExistingKey(key));
            }

            let product = Product {
                id: Uuid::new_v4(),
                name: name.clone(),
                product_code: product_code.clone(),
                cost_price: cmd.cost_price,
                selling_price: cmd.selling_price,
                tax_rate: cmd.tax_rate,
                category: normalize_optional_text(cmd.category.as_deref()),
                supplier: normalize_optional_text(cmd.supplier.as_deref()),
                created_at: cmd.created_at,
            };
            products::ActiveModel::from(&product).insert(&db_tx).await?;

            let stock = Stock {
                id: Uuid::new_v4(),
                product_id: product.id,
                quantity: cmd.initial_stock,
                last_stock_update: cmd.created_at,
            };
            stocks::ActiveModel {
                id: ActiveValue::Set(stock.id.to_string()),
                product_id: ActiveValue::Set(stock.product_id.to_string()),
                quantity: ActiveValue::Set(stock.quantity),
                last_stock_update: ActiveValue::Set(stock.last_stock_update),
            }
            .insert(&db_tx)
            .await?;

            tracing::info!(product = %product.name, stock = stock.quantity, "product created");
            Ok((product, stock))
        })
    }

    /// All products ordered by name, with their on-hand quantity.
    pub async fn list_products(&self) -> ResultEngine<Vec<(Product, i64)>> {
        with_tx!(self, "list_products", |db_tx| {
            let products = products::Entity::find()
                .order_by_asc(products::Column::Name)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(Product::try_from)
                .collect::<ResultEngine<Vec<_>>>()?;
            let stocks = stocks_by_product(&db_tx, products.iter().map(|p| p.id)).await?;

            Ok(products
                .into_iter()
                .map(|product| {
                    let quantity = stocks.get(&product.id).map_or(0, |stock| stock.quantity);
                    (product, quantity)
                })
                .collect())
        })
    }
}
