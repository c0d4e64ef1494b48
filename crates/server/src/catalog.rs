//! Catalog seeding endpoints: products and stock levels.

use api_types::catalog::{ProductNew, ProductResponse, ProductsResponse, StockSet, StockView};
use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;
use engine::NewProductCmd;

use crate::{
    ServerError,
    extract::{JsonBody, PathParam},
    server::ServerState,
    views::{product_view, stock_view},
};

pub async fn create(
    State(state): State<ServerState>,
    JsonBody(payload): JsonBody<ProductNew>,
) -> Result<(StatusCode, Json<ProductResponse>), ServerError> {
    let mut cmd = NewProductCmd::new(
        payload.name,
        payload.product_code,
        payload.selling_price,
        Utc::now(),
    )
    .cost_price(payload.cost_price)
    .tax_rate(payload.tax_rate)
    .initial_stock(payload.initial_stock);
    if let Some(category) = payload.category {
        cmd = cmd.category(category);
    }
    if let Some(supplier) = payload.supplier {
        cmd = cmd.supplier(supplier);
    }

    let (product, stock) = state.engine.create_product(cmd).await?;
    Ok((
        StatusCode::CREATED,
        Json(ProductResponse {
            product: product_view(product, stock.quantity),
        }),
    ))
}

pub async fn list(State(state): State<ServerState>) -> Result<Json<ProductsResponse>, ServerError> {
    let products = state.engine.list_products().await?;
    Ok(Json(ProductsResponse {
        products: products
            .into_iter()
            .map(|(product, stock)| product_view(product, stock))
            .collect(),
    }))
}

pub async fn stock(
    State(state): State<ServerState>,
    PathParam(product): PathParam<String>,
) -> Result<Json<StockView>, ServerError> {
    let stock = state.engine.stock(&product).await?;
    Ok(Json(stock_view(stock)))
}

pub async fn set_stock(
    State(state): State<ServerState>,
    PathParam(product): PathParam<String>,
    JsonBody(payload): JsonBody<StockSet>,
) -> Result<Json<StockView>, ServerError> {
    let stock = state
        .engine
        .set_stock(&product, payload.quantity, Utc::now())
        .await?;
    Ok(Json(stock_view(stock)))
}
