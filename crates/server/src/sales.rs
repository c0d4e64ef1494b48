use api_types::sales::SalesResponse;
use axum::{Json, extract::State};

use crate::{ServerError, server::ServerState, views::sales_view};

pub async fn list(State(state): State<ServerState>) -> Result<Json<SalesResponse>, ServerError> {
    let sales = state.engine.list_sales().await?;
    Ok(Json(SalesResponse {
        sales: sales.into_iter().map(sales_view).collect(),
    }))
}
