use api_types::customer::{AccountResponse, StatementResponse};
use axum::{Json, extract::State};

use crate::{
    ServerError,
    extract::PathParam,
    server::ServerState,
    views::{account_response, statement_response},
};

pub async fn account(
    State(state): State<ServerState>,
    PathParam(name): PathParam<String>,
) -> Result<Json<AccountResponse>, ServerError> {
    let account = state.engine.customer_account(&name).await?;
    Ok(Json(account_response(account)))
}

pub async fn statement(
    State(state): State<ServerState>,
    PathParam(name): PathParam<String>,
) -> Result<Json<StatementResponse>, ServerError> {
    let statement = state.engine.customer_statement(&name).await?;
    Ok(Json(statement_response(statement)))
}
