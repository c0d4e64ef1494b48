//! Return API endpoints.

use api_types::returns::{ReturnNew, ReturnResponse};
use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;
use engine::{AddReturnCmd, InvoiceRef};
use uuid::Uuid;

use crate::{
    ServerError,
    extract::{JsonBody, PathParam},
    server::ServerState,
    views::return_view,
};

pub async fn add(
    State(state): State<ServerState>,
    JsonBody(payload): JsonBody<ReturnNew>,
) -> Result<(StatusCode, Json<ReturnResponse>), ServerError> {
    let invoice = match (payload.invoice_number, payload.invoice_id) {
        (Some(number), None) => InvoiceRef::Number(number),
        (None, Some(id)) => InvoiceRef::Id(id),
        (None, None) => {
            return Err(ServerError::Generic(
                "either invoice_number or invoice_id is required".to_string(),
            ));
        }
        (Some(_), Some(_)) => {
            return Err(ServerError::Generic(
                "provide only one of invoice_number or invoice_id".to_string(),
            ));
        }
    };

    let mut cmd = AddReturnCmd::new(
        invoice,
        payload.product_name,
        payload.name,
        payload.quantity,
        Utc::now(),
    );
    if let Some(reason) = payload.reason {
        cmd = cmd.reason(reason);
    }

    let ret = state.engine.add_return(cmd).await?;
    Ok((
        StatusCode::CREATED,
        Json(ReturnResponse {
            return_: return_view(ret),
        }),
    ))
}

pub async fn cancel(
    State(state): State<ServerState>,
    PathParam(id): PathParam<Uuid>,
) -> Result<Json<ReturnResponse>, ServerError> {
    let ret = state.engine.cancel_return(id, Utc::now()).await?;
    Ok(Json(ReturnResponse {
        return_: return_view(ret),
    }))
}
