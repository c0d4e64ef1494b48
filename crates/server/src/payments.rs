use api_types::payment::{PaymentNew, PaymentsResponse};
use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;
use engine::AddPaymentCmd;

use crate::{
    ServerError,
    extract::JsonBody,
    server::ServerState,
    views::{method_from_api, payment_view},
};

pub async fn add(
    State(state): State<ServerState>,
    JsonBody(payload): JsonBody<PaymentNew>,
) -> Result<(StatusCode, Json<PaymentsResponse>), ServerError> {
    let mut cmd = AddPaymentCmd::new(payload.name, payload.amount, Utc::now())
        .method(method_from_api(payload.method));
    if let Some(number) = payload.invoice_number {
        cmd = cmd.invoice_number(number);
    }

    let payments = state.engine.add_payment(cmd).await?;
    Ok((
        StatusCode::CREATED,
        Json(PaymentsResponse {
            payments: payments.into_iter().map(payment_view).collect(),
        }),
    ))
}
