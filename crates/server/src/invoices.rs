//! Invoice API endpoints.

use api_types::{
    MessageBody,
    invoice::{
        InvoiceBody, InvoiceListQuery, InvoiceListResponse, InvoiceResponse, StatusUpdate,
    },
};
use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;
use engine::{
    CreateInvoiceCmd, DiscountRate, InvoiceDraft, UpdateInvoiceCmd, UpdateInvoiceStatusCmd,
};
use uuid::Uuid;

use crate::{
    ServerError,
    extract::{JsonBody, PathParam, QueryParams},
    server::ServerState,
    views::{invoice_view, method_from_api, status_from_api},
};

const DEFAULT_PAGE: u64 = 50;
const MAX_PAGE: u64 = 200;

fn draft(body: InvoiceBody) -> Result<InvoiceDraft, ServerError> {
    let discount = match body.discount {
        Some(percent) => DiscountRate::from_percent(percent)?,
        None => DiscountRate::NONE,
    };

    let mut draft = InvoiceDraft::new(body.name)
        .amount(body.amount)
        .discount(discount);
    if let Some(email) = body.email {
        draft = draft.email(email);
    }
    if let Some(phone) = body.phone {
        draft = draft.phone(phone);
    }
    for item in body.items {
        draft = draft.item(item.product, item.quantity);
    }
    Ok(draft)
}

pub async fn create(
    State(state): State<ServerState>,
    JsonBody(payload): JsonBody<InvoiceBody>,
) -> Result<(StatusCode, Json<InvoiceResponse>), ServerError> {
    let view = state
        .engine
        .create_invoice(CreateInvoiceCmd::new(draft(payload)?, Utc::now()))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(InvoiceResponse {
            invoice: invoice_view(view, Utc::now()),
        }),
    ))
}

pub async fn list(
    State(state): State<ServerState>,
    QueryParams(query): QueryParams<InvoiceListQuery>,
) -> Result<Json<InvoiceListResponse>, ServerError> {
    let limit = query.limit.unwrap_or(DEFAULT_PAGE).clamp(1, MAX_PAGE);
    let page = state
        .engine
        .list_invoices(limit, query.cursor.as_deref())
        .await?;

    let now = Utc::now();
    Ok(Json(InvoiceListResponse {
        invoices: page
            .invoices
            .into_iter()
            .map(|view| invoice_view(view, now))
            .collect(),
        next_cursor: page.next_cursor,
    }))
}

pub async fn get(
    State(state): State<ServerState>,
    PathParam(id): PathParam<Uuid>,
) -> Result<Json<InvoiceResponse>, ServerError> {
    let view = state.engine.invoice(id).await?;
    Ok(Json(InvoiceResponse {
        invoice: invoice_view(view, Utc::now()),
    }))
}

pub async fn get_by_number(
    State(state): State<ServerState>,
    PathParam(number): PathParam<i64>,
) -> Result<Json<InvoiceResponse>, ServerError> {
    let view = state.engine.invoice_by_number(number).await?;
    Ok(Json(InvoiceResponse {
        invoice: invoice_view(view, Utc::now()),
    }))
}

pub async fn update(
    State(state): State<ServerState>,
    PathParam(id): PathParam<Uuid>,
    JsonBody(payload): JsonBody<InvoiceBody>,
) -> Result<Json<InvoiceResponse>, ServerError> {
    let view = state
        .engine
        .update_invoice(UpdateInvoiceCmd::new(id, draft(payload)?, Utc::now()))
        .await?;
    Ok(Json(InvoiceResponse {
        invoice: invoice_view(view, Utc::now()),
    }))
}

pub async fn delete(
    State(state): State<ServerState>,
    PathParam(id): PathParam<Uuid>,
) -> Result<Json<MessageBody>, ServerError> {
    state.engine.delete_invoice(id, Utc::now()).await?;
    Ok(Json(MessageBody {
        message: "Invoice deleted".to_string(),
    }))
}

pub async fn update_status(
    State(state): State<ServerState>,
    PathParam(id): PathParam<Uuid>,
    JsonBody(payload): JsonBody<StatusUpdate>,
) -> Result<Json<InvoiceResponse>, ServerError> {
    let mut cmd = UpdateInvoiceStatusCmd::new(id, status_from_api(payload.status), Utc::now())
        .method(method_from_api(payload.method));
    if let Some(amount) = payload.payment_amount {
        cmd = cmd.payment_amount(amount);
    }

    let view = state.engine.update_invoice_status(cmd).await?;
    Ok(Json(InvoiceResponse {
        invoice: invoice_view(view, Utc::now()),
    }))
}
