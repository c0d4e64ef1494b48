use axum::{
    Router,
    extract::Request,
    middleware::{self, Next},
    response::Response,
    routing::{get, patch, post, put},
};

use std::{sync::Arc, time::Instant};

use crate::{catalog, customers, invoices, payments, returns, sales};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
}

async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    let status = response.status();
    let latency_ms = started.elapsed().as_millis();
    if status.is_server_error() {
        tracing::error!(%method, %path, status = status.as_u16(), latency_ms, "request failed");
    } else {
        tracing::info!(%method, %path, status = status.as_u16(), latency_ms, "request");
    }
    response
}

async fn health() -> &'static str {
    "ok"
}

pub fn router(engine: Engine) -> Router {
    let state = ServerState {
        engine: Arc::new(engine),
    };

    Router::new()
        .route("/health", get(health))
        .route("/invoices", get(invoices::list))
        .route("/invoices/create", post(invoices::create))
        .route(
            "/invoices/{id}",
            get(invoices::get)
                .patch(invoices::update)
                .delete(invoices::delete),
        )
        .route("/invoices/{id}/status", patch(invoices::update_status))
        .route("/invoices/number/{number}", get(invoices::get_by_number))
        .route("/pay/add", post(payments::add))
        .route("/return/add", post(returns::add))
        .route("/return/{id}/cancel", post(returns::cancel))
        .route("/customers/{name}", get(customers::account))
        .route("/customers/{name}/statement", get(customers::statement))
        .route("/products", get(catalog::list).post(catalog::create))
        .route("/stock/{product}", put(catalog::set_stock).get(catalog::stock))
        .route("/sales", get(sales::list))
        .layer(middleware::from_fn(log_requests))
        .with_state(state)
}

pub async fn run(engine: Engine, bind: &str) {
    let listener = match tokio::net::TcpListener::bind(bind).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener on {bind}: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router(engine)).await
}

pub fn spawn_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
