#![allow(dead_code)]

use chrono::Utc;
use sea_orm::{Database, DatabaseConnection};

use engine::{CreateInvoiceCmd, Engine, InvoiceDraft, InvoiceView, NewProductCmd};
use migration::MigratorTrait;

pub async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

/// Adds `name` to the catalog at `price` minor units with `stock` units on hand.
pub async fn product(engine: &Engine, name: &str, price: i64, stock: i64) {
    engine
        .create_product(
            NewProductCmd::new(name, format!("{}-001", name.to_uppercase()), price, Utc::now())
                .cost_price(price / 2)
                .initial_stock(stock),
        )
        .await
        .unwrap();
}

pub fn alice() -> InvoiceDraft {
    InvoiceDraft::new("Alice")
        .email("alice@example.com")
        .phone("555-0101")
}

pub async fn invoice(engine: &Engine, draft: InvoiceDraft) -> InvoiceView {
    engine
        .create_invoice(CreateInvoiceCmd::new(draft, Utc::now()))
        .await
        .unwrap()
}

pub async fn stock_of(engine: &Engine, product: &str) -> i64 {
    engine.stock(product).await.unwrap().quantity
}

pub async fn outstanding(engine: &Engine, name: &str) -> i64 {
    engine
        .customer_account(name)
        .await
        .unwrap()
        .customer
        .outstanding_balance
}

/// Checks the balances of `name` against its invoices and its ledger.
pub async fn assert_customer_consistent(engine: &Engine, name: &str) {
    let account = engine.customer_account(name).await.unwrap();
    let mut due = 0;
    for id in &account.invoices {
        let view = engine.invoice(*id).await.unwrap();
        let invoice = &view.invoice;
        assert_eq!(
            invoice.total_amount,
            invoice.subtotal - invoice.discount_amount - invoice.refunded_amount
        );
        assert_eq!(
            invoice.balance_due,
            invoice.total_amount - invoice.amount_paid
        );
        assert!(invoice.balance_due >= 0);
        due += invoice.balance_due;
    }
    assert_eq!(account.customer.outstanding_balance, due);
    assert_eq!(account.customer.balance, due);

    let statement = engine.customer_statement(name).await.unwrap();
    assert_eq!(statement.balance, -account.customer.outstanding_balance);
    assert_eq!(statement.entries.len(), account.transactions.len());
}
