mod common;

use chrono::{Duration, Utc};

use engine::{
    CreateInvoiceCmd, DiscountRate, EngineError, EntryKind, EntryStatus, InvoiceDraft,
    InvoiceStatus, PaymentMethod, UpdateInvoiceCmd, UpdateInvoiceStatusCmd,
};

use common::{
    alice, assert_customer_consistent, engine_with_db, invoice, outstanding, product, stock_of,
};

#[tokio::test]
async fn create_with_partial_payment_moves_stock_ledger_and_balances() {
    let (engine, _db) = engine_with_db().await;
    product(&engine, "Widget", 10, 5).await;

    let view = invoice(&engine, alice().item("Widget", 2).amount(15)).await;
    let created = &view.invoice;

    assert_eq!(created.invoice_number, 1);
    assert_eq!(created.display_number(), "INV-000001");
    assert_eq!(created.subtotal, 20);
    assert_eq!(created.discount_amount, 0);
    assert_eq!(created.total_amount, 20);
    assert_eq!(created.amount_paid, 15);
    assert_eq!(created.balance_due, 5);
    assert_eq!(created.status, InvoiceStatus::PartiallyPaid);
    assert_eq!(created.due_date - created.issue_date, Duration::days(30));
    assert_eq!(view.customer_name, "Alice");
    assert_eq!(view.customer_email, "alice@example.com");

    assert_eq!(stock_of(&engine, "Widget").await, 3);

    let account = engine.customer_account("Alice").await.unwrap();
    assert_eq!(account.invoices, vec![created.id]);
    assert_eq!(account.payments.len(), 1);
    assert_eq!(account.customer.outstanding_balance, 5);

    let statement = engine.customer_statement("Alice").await.unwrap();
    let moves: Vec<_> = statement
        .entries
        .iter()
        .map(|entry| (entry.kind, entry.status, entry.amount))
        .collect();
    assert_eq!(
        moves,
        vec![
            (EntryKind::Invoice, EntryStatus::Debit, 20),
            (EntryKind::Payment, EntryStatus::Credit, 15),
        ]
    );
    let items = statement.entries[0].items.as_ref().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!((items[0].quantity, items[0].price), (2, 10));

    let sales = engine.list_sales().await.unwrap();
    assert_eq!(sales.len(), 1);
    assert_eq!(sales[0].product_name, "Widget");
    assert_eq!((sales[0].order.count, sales[0].order.subtotal), (2, 20));

    assert_customer_consistent(&engine, "Alice").await;
}

#[tokio::test]
async fn insufficient_stock_rejects_without_writes() {
    let (engine, _db) = engine_with_db().await;
    product(&engine, "Widget", 10, 1).await;

    let err = engine
        .create_invoice(CreateInvoiceCmd::new(
            alice().item("Widget", 2).amount(15),
            Utc::now(),
        ))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InsufficientStock {
            product: "Widget".to_string(),
            available: 1,
        }
    );
    assert_eq!(err.to_string(), "Insufficient stock for Widget. Available: 1");

    assert_eq!(stock_of(&engine, "Widget").await, 1);
    assert!(matches!(
        engine.customer_account("Alice").await,
        Err(EngineError::NotFound(_))
    ));
    let page = engine.list_invoices(10, None).await.unwrap();
    assert!(page.invoices.is_empty());
    assert!(engine.list_sales().await.unwrap().is_empty());
}

#[tokio::test]
async fn discount_caps_the_up_front_payment() {
    let (engine, _db) = engine_with_db().await;
    product(&engine, "Gadget", 50, 10).await;
    let ten_percent = DiscountRate::from_percent(10.0).unwrap();

    let err = engine
        .create_invoice(CreateInvoiceCmd::new(
            alice().item("Gadget", 2).discount(ten_percent).amount(95),
            Utc::now(),
        ))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::Overpayment("Payment amount (95) exceeds total invoice amount (90)".to_string())
    );
    assert_eq!(stock_of(&engine, "Gadget").await, 10);

    let view = invoice(&engine, alice().item("Gadget", 2).discount(ten_percent).amount(40)).await;
    assert_eq!(view.invoice.subtotal, 100);
    assert_eq!(view.invoice.discount_amount, 10);
    assert_eq!(view.invoice.total_amount, 90);
    assert_eq!(view.invoice.balance_due, 50);
    assert_eq!(view.invoice.discount_rate, 1_000);

    let statement = engine.customer_statement("Alice").await.unwrap();
    let discount = statement
        .entries
        .iter()
        .find(|entry| entry.kind == EntryKind::Discount)
        .unwrap();
    assert_eq!(discount.status, EntryStatus::Credit);
    assert_eq!(discount.amount, 10);
    assert_customer_consistent(&engine, "Alice").await;
}

#[tokio::test]
async fn unknown_product_leaves_counter_customer_and_stock_untouched() {
    let (engine, _db) = engine_with_db().await;
    product(&engine, "Widget", 10, 5).await;
    invoice(&engine, alice().item("Widget", 1)).await;

    let err = engine
        .create_invoice(CreateInvoiceCmd::new(
            InvoiceDraft::new("Bob")
                .email("bob@example.com")
                .phone("555-0102")
                .item("Widget", 1)
                .item("Sprocket", 1)
                .item("Gizmo", 2),
            Utc::now(),
        ))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::NotFound("Products not found: Sprocket, Gizmo".to_string())
    );

    assert_eq!(stock_of(&engine, "Widget").await, 4);
    assert!(matches!(
        engine.customer_account("Bob").await,
        Err(EngineError::NotFound(_))
    ));

    let next = invoice(&engine, alice().item("Widget", 1)).await;
    assert_eq!(next.invoice.invoice_number, 2);
}

#[tokio::test]
async fn new_customer_requires_contact_details() {
    let (engine, _db) = engine_with_db().await;
    product(&engine, "Widget", 10, 5).await;

    let err = engine
        .create_invoice(CreateInvoiceCmd::new(
            InvoiceDraft::new("Carol").email("carol@example.com").item("Widget", 1),
            Utc::now(),
        ))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::Validation("Email and phone are required for new customers.".to_string())
    );

    invoice(&engine, alice().item("Widget", 1)).await;
    // Known customers may omit them.
    let view = invoice(&engine, InvoiceDraft::new("Alice").item("Widget", 1)).await;
    assert_eq!(view.customer_phone, "555-0101");
}

#[tokio::test]
async fn invalid_drafts_fail_before_any_write() {
    let (engine, _db) = engine_with_db().await;
    product(&engine, "Widget", 10, 5).await;

    let empty = engine
        .create_invoice(CreateInvoiceCmd::new(alice(), Utc::now()))
        .await
        .unwrap_err();
    assert_eq!(
        empty,
        EngineError::Validation("Invoice must contain at least one item".to_string())
    );

    let zero = engine
        .create_invoice(CreateInvoiceCmd::new(alice().item("Widget", 0), Utc::now()))
        .await
        .unwrap_err();
    assert_eq!(
        zero,
        EngineError::Validation("Invalid quantity for product: Widget".to_string())
    );

    let negative = engine
        .create_invoice(CreateInvoiceCmd::new(
            alice().item("Widget", 1).amount(-1),
            Utc::now(),
        ))
        .await
        .unwrap_err();
    assert_eq!(
        negative,
        EngineError::Validation("Payment amount cannot be negative".to_string())
    );
    assert_eq!(stock_of(&engine, "Widget").await, 5);
}

#[tokio::test]
async fn duplicate_lines_are_checked_against_stock_together() {
    let (engine, _db) = engine_with_db().await;
    product(&engine, "Widget", 10, 3).await;

    let err = engine
        .create_invoice(CreateInvoiceCmd::new(
            alice().item("Widget", 2).item("Widget", 2),
            Utc::now(),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InsufficientStock { available: 3, .. }));

    let view = invoice(&engine, alice().item("Widget", 1).item("Widget", 2)).await;
    assert_eq!(view.invoice.lines.len(), 2);
    assert_eq!(view.invoice.quantity_of(view.invoice.lines[0].product_id), 3);
    assert_eq!(stock_of(&engine, "Widget").await, 0);
}

#[tokio::test]
async fn create_then_delete_restores_everything() {
    let (engine, _db) = engine_with_db().await;
    product(&engine, "Widget", 10, 5).await;
    product(&engine, "Gadget", 25, 4).await;
    invoice(&engine, alice().item("Gadget", 1)).await;

    let before_due = outstanding(&engine, "Alice").await;
    let before_sales = engine.list_sales().await.unwrap();

    let view = invoice(
        &engine,
        alice()
            .item("Widget", 3)
            .item("Gadget", 2)
            .discount(DiscountRate::from_basis_points(500).unwrap())
            .amount(30),
    )
    .await;
    assert_eq!(stock_of(&engine, "Widget").await, 2);
    assert_eq!(stock_of(&engine, "Gadget").await, 1);

    engine.delete_invoice(view.invoice.id, Utc::now()).await.unwrap();

    assert_eq!(stock_of(&engine, "Widget").await, 5);
    assert_eq!(stock_of(&engine, "Gadget").await, 3);
    assert_eq!(outstanding(&engine, "Alice").await, before_due);

    let account = engine.customer_account("Alice").await.unwrap();
    assert_eq!(account.invoices.len(), 1);
    assert!(account.payments.is_empty());
    let statement = engine.customer_statement("Alice").await.unwrap();
    assert!(
        statement
            .entries
            .iter()
            .all(|entry| entry.invoice_id == Some(account.invoices[0]))
    );

    let after_sales = engine.list_sales().await.unwrap();
    assert_eq!(after_sales.len(), before_sales.len());
    assert_eq!(after_sales[0].order.count, before_sales[0].order.count);
    assert_eq!(after_sales[0].order.subtotal, before_sales[0].order.subtotal);

    assert!(matches!(
        engine.invoice(view.invoice.id).await,
        Err(EngineError::NotFound(_))
    ));
    assert_customer_consistent(&engine, "Alice").await;
}

#[tokio::test]
async fn delete_unknown_invoice_is_not_found() {
    let (engine, _db) = engine_with_db().await;
    let err = engine
        .delete_invoice(uuid::Uuid::new_v4(), Utc::now())
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::NotFound("Invoice not found".to_string()));
}

#[tokio::test]
async fn update_reprices_against_reverted_stock() {
    let (engine, _db) = engine_with_db().await;
    product(&engine, "Widget", 10, 5).await;
    product(&engine, "Gadget", 25, 2).await;

    let view = invoice(&engine, alice().item("Widget", 5).amount(20)).await;
    assert_eq!(stock_of(&engine, "Widget").await, 0);

    // All five widgets are back on the shelf before the new body is checked.
    let updated = engine
        .update_invoice(UpdateInvoiceCmd::new(
            view.invoice.id,
            alice().item("Widget", 4).item("Gadget", 2).amount(10),
            Utc::now(),
        ))
        .await
        .unwrap();
    let invoice = &updated.invoice;
    assert_eq!(invoice.invoice_number, view.invoice.invoice_number);
    assert_eq!(invoice.issue_date, view.invoice.issue_date);
    assert_eq!(invoice.subtotal, 90);
    assert_eq!(invoice.amount_paid, 10);
    assert_eq!(invoice.balance_due, 80);
    assert_eq!(invoice.lines.len(), 2);

    assert_eq!(stock_of(&engine, "Widget").await, 1);
    assert_eq!(stock_of(&engine, "Gadget").await, 0);
    assert_eq!(outstanding(&engine, "Alice").await, 80);

    let account = engine.customer_account("Alice").await.unwrap();
    assert_eq!(account.payments.len(), 1);

    let sales = engine.list_sales().await.unwrap();
    let widget = sales.iter().find(|s| s.product_name == "Widget").unwrap();
    assert_eq!((widget.order.count, widget.order.subtotal), (4, 40));
    let gadget = sales.iter().find(|s| s.product_name == "Gadget").unwrap();
    assert_eq!((gadget.order.count, gadget.order.subtotal), (2, 50));

    assert_customer_consistent(&engine, "Alice").await;
}

#[tokio::test]
async fn failed_update_leaves_the_invoice_untouched() {
    let (engine, _db) = engine_with_db().await;
    product(&engine, "Widget", 10, 5).await;
    let view = invoice(&engine, alice().item("Widget", 2).amount(5)).await;

    let err = engine
        .update_invoice(UpdateInvoiceCmd::new(
            view.invoice.id,
            alice().item("Widget", 6),
            Utc::now(),
        ))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InsufficientStock {
            product: "Widget".to_string(),
            available: 5,
        }
    );

    let stored = engine.invoice(view.invoice.id).await.unwrap();
    assert_eq!(stored.invoice, view.invoice);
    assert_eq!(stock_of(&engine, "Widget").await, 3);
    assert_eq!(outstanding(&engine, "Alice").await, 15);
    assert_customer_consistent(&engine, "Alice").await;
}

#[tokio::test]
async fn update_to_an_existing_name_moves_the_invoice() {
    let (engine, _db) = engine_with_db().await;
    product(&engine, "Widget", 10, 10).await;
    let view = invoice(&engine, alice().item("Widget", 2)).await;
    invoice(
        &engine,
        InvoiceDraft::new("Bob")
            .email("bob@example.com")
            .phone("555-0102")
            .item("Widget", 1),
    )
    .await;

    let moved = engine
        .update_invoice(UpdateInvoiceCmd::new(
            view.invoice.id,
            InvoiceDraft::new("Bob").item("Widget", 2),
            Utc::now(),
        ))
        .await
        .unwrap();
    assert_eq!(moved.customer_name, "Bob");

    assert_eq!(outstanding(&engine, "Alice").await, 0);
    assert_eq!(outstanding(&engine, "Bob").await, 30);
    assert!(
        engine
            .customer_statement("Alice")
            .await
            .unwrap()
            .entries
            .is_empty()
    );
    assert_customer_consistent(&engine, "Alice").await;
    assert_customer_consistent(&engine, "Bob").await;
}

#[tokio::test]
async fn update_to_a_new_name_renames_the_customer() {
    let (engine, _db) = engine_with_db().await;
    product(&engine, "Widget", 10, 10).await;
    let view = invoice(&engine, alice().item("Widget", 2)).await;

    let renamed = engine
        .update_invoice(UpdateInvoiceCmd::new(
            view.invoice.id,
            InvoiceDraft::new("Alicia")
                .phone("555-0199")
                .item("Widget", 2),
            Utc::now(),
        ))
        .await
        .unwrap();
    assert_eq!(renamed.customer_name, "Alicia");
    assert_eq!(renamed.customer_email, "alice@example.com");
    assert_eq!(renamed.customer_phone, "555-0199");
    assert_eq!(renamed.invoice.customer_id, view.invoice.customer_id);

    assert!(matches!(
        engine.customer_account("Alice").await,
        Err(EngineError::NotFound(_))
    ));
    assert_customer_consistent(&engine, "Alicia").await;
}

#[tokio::test]
async fn status_update_records_the_final_payment() {
    let (engine, _db) = engine_with_db().await;
    product(&engine, "Widget", 10, 5).await;
    let view = invoice(&engine, alice().item("Widget", 3).amount(10)).await;

    let err = engine
        .update_invoice_status(UpdateInvoiceStatusCmd::new(
            view.invoice.id,
            InvoiceStatus::Paid,
            Utc::now(),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::BusinessRule(_)));

    let err = engine
        .update_invoice_status(
            UpdateInvoiceStatusCmd::new(view.invoice.id, InvoiceStatus::Paid, Utc::now())
                .payment_amount(25),
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::Overpayment("Payment amount exceeds balance due".to_string())
    );

    let paid = engine
        .update_invoice_status(
            UpdateInvoiceStatusCmd::new(view.invoice.id, InvoiceStatus::Paid, Utc::now())
                .payment_amount(20)
                .method(PaymentMethod::BankTransfer),
        )
        .await
        .unwrap();
    assert_eq!(paid.invoice.status, InvoiceStatus::Paid);
    assert_eq!(paid.invoice.balance_due, 0);
    assert_eq!(paid.invoice.amount_paid, 30);
    assert_eq!(outstanding(&engine, "Alice").await, 0);
    assert_eq!(
        engine.customer_account("Alice").await.unwrap().payments.len(),
        2
    );
    assert_customer_consistent(&engine, "Alice").await;
}

#[tokio::test]
async fn status_update_without_payment_stores_the_status() {
    let (engine, _db) = engine_with_db().await;
    product(&engine, "Widget", 10, 5).await;
    let view = invoice(&engine, alice().item("Widget", 1)).await;
    assert_eq!(view.invoice.status, InvoiceStatus::Unpaid);

    let updated = engine
        .update_invoice_status(UpdateInvoiceStatusCmd::new(
            view.invoice.id,
            InvoiceStatus::Overdue,
            Utc::now(),
        ))
        .await
        .unwrap();
    assert_eq!(updated.invoice.status, InvoiceStatus::Overdue);
    assert_eq!(updated.invoice.balance_due, 10);

    let past_due = view.invoice.due_date + Duration::days(1);
    assert_eq!(view.invoice.status_at(past_due), InvoiceStatus::Overdue);
}

#[tokio::test]
async fn list_invoices_pages_newest_first() {
    let (engine, _db) = engine_with_db().await;
    product(&engine, "Widget", 10, 10).await;
    for _ in 0..5 {
        invoice(&engine, alice().item("Widget", 1)).await;
    }

    let first = engine.list_invoices(2, None).await.unwrap();
    let numbers: Vec<_> = first
        .invoices
        .iter()
        .map(|view| view.invoice.invoice_number)
        .collect();
    assert_eq!(numbers, vec![5, 4]);

    let second = engine
        .list_invoices(2, first.next_cursor.as_deref())
        .await
        .unwrap();
    let numbers: Vec<_> = second
        .invoices
        .iter()
        .map(|view| view.invoice.invoice_number)
        .collect();
    assert_eq!(numbers, vec![3, 2]);

    let last = engine
        .list_invoices(2, second.next_cursor.as_deref())
        .await
        .unwrap();
    assert_eq!(last.invoices.len(), 1);
    assert!(last.next_cursor.is_none());

    let err = engine.list_invoices(2, Some("not a cursor")).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidCursor(_)));

    let by_number = engine.invoice_by_number(3).await.unwrap();
    assert_eq!(by_number.invoice.display_number(), "INV-000003");
}

#[tokio::test]
async fn concurrent_creates_cannot_overdraw_stock() {
    let (engine, _db) = engine_with_db().await;
    product(&engine, "Widget", 10, 3).await;
    invoice(&engine, alice().item("Widget", 1)).await;

    let (first, second) = tokio::join!(
        engine.create_invoice(CreateInvoiceCmd::new(
            InvoiceDraft::new("Alice").item("Widget", 2),
            Utc::now(),
        )),
        engine.create_invoice(CreateInvoiceCmd::new(
            InvoiceDraft::new("Alice").item("Widget", 2),
            Utc::now(),
        )),
    );

    let outcomes = [first.is_ok(), second.is_ok()];
    assert_eq!(outcomes.iter().filter(|ok| **ok).count(), 1);
    let failure = first.err().or(second.err()).unwrap();
    assert!(matches!(failure, EngineError::InsufficientStock { .. }));
    assert_eq!(stock_of(&engine, "Widget").await, 0);
    assert_customer_consistent(&engine, "Alice").await;
}

#[tokio::test]
async fn statement_keeps_the_write_order_of_each_flow() {
    let (engine, _db) = engine_with_db().await;
    product(&engine, "Widget", 10, 20).await;
    let discount = DiscountRate::from_percent(10.0).unwrap();

    for _ in 0..3 {
        // 20 - 2 discount, 5 paid, 13 due
        invoice(
            &engine,
            alice().item("Widget", 2).discount(discount).amount(5),
        )
        .await;
    }
    let allocated = engine
        .add_payment(engine::AddPaymentCmd::new("Alice", 30, Utc::now()))
        .await
        .unwrap();
    assert_eq!(
        allocated.iter().map(|p| p.amount).collect::<Vec<_>>(),
        vec![13, 13, 4]
    );

    let statement = engine.customer_statement("Alice").await.unwrap();
    let moves: Vec<_> = statement
        .entries
        .iter()
        .map(|entry| (entry.kind, entry.status, entry.amount))
        .collect();
    let per_invoice = [
        (EntryKind::Invoice, EntryStatus::Debit, 20),
        (EntryKind::Discount, EntryStatus::Credit, 2),
        (EntryKind::Payment, EntryStatus::Credit, 5),
    ];
    let mut expected: Vec<_> = per_invoice.iter().copied().cycle().take(9).collect();
    expected.extend([
        (EntryKind::Payment, EntryStatus::Credit, 13),
        (EntryKind::Payment, EntryStatus::Credit, 13),
        (EntryKind::Payment, EntryStatus::Credit, 4),
    ]);
    assert_eq!(moves, expected);

    let account = engine.customer_account("Alice").await.unwrap();
    let allocated_ids: Vec<_> = allocated.iter().map(|p| p.id).collect();
    assert_eq!(account.payments[3..], allocated_ids[..]);
    assert_customer_consistent(&engine, "Alice").await;
}
