//! Initial schema migration.
//!
//! Creates the complete schema for Stockbook:
//!
//! - `customers`: accounts with running balances
//! - `products` and `stocks`: the catalog and on-hand quantities
//! - `invoices` and `invoice_items`: invoices and their ordered lines
//! - `payments`: money received against invoices
//! - `returns`: units taken back from invoices
//! - `ledger_entries`: the per-customer transaction ledger
//! - `sales_orders` and `sales_contributions`: per-product sales aggregates
//! - `counters`: named sequences for invoice and sales order numbers

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Customers {
    Table,
    Id,
    Name,
    Email,
    Phone,
    Address,
    Balance,
    OutstandingBalance,
    CreatedAt,
}

#[derive(Iden)]
enum Products {
    Table,
    Id,
    Name,
    ProductCode,
    CostPrice,
    SellingPrice,
    TaxRate,
    Category,
    Supplier,
    CreatedAt,
}

#[derive(Iden)]
enum Stocks {
    Table,
    Id,
    ProductId,
    Quantity,
    LastStockUpdate,
}

#[derive(Iden)]
enum Invoices {
    Table,
    Id,
    InvoiceNumber,
    CustomerId,
    Subtotal,
    DiscountRate,
    DiscountAmount,
    TotalAmount,
    AmountPaid,
    BalanceDue,
    RefundedAmount,
    Status,
    IssueDate,
    DueDate,
    PaymentTerms,
    UpdatedAt,
}

#[derive(Iden)]
enum InvoiceItems {
    Table,
    Id,
    InvoiceId,
    Position,
    ProductId,
    ProductName,
    Quantity,
    UnitPrice,
    TaxRate,
    LineTotal,
}

#[derive(Iden)]
enum Payments {
    Table,
    Id,
    CustomerId,
    InvoiceId,
    Amount,
    Method,
    PaidAt,
}

#[derive(Iden)]
enum Returns {
    Table,
    Id,
    CustomerId,
    InvoiceId,
    ProductId,
    Quantity,
    UnitPrice,
    RefundAmount,
    CashRefund,
    Reason,
    ReturnedAt,
    CancelledAt,
}

#[derive(Iden)]
enum LedgerEntries {
    Table,
    Id,
    CustomerId,
    Kind,
    ReferenceId,
    InvoiceId,
    Amount,
    Status,
    Details,
    Items,
    RecordedAt,
}

#[derive(Iden)]
enum SalesOrders {
    Table,
    Id,
    OrderNumber,
    ProductId,
    CustomerId,
    Count,
    Subtotal,
    LastUpdate,
}

#[derive(Iden)]
enum SalesContributions {
    Table,
    SalesOrderId,
    InvoiceId,
    Quantity,
    Subtotal,
}

#[derive(Iden)]
enum Counters {
    Table,
    Name,
    Value,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Customers
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Customers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Customers::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Customers::Name).string().not_null())
                    .col(ColumnDef::new(Customers::Email).string().not_null())
                    .col(ColumnDef::new(Customers::Phone).string().not_null())
                    .col(ColumnDef::new(Customers::Address).string())
                    .col(
                        ColumnDef::new(Customers::Balance)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Customers::OutstandingBalance)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Customers::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-customers-name-unique")
                    .table(Customers::Table)
                    .col(Customers::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Products and stock
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Products::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Products::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Products::Name).string().not_null())
                    .col(ColumnDef::new(Products::ProductCode).string().not_null())
                    .col(ColumnDef::new(Products::CostPrice).big_integer().not_null())
                    .col(
                        ColumnDef::new(Products::SellingPrice)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Products::TaxRate)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Products::Category).string())
                    .col(ColumnDef::new(Products::Supplier).string())
                    .col(ColumnDef::new(Products::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-products-name-unique")
                    .table(Products::Table)
                    .col(Products::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-products-product_code-unique")
                    .table(Products::Table)
                    .col(Products::ProductCode)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Stocks::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Stocks::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Stocks::ProductId).string().not_null())
                    .col(ColumnDef::new(Stocks::Quantity).big_integer().not_null())
                    .col(
                        ColumnDef::new(Stocks::LastStockUpdate)
                            .timestamp()
                            .not_null(),
                    )
                    .check(Expr::col(Stocks::Quantity).gte(0))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-stocks-product_id")
                            .from(Stocks::Table, Stocks::ProductId)
                            .to(Products::Table, Products::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-stocks-product_id-unique")
                    .table(Stocks::Table)
                    .col(Stocks::ProductId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Invoices
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Invoices::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Invoices::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Invoices::InvoiceNumber)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Invoices::CustomerId).string().not_null())
                    .col(ColumnDef::new(Invoices::Subtotal).big_integer().not_null())
                    .col(
                        ColumnDef::new(Invoices::DiscountRate)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Invoices::DiscountAmount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Invoices::TotalAmount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Invoices::AmountPaid)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Invoices::BalanceDue)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Invoices::RefundedAmount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Invoices::Status).string().not_null())
                    .col(ColumnDef::new(Invoices::IssueDate).timestamp().not_null())
                    .col(ColumnDef::new(Invoices::DueDate).timestamp().not_null())
                    .col(
                        ColumnDef::new(Invoices::PaymentTerms)
                            .string()
                            .not_null()
                            .default("net_30"),
                    )
                    .col(ColumnDef::new(Invoices::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-invoices-customer_id")
                            .from(Invoices::Table, Invoices::CustomerId)
                            .to(Customers::Table, Customers::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-invoices-invoice_number-unique")
                    .table(Invoices::Table)
                    .col(Invoices::InvoiceNumber)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-invoices-customer_id-issue_date")
                    .table(Invoices::Table)
                    .col(Invoices::CustomerId)
                    .col(Invoices::IssueDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(InvoiceItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(InvoiceItems::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(InvoiceItems::InvoiceId).string().not_null())
                    .col(ColumnDef::new(InvoiceItems::Position).integer().not_null())
                    .col(ColumnDef::new(InvoiceItems::ProductId).string().not_null())
                    .col(ColumnDef::new(InvoiceItems::ProductName).string().not_null())
                    .col(ColumnDef::new(InvoiceItems::Quantity).big_integer().not_null())
                    .col(ColumnDef::new(InvoiceItems::UnitPrice).big_integer().not_null())
                    .col(ColumnDef::new(InvoiceItems::TaxRate).integer().not_null())
                    .col(ColumnDef::new(InvoiceItems::LineTotal).big_integer().not_null())
                    .check(Expr::col(InvoiceItems::Quantity).gt(0))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-invoice_items-invoice_id")
                            .from(InvoiceItems::Table, InvoiceItems::InvoiceId)
                            .to(Invoices::Table, Invoices::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-invoice_items-invoice_id")
                    .table(InvoiceItems::Table)
                    .col(InvoiceItems::InvoiceId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Payments and returns
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Payments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Payments::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Payments::CustomerId).string().not_null())
                    .col(ColumnDef::new(Payments::InvoiceId).string())
                    .col(ColumnDef::new(Payments::Amount).big_integer().not_null())
                    .col(
                        ColumnDef::new(Payments::Method)
                            .string()
                            .not_null()
                            .default("cash"),
                    )
                    .col(ColumnDef::new(Payments::PaidAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-payments-customer_id")
                            .from(Payments::Table, Payments::CustomerId)
                            .to(Customers::Table, Customers::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-payments-invoice_id")
                    .table(Payments::Table)
                    .col(Payments::InvoiceId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Returns::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Returns::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Returns::CustomerId).string().not_null())
                    .col(ColumnDef::new(Returns::InvoiceId).string().not_null())
                    .col(ColumnDef::new(Returns::ProductId).string().not_null())
                    .col(ColumnDef::new(Returns::Quantity).big_integer().not_null())
                    .col(ColumnDef::new(Returns::UnitPrice).big_integer().not_null())
                    .col(ColumnDef::new(Returns::RefundAmount).big_integer().not_null())
                    .col(
                        ColumnDef::new(Returns::CashRefund)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Returns::Reason).string())
                    .col(ColumnDef::new(Returns::ReturnedAt).timestamp().not_null())
                    .col(ColumnDef::new(Returns::CancelledAt).timestamp())
                    .check(Expr::col(Returns::Quantity).gte(1))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-returns-invoice_id")
                            .from(Returns::Table, Returns::InvoiceId)
                            .to(Invoices::Table, Invoices::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-returns-customer_id")
                            .from(Returns::Table, Returns::CustomerId)
                            .to(Customers::Table, Customers::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-returns-invoice_id")
                    .table(Returns::Table)
                    .col(Returns::InvoiceId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Ledger
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(LedgerEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LedgerEntries::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LedgerEntries::CustomerId).string().not_null())
                    .col(ColumnDef::new(LedgerEntries::Kind).string().not_null())
                    .col(ColumnDef::new(LedgerEntries::ReferenceId).string().not_null())
                    .col(ColumnDef::new(LedgerEntries::InvoiceId).string())
                    .col(ColumnDef::new(LedgerEntries::Amount).big_integer().not_null())
                    .col(ColumnDef::new(LedgerEntries::Status).string().not_null())
                    .col(ColumnDef::new(LedgerEntries::Details).string().not_null())
                    .col(ColumnDef::new(LedgerEntries::Items).text())
                    .col(
                        ColumnDef::new(LedgerEntries::RecordedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-ledger_entries-customer_id")
                            .from(LedgerEntries::Table, LedgerEntries::CustomerId)
                            .to(Customers::Table, Customers::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-ledger_entries-customer_id-recorded_at")
                    .table(LedgerEntries::Table)
                    .col(LedgerEntries::CustomerId)
                    .col(LedgerEntries::RecordedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-ledger_entries-invoice_id")
                    .table(LedgerEntries::Table)
                    .col(LedgerEntries::InvoiceId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 6. Sales aggregates
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(SalesOrders::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SalesOrders::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SalesOrders::OrderNumber)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(SalesOrders::ProductId).string().not_null())
                    .col(ColumnDef::new(SalesOrders::CustomerId).string().not_null())
                    .col(ColumnDef::new(SalesOrders::Count).big_integer().not_null())
                    .col(ColumnDef::new(SalesOrders::Subtotal).big_integer().not_null())
                    .col(ColumnDef::new(SalesOrders::LastUpdate).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-sales_orders-product_id")
                            .from(SalesOrders::Table, SalesOrders::ProductId)
                            .to(Products::Table, Products::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-sales_orders-order_number-unique")
                    .table(SalesOrders::Table)
                    .col(SalesOrders::OrderNumber)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-sales_orders-product_id-unique")
                    .table(SalesOrders::Table)
                    .col(SalesOrders::ProductId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SalesContributions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SalesContributions::SalesOrderId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SalesContributions::InvoiceId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SalesContributions::Quantity)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SalesContributions::Subtotal)
                            .big_integer()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(SalesContributions::SalesOrderId)
                            .col(SalesContributions::InvoiceId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-sales_contributions-sales_order_id")
                            .from(SalesContributions::Table, SalesContributions::SalesOrderId)
                            .to(SalesOrders::Table, SalesOrders::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 7. Counters
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Counters::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Counters::Name)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Counters::Value)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse order of creation (respecting FK dependencies)
        manager
            .drop_table(Table::drop().table(Counters::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SalesContributions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SalesOrders::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(LedgerEntries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Returns::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Payments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(InvoiceItems::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Invoices::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Stocks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Products::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Customers::Table).to_owned())
            .await?;
        Ok(())
    }
}
