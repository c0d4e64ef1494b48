use std::{
    error::Error,
    path::{Path, PathBuf},
};

use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use engine::{Engine, EngineError, EntryStatus, Money, NewProductCmd};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};
use serde::Deserialize;

#[derive(Parser, Debug)]
#[command(name = "stockbook_admin")]
#[command(about = "Admin utilities for Stockbook (catalog seeding, statements)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./stockbook.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Product(Product),
    Stock(Stock),
    Catalog(Catalog),
    Customer(Customer),
}

#[derive(Args, Debug)]
struct Product {
    #[command(subcommand)]
    command: ProductCommand,
}

#[derive(Subcommand, Debug)]
enum ProductCommand {
    Create(ProductCreateArgs),
}

#[derive(Args, Debug)]
struct ProductCreateArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    code: String,
    /// Selling price, e.g. `12.50`.
    #[arg(long)]
    price: Money,
    #[arg(long, default_value = "0")]
    cost: Money,
    /// Tax rate in basis points.
    #[arg(long, default_value_t = 0)]
    tax_rate: u32,
    #[arg(long)]
    category: Option<String>,
    #[arg(long)]
    supplier: Option<String>,
    #[arg(long, default_value_t = 0)]
    stock: i64,
}

#[derive(Args, Debug)]
struct Stock {
    #[command(subcommand)]
    command: StockCommand,
}

#[derive(Subcommand, Debug)]
enum StockCommand {
    Set(StockSetArgs),
}

#[derive(Args, Debug)]
struct StockSetArgs {
    #[arg(long)]
    product: String,
    #[arg(long)]
    quantity: i64,
}

#[derive(Args, Debug)]
struct Catalog {
    #[command(subcommand)]
    command: CatalogCommand,
}

#[derive(Subcommand, Debug)]
enum CatalogCommand {
    /// Import products from a CSV file with a header row.
    Import(CatalogImportArgs),
}

#[derive(Args, Debug)]
struct CatalogImportArgs {
    #[arg(long)]
    csv: PathBuf,
}

#[derive(Args, Debug)]
struct Customer {
    #[command(subcommand)]
    command: CustomerCommand,
}

#[derive(Subcommand, Debug)]
enum CustomerCommand {
    Statement(CustomerStatementArgs),
}

#[derive(Args, Debug)]
struct CustomerStatementArgs {
    #[arg(long)]
    name: String,
}

/// One catalog row:
/// `name,product_code,cost_price,selling_price,tax_rate,category,supplier,initial_stock`.
#[derive(Debug, Deserialize)]
struct CatalogRow {
    name: String,
    product_code: String,
    cost_price: String,
    selling_price: String,
    #[serde(default)]
    tax_rate: u32,
    category: Option<String>,
    supplier: Option<String>,
    #[serde(default)]
    initial_stock: i64,
}

impl CatalogRow {
    fn into_cmd(self) -> Result<NewProductCmd, EngineError> {
        let mut cmd = NewProductCmd::new(
            self.name,
            self.product_code,
            self.selling_price.parse::<Money>()?.minor(),
            Utc::now(),
        )
        .cost_price(self.cost_price.parse::<Money>()?.minor())
        .tax_rate(self.tax_rate)
        .initial_stock(self.initial_stock);
        if let Some(category) = self.category.filter(|c| !c.trim().is_empty()) {
            cmd = cmd.category(category);
        }
        if let Some(supplier) = self.supplier.filter(|s| !s.trim().is_empty()) {
            cmd = cmd.supplier(supplier);
        }
        Ok(cmd)
    }
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

async fn import_catalog(
    engine: &Engine,
    path: &Path,
) -> Result<(usize, usize), Box<dyn Error + Send + Sync>> {
    let mut reader = csv::Reader::from_path(path)?;
    let (mut imported, mut skipped) = (0, 0);

    for (line, row) in reader.deserialize::<CatalogRow>().enumerate() {
        // Header is line 1.
        let line = line + 2;
        let cmd = match row.map_err(|e| e.to_string()).and_then(|row| {
            row.into_cmd().map_err(|e| e.to_string())
        }) {
            Ok(cmd) => cmd,
            Err(err) => {
                eprintln!("line {line}: {err}");
                skipped += 1;
                continue;
            }
        };

        match engine.create_product(cmd).await {
            Ok((product, stock)) => {
                println!("imported {} ({} in stock)", product.name, stock.quantity);
                imported += 1;
            }
            Err(EngineError::ExistingKey(key)) => {
                eprintln!("line {line}: {key} already exists, skipped");
                skipped += 1;
            }
            Err(err) => return Err(err.into()),
        }
    }

    Ok((imported, skipped))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder().database(db).build().await?;

    match cli.command {
        Command::Product(Product {
            command: ProductCommand::Create(args),
        }) => {
            let mut cmd = NewProductCmd::new(&args.name, &args.code, args.price.minor(), Utc::now())
                .cost_price(args.cost.minor())
                .tax_rate(args.tax_rate)
                .initial_stock(args.stock);
            if let Some(category) = args.category {
                cmd = cmd.category(category);
            }
            if let Some(supplier) = args.supplier {
                cmd = cmd.supplier(supplier);
            }

            match engine.create_product(cmd).await {
                Ok((product, stock)) => println!(
                    "created product: {} ({}) at {} with {} in stock",
                    product.name,
                    product.id,
                    Money::new(product.selling_price),
                    stock.quantity
                ),
                Err(EngineError::ExistingKey(key)) => {
                    eprintln!("product already exists: {key}");
                    std::process::exit(1);
                }
                Err(err) => return Err(err.into()),
            }
        }
        Command::Stock(Stock {
            command: StockCommand::Set(args),
        }) => {
            let stock = engine
                .set_stock(&args.product, args.quantity, Utc::now())
                .await?;
            println!("stock of {}: {}", args.product, stock.quantity);
        }
        Command::Catalog(Catalog {
            command: CatalogCommand::Import(args),
        }) => {
            let (imported, skipped) = import_catalog(&engine, &args.csv).await?;
            println!("imported {imported} products, skipped {skipped}");
        }
        Command::Customer(Customer {
            command: CustomerCommand::Statement(args),
        }) => {
            let statement = match engine.customer_statement(&args.name).await {
                Ok(statement) => statement,
                Err(EngineError::NotFound(_)) => {
                    eprintln!("customer not found: {}", args.name);
                    std::process::exit(1);
                }
                Err(err) => return Err(err.into()),
            };

            println!(
                "{} <{}> {}",
                statement.customer.name, statement.customer.email, statement.customer.phone
            );
            for entry in &statement.entries {
                let side = match entry.status {
                    EntryStatus::Debit => "debit ",
                    EntryStatus::Credit => "credit",
                };
                println!(
                    "{}  {side}  {:>12}  {}",
                    entry.recorded_at.format("%Y-%m-%d %H:%M"),
                    Money::new(entry.amount).to_string(),
                    entry.details
                );
            }
            println!(
                "debit {}  credit {}  balance {}  outstanding {}",
                Money::new(statement.total_debit),
                Money::new(statement.total_credit),
                Money::new(statement.balance),
                Money::new(statement.customer.outstanding_balance)
            );
        }
    }

    Ok(())
}
