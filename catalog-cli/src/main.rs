//! Catalog CLI
//!
//! Command-line interface for the Catalog API.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use catalog_client::CatalogClient;
use catalog_currency::format_minor;
use catalog_types::{ProductId, ProductRequest, ProductView};

#[derive(Parser)]
#[command(name = "catalog")]
#[command(author, version, about = "Catalog API CLI client", long_about = None)]
struct Cli {
    /// Base URL of the Catalog API
    #[arg(long, env = "CATALOG_API_URL", default_value = "http://localhost:3000")]
    api_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Product operations
    Products {
        #[command(subcommand)]
        action: ProductCommands,
    },
    /// Show the server's exchange rate cache
    Rates,
    /// Check API health
    Health,
}

#[derive(Subcommand)]
enum ProductCommands {
    /// List products
    List {
        /// Currency to price products in (e.g. USD, GBP)
        #[arg(long)]
        currency: Option<String>,
        /// Print raw JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Get one product
    Get {
        id: String,
        #[arg(long)]
        currency: Option<String>,
    },
    /// Add a product (price in minor units of the base currency)
    Create(ProductArgs),
    /// Replace a product
    Update {
        id: String,
        #[command(flatten)]
        product: ProductArgs,
    },
    /// Delete a product
    Delete { id: String },
}

#[derive(Args)]
struct ProductArgs {
    #[arg(long)]
    name: String,
    #[arg(long, default_value = "")]
    description: String,
    /// Price in minor units, e.g. 245 for 2.45
    #[arg(long)]
    price: i64,
    /// Stock keeping unit, e.g. abc-def-ghi
    #[arg(long)]
    sku: String,
}

impl From<ProductArgs> for ProductRequest {
    fn from(args: ProductArgs) -> Self {
        ProductRequest {
            name: args.name,
            description: args.description,
            price: args.price,
            sku: args.sku,
        }
    }
}

fn parse_product_id(s: &str) -> Result<ProductId> {
    s.parse()
        .map_err(|_| anyhow::anyhow!("Invalid product ID: {}", s))
}

fn print_table(products: &[ProductView]) {
    for p in products {
        println!(
            "{:>4}  {:<20} {:>12}  {}",
            p.id.value(),
            p.name,
            format_minor(p.price, p.currency),
            p.sku
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let client = CatalogClient::new(&cli.api_url);

    match cli.command {
        Commands::Health => match client.health().await {
            Ok(status) => println!("✓ API is healthy: {}", status),
            Err(e) => {
                println!("✗ API is not healthy: {}", e);
                std::process::exit(1);
            }
        },

        Commands::Rates => {
            let snapshot = client.rates().await?;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }

        Commands::Products { action } => match action {
            ProductCommands::List { currency, json } => {
                let products = client.list_products(currency.as_deref()).await?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&products)?);
                } else {
                    print_table(&products);
                }
            }
            ProductCommands::Get { id, currency } => {
                let id = parse_product_id(&id)?;
                let product = client.get_product(id, currency.as_deref()).await?;
                println!("{}", serde_json::to_string_pretty(&product)?);
            }
            ProductCommands::Create(args) => {
                let product = client.create_product(&args.into()).await?;
                println!("{}", serde_json::to_string_pretty(&product)?);
            }
            ProductCommands::Update { id, product } => {
                let id = parse_product_id(&id)?;
                client.update_product(id, &product.into()).await?;
                println!("✓ Product {} updated", id);
            }
            ProductCommands::Delete { id } => {
                let id = parse_product_id(&id)?;
                client.delete_product(id).await?;
                println!("✓ Product {} deleted", id);
            }
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_create() {
        let cli = Cli::try_parse_from([
            "catalog", "products", "create", "--name", "Mocha", "--price", "310", "--sku",
            "cof-moc-cho",
        ])
        .unwrap();

        match cli.command {
            Commands::Products {
                action: ProductCommands::Create(args),
            } => {
                let req = ProductRequest::from(args);
                assert_eq!(req.price, 310);
                assert_eq!(req.description, "");
            }
            _ => panic!("expected products create"),
        }
    }
}
