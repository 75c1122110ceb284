use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use vendyz_prices::arguments::DEFAULT_CONFIG_PATH;
use vendyz_prices::config::Config;
use vendyz_prices::logger::{self, LogLevel, LogTag, LoggerConfig};
use vendyz_prices::prices::{format_usd, value_wallet, PriceService, TokenHolding};

/// Look up token prices through the same provider chain as the proxy.
///
/// Useful for checking API keys and provider health without starting the
/// server. Each run starts with an empty cache.
#[derive(Parser, Debug)]
#[command(name = "tool_token_price", about = "One-shot token price lookups")]
struct Args {
    /// Configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// Show provider debug logs
    #[arg(long, default_value_t = false)]
    debug: bool,

    /// Print raw JSON instead of a table
    #[arg(long, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Price a single token address
    Price { token: String },
    /// Price several token addresses with one batch lookup
    Batch {
        #[arg(required = true)]
        tokens: Vec<String>,
    },
    /// Value a wallet from a JSON file of holdings
    /// (`[{"address", "symbol", "amount", "decimals"}]`)
    Wallet { file: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut logger_config = LoggerConfig::default();
    if args.debug {
        logger_config.min_level = LogLevel::Debug;
        logger_config.debug_tags = LogTag::all().iter().map(|t| t.to_debug_key()).collect();
    }
    logger::set_logger_config(logger_config);

    let config = Config::load(&args.config)
        .with_context(|| format!("Failed to load configuration from {}", args.config))?;
    let service = PriceService::from_config(&config)?;

    match args.command {
        Command::Price { token } => {
            let lookup = service.get_price(&token).await;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&lookup)?);
            } else {
                println!(
                    "{:<44} {:>14} {:<9} {}",
                    token.to_lowercase(),
                    format_usd(lookup.price),
                    lookup.source.as_str(),
                    lookup.error.unwrap_or_default()
                );
            }
        }
        Command::Batch { tokens } => {
            let prices = service.get_prices(&tokens).await;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&prices)?);
            } else {
                let mut rows: Vec<_> = prices.into_iter().collect();
                rows.sort_by(|a, b| a.0.cmp(&b.0));
                for (address, quote) in rows {
                    println!("{:<44} {:>14} {}", address, format_usd(quote.price), quote.source);
                }
            }
        }
        Command::Wallet { file } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read holdings file: {}", file))?;
            let holdings: Vec<TokenHolding> = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse holdings file: {}", file))?;

            let wallet = value_wallet(&service, &holdings).await;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&wallet)?);
            } else {
                for (holding, token) in holdings.iter().zip(&wallet.tokens) {
                    println!(
                        "{:<10} {:>14.4} @ {:>12} = {:>12} ({})",
                        token.symbol,
                        holding.ui_amount(),
                        format_usd(token.price),
                        format_usd(token.value),
                        token.source
                    );
                }
                println!("{:<10} {:>43}", "TOTAL", format_usd(wallet.total_value));
            }
        }
    }

    Ok(())
}
