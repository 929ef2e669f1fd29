//! marquee: rating lookup CLI
//!
//! Resolves ratings for one or more titles using the same engine a
//! catalogue overlay would embed.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use futures_util::future::join_all;
use marquee::{Config, MarqueeBuilder, RatingResult, Verdict, clean_title, variations};

/// Marquee rating lookup
#[derive(Parser)]
#[command(name = "marquee")]
#[command(version = marquee::PKG_VERSION)]
#[command(about = "Look up critics and audience ratings for film and series titles")]
struct Args {
    /// Config file (default: ~/.marquee/config.toml, then /etc/marquee/config.toml)
    #[arg(short, long, env = "MARQUEE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve ratings for one or more titles
    Rate {
        /// Titles as shown in the catalogue
        #[arg(required = true)]
        titles: Vec<String>,
        /// Ignore the block-list
        #[arg(long)]
        no_blocklist: bool,
    },

    /// Print the title variations the primary provider would be asked for
    Variations {
        /// Title as shown in the catalogue
        title: String,
    },

    /// Show persisted cache size
    CacheStats,

    /// Drop every cached rating and tombstone
    ClearCache,

    /// Print full version information
    Version,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialise tracing (default: warn for CLI; override with RUST_LOG).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    // Commands that don't need an engine
    match &args.command {
        Command::Variations { title } => {
            for candidate in variations(&clean_title(title)) {
                println!("{candidate}");
            }
            return Ok(());
        }
        Command::Version => {
            println!("marquee {}", marquee::version_string());
            return Ok(());
        }
        _ => {}
    }

    let config = Config::load(args.config.as_deref())?;
    let engine = MarqueeBuilder::from_config(&config).build().await?;

    match args.command {
        Command::Rate {
            titles,
            no_blocklist,
        } => {
            let titles: Vec<String> = titles.iter().map(|t| clean_title(t)).collect();
            let lookups = titles.iter().map(|title| {
                let engine = engine.clone();
                async move {
                    if no_blocklist {
                        engine.resolve(title).await.map(Verdict::from)
                    } else {
                        engine.rate(title).await
                    }
                }
            });
            let verdicts = join_all(lookups).await;

            for (title, verdict) in titles.iter().zip(verdicts) {
                match verdict {
                    Ok(Verdict::Rated(rating)) => print_rating(title, &rating),
                    Ok(Verdict::Unrated) => println!("{title}: no rating"),
                    Ok(Verdict::Blocked) => println!("{title}: unwatchable (block-listed)"),
                    Err(e) => eprintln!("{title}: {e}"),
                }
            }
            engine.flush().await?;
        }

        Command::CacheStats => {
            let cache = engine.cache();
            println!("entries:      {}", cache.len());
            println!("ttl:          {}d", cache.config().ttl.as_secs() / 86_400);
            println!(
                "missing ttl:  {}d",
                cache.config().missing_ttl.as_secs() / 86_400
            );
            println!("block-listed: {}", engine.blocklist().len());
        }

        Command::ClearCache => {
            engine.cache().clear().await;
            println!("cache cleared");
        }

        Command::Variations { .. } | Command::Version => unreachable!("handled above"),
    }

    Ok(())
}

/// Display a rating in a readable format.
fn print_rating(title: &str, r: &RatingResult) {
    println!("{title}:");
    match r.source_year() {
        Some(year) => println!("  matched:  {} ({year})", r.source_title()),
        None => println!("  matched:  {}", r.source_title()),
    }
    if let Some(critics) = r.critics() {
        println!("  critics:  {critics}");
    }
    if let Some(audience) = r.audience() {
        println!("  audience: {audience}");
    }
    if let Some(url) = r.source_url() {
        println!("  source:   {url}");
    }
}
