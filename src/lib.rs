//! Marquee - film and series rating resolution
//!
//! Given a raw title as it appears in a streaming catalogue, this crate
//! resolves critics' and audience scores by querying a structured ratings
//! API (OMDb) across a handful of title variations, then falling back to a
//! single, rate-limited scrape of Rotten Tomatoes. Results, including
//! confirmed "no rating" answers, are cached for a week and persisted
//! across restarts. Concurrent requests for the same title share one
//! lookup.
//!
//! # Example
//!
//! ```rust,no_run
//! use marquee::{Marquee, Verdict};
//!
//! #[tokio::main]
//! async fn main() -> marquee::Result<()> {
//!     let engine = Marquee::builder()
//!         .omdb("your-omdb-key")
//!         .cache_dir("/tmp/marquee")
//!         .build()
//!         .await?;
//!
//!     match engine.rate("The Matrix (1999)").await? {
//!         Verdict::Rated(rating) => println!(
//!             "critics {:?}, audience {:?}",
//!             rating.critics(),
//!             rating.audience()
//!         ),
//!         Verdict::Unrated => println!("no rating"),
//!         Verdict::Blocked => println!("block-listed"),
//!     }
//!
//!     engine.flush().await?;
//!     Ok(())
//! }
//! ```

pub mod blocklist;
pub mod cache;
pub mod chain;
pub mod config;
pub mod coordinator;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod providers;
pub mod telemetry;
pub mod title;
pub mod types;
pub mod version;

// Re-export main types at crate root
pub use blocklist::Blocklist;
pub use cache::{FileStore, KeyValueStore, MemoryStore, RatingCache, RatingCacheConfig};
pub use chain::{LookupChain, LookupOutcome};
pub use config::Config;
pub use coordinator::RequestCoordinator;
pub use dispatch::{DispatchConfig, RateLimitedDispatcher};
pub use engine::{Marquee, MarqueeBuilder, RatingEngine};
pub use error::{MarqueeError, Result};
pub use providers::{
    PrimaryProvider, PrimaryResponse, RetryConfig, ScoreParser, SecondaryProvider,
    SecondaryResponse,
};
pub use title::{TitleKey, clean_title, variations};
pub use types::{RatingResult, Verdict};
pub use version::{PKG_VERSION, user_agent, version_string};
