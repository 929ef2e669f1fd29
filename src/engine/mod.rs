//! Caller-facing engine

mod builder;
mod rating_engine;

pub use builder::{Marquee, MarqueeBuilder};
pub use rating_engine::RatingEngine;
