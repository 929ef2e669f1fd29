//! Core types for rating resolution

pub mod rating;

pub use rating::{RatingResult, Verdict};
