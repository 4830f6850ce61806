//! Trendcast - trending video announcements, published exactly once
//!
//! Each pass fetches the trending charts for Turkey and the United States,
//! keeps the videos that are new or gained enough views since the previous
//! pass, and posts them with hashtags. Two JSON files carry state across
//! passes: the view-count baseline and the ledger of published posts.
//!
//! Passes must not overlap. Neither file is locked, so concurrent passes can
//! lose each other's updates.

pub mod composer;
pub mod config;
pub mod controller;
pub mod error;
pub mod hashtags;
pub mod logging;
pub mod pass;
pub mod platforms;
pub mod quota;
pub mod source;
pub mod store;
pub mod trend;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use controller::{Outcome, PassReport, PublicationController};
pub use error::{Result, TrendcastError};
pub use pass::TrendPass;
pub use types::{Region, VideoSnapshot};
