//! Pattern analysis over a user's stored history.
//!
//! Everything here is pure: callers fetch messages, moods and dreams and hand
//! them in, together with a [`LocalClock`] describing the user's local time.

pub mod buckets;
pub mod calendar;
pub mod catalog;
pub mod classifier;
pub mod summary;
pub mod tally;

pub use buckets::{Bucket, Period};
pub use calendar::LocalClock;
pub use classifier::{CategoryCount, Classifier};
pub use tally::Tally;
