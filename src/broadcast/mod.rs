//! Event broadcast protocol: wire envelopes, bookmarks and fan-out.

pub mod broadcaster;
pub mod envelope;

pub use broadcaster::{Delivery, EventBroadcaster};
pub use envelope::{ALL_RECIPIENTS, Category, WireFrame, encode};
