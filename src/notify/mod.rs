//! Notification engine (C6): the spend watcher, the delivery handler, and
//! the retrieval-endpoint replay, sharing the `NotConfirmed` in-memory
//! mirror (spec.md §4.6).

mod delivery;
mod not_confirmed;
mod retrieval;
mod spend_watcher;

pub use delivery::DeliveryHandler;
pub use not_confirmed::NotConfirmedSet;
pub use retrieval::{republish_parked, RepublishCounts};
pub use spend_watcher::SpendWatcher;
