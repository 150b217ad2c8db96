//! Polling driver: waits for an eventually consistent store to reflect a
//! change in a lens scope.

pub mod poller;


pub use poller::{CancelHandle, Cancellation, PollConfig, PollError, PollOutcome, Poller, cancellation};
