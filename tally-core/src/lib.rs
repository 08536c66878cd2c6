//! Time-tracking and retainer-budget reconciliation.
//!
//! The [`domain`] module holds the models, ports and pure services; [`adapters`]
//! provides implementations of the outbound ports that need no external system.

pub mod adapters;
pub mod domain;
