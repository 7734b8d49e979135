//! Core data model for alert paper records.

mod paper;

pub use paper::{identity_key, same_identity, Paper, STATUS_UNREVIEWED};
