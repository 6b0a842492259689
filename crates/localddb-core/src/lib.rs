//! Core engine of the localddb DynamoDB emulator.
//!
//! [`handler::handle_action`] is the boundary: it takes an action name and a
//! JSON body, validates the request, runs it against the in-memory catalog
//! and returns the status and JSON document the service would answer with.
#![allow(missing_docs, clippy::doc_markdown, clippy::module_name_repetitions)]

pub mod batch;
pub mod capacity;
pub mod clock;
pub mod codec;
pub mod config;
pub mod error;
pub mod handler;
pub mod lifecycle;
pub mod number;
pub mod provider;
pub mod state;
pub mod storage;
pub mod validation;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::DynamoDBConfig;
pub use handler::{ActionResponse, handle_action, handle_raw_action};
pub use lifecycle::spawn_lifecycle_driver;
pub use provider::LocalDynamoDB;
