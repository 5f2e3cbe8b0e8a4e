//! Grocy REST API client: chores, users, and the web deep link.

pub mod client;
pub mod link;
pub mod model;

pub use self::client::GrocyClient;
pub use self::link::web_link;
pub use self::model::{Chore, User};

use thiserror::Error;

/// Errors raised at the fetch boundary. Any of these aborts the whole cycle.
#[derive(Debug, Error)]
pub enum GrocyError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to get {resource}: {status}")]
    HttpStatus {
        resource: &'static str,
        status: reqwest::StatusCode,
    },

    #[error("failed to decode {resource} response: {source}")]
    Decode {
        resource: &'static str,
        #[source]
        source: serde_json::Error,
    },
}
