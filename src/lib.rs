pub mod config;
pub mod error;
pub mod fake_feed;
pub mod feed;
pub mod graphql;
pub mod http_client;
pub mod score_fetch;
pub mod state;
pub mod workflow;
