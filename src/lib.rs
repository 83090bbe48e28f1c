pub mod backfill;
pub mod cache;
pub mod composer;
pub mod engine;
pub mod fake_feed;
pub mod feed;
pub mod http_client;
pub mod models;
pub mod palette;
pub mod ranking_fetch;
pub mod scheduler;
pub mod viewport;
