pub mod analysis;
pub mod demo_feed;
pub mod insights;
pub mod match_db;
pub mod provider;
pub mod series;
pub mod smoothing;
pub mod state;
pub mod store_fetch;
pub mod true_odds;
