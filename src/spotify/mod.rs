//! Spotify Web API and Accounts clients.

pub mod api;
pub mod auth;
pub mod models;

pub use api::{Catalog, SpotifyClient};
pub use auth::TokenExchange;
pub use models::TrackSummary;
