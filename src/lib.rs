//! Client for a flex space listing marketplace: property normalization,
//! listing queries, the auth/role context and image uploads.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod listings;
pub mod models;
pub mod normalize;
pub mod submit;
pub mod upload;

pub use api::ApiClient;
pub use config::Config;
pub use error::ApiError;
