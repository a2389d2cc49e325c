pub mod admin;
pub mod query;
pub mod traits;

pub use admin::{AdminData, AdminQuery, AdminTab};
pub use query::{ListingFilters, ListingQuery, QueryPlan};
pub use traits::{AdminSource, ListingSource};
