pub mod api;
pub mod health;

pub use api::api_routes;
pub use health::{health_check, liveness};
