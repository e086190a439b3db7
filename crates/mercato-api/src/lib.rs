pub mod auth;
pub mod categories;
pub mod error;
pub mod favorites;
pub mod listings;
pub mod messages;
pub mod middleware;
pub mod routes;
pub mod vendors;

mod util;
