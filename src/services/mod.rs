pub mod assessment;
pub mod auth;
pub mod results;
