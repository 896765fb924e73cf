pub mod auth;
pub mod request_audit;
