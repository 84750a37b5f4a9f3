pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod request_context;
pub mod router;
