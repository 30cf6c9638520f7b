//! HTTP middleware: request correlation and rate limiting.

pub mod rate_limit;
pub mod request_id;

pub use rate_limit::{api_rate_limiter, auth_rate_limiter};
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
