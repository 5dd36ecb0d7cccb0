pub mod auth;
pub mod response;

pub use auth::{jwt_auth_middleware, Caller};
pub use response::{ApiResponse, ApiResult, Removed};
