pub mod auth;
pub mod response;

pub use auth::{constructor_auth, session_auth, supplier_auth, Capability};
pub use response::{ApiResponse, ApiResult};
