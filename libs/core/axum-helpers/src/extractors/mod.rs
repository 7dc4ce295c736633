//! Custom extractors for Axum handlers.
//!
//! Each extractor rejects with [`AppError`](crate::errors::AppError) so failures render
//! the standard error body.

pub mod caller;
pub mod uuid_path;
pub mod validated_json;

pub use caller::{CallerContext, USER_ID_HEADER, USER_ROLE_HEADER};
pub use uuid_path::UuidPath;
pub use validated_json::ValidatedJson;
