//! Shared test utilities for the domain crates
//!
//! - `TestDatabase`: Postgres container with the workspace migrations applied
//!   (feature `postgres`, on by default)
//! - `TestDataBuilder`: seeded ids and strings, stable per test name
//! - `assertions`: assertion helpers with readable failure messages
//!
//! ```rust,no_run
//! use test_utils::{TestDatabase, TestDataBuilder};
//!
//! #[tokio::test]
//! #[ignore = "requires Docker"]
//! async fn stores_a_request() {
//!     let db = TestDatabase::new().await;
//!     let data = TestDataBuilder::from_test_name("stores_a_request");
//!
//!     let requester = data.user_id("requester");
//!     let target = data.user_id("target");
//!     let message = data.name("message", "intro");
//! }
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use uuid::Uuid;

#[cfg(feature = "postgres")]
mod postgres;

#[cfg(feature = "postgres")]
pub use postgres::TestDatabase;

/// Deterministic test data derived from a seed.
///
/// Tests sharing one database stay apart because each test name yields its
/// own seed, and therefore its own users.
#[derive(Debug, Clone, Copy)]
pub struct TestDataBuilder {
    seed: u64,
}

impl TestDataBuilder {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn from_test_name(name: &str) -> Self {
        Self::new(hash_of(&name))
    }

    /// User id for a named actor (`"requester"`, `"target"`, ...).
    pub fn user_id(&self, label: &str) -> Uuid {
        let mut bytes = [0u8; 16];
        bytes[..8].copy_from_slice(&self.seed.to_le_bytes());
        bytes[8..].copy_from_slice(&hash_of(&(self.seed, label)).to_le_bytes());
        uuid::Builder::from_random_bytes(bytes).into_uuid()
    }

    /// `test-{prefix}-{seed}-{suffix}`
    pub fn name(&self, prefix: &str, suffix: &str) -> String {
        format!("test-{prefix}-{}-{suffix}", self.seed)
    }
}

fn hash_of(value: &impl Hash) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

pub mod assertions {
    use uuid::Uuid;

    pub fn assert_uuid_eq(actual: Uuid, expected: Uuid, context: &str) {
        assert_eq!(actual, expected, "{context}: expected {expected}, got {actual}");
    }

    pub fn assert_some<T>(value: Option<T>, context: &str) -> T {
        value.unwrap_or_else(|| panic!("{context}: expected Some, got None"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_data() {
        let a = TestDataBuilder::new(42);
        let b = TestDataBuilder::new(42);

        assert_eq!(a.user_id("requester"), b.user_id("requester"));
        assert_eq!(a.name("startup", "main"), b.name("startup", "main"));
    }

    #[test]
    fn test_labels_yield_distinct_users() {
        let data = TestDataBuilder::from_test_name("labels");
        assert_ne!(data.user_id("requester"), data.user_id("target"));
    }

    #[test]
    fn test_test_names_do_not_collide() {
        let a = TestDataBuilder::from_test_name("first");
        let b = TestDataBuilder::from_test_name("second");
        assert_ne!(a.user_id("requester"), b.user_id("requester"));
    }
}
