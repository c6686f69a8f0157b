pub mod lock;
pub mod migrate;
pub mod pg_store;
#[cfg(feature = "test-utils")]
pub mod testutil;

pub use lock::JobLock;
pub use migrate::migrate;
pub use pg_store::PgStore;
