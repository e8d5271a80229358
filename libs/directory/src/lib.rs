//! Personnel directory.
//!
//! The IMS does not own personnel data; it reads it from an external
//! directory (the Clubhouse database in production) and caches it in
//! memory. Everything that needs to know who a Ranger is, what positions
//! and teams they hold, or whether their password checks out goes through
//! the [`Directory`] trait.

pub mod cache;
pub mod clubhouse;
pub mod config;
pub mod error;
pub mod model;
pub mod test_users;

pub use cache::CachedDirectory;
pub use clubhouse::ClubhouseDirectory;
pub use config::{DirectoryConfig, DirectoryType};
pub use error::{DirectoryError, DirectoryResult};
pub use model::{DirectorySnapshot, Person};
pub use test_users::{NoopDirectory, TestUser, TestUsersDirectory};

use async_trait::async_trait;

#[async_trait]
pub trait Directory: Send + Sync {
    /// The current personnel snapshot. Implementations may serve cached
    /// data; `invalidate` forces the next call to refetch.
    async fn personnel(&self) -> DirectoryResult<DirectorySnapshot>;

    /// Drop any cached state. No-op for uncached backends.
    async fn invalidate(&self) {}
}
