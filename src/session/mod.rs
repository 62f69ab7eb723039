//! Session data engine.
//!
//! Data is reached in three steps:
//!
//! ```text
//! registry.lookup(namespace)          -> SessionDataContainer
//!   container.get_or_create(client)   -> SessionData
//!     data.get_or_create_package(ns)  -> PackageData
//! ```
//!
//! [`SessionResolver`] performs all three. Containers own the expiration
//! policy and the backing [`SessionStore`].

mod clock;
mod container;
mod data;
mod file_store;
mod id;
mod package;
mod policy;
mod resolver;
mod store;
mod sweeper;

pub use clock::{Clock, ManualClock, SystemClock};
pub use container::SessionDataContainer;
pub use data::{SessionData, StoredSession};
pub use file_store::JsonFileStore;
pub use id::{ClientId, MAX_CLIENT_ID_LEN};
pub use package::PackageData;
pub use policy::{ExpirationPolicy, DEFAULT_RESOLUTION_SECS, DEFAULT_TIMEOUT_SECS};
pub use resolver::{ContainerRegistry, SessionResolver};
pub use store::{MemoryStore, SessionStore};
pub use sweeper::{flush_all, sweep_all, Sweeper};
