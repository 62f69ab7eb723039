//! # session-keeper
//!
//! Server-side session data for web applications.
//!
//! A client is identified by an opaque, already-validated string. Each
//! client owns one [`SessionData`] per container, split into
//! [`PackageData`] namespaces that different parts of an application use
//! without colliding.
//!
//! ## Features
//!
//! - **Namespaced packages**: Independent key/value maps per namespace
//! - **Resolution-gated expiry**: Last access is recorded at a coarse
//!   granularity, so reads rarely write
//! - **Lazy and swept eviction**: Expired data disappears on access, on
//!   demand, or from an optional background sweeper
//! - **Pluggable storage**: In-memory or JSON snapshot file
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use session_keeper::{ContainerRegistry, SessionDataContainer, SessionResolver};
//!
//! fn main() -> session_keeper::Result<()> {
//!     // Initialize logging
//!     session_keeper::logging::try_init().ok();
//!
//!     // One container handles every namespace
//!     let container = Arc::new(SessionDataContainer::new("default"));
//!     let resolver = SessionResolver::new(Arc::new(ContainerRegistry::new(container)));
//!
//!     // Store and read back a value
//!     let cart = resolver.resolve("client-1", "products.cart")?;
//!     cart.insert("items", &vec!["apple", "pear"])?;
//!
//!     let items: Option<Vec<String>> = cart.get_as("items")?;
//!     println!("cart: {:?}", items);
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod session;

// Re-export commonly used types
pub use error::{Result, SessionError};
pub use session::{
    ClientId, Clock, ContainerRegistry, ExpirationPolicy, JsonFileStore, ManualClock, MemoryStore,
    PackageData, SessionData, SessionDataContainer, SessionResolver, SessionStore, Sweeper,
    SystemClock,
};
