//! HTTP surface for session data.
//!
//! Every session route reads the client identifier from the `x-client-id`
//! header. Issuing and signing that identifier is the job of whatever sits
//! in front of this server.
//!
//! ## Endpoints
//!
//! ### Health & Info
//! - `GET /health` - Health check
//! - `GET /api/v1` - API information
//!
//! ### Session data
//! - `GET /api/v1/sessions/{namespace}` - All keys in a namespace
//! - `DELETE /api/v1/sessions/{namespace}` - Drop a namespace
//! - `GET /api/v1/sessions/{namespace}/{key}` - Read a value
//! - `PUT /api/v1/sessions/{namespace}/{key}` - Store a JSON value
//! - `DELETE /api/v1/sessions/{namespace}/{key}` - Remove a value
//!
//! ### Containers
//! - `GET /api/v1/containers` - Policies and sizes
//! - `POST /api/v1/containers/sweep` - Evict expired data now
//!
//! ## Example
//!
//! ```no_run
//! use session_keeper::api::{serve, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     let config = ServerConfig::new("127.0.0.1", 3000);
//!     serve(config).await
//! }
//! ```

pub mod handlers;
pub mod router;
pub mod types;

// Re-export commonly used types
pub use handlers::{api_error, ApiError, AppState, RequestClient, CLIENT_ID_HEADER};
pub use router::{create_router, create_router_with_state, serve, serve_with_state, ServerConfig};
pub use types::{
    ContainerSummary, ErrorResponse, ListContainersResponse, PackageResponse, SweepResponse,
    ValueResponse,
};
