//! REST API handlers.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Path, State},
    http::{request::Parts, StatusCode},
    Json,
};
use serde_json::Value;

use super::types::{
    ContainerSummary, ErrorResponse, ListContainersResponse, PackageResponse, SweepResponse,
    ValueResponse,
};
use crate::error::SessionError;
use crate::session::{sweep_all, ClientId, ContainerRegistry, SessionDataContainer, SessionResolver};

/// Header carrying the already-validated client identifier.
pub const CLIENT_ID_HEADER: &str = "x-client-id";

/// Error half of every handler result.
pub type ApiError = (StatusCode, Json<ErrorResponse>);

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub resolver: SessionResolver,
}

impl AppState {
    /// State with a single in-memory default container.
    pub fn new() -> Self {
        let default = Arc::new(SessionDataContainer::new("default"));
        Self::with_registry(Arc::new(ContainerRegistry::new(default)))
    }

    pub fn with_registry(registry: Arc<ContainerRegistry>) -> Self {
        Self {
            resolver: SessionResolver::new(registry),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// Client identifier extracted from [`CLIENT_ID_HEADER`].
#[derive(Debug, Clone)]
pub struct RequestClient(pub ClientId);

impl<S> FromRequestParts<S> for RequestClient
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts.headers.get(CLIENT_ID_HEADER).ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::missing_client_id(CLIENT_ID_HEADER)),
            )
        })?;
        let invalid = |err: SessionError| {
            let (status, Json(body)) = api_error(err);
            let details = format!("value of the '{}' header", CLIENT_ID_HEADER);
            (status, Json(body.with_details(details)))
        };
        let raw = raw.to_str().map_err(|_| {
            invalid(SessionError::InvalidClientId(
                "header is not visible ASCII".into(),
            ))
        })?;
        ClientId::new(raw).map(RequestClient).map_err(invalid)
    }
}

/// Map an engine error onto an HTTP status and error body.
pub fn api_error(err: SessionError) -> ApiError {
    let (status, code) = match &err {
        SessionError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        SessionError::InvalidClientId(_) => (StatusCode::BAD_REQUEST, "INVALID_CLIENT_ID"),
        SessionError::InvalidConfig(_) => (StatusCode::BAD_REQUEST, "INVALID_CONFIG"),
        SessionError::Serialization(_) => {
            (StatusCode::UNPROCESSABLE_ENTITY, "SERIALIZATION_FAILED")
        }
        SessionError::LockPoisoned | SessionError::Io(_) => {
            tracing::error!(error = %err, "Request failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::internal_error(err.to_string())),
            );
        }
    };
    (status, Json(ErrorResponse::new(code, err.to_string())))
}

fn namespace_not_found(namespace: &str) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::not_found(format!("namespace '{}'", namespace))),
    )
}

/// Health check endpoint.
pub async fn health() -> &'static str {
    "OK"
}

/// API information endpoint.
pub async fn api_info() -> Json<Value> {
    Json(serde_json::json!({
        "name": "session-keeper",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}

/// All keys of one namespace. Does not create session data.
pub async fn get_package(
    State(state): State<AppState>,
    RequestClient(client): RequestClient,
    Path(namespace): Path<String>,
) -> Result<Json<PackageResponse>, ApiError> {
    let package = state
        .resolver
        .get(client.as_str(), &namespace)
        .map_err(api_error)?
        .ok_or_else(|| namespace_not_found(&namespace))?;

    let items = package.snapshot().map_err(api_error)?;
    Ok(Json(PackageResponse { namespace, items }))
}

/// Drop a whole namespace.
pub async fn delete_package(
    State(state): State<AppState>,
    RequestClient(client): RequestClient,
    Path(namespace): Path<String>,
) -> Result<StatusCode, ApiError> {
    let removed = state
        .resolver
        .remove(client.as_str(), &namespace)
        .map_err(api_error)?;

    if removed {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(namespace_not_found(&namespace))
    }
}

/// One stored value. Does not create session data.
pub async fn get_value(
    State(state): State<AppState>,
    RequestClient(client): RequestClient,
    Path((namespace, key)): Path<(String, String)>,
) -> Result<Json<ValueResponse>, ApiError> {
    let package = state
        .resolver
        .get(client.as_str(), &namespace)
        .map_err(api_error)?
        .ok_or_else(|| namespace_not_found(&namespace))?;

    let value = package.require(&key).map_err(api_error)?;
    Ok(Json(ValueResponse {
        namespace,
        key,
        value,
    }))
}

/// Store a value, creating session and package data as needed.
pub async fn put_value(
    State(state): State<AppState>,
    RequestClient(client): RequestClient,
    Path((namespace, key)): Path<(String, String)>,
    Json(value): Json<Value>,
) -> Result<(StatusCode, Json<ValueResponse>), ApiError> {
    let package = state
        .resolver
        .resolve(client.as_str(), &namespace)
        .map_err(api_error)?;

    let previous = package.set(key.clone(), value.clone()).map_err(api_error)?;
    let status = if previous.is_some() {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };

    Ok((
        status,
        Json(ValueResponse {
            namespace,
            key,
            value,
        }),
    ))
}

/// Remove one key.
pub async fn delete_value(
    State(state): State<AppState>,
    RequestClient(client): RequestClient,
    Path((namespace, key)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let package = state
        .resolver
        .get(client.as_str(), &namespace)
        .map_err(api_error)?
        .ok_or_else(|| namespace_not_found(&namespace))?;

    match package.remove(&key).map_err(api_error)? {
        Some(_) => Ok(StatusCode::NO_CONTENT),
        None => Err(api_error(SessionError::NotFound(format!("key '{}'", key)))),
    }
}

/// Policy and size of every container.
pub async fn list_containers(
    State(state): State<AppState>,
) -> Result<Json<ListContainersResponse>, ApiError> {
    let registry = state.resolver.registry();

    let containers = registry
        .containers()
        .iter()
        .map(|c| ContainerSummary::from_container(c))
        .collect::<crate::Result<Vec<_>>>()
        .map_err(api_error)?;

    let namespaces: BTreeMap<String, String> = registry
        .namespaces()
        .into_iter()
        .map(|ns| (ns.to_string(), registry.lookup(ns).name().to_string()))
        .collect();

    Ok(Json(ListContainersResponse {
        count: containers.len(),
        containers,
        namespaces,
    }))
}

/// Sweep every container now.
pub async fn sweep_containers(State(state): State<AppState>) -> Json<SweepResponse> {
    let removed = sweep_all(state.resolver.registry());
    Json(SweepResponse { removed })
}
