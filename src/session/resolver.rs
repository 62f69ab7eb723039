//! Namespace-aware lookup of package data for a client.

use std::collections::HashMap;
use std::sync::Arc;

use super::container::SessionDataContainer;
use super::package::PackageData;
use crate::Result;

/// Maps namespaces to the container that stores their data.
///
/// Lookups are exact string matches; anything unregistered goes to the
/// default container.
#[derive(Debug, Clone)]
pub struct ContainerRegistry {
    default: Arc<SessionDataContainer>,
    named: HashMap<String, Arc<SessionDataContainer>>,
}

impl ContainerRegistry {
    /// Create a registry with only a default container.
    pub fn new(default: Arc<SessionDataContainer>) -> Self {
        Self {
            default,
            named: HashMap::new(),
        }
    }

    /// Route `namespace` to `container`.
    pub fn register(
        &mut self,
        namespace: impl Into<String>,
        container: Arc<SessionDataContainer>,
    ) -> Option<Arc<SessionDataContainer>> {
        self.named.insert(namespace.into(), container)
    }

    /// Builder form of [`register`](Self::register).
    pub fn with_container(
        mut self,
        namespace: impl Into<String>,
        container: Arc<SessionDataContainer>,
    ) -> Self {
        self.register(namespace, container);
        self
    }

    /// Container responsible for `namespace`.
    pub fn lookup(&self, namespace: &str) -> &Arc<SessionDataContainer> {
        self.named.get(namespace).unwrap_or(&self.default)
    }

    /// The fallback container.
    pub fn default_container(&self) -> &Arc<SessionDataContainer> {
        &self.default
    }

    /// Registered namespaces, sorted.
    pub fn namespaces(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.named.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Every distinct container, default first.
    ///
    /// A container registered under several namespaces appears once.
    pub fn containers(&self) -> Vec<Arc<SessionDataContainer>> {
        let mut named: Vec<(&String, &Arc<SessionDataContainer>)> = self.named.iter().collect();
        named.sort_by(|a, b| a.0.cmp(b.0));

        let mut distinct = vec![Arc::clone(&self.default)];
        for (_, container) in named {
            if !distinct.iter().any(|c| Arc::ptr_eq(c, container)) {
                distinct.push(Arc::clone(container));
            }
        }
        distinct
    }
}

/// Resolves `(client id, namespace)` to the package data callers work with.
#[derive(Debug, Clone)]
pub struct SessionResolver {
    registry: Arc<ContainerRegistry>,
}

impl SessionResolver {
    /// Create a resolver over an explicit registry.
    pub fn new(registry: Arc<ContainerRegistry>) -> Self {
        Self { registry }
    }

    /// The registry this resolver consults.
    pub fn registry(&self) -> &Arc<ContainerRegistry> {
        &self.registry
    }

    /// Package data for `namespace`, creating session and package data as needed.
    pub fn resolve(&self, client_id: &str, namespace: &str) -> Result<Arc<PackageData>> {
        let container = self.registry.lookup(namespace);
        let session = container.get_or_create(client_id)?;
        session.get_or_create_package(namespace)
    }

    /// Package data for `namespace` if it already exists.
    ///
    /// Never creates anything; expired session data reads as absent.
    pub fn get(&self, client_id: &str, namespace: &str) -> Result<Option<Arc<PackageData>>> {
        let container = self.registry.lookup(namespace);
        match container.get(client_id)? {
            Some(session) => session.get_package(namespace),
            None => Ok(None),
        }
    }

    /// Drop the package for `namespace`. Returns `true` if it existed.
    pub fn remove(&self, client_id: &str, namespace: &str) -> Result<bool> {
        let container = self.registry.lookup(namespace);
        match container.get(client_id)? {
            Some(session) => Ok(session.remove_package(namespace)?.is_some()),
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::clock::ManualClock;
    use serde_json::json;

    fn resolver() -> (SessionResolver, Arc<SessionDataContainer>, Arc<SessionDataContainer>) {
        let default = Arc::new(SessionDataContainer::new("default"));
        let special = Arc::new(SessionDataContainer::new("special"));
        let registry = ContainerRegistry::new(Arc::clone(&default))
            .with_container("registered.namespace", Arc::clone(&special));
        (SessionResolver::new(Arc::new(registry)), default, special)
    }

    #[test]
    fn test_resolve_same_package_twice() {
        let (resolver, _, _) = resolver();
        let first = resolver.resolve("client", "products.foo").unwrap();
        let second = resolver.resolve("client", "products.foo").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_round_trip_across_resolves() {
        let (resolver, _, _) = resolver();
        resolver
            .resolve("client", "products.foo")
            .unwrap()
            .set("color", json!("red"))
            .unwrap();

        let value = resolver
            .resolve("client", "products.foo")
            .unwrap()
            .get("color")
            .unwrap();
        assert_eq!(value, Some(json!("red")));
    }

    #[test]
    fn test_namespace_and_client_isolation() {
        let (resolver, _, _) = resolver();
        let foo = resolver.resolve("client-1", "products.foo").unwrap();
        let bar = resolver.resolve("client-1", "products.bar").unwrap();
        let other = resolver.resolve("client-2", "products.bar").unwrap();

        foo.set("color", json!("red")).unwrap();
        bar.set("color", json!("blue")).unwrap();
        other.set("color", json!("green")).unwrap();

        assert_eq!(foo.get("color").unwrap(), Some(json!("red")));
        assert_eq!(bar.get("color").unwrap(), Some(json!("blue")));
        assert_eq!(other.get("color").unwrap(), Some(json!("green")));
    }

    #[test]
    fn test_unregistered_namespace_uses_default() {
        let (resolver, default, special) = resolver();
        resolver.resolve("client", "unregistered.namespace").unwrap();

        assert_eq!(default.len().unwrap(), 1);
        assert!(special.is_empty().unwrap());
    }

    #[test]
    fn test_registered_namespace_uses_its_container() {
        let (resolver, default, special) = resolver();
        resolver.resolve("client", "registered.namespace").unwrap();

        assert!(default.is_empty().unwrap());
        assert_eq!(special.len().unwrap(), 1);
    }

    #[test]
    fn test_no_prefix_matching() {
        let (resolver, default, special) = resolver();
        resolver.resolve("client", "registered").unwrap();
        resolver
            .resolve("client", "registered.namespace.child")
            .unwrap();

        assert_eq!(default.len().unwrap(), 1);
        assert!(special.is_empty().unwrap());
    }

    #[test]
    fn test_get_is_lazy() {
        let (resolver, default, _) = resolver();
        assert!(resolver.get("client", "not.there").unwrap().is_none());
        assert!(default.is_empty().unwrap());

        let created = resolver.resolve("client", "not.there").unwrap();
        let found = resolver.get("client", "not.there").unwrap().unwrap();
        assert!(Arc::ptr_eq(&created, &found));

        // Session exists but the other namespace was never created
        assert!(resolver.get("client", "elsewhere").unwrap().is_none());
    }

    #[test]
    fn test_remove_namespace() {
        let (resolver, _, _) = resolver();
        resolver.resolve("client", "a").unwrap();

        assert!(resolver.remove("client", "a").unwrap());
        assert!(!resolver.remove("client", "a").unwrap());
        assert!(!resolver.remove("nobody", "a").unwrap());
    }

    #[test]
    fn test_expired_session_resolves_empty() {
        let clock = ManualClock::new(50_000);
        let default = Arc::new(
            SessionDataContainer::new("default").with_clock(Arc::new(clock.clone())),
        );
        let resolver = SessionResolver::new(Arc::new(ContainerRegistry::new(default)));

        resolver
            .resolve("client", "ns")
            .unwrap()
            .set("k", json!(1))
            .unwrap();

        clock.advance(3601);
        assert!(resolver.get("client", "ns").unwrap().is_none());
        let fresh = resolver.resolve("client", "ns").unwrap();
        assert!(fresh.is_empty().unwrap());
    }

    #[test]
    fn test_containers_deduplicated() {
        let default = Arc::new(SessionDataContainer::new("default"));
        let shared = Arc::new(SessionDataContainer::new("shared"));
        let registry = ContainerRegistry::new(Arc::clone(&default))
            .with_container("a", Arc::clone(&shared))
            .with_container("b", Arc::clone(&shared))
            .with_container("c", Arc::clone(&default));

        let containers = registry.containers();
        assert_eq!(containers.len(), 2);
        assert!(Arc::ptr_eq(&containers[0], &default));
        assert!(Arc::ptr_eq(&containers[1], &shared));
        assert_eq!(registry.namespaces(), vec!["a", "b", "c"]);
    }
}
