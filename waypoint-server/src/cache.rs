use dashmap::DashMap;
use waypoint_router::RouteSnapshot;

/// In-process dispatch cache keyed by `(method, path)`. A hit replays
/// the stored snapshot and bypasses the matching engine entirely. Only
/// `Found` outcomes ever get stored.
#[derive(Debug, Default)]
pub struct DispatchCache {
    entries: DashMap<(String, String), RouteSnapshot<String>>,
}

impl DispatchCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, method: &str, path: &str) -> Option<RouteSnapshot<String>> {
        self.entries
            .get(&(method.to_string(), path.to_string()))
            .map(|entry| entry.clone())
    }

    pub fn put(&self, method: &str, path: &str, snapshot: RouteSnapshot<String>) {
        self.entries
            .insert((method.to_string(), path.to_string()), snapshot);
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use waypoint_router::BoundParams;

    use super::*;

    #[test]
    fn put_then_get_round_trips() {
        let cache = DispatchCache::new();
        assert!(cache.get("GET", "/users/1").is_none());

        let snapshot = RouteSnapshot {
            methods: vec!["GET".to_string()],
            path: "/users/1".to_string(),
            handler: "show_user".to_string(),
            params: BoundParams::from([("id".to_string(), "1".to_string())]),
        };
        cache.put("GET", "/users/1", snapshot.clone());

        assert_eq!(cache.get("GET", "/users/1"), Some(snapshot));
        assert!(cache.get("POST", "/users/1").is_none());
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }
}
