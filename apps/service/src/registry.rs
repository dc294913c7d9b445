use tokio::sync::RwLock;

/// In-memory set of monitored targets.
///
/// Uniqueness is exact string equality and insertion order is preserved for
/// listing. This is the only shared mutable state in the engine; the
/// scheduler only ever sees snapshots taken at the start of a pass, so the
/// command adapter can add and remove targets while a pass is in flight.
#[derive(Default)]
pub struct TargetRegistry {
    targets: RwLock<Vec<String>>,
}

impl TargetRegistry {
    /// Create a registry seeded from the configured target list. Duplicate
    /// seeds are dropped, keeping the first occurrence.
    pub fn new(seed: Vec<String>) -> Self {
        let mut targets: Vec<String> = Vec::with_capacity(seed.len());
        for target in seed {
            if !targets.contains(&target) {
                targets.push(target);
            }
        }

        Self { targets: RwLock::new(targets) }
    }

    /// Snapshot of the current targets, in insertion order.
    pub async fn list(&self) -> Vec<String> {
        self.targets.read().await.clone()
    }

    /// Add a target. Returns `false` if it was already present (no-op).
    pub async fn add(&self, target: &str) -> bool {
        let mut targets = self.targets.write().await;
        if targets.iter().any(|t| t == target) {
            false
        } else {
            targets.push(target.to_string());
            true
        }
    }

    /// Remove a target. Returns `false` if it was not present.
    pub async fn remove(&self, target: &str) -> bool {
        let mut targets = self.targets.write().await;
        match targets.iter().position(|t| t == target) {
            Some(index) => {
                targets.remove(index);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn add_remove_list_reflect_net_effect_in_order() {
        let registry =
            TargetRegistry::new(vec!["http://a.test".to_string(), "http://b.test".to_string()]);

        assert!(registry.add("http://c.test").await);
        assert_eq!(registry.list().await, vec!["http://a.test", "http://b.test", "http://c.test"]);

        assert!(registry.remove("http://b.test").await);
        assert_eq!(registry.list().await, vec!["http://a.test", "http://c.test"]);
    }

    #[tokio::test]
    async fn duplicate_add_is_a_no_op() {
        let registry = TargetRegistry::new(vec![]);

        assert!(registry.add("http://a.test").await);
        assert!(!registry.add("http://a.test").await);
        assert_eq!(registry.list().await, vec!["http://a.test"]);
    }

    #[tokio::test]
    async fn removing_absent_target_is_a_no_op() {
        let registry = TargetRegistry::new(vec!["http://a.test".to_string()]);

        assert!(!registry.remove("http://b.test").await);
        assert_eq!(registry.list().await, vec!["http://a.test"]);
    }

    #[tokio::test]
    async fn seed_duplicates_are_dropped() {
        let registry = TargetRegistry::new(vec![
            "http://a.test".to_string(),
            "http://b.test".to_string(),
            "http://a.test".to_string(),
        ]);

        assert_eq!(registry.list().await, vec!["http://a.test", "http://b.test"]);
    }
}
