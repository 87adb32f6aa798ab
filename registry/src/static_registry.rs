use crate::types::{DeploymentRecord, Lookup};
use indexmap::IndexMap;
use std::sync::Arc;

/// A registry whose environments are fixed at construction time.
#[derive(Clone, Debug, Default)]
pub struct StaticRegistry {
    environments: Arc<IndexMap<String, DeploymentRecord>>,
}

impl StaticRegistry {
    pub fn new(environments: IndexMap<String, IndexMap<String, String>>) -> Self {
        let environments = environments
            .into_iter()
            .map(|(name, outputs)| {
                let record = DeploymentRecord {
                    name: name.clone(),
                    outputs,
                };
                (name, record)
            })
            .collect();

        StaticRegistry {
            environments: Arc::new(environments),
        }
    }

    pub fn lookup(&self, name: &str) -> Lookup {
        match self.environments.get(name) {
            Some(record) => Lookup::Found(record.clone()),
            None => Lookup::NotFound,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_exact() {
        let registry = StaticRegistry::new(IndexMap::from([
            (
                "pr-123".to_string(),
                IndexMap::from([("FunctionUrl".to_string(), "https://a.example/".to_string())]),
            ),
            ("pr-124".to_string(), IndexMap::new()),
        ]));

        match registry.lookup("pr-123") {
            Lookup::Found(record) => {
                assert_eq!(record.name, "pr-123");
                assert_eq!(record.function_url(), Some("https://a.example/"));
            }
            other => panic!("expected record, got {other:?}"),
        }

        // Present but without outputs
        match registry.lookup("pr-124") {
            Lookup::Found(record) => assert_eq!(record.function_url(), None),
            other => panic!("expected record, got {other:?}"),
        }

        assert!(matches!(registry.lookup("PR-123"), Lookup::NotFound));
        assert!(matches!(registry.lookup("pr-12"), Lookup::NotFound));
        assert!(matches!(registry.lookup(""), Lookup::NotFound));
    }
}
