use crate::enricher::{Enricher, EnricherFactory};
use crate::fanout::EnricherSet;
use egress_core::EgressError;
use egress_core::config::EnricherConfig;
use std::collections::HashMap;
use std::sync::Arc;

/// Enricher factories, keyed by name.
///
/// Built once at startup; [`EnricherRegistry::build`] turns the configured
/// enricher list into an [`EnricherSet`] shared by every call.
pub struct EnricherRegistry {
    factories: HashMap<String, Arc<dyn EnricherFactory>>,
}

impl EnricherRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a factory. A later registration replaces an earlier one with
    /// the same name.
    pub fn register(&mut self, factory: Arc<dyn EnricherFactory>) {
        let name = factory.name().to_string();
        tracing::info!(enricher = %name, "Registered enricher");
        self.factories.insert(name, factory);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn EnricherFactory>> {
        self.factories.get(name)
    }

    /// Registered factory names, sorted.
    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Configure every listed enricher, in order.
    ///
    /// Unknown names and rejected configs are configuration errors; nothing
    /// is built unless every entry succeeds.
    pub fn build(&self, configs: &[EnricherConfig]) -> Result<EnricherSet, EgressError> {
        let mut enrichers: Vec<Arc<dyn Enricher>> = Vec::with_capacity(configs.len());
        for entry in configs {
            let factory = self.get(&entry.name).ok_or_else(|| {
                EgressError::config(format!("unknown enricher '{}'", entry.name))
            })?;
            let instance = factory
                .check_config(&entry.config)
                .and_then(|()| factory.configure(&entry.config))
                .map_err(|e| {
                    EgressError::config(format!("enricher '{}': {e:#}", entry.name))
                })?;
            tracing::debug!(enricher = %entry.name, "Configured enricher");
            enrichers.push(Arc::from(instance));
        }
        Ok(EnricherSet::new(enrichers))
    }
}

impl Default for EnricherRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egress_core::{InboundResponse, OutboundRequest, PropertyBag};
    use serde_json::{Value, json};

    struct MockFactory {
        name: &'static str,
    }

    struct MockEnricher {
        key: String,
    }

    impl Enricher for MockEnricher {
        fn name(&self) -> &str {
            "mock"
        }
        fn enrich(
            &self,
            bag: &mut PropertyBag,
            _: &OutboundRequest,
            _: Option<&InboundResponse>,
        ) -> anyhow::Result<()> {
            bag.add(&self.key, "1");
            Ok(())
        }
    }

    impl EnricherFactory for MockFactory {
        fn name(&self) -> &str {
            self.name
        }
        fn check_config(&self, config: &Value) -> anyhow::Result<()> {
            if config.get("key").is_some_and(|k| !k.is_string()) {
                anyhow::bail!("key must be a string");
            }
            Ok(())
        }
        fn configure(&self, config: &Value) -> anyhow::Result<Box<dyn Enricher>> {
            let key = config
                .get("key")
                .and_then(|k| k.as_str())
                .unwrap_or("mock")
                .to_string();
            Ok(Box::new(MockEnricher { key }))
        }
    }

    fn registry() -> EnricherRegistry {
        let mut reg = EnricherRegistry::new();
        reg.register(Arc::new(MockFactory { name: "beta" }));
        reg.register(Arc::new(MockFactory { name: "alpha" }));
        reg
    }

    #[test]
    fn test_register_and_get() {
        let reg = registry();
        assert_eq!(reg.len(), 2);
        assert!(reg.get("alpha").is_some());
        assert!(reg.get("missing").is_none());
        assert_eq!(reg.list(), vec!["alpha", "beta"]);
    }

    #[test]
    fn test_empty_registry() {
        let reg = EnricherRegistry::default();
        assert!(reg.is_empty());
        assert!(reg.build(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_build_keeps_config_order() {
        let reg = registry();
        let set = reg
            .build(&[
                EnricherConfig { name: "beta".into(), config: json!({"key": "b"}) },
                EnricherConfig { name: "alpha".into(), config: json!({"key": "a"}) },
            ])
            .unwrap();
        assert_eq!(set.len(), 2);

        let request = http::Request::builder().uri("/").body(bytes::Bytes::new()).unwrap();
        let mut bag = PropertyBag::new();
        set.enrich(&mut bag, &request, None);
        let keys: Vec<_> = bag.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "a"]);
    }

    #[test]
    fn test_build_unknown_enricher_is_config_error() {
        let reg = registry();
        let err = reg
            .build(&[EnricherConfig { name: "nope".into(), config: Value::Null }])
            .unwrap_err();
        assert!(matches!(err, EgressError::Config(_)));
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn test_build_rejected_config_is_config_error() {
        let reg = registry();
        let err = reg
            .build(&[EnricherConfig { name: "alpha".into(), config: json!({"key": 5}) }])
            .unwrap_err();
        assert!(matches!(err, EgressError::Config(_)));
        assert!(err.to_string().contains("key must be a string"));
    }
}
