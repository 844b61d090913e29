use crate::enricher::Enricher;
use egress_core::{EgressError, InboundResponse, OutboundRequest, PropertyBag};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

/// Ordered, immutable set of enrichers for one pipeline.
///
/// Built once; every call walks the same list in registration order.
#[derive(Clone, Default)]
pub struct EnricherSet {
    enrichers: Vec<Arc<dyn Enricher>>,
}

/// Outcome of one fan-out pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FanOutReport {
    pub invoked: usize,
    pub failed: usize,
}

impl EnricherSet {
    pub fn new(enrichers: Vec<Arc<dyn Enricher>>) -> Self {
        Self { enrichers }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Run every enricher against `bag`. A failing enricher is logged and
    /// skipped; it never stops the ones after it.
    pub fn enrich(
        &self,
        bag: &mut PropertyBag,
        request: &OutboundRequest,
        response: Option<&InboundResponse>,
    ) -> FanOutReport {
        let mut report = FanOutReport::default();
        for enricher in &self.enrichers {
            report.invoked += 1;
            let outcome =
                catch_unwind(AssertUnwindSafe(|| enricher.enrich(bag, request, response)));
            let failure = match outcome {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => enrichment_error(enricher.as_ref(), format!("{e:#}")),
                Err(panic) => enrichment_error(
                    enricher.as_ref(),
                    format!("panicked: {}", panic_message(panic.as_ref())),
                ),
            };
            report.failed += 1;
            tracing::warn!(enricher = %enricher.name(), error = %failure, "Enrichment skipped");
        }
        report
    }

    pub fn names(&self) -> Vec<&str> {
        self.enrichers.iter().map(|e| e.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.enrichers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.enrichers.is_empty()
    }
}

impl std::fmt::Debug for EnricherSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnricherSet")
            .field("enrichers", &self.names())
            .finish()
    }
}

fn enrichment_error(enricher: &dyn Enricher, reason: String) -> EgressError {
    EgressError::Enrichment {
        enricher: enricher.name().to_string(),
        reason,
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn request() -> OutboundRequest {
        http::Request::builder()
            .uri("https://api.example.com/v1/ping")
            .body(Bytes::new())
            .unwrap()
    }

    struct Put(&'static str, &'static str);
    impl Enricher for Put {
        fn name(&self) -> &str {
            "put"
        }
        fn enrich(
            &self,
            bag: &mut PropertyBag,
            _: &OutboundRequest,
            _: Option<&InboundResponse>,
        ) -> anyhow::Result<()> {
            bag.add(self.0, self.1);
            Ok(())
        }
    }

    struct Failing;
    impl Enricher for Failing {
        fn name(&self) -> &str {
            "failing"
        }
        fn enrich(
            &self,
            _: &mut PropertyBag,
            _: &OutboundRequest,
            _: Option<&InboundResponse>,
        ) -> anyhow::Result<()> {
            anyhow::bail!("lookup failed")
        }
    }

    struct Panicking;
    impl Enricher for Panicking {
        fn name(&self) -> &str {
            "panicking"
        }
        fn enrich(
            &self,
            _: &mut PropertyBag,
            _: &OutboundRequest,
            _: Option<&InboundResponse>,
        ) -> anyhow::Result<()> {
            panic!("enricher bug")
        }
    }

    struct Counting(AtomicUsize);
    impl Enricher for Counting {
        fn name(&self) -> &str {
            "counting"
        }
        fn enrich(
            &self,
            _: &mut PropertyBag,
            _: &OutboundRequest,
            _: Option<&InboundResponse>,
        ) -> anyhow::Result<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn test_empty_set_invokes_nothing() {
        let set = EnricherSet::empty();
        let mut bag = PropertyBag::new();
        let report = set.enrich(&mut bag, &request(), None);
        assert_eq!(report, FanOutReport::default());
        assert!(bag.is_empty());
        assert!(set.is_empty());
    }

    #[test]
    fn test_enrichers_run_in_registration_order() {
        let set = EnricherSet::new(vec![Arc::new(Put("a", "1")), Arc::new(Put("b", "2"))]);
        let mut bag = PropertyBag::new();
        set.enrich(&mut bag, &request(), None);
        let keys: Vec<_> = bag.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn test_duplicate_key_last_write_wins() {
        let set = EnricherSet::new(vec![
            Arc::new(Put("k", "first")),
            Arc::new(Put("k", "second")),
        ]);
        let mut bag = PropertyBag::new();
        set.enrich(&mut bag, &request(), None);
        assert_eq!(bag.get("k"), Some("second"));
        assert_eq!(bag.len(), 1);
    }

    #[test]
    fn test_error_does_not_stop_fan_out() {
        let counter = Arc::new(Counting(AtomicUsize::new(0)));
        let set = EnricherSet::new(vec![
            Arc::new(Failing),
            Arc::new(Put("after", "yes")),
            counter.clone(),
        ]);
        let mut bag = PropertyBag::new();
        let report = set.enrich(&mut bag, &request(), None);
        assert_eq!(report.invoked, 3);
        assert_eq!(report.failed, 1);
        assert_eq!(bag.get("after"), Some("yes"));
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_panic_is_contained() {
        let set = EnricherSet::new(vec![Arc::new(Panicking), Arc::new(Put("after", "yes"))]);
        let mut bag = PropertyBag::new();
        let report = set.enrich(&mut bag, &request(), None);
        assert_eq!(report.invoked, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(bag.get("after"), Some("yes"));
    }

    #[test]
    fn test_failure_names_the_enricher() {
        let err = enrichment_error(&Failing, "lookup failed".into());
        let EgressError::Enrichment { ref enricher, .. } = err else {
            panic!("unexpected error: {err:?}");
        };
        assert_eq!(enricher, "failing");
        assert_eq!(err.to_string(), "Enricher 'failing' failed: lookup failed");
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_names_and_debug() {
        let set = EnricherSet::new(vec![Arc::new(Failing), Arc::new(Panicking)]);
        assert_eq!(set.names(), vec!["failing", "panicking"]);
        assert!(format!("{set:?}").contains("panicking"));
    }
}
