mod aggregator;
mod contributors;
mod counter;
mod dispatcher;
mod eligibility;

use std::sync::Arc;

use async_trait::async_trait;
use log::info;

pub use dispatcher::{Dispatcher, DEFAULT_QUEUE_CAPACITY};
pub use eligibility::EligibilityPolicy;

use aggregator::Aggregator;
use dispatcher::JobHandler;
use eligibility::EligibilityGate;

use crate::models::{EligibilityVerdict, Extraction, RepositoryKey};
use crate::providers::RepositorySource;

/// Runs one repository through the aggregation, optionally behind the
/// eligibility gate.
pub struct Extractor<S: ?Sized> {
    aggregator: Aggregator<S>,
    gate: Option<(EligibilityGate<S>, EligibilityPolicy)>,
}

impl<S> Extractor<S>
where
    S: RepositorySource + ?Sized,
{
    pub fn ungated(source: Arc<S>) -> Self {
        Self {
            aggregator: Aggregator::new(source),
            gate: None,
        }
    }

    pub fn gated(source: Arc<S>, policy: EligibilityPolicy) -> Self {
        Self {
            gate: Some((EligibilityGate::new(Arc::clone(&source)), policy)),
            aggregator: Aggregator::new(source),
        }
    }

    pub async fn extract(&self, key: RepositoryKey) -> Extraction {
        let Some((gate, policy)) = &self.gate else {
            return Extraction::Completed(self.aggregator.aggregate(key).await);
        };

        let base = self.aggregator.lookup(key).await;
        if base.error.is_some() {
            return Extraction::Completed(base);
        }

        match gate.check(&base.key, policy).await {
            Ok(EligibilityVerdict::Eligible) => {
                Extraction::Completed(self.aggregator.collect(base).await)
            }
            Ok(EligibilityVerdict::Ineligible(reason)) => {
                info!("{} rejected: {reason}", base.key);
                Extraction::Rejected {
                    key: base.key,
                    reason: reason.to_string(),
                }
            }
            Err(e) => {
                info!("{} eligibility check failed: {e}", base.key);
                Extraction::CheckFailed {
                    key: base.key,
                    error: e.to_string(),
                }
            }
        }
    }
}

#[async_trait]
impl<S> JobHandler for Extractor<S>
where
    S: RepositorySource + ?Sized + 'static,
{
    async fn handle(&self, key: RepositoryKey) -> Extraction {
        self.extract(key).await
    }
}
