//! Local (in-process) client for the ZPA policy module.

use std::sync::Arc;

use async_trait::async_trait;
use zpa_policy_sdk::{
    DetachOutcome, DetachRequest, ObservedRuleOrder, PolicyRulesClient, PolicyRulesError,
    RuleOrderRequest,
};

use super::{DomainError, Service};

/// Local client wrapping the service.
pub struct ZpaPolicyLocalClient {
    svc: Arc<Service>,
}

impl ZpaPolicyLocalClient {
    #[must_use]
    pub fn new(svc: Arc<Service>) -> Self {
        Self { svc }
    }
}

fn log_and_convert(op: &str, e: DomainError) -> PolicyRulesError {
    if e.is_declaration_error() {
        tracing::warn!(operation = op, error = %e, "zpa_policy call rejected");
    } else {
        tracing::error!(operation = op, error = ?e, "zpa_policy call failed");
    }
    e.into()
}

#[async_trait]
impl PolicyRulesClient for ZpaPolicyLocalClient {
    async fn reorder(
        &self,
        request: RuleOrderRequest,
    ) -> Result<ObservedRuleOrder, PolicyRulesError> {
        self.svc
            .reorder(request)
            .await
            .map_err(|e| log_and_convert("reorder", e))
    }

    async fn read_order(
        &self,
        request: RuleOrderRequest,
    ) -> Result<ObservedRuleOrder, PolicyRulesError> {
        self.svc
            .read_order(request)
            .await
            .map_err(|e| log_and_convert("read_order", e))
    }

    async fn detach_object(
        &self,
        request: DetachRequest,
    ) -> Result<DetachOutcome, PolicyRulesError> {
        self.svc
            .detach_object(request)
            .await
            .map_err(|e| log_and_convert("detach_object", e))
    }
}
