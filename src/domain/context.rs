//! Operation context
//!
//! Cross-cutting metadata for a single request, threaded through for
//! logging only. It is not a domain concept and the aggregate never sees
//! it. Authorization and per-caller identity are explicitly out of scope, so
//! this carries just the correlation id.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Context for an operation, used for request-correlated tracing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<Uuid>,
}

impl OperationContext {
    pub fn new() -> Self {
        Self { correlation_id: None }
    }

    pub fn with_correlation_id(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }

    /// Generate a new correlation ID if not present.
    pub fn ensure_correlation_id(&mut self) -> Uuid {
        *self.correlation_id.get_or_insert_with(Uuid::new_v4)
    }
}

impl Default for OperationContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_correlation_id_is_stable_once_set() {
        let mut context = OperationContext::new();
        assert!(context.correlation_id.is_none());

        let id = context.ensure_correlation_id();
        assert_eq!(context.correlation_id, Some(id));

        let id2 = context.ensure_correlation_id();
        assert_eq!(id, id2);
    }
}
