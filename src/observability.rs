//! Trace identity of a mint attempt
//!
//! One [`TraceContext`] is opened per `create_token` call. Pipeline stages
//! narrow it with [`TraceContext::stage`], which keeps the correlation id and
//! links the new span to the one it was opened from.

use crate::types::FeeOption;
use std::fmt;
use uuid::Uuid;

/// Id shared by every log line of one mint attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorrelationId(Uuid);

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct TraceContext {
    correlation_id: CorrelationId,
    span_id: Uuid,
    parent_span_id: Option<Uuid>,
    stage: &'static str,
    fee_option: FeeOption,
}

impl TraceContext {
    /// Root context of a mint attempt
    pub fn for_attempt(fee_option: FeeOption) -> Self {
        Self {
            correlation_id: CorrelationId(Uuid::new_v4()),
            span_id: Uuid::new_v4(),
            parent_span_id: None,
            stage: "create_token",
            fee_option,
        }
    }

    /// Context for a pipeline stage of the same attempt
    pub fn stage(&self, stage: &'static str) -> Self {
        Self {
            correlation_id: self.correlation_id,
            span_id: Uuid::new_v4(),
            parent_span_id: Some(self.span_id),
            stage,
            fee_option: self.fee_option,
        }
    }

    pub fn correlation_id(&self) -> CorrelationId {
        self.correlation_id
    }

    pub fn span_id(&self) -> Uuid {
        self.span_id
    }

    pub fn parent_span_id(&self) -> Option<Uuid> {
        self.parent_span_id
    }

    pub fn stage_name(&self) -> &'static str {
        self.stage
    }

    pub fn fee_option(&self) -> FeeOption {
        self.fee_option
    }
}
