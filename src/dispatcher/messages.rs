//! Jobs posted to the UI-affine context.
//!
//! A [`UiJob`] is either a synchronous task or a future. Each job remembers
//! the OpenTelemetry context of the span it was posted from, so work executed
//! on the UI thread shows up under the caller's trace.

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;

/// Synchronous work for the UI context.
pub type UiTask = Box<dyn FnOnce() + Send + 'static>;

/// Distributed tracing context for cross-thread span propagation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceContext {
    /// OpenTelemetry trace ID as a hex string.
    pub trace_id: String,

    /// Span that posted the job.
    pub parent_span_id: String,
}

impl TraceContext {
    /// Captures the trace and span IDs of the current tracing span.
    ///
    /// Returns `None` when no OpenTelemetry layer is installed or the span is
    /// not sampled.
    pub fn from_current() -> Option<Self> {
        use opentelemetry::trace::TraceContextExt;
        use tracing_opentelemetry::OpenTelemetrySpanExt;

        let otel_context = tracing::Span::current().context();
        let span_ref = otel_context.span();
        let span_context = span_ref.span_context();

        span_context.is_valid().then(|| Self {
            trace_id: format!("{:032x}", span_context.trace_id()),
            parent_span_id: format!("{:016x}", span_context.span_id()),
        })
    }

    /// Creates a `ui_job` span whose parent is the captured remote span.
    ///
    /// Unparseable IDs leave the span unparented.
    pub fn job_span(context: Option<&Self>, kind: &'static str) -> tracing::Span {
        use opentelemetry::trace::{SpanContext, SpanId, TraceContextExt, TraceFlags, TraceId, TraceState};
        use tracing_opentelemetry::OpenTelemetrySpanExt;

        let span = tracing::debug_span!("ui_job", job_kind = kind);

        let remote = context.and_then(|ctx| {
            let trace_id = TraceId::from_hex(&ctx.trace_id).ok()?;
            let span_id = SpanId::from_hex(&ctx.parent_span_id).ok()?;
            Some(SpanContext::new(trace_id, span_id, TraceFlags::SAMPLED, true, TraceState::default()))
        });

        if let Some(remote) = remote {
            span.set_parent(opentelemetry::Context::new().with_remote_span_context(remote));
        }

        span
    }
}

/// Unit of work for the UI-affine context.
pub enum UiJob {
    /// Runs to completion when dequeued.
    Task {
        /// The work.
        task: UiTask,
        /// Span context of the poster.
        trace_context: Option<TraceContext>,
    },

    /// Polled on the UI context until it completes.
    Future {
        /// The work.
        future: BoxFuture<'static, ()>,
        /// Span context of the poster.
        trace_context: Option<TraceContext>,
    },
}

impl UiJob {
    /// Wraps a closure, capturing the current trace context.
    pub fn task(task: impl FnOnce() + Send + 'static) -> Self {
        Self::Task {
            task: Box::new(task),
            trace_context: TraceContext::from_current(),
        }
    }

    /// Wraps a future, capturing the current trace context.
    pub fn future(future: impl Future<Output = ()> + Send + 'static) -> Self {
        Self::Future {
            future: Box::pin(future),
            trace_context: TraceContext::from_current(),
        }
    }

    /// `"task"` or `"future"`.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Task { .. } => "task",
            Self::Future { .. } => "future",
        }
    }
}

impl fmt::Debug for UiJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let trace_context = match self {
            Self::Task { trace_context, .. } | Self::Future { trace_context, .. } => trace_context,
        };
        f.debug_struct("UiJob")
            .field("kind", &self.kind())
            .field("trace_context", trace_context)
            .finish_non_exhaustive()
    }
}
