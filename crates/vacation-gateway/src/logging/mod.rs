//! Request correlation for structured logs

mod trace_context;

pub use trace_context::{generate_trace_id, TraceContext, UNTRACED};
