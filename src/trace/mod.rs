//! Human-readable explanations of why a row did or did not match.

mod formatter;

pub use formatter::TraceFormatter;
