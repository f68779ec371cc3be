//! Assessment telemetry collectors
//!
//! Both collectors are fed synchronously from UI event callbacks and only
//! append to in-memory buffers. They are finalized into summary structures
//! when the user advances or submits.

pub mod latency;
pub mod typing;

pub use latency::ChoiceLatencyTracker;
pub use typing::{KeyKind, KeyStroke, TypingMetricsCollector};

/// Population mean and standard deviation; `None` for an empty slice
pub(crate) fn mean_and_std_dev(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    Some((mean, variance.sqrt()))
}
