//! Metrics collection and reporting using metrics-rs.
//!
//! The analysis records block counts and per-block ILP through the `metrics`
//! facade; the CLI installs [`CliRecorder`] to print them after the report.

use std::collections::HashMap;
use std::sync::Arc;

use ilp_analysis::BlockResult;
use metrics::{
    Counter, Gauge, Histogram, Key, KeyName, Metadata, Recorder, SharedString, Unit, counter,
    describe_counter, describe_histogram, histogram,
};
use parking_lot::RwLock;

// ============================================================================
// Metric descriptions
// ============================================================================

/// Initialize metric descriptions.
///
/// Call this once at startup to register metric descriptions.
pub fn init() {
    describe_counter!(
        "ilp_blocks_analyzed_total",
        Unit::Count,
        "Basic blocks analyzed"
    );
    describe_counter!(
        "ilp_blocks_skipped_total",
        Unit::Count,
        "Block events skipped because the host was only translating"
    );
    describe_counter!(
        "ilp_instructions_analyzed_total",
        Unit::Count,
        "Instructions in analyzed blocks"
    );
    describe_histogram!(
        "ilp_block_ilp",
        Unit::Count,
        "Per-block ILP distribution"
    );
}

// ============================================================================
// Metric recording functions
// ============================================================================

/// Record one analyzed block.
pub fn record_block(result: &BlockResult) {
    counter!("ilp_blocks_analyzed_total").increment(1);
    counter!("ilp_instructions_analyzed_total").increment(u64::from(result.instruction_count));
    if !result.is_empty() {
        histogram!("ilp_block_ilp").record(result.ilp());
    }
}

/// Record a block event that was skipped.
pub fn record_skipped() {
    counter!("ilp_blocks_skipped_total").increment(1);
}

// ============================================================================
// CLI Recorder for terminal output
// ============================================================================

/// Storage for counter values.
#[derive(Default)]
struct CounterStorage {
    values: RwLock<HashMap<String, u64>>,
}

/// Storage for histogram values.
#[derive(Default)]
struct HistogramStorage {
    values: RwLock<HashMap<String, Vec<f64>>>,
}

/// A simple counter handle for the CLI recorder.
struct CliCounter {
    key: String,
    storage: Arc<CounterStorage>,
}

impl metrics::CounterFn for CliCounter {
    fn increment(&self, value: u64) {
        let mut values = self.storage.values.write();
        *values.entry(self.key.clone()).or_insert(0) += value;
    }

    fn absolute(&self, value: u64) {
        let mut values = self.storage.values.write();
        values.insert(self.key.clone(), value);
    }
}

/// A simple histogram handle for the CLI recorder.
struct CliHistogram {
    key: String,
    storage: Arc<HistogramStorage>,
}

impl metrics::HistogramFn for CliHistogram {
    fn record(&self, value: f64) {
        let mut values = self.storage.values.write();
        values.entry(self.key.clone()).or_default().push(value);
    }
}

/// CLI recorder that keeps block counters and the ILP histogram in memory.
///
/// Gauges are not used by the analysis and are dropped.
pub struct CliRecorder {
    counters: Arc<CounterStorage>,
    histograms: Arc<HistogramStorage>,
}

impl CliRecorder {
    /// Create a new CLI recorder.
    pub fn new() -> Self {
        Self {
            counters: Arc::new(CounterStorage::default()),
            histograms: Arc::new(HistogramStorage::default()),
        }
    }

    /// Install this recorder as the global metrics recorder.
    ///
    /// Returns `None` if a global recorder is already installed.
    pub fn install(self) -> Option<CliRecorderHandle> {
        let handle = self.handle();
        metrics::set_global_recorder(self).ok()?;
        Some(handle)
    }

    fn handle(&self) -> CliRecorderHandle {
        CliRecorderHandle {
            counters: Arc::clone(&self.counters),
            histograms: Arc::clone(&self.histograms),
        }
    }
}

impl Default for CliRecorder {
    fn default() -> Self {
        Self::new()
    }
}

/// Flatten a metric key to `name` or `name{label=value,...}`.
fn key_to_string(key: &Key) -> String {
    let name = key.name();
    let labels = key.labels();
    if labels.len() == 0 {
        name.to_string()
    } else {
        let label_str: Vec<String> = labels
            .map(|l| format!("{}={}", l.key(), l.value()))
            .collect();
        format!("{}{{{}}}", name, label_str.join(","))
    }
}

impl Recorder for CliRecorder {
    fn describe_counter(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}
    fn describe_gauge(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}
    fn describe_histogram(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn register_counter(&self, key: &Key, _metadata: &Metadata<'_>) -> Counter {
        Counter::from_arc(Arc::new(CliCounter {
            key: key_to_string(key),
            storage: Arc::clone(&self.counters),
        }))
    }

    fn register_gauge(&self, _key: &Key, _metadata: &Metadata<'_>) -> Gauge {
        Gauge::noop()
    }

    fn register_histogram(&self, key: &Key, _metadata: &Metadata<'_>) -> Histogram {
        Histogram::from_arc(Arc::new(CliHistogram {
            key: key_to_string(key),
            storage: Arc::clone(&self.histograms),
        }))
    }
}

/// Handle for accessing recorded metrics after installing the CLI recorder.
pub struct CliRecorderHandle {
    counters: Arc<CounterStorage>,
    histograms: Arc<HistogramStorage>,
}

impl CliRecorderHandle {
    /// Get a counter value by key.
    pub fn get_counter(&self, key: &str) -> Option<u64> {
        self.counters.values.read().get(key).copied()
    }

    /// Get histogram values by key.
    pub fn get_histogram(&self, key: &str) -> Option<Vec<f64>> {
        self.histograms.values.read().get(key).cloned()
    }

    /// Render all collected metrics in a human-readable format.
    pub fn summary(&self) -> String {
        use std::fmt::Write;

        let counters = self.counters.values.read();
        let histograms = self.histograms.values.read();

        if counters.is_empty() && histograms.is_empty() {
            return "No metrics collected.\n".to_string();
        }

        let mut out = String::from("\n## Metrics Summary\n\n");

        if !counters.is_empty() {
            out.push_str("### Counters\n");
            let mut keys: Vec<_> = counters.keys().collect();
            keys.sort();
            for key in keys {
                let _ = writeln!(out, "  {}: {}", key, counters[key]);
            }
            out.push('\n');
        }

        if !histograms.is_empty() {
            out.push_str("### Histograms\n");
            let mut keys: Vec<_> = histograms.keys().collect();
            keys.sort();
            for key in keys {
                let values = &histograms[key];
                if values.is_empty() {
                    continue;
                }
                let min = values.iter().copied().fold(f64::INFINITY, f64::min);
                let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                #[allow(clippy::cast_precision_loss)]
                let avg = values.iter().sum::<f64>() / values.len() as f64;
                let _ = writeln!(
                    out,
                    "  {}: count={}, min={:.3}, max={:.3}, avg={:.3}",
                    key,
                    values.len(),
                    min,
                    max,
                    avg
                );
            }
            out.push('\n');
        }

        out
    }

    /// Print all collected metrics to stdout.
    pub fn print_summary(&self) {
        print!("{}", self.summary());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics::Label;

    #[test]
    fn test_key_to_string() {
        let key = Key::from_name("ilp_blocks_analyzed_total");
        assert_eq!(key_to_string(&key), "ilp_blocks_analyzed_total");

        let key = Key::from_parts("ilp_block_ilp", vec![Label::new("aliasing", "structural")]);
        assert_eq!(key_to_string(&key), "ilp_block_ilp{aliasing=structural}");
    }

    #[test]
    fn test_recording_through_local_recorder() {
        let recorder = CliRecorder::new();
        let handle = recorder.handle();
        metrics::with_local_recorder(&recorder, || {
            record_block(&BlockResult {
                instruction_count: 4,
                ilp_fixed: 2000,
            });
            record_block(&BlockResult::default());
            record_skipped();
        });

        assert_eq!(handle.get_counter("ilp_blocks_analyzed_total"), Some(2));
        assert_eq!(handle.get_counter("ilp_instructions_analyzed_total"), Some(4));
        assert_eq!(handle.get_counter("ilp_blocks_skipped_total"), Some(1));
        assert_eq!(handle.get_histogram("ilp_block_ilp"), Some(vec![2.0]));
    }

    #[test]
    fn test_summary_lists_counters_and_histograms() {
        let recorder = CliRecorder::new();
        let handle = recorder.handle();
        assert_eq!(handle.summary(), "No metrics collected.\n");

        metrics::with_local_recorder(&recorder, || {
            record_block(&BlockResult {
                instruction_count: 2,
                ilp_fixed: 1000,
            });
            record_block(&BlockResult {
                instruction_count: 3,
                ilp_fixed: 3000,
            });
            metrics::gauge!("ilp_unused").set(1.0);
        });

        let summary = handle.summary();
        assert!(summary.contains("  ilp_blocks_analyzed_total: 2\n"));
        assert!(summary.contains("  ilp_instructions_analyzed_total: 5\n"));
        assert!(summary.contains("  ilp_block_ilp: count=2, min=1.000, max=3.000, avg=2.000\n"));
        assert!(!summary.contains("Gauges"));
        assert!(!summary.contains("ilp_unused"));
    }
}
