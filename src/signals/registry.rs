//! Boot-time sensor discovery and the active signal set.
//!
//! Discovery runs once: every configured candidate source gets one trial
//! read, and a channel joins the active set only if that trial value is
//! valid (finite — the drivers return NaN for rail values and bus
//! failures). A signal that fails discovery stays absent until the next
//! boot; there is no re-probe.

use log::{info, warn};

use super::aggregate::{SignalAggregator, SignalSnapshot};
use super::{Reading, SampleStamp, SignalKind, SignalSource};
use crate::config::SystemConfig;

/// One discovered signal bound to its statistics aggregator.
pub struct ActiveSignal {
    pub kind: SignalKind,
    pub aggregator: SignalAggregator,
}

/// A surviving source with the subset of its channels that probed valid.
struct BoundSource {
    source: Box<dyn SignalSource>,
    signals: Vec<ActiveSignal>,
}

/// Owns the active signal set for the lifetime of a boot cycle.
pub struct SensorRegistry {
    sources: Vec<BoundSource>,
}

impl SensorRegistry {
    /// Probe every candidate once and keep what answered.
    pub fn discover(
        candidates: Vec<Box<dyn SignalSource>>,
        config: &SystemConfig,
    ) -> Self {
        let mut sources = Vec::new();

        for mut source in candidates {
            let trial = source.probe();
            let mut signals = Vec::new();

            for sample in &trial {
                if sample.value.is_finite() {
                    info!(
                        "discovery: {} -> {} present ({:.1} {})",
                        source.family(),
                        sample.kind.as_str(),
                        sample.value,
                        sample.kind.unit(),
                    );
                    signals.push(ActiveSignal {
                        kind: sample.kind,
                        aggregator: SignalAggregator::from_config(config),
                    });
                } else {
                    warn!(
                        "discovery: {} -> {} absent, excluded for this boot",
                        source.family(),
                        sample.kind.as_str(),
                    );
                }
            }

            if signals.is_empty() {
                warn!("discovery: {} has no valid channel, dropped", source.family());
                continue;
            }
            sources.push(BoundSource { source, signals });
        }

        info!(
            "discovery complete: {} source(s), {} signal(s) active",
            sources.len(),
            sources.iter().map(|s| s.signals.len()).sum::<usize>(),
        );
        Self { sources }
    }

    /// Number of active signals across all sources.
    pub fn signal_count(&self) -> usize {
        self.sources.iter().map(|s| s.signals.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Active signal kinds, in discovery order.
    pub fn active_kinds(&self) -> Vec<SignalKind> {
        self.sources
            .iter()
            .flat_map(|s| s.signals.iter().map(|a| a.kind))
            .collect()
    }

    /// One physical read per source; valid channel values are folded into
    /// the bound aggregators, invalid ones dropped until the next tick.
    pub(crate) fn pull_and_ingest(&mut self, stamp: SampleStamp) {
        for bound in &mut self.sources {
            let samples = bound.source.sample();
            for sample in &samples {
                let Some(active) = bound
                    .signals
                    .iter_mut()
                    .find(|a| a.kind == sample.kind)
                else {
                    continue; // channel failed discovery; stays excluded
                };
                active.aggregator.ingest(Reading {
                    value: sample.value,
                    mono_ms: stamp.mono_ms,
                    epoch_secs: stamp.epoch_secs,
                });
            }
        }
    }

    /// Statistics snapshot of every active signal, in discovery order.
    pub fn snapshots(&self) -> Vec<(SignalKind, SignalSnapshot)> {
        self.sources
            .iter()
            .flat_map(|s| {
                s.signals
                    .iter()
                    .map(|a| (a.kind, a.aggregator.snapshot()))
            })
            .collect()
    }
}
