//! Per-stream tracker: onset state, comb filterbank and history snapshots

use crate::analysis::result::ChannelSummary;
use crate::config::{validate_smoothing_window, MAX_DELAY_HOPS};
use crate::error::AnalysisError;
use crate::features::period::comb_filter::PeriodicityAccumulator;
use crate::features::period::{dominant_delay, refine_delay};

use super::history::{HistoryColumn, HistoryTable, PeriodicityImage};
use super::source::OnsetSource;

/// Lifecycle of a [`ChannelTracker`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TrackerState {
    /// Frames are still being consumed
    Streaming,
    /// The source reported end of stream
    Ended,
}

/// Drives one onset source through a comb filterbank of `N` delays
///
/// Each hop feeds the onset flag into the filterbank as a one-event
/// intensity. Every `stride` hops the smoothed periodicity curve is copied
/// into a fixed-width [`HistoryTable`] for rendering.
#[derive(Debug)]
pub struct ChannelTracker<S, const N: usize = MAX_DELAY_HOPS> {
    id: usize,
    source: S,
    comb: PeriodicityAccumulator<u32, u8, N>,
    smoothing_window: usize,
    history: HistoryTable,
    smoothed: [f32; N],
    state: TrackerState,
    had_onset: bool,
    last_onset_ms: f32,
    seen_onset: bool,
    hops_since_onset: u64,
    hops: u64,
    onsets: u64,
    last_quality: f32,
}

impl<S: OnsetSource, const N: usize> ChannelTracker<S, N> {
    /// Create a tracker for channel `id`
    ///
    /// The history stride is taken from the source's stream length up front.
    ///
    /// # Errors
    ///
    /// `ConfigurationError` if the smoothing window does not fit in `N`
    /// delays, or the source reports a zero sample rate or hop size.
    pub fn new(
        id: usize,
        source: S,
        smoothing_window: usize,
        image_width: usize,
    ) -> Result<Self, AnalysisError> {
        validate_smoothing_window(smoothing_window, N)?;
        if source.sample_rate() == 0 {
            return Err(AnalysisError::ConfigurationError(format!(
                "Channel {}: invalid sample rate 0",
                id
            )));
        }
        if source.hop_size() == 0 {
            return Err(AnalysisError::ConfigurationError(format!(
                "Channel {}: invalid hop size 0",
                id
            )));
        }
        if image_width == 0 {
            return Err(AnalysisError::ConfigurationError(
                "Image width must be > 0".to_string(),
            ));
        }

        let history = HistoryTable::new(image_width, source.total_hops());
        log::debug!(
            "Channel {}: {} hops, {} Hz, hop {} samples, history stride {}",
            id,
            source.total_hops(),
            source.sample_rate(),
            source.hop_size(),
            history.stride()
        );

        Ok(Self {
            id,
            source,
            comb: PeriodicityAccumulator::new(),
            smoothing_window,
            history,
            smoothed: [0.0; N],
            state: TrackerState::Streaming,
            had_onset: false,
            last_onset_ms: 0.0,
            seen_onset: false,
            hops_since_onset: 0,
            hops: 0,
            onsets: 0,
            last_quality: 0.0,
        })
    }

    /// Consume the next hop from the source
    ///
    /// Returns `Ok(false)` when the source is exhausted; the tracker is then
    /// ended.
    ///
    /// # Errors
    ///
    /// `ProcessingError` if called after the tracker has ended.
    pub fn process_next_frame(&mut self) -> Result<bool, AnalysisError> {
        if self.state == TrackerState::Ended {
            return Err(AnalysisError::ProcessingError(format!(
                "Channel {}: frame requested after end of stream",
                self.id
            )));
        }

        if !self.source.advance() {
            self.state = TrackerState::Ended;
            self.had_onset = false;
            self.last_quality = 0.0;
            log::debug!(
                "Channel {}: end of stream after {} hops, {} onsets",
                self.id,
                self.hops,
                self.onsets
            );
            return Ok(false);
        }

        self.had_onset = self.source.had_onset();
        if self.had_onset {
            self.last_onset_ms = self.source.last_onset_ms();
            self.seen_onset = true;
            self.hops_since_onset = 0;
            self.onsets += 1;
        } else {
            self.hops_since_onset += 1;
        }

        self.last_quality = self.comb.add_item(u8::from(self.had_onset));

        if self.history.wants_snapshot(self.hops) {
            self.comb.smooth(&mut self.smoothed, self.smoothing_window)?;
            self.history.push(HistoryColumn {
                smoothed: self.smoothed.to_vec(),
                trigger_count: self.comb.trigger_count(),
            });
        }

        self.hops += 1;
        Ok(true)
    }

    /// Channel index
    pub fn id(&self) -> usize {
        self.id
    }

    /// Whether the source has been exhausted
    pub fn is_ended(&self) -> bool {
        self.state == TrackerState::Ended
    }

    /// Whether the last processed hop carried an onset
    pub fn had_onset(&self) -> bool {
        self.had_onset
    }

    /// Most recent onset timestamp in milliseconds, 0 before the first onset
    pub fn last_onset_ms(&self) -> f32 {
        self.last_onset_ms
    }

    /// Whether any onset has been seen yet
    pub fn has_seen_onset(&self) -> bool {
        self.seen_onset
    }

    /// Hops since the most recent onset
    pub fn hops_since_onset(&self) -> u64 {
        self.hops_since_onset
    }

    /// Hops processed
    pub fn hops_processed(&self) -> u64 {
        self.hops
    }

    /// Onsets seen
    pub fn onset_count(&self) -> u64 {
        self.onsets
    }

    /// Quality returned by the filterbank for the last hop, 0 without an onset
    pub fn last_quality(&self) -> f32 {
        self.last_quality
    }

    /// Sample rate of the source
    pub fn sample_rate(&self) -> u32 {
        self.source.sample_rate()
    }

    /// Hop size of the source in samples
    pub fn hop_size(&self) -> usize {
        self.source.hop_size()
    }

    /// Duration of one hop in milliseconds
    pub fn hop_ms(&self) -> f32 {
        self.source.hop_ms()
    }

    /// The comb filterbank
    pub fn accumulator(&self) -> &PeriodicityAccumulator<u32, u8, N> {
        &self.comb
    }

    /// Snapshot table
    pub fn history(&self) -> &HistoryTable {
        &self.history
    }

    /// Render the history table with the lowest `suppressed_rows` delays blanked
    pub fn render_history(&self, suppressed_rows: usize) -> PeriodicityImage {
        self.history.render(N, suppressed_rows)
    }

    /// Final statistics for this channel
    ///
    /// The dominant delay is the peak of the smoothed curve, the same one the
    /// history image shows, refined to a fractional delay over the raw
    /// curve. A hop taken by this channel after the other one ended is
    /// included here but not in the run's counters.
    ///
    /// # Errors
    ///
    /// `ConfigurationError` if the smoothing window does not fit in `N` delays.
    pub fn summary(&self, suppressed_rows: usize) -> Result<ChannelSummary, AnalysisError> {
        let periodicity = self.comb.normalized();
        let mut smoothed = [0.0f32; N];
        self.comb.smooth(&mut smoothed, self.smoothing_window)?;

        let period = dominant_delay(&smoothed, suppressed_rows).map(|peak| {
            refine_delay(&periodicity, peak.delay, self.smoothing_window, suppressed_rows)
        });
        let hop_ms = self.hop_ms();

        Ok(ChannelSummary {
            channel: self.id,
            hops_processed: self.hops,
            onset_count: self.onsets,
            trigger_count: self.comb.trigger_count(),
            dominant_delay: period.map(|d| d.round() as usize),
            dominant_period_ms: period.map(|d| d * hop_ms),
            periodicity,
        })
    }
}
