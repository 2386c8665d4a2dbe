//! Lockstep correlation of two onset streams
//!
//! Both channels are advanced one hop at a time. On every hop where either
//! channel has an onset, the difference between the two channels' latest
//! onset timestamps is checked against a tolerance band:
//!
//! - `|diff| <= min`: the same event with jitter
//! - `min < |diff| < max`: a windowed match, reported once per channel
//! - `|diff| >= max`: unrelated events
//!
//! The run stops as soon as either channel runs out of hops.

use std::time::Instant;

use crate::analysis::metadata::AnalysisMetadata;
use crate::analysis::result::{
    windowed_percent, ChannelSummary, CorrelationRecord, CorrelationReport,
};
use crate::config::{AnalysisConfig, CorrelationWindow, DEFAULT_SUPPRESSED_ROWS, MAX_DELAY_HOPS};
use crate::error::AnalysisError;

use super::channel::ChannelTracker;
use super::history::PeriodicityImage;
use super::source::OnsetSource;

/// Result of one lockstep hop
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// Either channel ran out of hops; nothing was counted
    Ended,
    /// Both channels advanced
    Advanced {
        /// Records for channel 0 and channel 1 if this hop was a windowed match
        matched: Option<[CorrelationRecord; 2]>,
    },
}

/// Drives two [`ChannelTracker`]s in lockstep and counts windowed matches
#[derive(Debug)]
pub struct DualStreamCorrelator<A, B, const N: usize = MAX_DELAY_HOPS> {
    first: ChannelTracker<A, N>,
    second: ChannelTracker<B, N>,
    window: CorrelationWindow,
    suppressed_rows: usize,
    windowed: u64,
    total_onsets: u64,
    hops: u64,
    ended: bool,
}

impl<A: OnsetSource, B: OnsetSource, const N: usize> DualStreamCorrelator<A, B, N> {
    /// Pair two trackers
    ///
    /// # Errors
    ///
    /// `ConfigurationError` for an invalid window or channels whose sample
    /// rates or hop sizes differ.
    pub fn new(
        first: ChannelTracker<A, N>,
        second: ChannelTracker<B, N>,
        window: CorrelationWindow,
    ) -> Result<Self, AnalysisError> {
        window.validate()?;
        if first.sample_rate() != second.sample_rate() {
            return Err(AnalysisError::ConfigurationError(format!(
                "Sample rates differ: {} Hz vs {} Hz",
                first.sample_rate(),
                second.sample_rate()
            )));
        }
        if first.hop_size() != second.hop_size() {
            return Err(AnalysisError::ConfigurationError(format!(
                "Hop sizes differ: {} vs {} samples",
                first.hop_size(),
                second.hop_size()
            )));
        }

        Ok(Self {
            first,
            second,
            window,
            suppressed_rows: DEFAULT_SUPPRESSED_ROWS,
            windowed: 0,
            total_onsets: 0,
            hops: 0,
            ended: false,
        })
    }

    /// Build both trackers from sources and a full configuration
    ///
    /// # Errors
    ///
    /// `ConfigurationError` if the configuration or either source is invalid.
    pub fn from_config(
        first: A,
        second: B,
        config: &AnalysisConfig,
    ) -> Result<Self, AnalysisError> {
        config.validate_for_capacity(N)?;
        let [a, b] = &config.channels;
        let first = ChannelTracker::new(0, first, a.smoothing_window, config.image_width)?;
        let second = ChannelTracker::new(1, second, b.smoothing_window, config.image_width)?;
        Ok(Self::new(first, second, config.window)?.with_suppressed_rows(config.suppressed_rows))
    }

    /// Blank this many low delay rows in summaries and images
    pub fn with_suppressed_rows(mut self, rows: usize) -> Self {
        self.suppressed_rows = rows;
        self
    }

    /// Advance both channels by one hop
    ///
    /// Channel 0 is advanced first; if it has ended channel 1 is left as is.
    /// After the run has ended every call returns [`StepOutcome::Ended`].
    pub fn step(&mut self) -> Result<StepOutcome, AnalysisError> {
        if self.ended {
            return Ok(StepOutcome::Ended);
        }
        if !self.first.process_next_frame()? || !self.second.process_next_frame()? {
            self.ended = true;
            log::debug!("Correlation ended after {} hops", self.hops);
            return Ok(StepOutcome::Ended);
        }
        self.hops += 1;

        if !self.first.had_onset() && !self.second.had_onset() {
            return Ok(StepOutcome::Advanced { matched: None });
        }
        self.total_onsets += 1;

        // A timestamp means nothing until its channel has had an onset
        if !self.first.has_seen_onset() || !self.second.has_seen_onset() {
            return Ok(StepOutcome::Advanced { matched: None });
        }

        let diff = self.first.last_onset_ms() - self.second.last_onset_ms();
        if !self.window.contains(diff) {
            return Ok(StepOutcome::Advanced { matched: None });
        }
        self.windowed += 1;

        Ok(StepOutcome::Advanced {
            matched: Some([record(&self.first, diff), record(&self.second, -diff)]),
        })
    }

    /// Run to the end of the shorter stream, handing each record to `on_record`
    ///
    /// Returns the number of lockstep hops completed.
    pub fn run_with<F>(&mut self, mut on_record: F) -> Result<u64, AnalysisError>
    where
        F: FnMut(&CorrelationRecord),
    {
        while let StepOutcome::Advanced { matched } = self.step()? {
            if let Some(records) = matched {
                records.iter().for_each(&mut on_record);
            }
        }
        Ok(self.hops)
    }

    /// Run to the end and collect the full report
    pub fn run(&mut self) -> Result<CorrelationReport, AnalysisError> {
        let started = Instant::now();
        log::info!(
            "Correlating two streams at {} Hz, window ({}, {}) ms",
            self.first.sample_rate(),
            self.window.min_ms,
            self.window.max_ms
        );

        let mut records = Vec::new();
        self.run_with(|record| records.push(record.clone()))?;

        let metadata = AnalysisMetadata {
            processing_time_ms: started.elapsed().as_secs_f32() * 1000.0,
            ..AnalysisMetadata::default()
        };
        let report = self.report(records, metadata)?;
        log::info!(
            "{} of {} onset hops windowed ({:.1}%) over {:.2} s",
            report.windowed,
            report.total_onsets,
            report.percent,
            report.elapsed_s
        );
        Ok(report)
    }

    /// Report of the counters so far with the given records
    pub fn report(
        &self,
        records: Vec<CorrelationRecord>,
        metadata: AnalysisMetadata,
    ) -> Result<CorrelationReport, AnalysisError> {
        Ok(CorrelationReport {
            windowed: self.windowed,
            total_onsets: self.total_onsets,
            percent: self.percent(),
            elapsed_s: self.elapsed_s(),
            hops: self.hops,
            records,
            channels: self.summaries()?.to_vec(),
            metadata,
        })
    }

    /// Windowed matches so far
    pub fn windowed(&self) -> u64 {
        self.windowed
    }

    /// Hops with at least one onset so far
    pub fn total_onsets(&self) -> u64 {
        self.total_onsets
    }

    /// Lockstep hops completed
    pub fn hops(&self) -> u64 {
        self.hops
    }

    /// Whether either stream has ended
    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Windowed share of onset hops in percent
    pub fn percent(&self) -> f32 {
        windowed_percent(self.windowed, self.total_onsets)
    }

    /// Seconds covered by the completed hops, at channel 0's rate
    pub fn elapsed_s(&self) -> f32 {
        let rate = self.first.sample_rate();
        if rate == 0 {
            return 0.0;
        }
        (self.hops as f64 * self.first.hop_size() as f64 / rate as f64) as f32
    }

    /// Channel 0
    pub fn first(&self) -> &ChannelTracker<A, N> {
        &self.first
    }

    /// Channel 1
    pub fn second(&self) -> &ChannelTracker<B, N> {
        &self.second
    }

    /// Final statistics for both channels
    pub fn summaries(&self) -> Result<[ChannelSummary; 2], AnalysisError> {
        Ok([
            self.first.summary(self.suppressed_rows)?,
            self.second.summary(self.suppressed_rows)?,
        ])
    }

    /// Periodicity images for both channels
    pub fn render_histories(&self) -> [PeriodicityImage; 2] {
        [
            self.first.render_history(self.suppressed_rows),
            self.second.render_history(self.suppressed_rows),
        ]
    }
}

fn record<S: OnsetSource, const N: usize>(
    channel: &ChannelTracker<S, N>,
    diff_ms: f32,
) -> CorrelationRecord {
    CorrelationRecord {
        channel: channel.id(),
        had_onset: channel.had_onset(),
        onset_time_s: channel.last_onset_ms() / 1000.0,
        quality: channel.last_quality(),
        diff_ms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::source::OnsetTrack;

    type Correlator = DualStreamCorrelator<OnsetTrack, OnsetTrack, 64>;

    fn correlator(a: OnsetTrack, b: OnsetTrack) -> Correlator {
        let first = ChannelTracker::new(0, a, 3, 16).unwrap();
        let second = ChannelTracker::new(1, b, 3, 16).unwrap();
        DualStreamCorrelator::new(first, second, CorrelationWindow::default()).unwrap()
    }

    #[test]
    fn test_same_hop_match_flips_sign() {
        let a = OnsetTrack::from_events(vec![(2, 100.0)], 5, 48_000, 256);
        let b = OnsetTrack::from_events(vec![(2, 120.0)], 5, 48_000, 256);
        let mut correlator = correlator(a, b);

        assert_eq!(
            correlator.step().unwrap(),
            StepOutcome::Advanced { matched: None }
        );
        correlator.step().unwrap();
        let StepOutcome::Advanced {
            matched: Some([first, second]),
        } = correlator.step().unwrap()
        else {
            panic!("hop 2 should be a windowed match");
        };

        assert_eq!(first.channel, 0);
        assert_eq!(first.diff_ms, -20.0);
        assert_eq!(second.channel, 1);
        assert_eq!(second.diff_ms, 20.0);
        assert!(first.had_onset && second.had_onset);
        assert!((first.onset_time_s - 0.1).abs() < 1e-6);
        assert!((second.onset_time_s - 0.12).abs() < 1e-6);
        assert!(first.quality > 0.0);
    }

    #[test]
    fn test_counts_onset_hops_once() {
        // Hop 1: both onset, same time (jitter). Hop 3: only A. Hop 4: only B, 30 ms later.
        let a = OnsetTrack::from_events(vec![(1, 10.0), (3, 50.0)], 6, 48_000, 256);
        let b = OnsetTrack::from_events(vec![(1, 12.0), (4, 80.0)], 6, 48_000, 256);
        let mut correlator = correlator(a, b);

        let mut records = Vec::new();
        let hops = correlator.run_with(|r| records.push(r.clone())).unwrap();

        assert_eq!(hops, 6);
        assert_eq!(correlator.total_onsets(), 3);
        // Hop 3: 50 - 12 = 38 (windowed); hop 4: 50 - 80 = -30 (windowed)
        assert_eq!(correlator.windowed(), 2);
        assert_eq!(records.len(), 4);
        assert_eq!(records[0].diff_ms, 38.0);
        assert!(records[0].had_onset);
        assert!(!records[1].had_onset);
        assert_eq!(records[1].quality, 0.0);
        assert_eq!(records[2].diff_ms, -30.0);
        assert_eq!(records[3].diff_ms, 30.0);
        assert!((correlator.percent() - 66.666_67).abs() < 1e-3);
    }

    #[test]
    fn test_no_match_before_both_channels_onset() {
        let a = OnsetTrack::from_events(vec![(0, 25.0)], 3, 48_000, 256);
        let b = OnsetTrack::from_events(vec![], 3, 48_000, 256);
        let mut correlator = correlator(a, b);
        correlator.run_with(|_| panic!("no record expected")).unwrap();
        assert_eq!(correlator.total_onsets(), 1);
        assert_eq!(correlator.windowed(), 0);
    }

    #[test]
    fn test_stops_at_shorter_stream() {
        let a = OnsetTrack::from_hops(&[0, 10, 20], 30, 48_000, 256);
        let b = OnsetTrack::from_hops(&[0, 10, 20, 40], 50, 48_000, 256);
        let mut correlator = correlator(a, b);
        let report = correlator.run().unwrap();

        assert_eq!(report.hops, 30);
        assert_eq!(correlator.second().hops_processed(), 30);
        assert_eq!(report.total_onsets, 3);
        assert_eq!(report.windowed, 0);
        assert!((report.elapsed_s - 0.16).abs() < 1e-6);
        assert_eq!(correlator.step().unwrap(), StepOutcome::Ended);
        assert_eq!(report.channels.len(), 2);
    }

    #[test]
    fn test_first_channel_keeps_hop_taken_when_second_ends() {
        let a = OnsetTrack::from_hops(&[10, 50], 100, 48_000, 256);
        let b = OnsetTrack::from_hops(&[], 50, 48_000, 256);
        let report = correlator(a, b).run().unwrap();

        assert_eq!(report.hops, 50);
        assert_eq!(report.total_onsets, 1);
        assert_eq!(report.channels[0].hops_processed, 51);
        assert_eq!(report.channels[0].onset_count, 2);
        assert_eq!(report.channels[1].hops_processed, 50);
    }

    #[test]
    fn test_empty_run_reports_zero_percent() {
        let a = OnsetTrack::from_hops(&[], 10, 48_000, 256);
        let b = OnsetTrack::from_hops(&[], 10, 48_000, 256);
        let report = correlator(a, b).run().unwrap();
        assert_eq!(report.total_onsets, 0);
        assert_eq!(report.percent, 0.0);
        assert!(report.percent.is_finite());
    }

    #[test]
    fn test_rejects_mismatched_streams() {
        let first = ChannelTracker::<_, 64>::new(0, OnsetTrack::from_hops(&[], 4, 48_000, 256), 3, 4)
            .unwrap();
        let second = ChannelTracker::<_, 64>::new(1, OnsetTrack::from_hops(&[], 4, 44_100, 256), 3, 4)
            .unwrap();
        assert!(matches!(
            DualStreamCorrelator::new(first, second, CorrelationWindow::default()),
            Err(AnalysisError::ConfigurationError(_))
        ));

        let first = ChannelTracker::<_, 64>::new(0, OnsetTrack::from_hops(&[], 4, 48_000, 256), 3, 4)
            .unwrap();
        let second = ChannelTracker::<_, 64>::new(1, OnsetTrack::from_hops(&[], 4, 48_000, 512), 3, 4)
            .unwrap();
        assert!(DualStreamCorrelator::new(first, second, CorrelationWindow::default()).is_err());
    }

    #[test]
    fn test_from_config_validates() {
        let mut config = AnalysisConfig::default();
        config.channels[0].smoothing_window = 64;
        let a = OnsetTrack::from_hops(&[], 4, 48_000, 256);
        let b = OnsetTrack::from_hops(&[], 4, 48_000, 256);
        assert!(matches!(
            Correlator::from_config(a, b, &config),
            Err(AnalysisError::ConfigurationError(_))
        ));
    }
}
