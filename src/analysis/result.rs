//! Correlation result types

use std::fmt;

use serde::{Deserialize, Serialize};

use super::metadata::AnalysisMetadata;

/// One channel's view of a windowed match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationRecord {
    /// Channel index (0 or 1)
    pub channel: usize,

    /// Whether this channel had an onset on the matching hop
    pub had_onset: bool,

    /// This channel's most recent onset in seconds
    pub onset_time_s: f32,

    /// Filterbank quality of this channel's trigger on the matching hop
    /// (0 if the channel did not onset on that hop)
    pub quality: f32,

    /// This channel's onset minus the other channel's, in milliseconds
    pub diff_ms: f32,
}

impl fmt::Display for CorrelationRecord {
    /// Tab-separated: channel, onset flag, time (s), quality, diff (ms)
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{:.3}\t{:.3}\t{:.2}",
            self.channel,
            u8::from(self.had_onset),
            self.onset_time_s,
            self.quality,
            self.diff_ms
        )
    }
}

/// Final statistics for one channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelSummary {
    /// Channel index
    pub channel: usize,

    /// Hops consumed
    ///
    /// Channel 0 is stepped first, so when channel 1 ends first channel 0
    /// has taken one hop more than the run counted. That hop's onset shows
    /// up here and in the periodicity curve but not in the run's counters.
    pub hops_processed: u64,

    /// Onsets seen
    pub onset_count: u64,

    /// Hops that triggered filterbank accumulation
    pub trigger_count: u32,

    /// Strongest delay beyond the suppressed rows, in hops
    pub dominant_delay: Option<usize>,

    /// Strongest delay in milliseconds
    pub dominant_period_ms: Option<f32>,

    /// Final normalized periodicity curve, indexed by delay
    pub periodicity: Vec<f32>,
}

/// Complete result of a two-stream run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationReport {
    /// Hops on which both channels' latest onsets fell inside the window
    pub windowed: u64,

    /// Hops on which at least one channel had an onset
    pub total_onsets: u64,

    /// `100 * windowed / total_onsets`, 0 without onsets
    pub percent: f32,

    /// Run length in seconds, from channel 0's hop count and sample rate
    pub elapsed_s: f32,

    /// Lockstep hops completed
    pub hops: u64,

    /// Records of every windowed match, two per match
    pub records: Vec<CorrelationRecord>,

    /// Per-channel statistics
    pub channels: Vec<ChannelSummary>,

    /// Run metadata
    pub metadata: AnalysisMetadata,
}

impl CorrelationReport {
    /// The `# W/T (P%) onsets in S seconds` summary line
    pub fn summary_line(&self) -> String {
        format!(
            "# {}/{} ({}%) onsets in {} seconds",
            self.windowed, self.total_onsets, self.percent, self.elapsed_s
        )
    }
}

/// Windowed share of onset hops as a percentage, 0 when there are none
pub fn windowed_percent(windowed: u64, total: u64) -> f32 {
    if total == 0 {
        return 0.0;
    }
    (100.0 * windowed as f64 / total as f64) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_guards_zero_total() {
        assert_eq!(windowed_percent(0, 0), 0.0);
        assert_eq!(windowed_percent(1, 4), 25.0);
    }

    #[test]
    fn test_record_line() {
        let record = CorrelationRecord {
            channel: 1,
            had_onset: true,
            onset_time_s: 0.12,
            quality: 2.5,
            diff_ms: -20.0,
        };
        assert_eq!(record.to_string(), "1\t1\t0.120\t2.500\t-20.00");
    }

    #[test]
    fn test_summary_line() {
        let report = CorrelationReport {
            windowed: 3,
            total_onsets: 12,
            percent: 25.0,
            elapsed_s: 4.5,
            hops: 843,
            records: Vec::new(),
            channels: Vec::new(),
            metadata: AnalysisMetadata::default(),
        };
        assert_eq!(report.summary_line(), "# 3/12 (25%) onsets in 4.5 seconds");
    }

    #[test]
    fn test_report_serializes() {
        let report = CorrelationReport {
            windowed: 1,
            total_onsets: 1,
            percent: 100.0,
            elapsed_s: 0.5,
            hops: 10,
            records: vec![CorrelationRecord {
                channel: 0,
                had_onset: true,
                onset_time_s: 0.1,
                quality: 1.0,
                diff_ms: 20.0,
            }],
            channels: Vec::new(),
            metadata: AnalysisMetadata::default(),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["windowed"], 1);
        assert_eq!(json["records"][0]["diff_ms"], 20.0);
        assert_eq!(json["metadata"]["version"], env!("CARGO_PKG_VERSION"));
    }
}
