//! Per-hop onset sources feeding a [`ChannelTracker`](super::channel::ChannelTracker)

use crate::config::DetectorSettings;
use crate::error::AnalysisError;
use crate::features::onset::OnsetDetector;
use crate::io::decoder::DecodedAudio;
use crate::io::sample_buffer::HopFramer;

/// A stream of hops, each carrying an onset flag and the latest onset time
pub trait OnsetSource {
    /// Move to the next hop; false at end of stream
    fn advance(&mut self) -> bool;

    /// Whether the current hop carried an onset
    fn had_onset(&self) -> bool;

    /// Timestamp of the most recent onset in milliseconds
    ///
    /// Only meaningful once [`OnsetSource::had_onset`] has been true at
    /// least once; 0 before that.
    fn last_onset_ms(&self) -> f32;

    /// Total hops in the stream, 0 if unknown
    fn total_hops(&self) -> u64;

    /// Sample rate of the underlying audio in Hz
    fn sample_rate(&self) -> u32;

    /// Hop size in samples
    fn hop_size(&self) -> usize;

    /// Duration of one hop in milliseconds
    fn hop_ms(&self) -> f32 {
        if self.sample_rate() == 0 {
            return 0.0;
        }
        self.hop_size() as f32 * 1000.0 / self.sample_rate() as f32
    }
}

impl<S: OnsetSource + ?Sized> OnsetSource for Box<S> {
    fn advance(&mut self) -> bool {
        (**self).advance()
    }

    fn had_onset(&self) -> bool {
        (**self).had_onset()
    }

    fn last_onset_ms(&self) -> f32 {
        (**self).last_onset_ms()
    }

    fn total_hops(&self) -> u64 {
        (**self).total_hops()
    }

    fn sample_rate(&self) -> u32 {
        (**self).sample_rate()
    }

    fn hop_size(&self) -> usize {
        (**self).hop_size()
    }
}

/// Replays a fixed list of onset events
///
/// Events are `(hop, timestamp_ms)` pairs. Several events on one hop
/// collapse into a single onset carrying the last timestamp.
#[derive(Debug, Clone)]
pub struct OnsetTrack {
    events: Vec<(u64, f32)>,
    hops: u64,
    sample_rate: u32,
    hop_size: usize,
    next_event: usize,
    next_hop: u64,
    had_onset: bool,
    last_onset_ms: f32,
    report_length: bool,
}

impl OnsetTrack {
    /// Track of `hops` hops with onsets at the given events
    pub fn from_events(
        mut events: Vec<(u64, f32)>,
        hops: u64,
        sample_rate: u32,
        hop_size: usize,
    ) -> Self {
        events.sort_by_key(|&(hop, _)| hop);
        Self {
            events,
            hops,
            sample_rate,
            hop_size,
            next_event: 0,
            next_hop: 0,
            had_onset: false,
            last_onset_ms: 0.0,
            report_length: true,
        }
    }

    /// Track with onsets at the given hops, timestamped at the hop start
    pub fn from_hops(onset_hops: &[u64], hops: u64, sample_rate: u32, hop_size: usize) -> Self {
        let hop_ms = if sample_rate == 0 {
            0.0
        } else {
            hop_size as f64 * 1000.0 / sample_rate as f64
        };
        let events = onset_hops
            .iter()
            .map(|&hop| (hop, (hop as f64 * hop_ms) as f32))
            .collect();
        Self::from_events(events, hops, sample_rate, hop_size)
    }

    /// Hide the stream length, so [`OnsetSource::total_hops`] reports 0
    pub fn with_unknown_length(mut self) -> Self {
        self.report_length = false;
        self
    }
}

impl OnsetSource for OnsetTrack {
    fn advance(&mut self) -> bool {
        if self.next_hop >= self.hops {
            self.had_onset = false;
            return false;
        }
        let hop = self.next_hop;
        self.next_hop += 1;

        // Skip events placed before the current hop
        while self
            .events
            .get(self.next_event)
            .is_some_and(|&(event_hop, _)| event_hop < hop)
        {
            self.next_event += 1;
        }

        self.had_onset = false;
        while let Some(&(event_hop, ms)) = self.events.get(self.next_event) {
            if event_hop != hop {
                break;
            }
            self.had_onset = true;
            self.last_onset_ms = ms;
            self.next_event += 1;
        }
        true
    }

    fn had_onset(&self) -> bool {
        self.had_onset
    }

    fn last_onset_ms(&self) -> f32 {
        self.last_onset_ms
    }

    fn total_hops(&self) -> u64 {
        if self.report_length {
            self.hops
        } else {
            0
        }
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn hop_size(&self) -> usize {
        self.hop_size
    }
}

/// Runs the streaming onset detector over decoded audio, one hop per advance
#[derive(Debug)]
pub struct DetectedOnsetSource {
    framer: HopFramer,
    detector: OnsetDetector,
    sample_rate: u32,
    hop_size: usize,
    hop_ms: f64,
    had_onset: bool,
    last_onset_ms: f32,
}

impl DetectedOnsetSource {
    /// Build a source over mono `samples` at `sample_rate`
    ///
    /// # Errors
    ///
    /// `ConfigurationError` for invalid detector settings or a zero sample rate.
    pub fn new(
        samples: Vec<f32>,
        sample_rate: u32,
        settings: &DetectorSettings,
    ) -> Result<Self, AnalysisError> {
        let detector = OnsetDetector::new(settings, sample_rate)?;
        let framer = HopFramer::new(samples, settings.hop_size, settings.window_size);

        if framer.total_hops() == 0 {
            log::warn!(
                "Input shorter than one hop ({} samples), no frames to analyze",
                settings.hop_size
            );
        }

        Ok(Self {
            framer,
            detector,
            sample_rate,
            hop_size: settings.hop_size,
            hop_ms: settings.hop_size as f64 * 1000.0 / sample_rate as f64,
            had_onset: false,
            last_onset_ms: 0.0,
        })
    }

    /// Build a source over decoded audio
    pub fn from_decoded(
        audio: DecodedAudio,
        settings: &DetectorSettings,
    ) -> Result<Self, AnalysisError> {
        Self::new(audio.samples, audio.sample_rate, settings)
    }
}

impl OnsetSource for DetectedOnsetSource {
    fn advance(&mut self) -> bool {
        let Some(frame) = self.framer.next_frame() else {
            self.had_onset = false;
            return false;
        };

        match self.detector.process_hop(frame) {
            Some(hop) => {
                self.had_onset = true;
                self.last_onset_ms = (hop as f64 * self.hop_ms) as f32;
            }
            None => self.had_onset = false,
        }
        true
    }

    fn had_onset(&self) -> bool {
        self.had_onset
    }

    fn last_onset_ms(&self) -> f32 {
        self.last_onset_ms
    }

    fn total_hops(&self) -> u64 {
        self.framer.total_hops() as u64
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn hop_size(&self) -> usize {
        self.hop_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain<S: OnsetSource>(source: &mut S) -> Vec<(bool, f32)> {
        let mut hops = Vec::new();
        while source.advance() {
            hops.push((source.had_onset(), source.last_onset_ms()));
        }
        hops
    }

    #[test]
    fn test_track_replays_events() {
        let mut track = OnsetTrack::from_events(vec![(3, 30.0), (1, 10.0)], 5, 48_000, 256);
        let hops = drain(&mut track);
        assert_eq!(
            hops,
            vec![
                (false, 0.0),
                (true, 10.0),
                (false, 10.0),
                (true, 30.0),
                (false, 30.0),
            ]
        );
        assert!(!track.advance(), "end of stream is sticky");
    }

    #[test]
    fn test_track_collapses_same_hop_events() {
        let mut track = OnsetTrack::from_events(vec![(0, 1.0), (0, 2.0)], 2, 48_000, 256);
        assert!(track.advance());
        assert!(track.had_onset());
        assert_eq!(track.last_onset_ms(), 2.0);
        assert!(track.advance());
        assert!(!track.had_onset());
    }

    #[test]
    fn test_track_from_hops_timestamps() {
        let mut track = OnsetTrack::from_hops(&[0, 3], 4, 48_000, 256);
        let hops = drain(&mut track);
        assert!(hops[3].0);
        assert!((hops[3].1 - 16.0).abs() < 1e-4, "3 hops of 256 @ 48k = 16 ms");
        assert!((track.hop_ms() - 5.333_333).abs() < 1e-4);
    }

    #[test]
    fn test_track_unknown_length() {
        let mut track = OnsetTrack::from_hops(&[1], 3, 48_000, 256).with_unknown_length();
        assert_eq!(track.total_hops(), 0);
        assert_eq!(drain(&mut track).len(), 3);
    }

    #[test]
    fn test_detected_source_on_click_track() {
        let settings = DetectorSettings::default();
        let sample_rate = 48_000;
        let period = 40 * settings.hop_size;
        let mut samples = vec![0.0f32; period * 10];
        for start in (period..samples.len()).step_by(period) {
            for i in 0..512.min(samples.len() - start) {
                samples[start + i] = (-(i as f32) / 80.0).exp() * (i as f32 * 0.7).sin() * 0.8;
            }
        }

        let mut source = DetectedOnsetSource::new(samples, sample_rate, &settings).unwrap();
        assert_eq!(source.total_hops(), 400);

        let hops = drain(&mut source);
        assert_eq!(hops.len(), 400);
        let onsets: Vec<f32> = hops.iter().filter(|h| h.0).map(|h| h.1).collect();
        assert!(
            (8..=10).contains(&onsets.len()),
            "expected ~9 onsets, got {:?}",
            onsets
        );
        // Each click lands within a couple of hops of its true position
        for ms in onsets {
            let clicks = ms / (40.0 * 256.0 * 1000.0 / 48_000.0);
            assert!((clicks - clicks.round()).abs() < 0.1, "onset at {} ms", ms);
        }
    }

    #[test]
    fn test_detected_source_rejects_zero_rate() {
        assert!(DetectedOnsetSource::new(vec![0.0; 1024], 0, &DetectorSettings::default()).is_err());
    }
}
