//! Performance benchmarks for the per-hop correlation loop

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rhythm_coach::features::period::comb_filter::PeriodicityAccumulator;
use rhythm_coach::features::onset::OnsetDetector;
use rhythm_coach::io::sample_buffer::HopFramer;
use rhythm_coach::{correlate_sources, AnalysisConfig, DetectorSettings, OnsetTrack};

const MAX_DELAY: usize = rhythm_coach::config::MAX_DELAY_HOPS;

fn bench_comb_filter(c: &mut Criterion) {
    // One minute of hops at 48 kHz with an onset every 94 hops (~120 BPM)
    let intensities: Vec<u8> = (0..11_250).map(|h| u8::from(h % 94 == 0)).collect();

    c.bench_function("comb_filter_60s", |b| {
        b.iter(|| {
            let mut comb = PeriodicityAccumulator::<u32, u8, MAX_DELAY>::new();
            for &intensity in &intensities {
                black_box(comb.add_item(black_box(intensity)));
            }
            comb.trigger_count()
        });
    });
}

fn bench_correlate_tracks(c: &mut Criterion) {
    let hops = 11_250u64;
    let a_hops: Vec<u64> = (0..hops).step_by(94).collect();
    let b_events: Vec<(u64, f32)> = a_hops
        .iter()
        .map(|&h| (h + 4, (h + 4) as f32 * 5.333_333))
        .collect();
    let config = AnalysisConfig::default();

    c.bench_function("correlate_tracks_60s", |b| {
        b.iter(|| {
            let a = OnsetTrack::from_hops(&a_hops, hops, 48_000, 256);
            let b_track = OnsetTrack::from_events(b_events.clone(), hops, 48_000, 256);
            correlate_sources(black_box(a), black_box(b_track), &config)
        });
    });
}

fn bench_onset_detection(c: &mut Criterion) {
    // 10 seconds at 48 kHz with a click every 500 ms
    let samples: Vec<f32> = (0..48_000 * 10)
        .map(|i| {
            let t = (i % 24_000) as f32;
            if t < 512.0 {
                (-t / 80.0).exp() * (t * 0.7).sin() * 0.8
            } else {
                0.0
            }
        })
        .collect();
    let settings = DetectorSettings::default();

    c.bench_function("onset_detection_hfc_10s", |b| {
        b.iter(|| {
            let mut detector = OnsetDetector::new(&settings, 48_000).unwrap();
            let mut framer =
                HopFramer::new(samples.clone(), settings.hop_size, settings.window_size);
            let mut onsets = 0;
            while let Some(frame) = framer.next_frame() {
                if detector.process_hop(frame).is_some() {
                    onsets += 1;
                }
            }
            black_box(onsets)
        });
    });
}

criterion_group!(
    benches,
    bench_comb_filter,
    bench_correlate_tracks,
    bench_onset_detection
);
criterion_main!(benches);
