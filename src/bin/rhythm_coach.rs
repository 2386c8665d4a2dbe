//! Compare the rhythm of two recordings
//!
//! Prints one tab-separated line per channel for every windowed match
//! (channel, onset flag, onset time in s, quality, diff in ms) followed by a
//! `# W/T (P%) onsets in S seconds` summary, or the whole report as JSON.
//!
//! Detector options apply to both recordings unless a `-b` variant overrides
//! them for the second one. The effective settings of each recording are
//! printed to stderr before processing.

use std::path::PathBuf;

use clap::Parser;
use rhythm_coach::config::DEFAULT_MIN_IOI_MS;
use rhythm_coach::{
    analyze_files, AnalysisConfig, ChannelConfig, CorrelationWindow, DetectorSettings,
    OnsetMethod,
};

#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
struct Args {
    /// First recording
    #[arg(value_name = "INPUT_A")]
    input_a: PathBuf,

    /// Second recording
    #[arg(value_name = "INPUT_B")]
    input_b: PathBuf,

    /// Hop size in samples
    #[arg(short = 'f', long, default_value_t = 256)]
    hop_size: usize,

    /// Analysis window in samples
    #[arg(short = 'w', long, default_value_t = 1024)]
    window_size: usize,

    /// Minimum inter-onset interval in ms
    #[arg(short = 'i', long, default_value_t = DEFAULT_MIN_IOI_MS)]
    minioi: f32,

    /// Silence gate in dBFS
    #[arg(short = 's', long, default_value_t = -90.0, allow_hyphen_values = true)]
    silence: f32,

    /// Peak-picking threshold
    #[arg(short = 't', long, default_value_t = 0.3)]
    threshold: f32,

    /// Log compression lambda (0 = off)
    #[arg(short = 'c', long, default_value_t = 0.0)]
    compression: f32,

    /// Onset method: default|hfc|energy|specflux
    #[arg(short = 'm', long, default_value = "default", value_parser = parse_method)]
    method: OnsetMethod,

    /// Moving-average width over delays for the periodicity images
    #[arg(short = 'x', long, default_value_t = 11)]
    smoothing: usize,

    /// Smallest onset difference counted as a match, in ms
    #[arg(long, default_value_t = 10.0)]
    min_window: f32,

    /// Largest onset difference counted as a match, in ms
    #[arg(long, default_value_t = 40.0)]
    max_window: f32,

    /// Analysis window in samples for the second recording
    #[arg(long)]
    window_size_b: Option<usize>,

    /// Minimum inter-onset interval in ms for the second recording
    #[arg(long)]
    minioi_b: Option<f32>,

    /// Silence gate in dBFS for the second recording
    #[arg(long, allow_hyphen_values = true)]
    silence_b: Option<f32>,

    /// Peak-picking threshold for the second recording
    #[arg(long)]
    threshold_b: Option<f32>,

    /// Log compression lambda for the second recording
    #[arg(long)]
    compression_b: Option<f32>,

    /// Onset method for the second recording
    #[arg(long, value_parser = parse_method)]
    method_b: Option<OnsetMethod>,

    /// Periodicity smoothing width for the second recording
    #[arg(long)]
    smoothing_b: Option<usize>,

    /// PNG output for the first recording's periodicity history
    #[arg(long)]
    image_a: Option<PathBuf>,

    /// PNG output for the second recording's periodicity history
    #[arg(long)]
    image_b: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long, default_value_t = false)]
    json: bool,
}

fn parse_method(s: &str) -> Result<OnsetMethod, String> {
    s.parse().map_err(|e: rhythm_coach::AnalysisError| e.to_string())
}

impl Args {
    fn config(&self) -> Result<AnalysisConfig, rhythm_coach::AnalysisError> {
        // Hop size stays shared: the correlator steps both streams in lockstep
        let first = ChannelConfig {
            detector: DetectorSettings {
                hop_size: self.hop_size,
                window_size: self.window_size,
                minioi_ms: self.minioi,
                silence_db: self.silence,
                threshold: self.threshold,
                compression: self.compression,
                method: self.method,
            },
            smoothing_window: self.smoothing,
            image_path: self.image_a.clone(),
        };
        let second = ChannelConfig {
            detector: DetectorSettings {
                hop_size: self.hop_size,
                window_size: self.window_size_b.unwrap_or(self.window_size),
                minioi_ms: self.minioi_b.unwrap_or(self.minioi),
                silence_db: self.silence_b.unwrap_or(self.silence),
                threshold: self.threshold_b.unwrap_or(self.threshold),
                compression: self.compression_b.unwrap_or(self.compression),
                method: self.method_b.unwrap_or(self.method),
            },
            smoothing_window: self.smoothing_b.unwrap_or(self.smoothing),
            image_path: self.image_b.clone(),
        };

        let config = AnalysisConfig {
            channels: [first, second],
            window: CorrelationWindow::new(self.min_window, self.max_window)?,
            ..AnalysisConfig::default()
        };
        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let config = args.config()?;
    for (name, channel) in [&args.input_a, &args.input_b].iter().zip(&config.channels) {
        eprintln!(
            "{}: {} smoothing={}",
            name.display(),
            channel.detector,
            channel.smoothing_window
        );
    }

    let report = analyze_files(&args.input_a, &args.input_b, &config)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for record in &report.records {
            println!("{}", record);
        }
        println!("{}", report.summary_line());
    }

    Ok(())
}
