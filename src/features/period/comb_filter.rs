//! Comb filterbank periodicity accumulator
//!
//! Evidence for a recurring delay is collected from a sparse event stream:
//! every hop pushes its event intensity into a [`CircularHistory`], and on
//! hops that carry an event the whole history is added into a per-delay
//! accumulator. Delays at which events keep recurring build up larger totals
//! than delays at which they do not, so peaks in the accumulator mark the
//! period (tempo) of the stream and its harmonics.
//!
//! # Algorithm
//!
//! For each call to [`PeriodicityAccumulator::add_item`]:
//!
//! 1. Push the intensity into the delay line (delay 0 is now this hop)
//! 2. If the intensity is non-zero, `accumulator[d] += history.at(d)` for all
//!    `d` in `[0, N)` and count one trigger
//! 3. Return the quality of the trigger: the total added on this hop divided
//!    by the running trigger count (0 for a hop without an event)
//!
//! Hops without events only feed the delay line. This keeps the accumulator
//! proportional to actual rhythmic recurrence rather than to silence.
//!
//! The intensity type is kept narrow (`u8` event counts) so the delay line
//! stays compact, while the accumulator type is wide (`u32`/`u64`) so long
//! streams cannot overflow it.
//!
//! # Example
//!
//! ```
//! use rhythm_coach::features::period::comb_filter::PeriodicityAccumulator;
//!
//! let mut comb = PeriodicityAccumulator::<u32, u8, 3>::new();
//! for intensity in [1, 0, 1] {
//!     comb.add_item(intensity);
//! }
//! assert_eq!(comb.raw(), &[2, 0, 1]);
//! assert_eq!(comb.trigger_count(), 2);
//! ```

use std::ops::AddAssign;

use super::delay_line::CircularHistory;
use super::smoothing::smooth_into;
use crate::error::AnalysisError;

/// Numeric type usable as an accumulator cell
pub trait AccumulatorValue: Copy + Default + AddAssign {
    /// Widen to `f64` for normalization
    fn to_f64(self) -> f64;
}

macro_rules! impl_accumulator_value {
    ($($t:ty),*) => {
        $(
            impl AccumulatorValue for $t {
                #[inline]
                fn to_f64(self) -> f64 {
                    self as f64
                }
            }
        )*
    };
}

impl_accumulator_value!(u8, u16, u32, u64, f32, f64);

/// Per-delay comb filterbank over `N` hops
///
/// * `A` - accumulator cell type (wide)
/// * `I` - per-hop intensity type (narrow)
/// * `N` - delay capacity in hops
#[derive(Debug, Clone)]
pub struct PeriodicityAccumulator<A, I, const N: usize> {
    history: CircularHistory<I, N>,
    accumulator: [A; N],
    triggers: u32,
}

impl<A, I, const N: usize> Default for PeriodicityAccumulator<A, I, N>
where
    A: AccumulatorValue + From<I>,
    I: Copy + Default + PartialOrd,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<A, I, const N: usize> PeriodicityAccumulator<A, I, N>
where
    A: AccumulatorValue + From<I>,
    I: Copy + Default + PartialOrd,
{
    /// Create an empty filterbank
    pub fn new() -> Self {
        Self {
            history: CircularHistory::new(),
            accumulator: [A::default(); N],
            triggers: 0,
        }
    }

    /// Delay capacity
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Feed one hop's event intensity
    ///
    /// Returns the quality of this hop as a trigger: the sum added to the
    /// accumulator over all delays, divided by the trigger count including
    /// this one. Hops without an event return 0.
    ///
    /// Because the divisor is the running count, identical local structure
    /// scores differently early and late in a stream.
    pub fn add_item(&mut self, intensity: I) -> f32 {
        self.history.push(intensity);
        if intensity <= I::default() {
            return 0.0;
        }

        let mut increment = 0.0f64;
        for (delay, cell) in self.accumulator.iter_mut().enumerate() {
            let value = A::from(self.history.at(delay));
            *cell += value;
            increment += value.to_f64();
        }
        self.triggers += 1;

        (increment / self.triggers as f64) as f32
    }

    /// Raw accumulated value at `delay`, or empty for `delay >= N`
    pub fn at(&self, delay: usize) -> A {
        self.accumulator.get(delay).copied().unwrap_or_default()
    }

    /// All raw accumulator cells, indexed by delay
    pub fn raw(&self) -> &[A; N] {
        &self.accumulator
    }

    /// Number of hops that triggered accumulation
    pub fn trigger_count(&self) -> u32 {
        self.triggers
    }

    /// Accumulated value at `delay` divided by the trigger count
    ///
    /// 0 before the first trigger and for `delay >= N`.
    pub fn normalized_at(&self, delay: usize) -> f32 {
        if self.triggers == 0 || delay >= N {
            return 0.0;
        }
        (self.accumulator[delay].to_f64() / self.triggers as f64) as f32
    }

    /// Whole normalized curve
    pub fn normalized(&self) -> Vec<f32> {
        (0..N).map(|delay| self.normalized_at(delay)).collect()
    }

    /// Centered moving average of the normalized curve over `window` delays
    ///
    /// The first and last `window / 2` entries are zeroed. Interior values
    /// average the raw accumulator and divide by the trigger count once at
    /// the end. Before the first trigger the output is all zeros.
    ///
    /// # Errors
    ///
    /// `ConfigurationError` if `window >= N` (with `window > 0`).
    pub fn smooth(&self, output: &mut [f32; N], window: usize) -> Result<(), AnalysisError> {
        let raw: Vec<f64> = self.accumulator.iter().map(|v| v.to_f64()).collect();
        let scale = if self.triggers == 0 {
            0.0
        } else {
            1.0 / self.triggers as f64
        };
        smooth_into(&raw, window, scale, output.as_mut_slice())
    }

    /// Zero the accumulator and the delay line
    pub fn clear(&mut self) {
        self.history.clear();
        self.accumulator = [A::default(); N];
        self.triggers = 0;
    }
}
