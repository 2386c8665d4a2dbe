//! Downsampled history of periodicity snapshots and its rendering
//!
//! A channel takes a snapshot of its smoothed periodicity curve every
//! `stride` hops into a table of fixed width. When the stream length is
//! known up front the stride is `total / width`; otherwise the stride starts
//! at one hop and doubles whenever the table fills, dropping every other
//! column, so the table always spans the whole run.

/// One snapshot of a channel's smoothed periodicity curve
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryColumn {
    /// Smoothed, trigger-normalized curve indexed by delay
    pub smoothed: Vec<f32>,

    /// Trigger count when the snapshot was taken
    pub trigger_count: u32,
}

/// Bounded-width table of periodicity snapshots
#[derive(Debug, Clone)]
pub struct HistoryTable {
    width: usize,
    stride: u64,
    adaptive: bool,
    columns: Vec<HistoryColumn>,
    overflowed: bool,
}

impl HistoryTable {
    /// Table of `width` columns for a stream of `total_hops` hops (0 = unknown)
    pub fn new(width: usize, total_hops: u64) -> Self {
        let width = width.max(1);
        let adaptive = total_hops == 0;
        let stride = if adaptive {
            log::debug!("Stream length unknown, history stride will be re-derived");
            1
        } else {
            (total_hops / width as u64).max(1)
        };
        Self {
            width,
            stride,
            adaptive,
            columns: Vec::with_capacity(width),
            overflowed: false,
        }
    }

    /// Number of columns
    pub fn width(&self) -> usize {
        self.width
    }

    /// Hops between snapshots
    pub fn stride(&self) -> u64 {
        self.stride
    }

    /// Filled columns in time order
    pub fn columns(&self) -> &[HistoryColumn] {
        &self.columns
    }

    /// Whether the table is full
    pub fn is_full(&self) -> bool {
        self.columns.len() >= self.width
    }

    /// Decide whether `hop` should be snapshotted, making room if needed
    ///
    /// A snapshot is due when `hop` is a multiple of the stride. Once a
    /// fixed-stride table is full later snapshots are dropped; an adaptive
    /// table compacts itself instead.
    pub fn wants_snapshot(&mut self, hop: u64) -> bool {
        if hop % self.stride != 0 {
            return false;
        }
        if !self.is_full() {
            return true;
        }
        if !self.adaptive {
            if !self.overflowed {
                self.overflowed = true;
                log::warn!(
                    "History table full at hop {} ({} columns), later snapshots dropped",
                    hop,
                    self.width
                );
            }
            return false;
        }

        self.compact();
        hop % self.stride == 0 && !self.is_full()
    }

    /// Store a snapshot in the next free column
    ///
    /// Returns false if the table is full.
    pub fn push(&mut self, column: HistoryColumn) -> bool {
        if self.is_full() {
            return false;
        }
        self.columns.push(column);
        true
    }

    fn compact(&mut self) {
        let mut index = 0usize;
        self.columns.retain(|_| {
            let keep = index % 2 == 0;
            index += 1;
            keep
        });
        self.stride *= 2;
        log::debug!(
            "History table compacted to {} columns, stride now {} hops",
            self.columns.len(),
            self.stride
        );
    }

    /// Contrast-stretch every column into an image
    ///
    /// Rows below `suppressed_rows` are zeroed before each column's maximum
    /// is found; each column is then divided by its own maximum. Columns that
    /// were never filled, saw no trigger, or have no positive value render
    /// as zeros without markers.
    pub fn render(&self, height: usize, suppressed_rows: usize) -> PeriodicityImage {
        let mut image = PeriodicityImage::new(self.width, height);

        for (x, column) in self.columns.iter().enumerate() {
            if column.trigger_count == 0 {
                continue;
            }

            let mut values: Vec<f32> = column
                .smoothed
                .iter()
                .copied()
                .chain(std::iter::repeat(0.0))
                .take(height)
                .map(|v| if v.is_finite() && v > 0.0 { v } else { 0.0 })
                .collect();
            let suppressed = suppressed_rows.min(height);
            values[..suppressed].fill(0.0);

            // First maximum wins
            let mut peak = 0usize;
            let mut max = 0.0f32;
            for (row, &value) in values.iter().enumerate() {
                if value > max {
                    max = value;
                    peak = row;
                }
            }
            if max <= 0.0 {
                continue;
            }

            for (y, value) in values.iter().enumerate() {
                image.set(x, y, value / max);
            }
            image.markers[x] = Some(ColumnMarkers::for_peak(peak, height));
        }

        image
    }
}

/// Marker rows of one image column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMarkers {
    /// Row of the column maximum
    pub peak: usize,

    /// Half the peak delay
    pub half: usize,

    /// Twice the peak delay, when it fits in the image
    pub double: Option<usize>,
}

impl ColumnMarkers {
    /// Markers for a maximum at `peak` in a column of `height` rows
    pub fn for_peak(peak: usize, height: usize) -> Self {
        let double = peak * 2;
        Self {
            peak,
            half: peak / 2,
            double: (double < height).then_some(double),
        }
    }
}

/// Rectangular intensity matrix: columns are time, rows are delay
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodicityImage {
    /// Columns
    pub width: usize,

    /// Rows
    pub height: usize,

    /// Row-major intensities in `[0, 1]`
    pub values: Vec<f32>,

    /// Marker rows per column, `None` for blank columns
    pub markers: Vec<Option<ColumnMarkers>>,
}

impl PeriodicityImage {
    /// All-zero image
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            values: vec![0.0; width * height],
            markers: vec![None; width],
        }
    }

    /// Intensity at column `x`, row `y`; 0 outside the image
    pub fn get(&self, x: usize, y: usize) -> f32 {
        if x >= self.width || y >= self.height {
            return 0.0;
        }
        self.values[y * self.width + x]
    }

    fn set(&mut self, x: usize, y: usize, value: f32) {
        if x < self.width && y < self.height {
            self.values[y * self.width + x] = value.clamp(0.0, 1.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(values: &[f32], triggers: u32) -> HistoryColumn {
        HistoryColumn {
            smoothed: values.to_vec(),
            trigger_count: triggers,
        }
    }

    #[test]
    fn test_fixed_stride() {
        let mut table = HistoryTable::new(4, 10);
        assert_eq!(table.stride(), 2);

        let mut snapshots = Vec::new();
        for hop in 0..10 {
            if table.wants_snapshot(hop) {
                assert!(table.push(column(&[hop as f32], 1)));
                snapshots.push(hop);
            }
        }
        // Hop 8 is due but the table is already full
        assert_eq!(snapshots, vec![0, 2, 4, 6]);
        assert!(table.is_full());
    }

    #[test]
    fn test_short_stream_stride_is_one() {
        let table = HistoryTable::new(1024, 100);
        assert_eq!(table.stride(), 1);
    }

    #[test]
    fn test_adaptive_table_spans_whole_run() {
        let mut table = HistoryTable::new(4, 0);
        for hop in 0..20u64 {
            if table.wants_snapshot(hop) {
                table.push(column(&[hop as f32], 1));
            }
        }
        let hops: Vec<f32> = table.columns().iter().map(|c| c.smoothed[0]).collect();
        assert_eq!(table.stride(), 8);
        assert_eq!(hops, vec![0.0, 8.0, 16.0]);
    }

    #[test]
    fn test_render_normalizes_each_column() {
        let mut table = HistoryTable::new(3, 3);
        table.push(column(&[9.0, 1.0, 2.0, 4.0], 2));
        table.push(column(&[0.0, 0.0, 0.0, 0.0], 0));
        table.push(column(&[0.0, 3.0, 3.0, 1.5], 5));

        let image = table.render(4, 1);
        assert_eq!(image.width, 3);
        assert_eq!(image.height, 4);

        // Row 0 suppressed, so the 9.0 is not the maximum
        assert_eq!(image.get(0, 0), 0.0);
        assert_eq!(image.get(0, 3), 1.0);
        assert_eq!(image.get(0, 2), 0.5);
        assert_eq!(image.markers[0], Some(ColumnMarkers::for_peak(3, 4)));

        // No triggers: blank column, no markers
        assert!((0..4).all(|y| image.get(1, y) == 0.0));
        assert_eq!(image.markers[1], None);

        // Tie keeps the shortest delay
        assert_eq!(image.markers[2].map(|m| m.peak), Some(1));
        assert_eq!(image.get(2, 3), 0.5);
    }

    #[test]
    fn test_render_unfilled_columns_blank() {
        let mut table = HistoryTable::new(4, 0);
        table.push(column(&[0.0, 0.0, 1.0], 1));
        let image = table.render(3, 0);
        assert_eq!(image.values.len(), 12);
        assert!(image.markers[1..].iter().all(Option::is_none));
        assert!(image.values.iter().all(|v| v.is_finite() && (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_render_all_suppressed_is_blank() {
        let mut table = HistoryTable::new(1, 1);
        table.push(column(&[5.0, 5.0], 3));
        let image = table.render(2, 20);
        assert!(image.values.iter().all(|&v| v == 0.0));
        assert_eq!(image.markers[0], None);
    }

    #[test]
    fn test_markers() {
        assert_eq!(
            ColumnMarkers::for_peak(100, 561),
            ColumnMarkers {
                peak: 100,
                half: 50,
                double: Some(200)
            }
        );
        assert_eq!(ColumnMarkers::for_peak(300, 561).double, None);
        assert_eq!(ColumnMarkers::for_peak(7, 561).half, 3);
    }
}
