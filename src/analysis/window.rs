// Sliding-window framing shared by the windowed analyzers
//
// Incoming samples are written twice into a double-length buffer (once at
// the write index, once mirrored `size` slots above it), so the most recent
// window is always available as a single contiguous slice in time order.
// A hop counter decides which sample completes an analysis frame.

/// Pre-compute a Hann window table to reduce spectral leakage.
pub(crate) fn hann_window(size: usize) -> Vec<f64> {
    (0..size)
        .map(|i| {
            0.5 * (1.0
                - ((2.0 * std::f64::consts::PI * i as f64) / (size as f64 - 1.0)).cos())
        })
        .collect()
}

/// Mirrored circular buffer with hop bookkeeping.
///
/// `push` returns `true` on the sample that completes a hop cycle; the
/// caller then reads the window through `frame()`. The hop defaults to the
/// window size (no overlap), so the first frame is only emitted once the
/// buffer holds a full window of real input.
pub(crate) struct SlidingWindow {
    buffer: Vec<f64>,
    size: usize,
    hop: usize,
    write_pos: usize,
    hop_count: usize,
}

impl SlidingWindow {
    pub fn new(size: usize) -> Self {
        let size = size.max(2);
        Self {
            buffer: vec![0.0; 2 * size],
            size,
            hop: size,
            write_pos: 0,
            hop_count: 0,
        }
    }

    /// Derive the hop from an overlap ratio. Out-of-range ratios land on
    /// the hop bounds [1, size]; the caller is expected to reject
    /// non-finite input.
    pub fn set_overlap(&mut self, overlap: f64) {
        let hop = ((1.0 - overlap) * self.size as f64)
            .round()
            .clamp(1.0, self.size as f64) as usize;
        self.hop = hop.max(1);
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn hop(&self) -> usize {
        self.hop
    }

    pub fn push(&mut self, sample: f64) -> bool {
        self.buffer[self.write_pos] = sample;
        self.buffer[self.size + self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) % self.size;
        self.hop_count = (self.hop_count + 1) % self.hop;
        self.hop_count == 0
    }

    /// The last `size` samples, oldest first.
    pub fn frame(&self) -> &[f64] {
        &self.buffer[self.write_pos..self.write_pos + self.size]
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
        self.hop_count = 0;
    }
}
