/// Caller-owned working memory for [`sort_indexes`](super::sort_indexes).
///
/// Allocated once and reused for the lifetime of a renderer; the kernel
/// never grows or retains it. Two buffers serve two consecutive roles
/// within a single call: `mapped_distances` holds raw depths, then
/// bucket ids; `frequencies` holds bucket counts, then cumulative
/// offsets. `frequencies` must be re-zeroed between calls, which is the
/// caller's job, not the kernel's.
#[derive(Debug)]
pub struct SortScratch {
    pub mapped_distances: Vec<i32>,
    pub frequencies: Vec<u32>,
    pub indexes_out: Vec<u32>,
}

impl SortScratch {
    pub fn new(render_capacity: usize, distance_map_range: usize) -> Self {
        Self {
            mapped_distances: vec![0; render_capacity],
            frequencies: vec![0; distance_map_range],
            indexes_out: vec![0; render_capacity],
        }
    }

    pub fn reset_frequencies(&mut self) {
        self.frequencies.fill(0);
    }

    /// The permutation produced by the last sort.
    pub fn sorted(&self, render_count: usize) -> &[u32] {
        &self.indexes_out[..render_count]
    }
}
