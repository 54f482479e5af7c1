//! View-depth index sorting.
//!
//! One call runs three sequential stages over caller-owned buffers:
//! project centers to signed scalar depths, range-map the depths into
//! `[0, distance_map_range)` histogram buckets, then counting-sort the
//! sortable window of the index array into `indexes_out`. The kernel
//! allocates nothing and retains nothing between calls.

mod project;
mod scratch;
mod simd;

pub use scratch::SortScratch;

use project::Projection;

/// Scale applied to float depths before truncation to i32.
pub const FLOAT_DEPTH_SCALE: f32 = 4096.0;

/// Scale applied to projection rows and centers on the integer path.
pub const FIXED_POINT_SCALE: f32 = 1000.0;

// Min/max seeds leave headroom around the i32 limits.
pub(crate) const MIN_DISTANCE_SEED: i32 = 2_147_483_640;
pub(crate) const MAX_DISTANCE_SEED: i32 = -2_147_483_640;

/// Packed splat centers, four lanes per splat (`x, y, z, w`).
#[derive(Debug, Clone, Copy)]
pub enum CenterView<'a> {
    Float(&'a [f32]),
    Integer(&'a [i32]),
}

impl CenterView<'_> {
    pub fn splat_count(&self) -> usize {
        match self {
            Self::Float(lanes) => lanes.len() / 4,
            Self::Integer(lanes) => lanes.len() / 4,
        }
    }
}

/// Per-splat depths computed by an earlier pass. When supplied, centers
/// and the view-projection matrix are not read.
#[derive(Debug, Clone, Copy)]
pub enum PrecomputedDepths<'a> {
    None,
    Float(&'a [f32]),
    Integer(&'a [i32]),
}

/// Scene assignment for dynamic mode: one scene id per splat, one flat
/// 16-float transform per scene id.
#[derive(Debug, Clone, Copy)]
pub struct SceneView<'a> {
    pub scene_indexes: &'a [u32],
    pub transforms: &'a [f32],
}

impl<'a> SceneView<'a> {
    pub fn transform(&self, scene: u32) -> &'a [f32] {
        let base = scene as usize * 16;
        &self.transforms[base..base + 16]
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SortInputs<'a> {
    pub indexes: &'a [u32],
    pub centers: CenterView<'a>,
    pub precomputed: PrecomputedDepths<'a>,
    pub view_proj: &'a [f32; 16],
    pub scenes: Option<SceneView<'a>>,
    pub distance_map_range: usize,
    pub sort_count: usize,
    pub render_count: usize,
}

#[derive(Debug)]
pub enum SortError {
    CountsOutOfRange {
        sort_count: usize,
        render_count: usize,
    },
    BufferTooSmall {
        buffer: &'static str,
        needed: usize,
        len: usize,
    },
    ZeroDistanceMapRange,
    BadTransformTable {
        len: usize,
    },
    SceneTableTooSmall {
        scene_indexes: usize,
        splat_count: usize,
    },
}

impl std::fmt::Display for SortError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CountsOutOfRange {
                sort_count,
                render_count,
            } => write!(
                f,
                "sort_count {sort_count} exceeds render_count {render_count}"
            ),
            Self::BufferTooSmall {
                buffer,
                needed,
                len,
            } => write!(f, "{buffer} holds {len} entries, call needs {needed}"),
            Self::ZeroDistanceMapRange => f.write_str("distance_map_range must be at least 1"),
            Self::BadTransformTable { len } => {
                write!(f, "transform table length {len} is not a multiple of 16")
            }
            Self::SceneTableTooSmall {
                scene_indexes,
                splat_count,
            } => write!(
                f,
                "scene table covers {scene_indexes} splats, palette holds {splat_count}"
            ),
        }
    }
}

impl std::error::Error for SortError {}

/// Sorts the final `sort_count` entries of `indexes[..render_count]` by
/// view depth and writes the full permutation to `scratch.indexes_out`.
///
/// The leading `render_count - sort_count` entries pass through
/// verbatim; the sortable window comes out in non-decreasing bucket
/// order (shallowest first). `scratch.frequencies` must be zeroed by
/// the caller before every call.
pub fn sort_indexes(inputs: &SortInputs, scratch: &mut SortScratch) -> Result<(), SortError> {
    validate(inputs, scratch)?;
    run(inputs, scratch);
    Ok(())
}

fn validate(inputs: &SortInputs, scratch: &SortScratch) -> Result<(), SortError> {
    if inputs.sort_count > inputs.render_count {
        return Err(SortError::CountsOutOfRange {
            sort_count: inputs.sort_count,
            render_count: inputs.render_count,
        });
    }
    if inputs.distance_map_range == 0 {
        return Err(SortError::ZeroDistanceMapRange);
    }

    let checks: [(&'static str, usize, usize); 4] = [
        ("indexes", inputs.render_count, inputs.indexes.len()),
        (
            "mapped_distances",
            inputs.render_count,
            scratch.mapped_distances.len(),
        ),
        (
            "frequencies",
            inputs.distance_map_range,
            scratch.frequencies.len(),
        ),
        ("indexes_out", inputs.render_count, scratch.indexes_out.len()),
    ];
    for (buffer, needed, len) in checks {
        if len < needed {
            return Err(SortError::BufferTooSmall {
                buffer,
                needed,
                len,
            });
        }
    }

    if let Some(scenes) = &inputs.scenes {
        if scenes.transforms.is_empty() || scenes.transforms.len() % 16 != 0 {
            return Err(SortError::BadTransformTable {
                len: scenes.transforms.len(),
            });
        }
        if matches!(inputs.precomputed, PrecomputedDepths::None) {
            let splat_count = inputs.centers.splat_count();
            if scenes.scene_indexes.len() < splat_count {
                return Err(SortError::SceneTableTooSmall {
                    scene_indexes: scenes.scene_indexes.len(),
                    splat_count,
                });
            }
        }
    }

    Ok(())
}

fn run(inputs: &SortInputs, scratch: &mut SortScratch) {
    let sort_start = inputs.render_count - inputs.sort_count;

    scratch.indexes_out[..sort_start].copy_from_slice(&inputs.indexes[..sort_start]);
    if inputs.sort_count == 0 {
        return;
    }

    let window = &inputs.indexes[sort_start..inputs.render_count];
    let mapped = &mut scratch.mapped_distances[sort_start..inputs.render_count];

    let (min_distance, max_distance) = Projection::select(inputs).project(window, mapped);

    // Range-map raw depths to bucket ids in place, counting as we go.
    // A degenerate spread collapses everything into bucket 0.
    let spread = max_distance as f32 - min_distance as f32;
    let scale = if spread > 0.0 {
        (inputs.distance_map_range - 1) as f32 / spread
    } else {
        0.0
    };

    let frequencies = &mut scratch.frequencies[..inputs.distance_map_range];
    for slot in mapped.iter_mut() {
        // Widened subtraction: the i32 spread may exceed i32 range.
        let bucket = ((*slot as i64 - min_distance as i64) as f32 * scale) as usize;
        *slot = bucket as i32;
        frequencies[bucket] += 1;
    }

    let mut cumulative = 0u32;
    for frequency in frequencies.iter_mut() {
        cumulative += *frequency;
        *frequency = cumulative;
    }

    // Walk the window backwards so equal buckets keep their input order,
    // filling each bucket's span from its far end.
    for i in (sort_start..inputs.render_count).rev() {
        let bucket = scratch.mapped_distances[i] as usize;
        let rank = scratch.frequencies[bucket];
        scratch.indexes_out[sort_start + rank as usize - 1] = inputs.indexes[i];
        scratch.frequencies[bucket] = rank - 1;
    }
}
