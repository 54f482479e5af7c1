use crate::math::mat4_depth_row_compose;

use super::simd::mul_i32x4;
use super::{
    CenterView, PrecomputedDepths, SceneView, SortInputs, FIXED_POINT_SCALE, FLOAT_DEPTH_SCALE,
    MAX_DISTANCE_SEED, MIN_DISTANCE_SEED,
};

/// One projection strategy per flag combination, resolved once at call
/// entry. Exactly one variant runs per sort.
pub(super) enum Projection<'a> {
    PrecomputedInteger(&'a [i32]),
    PrecomputedFloat(&'a [f32]),
    StaticFloat {
        row: [f32; 3],
        centers: &'a [f32],
    },
    StaticInteger {
        row: [i32; 4],
        centers: &'a [i32],
    },
    DynamicFloat {
        view_proj: &'a [f32; 16],
        scenes: SceneView<'a>,
        centers: &'a [f32],
    },
    DynamicInteger {
        view_proj: &'a [f32; 16],
        scenes: SceneView<'a>,
        centers: &'a [i32],
    },
}

/// Running min/max folded into the projection pass.
struct DistanceSpan {
    min: i32,
    max: i32,
}

impl DistanceSpan {
    fn new() -> Self {
        Self {
            min: MIN_DISTANCE_SEED,
            max: MAX_DISTANCE_SEED,
        }
    }

    #[inline]
    fn record(&mut self, slot: &mut i32, distance: i32) {
        *slot = distance;
        if distance > self.max {
            self.max = distance;
        }
        if distance < self.min {
            self.min = distance;
        }
    }
}

impl<'a> Projection<'a> {
    pub(super) fn select(inputs: &SortInputs<'a>) -> Self {
        let m = inputs.view_proj;
        match (inputs.precomputed, inputs.scenes, inputs.centers) {
            (PrecomputedDepths::Integer(depths), _, _) => Self::PrecomputedInteger(depths),
            (PrecomputedDepths::Float(depths), _, _) => Self::PrecomputedFloat(depths),
            (PrecomputedDepths::None, Some(scenes), CenterView::Float(centers)) => {
                Self::DynamicFloat {
                    view_proj: m,
                    scenes,
                    centers,
                }
            }
            (PrecomputedDepths::None, Some(scenes), CenterView::Integer(centers)) => {
                Self::DynamicInteger {
                    view_proj: m,
                    scenes,
                    centers,
                }
            }
            (PrecomputedDepths::None, None, CenterView::Float(centers)) => Self::StaticFloat {
                row: [m[2], m[6], m[10]],
                centers,
            },
            (PrecomputedDepths::None, None, CenterView::Integer(centers)) => Self::StaticInteger {
                row: [
                    (m[2] * FIXED_POINT_SCALE) as i32,
                    (m[6] * FIXED_POINT_SCALE) as i32,
                    (m[10] * FIXED_POINT_SCALE) as i32,
                    1,
                ],
                centers,
            },
        }
    }

    /// Writes a raw signed depth per window entry and returns the
    /// observed `(min, max)`.
    pub(super) fn project(&self, window: &[u32], mapped: &mut [i32]) -> (i32, i32) {
        let mut span = DistanceSpan::new();

        match self {
            Self::PrecomputedInteger(depths) => {
                for (slot, &index) in mapped.iter_mut().zip(window) {
                    span.record(slot, depths[index as usize]);
                }
            }
            Self::PrecomputedFloat(depths) => {
                for (slot, &index) in mapped.iter_mut().zip(window) {
                    span.record(slot, (depths[index as usize] * FLOAT_DEPTH_SCALE) as i32);
                }
            }
            Self::StaticFloat { row, centers } => {
                for (slot, &index) in mapped.iter_mut().zip(window) {
                    let base = 4 * index as usize;
                    let depth = row[0] * centers[base]
                        + row[1] * centers[base + 1]
                        + row[2] * centers[base + 2];
                    span.record(slot, (depth * FLOAT_DEPTH_SCALE) as i32);
                }
            }
            Self::StaticInteger { row, centers } => {
                for (slot, &index) in mapped.iter_mut().zip(window) {
                    let lanes = mul_i32x4(center_lanes(centers, index), *row);
                    // Three lanes: the fourth pairs the synthetic w with a
                    // placeholder 1 in the row, not a translation term.
                    let distance = lanes[0].wrapping_add(lanes[1]).wrapping_add(lanes[2]);
                    span.record(slot, distance);
                }
            }
            Self::DynamicFloat {
                view_proj,
                scenes,
                centers,
            } => {
                let mut cached_scene = None;
                let mut row = [0.0f32; 4];
                for (slot, &index) in mapped.iter_mut().zip(window) {
                    let scene = scenes.scene_indexes[index as usize];
                    if cached_scene != Some(scene) {
                        row = mat4_depth_row_compose(view_proj, scenes.transform(scene));
                        cached_scene = Some(scene);
                    }
                    let base = 4 * index as usize;
                    let depth = row[0] * centers[base]
                        + row[1] * centers[base + 1]
                        + row[2] * centers[base + 2]
                        + row[3] * centers[base + 3];
                    span.record(slot, (depth * FLOAT_DEPTH_SCALE) as i32);
                }
            }
            Self::DynamicInteger {
                view_proj,
                scenes,
                centers,
            } => {
                let mut cached_scene = None;
                let mut row = [0i32; 4];
                for (slot, &index) in mapped.iter_mut().zip(window) {
                    let scene = scenes.scene_indexes[index as usize];
                    if cached_scene != Some(scene) {
                        let composed = mat4_depth_row_compose(view_proj, scenes.transform(scene));
                        row = [
                            (composed[0] * FIXED_POINT_SCALE) as i32,
                            (composed[1] * FIXED_POINT_SCALE) as i32,
                            (composed[2] * FIXED_POINT_SCALE) as i32,
                            (composed[3] * FIXED_POINT_SCALE) as i32,
                        ];
                        cached_scene = Some(scene);
                    }
                    let lanes = mul_i32x4(center_lanes(centers, index), row);
                    // All four lanes: the fourth carries the translation.
                    let distance = lanes[0]
                        .wrapping_add(lanes[1])
                        .wrapping_add(lanes[2])
                        .wrapping_add(lanes[3]);
                    span.record(slot, distance);
                }
            }
        }

        (span.min, span.max)
    }
}

#[inline]
fn center_lanes(centers: &[i32], index: u32) -> [i32; 4] {
    let base = 4 * index as usize;
    [
        centers[base],
        centers[base + 1],
        centers[base + 2],
        centers[base + 3],
    ]
}
