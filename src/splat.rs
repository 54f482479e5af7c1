use crate::math::Vec3;

/// One Gaussian primitive as loaded or generated. The sort path only
/// consumes `position`; the remaining fields ride along for the draw
/// stage that consumes the sorted permutation.
#[derive(Debug, Clone, Copy)]
pub struct Splat {
    pub position: Vec3,
    pub color: [u8; 3],
    pub opacity: f32,
    pub scale: Vec3,
    pub rotation: [f32; 4],
}
