use rayon::prelude::*;

use crate::sorter::{CenterView, FIXED_POINT_SCALE};
use crate::splat::Splat;

/// Packed splat centers in the layout the sort kernel consumes: four
/// lanes per splat, 16-byte stride. The float layout stores `x, y, z,
/// 1.0`; the integer layout pre-scales by [`FIXED_POINT_SCALE`] and
/// stores the scale itself in the fourth lane so dynamic-mode
/// translation terms come out in the same fixed-point domain.
#[derive(Debug, Clone)]
pub enum CenterPalette {
    Float(Vec<f32>),
    Integer(Vec<i32>),
}

#[derive(Debug)]
pub enum CenterError {
    Misaligned { len: usize },
    RaggedStride { lanes: usize },
}

impl std::fmt::Display for CenterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Misaligned { len } => {
                write!(f, "center buffer of {len} bytes is not aligned to its lane width")
            }
            Self::RaggedStride { lanes } => {
                write!(f, "center buffer holds {lanes} lanes, expected a multiple of 4")
            }
        }
    }
}

impl std::error::Error for CenterError {}

impl CenterPalette {
    pub fn pack_float(splats: &[Splat]) -> Self {
        let mut lanes = vec![0.0f32; splats.len() * 4];
        lanes
            .par_chunks_mut(4)
            .zip(splats.par_iter())
            .for_each(|(lane, splat)| {
                lane[0] = splat.position.x;
                lane[1] = splat.position.y;
                lane[2] = splat.position.z;
                lane[3] = 1.0;
            });
        Self::Float(lanes)
    }

    pub fn pack_integer(splats: &[Splat]) -> Self {
        let mut lanes = vec![0i32; splats.len() * 4];
        lanes
            .par_chunks_mut(4)
            .zip(splats.par_iter())
            .for_each(|(lane, splat)| {
                lane[0] = (splat.position.x * FIXED_POINT_SCALE).round() as i32;
                lane[1] = (splat.position.y * FIXED_POINT_SCALE).round() as i32;
                lane[2] = (splat.position.z * FIXED_POINT_SCALE).round() as i32;
                lane[3] = FIXED_POINT_SCALE as i32;
            });
        Self::Integer(lanes)
    }

    /// Reinterprets a raw little-endian byte buffer as float centers.
    pub fn from_float_bytes(bytes: &[u8]) -> Result<Self, CenterError> {
        let lanes: &[f32] =
            bytemuck::try_cast_slice(bytes).map_err(|_| CenterError::Misaligned {
                len: bytes.len(),
            })?;
        if lanes.len() % 4 != 0 {
            return Err(CenterError::RaggedStride { lanes: lanes.len() });
        }
        Ok(Self::Float(lanes.to_vec()))
    }

    /// Reinterprets a raw little-endian byte buffer as integer centers.
    pub fn from_integer_bytes(bytes: &[u8]) -> Result<Self, CenterError> {
        let lanes: &[i32] =
            bytemuck::try_cast_slice(bytes).map_err(|_| CenterError::Misaligned {
                len: bytes.len(),
            })?;
        if lanes.len() % 4 != 0 {
            return Err(CenterError::RaggedStride { lanes: lanes.len() });
        }
        Ok(Self::Integer(lanes.to_vec()))
    }

    pub fn splat_count(&self) -> usize {
        match self {
            Self::Float(lanes) => lanes.len() / 4,
            Self::Integer(lanes) => lanes.len() / 4,
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Self::Integer(_))
    }

    pub fn view(&self) -> CenterView<'_> {
        match self {
            Self::Float(lanes) => CenterView::Float(lanes),
            Self::Integer(lanes) => CenterView::Integer(lanes),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Float(lanes) => bytemuck::cast_slice(lanes),
            Self::Integer(lanes) => bytemuck::cast_slice(lanes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec3;

    fn splat_at(x: f32, y: f32, z: f32) -> Splat {
        Splat {
            position: Vec3::new(x, y, z),
            color: [255, 255, 255],
            opacity: 1.0,
            scale: Vec3::new(0.1, 0.1, 0.1),
            rotation: [1.0, 0.0, 0.0, 0.0],
        }
    }

    #[test]
    fn test_float_layout() {
        let palette = CenterPalette::pack_float(&[splat_at(1.0, 2.0, 3.0), splat_at(-4.0, 0.5, 9.0)]);
        let CenterPalette::Float(lanes) = &palette else {
            panic!("expected float palette");
        };
        assert_eq!(lanes, &[1.0, 2.0, 3.0, 1.0, -4.0, 0.5, 9.0, 1.0]);
        assert_eq!(palette.splat_count(), 2);
    }

    #[test]
    fn test_integer_layout_rounds() {
        let palette = CenterPalette::pack_integer(&[splat_at(0.0004, -1.2345, 2.9996)]);
        let CenterPalette::Integer(lanes) = &palette else {
            panic!("expected integer palette");
        };
        assert_eq!(lanes, &[0, -1235, 3000, 1000]);
    }

    #[test]
    fn test_byte_round_trip() {
        let packed = CenterPalette::pack_integer(&[splat_at(1.0, 2.0, 3.0)]);
        let restored = CenterPalette::from_integer_bytes(packed.as_bytes())
            .expect("packed bytes should reinterpret cleanly");
        assert_eq!(restored.splat_count(), 1);
        let (CenterPalette::Integer(a), CenterPalette::Integer(b)) = (&packed, &restored) else {
            panic!("expected integer palettes");
        };
        assert_eq!(a, b);
    }

    #[test]
    fn test_ragged_bytes_rejected() {
        let bytes = [0u8; 12];
        assert!(CenterPalette::from_float_bytes(&bytes).is_err());
    }
}
