use std::fs;
use std::path::Path;

use bytemuck::{Pod, Zeroable};

use crate::math::{quat_normalize, Vec3};
use crate::splat::Splat;

type LoadResult<T> = Result<T, Box<dyn std::error::Error>>;

const MIN_SCALE: f32 = 1e-4;

/// On-disk `.splat` record: 32 little-endian bytes, no file header.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct RawSplatRecord {
    position: [f32; 3],
    scale: [f32; 3],
    color: [u8; 4],
    rotation: [u8; 4],
}

const RECORD_SIZE: usize = std::mem::size_of::<RawSplatRecord>();

fn unpack_scale(raw: f32) -> f32 {
    // Some exporters leave the scale in log space; positive values are
    // already linear.
    if raw > 0.0 {
        raw
    } else {
        raw.exp().max(MIN_SCALE)
    }
}

fn unpack_rotation(quantized: [u8; 4]) -> [f32; 4] {
    let mut q = [0.0f32; 4];
    for (lane, &byte) in q.iter_mut().zip(quantized.iter()) {
        *lane = (byte as f32 - 127.5) / 127.5;
    }
    quat_normalize(q)
}

impl RawSplatRecord {
    fn unpack(&self) -> Splat {
        let [x, y, z] = self.position;
        let [r, g, b, alpha] = self.color;

        Splat {
            position: Vec3::new(x, y, z),
            color: [r, g, b],
            opacity: (alpha as f32 / 255.0).clamp(0.0, 1.0),
            scale: Vec3::new(
                unpack_scale(self.scale[0]),
                unpack_scale(self.scale[1]),
                unpack_scale(self.scale[2]),
            ),
            rotation: unpack_rotation(self.rotation),
        }
    }
}

pub fn load_splat_file(path: &str) -> LoadResult<Vec<Splat>> {
    let data = fs::read(path)
        .map_err(|e| format!("failed to read '{}': {}", Path::new(path).display(), e))?;
    if data.is_empty() || data.len() % RECORD_SIZE != 0 {
        return Err(format!(
            "'{}' is not a .splat file: {} bytes, expected a non-zero multiple of {}",
            Path::new(path).display(),
            data.len(),
            RECORD_SIZE
        )
        .into());
    }

    Ok(data
        .chunks_exact(RECORD_SIZE)
        .map(|chunk| bytemuck::pod_read_unaligned::<RawSplatRecord>(chunk).unpack())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_size() {
        assert_eq!(RECORD_SIZE, 32);
    }

    #[test]
    fn test_unpack_record_fields() {
        let record = RawSplatRecord {
            position: [1.5, -2.0, 0.25],
            scale: [0.5, -1.0, 0.5],
            color: [200, 100, 50, 255],
            rotation: [255, 128, 128, 128],
        };

        let splat = record.unpack();
        assert_eq!(splat.position, Vec3::new(1.5, -2.0, 0.25));
        assert_eq!(splat.color, [200, 100, 50]);
        assert!((splat.opacity - 1.0).abs() < 1e-6);
        assert!((splat.scale.x - 0.5).abs() < 1e-6);
        // A non-positive raw scale decodes through the log path.
        assert!((splat.scale.y - (-1.0f32).exp()).abs() < 1e-6);

        let q = splat.rotation;
        let len = (q[0] * q[0] + q[1] * q[1] + q[2] * q[2] + q[3] * q[3]).sqrt();
        assert!((len - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_record_round_trips_through_bytes() {
        let record = RawSplatRecord {
            position: [1.0, 2.0, 3.0],
            scale: [0.1, 0.2, 0.3],
            color: [10, 20, 30, 40],
            rotation: [0, 64, 192, 255],
        };

        let bytes = bytemuck::bytes_of(&record);
        assert_eq!(bytes.len(), RECORD_SIZE);

        let restored: RawSplatRecord = bytemuck::pod_read_unaligned(bytes);
        assert_eq!(restored.position, record.position);
        assert_eq!(restored.scale, record.scale);
        assert_eq!(restored.color, record.color);
        assert_eq!(restored.rotation, record.rotation);
    }
}
