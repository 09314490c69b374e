use super::error::{DedupError, Result};
use super::frame::{validate_source, PixelSource};
use super::phash::{Fingerprint, PerceptualHasher};

/// 网格边长（3x3）
pub const GRID: u32 = 3;
/// 区域数量
pub const REGION_COUNT: usize = (GRID * GRID) as usize;

/// 分区域指纹：一个全局指纹 + 9 个区域指纹（行优先，左上角开始，x 递增最快）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionSet {
    pub global: Fingerprint,
    pub regions: [Fingerprint; REGION_COUNT],
}

impl RegionSet {
    /// 计算整帧的全局指纹和 3x3 区域指纹
    ///
    /// 区域尺寸向下取整为 (width/3, height/3)，右侧和底部多出的像素
    /// 不落在任何区域内，只参与全局指纹。
    pub fn compute<S: PixelSource + ?Sized>(src: &S) -> Result<Self> {
        validate_source(src)?;
        let (width, height) = src.dimensions();

        let (tile_w, tile_h) = Self::tile_size(width, height);
        if tile_w == 0 || tile_h == 0 {
            return Err(DedupError::RegionTooSmall { width, height });
        }

        let global = PerceptualHasher::hash_source(src)?;

        let mut regions = [Fingerprint::EMPTY; REGION_COUNT];
        for row in 0..GRID {
            for col in 0..GRID {
                let idx = (row * GRID + col) as usize;
                regions[idx] =
                    PerceptualHasher::hash_region(src, col * tile_w, row * tile_h, tile_w, tile_h)?;
            }
        }

        Ok(Self { global, regions })
    }

    pub fn tile_size(width: u32, height: u32) -> (u32, u32) {
        (width / GRID, height / GRID)
    }
}

/// 便捷入口
pub fn compute_region_set<S: PixelSource + ?Sized>(src: &S) -> Result<RegionSet> {
    RegionSet::compute(src)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame_extractor::frame::Frame;
    use crate::frame_extractor::phash::HASH_BITS;

    fn noisy_frame(width: u32, height: u32, seed: u32) -> Frame {
        let mut data = Vec::with_capacity((width * height * 4) as usize);
        let mut state = seed.wrapping_mul(2654435761).max(1);
        for _ in 0..width * height {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            let v = (state & 0xFF) as u8;
            data.extend_from_slice(&[v, v.wrapping_add(40), v / 2, 255]);
        }
        Frame::new(width, height, data, 0, 0)
    }

    #[test]
    fn test_region_set_deterministic() {
        let frame = noisy_frame(96, 72, 7);
        let a = compute_region_set(&frame).unwrap();
        let b = compute_region_set(&frame).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_every_fingerprint_has_63_bits() {
        for (w, h) in [(64, 64), (100, 31), (3, 3), (641, 359)] {
            let set = compute_region_set(&noisy_frame(w, h, w + h)).unwrap();
            assert_eq!(set.global.len(), HASH_BITS);
            assert!(set.regions.iter().all(|r| r.len() == HASH_BITS));
        }
    }

    #[test]
    fn test_tile_size_floors() {
        assert_eq!(RegionSet::tile_size(100, 50), (33, 16));
        assert_eq!(RegionSet::tile_size(99, 99), (33, 33));
        assert_eq!(RegionSet::tile_size(2, 9), (0, 3));
    }

    #[test]
    fn test_too_small_frame_rejected() {
        let frame = Frame::solid(2, 10, [0, 0, 0, 255]);
        assert!(matches!(
            compute_region_set(&frame),
            Err(DedupError::RegionTooSmall { width: 2, height: 10 })
        ));
    }

    #[test]
    fn test_region_order_is_row_major() {
        let frame = noisy_frame(60, 45, 11);
        let set = compute_region_set(&frame).unwrap();

        for row in 0..GRID {
            for col in 0..GRID {
                let expected =
                    PerceptualHasher::hash_region(&frame, col * 20, row * 15, 20, 15).unwrap();
                assert_eq!(set.regions[(row * GRID + col) as usize], expected);
            }
        }
        assert_ne!(set.regions[0], set.regions[1]);
    }

    #[test]
    fn test_changed_tile_only_changes_its_region() {
        let base = noisy_frame(90, 90, 3);
        let mut changed = base.clone();
        // 改写右下角区域 (60..90, 60..90)
        let patch = noisy_frame(30, 30, 99);
        for y in 0..30usize {
            let dst = ((y + 60) * 90 + 60) * 4;
            let src = y * 30 * 4;
            changed.data[dst..dst + 120].copy_from_slice(&patch.data[src..src + 120]);
        }

        let a = compute_region_set(&base).unwrap();
        let b = compute_region_set(&changed).unwrap();
        for i in 0..8 {
            assert_eq!(a.regions[i], b.regions[i]);
        }
        assert_ne!(a.regions[8], b.regions[8]);
    }
}
