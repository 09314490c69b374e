//! DCT 感知哈希
//!
//! 流程：缩放到 32x32 → 灰度 → DCT → 取左上 8x8 低频块（去掉直流分量）
//! → 与均值比较得到 63 位指纹。

use super::dct::{FrequencyMatrix, DCT_32};
use super::error::{DedupError, Result};
use super::frame::{validate_source, PixelSource};
use image::imageops::{self, FilterType};
use image::{GenericImageView, ImageBuffer, Rgba, RgbaImage};
use std::fmt;
use std::str::FromStr;

/// 缩放后的边长
pub const HASH_SIZE: usize = 32;
/// 低频块边长
pub const SMALLER_SIZE: usize = 8;
/// 指纹位数（去掉直流分量）
pub const HASH_BITS: usize = SMALLER_SIZE * SMALLER_SIZE - 1;

/// N×N 灰度矩阵，行优先 values[y * N + x]，取值 [0, 255]
#[derive(Debug, Clone, PartialEq)]
pub struct IntensityMatrix {
    size: usize,
    values: Vec<f64>,
}

impl IntensityMatrix {
    pub fn from_values(size: usize, values: Vec<f64>) -> Result<Self> {
        if size == 0 || values.len() != size * size {
            return Err(DedupError::SizeMismatch {
                expected: size * size,
                actual: values.len(),
            });
        }
        Ok(Self { size, values })
    }

    /// 整帧缩放到 size×size
    pub fn from_source<S: PixelSource + ?Sized>(src: &S, size: usize) -> Result<Self> {
        validate_source(src)?;
        check_target_size(size)?;
        let (width, height) = src.dimensions();
        let view: ImageBuffer<Rgba<u8>, &[u8]> = ImageBuffer::from_raw(width, height, src.rgba())
            .ok_or(DedupError::BufferSizeMismatch {
                expected: width as usize * height as usize * 4,
                actual: src.rgba().len(),
            })?;
        Ok(Self::downsample(&view, size))
    }

    /// 取帧内矩形区域再缩放到 size×size
    pub fn from_region<S: PixelSource + ?Sized>(
        src: &S,
        x: u32,
        y: u32,
        w: u32,
        h: u32,
        size: usize,
    ) -> Result<Self> {
        validate_source(src)?;
        check_target_size(size)?;
        if w == 0 || h == 0 {
            return Err(DedupError::EmptyFrame { width: w, height: h });
        }

        let (img_w, img_h) = src.dimensions();
        let fits = |start: u32, len: u32, limit: u32| {
            start.checked_add(len).is_some_and(|end| end <= limit)
        };
        if !fits(x, w, img_w) || !fits(y, h, img_h) {
            return Err(DedupError::RegionOutOfBounds {
                x,
                y,
                w,
                h,
                width: img_w,
                height: img_h,
            });
        }

        let data = src.rgba();
        let stride = img_w as usize * 4;
        let row_len = w as usize * 4;
        let mut tile = Vec::with_capacity(row_len * h as usize);
        for row in y as usize..(y + h) as usize {
            let start = row * stride + x as usize * 4;
            tile.extend_from_slice(&data[start..start + row_len]);
        }

        let actual = tile.len();
        let tile = RgbaImage::from_raw(w, h, tile).ok_or(DedupError::BufferSizeMismatch {
            expected: row_len * h as usize,
            actual,
        })?;
        Ok(Self::downsample(&tile, size))
    }

    fn downsample<V>(view: &V, size: usize) -> Self
    where
        V: GenericImageView<Pixel = Rgba<u8>>,
    {
        let resized = imageops::resize(view, size as u32, size as u32, FilterType::Triangle);
        let values = resized
            .pixels()
            .map(|p| 0.299 * p[0] as f64 + 0.587 * p[1] as f64 + 0.114 * p[2] as f64)
            .collect();
        Self { size, values }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

fn check_target_size(size: usize) -> Result<()> {
    if size == 0 {
        return Err(DedupError::SizeMismatch {
            expected: HASH_SIZE,
            actual: size,
        });
    }
    Ok(())
}

/// 定长二进制指纹，第 i 位存在 bits 的第 i 位
///
/// 长度为 0 的指纹代表"无哈希"，与任何指纹的相似度都是 0。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    bits: u64,
    len: u8,
}

impl Fingerprint {
    pub const EMPTY: Fingerprint = Fingerprint { bits: 0, len: 0 };

    /// 按顺序收集位，最多 64 位
    pub fn from_bits<I: IntoIterator<Item = bool>>(bits: I) -> Result<Self> {
        let mut packed = 0u64;
        let mut len = 0usize;
        for bit in bits {
            if len == 64 {
                return Err(DedupError::InvalidFingerprint("超过 64 位".to_string()));
            }
            if bit {
                packed |= 1 << len;
            }
            len += 1;
        }
        Ok(Self {
            bits: packed,
            len: len as u8,
        })
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn bits(&self) -> u64 {
        self.bits
    }

    pub fn bit(&self, i: usize) -> bool {
        i < self.len() && self.bits & (1 << i) != 0
    }

    /// 长度不同返回 None
    pub fn hamming_distance(&self, other: &Fingerprint) -> Option<u32> {
        if self.len != other.len {
            return None;
        }
        Some((self.bits ^ other.bits).count_ones())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..self.len() {
            f.write_str(if self.bit(i) { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl FromStr for Fingerprint {
    type Err = DedupError;

    fn from_str(s: &str) -> Result<Self> {
        let bits = s
            .chars()
            .map(|c| match c {
                '0' => Ok(false),
                '1' => Ok(true),
                _ => Err(DedupError::InvalidFingerprint(s.to_string())),
            })
            .collect::<Result<Vec<_>>>()?;
        Self::from_bits(bits).map_err(|_| DedupError::InvalidFingerprint(s.to_string()))
    }
}

/// pHash 计算
pub struct PerceptualHasher;

impl PerceptualHasher {
    /// 整帧指纹
    pub fn hash_source<S: PixelSource + ?Sized>(src: &S) -> Result<Fingerprint> {
        let matrix = IntensityMatrix::from_source(src, HASH_SIZE)?;
        Self::hash_matrix(&matrix)
    }

    /// 区域指纹
    pub fn hash_region<S: PixelSource + ?Sized>(
        src: &S,
        x: u32,
        y: u32,
        w: u32,
        h: u32,
    ) -> Result<Fingerprint> {
        let matrix = IntensityMatrix::from_region(src, x, y, w, h, HASH_SIZE)?;
        Self::hash_matrix(&matrix)
    }

    /// 只接受 32x32 的灰度矩阵
    pub fn hash_matrix(matrix: &IntensityMatrix) -> Result<Fingerprint> {
        Self::hash_frequencies(&DCT_32.transform(matrix)?)
    }

    /// 低频块二值化：跳过 (0,0)，其余 63 个系数 >= 均值记 1
    pub fn hash_frequencies(freq: &FrequencyMatrix) -> Result<Fingerprint> {
        if freq.size() < SMALLER_SIZE {
            return Err(DedupError::SizeMismatch {
                expected: SMALLER_SIZE,
                actual: freq.size(),
            });
        }

        let low: Vec<f64> = (0..SMALLER_SIZE)
            .flat_map(|u| (0..SMALLER_SIZE).map(move |v| (u, v)))
            .filter(|&pos| pos != (0, 0))
            .map(|(u, v)| freq.get(u, v))
            .collect();

        let mean = low.iter().sum::<f64>() / low.len() as f64;

        let mut bits = 0u64;
        for (i, &c) in low.iter().enumerate() {
            if c >= mean {
                bits |= 1 << i;
            }
        }

        Ok(Fingerprint {
            bits,
            len: HASH_BITS as u8,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame_extractor::dct::DctEngine;
    use crate::frame_extractor::frame::Frame;

    fn checkerboard(width: u32, height: u32, cell: u32) -> Frame {
        let mut data = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                let v = if (x / cell + y / cell) % 2 == 0 { 230 } else { 20 };
                data.extend_from_slice(&[v, v, v, 255]);
            }
        }
        Frame::new(width, height, data, 0, 0)
    }

    #[test]
    fn test_luma_weights() {
        let frame = Frame::solid(40, 40, [200, 100, 50, 255]);
        let matrix = IntensityMatrix::from_source(&frame, HASH_SIZE).unwrap();
        let expected = 0.299 * 200.0 + 0.587 * 100.0 + 0.114 * 50.0;
        assert_eq!(matrix.size(), 32);
        assert!(matrix.values().iter().all(|v| (v - expected).abs() < 1e-9));
    }

    #[test]
    fn test_fingerprint_length_any_aspect() {
        for (w, h) in [(64, 64), (17, 91), (300, 7), (1, 1)] {
            let hash = PerceptualHasher::hash_source(&checkerboard(w, h, 3)).unwrap();
            assert_eq!(hash.len(), HASH_BITS);
            assert_eq!(hash.to_string().len(), 63);
        }
    }

    #[test]
    fn test_hash_is_deterministic() {
        let frame = checkerboard(120, 90, 10);
        let a = PerceptualHasher::hash_source(&frame).unwrap();
        let b = PerceptualHasher::hash_source(&frame).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_solid_black_hash_all_ones() {
        // 全零系数，均值为 0，每一位都满足 >= 均值
        let hash = PerceptualHasher::hash_source(&Frame::solid(64, 64, [0, 0, 0, 255])).unwrap();
        assert_eq!(hash.to_string(), "1".repeat(63));
    }

    #[test]
    fn test_region_hash_matches_cropped_frame() {
        let frame = checkerboard(90, 60, 5);
        let region = PerceptualHasher::hash_region(&frame, 30, 20, 30, 20).unwrap();

        let mut data = Vec::new();
        for y in 20..40u32 {
            let start = ((y * 90 + 30) * 4) as usize;
            data.extend_from_slice(&frame.data[start..start + 30 * 4]);
        }
        let cropped = Frame::new(30, 20, data, 0, 0);
        assert_eq!(region, PerceptualHasher::hash_source(&cropped).unwrap());
    }

    #[test]
    fn test_region_out_of_bounds_rejected() {
        let frame = Frame::solid(10, 10, [0, 0, 0, 255]);
        assert!(PerceptualHasher::hash_region(&frame, 5, 5, 6, 5).is_err());
        assert!(PerceptualHasher::hash_region(&frame, 0, 0, 0, 5).is_err());
    }

    #[test]
    fn test_region_overflowing_offset_rejected() {
        let frame = Frame::solid(10, 10, [0, 0, 0, 255]);
        assert!(matches!(
            PerceptualHasher::hash_region(&frame, u32::MAX, 0, 2, 2),
            Err(DedupError::RegionOutOfBounds { .. })
        ));
        assert!(matches!(
            PerceptualHasher::hash_region(&frame, 0, u32::MAX - 1, 2, 2),
            Err(DedupError::RegionOutOfBounds { .. })
        ));
        assert!(PerceptualHasher::hash_region(&frame, 8, 8, 2, 2).is_ok());
    }

    #[test]
    fn test_non_hash_size_matrix_rejected() {
        let frame = checkerboard(40, 40, 4);
        let small = IntensityMatrix::from_source(&frame, 16).unwrap();
        assert!(matches!(
            PerceptualHasher::hash_matrix(&small),
            Err(DedupError::SizeMismatch { expected: 32, actual: 16 })
        ));

        let full = IntensityMatrix::from_source(&frame, HASH_SIZE).unwrap();
        assert_eq!(
            PerceptualHasher::hash_matrix(&full).unwrap(),
            PerceptualHasher::hash_source(&frame).unwrap()
        );

        assert!(IntensityMatrix::from_source(&frame, 0).is_err());
    }

    #[test]
    fn test_small_frequency_block_rejected() {
        let matrix = IntensityMatrix::from_values(4, vec![1.0; 16]).unwrap();
        let freq = DctEngine::new(4).transform(&matrix).unwrap();
        assert!(matches!(
            PerceptualHasher::hash_frequencies(&freq),
            Err(DedupError::SizeMismatch { expected: 8, actual: 4 })
        ));
    }

    #[test]
    fn test_from_values_checks_length() {
        assert!(matches!(
            IntensityMatrix::from_values(4, vec![0.0; 15]),
            Err(DedupError::SizeMismatch { expected: 16, actual: 15 })
        ));
        assert!(IntensityMatrix::from_values(0, vec![]).is_err());
    }

    #[test]
    fn test_fingerprint_string_roundtrip() {
        let s = "1011001";
        let fp: Fingerprint = s.parse().unwrap();
        assert_eq!(fp.len(), 7);
        assert_eq!(fp.to_string(), s);
        assert!(fp.bit(0));
        assert!(!fp.bit(1));
    }

    #[test]
    fn test_fingerprint_parse_rejects_garbage() {
        assert!("10a1".parse::<Fingerprint>().is_err());
        assert!("1".repeat(65).parse::<Fingerprint>().is_err());
        assert!("".parse::<Fingerprint>().unwrap().is_empty());
    }

    #[test]
    fn test_hamming_distance() {
        let a: Fingerprint = "1111".parse().unwrap();
        let b: Fingerprint = "1001".parse().unwrap();
        let c: Fingerprint = "100".parse().unwrap();
        assert_eq!(a.hamming_distance(&b), Some(2));
        assert_eq!(a.hamming_distance(&a), Some(0));
        assert_eq!(a.hamming_distance(&c), None);
    }
}
