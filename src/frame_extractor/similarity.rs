use super::phash::Fingerprint;
use super::region::{RegionSet, REGION_COUNT};

/// 加权系数：全局 / 最不相似区域 / 区域均值
const GLOBAL_WEIGHT: f64 = 0.4;
const MIN_REGION_WEIGHT: f64 = 0.4;
const MEAN_REGION_WEIGHT: f64 = 0.2;

/// 线性相似度：100 - floor(100 * 距离 / 长度)
pub fn raw_similarity(distance: u32, len: usize) -> u32 {
    if len == 0 {
        return 0;
    }
    let diff = (distance as f64 / len as f64 * 100.0).floor() as u32;
    100u32.saturating_sub(diff)
}

/// 非线性校正，高相似度区间拉开差距；raw 为 90 和 80 时分别得到 90 和 80
pub fn corrected_similarity(raw: u32) -> f64 {
    let raw = raw as f64;
    if raw >= 90.0 {
        90.0 + (raw - 90.0) * 0.5
    } else if raw > 80.0 {
        80.0 + (raw - 80.0) * 0.8
    } else {
        raw
    }
}

/// 两个指纹的相似度 (0-95)
///
/// 任一为空或长度不同时返回 0，宁可多保留一帧也不误删。
pub fn hash_similarity(a: &Fingerprint, b: &Fingerprint) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    match a.hamming_distance(b) {
        Some(distance) => corrected_similarity(raw_similarity(distance, a.len())),
        None => 0.0,
    }
}

/// 一次比较的全部相似度数据
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityReport {
    pub global: f64,
    pub regions: [f64; REGION_COUNT],
    pub min_region: f64,
    pub max_region: f64,
    pub mean_region: f64,
    pub weighted: f64,
}

impl SimilarityReport {
    pub fn from_scores(global: f64, regions: [f64; REGION_COUNT]) -> Self {
        let min_region = regions.iter().copied().fold(f64::INFINITY, f64::min);
        let max_region = regions.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean_region = regions.iter().sum::<f64>() / REGION_COUNT as f64;

        let weighted =
            GLOBAL_WEIGHT * global + MIN_REGION_WEIGHT * min_region + MEAN_REGION_WEIGHT * mean_region;

        Self {
            global,
            regions,
            min_region,
            max_region,
            mean_region,
            weighted,
        }
    }
}

/// 按位置逐一比较当前帧与保留帧的区域指纹
pub fn compare_region_sets(current: &RegionSet, retained: &RegionSet) -> SimilarityReport {
    let global = hash_similarity(&current.global, &retained.global);

    let mut regions = [0.0; REGION_COUNT];
    for (score, (cur, prev)) in regions
        .iter_mut()
        .zip(current.regions.iter().zip(retained.regions.iter()))
    {
        *score = hash_similarity(cur, prev);
    }

    SimilarityReport::from_scores(global, regions)
}
