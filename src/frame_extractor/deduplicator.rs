use super::error::{DedupError, Result};
use super::frame::PixelSource;
use super::region::RegionSet;
use super::similarity::{compare_region_sets, SimilarityReport};
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// 去重配置，字段名与宿主的设置存储保持一致
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    /// 是否启用重复图片检测
    #[serde(rename = "enableDuplicateDetection")]
    pub enabled: bool,
    /// 相似度阈值 (0-100)，加权相似度 >= 阈值即判为重复
    #[serde(rename = "duplicateThreshold")]
    pub threshold: u32,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: 90,
        }
    }
}

impl DedupConfig {
    pub fn new(enabled: bool, threshold: u32) -> Result<Self> {
        let config = Self { enabled, threshold };
        config.validate()?;
        Ok(config)
    }

    /// 从设置 JSON 解析，缺失字段取默认值
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.threshold > 100 {
            return Err(DedupError::InvalidThreshold(self.threshold));
        }
        Ok(())
    }
}

/// 去重决策结果
#[derive(Debug, Clone, PartialEq)]
pub struct DedupDecision {
    pub is_duplicate: bool,
    pub reason: DedupReason,
    /// 只有真正做过比较时才有
    pub similarity: Option<SimilarityReport>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupReason {
    Disabled,   // 未启用检测，直接保留
    FirstFrame, // 没有基准帧，保留并作为基准
    Distinct,   // 相似度低于阈值，保留并更新基准
    TooSimilar, // 太相似，去重
}

/// 区域感知去重器
///
/// 只保存最后一张被保留的帧的区域指纹，每来一帧就与它比较。
/// 判为重复时基准不变，因此缓慢漂移的画面最终仍会被保留。
/// 调用方需保证按帧顺序串行调用 `evaluate`。
pub struct FrameDeduplicator {
    config: DedupConfig,
    /// 最后保留帧的区域指纹
    retained: Option<RegionSet>,
    /// 跳过的重复帧数量
    skipped_duplicates: u64,
}

impl FrameDeduplicator {
    pub fn new() -> Self {
        Self::with_config(DedupConfig::default())
    }

    pub fn with_config(config: DedupConfig) -> Self {
        Self {
            config,
            retained: None,
            skipped_duplicates: 0,
        }
    }

    pub fn with_threshold(threshold: u32) -> Result<Self> {
        Ok(Self::with_config(DedupConfig::new(true, threshold)?))
    }

    /// 主去重逻辑
    pub fn evaluate<S: PixelSource + ?Sized>(&mut self, src: &S) -> Result<DedupDecision> {
        if !self.config.enabled {
            return Ok(Self::disabled());
        }

        let regions = RegionSet::compute(src)?;
        Ok(self.evaluate_region_set(regions))
    }

    /// 对已算好的区域指纹做决策
    pub fn evaluate_region_set(&mut self, regions: RegionSet) -> DedupDecision {
        if !self.config.enabled {
            return Self::disabled();
        }

        let Some(retained) = self.retained.as_ref() else {
            self.retained = Some(regions);
            return DedupDecision {
                is_duplicate: false,
                reason: DedupReason::FirstFrame,
                similarity: None,
            };
        };

        let report = compare_region_sets(&regions, retained);
        debug!(
            "全局相似度: {:.2}%, 区域相似度范围: {:.2}% - {:.2}%, 加权相似度: {:.2}%",
            report.global, report.min_region, report.max_region, report.weighted
        );

        if report.weighted < self.config.threshold as f64 {
            self.retained = Some(regions);
            return DedupDecision {
                is_duplicate: false,
                reason: DedupReason::Distinct,
                similarity: Some(report),
            };
        }

        self.skipped_duplicates += 1;
        debug!("跳过重复图片，已跳过 {} 张", self.skipped_duplicates);
        DedupDecision {
            is_duplicate: true,
            reason: DedupReason::TooSimilar,
            similarity: Some(report),
        }
    }

    fn disabled() -> DedupDecision {
        DedupDecision {
            is_duplicate: false,
            reason: DedupReason::Disabled,
            similarity: None,
        }
    }

    /// 重新开始采集：清空基准帧和计数
    pub fn reset(&mut self) {
        self.retained = None;
        self.skipped_duplicates = 0;
    }

    /// 更新配置；`fresh_start` 为 false 表示从暂停恢复，保留基准帧和计数
    pub fn apply_config(&mut self, config: DedupConfig, fresh_start: bool) -> Result<()> {
        config.validate()?;
        self.config = config;
        if fresh_start {
            self.reset();
        }
        info!(
            "🔧 去重配置: 启用={}, 阈值={}%",
            config.enabled, config.threshold
        );
        Ok(())
    }

    pub fn config(&self) -> &DedupConfig {
        &self.config
    }

    pub fn retained(&self) -> Option<&RegionSet> {
        self.retained.as_ref()
    }

    pub fn has_baseline(&self) -> bool {
        self.retained.is_some()
    }

    pub fn skipped_duplicates(&self) -> u64 {
        self.skipped_duplicates
    }
}

impl Default for FrameDeduplicator {
    fn default() -> Self {
        Self::new()
    }
}
