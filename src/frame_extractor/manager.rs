//! 批量去重管理器

use super::deduplicator::{DedupConfig, FrameDeduplicator};
use super::error::{DedupError, Result};
use super::frame::{Frame, FrameInfo};
use super::region::RegionSet;
use log::{info, warn};
use rayon::prelude::*;
use std::sync::Mutex;

/// 保留下来的帧
#[derive(Debug, Clone)]
pub struct KeptFrame {
    pub info: FrameInfo,
    /// 与基准帧的加权相似度，首帧或未启用检测时为 None
    pub similarity: Option<f64>,
    pub frame: Frame,
}

/// 去重统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DedupStats {
    pub processed_frames: u64,
    pub kept_frames: u64,
    pub skipped_duplicates: u64,
}

/// 批量去重管理器
///
/// 指纹计算与帧顺序无关，用 rayon 并行；决策必须按输入顺序串行，
/// 这样基准帧始终是最后一张被保留的帧。
pub struct FrameDedupManager {
    deduplicator: Mutex<FrameDeduplicator>,
    stats: Mutex<DedupStats>,
}

impl FrameDedupManager {
    pub fn new() -> Self {
        Self::with_config(DedupConfig::default())
    }

    pub fn with_config(config: DedupConfig) -> Self {
        info!(
            "🎬 FrameDedupManager: created (启用={}, 阈值={}%)",
            config.enabled, config.threshold
        );
        Self {
            deduplicator: Mutex::new(FrameDeduplicator::with_config(config)),
            stats: Mutex::new(DedupStats::default()),
        }
    }

    pub fn get_stats(&self) -> DedupStats {
        self.stats.lock().map(|s| *s).unwrap_or_default()
    }

    pub fn reset(&self) {
        if let Ok(mut dedup) = self.deduplicator.lock() {
            dedup.reset();
        }
        if let Ok(mut stats) = self.stats.lock() {
            *stats = DedupStats::default();
        }
    }

    pub fn apply_config(&self, config: DedupConfig, fresh_start: bool) -> Result<()> {
        self.deduplicator
            .lock()
            .map_err(|_| DedupError::LockPoisoned)?
            .apply_config(config, fresh_start)?;
        if fresh_start {
            if let Ok(mut stats) = self.stats.lock() {
                *stats = DedupStats::default();
            }
        }
        Ok(())
    }

    /// 批量处理，返回按输入顺序保留的帧
    pub fn process_batch(&self, frames: Vec<Frame>) -> Vec<KeptFrame> {
        let batch_len = frames.len() as u64;

        let enabled = match self.deduplicator.lock() {
            Ok(dedup) => dedup.config().enabled,
            Err(_) => return Vec::new(),
        };

        // 未启用时不计算指纹
        let hashed: Vec<(Frame, Option<Result<RegionSet>>)> = if enabled {
            frames
                .into_par_iter()
                .map(|f| {
                    let regions = RegionSet::compute(&f);
                    (f, Some(regions))
                })
                .collect()
        } else {
            frames.into_iter().map(|f| (f, None)).collect()
        };

        let mut kept = Vec::new();
        let mut skipped = 0u64;

        if let Ok(mut dedup) = self.deduplicator.lock() {
            let before = dedup.skipped_duplicates();

            for (frame, regions) in hashed {
                let decision = match regions {
                    None => dedup.evaluate(&frame),
                    Some(Ok(regions)) => Ok(dedup.evaluate_region_set(regions)),
                    Some(Err(e)) => Err(e),
                };

                match decision {
                    Ok(decision) if !decision.is_duplicate => {
                        kept.push(KeptFrame {
                            info: FrameInfo::from_frame(&frame),
                            similarity: decision.similarity.map(|r| r.weighted),
                            frame,
                        });
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!("⚠️ 跳过无效帧 #{}: {}", frame.frame_number, e);
                    }
                }
            }

            skipped = dedup.skipped_duplicates() - before;
        }

        if let Ok(mut stats) = self.stats.lock() {
            stats.processed_frames += batch_len;
            stats.kept_frames += kept.len() as u64;
            stats.skipped_duplicates += skipped;
        }

        kept
    }
}

impl Default for FrameDedupManager {
    fn default() -> Self {
        Self::new()
    }
}
