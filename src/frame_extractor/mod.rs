//! 视频帧去重 - 判断新截取的帧是否与上一张保留帧过于相似
//!
//! 核心策略：
//! 1. 感知哈希 - 32x32 灰度 → DCT → 8x8 低频块与均值比较，得到 63 位指纹
//! 2. 区域感知 - 全局指纹 + 3x3 区域指纹，局部变化（字幕、小物体）不会被平均掉
//! 3. 非线性相似度 - 汉明距离转百分比后在高相似区间拉开差距
//! 4. 基准帧 - 只在保留新帧时更新，重复帧不会改变比较对象

pub mod dct;
pub mod deduplicator;
pub mod error;
pub mod frame;
pub mod manager;
pub mod phash;
pub mod region;
pub mod similarity;

pub use deduplicator::{DedupConfig, DedupDecision, DedupReason, FrameDeduplicator};
pub use error::{DedupError, Result};
pub use frame::{Frame, FrameInfo, PixelSource};
pub use manager::{DedupStats, FrameDedupManager, KeptFrame};
pub use phash::{Fingerprint, PerceptualHasher};
pub use region::{compute_region_set, RegionSet};
pub use similarity::{compare_region_sets, hash_similarity, SimilarityReport};
