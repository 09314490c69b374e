pub mod frame_extractor;

pub use frame_extractor::{
    compute_region_set, DedupConfig, DedupDecision, DedupError, DedupReason, DedupStats,
    Fingerprint, Frame, FrameDedupManager, FrameDeduplicator, PixelSource, RegionSet,
};

pub fn init_logging() {
    #[cfg(target_os = "android")]
    {
        android_logger::init_once(
            android_logger::Config::default()
                .with_max_level(log::LevelFilter::Debug)
                .with_tag("frame_dedup_rust"),
        );
    }

    #[cfg(not(target_os = "android"))]
    {
        // 重复调用时忽略错误
        let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .try_init();
    }
}
