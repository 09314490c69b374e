use thiserror::Error;

pub type Result<T> = std::result::Result<T, DedupError>;

#[derive(Debug, Error)]
pub enum DedupError {
    #[error("帧尺寸为零: {width}x{height}")]
    EmptyFrame { width: u32, height: u32 },
    #[error("RGBA 数据长度不匹配: 期望 {expected} 字节, 实际 {actual} 字节")]
    BufferSizeMismatch { expected: usize, actual: usize },
    #[error("帧太小无法切分 3x3 区域: {width}x{height}")]
    RegionTooSmall { width: u32, height: u32 },
    #[error("区域越界: ({x}, {y}) {w}x{h} 超出帧 {width}x{height}")]
    RegionOutOfBounds {
        x: u32,
        y: u32,
        w: u32,
        h: u32,
        width: u32,
        height: u32,
    },
    #[error("矩阵尺寸不匹配: 期望 {expected}, 实际 {actual}")]
    SizeMismatch { expected: usize, actual: usize },
    #[error("无效的指纹字符串: {0}")]
    InvalidFingerprint(String),
    #[error("相似度阈值必须在 0-100 之间, 实际为 {0}")]
    InvalidThreshold(u32),
    #[error("去重器锁已失效")]
    LockPoisoned,
    #[error("配置解析失败: {0}")]
    Config(#[from] serde_json::Error),
}
