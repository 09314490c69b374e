use super::error::{DedupError, Result};
use image::RgbaImage;
use std::time::Duration;

/// 像素来源 - 任何能提供 RGBA 像素的二维图像
pub trait PixelSource {
    /// (宽, 高)
    fn dimensions(&self) -> (u32, u32);

    /// 紧密排列的 RGBA8 数据，行优先，长度为 `width * height * 4`
    fn rgba(&self) -> &[u8];
}

/// 帧数据结构
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>, // RGBA 格式
    pub timestamp: Duration,
    pub frame_number: u64,
}

impl Frame {
    pub fn new(
        width: u32,
        height: u32,
        data: Vec<u8>,
        timestamp_ms: u64,
        frame_number: u64,
    ) -> Self {
        Self {
            width,
            height,
            data,
            timestamp: Duration::from_millis(timestamp_ms),
            frame_number,
        }
    }

    /// 纯色帧，主要用于测试和占位
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let data = rgba
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self::new(width, height, data, 0, 0)
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn timestamp_ms(&self) -> u64 {
        self.timestamp.as_millis() as u64
    }
}

impl PixelSource for Frame {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn rgba(&self) -> &[u8] {
        &self.data
    }
}

impl PixelSource for RgbaImage {
    fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    fn rgba(&self) -> &[u8] {
        self.as_raw()
    }
}

/// 帧元数据（轻量级，用于传递信息）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameInfo {
    pub width: u32,
    pub height: u32,
    pub timestamp_ms: u64,
    pub frame_number: u64,
}

impl FrameInfo {
    pub fn from_frame(frame: &Frame) -> Self {
        Self {
            width: frame.width,
            height: frame.height,
            timestamp_ms: frame.timestamp_ms(),
            frame_number: frame.frame_number,
        }
    }
}

/// 入口校验：零尺寸或缓冲区长度不符的帧直接拒绝
pub fn validate_source<S: PixelSource + ?Sized>(src: &S) -> Result<()> {
    let (width, height) = src.dimensions();
    if width == 0 || height == 0 {
        return Err(DedupError::EmptyFrame { width, height });
    }

    let expected = width as usize * height as usize * 4;
    let actual = src.rgba().len();
    if expected != actual {
        return Err(DedupError::BufferSizeMismatch { expected, actual });
    }

    Ok(())
}
