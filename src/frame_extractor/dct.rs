//! 二维 DCT-II（正交归一化）
//!
//! F(u,v) = αu·αv · Σy Σx I(y,x) · cos((2x+1)uπ/2N) · cos((2y+1)vπ/2N)
//! αk = 1/√N (k=0)，否则 √(2/N)
//!
//! 用 rustdct 做可分离的行/列两次一维变换，再统一乘归一化系数，
//! 结果与逐点四重循环公式在浮点误差内一致。

use super::error::{DedupError, Result};
use super::phash::IntensityMatrix;
use once_cell::sync::Lazy;
use rustdct::{Dct2, DctPlanner, TransformType2And3};
use std::sync::Arc;

/// 全图/区域哈希共用的 32 点引擎，进程内只规划一次
pub static DCT_32: Lazy<DctEngine> = Lazy::new(|| DctEngine::new(32));

/// 频域矩阵，按 (u, v) 行优先存储：u 为水平频率，v 为垂直频率
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyMatrix {
    size: usize,
    coeffs: Vec<f64>,
}

impl FrequencyMatrix {
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, u: usize, v: usize) -> f64 {
        self.coeffs[u * self.size + v]
    }

    pub fn coeffs(&self) -> &[f64] {
        &self.coeffs
    }
}

pub struct DctEngine {
    size: usize,
    dct: Arc<dyn TransformType2And3<f64>>,
    alpha: Vec<f64>,
}

impl DctEngine {
    pub fn new(size: usize) -> Self {
        let mut planner = DctPlanner::new();
        let dct = planner.plan_dct2(size);

        let n = size as f64;
        let alpha = (0..size)
            .map(|k| if k == 0 { (1.0 / n).sqrt() } else { (2.0 / n).sqrt() })
            .collect();

        Self { size, dct, alpha }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn transform(&self, matrix: &IntensityMatrix) -> Result<FrequencyMatrix> {
        let n = self.size;
        if matrix.size() != n {
            return Err(DedupError::SizeMismatch {
                expected: n,
                actual: matrix.size(),
            });
        }

        // 行变换：rows[y][u]
        let mut rows = matrix.values().to_vec();
        for row in rows.chunks_exact_mut(n) {
            self.dct.process_dct2(row);
        }

        // 转置后做列变换：coeffs[u][v]
        let mut coeffs = vec![0.0; n * n];
        for y in 0..n {
            for u in 0..n {
                coeffs[u * n + y] = rows[y * n + u];
            }
        }
        for (u, col) in coeffs.chunks_exact_mut(n).enumerate() {
            self.dct.process_dct2(col);
            for (v, c) in col.iter_mut().enumerate() {
                *c *= self.alpha[u] * self.alpha[v];
            }
        }

        Ok(FrequencyMatrix { size: n, coeffs })
    }
}
