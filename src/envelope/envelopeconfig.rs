use serde::Deserialize;

use crate::envelope::envelopeerror::{
    EnvelopeError,
    EnvelopeResult
};
use crate::math::curve::nonparametriccurve::piecewisepolynomial::PolynomialType;

pub const DEFAULT_EPSILON: f64 = 1e-6;

#[derive(Deserialize)]
struct EnvelopeConfigJsonProp {
    epsilon: Option<f64>,
    polynomial_type: Option<PolynomialType>,
}

/// 合併與擬合的參數。
///
/// - `epsilon`：合成邊界 knot 與真實邊界的距離（與 x 同單位）
/// - `polynomial_type`：`add_samples` 擬合曲線時使用的 spline 邊界條件
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnvelopeConfig {
    epsilon: f64,
    polynomial_type: PolynomialType,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        EnvelopeConfig {
            epsilon: DEFAULT_EPSILON,
            polynomial_type: PolynomialType::default(),
        }
    }
}

impl EnvelopeConfig {
    pub fn new(epsilon: f64, polynomial_type: PolynomialType) -> EnvelopeResult<EnvelopeConfig> {
        if !epsilon.is_finite() || epsilon <= 0.0 {
            return Err(EnvelopeError::InvalidEpsilon(epsilon));
        }
        Ok(EnvelopeConfig { epsilon, polynomial_type })
    }

    /// 由 JSON 文件建構，缺少的欄位採用預設值。
    ///
    /// ```json
    /// { "epsilon": 1e-6, "polynomial_type": "NaturalCubic" }
    /// ```
    pub fn from_json_str(json: &str) -> EnvelopeResult<EnvelopeConfig> {
        let json_prop: EnvelopeConfigJsonProp = serde_json::from_str(json)?;
        let default = EnvelopeConfig::default();
        Self::new(
            json_prop.epsilon.unwrap_or(default.epsilon),
            json_prop.polynomial_type.unwrap_or(default.polynomial_type),
        )
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn polynomial_type(&self) -> PolynomialType {
        self.polynomial_type
    }
}
