use std::fmt;

use tracing::{
    debug,
    trace
};
use uuid::Uuid;

use crate::envelope::envelopeconfig::EnvelopeConfig;
use crate::envelope::envelopeerror::{
    EnvelopeError,
    EnvelopeResult
};
use crate::envelope::groupmember::GroupMember;
use crate::math::curve::nonparametriccurve::{
    NonparametricCurve,
    Point2D
};
use crate::math::curve::nonparametriccurve::piecewisepolynomial::PiecewisePolynomial;

// ─────────────────────────────────────────────
// 重疊判斷
// ─────────────────────────────────────────────
//
// 判斷是「取樣點式」且不對稱的：只看 member 的 knot 是否落在 group 的
// [knots[0], knots[last]] 內，而不是兩個區間求交集。取樣極稀疏時，
// 兩個實際重疊的定義域可能判為不重疊。

fn any_within(member_knots: &[f64], lo: f64, hi: f64) -> bool {
    member_knots.iter().any(|&x| x >= lo && x <= hi)
}

fn any_at_or_above(member_knots: &[f64], lo: f64) -> bool {
    member_knots.iter().any(|&x| x >= lo)
}

fn any_at_or_below(member_knots: &[f64], hi: f64) -> bool {
    member_knots.iter().any(|&x| x <= hi)
}

// ─────────────────────────────────────────────
// HarmonicGroup
// ─────────────────────────────────────────────

/// 一組定義域彼此（經由鏈結）重疊的曲線，以及它們的逐點最大值包絡。
///
/// # 不變量
/// - `knots` 嚴格遞增、無重複
/// - `knots.len() == envelope.len()`
/// - 空 group 的 knots / envelope 皆為空
///
/// `envelope` 在沒有任何成員曲線有定義的 knot 上為 NaN（例如位於外側的
/// 合成邊界 knot），這是合法輸出，由繪圖端自行略過。
pub struct HarmonicGroup {
    id: Uuid,
    config: EnvelopeConfig,
    curves: Vec<Box<dyn NonparametricCurve>>,
    knots: Vec<f64>,
    envelope: Vec<f64>,
}

impl Default for HarmonicGroup {
    fn default() -> Self {
        Self::with_config(EnvelopeConfig::default())
    }
}

impl HarmonicGroup {
    pub fn new() -> HarmonicGroup {
        Self::default()
    }

    pub fn with_config(config: EnvelopeConfig) -> HarmonicGroup {
        HarmonicGroup {
            id: Uuid::new_v4(),
            config,
            curves: Vec::new(),
            knots: Vec::new(),
            envelope: Vec::new(),
        }
    }

    /// 以單一曲線（或既有 group）為種子。
    pub fn from_member<M: GroupMember>(member: M) -> HarmonicGroup {
        Self::from_member_with_config(EnvelopeConfig::default(), member)
    }

    /// 傳入 group 時保留其原本的 config。
    pub fn from_member_with_config<M: GroupMember>(config: EnvelopeConfig, member: M) -> HarmonicGroup {
        member.into_group(config)
    }

    pub fn from_samples(xs: &[f64], ys: &[f64]) -> EnvelopeResult<HarmonicGroup> {
        Self::from_samples_with_config(EnvelopeConfig::default(), xs, ys)
    }

    pub fn from_samples_with_config(
        config: EnvelopeConfig,
        xs: &[f64],
        ys: &[f64],
    ) -> EnvelopeResult<HarmonicGroup> {
        let curve = PiecewisePolynomial::from_samples(config.polynomial_type(), xs, ys)?;
        Ok(curve.into_group(config))
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &EnvelopeConfig {
        &self.config
    }

    pub fn knots(&self) -> &[f64] {
        &self.knots
    }

    pub fn envelope(&self) -> &[f64] {
        &self.envelope
    }

    /// (knot, envelope) 成對輸出，供繪圖端畫成連續／階梯曲線。
    pub fn points(&self) -> Vec<Point2D> {
        self.knots
            .iter()
            .zip(self.envelope.iter())
            .map(|(&x, &y)| Point2D::new(x, y))
            .collect()
    }

    pub fn curves(&self) -> &[Box<dyn NonparametricCurve>] {
        &self.curves
    }

    /// 成員曲線數。
    pub fn len(&self) -> usize {
        self.curves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.knots.is_empty()
    }

    pub fn domain(&self) -> Option<(f64, f64)> {
        match (self.knots.first(), self.knots.last()) {
            (Some(&lo), Some(&hi)) => Some((lo, hi)),
            _ => None,
        }
    }

    /// `member` 是否有任一 knot 落在本 group 的 [knots[0], knots[last]] 內。
    ///
    /// 空 group 沒有範圍，一律回傳 false；第一個成員由 `add` 直接接受。
    pub fn overlaps<M: GroupMember>(&self, member: &M) -> bool {
        self.domain()
            .is_some_and(|(lo, hi)| any_within(&member.member_knots(), lo, hi))
    }

    /// `member` 是否有任一 knot ≥ knots[0]。
    pub fn overlaps_top<M: GroupMember>(&self, member: &M) -> bool {
        self.domain()
            .is_some_and(|(lo, _)| any_at_or_above(&member.member_knots(), lo))
    }

    /// `member` 是否有任一 knot ≤ knots[last]。
    pub fn overlaps_bottom<M: GroupMember>(&self, member: &M) -> bool {
        self.domain()
            .is_some_and(|(_, hi)| any_at_or_below(&member.member_knots(), hi))
    }

    /// 併入一條曲線或另一個 group。
    ///
    /// 非空 group 只接受重疊的成員，否則回傳 `EnvelopeError::NonOverlapping`，
    /// 且本 group 不被修改。
    pub fn add<M: GroupMember>(&mut self, member: M) -> EnvelopeResult<()> {
        if let Some(group) = self.domain() {
            if !self.overlaps(&member) {
                let member = member.member_span().unwrap_or((f64::NAN, f64::NAN));
                return Err(EnvelopeError::NonOverlapping { group, member });
            }
        }
        self.absorb(member);
        Ok(())
    }

    /// 擬合 (xs, ys) 後併入。
    pub fn add_samples(&mut self, xs: &[f64], ys: &[f64]) -> EnvelopeResult<()> {
        let curve = PiecewisePolynomial::from_samples(self.config.polynomial_type(), xs, ys)?;
        self.add(curve)
    }

    /// 不做重疊檢查的合併；呼叫端必須已確認重疊（或本 group 為空）。
    pub(crate) fn absorb<M: GroupMember>(&mut self, member: M) {
        let member_knots = member.member_knots();
        if member_knots.is_empty() {
            return;
        }

        let synthetic = if member.is_group() {
            self.boundary_knots(&member_knots)
        } else {
            Vec::new()
        };

        self.knots.extend_from_slice(&member_knots);
        self.knots.extend_from_slice(&synthetic);
        self.knots.sort_by(f64::total_cmp);
        // 完全相等才去重
        self.knots.dedup();

        self.curves.extend(member.into_curves());
        self.recompute_envelope();

        debug!(
            group = %self.id,
            member_knots = member_knots.len(),
            synthetic = synthetic.len(),
            knots = self.knots.len(),
            curves = self.curves.len(),
            "merged member into harmonic group"
        );
    }

    /// 合併 group 時在交界兩側插入的合成 knot，讓折線繪圖保留階梯。
    ///
    ///   top：    knots[0] - ε，member 最後一點 + ε
    ///   bottom： knots[1] + ε，member 第一點 - ε
    fn boundary_knots(&self, member_knots: &[f64]) -> Vec<f64> {
        let (Some(&first), Some(&last)) = (self.knots.first(), self.knots.last()) else {
            return Vec::new();
        };
        let (Some(&member_first), Some(&member_last)) = (member_knots.first(), member_knots.last()) else {
            return Vec::new();
        };
        let epsilon = self.config.epsilon();

        let mut synthetic = Vec::with_capacity(4);
        if any_at_or_above(member_knots, first) {
            synthetic.push(first - epsilon);
            synthetic.push(member_last + epsilon);
        }
        if any_at_or_below(member_knots, last) {
            let second = self.knots.get(1).copied().unwrap_or(first);
            synthetic.push(second + epsilon);
            synthetic.push(member_first - epsilon);
        }
        synthetic
    }

    fn recompute_envelope(&mut self) {
        let curves = &self.curves;
        self.envelope = self.knots
            .iter()
            .map(|&x| {
                curves
                    .iter()
                    .filter_map(|curve| curve.evaluate(x))
                    .fold(None, |acc: Option<f64>, y| Some(acc.map_or(y, |m| m.max(y))))
                    .unwrap_or(f64::NAN)
            })
            .collect();

        trace!(
            group = %self.id,
            undefined = self.envelope.iter().filter(|y| y.is_nan()).count(),
            "recomputed envelope"
        );
    }
}

impl GroupMember for HarmonicGroup {
    fn member_knots(&self) -> Vec<f64> {
        self.knots.clone()
    }

    fn is_group(&self) -> bool {
        true
    }

    fn into_curves(self) -> Vec<Box<dyn NonparametricCurve>> {
        self.curves
    }

    fn into_group(self, _config: EnvelopeConfig) -> HarmonicGroup {
        self
    }
}

impl fmt::Display for HarmonicGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HarmonicGroup {}: {} knots, {} envelope values, {} curves",
               self.id, self.knots.len(), self.envelope.len(), self.curves.len())
    }
}
