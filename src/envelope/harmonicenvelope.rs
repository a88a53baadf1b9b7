use tracing::debug;

use crate::envelope::envelopeconfig::EnvelopeConfig;
use crate::envelope::envelopeerror::EnvelopeResult;
use crate::envelope::groupmember::GroupMember;
use crate::envelope::harmonicgroup::HarmonicGroup;
use crate::math::curve::nonparametriccurve::Point2D;
use crate::math::curve::nonparametriccurve::piecewisepolynomial::PiecewisePolynomial;

/// 彼此不重疊的 `HarmonicGroup` 集合。
///
/// 每次插入時，所有與新成員重疊的 group 會和它合併成一個新的 group，
/// 取代原本的那些 group；沒有重疊則新增一個 group。
/// `groups()` 的順序不具意義。
pub struct HarmonicEnvelope {
    name: String,
    config: EnvelopeConfig,
    groups: Vec<HarmonicGroup>,
}

impl Default for HarmonicEnvelope {
    fn default() -> Self {
        Self::with_config("", EnvelopeConfig::default())
    }
}

impl HarmonicEnvelope {
    pub fn new() -> HarmonicEnvelope {
        Self::default()
    }

    pub fn named(name: &str) -> HarmonicEnvelope {
        Self::with_config(name, EnvelopeConfig::default())
    }

    pub fn with_config(name: &str, config: EnvelopeConfig) -> HarmonicEnvelope {
        HarmonicEnvelope {
            name: name.to_owned(),
            config,
            groups: Vec::new(),
        }
    }

    pub fn from_member<M: GroupMember>(member: M) -> HarmonicEnvelope {
        let mut envelope = Self::default();
        envelope.insert(member);
        envelope
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &EnvelopeConfig {
        &self.config
    }

    pub fn groups(&self) -> &[HarmonicGroup] {
        &self.groups
    }

    pub fn into_groups(self) -> Vec<HarmonicGroup> {
        self.groups
    }

    /// 每個 group 的 (knot, envelope) 序列。
    pub fn points(&self) -> Vec<Vec<Point2D>> {
        self.groups
            .iter()
            .map(|group| group.points())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// 插入一條曲線或一個 group。
    ///
    /// 曲線：以曲線為種子建立新 group，依序併入所有重疊的 group。
    /// group：以傳入的 group 本身累積合併結果。空 group 直接忽略。
    ///
    /// 是否重疊由既有 group 判斷（`group.overlaps(member)`），合併時不再反向
    /// 檢查，所以這裡不會產生 `NonOverlapping`。
    pub fn insert<M: GroupMember>(&mut self, member: M) {
        if member.member_knots().is_empty() {
            debug!(envelope = %self.name, "ignored empty member");
            return;
        }

        let overlapping: Vec<bool> = self.groups
            .iter()
            .map(|group| group.overlaps(&member))
            .collect();
        let mut merged = member.into_group(self.config);

        let mut kept = Vec::with_capacity(self.groups.len() + 1);
        let mut absorbed = Vec::new();
        for (index, group) in std::mem::take(&mut self.groups).into_iter().enumerate() {
            if overlapping[index] {
                absorbed.push(index);
                merged.absorb(group);
            } else {
                kept.push(group);
            }
        }
        kept.push(merged);
        self.groups = kept;

        debug!(
            envelope = %self.name,
            absorbed = ?absorbed,
            groups = self.groups.len(),
            "inserted member into harmonic envelope"
        );
    }

    /// 擬合 (xs, ys) 後插入。
    pub fn add_samples(&mut self, xs: &[f64], ys: &[f64]) -> EnvelopeResult<()> {
        let curve = PiecewisePolynomial::from_samples(self.config.polynomial_type(), xs, ys)?;
        self.insert(curve);
        Ok(())
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn curve_samples() -> impl Strategy<Value = (Vec<f64>, Vec<f64>)> {
        (0u32..60, 0.5f64..4.0, prop::collection::vec(-10.0f64..10.0, 2..12))
            .prop_map(|(start, step, ys)| {
                let xs = (0..ys.len())
                    .map(|i| f64::from(start) + step * i as f64)
                    .collect();
                (xs, ys)
            })
    }

    proptest! {
        #[test]
        fn groups_keep_knot_invariants(curves in prop::collection::vec(curve_samples(), 1..8)) {
            let mut envelope = HarmonicEnvelope::new();
            for (xs, ys) in &curves {
                prop_assert!(envelope.add_samples(xs, ys).is_ok());
            }

            let total: usize = envelope.groups().iter().map(|group| group.len()).sum();
            prop_assert_eq!(total, curves.len());

            for group in envelope.groups() {
                prop_assert!(group.knots().windows(2).all(|w| w[0] < w[1]));
                prop_assert_eq!(group.knots().len(), group.envelope().len());

                for (&x, &value) in group.knots().iter().zip(group.envelope().iter()) {
                    for curve in group.curves() {
                        if let Some(y) = curve.evaluate(x) {
                            prop_assert!(value >= y);
                        }
                    }
                }
            }
        }
    }
}
