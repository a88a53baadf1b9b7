use crate::envelope::envelopeconfig::EnvelopeConfig;
use crate::envelope::harmonicgroup::HarmonicGroup;
use crate::math::curve::nonparametriccurve::NonparametricCurve;
use crate::math::curve::nonparametriccurve::piecewisepolynomial::PiecewisePolynomial;

/// 可以併入 `HarmonicGroup` 的東西：單一曲線或另一個 group。
///
/// 合併邏輯只透過這個介面取得成員的 knot 與曲線，
/// 不需要判斷具體型別。
pub trait GroupMember {
    /// 成員的取樣 x 值（遞增）。曲線為其取樣點，group 為其目前的 knots。
    fn member_knots(&self) -> Vec<f64>;

    /// 帶有既有階梯結構的成員（group）合併時需要合成邊界 knot。
    fn is_group(&self) -> bool {
        false
    }

    fn into_curves(self) -> Vec<Box<dyn NonparametricCurve>>;

    /// 以此成員為種子建立 group。
    fn into_group(self, config: EnvelopeConfig) -> HarmonicGroup where Self: Sized {
        let mut group = HarmonicGroup::with_config(config);
        group.absorb(self);
        group
    }

    fn member_span(&self) -> Option<(f64, f64)> {
        let knots = self.member_knots();
        match (knots.first(), knots.last()) {
            (Some(&lo), Some(&hi)) => Some((lo, hi)),
            _ => None,
        }
    }
}

impl GroupMember for Box<dyn NonparametricCurve> {
    fn member_knots(&self) -> Vec<f64> {
        self.as_ref().knots()
    }

    fn into_curves(self) -> Vec<Box<dyn NonparametricCurve>> {
        vec![self]
    }
}

impl GroupMember for PiecewisePolynomial {
    fn member_knots(&self) -> Vec<f64> {
        NonparametricCurve::knots(self)
    }

    fn into_curves(self) -> Vec<Box<dyn NonparametricCurve>> {
        vec![Box::new(self)]
    }
}
