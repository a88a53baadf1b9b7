/// 一維曲線：在任意 x 求值（可外插）。
///
/// 有界定義域與「定義域外回傳 None」的語意由 `NonparametricCurve` 補上。
pub trait Curve {
    fn value(&self, x: f64) -> f64;

    fn derivative(&self, x: f64) -> f64;
}
