use nalgebra::{
    DMatrix,
    DVector
};
use serde::{
    Deserialize,
    Serialize
};

use crate::math::curve::curve::Curve;
use crate::math::curve::curveerror::CurveError;
use crate::math::curve::nonparametriccurve::{
    NonparametricCurve,
    Point2D
};

// ─────────────────────────────────────────────
// Subpolynomial
// ─────────────────────────────────────────────

struct Subpolynomial {
    /// Horner 形式 [d, c, b, a]
    coefs: [f64; 4],
    deriv_coefs: [f64; 3],
    lhs_x: f64,
}

impl Subpolynomial {
    fn new(coefs: [f64; 4], lhs_x: f64) -> Subpolynomial {
        let deriv_coefs = [3.0 * coefs[0], 2.0 * coefs[1], coefs[2]];
        Subpolynomial { coefs, deriv_coefs, lhs_x }
    }

    fn value(&self, x: f64) -> f64 {
        horner(&self.coefs, x - self.lhs_x)
    }

    fn derivative(&self, x: f64) -> f64 {
        horner(&self.deriv_coefs, x - self.lhs_x)
    }
}

fn horner(coefs: &[f64], x_diff: f64) -> f64 {
    let mut result = coefs[0];
    for &beta in &coefs[1..] {
        result = f64::mul_add(result, x_diff, beta);
    }
    result
}

// ─────────────────────────────────────────────
// 共用輔助函數
// ─────────────────────────────────────────────

/// 從各節點的二階導數（moments）m[0..=n] 計算各區間的三次多項式係數。
///
/// 每段多項式以 Horner 形式存成 [d, c, b, a]，對應：
///   S_i(x) = a + b*(x-x_i) + c*(x-x_i)^2 + d*(x-x_i)^3
fn cubic_coefs_from_moments(points: &[Point2D], h: &[f64], m: &[f64]) -> Vec<[f64; 4]> {
    (0..h.len())
        .map(|i| {
            let d = (m[i + 1] - m[i]) / (6.0 * h[i]);
            let c = m[i] / 2.0;
            let b = (points[i + 1].y() - points[i].y()) / h[i]
                  - h[i] * (2.0 * m[i] + m[i + 1]) / 6.0;
            let a = points[i].y();
            [d, c, b, a]
        })
        .collect()
}

fn interval_widths(points: &[Point2D]) -> Vec<f64> {
    points
        .windows(2)
        .map(|pair| pair[1].x() - pair[0].x())
        .collect()
}

// ─────────────────────────────────────────────
// CubicSpline（Natural / Clamped / NotAKnot）
// ─────────────────────────────────────────────
//
// 三種邊界條件共用同一個架構：
//   建立 (n+1)×(n+1) 的聯立方程組，求解各節點的二階導數 m[0..=n]，
//   內部方程式由 C² 連續性導出：
//     h[i-1]*m[i-1] + 2*(h[i-1]+h[i])*m[i] + h[i]*m[i+1]
//       = 6*( (y[i+1]-y[i])/h[i] - (y[i]-y[i-1])/h[i-1] )
//   第 0 列與第 n 列依邊界條件設定。

fn build_interior_system(points: &[Point2D], h: &[f64]) -> (DMatrix<f64>, DVector<f64>) {
    let n = h.len();
    let mut mat = DMatrix::<f64>::zeros(n + 1, n + 1);
    let mut rhs = DVector::<f64>::zeros(n + 1);

    for i in 1..n {
        mat[(i, i - 1)] = h[i - 1];
        mat[(i, i)]     = 2.0 * (h[i - 1] + h[i]);
        mat[(i, i + 1)] = h[i];
        rhs[i] = 6.0 * (
            (points[i + 1].y() - points[i].y()) / h[i]
          - (points[i].y()     - points[i - 1].y()) / h[i - 1]
        );
    }
    (mat, rhs)
}

fn solve_moments(mat: DMatrix<f64>, rhs: DVector<f64>) -> Result<Vec<f64>, CurveError> {
    let m = mat
        .lu()
        .solve(&rhs)
        .ok_or(CurveError::SingularSystem)?;
    if m.iter().any(|v| !v.is_finite()) {
        return Err(CurveError::SingularSystem);
    }
    Ok(m.iter().copied().collect())
}

/// Natural：端點的二階導數為 0（m[0] = m[n] = 0）
fn generate_natural_cubic_coef_list(points: &[Point2D]) -> Result<Vec<[f64; 4]>, CurveError> {
    let h = interval_widths(points);
    let n = h.len();

    let (mut mat, rhs) = build_interior_system(points, &h);
    mat[(0, 0)] = 1.0;
    mat[(n, n)] = 1.0;

    let m = solve_moments(mat, rhs)?;
    Ok(cubic_coefs_from_moments(points, &h, &m))
}

/// Clamped：端點的一階導數為指定值
///
///   左端：2*h[0]*m[0] + h[0]*m[1]
///           = 6*( (y[1]-y[0])/h[0] - deriv_left )
///   右端：h[n-1]*m[n-1] + 2*h[n-1]*m[n]
///           = 6*( deriv_right - (y[n]-y[n-1])/h[n-1] )
fn generate_clamped_cubic_coef_list(
    points: &[Point2D],
    deriv_left: f64,
    deriv_right: f64,
) -> Result<Vec<[f64; 4]>, CurveError> {
    let h = interval_widths(points);
    let n = h.len();

    let (mut mat, mut rhs) = build_interior_system(points, &h);

    mat[(0, 0)] = 2.0 * h[0];
    mat[(0, 1)] = h[0];
    rhs[0] = 6.0 * ((points[1].y() - points[0].y()) / h[0] - deriv_left);

    mat[(n, n - 1)] = h[n - 1];
    mat[(n, n)]     = 2.0 * h[n - 1];
    rhs[n] = 6.0 * (deriv_right - (points[n].y() - points[n - 1].y()) / h[n - 1]);

    let m = solve_moments(mat, rhs)?;
    Ok(cubic_coefs_from_moments(points, &h, &m))
}

/// Not-a-knot：第三導數在 x[1] 與 x[n-1] 處連續。
///
///   在 x[1]：  -h[1]*m[0] + (h[0]+h[1])*m[1] - h[0]*m[2] = 0
///   在 x[n-1]：-h[n-1]*m[n-2] + (h[n-2]+h[n-1])*m[n-1] - h[n-2]*m[n] = 0
///
/// 點數不足時退化：
///   2 點 → 直線（m 全為 0）
///   3 點 → 通過三點的拋物線（m 為常數）
fn generate_not_a_knot_cubic_coef_list(points: &[Point2D]) -> Result<Vec<[f64; 4]>, CurveError> {
    let h = interval_widths(points);
    let n = h.len();

    if n == 1 {
        return Ok(cubic_coefs_from_moments(points, &h, &[0.0, 0.0]));
    }
    if n == 2 {
        let s0 = (points[1].y() - points[0].y()) / h[0];
        let s1 = (points[2].y() - points[1].y()) / h[1];
        let moment = 2.0 * (s1 - s0) / (h[0] + h[1]);
        return Ok(cubic_coefs_from_moments(points, &h, &[moment; 3]));
    }

    let (mut mat, rhs) = build_interior_system(points, &h);

    mat[(0, 0)] = -h[1];
    mat[(0, 1)] =  h[0] + h[1];
    mat[(0, 2)] = -h[0];

    mat[(n, n - 2)] = -h[n - 1];
    mat[(n, n - 1)] =  h[n - 2] + h[n - 1];
    mat[(n, n)]     = -h[n - 2];

    let m = solve_moments(mat, rhs)?;
    Ok(cubic_coefs_from_moments(points, &h, &m))
}

// ─────────────────────────────────────────────
// PolynomialType
// ─────────────────────────────────────────────

#[derive(PartialEq, Eq, Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub enum PolynomialType {
    NaturalCubic,
    /// 端點一階導數固定為 0.0
    ClampedCubic,
    /// 與 scipy `CubicSpline` 預設一致；2、3 點時退化為直線、拋物線
    #[default]
    NotAKnotCubic,
}

const NECESSARY_POINTS: usize = 2;

fn validate_points(points: &[Point2D]) -> Result<(), CurveError> {
    if points.len() < NECESSARY_POINTS {
        return Err(CurveError::TooFewPoints {
            required: NECESSARY_POINTS,
            given: points.len(),
        });
    }
    if let Some(index) = points
        .iter()
        .position(|pt| !pt.x().is_finite() || !pt.y().is_finite()) {
        return Err(CurveError::NonFinite { index });
    }
    if let Some(index) = points
        .windows(2)
        .position(|pair| pair[1].x() <= pair[0].x()) {
        return Err(CurveError::NonIncreasing { index: index + 1 });
    }
    Ok(())
}

// ─────────────────────────────────────────────
// PiecewisePolynomial
// ─────────────────────────────────────────────

/// 通過取樣點的 C² 三次 spline。
pub struct PiecewisePolynomial {
    polynomial_type: PolynomialType,
    points: Vec<Point2D>,
    subpolynomial_list: Vec<Subpolynomial>,
}

impl PiecewisePolynomial {
    pub fn new(
        polynomial_type: PolynomialType,
        points: Vec<Point2D>,
    ) -> Result<PiecewisePolynomial, CurveError> {
        validate_points(&points)?;

        let coef_list = match polynomial_type {
            PolynomialType::NaturalCubic  => generate_natural_cubic_coef_list(&points)?,
            PolynomialType::ClampedCubic  => generate_clamped_cubic_coef_list(&points, 0.0, 0.0)?,
            PolynomialType::NotAKnotCubic => generate_not_a_knot_cubic_coef_list(&points)?,
        };

        let subpolynomial_list = coef_list
            .into_iter()
            .zip(points.iter())
            .map(|(coefs, pt)| Subpolynomial::new(coefs, pt.x()))
            .collect();

        Ok(PiecewisePolynomial {
            polynomial_type,
            points,
            subpolynomial_list,
        })
    }

    pub fn from_samples(
        polynomial_type: PolynomialType,
        xs: &[f64],
        ys: &[f64],
    ) -> Result<PiecewisePolynomial, CurveError> {
        if xs.len() != ys.len() {
            return Err(CurveError::LengthMismatch { xs: xs.len(), ys: ys.len() });
        }
        let points = xs
            .iter()
            .zip(ys.iter())
            .map(|(&x, &y)| Point2D::new(x, y))
            .collect();
        Self::new(polynomial_type, points)
    }

    pub fn polynomial_type(&self) -> PolynomialType {
        self.polynomial_type
    }

    fn find_segment(&self, x: f64) -> usize {
        let last = self.subpolynomial_list.len() - 1;
        if x <= self.min_x() {
            0
        } else if x >= self.max_x() {
            last
        } else {
            // NaN 落到這裡，partition_point 為 0
            self.subpolynomial_list
                .partition_point(|s| s.lhs_x <= x)
                .saturating_sub(1)
                .min(last)
        }
    }
}

// ─────────────────────────────────────────────
// Trait 實作
// ─────────────────────────────────────────────

impl NonparametricCurve for PiecewisePolynomial {
    fn points(&self) -> Vec<Point2D> {
        self.points.clone()
    }

    fn min_x(&self) -> f64 {
        self.points[0].x()
    }

    fn max_x(&self) -> f64 {
        self.points[self.points.len() - 1].x()
    }

    fn knots(&self) -> Vec<f64> {
        self.points.iter().map(|pt| pt.x()).collect()
    }
}

impl Curve for PiecewisePolynomial {
    fn value(&self, x: f64) -> f64 {
        let i = self.find_segment(x);
        self.subpolynomial_list[i].value(x)
    }

    fn derivative(&self, x: f64) -> f64 {
        let i = self.find_segment(x);
        self.subpolynomial_list[i].derivative(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-9;

    fn spline(polynomial_type: PolynomialType, xs: &[f64], ys: &[f64]) -> PiecewisePolynomial {
        PiecewisePolynomial::from_samples(polynomial_type, xs, ys).unwrap()
    }

    #[test]
    fn passes_through_samples() {
        let xs = [0.0, 1.0, 2.5, 3.0, 4.2];
        let ys = [1.0, -2.0, 0.5, 3.0, 2.0];
        for polynomial_type in [
            PolynomialType::NaturalCubic,
            PolynomialType::ClampedCubic,
            PolynomialType::NotAKnotCubic,
        ] {
            let s = spline(polynomial_type, &xs, &ys);
            for (&x, &y) in xs.iter().zip(ys.iter()) {
                assert!((s.value(x) - y).abs() < TOL, "{polynomial_type:?} at x={x}");
            }
        }
    }

    #[test]
    fn not_a_knot_reproduces_cubic() {
        let f = |x: f64| x * x * x - 2.0 * x + 1.0;
        let xs = [-2.0, -0.5, 0.0, 1.0, 3.0];
        let ys: Vec<f64> = xs.iter().map(|&x| f(x)).collect();
        let s = spline(PolynomialType::NotAKnotCubic, &xs, &ys);
        for x in [-1.7, -0.25, 0.4, 2.2, 2.9] {
            assert!((s.value(x) - f(x)).abs() < 1e-8, "x={x}");
        }
    }

    #[test]
    fn not_a_knot_degenerates_for_few_points() {
        let line = spline(PolynomialType::NotAKnotCubic, &[0.0, 2.0], &[1.0, 5.0]);
        assert!((line.value(0.5) - 2.0).abs() < TOL);

        let parabola = spline(PolynomialType::NotAKnotCubic, &[0.0, 1.0, 3.0], &[0.0, 1.0, 9.0]);
        assert!((parabola.value(2.0) - 4.0).abs() < TOL);
        assert!((parabola.derivative(2.0) - 4.0).abs() < TOL);
    }

    #[test]
    fn natural_reproduces_line() {
        let s = spline(PolynomialType::NaturalCubic, &[0.0, 1.0, 2.0, 5.0], &[1.0, 3.0, 5.0, 11.0]);
        assert!((s.value(3.5) - 8.0).abs() < TOL);
        assert!((s.derivative(0.3) - 2.0).abs() < TOL);
    }

    #[test]
    fn clamped_has_flat_ends() {
        let s = spline(PolynomialType::ClampedCubic, &[0.0, 1.0, 2.0, 4.0], &[0.0, 2.0, 1.0, 3.0]);
        assert!(s.derivative(0.0).abs() < TOL);
        assert!(s.derivative(4.0).abs() < TOL);
    }

    #[test]
    fn derivative_is_continuous_at_interior_knots() {
        let s = spline(PolynomialType::NotAKnotCubic, &[0.0, 1.0, 2.0, 3.0, 5.0], &[0.0, 1.0, 0.0, 2.0, 1.0]);
        for x in [1.0, 2.0, 3.0] {
            let lhs = s.derivative(x - 1e-9);
            let rhs = s.derivative(x + 1e-9);
            assert!((lhs - rhs).abs() < 1e-6, "x={x}");
        }
    }

    #[test]
    fn evaluate_is_bounded_to_domain() {
        let s = spline(PolynomialType::NotAKnotCubic, &[1.0, 2.0, 3.0, 4.0], &[1.0, 4.0, 9.0, 16.0]);
        assert_eq!(s.domain(), (1.0, 4.0));
        assert!(s.evaluate(0.999).is_none());
        assert!(s.evaluate(4.001).is_none());
        assert!(s.evaluate(f64::NAN).is_none());
        assert!((s.evaluate(1.0).unwrap() - 1.0).abs() < TOL);
        assert!((s.evaluate(4.0).unwrap() - 16.0).abs() < TOL);
    }

    #[test]
    fn value_of_nan_is_nan() {
        let s = spline(PolynomialType::NotAKnotCubic, &[0.0, 1.0, 2.0, 3.0], &[0.0, 1.0, 0.0, 1.0]);
        assert!(s.value(f64::NAN).is_nan());
        assert!(s.derivative(f64::NAN).is_nan());
    }

    #[test]
    fn knots_are_the_sample_xs() {
        let xs = [0.1, 0.2, 0.7];
        let s = spline(PolynomialType::NaturalCubic, &xs, &[1.0, 2.0, 3.0]);
        assert_eq!(NonparametricCurve::knots(&s), xs.to_vec());
    }

    #[test]
    fn rejects_invalid_samples() {
        let err = PiecewisePolynomial::from_samples(PolynomialType::NotAKnotCubic, &[1.0], &[1.0]);
        assert_eq!(err.err(), Some(CurveError::TooFewPoints { required: 2, given: 1 }));

        let err = PiecewisePolynomial::from_samples(PolynomialType::NotAKnotCubic, &[1.0, 2.0], &[1.0]);
        assert_eq!(err.err(), Some(CurveError::LengthMismatch { xs: 2, ys: 1 }));

        let err = PiecewisePolynomial::from_samples(PolynomialType::NotAKnotCubic, &[1.0, 3.0, 3.0], &[1.0, 2.0, 3.0]);
        assert_eq!(err.err(), Some(CurveError::NonIncreasing { index: 2 }));

        let err = PiecewisePolynomial::from_samples(PolynomialType::NaturalCubic, &[1.0, 2.0], &[f64::NAN, 2.0]);
        assert_eq!(err.err(), Some(CurveError::NonFinite { index: 0 }));
    }
}
