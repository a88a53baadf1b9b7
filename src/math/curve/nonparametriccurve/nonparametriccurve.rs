use serde::{
    Deserialize,
    Serialize
};

use crate::math::curve::curve::Curve;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    x: f64,
    y: f64
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Point2D {
        Point2D { x: x, y: y }
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }
}

/// 由離散取樣點建構、定義域為 [min_x, max_x] 的曲線。
pub trait NonparametricCurve: Curve + Send + Sync {
    fn points(&self) -> Vec<Point2D>;

    fn min_x(&self) -> f64;

    fn max_x(&self) -> f64;

    /// 取樣點的 x 值，遞增排列。
    fn knots(&self) -> Vec<f64> {
        self.points()
            .iter()
            .map(|pt| pt.x())
            .collect()
    }

    fn domain(&self) -> (f64, f64) {
        (self.min_x(), self.max_x())
    }

    /// 定義域內求值；定義域外（含 NaN 查詢）回傳 `None`，不外插。
    fn evaluate(&self, x: f64) -> Option<f64> {
        if x >= self.min_x() && x <= self.max_x() {
            Some(self.value(x))
        } else {
            None
        }
    }
}
