use thiserror::Error;

/// 曲線建構失敗的原因。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CurveError {
    #[error("at least {required} samples are required, {given} given")]
    TooFewPoints { required: usize, given: usize },

    #[error("x and y sample counts differ (xs={xs}, ys={ys})")]
    LengthMismatch { xs: usize, ys: usize },

    #[error("x samples must be strictly increasing (violated at index {index})")]
    NonIncreasing { index: usize },

    #[error("non-finite sample at index {index}")]
    NonFinite { index: usize },

    #[error("spline moment system is singular")]
    SingularSystem,
}
