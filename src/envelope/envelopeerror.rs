use thiserror::Error;

use crate::math::curve::curveerror::CurveError;

pub type EnvelopeResult<T> = Result<T, EnvelopeError>;

#[derive(Error, Debug)]
pub enum EnvelopeError {
    /// 成員的取樣點沒有任何一個落在 group 目前的 knot 範圍內。
    #[error("member spanning [{}, {}] does not overlap group spanning [{}, {}]", .member.0, .member.1, .group.0, .group.1)]
    NonOverlapping {
        group: (f64, f64),
        member: (f64, f64),
    },

    #[error(transparent)]
    Curve(#[from] CurveError),

    #[error("epsilon must be finite and positive, got {0}")]
    InvalidEpsilon(f64),

    #[error("invalid envelope configuration: {0}")]
    Config(#[from] serde_json::Error),
}
