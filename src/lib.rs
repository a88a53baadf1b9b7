pub mod envelope {
    pub mod envelopeconfig;
    pub mod envelopeerror;
    pub mod groupmember;
    pub mod harmonicgroup;
    pub mod harmonicenvelope;
}

pub mod math {
    pub mod curve {
        pub mod curve;
        pub mod curveerror;
        pub mod nonparametriccurve {
            pub mod nonparametriccurve;
            pub mod piecewisepolynomial;

            pub use self::nonparametriccurve::{
                NonparametricCurve,
                Point2D
            };
        }
    }
}
