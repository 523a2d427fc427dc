//! Error types for the `atcsim-world` crate.
//!
//! Lookups never fail with an error; a missing runway or waiting point is an
//! `Option::None`. Errors only arise when a layout is assembled.

use atcsim_types::{RunwayCode, WaitingPointCode};

/// Errors that can occur while building a [`Geography`](crate::Geography).
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// The layout defines no runways at all.
    #[error("airport layout has no runways")]
    NoRunways,

    /// The layout defines no waiting points at all.
    #[error("airport layout has no waiting points")]
    NoWaitingPoints,

    /// Two runway entries share the same code.
    #[error("duplicate runway code: {0}")]
    DuplicateRunway(RunwayCode),

    /// Two waiting-point entries share the same code.
    #[error("duplicate waiting point code: {0}")]
    DuplicateWaitingPoint(WaitingPointCode),

    /// A runway names an opposite end that is not in the layout.
    #[error("runway {runway} names unknown opposite end {opposite}")]
    UnknownOpposite {
        /// The runway whose pairing is broken.
        runway: RunwayCode,
        /// The missing opposite code.
        opposite: RunwayCode,
    },

    /// A runway names itself as its opposite end.
    #[error("runway {0} cannot be its own opposite end")]
    SelfOpposite(RunwayCode),

    /// A coordinate is NaN or infinite.
    #[error("non-finite coordinate for {feature}")]
    NonFiniteCoordinate {
        /// Code of the offending runway or waiting point.
        feature: String,
    },
}
