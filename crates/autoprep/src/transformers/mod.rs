//! Column transformers.
//!
//! Every transformer follows the same shape: an unfitted value is configured,
//! `fit` consumes it and learns parameters from one column, and the returned
//! fitted value transforms any column of the same kind. Fitted parameters are
//! private to that value and are dropped once the column is processed.
//!
//! ```rust,ignore
//! use autoprep::transformers::OutlierCapper;
//!
//! let fitted = OutlierCapper::iqr().fit(&series)?;
//! let capped = fitted.transform(&series)?;
//! ```

mod encoders;
mod outliers;
mod scalers;

pub use encoders::{
    DEFAULT_TARGET_SMOOTHING, FittedFrequencyEncoder, FittedOneHotEncoder,
    FittedTargetMeanEncoder, FrequencyEncoder, OneHotEncoder, TargetMeanEncoder,
};
pub use outliers::{
    DEFAULT_Z_THRESHOLD, FittedOutlierCapper, IQR_MULTIPLIER, OutlierCapper, OutlierMethod,
};
pub use scalers::{
    FittedMinMaxScaler, FittedStandardScaler, MinMaxScaler, SKEW_SCALING_THRESHOLD,
    StandardScaler, choose_scaling_method, scale_series,
};
