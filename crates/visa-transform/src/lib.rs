//! Visa data transformation.
//!
//! Turns the ingested CSV splits into numeric arrays:
//!
//! 1. derive `company_age` and drop unused columns ([`features`])
//! 2. encode the target with the fixed `Certified = 0, Denied = 1` mapping
//! 3. fit a [`ColumnTransformer`] on the training features only
//! 4. rebalance with [`SmoteEnn`]
//! 5. persist the fitted [`Preprocessor`] and both arrays, label last

pub mod column_transformer;
pub mod encoders;
mod error;
pub mod features;
pub mod resample;
mod transformation;

pub use column_transformer::{ColumnTransformer, Preprocessor};
pub use encoders::{
    ColumnEncoder, OneHotEncoder, OrdinalEncoder, PowerTransformer, StandardScaler, yeo_johnson,
};
pub use error::{Result, TransformError};
pub use features::{add_company_age, drop_columns, prepare_features, split_target};
pub use resample::{EditedNearestNeighbours, Smote, SmoteEnn};
pub use transformation::DataTransformation;
