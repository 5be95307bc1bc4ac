pub mod pipeline;

pub use cardio_ml_core::{Estimator, Transformer};
pub use pipeline::*;
