pub mod tensor;
pub mod shape;
pub mod dtype;
pub mod error;
pub mod params;
pub mod estimator;

pub use tensor::Tensor;
pub use shape::Shape;
pub use dtype::Float;
pub use error::{MlError, MlResult};
pub use params::{ParamSet, ParamValue};
pub use estimator::{Estimator, Transformer};
