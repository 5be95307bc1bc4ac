pub mod scaler;
pub mod encoder;
pub mod column;

pub use scaler::*;
pub use encoder::*;
pub use column::*;
