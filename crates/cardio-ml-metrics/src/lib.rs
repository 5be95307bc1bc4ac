pub mod classification;
pub mod scorer;

pub use classification::*;
pub use scorer::*;
