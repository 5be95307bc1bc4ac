pub mod frame;

pub use frame::{Column, DataFrame};
