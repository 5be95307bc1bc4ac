pub mod svm;

pub use svm::{Gamma, Kernel, SVC};
