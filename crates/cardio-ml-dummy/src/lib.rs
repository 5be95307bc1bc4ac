pub mod dummy;

pub use dummy::{DummyClassifier, Strategy};
