pub mod charts;
pub mod correlation;
pub mod summary;

pub use charts::*;
pub use correlation::{correlation_matrix, pearson, CorrelationMatrix};
pub use summary::{describe, percentile, ColumnSummary, Summary};
