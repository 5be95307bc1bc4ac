pub mod distribution;
pub mod search;
pub mod selection;
pub mod split;
pub mod validation;

pub use distribution::ParamDistribution;
pub use search::{tune, tune_with, CvResultRow, RandomizedSearch, SearchOptions, SearchResult};
pub use selection::{select_best, CandidateEntry, CandidateSummary, Candidates, SelectionResult};
pub use split::{CvStrategy, Fold, KFold, StratifiedKFold};
pub use validation::{cross_validate, mean_std_cross_val_scores, CvScores};
