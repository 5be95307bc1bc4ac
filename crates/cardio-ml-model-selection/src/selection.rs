use cardio_ml_core::{Estimator, MlError, MlResult, ParamSet};
use serde::Serialize;
use tracing::info;

use crate::search::SearchResult;

/// A tuned model family: its search result, best validation score and
/// best hyperparameters.
#[derive(Debug, Clone)]
pub struct CandidateEntry {
    pub search: SearchResult,
    pub score: f64,
    pub params: ParamSet,
}

impl CandidateEntry {
    pub fn new(search: SearchResult, score: f64, params: ParamSet) -> Self {
        CandidateEntry {
            search,
            score,
            params,
        }
    }

    /// Entry carrying the search's own best score and parameters.
    pub fn from_search(search: SearchResult) -> Self {
        let score = search.best_score;
        let params = search.best_params.clone();
        CandidateEntry::new(search, score, params)
    }
}

/// Named candidates in insertion order. Inserting an existing name
/// replaces that entry in place.
#[derive(Debug, Clone, Default)]
pub struct Candidates {
    entries: Vec<(String, CandidateEntry)>,
}

impl Candidates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, entry: CandidateEntry) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = entry,
            None => self.entries.push((name, entry)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&CandidateEntry> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, e)| e)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CandidateEntry)> {
        self.entries.iter().map(|(n, e)| (n.as_str(), e))
    }
}

impl FromIterator<(String, CandidateEntry)> for Candidates {
    fn from_iter<I: IntoIterator<Item = (String, CandidateEntry)>>(iter: I) -> Self {
        let mut candidates = Candidates::new();
        for (name, entry) in iter {
            candidates.insert(name, entry);
        }
        candidates
    }
}

/// Score and parameters of one candidate, as reported after selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateSummary {
    pub name: String,
    pub score: f64,
    pub params: ParamSet,
}

/// The winning candidate and a summary of all of them.
#[derive(Debug)]
pub struct SelectionResult {
    pub best_name: String,
    pub best_score: f64,
    /// Fitted final estimator of the winner's best pipeline.
    pub estimator: Box<dyn Estimator>,
    /// One entry per candidate, in insertion order.
    pub summary: Vec<CandidateSummary>,
}

impl SelectionResult {
    pub fn summary_for(&self, name: &str) -> Option<&CandidateSummary> {
        self.summary.iter().find(|s| s.name == name)
    }
}

/// Pick the candidate with the highest score.
///
/// Ties go to the candidate inserted first. Scores may be negative; a NaN
/// score is rejected because it cannot be ordered.
pub fn select_best(candidates: &Candidates) -> MlResult<SelectionResult> {
    let mut best: Option<(&str, &CandidateEntry)> = None;
    let mut summary = Vec::with_capacity(candidates.len());

    for (name, entry) in candidates.iter() {
        if entry.score.is_nan() {
            return Err(MlError::NonComparableScore {
                candidate: name.to_string(),
            });
        }
        info!(
            model = %name,
            score = entry.score,
            params = %entry.params,
            "candidate best score"
        );
        summary.push(CandidateSummary {
            name: name.to_string(),
            score: entry.score,
            params: entry.params.clone(),
        });
        match best {
            Some((_, b)) if entry.score <= b.score => {}
            _ => best = Some((name, entry)),
        }
    }

    let (best_name, winner) = best.ok_or(MlError::EmptyCandidates)?;
    let estimator = winner
        .search
        .best_estimator()
        .filter(|e| e.is_fitted())
        .ok_or_else(|| MlError::MissingEstimator {
            candidate: best_name.to_string(),
        })?
        .clone_box();

    Ok(SelectionResult {
        best_name: best_name.to_string(),
        best_score: winner.score,
        estimator,
        summary,
    })
}
