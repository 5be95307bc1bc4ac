use std::fmt;

use cardio_ml_core::{Estimator, MlError, MlResult, ParamSet, ParamValue, Tensor, Transformer};

/// Separator between step name and parameter name, e.g. `svc__C`.
pub const STEP_SEPARATOR: &str = "__";

/// A machine learning pipeline: named transformers followed by a named
/// final estimator. Hyperparameters are addressed as `<step>__<param>`.
#[derive(Clone, Default)]
pub struct Pipeline {
    transformers: Vec<(String, Box<dyn Transformer>)>,
    estimator: Option<(String, Box<dyn Estimator>)>,
}

/// Build a pipeline whose steps are named after their lowercase type names,
/// suffixed `-1`, `-2`, ... when a name repeats.
pub fn make_pipeline(
    transformers: Vec<Box<dyn Transformer>>,
    estimator: Box<dyn Estimator>,
) -> Pipeline {
    let mut names: Vec<&'static str> = transformers.iter().map(|t| t.name()).collect();
    names.push(estimator.name());
    let unique = unique_step_names(&names);

    let mut pipeline = Pipeline::new();
    for (t, name) in transformers.into_iter().zip(unique.iter()) {
        pipeline = pipeline.add_transformer(name, t);
    }
    let last = unique.last().cloned().unwrap_or_default();
    pipeline.set_estimator(&last, estimator)
}

fn unique_step_names(names: &[&str]) -> Vec<String> {
    names
        .iter()
        .map(|&n| {
            let total = names.iter().filter(|&&m| m == n).count();
            (n, total)
        })
        .scan(Vec::<&str>::new(), |seen, (n, total)| {
            seen.push(n);
            let k = seen.iter().filter(|&&m| m == n).count();
            Some(if total > 1 { format!("{}-{}", n, k) } else { n.to_string() })
        })
        .collect()
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a transformer step.
    pub fn add_transformer(mut self, name: &str, transformer: Box<dyn Transformer>) -> Self {
        self.transformers.push((name.to_string(), transformer));
        self
    }

    /// Set the final estimator.
    pub fn set_estimator(mut self, name: &str, estimator: Box<dyn Estimator>) -> Self {
        self.estimator = Some((name.to_string(), estimator));
        self
    }

    /// Step names in execution order.
    pub fn step_names(&self) -> Vec<&str> {
        self.transformers
            .iter()
            .map(|(n, _)| n.as_str())
            .chain(self.estimator.iter().map(|(n, _)| n.as_str()))
            .collect()
    }

    /// The final estimator step.
    pub fn estimator(&self) -> MlResult<&dyn Estimator> {
        self.estimator
            .as_ref()
            .map(|(_, e)| e.as_ref())
            .ok_or_else(|| MlError::InvalidOperation("No estimator set".into()))
    }

    /// Name of the final estimator step.
    pub fn estimator_name(&self) -> Option<&str> {
        self.estimator.as_ref().map(|(n, _)| n.as_str())
    }

    /// Set one `<step>__<param>` hyperparameter.
    pub fn set_param(&mut self, name: &str, value: &ParamValue) -> MlResult<()> {
        let (step, param) = name.split_once(STEP_SEPARATOR).ok_or_else(|| {
            MlError::invalid_param(name, "expected '<step>__<param>'")
        })?;
        if let Some((_, est)) = self.estimator.as_mut().filter(|(n, _)| n == step) {
            return est.set_param(param, value);
        }
        match self.transformers.iter().position(|(n, _)| n == step) {
            Some(i) => self.transformers[i].1.set_param(param, value),
            None => Err(MlError::invalid_param(
                name,
                format!("no step named '{}' (steps: {:?})", step, self.step_names()),
            )),
        }
    }

    pub fn set_params(&mut self, params: &ParamSet) -> MlResult<()> {
        for (name, value) in params.iter() {
            self.set_param(name, value)?;
        }
        Ok(())
    }

    /// Hyperparameters of the final estimator, step-prefixed.
    pub fn params(&self) -> ParamSet {
        match &self.estimator {
            Some((name, est)) => est.params().prefixed(name),
            None => ParamSet::new(),
        }
    }

    /// Fit all transformers and the estimator.
    pub fn fit(&mut self, x: &Tensor<f64>, y: &Tensor<f64>) -> MlResult<()> {
        let mut current_x = x.clone();

        for (_, t) in &mut self.transformers {
            current_x = t.fit_transform(&current_x)?;
        }

        match &mut self.estimator {
            Some((_, est)) => est.fit(&current_x, y),
            None => Err(MlError::InvalidOperation("No estimator set".into())),
        }
    }

    /// Transform through all transformers and predict with the estimator.
    pub fn predict(&self, x: &Tensor<f64>) -> MlResult<Tensor<f64>> {
        let mut current_x = x.clone();

        for (_, t) in &self.transformers {
            current_x = t.transform(&current_x)?;
        }

        self.estimator()?.predict(&current_x)
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("steps", &self.step_names())
            .field("params", &self.params())
            .finish()
    }
}
