use cardio_ml_core::Estimator;
use cardio_ml_dummy::{DummyClassifier, Strategy};
use cardio_ml_linear::LogisticRegression;
use cardio_ml_svm::SVC;
use cardio_ml_tree::DecisionTreeClassifier;

/// The default model catalog, in reporting order. Seeded estimators use
/// `random_state`.
pub fn get_models(random_state: u64) -> Vec<(&'static str, Box<dyn Estimator>)> {
    let dummy: Box<dyn Estimator> = Box::new(DummyClassifier::new(Strategy::MostFrequent));
    let tree: Box<dyn Estimator> =
        Box::new(DecisionTreeClassifier::new().with_random_state(random_state));
    let logistic: Box<dyn Estimator> = Box::new(LogisticRegression::new());
    let svm: Box<dyn Estimator> = Box::new(SVC::new().with_random_state(random_state));
    vec![
        ("dummy clf", dummy),
        ("decision tree", tree),
        ("Logistic Regression", logistic),
        ("RBF SVM", svm),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardio_ml_core::ParamValue;

    #[test]
    fn test_catalog_order_and_defaults() {
        let models = get_models(123);
        let names: Vec<&str> = models.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["dummy clf", "decision tree", "Logistic Regression", "RBF SVM"]);

        let steps: Vec<&str> = models.iter().map(|(_, m)| m.name()).collect();
        assert_eq!(steps, vec!["dummyclassifier", "decisiontreeclassifier", "logisticregression", "svc"]);

        let svm = &models[3].1;
        assert_eq!(svm.params().get("kernel"), Some(&ParamValue::from("rbf")));
        assert_eq!(svm.params().get("random_state"), Some(&ParamValue::Int(123)));
        assert!(models.iter().all(|(_, m)| !m.is_fitted()));
    }
}
