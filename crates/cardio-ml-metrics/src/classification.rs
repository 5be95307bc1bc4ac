use cardio_ml_core::{Float, MlError, MlResult, Tensor};

fn check_lengths<T: Float>(y_true: &Tensor<T>, y_pred: &Tensor<T>) -> MlResult<()> {
    if y_true.numel() != y_pred.numel() {
        return Err(MlError::ShapeMismatch {
            expected: vec![y_true.numel()],
            got: vec![y_pred.numel()],
        });
    }
    Ok(())
}

fn class_of<T: Float>(v: T) -> usize {
    v.to_f64().round().max(0.0) as usize
}

/// Fraction of correct predictions.
pub fn accuracy<T: Float>(y_true: &Tensor<T>, y_pred: &Tensor<T>) -> MlResult<f64> {
    check_lengths(y_true, y_pred)?;
    let n = y_true.numel();
    if n == 0 {
        return Err(MlError::EmptyTensor);
    }
    let correct = y_true
        .data()
        .iter()
        .zip(y_pred.data())
        .filter(|(a, b)| class_of(**a) == class_of(**b))
        .count();
    Ok(correct as f64 / n as f64)
}

/// Confusion matrix `[true class][predicted class]`.
pub fn confusion_matrix<T: Float>(
    y_true: &Tensor<T>,
    y_pred: &Tensor<T>,
    n_classes: usize,
) -> MlResult<Vec<Vec<usize>>> {
    check_lengths(y_true, y_pred)?;
    let mut matrix = vec![vec![0usize; n_classes]; n_classes];
    for (&t, &p) in y_true.data().iter().zip(y_pred.data()) {
        let (ti, pi) = (class_of(t), class_of(p));
        if ti < n_classes && pi < n_classes {
            matrix[ti][pi] += 1;
        }
    }
    Ok(matrix)
}

/// True positives, false positives and false negatives for one class.
fn binary_counts<T: Float>(
    y_true: &Tensor<T>,
    y_pred: &Tensor<T>,
    class: usize,
) -> MlResult<(usize, usize, usize)> {
    check_lengths(y_true, y_pred)?;
    let (mut tp, mut fp, mut fn_) = (0, 0, 0);
    for (&t, &p) in y_true.data().iter().zip(y_pred.data()) {
        match (class_of(t) == class, class_of(p) == class) {
            (true, true) => tp += 1,
            (false, true) => fp += 1,
            (true, false) => fn_ += 1,
            (false, false) => {}
        }
    }
    Ok((tp, fp, fn_))
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Precision for a specific class; 0 when nothing was predicted as it.
pub fn precision_class<T: Float>(y_true: &Tensor<T>, y_pred: &Tensor<T>, class: usize) -> MlResult<f64> {
    let (tp, fp, _) = binary_counts(y_true, y_pred, class)?;
    Ok(ratio(tp, tp + fp))
}

/// Recall for a specific class; 0 when the class never occurs.
pub fn recall_class<T: Float>(y_true: &Tensor<T>, y_pred: &Tensor<T>, class: usize) -> MlResult<f64> {
    let (tp, _, fn_) = binary_counts(y_true, y_pred, class)?;
    Ok(ratio(tp, tp + fn_))
}

/// F-beta score for the class `pos_class`.
///
/// F_β = (1 + β²)·P·R / (β²·P + R)
///
/// β > 1 weights recall higher, β < 1 weights precision higher. The score
/// is 0 when both precision and recall are 0.
pub fn fbeta_score<T: Float>(
    y_true: &Tensor<T>,
    y_pred: &Tensor<T>,
    pos_class: usize,
    beta: f64,
) -> MlResult<f64> {
    validate_beta(beta)?;
    let (tp, fp, fn_) = binary_counts(y_true, y_pred, pos_class)?;
    let b2 = beta * beta;
    // Equivalent to the P/R form, without the intermediate divisions.
    let num = (1.0 + b2) * tp as f64;
    let den = num + b2 * fn_ as f64 + fp as f64;
    Ok(if den == 0.0 { 0.0 } else { num / den })
}

/// F1 score for a specific class.
pub fn f1_score_class<T: Float>(y_true: &Tensor<T>, y_pred: &Tensor<T>, class: usize) -> MlResult<f64> {
    fbeta_score(y_true, y_pred, class, 1.0)
}

/// Beta must be a strictly positive finite number.
pub fn validate_beta(beta: f64) -> MlResult<()> {
    if !(beta.is_finite() && beta > 0.0) {
        return Err(MlError::InvalidArgument(format!(
            "beta should be >0 in the F-beta score, got {}",
            beta
        )));
    }
    Ok(())
}
