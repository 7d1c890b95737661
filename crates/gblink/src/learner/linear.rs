//! The linear boosting backend: per-iteration weight deltas, coordinate
//! descent updates, and margin/contribution evaluation.
//!
//! Each boosting iteration is a `[groups, num_feature + 1]` weight-delta
//! matrix (last column = bias). Prediction over an iteration range first
//! sums the deltas into one weight matrix, then evaluates rows in a single
//! pass. Missing feature values (NaN) contribute nothing.

use ndarray::{Array2, Axis};

use crate::data::{Dataset, FieldName};
use crate::parallel::Parallelism;

use super::params::{LearnerParams, Objective};

/// Floor for hessian values to keep update denominators sane.
const MIN_HESS: f32 = 1e-6;

#[inline]
fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Sum the per-iteration deltas of `range` into one weight matrix.
pub(crate) fn summed_weights(
    iterations: &[Array2<f32>],
    range: std::ops::Range<usize>,
    groups: usize,
    num_feature: usize,
) -> Array2<f32> {
    let mut total = Array2::zeros((groups, num_feature + 1));
    for deltas in &iterations[range] {
        total += deltas;
    }
    total
}

/// Raw margins `[rows, groups]` for a dataset under one weight matrix.
///
/// Starts from the per-row base margin field when attached, otherwise from
/// the configured base score.
pub(crate) fn margin(
    dataset: &Dataset,
    weights: &Array2<f32>,
    base_score: f32,
    par: Parallelism,
) -> Array2<f32> {
    let rows = dataset.num_row();
    let cols = dataset.num_col();
    let groups = weights.nrows();
    let base_margin = dataset
        .float_field(FieldName::BaseMargin)
        .ok()
        .flatten()
        .map(<[f32]>::to_vec);

    let mut out = Array2::zeros((rows, groups));
    par.maybe_par_bridge_for_each(
        out.axis_chunks_iter_mut(Axis(0), 64).zip((0..rows).step_by(64)),
        |(mut chunk, start)| {
            for (offset, mut row_out) in chunk.axis_iter_mut(Axis(0)).enumerate() {
                let row = start + offset;
                let base = base_margin.as_ref().map_or(base_score, |m| m[row]);
                for g in 0..groups {
                    let mut acc = base + weights[[g, cols]];
                    for col in 0..cols {
                        let x = dataset.value(row, col);
                        if !x.is_nan() {
                            acc += weights[[g, col]] * x;
                        }
                    }
                    row_out[g] = acc;
                }
            }
        },
    );
    out
}

/// First- and second-order gradients `[rows, groups]` of the objective at
/// the given margins, scaled by sample weights when attached.
pub(crate) fn gradients(
    objective: Objective,
    margins: &Array2<f32>,
    labels: &[f32],
    weights: Option<&[f32]>,
) -> (Array2<f32>, Array2<f32>) {
    let (rows, groups) = margins.dim();
    let mut grad = Array2::zeros((rows, groups));
    let mut hess = Array2::zeros((rows, groups));

    for row in 0..rows {
        let w = weights.map_or(1.0, |ws| ws[row]);
        let y = labels[row];
        match objective {
            Objective::SquaredError => {
                for g in 0..groups {
                    grad[[row, g]] = w * (margins[[row, g]] - y);
                    hess[[row, g]] = w;
                }
            }
            Objective::Logistic => {
                let p = sigmoid(margins[[row, 0]]);
                grad[[row, 0]] = w * (p - y);
                hess[[row, 0]] = w * (p * (1.0 - p)).max(MIN_HESS);
            }
            Objective::Softprob => {
                let max = (0..groups)
                    .map(|g| margins[[row, g]])
                    .fold(f32::NEG_INFINITY, f32::max);
                let mut denom = 0.0;
                for g in 0..groups {
                    denom += (margins[[row, g]] - max).exp();
                }
                let target = y as usize;
                for g in 0..groups {
                    let p = (margins[[row, g]] - max).exp() / denom;
                    let indicator = if g == target { 1.0 } else { 0.0 };
                    grad[[row, g]] = w * (p - indicator);
                    hess[[row, g]] = w * (2.0 * p * (1.0 - p)).max(MIN_HESS);
                }
            }
        }
    }
    (grad, hess)
}

#[inline]
fn soft_threshold(value: f32, alpha: f32) -> f32 {
    if value > alpha {
        value - alpha
    } else if value < -alpha {
        value + alpha
    } else {
        0.0
    }
}

/// One coordinate-descent pass; returns the round's weight deltas
/// `[groups, num_feature + 1]`.
///
/// Gradients are refreshed incrementally after each accepted delta, so
/// later coordinates in the pass see the earlier updates.
pub(crate) fn boost_pass(
    dataset: &Dataset,
    grad: &mut Array2<f32>,
    hess: &Array2<f32>,
    params: &LearnerParams,
    order: &[usize],
) -> Array2<f32> {
    let rows = dataset.num_row();
    let cols = dataset.num_col();
    let groups = grad.ncols();
    let mut deltas = Array2::zeros((groups, cols + 1));

    for g in 0..groups {
        // Bias first: every row participates with x = 1.
        let grad_sum: f32 = (0..rows).map(|i| grad[[i, g]]).sum();
        let hess_sum: f32 = (0..rows).map(|i| hess[[i, g]]).sum();
        let bias_delta = -params.learning_rate * grad_sum / (hess_sum + params.lambda);
        if bias_delta.is_finite() {
            deltas[[g, cols]] = bias_delta;
            for i in 0..rows {
                grad[[i, g]] += hess[[i, g]] * bias_delta;
            }
        }

        for &col in order {
            let mut grad_sum = 0.0f32;
            let mut hess_sum = 0.0f32;
            for i in 0..rows {
                let x = dataset.value(i, col);
                if !x.is_nan() {
                    grad_sum += grad[[i, g]] * x;
                    hess_sum += hess[[i, g]] * x * x;
                }
            }
            let numerator = soft_threshold(grad_sum, params.alpha);
            let delta = -params.learning_rate * numerator / (hess_sum + params.lambda);
            if delta != 0.0 && delta.is_finite() {
                deltas[[g, col]] = delta;
                for i in 0..rows {
                    let x = dataset.value(i, col);
                    if !x.is_nan() {
                        grad[[i, g]] += hess[[i, g]] * delta * x;
                    }
                }
            }
        }
    }
    deltas
}

/// Apply the objective's output transform in place, row by row.
pub(crate) fn transform(objective: Objective, margins: &mut Array2<f32>) {
    match objective {
        Objective::SquaredError => {}
        Objective::Logistic => margins.mapv_inplace(sigmoid),
        Objective::Softprob => {
            for mut row in margins.axis_iter_mut(Axis(0)) {
                let max = row.iter().copied().fold(f32::NEG_INFINITY, f32::max);
                let mut denom = 0.0;
                for v in row.iter_mut() {
                    *v = (*v - max).exp();
                    denom += *v;
                }
                for v in row.iter_mut() {
                    *v /= denom;
                }
            }
        }
    }
}

/// Per-feature contributions, flattened `[rows, groups, cols + 1]`.
///
/// Entry `j < cols` is `w[g, j] * x[i, j]` (zero for missing cells); the
/// trailing slot carries the bias weight plus the row's starting margin,
/// so the entries of one `(row, group)` block sum to the raw margin.
pub(crate) fn contributions(
    dataset: &Dataset,
    weights: &Array2<f32>,
    base_score: f32,
) -> Vec<f32> {
    let rows = dataset.num_row();
    let cols = dataset.num_col();
    let groups = weights.nrows();
    let base_margin = dataset.float_field(FieldName::BaseMargin).ok().flatten();

    let mut out = vec![0.0f32; rows * groups * (cols + 1)];
    for row in 0..rows {
        let base = base_margin.map_or(base_score, |m| m[row]);
        for g in 0..groups {
            let block = (row * groups + g) * (cols + 1);
            for col in 0..cols {
                let x = dataset.value(row, col);
                if !x.is_nan() {
                    out[block + col] = weights[[g, col]] * x;
                }
            }
            out[block + cols] = weights[[g, cols]] + base;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn line_dataset() -> Dataset {
        // y = 2x, x in 0..8
        let values: Vec<f32> = (0..8).map(|i| i as f32).collect();
        let mut ds = Dataset::from_values(
            Array2::from_shape_vec((8, 1), values).expect("shape"),
        );
        let labels: Vec<f32> = (0..8).map(|i| 2.0 * i as f32).collect();
        ds.set_float_field(FieldName::Label, &labels).unwrap();
        ds
    }

    #[test]
    fn margin_skips_missing_cells() {
        let ds = Dataset::from_values(array![[1.0, f32::NAN], [2.0, 3.0]]);
        let weights = array![[10.0, 100.0, 5.0]]; // w0, w1, bias
        let m = margin(&ds, &weights, 0.0, Parallelism::Sequential);
        assert_abs_diff_eq!(m[[0, 0]], 15.0);
        assert_abs_diff_eq!(m[[1, 0]], 325.0);
    }

    #[test]
    fn boost_passes_reduce_squared_error() {
        let ds = line_dataset();
        let params = LearnerParams { learning_rate: 0.5, ..Default::default() };
        let labels: Vec<f32> = (0..8).map(|i| 2.0 * i as f32).collect();

        let mut weights = Array2::zeros((1, 2));
        let mut last_loss = f32::INFINITY;
        for _ in 0..40 {
            let m = margin(&ds, &weights, 0.0, Parallelism::Sequential);
            let loss: f32 = (0..8).map(|i| (m[[i, 0]] - labels[i]).powi(2)).sum();
            assert!(loss <= last_loss + 1e-3, "loss went up: {last_loss} -> {loss}");
            last_loss = loss;

            let (mut grad, hess) =
                gradients(Objective::SquaredError, &m, &labels, None);
            let deltas = boost_pass(&ds, &mut grad, &hess, &params, &[0]);
            weights += &deltas;
        }
        assert!(last_loss < 5.0, "did not converge: {last_loss}");
    }

    #[test]
    fn contributions_sum_to_margin() {
        let ds = Dataset::from_values(array![[1.0, 2.0], [3.0, f32::NAN]]);
        let weights = array![[0.5, -1.0, 2.0]];
        let contribs = contributions(&ds, &weights, 0.25);
        let margins = margin(&ds, &weights, 0.25, Parallelism::Sequential);
        for row in 0..2 {
            let sum: f32 = contribs[row * 3..(row + 1) * 3].iter().sum();
            assert_abs_diff_eq!(sum, margins[[row, 0]], epsilon = 1e-6);
        }
    }

    #[test]
    fn softprob_transform_normalizes() {
        let mut m = array![[1.0, 2.0, 3.0]];
        transform(Objective::Softprob, &mut m);
        let sum: f32 = m.row(0).iter().sum();
        assert_abs_diff_eq!(sum, 1.0, epsilon = 1e-6);
        assert!(m[[0, 2]] > m[[0, 1]] && m[[0, 1]] > m[[0, 0]]);
    }
}
