//! Ordinary least squares over the one-hot design matrix.
//!
//! Every categorical group keeps all of its indicator columns, so together
//! with the intercept the design is rank deficient. The fit centers the data
//! and takes the minimum-norm least-squares solution from an SVD, the same
//! solution scikit-learn's `LinearRegression` returns.

use nalgebra::{DMatrix, DVector};

use crate::{
    dataset::RaceHistory,
    encoding::{align, encode_row, FeatureSchema},
    error::{Error, Result},
    model::ModelArtifact,
};

/// In-sample fit statistics. No held-out data is involved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingReport {
    pub n_samples: usize,
    pub n_features: usize,
    pub r_squared: f64,
    pub rmse: f64,
}

pub fn design_matrix(history: &RaceHistory, columns: &[String]) -> DMatrix<f64> {
    let mut data = Vec::with_capacity(history.len() * columns.len());
    for r in history.records() {
        data.extend(align(&encode_row(&r.features()), columns).values);
    }
    DMatrix::from_row_slice(history.len(), columns.len(), &data)
}

pub fn targets(history: &RaceHistory) -> DVector<f64> {
    DVector::from_iterator(
        history.len(),
        history.records().iter().map(|r| r.finishing_position),
    )
}

/// Least squares with intercept. Returns `(coefficients, intercept)`.
pub fn fit_ols(x: &DMatrix<f64>, y: &DVector<f64>) -> Result<(DVector<f64>, f64)> {
    let (n, p) = x.shape();
    if n == 0 || n != y.len() {
        return Err(Error::Solver("design matrix and target disagree in length"));
    }

    let x_mean = DVector::from_iterator(p, x.column_iter().map(|c| c.mean()));
    let y_mean = y.mean();

    let mut xc = x.clone();
    for (mut col, m) in xc.column_iter_mut().zip(x_mean.iter()) {
        col.add_scalar_mut(-m);
    }
    let yc = y.add_scalar(-y_mean);

    let svd = xc.svd(true, true);
    let s_max = svd.singular_values.max();
    // relative cutoff like LAPACK's gelsd; floored so an all-constant design
    // never divides by zero
    let eps = (f64::EPSILON * n.max(p) as f64 * s_max).max(f64::MIN_POSITIVE);
    let coef = svd.solve(&yc, eps).map_err(Error::Solver)?;

    let intercept = y_mean - x_mean.dot(&coef);
    Ok((coef, intercept))
}

pub fn train(history: &RaceHistory) -> Result<(ModelArtifact, TrainingReport)> {
    let schema = FeatureSchema::fit(history);
    let x = design_matrix(history, schema.columns());
    let y = targets(history);
    tracing::debug!("design matrix {}x{}", x.nrows(), x.ncols());

    let (coef, intercept) = fit_ols(&x, &y)?;

    let fitted = (&x * &coef).add_scalar(intercept);
    let report = in_sample_report(&y, &fitted, schema.columns().len());

    let artifact = ModelArtifact::new(
        schema.into_columns(),
        coef.iter().copied().collect(),
        intercept,
        history.len(),
    )?;
    Ok((artifact, report))
}

fn in_sample_report(y: &DVector<f64>, fitted: &DVector<f64>, n_features: usize) -> TrainingReport {
    let n = y.len();
    let y_mean = y.mean();
    let ss_res = (y - fitted).norm_squared();
    let ss_tot = y.iter().map(|v| (v - y_mean).powi(2)).sum::<f64>();
    let r_squared = if ss_tot > 0.0 {
        1.0 - ss_res / ss_tot
    } else if ss_res == 0.0 {
        1.0
    } else {
        0.0
    };
    TrainingReport {
        n_samples: n,
        n_features,
        r_squared,
        rmse: (ss_res / n as f64).sqrt(),
    }
}
