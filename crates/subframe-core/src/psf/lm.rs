//! Levenberg-Marquardt least squares over fixed-size parameter vectors.

/// Smallest diagonal entry damping is scaled from, so parameters with a
/// vanishing derivative stay solvable.
const DIAGONAL_FLOOR: f64 = 1e-12;

/// Optimizer settings.
#[derive(Debug, Clone)]
pub struct LmConfig {
    pub max_iterations: usize,
    /// Converged when no parameter moves by more than this.
    pub parameter_tolerance: f64,
    /// Converged when an accepted step improves chi2 by less than this fraction.
    pub chi2_tolerance: f64,
    pub initial_lambda: f64,
    pub lambda_up: f64,
    pub lambda_down: f64,
    /// Damping above this means no descent direction is left.
    pub max_lambda: f64,
}

impl Default for LmConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            parameter_tolerance: 1e-8,
            chi2_tolerance: 1e-10,
            initial_lambda: 0.001,
            lambda_up: 10.0,
            lambda_down: 0.1,
            max_lambda: 1e10,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LmResult<const N: usize> {
    pub params: [f64; N],
    pub chi2: f64,
    pub converged: bool,
    pub iterations: usize,
}

/// A model `z = f(x, y; params)` with an analytic Jacobian.
pub trait LmModel<const N: usize> {
    fn evaluate(&self, x: f64, y: f64, params: &[f64; N]) -> f64;

    fn jacobian_row(&self, x: f64, y: f64, params: &[f64; N]) -> [f64; N];

    /// Project parameters back onto their valid domain after a step.
    fn constrain(&self, _params: &mut [f64; N]) {}
}

/// Samples to be fitted: parallel coordinate and value slices.
pub struct Samples<'a> {
    pub x: &'a [f64],
    pub y: &'a [f64],
    pub z: &'a [f64],
}

pub fn optimize<const N: usize, M: LmModel<N>>(
    model: &M,
    samples: &Samples<'_>,
    initial: [f64; N],
    config: &LmConfig,
) -> LmResult<N> {
    let mut params = initial;
    model.constrain(&mut params);
    let mut lambda = config.initial_lambda;
    let mut chi2 = chi2_of(model, samples, &params);
    let mut converged = false;
    let mut iterations = 0;

    let mut jacobian = Vec::with_capacity(samples.x.len());
    let mut residuals = Vec::with_capacity(samples.x.len());

    while iterations < config.max_iterations {
        iterations += 1;

        jacobian.clear();
        residuals.clear();
        for ((&x, &y), &z) in samples.x.iter().zip(samples.y).zip(samples.z) {
            jacobian.push(model.jacobian_row(x, y, &params));
            residuals.push(z - model.evaluate(x, y, &params));
        }
        let (hessian, gradient) = normal_equations(&jacobian, &residuals);

        // Retry the same linearization with growing damping until a step helps.
        loop {
            let mut damped = hessian;
            for (i, row) in damped.iter_mut().enumerate() {
                row[i] += lambda * row[i].max(DIAGONAL_FLOOR);
            }

            let Some(delta) = solve(&damped, &gradient) else {
                return LmResult {
                    params,
                    chi2,
                    converged,
                    iterations,
                };
            };

            let mut candidate = params;
            for (p, d) in candidate.iter_mut().zip(delta.iter()) {
                *p += d;
            }
            model.constrain(&mut candidate);
            let candidate_chi2 = chi2_of(model, samples, &candidate);

            if candidate_chi2.is_finite() && candidate_chi2 < chi2 {
                let max_delta = delta.iter().fold(0.0f64, |a, d| a.max(d.abs()));
                let gain = (chi2 - candidate_chi2) / chi2.max(f64::MIN_POSITIVE);
                params = candidate;
                chi2 = candidate_chi2;
                lambda *= config.lambda_down;
                if max_delta < config.parameter_tolerance || gain < config.chi2_tolerance {
                    converged = true;
                }
                break;
            }

            lambda *= config.lambda_up;
            if lambda > config.max_lambda {
                // Already at a local minimum.
                converged = true;
                break;
            }
        }

        if converged {
            break;
        }
    }

    LmResult {
        params,
        chi2,
        converged,
        iterations,
    }
}

fn chi2_of<const N: usize, M: LmModel<N>>(
    model: &M,
    samples: &Samples<'_>,
    params: &[f64; N],
) -> f64 {
    samples
        .x
        .iter()
        .zip(samples.y)
        .zip(samples.z)
        .map(|((&x, &y), &z)| {
            let r = z - model.evaluate(x, y, params);
            r * r
        })
        .sum()
}

/// `J^T J` and `J^T r`.
#[allow(clippy::needless_range_loop)]
fn normal_equations<const N: usize>(
    jacobian: &[[f64; N]],
    residuals: &[f64],
) -> ([[f64; N]; N], [f64; N]) {
    let mut hessian = [[0.0f64; N]; N];
    let mut gradient = [0.0f64; N];

    for (row, &r) in jacobian.iter().zip(residuals) {
        for i in 0..N {
            gradient[i] += row[i] * r;
            for j in i..N {
                hessian[i][j] += row[i] * row[j];
            }
        }
    }
    for i in 1..N {
        for j in 0..i {
            hessian[i][j] = hessian[j][i];
        }
    }

    (hessian, gradient)
}

/// Gaussian elimination with partial pivoting. `None` for a singular matrix.
#[allow(clippy::needless_range_loop)]
pub fn solve<const N: usize>(a: &[[f64; N]; N], b: &[f64; N]) -> Option<[f64; N]> {
    let mut m = *a;
    let mut rhs = *b;

    for col in 0..N {
        let mut pivot = col;
        for row in (col + 1)..N {
            if m[row][col].abs() > m[pivot][col].abs() {
                pivot = row;
            }
        }
        let magnitude = m[pivot][col].abs();
        if magnitude.is_nan() || magnitude < 1e-300 {
            return None;
        }
        if pivot != col {
            m.swap(col, pivot);
            rhs.swap(col, pivot);
        }

        for row in (col + 1)..N {
            let factor = m[row][col] / m[col][col];
            let pivot_row = m[col];
            for (j, v) in m[row].iter_mut().enumerate().skip(col) {
                *v -= factor * pivot_row[j];
            }
            rhs[row] -= factor * rhs[col];
        }
    }

    let mut x = [0.0f64; N];
    for i in (0..N).rev() {
        let mut sum = rhs[i];
        for (j, &xj) in x.iter().enumerate().skip(i + 1) {
            sum -= m[i][j] * xj;
        }
        x[i] = sum / m[i][i];
    }

    x.iter().all(|v| v.is_finite()).then_some(x)
}
