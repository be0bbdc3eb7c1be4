//! Scalar root finding for the implicit rebalance equation.

/// Bounded secant-method root finder.
///
/// The rebalance residual is piecewise linear with slope close to one, so
/// convergence from a seed near the root takes a handful of iterations.
/// The iteration cap is a hard failure, never an approximation fallback.
#[derive(Debug, Clone, PartialEq)]
pub struct RootSolver {
    pub max_iterations: usize,
    pub tolerance: f64,
}

impl Default for RootSolver {
    fn default() -> Self {
        RootSolver {
            max_iterations: 50,
            tolerance: 1e-12,
        }
    }
}

/// Why a solve failed, with the last residual seen.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverFailure {
    pub residual: f64,
    pub iterations: usize,
}

impl RootSolver {
    /// Find `x` with `f(x) = 0`, seeded at `x0`.
    pub fn solve<F: Fn(f64) -> f64>(&self, f: F, x0: f64) -> Result<f64, SolverFailure> {
        let mut x_prev = x0;
        let mut f_prev = f(x_prev);
        if f_prev.abs() <= self.tolerance {
            return Ok(x_prev);
        }

        // Second point for the secant: a small relative step off the seed.
        let step = if x0.abs() > 1.0 { x0.abs() } else { 1.0 } * 1e-4;
        let mut x = x0 - step;
        let mut f_x = f(x);

        for iteration in 1..=self.max_iterations {
            if f_x.abs() <= self.tolerance {
                return Ok(x);
            }
            let denom = f_x - f_prev;
            if denom == 0.0 || !denom.is_finite() {
                return Err(SolverFailure {
                    residual: f_x,
                    iterations: iteration,
                });
            }
            let x_next = x - f_x * (x - x_prev) / denom;
            if !x_next.is_finite() {
                return Err(SolverFailure {
                    residual: f_x,
                    iterations: iteration,
                });
            }
            x_prev = x;
            f_prev = f_x;
            x = x_next;
            f_x = f(x);
        }

        if f_x.abs() <= self.tolerance {
            return Ok(x);
        }
        Err(SolverFailure {
            residual: f_x,
            iterations: self.max_iterations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_root() {
        let solver = RootSolver::default();
        let root = solver.solve(|x| 2.0 * x - 3.0, 10.0).unwrap();
        assert!((root - 1.5).abs() < 1e-10);
    }

    #[test]
    fn seed_already_at_root() {
        let solver = RootSolver::default();
        let root = solver.solve(|x| x - 1.0, 1.0).unwrap();
        assert_eq!(root, 1.0);
    }

    #[test]
    fn piecewise_linear_kink() {
        // Shape of the rebalance residual: |x - a| scaled small, plus x - b.
        let solver = RootSolver::default();
        let f = |x: f64| 0.0003 * (x - 0.7).abs() + x - 1.0;
        let root = solver.solve(f, 1.0).unwrap();
        assert!(f(root).abs() <= solver.tolerance);
    }

    #[test]
    fn quadratic_root() {
        let solver = RootSolver::default();
        let root = solver.solve(|x| x * x - 2.0, 2.0).unwrap();
        assert!((root - 2.0_f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn no_root_fails_with_residual() {
        let solver = RootSolver {
            max_iterations: 8,
            tolerance: 1e-12,
        };
        let err = solver.solve(|x| x * x + 1.0, 1.0).unwrap_err();
        assert!(err.iterations <= 8);
        // x^2 + 1 never gets below 1.
        assert!(err.residual.abs() >= 1.0);
    }

    #[test]
    fn flat_function_fails_instead_of_looping() {
        let solver = RootSolver::default();
        let err = solver.solve(|_| 1.0, 5.0).unwrap_err();
        assert_eq!(err.residual, 1.0);
    }
}
