//! Derivative-free Nelder-Mead minimizer over two parameters.

#[derive(Debug, Clone, Copy)]
pub struct NelderMeadOptions {
    pub max_iter: usize,
    /// Simplex diameter below which the search stops.
    pub x_tol: f64,
    /// Spread of simplex values, relative to 1 + |f|, below which the search stops.
    pub f_tol: f64,
}

impl Default for NelderMeadOptions {
    fn default() -> Self {
        Self {
            max_iter: 5000,
            x_tol: 1e-7,
            f_tol: 1e-10,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Minimum {
    pub x: [f64; 2],
    pub value: f64,
    pub iterations: usize,
    pub converged: bool,
}

fn order(pts: &mut [[f64; 2]; 3], fv: &mut [f64; 3]) {
    if fv[0] > fv[1] {
        pts.swap(0, 1);
        fv.swap(0, 1);
    }
    if fv[0] > fv[2] {
        pts.swap(0, 2);
        fv.swap(0, 2);
    }
    if fv[1] > fv[2] {
        pts.swap(1, 2);
        fv.swap(1, 2);
    }
}

fn lerp(a: [f64; 2], b: [f64; 2], t: f64) -> [f64; 2] {
    [a[0] + t * (b[0] - a[0]), a[1] + t * (b[1] - a[1])]
}

/// Minimize `f` starting from `x0` with an initial simplex offset by `step`.
///
/// Non-finite function values are treated as +inf, which pushes the
/// simplex back into the valid region.
pub fn nelder_mead_2d<F>(f: F, x0: [f64; 2], step: [f64; 2], opts: &NelderMeadOptions) -> Minimum
where
    F: Fn([f64; 2]) -> f64,
{
    let eval = |x: [f64; 2]| {
        let v = f(x);
        if v.is_nan() {
            f64::INFINITY
        } else {
            v
        }
    };

    let mut pts = [x0, [x0[0] + step[0], x0[1]], [x0[0], x0[1] + step[1]]];
    let mut fv = [eval(pts[0]), eval(pts[1]), eval(pts[2])];

    for iter in 0..opts.max_iter {
        order(&mut pts, &mut fv);

        let size = (pts[1][0] - pts[0][0])
            .hypot(pts[1][1] - pts[0][1])
            .max((pts[2][0] - pts[0][0]).hypot(pts[2][1] - pts[0][1]));
        let spread = (fv[2] - fv[0]).abs();
        if fv[0].is_finite() && size < opts.x_tol && spread <= opts.f_tol * (1.0 + fv[0].abs()) {
            return Minimum {
                x: pts[0],
                value: fv[0],
                iterations: iter,
                converged: true,
            };
        }

        let centroid = lerp(pts[0], pts[1], 0.5);
        // reflect the worst point through the centroid of the other two
        let reflected = lerp(pts[2], centroid, 2.0);
        let fr = eval(reflected);
        if fr < fv[0] {
            let expanded = lerp(pts[2], centroid, 3.0);
            let fe = eval(expanded);
            if fe < fr {
                pts[2] = expanded;
                fv[2] = fe;
            } else {
                pts[2] = reflected;
                fv[2] = fr;
            }
        } else if fr < fv[1] {
            pts[2] = reflected;
            fv[2] = fr;
        } else {
            let contracted = lerp(pts[2], centroid, 0.5);
            let fc = eval(contracted);
            if fc < fv[2] {
                pts[2] = contracted;
                fv[2] = fc;
            } else {
                for i in 1..3 {
                    pts[i] = lerp(pts[0], pts[i], 0.5);
                    fv[i] = eval(pts[i]);
                }
            }
        }
    }

    order(&mut pts, &mut fv);
    Minimum {
        x: pts[0],
        value: fv[0],
        iterations: opts.max_iter,
        converged: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quadratic_minimum() {
        let f = |x: [f64; 2]| (x[0] - 1.0).powi(2) + 3.0 * (x[1] + 2.0).powi(2) + 5.0;
        let m = nelder_mead_2d(f, [0.0, 0.0], [0.5, 0.5], &NelderMeadOptions::default());
        assert!(m.converged);
        assert!((m.x[0] - 1.0).abs() < 1e-5);
        assert!((m.x[1] + 2.0).abs() < 1e-5);
        assert!((m.value - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_rosenbrock() {
        let f = |x: [f64; 2]| (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0] * x[0]).powi(2);
        let m = nelder_mead_2d(f, [-1.2, 1.0], [0.1, 0.1], &NelderMeadOptions::default());
        assert!(m.converged);
        assert!((m.x[0] - 1.0).abs() < 1e-3);
        assert!((m.x[1] - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_iteration_cap() {
        let f = |x: [f64; 2]| x[0] + x[1];
        let opts = NelderMeadOptions {
            max_iter: 50,
            ..Default::default()
        };
        let m = nelder_mead_2d(f, [0.0, 0.0], [1.0, 1.0], &opts);
        assert!(!m.converged);
        assert_eq!(m.iterations, 50);
    }
}
