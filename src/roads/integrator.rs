//! Dormand–Prince 5(4) adaptive stepping for autonomous 2-D fields.
//!
//! # References
//!
//! - Dormand & Prince (1980), "A family of embedded Runge-Kutta formulae"
//! - Hairer, Nørsett & Wanner (1993), *Solving Ordinary Differential
//!   Equations I*, §II.4–5

use crate::model::Point;

const A21: f64 = 1.0 / 5.0;
const A31: f64 = 3.0 / 40.0;
const A32: f64 = 9.0 / 40.0;
const A41: f64 = 44.0 / 45.0;
const A42: f64 = -56.0 / 15.0;
const A43: f64 = 32.0 / 9.0;
const A51: f64 = 19372.0 / 6561.0;
const A52: f64 = -25360.0 / 2187.0;
const A53: f64 = 64448.0 / 6561.0;
const A54: f64 = -212.0 / 729.0;
const A61: f64 = 9017.0 / 3168.0;
const A62: f64 = -355.0 / 33.0;
const A63: f64 = 46732.0 / 5247.0;
const A64: f64 = 49.0 / 176.0;
const A65: f64 = -5103.0 / 18656.0;

// 5th-order weights (FSAL: also row 7 of the tableau)
const B1: f64 = 35.0 / 384.0;
const B3: f64 = 500.0 / 1113.0;
const B4: f64 = 125.0 / 192.0;
const B5: f64 = -2187.0 / 6784.0;
const B6: f64 = 11.0 / 84.0;

// 4th-order embedded weights
const E1: f64 = 5179.0 / 57600.0;
const E3: f64 = 7571.0 / 16695.0;
const E4: f64 = 393.0 / 640.0;
const E5: f64 = -92097.0 / 339200.0;
const E6: f64 = 187.0 / 2100.0;
const E7: f64 = 1.0 / 40.0;

const SAFETY: f64 = 0.9;
const MIN_FACTOR: f64 = 0.2;
const MAX_FACTOR: f64 = 5.0;

/// Step-size limits and tolerance.
#[derive(Debug, Clone, Copy)]
pub(crate) struct StepControl {
    pub h_min: f64,
    pub h_max: f64,
    pub tolerance: f64,
}

/// An accepted step.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Step {
    pub point: Point,
    /// Suggested size of the next step.
    pub next_h: f64,
}

/// One trial: 5th-order solution and the local error estimate.
fn trial<F>(f: &F, p: Point, h: f64) -> Option<(Point, f64)>
where
    F: Fn(Point) -> Option<Point>,
{
    let at = |terms: &[(f64, Point)]| {
        terms
            .iter()
            .fold(p, |acc, &(w, k)| acc + k.scale(h * w))
    };
    let k1 = f(p)?;
    let k2 = f(at(&[(A21, k1)]))?;
    let k3 = f(at(&[(A31, k1), (A32, k2)]))?;
    let k4 = f(at(&[(A41, k1), (A42, k2), (A43, k3)]))?;
    let k5 = f(at(&[(A51, k1), (A52, k2), (A53, k3), (A54, k4)]))?;
    let k6 = f(at(&[(A61, k1), (A62, k2), (A63, k3), (A64, k4), (A65, k5)]))?;
    let y5 = at(&[(B1, k1), (B3, k3), (B4, k4), (B5, k5), (B6, k6)]);
    let k7 = f(y5)?;
    let y4 = at(&[(E1, k1), (E3, k3), (E4, k4), (E5, k5), (E6, k6), (E7, k7)]);
    Some((y5, y5.distance(y4)))
}

/// Advances from `p`, shrinking the step until the error estimate is within
/// tolerance (or `h_min` is reached, which is accepted as is).
///
/// Returns `None` if the direction field is undefined at any stage.
pub(crate) fn adaptive_step<F>(f: &F, p: Point, h: f64, control: StepControl) -> Option<Step>
where
    F: Fn(Point) -> Option<Point>,
{
    let mut h = h.clamp(control.h_min, control.h_max);
    loop {
        let (next, error) = trial(f, p, h)?;
        if !next.is_finite() || !error.is_finite() {
            return None;
        }
        let factor = if error > 0.0 {
            (SAFETY * (control.tolerance / error).powf(0.2)).clamp(MIN_FACTOR, MAX_FACTOR)
        } else {
            MAX_FACTOR
        };
        if error <= control.tolerance || h <= control.h_min {
            return Some(Step {
                point: next,
                next_h: (h * factor).clamp(control.h_min, control.h_max),
            });
        }
        h = (h * factor).max(control.h_min);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn control() -> StepControl {
        StepControl {
            h_min: 0.01,
            h_max: 10.0,
            tolerance: 1e-6,
        }
    }

    #[test]
    fn test_uniform_field_is_exact() {
        let f = |_: Point| Some(Point::new(1.0, 0.0));
        let step = adaptive_step(&f, Point::new(0.0, 0.0), 5.0, control()).unwrap();
        assert!((step.point.x - 5.0).abs() < 1e-12);
        assert!(step.point.y.abs() < 1e-12);
        assert_eq!(step.next_h, 10.0, "zero error grows the step to h_max");
    }

    #[test]
    fn test_circular_field_stays_on_circle() {
        // Unit tangent of circles around the origin.
        let f = |p: Point| Point::new(-p.y, p.x).normalized();
        let mut p = Point::new(10.0, 0.0);
        let mut h = 1.0;
        for _ in 0..50 {
            let step = adaptive_step(&f, p, h, control()).unwrap();
            p = step.point;
            h = step.next_h;
        }
        assert!((p.length() - 10.0).abs() < 1e-3, "radius drifted to {}", p.length());
    }

    #[test]
    fn test_undefined_direction_stops() {
        let f = |p: Point| if p.x < 1.0 { Some(Point::new(1.0, 0.0)) } else { None };
        assert!(adaptive_step(&f, Point::new(0.0, 0.0), 5.0, control()).is_none());
    }
}
