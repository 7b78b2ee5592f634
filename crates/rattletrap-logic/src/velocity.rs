//! Analytic cubic solver for drag/power balance.
//!
//! Top speed is where engine power equals drag power:
//! `a·v³ + b·v² + c·v + d = 0` with `a` the air coefficient, `b` and `c` the
//! rolling terms and `d = -power`. Cardano's formula handles a positive
//! discriminant; a negative one (three real roots) uses the trigonometric
//! form and returns the largest root.

use std::f64::consts::PI;

use crate::constants::physics;
use crate::vehicle::Vehicle;

/// Below this magnitude a leading coefficient counts as zero.
const DEGENERATE: f64 = 1e-12;

/// Largest real root of `a·x³ + b·x² + c·x + d = 0`.
///
/// Falls back to the quadratic or linear solution when leading coefficients
/// vanish. Returns 0.0 for an equation with no variable terms.
pub fn simple_cubic_solution(a: f64, b: f64, c: f64, d: f64) -> f64 {
    if a.abs() < DEGENERATE {
        return quadratic_solution(b, c, d);
    }

    // Depressed cubic t³ + p·t + q = 0 with x = t - b/3a.
    let p = (3.0 * a * c - b * b) / (3.0 * a * a);
    let q = (2.0 * b * b * b - 9.0 * a * b * c + 27.0 * a * a * d) / (27.0 * a * a * a);
    let discriminant = q * q + 4.0 * p * p * p / 27.0;

    let t = if discriminant >= 0.0 {
        let root = discriminant.sqrt() / 2.0;
        (-q / 2.0 + root).cbrt() + (-q / 2.0 - root).cbrt()
    } else {
        // p < 0 here. k = 0 branch of t_k = 2√(-p/3)·cos(θ/3 - 2πk/3).
        let m = 2.0 * (-p / 3.0).sqrt();
        let arg = (3.0 * q / (p * m)).clamp(-1.0, 1.0);
        let theta = arg.acos();
        m * (theta / 3.0).cos()
    };
    t - b / (3.0 * a)
}

/// All three real roots when the discriminant is negative, largest first.
pub fn trigonometric_roots(a: f64, b: f64, c: f64, d: f64) -> Option<[f64; 3]> {
    if a.abs() < DEGENERATE {
        return None;
    }
    let p = (3.0 * a * c - b * b) / (3.0 * a * a);
    let q = (2.0 * b * b * b - 9.0 * a * b * c + 27.0 * a * a * d) / (27.0 * a * a * a);
    if q * q + 4.0 * p * p * p / 27.0 >= 0.0 {
        return None;
    }
    let m = 2.0 * (-p / 3.0).sqrt();
    let theta = (3.0 * q / (p * m)).clamp(-1.0, 1.0).acos();
    let shift = b / (3.0 * a);
    Some([0, 1, 2].map(|k| m * (theta / 3.0 - 2.0 * PI * k as f64 / 3.0).cos() - shift))
}

fn quadratic_solution(a: f64, b: f64, c: f64) -> f64 {
    if a.abs() < DEGENERATE {
        if b.abs() < DEGENERATE {
            return 0.0;
        }
        return -c / b;
    }
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        // No real root; the vertex is the closest real answer.
        return -b / (2.0 * a);
    }
    let s = disc.sqrt();
    ((-b + s) / (2.0 * a)).max((-b - s) / (2.0 * a))
}

impl Vehicle {
    /// Top speed on land in 1/100 mph: where engine power meets air and
    /// rolling drag.
    pub fn max_ground_velocity(&mut self, fueled: bool) -> i32 {
        let power = self.total_power_w(fueled, false);
        self.ground_velocity_at(power)
    }

    /// Top speed afloat. Without rolling terms the balance is a cube root.
    pub fn max_water_velocity(&mut self, fueled: bool) -> i32 {
        let power = self.total_power_w(fueled, false);
        self.water_velocity_at(power)
    }

    pub fn max_velocity(&mut self, fueled: bool) -> i32 {
        if self.in_water {
            self.max_water_velocity(fueled)
        } else {
            self.max_ground_velocity(fueled)
        }
    }

    /// Cruising speed the engines sustain without strain.
    pub fn safe_ground_velocity(&mut self, fueled: bool) -> i32 {
        let power = self.total_power_w(fueled, true);
        self.ground_velocity_at(power)
    }

    pub fn safe_water_velocity(&mut self, fueled: bool) -> i32 {
        let power = self.total_power_w(fueled, true);
        self.water_velocity_at(power)
    }

    pub fn safe_velocity(&mut self, fueled: bool) -> i32 {
        if self.in_water {
            self.safe_water_velocity(fueled)
        } else {
            self.safe_ground_velocity(fueled)
        }
    }

    fn ground_velocity_at(&mut self, power_w: i32) -> i32 {
        if power_w <= 0 {
            return 0;
        }
        let air = self.coeff_air_drag();
        let rolling = self.coeff_rolling_drag();
        let mps = simple_cubic_solution(
            air,
            rolling,
            rolling * physics::ROLLING_CONSTANT_RATIO,
            -(power_w as f64),
        );
        (mps.max(0.0) * physics::MS_TO_VMIPH) as i32
    }

    fn water_velocity_at(&mut self, power_w: i32) -> i32 {
        let drag = self.coeff_water_drag();
        if power_w <= 0 || drag <= 0.0 {
            return 0;
        }
        ((power_w as f64 / drag).cbrt() * physics::MS_TO_VMIPH) as i32
    }

    /// Acceleration in 1/100 mph per second at the current speed, or at a
    /// quarter of top speed (at least 10 mph) when slower than that.
    pub fn acceleration(&mut self, fueled: bool) -> i32 {
        if !self.engine_on {
            return 0;
        }
        let floor = (self.max_velocity(fueled) / 4).max(1000);
        let target = self.velocity.abs().max(floor);
        let cmps = target as f64 * 100.0 / physics::MS_TO_VMIPH;
        let mass = self.total_mass();
        if mass <= 0.0 {
            return 0;
        }
        let power_ratio = self.total_power_w(fueled, false) as f64 / mass;
        let accel_cmps = 100.0 * 100.0 * power_ratio / cmps;
        (accel_cmps * physics::MS_TO_VMIPH / 100.0) as i32
    }

    /// How far past safe speed the vehicle runs: 0 at or below safe
    /// velocity, 1 at top speed.
    pub fn strain(&mut self) -> f64 {
        let sv = self.safe_velocity(true);
        let mut mv = self.max_velocity(true);
        if mv <= sv {
            mv = sv + 1;
        }
        if self.velocity < sv && self.velocity > -sv {
            return 0.0;
        }
        (self.velocity.abs() - sv).max(0) as f64 / (mv - sv) as f64
    }
}
