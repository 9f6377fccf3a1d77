//! Second-order rigid-body time integration of the floe fleet.

use crate::config::{MAX_ANGULAR_VELOCITY, MAX_FLOE_HEIGHT, MIN_FLOE_MASS};
use crate::floe::{Floe, FloeStatus};
use crate::utils::exec;
use crate::utils::math::{FloeFloat, Vec2};

/// Integrator responsible for stepping floes forward in time with an
/// Adams-Bashforth-like two-level update.
#[derive(Debug, Clone, Copy)]
pub struct Integrator<F> {
    pub dt: F,
}

impl<F: FloeFloat> Integrator<F> {
    pub fn new(dt: F) -> Self {
        Self { dt }
    }

    /// Steps every floe in the slice, fork-joined.
    pub fn step_floes(&self, floes: &mut [Floe<F>]) {
        let this = *self;
        exec::for_each_mut(floes, move |floe| this.step_one(floe));
    }

    /// Advances one floe by `dt`.
    pub fn step_one(&self, floe: &mut Floe<F>) {
        let dt = self.dt;

        floe.height = floe.height.min(F::lit(MAX_FLOE_HEIGHT));
        if floe.mass < F::lit(MIN_FLOE_MASS) {
            // Resurrect a vanishing floe just long enough to drop it.
            floe.mass = F::lit(1e3);
            floe.status = FloeStatus::Remove;
        }

        // Runaway collision forces destabilize the explicit update.
        let force_cap = floe.mass / (F::lit(5.0) * dt);
        while floe.collision_force.x.abs().max(floe.collision_force.y.abs()) > force_cap {
            floe.collision_force = floe.collision_force * F::lit(0.1);
            floe.collision_trq *= F::lit(0.1);
        }

        // Thermodynamic thinning/growth from the sampled ocean heat flux.
        if floe.height > F::zero() {
            let dh = floe.hflx_factor * dt / floe.height;
            let ratio = ((floe.height - dh) / floe.height).max(F::lit(1e-3));
            floe.height *= ratio;
            floe.mass *= ratio;
            floe.moment *= ratio;
        }

        let one_half = F::lit(0.5);
        let three_half = F::lit(1.5);

        // Position step with the previous-step derivatives.
        let dx = dt * (three_half * floe.u - one_half * floe.p_dxdt);
        let dy = dt * (three_half * floe.v - one_half * floe.p_dydt);
        let dalpha = dt * (three_half * floe.xi - one_half * floe.p_dalphadt);
        floe.p_dxdt = floe.u;
        floe.p_dydt = floe.v;
        floe.p_dalphadt = floe.xi;

        if dalpha != F::zero() {
            floe.polygon = floe.polygon.rotate_about(floe.centroid, dalpha);
            floe.alpha += dalpha;
        }
        floe.translate(Vec2::new(dx, dy));

        // Acceleration, clamped so one step cannot change velocity by more
        // than half the floe thickness.
        let mut dudt = (floe.fx_oa + floe.collision_force.x) / floe.mass;
        let mut dvdt = (floe.fy_oa + floe.collision_force.y) / floe.mass;
        let limit = floe.height * one_half;
        let du_step = (dt * dudt).abs();
        let dv_step = (dt * dvdt).abs();
        if du_step > limit || dv_step > limit {
            let frac_u = if du_step > F::zero() {
                limit / du_step
            } else {
                F::one()
            };
            let frac_v = if dv_step > F::zero() {
                limit / dv_step
            } else {
                F::one()
            };
            let frac = frac_u.min(frac_v).min(F::one());
            dudt = dudt * frac;
            dvdt = dvdt * frac;
        }

        floe.u += dt * (three_half * dudt - one_half * floe.p_dudt);
        floe.v += dt * (three_half * dvdt - one_half * floe.p_dvdt);
        floe.p_dudt = dudt;
        floe.p_dvdt = dvdt;

        let dxidt = (floe.trq_oa + floe.collision_trq) / floe.moment;
        floe.xi += dt * (three_half * dxidt - one_half * floe.p_dxidt);
        floe.p_dxidt = dxidt;
        let xi_cap = F::lit(MAX_ANGULAR_VELOCITY);
        floe.xi = floe.xi.max(-xi_cap).min(xi_cap);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Constants, FloeSettings};
    use crate::floe::factory;
    use crate::geometry::Polygon;
    use rand::SeedableRng;
    use rand_pcg::Pcg64;

    fn test_floe() -> Floe<f64> {
        let poly = Polygon::rectangle(Vec2::new(0.0, 0.0), Vec2::new(1e4, 1e4)).unwrap();
        let mut rng = Pcg64::seed_from_u64(6);
        factory::build_floe(
            poly,
            0.5,
            &Constants::default(),
            &FloeSettings::default(),
            &mut rng,
        )
        .unwrap()
    }

    #[test]
    fn constant_force_accelerates_the_floe() {
        let mut floe = test_floe();
        let integrator = Integrator::new(10.0);
        floe.fx_oa = floe.mass * 1e-4;
        integrator.step_one(&mut floe);
        // First step has no history: u = 1.5·dt·du.
        assert!((floe.u - 1.5e-3).abs() < 1e-9);
        assert!((floe.p_dudt - 1e-4).abs() < 1e-12);
    }

    #[test]
    fn position_step_uses_previous_derivative() {
        let mut floe = test_floe();
        let integrator = Integrator::new(10.0);
        floe.u = 1.0;
        floe.p_dxdt = 0.5;
        let x0 = floe.centroid.x;
        integrator.step_one(&mut floe);
        // Δx = dt (1.5·u − 0.5·p_dxdt) = 10 (1.5 − 0.25).
        assert!((floe.centroid.x - x0 - 12.5).abs() < 1e-9);
        assert_eq!(floe.p_dxdt, 1.0);
    }

    #[test]
    fn tiny_mass_is_resurrected_and_removed() {
        let mut floe = test_floe();
        floe.mass = 50.0;
        let integrator = Integrator::new(10.0);
        integrator.step_one(&mut floe);
        assert_eq!(floe.status, FloeStatus::Remove);
        assert!(floe.mass >= 1e3);
    }

    #[test]
    fn runaway_collision_force_is_scaled_down() {
        let mut floe = test_floe();
        let integrator = Integrator::new(10.0);
        let cap = floe.mass / 50.0;
        floe.collision_force = Vec2::new(cap * 1e3, 0.0);
        floe.collision_trq = 1.0;
        integrator.step_one(&mut floe);
        // Scaled by 0.1 until below the cap.
        assert!(floe.collision_force.x <= cap);
        assert!(floe.collision_trq < 1.0);
    }

    #[test]
    fn velocity_change_is_limited_to_half_the_thickness() {
        let mut floe = test_floe();
        let integrator = Integrator::new(10.0);
        // Large but below the runaway cap so the clamp path is exercised.
        floe.fx_oa = floe.mass * 0.1;
        integrator.step_one(&mut floe);
        // |Δt·du| ≤ h/2 = 0.25, so |u| ≤ 1.5·0.25/Δt·Δt = 0.375.
        assert!(floe.u.abs() <= 1.5 * 0.25 + 1e-9);
    }

    #[test]
    fn angular_velocity_is_clamped() {
        let mut floe = test_floe();
        let integrator = Integrator::new(10.0);
        floe.collision_trq = floe.moment;
        integrator.step_one(&mut floe);
        assert!(floe.xi.abs() <= MAX_ANGULAR_VELOCITY);
    }

    #[test]
    fn heat_flux_thins_mass_and_moment_together() {
        let mut floe = test_floe();
        let integrator = Integrator::new(10.0);
        floe.hflx_factor = 1e-3;
        let (h0, m0, i0) = (floe.height, floe.mass, floe.moment);
        integrator.step_one(&mut floe);
        let ratio = floe.height / h0;
        assert!(ratio < 1.0);
        assert!((floe.mass / m0 - ratio).abs() < 1e-12);
        assert!((floe.moment / i0 - ratio).abs() < 1e-12);
    }

    #[test]
    fn height_is_capped() {
        let mut floe = test_floe();
        floe.height = 55.0;
        let integrator = Integrator::new(10.0);
        integrator.step_one(&mut floe);
        assert!(floe.height <= MAX_FLOE_HEIGHT);
    }
}
