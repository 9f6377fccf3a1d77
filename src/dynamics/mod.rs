pub mod integrator;

pub use integrator::Integrator;
