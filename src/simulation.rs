//! Fixed-step transient runs over a [`StateSpaceModel`].
//!
//! The model only supplies `dx/dt` and `y`; this module is the integrator
//! that calls them and records `(time, output)` samples.

use std::io;
use std::io::Write;

use crate::math::{Scalar, Vector};
use crate::state_space::StateSpaceModel;

/// Upper bound on the number of steps in one run.
pub const MAX_STEPS: usize = 100_000_000;

/// Time integrators for the state equations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimeIntegrator {
    /// First-order explicit Euler.
    ForwardEuler,
    /// Classical fourth-order Runge-Kutta.
    #[default]
    Rk4,
}

/// Metadata describing a transient run. Times are in seconds.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Human-readable identifier.
    pub name: String,
    /// Total simulated time.
    pub duration: Option<Scalar>,
    /// Fixed integration step.
    pub time_step: Option<Scalar>,
    /// Integration scheme.
    pub integrator: TimeIntegrator,
}

impl SimulationConfig {
    /// Creates a transient configuration using [`TimeIntegrator::Rk4`].
    #[must_use]
    pub fn transient(name: impl Into<String>, duration: Scalar, time_step: Scalar) -> Self {
        Self {
            name: name.into(),
            duration: Some(duration),
            time_step: Some(time_step),
            integrator: TimeIntegrator::default(),
        }
    }

    /// Replaces the integration scheme.
    #[must_use]
    pub fn with_integrator(mut self, integrator: TimeIntegrator) -> Self {
        self.integrator = integrator;
        self
    }
}

/// Trait for simulation engines.
pub trait SimulationEngine {
    /// Executes the simulation using the provided configuration.
    fn run(&mut self, config: &SimulationConfig) -> Result<(), SimulationError>;
}

/// Errors that can occur while configuring or executing simulations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SimulationError {
    /// Raised when a required parameter is missing.
    #[error("missing parameter: {0}")]
    MissingParameter(&'static str),
    /// Raised when the configuration is internally inconsistent.
    #[error("configuration error: {0}")]
    InvalidConfig(String),
    /// Raised when a state or input vector does not fit the model.
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),
}

/// Sampled outputs of a transient run.
#[derive(Debug, Clone, Default)]
pub struct TransientWaveform {
    /// Sample times.
    pub times: Vec<Scalar>,
    /// Output vector per sample.
    pub outputs: Vec<Vector>,
}

impl TransientWaveform {
    /// Total captured samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// True if no samples recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// One output over time.
    ///
    /// # Panics
    /// If `output` is out of range.
    #[must_use]
    pub fn series(&self, output: usize) -> Vec<Scalar> {
        self.outputs.iter().map(|y| y[output]).collect()
    }

    /// First time `output` reaches `level` from below, linearly interpolated
    /// between samples.
    #[must_use]
    pub fn first_crossing(&self, output: usize, level: Scalar) -> Option<Scalar> {
        let series = self.series(output);
        if series.first().is_some_and(|&y| y >= level) {
            return self.times.first().copied();
        }
        series
            .windows(2)
            .zip(self.times.windows(2))
            .find(|(y, _)| y[0] < level && y[1] >= level)
            .map(|(y, t)| t[0] + (level - y[0]) / (y[1] - y[0]) * (t[1] - t[0]))
    }
}

type InputFn = Box<dyn Fn(Scalar) -> Vector + Send + Sync + 'static>;

/// Fixed-step integrator driving a [`StateSpaceModel`].
pub struct StateSpaceEngine {
    model: StateSpaceModel,
    input_fn: InputFn,
    initial_state: Vector,
    waveform: TransientWaveform,
}

impl StateSpaceEngine {
    /// Creates an engine at the zero state with all inputs held at zero.
    #[must_use]
    pub fn new(model: StateSpaceModel) -> Self {
        let inputs = model.input_count();
        let states = model.state_count();
        Self {
            model,
            input_fn: Box::new(move |_: Scalar| Vector::zeros(inputs)),
            initial_state: Vector::zeros(states),
            waveform: TransientWaveform::default(),
        }
    }

    /// Sets the input vector as a function of time.
    pub fn set_input<F>(&mut self, input_fn: F)
    where
        F: Fn(Scalar) -> Vector + Send + Sync + 'static,
    {
        self.input_fn = Box::new(input_fn);
    }

    /// Holds every input at `levels` from `t = 0`.
    pub fn set_step_input(&mut self, levels: Vector) {
        self.set_input(move |_| levels.clone());
    }

    /// Sets the state at `t = 0`.
    pub fn set_initial_state(&mut self, state: Vector) {
        self.initial_state = state;
    }

    /// Model being integrated.
    #[must_use]
    pub fn model(&self) -> &StateSpaceModel {
        &self.model
    }

    /// Access captured waveform.
    #[must_use]
    pub fn waveform(&self) -> &TransientWaveform {
        &self.waveform
    }

    /// Consume and return captured waveform.
    #[must_use]
    pub fn into_waveform(self) -> TransientWaveform {
        self.waveform
    }

    fn inputs_at(&self, t: Scalar) -> Result<Vector, SimulationError> {
        let u = (self.input_fn)(t);
        if u.len() != self.model.input_count() {
            return Err(SimulationError::DimensionMismatch(format!(
                "input function returned {} values, model has {} inputs",
                u.len(),
                self.model.input_count()
            )));
        }
        Ok(u)
    }

    fn slope(&self, t: Scalar, x: &Vector) -> Result<Vector, SimulationError> {
        Ok(self.model.derivative(x, &self.inputs_at(t)?))
    }

    fn advance(
        &self,
        integrator: TimeIntegrator,
        t: Scalar,
        dt: Scalar,
        x: &Vector,
    ) -> Result<Vector, SimulationError> {
        match integrator {
            TimeIntegrator::ForwardEuler => Ok(x + self.slope(t, x)? * dt),
            TimeIntegrator::Rk4 => {
                let half = 0.5 * dt;
                let k1 = self.slope(t, x)?;
                let k2 = self.slope(t + half, &(x + &k1 * half))?;
                let k3 = self.slope(t + half, &(x + &k2 * half))?;
                let k4 = self.slope(t + dt, &(x + &k3 * dt))?;
                Ok(x + (k1 + k2 * 2.0 + k3 * 2.0 + k4) * (dt / 6.0))
            }
        }
    }
}

fn positive(value: Scalar, what: &str) -> Result<Scalar, SimulationError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(SimulationError::InvalidConfig(format!(
            "{what} must be finite and > 0, got {value}"
        )))
    }
}

impl SimulationEngine for StateSpaceEngine {
    fn run(&mut self, config: &SimulationConfig) -> Result<(), SimulationError> {
        let duration = config
            .duration
            .ok_or(SimulationError::MissingParameter("duration"))?;
        let time_step = config
            .time_step
            .ok_or(SimulationError::MissingParameter("time_step"))?;
        let duration = positive(duration, "duration")?;
        let dt = positive(time_step, "time_step")?;
        if self.initial_state.len() != self.model.state_count() {
            return Err(SimulationError::DimensionMismatch(format!(
                "initial state has {} entries, model has {} states",
                self.initial_state.len(),
                self.model.state_count()
            )));
        }

        // Duration is rounded to a whole number of steps.
        let ratio = (duration / dt).round();
        if ratio > MAX_STEPS as Scalar {
            return Err(SimulationError::InvalidConfig(format!(
                "duration / time_step = {ratio:e} exceeds {MAX_STEPS} steps"
            )));
        }
        let steps = ratio as usize;
        let _span = tracing::info_span!(
            "transient",
            name = %config.name,
            integrator = ?config.integrator,
            steps
        )
        .entered();

        self.waveform.times.clear();
        self.waveform.outputs.clear();
        let mut x = self.initial_state.clone();
        for k in 0..=steps {
            let t = k as Scalar * dt;
            self.waveform.times.push(t);
            self.waveform.outputs.push(self.model.output(&x));
            if k < steps {
                x = self.advance(config.integrator, t, dt, &x)?;
            }
        }
        if x.iter().any(|v| !v.is_finite()) {
            tracing::warn!("state diverged; time step is likely too large for this model");
        }
        tracing::debug!(samples = self.waveform.len(), "transient run complete");
        Ok(())
    }
}

/// Writes a CSV of one output over time.
pub fn write_transient_output_csv<W: Write>(
    mut w: W,
    waveform: &TransientWaveform,
    output_index: usize,
) -> io::Result<()> {
    writeln!(w, "time,output")?;
    for (time, y) in waveform.times.iter().zip(&waveform.outputs) {
        let v = y.get(output_index).copied().unwrap_or(0.0);
        writeln!(w, "{time:.16e},{v:.16e}")?;
    }
    Ok(())
}

/// Writes a CSV with a time column followed by every output, named by
/// `labels`.
pub fn write_transient_csv<W: Write>(
    mut w: W,
    waveform: &TransientWaveform,
    labels: &[&str],
) -> io::Result<()> {
    writeln!(w, "time,{}", labels.join(","))?;
    for (time, y) in waveform.times.iter().zip(&waveform.outputs) {
        write!(w, "{time:.16e}")?;
        for v in y.iter() {
            write!(w, ",{v:.16e}")?;
        }
        writeln!(w)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::circuits::reduction::regularize;
    use crate::circuits::stamp::MnaBuilder;

    const TAU: Scalar = 1.0e-10;

    /// `drv -1k- n`, 100fF at `n`: time constant 100ps.
    fn rc_engine() -> StateSpaceEngine {
        let mut mna = MnaBuilder::new(2);
        mna.stamp_resistor(Some(0), Some(1), 1.0e3);
        mna.stamp_capacitor(Some(1), None, 100.0e-15);
        mna.add_voltage_input(0);
        mna.add_output(1);
        let reduced = regularize(&mna.build()).unwrap();
        let model = StateSpaceModel::from_regularization(&reduced).unwrap();
        let mut engine = StateSpaceEngine::new(model);
        engine.set_step_input(Vector::from_element(1, 1.0));
        engine
    }

    #[test]
    fn missing_duration_is_reported() {
        let mut engine = rc_engine();
        let mut config = SimulationConfig::transient("rc", 1.0e-9, 1.0e-12);
        config.duration = None;
        assert_eq!(
            engine.run(&config),
            Err(SimulationError::MissingParameter("duration"))
        );
    }

    #[test]
    fn non_positive_step_is_invalid() {
        let mut engine = rc_engine();
        let config = SimulationConfig::transient("rc", 1.0e-9, -1.0e-12);
        assert!(matches!(
            engine.run(&config),
            Err(SimulationError::InvalidConfig(_))
        ));
    }

    #[test]
    fn step_count_is_capped() {
        let mut engine = rc_engine();
        let config = SimulationConfig::transient("rc", 1.0, 1.0e-30);
        assert!(matches!(
            engine.run(&config),
            Err(SimulationError::InvalidConfig(_))
        ));
        assert!(engine.waveform().is_empty());
    }

    #[test]
    fn rk4_matches_exponential() {
        let mut engine = rc_engine();
        let config = SimulationConfig::transient("rc", 1.0e-9, 1.0e-12);
        engine.run(&config).expect("valid config");
        let wave = engine.waveform();
        assert_eq!(wave.len(), 1001);
        assert_relative_eq!(wave.times[100], TAU, max_relative = 1e-9);
        assert_relative_eq!(wave.outputs[100][0], 1.0 - (-1.0_f64).exp(), max_relative = 1e-6);
        assert_relative_eq!(
            wave.first_crossing(0, 0.5).unwrap(),
            TAU * std::f64::consts::LN_2,
            max_relative = 1e-3
        );
    }

    #[test]
    fn forward_euler_is_close_at_small_steps() {
        let mut engine = rc_engine();
        let config = SimulationConfig::transient("rc", 2.0e-10, 1.0e-12)
            .with_integrator(TimeIntegrator::ForwardEuler);
        engine.run(&config).expect("valid config");
        let y = engine.waveform().outputs[100][0];
        assert_relative_eq!(y, 1.0 - (-1.0_f64).exp(), max_relative = 1e-2);
    }

    #[test]
    fn zero_input_keeps_zero_state() {
        let mut engine = rc_engine();
        engine.set_input(|_| Vector::zeros(1));
        engine
            .run(&SimulationConfig::transient("idle", 1.0e-10, 1.0e-12))
            .expect("valid config");
        assert!(engine.waveform().series(0).iter().all(|&y| y == 0.0));
    }

    #[test]
    fn wrong_input_width_is_rejected() {
        let mut engine = rc_engine();
        engine.set_input(|_| Vector::zeros(2));
        assert!(matches!(
            engine.run(&SimulationConfig::transient("rc", 1.0e-10, 1.0e-12)),
            Err(SimulationError::DimensionMismatch(_))
        ));
    }

    #[test]
    fn wrong_initial_state_is_rejected() {
        let mut engine = rc_engine();
        engine.set_initial_state(Vector::zeros(3));
        assert!(matches!(
            engine.run(&SimulationConfig::transient("rc", 1.0e-10, 1.0e-12)),
            Err(SimulationError::DimensionMismatch(_))
        ));
    }

    #[test]
    fn csv_has_header_and_one_row_per_sample() {
        let mut engine = rc_engine();
        engine
            .run(&SimulationConfig::transient("rc", 1.0e-11, 1.0e-12))
            .expect("valid config");
        let mut buf = Vec::new();
        write_transient_output_csv(&mut buf, engine.waveform(), 0).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("time,output\n"));
        assert_eq!(text.lines().count(), 12);

        let mut buf = Vec::new();
        write_transient_csv(&mut buf, engine.waveform(), &["n"]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("time,n\n"));
    }
}
