use thiserror::Error;

/// An error reported by the simulation core.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    /// A configuration value violates a precondition.
    #[error("invalid configuration: `{field}` {reason}")]
    InvalidConfiguration {
        field: &'static str,
        reason: &'static str,
    },

    /// [step](crate::Simulation::step) was called once the simulation was complete.
    #[error("cannot step a completed simulation (completed after step {step})")]
    StepAfterComplete { step: usize },
}

pub type SimResult<T> = Result<T, SimulationError>;
