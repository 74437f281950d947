use {crate::error::Error, primitive_types::U256};

/// Outcome of a bounded Newton-Raphson iteration.
#[must_use]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Newton {
    Converged { value: U256, iterations: usize },
    /// The iteration budget was exhausted, or the step became undefined,
    /// before two successive estimates were within the tolerance.
    NotConverged { last: U256, iterations: usize },
}

impl Newton {
    pub fn into_result(self) -> Result<U256, Error> {
        match self {
            Self::Converged { value, .. } => Ok(value),
            Self::NotConverged { iterations, .. } => Err(Error::DidNotConverge { iterations }),
        }
    }
}
