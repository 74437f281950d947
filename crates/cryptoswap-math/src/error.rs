/// Failures of the invariant kernel.
#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    /// A Newton iteration exhausted its budget. The inputs are unsafe for the
    /// solver and the operation that produced them must be rejected.
    #[error("newton iteration did not converge after {iterations} iterations")]
    DidNotConverge { iterations: usize },
    #[error("degenerate input: {0}")]
    Degenerate(#[from] Degenerate),
    /// Raised by callers of the kernel when a transition leaves the safety
    /// band without moving back towards it.
    #[error("state outside of the safety band")]
    UnsafeState,
    #[error("trade output is not positive")]
    InsufficientLiquidity,
    #[error("arithmetic overflow")]
    Overflow,
    #[error("division by zero")]
    ZeroDivision,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Degenerate {
    #[error("at least two coins are required")]
    TooFewCoins,
    #[error("reserve {index} is zero")]
    ZeroReserve { index: usize },
    #[error("invariant is zero")]
    ZeroInvariant,
    #[error("amplification and gamma must be positive")]
    ZeroParameter,
    #[error("index {index} out of bounds for {len} coins")]
    IndexOutOfBounds { index: usize, len: usize },
    #[error("cannot exchange coin {index} for itself")]
    SameCoin { index: usize },
}

impl Error {
    /// Returns `true` for the expected "inputs outside of the operating range"
    /// outcome, as opposed to malformed inputs.
    pub fn is_convergence_failure(&self) -> bool {
        matches!(self, Self::DidNotConverge { .. })
    }
}
