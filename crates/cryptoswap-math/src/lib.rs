//! Invariant math of a cryptoswap pool: solving the invariant D, solving a
//! single reserve against a known D, marginal prices, and the safety band
//! inside which those solutions can be trusted.
//!
//! Balances, D, gamma and prices are unsigned fixed-point integers at
//! [`Config::scale`]. The amplification is `A * N^N * a_multiplier`.

pub mod config;
pub mod error;
pub mod fee;
pub mod fixed_point;
pub mod invariant;
pub mod model;
pub mod newton;
pub mod price;
pub mod reference;
pub mod reserve;
pub mod safety;
pub mod trade;

pub use {
    config::Config,
    error::{Degenerate, Error},
    invariant::solve_d,
    price::get_marginal_prices,
    reserve::solve_y,
    safety::is_safe,
};
use {
    number::serialization::HexOrDecimalU256,
    primitive_types::U256,
    serde::{Deserialize, Serialize},
    serde_with::serde_as,
};

/// Curve parameters of a pool.
#[serde_as]
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Params {
    /// Amplification, including the `N^N * a_multiplier` factor.
    #[serde_as(as = "HexOrDecimalU256")]
    pub amp: U256,
    #[serde_as(as = "HexOrDecimalU256")]
    pub gamma: U256,
}
