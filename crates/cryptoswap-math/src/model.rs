//! Common interface over the integer kernel and its decimal reference, so
//! the two can be driven by the same checks.

use {
    crate::{
        Params,
        config::Config,
        error::Error,
        invariant::solve_d,
        price::get_marginal_prices,
        reference::DecimalModel,
        reserve::solve_y,
    },
    bigdecimal::BigDecimal,
    primitive_types::U256,
};

pub trait InvariantModel {
    /// Number representation of reserves, invariants and prices.
    type Value;

    fn invariant(&self, params: &Params, xp: &[Self::Value]) -> Result<Self::Value, Error>;

    fn solve_coordinate(
        &self,
        params: &Params,
        xp: &[Self::Value],
        d: &Self::Value,
        index: usize,
    ) -> Result<Self::Value, Error>;

    fn marginal_prices(
        &self,
        params: &Params,
        xp: &[Self::Value],
        d: &Self::Value,
    ) -> Result<Vec<Self::Value>, Error>;
}

/// The production kernel.
#[derive(Clone, Debug, Default)]
pub struct FixedPointModel {
    pub config: Config,
}

impl InvariantModel for FixedPointModel {
    type Value = U256;

    fn invariant(&self, params: &Params, xp: &[U256]) -> Result<U256, Error> {
        solve_d(&self.config, params, xp)
    }

    fn solve_coordinate(
        &self,
        params: &Params,
        xp: &[U256],
        d: &U256,
        index: usize,
    ) -> Result<U256, Error> {
        solve_y(&self.config, params, xp, *d, index)
    }

    fn marginal_prices(&self, params: &Params, xp: &[U256], d: &U256) -> Result<Vec<U256>, Error> {
        get_marginal_prices(&self.config, params, xp, *d)
    }
}

impl InvariantModel for DecimalModel {
    type Value = BigDecimal;

    fn invariant(&self, params: &Params, xp: &[BigDecimal]) -> Result<BigDecimal, Error> {
        self.reference_d(params, xp)
    }

    fn solve_coordinate(
        &self,
        params: &Params,
        xp: &[BigDecimal],
        d: &BigDecimal,
        index: usize,
    ) -> Result<BigDecimal, Error> {
        self.reference_y(params, xp, d, index)
    }

    fn marginal_prices(
        &self,
        params: &Params,
        xp: &[BigDecimal],
        d: &BigDecimal,
    ) -> Result<Vec<BigDecimal>, Error> {
        self.reference_prices(params, xp, d)
    }
}
