//! Dynamic fee that grows as the pool moves away from balance.

use {
    crate::{
        config::Config,
        error::{Degenerate, Error},
        fixed_point::{U256Ext, coins, sum},
    },
    number::serialization::HexOrDecimalU256,
    primitive_types::U256,
    serde::{Deserialize, Serialize},
    serde_with::serde_as,
};

/// Fees are expressed in units of `1 / FEE_DENOMINATOR`.
pub const FEE_DENOMINATOR: u64 = 10_000_000_000;

/// Fee parameters of a pool.
#[serde_as]
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct FeeParams {
    /// Fee charged on a balanced pool.
    #[serde_as(as = "HexOrDecimalU256")]
    pub mid_fee: U256,
    /// Fee charged on a maximally imbalanced pool.
    #[serde_as(as = "HexOrDecimalU256")]
    pub out_fee: U256,
    /// How fast the fee moves from `mid_fee` to `out_fee`.
    #[serde_as(as = "HexOrDecimalU256")]
    pub fee_gamma: U256,
}

/// Measures the balance of the pool: `scale` for a balanced pool, falling
/// towards zero as the reserves spread out.
///
/// `K = prod(N * x_i / sum(x))`, then `fee_gamma / (fee_gamma + 1 - K)` for a
/// positive `fee_gamma`.
pub fn reduction_coefficient(config: &Config, xp: &[U256], fee_gamma: U256) -> Result<U256, Error> {
    let one = config.scale;
    let n = coins(xp);
    let s = sum(xp)?;
    if s.is_zero() {
        return Err(Degenerate::ZeroReserve { index: 0 }.into());
    }

    let k = xp
        .iter()
        .try_fold(one, |k, x| k.try_mul(n)?.mul_div(*x, s))?;
    if fee_gamma.is_zero() {
        return Ok(k);
    }
    fee_gamma.mul_div(one, fee_gamma.try_add(one)?.try_sub(k)?)
}

impl FeeParams {
    /// Interpolates between `mid_fee` and `out_fee` by the reduction
    /// coefficient of `xp`.
    pub fn fee(&self, config: &Config, xp: &[U256]) -> Result<U256, Error> {
        let one = config.scale;
        let f = reduction_coefficient(config, xp, self.fee_gamma)?;
        self.mid_fee
            .try_mul(f)?
            .try_add(self.out_fee.try_mul(one.try_sub(f)?)?)?
            .try_div(one)
    }
}
