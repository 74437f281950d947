//! Exchanging one coin for another along the invariant.

use {
    crate::{
        Params,
        config::Config,
        error::{Degenerate, Error},
        fee::{FEE_DENOMINATOR, FeeParams},
        fixed_point::U256Ext,
        invariant::solve_d,
        reserve::solve_y,
        safety::SafetyBand,
    },
    number::serialization::HexOrDecimalU256,
    primitive_types::U256,
    serde::Serialize,
    serde_with::serde_as,
};

/// Sells `dx` of coin `i` for coin `j`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Swap {
    pub i: usize,
    pub j: usize,
    pub dx: U256,
}

/// Outcome of an accepted exchange.
#[serde_as]
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Exchange {
    /// Amount of coin `j` paid out, net of fees.
    #[serde_as(as = "HexOrDecimalU256")]
    pub dy: U256,
    /// Amount of coin `j` retained by the pool.
    #[serde_as(as = "HexOrDecimalU256")]
    pub fee: U256,
    /// Reserves after the exchange.
    #[serde_as(as = "Vec<HexOrDecimalU256>")]
    pub xp: Vec<U256>,
    /// Invariant of the new reserves.
    #[serde_as(as = "HexOrDecimalU256")]
    pub d: U256,
}

/// Executes `swap` against the pool `(xp, d)`.
///
/// The output leaves one unit of coin `j` in the pool as a rounding margin
/// and the fee, if any, stays in the pool. The new invariant is solved from
/// scratch and the transition has to pass the safety band.
pub fn exchange(
    config: &Config,
    params: &Params,
    xp: &[U256],
    d: U256,
    swap: Swap,
    fee: Option<&FeeParams>,
) -> Result<Exchange, Error> {
    let Swap { i, j, dx } = swap;
    for index in [i, j] {
        if index >= xp.len() {
            return Err(Degenerate::IndexOutOfBounds {
                index,
                len: xp.len(),
            }
            .into());
        }
    }
    if i == j {
        return Err(Degenerate::SameCoin { index: i }.into());
    }

    let mut new_xp = xp.to_vec();
    new_xp[i] = new_xp[i].try_add(dx)?;
    let y = solve_y(config, params, &new_xp, d, j)?;
    let y = y.try_add(U256::one())?;
    if y >= xp[j] {
        return Err(Error::InsufficientLiquidity);
    }
    let mut dy = xp[j] - y;
    new_xp[j] = y;

    let mut retained = U256::zero();
    if let Some(fee) = fee {
        let rate = fee.fee(config, &new_xp)?;
        retained = dy.mul_div(rate, U256::from(FEE_DENOMINATOR))?;
        dy = dy.try_sub(retained)?;
        new_xp[j] = new_xp[j].try_add(retained)?;
    }

    let new_d = solve_d(config, params, &new_xp)?;
    if let Err(err) = SafetyBand::new(config).check_transition((xp, d), (&new_xp, new_d)) {
        tracing::debug!(?xp, ?new_xp, %d, %new_d, "rejected exchange");
        return Err(err);
    }

    Ok(Exchange {
        dy,
        fee: retained,
        xp: new_xp,
        d: new_d,
    })
}
