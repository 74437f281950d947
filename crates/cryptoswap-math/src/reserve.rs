//! Solving a single reserve from D and the remaining reserves.
//!
//! This is the core of trade execution: after adding an input amount to one
//! reserve, the reserve of the output coin that keeps D unchanged tells how
//! much can be paid out before fees.

use {
    crate::{
        Params,
        config::Config,
        error::{Degenerate, Error},
        fixed_point::{U256Ext, coins, sort_descending},
        invariant,
        newton::Newton,
    },
    primitive_types::U256,
};

/// Runs the Newton iteration for reserve `index` holding D and the other
/// reserves of `xp` fixed. The current value of `xp[index]` is ignored.
pub fn newton_y(
    config: &Config,
    params: &Params,
    xp: &[U256],
    d: U256,
    index: usize,
) -> Result<Newton, Error> {
    if xp.len() < 2 {
        return Err(Degenerate::TooFewCoins.into());
    }
    if index >= xp.len() {
        return Err(Degenerate::IndexOutOfBounds {
            index,
            len: xp.len(),
        }
        .into());
    }
    let n = coins(xp);
    let one = config.scale;
    let gamma_one = params.gamma.try_add(one)?;
    let two_one = U256::from(2).try_mul(one)?;

    let others = sort_descending(
        &xp.iter()
            .enumerate()
            .filter(|(i, _)| *i != index)
            .map(|(_, x)| *x)
            .collect::<Vec<_>>(),
    );
    let convergence_limit = config.tolerance(others[0]).max(config.tolerance(d));

    // Small reserves first for the initial estimate, large first for K0_i.
    let mut y = d / n;
    let mut s_i = U256::zero();
    for x in others.iter().rev() {
        y = y.mul_div(d, x.try_mul(n)?)?;
        s_i = s_i.try_add(*x)?;
    }
    let k0_i = others
        .iter()
        .try_fold(one, |k0, x| k0.try_mul(*x)?.try_mul(n)?.try_div(d))?;

    for iteration in 0..config.max_iterations {
        if y.is_zero() {
            return Ok(Newton::NotConverged {
                last: y,
                iterations: iteration,
            });
        }
        let y_prev = y;

        let k0 = k0_i.try_mul(y)?.try_mul(n)?.try_div(d)?;
        let s = s_i.try_add(y)?;
        let g1k0 = gamma_one.abs_diff(k0).try_add(U256::one())?;

        // D / (A * N^N) * g1k0^2 / gamma^2
        let mul1 = one
            .try_mul(d)?
            .try_div(params.gamma)?
            .try_mul(g1k0)?
            .try_div(params.gamma)?
            .mul_div(g1k0.try_mul(config.a_multiplier)?, params.amp)?;
        // 1 + 2 * K0 / g1k0
        let mul2 = one.try_add(two_one.mul_div(k0, g1k0)?)?;

        let yfprime = one.try_mul(y)?.try_add(s.try_mul(mul2)?)?.try_add(mul1)?;
        let dyfprime = d.try_mul(mul2)?;
        if yfprime < dyfprime {
            y = y_prev / 2;
            continue;
        }
        let yfprime = yfprime - dyfprime;
        let fprime = yfprime / y;
        if fprime.is_zero() || k0.is_zero() {
            y = y_prev / 2;
            continue;
        }

        // y -= f / fprime
        let mut y_minus = mul1 / fprime;
        let y_plus = yfprime
            .try_add(one.try_mul(d)?)?
            .try_div(fprime)?
            .try_add(y_minus.mul_div(one, k0)?)?;
        y_minus = y_minus.try_add(one.try_mul(s)?.try_div(fprime)?)?;
        y = if y_plus < y_minus {
            y_prev / 2
        } else {
            y_plus - y_minus
        };

        if y.abs_diff(y_prev) <= convergence_limit.max(y / config.convergence_divisor) {
            return Ok(Newton::Converged {
                value: y,
                iterations: iteration + 1,
            });
        }
    }

    Ok(Newton::NotConverged {
        last: y,
        iterations: config.max_iterations,
    })
}

/// Computes the reserve of coin `index` that, together with the other
/// reserves of `xp`, yields the invariant `d`.
///
/// Only the numeric root is reported: whether the resulting state is within
/// the safety band is for the caller to decide.
pub fn solve_y(
    config: &Config,
    params: &Params,
    xp: &[U256],
    d: U256,
    index: usize,
) -> Result<U256, Error> {
    if d.is_zero() {
        return Err(Degenerate::ZeroInvariant.into());
    }
    // The unknown reserve is allowed to be anything, including zero.
    let mut known = xp.to_vec();
    if let Some(unknown) = known.get_mut(index) {
        *unknown = U256::one();
    }
    invariant::validate(params, &known)?;

    match newton_y(config, params, xp, d, index)? {
        Newton::Converged { value, iterations } => {
            tracing::trace!(%value, index, iterations, "solved y");
            Ok(value)
        }
        outcome @ Newton::NotConverged { last, iterations } => {
            tracing::debug!(%last, index, iterations, ?xp, %d, "y did not converge");
            outcome.into_result()
        }
    }
}
