//! Solving the invariant D of a cryptoswap pool.
//!
//! The invariant ties the price-scaled reserves `x` to D through
//!
//! ```text
//! K0 = prod(x) * N^N / D^N
//! K  = A * K0 * gamma^2 / (gamma + 1 - K0)^2
//! K * D^(N-1) * sum(x) + prod(x) = K * D^N + (D / N)^N
//! ```
//!
//! where `A` is the amplification without the `N^N * a_multiplier` factor
//! the pool encodes it with. D is found by Newton-Raphson in integer
//! arithmetic, starting from `N` times the geometric mean of the reserves.

use {
    crate::{
        Params,
        config::Config,
        error::{Degenerate, Error},
        fixed_point::{U256Ext, coins, sort_descending, sum},
        newton::Newton,
    },
    primitive_types::U256,
};

/// Checks the preconditions shared by every solve: at least two coins, all
/// of them with a positive reserve, and positive parameters.
pub(crate) fn validate(params: &Params, xp: &[U256]) -> Result<(), Error> {
    if xp.len() < 2 {
        return Err(Degenerate::TooFewCoins.into());
    }
    if let Some(index) = xp.iter().position(U256::is_zero) {
        return Err(Degenerate::ZeroReserve { index }.into());
    }
    if params.amp.is_zero() || params.gamma.is_zero() {
        return Err(Degenerate::ZeroParameter.into());
    }
    Ok(())
}

/// Integer Newton iteration for the N-th root of the product of `x`, scaled
/// by the fixed-point base.
pub fn geometric_mean(config: &Config, x: &[U256]) -> Result<Newton, Error> {
    let x = sort_descending(x);
    let n = coins(&x);
    let one = config.scale;
    let Some(&largest) = x.first() else {
        return Err(Degenerate::TooFewCoins.into());
    };

    let mut d = largest;
    for iteration in 0..config.max_iterations {
        if d.is_zero() {
            return Ok(Newton::NotConverged {
                last: d,
                iterations: iteration,
            });
        }
        let d_prev = d;
        let tmp = x
            .iter()
            .try_fold(one, |tmp, x| tmp.mul_div(*x, d))?;
        let numerator = n.try_sub(U256::one())?.try_mul(one)?.try_add(tmp)?;
        d = d.mul_div(numerator, n.try_mul(one)?)?;

        let diff = d.abs_diff(d_prev);
        if diff <= U256::one() || diff.try_mul(one)? < d {
            return Ok(Newton::Converged {
                value: d,
                iterations: iteration + 1,
            });
        }
    }

    Ok(Newton::NotConverged {
        last: d,
        iterations: config.max_iterations,
    })
}

/// Runs the Newton iteration for D from the initial estimate `d0`.
pub fn newton_d(config: &Config, params: &Params, xp: &[U256], d0: U256) -> Result<Newton, Error> {
    let x = sort_descending(xp);
    let n = coins(&x);
    let s = sum(&x)?;
    let one = config.scale;
    let gamma = params.gamma;
    let gamma_one = gamma.try_add(one)?;
    let two_n_one = U256::from(2).try_mul(n)?.try_mul(one)?;

    let mut d = d0;
    for iteration in 0..config.max_iterations {
        if d.is_zero() {
            return Ok(Newton::NotConverged {
                last: d,
                iterations: iteration,
            });
        }
        let d_prev = d;

        let k0 = x
            .iter()
            .try_fold(one, |k0, x| k0.try_mul(*x)?.try_mul(n)?.try_div(d))?;
        if k0.is_zero() {
            return Ok(Newton::NotConverged {
                last: d,
                iterations: iteration,
            });
        }
        let g1k0 = gamma_one.abs_diff(k0).try_add(U256::one())?;

        // D / (A * N^N) * g1k0^2 / gamma^2
        let mul1 = one
            .try_mul(d)?
            .try_div(gamma)?
            .try_mul(g1k0)?
            .try_div(gamma)?
            .mul_div(g1k0.try_mul(config.a_multiplier)?, params.amp)?;
        // 2 * N * K0 / g1k0
        let mul2 = two_n_one.mul_div(k0, g1k0)?;

        let neg_fprime = s
            .try_add(s.mul_div(mul2, one)?)?
            .try_add(mul1.try_mul(n)?.try_div(k0)?)?;
        let decrease = mul2.mul_div(d, one)?;
        if neg_fprime <= decrease {
            return Ok(Newton::NotConverged {
                last: d,
                iterations: iteration,
            });
        }
        let neg_fprime = neg_fprime - decrease;

        // D -= f / fprime
        let d_plus = d.mul_div(neg_fprime.try_add(s)?, neg_fprime)?;
        let mut d_minus = d.mul_div(d, neg_fprime)?;
        let correction = d.mul_div(mul1 / neg_fprime, one)?;
        if one > k0 {
            d_minus = d_minus.try_add(correction.mul_div(one - k0, k0)?)?;
        } else {
            d_minus = d_minus.try_sub(correction.mul_div(k0 - one, k0)?)?;
        }
        d = if d_plus > d_minus {
            d_plus - d_minus
        } else {
            (d_minus - d_plus) / 2
        };

        if d.abs_diff(d_prev) <= config.tolerance(d) {
            return Ok(Newton::Converged {
                value: d,
                iterations: iteration + 1,
            });
        }
    }

    Ok(Newton::NotConverged {
        last: d,
        iterations: config.max_iterations,
    })
}

/// Computes the invariant D of the price-scaled reserves `xp`.
///
/// Fails fast with [`Error::Degenerate`] on a zero reserve or parameter, and
/// with [`Error::DidNotConverge`] when the iteration budget is exhausted.
pub fn solve_d(config: &Config, params: &Params, xp: &[U256]) -> Result<U256, Error> {
    validate(params, xp)?;
    let mean = geometric_mean(config, xp)?.into_result()?;
    let d0 = coins(xp).try_mul(mean)?;

    match newton_d(config, params, xp, d0)? {
        Newton::Converged { value, iterations } => {
            tracing::trace!(%value, iterations, "solved D");
            Ok(value)
        }
        outcome @ Newton::NotConverged { last, iterations } => {
            tracing::debug!(%last, iterations, ?xp, "D did not converge");
            outcome.into_result()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> (Params, [U256; 3]) {
        (
            Params {
                amp: U256::from(42_253_659_u64),
                gamma: U256::from(11_720_394_944_313_222_u64),
            },
            [
                U256::from(165_898_964_704_801_767_090_u128),
                U256::from(180_089_627_760_498_533_741_u128),
                U256::from(479_703_029_155_498_241_214_u128),
            ],
        )
    }

    #[test]
    fn geometric_mean_of_equal_values() {
        let config = Config::default();
        let x = [U256::exp10(21); 3];
        assert_eq!(
            geometric_mean(&config, &x).unwrap().into_result(),
            Ok(U256::exp10(21))
        );
    }

    #[test]
    fn geometric_mean_of_spread_values() {
        let config = Config::default();
        let x = [
            U256::exp10(18),
            U256::from(8) * U256::exp10(18),
            U256::from(27) * U256::exp10(18),
        ];
        // cbrt(1 * 8 * 27) = 6
        let mean = geometric_mean(&config, &x).unwrap().into_result().unwrap();
        let expected = U256::from(6) * U256::exp10(18);
        assert!(mean.abs_diff(expected) * U256::exp10(10) <= expected);
    }

    #[test]
    fn balanced_pool_has_sum_as_invariant() {
        let config = Config::default();
        let (params, _) = fixture();
        let x = [U256::exp10(21); 3];
        let d = solve_d(&config, &params, &x).unwrap();
        assert_eq!(d, U256::from(3) * U256::exp10(21));
    }

    #[test]
    fn solves_imbalanced_fixture() {
        let config = Config::default();
        let (params, x) = fixture();
        let d = solve_d(&config, &params, &x).unwrap();
        let expected = U256::from(798_348_646_635_793_903_194_u128);
        assert!(d.abs_diff(expected) * U256::exp10(15) < expected);
        // D lies between N * geometric mean and the sum of the reserves.
        assert!(d < sum(&x).unwrap());
    }

    #[test]
    fn reserve_order_does_not_matter() {
        let config = Config::default();
        let (params, x) = fixture();
        let d = solve_d(&config, &params, &x).unwrap();
        let shuffled = [x[2], x[0], x[1]];
        assert_eq!(solve_d(&config, &params, &shuffled).unwrap(), d);
    }

    #[test]
    fn rejects_degenerate_inputs() {
        let config = Config::default();
        let (params, x) = fixture();
        assert_eq!(
            solve_d(&config, &params, &[x[0], U256::zero(), x[2]]),
            Err(Error::Degenerate(Degenerate::ZeroReserve { index: 1 }))
        );
        assert_eq!(
            solve_d(&config, &params, &x[..1]),
            Err(Error::Degenerate(Degenerate::TooFewCoins))
        );
        let no_gamma = Params {
            gamma: U256::zero(),
            ..params
        };
        assert_eq!(
            solve_d(&config, &no_gamma, &x),
            Err(Error::Degenerate(Degenerate::ZeroParameter))
        );
    }

    #[test]
    fn exhausted_budget_is_reported() {
        let config = Config {
            max_iterations: 1,
            convergence_epsilon: U256::zero(),
            ..Config::default()
        };
        let (params, x) = fixture();
        assert!(matches!(
            solve_d(&config, &params, &x),
            Err(Error::DidNotConverge { iterations: 1 })
        ));
    }

    #[test]
    fn newton_d_reports_exhaustion() {
        let config = Config {
            max_iterations: 2,
            ..Config::default()
        };
        let (params, x) = fixture();
        let d0 = sum(&x).unwrap();
        assert!(matches!(
            newton_d(&config, &params, &x, d0).unwrap(),
            Newton::NotConverged { iterations: 2, .. }
        ));
    }

    #[test]
    fn vanishing_product_is_a_convergence_failure() {
        let config = Config::default();
        let (params, _) = fixture();
        let x = [U256::exp10(21); 3];
        assert_eq!(
            newton_d(&config, &params, &x, U256::exp10(40)).unwrap(),
            Newton::NotConverged {
                last: U256::exp10(40),
                iterations: 0,
            }
        );

        let x = [U256::exp10(40), U256::one(), U256::one()];
        let err = solve_d(&config, &params, &x).unwrap_err();
        assert!(err.is_convergence_failure(), "{err:?}");
    }

    #[test]
    fn two_coin_pool() {
        let config = Config::default();
        let (params, _) = fixture();
        let x = [U256::exp10(21), U256::from(2) * U256::exp10(21)];
        let d = solve_d(&config, &params, &x).unwrap();
        assert!(d > U256::from(2) * U256::exp10(21));
        assert!(d < U256::from(3) * U256::exp10(21));
    }
}
