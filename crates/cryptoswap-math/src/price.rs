//! Closed-form marginal prices.
//!
//! Differentiating the invariant implicitly gives, for every coin `i`,
//!
//! ```text
//! dF/dx_i = (K D^(N-1) x_i + Q) / x_i
//! ```
//!
//! with a `Q` shared by all coins. Eliminating `sum(x)` through the invariant
//! and normalising by `(gamma + 1 - K0)^2 * N^N / D^N` leaves
//!
//! ```text
//! GK0   = 2 K0^3 - (2 gamma + 3) K0^2 + (gamma + 1)^2
//! p_j   = x_0 (GK0 + NNAG2 x_j K0 / D) / (x_j (GK0 + NNAG2 x_0 K0 / D))
//! NNAG2 = A N^N gamma^2
//! ```
//!
//! which is evaluated at `scale^2` precision. No iteration is involved.

use {
    crate::{
        Params,
        config::Config,
        error::{Degenerate, Error},
        fixed_point::{U256Ext, coins},
    },
    primitive_types::U256,
};

/// Returns the marginal price of every coin `j >= 1` denominated in coin 0,
/// at the fixed-point scale.
///
/// Meaningful only for states within the safety band; outside of it the
/// result is still returned but carries no accuracy guarantee.
pub fn get_marginal_prices(
    config: &Config,
    params: &Params,
    xp: &[U256],
    d: U256,
) -> Result<Vec<U256>, Error> {
    if xp.len() < 2 {
        return Err(Degenerate::TooFewCoins.into());
    }
    if let Some(index) = xp.iter().position(U256::is_zero) {
        return Err(Degenerate::ZeroReserve { index }.into());
    }
    if d.is_zero() {
        return Err(Degenerate::ZeroInvariant.into());
    }

    let one = config.scale;
    let one2 = one.try_mul(one)?;
    let n = coins(xp);
    let gamma = params.gamma;

    // K0 = N^N * prod(x) / D^N at scale^2
    let nn = n.try_pow(n)?;
    let mut k0 = nn.try_mul(xp[0])?.try_mul(xp[1])?.wrapping_div(d);
    for x in &xp[2..] {
        k0 = k0.try_mul(*x)?.wrapping_div(d);
    }
    let k0 = k0.try_mul(one2)?.wrapping_div(d);

    let k0_squared = k0.pow_mod256(U256::from(2)).wrapping_div(one2);
    let gk0 = U256::from(2)
        .try_mul(k0)?
        .try_mul(k0)?
        .wrapping_div(one2)
        .try_mul(k0)?
        .wrapping_div(one2)
        .try_add(gamma.wrapping_add(one).pow_mod256(U256::from(2)))?
        .try_sub(
            k0_squared
                .try_mul(
                    U256::from(2)
                        .wrapping_mul(gamma)
                        .wrapping_add(U256::from(3).wrapping_mul(one)),
                )?
                .wrapping_div(one),
        )?;

    let nnag2 = params
        .amp
        .wrapping_mul(gamma.pow_mod256(U256::from(2)))
        .wrapping_div(config.a_multiplier);
    let term = |x: U256| -> Result<U256, Error> {
        Ok(nnag2.try_mul(x)?.wrapping_div(d).try_mul(k0)?.wrapping_div(one2))
    };

    let denominator = gk0.try_add(term(xp[0])?)?;
    xp[1..]
        .iter()
        .map(|x| {
            Ok(xp[0]
                .try_mul(gk0.try_add(term(*x)?)?)?
                .try_div(*x)?
                .try_mul(one)?
                .wrapping_div(denominator))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use {super::*, crate::invariant::solve_d};

    fn fixture() -> (Params, Vec<U256>, U256) {
        (
            Params {
                amp: U256::from(42_253_659_u64),
                gamma: U256::from(11_720_394_944_313_222_u64),
            },
            vec![
                U256::from(165_898_964_704_801_767_090_u128),
                U256::from(180_089_627_760_498_533_741_u128),
                U256::from(479_703_029_155_498_241_214_u128),
            ],
            U256::from(798_348_646_635_793_903_194_u128),
        )
    }

    #[test]
    fn matches_known_prices() {
        let (params, xp, d) = fixture();
        let prices = get_marginal_prices(&Config::default(), &params, &xp, d).unwrap();
        assert_eq!(
            prices,
            [
                U256::from(950_539_494_815_349_606_u64),
                U256::from(589_388_920_722_357_662_u64)
            ]
        );
    }

    #[test]
    fn balanced_pool_is_priced_at_par() {
        let config = Config::default();
        let (params, _, _) = fixture();
        let xp = vec![U256::exp10(21); 3];
        let d = solve_d(&config, &params, &xp).unwrap();
        let prices = get_marginal_prices(&config, &params, &xp, d).unwrap();
        assert_eq!(prices, [U256::exp10(18); 2]);
    }

    #[test]
    fn scarce_coin_is_more_expensive() {
        let config = Config::default();
        let (params, _, _) = fixture();
        let xp = vec![
            U256::exp10(21),
            U256::from(5) * U256::exp10(20),
            U256::from(2) * U256::exp10(21),
        ];
        let d = solve_d(&config, &params, &xp).unwrap();
        let prices = get_marginal_prices(&config, &params, &xp, d).unwrap();
        assert!(prices[0] > U256::exp10(18));
        assert!(prices[1] < U256::exp10(18));
    }

    #[test]
    fn two_coin_pool_has_one_price() {
        let config = Config::default();
        let (params, _, _) = fixture();
        let xp = vec![U256::exp10(21), U256::from(2) * U256::exp10(21)];
        let d = solve_d(&config, &params, &xp).unwrap();
        let prices = get_marginal_prices(&config, &params, &xp, d).unwrap();
        assert_eq!(prices.len(), 1);
        assert!(prices[0] < U256::exp10(18));
    }

    #[test]
    fn rejects_degenerate_inputs() {
        let config = Config::default();
        let (params, xp, d) = fixture();
        assert_eq!(
            get_marginal_prices(&config, &params, &xp, U256::zero()),
            Err(Error::Degenerate(Degenerate::ZeroInvariant))
        );
        assert_eq!(
            get_marginal_prices(&config, &params, &[xp[0], U256::zero(), xp[2]], d),
            Err(Error::Degenerate(Degenerate::ZeroReserve { index: 1 }))
        );
    }
}
