//! Arbitrary precision model of the invariant, used as ground truth when
//! validating the fixed-point kernel. Never on an execution path.
//!
//! Values are `BigDecimal`s expressed in the same fixed-point units as the
//! kernel (so `1e18` is one unit of a coin at the default scale) but are
//! never truncated to integers. Internally every quantity is divided by the
//! scale, the Newton steps are run in real arithmetic, and each iterate is
//! rounded to the working precision.

use {
    crate::{
        Params,
        config::Config,
        error::{Degenerate, Error},
    },
    bigdecimal::BigDecimal,
    num::{BigInt, Zero},
    number::conversions::u256_to_big_decimal,
    primitive_types::U256,
};

const MAX_STEPS: usize = 1000;
/// Relative step size at which an iteration is considered converged, as a
/// negative power of ten.
const TOLERANCE_EXP: i64 = 50;

#[derive(Clone, Debug)]
pub struct DecimalModel {
    config: Config,
    precision: u64,
}

impl DecimalModel {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            precision: 80,
        }
    }

    /// Number of significant digits kept between steps.
    pub fn with_precision(self, precision: u64) -> Self {
        Self { precision, ..self }
    }

    /// Converts fixed-point integers into the model's values.
    pub fn lift(xp: &[U256]) -> Vec<BigDecimal> {
        xp.iter().map(u256_to_big_decimal).collect()
    }

    pub fn reference_d(&self, params: &Params, xp: &[BigDecimal]) -> Result<BigDecimal, Error> {
        check_reserves(xp)?;
        let (a, gamma) = self.params(params)?;
        let x = self.to_real(xp);
        let n = integer(x.len());
        let s = x.iter().fold(BigDecimal::zero(), |s, x| s + x);
        let p = product(&x);
        let nn = pow(&n, x.len());

        let largest = x.iter().max().cloned().unwrap_or_else(one);
        let mut d = &n * self.nth_root(&p, x.len(), largest)?;
        for _ in 0..MAX_STEPS {
            let k0 = &p * &nn / pow(&d, x.len());
            let g1k0 = (&gamma + one() - &k0).abs();
            if g1k0.is_zero() {
                return Err(Error::ZeroDivision);
            }
            let mul1 = &d / (&gamma * &gamma) * &g1k0 * &g1k0 / &a;
            let mul2 = integer(2) * &n * &k0 / &g1k0;
            let neg_fprime = &s + &s * &mul2 + &mul1 * &n / &k0 - &mul2 * &d;
            if neg_fprime <= BigDecimal::zero() {
                return Err(Error::DidNotConverge { iterations: 0 });
            }

            let mut next = (&d * &neg_fprime + &d * &s - &d * &d) / &neg_fprime
                - &d * &mul1 / &neg_fprime * (one() - &k0) / &k0;
            if next < BigDecimal::zero() {
                next = next.abs() / integer(2);
            }
            let next = next.with_prec(self.precision);
            if converged(&d, &next) {
                return Ok(self.from_real(&next));
            }
            d = next;
        }
        Err(Error::DidNotConverge {
            iterations: MAX_STEPS,
        })
    }

    pub fn reference_y(
        &self,
        params: &Params,
        xp: &[BigDecimal],
        d: &BigDecimal,
        index: usize,
    ) -> Result<BigDecimal, Error> {
        if index >= xp.len() {
            return Err(Degenerate::IndexOutOfBounds {
                index,
                len: xp.len(),
            }
            .into());
        }
        if *d <= BigDecimal::zero() {
            return Err(Degenerate::ZeroInvariant.into());
        }
        // The unknown reserve may hold anything.
        let mut known = xp.to_vec();
        known[index] = one();
        check_reserves(&known)?;
        let others = xp
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index)
            .map(|(_, x)| x.clone())
            .collect::<Vec<_>>();
        let (a, gamma) = self.params(params)?;
        let others = self.to_real(&others);
        let d = d / self.scale();
        let n = integer(xp.len());

        let mut y = &d / &n;
        let mut k0_i = one();
        let mut s_i = BigDecimal::zero();
        for x in &others {
            y = &y * &d / (x * &n);
            k0_i = &k0_i * x * &n / &d;
            s_i += x;
        }

        for _ in 0..MAX_STEPS {
            let k0 = &k0_i * &y * &n / &d;
            let s = &s_i + &y;
            let g1k0 = (&gamma + one() - &k0).abs();
            if g1k0.is_zero() || k0.is_zero() {
                return Err(Error::ZeroDivision);
            }
            let mul1 = &d / (&gamma * &gamma) * &g1k0 * &g1k0 / &a;
            let mul2 = one() + integer(2) * &k0 / &g1k0;

            let yfprime = &y + &s * &mul2 + &mul1 - &d * &mul2;
            let fprime = &yfprime / &y;
            let next = if fprime <= BigDecimal::zero() {
                &y / integer(2)
            } else {
                let next = (&yfprime + &d - &s) / &fprime
                    + &mul1 / &fprime * (one() - &k0) / &k0;
                if next < BigDecimal::zero() {
                    &y / integer(2)
                } else {
                    next
                }
            };
            let next = next.with_prec(self.precision);
            if converged(&y, &next) {
                return Ok(self.from_real(&next));
            }
            y = next;
        }
        Err(Error::DidNotConverge {
            iterations: MAX_STEPS,
        })
    }

    /// Prices of coins `1..N` in coin 0 as `-dF/dx_j / -dF/dx_0`, evaluated
    /// from the partial derivatives of the invariant directly.
    pub fn reference_prices(
        &self,
        params: &Params,
        xp: &[BigDecimal],
        d: &BigDecimal,
    ) -> Result<Vec<BigDecimal>, Error> {
        check_reserves(xp)?;
        if *d <= BigDecimal::zero() {
            return Err(Degenerate::ZeroInvariant.into());
        }
        let (a, gamma) = self.params(params)?;
        let x = self.to_real(xp);
        let d = d / self.scale();
        let n = x.len();
        let s = x.iter().fold(BigDecimal::zero(), |s, x| s + x);
        let p = product(&x);
        // Without the N^N of the pool encoding.
        let a = a / pow(&integer(n), n);

        let k0 = &p * pow(&integer(n), n) / pow(&d, n);
        let denominator = &gamma + one() - &k0;
        if denominator.is_zero() {
            return Err(Error::ZeroDivision);
        }
        let gamma2 = &gamma * &gamma;
        let k = &a * &k0 * &gamma2 / (&denominator * &denominator);
        let dk_dk0 = &a * &gamma2 * (&gamma + one() + &k0) / pow(&denominator, 3);
        let d_n1 = pow(&d, n - 1);
        let q = &p + &k0 * dk_dk0 * &d_n1 * (&s - &d);

        let partial = |x: &BigDecimal| &k * &d_n1 + &q / x;
        let base = partial(&x[0]);
        if base.is_zero() {
            return Err(Error::ZeroDivision);
        }
        Ok(x[1..]
            .iter()
            .map(|x| (partial(x) / &base * self.scale()).with_prec(self.precision))
            .collect())
    }

    fn scale(&self) -> BigDecimal {
        u256_to_big_decimal(&self.config.scale)
    }

    fn to_real(&self, values: &[BigDecimal]) -> Vec<BigDecimal> {
        let scale = self.scale();
        values.iter().map(|value| value / &scale).collect()
    }

    fn from_real(&self, value: &BigDecimal) -> BigDecimal {
        (value * self.scale()).with_prec(self.precision)
    }

    /// `A * N^N` and gamma as real numbers.
    fn params(&self, params: &Params) -> Result<(BigDecimal, BigDecimal), Error> {
        if params.amp.is_zero() || params.gamma.is_zero() {
            return Err(Degenerate::ZeroParameter.into());
        }
        Ok((
            u256_to_big_decimal(&params.amp) / u256_to_big_decimal(&self.config.a_multiplier),
            u256_to_big_decimal(&params.gamma) / self.scale(),
        ))
    }

    /// Newton iteration for the `n`-th root of `value`, from an estimate
    /// above the root.
    fn nth_root(&self, value: &BigDecimal, n: usize, above: BigDecimal) -> Result<BigDecimal, Error> {
        let mut root = above;
        let degree = integer(n);
        for _ in 0..MAX_STEPS {
            let next = ((&degree - one()) * &root + value / pow(&root, n - 1)) / &degree;
            let next = next.with_prec(self.precision);
            if converged(&root, &next) {
                return Ok(next);
            }
            root = next;
        }
        Err(Error::DidNotConverge {
            iterations: MAX_STEPS,
        })
    }
}

fn check_reserves(xp: &[BigDecimal]) -> Result<(), Error> {
    if xp.len() < 2 {
        return Err(Degenerate::TooFewCoins.into());
    }
    match xp.iter().position(|x| *x <= BigDecimal::zero()) {
        Some(index) => Err(Degenerate::ZeroReserve { index }.into()),
        None => Ok(()),
    }
}

fn converged(prev: &BigDecimal, next: &BigDecimal) -> bool {
    (next - prev).abs() <= next.abs() * BigDecimal::new(BigInt::from(1), TOLERANCE_EXP)
}

fn one() -> BigDecimal {
    integer(1)
}

fn integer(value: usize) -> BigDecimal {
    BigDecimal::new(BigInt::from(value), 0)
}

fn product(values: &[BigDecimal]) -> BigDecimal {
    values.iter().fold(one(), |p, x| p * x)
}

fn pow(base: &BigDecimal, exp: usize) -> BigDecimal {
    (0..exp).fold(one(), |p, _| p * base)
}
