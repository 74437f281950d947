//! Unsigned 256-bit fixed-point helpers.
//!
//! Two flavours are provided: checked operations that surface overflow and
//! division by zero as [`Error`]s, and wrapping operations with EVM
//! semantics (modulo 2^256, division by zero yields zero) used where the
//! closed-form price evaluation skips the checks on purpose.

use {
    crate::error::Error,
    itertools::Itertools,
    primitive_types::{U256, U512},
};

pub trait U256Ext: Sized {
    fn try_add(self, other: Self) -> Result<Self, Error>;
    fn try_sub(self, other: Self) -> Result<Self, Error>;
    fn try_mul(self, other: Self) -> Result<Self, Error>;
    fn try_div(self, other: Self) -> Result<Self, Error>;
    fn try_pow(self, exp: Self) -> Result<Self, Error>;
    /// `self * mul / div` with a 512-bit intermediate product, so the result
    /// only fails when the final quotient does not fit into 256 bits.
    fn mul_div(self, mul: Self, div: Self) -> Result<Self, Error>;

    fn wrapping_add(self, other: Self) -> Self;
    fn wrapping_mul(self, other: Self) -> Self;
    fn wrapping_div(self, other: Self) -> Self;
    /// `self ^ exp mod 2^256`.
    fn pow_mod256(self, exp: Self) -> Self;

    fn abs_diff(self, other: Self) -> Self;
}

impl U256Ext for U256 {
    fn try_add(self, other: Self) -> Result<Self, Error> {
        self.checked_add(other).ok_or(Error::Overflow)
    }

    fn try_sub(self, other: Self) -> Result<Self, Error> {
        self.checked_sub(other).ok_or(Error::Overflow)
    }

    fn try_mul(self, other: Self) -> Result<Self, Error> {
        self.checked_mul(other).ok_or(Error::Overflow)
    }

    fn try_div(self, other: Self) -> Result<Self, Error> {
        self.checked_div(other).ok_or(Error::ZeroDivision)
    }

    fn try_pow(self, exp: Self) -> Result<Self, Error> {
        self.checked_pow(exp).ok_or(Error::Overflow)
    }

    fn mul_div(self, mul: Self, div: Self) -> Result<Self, Error> {
        if div.is_zero() {
            return Err(Error::ZeroDivision);
        }
        let quotient = self.full_mul(mul) / U512::from(div);
        U256::try_from(quotient).map_err(|_| Error::Overflow)
    }

    fn wrapping_add(self, other: Self) -> Self {
        self.overflowing_add(other).0
    }

    fn wrapping_mul(self, other: Self) -> Self {
        self.overflowing_mul(other).0
    }

    fn wrapping_div(self, other: Self) -> Self {
        self.checked_div(other).unwrap_or_default()
    }

    fn pow_mod256(self, exp: Self) -> Self {
        self.overflowing_pow(exp).0
    }

    fn abs_diff(self, other: Self) -> Self {
        if self > other {
            self - other
        } else {
            other - self
        }
    }
}

/// Returns the values ordered from largest to smallest. Iterating the
/// products large-first keeps the intermediate values of the Newton
/// iterations close to the scale.
pub fn sort_descending(values: &[U256]) -> Vec<U256> {
    values.iter().copied().sorted_unstable_by(|a, b| b.cmp(a)).collect()
}

pub fn sum(values: &[U256]) -> Result<U256, Error> {
    values
        .iter()
        .try_fold(U256::zero(), |acc, value| acc.try_add(*value))
}

/// `N` as a `U256`.
pub fn coins(values: &[U256]) -> U256 {
    U256::from(values.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checked_operations() {
        let one = U256::one();
        assert_eq!(U256::MAX.try_add(one), Err(Error::Overflow));
        assert_eq!(U256::zero().try_sub(one), Err(Error::Overflow));
        assert_eq!(U256::MAX.try_mul(U256::from(2)), Err(Error::Overflow));
        assert_eq!(one.try_div(U256::zero()), Err(Error::ZeroDivision));
        assert_eq!(U256::from(7).try_div(U256::from(2)), Ok(U256::from(3)));
        assert_eq!(U256::from(3).try_pow(U256::from(3)), Ok(U256::from(27)));
        assert_eq!(U256::from(2).try_pow(U256::from(256)), Err(Error::Overflow));
    }

    #[test]
    fn mul_div_widens_intermediate() {
        let large = U256::exp10(70);
        assert_eq!(large.try_mul(large), Err(Error::Overflow));
        assert_eq!(large.mul_div(large, large), Ok(large));
        assert_eq!(
            U256::from(10).mul_div(U256::from(10), U256::from(3)),
            Ok(U256::from(33))
        );
        assert_eq!(large.mul_div(large, U256::one()), Err(Error::Overflow));
        assert_eq!(large.mul_div(large, U256::zero()), Err(Error::ZeroDivision));
    }

    #[test]
    fn wrapping_operations_follow_evm_semantics() {
        assert_eq!(U256::MAX.wrapping_add(U256::from(2)), U256::one());
        assert_eq!(U256::from(5).wrapping_div(U256::zero()), U256::zero());
        assert_eq!(
            (U256::one() << 255).wrapping_mul(U256::from(2)),
            U256::zero()
        );
        assert_eq!(U256::from(3).pow_mod256(U256::from(4)), U256::from(81));
        assert_eq!(U256::from(2).pow_mod256(U256::from(256)), U256::zero());
    }

    #[test]
    fn sorts_from_high_to_low() {
        let values = [1_u64, 5, 3, 5].map(U256::from);
        assert_eq!(sort_descending(&values), [5_u64, 5, 3, 1].map(U256::from));
    }

    #[test]
    fn abs_diff_is_symmetric() {
        let (a, b) = (U256::from(3), U256::from(10));
        assert_eq!(a.abs_diff(b), U256::from(7));
        assert_eq!(b.abs_diff(a), U256::from(7));
    }
}
