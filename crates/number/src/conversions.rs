//! Conversions between the fixed-width integers used on the hot path and the
//! arbitrary precision types used for reference computations.

use {
    anyhow::{Result, ensure},
    bigdecimal::BigDecimal,
    num::{BigInt, BigUint, Signed, bigint::Sign},
    primitive_types::U256,
};

pub fn u256_to_big_uint(input: &U256) -> BigUint {
    let mut bytes = [0; 32];
    input.to_big_endian(&mut bytes);
    BigUint::from_bytes_be(&bytes)
}

pub fn u256_to_big_int(input: &U256) -> BigInt {
    BigInt::from_biguint(Sign::Plus, u256_to_big_uint(input))
}

pub fn big_uint_to_u256(input: &BigUint) -> Result<U256> {
    let bytes = input.to_bytes_be();
    ensure!(bytes.len() <= 32, "too large");
    Ok(U256::from_big_endian(&bytes))
}

pub fn big_int_to_u256(input: &BigInt) -> Result<U256> {
    ensure!(!input.is_negative(), "negative");
    big_uint_to_u256(input.magnitude())
}

pub fn u256_to_big_decimal(u256: &U256) -> BigDecimal {
    BigDecimal::new(u256_to_big_int(u256), 0)
}

/// Truncates the fractional part of a non-negative decimal and converts the
/// integer part into a `U256`.
pub fn big_decimal_to_u256(big_decimal: &BigDecimal) -> Result<U256> {
    ensure!(!big_decimal.is_negative(), "negative");
    let (int, _) = big_decimal.with_scale(0).as_bigint_and_exponent();
    big_int_to_u256(&int)
}

#[cfg(test)]
mod tests {
    use {super::*, num::Zero, std::str::FromStr};

    #[test]
    fn big_int_round_trip() {
        for value in [U256::zero(), U256::one(), U256::exp10(18), U256::MAX] {
            let big = u256_to_big_int(&value);
            assert_eq!(big_int_to_u256(&big).unwrap(), value);
        }
    }

    #[test]
    fn big_int_out_of_range() {
        assert!(big_int_to_u256(&BigInt::from(-1)).is_err());
        let too_large = u256_to_big_int(&U256::MAX) + 1;
        assert!(big_int_to_u256(&too_large).is_err());
        assert!(big_int_to_u256(&BigInt::zero()).unwrap().is_zero());
    }

    #[test]
    fn big_decimal_truncates() {
        let value = BigDecimal::from_str("1234.9999").unwrap();
        assert_eq!(big_decimal_to_u256(&value).unwrap(), U256::from(1234));
        let value = BigDecimal::from_str("0.5").unwrap();
        assert_eq!(big_decimal_to_u256(&value).unwrap(), U256::zero());
        let value = BigDecimal::from_str("-0.5").unwrap();
        assert!(big_decimal_to_u256(&value).is_err());
        assert_eq!(
            u256_to_big_decimal(&U256::from(42)),
            BigDecimal::from_str("42").unwrap()
        );
    }
}
