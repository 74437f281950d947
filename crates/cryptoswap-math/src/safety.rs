//! The band of reserve-to-D ratios within which the solvers' numeric
//! guarantees hold.

use {
    crate::{config::Config, error::Error, fixed_point::U256Ext},
    primitive_types::U256,
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SafetyBand {
    pub scale: U256,
    pub min_ratio: U256,
    pub max_ratio: U256,
}

impl SafetyBand {
    pub fn new(config: &Config) -> Self {
        Self {
            scale: config.scale,
            min_ratio: config.min_ratio,
            max_ratio: config.max_ratio,
        }
    }

    /// `x * scale / d`, or `None` for a zero `d` or a ratio too large to
    /// represent.
    pub fn ratio(&self, x: U256, d: U256) -> Option<U256> {
        x.mul_div(self.scale, d).ok()
    }

    /// Returns `true` if every reserve normalised by `d` lies within
    /// `[min_ratio, max_ratio]`. A zero `d` is never safe.
    pub fn is_safe(&self, xp: &[U256], d: U256) -> bool {
        xp.iter().all(|x| {
            self.ratio(*x, d)
                .is_some_and(|ratio| self.min_ratio <= ratio && ratio <= self.max_ratio)
        })
    }

    /// Total relative distance of the normalised reserves outside of the
    /// band, at the fixed-point scale. Zero exactly for safe states; `None`
    /// when a ratio cannot be computed.
    pub fn distance(&self, xp: &[U256], d: U256) -> Option<U256> {
        xp.iter().try_fold(U256::zero(), |total, x| {
            let ratio = self.ratio(*x, d)?;
            let outside = if ratio < self.min_ratio {
                (self.min_ratio - ratio).mul_div(self.scale, self.min_ratio).ok()?
            } else if ratio > self.max_ratio {
                (ratio - self.max_ratio).mul_div(self.scale, self.max_ratio).ok()?
            } else {
                U256::zero()
            };
            total.checked_add(outside)
        })
    }

    /// Accepts a state transition if it ends in a safe state, or if it
    /// started in an unsafe state and strictly moves towards the band.
    pub fn check_transition(
        &self,
        (before, d_before): (&[U256], U256),
        (after, d_after): (&[U256], U256),
    ) -> Result<(), Error> {
        if self.is_safe(after, d_after) {
            return Ok(());
        }
        match (self.distance(before, d_before), self.distance(after, d_after)) {
            (Some(before), Some(after)) if !before.is_zero() && after < before => Ok(()),
            _ => Err(Error::UnsafeState),
        }
    }
}

/// Convenience wrapper around [`SafetyBand::is_safe`].
pub fn is_safe(config: &Config, xp: &[U256], d: U256) -> bool {
    SafetyBand::new(config).is_safe(xp, d)
}
