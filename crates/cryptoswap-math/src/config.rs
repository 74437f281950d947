//! Constants of a pool instantiation.
//!
//! The kernel hard-codes none of its precision, band or iteration limits so
//! the same code serves pools with a different coin count or precision.

use {
    anyhow::{Context, Result, ensure},
    number::serialization::HexOrDecimalU256,
    primitive_types::U256,
    serde::{Deserialize, Serialize},
    serde_with::serde_as,
    std::path::Path,
};

#[serde_as]
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct Config {
    /// Fixed-point base of balances, D, gamma and prices.
    #[serde_as(as = "HexOrDecimalU256")]
    pub scale: U256,
    /// Scale of the amplification coefficient. The amplification passed to
    /// the kernel is `A * N^N * a_multiplier`.
    #[serde_as(as = "HexOrDecimalU256")]
    pub a_multiplier: U256,
    /// Lower bound of `x * scale / D` inside which the solvers are trusted.
    #[serde_as(as = "HexOrDecimalU256")]
    pub min_ratio: U256,
    /// Upper bound of `x * scale / D` inside which the solvers are trusted.
    #[serde_as(as = "HexOrDecimalU256")]
    pub max_ratio: U256,
    pub max_iterations: usize,
    /// Absolute stop tolerance of the Newton iterations.
    #[serde_as(as = "HexOrDecimalU256")]
    pub convergence_epsilon: U256,
    /// Relative stop tolerance: a step of at most `value / divisor` also
    /// terminates the iteration.
    #[serde_as(as = "HexOrDecimalU256")]
    pub convergence_divisor: U256,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scale: U256::exp10(18),
            a_multiplier: U256::from(10_000),
            min_ratio: U256::exp10(16),
            max_ratio: U256::exp10(20),
            max_iterations: 255,
            convergence_epsilon: U256::from(100),
            convergence_divisor: U256::exp10(14),
        }
    }
}

impl Config {
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).context("invalid configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("config {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(!self.scale.is_zero(), "scale must be positive");
        ensure!(!self.a_multiplier.is_zero(), "a-multiplier must be positive");
        ensure!(
            !self.min_ratio.is_zero() && self.min_ratio <= self.max_ratio,
            "safety band [{}, {}] is empty",
            self.min_ratio,
            self.max_ratio
        );
        ensure!(self.max_iterations > 0, "max-iterations must be positive");
        ensure!(
            !self.convergence_divisor.is_zero(),
            "convergence-divisor must be positive"
        );
        Ok(())
    }

    /// The stop tolerance for a Newton step ending at `value`.
    pub(crate) fn tolerance(&self, value: U256) -> U256 {
        self.convergence_epsilon.max(value / self.convergence_divisor)
    }
}

#[cfg(test)]
mod tests {
    use {super::*, std::io::Write};

    #[test]
    fn empty_document_is_default() {
        assert_eq!(Config::from_toml("").unwrap(), Config::default());
    }

    #[test]
    fn parses_overrides() {
        let config = Config::from_toml(
            r#"
            scale = "1000000"
            a-multiplier = 100
            min-ratio = "0x2710"
            max-ratio = "100_000_000"
            max-iterations = 64
            "#,
        )
        .unwrap();
        assert_eq!(config.scale, U256::exp10(6));
        assert_eq!(config.a_multiplier, U256::from(100));
        assert_eq!(config.min_ratio, U256::from(10_000));
        assert_eq!(config.max_ratio, U256::exp10(8));
        assert_eq!(config.max_iterations, 64);
        assert_eq!(config.convergence_epsilon, U256::from(100));
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(Config::from_toml("scale = 0").is_err());
        assert!(Config::from_toml("max-iterations = 0").is_err());
        assert!(Config::from_toml("min-ratio = 5\nmax-ratio = 4").is_err());
        assert!(Config::from_toml("unknown = 1").is_err());
    }

    #[test]
    fn reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max-iterations = 100").unwrap();
        let config = Config::from_path(file.path()).unwrap();
        assert_eq!(config.max_iterations, 100);
        assert!(Config::from_path(Path::new("/nonexistent/config.toml")).is_err());
    }

    #[test]
    fn tolerance_is_relative_above_floor() {
        let config = Config::default();
        assert_eq!(config.tolerance(U256::exp10(10)), U256::from(100));
        assert_eq!(config.tolerance(U256::exp10(24)), U256::exp10(10));
    }
}
