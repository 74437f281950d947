//! Evaluates the cryptoswap invariant kernel for a single pool state.
//!
//! ```text
//! cryptoswap --amp 42253659 --gamma 11720394944313222 \
//!     prices 165898964704801767090 180089627760498533741 479703029155498241214
//! ```
//!
//! All amounts are price-scaled fixed-point integers, written in decimal or
//! as `0x` prefixed hex.

use {
    anyhow::{Context, Result},
    clap::{Args, Parser, Subcommand},
    cryptoswap_math::{
        Config,
        Params,
        fee::FeeParams,
        get_marginal_prices,
        reference::DecimalModel,
        safety::SafetyBand,
        solve_d,
        solve_y,
        trade::{self, Swap},
    },
    itertools::Itertools,
    number::{conversions::big_decimal_to_u256, serialization::parse},
    primitive_types::U256,
    std::path::PathBuf,
    tracing_subscriber::EnvFilter,
};

#[derive(Debug, Parser)]
#[command(name = "cryptoswap", version, about = "Evaluate the cryptoswap invariant math")]
struct Arguments {
    /// TOML file with the kernel configuration. Defaults apply otherwise.
    #[arg(long, env = "CRYPTOSWAP_CONFIG")]
    config: Option<PathBuf>,

    /// Amplification as encoded by the pool, `A * N^N * a_multiplier`.
    #[arg(long, env = "CRYPTOSWAP_AMP", value_parser = parse)]
    amp: U256,

    /// Curvature parameter at the fixed-point scale.
    #[arg(long, env = "CRYPTOSWAP_GAMMA", value_parser = parse)]
    gamma: U256,

    /// Print results as JSON.
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Solve the invariant D of the reserves.
    D {
        #[arg(required = true, num_args = 2.., value_parser = parse)]
        xp: Vec<U256>,
    },

    /// Solve the reserve at `index` for a given D. The value passed for that
    /// reserve is ignored.
    Y {
        #[arg(long, value_parser = parse)]
        d: U256,
        #[arg(long)]
        index: usize,
        #[arg(required = true, num_args = 2.., value_parser = parse)]
        xp: Vec<U256>,
    },

    /// Marginal prices of coins 1.. in coin 0.
    Prices {
        #[arg(required = true, num_args = 2.., value_parser = parse)]
        xp: Vec<U256>,
    },

    /// Whether the reserves lie within the safety band.
    Safe {
        #[arg(required = true, num_args = 2.., value_parser = parse)]
        xp: Vec<U256>,
    },

    /// D and prices from the arbitrary precision model, rounded down.
    Reference {
        /// Significant digits kept between iterations. The iterations stop
        /// at a relative step of 1e-50, so fewer digits cannot converge.
        #[arg(long, default_value_t = 80, value_parser = clap::value_parser!(u64).range(60..))]
        precision: u64,
        #[arg(required = true, num_args = 2.., value_parser = parse)]
        xp: Vec<U256>,
    },

    /// Sell `dx` of coin `i` for coin `j`.
    Exchange {
        #[arg(long)]
        i: usize,
        #[arg(long)]
        j: usize,
        #[arg(long, value_parser = parse)]
        dx: U256,
        #[command(flatten)]
        fee: FeeArguments,
        #[arg(required = true, num_args = 2.., value_parser = parse)]
        xp: Vec<U256>,
    },
}

/// Dynamic fee of an exchange, in units of 1e-10. Trades are fee free
/// without them.
#[derive(Debug, Args)]
struct FeeArguments {
    #[arg(long, requires_all = ["out_fee", "fee_gamma"], value_parser = parse)]
    mid_fee: Option<U256>,
    #[arg(long, requires_all = ["mid_fee", "fee_gamma"], value_parser = parse)]
    out_fee: Option<U256>,
    #[arg(long, requires_all = ["mid_fee", "out_fee"], value_parser = parse)]
    fee_gamma: Option<U256>,
}

impl FeeArguments {
    fn params(&self) -> Option<FeeParams> {
        Some(FeeParams {
            mid_fee: self.mid_fee?,
            out_fee: self.out_fee?,
            fee_gamma: self.fee_gamma?,
        })
    }
}

fn main() {
    tracing_subscriber::fmt::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("LOG_FILTER")
                .unwrap_or_else(|_| "warn,cryptoswap=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Arguments::parse();
    match run(args) {
        Ok(output) => println!("{output}"),
        Err(err) => {
            tracing::error!("{:?}", err);
            std::process::exit(1);
        }
    }
}

fn run(args: Arguments) -> Result<String> {
    let config = match &args.config {
        Some(path) => Config::from_path(path)?,
        None => Config::default(),
    };
    let params = Params {
        amp: args.amp,
        gamma: args.gamma,
    };
    let invariant = |xp: &[U256]| solve_d(&config, &params, xp).context("solving D");

    let output = match args.command {
        Command::D { xp } => {
            let d = invariant(&xp)?;
            render(args.json, serde_json::json!({ "d": d.to_string() }), d)
        }
        Command::Y { d, index, xp } => {
            let y = solve_y(&config, &params, &xp, d, index).context("solving y")?;
            render(args.json, serde_json::json!({ "y": y.to_string() }), y)
        }
        Command::Prices { xp } => {
            let d = invariant(&xp)?;
            let prices = get_marginal_prices(&config, &params, &xp, d).context("pricing")?;
            render(
                args.json,
                serde_json::json!({
                    "d": d.to_string(),
                    "prices": prices.iter().map(U256::to_string).collect::<Vec<_>>(),
                }),
                prices.iter().join("\n"),
            )
        }
        Command::Safe { xp } => {
            let d = invariant(&xp)?;
            let band = SafetyBand::new(&config);
            let safe = band.is_safe(&xp, d);
            if !safe {
                let ratios = xp.iter().map(|x| band.ratio(*x, d)).collect::<Vec<_>>();
                tracing::info!(?ratios, "outside of the safety band");
            }
            render(args.json, serde_json::json!({ "d": d.to_string(), "safe": safe }), safe)
        }
        Command::Reference { precision, xp } => {
            let model = DecimalModel::new(config.clone()).with_precision(precision);
            let lifted = DecimalModel::lift(&xp);
            let d = model.reference_d(&params, &lifted).context("solving D")?;
            let prices = model
                .reference_prices(&params, &lifted, &d)
                .context("pricing")?
                .iter()
                .map(big_decimal_to_u256)
                .collect::<Result<Vec<_>>>()?;
            let d = big_decimal_to_u256(&d)?;
            render(
                args.json,
                serde_json::json!({
                    "d": d.to_string(),
                    "prices": prices.iter().map(U256::to_string).collect::<Vec<_>>(),
                }),
                std::iter::once(d).chain(prices).join("\n"),
            )
        }
        Command::Exchange { i, j, dx, fee, xp } => {
            let d = invariant(&xp)?;
            let fee = fee.params();
            let swap = Swap { i, j, dx };
            let exchange = trade::exchange(&config, &params, &xp, d, swap, fee.as_ref())
                .context("exchanging")?;
            tracing::info!(dy = %exchange.dy, fee = %exchange.fee, "exchanged");
            render(
                args.json,
                serde_json::to_value(&exchange)?,
                format!(
                    "dy {}\nfee {}\nd {}\nxp {}",
                    exchange.dy,
                    exchange.fee,
                    exchange.d,
                    exchange.xp.iter().join(" "),
                ),
            )
        }
    };
    Ok(output)
}

fn render(json: bool, value: serde_json::Value, text: impl ToString) -> String {
    if json {
        value.to_string()
    } else {
        text.to_string()
    }
}
