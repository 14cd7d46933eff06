use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{arg, value_parser, ArgMatches, Command};
use colored::Colorize;
use rand::{rngs::StdRng, SeedableRng};
use tracing_subscriber::EnvFilter;

use tpa_lstm::constants::demo::{
    DEFAULT_COLUMNS, DEFAULT_HIDDEN, DEFAULT_HORIZON, DEFAULT_SEED, DEFAULT_WINDOW, SINE_PERIOD,
};
use tpa_lstm::constants::model::{DEFAULT_FILTER_NUM, DEFAULT_N_LAYERS};
use tpa_lstm::utils::sine_columns;
use tpa_lstm::{TpaLstm, TpaLstmConfig};

fn cli() -> Command {
    Command::new("tpa_lstm")
        .about("Forecast synthetic sine columns with a TPA-LSTM")
        .arg(
            arg!(--columns <COUNT> "Number of series (entities)")
                .value_parser(value_parser!(usize))
                .required(false),
        )
        .arg(
            arg!(--window <LEN> "Observations per series")
                .value_parser(value_parser!(usize))
                .required(false),
        )
        .arg(
            arg!(--horizon <LEN> "Steps to forecast")
                .value_parser(value_parser!(usize))
                .required(false),
        )
        .arg(
            arg!(--hidden <SIZE> "Hidden size")
                .value_parser(value_parser!(usize))
                .required(false),
        )
        .arg(
            arg!(--layers <COUNT> "Recurrent layers")
                .value_parser(value_parser!(usize))
                .required(false),
        )
        .arg(
            arg!(--filters <COUNT> "Attention convolution filters")
                .value_parser(value_parser!(usize))
                .required(false),
        )
        .arg(
            arg!(--seed <SEED> "Weight initialisation seed")
                .value_parser(value_parser!(u64))
                .required(false),
        )
        .arg(
            arg!(--checkpoint <PATH> "Load weights instead of initialising them")
                .value_parser(value_parser!(PathBuf))
                .required(false),
        )
        .arg(
            arg!(--save <PATH> "Write the model to this path")
                .value_parser(value_parser!(PathBuf))
                .required(false),
        )
}

fn build_model(matches: &ArgMatches) -> Result<TpaLstm> {
    if let Some(path) = matches.get_one::<PathBuf>("checkpoint") {
        return TpaLstm::load(path)
            .with_context(|| format!("failed to load checkpoint {}", path.display()));
    }

    let config = TpaLstmConfig::new(
        arg_usize(matches, "horizon", DEFAULT_HORIZON),
        arg_usize(matches, "hidden", DEFAULT_HIDDEN),
        arg_usize(matches, "window", DEFAULT_WINDOW),
        arg_usize(matches, "layers", DEFAULT_N_LAYERS),
    )
    .with_filter_num(arg_usize(matches, "filters", DEFAULT_FILTER_NUM));

    let seed = *matches.get_one::<u64>("seed").unwrap_or(&DEFAULT_SEED);
    Ok(TpaLstm::new(config, &mut StdRng::seed_from_u64(seed))?)
}

fn arg_usize(matches: &ArgMatches, id: &str, default: usize) -> usize {
    matches.get_one::<usize>(id).copied().unwrap_or(default)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let matches = cli().get_matches();
    let model = build_model(&matches)?;
    let config = *model.config();

    if let Some(path) = matches.get_one::<PathBuf>("save") {
        model
            .save(path)
            .with_context(|| format!("failed to save checkpoint {}", path.display()))?;
        println!("{} {}", "Saved model to".green(), path.display());
    }

    let columns = arg_usize(&matches, "columns", DEFAULT_COLUMNS);
    let series = sine_columns(config.num_obs_to_train, columns, SINE_PERIOD);

    println!(
        "{} window={} horizon={} hidden={} layers={} filters={} parameters={}",
        "TPA-LSTM".bold(),
        config.num_obs_to_train,
        config.predict_seq_len,
        config.hidden_size,
        config.n_layers,
        config.filter_num,
        model.num_parameters()
    );

    let forecast = model.forward_columns(series.view())?;

    for (col, row) in forecast.outer_iter().enumerate() {
        let values = row
            .iter()
            .map(|v| format!("{v:>8.4}"))
            .collect::<Vec<_>>()
            .join(" ");
        println!("{} {}", format!("column {col}:").cyan(), values);
    }

    Ok(())
}
