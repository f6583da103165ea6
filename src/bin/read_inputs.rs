/**
 * ALSIngest
 * Copyright (C) 2018 Sebastian Schelter
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program. If not, see <http://www.gnu.org/licenses/>.
 */

use std::env;
use std::error::Error;
use std::process;
use std::sync::Mutex;

use getopts::Options;
use tracing::{error, info};

use alsingest::{Batch, Config, DualMatrix, IngestionTask, KnownItems, StringIdMapping};

fn main() {

    init_tracing();

    let args: Vec<String> = env::args().collect();
    let program = args[0].clone();

    let mut opts = Options::new();
    opts.optopt("i", "inbound", "Directory with the current interactions (required). Every file \
        holds one user, item and optional value per line, separated by commas. An empty value \
        removes the interaction.", "DIR");
    opts.optmulti("H", "historical", "Directory with interactions of an earlier run, using \
        numeric ids (optional, may be given several times, oldest first).", "DIR");
    opts.optopt("c", "config", "JSON configuration file (optional).", "PATH");
    opts.optopt("o", "outputfile", "Output file name (optional, output will be written to stdout \
        by default).", "PATH");
    opts.optopt("p", "pool-size", "Number of threads used for reading (optional, defaults to the \
        number of CPUs).", "NUMBER");
    opts.optflag("", "no-known-items", "Do not track the known items per user");
    opts.optflag("h", "help", "Print this help menu");

    let matches = match opts.parse(&args[1..]) {
        Ok(matches) => matches,
        Err(failure) => {
            let hint = failure.to_string();
            return print_usage_and_exit(&program, opts, Some(&hint))
        },
    };

    if matches.opt_present("h") {
        return print_usage_and_exit(&program, opts, None);
    }

    let inbound_path = match matches.opt_str("i") {
        Some(path) => path,
        None => return print_usage_and_exit(
            &program,
            opts,
            Some("Please specify the inbound directory via --inbound."),
        ),
    };

    let pool_size: usize = match matches.opt_get_default("p", num_cpus::get()) {
        Ok(pool_size) => pool_size,
        Err(failure) => {
            let hint = format!("Problem with option 'p': {}", failure.to_string());
            return print_usage_and_exit(&program, opts, Some(&hint))
        },
    };

    let historical_paths = matches.opt_strs("H");
    let config_path = matches.opt_str("c");
    let output_path = matches.opt_str("o");
    let track_known_items = !matches.opt_present("no-known-items");

    if let Err(failure) = read_inputs(
        &inbound_path,
        historical_paths,
        config_path,
        output_path,
        pool_size,
        track_known_items,
    ) {
        error!("{}", failure);
        process::exit(1);
    }
}

fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn print_usage_and_exit(
    program: &str,
    opts: Options,
    hint: Option<&str>
) {

    if let Some(hint) = hint {
        eprintln!("\n{}\n", hint);
    }

    let brief = format!("Usage: {} [options]", program);
    eprint!("{}", opts.usage(&brief));
    process::exit(2);
}

fn read_inputs(
    inbound_path: &str,
    historical_paths: Vec<String>,
    config_path: Option<String>,
    output_path: Option<String>,
    pool_size: usize,
    track_known_items: bool,
) -> Result<(), Box<dyn Error>> {

    let config = match config_path {
        Some(path) => {
            info!("Reading configuration from {}", path);
            Config::from_file(&path)?
        },
        None => Config::default(),
    };

    let mut tasks = Vec::with_capacity(historical_paths.len() + 1);
    for path in historical_paths.iter() {
        tasks.push(IngestionTask::new(path, Batch::Historical, &config)?);
    }
    // Current data goes last, it overrides whatever the past says about the same cell.
    tasks.push(IngestionTask::new(inbound_path, Batch::Inbound, &config)?);

    let mut matrix = DualMatrix::new();
    let mut known = if track_known_items { Some(KnownItems::new()) } else { None };
    let mapping = Mutex::new(StringIdMapping::new());

    info!("Reading {} input directories with {} threads", tasks.len(), pool_size);

    alsingest::read_inputs(&tasks, &mut matrix, known.as_mut(), &mapping, pool_size)?;

    let mapping = mapping.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner());

    info!("Writing {} rows...", matrix.num_rows());
    alsingest::io::write_matrix(&matrix, known.as_ref(), &mapping, output_path)?;

    Ok(())
}
