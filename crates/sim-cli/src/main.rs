use std::env;
use std::path::{Path, PathBuf};

use log::info;
use sim_core::circuit::debug_dump_circuit;
use sim_core::conv::conv_test;
use sim_core::deck::Deck;
use sim_core::result_store::{NoiseRun, ResultStore};
use sim_core::soa::soa_check;
use sim_core::sweep::run_noise;

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn print_help() {
    println!(
        r#"MySpice Noise and Convergence Driver

USAGE:
    sim-cli <DECK> [OPTIONS]

ARGS:
    <DECK>                  Path to JSON device deck

OPTIONS:
    -h, --help              Print help information
    -V, --version           Print version information
    -o, --psf <PATH>        Write noise plots to PSF text file
    -c, --check             Run one convergence and one SOA pass on rhs_old
    --precision <N>         Output precision (1-15 significant digits, default: 6)

EXAMPLES:
    sim-cli amp.json                             # Noise sweep from deck
    sim-cli amp.json --psf noise.psf             # Export to PSF file
    RUST_LOG=debug sim-cli amp.json --check      # Verbose with checks"#
    );
}

fn print_version() {
    println!("myspice {}", VERSION);
}

fn main() {
    env_logger::init();

    let mut args = env::args().skip(1);
    let mut deck_path: Option<String> = None;
    let mut psf_path: Option<PathBuf> = None;
    let mut check = false;
    let mut precision: usize = 6;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            "--version" | "-V" => {
                print_version();
                std::process::exit(0);
            }
            "--psf" | "-o" => {
                let Some(path) = args.next() else {
                    eprintln!("missing value for {}", arg);
                    std::process::exit(2);
                };
                psf_path = Some(PathBuf::from(path));
            }
            "--check" | "-c" => check = true,
            "--precision" => {
                let Some(value) = args.next() else {
                    eprintln!("missing value for {}", arg);
                    std::process::exit(2);
                };
                precision = match value.parse::<usize>() {
                    Ok(p) if (1..=15).contains(&p) => p,
                    _ => {
                        eprintln!("precision must be between 1 and 15");
                        std::process::exit(2);
                    }
                };
            }
            _ => {
                if deck_path.is_none() {
                    deck_path = Some(arg);
                } else {
                    eprintln!("unexpected argument: {}", arg);
                    std::process::exit(2);
                }
            }
        }
    }

    let Some(deck_path) = deck_path else {
        eprintln!("usage: sim-cli <deck> [--psf <path>] [--check]");
        std::process::exit(2);
    };

    let path = Path::new(&deck_path);
    if !path.exists() {
        eprintln!("deck not found: {}", deck_path);
        std::process::exit(2);
    }

    let deck = match Deck::load(path) {
        Ok(deck) => deck,
        Err(err) => {
            eprintln!("failed to load deck: {}", err);
            std::process::exit(2);
        }
    };

    let mut circuit = match deck.build_circuit() {
        Ok(circuit) => circuit,
        Err(err) => {
            eprintln!("deck elaboration error: {}", err);
            std::process::exit(2);
        }
    };
    debug_dump_circuit(&circuit);

    let mut ctx = deck.context();
    let transfer = deck.transfer.transfer();
    let mut store = ResultStore::new();
    let run_id = match run_noise(
        &mut circuit,
        &ctx,
        &deck.noise,
        |_| Ok(transfer.clone()),
        &mut store,
    ) {
        Ok(id) => id,
        Err(err) => {
            eprintln!("noise analysis failed: {}", err);
            std::process::exit(1);
        }
    };

    if let Ok(run) = store.get(run_id) {
        print_noise(run, precision);
    }

    if let Some(path) = psf_path {
        if let Err(err) = store.write_psf_text(run_id, &path) {
            eprintln!("failed to write psf: {}", err);
            std::process::exit(1);
        }
        println!("psf written: {}", path.display());
    }

    if check {
        match conv_test(&circuit, &mut ctx) {
            Ok(converged) => println!("convergence: {} (noncon={})", converged, ctx.noncon()),
            Err(err) => {
                eprintln!("convergence check failed: {}", err);
                std::process::exit(1);
            }
        }
        if let Err(err) = soa_check(&mut circuit, &ctx) {
            eprintln!("soa check failed: {}", err);
            std::process::exit(1);
        }
        info!("soa check done in {:?}", ctx.analysis);
    }
}

fn print_noise(run: &NoiseRun, precision: usize) {
    println!(
        "noise: {} frequency points from {} Hz to {} Hz",
        run.summary.frequencies.len(),
        run.summary.frequencies.first().copied().unwrap_or(0.0),
        run.summary.frequencies.last().copied().unwrap_or(0.0)
    );

    // Print header
    print!("{:>14}", "Frequency");
    for name in &run.spectrum.channels {
        print!("  {:>18}", name);
    }
    println!();

    // Print data (first and last few points)
    let n = run.spectrum.rows.len();
    let show_all = n <= 20;
    for (i, row) in run.spectrum.rows.iter().enumerate() {
        if show_all || i < 5 || i >= n - 5 {
            print!("{:>14.6e}", row.freq);
            for value in &row.values {
                print!("  {:>18.*e}", precision, value);
            }
            println!();
        } else if i == 5 {
            println!("  ... ({} more points) ...", n - 10);
        }
    }

    for (name, value) in run
        .integrated
        .channels
        .iter()
        .zip(run.integrated.rows.iter().flat_map(|r| r.values.iter()))
    {
        println!("{} = {:.*e}", name, precision, value);
    }
}
