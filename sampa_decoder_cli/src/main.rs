//! # sampa_decoder_cli
//!
//! Part of the sampa_decoder crate family.
//!
//! This is the CLI application to decode SAMPA packets from DATE raw data
//! files.
//!
//! ## Use
//!
//! To decode data use the following command
//!
//! ```bash
//! sampa_decoder_cli -p/--path <your_configuration.yaml>
//! ```
//!
//! To generate a configuration template file use
//!
//! ```bash
//! sampa_decoder_cli -p/--path <your_configuration.yaml> new
//! ```
//!
//! ## Configuration
//!
//! The following fields must be specified in the configuration file:
//!
//! - input_path: Full path to the DATE raw data file to decode
//! - elink_mask: Bitmask of elinks to skip (bit 0 = elink 0); 0 decodes everything
//! - max_events: Stop after this many DATE events; 0 means no limit
//! - max_gbt_words: Stop after this many GBT words; 0 means no limit
//! - dump_packets: Print every decoded packet to stdout instead of only counting them

use clap::{Arg, Command};
use human_bytes::human_bytes;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

use libsampa_decoder::config::Config;
use libsampa_decoder::process::process_run;
use libsampa_decoder::worker_status::WorkerStatus;

fn make_template_config(path: &Path) {
    let config = Config::default();
    let yaml_str = serde_yaml::to_string(&config).unwrap();
    let mut file = File::create(path).expect("Could not create template config file!");
    file.write_all(yaml_str.as_bytes())
        .expect("Failed to write yaml data to file!");
}

fn main() {
    // Create a cli
    let matches = Command::new("sampa_decoder_cli")
        .arg_required_else_help(true)
        .subcommand(Command::new("new").about("Make a template configuration yaml file"))
        .arg(
            Arg::new("path")
                .short('p')
                .long("path")
                .help("Path to the configuration file"),
        )
        .get_matches();

    // Parse the cli
    let config_path = PathBuf::from(matches.get_one::<String>("path").expect("We require args"));

    if let Some(("new", _)) = matches.subcommand() {
        spdlog::info!(
            "Making a template config at {}...",
            config_path.to_string_lossy()
        );
        make_template_config(&config_path);
        spdlog::info!("Done.");
        return;
    }

    // Load our config
    spdlog::info!("Loading config from {}...", config_path.to_string_lossy());
    let config = match Config::read_config_file(&config_path) {
        Ok(c) => c,
        Err(e) => {
            spdlog::error!("{e}");
            return;
        }
    };
    spdlog::info!("Config successfully loaded.");
    spdlog::info!("Input path: {}", config.input_path.to_string_lossy());
    spdlog::info!("Elink mask: {:#012X}", config.elink_mask);
    spdlog::info!(
        "Max events: {} Max GBT words: {}",
        config.max_events,
        config.max_gbt_words
    );
    if let Ok(meta) = std::fs::metadata(&config.input_path) {
        spdlog::info!("Input size: {}", human_bytes(meta.len() as f64));
    }

    // Setup the progress bar
    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::with_template("{bar:40.cyan} {pos:>3}% {msg}")
            .expect("Could not create progress style!"),
    );

    let (tx, rx) = mpsc::channel::<WorkerStatus>();
    let dump = config.dump_packets;

    // Spawn the task!
    let handle = std::thread::spawn(move || {
        process_run(&config, &tx, |packet| {
            if dump {
                println!("{packet}");
            }
        })
    });

    // The channel closes when the worker drops its sender
    for status in rx {
        pb.set_position((status.progress * 100.0) as u64);
        pb.set_message(format!(
            "{} events, {} packets",
            status.nevents, status.npackets
        ));
    }
    pb.finish();

    match handle.join() {
        Ok(Ok(summary)) => spdlog::info!("Successfully decoded: {summary}"),
        Ok(Err(e)) => spdlog::error!("Decoding failed with error: {e}"),
        Err(_) => spdlog::error!("Failed to join the decoding task!"),
    }

    spdlog::info!("Done.");
}
