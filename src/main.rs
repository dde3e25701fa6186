extern crate chrono;
extern crate clap;
extern crate env_logger;
extern crate failure;
extern crate icedrifter;
#[macro_use]
extern crate log;
extern crate rockblock;
extern crate serde_json;

use chrono::{TimeZone, Utc};
use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use failure::Error;
use icedrifter::{report, Batch, Config, Record};
use rockblock::Chunk;
use std::path::Path;

fn main() {
    env_logger::init();
    let matches = App::new("idecode")
        .about("reconstructs and prints icedrifter records")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .takes_value(true)
                .global(true)
                .help("the path to the configuration toml file"),
        ).subcommand(
            SubCommand::with_name("chunks")
                .about("reassembles one to three chunk files (.bin or .sbd) from one report")
                .arg(
                    Arg::with_name("FILES")
                        .help("the chunk files, named <device id>-<anything>")
                        .required(true)
                        .multiple(true)
                        .index(1),
                ).arg(
                    Arg::with_name("output")
                        .short("o")
                        .long("output")
                        .takes_value(true)
                        .default_value(".")
                        .help("the directory that will hold the .txt and .dat files"),
                ),
        ).subcommand(
            SubCommand::with_name("file")
                .about("prints a .dat record file")
                .arg(
                    Arg::with_name("DAT")
                        .help("the record file")
                        .required(true)
                        .index(1),
                ).arg(
                    Arg::with_name("json")
                        .long("json")
                        .help("print the record as json"),
                ),
        ).subcommand(
            SubCommand::with_name("hex")
                .about("reassembles chunks pasted from RockBLOCK emails as hex text")
                .arg(
                    Arg::with_name("HEX")
                        .help("one hex string per chunk")
                        .required(true)
                        .multiple(true)
                        .index(1),
                ),
        ).subcommand(
            SubCommand::with_name("encode")
                .about("splits a .dat record file into chunk files")
                .arg(
                    Arg::with_name("DAT")
                        .help("the record file")
                        .required(true)
                        .index(1),
                ).arg(
                    Arg::with_name("OUTPUT")
                        .help("the directory that will hold the chunk files")
                        .required(true)
                        .index(2),
                ).arg(
                    Arg::with_name("device-id")
                        .short("d")
                        .long("device-id")
                        .takes_value(true)
                        .required(true)
                        .help("the RockBLOCK IMEI to put in the chunk file names"),
                ).arg(
                    Arg::with_name("send-time")
                        .long("send-time")
                        .takes_value(true)
                        .help("the send time in seconds since the epoch, defaults to the GPS time"),
                ),
        ).get_matches();

    if let Err(err) = run(&matches) {
        eprintln!("idecode: {}", err);
        std::process::exit(1);
    }
}

fn run(matches: &ArgMatches) -> Result<(), Error> {
    match matches.subcommand() {
        ("chunks", Some(matches)) => {
            let config = config(matches)?;
            let files = matches
                .values_of("FILES")
                .map(|values| values.collect::<Vec<_>>())
                .unwrap_or_else(Vec::new);
            chunks(&files, matches.value_of("output").unwrap_or("."), &config)
        }
        ("file", Some(matches)) => {
            let config = config(matches)?;
            let record = Record::from_path(matches.value_of("DAT").unwrap_or_default(), &config)?;
            if matches.is_present("json") {
                println!("{}", serde_json::to_string_pretty(&record)?);
                Ok(())
            } else {
                report::write_report_to(&record, config.chain_enabled(), None::<&Path>)
            }
        }
        ("hex", Some(matches)) => {
            let config = config(matches)?;
            let chunks = matches
                .values_of("HEX")
                .map(|values| {
                    values
                        .map(|text| Chunk::from_hex(text, config.max_chunk_length))
                        .collect::<Result<Vec<_>, _>>()
                }).unwrap_or_else(|| Ok(Vec::new()))?;
            let record = Record::from_chunks(chunks, &config)?;
            report::write_report_to(&record, config.chain_enabled(), None::<&Path>)
        }
        ("encode", Some(matches)) => {
            let config = config(matches)?;
            let send_time = match matches.value_of("send-time") {
                Some(s) => Some(s.parse()?),
                None => None,
            };
            encode(
                matches.value_of("DAT").unwrap_or_default(),
                matches.value_of("OUTPUT").unwrap_or_default(),
                matches.value_of("device-id").unwrap_or_default(),
                send_time,
                &config,
            )
        }
        _ => Ok(()),
    }
}

fn config(matches: &ArgMatches) -> Result<Config, Error> {
    if let Some(path) = matches.value_of("config") {
        Config::from_path(path)
    } else {
        Ok(Config::default())
    }
}

fn chunks(files: &[&str], output: &str, config: &Config) -> Result<(), Error> {
    let batch = if !files.is_empty() && files.iter().all(|f| f.ends_with(".sbd")) {
        Batch::from_sbd_paths(files, config)?
    } else {
        Batch::from_paths(files, config)?
    };
    println!("Processing data for Rockblock {}.", batch.device_id());
    print!("{}", batch.report());
    batch.write_to(output)?;
    println!("Decode successful.");
    Ok(())
}

fn encode(
    dat: &str,
    output: &str,
    device_id: &str,
    send_time: Option<u32>,
    config: &Config,
) -> Result<(), Error> {
    let record = Record::from_path(dat, config)?;
    let send_time = send_time.unwrap_or(record.gps_time);
    let chunks = record.encode(send_time, config)?;
    let stem = format!(
        "{}-{}",
        device_id,
        Utc.timestamp(i64::from(send_time), 0)
            .format("%Y%m%d%H%M%S")
    );
    for chunk in chunks {
        let path = Path::new(output).join(format!("{}-{}.bin", stem, chunk.sequence_number()));
        std::fs::write(&path, chunk.to_bytes())?;
        info!("wrote {} ({} bytes)", path.display(), chunk.wire_len());
    }
    Ok(())
}
