//! Command-line interface for the OSCAR client.

use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use crate::client::{ContactQuery, OscarClient, RawReport, ReportFormat, StationQuery};
use crate::config::{sanitize_file_name, validate_date, ClientConfig, Environment};
use crate::error::{OscarError, Result};
use crate::facility::FacilityType;

/// Client for the WMO OSCAR/Surface station metadata service.
#[derive(Parser)]
#[command(name = "oscar")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// OSCAR environment to run against
    #[arg(short, long, value_enum, default_value_t = Environment::Depl, global = true)]
    pub env: Environment,

    /// Verbosity (RUST_LOG takes precedence)
    #[arg(short, long, value_enum, global = true)]
    pub verbosity: Option<Verbosity>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Log level names accepted by `--verbosity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "UPPER")]
pub enum Verbosity {
    Error,
    Warning,
    Info,
    Debug,
}

impl Verbosity {
    /// Equivalent `tracing` filter directive.
    #[must_use]
    pub fn as_filter(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Get contact information.
    Contact {
        /// Country
        #[arg(short, long)]
        country: Option<String>,

        /// Surname
        #[arg(short, long)]
        surname: Option<String>,

        /// Organization
        #[arg(short, long)]
        organization: Option<String>,
    },

    /// Harvest all records via OAI-PMH.
    Harvest {
        /// Output directory to save records
        #[arg(short, long)]
        directory: PathBuf,

        /// Harvest records modified since a given date (YYYY-MM-DD)
        #[arg(short, long = "from")]
        from: Option<String>,

        /// Append progress messages to this file
        #[arg(short, long)]
        log: Option<PathBuf>,
    },

    /// Get a station report.
    Station {
        /// WIGOS identifier
        #[arg(short, long)]
        identifier: String,

        /// Report format
        #[arg(short, long, value_enum, default_value_t = ReportFormat::Json)]
        format: ReportFormat,

        /// Print the key fields of the report only
        #[arg(long)]
        summary: bool,
    },

    /// Search stations.
    Stations {
        /// Country
        #[arg(short, long)]
        country: Option<String>,

        /// Program affiliation
        #[arg(short, long)]
        program: Option<String>,

        /// Station type
        #[arg(short = 't', long, value_enum)]
        station_type: Option<FacilityType>,
    },

    /// Upload WMDR XML.
    Upload {
        /// WMDR XML file
        #[arg(short, long)]
        xml: PathBuf,

        /// API token
        #[arg(short, long)]
        api_token: String,

        /// Do not require matching gml:id values for supporting elements
        #[arg(long = "no-gml-ids")]
        no_gml_ids: bool,

        /// Append the result to this file instead of printing it
        #[arg(short, long)]
        log: Option<PathBuf>,
    },
}

/// Run the CLI.
pub fn run(cli: Cli) -> Result<()> {
    let env = cli.env;

    match cli.command {
        Commands::Contact {
            country,
            surname,
            organization,
        } => contact_command(
            env,
            ContactQuery {
                country,
                surname,
                organization,
            },
        ),
        Commands::Harvest {
            directory,
            from,
            log,
        } => harvest_command(env, &directory, from.as_deref(), log.as_deref()),
        Commands::Station {
            identifier,
            format,
            summary,
        } => station_command(env, &identifier, format, summary),
        Commands::Stations {
            country,
            program,
            station_type,
        } => stations_command(
            env,
            StationQuery {
                wigos_id: None,
                program,
                country,
                facility_type: station_type,
            },
        ),
        Commands::Upload {
            xml,
            api_token,
            no_gml_ids,
            log,
        } => upload_command(env, &xml, &api_token, !no_gml_ids, log.as_deref()),
    }
}

fn client_for(env: Environment) -> Result<OscarClient> {
    OscarClient::new(ClientConfig::builder(env).build())
}

fn to_pretty_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Print to stdout, or append a line to `log` when given.
fn emit(log: Option<&Path>, message: &str) -> Result<()> {
    match log {
        Some(path) => {
            let mut file = OpenOptions::new().create(true).append(true).open(path)?;
            writeln!(file, "{message}")?;
        }
        None => println!("{message}"),
    }
    Ok(())
}

fn contact_command(env: Environment, query: ContactQuery) -> Result<()> {
    if query.is_empty() {
        return Err(OscarError::MissingArgument(
            "one of --country/-c, --surname/-s or --organization/-o required".to_string(),
        ));
    }

    let client = client_for(env)?;
    let contacts = client.get_contacts(&query)?;
    println!("{}", to_pretty_json(&contacts)?);
    Ok(())
}

fn station_command(env: Environment, identifier: &str, format: ReportFormat, summary: bool) -> Result<()> {
    let client = client_for(env)?;
    let report = client.get_station_report(identifier, format)?;

    if summary {
        println!("{}", to_pretty_json(&report.summarize()?)?);
        return Ok(());
    }

    match report {
        RawReport::Json(value) => println!("{}", to_pretty_json(&value)?),
        RawReport::Xml(text) => println!("{text}"),
    }
    Ok(())
}

fn stations_command(env: Environment, query: StationQuery) -> Result<()> {
    let client = client_for(env)?;
    let stations = client.get_stations(&query)?;

    println!(
        "{} {}",
        style("Number of stations:").bold(),
        station_count(&stations)
    );
    println!("Stations:");
    println!("{}", to_pretty_json(&stations)?);
    Ok(())
}

/// Output file for a harvested record, unique within one harvest run.
///
/// Identifiers that sanitize to the same name get a `_2`, `_3`, ... suffix.
fn record_path(directory: &Path, identifier: &str, written: &mut HashSet<String>) -> PathBuf {
    let mut stem = sanitize_file_name(identifier);
    if stem.is_empty() {
        tracing::warn!("Harvested record without identifier");
        stem = "record".to_string();
    }

    let mut name = stem.clone();
    let mut n = 1;
    while !written.insert(name.clone()) {
        n += 1;
        name = format!("{stem}_{n}");
    }
    if n > 1 {
        tracing::warn!(identifier = %identifier, file = %name, "File name already used in this harvest");
    }
    directory.join(format!("{name}.xml"))
}

/// Number of stations in a search response.
fn station_count(stations: &serde_json::Value) -> u64 {
    stations
        .get("totalCount")
        .and_then(serde_json::Value::as_u64)
        .or_else(|| {
            stations
                .get("stationSearchResults")
                .or(Some(stations))
                .and_then(serde_json::Value::as_array)
                .map(|a| a.len() as u64)
        })
        .unwrap_or(0)
}

fn upload_command(
    env: Environment,
    xml: &Path,
    api_token: &str,
    only_use_gml_ids: bool,
    log: Option<&Path>,
) -> Result<()> {
    let config = ClientConfig::builder(env).api_token(api_token).build();
    let client = OscarClient::new(config)?;

    println!(
        "{} {} to OSCAR {} environment ({})",
        style("Sending").bold(),
        style(xml.display()).cyan(),
        style(env).green(),
        client.config().api_url
    );

    let data = fs::read_to_string(xml)?;
    let outcome = client.upload(&data, only_use_gml_ids)?;

    emit(log, &to_pretty_json(&outcome)?)
}

fn harvest_command(env: Environment, directory: &Path, from: Option<&str>, log: Option<&Path>) -> Result<()> {
    let date_from = from.map(validate_date).transpose()?;

    if directory.exists() && !directory.is_dir() {
        return Err(OscarError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("Output path is not a directory: {}", directory.display()),
        )));
    }
    fs::create_dir_all(directory)?;

    let client = client_for(env)?;

    println!("{}", style("Harvesting records").bold());

    let pb = ProgressBar::new_spinner();
    #[allow(clippy::expect_used)] // Static template string that is guaranteed to be valid
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("valid template"),
    );
    pb.enable_steady_tick(std::time::Duration::from_millis(100));

    let mut saved = 0usize;
    let mut written = HashSet::new();
    for batch in client.harvest_records(date_from) {
        let batch = match batch {
            Ok(batch) => batch,
            Err(e) => {
                pb.finish_and_clear();
                return Err(e);
            }
        };

        for record in batch {
            let filename = record_path(directory, &record.identifier, &mut written);
            pb.set_message(format!("saving to {}", filename.display()));
            if let Some(log) = log {
                emit(Some(log), &format!("saving to {}", filename.display()))?;
            }
            fs::write(&filename, record.xml.as_bytes())?;
            saved += 1;
        }
    }

    pb.finish_and_clear();
    println!(
        "{} {} records to {}",
        style("Saved").green().bold(),
        saved,
        directory.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cli_parse_station() {
        let cli = Cli::parse_from(["oscar", "station", "-i", "0-20000-0-71758"]);

        assert_eq!(cli.env, Environment::Depl);
        let Commands::Station {
            identifier,
            format,
            summary,
        } = cli.command
        else {
            panic!("expected station command");
        };
        assert_eq!(identifier, "0-20000-0-71758");
        assert_eq!(format, ReportFormat::Json);
        assert!(!summary);
    }

    #[test]
    fn test_cli_parse_global_options_after_subcommand() {
        let cli = Cli::parse_from([
            "oscar", "station", "-i", "X", "--format", "XML", "--summary", "--env", "prod", "-v", "DEBUG",
        ]);
        assert_eq!(cli.env, Environment::Prod);
        assert_eq!(cli.verbosity, Some(Verbosity::Debug));
        assert!(matches!(
            cli.command,
            Commands::Station { format: ReportFormat::Xml, summary: true, .. }
        ));
    }

    #[test]
    fn test_cli_parse_stations_station_type() {
        let cli = Cli::parse_from(["oscar", "stations", "--station-type", "landFixed", "-c", "AUS"]);
        let Commands::Stations {
            country,
            station_type,
            ..
        } = cli.command
        else {
            panic!("expected stations command");
        };
        assert_eq!(country.as_deref(), Some("AUS"));
        assert_eq!(station_type, Some(FacilityType::LandFixed));
    }

    #[test]
    fn test_cli_rejects_unknown_station_type() {
        let result = Cli::try_parse_from(["oscar", "stations", "--station-type", "moonFixed"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parse_upload() {
        let cli = Cli::parse_from(["oscar", "upload", "-x", "r.xml", "-a", "tok", "--no-gml-ids"]);
        let Commands::Upload {
            xml,
            api_token,
            no_gml_ids,
            log,
        } = cli.command
        else {
            panic!("expected upload command");
        };
        assert_eq!(xml, PathBuf::from("r.xml"));
        assert_eq!(api_token, "tok");
        assert!(no_gml_ids);
        assert!(log.is_none());
    }

    #[test]
    fn test_contact_requires_a_filter() {
        let err = contact_command(Environment::Depl, ContactQuery::default()).unwrap_err();
        assert!(matches!(err, OscarError::MissingArgument(_)));
    }

    #[test]
    fn test_harvest_rejects_bad_date() {
        let dir = tempfile::tempdir().unwrap();
        let err = harvest_command(Environment::Depl, dir.path(), Some("yesterday"), None).unwrap_err();
        assert!(matches!(err, OscarError::InvalidDate(_)));
    }

    #[test]
    fn test_station_count() {
        assert_eq!(station_count(&json!({"totalCount": 3, "stationSearchResults": []})), 3);
        assert_eq!(station_count(&json!({"stationSearchResults": [{}, {}]})), 2);
        assert_eq!(station_count(&json!([{}])), 1);
        assert_eq!(station_count(&json!({})), 0);
    }

    #[test]
    fn test_record_path_avoids_collisions() {
        let dir = Path::new("out");
        let mut written = HashSet::new();
        assert_eq!(record_path(dir, "a:b", &mut written), dir.join("a_b.xml"));
        assert_eq!(record_path(dir, "a/b", &mut written), dir.join("a_b_2.xml"));
        assert_eq!(record_path(dir, "a_b", &mut written), dir.join("a_b_3.xml"));
        assert_eq!(record_path(dir, "", &mut written), dir.join("record.xml"));
        assert_eq!(record_path(dir, "", &mut written), dir.join("record_2.xml"));
    }

    #[test]
    fn test_verbosity_filters() {
        assert_eq!(Verbosity::Warning.as_filter(), "warn");
        assert_eq!(Verbosity::Debug.as_filter(), "debug");
    }

    #[test]
    fn test_emit_appends_to_log() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.log");
        emit(Some(&path), "one").unwrap();
        emit(Some(&path), "two").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "one\ntwo\n");
    }
}
