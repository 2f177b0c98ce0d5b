use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tracing::info;
use va_config::{ConfigError, PvDefaults, create_pvdb, load_relevant_controls};
use va_core::timing::{enable_timing, sim_timing};
use va_core::units::as_ev;
use va_engine::{EngineResult, PvValues, SharedAccelerator, VirtualAccelerator};
use va_pv::PvValue;

#[derive(Parser)]
#[command(name = "va-cli")]
#[command(about = "Virtual accelerator CLI - drive a simulated beamline through PV names", long_about = None)]
struct Cli {
    /// Print simulation timing after the command
    #[arg(long, global = true)]
    timing: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate an accelerator config and bring the engine up once
    Validate {
        /// Path to the accelerator config (YAML or JSON)
        config_path: PathBuf,
    },
    /// Print the PV database for a device file as JSON
    Pvdb {
        /// Path to the device YAML file
        devices_path: PathBuf,
        /// Default screen rows
        #[arg(long, default_value_t = PvDefaults::default().n_row)]
        n_row: usize,
        /// Default screen columns
        #[arg(long, default_value_t = PvDefaults::default().n_col)]
        n_col: usize,
        /// Default screen resolution (um/px)
        #[arg(long, default_value_t = PvDefaults::default().resolution)]
        resolution: f64,
    },
    /// Read PVs from the freshly simulated beamline
    Get {
        config_path: PathBuf,
        /// PV names to read
        #[arg(required = true)]
        pvs: Vec<String>,
    },
    /// Apply one write batch, then read PVs
    Set {
        config_path: PathBuf,
        /// Writes as PV=VALUE (bool, integer, float or JSON array)
        #[arg(required = true, value_parser = parse_assignment)]
        writes: Vec<(String, PvValue)>,
        /// PVs to read after the batch
        #[arg(long = "read")]
        reads: Vec<String>,
    },
    /// Print the reference energy at the entrance of every element
    Profile { config_path: PathBuf },
    /// Re-simulate and read PVs at the configured poll period
    Poll {
        config_path: PathBuf,
        #[arg(required = true)]
        pvs: Vec<String>,
        /// Number of poll cycles
        #[arg(long, default_value_t = 10)]
        cycles: usize,
    },
}

fn main() -> EngineResult<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    if cli.timing {
        enable_timing();
    }

    let result = match cli.command {
        Commands::Validate { config_path } => cmd_validate(&config_path),
        Commands::Pvdb {
            devices_path,
            n_row,
            n_col,
            resolution,
        } => cmd_pvdb(
            &devices_path,
            &PvDefaults {
                n_row,
                n_col,
                resolution,
            },
        ),
        Commands::Get { config_path, pvs } => cmd_get(&config_path, &pvs),
        Commands::Set {
            config_path,
            writes,
            reads,
        } => cmd_set(&config_path, writes, &reads),
        Commands::Profile { config_path } => cmd_profile(&config_path),
        Commands::Poll {
            config_path,
            pvs,
            cycles,
        } => cmd_poll(&config_path, &pvs, cycles),
    };

    if let Some(summary) = sim_timing::summary() {
        eprintln!("{summary}");
    }
    result
}

/// Parse `PV=VALUE`. Values are tried as bool, integer, float and JSON array.
fn parse_assignment(s: &str) -> Result<(String, PvValue), String> {
    let (pv, raw) = s
        .split_once('=')
        .ok_or_else(|| format!("expected PV=VALUE, got '{s}'"))?;
    let pv = pv.trim();
    if pv.is_empty() {
        return Err(format!("missing PV name in '{s}'"));
    }
    Ok((pv.to_string(), parse_value(raw.trim())?))
}

fn parse_value(raw: &str) -> Result<PvValue, String> {
    match raw {
        "true" => return Ok(PvValue::Bool(true)),
        "false" => return Ok(PvValue::Bool(false)),
        _ => {}
    }
    if let Ok(i) = raw.parse::<i64>() {
        return Ok(PvValue::Int(i));
    }
    if let Ok(f) = raw.parse::<f64>() {
        return Ok(PvValue::Float(f));
    }
    if raw.starts_with('[') {
        return serde_json::from_str::<Vec<f64>>(raw)
            .map(PvValue::Array)
            .map_err(|e| format!("invalid array '{raw}': {e}"));
    }
    Err(format!("cannot parse value '{raw}'"))
}

fn load_config(config_path: &Path) -> EngineResult<va_config::AcceleratorConfig> {
    let config = match config_path.extension().and_then(|e| e.to_str()) {
        Some("json") => va_config::load_json(config_path)?,
        _ => va_config::load_yaml(config_path)?,
    };
    Ok(config)
}

fn bring_up(config_path: &Path) -> EngineResult<VirtualAccelerator> {
    let config = load_config(config_path)?;
    VirtualAccelerator::from_config(&config)
}

fn print_values(values: &PvValues) {
    let width = values.keys().map(String::len).max().unwrap_or(0);
    for (name, value) in values {
        match value {
            PvValue::Array(data) => {
                let total: f64 = data.iter().sum();
                println!("  {name:<width$}  {value} (sum {total:.6e})");
            }
            _ => println!("  {name:<width$}  {value}"),
        }
    }
}

fn cmd_validate(config_path: &Path) -> EngineResult<()> {
    println!("Validating config: {}", config_path.display());
    let va = bring_up(config_path)?;
    println!(
        "✓ Config is valid ({} elements, {} mapped devices)",
        va.segment().len(),
        va.mapping().len()
    );
    Ok(())
}

fn cmd_pvdb(devices_path: &Path, defaults: &PvDefaults) -> EngineResult<()> {
    let devices = load_relevant_controls(devices_path)?;
    let pvdb = create_pvdb(&devices, defaults);
    info!(devices = devices.len(), pvs = pvdb.len(), "built PV database");
    let json = serde_json::to_string_pretty(&pvdb).map_err(ConfigError::from)?;
    println!("{json}");
    Ok(())
}

fn cmd_get(config_path: &Path, pvs: &[String]) -> EngineResult<()> {
    let va = bring_up(config_path)?;
    print_values(&va.get_pvs(pvs)?);
    Ok(())
}

fn cmd_set(config_path: &Path, writes: Vec<(String, PvValue)>, reads: &[String]) -> EngineResult<()> {
    let mut va = bring_up(config_path)?;
    let count = writes.len();
    va.set_pvs(writes)?;
    println!("✓ Applied {count} write(s)");
    if !reads.is_empty() {
        print_values(&va.get_pvs(reads)?);
    }
    Ok(())
}

fn cmd_profile(config_path: &Path) -> EngineResult<()> {
    let va = bring_up(config_path)?;
    let profile = va.energy_profile()?;
    let width = profile.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
    for (name, energy) in profile.iter() {
        println!("  {name:<width$}  {:.6} GeV", as_ev(energy) / 1e9);
    }
    Ok(())
}

fn cmd_poll(config_path: &Path, pvs: &[String], cycles: usize) -> EngineResult<()> {
    let config = load_config(config_path)?;
    let period = Duration::from_millis(config.poll_period_ms);
    let shared = SharedAccelerator::new(VirtualAccelerator::from_config(&config)?);

    for cycle in 0..cycles {
        let values = shared.refresh(pvs)?;
        println!("Cycle {}:", cycle + 1);
        print_values(&values);
        if cycle + 1 < cycles {
            thread::sleep(period);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignments_parse_by_shape() {
        assert_eq!(
            parse_assignment("OTRS:IN20:571:PNEUMATIC=false").unwrap(),
            ("OTRS:IN20:571:PNEUMATIC".to_string(), PvValue::Bool(false))
        );
        assert_eq!(
            parse_assignment("QUAD:IN20:425:BCTRL=-1.5").unwrap().1,
            PvValue::Float(-1.5)
        );
        assert_eq!(parse_assignment("X:Y:Z:N=3").unwrap().1, PvValue::Int(3));
        assert_eq!(
            parse_assignment("X:Y:Z:A=[1, 2.5]").unwrap().1,
            PvValue::Array(vec![1.0, 2.5])
        );
    }

    #[test]
    fn malformed_assignments_rejected() {
        assert!(parse_assignment("QUAD:IN20:425:BCTRL").is_err());
        assert!(parse_assignment("=1.0").is_err());
        assert!(parse_assignment("X:Y:Z:A=abc").is_err());
    }
}
