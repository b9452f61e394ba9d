// Build Settings - Assemble the COVID model settings, optionally from a scenario
//
// Usage:
//   cargo run --bin build_settings
//   cargo run --bin build_settings scenarios/calibration.yaml
//   cargo run --bin build_settings scenarios/calibration.yaml --out settings.yaml
//   cargo run --bin build_settings --data tables.yaml

use cv_rust::cv_interface::AlignedTargetTrack;
use cv_rust::{
    BinomialSurveySize, CalibrationError, CovidSettings, ReferenceData, ScenarioFile,
    SettingsOptions,
};
use log::{error, info};
use simple_logger::SimpleLogger;
use std::env;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Default)]
struct Args {
    scenario: Option<PathBuf>,
    out: Option<PathBuf>,
    data: Option<PathBuf>,
}

fn parse_args(args: &[String]) -> Result<Args, String> {
    let mut parsed = Args::default();
    let mut iter = args.iter().skip(1);

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--out" => {
                let v = iter.next().ok_or("--out needs a path")?;
                parsed.out = Some(PathBuf::from(v));
            }
            "--data" => {
                let v = iter.next().ok_or("--data needs a path")?;
                parsed.data = Some(PathBuf::from(v));
            }
            flag if flag.starts_with("--") => return Err(format!("unknown flag {}", flag)),
            path => {
                if parsed.scenario.is_some() {
                    return Err(format!("unexpected argument {}", path));
                }
                parsed.scenario = Some(PathBuf::from(path));
            }
        }
    }

    Ok(parsed)
}

fn main() {
    if let Err(e) = SimpleLogger::new().init() {
        eprintln!("Logger setup failed: {}", e);
    }

    let args: Vec<String> = env::args().collect();
    let parsed = parse_args(&args).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        eprintln!(
            "Usage: {} [scenario.yaml] [--out settings.yaml] [--data tables.yaml]",
            args[0]
        );
        std::process::exit(1);
    });

    if let Err(e) = run(&parsed) {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), String> {
    println!("\n╔════════════════════════════════════════════════════════╗");
    println!("║  COVID MODEL SETTINGS                                  ║");
    println!("╚════════════════════════════════════════════════════════╝\n");

    let options = match &args.scenario {
        Some(path) => {
            println!("Loading scenario from: {}", path.display());
            let yaml = fs::read_to_string(path)
                .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
            let scenario = ScenarioFile::from_yaml_str(&yaml)
                .map_err(|e| format!("{}: {}", path.display(), e))?;

            if let Some(ref name) = scenario.meta.name {
                println!("Scenario: {}", name);
            }
            if let Some(ref desc) = scenario.meta.description {
                println!("{}\n", desc);
            }
            scenario.options()
        }
        None => SettingsOptions::default(),
    };

    let data = match &args.data {
        Some(path) => {
            let yaml = fs::read_to_string(path)
                .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
            ReferenceData::from_yaml_str(&yaml).map_err(|e| format!("{}: {}", path.display(), e))?
        }
        None => ReferenceData::builtin().map_err(|e: CalibrationError| e.to_string())?,
    };

    println!("Configuration:");
    println!("  Simulation duration: {} years", options.simulation_duration);
    println!("  Calibration period: {} years", options.calibration_period);
    println!("  Calibrating: {}", options.if_calibrating);
    println!("  Novel variant will emerge: {}", options.novel_variant_will_emerge);
    println!("  Mitigating strategies: {}", options.mitigating_strategies_on);
    println!(
        "  Immunity variance bounds: {:?}",
        options.targets.immunity_variance_bounds
    );
    println!();

    let settings =
        CovidSettings::new(&options, &data, &BinomialSurveySize).map_err(|e| e.to_string())?;
    print_summary(&settings);

    let yaml = settings.to_yaml().map_err(|e| e.to_string())?;
    match &args.out {
        Some(path) => {
            fs::write(path, yaml).map_err(|e| format!("failed to write {}: {}", path.display(), e))?;
            info!("Settings written to {}", path.display());
        }
        None => println!("{}", yaml),
    }

    println!("\n✓ Settings complete!\n");
    Ok(())
}

fn print_summary(settings: &CovidSettings) {
    println!("═══════════════════════════════════════════════════════");
    println!("  Reference data: {}", settings.reference_data_fingerprint);
    println!("  Likelihood: {}", settings.calc_likelihood);

    let targets = match &settings.calibration_targets {
        Some(targets) => targets,
        None => {
            println!("  No calibration targets");
            println!("═══════════════════════════════════════════════════════\n");
            return;
        }
    };

    println!(
        "  {} targets over {} weeks",
        targets.len(),
        targets.horizon_weeks
    );
    println!();
    for (label, track) in &targets.tracks {
        println!("  {:<36} {}", label, describe(track));
    }
    println!("═══════════════════════════════════════════════════════\n");
}

fn describe(track: &AlignedTargetTrack) -> String {
    let weeks = track.present_weeks();
    if weeks.is_empty() {
        return "-".to_string();
    }
    let with_n = track.sample_size.iter().filter(|n| n.is_some()).count();
    format!("weeks {:?}, {} with sample size", weeks, with_n)
}
