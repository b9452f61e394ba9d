// Plan Figures - Resolve the figure plan and render it against synthetic runs
//
// Dry run of the plotting pipeline: every outcome the plan needs is filled
// with made-up trajectories, then each figure is prepared and logged.
//
// Usage:
//   cargo run --bin plan_figures
//   cargo run --bin plan_figures --runs 20 --seed 0x1234...
//   cargo run --bin plan_figures --compartments

use cv_rust::cv_definitions::SIM_DURATION;
use cv_rust::cv_params::parameter_figures;
use cv_rust::cv_plots::{AxisMultipliers, FigurePlanner, FigureSelection, FigureSpec};
use cv_rust::cv_render::{render_plan, FigureRenderer, LogRenderer};
use cv_rust::cv_trajectories::Trajectory;
use cv_rust::{BinomialSurveySize, CovidSettings, ReferenceData, SettingsOptions, SimOutcomeTrajectories};
use log::{error, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use simple_logger::SimpleLogger;
use std::env;
use std::path::Path;

const DEFAULT_RUNS: usize = 10;
const FIGURES_DIR: &str = "outputs/figures";

#[derive(Debug)]
struct Args {
    seed: Option<[u8; 32]>,
    /// Runs to draw per figure; all when absent
    runs: Option<usize>,
    compartments: bool,
}

fn parse_args(args: &[String]) -> Result<Args, String> {
    let mut parsed = Args {
        seed: None,
        runs: None,
        compartments: false,
    };
    let mut iter = args.iter().skip(1);

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--seed" => {
                let v = iter.next().ok_or("--seed needs a hex value")?;
                parsed.seed = Some(parse_seed_hex(v)?);
            }
            "--runs" => {
                let v = iter.next().ok_or("--runs needs a number")?;
                let n = v
                    .parse::<usize>()
                    .map_err(|e| format!("invalid run count {}: {}", v, e))?;
                parsed.runs = Some(n);
            }
            "--compartments" => parsed.compartments = true,
            other => return Err(format!("unknown argument {}", other)),
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
            "Usage: {} [--seed SEED_HEX] [--runs N] [--compartments]",
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
    println!("║  FIGURE PLAN - Dry Run                                 ║");
    println!("╚════════════════════════════════════════════════════════╝\n");

    let seed = args.seed.unwrap_or_else(|| rand::thread_rng().gen());
    println!("Seed: {}", seed_hex(&seed));
    let mut rng = StdRng::from_seed(seed);

    let data = ReferenceData::builtin().map_err(|e| e.to_string())?;
    let options = SettingsOptions {
        if_collect_trajs_of_compartments: args.compartments,
        ..Default::default()
    };
    let settings =
        CovidSettings::new(&options, &data, &BinomialSurveySize).map_err(|e| e.to_string())?;

    let selection = FigureSelection::for_settings(&settings);
    let planner = FigurePlanner::new(
        &data.tables,
        AxisMultipliers::from_settings(&settings),
        Path::new(FIGURES_DIR),
    );
    let plan = planner.plan(&selection).map_err(|e| e.to_string())?;
    println!("Figure groups: {:?}", selection.groups());

    let store = synthetic_store(&plan, DEFAULT_RUNS.max(args.runs.unwrap_or(0)), &mut rng)
        .map_err(|e| e.to_string())?;
    info!(
        "Synthetic store: {} outcomes, {} runs",
        store.outcome_names().len(),
        store.run_ids().len()
    );

    let mut renderer = LogRenderer::default();
    let n = render_plan(&plan, &store, args.runs, &mut rng, &mut renderer)
        .map_err(|e| e.to_string())?;

    let params = parameter_figures(Path::new(FIGURES_DIR));
    for figure in &params {
        renderer
            .render_parameters(figure)
            .map_err(|e| e.to_string())?;
    }

    print_summary(&plan, n + params.len(), &renderer);
    println!("\n✓ Figure plan complete!\n");
    Ok(())
}

/// Weekly trajectories for every outcome the plan draws
fn synthetic_store(
    plan: &[FigureSpec],
    runs: usize,
    rng: &mut StdRng,
) -> Result<SimOutcomeTrajectories, cv_rust::PlotError> {
    let weeks = (SIM_DURATION * 52.0) as usize;
    let times: Vec<f64> = (0..=weeks).map(|w| w as f64 / 52.0).collect();

    let mut store = SimOutcomeTrajectories::new();
    for panel in plan.iter().flat_map(|f| f.panels.iter()) {
        if store.contains(&panel.outcome_name) {
            continue;
        }
        for run in 0..runs {
            // logistic rise with a random midpoint and ceiling
            let mid: f64 = rng.gen_range(0.5..1.5);
            let top: f64 = rng.gen_range(0.01..0.5);
            let values = times
                .iter()
                .map(|t| top / (1.0 + (-8.0 * (t - mid)).exp()))
                .collect();
            store.insert(
                &panel.outcome_name,
                run,
                Trajectory {
                    times: times.clone(),
                    values,
                },
            )?;
        }
    }
    Ok(store)
}

fn print_summary(plan: &[FigureSpec], rendered: usize, renderer: &LogRenderer) {
    println!("\n═══════════════════════════════════════════════════════");
    println!("  Figures rendered: {}", rendered);
    println!("  Trajectory panels: {}", plan.iter().map(|f| f.panels.len()).sum::<usize>());
    println!();
    for path in &renderer.rendered {
        println!("  {}", path.display());
    }
    println!("═══════════════════════════════════════════════════════");
}

fn parse_seed_hex(hex: &str) -> Result<[u8; 32], String> {
    let hex = hex.strip_prefix("0x").unwrap_or(hex);
    let mut seed = [0u8; 32];

    for (i, chunk) in hex.as_bytes().chunks(2).enumerate() {
        if i >= 32 {
            break;
        }
        let byte_str = std::str::from_utf8(chunk).map_err(|e| e.to_string())?;
        seed[i] = u8::from_str_radix(byte_str, 16)
            .map_err(|e| format!("invalid hex seed: {}", e))?;
    }

    Ok(seed)
}

fn seed_hex(seed: &[u8; 32]) -> String {
    seed.iter().map(|b| format!("{:02x}", b)).collect()
}
