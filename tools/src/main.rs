//! sim-runner: headless host for the CTMC teaching simulations.
//!
//! Usage:
//!   sim-runner --model queue  --seed 12345 --horizon 500
//!   sim-runner --model repair --config data/scenarios.json --show-generator
//!   sim-runner --model queue  --replications 16 --json
//!   sim-runner --model traffic --ticks 900
//!   sim-runner --model repair --ipc-mode

use anyhow::Result;
use ctmc_core::{
    analysis::SteadyStateModel,
    config::SimConfig,
    engine::CtmcEngine,
    metrics::{Comparison, MetricTable, MetricValue},
    model::ModelKind,
    rng::SeedBank,
    sweep,
    traffic::TrafficCollector,
    types::SimTime,
};
use serde::Serialize;
use std::env;
use std::io::{self, BufRead, Write};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    GetState,
    Step {
        count: u64,
    },
    Reset {
        #[serde(default)]
        seed: Option<u64>,
    },
    Quit,
}

#[derive(Serialize)]
struct UiState<'a, S, T: Ord> {
    run_id:     &'a str,
    kind:       ModelKind,
    seed:       u64,
    time:       SimTime,
    horizon:    SimTime,
    terminal:   bool,
    state:      &'a S,
    events:     &'a std::collections::BTreeMap<T, u64>,
    simulated:  MetricTable,
    comparison: Comparison,
}

#[derive(Serialize)]
struct RunReport {
    run_id:       String,
    started_at:   String,
    kind:         ModelKind,
    model:        String,
    seed:         u64,
    horizon:      SimTime,
    replications: u64,
    simulated:    MetricTable,
    theoretical:  Option<MetricTable>,
    comparison:   Comparison,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let model = string_arg(&args, "--model").unwrap_or("queue");
    let config_path = string_arg(&args, "--config").unwrap_or("data/scenarios.json");
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let json = args.iter().any(|a| a == "--json");

    let config = match SimConfig::load(config_path) {
        Ok(c) => c,
        Err(e) => {
            log::warn!("{e}; using built-in scenario defaults");
            SimConfig::default()
        }
    };
    let seed = parse_arg(&args, "--seed", config.seed);
    let replications = parse_arg(&args, "--replications", 1u64).max(1);
    let run_id = format!("run-{seed}-{}", uuid::Uuid::new_v4());

    match model {
        "queue" => {
            let horizon = parse_arg(&args, "--horizon", config.queue.horizon);
            let model = config.queue.model()?;
            if ipc_mode {
                run_ipc_loop(model, horizon, seed, &run_id)
            } else {
                run_ctmc(model, horizon, seed, replications, &run_id, json)
            }
        }
        "repair" => {
            let horizon = parse_arg(&args, "--horizon", config.repair.horizon);
            let model = config.repair.model()?;
            if args.iter().any(|a| a == "--show-generator") && !ipc_mode && !json {
                println!("=== GENERATOR MATRIX Q ===");
                for row in model.generator_matrix() {
                    let cells: Vec<String> = row.iter().map(|q| format!("{q:8.3}")).collect();
                    println!("  {}", cells.join(" "));
                }
                println!();
            }
            if ipc_mode {
                run_ipc_loop(model, horizon, seed, &run_id)
            } else {
                run_ctmc(model, horizon, seed, replications, &run_id, json)
            }
        }
        "traffic" => {
            let ticks = parse_arg(&args, "--ticks", config.traffic.ticks);
            run_traffic(&config, ticks, seed, &run_id, json)
        }
        other => anyhow::bail!("unknown model '{other}' (expected queue, repair or traffic)"),
    }
}

fn run_ctmc<M>(
    model: M,
    horizon: SimTime,
    seed: u64,
    replications: u64,
    run_id: &str,
    json: bool,
) -> Result<()>
where
    M: SteadyStateModel + Clone + Send + Sync,
{
    let started_at = chrono::Utc::now().to_rfc3339();
    let label = model.label();
    log::info!("{run_id}: {label} horizon={horizon} seed={seed} replications={replications}");

    let (simulated, comparison) = if replications > 1 {
        let result = sweep::replicate(&model, horizon, SeedBank::new(seed), replications)?;
        let simulated = averaged_metrics(&result, &label);
        let comparison = match model.theoretical_metrics() {
            Ok(theory) => Comparison::Rows {
                rows: ctmc_core::metrics::compare(&simulated, &theory, &model.comparison_keys()),
            },
            Err(e) => Comparison::NotApplicable { reason: e.to_string() },
        };
        (simulated, comparison)
    } else {
        let mut engine = CtmcEngine::new(model.clone(), horizon, seed)?;
        let transitions = engine.run_to_horizon();
        log::info!("{run_id}: {transitions} transitions, t={}", engine.current_time());
        (engine.simulated_metrics(), engine.comparison())
    };

    let report = RunReport {
        run_id: run_id.to_string(),
        started_at,
        kind: model.kind(),
        model: label,
        seed,
        horizon,
        replications,
        simulated,
        theoretical: model.theoretical_metrics().ok(),
        comparison,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report);
    }
    Ok(())
}

/// Mean of every metric over the sweep, in the first replication's order.
fn averaged_metrics(result: &sweep::SweepResult, label: &str) -> MetricTable {
    let mut table = MetricTable::new(format!(
        "Simulated {label} (mean of {} replications)",
        result.replications.len()
    ));
    if let Some(first) = result.replications.first() {
        for metric in first.metrics.iter() {
            table.push_opt(metric.name.clone(), result.mean_metric(&metric.name));
        }
    }
    table
}

fn run_ipc_loop<M>(model: M, horizon: SimTime, seed: u64, run_id: &str) -> Result<()>
where
    M: SteadyStateModel + Clone,
{
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    let mut seed = seed;
    let mut engine = CtmcEngine::new(model.clone(), horizon, seed)?;

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                let err_json = serde_json::json!({ "error": e.to_string() });
                writeln!(stdout, "{}", err_json)?;
                stdout.flush()?;
                continue;
            }
        };

        match cmd {
            IpcCommand::Quit => break,
            IpcCommand::Step { count } => {
                for _ in 0..count {
                    if engine.step().is_terminal() {
                        break;
                    }
                }
            }
            IpcCommand::Reset { seed: new_seed } => {
                // Parameters are fixed per run; a reset is a new engine.
                seed = new_seed.unwrap_or(seed);
                engine = CtmcEngine::new(model.clone(), horizon, seed)?;
            }
            IpcCommand::GetState => {}
        }

        let snapshot = engine.snapshot();
        let state = UiState {
            run_id,
            kind: engine.model().kind(),
            seed,
            time: snapshot.time,
            horizon: snapshot.horizon,
            terminal: engine.is_terminal(),
            state: snapshot.state,
            events: &snapshot.accumulators.event_counts,
            simulated: engine.simulated_metrics(),
            comparison: engine.comparison(),
        };
        writeln!(stdout, "{}", serde_json::to_string(&state)?)?;
        stdout.flush()?;
    }
    Ok(())
}

fn run_traffic(config: &SimConfig, ticks: u64, seed: u64, run_id: &str, json: bool) -> Result<()> {
    let rng = SeedBank::new(seed).stream(0).with_name("traffic");
    let mut collector = TrafficCollector::new(config.traffic.params(), rng)?;
    collector.run(ticks);
    let metrics = collector.metrics();

    if json {
        let report = serde_json::json!({
            "run_id": run_id,
            "started_at": chrono::Utc::now().to_rfc3339(),
            "seed": seed,
            "params": config.traffic,
            "metrics": metrics,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("=== TRAFFIC SUMMARY ===");
        println!("  run_id:  {run_id}");
        println!("  seed:    {seed}");
        print_table(&metrics);
    }
    Ok(())
}

fn print_summary(report: &RunReport) {
    println!("=== RUN SUMMARY ===");
    println!("  run_id:       {}", report.run_id);
    println!("  model:        {} ({:?})", report.model, report.kind);
    println!("  seed:         {}", report.seed);
    println!("  horizon:      {}", report.horizon);
    println!("  replications: {}", report.replications);
    println!();
    println!("=== {} ===", report.simulated.title.to_uppercase());
    print_table(&report.simulated);

    println!();
    match &report.theoretical {
        Some(theory) => {
            println!("=== {} ===", theory.title.to_uppercase());
            print_table(theory);
        }
        None => println!("=== THEORETICAL ==="),
    }

    println!();
    println!("=== SIMULATED VS THEORETICAL ===");
    match &report.comparison {
        Comparison::Rows { rows } => {
            for row in rows {
                println!(
                    "  {:<26} sim {:>10} | theory {:>10} | diff {:>10}",
                    row.label,
                    fmt_value(row.simulated),
                    fmt_value(row.theoretical),
                    fmt_value(row.difference),
                );
            }
        }
        Comparison::NotApplicable { reason } => println!("  (not applicable: {reason})"),
    }
}

fn print_table(table: &MetricTable) {
    for metric in table.iter() {
        println!("  {:<26} {:>12}", metric.name, fmt_value(metric.value));
    }
}

fn fmt_value(value: MetricValue) -> String {
    match value {
        MetricValue::Value(v) => format!("{v:.4}"),
        MetricValue::InsufficientData => "n/a".to_string(),
    }
}

fn string_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
