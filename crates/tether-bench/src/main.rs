mod backend;
mod logging;
mod scenario;

use backend::CountingBackend;
use clap::{Parser, Subcommand, ValueEnum};
use scenario::{CaseShape, build_model, mutate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{File, create_dir_all};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tether_model::Model;
use tether_solver::UpdateConfig;
use tether_sync::PersistentSync;
use tether_tools::{HierarchicalTimer, MemorySnapshot};
use tracing::{debug, info, warn};

const DEFAULT_CASES: [usize; 3] = [1_000, 10_000, 100_000];
const SCHEMA_VERSION: u32 = 1;

type BenchSync = PersistentSync<Model, CountingBackend>;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Benchmark incremental synchronization of generated models"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build, mirror, mutate and re-synchronize generated models
    Run(RunArgs),
    /// Render a saved JSONL artifact
    Report(ReportArgs),
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Comma-separated list of variable counts
    #[arg(long, value_delimiter = ',')]
    cases: Option<Vec<usize>>,

    /// Constraints per variable
    #[arg(long, default_value_t = 0.5)]
    constraint_ratio: f64,

    /// Share of each entity kind touched per mutation round
    #[arg(long, default_value_t = 0.05)]
    mutation_ratio: f64,

    /// Mutation + synchronize rounds per repetition
    #[arg(long, default_value_t = 1)]
    rounds: u32,

    /// Number of repetitions per case
    #[arg(long, default_value_t = 1)]
    repetitions: u32,

    /// JSON file with an update configuration; missing keys stay enabled
    #[arg(long)]
    config: Option<PathBuf>,

    /// Checks to turn off on top of --config
    #[arg(long, value_enum, value_delimiter = ',')]
    disable: Vec<Check>,

    /// Hand fixed variables to the backend as variables
    #[arg(long)]
    fixed_as_variables: bool,

    /// Track every variable declared below the root block
    #[arg(long)]
    only_child_vars: bool,

    /// JSONL output artifact path
    #[arg(long)]
    output: Option<PathBuf>,

    /// Output format for stdout
    #[arg(long, value_enum, default_value = "table")]
    format: OutputFormat,
}

#[derive(Parser, Debug)]
struct ReportArgs {
    /// Input JSONL benchmark artifact
    #[arg(long)]
    input: PathBuf,

    /// Output format for stdout
    #[arg(long, value_enum, default_value = "table")]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Ndjson,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, ValueEnum)]
enum Check {
    NewVars,
    Vars,
    NewParams,
    Params,
    NewConstraints,
    Constraints,
    NamedExprs,
    NewObjective,
    Objective,
}

impl Check {
    fn disable(self, config: UpdateConfig) -> UpdateConfig {
        match self {
            Check::NewVars => config.with_check_for_new_or_removed_vars(false),
            Check::Vars => config.with_update_vars(false),
            Check::NewParams => config.with_check_for_new_or_removed_params(false),
            Check::Params => config.with_update_params(false),
            Check::NewConstraints => config.with_check_for_new_or_removed_constraints(false),
            Check::Constraints => config.with_update_constraints(false),
            Check::NamedExprs => config.with_update_named_expressions(false),
            Check::NewObjective => config.with_check_for_new_objective(false),
            Check::Objective => config.with_update_objective(false),
        }
    }
}

#[derive(Debug, Clone)]
struct StageMeasurement {
    stage: String,
    duration_ms: f64,
    rss_before_bytes: Option<u64>,
    rss_after_bytes: Option<u64>,
    backend_calls: usize,
}

#[derive(Debug, Clone)]
struct CaseExecution {
    variables: usize,
    constraints: usize,
    stages: Vec<StageMeasurement>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct BenchRecord {
    schema_version: u32,
    run_id: String,
    case_name: String,
    repetition: u32,
    variables: usize,
    constraints: usize,
    stage: String,
    duration_ms: f64,
    rss_before_bytes: Option<u64>,
    rss_after_bytes: Option<u64>,
    rss_delta_bytes: Option<i64>,
    backend_calls: usize,
}

#[derive(Debug, Clone, Eq, Ord, PartialEq, PartialOrd)]
struct SummaryKey {
    case_name: String,
    stage: String,
}

#[derive(Debug, Clone, Serialize)]
struct SummaryRow {
    case_name: String,
    stage: String,
    samples: usize,
    mean_duration_ms: f64,
    max_duration_ms: f64,
    mean_backend_calls: f64,
    mean_rss_delta_bytes: Option<f64>,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_tracing()?;
    let cli = Cli::parse();
    match cli.command {
        Command::Run(args) => run_command(args),
        Command::Report(args) => report_command(args),
    }
}

fn run_command(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    if args.repetitions == 0 {
        return Err(boxed_input_error("repetitions must be greater than zero"));
    }
    if args.constraint_ratio <= 0.0 {
        return Err(boxed_input_error(
            "constraint-ratio must be greater than zero",
        ));
    }
    if !(0.0..=1.0).contains(&args.mutation_ratio) {
        return Err(boxed_input_error("mutation-ratio must be within [0, 1]"));
    }

    let config = resolve_config(args.config.as_deref(), &args.disable, args.fixed_as_variables)?;
    let run_id = build_run_id()?;
    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("artifacts/bench/{run_id}.jsonl")));
    let cases = args.cases.clone().unwrap_or_else(|| DEFAULT_CASES.to_vec());

    let mut records = Vec::new();
    for variables in cases {
        let case_name = format!("vars_{variables}");
        for rep_idx in 0..args.repetitions {
            let execution = execute_case(variables, &args, config)?;
            info!(
                component = "bench",
                operation = "execute_case",
                status = "success",
                case = case_name.as_str(),
                repetition = rep_idx + 1,
                variables = execution.variables,
                constraints = execution.constraints,
                "Benchmark case finished"
            );
            records.extend(case_records(&run_id, &case_name, rep_idx + 1, &execution));
        }
    }

    write_records_jsonl(&output_path, &records)?;
    render_output(args.format, &records)?;
    println!("artifact: {}", output_path.display());
    Ok(())
}

fn report_command(args: ReportArgs) -> Result<(), Box<dyn std::error::Error>> {
    let records = load_records_jsonl(&args.input)?;
    render_output(args.format, &records)
}

/// Configuration file (if any), then `--disable`, then the fixed-variable
/// treatment flag.
fn resolve_config(
    path: Option<&Path>,
    disabled: &[Check],
    fixed_as_variables: bool,
) -> Result<UpdateConfig, Box<dyn std::error::Error>> {
    let base = match path {
        Some(path) => serde_json::from_reader(BufReader::new(File::open(path)?))?,
        None => UpdateConfig::new(),
    };
    let config = disabled
        .iter()
        .fold(base, |config, check| check.disable(config));
    if fixed_as_variables {
        Ok(config.with_treat_fixed_vars_as_params(false))
    } else {
        Ok(config)
    }
}

/// Time `work` and bracket it with RSS snapshots.
fn measure<T>(
    stages: &mut Vec<StageMeasurement>,
    stage: &str,
    work: impl FnOnce() -> Result<(T, usize), Box<dyn std::error::Error>>,
) -> Result<T, Box<dyn std::error::Error>> {
    let rss_before = MemorySnapshot::try_capture(stage);
    let started = Instant::now();
    let (value, backend_calls) = work()?;
    let duration_ms = started.elapsed().as_secs_f64() * 1000.0;
    let rss_after = MemorySnapshot::try_capture(stage);
    stages.push(StageMeasurement {
        stage: stage.to_string(),
        duration_ms,
        rss_before_bytes: rss_before.map(|snapshot| snapshot.rss_bytes),
        rss_after_bytes: rss_after.map(|snapshot| snapshot.rss_bytes),
        backend_calls,
    });
    Ok(value)
}

fn execute_case(
    variables: usize,
    args: &RunArgs,
    config: UpdateConfig,
) -> Result<CaseExecution, Box<dyn std::error::Error>> {
    let shape = CaseShape::new(variables, args.constraint_ratio);
    let mut stages = Vec::new();
    let total_started = Instant::now();
    let total_rss_before = MemorySnapshot::try_capture("bench_total");

    let mut generated = measure(&mut stages, "build", || Ok((build_model(shape)?, 0)))?;
    let mut sync: BenchSync = PersistentSync::new(CountingBackend::new())
        .with_config(config)
        .with_only_child_vars(args.only_child_vars);

    measure(&mut stages, "set_instance", || {
        let root = generated.model.root();
        sync.set_instance(&mut generated.model, root)?;
        Ok(((), sync.backend_mut().take_calls().structural()))
    })?;

    measure(&mut stages, "sync_noop", || {
        let report = sync.synchronize(&mut generated.model)?;
        let structural = report.counts.structural_changes();
        if structural > 0 {
            warn!(
                component = "bench",
                operation = "sync_noop",
                status = "error",
                structural_changes = structural,
                "Unchanged model produced backend changes"
            );
        }
        Ok(((), sync.backend_mut().take_calls().structural()))
    })?;

    let mut timer = HierarchicalTimer::new();
    for _ in 0..args.rounds {
        let summary = measure(&mut stages, "mutate", || {
            Ok((mutate(&mut generated, args.mutation_ratio)?, 0))
        })?;
        debug!(
            component = "bench",
            operation = "mutate",
            status = "success",
            bounds_changed = summary.bounds_changed,
            bodies_replaced = summary.bodies_replaced,
            deactivated = summary.deactivated,
            added = summary.added,
            unfixed = summary.unfixed,
            params_changed = summary.params_changed,
            "Mutated model"
        );
        measure(&mut stages, "sync", || {
            sync.synchronize_with_timer(&mut generated.model, &mut timer)?;
            Ok(((), sync.backend_mut().take_calls().structural()))
        })?;
    }
    for entry in timer.entries() {
        stages.push(StageMeasurement {
            stage: format!("sync/{}", entry.path),
            duration_ms: entry.total_ms,
            rss_before_bytes: None,
            rss_after_bytes: None,
            backend_calls: 0,
        });
    }

    debug!(
        component = "bench",
        operation = "execute_case",
        status = "success",
        columns = sync.backend().num_columns(),
        rows = sync.backend().num_rows(),
        nonzeros = sync.backend().nonzeros(),
        has_objective = sync.backend().objective().is_some(),
        "Backend mirror after last pass"
    );

    stages.push(StageMeasurement {
        stage: "total".to_string(),
        duration_ms: total_started.elapsed().as_secs_f64() * 1000.0,
        rss_before_bytes: total_rss_before.map(|snapshot| snapshot.rss_bytes),
        rss_after_bytes: MemorySnapshot::try_capture("bench_total").map(|snapshot| snapshot.rss_bytes),
        backend_calls: stages.iter().map(|stage| stage.backend_calls).sum(),
    });

    Ok(CaseExecution {
        variables: sync.backend().num_columns(),
        constraints: sync.backend().num_rows(),
        stages,
    })
}

fn case_records(
    run_id: &str,
    case_name: &str,
    repetition: u32,
    execution: &CaseExecution,
) -> Vec<BenchRecord> {
    execution
        .stages
        .iter()
        .map(|measurement| BenchRecord {
            schema_version: SCHEMA_VERSION,
            run_id: run_id.to_string(),
            case_name: case_name.to_string(),
            repetition,
            variables: execution.variables,
            constraints: execution.constraints,
            stage: measurement.stage.clone(),
            duration_ms: measurement.duration_ms,
            rss_before_bytes: measurement.rss_before_bytes,
            rss_after_bytes: measurement.rss_after_bytes,
            rss_delta_bytes: match (measurement.rss_before_bytes, measurement.rss_after_bytes) {
                (Some(before), Some(after)) => Some(after as i64 - before as i64),
                _ => None,
            },
            backend_calls: measurement.backend_calls,
        })
        .collect()
}

fn render_output(
    format: OutputFormat,
    records: &[BenchRecord],
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Table => print_summary_table(&summarize_records(records)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(records)?),
        OutputFormat::Ndjson => {
            for record in records {
                println!("{}", serde_json::to_string(record)?);
            }
        }
    }
    Ok(())
}

fn summarize_records(records: &[BenchRecord]) -> Vec<SummaryRow> {
    #[derive(Default)]
    struct Acc {
        samples: usize,
        duration_sum: f64,
        duration_max: f64,
        calls_sum: usize,
        rss_delta_sum: f64,
        rss_delta_count: usize,
    }

    let mut groups: BTreeMap<SummaryKey, Acc> = BTreeMap::new();
    for record in records {
        let key = SummaryKey {
            case_name: record.case_name.clone(),
            stage: record.stage.clone(),
        };
        let entry = groups.entry(key).or_default();
        entry.samples += 1;
        entry.duration_sum += record.duration_ms;
        entry.duration_max = entry.duration_max.max(record.duration_ms);
        entry.calls_sum += record.backend_calls;
        if let Some(delta) = record.rss_delta_bytes {
            entry.rss_delta_sum += delta as f64;
            entry.rss_delta_count += 1;
        }
    }

    groups
        .into_iter()
        .map(|(key, acc)| {
            let samples = acc.samples.max(1) as f64;
            SummaryRow {
                case_name: key.case_name,
                stage: key.stage,
                samples: acc.samples,
                mean_duration_ms: acc.duration_sum / samples,
                max_duration_ms: acc.duration_max,
                mean_backend_calls: acc.calls_sum as f64 / samples,
                mean_rss_delta_bytes: (acc.rss_delta_count > 0)
                    .then(|| acc.rss_delta_sum / acc.rss_delta_count as f64),
            }
        })
        .collect()
}

fn print_summary_table(rows: &[SummaryRow]) {
    println!(
        "{:<16} {:<22} {:>7} {:>12} {:>12} {:>12} {:>14}",
        "case", "stage", "samples", "mean_ms", "max_ms", "calls", "mean_rss_mb"
    );
    for row in rows {
        println!(
            "{:<16} {:<22} {:>7} {:>12.3} {:>12.3} {:>12.1} {:>14}",
            row.case_name,
            row.stage,
            row.samples,
            row.mean_duration_ms,
            row.max_duration_ms,
            row.mean_backend_calls,
            row.mean_rss_delta_bytes.map_or_else(
                || "-".to_string(),
                |bytes| format!("{:.3}", bytes / (1024.0 * 1024.0)),
            ),
        );
    }
}

fn write_records_jsonl(
    path: &Path,
    records: &[BenchRecord],
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    for record in records {
        serde_json::to_writer(&mut writer, record)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

fn load_records_jsonl(path: &Path) -> Result<Vec<BenchRecord>, Box<dyn std::error::Error>> {
    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        records.push(serde_json::from_str::<BenchRecord>(&line)?);
    }
    Ok(records)
}

fn build_run_id() -> Result<String, Box<dyn std::error::Error>> {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|err| std::io::Error::other(err.to_string()))?
        .as_millis();
    Ok(format!("sync_{millis}"))
}

fn boxed_input_error(message: &str) -> Box<dyn std::error::Error> {
    Box::new(std::io::Error::new(
        std::io::ErrorKind::InvalidInput,
        message.to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(left: f64, right: f64) {
        assert!((left - right).abs() < 1e-9, "left={left}, right={right}");
    }

    fn record(stage: &str, duration_ms: f64, backend_calls: usize) -> BenchRecord {
        BenchRecord {
            schema_version: SCHEMA_VERSION,
            run_id: "run".to_string(),
            case_name: "vars_100".to_string(),
            repetition: 1,
            variables: 100,
            constraints: 50,
            stage: stage.to_string(),
            duration_ms,
            rss_before_bytes: Some(1_000),
            rss_after_bytes: Some(1_500),
            rss_delta_bytes: Some(500),
            backend_calls,
        }
    }

    #[test]
    fn test_summarize_records_groups_by_stage() {
        let records = vec![
            record("sync", 10.0, 4),
            record("sync", 30.0, 8),
            record("sync_noop", 1.0, 0),
        ];
        let summary = summarize_records(&records);
        assert_eq!(summary.len(), 2);

        let sync = &summary[0];
        assert_eq!(sync.stage, "sync");
        assert_eq!(sync.samples, 2);
        approx_eq(sync.mean_duration_ms, 20.0);
        approx_eq(sync.max_duration_ms, 30.0);
        approx_eq(sync.mean_backend_calls, 6.0);
        match sync.mean_rss_delta_bytes {
            Some(mean) => approx_eq(mean, 500.0),
            None => panic!("mean RSS delta should be present"),
        }
        approx_eq(summary[1].mean_backend_calls, 0.0);
    }

    #[test]
    fn test_resolve_config_applies_disabled_checks() {
        let config = resolve_config(None, &[Check::Vars, Check::NamedExprs], true).unwrap();
        assert!(!config.update_vars);
        assert!(!config.update_named_expressions);
        assert!(!config.treat_fixed_vars_as_params);
        assert!(config.update_constraints);
        assert!(config.check_for_new_objective);
    }

    #[test]
    fn test_resolve_config_reads_partial_json() {
        let path = std::env::temp_dir().join(format!("tether_bench_config_{}.json", std::process::id()));
        std::fs::write(&path, r#"{"update_params": false}"#).unwrap();
        let config = resolve_config(Some(&path), &[Check::NewObjective], false).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert!(!config.update_params);
        assert!(!config.check_for_new_objective);
        assert!(config.update_vars);
        assert!(config.treat_fixed_vars_as_params);
    }

    #[test]
    fn test_execute_case_is_silent_on_the_noop_pass() {
        let args = RunArgs::parse_from(["run", "--rounds", "2", "--mutation-ratio", "0.1"]);
        let execution = execute_case(200, &args, UpdateConfig::new()).unwrap();

        let calls = |stage: &str| -> Vec<usize> {
            execution
                .stages
                .iter()
                .filter(|measurement| measurement.stage == stage)
                .map(|measurement| measurement.backend_calls)
                .collect()
        };
        assert_eq!(calls("sync_noop"), vec![0]);
        assert!(calls("set_instance")[0] > 0);
        let syncs = calls("sync");
        assert_eq!(syncs.len(), 2);
        assert!(syncs.iter().all(|count| *count > 0));
        assert!(
            execution
                .stages
                .iter()
                .any(|measurement| measurement.stage == "sync/cons")
        );
        assert_eq!(execution.variables, 200);
    }
}
