mod logic;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;

use logic::{GameplayStrategy, PolicySummary, RunSummary, Simulator, summarize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Console,
    Json,
    Markdown,
}

#[derive(Debug, Parser)]
#[command(name = "battleground-tester", version)]
#[command(about = "Automated playthroughs and invariant checks for Bachelors Battleground")]
struct Args {
    /// Strategies to run (comma-separated, or `all`)
    #[arg(long, default_value = "all")]
    policies: String,

    /// List all available strategies and exit
    #[arg(long)]
    list_policies: bool,

    /// Seeds to run (comma-separated)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Number of runs per strategy and seed
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Output report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
    report: ReportFormat,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_policies(&args)? {
        return Ok(());
    }

    announce_banner();

    let start_time = Instant::now();
    let strategies = parse_strategies(&args.policies)?;
    let seeds = parse_seeds(&args.seeds)?;
    let simulator = Simulator::bundled(args.verbose)?;
    println!(
        "Catalog: {} semesters, {} choices",
        simulator.catalog().semesters.len(),
        simulator.catalog().choice_count()
    );

    let runs = run_strategies(&simulator, &strategies, &seeds, args.iterations);
    let summaries = summarize(&runs);

    write_reports(&args, &summaries, &runs, start_time)?;

    if summaries.iter().any(|summary| !summary.passed()) {
        std::process::exit(1);
    }

    Ok(())
}

fn maybe_list_policies(args: &Args) -> Result<bool> {
    if !args.list_policies {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available strategies:")?;
    for strategy in GameplayStrategy::ALL {
        let key = strategy
            .to_possible_value()
            .map(|value| value.get_name().to_string())
            .unwrap_or_default();
        writeln!(output_target.writer(), "  {key:12} - {}", strategy.label())?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!(
        "{}",
        "🎓 Bachelors Battleground Automated Tester"
            .bright_cyan()
            .bold()
    );
    println!("{}", "==========================================".cyan());
}

fn split_csv(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn parse_strategies(input: &str) -> Result<Vec<GameplayStrategy>> {
    let mut strategies = Vec::new();
    for token in split_csv(input) {
        if token.eq_ignore_ascii_case("all") {
            for strategy in GameplayStrategy::ALL {
                if !strategies.contains(&strategy) {
                    strategies.push(strategy);
                }
            }
            continue;
        }
        let strategy = GameplayStrategy::from_str(&token, true)
            .map_err(|err| anyhow::anyhow!("unknown strategy `{token}`: {err}"))?;
        if !strategies.contains(&strategy) {
            strategies.push(strategy);
        }
    }
    if strategies.is_empty() {
        bail!("no strategies selected");
    }
    Ok(strategies)
}

fn parse_seeds(input: &str) -> Result<Vec<u64>> {
    let seeds = split_csv(input)
        .iter()
        .map(|token| {
            token
                .parse::<u64>()
                .with_context(|| format!("invalid seed `{token}`"))
        })
        .collect::<Result<Vec<_>>>()?;
    if seeds.is_empty() {
        bail!("no seeds provided");
    }
    Ok(seeds)
}

fn run_strategies(
    simulator: &Simulator,
    strategies: &[GameplayStrategy],
    seeds: &[u64],
    iterations: usize,
) -> Vec<RunSummary> {
    println!("{}", "🧠 Running Playthroughs".bright_yellow().bold());
    println!("{}", "-".repeat(30).yellow());

    let mut runs = Vec::new();
    for &strategy in strategies {
        for &seed in seeds {
            for i in 0..iterations {
                let iteration_seed = seed.wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));
                let run = simulator.run(strategy, iteration_seed);
                if !run.is_clean() {
                    eprintln!(
                        "❌ {} seed {}: {} violation(s)",
                        strategy.label().red(),
                        iteration_seed,
                        run.violations.len()
                    );
                }
                runs.push(run);
            }
        }
    }
    runs
}

fn write_reports(
    args: &Args,
    summaries: &[PolicySummary],
    runs: &[RunSummary],
    start_time: Instant,
) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report {
        ReportFormat::Json => {
            logic::reports::generate_json_report(output_target.writer(), summaries, runs)?;
        }
        ReportFormat::Markdown => {
            logic::reports::generate_markdown_report(output_target.writer(), summaries)?;
        }
        ReportFormat::Console => {
            logic::reports::generate_console_report(
                output_target.writer(),
                summaries,
                start_time.elapsed(),
            )?;
            writeln!(
                output_target.writer(),
                "🏁 Total time: {:?}",
                start_time.elapsed()
            )?;
        }
    }

    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}
