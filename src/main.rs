use std::process;
use std::str::FromStr;

use clap::Parser;

use portcast::core::{AssetAllocation, AssetClass, SimulationRequest, SimulationResult, Simulator};

#[derive(Parser, Debug)]
#[command(
    name = "portcast",
    about = "Monte Carlo projection of a multi-asset ETF portfolio"
)]
struct Args {
    /// Allocation entries, e.g. --allocation us-large-cap=60,us-bonds=30,cash=10
    #[arg(long, value_delimiter = ',', required = true)]
    allocation: Vec<String>,

    /// Initial investment amount.
    #[arg(long, default_value_t = 100_000.0)]
    initial: f64,

    /// Contribution added every month.
    #[arg(long, default_value_t = 0.0)]
    monthly: f64,

    /// Projection horizon in years.
    #[arg(long, default_value_t = 30)]
    years: u32,

    /// Number of Monte Carlo trials.
    #[arg(long, default_value_t = SimulationRequest::DEFAULT_TRIAL_COUNT)]
    trials: u32,

    /// Seed for reproducible output; fresh entropy when omitted.
    #[arg(long)]
    seed: Option<u64>,

    /// Emit the projection as JSON instead of a table.
    #[arg(long)]
    json: bool,
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    if let Err(e) = run(&args) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let allocation = parse_allocation(&args.allocation)?;
    let mut request = SimulationRequest::new(allocation, args.initial, args.monthly, args.years);
    request.trial_count = args.trials;

    let simulator = Simulator::new()?;
    let result = match args.seed {
        Some(seed) => simulator.run_seeded(&request, seed)?,
        None => simulator.run(&request)?,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_table(&result);
    }
    Ok(())
}

fn parse_allocation(entries: &[String]) -> Result<AssetAllocation, String> {
    let mut allocation = AssetAllocation::new();
    for entry in entries {
        let (name, value) = entry
            .split_once('=')
            .ok_or_else(|| format!("expected class=percent, got {entry:?}"))?;
        let class = AssetClass::from_str(name.trim())?;
        let percent: f64 = value
            .trim()
            .parse()
            .map_err(|_| format!("invalid percentage {value:?} for {name}"))?;
        allocation.set(class, percent);
    }
    Ok(allocation)
}

fn print_table(result: &SimulationResult) {
    println!(
        "{:>4}  {:>14}  {:>14}  {:>14}  {:>14}  {:>14}  {:>14}",
        "year", "p5", "p25", "median", "p75", "p95", "mean"
    );
    for row in &result.projections {
        println!(
            "{:>4}  {:>14.0}  {:>14.0}  {:>14.0}  {:>14.0}  {:>14.0}  {:>14.0}",
            row.year,
            row.percentile5,
            row.percentile25,
            row.percentile50,
            row.percentile75,
            row.percentile95,
            row.mean
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_allocation_entries() {
        let entries = [
            "us-large-cap=60".to_string(),
            "us-bonds=30".to_string(),
            "cash=10".to_string(),
        ];
        let allocation = parse_allocation(&entries).unwrap();
        assert_eq!(allocation.weight(AssetClass::UsLargeCap), 60.0);
        assert_eq!(allocation.weight(AssetClass::UsBonds), 30.0);
        assert_eq!(allocation.weight(AssetClass::Cash), 10.0);
        assert_eq!(allocation.weight(AssetClass::Gold), 0.0);
    }

    #[test]
    fn trims_whitespace_around_entries() {
        let entries = [" gold = 5 ".to_string()];
        let allocation = parse_allocation(&entries).unwrap();
        assert_eq!(allocation.weight(AssetClass::Gold), 5.0);
    }

    #[test]
    fn rejects_unknown_class() {
        let entries = ["crypto=10".to_string()];
        assert!(parse_allocation(&entries).is_err());
    }

    #[test]
    fn rejects_entry_without_equals_sign() {
        let entries = ["cash".to_string()];
        assert!(parse_allocation(&entries).is_err());
    }

    #[test]
    fn rejects_non_numeric_percentage() {
        let entries = ["cash=lots".to_string()];
        assert!(parse_allocation(&entries).is_err());
    }
}
