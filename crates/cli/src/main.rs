use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use time::macros::format_description;
use time::Date;

use steward_core::{Jurisdiction, ReportData, SUPPORTED_CODES};
use steward_engine::{Calculation, Engine, EngineOptions};

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Steward EPR packaging fee toolchain.
#[derive(Parser)]
#[command(name = "steward", version, about = "Steward EPR packaging fee engine")]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Calculate the EPR fee for a report file
    Calculate {
        /// Path to the report JSON file
        report: PathBuf,
        /// Calculation date (YYYY-MM-DD), overrides the report's date
        #[arg(long)]
        date: Option<String>,
    },

    /// Print the full 8-step audit trail for a report file
    Trace {
        /// Path to the report JSON file
        report: PathBuf,
        /// Calculation date (YYYY-MM-DD), overrides the report's date
        #[arg(long)]
        date: Option<String>,
    },

    /// List the supported jurisdiction codes
    Jurisdictions,
}

fn main() {
    let cli = Cli::parse();
    let exit_code = match cli.command {
        Commands::Calculate { report, date } => cmd_calculate(&report, date, cli.output),
        Commands::Trace { report, date } => cmd_trace(&report, date, cli.output),
        Commands::Jurisdictions => cmd_jurisdictions(cli.output),
    };
    process::exit(exit_code);
}

fn run_calculation(path: &Path, date: Option<String>) -> Result<Calculation, String> {
    let contents =
        std::fs::read_to_string(path).map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    let report: ReportData =
        serde_json::from_str(&contents).map_err(|e| format!("invalid report JSON: {e}"))?;

    let calculation_date = match date {
        Some(value) => {
            let format = format_description!("[year]-[month]-[day]");
            Some(
                Date::parse(&value, &format)
                    .map_err(|e| format!("invalid --date '{value}': {e}"))?,
            )
        }
        None => None,
    };

    let mut engine = Engine::with_options(EngineOptions {
        calculation_id: None,
        calculation_date,
    });
    engine.calculate(&report).map_err(|e| e.to_string())
}

fn cmd_calculate(path: &Path, date: Option<String>, output: OutputFormat) -> i32 {
    match run_calculation(path, date) {
        Ok(calc) => {
            match output {
                OutputFormat::Json => match serde_json::to_string_pretty(&calc.result) {
                    Ok(s) => println!("{s}"),
                    Err(e) => {
                        eprintln!("error: cannot serialize result: {e}");
                        return 1;
                    }
                },
                OutputFormat::Text => {
                    println!("calculation_id:    {}", calc.result.calculation_id);
                    println!("jurisdiction:      {}", calc.result.jurisdiction);
                    println!(
                        "total_fee:         {} {}",
                        calc.result.total_fee, calc.result.currency
                    );
                    println!("compliance_status: {}", calc.result.compliance_status);
                    println!(
                        "fee_type:          {}",
                        calc.result.calculation_breakdown["fee_type"]
                            .as_str()
                            .unwrap_or("-")
                    );
                    println!("legal_citations:");
                    for citation in &calc.result.legal_citations {
                        println!("  - {citation}");
                    }
                }
            }
            0
        }
        Err(message) => {
            eprintln!("error: {message}");
            1
        }
    }
}

fn cmd_trace(path: &Path, date: Option<String>, output: OutputFormat) -> i32 {
    match run_calculation(path, date) {
        Ok(calc) => {
            match output {
                OutputFormat::Json => match serde_json::to_string_pretty(&calc.audit_trail) {
                    Ok(s) => println!("{s}"),
                    Err(e) => {
                        eprintln!("error: cannot serialize trail: {e}");
                        return 1;
                    }
                },
                OutputFormat::Text => {
                    println!(
                        "audit trail for {} ({} steps)",
                        calc.result.calculation_id,
                        calc.audit_trail.len()
                    );
                    for step in &calc.audit_trail {
                        println!();
                        println!("[{}] {}", step.step_number, step.step_name);
                        println!("  rule:     {}", step.rule_applied);
                        println!("  citation: {}", step.legal_citation);
                        println!("  method:   {}", step.calculation_method);
                        println!("  output:   {}", step.output_data);
                    }
                }
            }
            0
        }
        Err(message) => {
            eprintln!("error: {message}");
            1
        }
    }
}

fn cmd_jurisdictions(output: OutputFormat) -> i32 {
    match output {
        OutputFormat::Json => {
            let list: Vec<serde_json::Value> = SUPPORTED_CODES
                .iter()
                .filter_map(|code| Jurisdiction::from_code(code).ok())
                .map(|j| {
                    serde_json::json!({
                        "code": j.code(),
                        "program": j.program_name(),
                    })
                })
                .collect();
            match serde_json::to_string_pretty(&list) {
                Ok(s) => println!("{s}"),
                Err(e) => {
                    eprintln!("error: {e}");
                    return 1;
                }
            }
        }
        OutputFormat::Text => {
            for code in SUPPORTED_CODES {
                if let Ok(j) = Jurisdiction::from_code(code) {
                    println!("{}  {}", j.code(), j.program_name());
                }
            }
        }
    }
    0
}
