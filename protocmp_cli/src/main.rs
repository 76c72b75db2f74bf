use clap::{Parser, Subcommand};
use protocmp_common::{
    ComparisonOptions, ComparisonResult, ComparisonScope, FieldPath, FloatComparison,
    RepeatedFieldComparison,
};
use protocmp_core::compare_with_options;
use std::fs;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod decode;
mod schema;

#[derive(Parser)]
#[command(name = "protocmp")]
#[command(author = "protocmp Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Structural comparison of schema-described messages", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare two message instances against a schema description
    Compare {
        /// Schema description file (TOML)
        schema: PathBuf,

        /// Actual message instance (JSON)
        actual: PathBuf,

        /// Expected message instance (JSON)
        expected: PathBuf,

        /// Compare only fields set in the expected message
        #[arg(short, long)]
        partial: bool,

        /// Compare floats approximately instead of exactly
        #[arg(short, long)]
        approximate: bool,

        /// Relative tolerance for approximate float comparison
        #[arg(long)]
        float_fraction: Option<f64>,

        /// Absolute tolerance for approximate float comparison
        #[arg(long)]
        float_margin: Option<f64>,

        /// Compare repeated fields order-insensitively
        #[arg(long)]
        as_set: bool,

        /// Dotted field path to ignore (can be specified multiple times)
        #[arg(short, long)]
        ignore: Vec<String>,

        /// Output the result as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    // Initialize tracing to stderr (so JSON output can go cleanly to stdout)
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Compare {
            schema,
            actual,
            expected,
            partial,
            approximate,
            float_fraction,
            float_margin,
            as_set,
            ignore,
            json,
        } => {
            match run_compare(
                schema,
                actual,
                expected,
                partial,
                approximate,
                float_fraction,
                float_margin,
                as_set,
                ignore,
                json,
            ) {
                Ok(result) => {
                    std::process::exit(if result.is_equal { 0 } else { 1 });
                }
                Err(e) => {
                    error!("Comparison failed: {e}");
                    std::process::exit(2);
                }
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn run_compare(
    schema_path: PathBuf,
    actual_path: PathBuf,
    expected_path: PathBuf,
    partial: bool,
    approximate: bool,
    float_fraction: Option<f64>,
    float_margin: Option<f64>,
    as_set: bool,
    ignore: Vec<String>,
    json: bool,
) -> anyhow::Result<ComparisonResult> {
    let root = schema::parse_schema(&fs::read_to_string(&schema_path)?)?;

    let actual_json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&actual_path)?)?;
    let expected_json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&expected_path)?)?;
    let actual = decode::decode_message(&root, &actual_json)?;
    let expected = decode::decode_message(&root, &expected_json)?;

    let mut options = ComparisonOptions::new();
    if partial {
        options = options.with_scope(ComparisonScope::Partial);
    }
    if approximate {
        options = options.with_float_comparison(FloatComparison::Approximate);
    }
    if let Some(fraction) = float_fraction {
        options = options.with_float_fraction(fraction)?;
    }
    if let Some(margin) = float_margin {
        options = options.with_float_margin(margin)?;
    }
    if as_set {
        options = options.with_repeated_field_comparison(RepeatedFieldComparison::AsSet);
    }
    for path in &ignore {
        options = options.ignore_field_path(FieldPath::parse(path)?);
    }

    info!(
        "Comparing {} against {} as `{}`",
        actual_path.display(),
        expected_path.display(),
        root.full_name()
    );

    let result = compare_with_options(&actual, &expected, &options)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else if result.is_equal {
        println!("messages are equal");
    } else {
        println!("messages differ:");
        for line in result.explanation.lines() {
            println!("  {line}");
        }
    }

    Ok(result)
}
