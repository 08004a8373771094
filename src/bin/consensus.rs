#![forbid(unsafe_code)]

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use consensus_harness::labeler::{HttpLabeler, LabelerConfig, Provider};
use consensus_harness::prompts::{template_by_slug, PromptFragments};
use consensus_harness::statement::to_snapshot_json;
use consensus_harness::{
    aggregate, compute_aggregate_metrics_with_ci, compute_component_metrics, StatementKind,
    StatementRecord,
};

#[derive(Parser)]
#[command(name = "consensus", version, about = "Consensus harness CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the labeler over a statements file and write a results corpus
    Extract {
        /// Statements JSON: [{input, expected_components}]
        #[arg(long)]
        statements: PathBuf,

        /// Output results JSON; reused as a cache when it already exists
        #[arg(long)]
        out: PathBuf,

        /// Independent extraction runs per statement
        #[arg(long, default_value_t = 1)]
        runs: usize,

        /// Statement kind
        #[arg(long, value_enum, default_value = "regulative")]
        kind: CliKind,

        /// Model provider
        #[arg(long, value_enum, default_value = "openai")]
        provider: CliProvider,

        /// Model override (defaults to the provider's standard model)
        #[arg(long)]
        model: Option<String>,

        /// Directory holding prompt fragment files
        #[arg(long, default_value = "prompts")]
        prompts_dir: PathBuf,

        /// Include few-shot examples in the system prompt
        #[arg(long)]
        examples: bool,

        /// Refine each run with a second logical-operator pass
        #[arg(long)]
        logic: bool,
    },
    /// Aggregate a results corpus into consensus components
    Aggregate {
        #[arg(long)]
        results: PathBuf,
        #[arg(long)]
        out: PathBuf,
    },
    /// Aggregate, score, and print metric tables
    Evaluate {
        #[arg(long)]
        results: PathBuf,

        /// Bootstrap iterations for the F1 confidence intervals
        #[arg(long, default_value_t = 1000)]
        bootstrap: usize,

        /// Master seed for the bootstrap resampler
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Also write the rendered tables to this file
        #[arg(long)]
        report: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliKind {
    Regulative,
    Constitutive,
}

impl From<CliKind> for StatementKind {
    fn from(k: CliKind) -> Self {
        match k {
            CliKind::Regulative => StatementKind::Regulative,
            CliKind::Constitutive => StatementKind::Constitutive,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliProvider {
    Openai,
    Deepseek,
    Gemini,
    Claude,
}

impl From<CliProvider> for Provider {
    fn from(p: CliProvider) -> Self {
        match p {
            CliProvider::Openai => Provider::OpenAi,
            CliProvider::Deepseek => Provider::DeepSeek,
            CliProvider::Gemini => Provider::Gemini,
            CliProvider::Claude => Provider::Claude,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Extract {
            statements,
            out,
            runs,
            kind,
            provider,
            model,
            prompts_dir,
            examples,
            logic,
        } => {
            if out.exists() {
                info!(path = %out.display(), "results file already exists, nothing to do");
                return Ok(());
            }

            let kind = StatementKind::from(kind);
            let records: Vec<StatementRecord> = read_json(&statements)?;

            let fragments = load_fragments(&prompts_dir, kind, examples, logic)?;
            let slug = if examples {
                format!("{}_with_examples", kind.as_str())
            } else {
                kind.as_str().to_string()
            };
            let template = template_by_slug(&slug)
                .ok_or_else(|| format!("unknown prompt template '{slug}'"))?;
            let system_prompt = template.render(kind.as_str(), &fragments);

            let mut config = LabelerConfig::new(provider.into());
            if let Some(model) = model {
                config = config.with_model(model);
            }
            let labeler = HttpLabeler::from_env(config)?;
            info!(
                provider = labeler.provider().as_str(),
                model = labeler.model(),
                statements = records.len(),
                runs,
                "starting extraction"
            );

            let labeled = consensus_harness::labeler::label_statements(
                &labeler,
                kind,
                &system_prompt,
                fragments.logical_operator.as_deref(),
                &records,
                runs,
            )
            .await?;

            write_pretty_json(&out, &labeled)?;
            info!(path = %out.display(), "results written");
        }
        Commands::Aggregate { results, out } => {
            let records: Vec<StatementRecord> = read_json(&results)?;
            let aggregated = aggregate(&records);
            std::fs::write(&out, to_snapshot_json(&aggregated)?)?;
            info!(
                path = %out.display(),
                statements = aggregated.len(),
                "aggregated corpus written"
            );
        }
        Commands::Evaluate {
            results,
            bootstrap,
            seed,
            report,
        } => {
            let records: Vec<StatementRecord> = read_json(&results)?;
            let aggregated = aggregate(&records);
            let component_metrics = compute_component_metrics(&aggregated);
            let summary = compute_aggregate_metrics_with_ci(&aggregated, bootstrap, seed)?;

            let rendered = consensus_harness::report::render_metrics_markdown(
                &component_metrics,
                &summary,
                records.len(),
            );
            println!("{rendered}");
            if let Some(path) = report {
                std::fs::write(&path, &rendered)?;
                info!(path = %path.display(), "report written");
            }
        }
    }

    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| format!("reading {}: {e}", path.display()))?;
    Ok(serde_json::from_str(&raw)?)
}

fn write_pretty_json<T: serde::Serialize>(
    path: &Path,
    value: &T,
) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Read the prompt fragment files for a statement kind from `dir`. The
/// logical-operator fragment is shared across kinds.
fn load_fragments(
    dir: &Path,
    kind: StatementKind,
    examples: bool,
    logic: bool,
) -> Result<PromptFragments, Box<dyn std::error::Error>> {
    let read = |name: String| -> Result<String, Box<dyn std::error::Error>> {
        let path = dir.join(&name);
        std::fs::read_to_string(&path)
            .map_err(|e| format!("required prompt file {}: {e}", path.display()).into())
    };

    let kind_str = kind.as_str();
    Ok(PromptFragments {
        definitions: read(format!("{kind_str}_definitions.txt"))?,
        guidelines: read(format!("{kind_str}_guidelines.txt"))?,
        statement_information: read(format!("{kind_str}_information.txt"))?,
        examples: if examples {
            Some(read(format!("{kind_str}_examples.txt"))?)
        } else {
            None
        },
        logical_operator: if logic {
            Some(read("logical_operator.txt".to_string())?)
        } else {
            None
        },
    })
}
