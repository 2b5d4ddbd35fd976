#![forbid(unsafe_code)]

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use rubrikk::gateway::{ChatGateway, NoopUsageSink, ScoringGateway, StderrUsageSink};
use rubrikk::report::{render_report_markdown, render_summary_text};
use rubrikk::{
    evaluate, CheckpointDecision, EvaluationRequest, FailureNotice, OperatorCheckpoint,
    ProgressEvent, ProgressObserver, ProviderError, RecoveryMode, Rubric, RunHooks, RunOptions,
    RUBRIC_NAMES,
};

#[derive(Parser)]
#[command(name = "rubrikk", version, about = "LLM-assistert evaluering av søknader mot en rubrikk")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List built-in rubrics
    Rubrics,
    /// Evaluate an application text against a rubric
    Evaluate {
        /// Path to the extracted application text (UTF-8)
        #[arg(long)]
        input: PathBuf,
        /// Rubric name (see `rubrikk rubrics`)
        #[arg(long, default_value = "oppstart2")]
        rubric: String,
        /// Model id override
        #[arg(long)]
        model: Option<String>,
        /// Never pause for the operator after failures (service mode)
        #[arg(long)]
        unattended: bool,
        /// Write the full result as JSON
        #[arg(long)]
        out: Option<PathBuf>,
        /// Write a markdown report
        #[arg(long)]
        report: Option<PathBuf>,
        /// Log each provider call to stderr as a JSON line
        #[arg(long)]
        log_usage: bool,
    },
}

// =============================================================================
// Console hooks
// =============================================================================

/// Progress printer matching the tool's original console texture.
struct ConsoleProgress;

#[async_trait::async_trait]
impl ProgressObserver for ConsoleProgress {
    async fn on_category_start(&self, category: &str, weight: Option<f64>) {
        match weight {
            Some(w) => println!("\n📋 Evaluerer kategori: {category} (Vekt: {w}%)"),
            None => println!("\n📋 Evaluerer kategori: {category}"),
        }
    }

    async fn on_question_scored(&self, event: ProgressEvent<'_>) {
        let result = event.result;
        let question = shorten(&result.question, 50);
        if result.is_fallback() {
            println!(
                "  ❌ Spørsmål {}/{}: {question} — {}",
                event.position, event.total, result.comment
            );
        } else {
            println!(
                "  ✅ Spørsmål {}/{}: {question} — score {}",
                event.position, event.total, result.score
            );
        }
    }
}

/// Blocking stdin checkpoint for attended runs.
struct ConsoleCheckpoint;

#[async_trait::async_trait]
impl OperatorCheckpoint for ConsoleCheckpoint {
    async fn on_failure(&self, notice: FailureNotice<'_>) -> CheckpointDecision {
        println!(
            "  ⚠️  Feil ved spørsmål {}/{} ({}): {}",
            notice.position, notice.total, notice.error_kind, notice.message
        );
        println!("  Vil du fortsette med neste spørsmål? (Enter = fortsett, 'a' = avbryt)");

        let line = tokio::task::spawn_blocking(|| {
            let mut line = String::new();
            std::io::stdin().read_line(&mut line).map(|_| line)
        })
        .await;

        match line {
            Ok(Ok(answer)) if answer.trim().eq_ignore_ascii_case("a") => {
                println!("🛑 Evaluering avbrutt av bruker.");
                CheckpointDecision::Abort
            }
            _ => CheckpointDecision::Continue,
        }
    }
}

fn shorten(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{cut}...")
    }
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Rubrics => {
            for name in RUBRIC_NAMES {
                let rubric = Rubric::by_name(name)?;
                let weighting = if rubric.is_weighted() { ", vektet" } else { "" };
                println!(
                    "{name}: {} — {} kategorier, {} spørsmål, skala 0-{}{weighting}",
                    rubric.title(),
                    rubric.categories().len(),
                    rubric.question_count(),
                    rubric.scale().max,
                );
            }
            Ok(())
        }
        Commands::Evaluate {
            input,
            rubric,
            model,
            unattended,
            out,
            report,
            log_usage,
        } => {
            run_evaluate(input, rubric, model, unattended, out, report, log_usage).await
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_evaluate(
    input: PathBuf,
    rubric: String,
    model: Option<String>,
    unattended: bool,
    out: Option<PathBuf>,
    report: Option<PathBuf>,
    log_usage: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    // Validate the rubric name before touching the network.
    Rubric::by_name(&rubric)?;

    let document_text = fs::read_to_string(&input)
        .map_err(|e| format!("kunne ikke lese '{}': {e}", input.display()))?;

    if document_text.trim().len() < 100 {
        println!("⚠️  ADVARSEL: Søknadsteksten virker veldig kort. Sjekk at filen inneholder hele søknaden.");
    }

    let gateway: Arc<dyn ChatGateway> = if log_usage {
        Arc::new(build_gateway(Arc::new(StderrUsageSink))?)
    } else {
        Arc::new(build_gateway(Arc::new(NoopUsageSink))?)
    };

    let document_name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.display().to_string());

    let options = RunOptions {
        recovery: if unattended {
            RecoveryMode::AutoContinue
        } else {
            RecoveryMode::PauseForOperator
        },
        ..Default::default()
    };

    let request = EvaluationRequest::new(document_text, document_name, rubric)
        .options(options);
    let request = match model {
        Some(model) => request.model(model),
        None => request,
    };

    println!("🤖 Starter AI-evaluering av søknaden...");
    println!("Dette kan ta noen minutter avhengig av søknadens lengde.");

    let progress = ConsoleProgress;
    let checkpoint = ConsoleCheckpoint;
    let hooks = RunHooks {
        observer: Some(&progress),
        checkpoint: if unattended { None } else { Some(&checkpoint) },
    };

    let result = evaluate(gateway, request, hooks).await?;

    print!("{}", render_summary_text(&result));

    if let Some(path) = out {
        fs::write(&path, serde_json::to_string_pretty(&result)?)?;
        println!("\n📄 JSON-resultat lagret i '{}'", path.display());
    }

    if let Some(path) = report {
        fs::write(&path, render_report_markdown(&result))?;
        println!("📊 Rapport lagret i '{}'", path.display());
    }

    Ok(())
}

fn build_gateway<U: rubrikk::gateway::UsageSink + 'static>(
    sink: Arc<U>,
) -> Result<ScoringGateway<rubrikk::OpenAiAdapter, U>, Box<dyn std::error::Error>> {
    ScoringGateway::from_env(sink).map_err(|err| match err {
        ProviderError::Config(_) => Box::<dyn std::error::Error>::from(
            "❌ FEIL: OPENAI_API_KEY ikke funnet.\n\
             💡 LØSNING: sett OPENAI_API_KEY i miljøet før du starter evalueringen.",
        ),
        other => Box::<dyn std::error::Error>::from(other),
    })
}
