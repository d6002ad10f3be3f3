use std::path::{Path, PathBuf};

use clap::error::ErrorKind;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::analytics::{AiCompatibility, AnalysisPipeline, AnalysisSnapshot, CapsulePerformance, PairSynergy, SynergyRules};
use crate::classify::{Archetype, Classifiers};
use crate::config::{validate_ruleset, AppConfig, ConfigError};
use crate::data::validate::{validate_catalog, validate_corpus, ValidationReport};
use crate::data::{load_capsule_definitions, load_corpus, load_ruleset, Catalog, DataError, MatchCorpus, Ruleset};
use crate::optimizer::{
    analyze_build, suggest_build_improvements, BuildCandidate, BuildGenerator, ImprovementSuggestion,
    ScoreTarget, ScoringContext,
};
use crate::parallel::WorkerPool;

#[derive(Debug, Parser)]
#[command(name = "loadout")]
#[command(about = "Capsule analytics and build recommendations from match history")]
#[command(version)]
pub struct Cli {
    /// YAML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args, Clone, Default)]
pub struct Inputs {
    /// Capsule catalog (.json or .csv)
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Match corpus (.json)
    #[arg(long)]
    pub corpus: Option<PathBuf>,

    /// Ruleset (.json or .yaml), overriding the configured one
    #[arg(long)]
    pub ruleset: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Per-capsule performance, top pairs and AI strategy compatibility
    Analyze {
        #[command(flatten)]
        inputs: Inputs,

        /// Only count matches of these characters
        #[arg(long = "character")]
        characters: Vec<String>,

        #[arg(long, default_value_t = 10)]
        top: usize,

        /// Minimum shared matches for a pair to be listed
        #[arg(long, default_value_t = 1)]
        min_appearances: u32,
    },

    /// Generate ranked builds
    Recommend {
        #[command(flatten)]
        inputs: Inputs,

        #[arg(long)]
        strategy: Option<String>,

        #[arg(long)]
        archetype: Option<Archetype>,

        /// Restrict character-bound capsules to this character
        #[arg(long)]
        character: Option<String>,

        #[arg(long)]
        max_builds: Option<usize>,

        #[arg(long)]
        seed: Option<u64>,

        #[arg(long)]
        workers: Option<usize>,

        /// Ignore pair synergy while picking capsules
        #[arg(long)]
        no_synergy: bool,
    },

    /// Validate, describe and score a given build
    Check {
        #[command(flatten)]
        inputs: Inputs,

        #[arg(long, value_delimiter = ',', required = true)]
        capsules: Vec<String>,

        #[arg(long)]
        strategy: Option<String>,

        #[arg(long)]
        archetype: Option<Archetype>,
    },

    /// Rank capsules that could be added to a build
    Suggest {
        #[command(flatten)]
        inputs: Inputs,

        #[arg(long, value_delimiter = ',')]
        capsules: Vec<String>,

        #[arg(long)]
        character: Option<String>,

        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Show archetype and build type tags for the catalog or a single effect text
    Classify {
        #[command(flatten)]
        inputs: Inputs,

        #[arg(long)]
        effect: Option<String>,

        #[arg(long, default_value = "")]
        name: String,
    },

    /// Report dataset problems; exits 1 when any error is found
    Validate {
        #[command(flatten)]
        inputs: Inputs,
    },
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error("failed to serialize output: {0}")]
    Output(#[from] serde_json::Error),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Usage(_) => 2,
            _ => 1,
        }
    }
}

pub fn run_with_args(args: &[String]) -> i32 {
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 2,
            };
        }
    };

    let config = match AppConfig::resolve(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            return 1;
        }
    };
    init_tracing(cli.log_level.as_deref().unwrap_or(&config.log_level));

    match dispatch(cli.command, &config) {
        Ok(Outcome::Clean) => 0,
        Ok(Outcome::Failed) => 1,
        Err(err) => {
            eprintln!("{err}");
            err.exit_code()
        }
    }
}

/// Installs the stderr subscriber. Later calls in the same process are no-ops.
pub fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

enum Outcome {
    Clean,
    /// Output was printed but describes a failure, such as dataset errors.
    Failed,
}

fn dispatch(command: Command, config: &AppConfig) -> Result<Outcome, CliError> {
    match command {
        Command::Analyze {
            inputs,
            characters,
            top,
            min_appearances,
        } => handle_analyze(config, &inputs, characters, top, min_appearances),
        Command::Recommend {
            inputs,
            strategy,
            archetype,
            character,
            max_builds,
            seed,
            workers,
            no_synergy,
        } => handle_recommend(
            config,
            &inputs,
            RecommendRequest {
                target: ScoreTarget {
                    strategy,
                    archetype,
                },
                character,
                max_builds,
                seed,
                workers,
                no_synergy,
            },
        ),
        Command::Check {
            inputs,
            capsules,
            strategy,
            archetype,
        } => handle_check(
            config,
            &inputs,
            &capsules,
            &ScoreTarget {
                strategy,
                archetype,
            },
        ),
        Command::Suggest {
            inputs,
            capsules,
            character,
            limit,
        } => handle_suggest(config, &inputs, &capsules, character.as_deref(), limit),
        Command::Classify {
            inputs,
            effect,
            name,
        } => handle_classify(config, &inputs, effect.as_deref(), &name),
        Command::Validate { inputs } => handle_validate(config, &inputs),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn catalog_path<'p>(config: &'p AppConfig, inputs: &'p Inputs) -> Result<&'p Path, CliError> {
    inputs
        .catalog
        .as_deref()
        .or(config.data.catalog_path.as_deref())
        .ok_or_else(|| CliError::Usage("no catalog given (use --catalog or data.catalog_path)".into()))
}

fn corpus_path<'p>(config: &'p AppConfig, inputs: &'p Inputs) -> Option<&'p Path> {
    inputs.corpus.as_deref().or(config.data.corpus_path.as_deref())
}

fn require_corpus<'p>(config: &'p AppConfig, inputs: &'p Inputs) -> Result<&'p Path, CliError> {
    corpus_path(config, inputs)
        .ok_or_else(|| CliError::Usage("no corpus given (use --corpus or data.corpus_path)".into()))
}

fn load_catalog(config: &AppConfig, inputs: &Inputs) -> Result<Catalog, CliError> {
    let rows = load_capsule_definitions(catalog_path(config, inputs)?, &config.data.capsule_type)?;
    let classifiers = Classifiers::standard().map_err(DataError::from)?;
    Ok(Catalog::classify(rows, &classifiers))
}

/// `--ruleset` wins over the configured ruleset. A file gets the checks the config already
/// passed; `min_capsules` is set only when builds will be generated.
fn effective_ruleset(config: &AppConfig, inputs: &Inputs, min_capsules: Option<usize>) -> Result<Ruleset, CliError> {
    let Some(path) = inputs.ruleset.as_deref() else {
        return Ok(config.ruleset.clone());
    };
    let ruleset = load_ruleset(path)?;
    validate_ruleset(&ruleset, min_capsules)
        .map_err(|err| CliError::Usage(format!("{}: {err}", path.display())))?;
    Ok(ruleset)
}

fn analyze(catalog: &Catalog, corpus: &MatchCorpus, characters: Vec<String>) -> Result<AnalysisSnapshot, CliError> {
    let rules = SynergyRules::standard().map_err(DataError::from)?;
    let pipeline = AnalysisPipeline::new(catalog, rules).with_character_filter(characters);
    Ok(pipeline.run(corpus))
}

/// Snapshot from the corpus when one is configured, otherwise empty analytics.
fn optional_snapshot(config: &AppConfig, inputs: &Inputs, catalog: &Catalog) -> Result<AnalysisSnapshot, CliError> {
    match corpus_path(config, inputs) {
        Some(path) => analyze(catalog, &load_corpus(path)?, Vec::new()),
        None => {
            warn!("no corpus given, scoring without match history");
            Ok(AnalysisSnapshot::default())
        }
    }
}

#[derive(Serialize)]
struct AnalyzeReport<'a> {
    counted_matches: usize,
    skipped_unknown_ids: usize,
    capsules: usize,
    top_capsules: Vec<&'a CapsulePerformance>,
    top_synergies: Vec<&'a PairSynergy>,
    ai_compatibility: &'a AiCompatibility,
}

fn handle_analyze(
    config: &AppConfig,
    inputs: &Inputs,
    characters: Vec<String>,
    top: usize,
    min_appearances: u32,
) -> Result<Outcome, CliError> {
    let catalog = load_catalog(config, inputs)?;
    let corpus = load_corpus(require_corpus(config, inputs)?)?;
    let snapshot = analyze(&catalog, &corpus, characters)?;
    print_json(&AnalyzeReport {
        counted_matches: snapshot.counted_matches,
        skipped_unknown_ids: snapshot.skipped_unknown_ids,
        capsules: snapshot.performance.len(),
        top_capsules: snapshot.top_capsules(top),
        top_synergies: snapshot.top_synergies(top, min_appearances),
        ai_compatibility: &snapshot.ai_compatibility,
    })?;
    Ok(Outcome::Clean)
}

struct RecommendRequest {
    target: ScoreTarget,
    character: Option<String>,
    max_builds: Option<usize>,
    seed: Option<u64>,
    workers: Option<usize>,
    no_synergy: bool,
}

#[derive(Serialize)]
struct RecommendReport<'a> {
    seed: u64,
    target: &'a ScoreTarget,
    ruleset: &'a Ruleset,
    builds: Vec<BuildCandidate<'a>>,
}

fn handle_recommend(config: &AppConfig, inputs: &Inputs, request: RecommendRequest) -> Result<Outcome, CliError> {
    let catalog = load_catalog(config, inputs)?;
    let corpus = load_corpus(require_corpus(config, inputs)?)?;
    let ruleset = effective_ruleset(config, inputs, Some(config.generator.min_capsules))?;
    let snapshot = analyze(&catalog, &corpus, Vec::new())?;

    let mut settings = config.generator.settings();
    settings.target = request.target;
    settings.character = request.character;
    if let Some(max_builds) = request.max_builds {
        settings.max_builds = max_builds;
    }
    if request.no_synergy {
        settings.prefer_synergy = false;
    }
    let seed = request.seed.or(config.generator.seed).unwrap_or_else(rand::random);
    let workers = WorkerPool::with_workers(request.workers.unwrap_or(config.generator.workers));
    info!(seed, workers = workers.workers, "generating builds");

    let generator = BuildGenerator::new(&catalog, ScoringContext::from(&snapshot), &ruleset);
    let builds = generator.generate_parallel(&settings, seed, &workers);
    if builds.is_empty() {
        warn!("no valid build found within the attempt budget");
    }
    print_json(&RecommendReport {
        seed,
        target: &settings.target,
        ruleset: &ruleset,
        builds,
    })?;
    Ok(Outcome::Clean)
}

fn handle_check(config: &AppConfig, inputs: &Inputs, capsules: &[String], target: &ScoreTarget) -> Result<Outcome, CliError> {
    let catalog = load_catalog(config, inputs)?;
    let ruleset = effective_ruleset(config, inputs, None)?;
    let snapshot = optional_snapshot(config, inputs, &catalog)?;
    let analysis = analyze_build(capsules, &catalog, ScoringContext::from(&snapshot), &ruleset, target);
    print_json(&analysis)?;
    Ok(if analysis.validation.valid {
        Outcome::Clean
    } else {
        Outcome::Failed
    })
}

#[derive(Serialize)]
struct SuggestReport<'a> {
    unknown_ids: Vec<String>,
    suggestions: Vec<ImprovementSuggestion<'a>>,
}

fn handle_suggest(
    config: &AppConfig,
    inputs: &Inputs,
    capsules: &[String],
    character: Option<&str>,
    limit: usize,
) -> Result<Outcome, CliError> {
    let catalog = load_catalog(config, inputs)?;
    let ruleset = effective_ruleset(config, inputs, None)?;
    let snapshot = analyze(&catalog, &load_corpus(require_corpus(config, inputs)?)?, Vec::new())?;
    let (current, unknown_ids) = catalog.resolve(capsules);
    let mut suggestions = suggest_build_improvements(
        &current,
        catalog.capsules(),
        &snapshot.synergy,
        &snapshot.performance,
        &ruleset,
        character,
    );
    suggestions.truncate(limit);
    print_json(&SuggestReport {
        unknown_ids,
        suggestions,
    })?;
    Ok(Outcome::Clean)
}

fn handle_classify(config: &AppConfig, inputs: &Inputs, effect: Option<&str>, name: &str) -> Result<Outcome, CliError> {
    if let Some(effect) = effect {
        let classifiers = Classifiers::standard().map_err(DataError::from)?;
        print_json(&serde_json::json!({
            "archetype": classifiers.archetype.classify(effect, name),
            "build_type": classifiers.build_type.classify(effect, name),
        }))?;
        return Ok(Outcome::Clean);
    }
    let catalog = load_catalog(config, inputs)?;
    print_json(catalog.capsules())?;
    Ok(Outcome::Clean)
}

#[derive(Serialize)]
struct ValidateReport {
    catalog: ValidationReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    corpus: Option<ValidationReport>,
}

fn handle_validate(config: &AppConfig, inputs: &Inputs) -> Result<Outcome, CliError> {
    let rows = load_capsule_definitions(catalog_path(config, inputs)?, &config.data.capsule_type)?;
    let corpus = match corpus_path(config, inputs) {
        Some(path) => Some(validate_corpus(&load_corpus(path)?, &rows)),
        None => None,
    };
    let report = ValidateReport {
        catalog: validate_catalog(&rows),
        corpus,
    };
    for diagnostic in report
        .catalog
        .diagnostics
        .iter()
        .chain(report.corpus.iter().flat_map(|corpus| corpus.diagnostics.iter()))
    {
        warn!("{diagnostic}");
    }
    print_json(&report)?;
    let failed = report.catalog.has_errors() || report.corpus.as_ref().is_some_and(ValidationReport::has_errors);
    Ok(if failed { Outcome::Failed } else { Outcome::Clean })
}
