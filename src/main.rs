use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use predx_core::{VectorStore, EMBEDDING_DIM};
use predx_engine::{trainer, Completer, CostWeights, SectionStats};
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// An experimental text-completion engine
#[derive(Parser, Debug)]
#[command(name = "predx")]
#[command(about = "An experimental text-completion engine", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Seed a word-vector store from a newline-separated word list
    Seed {
        /// Word list, one word per line
        wordlist: PathBuf,
        /// Output store file
        out: PathBuf,
        /// Embedding dimension
        #[arg(long, default_value_t = EMBEDDING_DIM)]
        dim: usize,
        /// Trees in the approximate index forest
        #[arg(long, default_value_t = 100)]
        trees: usize,
    },
    /// Run perturbation training steps against a corpus
    Train {
        /// Completer model file; created from --store on first run
        model: PathBuf,
        /// Training corpus, sections separated by blank lines
        corpus: PathBuf,
        /// Store file used to build a fresh model
        #[arg(long)]
        store: Option<PathBuf>,
        /// Training steps to run
        #[arg(long, default_value_t = 20)]
        steps: usize,
        /// Worker pool size for the per-step cost evaluations
        #[arg(long, default_value_t = 8)]
        workers: usize,
        /// Ephemeral memory length for a fresh model
        #[arg(long, default_value_t = 64)]
        ephemeral_len: usize,
        /// Context memory length for a fresh model
        #[arg(long, default_value_t = 64)]
        context_len: usize,
        /// Cap on corpus sections per step; a runaway corpus would stall
        /// the whole step since workers are never cancelled mid-flight
        #[arg(long)]
        max_sections: Option<usize>,
    },
    /// Predict continuations for a prompt
    Predict {
        /// Completer model file
        model: PathBuf,
        /// Prompt text
        prompt: String,
        /// Suggestions to print
        #[arg(long, default_value_t = 5)]
        suggestions: usize,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match args.command {
        Command::Seed {
            wordlist,
            out,
            dim,
            trees,
        } => seed(&wordlist, &out, dim, trees),
        Command::Train {
            model,
            corpus,
            store,
            steps,
            workers,
            ephemeral_len,
            context_len,
            max_sections,
        } => train(
            &model,
            &corpus,
            store.as_deref(),
            steps,
            workers,
            ephemeral_len,
            context_len,
            max_sections,
        ),
        Command::Predict {
            model,
            prompt,
            suggestions,
        } => predict(&model, &prompt, suggestions),
    }
}

fn seed(wordlist: &Path, out: &Path, dim: usize, trees: usize) -> Result<()> {
    let text = std::fs::read_to_string(wordlist)
        .with_context(|| format!("reading word list {}", wordlist.display()))?;

    let mut store = VectorStore::new(dim);
    let mut rng = rand::rng();
    for word in text.lines().map(str::trim).filter(|w| !w.is_empty()) {
        store.add_random(word, &mut rng)?;
    }

    if store.is_empty() {
        bail!("word list {} contains no words", wordlist.display());
    }

    store.build_ann_index(trees, &mut rng)?;
    predx_storage::save_store(&store, out)?;

    info!(words = store.len(), out = %out.display(), "store seeded");
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn train(
    model: &Path,
    corpus: &Path,
    store: Option<&Path>,
    steps: usize,
    workers: usize,
    ephemeral_len: usize,
    context_len: usize,
    max_sections: Option<usize>,
) -> Result<()> {
    let mut completer = if model.exists() {
        info!(model = %model.display(), "loading completer");
        predx_storage::load_completer(model)?
    } else {
        let store_path =
            store.context("no existing model; pass --store to build a fresh completer")?;
        info!(store = %store_path.display(), "building fresh completer");
        let store = predx_storage::load_store(store_path)?;
        let mut completer = Completer::new(store, ephemeral_len, context_len)?;
        completer.partition_into_subdatabases()?;
        completer
    };

    let corpus_text = std::fs::read_to_string(corpus)
        .with_context(|| format!("reading corpus {}", corpus.display()))?;
    let mut sections: Vec<String> = corpus_text
        .split("\n\n")
        .map(str::trim)
        .filter(|section| !section.is_empty())
        .map(str::to_owned)
        .collect();
    if let Some(cap) = max_sections {
        sections.truncate(cap);
    }

    info!(sections = sections.len(), steps, workers, "training");

    let weights = CostWeights::default();
    let mut rng = rand::rng();

    for step in 0..steps {
        let modification = trainer::train_step(&completer, &sections, &weights, workers, &mut rng)?;

        if modification.improves() {
            trainer::apply(&mut completer, &modification)?;
            info!(
                step,
                cost_before = modification.cost_before,
                cost_after = modification.cost_after,
                "step improved"
            );
        } else {
            info!(step, cost = modification.cost_before, "kept baseline");
        }
    }

    predx_storage::save_completer(&completer, model)?;
    info!(model = %model.display(), "model saved");
    Ok(())
}

fn predict(model: &Path, prompt: &str, suggestions: usize) -> Result<()> {
    let mut completer = predx_storage::load_completer(model)?;

    let tokens = completer.tokenize(prompt);
    if tokens.is_empty() {
        bail!("prompt produced no tokens");
    }

    let stats = SectionStats::from_section(prompt, &tokens);

    let mut last = None;
    for token in &tokens {
        last = Some(completer.predict_next_token(token, &stats)?);
    }
    let prediction = last.context("no prediction produced")?;

    let catalog = completer.catalog().read();
    let results = if catalog.main.is_ann_built() {
        catalog
            .main
            .nearest_approx(&prediction.predicted_embedding, suggestions, None)?
    } else {
        catalog
            .main
            .nearest(&prediction.predicted_embedding, suggestions, None)?
    };

    println!("prompt: {prompt}");
    println!("end-of-section score: {:.3}", prediction.is_end);
    for result in results {
        println!("{:.3}  {}", result.similarity, result.word.word);
    }

    Ok(())
}
