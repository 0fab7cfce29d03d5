use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use wordalign_core::{
    parse_plaintext, save_lexical, write_moses, Aligner, IterationReport, LexicalTable,
    Model1Trainer, Model2Trainer, SentencePair, TrainOptions,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Unsupervised IBM Model 1/2 word aligner")]
struct Args {
    /// Source side, one sentence per line ("-" for stdin)
    #[arg(short = 's', long = "source")]
    source: String,
    /// Target side, one sentence per line ("-" for stdin)
    #[arg(short = 't', long = "target")]
    target: String,
    /// Alignment model: 1 (lexical) or 2 (lexical + distortion)
    #[arg(short = 'm', long, default_value_t = 2)]
    model: u8,
    /// Iteration cap (defaults: 50 for model 1, 100 for model 2)
    #[arg(short = 'i', long)]
    iterations: Option<usize>,
    /// Stop once the log-likelihood improves by less than this ratio
    #[arg(long, default_value_t = wordalign_core::types::IMPROVEMENT_RATIO)]
    ratio: f64,
    /// Persisted lexical table to warm-start model 2 from
    #[arg(short = 'w', long = "warm-start")]
    warm_start: Option<PathBuf>,
    /// Train model 2 from uniform lexical weights instead of model 1 output
    #[arg(long, default_value_t = false)]
    cold_start: bool,
    /// Write the final lexical table here
    #[arg(long = "save-lexical")]
    save_lexical: Option<PathBuf>,
    /// Moses-format alignments ("-" for stdout)
    #[arg(short = 'o', long, default_value = "-")]
    output: String,
    /// Debug logging (overridden by RUST_LOG)
    #[arg(short = 'v', long, default_value_t = false)]
    verbose: bool,
}

fn read_all(path: &str) -> std::io::Result<String> {
    if path == "-" {
        use std::io::Read;
        let mut s = String::new();
        std::io::stdin().read_to_string(&mut s)?;
        Ok(s)
    } else {
        fs::read_to_string(path)
    }
}

fn write_all(path: &str, data: &str) -> std::io::Result<()> {
    if path == "-" { print!("{data}"); }
    else { fs::write(path, data)?; }
    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn options(args: &Args, base: TrainOptions) -> TrainOptions {
    let opts = base.with_improvement_ratio(args.ratio);
    match args.iterations {
        Some(n) => opts.with_max_iterations(n),
        None => opts,
    }
}

fn progress(report: &IterationReport) {
    info!(
        iteration = report.iteration,
        log_likelihood = report.log_likelihood,
        max_delta = report.max_delta,
        "iteration done"
    );
}

fn train_model1(args: &Args, pairs: &[SentencePair]) -> Result<wordalign_core::Model1> {
    Model1Trainer::new(options(args, TrainOptions::model1()))
        .train_with(pairs, progress)
        .context("training model 1")
}

fn run(args: &Args) -> Result<()> {
    if args.source == "-" && args.target == "-" {
        bail!("source and target cannot both be read from stdin");
    }
    let src = read_all(&args.source).with_context(|| format!("reading {}", args.source))?;
    let tgt = read_all(&args.target).with_context(|| format!("reading {}", args.target))?;
    let pairs = parse_plaintext(&src, &tgt)?;
    info!(sentences = pairs.len(), model = args.model, "loaded parallel text");

    let (alignments, lexical): (_, LexicalTable) = match args.model {
        1 => {
            let model = train_model1(args, &pairs)?;
            (model.align_all(&pairs), model.into_lexical())
        }
        2 => {
            let trainer = Model2Trainer::new(options(args, TrainOptions::model2()));
            let trainer = if let Some(path) = &args.warm_start {
                trainer.with_warm_start_file(path)?
            } else if args.cold_start {
                trainer
            } else {
                trainer.with_warm_start(train_model1(args, &pairs)?.into_lexical())
            };
            let model = trainer.train_with(&pairs, progress).context("training model 2")?;
            let alignments = model.align_all(&pairs);
            (alignments, model.into_parts().0)
        }
        m => bail!("unsupported model {m}, expected 1 or 2"),
    };

    if let Some(path) = &args.save_lexical {
        save_lexical(&lexical, path)
            .with_context(|| format!("saving lexical table to {}", path.display()))?;
    }
    write_all(&args.output, &write_moses(&alignments))
        .with_context(|| format!("writing {}", args.output))?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);
    run(&args)
}
