// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction. Parses arguments with
// clap, hands off to a Layer 2 use case, and prints the result.
// This is the only layer that prints.
//
//   train     — trains on IDX files, writes a checkpoint
//   evaluate  — loss / accuracy of a checkpoint on a split
//   predict   — top-k classes for one image
//   inspect   — architecture and parameter shapes in a checkpoint
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, EvaluateArgs, InspectArgs, PredictArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "fc-classifier",
    version,
    about = "Train a fully-connected image classifier, checkpoint it, and reload it from the checkpoint alone."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Route to the matching use case. The CLI never computes.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)    => run_train(args),
            Commands::Evaluate(args) => run_evaluate(args),
            Commands::Predict(args)  => run_predict(args),
            Commands::Inspect(args)  => run_inspect(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on '{}' ({})", args.data_dir, args.dataset);
    let summary = TrainUseCase::new(args.into()).execute()?;

    println!("Training complete after {} steps.", summary.steps);
    if let Some(report) = summary.last_validation {
        println!(
            "Final validation: loss {:.3}, accuracy {:.3} ({} images)",
            report.loss, report.accuracy, report.samples
        );
    }
    println!("Checkpoint saved to '{}'.", summary.checkpoint.display());
    Ok(())
}

fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    use crate::application::evaluate_use_case::EvaluateUseCase;

    let report = EvaluateUseCase::new(args.checkpoint, args.data_dir, args.split, args.batch_size)
        .execute()?;

    println!(
        "{} split: {} images, loss {:.4}, accuracy {:.2}%",
        args.split.name(),
        report.samples,
        report.loss,
        report.accuracy * 100.0
    );
    Ok(())
}

fn run_predict(args: PredictArgs) -> Result<()> {
    use crate::application::predict_use_case::PredictUseCase;

    let use_case = PredictUseCase::new(args.checkpoint, args.data_dir, args.dataset)?;
    let prediction = use_case.predict(args.split, args.index, args.top_k)?;

    println!(
        "Image {} of the {} split, labelled {} ({})",
        prediction.index,
        args.split.name(),
        prediction.true_label,
        prediction.true_name
    );
    for (rank, score) in prediction.top.iter().enumerate() {
        println!(
            "  {}. {:>2} {:<12} {:6.2}%",
            rank + 1,
            score.class,
            score.name,
            score.probability * 100.0
        );
    }
    println!("{}", if prediction.is_correct() { "Correct." } else { "Wrong." });
    Ok(())
}

fn run_inspect(args: InspectArgs) -> Result<()> {
    use crate::application::inspect_use_case::inspect;

    let summary = inspect(&args.checkpoint)?;

    println!("Checkpoint:   {}", args.checkpoint.display());
    println!("Format:       {}", summary.format);
    println!("Architecture: {}", summary.architecture);
    println!("Parameters:   {}", summary.parameter_count());
    for (name, shape) in &summary.parameters {
        println!("  {name:<24} {shape:?}");
    }
    Ok(())
}
