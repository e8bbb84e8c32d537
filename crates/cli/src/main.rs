mod args;
mod npy;
mod output;
mod provenance;
mod table;

use anyhow::{Context, Result};
use args::GenerateArgs;
use clap::{Parser, Subcommand};
use scene_latents::layout::{generate, Layout};
use tracing_subscriber::fmt::SubscriberBuilder;

#[derive(Parser)]
#[command(name = "scene-latents-cli")]
#[command(about = "Paired scene-latent dataset generator")]
struct Cmd {
    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand)]
enum Action {
    /// Sample both views and write them under --output-folder
    Generate(GenerateArgs),
    /// Print the canonical column names as JSON
    Layout {
        #[arg(long, default_value_t = 1)]
        n_objects: usize,
    },
    /// Print the resolved config and provenance block without sampling
    Report(GenerateArgs),
}

fn main() -> Result<()> {
    SubscriberBuilder::default().with_target(false).init();
    let cmd = Cmd::parse();
    match cmd.action {
        Action::Generate(args) => run(args),
        Action::Layout { n_objects } => layout(n_objects),
        Action::Report(args) => report(args),
    }
}

fn run(args: GenerateArgs) -> Result<()> {
    let out = args
        .output_folder
        .as_deref()
        .context("--output-folder is required")?;
    let cfg = args.resolve()?;
    tracing::info!(
        n_pairs = cfg.n_pairs,
        n_objects = cfg.n_objects,
        seed = cfg.seed,
        causal = cfg.causal,
        out = %out.display(),
        "generate"
    );
    // Everything is sampled before the first file is touched.
    let generated = generate(&cfg).context("sampling latents")?;
    let written = output::write_all(out, &generated, &cfg, args.table)?;
    tracing::info!(files = written.len(), "done");
    Ok(())
}

fn layout(n_objects: usize) -> Result<()> {
    let names = Layout::canonical(n_objects).names();
    println!("{}", serde_json::to_string_pretty(&names)?);
    Ok(())
}

fn report(args: GenerateArgs) -> Result<()> {
    let cfg = args.resolve()?;
    cfg.validate().context("validating config")?;
    let obj = serde_json::json!({
        "code_rev": provenance::current_git_rev(),
        "engine_version": scene_latents::VERSION,
        "params": cfg,
        "columns": Layout::canonical(cfg.n_objects).names(),
    });
    println!("{}", serde_json::to_string_pretty(&obj)?);
    Ok(())
}
