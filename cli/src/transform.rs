use anyhow::{Context, bail};
use logswap::{Mode, RewriteDecision, Rewriter, RunConfig, Summary, Walker};
use tracing::debug;

use crate::RunOpts;

pub fn run(opts: &RunOpts, mode: Mode) -> anyhow::Result<()> {
    let config = match &opts.config {
        Some(path) => RunConfig::load(path, opts.preset)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => opts.preset.run_config(),
    };
    debug!(?config, ?mode, dry_run = opts.dry_run, "resolved configuration");
    if !opts.root.is_dir() {
        bail!("{} is not a directory", opts.root.display());
    }
    let rewriter = Rewriter::new(config.rewrite).context("invalid rewrite configuration")?;
    let walker = Walker::new(&opts.root, rewriter, config.extensions)
        .mode(mode)
        .dry_run(opts.dry_run);

    let notice = match (opts.dry_run, mode) {
        (true, _) => "~ Would modify:",
        (false, Mode::Migrate) => "✓ Modified:",
        (false, Mode::RepairImports) => "✓ Fixed:",
    };
    let summary = walker.run_with(|outcome| match &outcome.decision {
        RewriteDecision::Rewritten(_) => println!("{notice} {}", outcome.path.display()),
        RewriteDecision::Failed(e) => eprintln!("✗ Failed: {}: {e}", outcome.path.display()),
        RewriteDecision::Unchanged => {}
    });
    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &Summary) {
    println!("\n📊 Summary:");
    println!("   Processed: {} files", summary.scanned);
    println!("   Modified:  {} files", summary.modified.len());
    if !summary.failed.is_empty() {
        println!("   Failed:    {} files", summary.failed.len());
    }
}
