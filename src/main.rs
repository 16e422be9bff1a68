use anyhow::{Context, Result};
use chrono::Local;
use tracing_subscriber::EnvFilter;

// Use library instead of local modules
use sales_cleaner::{run_pipeline, ConsoleProgress, PipelineConfig};

fn main() -> Result<()> {
    let config = PipelineConfig::default();

    // Diagnostics share stdout with the narration
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.log_level))
        .with_target(false)
        .init();

    ConsoleProgress::banner("SALES DATA AUTOMATION & CLEANING SYSTEM");
    println!();

    let mut progress = ConsoleProgress::new(config.preview_rows);
    let generated_at = Local::now().naive_local();

    match run_pipeline(&config, generated_at, &mut progress) {
        Ok(_) => {}
        Err(err) if err.is_missing_input() => {
            println!("✗ Error: {}!", err);
            std::process::exit(1);
        }
        Err(err) => return Err(err).context("Sales data pipeline aborted"),
    }

    ConsoleProgress::banner("✓ AUTOMATION COMPLETE! All tasks finished successfully.");

    Ok(())
}
