//! Clean command - drop cached repository responses.
//!
//! Installed records are untouched; `modget list` falls back to raw ids
//! until the cache is repopulated.

use anyhow::Result;
use clap::Args;

use super::open_app;

#[derive(Args)]
pub struct CleanCmd {
    /// Skip confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

impl CleanCmd {
    pub async fn run(&self) -> Result<()> {
        if !self.yes {
            println!("This clears all cached repository responses.");
            print!("Continue? [y/N] ");
            std::io::Write::flush(&mut std::io::stdout())?;

            let mut input = String::new();
            std::io::stdin().read_line(&mut input)?;

            if !input.trim().eq_ignore_ascii_case("y") {
                println!("Aborted.");
                return Ok(());
            }
        }

        let app = open_app().await?;
        let removed = app.api.clear_cache().await?;
        println!("Removed {} cached responses", removed);

        Ok(())
    }
}
