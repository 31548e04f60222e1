//! Headless autoplay runner (default binary).
//!
//! Plays one grid with the AI solver until it tops out or the tick limit is
//! reached, then prints the final board and a JSON summary.

use anyhow::{Context, Result};

use panel_clash::autoplay::{Autoplay, AutoplayConfig};

fn main() -> Result<()> {
    let config = AutoplayConfig::from_env().context("reading autoplay configuration")?;
    eprintln!(
        "[Autoplay] seed={} board={}x{} ticks={}",
        config.seed, config.width, config.height, config.ticks
    );

    let summary = Autoplay::new(config)?.run();

    for anomaly in &summary.anomalies {
        eprintln!("[Grid] anomaly: {}", anomaly);
    }
    if summary.topped_out {
        eprintln!("[Autoplay] topped out after {} ticks", summary.ticks);
    }

    println!("{}", summary.final_board);
    println!("{}", serde_json::to_string(&summary)?);
    Ok(())
}
