//! Command implementations for sqlsagectl

use crate::client::DaemonClient;
use crate::output::{format_health, format_response, Style};
use crate::seed::{seed_database, SeedOptions};
use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use std::io::{self, IsTerminal};
use std::path::Path;
use std::time::Duration;

fn style() -> Style {
    Style {
        color: io::stdout().is_terminal(),
    }
}

fn thinking_spinner(message: &str) -> ProgressBar {
    if !io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let spinner = ProgressBar::new_spinner();
    if let Ok(template) = ProgressStyle::default_spinner()
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", ""])
        .template("{spinner:.magenta} {msg} {elapsed:.dim}")
    {
        spinner.set_style(template);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}

/// `sqlsagectl ask`
pub fn ask(url: &str, question: &str, json: bool) -> Result<()> {
    let client = DaemonClient::new(url)?;

    let spinner = thinking_spinner("Thinking...");
    let result = client.ask(question);
    spinner.finish_and_clear();
    let response = result?;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        println!("{}", format_response(&response, style()));
    }
    Ok(())
}

/// `sqlsagectl health`
pub fn health(url: &str) -> Result<()> {
    let client = DaemonClient::new(url)?;
    let health = client.health()?;
    println!("{}", format_health(&health, client.base_url(), style()));
    Ok(())
}

/// `sqlsagectl seed`
pub fn seed(path: &Path, options: &SeedOptions) -> Result<()> {
    let summary = seed_database(path, options)?;

    println!("{} {}", "[OK]".bright_green(), path.display());
    println!("  employees    {}", summary.employees);
    println!("  customers    {}", summary.customers);
    println!("  products     {}", summary.products);
    println!("  orders       {}", summary.orders);
    println!("  order_items  {}", summary.order_items);
    Ok(())
}
