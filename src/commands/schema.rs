//! Print the provider schema

use anyhow::{Context, Result};
use declarative::Provider;

pub fn run() -> Result<()> {
    println!("{}", render(&Provider::jumpcloud())?);
    Ok(())
}

fn render(provider: &Provider) -> Result<String> {
    serde_json::to_string_pretty(&provider.describe_schema())
        .context("Failed to serialize provider schema")
}
