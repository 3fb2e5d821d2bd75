//! `gradcafe standardize <text>`.

use super::build_standardizer;
use super::output::{self, Styled};
use anyhow::Result;
use gradcafe_harvest::HarvestConfig;

pub async fn run(config: &HarvestConfig, text: &str, offline: bool) -> Result<()> {
    let standardizer = build_standardizer(config, offline)?;
    let identity = standardizer.standardize(text).await;

    if output::is_json() {
        output::print_json(&serde_json::to_value(&identity)?);
    } else {
        let s = Styled::new();
        println!("{} {}", s.dim("program:   "), s.bold(&identity.program));
        println!("{} {}", s.dim("university:"), s.bold(&identity.university));
    }
    Ok(())
}
