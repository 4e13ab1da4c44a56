//! `plazmer age [--set true|false]` – the age-gate answer.

use anyhow::Result;
use plazmer_core::prefs::{Preferences, IS_ADULT_KEY};

pub fn run_age(set: Option<bool>) -> Result<()> {
    let mut prefs = Preferences::load_default()?;
    if let Some(value) = set {
        prefs.set_bool(IS_ADULT_KEY, value)?;
        tracing::info!(is_adult = value, "age preference updated");
    }
    println!("{} = {}", IS_ADULT_KEY, prefs.is_adult());
    Ok(())
}
