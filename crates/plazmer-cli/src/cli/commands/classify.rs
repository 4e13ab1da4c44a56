//! `plazmer classify <url>` – how a navigation would be treated.

use plazmer_core::config::PlazmerConfig;
use plazmer_core::intercept::Classifier;

pub fn run_classify(cfg: &PlazmerConfig, url: &str) {
    let class = Classifier::from_config(cfg).classify(url);
    println!("{}\t{}", class.as_str(), url);
}
