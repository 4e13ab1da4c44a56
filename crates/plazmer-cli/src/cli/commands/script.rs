//! `plazmer script <blob-url>` – print the blob extraction script.

use plazmer_core::bridge::blob_extraction_script;
use plazmer_core::config::PlazmerConfig;

pub fn run_script(cfg: &PlazmerConfig, blob_url: &str) {
    println!("{}", blob_extraction_script(blob_url, &cfg.bridge_name));
}
