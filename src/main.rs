use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use anyhow::Result;
use log::{error, info};
use serde_json::{json, Value};

use label_scan::pipeline::load_text_candidates;
use label_scan::{AnalyzerConfig, LabelAnalyzer, LabelReport};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize logging
    env_logger::init();

    let paths: Vec<PathBuf> = env::args().skip(1).map(PathBuf::from).collect();
    if paths.is_empty() {
        eprintln!("Usage: label-scan <text file | candidate directory | image>...");
        process::exit(2);
    }

    let config = AnalyzerConfig::from_env()?;
    info!("Starting label scan of {} inputs ({:?} profile)", paths.len(), config.profile);

    let analyzer = Arc::new(LabelAnalyzer::new(config)?);

    // Each input is an independent request on its own blocking worker
    let handles: Vec<_> = paths
        .into_iter()
        .map(|path| {
            let analyzer = Arc::clone(&analyzer);
            tokio::task::spawn_blocking(move || {
                let result = analyze_path(&analyzer, &path);
                (path, result)
            })
        })
        .collect();

    let mut outputs = Vec::with_capacity(handles.len());
    for handle in handles {
        let (path, result) = handle.await?;
        let output = match result {
            Ok(report) => serde_json::to_value(&report)?,
            Err(e) => {
                error!("Failed to analyze {}: {:#}", path.display(), e);
                json!({
                    "source": path.display().to_string(),
                    "success": false,
                    "error": e.to_string(),
                })
            }
        };
        outputs.push(output);
    }

    let document = if outputs.len() == 1 {
        outputs.remove(0)
    } else {
        Value::Array(outputs)
    };
    println!("{}", serde_json::to_string_pretty(&document)?);

    Ok(())
}

fn analyze_path(analyzer: &LabelAnalyzer, path: &Path) -> Result<LabelReport> {
    if path.is_dir() {
        let candidates = load_text_candidates(path)?;
        return Ok(analyzer.analyze_candidates(&candidates));
    }

    let bytes = fs::read(path)?;
    if image::guess_format(&bytes).is_ok() {
        return analyze_image(analyzer, &bytes);
    }

    let candidates = load_text_candidates(path)?;
    Ok(analyzer.analyze_candidates(&candidates))
}

#[cfg(feature = "tesseract")]
fn analyze_image(analyzer: &LabelAnalyzer, bytes: &[u8]) -> Result<LabelReport> {
    use label_scan::ocr::{GrayscalePreprocessor, TesseractRecognizer};

    let recognizer = TesseractRecognizer::default();
    Ok(analyzer.analyze_image(bytes, &GrayscalePreprocessor, &recognizer)?)
}

#[cfg(not(feature = "tesseract"))]
fn analyze_image(_analyzer: &LabelAnalyzer, _bytes: &[u8]) -> Result<LabelReport> {
    anyhow::bail!("image input requires label-scan to be built with the `tesseract` feature")
}
