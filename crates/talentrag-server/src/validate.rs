//! `talentrag validate` — checks that a data directory can be served.
//!
//! Loads the configuration and the corpus exactly as startup does, and checks
//! that the model directories carry their files. Models are not loaded.

use std::path::Path;

use tracing::{error, info};

use talentrag_core::RagConfig;
use talentrag_corpus::load_corpus;

const MODEL_FILES: [&str; 2] = ["model.onnx", "tokenizer.json"];

/// Outcome of a data directory check.
#[derive(Debug)]
pub struct ValidationReport {
    pub corpus_valid: bool,
    pub entries: usize,
    pub dimension: usize,
    pub encoder_present: bool,
    pub generator_present: bool,
    pub registry: String,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl ValidationReport {
    pub fn is_ready(&self) -> bool {
        self.errors.is_empty() && self.corpus_valid
    }
}

/// Validate the data directory at `data_dir`.
pub fn validate(data_dir: &Path) -> ValidationReport {
    let mut report = ValidationReport {
        corpus_valid: false,
        entries: 0,
        dimension: 0,
        encoder_present: false,
        generator_present: false,
        registry: String::new(),
        warnings: Vec::new(),
        errors: Vec::new(),
    };

    let config = match RagConfig::from_env(data_dir) {
        Ok(config) => config,
        Err(e) => {
            report.errors.push(e.to_string());
            RagConfig::new(data_dir)
        }
    };
    let paths = &config.data_paths;

    match load_corpus(&paths.embeddings, &paths.contexts) {
        Ok(index) => {
            let stats = index.stats();
            report.corpus_valid = true;
            report.entries = stats.entries;
            report.dimension = stats.dimension;
            if index.is_empty() {
                report
                    .warnings
                    .push("Corpus is empty; every query will fail with EmptyIndex".into());
            }
            info!("Corpus OK: {} entries (dim={})", stats.entries, stats.dimension);
        }
        Err(e) => {
            error!("Corpus check failed: {}", e);
            report.errors.push(format!("Corpus: {}", e));
        }
    }

    report.encoder_present = check_model_dir(&paths.encoder_dir, "Encoder", &mut report.errors);
    report.generator_present =
        check_model_dir(&paths.generator_dir, "Generator", &mut report.errors);

    report.registry = match &config.registry_uri {
        Some(uri) => format!("mlflow ({})", uri),
        None => {
            if !paths.registry_file.exists() {
                report.warnings.push(format!(
                    "No MLFLOW_TRACKING_URI and no {}; /info will report unavailable",
                    paths.registry_file.display()
                ));
            }
            format!("file ({})", paths.registry_file.display())
        }
    };

    report
}

fn check_model_dir(dir: &Path, label: &str, errors: &mut Vec<String>) -> bool {
    let missing: Vec<&str> = MODEL_FILES
        .iter()
        .copied()
        .filter(|file| !dir.join(file).exists())
        .collect();
    if missing.is_empty() {
        return true;
    }
    errors.push(format!(
        "{} model incomplete in {}: missing {}",
        label,
        dir.display(),
        missing.join(", ")
    ));
    false
}

/// Print a validation report.
pub fn print_report(report: &ValidationReport) {
    println!("=== TalentRAG Validation Report ===");
    println!();
    println!("Corpus valid:       {}", if report.corpus_valid { "YES" } else { "NO" });
    println!("Contexts:           {}", report.entries);
    println!("Dimension:          {}", report.dimension);
    println!("Encoder:            {}", if report.encoder_present { "found" } else { "missing" });
    println!("Generator:          {}", if report.generator_present { "found" } else { "missing" });
    println!("Registry:           {}", report.registry);

    if !report.warnings.is_empty() {
        println!();
        println!("Warnings:");
        for w in &report.warnings {
            println!("  - {}", w);
        }
    }

    if !report.errors.is_empty() {
        println!();
        println!("Errors:");
        for e in &report.errors {
            println!("  - {}", e);
        }
    }

    println!();
    if report.is_ready() {
        println!("Status: READY TO SERVE");
    } else {
        println!("Status: NOT READY");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_npy(path: &Path, rows: &[[f32; 2]]) {
        let mut header = format!(
            "{{'descr': '<f4', 'fortran_order': False, 'shape': ({}, 2), }}",
            rows.len()
        );
        while (10 + header.len() + 1) % 64 != 0 {
            header.push(' ');
        }
        header.push('\n');

        let mut bytes = b"\x93NUMPY\x01\x00".to_vec();
        bytes.extend_from_slice(&(header.len() as u16).to_le_bytes());
        bytes.extend_from_slice(header.as_bytes());
        for value in rows.iter().flatten() {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
        fs::write(path, bytes).unwrap();
    }

    #[test]
    fn test_empty_data_dir_is_not_ready() {
        let dir = tempfile::tempdir().unwrap();
        let report = validate(dir.path());

        assert!(!report.corpus_valid);
        assert!(!report.encoder_present);
        assert!(!report.generator_present);
        assert!(!report.is_ready());
        assert!(report.errors.iter().any(|e| e.starts_with("Corpus")));
    }

    #[test]
    fn test_complete_data_dir_is_ready() {
        let dir = tempfile::tempdir().unwrap();
        let paths = talentrag_core::DataPaths::new(dir.path());

        fs::create_dir_all(paths.embeddings.parent().unwrap()).unwrap();
        write_npy(&paths.embeddings, &[[1.0, 0.0], [0.0, 1.0]]);
        fs::write(&paths.contexts, r#"["Python, Django, SQL", "Java, Spring"]"#).unwrap();
        for model_dir in [&paths.encoder_dir, &paths.generator_dir] {
            fs::create_dir_all(model_dir).unwrap();
            for file in MODEL_FILES {
                fs::write(model_dir.join(file), b"stub").unwrap();
            }
        }

        let report = validate(dir.path());
        assert!(report.corpus_valid, "{:?}", report.errors);
        assert_eq!(report.entries, 2);
        assert_eq!(report.dimension, 2);
        assert!(report.encoder_present && report.generator_present);
        assert!(report.is_ready());
    }
}
