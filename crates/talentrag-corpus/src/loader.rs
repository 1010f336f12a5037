//! Load the offline-computed corpus: a vector file paired positionally with
//! a text file.

use std::path::Path;

use tracing::info;

use crate::index::CorpusIndex;
use crate::npy::read_npy_matrix;
use talentrag_core::{Error, Result};

/// Load `embeddings.npy` + `contexts.json` and build the index atomically.
pub fn load_corpus(vectors_path: &Path, texts_path: &Path) -> Result<CorpusIndex> {
    if !vectors_path.exists() {
        return Err(Error::Corpus(format!(
            "Vectors not found: {}",
            vectors_path.display()
        )));
    }
    if !texts_path.exists() {
        return Err(Error::Corpus(format!(
            "Texts not found: {}",
            texts_path.display()
        )));
    }

    let matrix = read_npy_matrix(vectors_path)?;
    let vectors: Vec<Vec<f32>> = matrix.rows().into_iter().map(|row| row.to_vec()).collect();
    let texts = load_texts(texts_path)?;

    info!(
        "Loaded corpus files: {} vectors from {}, {} texts from {}",
        vectors.len(),
        vectors_path.display(),
        texts.len(),
        texts_path.display()
    );

    CorpusIndex::build(vectors, texts)
}

/// Read corpus texts.
///
/// Accepts a JSON array of strings, or JSON Lines where each line is a string
/// or an object with a `contexto` or `text` field.
pub fn load_texts(path: &Path) -> Result<Vec<String>> {
    let raw = std::fs::read_to_string(path)?;
    let trimmed = raw.trim_start();

    if trimmed.starts_with('[') {
        let texts: Vec<String> = serde_json::from_str(trimmed)
            .map_err(|e| Error::Corpus(format!("{}: {}", path.display(), e)))?;
        return Ok(texts);
    }

    raw.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(lineno, line)| {
            let value: serde_json::Value = serde_json::from_str(line).map_err(|e| {
                Error::Corpus(format!("{}:{}: {}", path.display(), lineno + 1, e))
            })?;
            text_from_value(&value).ok_or_else(|| {
                Error::Corpus(format!(
                    "{}:{}: expected a string or an object with 'contexto'/'text'",
                    path.display(),
                    lineno + 1
                ))
            })
        })
        .collect()
}

fn text_from_value(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Object(map) => map
            .get("contexto")
            .or_else(|| map.get("text"))
            .and_then(|v| v.as_str())
            .map(str::to_string),
        _ => None,
    }
}
