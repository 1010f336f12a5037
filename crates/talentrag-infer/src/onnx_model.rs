//! Loading of `model.onnx` + `tokenizer.json` pairs. Requires the `onnx` feature.

#[cfg(feature = "onnx")]
mod inner {
    use std::path::Path;

    use ort::session::Session;
    use ort::value::Tensor;
    use tokenizers::Tokenizer;

    use talentrag_core::{Error, Result};

    /// Open the ONNX session and HuggingFace tokenizer stored in `model_dir`.
    /// `role` names the model in error messages.
    pub(crate) fn open(model_dir: &Path, role: &str, threads: usize) -> Result<(Session, Tokenizer)> {
        let model_path = model_dir.join("model.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");

        for (path, what) in [(&model_path, "model"), (&tokenizer_path, "tokenizer")] {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "{} {} not found: {}",
                    role,
                    what,
                    path.display()
                )));
            }
        }

        // With load-dynamic, ORT_DYLIB_PATH must point to libonnxruntime.so
        ort::init().commit();

        let load_err = |e: &dyn std::fmt::Display| {
            Error::Config(format!("Failed to load {} from {}: {}", role, model_path.display(), e))
        };
        let session = Session::builder()
            .map_err(|e| load_err(&e))?
            .with_intra_threads(threads)
            .map_err(|e| load_err(&e))?
            .commit_from_file(&model_path)
            .map_err(|e| load_err(&e))?;

        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| Error::Config(format!("Failed to load {} tokenizer: {}", role, e)))?;

        Ok((session, tokenizer))
    }

    /// A `[1, len]` int64 input tensor; `fail` wraps the ort error.
    pub(crate) fn row_tensor(values: Vec<i64>, fail: fn(String) -> Error) -> Result<Tensor<i64>> {
        let len = values.len();
        Tensor::from_array(([1usize, len], values))
            .map_err(|e| fail(format!("Failed to create input tensor: {}", e)))
    }
}

#[cfg(feature = "onnx")]
pub(crate) use inner::{open, row_tensor};
