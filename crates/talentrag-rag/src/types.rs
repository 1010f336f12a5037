use serde::Serialize;
use serde_json::Value;

use talentrag_core::{Error, GenerationSettings, Result};
use talentrag_corpus::RetrievalHit;

/// One query plus the limits it runs under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub query: String,
    pub top_k: usize,
    pub max_new_tokens: usize,
    pub max_model_tokens: usize,
}

impl GenerationRequest {
    pub fn new(query: impl Into<String>, settings: &GenerationSettings) -> Self {
        Self {
            query: query.into(),
            top_k: settings.top_k,
            max_new_tokens: settings.max_new_tokens,
            max_model_tokens: settings.max_model_tokens,
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_query(&self.query)?;
        if self.top_k == 0 {
            return Err(Error::InvalidInput("top_k must be at least 1".into()));
        }
        if self.max_new_tokens == 0 || self.max_model_tokens <= self.max_new_tokens {
            return Err(Error::InvalidInput(format!(
                "max_model_tokens ({}) must exceed max_new_tokens ({}) and both must be positive",
                self.max_model_tokens, self.max_new_tokens
            )));
        }
        Ok(())
    }
}

/// Answer for one query, with the contexts that grounded it.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationResult {
    pub answer: String,
    pub retrieved: Vec<RetrievalHit>,
}

impl GenerationResult {
    /// Retrieved texts, most relevant first.
    pub fn context_texts(&self) -> Vec<&str> {
        self.retrieved.iter().map(|hit| hit.text.as_str()).collect()
    }
}

pub(crate) fn validate_query(query: &str) -> Result<()> {
    if query.trim().is_empty() {
        return Err(Error::InvalidInput("query is empty".into()));
    }
    Ok(())
}

/// Non-empty list of non-blank queries, in caller order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryBatch {
    queries: Vec<String>,
}

impl QueryBatch {
    pub fn new(queries: Vec<String>) -> Result<Self> {
        if queries.is_empty() {
            return Err(Error::InvalidInput("no queries provided".into()));
        }
        for (i, query) in queries.iter().enumerate() {
            validate_query(query)
                .map_err(|_| Error::InvalidInput(format!("query {} is empty", i)))?;
        }
        Ok(Self { queries })
    }

    /// Accepts a bare string, an array of strings, or an object carrying
    /// either under `perguntas` or `pergunta`.
    pub fn from_json(value: &Value) -> Result<Self> {
        match value {
            Value::String(query) => Self::new(vec![query.clone()]),
            Value::Array(items) => {
                let queries = items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| match item {
                        Value::String(query) => Ok(query.clone()),
                        other => Err(Error::InvalidInput(format!(
                            "query {} is not text: {}",
                            i,
                            json_kind(other)
                        ))),
                    })
                    .collect::<Result<Vec<_>>>()?;
                Self::new(queries)
            }
            Value::Object(map) => match map.get("perguntas").or_else(|| map.get("pergunta")) {
                Some(inner @ (Value::String(_) | Value::Array(_))) => Self::from_json(inner),
                Some(other) => Err(Error::InvalidInput(format!(
                    "expected text or a list of texts, got {}",
                    json_kind(other)
                ))),
                None => Err(Error::InvalidInput(
                    "missing `perguntas` field".into(),
                )),
            },
            other => Err(Error::InvalidInput(format!(
                "expected text or a list of texts, got {}",
                json_kind(other)
            ))),
        }
    }

    pub fn queries(&self) -> &[String] {
        &self.queries
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    pub fn into_inner(self) -> Vec<String> {
        self.queries
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
