use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use talentrag_core::Error;

/// One registered model version as reported by a registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisteredVersion {
    pub version: String,
    #[serde(default)]
    pub run_id: String,
    #[serde(default)]
    pub metrics: BTreeMap<String, f64>,
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
}

/// Metadata of the served model, frozen at startup.
///
/// Serialized with a `status` tag (`available` / `unavailable`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ModelMetadataSnapshot {
    Available {
        model_name: String,
        model_version: String,
        run_id: String,
        metrics: BTreeMap<String, f64>,
        parameters: BTreeMap<String, String>,
    },
    Unavailable {
        model_name: String,
        message: String,
    },
}

impl ModelMetadataSnapshot {
    pub fn from_version(model_name: &str, version: RegisteredVersion) -> Self {
        Self::Available {
            model_name: model_name.to_string(),
            model_version: version.version,
            run_id: version.run_id,
            metrics: version.metrics,
            parameters: version.parameters,
        }
    }

    pub fn unavailable(model_name: &str, message: impl Into<String>) -> Self {
        Self::Unavailable {
            model_name: model_name.to_string(),
            message: message.into(),
        }
    }

    pub fn model_name(&self) -> &str {
        match self {
            Self::Available { model_name, .. } | Self::Unavailable { model_name, .. } => model_name,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available { .. })
    }

    /// The degradation as an error value, for logging. `None` when available.
    pub fn error(&self) -> Option<Error> {
        match self {
            Self::Available { .. } => None,
            Self::Unavailable { message, .. } => Some(Error::MetadataUnavailable(message.clone())),
        }
    }
}

/// Numeric versions compare numerically and rank above non-numeric ones.
pub(crate) fn compare_versions(a: &str, b: &str) -> Ordering {
    match (a.trim().parse::<u64>(), b.trim().parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Greater,
        (Err(_), Ok(_)) => Ordering::Less,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// Newest item by version; the first one wins among equal versions.
pub(crate) fn newest<T>(items: Vec<T>, version: impl Fn(&T) -> &str) -> Option<T> {
    items.into_iter().reduce(|best, item| {
        if compare_versions(version(&item), version(&best)) == Ordering::Greater {
            item
        } else {
            best
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numeric_versions_compare_numerically() {
        assert_eq!(compare_versions("10", "9"), Ordering::Greater);
        assert_eq!(compare_versions("2", "latest"), Ordering::Greater);
        let picked = newest(vec!["3", "10", "9"], |v| *v).unwrap();
        assert_eq!(picked, "10");
        assert!(newest(Vec::<&str>::new(), |v| *v).is_none());
    }

    #[test]
    fn test_snapshot_serializes_with_status_tag() {
        let snapshot = ModelMetadataSnapshot::from_version(
            "RAG_Recrutamento",
            RegisteredVersion {
                version: "4".into(),
                run_id: "abc123".into(),
                metrics: BTreeMap::from([("manual_rouge1".to_string(), 0.42)]),
                parameters: BTreeMap::from([("pergunta".to_string(), "vaga Python".to_string())]),
            },
        );
        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(value["status"], "available");
        assert_eq!(value["model_version"], "4");
        assert_eq!(value["metrics"]["manual_rouge1"], json!(0.42));
        assert_eq!(value["parameters"]["pergunta"], "vaga Python");

        let down = ModelMetadataSnapshot::unavailable("RAG_Recrutamento", "registry unreachable");
        let value = serde_json::to_value(&down).unwrap();
        assert_eq!(value["status"], "unavailable");
        assert_eq!(value["message"], "registry unreachable");
        assert!(matches!(down.error(), Some(Error::MetadataUnavailable(_))));
    }
}
