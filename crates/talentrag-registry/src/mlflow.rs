//! MLflow tracking server client (REST API 2.0).

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use talentrag_core::{Error, Result};

use crate::registry::ModelRegistry;
use crate::types::{newest, RegisteredVersion};

const LATEST_VERSIONS_PATH: &str = "/api/2.0/mlflow/registered-models/get-latest-versions";
const GET_RUN_PATH: &str = "/api/2.0/mlflow/runs/get";

/// Reads registered versions and their run data from an MLflow server.
pub struct MlflowRegistry {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct LatestVersionsResponse {
    #[serde(default)]
    model_versions: Vec<ModelVersion>,
}

#[derive(Deserialize)]
struct ModelVersion {
    version: String,
    #[serde(default)]
    run_id: String,
}

#[derive(Deserialize)]
struct RunResponse {
    run: Run,
}

#[derive(Deserialize)]
struct Run {
    #[serde(default)]
    data: RunData,
}

#[derive(Deserialize, Default)]
struct RunData {
    #[serde(default)]
    metrics: Vec<Metric>,
    #[serde(default)]
    params: Vec<Param>,
}

#[derive(Deserialize)]
struct Metric {
    key: String,
    value: f64,
}

#[derive(Deserialize)]
struct Param {
    key: String,
    value: String,
}

#[derive(Deserialize)]
struct ApiError {
    #[serde(default)]
    error_code: String,
}

impl MlflowRegistry {
    /// Client for the tracking server at `base_url` (e.g. `http://mlflow:5000`).
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| Error::Registry(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    async fn fetch_run(&self, run_id: &str) -> Result<RunData> {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, GET_RUN_PATH))
            .query(&[("run_id", run_id)])
            .send()
            .await
            .map_err(|e| Error::Registry(format!("MLflow request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Registry(format!(
                "MLflow runs/get for {} returned {}: {}",
                run_id, status, body
            )));
        }

        let run: RunResponse = response
            .json()
            .await
            .map_err(|e| Error::Registry(format!("Invalid MLflow run response: {}", e)))?;
        Ok(run.run.data)
    }
}

#[async_trait]
impl ModelRegistry for MlflowRegistry {
    fn name(&self) -> &str {
        "mlflow"
    }

    async fn latest_version(&self, model_name: &str) -> Result<Option<RegisteredVersion>> {
        debug!("Querying MLflow at {} for {}", self.base_url, model_name);

        let response = self
            .client
            .post(format!("{}{}", self.base_url, LATEST_VERSIONS_PATH))
            .json(&json!({ "name": model_name }))
            .send()
            .await
            .map_err(|e| Error::Registry(format!("MLflow request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let code = serde_json::from_str::<ApiError>(&body)
                .map(|e| e.error_code)
                .unwrap_or_default();
            if status == StatusCode::NOT_FOUND || code == "RESOURCE_DOES_NOT_EXIST" {
                return Ok(None);
            }
            return Err(Error::Registry(format!(
                "MLflow get-latest-versions returned {}: {}",
                status, body
            )));
        }

        let latest: LatestVersionsResponse = response
            .json()
            .await
            .map_err(|e| Error::Registry(format!("Invalid MLflow versions response: {}", e)))?;

        let Some(version) = newest(latest.model_versions, |v| v.version.as_str()) else {
            return Ok(None);
        };

        let data = if version.run_id.is_empty() {
            RunData::default()
        } else {
            self.fetch_run(&version.run_id).await?
        };

        // Later entries for the same key win.
        let metrics: BTreeMap<String, f64> =
            data.metrics.into_iter().map(|m| (m.key, m.value)).collect();
        let parameters: BTreeMap<String, String> =
            data.params.into_iter().map(|p| (p.key, p.value)).collect();

        info!(
            "MLflow: {} version {} (run {}), {} metrics, {} params",
            model_name,
            version.version,
            version.run_id,
            metrics.len(),
            parameters.len()
        );

        Ok(Some(RegisteredVersion {
            version: version.version,
            run_id: version.run_id,
            metrics,
            parameters,
        }))
    }
}
