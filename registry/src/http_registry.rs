use crate::client::RegistryError;
use crate::types::{DeploymentRecord, Lookup};
use reqwest::StatusCode;
use serde::Deserialize;
use url::Url;

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeStacksResponse {
    #[serde(default)]
    stacks: Vec<StackDescription>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StackDescription {
    stack_name: Option<String>,
    #[serde(default)]
    outputs: Vec<StackOutput>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StackOutput {
    output_key: Option<String>,
    output_value: Option<String>,
}

/// Looks environments up in a remote registry that serves stack descriptions.
///
/// The underlying `reqwest::Client` is created once and reused for every lookup so warm
/// connections are shared between invocations.
#[derive(Clone)]
pub struct HttpRegistry {
    client: reqwest::Client,
    url: Url,
    region: Option<String>,
}

impl HttpRegistry {
    pub fn new(url: Url, region: Option<String>) -> Result<Self, RegistryError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("branchgate/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(HttpRegistry {
            client,
            url,
            region,
        })
    }

    pub async fn lookup(&self, name: &str) -> Lookup {
        let lookup = Lookup::from(self.describe(name).await);
        if let Lookup::Failed(e) = &lookup {
            tracing::warn!(environment = name, error = %e, "Registry lookup failed");
        }
        lookup
    }

    async fn describe(&self, name: &str) -> Result<Option<DeploymentRecord>, RegistryError> {
        let mut query_params = vec![("StackName", name)];
        if let Some(region) = &self.region {
            query_params.push(("Region", region.as_str()));
        }

        let response = self
            .client
            .get(self.url.clone())
            .query(&query_params)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {
                let described = response.json::<DescribeStacksResponse>().await?;
                Ok(described
                    .stacks
                    .into_iter()
                    .next()
                    .map(|stack| into_record(name, stack)))
            }
            StatusCode::NOT_FOUND => Ok(None),
            status => Err(RegistryError::UnexpectedStatus(status)),
        }
    }
}

fn into_record(requested: &str, stack: StackDescription) -> DeploymentRecord {
    let outputs = stack
        .outputs
        .into_iter()
        .filter_map(|o| Some((o.output_key?, o.output_value?)));

    DeploymentRecord::new(stack.stack_name.unwrap_or_else(|| requested.to_string()), outputs)
}
