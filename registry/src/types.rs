use crate::client::RegistryError;
use indexmap::IndexMap;

/// Output key holding the callable endpoint of a deployed environment.
pub const FUNCTION_URL_OUTPUT: &str = "FunctionUrl";

/// The outputs of one provisioned environment.
#[derive(Clone, Debug, PartialEq)]
pub struct DeploymentRecord {
    pub name: String,
    pub outputs: IndexMap<String, String>,
}

impl DeploymentRecord {
    pub fn new<N, I, K, V>(name: N, outputs: I) -> Self
    where
        N: Into<String>,
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        DeploymentRecord {
            name: name.into(),
            outputs: outputs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn output(&self, key: &str) -> Option<&str> {
        self.outputs.get(key).map(String::as_str)
    }

    pub fn function_url(&self) -> Option<&str> {
        self.output(FUNCTION_URL_OUTPUT)
    }
}

/// Result of looking up an environment by name.
///
/// `NotFound` is an expected outcome for branches that were never provisioned or have been
/// torn down. `Failed` covers everything that prevented an answer.
#[derive(Debug)]
pub enum Lookup {
    Found(DeploymentRecord),
    NotFound,
    Failed(RegistryError),
}

impl Lookup {
    /// Stable label used for metric tags.
    pub fn outcome(&self) -> &'static str {
        match self {
            Lookup::Found(_) => "found",
            Lookup::NotFound => "not_found",
            Lookup::Failed(_) => "failed",
        }
    }
}

impl From<Result<Option<DeploymentRecord>, RegistryError>> for Lookup {
    fn from(result: Result<Option<DeploymentRecord>, RegistryError>) -> Self {
        match result {
            Ok(Some(record)) => Lookup::Found(record),
            Ok(None) => Lookup::NotFound,
            Err(e) => Lookup::Failed(e),
        }
    }
}
