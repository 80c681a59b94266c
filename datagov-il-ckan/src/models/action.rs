use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// HTTP verb used to reach a CKAN action
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpMethod::Get => f.write_str("GET"),
            HttpMethod::Post => f.write_str("POST"),
        }
    }
}

/// One call against the CKAN action endpoint: `{base}/action/{name}`.
///
/// GET parameters are sent as a query string, POST parameters as a JSON body.
#[derive(Clone, Debug, PartialEq)]
pub struct CatalogAction {
    name: String,
    method: HttpMethod,
    params: Map<String, Value>,
}

impl CatalogAction {
    /// A GET action without parameters
    pub fn get(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            method: HttpMethod::Get,
            params: Map::new(),
        }
    }

    /// A POST action without parameters
    pub fn post(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            method: HttpMethod::Post,
            params: Map::new(),
        }
    }

    /// Add a parameter
    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Replace all parameters at once
    pub fn with_params(mut self, params: Map<String, Value>) -> Self {
        self.params = params;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn params(&self) -> &Map<String, Value> {
        &self.params
    }

    /// Parameters rendered as query-string pairs.
    ///
    /// Strings are sent verbatim, booleans as `true`/`false`, and nulls are
    /// dropped.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.params
            .iter()
            .filter_map(|(key, value)| {
                let rendered = match value {
                    Value::Null => return None,
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                Some((key.clone(), rendered))
            })
            .collect()
    }
}
