use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::GatewayError;

/// The CKAN action envelope: `{"success": ..., "result": ..., "help": ...}`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogResponse {
    pub success: bool,
    #[serde(default)]
    pub result: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
}

impl CatalogResponse {
    /// Interpret a parsed 2xx body.
    ///
    /// A missing or false `success` flag is an application-level rejection.
    pub fn from_body(body: Value) -> Result<Self, GatewayError> {
        let success = body.get("success").and_then(Value::as_bool).unwrap_or(false);
        if !success {
            return Err(GatewayError::Application {
                message: flatten_error(body.get("error")),
            });
        }

        serde_json::from_value(body).map_err(GatewayError::unexpected)
    }

    /// Deserialize the `result` member into a typed model
    pub fn result_as<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.result)
    }
}

/// Reduce a CKAN `error` member to one message.
///
/// CKAN sends either a bare string or an object such as
/// `{"message": "Not found", "__type": "Not Found Error"}`; validation errors
/// carry per-field lists instead of a message and are stringified whole.
pub fn flatten_error(error: Option<&Value>) -> String {
    match error {
        None | Some(Value::Null) => "unknown error".to_string(),
        Some(Value::String(message)) => message.clone(),
        Some(Value::Object(fields)) => match fields.get("message") {
            Some(Value::String(message)) => message.clone(),
            Some(other) => other.to_string(),
            None => Value::Object(fields.clone()).to_string(),
        },
        Some(other) => other.to_string(),
    }
}
