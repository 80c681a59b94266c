use std::future::Future;

use datagov_il::error::require;
use datagov_il::{ChartRequest, DataGovClient, DataGovError, DataGovIlConfig};
use datagov_il_ckan::models::{DatastoreSearchParams, PackageSearchParams, ResourceSearchParams};
use datagov_il_ckan::{CatalogResponse, GatewayError};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Value, json};
use thiserror::Error;
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};

use crate::tools::{Tool, tool_descriptors, tool_names};

const SERVER_NAME: &str = "datagov-il-mcp-server";
const PROTOCOL_VERSION: &str = "2024-11-05";

const PROTOCOL_METHODS: &[&str] = &[
    "initialize",
    "initialized",
    "shutdown",
    "tools/list",
    "tools/call",
];

pub struct DataGovIlMcpServer {
    client: DataGovClient,
}

impl DataGovIlMcpServer {
    pub async fn bootstrap() -> Result<(), ServerError> {
        let config = DataGovIlConfig::from_env()?;
        tracing::info!(
            base_url = %config.ckan_config.base_path,
            max_retries = config.ckan_config.retry.max_retries,
            "configured data.gov.il client"
        );
        Self::new(config).run().await
    }

    pub fn new(config: DataGovIlConfig) -> Self {
        Self::with_client(DataGovClient::with_config(config))
    }

    pub fn with_client(client: DataGovClient) -> Self {
        Self { client }
    }

    async fn run(&self) -> Result<(), ServerError> {
        let reader = BufReader::new(io::stdin());
        let writer = BufWriter::new(io::stdout());
        self.serve(reader, writer).await
    }

    /// Answer newline-delimited JSON-RPC requests until the reader closes
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> Result<(), ServerError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        self.send_ready(&mut writer).await?;

        let mut lines = reader.lines();

        while let Some(line) = lines.next_line().await? {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let response = self.handle_line(trimmed).await;
            write_line(&mut writer, &response).await?;
        }

        if self.client.shutdown() {
            tracing::info!("input closed, released HTTP client");
        }
        Ok(())
    }

    async fn send_ready<W>(&self, writer: &mut W) -> Result<(), ServerError>
    where
        W: AsyncWrite + Unpin,
    {
        let mut methods: Vec<&str> = PROTOCOL_METHODS.to_vec();
        methods.extend(tool_names());

        let ready = json!({
            "jsonrpc": "2.0",
            "id": null,
            "result": {
                "server": SERVER_NAME,
                "version": env!("CARGO_PKG_VERSION"),
                "methods": methods,
            }
        });

        write_line(writer, &ready).await?;
        tracing::info!("data.gov.il MCP server ready");
        Ok(())
    }

    async fn handle_line(&self, line: &str) -> Response {
        let value = match serde_json::from_str::<Value>(line) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!("unparsable request: {err}");
                return Response::error(None, ServerError::Json(err));
            }
        };

        let request = match serde_json::from_value::<Request>(value) {
            Ok(request) => request,
            Err(err) => {
                tracing::warn!("invalid request: {err}");
                return Response::error(None, ServerError::InvalidRequest(err.to_string()));
            }
        };

        match self.dispatch(&request.method, request.params).await {
            Ok(result) => Response::success(request.id, result),
            Err(err) => Response::error(request.id, err),
        }
    }

    async fn dispatch(&self, method: &str, params: Option<Value>) -> ServerResult<Value> {
        match method {
            "initialize" => {
                let params: InitializeParams = parse_optional_params(method, params)?;
                let result = InitializeResult::new(params);
                serde_json::to_value(result).map_err(ServerError::Serialization)
            }
            "initialized" => Ok(Value::Null),
            "shutdown" => {
                self.client.shutdown();
                tracing::info!("shutdown requested");
                Ok(Value::Null)
            }
            "tools/list" => {
                parse_optional_params::<ListToolsParams>(method, params)?;
                let result = ListToolsResult {
                    tools: tool_descriptors(),
                    next_cursor: None,
                };
                serde_json::to_value(result).map_err(ServerError::Serialization)
            }
            "tools/call" => {
                let params: CallToolParams = parse_required_params(method, params)?;
                let tool = Tool::from_name(&params.name)
                    .ok_or_else(|| ServerError::InvalidMethod(params.name.clone()))?;
                self.call_tool(tool, params.arguments).await
            }
            other => match Tool::from_name(other) {
                Some(tool) => self.call_tool(tool, params).await,
                None => Err(ServerError::InvalidMethod(other.to_string())),
            },
        }
    }

    async fn call_tool(&self, tool: Tool, arguments: Option<Value>) -> ServerResult<Value> {
        tracing::info!(tool = tool.name(), "tool invoked");

        let response = if tool.reports_errors_inline() {
            match self
                .client
                .with_deadline(self.invoke_data_tool(tool, arguments))
                .await
            {
                Ok(value) => ToolResponse::from_value(value),
                Err(err) => {
                    tracing::error!(tool = tool.name(), error = %err, "tool failed");
                    ToolResponse::inline_error(err.to_string())
                }
            }
        } else {
            match self.invoke_catalog_tool(tool, arguments).await {
                Ok(response) => {
                    let value = serde_json::to_value(response).map_err(ServerError::Serialization)?;
                    ToolResponse::from_value(value)
                }
                Err(err) => {
                    tracing::error!(tool = tool.name(), error = %err, "tool failed");
                    return Err(err);
                }
            }
        };

        serde_json::to_value(response).map_err(ServerError::Serialization)
    }

    /// Plain catalog actions; failures become JSON-RPC faults
    async fn invoke_catalog_tool(
        &self,
        tool: Tool,
        arguments: Option<Value>,
    ) -> ServerResult<CatalogResponse> {
        let ckan = self.client.ckan();
        let method = tool.name();

        match tool {
            Tool::StatusShow => self.bounded(ckan.status_show()).await,
            Tool::LicenseList => self.bounded(ckan.license_list()).await,
            Tool::PackageList => self.bounded(ckan.package_list()).await,
            Tool::OrganizationList => self.bounded(ckan.organization_list()).await,
            Tool::PackageSearch => {
                let params: PackageSearchParams = parse_optional_params(method, arguments)?;
                self.bounded(ckan.package_search(&params)).await
            }
            Tool::PackageShow => {
                let params: IdParams = parse_required_params(method, arguments)?;
                let id = require("id", &params.id)?;
                self.bounded(ckan.package_show(id)).await
            }
            Tool::OrganizationShow => {
                let params: IdParams = parse_required_params(method, arguments)?;
                let id = require("id", &params.id)?;
                self.bounded(ckan.organization_show(id)).await
            }
            Tool::ResourceSearch => {
                let params: ResourceSearchParams = parse_optional_params(method, arguments)?;
                self.bounded(ckan.resource_search(&params)).await
            }
            Tool::DatastoreSearch => {
                let mut params: DatastoreSearchParams = parse_required_params(method, arguments)?;
                params.resource_id = require("resource_id", &params.resource_id)?.to_string();
                self.bounded(ckan.datastore_search(&params)).await
            }
            Tool::FetchData | Tool::DatasetProfile | Tool::ChartGenerator | Tool::MapGenerator => {
                Err(ServerError::InvalidMethod(method.to_string()))
            }
        }
    }

    /// Composite, profiling and visualization tools; every failure is
    /// reported to the caller as an `{"error": ...}` payload
    async fn invoke_data_tool(&self, tool: Tool, arguments: Option<Value>) -> Result<Value, DataGovError> {
        let value = match tool {
            Tool::FetchData => {
                let args: FetchDataArgs = tool_arguments(tool, arguments)?;
                let fetched = self
                    .client
                    .fetch_data(&args.dataset_name, args.limit, args.offset)
                    .await?;
                serde_json::to_value(fetched)?
            }
            Tool::DatasetProfile => {
                let args: DatasetProfileArgs = tool_arguments(tool, arguments)?;
                let profile = self
                    .client
                    .dataset_profile(&args.resource_id, args.sample_size)
                    .await?;
                serde_json::to_value(profile)?
            }
            Tool::ChartGenerator => {
                let args: ChartArgs = tool_arguments(tool, arguments)?;
                let request = ChartRequest {
                    resource_id: &args.resource_id,
                    chart_type: &args.chart_type,
                    x_field: &args.x_field,
                    y_field: Some(args.y_field.as_str()).filter(|y| !y.trim().is_empty()),
                    title: Some(args.title.as_str()),
                    limit: args.limit,
                };
                let chart = self.client.chart_generator(&request).await?;
                serde_json::to_value(chart)?
            }
            Tool::MapGenerator => {
                let args: MapArgs = tool_arguments(tool, arguments)?;
                let map = self
                    .client
                    .map_generator(&args.resource_id, &args.lat_field, &args.lon_field, args.limit)
                    .await?;
                serde_json::to_value(map)?
            }
            other => {
                return Err(DataGovError::validation_error(format!(
                    "{} does not report errors inline",
                    other.name()
                )));
            }
        };
        Ok(value)
    }

    async fn bounded<F>(&self, call: F) -> ServerResult<CatalogResponse>
    where
        F: Future<Output = Result<CatalogResponse, GatewayError>>,
    {
        let response = self
            .client
            .with_deadline(async { call.await.map_err(DataGovError::from) })
            .await?;
        Ok(response)
    }
}

async fn write_line<W, T>(writer: &mut W, message: &T) -> Result<(), ServerError>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let payload = serde_json::to_string(message).map_err(ServerError::Serialization)?;
    writer.write_all(payload.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}

#[derive(Debug, Deserialize)]
struct Request {
    #[serde(default)]
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Option<Value>,
}

#[derive(Debug, Serialize)]
struct Response {
    jsonrpc: &'static str,
    id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ResponseError>,
}

impl Response {
    fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    fn error(id: Option<Value>, error: ServerError) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(ResponseError::from(error)),
        }
    }
}

#[derive(Debug, Serialize)]
struct ResponseError {
    code: i32,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl From<ServerError> for ResponseError {
    fn from(err: ServerError) -> Self {
        let (code, data) = match &err {
            ServerError::InvalidRequest(_) => (-32600, None),
            ServerError::InvalidMethod(_) => (-32601, None),
            ServerError::InvalidParams(_) => (-32602, None),
            ServerError::Json(_) => (-32700, None),
            ServerError::Io(_) => (-32020, None),
            ServerError::DataGov(_) => (-32010, None),
            ServerError::Ckan(gateway) => (
                -32011,
                gateway.status_code().map(|status| json!({ "status": status })),
            ),
            ServerError::Serialization(_) => (-32603, None),
        };

        let message = match err {
            ServerError::InvalidRequest(message) | ServerError::InvalidParams(message) => message,
            ServerError::InvalidMethod(method) => format!("Unknown method: {method}"),
            other => other.to_string(),
        };

        Self {
            code,
            message,
            data,
        }
    }
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("unknown method: {0}")]
    InvalidMethod(String),
    #[error("invalid parameters: {0}")]
    InvalidParams(String),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    DataGov(DataGovError),
    #[error(transparent)]
    Ckan(#[from] GatewayError),
    #[error("serialization error: {0}")]
    Serialization(serde_json::Error),
}

impl From<DataGovError> for ServerError {
    fn from(err: DataGovError) -> Self {
        match err {
            DataGovError::Gateway(gateway) => ServerError::Ckan(gateway),
            DataGovError::ValidationError { message } => ServerError::InvalidParams(message),
            other => ServerError::DataGov(other),
        }
    }
}

type ServerResult<T> = Result<T, ServerError>;

fn parse_required_params<T>(method: &str, params: Option<Value>) -> ServerResult<T>
where
    T: DeserializeOwned,
{
    match params {
        Some(value) => serde_json::from_value(value)
            .map_err(|err| ServerError::InvalidParams(format!("{method}: {err}"))),
        None => Err(ServerError::InvalidParams(format!(
            "{method}: missing parameters"
        ))),
    }
}

fn parse_optional_params<T>(method: &str, params: Option<Value>) -> ServerResult<T>
where
    T: DeserializeOwned + Default,
{
    match params {
        Some(Value::Null) | None => Ok(T::default()),
        Some(value) => serde_json::from_value(value)
            .map_err(|err| ServerError::InvalidParams(format!("{method}: {err}"))),
    }
}

/// Arguments of an inline-error tool; absent arguments mean all defaults and
/// blank required fields are caught by the client
fn tool_arguments<T>(tool: Tool, arguments: Option<Value>) -> Result<T, DataGovError>
where
    T: DeserializeOwned,
{
    let arguments = arguments.unwrap_or_else(|| json!({}));
    serde_json::from_value(arguments)
        .map_err(|err| DataGovError::validation_error(format!("{}: {}", tool.name(), err)))
}

#[derive(Debug, Deserialize)]
struct IdParams {
    id: String,
}

fn default_rows() -> u32 {
    100
}

fn default_map_limit() -> u32 {
    500
}

#[derive(Debug, Deserialize)]
struct FetchDataArgs {
    #[serde(default)]
    dataset_name: String,
    #[serde(default = "default_rows")]
    limit: u32,
    #[serde(default)]
    offset: u32,
}

#[derive(Debug, Deserialize)]
struct DatasetProfileArgs {
    #[serde(default)]
    resource_id: String,
    #[serde(default = "default_rows")]
    sample_size: u32,
}

#[derive(Debug, Deserialize)]
struct ChartArgs {
    #[serde(default)]
    resource_id: String,
    #[serde(default)]
    chart_type: String,
    #[serde(default)]
    x_field: String,
    #[serde(default)]
    y_field: String,
    #[serde(default)]
    title: String,
    #[serde(default = "default_rows")]
    limit: u32,
}

#[derive(Debug, Deserialize)]
struct MapArgs {
    #[serde(default)]
    resource_id: String,
    #[serde(default)]
    lat_field: String,
    #[serde(default)]
    lon_field: String,
    #[serde(default = "default_map_limit")]
    limit: u32,
}

#[derive(Debug, Default, Deserialize)]
struct InitializeParams {
    #[serde(default, rename = "protocolVersion")]
    protocol_version: Option<String>,
    #[serde(default, rename = "clientInfo")]
    client_info: Option<ClientInfo>,
}

#[derive(Debug, Deserialize)]
struct ClientInfo {
    name: String,
    #[serde(default)]
    version: Option<String>,
}

#[derive(Debug, Serialize)]
struct InitializeResult {
    #[serde(rename = "protocolVersion")]
    protocol_version: String,
    #[serde(rename = "serverInfo")]
    server_info: ServerInfo,
    capabilities: Value,
    #[serde(skip_serializing_if = "Option::is_none", rename = "clientInfo")]
    client_info: Option<ClientInfoSummary>,
}

impl InitializeResult {
    fn new(params: InitializeParams) -> Self {
        if let Some(info) = &params.client_info {
            tracing::info!(client = %info.name, "client initialized");
        }

        let client_info = params.client_info.map(|info| ClientInfoSummary {
            name: info.name,
            version: info.version,
        });

        Self {
            protocol_version: params
                .protocol_version
                .unwrap_or_else(|| PROTOCOL_VERSION.to_string()),
            server_info: ServerInfo {
                name: SERVER_NAME,
                version: env!("CARGO_PKG_VERSION"),
            },
            capabilities: json!({
                "tools": {
                    "listChanged": false
                }
            }),
            client_info,
        }
    }
}

#[derive(Debug, Serialize)]
struct ServerInfo {
    name: &'static str,
    version: &'static str,
}

#[derive(Debug, Serialize)]
struct ClientInfoSummary {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
}

/// The whole list fits one page, so any cursor is ignored
#[derive(Debug, Default, Deserialize)]
struct ListToolsParams {}

#[derive(Debug, Deserialize)]
struct CallToolParams {
    name: String,
    #[serde(default)]
    arguments: Option<Value>,
}

#[derive(Debug, Serialize)]
struct ListToolsResult {
    tools: Vec<crate::tools::ToolDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "nextCursor")]
    next_cursor: Option<String>,
}

#[derive(Debug, Serialize)]
struct ToolResponse {
    content: Vec<ToolContent>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "isError")]
    is_error: Option<bool>,
}

impl ToolResponse {
    fn from_value(value: Value) -> Self {
        let text = serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string());
        Self {
            content: vec![
                ToolContent::Text { text },
                ToolContent::Json { json: value },
            ],
            is_error: None,
        }
    }

    fn inline_error(message: String) -> Self {
        Self {
            is_error: Some(true),
            ..Self::from_value(json!({ "error": message }))
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum ToolContent {
    #[serde(rename = "json")]
    Json { json: Value },
    #[serde(rename = "text")]
    Text { text: String },
}
