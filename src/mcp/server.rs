//! MCP server implementation for Custom Elements Manifest queries.
//!
//! This module implements the MCP server lifecycle:
//!
//! 1. **Initialisation**: Capability negotiation and version agreement
//! 2. **Operation**: Handling tool calls and other requests
//! 3. **Shutdown**: Graceful connection termination
//!
//! # Architecture
//!
//! The server exposes the workspace's web-component metadata as tools. All
//! heavy lifting (discovery, caching, invalidation) lives in [`crate::cem`];
//! this layer only translates between JSON-RPC and those queries.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::cem::manifest::shape_component;
use crate::cem::{
    ComponentDetail, LocateOptions, ManifestLocationProvider, ManifestsProvider, MatchMode,
};
use crate::config::Settings;
use crate::mcp::protocol::{
    ErrorCode, IncomingMessage, JsonRpcError, JsonRpcErrorData, JsonRpcNotification,
    JsonRpcRequest, JsonRpcResponse, RequestId, MCP_PROTOCOL_VERSION, SERVER_NAME,
};
use crate::mcp::transport::StdioTransport;

/// Server state in the MCP lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    /// Waiting for initialize request.
    AwaitingInit,
    /// Initialize received, waiting for initialized notification.
    Initialising,
    /// Ready for normal operation.
    Running,
    /// Shutdown in progress.
    ShuttingDown,
}

/// Server capabilities advertised during initialisation.
#[derive(Debug, Clone, Serialize)]
pub struct ServerCapabilities {
    /// Tool-related capabilities.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<ToolCapabilities>,
}

impl Default for ServerCapabilities {
    fn default() -> Self {
        Self {
            tools: Some(ToolCapabilities::default()),
        }
    }
}

/// Tool-specific capabilities.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ToolCapabilities {
    /// Whether the tool list can change during the session.
    #[serde(rename = "listChanged", skip_serializing_if = "is_false")]
    pub list_changed: bool,
}

#[allow(clippy::trivially_copy_pass_by_ref)] // serde's skip_serializing_if requires a predicate fn(&T) -> bool, so we must take &bool here
const fn is_false(b: &bool) -> bool {
    !*b
}

/// Server information for initialisation response.
#[derive(Debug, Clone, Serialize)]
pub struct ServerInfo {
    /// Server name.
    pub name: String,
    /// Server version.
    pub version: String,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            name: SERVER_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Client information received during initialisation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInfo {
    /// Client name.
    pub name: String,
    /// Client version.
    #[serde(default)]
    pub version: Option<String>,
}

/// Parameters for the initialize request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    /// Protocol version requested by client.
    pub protocol_version: String,
    /// Client capabilities.
    #[serde(default)]
    pub capabilities: Value,
    /// Client information.
    #[serde(default)]
    pub client_info: Option<ClientInfo>,
}

/// A tool definition for tools/list response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    /// Unique tool name.
    pub name: String,
    /// Human-readable description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON Schema for the tool's input parameters.
    pub input_schema: Value,
}

/// Parameters for tools/call request.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCallParams {
    /// Name of the tool to call.
    pub name: String,
    /// Arguments for the tool.
    #[serde(default)]
    pub arguments: Value,
}

/// Content item in a tool call response.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    /// Text content.
    Text {
        /// The text content.
        text: String,
    },
}

/// Result of a tool call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallResult {
    /// Content returned by the tool.
    pub content: Vec<ToolContent>,
    /// Whether the tool call resulted in an error.
    #[serde(skip_serializing_if = "is_false")]
    pub is_error: bool,
}

impl ToolCallResult {
    /// Creates a successful text result.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
            is_error: false,
        }
    }

    /// Creates a successful result carrying pretty-printed JSON.
    #[must_use]
    pub fn json(value: &impl Serialize) -> Self {
        match serde_json::to_string_pretty(value) {
            Ok(text) => Self::text(text),
            Err(e) => Self::error(format!("Failed to serialise result: {e}")),
        }
    }

    /// Creates an error text result.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text {
                text: message.into(),
            }],
            is_error: true,
        }
    }
}

/// Arguments for the `search_components` tool.
#[derive(Debug, Deserialize)]
struct SearchArgs {
    query: String,
    #[serde(default)]
    match_mode: MatchMode,
    #[serde(default)]
    detail: Option<String>,
}

/// Arguments for the `get_component_details` tool.
#[derive(Debug, Deserialize)]
struct ComponentDetailsArgs {
    #[serde(default)]
    tag_name: Option<String>,
    #[serde(default)]
    class_name: Option<String>,
    #[serde(default)]
    detail: Option<String>,
}

/// Arguments for the `list_all_components` tool.
#[derive(Debug, Deserialize)]
struct ListComponentsArgs {
    #[serde(default)]
    detail: Option<String>,
}

/// Arguments for the `locate_manifests` tool.
#[derive(Debug, Default, Deserialize)]
struct LocateArgs {
    #[serde(default)]
    force: bool,
}

/// Arguments for the exclusion toggle tools.
#[derive(Debug, Deserialize)]
struct ManifestLocationArgs {
    location: String,
}

/// The MCP server for Custom Elements Manifest queries.
pub struct McpServer {
    /// Current server state.
    state: ServerState,
    /// The transport layer.
    transport: StdioTransport,
    /// Negotiated protocol version (set after initialisation).
    protocol_version: Option<String>,
    /// Workspace manifest locator.
    locator: Arc<ManifestLocationProvider>,
    /// Aggregate component query engine.
    provider: Arc<ManifestsProvider>,
    /// Runtime settings (exclusions).
    settings: Arc<Settings>,
}

impl McpServer {
    /// Creates a new MCP server over the given discovery and query layers.
    #[must_use]
    pub fn new(
        locator: Arc<ManifestLocationProvider>,
        provider: Arc<ManifestsProvider>,
        settings: Arc<Settings>,
    ) -> Self {
        Self {
            state: ServerState::AwaitingInit,
            transport: StdioTransport::new(),
            protocol_version: None,
            locator,
            provider,
            settings,
        }
    }

    /// Returns the current server state.
    #[must_use]
    pub const fn state(&self) -> ServerState {
        self.state
    }

    /// Runs the MCP server main loop with graceful shutdown handling.
    ///
    /// # Errors
    ///
    /// Returns an error if transport I/O fails.
    pub async fn run(&mut self) -> std::io::Result<()> {
        self.run_with_shutdown().await
    }

    /// Runs the main loop and handles shutdown.
    #[cfg(unix)]
    async fn run_with_shutdown(&mut self) -> std::io::Result<()> {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt()).map_err(std::io::Error::other)?;
        let mut sigterm = signal(SignalKind::terminate()).map_err(std::io::Error::other)?;

        loop {
            tokio::select! {
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT, initiating graceful shutdown");
                    self.state = ServerState::ShuttingDown;
                    return Ok(());
                }

                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM, initiating graceful shutdown");
                    self.state = ServerState::ShuttingDown;
                    return Ok(());
                }

                line_result = self.transport.read_line() => {
                    if self.handle_transport_result(line_result).await? {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Runs the main loop and handles shutdown.
    #[cfg(windows)]
    async fn run_with_shutdown(&mut self) -> std::io::Result<()> {
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                _ = &mut ctrl_c => {
                    tracing::info!("Received Ctrl+C, initiating graceful shutdown");
                    self.state = ServerState::ShuttingDown;
                    return Ok(());
                }

                line_result = self.transport.read_line() => {
                    if self.handle_transport_result(line_result).await? {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Handles the result from transport read.
    ///
    /// Returns `true` if the server should shut down.
    async fn handle_transport_result(
        &mut self,
        line_result: std::io::Result<Option<String>>,
    ) -> std::io::Result<bool> {
        let Some(line) = line_result? else {
            self.state = ServerState::ShuttingDown;
            return Ok(true);
        };

        if line.trim().is_empty() {
            return Ok(false);
        }

        self.handle_line(&line).await?;

        if self.state == ServerState::ShuttingDown {
            return Ok(true);
        }

        Ok(false)
    }

    /// Handles a single line of input.
    async fn handle_line(&mut self, line: &str) -> std::io::Result<()> {
        use crate::mcp::protocol::parse_message;

        match parse_message(line) {
            Ok(msg) => self.handle_message(msg).await,
            Err(error) => {
                self.transport.write_error(&error).await?;
                Ok(())
            }
        }
    }

    /// Handles a parsed incoming message.
    async fn handle_message(&mut self, msg: IncomingMessage) -> std::io::Result<()> {
        match msg {
            IncomingMessage::Request(req) => self.handle_request(req).await,
            IncomingMessage::Notification(ref notif) => {
                self.handle_notification(notif);
                Ok(())
            }
        }
    }

    /// Handles an incoming request.
    async fn handle_request(&mut self, req: JsonRpcRequest) -> std::io::Result<()> {
        let response = match req.method.as_str() {
            "initialize" => self.handle_initialize(&req),
            "tools/list" => self.handle_tools_list(&req),
            "tools/call" => self.handle_tools_call(&req).await,
            "ping" => Ok(Self::handle_ping(&req)),
            _ => Err(JsonRpcError::method_not_found(req.id.clone(), &req.method)),
        };

        match response {
            Ok(resp) => self.transport.write_response(&resp).await,
            Err(error) => self.transport.write_error(&error).await,
        }
    }

    /// Handles an incoming notification.
    fn handle_notification(&mut self, notif: &JsonRpcNotification) {
        if notif.method == "notifications/initialized" && self.state == ServerState::Initialising {
            self.state = ServerState::Running;
        }
    }

    /// Handles the initialize request.
    fn handle_initialize(&mut self, req: &JsonRpcRequest) -> Result<JsonRpcResponse, JsonRpcError> {
        if self.state != ServerState::AwaitingInit {
            return Err(JsonRpcError::new(
                Some(req.id.clone()),
                JsonRpcErrorData::with_message(
                    ErrorCode::InvalidRequest,
                    "Server already initialised",
                ),
            ));
        }

        let _params: InitializeParams = req
            .params
            .as_ref()
            .map(|p| serde_json::from_value(p.clone()))
            .transpose()
            .map_err(|e| {
                JsonRpcError::invalid_params(
                    req.id.clone(),
                    format!("Invalid initialize params: {e}"),
                )
            })?
            .ok_or_else(|| {
                JsonRpcError::invalid_params(req.id.clone(), "Missing initialize params")
            })?;

        let negotiated_version = MCP_PROTOCOL_VERSION.to_string();

        self.protocol_version = Some(negotiated_version.clone());
        self.state = ServerState::Initialising;

        let result = json!({
            "protocolVersion": negotiated_version,
            "capabilities": ServerCapabilities::default(),
            "serverInfo": ServerInfo::default(),
        });

        Ok(JsonRpcResponse::success(req.id.clone(), result))
    }

    /// Handles the tools/list request.
    fn handle_tools_list(&self, req: &JsonRpcRequest) -> Result<JsonRpcResponse, JsonRpcError> {
        self.require_running(&req.id)?;

        let tools = Self::get_tool_definitions();

        let result = json!({
            "tools": tools,
        });

        Ok(JsonRpcResponse::success(req.id.clone(), result))
    }

    /// Handles the tools/call request.
    async fn handle_tools_call(
        &mut self,
        req: &JsonRpcRequest,
    ) -> Result<JsonRpcResponse, JsonRpcError> {
        self.require_running(&req.id)?;

        let params: ToolCallParams = req
            .params
            .as_ref()
            .map(|p| serde_json::from_value(p.clone()))
            .transpose()
            .map_err(|e| {
                JsonRpcError::invalid_params(
                    req.id.clone(),
                    format!("Invalid tool call params: {e}"),
                )
            })?
            .ok_or_else(|| {
                JsonRpcError::invalid_params(req.id.clone(), "Missing tool call params")
            })?;

        let result = match params.name.as_str() {
            // Component queries
            "search_components" => self.call_search_components(&params.arguments).await,
            "get_component_details" => self.call_get_component_details(&params.arguments).await,
            "list_all_components" => self.call_list_all_components(&params.arguments).await,
            // Manifest discovery and management
            "list_manifests" => self.call_list_manifests().await,
            "locate_manifests" => self.call_locate_manifests(&params.arguments).await,
            "exclude_manifest" => self.call_exclude_manifest(&params.arguments),
            "include_manifest" => self.call_include_manifest(&params.arguments),
            "cache_stats" => self.call_cache_stats().await,
            // Unknown tool
            _ => ToolCallResult::error(format!("Unknown tool: {}", params.name)),
        };

        let result_value = serde_json::to_value(&result).map_err(|e| {
            tracing::error!(error = %e, "Failed to serialise tool call result");
            JsonRpcError::new(
                Some(req.id.clone()),
                JsonRpcErrorData::with_message(
                    ErrorCode::InternalError,
                    "Internal error: failed to serialise result",
                ),
            )
        })?;

        Ok(JsonRpcResponse::success(req.id.clone(), result_value))
    }

    /// Handles the ping request.
    fn handle_ping(req: &JsonRpcRequest) -> JsonRpcResponse {
        JsonRpcResponse::success(req.id.clone(), json!({}))
    }

    /// Ensures the server is in the Running state.
    fn require_running(&self, id: &RequestId) -> Result<(), JsonRpcError> {
        if self.state != ServerState::Running {
            return Err(JsonRpcError::new(
                Some(id.clone()),
                JsonRpcErrorData::with_message(ErrorCode::InvalidRequest, "Server not initialised"),
            ));
        }
        Ok(())
    }

    /// Searches components by name, tag name and description.
    async fn call_search_components(&self, arguments: &Value) -> ToolCallResult {
        let args: SearchArgs = match serde_json::from_value(arguments.clone()) {
            Ok(args) => args,
            Err(e) => return ToolCallResult::error(format!("Invalid arguments: {e}")),
        };

        let detail = match parse_detail(args.detail.as_deref()) {
            Ok(detail) => detail,
            Err(message) => return ToolCallResult::error(message),
        };

        let results = self
            .provider
            .search_components(&args.query, args.match_mode)
            .await;
        let shaped: Vec<_> = results
            .iter()
            .map(|component| shape_component(component, detail))
            .collect();

        ToolCallResult::json(&json!({
            "query": args.query,
            "matchMode": args.match_mode,
            "count": shaped.len(),
            "components": shaped,
        }))
    }

    /// Fetches one component by tag name or class name.
    async fn call_get_component_details(&self, arguments: &Value) -> ToolCallResult {
        let args: ComponentDetailsArgs = match serde_json::from_value(arguments.clone()) {
            Ok(args) => args,
            Err(e) => return ToolCallResult::error(format!("Invalid arguments: {e}")),
        };

        let detail = match parse_detail(args.detail.as_deref()) {
            Ok(detail) => detail,
            Err(message) => return ToolCallResult::error(message),
        };

        let component = match (args.tag_name.as_deref(), args.class_name.as_deref()) {
            (Some(tag), _) => self.provider.get_component_by_tag_name(tag).await,
            (None, Some(class_name)) => {
                self.provider.get_component_by_class_name(class_name).await
            }
            (None, None) => {
                return ToolCallResult::error(
                    "Either tag_name or class_name must be provided",
                )
            }
        };

        match component {
            Some(component) => ToolCallResult::json(&shape_component(&component, detail)),
            None => {
                let wanted = args
                    .tag_name
                    .or(args.class_name)
                    .unwrap_or_default();
                ToolCallResult::error(format!("Component not found: {wanted}"))
            }
        }
    }

    /// Lists every component across all manifests.
    async fn call_list_all_components(&self, arguments: &Value) -> ToolCallResult {
        let args: ListComponentsArgs = match serde_json::from_value(arguments.clone()) {
            Ok(args) => args,
            Err(e) => return ToolCallResult::error(format!("Invalid arguments: {e}")),
        };

        // Listings default to the compact shape.
        let detail = match args.detail.as_deref() {
            None => ComponentDetail::Basic,
            Some(value) => match value.parse() {
                Ok(detail) => detail,
                Err(message) => return ToolCallResult::error(message),
            },
        };

        let components = self.provider.get_all_components().await;
        let shaped: Vec<_> = components
            .iter()
            .map(|component| shape_component(component, detail))
            .collect();

        ToolCallResult::json(&json!({
            "count": shaped.len(),
            "components": shaped,
        }))
    }

    /// Lists the currently known manifest locations with their provenance.
    async fn call_list_manifests(&self) -> ToolCallResult {
        let locations = self.locator.get_manifests().await;
        let sources = self.locator.all_manifest_sources().await;
        let excluded = self.settings.excluded_manifests();

        let manifests: Vec<Value> = locations
            .iter()
            .map(|location| {
                let key = location.to_string();
                let origins: Vec<Value> = sources
                    .get(&key)
                    .map(|entries| {
                        entries
                            .iter()
                            .map(|source| {
                                json!({
                                    "isLocal": source.is_local,
                                    "packageDescriptor": source.package_descriptor,
                                    "dependencyName": source.dependency_name,
                                })
                            })
                            .collect()
                    })
                    .unwrap_or_default();

                json!({
                    "location": location,
                    "excluded": excluded.contains(&key),
                    "sources": origins,
                })
            })
            .collect();

        ToolCallResult::json(&json!({
            "count": manifests.len(),
            "etag": self.locator.etag(),
            "manifests": manifests,
        }))
    }

    /// Re-runs manifest discovery, optionally forcing a filesystem re-walk.
    async fn call_locate_manifests(&self, arguments: &Value) -> ToolCallResult {
        let args: LocateArgs = if arguments.is_null() {
            LocateArgs::default()
        } else {
            match serde_json::from_value(arguments.clone()) {
                Ok(args) => args,
                Err(e) => return ToolCallResult::error(format!("Invalid arguments: {e}")),
            }
        };

        let etag_before = self.locator.etag();
        let locations = self
            .locator
            .locate(LocateOptions {
                force: args.force,
                ..LocateOptions::default()
            })
            .await;
        let etag_after = self.locator.etag();

        ToolCallResult::json(&json!({
            "count": locations.len(),
            "changed": etag_before != etag_after,
            "etag": etag_after,
            "manifests": locations,
        }))
    }

    /// Excludes a manifest from the aggregate view.
    fn call_exclude_manifest(&self, arguments: &Value) -> ToolCallResult {
        let args: ManifestLocationArgs = match serde_json::from_value(arguments.clone()) {
            Ok(args) => args,
            Err(e) => return ToolCallResult::error(format!("Invalid arguments: {e}")),
        };

        self.settings.exclude_manifest(&args.location);
        ToolCallResult::json(&json!({
            "excluded": self.settings.excluded_manifests(),
        }))
    }

    /// Removes a manifest from the exclusion list.
    fn call_include_manifest(&self, arguments: &Value) -> ToolCallResult {
        let args: ManifestLocationArgs = match serde_json::from_value(arguments.clone()) {
            Ok(args) => args,
            Err(e) => return ToolCallResult::error(format!("Invalid arguments: {e}")),
        };

        self.settings.include_manifest(&args.location);
        ToolCallResult::json(&json!({
            "excluded": self.settings.excluded_manifests(),
        }))
    }

    /// Reports cache statistics for the whole reader pool.
    async fn call_cache_stats(&self) -> ToolCallResult {
        let stats = self.provider.cache_stats().await;
        ToolCallResult::json(&stats)
    }

    /// Returns the list of available tools.
    #[allow(clippy::too_many_lines)]
    fn get_tool_definitions() -> Vec<ToolDefinition> {
        let detail_schema = json!({
            "type": "string",
            "enum": ["basic", "public", "all"],
            "description": "How much of each component to include. \
                            'basic' is name/tag/class/description, 'public' adds \
                            the public API surface, 'all' is the full record."
        });

        vec![
            // === Component queries ===
            ToolDefinition {
                name: "search_components".to_string(),
                description: Some(
                    "Search web components across every Custom Elements Manifest in the \
                     workspace and its dependencies. Matches against component name, tag \
                     name and description. Multi-word queries can require every word \
                     ('all') or any word ('any', the default); 'strict' requires an exact \
                     field match."
                        .to_string(),
                ),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "query": {
                            "type": "string",
                            "description": "Search text"
                        },
                        "match_mode": {
                            "type": "string",
                            "enum": ["strict", "all", "any"],
                            "description": "Matching behaviour (default: any)"
                        },
                        "detail": detail_schema,
                    },
                    "required": ["query"]
                }),
            },
            ToolDefinition {
                name: "get_component_details".to_string(),
                description: Some(
                    "Fetch one component's metadata by its tag name (e.g. 'my-button') or \
                     implementing class name (e.g. 'MyButton'). When both are given, the \
                     tag name wins. Returns attributes, events and the public API at the \
                     requested detail level."
                        .to_string(),
                ),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "tag_name": {
                            "type": "string",
                            "description": "Custom element tag name"
                        },
                        "class_name": {
                            "type": "string",
                            "description": "Implementing class name"
                        },
                        "detail": detail_schema,
                    }
                }),
            },
            ToolDefinition {
                name: "list_all_components".to_string(),
                description: Some(
                    "List every web component across all known manifests. Defaults to the \
                     compact 'basic' shape; duplicate tag definitions from different \
                     manifests are all listed."
                        .to_string(),
                ),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "detail": detail_schema,
                    }
                }),
            },
            // === Manifest discovery and management ===
            ToolDefinition {
                name: "list_manifests".to_string(),
                description: Some(
                    "List the Custom Elements Manifest files currently known in the \
                     workspace, with the package descriptors that declared them and \
                     whether each is excluded from queries."
                        .to_string(),
                ),
                input_schema: json!({
                    "type": "object",
                    "properties": {}
                }),
            },
            ToolDefinition {
                name: "locate_manifests".to_string(),
                description: Some(
                    "Run manifest discovery. Without 'force' a cached result is returned; \
                     with 'force' the workspace is re-walked (package.json customElements \
                     entries plus direct dependencies, falling back to a file scan)."
                        .to_string(),
                ),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "force": {
                            "type": "boolean",
                            "description": "Re-walk the filesystem even if a cached result exists"
                        }
                    }
                }),
            },
            ToolDefinition {
                name: "exclude_manifest".to_string(),
                description: Some(
                    "Exclude a manifest (by the location string shown in list_manifests) \
                     from all component queries for the rest of the session."
                        .to_string(),
                ),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "location": {
                            "type": "string",
                            "description": "Manifest location to exclude"
                        }
                    },
                    "required": ["location"]
                }),
            },
            ToolDefinition {
                name: "include_manifest".to_string(),
                description: Some(
                    "Remove a manifest from the exclusion list so its components show up \
                     in queries again."
                        .to_string(),
                ),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "location": {
                            "type": "string",
                            "description": "Manifest location to include again"
                        }
                    },
                    "required": ["location"]
                }),
            },
            ToolDefinition {
                name: "cache_stats".to_string(),
                description: Some(
                    "Report cache statistics: the manifest change token and, per manifest, \
                     the component, tag, class and search cache sizes."
                        .to_string(),
                ),
                input_schema: json!({
                    "type": "object",
                    "properties": {}
                }),
            },
        ]
    }
}

/// Parses an optional detail argument, defaulting to `Public`.
fn parse_detail(detail: Option<&str>) -> Result<ComponentDetail, String> {
    match detail {
        None => Ok(ComponentDetail::default()),
        Some(value) => value.parse(),
    }
}
