//! MCP server bootstrap and request dispatch.

use std::{borrow::Cow, sync::Arc};

use crate::{
    mcp::{
        format::{SettingsSnapshot, json_resource_contents, serialize_json, usage_payload},
        registry::{self, ToolName},
    },
    service::{LanguageService, ToolApi},
};
use rmcp::{
    ErrorData as McpError,
    handler::server::ServerHandler,
    model::{
        AnnotateAble, CallToolRequestParam, CallToolResult, ListResourcesResult, ListToolsResult,
        RawResource, ReadResourceRequestParam, ReadResourceResult, Resource, ServerCapabilities,
        ServerInfo, Tool,
    },
};
use strum::IntoEnumIterator;

const SETTINGS_URI: &str = "mcp://settings";
const METRICS_URI: &str = "mcp://metrics";
const USAGE_URI: &str = "mcp://usage";

/// MCP server exposing the language tools.
#[derive(Clone)]
pub struct LanguageMcpServer {
    service: Arc<LanguageService>,
    registry: Arc<registry::Registry>,
}

impl LanguageMcpServer {
    /// Create a server exposing only `tools`.
    pub fn new(service: Arc<LanguageService>, tools: &[ToolName]) -> Self {
        let mut registry = registry::Registry::new();
        registry.register_resource(SETTINGS_URI, resource_settings);
        registry.register_resource(METRICS_URI, resource_metrics);
        registry.register_resource(USAGE_URI, resource_usage);
        for tool in tools {
            registry.register_tool(*tool);
        }
        tracing::debug!(tools = registry.tools.len(), "Registered MCP tools");

        Self {
            service,
            registry: Arc::new(registry),
        }
    }

    /// Create a server exposing every known tool.
    pub fn with_all_tools(service: Arc<LanguageService>) -> Self {
        let tools: Vec<ToolName> = ToolName::iter().collect();
        Self::new(service, &tools)
    }

    fn describe_tools(&self) -> Vec<Tool> {
        self.registry
            .tools
            .iter()
            .map(|tool| Tool {
                name: Cow::Borrowed(tool.as_str()),
                title: Some(tool.title().to_string()),
                description: Some(Cow::Borrowed(tool.description())),
                input_schema: Arc::new(tool.input_schema()),
                output_schema: None,
                annotations: Some(tool.annotations()),
                icons: None,
            })
            .collect()
    }

    fn describe_resources(&self) -> Vec<Resource> {
        let mut settings = RawResource::new(SETTINGS_URI, "settings");
        settings.description =
            Some("Effective endpoint, API version, job timeout, and enabled tools".into());
        settings.mime_type = Some(super::format::APPLICATION_JSON.into());

        let mut metrics = RawResource::new(METRICS_URI, "metrics");
        metrics.description = Some("Counters of submitted, finished, and polled jobs".into());
        metrics.mime_type = Some(super::format::APPLICATION_JSON.into());

        let mut usage = RawResource::new(USAGE_URI, "usage");
        usage.description = Some("How to call the tools and read their envelopes".into());
        usage.mime_type = Some(super::format::APPLICATION_JSON.into());

        vec![
            settings.no_annotation(),
            metrics.no_annotation(),
            usage.no_annotation(),
        ]
    }
}

fn resource_settings(
    server: &LanguageMcpServer,
    _request: ReadResourceRequestParam,
) -> registry::ResourceFuture {
    let payload = SettingsSnapshot::new(
        server.service.jobs().settings(),
        server.service.language().settings(),
        server.registry.tools.iter().copied(),
    );
    Box::pin(async move {
        Ok(ReadResourceResult {
            contents: vec![json_resource_contents(
                SETTINGS_URI,
                serialize_json(&payload, SETTINGS_URI),
            )],
        })
    })
}

fn resource_metrics(
    server: &LanguageMcpServer,
    _request: ReadResourceRequestParam,
) -> registry::ResourceFuture {
    let snapshot = server.service.metrics_snapshot();
    Box::pin(async move {
        Ok(ReadResourceResult {
            contents: vec![json_resource_contents(
                METRICS_URI,
                serialize_json(&snapshot, METRICS_URI),
            )],
        })
    })
}

fn resource_usage(
    _server: &LanguageMcpServer,
    _request: ReadResourceRequestParam,
) -> registry::ResourceFuture {
    Box::pin(async move {
        Ok(ReadResourceResult {
            contents: vec![json_resource_contents(
                USAGE_URI,
                serialize_json(&usage_payload(), USAGE_URI),
            )],
        })
    })
}

impl ServerHandler for LanguageMcpServer {
    fn get_info(&self) -> ServerInfo {
        let mut implementation = rmcp::model::Implementation::from_build_env();
        implementation.name = "language-mcp".to_string();
        implementation.title = Some("Language MCP".to_string());
        implementation.version = env!("CARGO_PKG_VERSION").to_string();

        ServerInfo {
            capabilities: ServerCapabilities::builder()
                .enable_resources()
                .enable_tools()
                .build(),
            server_info: implementation,
            instructions: Some(
                "Use this server to redact personal information, extract entities and key phrases, detect language, score sentiment, summarize, answer questions from a knowledge base, and translate text. Every tool returns { isError, content: { type, text } } with JSON text.".into(),
            ),
            ..ServerInfo::default()
        }
    }

    fn list_resources(
        &self,
        _request: Option<rmcp::model::PaginatedRequestParam>,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListResourcesResult, McpError>> + Send + '_ {
        let resources = self.describe_resources();
        std::future::ready(Ok(ListResourcesResult::with_all_items(resources)))
    }

    fn list_tools(
        &self,
        _request: Option<rmcp::model::PaginatedRequestParam>,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        let tools = self.describe_tools();
        std::future::ready(Ok(ListToolsResult::with_all_items(tools)))
    }

    fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ReadResourceResult, McpError>> + Send + '_ {
        async move {
            if let Some(handler) = self.registry.resources.get(request.uri.as_str()) {
                return handler(self, request).await;
            }

            Err(McpError::invalid_params(
                format!("Unknown resource URI: {}", request.uri),
                None,
            ))
        }
    }

    #[allow(clippy::manual_async_fn)]
    fn call_tool(
        &self,
        request: CallToolRequestParam,
        context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        async move {
            let Some(tool) = self.registry.tool(request.name.as_ref()) else {
                return Err(McpError::invalid_params(
                    format!("Unknown tool: {}", request.name),
                    None,
                ));
            };

            let envelope = self
                .service
                .dispatch(tool, request.arguments, context.ct.clone())
                .await;
            Ok(envelope.into_call_tool_result())
        }
    }
}
