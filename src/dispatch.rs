//! Dispatcher. Routes a tool invocation to a built-in handler or to
//! generic rule execution on the automation engine.
//!
//! Every invocation eagerly builds a [`RuleModel`] from its arguments, then
//! resolves the tool name against the registry snapshot current at the start
//! of the call. Built-ins run directly; any other name, resolved or not, runs
//! the prepared rule.

use crate::dom;
use crate::engine::{AutomationEngine, AutomationModel, HttpEngine, SessionOutcome};
use crate::locator;
use crate::policy;
use crate::rules::{convert_to_rule, RuleModel};
use crate::session::SessionStore;
use crate::tools::builtins::{
    FindToolArgs, GetToolsArgs, InstructionsArgs, ResolveLocatorArgs, SessionArgs,
    StartSessionArgs,
};
use crate::tools::{BuiltinTool, ManifestSource, RegistrySnapshot, ToolRegistry};
use crate::types::{Config, Error, InvocationId, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

// =============================================================================
// Request / context
// =============================================================================

/// One parsed tool call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvocationRequest {
    #[serde(rename = "name", alias = "toolName")]
    pub tool_name: String,
    #[serde(default)]
    pub arguments: Value,
    #[serde(default, rename = "rawParameters", skip_serializing_if = "Value::is_null")]
    pub raw_parameters: Value,
}

impl InvocationRequest {
    pub fn new(tool_name: impl Into<String>, arguments: Value) -> Self {
        Self {
            tool_name: tool_name.into(),
            arguments,
            raw_parameters: Value::Null,
        }
    }
}

/// Everything a handler may touch during one invocation.
struct ToolContext<'a> {
    arguments: &'a Value,
    registry: Arc<RegistrySnapshot>,
    sessions: &'a SessionStore,
    engine: &'a dyn AutomationEngine,
    http: &'a reqwest::Client,
    config: &'a Config,
}

impl ToolContext<'_> {
    fn args<T: DeserializeOwned + Default>(&self, tool: BuiltinTool) -> Result<T> {
        if self.arguments.is_null() {
            return Ok(T::default());
        }
        serde_json::from_value(self.arguments.clone()).map_err(|e| {
            Error::validation(format!("Invalid arguments for {}: {}", tool.name(), e))
        })
    }
}

// =============================================================================
// Dispatcher
// =============================================================================

/// Bridge entry point. Owns the shared registry and session map; the engine
/// and HTTP client are injected.
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
    sessions: Arc<SessionStore>,
    engine: Arc<dyn AutomationEngine>,
    http: reqwest::Client,
    config: Config,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<ToolRegistry>,
        sessions: Arc<SessionStore>,
        engine: Arc<dyn AutomationEngine>,
        http: reqwest::Client,
        config: Config,
    ) -> Self {
        Self {
            registry,
            sessions,
            engine,
            http,
            config,
        }
    }

    /// Dispatcher over the HTTP engine client, with a built-ins-only registry
    /// and an empty session map.
    pub fn from_config(config: Config) -> Result<Self> {
        let engine = HttpEngine::new(&config.engine)?;
        Ok(Self::new(
            Arc::new(ToolRegistry::with_builtins()),
            Arc::new(SessionStore::new()),
            Arc::new(engine),
            reqwest::Client::new(),
            config,
        ))
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// Rebuild the registry from `source` and publish it.
    pub async fn resync(&self, source: &dyn ManifestSource) -> Result<usize> {
        self.registry.resync(source).await
    }

    /// Run one invocation to completion.
    pub async fn invoke(&self, request: InvocationRequest) -> Result<Value> {
        let invocation_id = InvocationId::new();
        let span = tracing::info_span!(
            "invoke",
            invocation_id = %invocation_id,
            tool = %request.tool_name,
        );
        self.dispatch(&request).instrument(span).await
    }

    /// Run one invocation unless `cancel` fires first. Cancelling drops the
    /// in-flight engine or completion request.
    pub async fn invoke_with_cancel(
        &self,
        request: InvocationRequest,
        cancel: CancellationToken,
    ) -> Result<Value> {
        let tool = request.tool_name.clone();
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!(tool = %tool, "Invocation cancelled");
                Err(Error::cancelled(format!("invocation of {} cancelled", tool)))
            }
            result = self.invoke(request) => result,
        }
    }

    async fn dispatch(&self, request: &InvocationRequest) -> Result<Value> {
        let ctx = ToolContext {
            arguments: &request.arguments,
            registry: self.registry.snapshot(),
            sessions: &self.sessions,
            engine: self.engine.as_ref(),
            http: &self.http,
            config: &self.config,
        };

        let rule = convert_to_rule(ctx.arguments, &ctx.registry)?;

        let builtin = ctx
            .registry
            .lookup(&request.tool_name)
            .and_then(|descriptor| BuiltinTool::from_name(&descriptor.name));

        tracing::debug!(builtin = ?builtin, "Routing invocation");

        match builtin {
            Some(BuiltinTool::FindTool) => find_tool(&ctx),
            Some(BuiltinTool::GetApplicationDom) => get_application_dom(&ctx).await,
            Some(BuiltinTool::GetInstructions) => get_instructions(&ctx),
            Some(BuiltinTool::ResolveLocator) => resolve_locator(&ctx).await,
            Some(BuiltinTool::GetTools) => get_tools(&ctx),
            Some(BuiltinTool::StartSession) => start_session(&ctx).await,
            Some(BuiltinTool::StartRule) | None => start_rule(&ctx, rule).await,
        }
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &self.registry)
            .field("sessions", &self.sessions.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Handlers
// =============================================================================

fn find_tool(ctx: &ToolContext<'_>) -> Result<Value> {
    let args: FindToolArgs = ctx.args(BuiltinTool::FindTool)?;
    match ctx.registry.lookup(&args.tool_name) {
        Some(descriptor) => Ok(serde_json::to_value(descriptor)?),
        None => {
            tracing::debug!(tool_name = %args.tool_name, "find_tool: not found");
            Ok(Value::Null)
        }
    }
}

fn get_tools(ctx: &ToolContext<'_>) -> Result<Value> {
    let args: GetToolsArgs = ctx.args(BuiltinTool::GetTools)?;
    Ok(serde_json::to_value(ctx.registry.filter(&args.types))?)
}

fn get_instructions(ctx: &ToolContext<'_>) -> Result<Value> {
    let args: InstructionsArgs = ctx.args(BuiltinTool::GetInstructions)?;
    let name = args
        .policy
        .unwrap_or_else(|| ctx.config.policy.default_policy.clone());
    Ok(serde_json::to_value(policy::get_instructions(&name))?)
}

async fn get_application_dom(ctx: &ToolContext<'_>) -> Result<Value> {
    let args: SessionArgs = ctx.args(BuiltinTool::GetApplicationDom)?;
    let snapshot = dom::get_application_dom(
        ctx.engine,
        args.driver_session.as_deref(),
        args.token.as_deref(),
    )
    .await?;
    Ok(serde_json::to_value(snapshot)?)
}

async fn resolve_locator(ctx: &ToolContext<'_>) -> Result<Value> {
    let args: ResolveLocatorArgs = ctx.args(BuiltinTool::ResolveLocator)?;
    let raw = locator::resolve_locator(
        ctx.engine,
        ctx.http,
        &ctx.config.llm,
        args.session.driver_session.as_deref(),
        args.session.token.as_deref(),
        &args.intent,
    )
    .await?;
    Ok(Value::String(raw))
}

async fn start_session(ctx: &ToolContext<'_>) -> Result<Value> {
    let args: StartSessionArgs = ctx.args(BuiltinTool::StartSession)?;
    let model = AutomationModel {
        driver_session: args.session.driver_session,
        token: args.session.token,
        driver_parameters: args.driver_parameters,
        rules: Vec::new(),
    };
    Ok(serde_json::to_value(execute(ctx, &model).await?)?)
}

async fn start_rule(ctx: &ToolContext<'_>, rule: RuleModel) -> Result<Value> {
    let args: StartSessionArgs = ctx.args(BuiltinTool::StartRule)?;
    let model = AutomationModel {
        driver_session: args.session.driver_session,
        token: args.session.token,
        driver_parameters: args.driver_parameters,
        rules: vec![rule],
    };
    Ok(serde_json::to_value(execute(ctx, &model).await?)?)
}

/// Invoke the engine and record the returned session.
async fn execute(ctx: &ToolContext<'_>, model: &AutomationModel) -> Result<SessionOutcome> {
    let response = ctx.engine.invoke(model).await?;

    let Some((session_id, state)) = response.last_session()? else {
        tracing::warn!("Automation engine returned no session");
        return Ok(SessionOutcome::default());
    };

    let value = state.last_plugin().cloned().unwrap_or(Value::Null);
    ctx.sessions.record(&session_id, state);

    Ok(SessionOutcome { session_id, value })
}

// =============================================================================
// Tests
// =============================================================================
