//! Consultation commands: `plan-review`, `fidelity-review`,
//! `list-review-tools` (spec.md §6.1, §4.8).

use sdd_model::NodeId;
use sdd_orchestrator::{ConsultRequest, MultiToolResponse, Orchestrator};
use sdd_utils::canonical::content_hash;
use sdd_utils::{SddError, SddResult};
use serde::Serialize;

use crate::cli::context::Context;
use crate::cli::output;

fn block_on<F: std::future::Future>(future: F) -> SddResult<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| SddError::Internal(format!("failed to start an async runtime: {e}")))?;
    Ok(runtime.block_on(future))
}

/// Every enabled provider's name in a deterministic order, used when
/// `--tools` is omitted.
fn enabled_tools(ctx: &Context) -> Vec<String> {
    ctx.config.providers.iter().filter(|(_, p)| p.enabled).map(|(name, _)| name.clone()).collect()
}

fn resolve_tools(ctx: &Context, tools: Vec<String>) -> SddResult<Vec<String>> {
    let tools = if tools.is_empty() { enabled_tools(ctx) } else { tools };
    if tools.is_empty() {
        return Err(SddError::UserError("no enabled review tools are configured".to_string()));
    }
    Ok(tools)
}

#[derive(Debug, Serialize)]
struct MultiToolResult {
    success: bool,
    responses: Vec<sdd_llm::ToolResponse>,
    failures: Vec<sdd_utils::error::ProviderFailure>,
}

impl From<MultiToolResponse> for MultiToolResult {
    fn from(value: MultiToolResponse) -> Self {
        MultiToolResult { success: value.success, responses: value.responses, failures: value.failures }
    }
}

fn emit_multi(ctx: &Context, result: MultiToolResult) {
    output::emit(ctx.json, ctx.quiet, &result, || {
        let mut lines = Vec::new();
        for response in &result.responses {
            if response.success {
                lines.push(format!(
                    "[{}/{}{}] {}",
                    response.tool,
                    response.model,
                    if response.from_cache { ", cached" } else { "" },
                    response.text,
                ));
            }
        }
        for failure in &result.failures {
            lines.push(format!("[{}] failed: {:?} — {}", failure.tool, failure.category, failure.stderr_tail));
        }
        if lines.is_empty() {
            "no provider returned a response".to_string()
        } else {
            lines.join("\n\n")
        }
    });
}

fn emit_single(ctx: &Context, response: sdd_llm::ToolResponse) {
    output::emit(ctx.json, ctx.quiet, &response, || {
        format!("[{}/{}] {}", response.tool, response.model, response.text)
    });
}

pub fn plan_review(ctx: &Context, spec_id: String, tools: Vec<String>, fallback: bool) -> SddResult<()> {
    let doc = ctx.store().load(&spec_id)?;
    let tools = resolve_tools(ctx, tools)?;

    let prompt = format!(
        "Review the implementation plan for spec '{}' ({}). Current progress: {}% ({}/{} tasks completed). \
         Flag missing phases, unclear acceptance criteria, or risky sequencing.",
        spec_id,
        doc.metadata.title.as_deref().unwrap_or("untitled"),
        doc.counts.percent,
        doc.counts.completed,
        doc.counts.total,
    );
    let request = ConsultRequest {
        skill: "plan_review".to_string(),
        prompt,
        system_prompt: Some("You are reviewing a spec-driven development plan for completeness and risk.".to_string()),
        structured_context_hash: Some(content_hash(&doc)),
        override_model: None,
        spec_id: Some(spec_id.clone()),
    };

    let orchestrator = Orchestrator::new(ctx.config.clone())?;
    if fallback {
        let response = block_on(orchestrator.with_fallback(&tools, &request))??;
        emit_single(ctx, response);
    } else {
        let multi = block_on(orchestrator.parallel(&tools, &request))??;
        emit_multi(ctx, multi.into());
    }
    Ok(())
}

pub fn fidelity_review(
    ctx: &Context,
    spec_id: String,
    node_id: Option<String>,
    tools: Vec<String>,
    fallback: bool,
) -> SddResult<()> {
    let doc = ctx.store().load(&spec_id)?;
    let tools = resolve_tools(ctx, tools)?;

    let (scope_desc, context_hash) = match &node_id {
        Some(id) => {
            let id = NodeId::from(id.as_str());
            let node = doc.find_node(&id).ok_or_else(|| SddError::NotFound(id.as_str().to_string()))?;
            (format!("node '{}' ({})", node.id.as_str(), node.title), content_hash(node))
        }
        None => (format!("the full spec '{spec_id}'"), content_hash(&doc)),
    };

    let prompt = format!(
        "Review the implementation fidelity of {scope_desc} against its stated description and \
         verification criteria. Flag any deviation, skipped verification, or incomplete work."
    );
    let request = ConsultRequest {
        skill: "fidelity_review".to_string(),
        prompt,
        system_prompt: Some("You are auditing completed work for fidelity to its spec.".to_string()),
        structured_context_hash: Some(context_hash),
        override_model: None,
        spec_id: Some(spec_id.clone()),
    };

    let orchestrator = Orchestrator::new(ctx.config.clone())?;
    if fallback {
        let response = block_on(orchestrator.with_fallback(&tools, &request))??;
        emit_single(ctx, response);
    } else {
        let multi = block_on(orchestrator.parallel(&tools, &request))??;
        emit_multi(ctx, multi.into());
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct ReviewToolInfo {
    tool: String,
    command: String,
    default_model: String,
    enabled: bool,
    timeout_seconds: u64,
}

pub fn list_review_tools(ctx: &Context) -> SddResult<()> {
    let tools: Vec<ReviewToolInfo> = ctx
        .config
        .providers
        .values()
        .map(|p| ReviewToolInfo {
            tool: p.tool.clone(),
            command: p.command.clone(),
            default_model: p.default_model.clone(),
            enabled: p.enabled,
            timeout_seconds: p.timeout_seconds,
        })
        .collect();
    output::emit(ctx.json, ctx.quiet, &tools, || {
        tools
            .iter()
            .map(|t| format!("{} ({}) — model {}, timeout {}s{}", t.tool, t.command, t.default_model, t.timeout_seconds, if t.enabled { "" } else { " [disabled]" }))
            .collect::<Vec<_>>()
            .join("\n")
    });
    Ok(())
}
