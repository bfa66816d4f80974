//! C8 execution modes (spec.md §4.8): `single`, `parallel`, and
//! `with_fallback` over the provider subprocess layer, with the
//! response cache and progress events wired through each.

use sdd_config::Config;
use sdd_llm::ToolResponse;
use sdd_utils::error::ProviderFailure;
use sdd_utils::{SddError, SddResult};

use crate::cache::{cache_key, CacheKeyInput, CacheTags, ResponseCache};
use crate::events::{noop_sink, ProgressEvent, ProgressSink};
use crate::request::build_provider_request;

/// One consultation: a skill-scoped prompt that may be sent to several
/// tools. `structured_context_hash` lets a caller fold in e.g. the
/// current spec document's content hash so the cache key changes when
/// the underlying spec does, even for an identical prompt string.
#[derive(Debug, Clone)]
pub struct ConsultRequest {
    pub skill: String,
    pub prompt: String,
    pub system_prompt: Option<String>,
    pub structured_context_hash: Option<String>,
    pub override_model: Option<String>,
    /// Spec this consultation concerns, if any; stashed as a cache tag
    /// only, never folded into the cache key itself.
    pub spec_id: Option<String>,
}

/// Result of fanning a request out to several providers (spec.md
/// §4.8): `success` is true when at least one provider succeeded.
#[derive(Debug, Clone)]
pub struct MultiToolResponse {
    pub success: bool,
    pub responses: Vec<ToolResponse>,
    pub failures: Vec<ProviderFailure>,
}

#[derive(Debug, Clone)]
pub struct Orchestrator {
    config: Config,
    cache: Option<ResponseCache>,
}

impl Orchestrator {
    pub fn new(config: Config) -> SddResult<Self> {
        let cache = ResponseCache::from_config(&config.cache)?;
        Ok(Orchestrator { config, cache })
    }

    /// Invoke exactly one tool (spec.md §4.8 `single`).
    pub async fn single(&self, tool: &str, request: &ConsultRequest) -> SddResult<ToolResponse> {
        self.single_with_sink(tool, request, &noop_sink).await
    }

    pub async fn single_with_sink(
        &self,
        tool: &str,
        request: &ConsultRequest,
        sink: &ProgressSink<'_>,
    ) -> SddResult<ToolResponse> {
        self.invoke_one(tool, request, sink).await.map(|outcome| outcome.response)
    }

    /// Invoke every tool in `tools` concurrently (spec.md §4.8
    /// `parallel`), collecting every response and failure rather than
    /// stopping at the first success or failure.
    pub async fn parallel(&self, tools: &[String], request: &ConsultRequest) -> SddResult<MultiToolResponse> {
        self.parallel_with_sink(tools, request, &noop_sink).await
    }

    pub async fn parallel_with_sink(
        &self,
        tools: &[String],
        request: &ConsultRequest,
        sink: &ProgressSink<'_>,
    ) -> SddResult<MultiToolResponse> {
        let mut set = tokio::task::JoinSet::new();
        for tool in tools {
            let tool = tool.clone();
            let config = self.config.clone();
            let cache = self.cache.clone();
            let request = request.clone();
            set.spawn(async move {
                let orchestrator = Orchestrator { config, cache };
                orchestrator.invoke_one(&tool, &request, &noop_sink).await
            });
        }

        let mut responses = Vec::new();
        let mut failures = Vec::new();
        while let Some(joined) = set.join_next().await {
            let outcome = joined.map_err(|e| SddError::Internal(format!("consultation task panicked: {e}")))??;
            sink(ProgressEvent::Completed {
                tool: outcome.response.tool.clone(),
                elapsed_s: outcome.response.elapsed_s,
                from_cache: outcome.response.from_cache,
            });
            if let Some(failure) = outcome.failure {
                failures.push(failure);
            }
            responses.push(outcome.response);
        }

        let success = responses.iter().any(|r| r.success);
        Ok(MultiToolResponse { success, responses, failures })
    }

    /// Try `tools` in order, returning the first success (spec.md §4.8
    /// `with_fallback`). If every tool fails, returns
    /// `SddError::ConsultationFailed` with every collected failure.
    pub async fn with_fallback(&self, tools: &[String], request: &ConsultRequest) -> SddResult<ToolResponse> {
        self.with_fallback_with_sink(tools, request, &noop_sink).await
    }

    pub async fn with_fallback_with_sink(
        &self,
        tools: &[String],
        request: &ConsultRequest,
        sink: &ProgressSink<'_>,
    ) -> SddResult<ToolResponse> {
        let mut failures = Vec::new();
        for tool in tools {
            let outcome = self.invoke_one(tool, request, sink).await?;
            if outcome.response.success {
                return Ok(outcome.response);
            }
            if let Some(failure) = outcome.failure {
                failures.push(failure);
            }
        }
        Err(SddError::ConsultationFailed { failures })
    }

    async fn invoke_one(
        &self,
        tool: &str,
        request: &ConsultRequest,
        sink: &ProgressSink<'_>,
    ) -> SddResult<sdd_llm::Invocation> {
        let provider_request = build_provider_request(&self.config, tool, request)?;
        sink(ProgressEvent::Started { tool: tool.to_string() });

        let key = cache_key(&CacheKeyInput {
            tool,
            model: &provider_request.model,
            prompt: &request.prompt,
            system_prompt: request.system_prompt.as_deref(),
            skill_name: &request.skill,
            structured_context_hash: request.structured_context_hash.as_deref(),
        });

        if let Some(cache) = &self.cache {
            if let Some(response) = cache.get(&key) {
                return Ok(sdd_llm::Invocation { response, failure: None });
            }
        }

        let outcome = sdd_llm::invoke(&provider_request).await?;
        if outcome.response.success {
            if let Some(cache) = &self.cache {
                let tags = CacheTags { skill: request.skill.clone(), spec_id: request.spec_id.clone() };
                cache.put_tagged(&key, &outcome.response, Some(tags))?;
            }
        } else if let Some(failure) = &outcome.failure {
            sink(ProgressEvent::Failed { tool: tool.to_string(), category: failure.category });
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use tempfile::TempDir;

    fn config_with_cache_dir(dir: &Utf8PathBuf) -> Config {
        let mut config = Config::default();
        config.cache.dir = dir.clone();
        config
    }

    fn request() -> ConsultRequest {
        ConsultRequest {
            skill: "review".to_string(),
            prompt: "hello".to_string(),
            system_prompt: None,
            structured_context_hash: None,
            override_model: None,
            spec_id: None,
        }
    }

    #[tokio::test]
    async fn single_reports_not_installed_for_a_placeholder_tool() {
        let dir = TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let mut config = config_with_cache_dir(&root);
        config.providers.get_mut("claude").unwrap().command = "sdd-definitely-not-a-real-binary".to_string();
        let orchestrator = Orchestrator::new(config).unwrap();
        let response = orchestrator.single("claude", &request()).await.unwrap();
        assert!(!response.success);
    }

    #[tokio::test]
    async fn with_fallback_returns_consultation_failed_when_every_tool_fails() {
        let dir = TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let mut config = config_with_cache_dir(&root);
        for provider in config.providers.values_mut() {
            provider.command = "sdd-definitely-not-a-real-binary".to_string();
        }
        let orchestrator = Orchestrator::new(config).unwrap();
        let tools = vec!["claude".to_string(), "gemini".to_string()];
        let err = orchestrator.with_fallback(&tools, &request()).await.unwrap_err();
        match err {
            SddError::ConsultationFailed { failures } => assert_eq!(failures.len(), 2),
            other => panic!("expected ConsultationFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn parallel_succeeds_with_one_failure_and_caches_only_the_success() {
        let dir = TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let mut config = config_with_cache_dir(&root);
        // "claude" echoes the prompt back via `cat` (exit 0); "gemini" is
        // wired to a command that always fails.
        config.providers.get_mut("claude").unwrap().command = "cat".to_string();
        config.providers.get_mut("gemini").unwrap().command = "false".to_string();
        let orchestrator = Orchestrator::new(config).unwrap();
        let tools = vec!["claude".to_string(), "gemini".to_string()];

        let result = orchestrator.parallel(&tools, &request()).await.unwrap();

        assert!(result.success);
        assert_eq!(result.responses.iter().filter(|r| r.success).count(), 1);
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].tool, "gemini");

        let cached = orchestrator.cache.as_ref().unwrap().list().unwrap();
        assert_eq!(cached.len(), 1);
        assert_eq!(cached[0].tool, "claude");
    }

    #[tokio::test]
    async fn unknown_tool_surfaces_external_tool_not_found() {
        let dir = TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let orchestrator = Orchestrator::new(config_with_cache_dir(&root)).unwrap();
        let err = orchestrator.single("not-a-tool", &request()).await.unwrap_err();
        assert!(matches!(err, SddError::ExternalToolNotFound(_)));
    }
}
