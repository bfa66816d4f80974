//! Turning a [`ConsultRequest`] plus a configured tool name into the
//! [`sdd_llm::ProviderRequest`] the subprocess layer needs.

use std::time::Duration;

use sdd_config::Config;
use sdd_llm::ProviderRequest;
use sdd_utils::{SddError, SddResult};

use crate::modes::ConsultRequest;

pub fn build_provider_request(config: &Config, tool: &str, request: &ConsultRequest) -> SddResult<ProviderRequest> {
    let provider = config
        .providers
        .get(tool)
        .ok_or_else(|| SddError::ExternalToolNotFound(tool.to_string()))?;
    if !provider.enabled {
        return Err(SddError::ExternalToolNotFound(tool.to_string()));
    }
    let model = config.resolve_model(&request.skill, tool, request.override_model.as_deref());
    Ok(ProviderRequest {
        tool: tool.to_string(),
        command: provider.command.clone(),
        flags: provider.flags.clone(),
        model,
        prompt: request.prompt.clone(),
        system_prompt: request.system_prompt.clone(),
        timeout: Duration::from_secs(provider.timeout_seconds),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

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

    #[test]
    fn unknown_tool_is_rejected() {
        let config = Config::default();
        let err = build_provider_request(&config, "not-a-tool", &request()).unwrap_err();
        assert!(matches!(err, SddError::ExternalToolNotFound(_)));
    }

    #[test]
    fn disabled_tool_is_rejected() {
        let mut config = Config::default();
        config.providers.get_mut("claude").unwrap().enabled = false;
        let err = build_provider_request(&config, "claude", &request()).unwrap_err();
        assert!(matches!(err, SddError::ExternalToolNotFound(_)));
    }

    #[test]
    fn resolves_model_and_command_from_config() {
        let config = Config::default();
        let built = build_provider_request(&config, "claude", &request()).unwrap();
        assert_eq!(built.command, "claude");
        assert_eq!(built.model, "sonnet");
    }
}
