//! Live adapters for the `RepairOracle` port.

use super::shell::render_template;
use crate::error::BoxError;
use crate::ports::llm::{CompletionRequest, LlmClient};
use crate::ports::oracle::{RepairFuture, RepairOracle, RepairRequest, RepairResponse};
use crate::ports::shell::ShellExecutor;
use crate::repair::{build_prompt, extract_source};

/// Oracle that runs an external command with the prompt substituted for
/// `{prompt}`, e.g. `gh copilot -- -p {prompt} --allow-all-tools`.
pub struct CommandRepairOracle {
    shell: Box<dyn ShellExecutor>,
    template: String,
}

impl CommandRepairOracle {
    /// Creates an oracle from a `{prompt}` command template.
    pub fn new(shell: Box<dyn ShellExecutor>, template: impl Into<String>) -> Self {
        Self { shell, template: template.into() }
    }
}

impl RepairOracle for CommandRepairOracle {
    fn repair(&self, request: &RepairRequest) -> RepairFuture<'_> {
        let prompt = build_prompt(request);
        let command = render_template(&self.template, "prompt", &prompt);

        Box::pin(async move {
            let output = self.shell.run(&command)?;
            let raw_output = format!("{}{}", output.stdout, output.stderr);
            if !output.success() {
                return Err(format!(
                    "oracle command exited with status {}: {}",
                    output.exit_code,
                    raw_output.trim()
                )
                .into());
            }
            into_response(raw_output)
        })
    }
}

const REPAIR_SYSTEM_PROMPT: &str =
    "You repair failing test classes. Reply with the complete corrected file only.";

/// Oracle backed by a language model through the [`LlmClient`] port.
pub struct LlmRepairOracle {
    client: Box<dyn LlmClient>,
    model: String,
    max_tokens: u32,
}

impl LlmRepairOracle {
    /// Creates an oracle that asks `model` for at most `max_tokens` tokens.
    pub fn new(client: Box<dyn LlmClient>, model: impl Into<String>, max_tokens: u32) -> Self {
        Self { client, model: model.into(), max_tokens }
    }
}

impl RepairOracle for LlmRepairOracle {
    fn repair(&self, request: &RepairRequest) -> RepairFuture<'_> {
        let completion = CompletionRequest {
            model: self.model.clone(),
            system: Some(REPAIR_SYSTEM_PROMPT.to_string()),
            prompt: build_prompt(request),
            max_tokens: self.max_tokens,
        };

        Box::pin(async move {
            let response = self.client.complete(&completion).await?;
            into_response(response.text)
        })
    }
}

fn into_response(raw_output: String) -> Result<RepairResponse, BoxError> {
    let updated_source = extract_source(&raw_output);
    if updated_source.trim().is_empty() {
        return Err(format!("oracle returned no source. Output: {raw_output}").into());
    }
    Ok(RepairResponse { updated_source, raw_output })
}
