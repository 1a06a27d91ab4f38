use crate::prelude::{eprintln, *};
use paper_reader_core::{Generator, Message, ReaderError, Role};
use rig::client::CompletionClient;
use rig::completion::Prompt;
use rig::providers::ollama;

/// Generation service backed by a local Ollama server.
///
/// System messages become the agent preamble; everything else is sent as
/// the prompt. A fresh agent is built per request.
pub struct OllamaGenerator {
    client: ollama::Client,
    model: String,
    temperature: Option<f64>,
}

impl OllamaGenerator {
    pub fn from_global(global: &crate::Global) -> Result<Self> {
        if global.verbose {
            eprintln!("Ollama URL: {}", global.ollama_url);
            eprintln!("Model: {}", global.model);
        }

        Ok(Self {
            client: create_client(&global.ollama_url)?,
            model: global.model.clone(),
            temperature: global.temperature,
        })
    }
}

fn create_client(ollama_url: &str) -> Result<ollama::Client> {
    use rig::client::Nothing;

    ollama::Client::builder()
        .api_key(Nothing)
        .base_url(ollama_url)
        .build()
        .map_err(|e| eyre!("Failed to create Ollama client: {}", e))
}

/// Split role-tagged messages into `(preamble, prompt)`.
fn split_messages(messages: &[Message]) -> (String, String) {
    let join = |system: bool| {
        messages
            .iter()
            .filter(|m| (m.role == Role::System) == system)
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    };
    (join(true), join(false))
}

impl Generator for OllamaGenerator {
    async fn generate(&self, messages: &[Message]) -> Result<String, ReaderError> {
        let (preamble, prompt) = split_messages(messages);
        if prompt.is_empty() {
            return Err(ReaderError::Generation(
                "request carries no user message".to_string(),
            ));
        }

        log::debug!(
            "requesting generation from {} ({} prompt chars)",
            self.model,
            prompt.len()
        );

        let mut builder = self.client.agent(&self.model).preamble(&preamble);
        if let Some(temperature) = self.temperature {
            builder = builder.temperature(temperature);
        }
        let agent = builder.build();

        agent
            .prompt(prompt.as_str())
            .await
            .map_err(|e| ReaderError::Generation(e.to_string()))
    }
}
