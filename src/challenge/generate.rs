//! Solution generation through a chat-completion model endpoint.

use super::store::Challenge;
use crate::config::types::{EvalError, Result};
use log::{debug, info};
use regex::Regex;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

pub const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const OLLAMA_API_URL: &str = "http://localhost:11434/v1/chat/completions";
pub const OPENAI_KEY_ENV: &str = "OPENAI_API_KEY";

const SYSTEM_PROMPT: &str = "You are a helpful AI assistant that generates code solutions.";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

fn fenced_block() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"```(?:.*\n)?([\s\S]*?)```").expect("static regex is valid"))
}

pub fn build_prompt(lang: &str, task: &str) -> String {
    format!(
        "Write a {lang} program that solves the following coding challenge:\n\n{task}\n\n\
         The program should read input from a file called 'input.txt' and print the output to standard output.\n\n\
         Respond ONLY with the code surrounded by triple backticks and the language name, like this:\n\
         ```{lang}\n<YOUR CODE HERE>\n```\n\
         Do not include any explanations or comments outside the code block."
    )
}

/// Body of the first fenced block, without its language tag line.
pub fn extract_code_block(content: &str) -> Result<String> {
    let code = fenced_block()
        .captures(content)
        .and_then(|caps| caps.get(1))
        .ok_or_else(|| EvalError::Provider("no code found in the response".to_string()))?
        .as_str()
        .trim();
    if code.is_empty() {
        return Err(EvalError::Provider("extracted code is empty".to_string()));
    }
    Ok(code.to_string())
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Deserialize)]
pub struct ReplyMessage {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
    #[serde(rename = "type", default)]
    kind: String,
}

/// The two reply shapes model endpoints produce.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ProviderResponse {
    Simple { response: String },
    Chat { choices: Vec<Choice> },
}

impl ProviderResponse {
    pub fn decode(body: &str) -> Result<Self> {
        serde_json::from_str(body)
            .map_err(|e| EvalError::Provider(format!("unrecognized response shape: {}", e)))
    }

    pub fn content(self) -> Result<String> {
        match self {
            ProviderResponse::Simple { response } => Ok(response),
            ProviderResponse::Chat { choices } => choices
                .into_iter()
                .next()
                .map(|choice| choice.message.content)
                .ok_or_else(|| EvalError::Provider("response has no choices".to_string())),
        }
    }
}

/// Where generated code comes from, picked by model name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelProvider {
    OpenAi { model: String, api_url: String },
    Ollama { model: String, api_url: String },
    /// Canned stub, no network
    Test,
}

impl ModelProvider {
    /// `gpt-*` selects OpenAI, `ollama/<model>` a local Ollama server and
    /// `test` the offline stub.
    pub fn from_model(model: &str, api_url: Option<&str>) -> Result<Self> {
        if model == "test" {
            return Ok(ModelProvider::Test);
        }
        if model.starts_with("gpt-") {
            return Ok(ModelProvider::OpenAi {
                model: model.to_string(),
                api_url: api_url.unwrap_or(OPENAI_API_URL).to_string(),
            });
        }
        if let Some(name) = model.strip_prefix("ollama/") {
            return Ok(ModelProvider::Ollama {
                model: name.to_string(),
                api_url: api_url.unwrap_or(OLLAMA_API_URL).to_string(),
            });
        }
        Err(EvalError::Provider(format!(
            "unsupported model provider: {}",
            model
        )))
    }

    /// Source code solving `challenge` in `lang`.
    pub fn generate(&self, challenge: &Challenge, lang: &str) -> Result<String> {
        let (model, api_url, bearer, system) = match self {
            ModelProvider::Test => return Ok(test_stub(lang)),
            ModelProvider::OpenAi { model, api_url } => (
                model,
                api_url,
                Some(std::env::var(OPENAI_KEY_ENV).unwrap_or_default()),
                false,
            ),
            ModelProvider::Ollama { model, api_url } => (model, api_url, None, true),
        };

        let prompt = build_prompt(lang, &challenge.task);
        let mut messages = Vec::with_capacity(2);
        if system {
            messages.push(ChatMessage {
                role: "system",
                content: SYSTEM_PROMPT,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &prompt,
        });

        info!("Requesting {} solution for {} from {}", lang, challenge.name, model);
        let body = post_chat(api_url, bearer.as_deref(), &ChatRequest { model, messages })?;
        extract_code_block(&ProviderResponse::decode(&body)?.content()?)
    }
}

fn post_chat(api_url: &str, bearer: Option<&str>, request: &ChatRequest<'_>) -> Result<String> {
    let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
    let mut builder = client.post(api_url).json(request);
    if let Some(key) = bearer {
        builder = builder.bearer_auth(key);
    }
    let response = builder.send()?;
    let status = response.status();
    let body = response.text()?;
    debug!("{} answered {} ({} bytes)", api_url, status, body.len());

    if !status.is_success() {
        return Err(match serde_json::from_str::<ApiErrorBody>(&body) {
            Ok(err) => EvalError::Provider(format!(
                "API error: {} ({})",
                err.error.message, err.error.kind
            )),
            Err(_) => EvalError::Provider(format!("API error: {}", status)),
        });
    }
    Ok(body)
}

fn test_stub(lang: &str) -> String {
    format!(
        "# Test model response for {lang}\n\
         def solve():\n    \
         with open('input.txt', 'r') as file:\n        \
         input_data = file.read()\n    \
         print('Hello, World!')\n\n\
         if __name__ == '__main__':\n    \
         solve()"
    )
}

/// Write `code` to `<dir>/<name>.<extension>`.
pub fn write_solution_file(
    dir: &Path,
    challenge: &Challenge,
    extension: &str,
    code: &str,
) -> Result<PathBuf> {
    let path = dir.join(format!("{}.{}", challenge.name, extension));
    std::fs::write(&path, code)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_selection() {
        assert_eq!(
            ModelProvider::from_model("gpt-4o", None).unwrap(),
            ModelProvider::OpenAi {
                model: "gpt-4o".to_string(),
                api_url: OPENAI_API_URL.to_string()
            }
        );
        assert_eq!(
            ModelProvider::from_model("ollama/llama3:8b", Some("http://h/api")).unwrap(),
            ModelProvider::Ollama {
                model: "llama3:8b".to_string(),
                api_url: "http://h/api".to_string()
            }
        );
        assert_eq!(
            ModelProvider::from_model("test", None).unwrap(),
            ModelProvider::Test
        );
        assert!(matches!(
            ModelProvider::from_model("claude", None),
            Err(EvalError::Provider(_))
        ));
    }

    #[test]
    fn test_prompt_names_language_and_input_file() {
        let prompt = build_prompt("go", "Count the stars.");
        assert!(prompt.starts_with("Write a go program"));
        assert!(prompt.contains("Count the stars."));
        assert!(prompt.contains("'input.txt'"));
        assert!(prompt.contains("```go\n<YOUR CODE HERE>\n```"));
    }

    #[test]
    fn test_extract_code_block() {
        let reply = "Sure!\n```python\nprint(42)\n```\nmore\n```\nignored\n```";
        assert_eq!(extract_code_block(reply).unwrap(), "print(42)");
        assert!(extract_code_block("no fences here").is_err());
        assert!(extract_code_block("```python\n   \n```").is_err());
    }

    #[test]
    fn test_decode_both_shapes() {
        let simple = ProviderResponse::decode(r#"{"response": "```\nx\n```"}"#).unwrap();
        assert_eq!(simple.content().unwrap(), "```\nx\n```");

        let chat = ProviderResponse::decode(
            r#"{"id": "c1", "choices": [{"index": 0, "message": {"role": "assistant", "content": "hi"}}]}"#,
        )
        .unwrap();
        assert_eq!(chat.content().unwrap(), "hi");

        assert!(ProviderResponse::decode(r#"{"choices": []}"#)
            .unwrap()
            .content()
            .is_err());
        assert!(matches!(
            ProviderResponse::decode(r#"{"output": 1}"#),
            Err(EvalError::Provider(_))
        ));
    }

    #[test]
    fn test_stub_provider_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let challenge = Challenge {
            name: "day1_part1_2023".to_string(),
            ..Challenge::default()
        };
        let code = ModelProvider::Test.generate(&challenge, "python").unwrap();
        assert!(code.contains("Test model response for python"));

        let path = write_solution_file(dir.path(), &challenge, "py", &code).unwrap();
        assert_eq!(path.file_name().unwrap(), "day1_part1_2023.py");
        assert!(std::fs::read_to_string(path).unwrap().contains("def solve():"));
    }
}
