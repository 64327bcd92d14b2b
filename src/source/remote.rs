use std::env;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::GeneratorConfig;
use crate::quiz::Question;
use crate::quiz::question::DEFAULT_CATEGORY;
use crate::source::QuestionSource;

const SYSTEM_INSTRUCTION: &str =
    "Você é um instrutor especialista de trânsito do DETRAN. Gere questões técnicas e precisas.";

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("API key not found in ${0}")]
    MissingCredential(String),
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("API returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("response contained no text")]
    EmptyResponse,
    #[error("malformed question JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("request timed out")]
    TimedOut,
    #[error("request cancelled")]
    Cancelled,
    #[error("network support is not compiled in")]
    NetworkDisabled,
}

/// One question as the model returns it, before ids are assigned.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireQuestion {
    text: String,
    options: Vec<String>,
    correct_answer: usize,
    #[serde(default)]
    explanation: Option<String>,
    #[serde(default)]
    category: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

/// Requests fresh questions from a Gemini-style `generateContent` endpoint.
/// Single attempt, no retries.
#[derive(Clone, Debug)]
pub struct RemoteGenerator {
    config: GeneratorConfig,
    api_key: Option<String>,
    count: usize,
}

impl RemoteGenerator {
    /// Build a generator, reading the API key from the configured variable
    /// (a `.env` file in the working directory is honoured).
    pub fn from_env(config: GeneratorConfig, count: usize) -> Self {
        let api_key = find_api_key(&config.api_key_env);
        Self {
            config,
            api_key,
            count,
        }
    }

    pub fn with_api_key(config: GeneratorConfig, api_key: Option<String>, count: usize) -> Self {
        Self {
            config,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            count,
        }
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn url(&self) -> String {
        format!(
            "{}/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        )
    }

    pub fn request_body(&self) -> Value {
        let prompt = format!(
            "Gere {} questões de múltipla escolha para um simulado do DETRAN Brasil (nível difícil). \
             As questões devem cobrir: Legislação, Direção Defensiva, Primeiros Socorros, Mecânica e Meio Ambiente. \
             A resposta correta deve ser o índice (0, 1, 2 ou 3) do array de opções. \
             As opções não devem ter letras (a, b, c, d) no início, apenas o texto.",
            self.count
        );
        json!({
            "systemInstruction": { "parts": [{ "text": SYSTEM_INSTRUCTION }] },
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": response_schema(),
            },
        })
    }

    pub fn try_generate(&self) -> Result<Vec<Question>, GenerateError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| GenerateError::MissingCredential(self.config.api_key_env.clone()))?;

        info!(count = self.count, model = %self.config.model, "requesting generated questions");
        let body = post_json(&self.url(), api_key, &self.request_body(), &self.config)?;
        debug!(response_len = body.len(), "generation response received");

        let questions = parse_response(&body, id_base())?;
        info!(count = questions.len(), "generated questions parsed");
        Ok(questions)
    }
}

/// The seam the app drives generation through, so a stub can stand in for
/// the HTTP client.
pub trait QuestionGenerator: Send + Sync {
    fn try_generate(&self) -> Result<Vec<Question>, GenerateError>;

    /// Whether generation can be offered at all (credential present and
    /// network support compiled in).
    fn is_available(&self) -> bool;

    /// Like `try_generate`, collapsing every failure into an empty list.
    fn generate(&self) -> Vec<Question> {
        match self.try_generate() {
            Ok(questions) => questions,
            Err(err) => {
                warn!(error = %err, "question generation failed");
                Vec::new()
            }
        }
    }
}

/// A shared generator draws like any other source; failures come back as an
/// empty list, which the session treats as a failed start.
impl<G: QuestionGenerator + ?Sized> QuestionSource for Arc<G> {
    fn draw(&mut self) -> Vec<Question> {
        self.generate()
    }
}

impl QuestionGenerator for RemoteGenerator {
    fn try_generate(&self) -> Result<Vec<Question>, GenerateError> {
        RemoteGenerator::try_generate(self)
    }

    fn is_available(&self) -> bool {
        cfg!(feature = "network") && self.has_credential()
    }
}

pub fn find_api_key(var: &str) -> Option<String> {
    let _ = dotenvy::dotenv();
    env::var(var).ok().filter(|k| !k.trim().is_empty())
}

fn response_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "text": { "type": "STRING" },
                "options": { "type": "ARRAY", "items": { "type": "STRING" } },
                "correctAnswer": { "type": "INTEGER" },
                "explanation": { "type": "STRING" },
                "category": { "type": "STRING" },
            },
            "required": ["text", "options", "correctAnswer", "explanation"],
        },
    })
}

/// Ids for a batch start at the current wall time in milliseconds, scaled so
/// consecutive batches never overlap even for large counts.
fn id_base() -> u64 {
    let millis = chrono::Utc::now().timestamp_millis().max(0) as u64;
    millis.saturating_mul(1000)
}

/// Extract the generated text from a `generateContent` response and map it
/// into questions.
pub fn parse_response(body: &str, id_base: u64) -> Result<Vec<Question>, GenerateError> {
    let response: GenerateContentResponse = serde_json::from_str(body)?;
    let text: String = response
        .candidates
        .into_iter()
        .filter_map(|c| c.content)
        .flat_map(|c| c.parts)
        .filter_map(|p| p.text)
        .collect();
    if text.trim().is_empty() {
        return Err(GenerateError::EmptyResponse);
    }
    parse_questions(&text, id_base)
}

/// Map the model's JSON array into questions, numbering ids from `id_base`.
/// Items that parse but are not valid questions are dropped.
pub fn parse_questions(text: &str, id_base: u64) -> Result<Vec<Question>, GenerateError> {
    let wire: Vec<WireQuestion> = serde_json::from_str(strip_code_fence(text))?;
    let questions = wire
        .into_iter()
        .enumerate()
        .map(|(i, w)| Question {
            id: id_base + i as u64,
            text: w.text,
            options: w.options,
            correct_answer: w.correct_answer,
            explanation: w.explanation,
            category: Some(
                w.category
                    .filter(|c| !c.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            ),
        })
        .filter(|q| match q.validate() {
            Ok(()) => true,
            Err(err) => {
                warn!(%err, "dropping invalid generated question");
                false
            }
        })
        .collect();
    Ok(questions)
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(feature = "network")]
fn post_json(
    url: &str,
    api_key: &str,
    body: &Value,
    config: &GeneratorConfig,
) -> Result<String, GenerateError> {
    let client = reqwest::blocking::Client::builder()
        .timeout(config.timeout())
        .build()
        .map_err(|e| GenerateError::Http(e.to_string()))?;
    let response = client
        .post(url)
        .header("x-goog-api-key", api_key)
        .json(body)
        .send()
        .map_err(|e| {
            if e.is_timeout() {
                GenerateError::TimedOut
            } else {
                GenerateError::Http(e.to_string())
            }
        })?;
    let status = response.status();
    let text = response
        .text()
        .map_err(|e| GenerateError::Http(e.to_string()))?;
    if !status.is_success() {
        let body: String = text.chars().take(200).collect();
        return Err(GenerateError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(text)
}

#[cfg(not(feature = "network"))]
fn post_json(
    _url: &str,
    _api_key: &str,
    _body: &Value,
    _config: &GeneratorConfig,
) -> Result<String, GenerateError> {
    Err(GenerateError::NetworkDisabled)
}
