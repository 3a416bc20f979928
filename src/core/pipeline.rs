use crate::core::{
    AnalysisResult, CompletionClient, CompletionRequest, ConfigProvider, Result, Sentiment,
};
use crate::domain::model::ATTRIBUTE_KEYS;
use crate::utils::error::SentimentError;
use crate::utils::validation::validate_input_text;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub const SYSTEM_PROMPT: &str = r#"You are a sentiment analysis expert. Return ONLY valid JSON in this format:

{
    "sentiment": "positive" | "neutral" | "negative",
    "score": <float -1 to 1>,
    "keywords": ["word1", "word2", ...],
    "attributes": {
        "intensity": <0-1>,
        "energy": <0-1>,
        "valence": <0-1>,
        "complexity": <0-1>
    }
}"#;

const LOG_PREVIEW_CHARS: usize = 120;

pub fn user_prompt(text: &str) -> String {
    format!("Analyze this text:\n\n{}", text)
}

pub struct SentimentPipeline<C: CompletionClient> {
    client: C,
    max_tokens: u32,
    temperature: f32,
}

impl<C: CompletionClient> SentimentPipeline<C> {
    pub fn new(client: C, config: &impl ConfigProvider) -> Self {
        Self {
            client,
            max_tokens: config.max_tokens(),
            temperature: config.temperature(),
        }
    }

    pub fn completion_request(&self, text: &str) -> CompletionRequest {
        CompletionRequest {
            system_prompt: SYSTEM_PROMPT.to_string(),
            user_prompt: user_prompt(text),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }

    pub async fn analyze(&self, text: &str) -> Result<AnalysisResult> {
        validate_input_text("text", text)?;
        tracing::info!("Processing text ({} chars)", text.chars().count());

        let request = self.completion_request(text);
        let reply = self.client.complete(&request).await.map_err(|e| {
            tracing::error!("Completion call failed: {}", e);
            SentimentError::internal(e.to_string())
        })?;

        let reply = reply.trim();
        tracing::info!("Upstream raw response: {}...", preview(reply));

        let result = parse_reply(reply)?;
        tracing::info!("Final sentiment: {} ({})", result.sentiment, result.score);
        Ok(result)
    }
}

/// Parse the model's textual reply into a result, substituting defaults for
/// absent or null fields.
pub fn parse_reply(reply: &str) -> Result<AnalysisResult> {
    let value: Value = serde_json::from_str(reply.trim()).map_err(|e| {
        tracing::error!("JSON parse error: {} (reply: {})", e, preview(reply));
        SentimentError::upstream_format("response was not valid JSON")
    })?;

    let Value::Object(object) = value else {
        tracing::error!("Upstream reply is not a JSON object: {}", preview(reply));
        return Err(SentimentError::upstream_format(
            "response was not a JSON object",
        ));
    };

    Ok(AnalysisResult {
        sentiment: read_sentiment(&object)?,
        score: read_score(&object)?,
        keywords: read_keywords(&object)?,
        attributes: read_attributes(&object)?,
    })
}

fn field<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    object.get(key).filter(|v| !v.is_null())
}

fn read_sentiment(object: &Map<String, Value>) -> Result<Sentiment> {
    match field(object, "sentiment") {
        None => Ok(Sentiment::default()),
        Some(Value::String(label)) => label.parse().map_err(|e: String| {
            tracing::error!("Rejected sentiment label: {}", e);
            SentimentError::invalid_field("sentiment", "sentiment was not a recognised label")
        }),
        Some(other) => {
            tracing::error!("Sentiment is not a string: {}", other);
            Err(SentimentError::invalid_field("sentiment", "sentiment was not a string"))
        }
    }
}

fn read_score(object: &Map<String, Value>) -> Result<f64> {
    let Some(raw) = field(object, "score") else {
        return Ok(0.0);
    };
    let score = coerce_number(raw).ok_or_else(|| {
        tracing::error!("Score is not numeric: {}", raw);
        SentimentError::invalid_field("score", "score was not numeric")
    })?;

    if !(-1.0..=1.0).contains(&score) {
        tracing::warn!("Score {} outside [-1, 1], clamping", score);
        return Ok(score.clamp(-1.0, 1.0));
    }
    Ok(score)
}

fn read_keywords(object: &Map<String, Value>) -> Result<Vec<String>> {
    match field(object, "keywords") {
        None => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.clone()),
                other => {
                    tracing::error!("Keyword is not a string: {}", other);
                    Err(SentimentError::invalid_field("keywords", "keywords must be strings"))
                }
            })
            .collect(),
        Some(other) => {
            tracing::error!("Keywords is not an array: {}", other);
            Err(SentimentError::invalid_field("keywords", "keywords was not an array"))
        }
    }
}

fn read_attributes(object: &Map<String, Value>) -> Result<BTreeMap<String, f64>> {
    match field(object, "attributes") {
        None => Ok(BTreeMap::new()),
        Some(Value::Object(map)) => {
            let mut attributes = BTreeMap::new();
            for (name, raw) in map {
                match coerce_number(raw) {
                    Some(value) => {
                        if !(0.0..=1.0).contains(&value) {
                            tracing::warn!("Attribute {} value {} outside [0, 1], clamping", name, value);
                        }
                        attributes.insert(name.clone(), value.clamp(0.0, 1.0));
                    }
                    None => tracing::warn!("Dropping non-numeric attribute {}: {}", name, raw),
                }
            }
            let missing: Vec<&str> = ATTRIBUTE_KEYS
                .iter()
                .copied()
                .filter(|key| !attributes.contains_key(*key))
                .collect();
            if !missing.is_empty() {
                tracing::debug!("Reply omitted attributes: {}", missing.join(", "));
            }
            Ok(attributes)
        }
        Some(other) => {
            tracing::error!("Attributes is not an object: {}", other);
            Err(SentimentError::invalid_field("attributes", "attributes was not an object"))
        }
    }
}

fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

fn preview(text: &str) -> String {
    text.chars().take(LOG_PREVIEW_CHARS).collect()
}
