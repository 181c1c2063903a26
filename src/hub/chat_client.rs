use crate::{
    config::{HubConfig, DEFAULT_MAX_TOKENS},
    error::{LensError, Result},
    models::{
        ChatCompletionChunk, ChatCompletionRequest, ChatCompletionResponse, ChatMessage,
        DescribeRequest, DescribeResponse, StreamChunk,
    },
};
use futures::stream::{Stream, StreamExt};
use std::pin::Pin;
use tokio_stream::wrappers::ReceiverStream;

/// Client for the hosted vision chat-completion endpoint.
#[derive(Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    default_model: String,
    default_max_tokens: u32,
}

impl ChatClient {
    pub fn new(
        http: reqwest::Client,
        base_url: String,
        api_key: String,
        config: &HubConfig,
    ) -> Self {
        Self {
            http,
            base_url,
            api_key,
            default_model: config.resolved_model_id(),
            default_max_tokens: config.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        }
    }

    pub fn supported_models() -> Vec<(&'static str, &'static str, &'static str)> {
        vec![
            (
                "meta-llama/Llama-3.2-11B-Vision-Instruct",
                "Llama 3.2 11B Vision Instruct",
                "Meta",
            ),
            (
                "meta-llama/Llama-3.2-90B-Vision-Instruct",
                "Llama 3.2 90B Vision Instruct",
                "Meta",
            ),
            (
                "Qwen/Qwen2.5-VL-7B-Instruct",
                "Qwen 2.5 VL 7B Instruct",
                "Qwen",
            ),
        ]
    }

    /// Sends one single-turn request and returns the first completion's text.
    pub async fn describe(&self, request: DescribeRequest) -> Result<DescribeResponse> {
        let model_id = request
            .model_id
            .clone()
            .unwrap_or_else(|| self.default_model.clone());

        let payload = self.build_request(&request, &model_id, false)?;
        let request_json = serde_json::to_string(&payload)
            .map_err(|e| LensError::SerializationError(e.to_string()))?;

        log::info!("Invoking model: {}", model_id);
        log::debug!("Chat completion request payload: {}", request_json);

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .header("Content-Type", "application/json")
            .body(request_json)
            .send()
            .await
            .map_err(|e| {
                log::error!("Chat completion transport error: {:?}", e);
                LensError::HttpError(format!("chat completion request failed: {}", e))
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LensError::ResponseError(e.to_string()))?;

        if !status.is_success() {
            log::error!("Endpoint returned {}: {}", status, body);
            return Err(LensError::ApiError(format!(
                "endpoint returned {}: {}",
                status, body
            )));
        }

        let completion: ChatCompletionResponse =
            serde_json::from_str(&body).map_err(|e| LensError::ResponseError(e.to_string()))?;

        let first = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LensError::ResponseError("completion contained no choices".into()))?;

        Ok(DescribeResponse {
            text: first
                .message
                .content
                .unwrap_or_else(|| "No description available".to_string()),
            model: completion.model.unwrap_or(model_id),
            finish_reason: first.finish_reason,
            usage: completion.usage,
        })
    }

    /// Streams the completion as it is generated.
    ///
    /// The endpoint answers with SSE frames; each `data:` line carries one
    /// delta, and `data: [DONE]` closes the stream.
    pub async fn describe_stream(
        &self,
        request: DescribeRequest,
    ) -> Result<Pin<Box<dyn Stream<Item = Result<StreamChunk>> + Send>>> {
        let model_id = request
            .model_id
            .clone()
            .unwrap_or_else(|| self.default_model.clone());

        let payload = self.build_request(&request, &model_id, true)?;

        log::info!("Invoking streaming model: {}", model_id);

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| LensError::HttpError(format!("chat completion request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LensError::ApiError(format!(
                "endpoint returned {}: {}",
                status, body
            )));
        }

        let (tx, rx) = tokio::sync::mpsc::channel(100);
        let mut byte_stream = response.bytes_stream();

        tokio::spawn(async move {
            let mut buffer = String::new();

            while let Some(next) = byte_stream.next().await {
                let bytes = match next {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        let _ = tx.send(Err(LensError::HttpError(e.to_string()))).await;
                        return;
                    }
                };

                buffer.push_str(&String::from_utf8_lossy(&bytes));

                while let Some(pos) = buffer.find('\n') {
                    let line = buffer[..pos].trim().to_string();
                    buffer.drain(..=pos);

                    let Some(data) = line.strip_prefix("data:") else {
                        continue;
                    };
                    let data = data.trim();

                    if data == "[DONE]" {
                        let _ = tx
                            .send(Ok(StreamChunk {
                                chunk: String::new(),
                                done: true,
                                finish_reason: None,
                            }))
                            .await;
                        return;
                    }

                    if tx.send(Self::parse_stream_frame(data)).await.is_err() {
                        return;
                    }
                }
            }

            // Stream ended without a [DONE] marker.
            let _ = tx
                .send(Ok(StreamChunk {
                    chunk: String::new(),
                    done: true,
                    finish_reason: None,
                }))
                .await;
        });

        Ok(Box::pin(ReceiverStream::new(rx)))
    }

    fn build_request(
        &self,
        request: &DescribeRequest,
        model_id: &str,
        stream: bool,
    ) -> Result<ChatCompletionRequest> {
        if request.prompt.trim().is_empty() {
            return Err(LensError::RequestError("prompt must not be empty".into()));
        }
        if request.image_url.trim().is_empty() {
            return Err(LensError::RequestError(
                "image URL must not be empty".into(),
            ));
        }

        Ok(ChatCompletionRequest {
            model: model_id.to_string(),
            messages: vec![ChatMessage::user(
                request.prompt.clone(),
                request.image_url.clone(),
            )],
            max_tokens: Some(request.max_tokens.unwrap_or(self.default_max_tokens)),
            temperature: request.temperature,
            stream: if stream { Some(true) } else { None },
        })
    }

    fn parse_stream_frame(data: &str) -> Result<StreamChunk> {
        let frame: ChatCompletionChunk =
            serde_json::from_str(data).map_err(|e| LensError::ResponseError(e.to_string()))?;

        Ok(match frame.choices.into_iter().next() {
            Some(choice) => StreamChunk {
                chunk: choice.delta.content.unwrap_or_default(),
                done: choice.finish_reason.is_some(),
                finish_reason: choice.finish_reason,
            },
            None => StreamChunk {
                chunk: String::new(),
                done: false,
                finish_reason: None,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hub::HubClient;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: &str) -> HubClient {
        HubClient::new(
            HubConfig::new()
                .with_api_key("hf_test_key")
                .with_base_url(base_url),
        )
        .unwrap()
    }

    fn describe_request(prompt: &str, image_url: &str) -> DescribeRequest {
        DescribeRequest {
            prompt: prompt.to_string(),
            image_url: image_url.to_string(),
            model_id: None,
            max_tokens: None,
            temperature: None,
        }
    }

    #[tokio::test]
    async fn test_describe_sends_single_request_with_prompt_and_url() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer hf_test_key"))
            .and(body_string_contains("What breed is this dog?"))
            .and(body_string_contains("https://example.com/dog.jpg"))
            .and(body_string_contains("image_url"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "model": "meta-llama/Llama-3.2-11B-Vision-Instruct",
                "choices": [{
                    "index": 0,
                    "message": {"role": "assistant", "content": "A labrador."},
                    "finish_reason": "stop"
                }],
                "usage": {"prompt_tokens": 30, "completion_tokens": 4, "total_tokens": 34}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let response = client
            .chat()
            .describe(describe_request(
                "What breed is this dog?",
                "https://example.com/dog.jpg",
            ))
            .await
            .unwrap();

        assert_eq!(response.text, "A labrador.");
        assert_eq!(response.finish_reason.as_deref(), Some("stop"));
    }

    #[tokio::test]
    async fn test_describe_applies_default_token_budget() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_string_contains("\"max_tokens\":500"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "ok"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        client
            .chat()
            .describe(describe_request("Describe this image", "https://e.com/a.png"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_describe_maps_api_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("model overloaded"))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let err = client
            .chat()
            .describe(describe_request("prompt", "https://e.com/a.png"))
            .await
            .unwrap_err();

        match err {
            LensError::ApiError(msg) => {
                assert!(msg.contains("500"));
                assert!(msg.contains("model overloaded"));
            }
            other => panic!("expected ApiError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_describe_maps_transport_error() {
        // Nothing listens here; the connection itself fails.
        let client = test_client("http://127.0.0.1:1");
        let err = client
            .chat()
            .describe(describe_request("prompt", "https://e.com/a.png"))
            .await
            .unwrap_err();

        assert!(matches!(err, LensError::HttpError(_)));
    }

    #[tokio::test]
    async fn test_describe_rejects_empty_inputs_without_network() {
        let client = test_client("http://127.0.0.1:1");

        let err = client
            .chat()
            .describe(describe_request("   ", "https://e.com/a.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, LensError::RequestError(_)));

        let err = client
            .chat()
            .describe(describe_request("prompt", ""))
            .await
            .unwrap_err();
        assert!(matches!(err, LensError::RequestError(_)));
    }

    #[tokio::test]
    async fn test_describe_empty_choices_is_response_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let err = client
            .chat()
            .describe(describe_request("prompt", "https://e.com/a.png"))
            .await
            .unwrap_err();

        assert!(matches!(err, LensError::ResponseError(_)));
    }

    #[tokio::test]
    async fn test_describe_stream_collects_deltas() {
        let server = MockServer::start().await;

        let sse_body = concat!(
            "data: {\"choices\":[{\"delta\":{\"content\":\"A black\"},\"finish_reason\":null}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\" dog.\"},\"finish_reason\":\"stop\"}]}\n\n",
            "data: [DONE]\n\n",
        );

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_string_contains("\"stream\":true"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(sse_body, "text/event-stream"),
            )
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let mut stream = client
            .chat()
            .describe_stream(describe_request("prompt", "https://e.com/a.png"))
            .await
            .unwrap();

        let mut text = String::new();
        let mut finish_reason = None;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.unwrap();
            text.push_str(&chunk.chunk);
            if let Some(reason) = chunk.finish_reason {
                finish_reason = Some(reason);
            }
            if chunk.done && chunk.chunk.is_empty() {
                break;
            }
        }

        assert_eq!(text, "A black dog.");
        assert_eq!(finish_reason.as_deref(), Some("stop"));
    }

    #[test]
    fn test_parse_stream_frame_rejects_garbage() {
        assert!(matches!(
            ChatClient::parse_stream_frame("not json"),
            Err(LensError::ResponseError(_))
        ));
    }
}
