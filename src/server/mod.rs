pub mod pages;

use actix_web::{get, post, web, App, HttpResponse, HttpServer, Responder};
use serde::Deserialize;

use crate::config::{Config, DEFAULT_MODEL_ID, DEFAULT_PORT, DEFAULT_PREVIEW_MAX_HEIGHT};
use crate::hub::HubClient;
use crate::logger;
use crate::models::DescribeRequest;

/// Prompt pre-filled into the form on first load.
pub const DEFAULT_PROMPT: &str = "Describe this image in a paragraph";

const MISSING_INPUT_WARNING: &str = "Please enter an image URL and a prompt.";

#[derive(Clone)]
pub struct AppState {
    pub client: HubClient,
    pub preview_max_height: u32,
    pub model_label: String,
}

#[derive(Debug, Deserialize)]
pub struct DescribeForm {
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub prompt: String,
}

fn html_response(body: String) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(body)
}

fn render(
    state: &AppState,
    image_url: &str,
    prompt: &str,
    banner: Option<String>,
    preview: Option<String>,
    response: Option<String>,
) -> HttpResponse {
    let model = pages::escape_html(&state.model_label);
    let image_url = pages::escape_html(image_url);
    let prompt = pages::escape_html(prompt);

    html_response(pages::render_page(|page| {
        page.replace("{{MODEL_ID}}", &model)
            .replace("{{IMAGE_URL_VALUE}}", &image_url)
            .replace("{{PROMPT_VALUE}}", &prompt)
            .replace("{{BANNER_BLOCK}}", &banner.unwrap_or_default())
            .replace("{{PREVIEW_BLOCK}}", &preview.unwrap_or_default())
            .replace("{{RESPONSE_BLOCK}}", &response.unwrap_or_default())
    }))
}

#[get("/")]
async fn index(state: web::Data<AppState>) -> impl Responder {
    render(&state, "", DEFAULT_PROMPT, None, None, None)
}

/// Handles one form submission.
///
/// Empty inputs produce a warning and no network traffic. Otherwise the
/// preview fetch and the inference call each get their own catch-all: a
/// failed preview renders an error in its slot and the inference still runs,
/// since the endpoint fetches the image URL on its own.
#[post("/describe")]
async fn describe(state: web::Data<AppState>, form: web::Form<DescribeForm>) -> impl Responder {
    let image_url = form.image_url.trim().to_string();
    let prompt = form.prompt.trim().to_string();

    if image_url.is_empty() || prompt.is_empty() {
        log::warn!("Submission rejected: image URL or prompt missing");
        let banner = pages::warning_banner(MISSING_INPUT_WARNING);
        return render(&state, &image_url, &prompt, Some(banner), None, None);
    }

    let _timer = logger::timer("describe");

    let preview = match state
        .client
        .preview()
        .fetch(&image_url, state.preview_max_height)
        .await
    {
        Ok(preview) => pages::preview_block(&preview),
        Err(e) => {
            log::error!("Preview failed for {}: {}", image_url, e);
            pages::error_banner(&format!("Unable to load image. Error: {}", e))
        }
    };

    let request = DescribeRequest {
        prompt: prompt.clone(),
        image_url: image_url.clone(),
        model_id: None,
        max_tokens: None,
        temperature: None,
    };

    let response = match state.client.chat().describe(request).await {
        Ok(response) => {
            if let Some(usage) = &response.usage {
                log::debug!(
                    "Token usage: prompt={:?} completion={:?}",
                    usage.prompt_tokens,
                    usage.completion_tokens
                );
            }
            pages::response_block(&response.text)
        }
        Err(e) => {
            log::error!("Inference failed: {}", e);
            pages::error_banner(&format!("An error occurred: {}", e))
        }
    };

    render(
        &state,
        &image_url,
        &prompt,
        None,
        Some(preview),
        Some(response),
    )
}

/// Runs the demo server until shutdown.
pub async fn run(config: Config, client: HubClient) -> std::io::Result<()> {
    let port = config.port.unwrap_or(DEFAULT_PORT);
    let state = AppState {
        client,
        preview_max_height: config
            .preview_max_height
            .unwrap_or(DEFAULT_PREVIEW_MAX_HEIGHT),
        model_label: config
            .hub
            .as_ref()
            .map(|hub| hub.resolved_model_id())
            .unwrap_or_else(|| DEFAULT_MODEL_ID.to_string()),
    };

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .service(index)
            .service(describe)
    })
    .bind(("127.0.0.1", port))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HubConfig;
    use actix_web::test::{call_service, init_service, read_body, TestRequest};
    use serde_json::json;
    use std::io::Cursor;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_state(base_url: &str) -> AppState {
        AppState {
            client: HubClient::new(
                HubConfig::new()
                    .with_api_key("hf_test_key")
                    .with_base_url(base_url),
            )
            .unwrap(),
            preview_max_height: 600,
            model_label: "test-model".to_string(),
        }
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::DynamicImage::ImageRgb8(image::RgbImage::new(width, height));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageOutputFormat::Png)
            .unwrap();
        bytes
    }

    async fn mount_chat_success(server: &MockServer, content: &str) {
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "model": "test-model",
                "choices": [{
                    "message": {"role": "assistant", "content": content},
                    "finish_reason": "stop"
                }]
            })))
            .mount(server)
            .await;
    }

    async fn submit(state: AppState, image_url: &str, prompt: &str) -> String {
        let app = init_service(
            App::new()
                .app_data(web::Data::new(state))
                .service(index)
                .service(describe),
        )
        .await;

        let req = TestRequest::post()
            .uri("/describe")
            .set_form([("image_url", image_url), ("prompt", prompt)])
            .to_request();
        let resp = call_service(&app, req).await;
        assert!(resp.status().is_success());
        String::from_utf8_lossy(&read_body(resp).await).into_owned()
    }

    #[actix_web::test]
    async fn test_index_prefills_default_prompt() {
        let server = MockServer::start().await;
        let app = init_service(
            App::new()
                .app_data(web::Data::new(test_state(&server.uri())))
                .service(index),
        )
        .await;

        let resp = call_service(&app, TestRequest::get().uri("/").to_request()).await;
        assert!(resp.status().is_success());
        let body = String::from_utf8_lossy(&read_body(resp).await).into_owned();
        assert!(body.contains(DEFAULT_PROMPT));
        assert!(body.contains("test-model"));
    }

    #[actix_web::test]
    async fn test_empty_submission_warns_without_network() {
        let server = MockServer::start().await;
        let body = submit(test_state(&server.uri()), "", "What is shown?").await;

        assert!(body.contains(MISSING_INPUT_WARNING));
        assert!(!body.contains("Model Response"));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[actix_web::test]
    async fn test_empty_prompt_also_warns() {
        let server = MockServer::start().await;
        let body = submit(test_state(&server.uri()), "https://e.com/a.png", "   ").await;

        assert!(body.contains(MISSING_INPUT_WARNING));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[actix_web::test]
    async fn test_successful_submission_renders_preview_and_response() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/dog.png"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(png_bytes(4, 10), "image/png"))
            .mount(&server)
            .await;

        let image_url = format!("{}/dog.png", server.uri());
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_string_contains("What breed is this?"))
            .and(body_string_contains(image_url.as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{
                    "message": {"role": "assistant", "content": "A labrador."},
                    "finish_reason": "stop"
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let body = submit(test_state(&server.uri()), &image_url, "What breed is this?").await;

        assert!(body.contains("Model Response"));
        assert!(body.contains("A labrador."));
        assert!(body.contains(&format!("Source: {}", image_url)));
        // The submitted values survive the round trip into the form.
        assert!(body.contains("What breed is this?"));

        let chat_requests = server
            .received_requests()
            .await
            .unwrap()
            .into_iter()
            .filter(|r| r.url.path() == "/chat/completions")
            .count();
        assert_eq!(chat_requests, 1);
    }

    #[actix_web::test]
    async fn test_inference_failure_shows_error_banner() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/dog.png"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(png_bytes(4, 4), "image/png"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("quota exceeded"))
            .mount(&server)
            .await;

        let image_url = format!("{}/dog.png", server.uri());
        let body = submit(test_state(&server.uri()), &image_url, "Describe").await;

        assert!(body.contains("An error occurred"));
        assert!(!body.contains("Model Response"));
        // Preview still rendered.
        assert!(body.contains("data:image/png;base64,"));
    }

    #[actix_web::test]
    async fn test_preview_failure_does_not_block_inference() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/gone.png"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        mount_chat_success(&server, "A description anyway.").await;

        let image_url = format!("{}/gone.png", server.uri());
        let body = submit(test_state(&server.uri()), &image_url, "Describe").await;

        assert!(body.contains("Unable to load image"));
        assert!(body.contains("A description anyway."));
    }
}
