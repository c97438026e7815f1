use std::sync::Arc;

use assistive_gateway::prelude::*;
use assistive_gateway::proxy::Action;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn gemini(server: &MockServer) -> GeminiClient {
    GeminiClient::new(GeminiConfig::new("test-api-key").with_base_url(server.uri())).unwrap()
}

fn text_response(text: &str) -> serde_json::Value {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }],
        "modelVersion": "gemini-2.5-flash"
    })
}

#[tokio::test]
async fn generate_content_sends_key_header_and_plain_prompt() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/gemini-2.5-flash:generateContent"))
        .and(header("x-goog-api-key", "test-api-key"))
        .and(body_partial_json(json!({
            "contents": [{ "role": "user", "parts": [{ "text": "Hola" }] }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_response("¡Hola!")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let text = gemini(&mock_server)
        .generate(GenerationRequest::text("Hola"))
        .await
        .unwrap();
    assert_eq!(text, "¡Hola!");
}

#[tokio::test]
async fn structured_request_carries_response_schema() {
    let mock_server = MockServer::start().await;
    let schema = CatalogKind::Devices.envelope_schema();

    Mock::given(method("POST"))
        .and(path("/models/gemini-2.5-flash:generateContent"))
        .and(body_partial_json(json!({
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": schema.as_value(),
            }
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(text_response("{\"dispositivos\": []}")),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let proxy = GenerationProxy::new(Arc::new(gemini(&mock_server)));
    let body = proxy
        .handle(Action::FetchCatalog {
            kind: CatalogKind::Devices,
            prompt: CatalogKind::Devices.prompt(DisabilityCategory::Visual),
        })
        .await
        .unwrap();
    assert_eq!(body, json!({ "data": { "dispositivos": [] } }));
}

#[tokio::test]
async fn provider_error_is_echoed_as_bad_gateway() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/gemini-2.5-flash:generateContent"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {
                "code": 400,
                "message": "API key not valid. Please pass a valid API key.",
                "status": "INVALID_ARGUMENT"
            }
        })))
        .mount(&mock_server)
        .await;

    let err = gemini(&mock_server)
        .generate(GenerationRequest::text("Hola"))
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), 502);
    match &err {
        GatewayError::UpstreamProvider { status, message, details } => {
            assert_eq!(*status, 400);
            assert!(message.contains("API key not valid"));
            assert_eq!(details.as_ref().unwrap()["error"]["status"], "INVALID_ARGUMENT");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    let body = serde_json::to_value(err.to_body()).unwrap();
    assert_eq!(body["details"]["providerStatus"], 400);
}

#[tokio::test]
async fn blocked_prompt_is_a_provider_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/gemini-2.5-flash:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "promptFeedback": { "blockReason": "SAFETY" }
        })))
        .mount(&mock_server)
        .await;

    let err = gemini(&mock_server)
        .generate(GenerationRequest::text("Hola"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("SAFETY"));
}

#[tokio::test]
async fn imagen_predict_returns_data_url() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/imagen-4.0-generate-001:predict"))
        .and(header("x-goog-api-key", "test-api-key"))
        .and(body_partial_json(json!({
            "parameters": {
                "sampleCount": 1,
                "aspectRatio": "4:3",
                "outputOptions": { "mimeType": "image/jpeg" }
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "predictions": [{ "bytesBase64Encoded": "b64-image", "mimeType": "image/jpeg" }]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let proxy = GenerationProxy::new(Arc::new(gemini(&mock_server)));
    let body = proxy
        .handle(Action::GenerateImageForTerm {
            term: "Lupa electrónica".into(),
        })
        .await
        .unwrap();
    assert_eq!(body, json!({ "imageUrl": "data:image/jpeg;base64,b64-image" }));
}

#[tokio::test]
async fn imagen_without_predictions_yields_empty_url() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/imagen-4.0-generate-001:predict"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&mock_server)
        .await;

    let proxy = GenerationProxy::new(Arc::new(gemini(&mock_server)));
    let body = proxy
        .handle(Action::GenerateImageForTerm { term: "Bastón".into() })
        .await
        .unwrap();
    assert_eq!(body, json!({ "imageUrl": "" }));
}

#[tokio::test]
async fn candidate_without_content_is_not_an_empty_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/gemini-2.5-flash:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "finishReason": "SAFETY" }]
        })))
        .mount(&mock_server)
        .await;

    let proxy = GenerationProxy::new(Arc::new(gemini(&mock_server)));
    let err = proxy
        .handle(Action::GenerateText { prompt: "hola".into() })
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), 502);
    match &err {
        GatewayError::UpstreamProvider { status, message, details } => {
            assert_eq!(*status, 200);
            assert!(message.contains("finishReason: SAFETY"), "{message}");
            assert_eq!(details.as_ref().unwrap()[0]["finishReason"], "SAFETY");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn blocked_candidate_with_partial_text_is_an_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/gemini-2.5-flash:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": "Claro, aquí" }] },
                "finishReason": "RECITATION"
            }]
        })))
        .mount(&mock_server)
        .await;

    let err = gemini(&mock_server)
        .generate(GenerationRequest::text("Hola"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("RECITATION"));
}

#[tokio::test]
async fn empty_candidate_list_is_an_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/gemini-2.5-flash:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
        .mount(&mock_server)
        .await;

    let err = gemini(&mock_server)
        .generate(GenerationRequest::structured("Lista", SchemaDescriptor::object()))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::UpstreamProvider { status: 200, .. }), "{err:?}");
}

#[tokio::test]
async fn unreachable_provider_is_a_network_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = GeminiClient::new(
        GeminiConfig::new("test-api-key").with_base_url(format!("http://{addr}")),
    )
    .unwrap();
    let err = client
        .generate(GenerationRequest::text("Hola"))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::UpstreamNetwork(_)), "{err:?}");
    assert_eq!(err.status_code(), 502);
}
