/*!
 * End-to-end tests for the HTTP endpoints
 */

use std::sync::Arc;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use tower::ServiceExt;

use doc_translator::document::WordDocument;
use doc_translator::document_processor::DocumentTranslator;
use doc_translator::translation::PacingPolicy;
use doc_translator::web::{AppState, create_router};

use crate::common::{
    StubTranslator, docx_bytes, init_test_logging, multipart_body, pdf_bytes, pdf_page_contents,
};

const BOUNDARY: &str = "----doc-translator-test-boundary";
const BODY_LIMIT: usize = 10 * 1024 * 1024;

fn app(translator: Arc<StubTranslator>) -> axum::Router {
    init_test_logging();
    let documents = DocumentTranslator::new(translator, PacingPolicy::unthrottled());
    create_router(AppState::new(documents, BODY_LIMIT))
}

fn upload_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/translate-file")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Test the health probe
#[tokio::test]
async fn test_health_shouldReturnOk() {
    let response = app(Arc::new(StubTranslator::new()))
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "ok");
}

/// Test the one-paragraph docx scenario end to end
#[tokio::test]
async fn test_translate_file_withDocx_shouldReturnTranslatedAttachment() {
    let translator = Arc::new(StubTranslator::new().with_reply("Hello", "Bonjour"));
    let source = docx_bytes(r#"<w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:t>Hello</w:t></w:r></w:p>"#);
    let body = multipart_body(BOUNDARY, Some(("greeting.docx", &source[..])), &[("target_lang", "French")]);

    let response = app(translator.clone()).oneshot(upload_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(
        headers[header::CONTENT_TYPE],
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
    );
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=translated_greeting.docx"
    );
    assert_eq!(headers["x-units-total"], "1");
    assert_eq!(headers["x-units-translated"], "1");
    assert_eq!(headers["x-units-skipped"], "0");

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let doc = WordDocument::load(&bytes).unwrap();
    let units = doc.extract().unwrap();
    assert_eq!(units[0].text, "Bonjour");
    assert_eq!(units[0].style_name(), Some("heading 1"));
    assert_eq!(translator.calls(), vec![("Hello".to_string(), "French".to_string())]);
}

/// Test the target language defaults to English
#[tokio::test]
async fn test_translate_file_withoutTargetLang_shouldDefaultToEnglish() {
    let translator = Arc::new(StubTranslator::new());
    let body = multipart_body(BOUNDARY, Some(("note.txt", &b"bonjour"[..])), &[]);

    let response = app(translator.clone()).oneshot(upload_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"[en] bonjour");
    assert_eq!(translator.calls()[0].1, "en");
}

/// Test the PDF output keeps the uploaded page content
#[tokio::test]
async fn test_translate_file_withPdf_shouldKeepPageContent() {
    let translator = Arc::new(StubTranslator::new());
    let source = pdf_bytes(&["Quarterly results"]);
    let body = multipart_body(BOUNDARY, Some(("results.pdf", &source[..])), &[("target_lang", "de")]);

    let response = app(translator).oneshot(upload_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(pdf_page_contents(&bytes), pdf_page_contents(&source));
}

/// Test unsupported formats return the error payload with status 200
#[tokio::test]
async fn test_translate_file_withUnsupportedExtension_shouldReturnErrorPayload() {
    let translator = Arc::new(StubTranslator::new());
    let body = multipart_body(BOUNDARY, Some(("data.xyz", &b"\x00\x01\x02"[..])), &[("target_lang", "fr")]);

    let response = app(translator.clone()).oneshot(upload_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["error"], "Unsupported file format");
    assert_eq!(translator.call_count(), 0);
}

/// Test processing failures return the error payload with status 200
#[tokio::test]
async fn test_translate_file_withCorruptDocx_shouldReturnProcessingError() {
    let body = multipart_body(BOUNDARY, Some(("broken.docx", &b"PK not really"[..])), &[]);

    let response = app(Arc::new(StubTranslator::new())).oneshot(upload_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert!(json["error"].as_str().unwrap().starts_with("Error processing file:"));
}

/// Test a text translation failure fails the request
#[tokio::test]
async fn test_translate_file_withFailingTextTranslation_shouldReturnProcessingError() {
    let translator = Arc::new(StubTranslator::new().failing_on("boom"));
    let body = multipart_body(BOUNDARY, Some(("notes.txt", &b"boom"[..])), &[]);

    let response = app(translator).oneshot(upload_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert!(json["error"].as_str().unwrap().contains("stub refused the call"));
}

/// Test a form without a file is rejected
#[tokio::test]
async fn test_translate_file_withoutFile_shouldReturnUnprocessableEntity() {
    let body = multipart_body(BOUNDARY, None, &[("target_lang", "fr")]);

    let response = app(Arc::new(StubTranslator::new())).oneshot(upload_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json_body(response).await["error"], "Missing required field: file");
}

/// Test a non-multipart body is rejected
#[tokio::test]
async fn test_translate_file_withJsonBody_shouldReturnUnprocessableEntity() {
    let request = Request::builder()
        .method("POST")
        .uri("/translate-file")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))
        .unwrap();

    let response = app(Arc::new(StubTranslator::new())).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

/// Test CORS preflight is allowed from any origin
#[tokio::test]
async fn test_cors_preflight_shouldAllowAnyOrigin() {
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/translate-file")
        .header(header::ORIGIN, "http://example.com")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();

    let response = app(Arc::new(StubTranslator::new())).oneshot(request).await.unwrap();

    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}
