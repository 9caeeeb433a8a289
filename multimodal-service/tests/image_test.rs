mod common;

use bytes::Bytes;
use common::{file_part, json_body, TestApp, PNG_BYTES};
use multimodal_service::services::providers::mock::MockBehavior;
use multimodal_service::services::Part;
use reqwest::multipart::Form;
use serde_json::json;

#[tokio::test]
async fn image_is_sent_inline_before_prompt() {
    let app = TestApp::spawn(MockBehavior::Reply("A tiny cat.".to_string())).await;

    let form = Form::new()
        .part("image", file_part(PNG_BYTES, "cat.png", "image/png"))
        .text("prompt", "What animal is this?");
    let response = app.post_form("/image", form).await;

    let (status, body) = json_body(response).await;
    assert_eq!(status, 200);
    assert_eq!(body, json!({ "text": "A tiny cat." }));

    let calls = app.provider.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0].parts,
        vec![
            Part::inline("image/png", Bytes::from_static(PNG_BYTES)),
            Part::text("What animal is this?"),
        ]
    );
}

#[tokio::test]
async fn image_without_prompt_uses_default() {
    let app = TestApp::spawn(MockBehavior::Echo).await;

    let form = Form::new().part("image", file_part(PNG_BYTES, "cat.png", "image/png"));
    let response = app.post_form("/image", form).await;

    let (status, body) = json_body(response).await;
    assert_eq!(status, 200);
    assert_eq!(body["text"], "Describe this image.");
}

#[tokio::test]
async fn image_with_empty_prompt_uses_default() {
    let app = TestApp::spawn(MockBehavior::Echo).await;

    let form = Form::new()
        .part("image", file_part(PNG_BYTES, "cat.png", "image/png"))
        .text("prompt", "");
    let response = app.post_form("/image", form).await;

    let (_, body) = json_body(response).await;
    assert_eq!(body["text"], "Describe this image.");
}

#[tokio::test]
async fn image_mime_type_follows_file_name() {
    let app = TestApp::spawn(MockBehavior::Echo).await;

    // Declared content type is ignored in favour of the extension.
    let form = Form::new().part(
        "image",
        file_part(PNG_BYTES, "scan.webp", "application/octet-stream"),
    );
    app.post_form("/image", form).await;

    let form = Form::new().part("image", file_part(PNG_BYTES, "blob", "image/png"));
    app.post_form("/image", form).await;

    let calls = app.provider.calls();
    assert_eq!(calls.len(), 2);
    assert!(matches!(
        &calls[0].parts[0],
        Part::InlineData { mime_type, .. } if mime_type == "image/webp"
    ));
    assert!(matches!(
        &calls[1].parts[0],
        Part::InlineData { mime_type, .. } if mime_type == "image/jpeg"
    ));
}

#[tokio::test]
async fn image_temp_file_is_removed_after_success() {
    let app = TestApp::spawn(MockBehavior::Echo).await;

    let form = Form::new().part("image", file_part(PNG_BYTES, "cat.png", "image/png"));
    let response = app.post_form("/image", form).await;

    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(app.upload_file_count(), 0);
}

#[tokio::test]
async fn image_temp_file_is_removed_after_upstream_failure() {
    let app = TestApp::spawn(MockBehavior::Fail("model unavailable".to_string())).await;

    let form = Form::new().part("image", file_part(PNG_BYTES, "cat.png", "image/png"));
    let response = app.post_form("/image", form).await;

    let (status, body) = json_body(response).await;
    assert_eq!(status, 500);
    assert!(body["error"].as_str().unwrap().contains("model unavailable"));
    assert_eq!(app.upload_file_count(), 0);
}

#[tokio::test]
async fn image_missing_file_is_rejected() {
    let app = TestApp::spawn(MockBehavior::Echo).await;

    let form = Form::new().text("prompt", "What is this?");
    let response = app.post_form("/image", form).await;

    let (status, body) = json_body(response).await;
    assert_eq!(status, 400);
    assert_eq!(body, json!({ "error": "Image file is required" }));
    assert!(app.provider.calls().is_empty());
}

#[tokio::test]
async fn image_field_without_filename_is_not_a_file() {
    let app = TestApp::spawn(MockBehavior::Echo).await;

    let form = Form::new().text("image", "not a file");
    let response = app.post_form("/image", form).await;

    let (status, body) = json_body(response).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "Image file is required");
}

#[tokio::test]
async fn image_with_empty_filename_is_rejected() {
    let app = TestApp::spawn(MockBehavior::Echo).await;

    let form = Form::new().part("image", file_part(b"", "", "application/octet-stream"));
    let response = app.post_form("/image", form).await;

    let (status, body) = json_body(response).await;
    assert_eq!(status, 400);
    assert_eq!(body, json!({ "error": "No image selected" }));
    assert!(app.provider.calls().is_empty());
}

#[tokio::test]
async fn image_without_multipart_body_is_rejected() {
    let app = TestApp::spawn(MockBehavior::Echo).await;

    let response = app.post_json("/image", json!({ "prompt": "hi" })).await;

    let (status, body) = json_body(response).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "Image file is required");
}
