use super::helpers::{
    DECODE_PATH, UPLOAD_PATH, build_config, decode_request, multipart_body, multipart_request,
    qr_jpeg_bytes, read_json, send, spawn_app, spawn_app_with,
};
use axum::http::StatusCode;
use serde_json::{Value, json};
use std::time::Duration;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_string_contains, header, method, path, query_param},
};

const STORED_PATH: &str = "2026/10/18/qr.jpg";

async fn mount_upload_ok(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(UPLOAD_PATH))
        .and(query_param("kid", "cliim"))
        .and(header("origin", "https://cli.im"))
        .and(header("referer", "https://cli.im/deqr/other"))
        .and(body_string_contains("name=\"Filedata\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "1",
            "info": "上传成功",
            "data": { "path": STORED_PATH }
        })))
        .mount(server)
        .await;
}

async fn mount_decode_ok(server: &MockServer, content: &str) {
    Mock::given(method("POST"))
        .and(path(DECODE_PATH))
        .and(header(
            "content-type",
            "application/x-www-form-urlencoded; charset=UTF-8",
        ))
        .and(body_string_contains("remove_background=1"))
        .and(body_string_contains("image_path=2026%2F10%2F18%2Fqr.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": 1,
            "message": "ok",
            "data": { "qrcode_content": content }
        })))
        .mount(server)
        .await;
}

async fn mount_decode_never_called(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(DECODE_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(server)
        .await;
}

#[tokio::test]
async fn valid_qr_image_is_decoded() {
    let upstream = MockServer::start().await;
    mount_upload_ok(&upstream).await;
    mount_decode_ok(&upstream, "TEST_DATA").await;
    let app = spawn_app(&upstream);

    let res = send(
        &app.app,
        decode_request(Some("qr.jpg"), Some("image/jpeg"), &qr_jpeg_bytes()),
    )
    .await;

    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key("x-request-id"));
    let body: Value = read_json(res).await;
    assert_eq!(body, json!({ "content": "TEST_DATA" }));
}

#[tokio::test]
async fn same_image_twice_yields_same_content() {
    let upstream = MockServer::start().await;
    mount_upload_ok(&upstream).await;
    mount_decode_ok(&upstream, "TEST_DATA").await;
    let app = spawn_app(&upstream);

    let mut contents = Vec::new();
    for _ in 0..2 {
        let res = send(
            &app.app,
            decode_request(Some("qr.jpg"), None, &qr_jpeg_bytes()),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = read_json(res).await;
        contents.push(body["content"].clone());
    }

    assert_eq!(contents[0], contents[1]);
    assert_eq!(contents[0], "TEST_DATA");
}

#[tokio::test]
async fn missing_content_type_is_forwarded_as_jpeg() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(UPLOAD_PATH))
        .and(body_string_contains("image/jpeg"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "1",
            "data": { "path": STORED_PATH }
        })))
        .expect(1)
        .mount(&upstream)
        .await;
    mount_decode_ok(&upstream, "TEST_DATA").await;
    let app = spawn_app(&upstream);

    let res = send(&app.app, decode_request(Some("qr.jpg"), None, &qr_jpeg_bytes())).await;

    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn text_file_misnamed_as_image_is_rejected() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(UPLOAD_PATH))
        .and(body_string_contains("filename=\"invalid.txt\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "0",
            "info": "上传文件类型不正确"
        })))
        .expect(1)
        .mount(&upstream)
        .await;
    mount_decode_never_called(&upstream).await;
    let app = spawn_app(&upstream);

    let res = send(
        &app.app,
        decode_request(
            Some("invalid.txt"),
            Some("text/plain"),
            b"This is not an image file",
        ),
    )
    .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = read_json(res).await;
    assert_eq!(body, json!({ "error": "上传文件类型不正确" }));
}

#[tokio::test]
async fn upload_rejection_without_info_uses_fallback_message() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(UPLOAD_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": 0 })))
        .mount(&upstream)
        .await;
    mount_decode_never_called(&upstream).await;
    let app = spawn_app(&upstream);

    let res = send(&app.app, decode_request(Some("qr.jpg"), None, &qr_jpeg_bytes())).await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = read_json(res).await;
    assert_eq!(body["error"], "Upload failed");
}

#[tokio::test]
async fn empty_file_never_reports_success() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(UPLOAD_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "-1",
            "info": "文件不能为空"
        })))
        .expect(1)
        .mount(&upstream)
        .await;
    mount_decode_never_called(&upstream).await;
    let app = spawn_app(&upstream);

    let res = send(&app.app, decode_request(Some("empty.jpg"), None, b"")).await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = read_json(res).await;
    assert!(body.get("error").is_some());
    assert!(body.get("content").is_none());
}

#[tokio::test]
async fn non_json_upload_answer_is_bad_gateway_with_excerpt() {
    let upstream = MockServer::start().await;
    let html = format!("<html><body>502 Bad Gateway{}</body></html>", " ".repeat(400));
    Mock::given(method("POST"))
        .and(path(UPLOAD_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(html))
        .mount(&upstream)
        .await;
    mount_decode_never_called(&upstream).await;
    let app = spawn_app(&upstream);

    let res = send(&app.app, decode_request(Some("qr.jpg"), None, &qr_jpeg_bytes())).await;

    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    let body: Value = read_json(res).await;
    let message = body["error"].as_str().expect("error must be a string");
    assert!(message.starts_with("Upload API returned non-JSON: <html><body>502 Bad Gateway"));
    let excerpt = message.trim_start_matches("Upload API returned non-JSON: ");
    assert_eq!(excerpt.chars().count(), 200);
}

#[tokio::test]
async fn non_json_decode_answer_is_bad_gateway() {
    let upstream = MockServer::start().await;
    mount_upload_ok(&upstream).await;
    Mock::given(method("POST"))
        .and(path(DECODE_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .expect(1)
        .mount(&upstream)
        .await;
    let app = spawn_app(&upstream);

    let res = send(&app.app, decode_request(Some("qr.jpg"), None, &qr_jpeg_bytes())).await;

    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    let body: Value = read_json(res).await;
    assert_eq!(
        body["error"],
        "Decode API returned non-JSON: Internal Server Error"
    );
}

#[tokio::test]
async fn decode_rejection_carries_upstream_message() {
    let upstream = MockServer::start().await;
    mount_upload_ok(&upstream).await;
    Mock::given(method("POST"))
        .and(path(DECODE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": 0,
            "message": "未识别到二维码"
        })))
        .mount(&upstream)
        .await;
    let app = spawn_app(&upstream);

    let res = send(&app.app, decode_request(Some("qr.jpg"), None, &qr_jpeg_bytes())).await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = read_json(res).await;
    assert_eq!(body["error"], "未识别到二维码");
}

#[tokio::test]
async fn decode_status_as_string_is_not_success() {
    let upstream = MockServer::start().await;
    mount_upload_ok(&upstream).await;
    Mock::given(method("POST"))
        .and(path(DECODE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "1",
            "data": { "qrcode_content": "TEST_DATA" }
        })))
        .mount(&upstream)
        .await;
    let app = spawn_app(&upstream);

    let res = send(&app.app, decode_request(Some("qr.jpg"), None, &qr_jpeg_bytes())).await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = read_json(res).await;
    assert_eq!(body["error"], "Decode failed");
}

#[tokio::test]
async fn unreachable_upstream_is_bad_gateway() {
    let app = spawn_app_with(build_config(
        "http://127.0.0.1:1/upload.php?kid=cliim".into(),
        "http://127.0.0.1:1/v1/detect_binary".into(),
    ));

    let res = send(&app.app, decode_request(Some("qr.jpg"), None, &qr_jpeg_bytes())).await;

    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    let body: Value = read_json(res).await;
    let message = body["error"].as_str().expect("error must be a string");
    assert!(message.starts_with("Upload API unreachable"), "got: {message}");
}

#[tokio::test]
async fn slow_upstream_times_out_as_bad_gateway() {
    let upstream = MockServer::start().await;
    mount_upload_ok(&upstream).await;
    Mock::given(method("POST"))
        .and(path(DECODE_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "status": 1, "data": { "qrcode_content": "late" } }))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&upstream)
        .await;
    let app = spawn_app(&upstream);

    let res = send(&app.app, decode_request(Some("qr.jpg"), None, &qr_jpeg_bytes())).await;

    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    let body: Value = read_json(res).await;
    assert_eq!(body["error"], "Decode API unreachable: request timed out");
}

#[tokio::test]
async fn request_without_file_field_is_unprocessable() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&upstream)
        .await;
    let app = spawn_app(&upstream);

    let (boundary, body) = multipart_body("image", Some("qr.jpg"), None, &qr_jpeg_bytes());
    let res = send(&app.app, multipart_request(&boundary, body)).await;

    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = read_json(res).await;
    assert_eq!(body["error"], "Missing file field");
}

#[tokio::test]
async fn oversized_upload_is_refused_before_relaying() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&upstream)
        .await;
    let mut config = build_config(
        format!("{}{}", upstream.uri(), UPLOAD_PATH),
        format!("{}{}", upstream.uri(), DECODE_PATH),
    );
    config.max_upload_bytes = 64;
    let app = spawn_app_with(config);

    let res = send(
        &app.app,
        decode_request(Some("big.jpg"), None, &vec![b'x'; 4096]),
    )
    .await;

    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let body: Value = read_json(res).await;
    assert!(body.get("error").is_some());
}

#[tokio::test]
async fn failing_request_does_not_affect_concurrent_success() {
    let upstream = MockServer::start().await;
    mount_upload_ok(&upstream).await;
    mount_decode_ok(&upstream, "TEST_DATA").await;
    let healthy = spawn_app(&upstream);
    let broken = spawn_app_with(build_config(
        "http://127.0.0.1:1/upload.php?kid=cliim".into(),
        "http://127.0.0.1:1/v1/detect_binary".into(),
    ));

    let (good, bad) = tokio::join!(
        send(
            &healthy.app,
            decode_request(Some("qr.jpg"), None, &qr_jpeg_bytes()),
        ),
        send(
            &broken.app,
            decode_request(Some("qr.jpg"), None, &qr_jpeg_bytes()),
        ),
    );

    assert_eq!(good.status(), StatusCode::OK);
    assert_eq!(bad.status(), StatusCode::BAD_GATEWAY);
    let body: Value = read_json(good).await;
    assert_eq!(body["content"], "TEST_DATA");
}

#[tokio::test]
async fn interleaved_success_and_rejection_on_one_router() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(UPLOAD_PATH))
        .and(body_string_contains("filename=\"invalid.txt\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "0",
            "info": "上传文件类型不正确"
        })))
        .with_priority(1)
        .mount(&upstream)
        .await;
    mount_upload_ok(&upstream).await;
    mount_decode_ok(&upstream, "TEST_DATA").await;
    let app = spawn_app(&upstream);

    let (good, bad) = tokio::join!(
        send(
            &app.app,
            decode_request(Some("qr.jpg"), Some("image/jpeg"), &qr_jpeg_bytes()),
        ),
        send(
            &app.app,
            decode_request(Some("invalid.txt"), Some("text/plain"), b"not an image"),
        ),
    );

    assert_eq!(good.status(), StatusCode::OK);
    assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
    let body: Value = read_json(good).await;
    assert_eq!(body, json!({ "content": "TEST_DATA" }));
}

#[tokio::test]
async fn upload_bytes_reach_upstream_unchanged() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(UPLOAD_PATH))
        .and(body_string_contains("JFIF-stand-in:TEST_DATA"))
        .and(body_string_contains("filename=\"qr.jpg\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "1",
            "data": { "path": STORED_PATH }
        })))
        .expect(1)
        .mount(&upstream)
        .await;
    mount_decode_ok(&upstream, "TEST_DATA").await;
    let app = spawn_app(&upstream);

    let res = send(&app.app, decode_request(Some("qr.jpg"), None, &qr_jpeg_bytes())).await;

    assert_eq!(res.status(), StatusCode::OK);
}
