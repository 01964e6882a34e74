mod common;

use std::time::Duration;

use common::{harness, json, spawn};
use ebook_portal::{
    domain::LeadForm,
    download::{DownloadError, DownloadFlow, LeadField},
};
use poem::{Request, Response, Route, endpoint::make_sync, get, http::StatusCode, post};
use serde_json::json;

const TIMEOUT: Duration = Duration::from_secs(5);
const PDF_BYTES: &[u8] = b"%PDF-1.7 fake ebook";

fn lead() -> LeadForm {
    LeadForm {
        name: "Ana Lima".into(),
        email: "ana@example.com".into(),
        mobile: "+91 98765 43210".into(),
    }
}

#[tokio::test]
async fn grant_then_fetch_then_save() {
    // the signed URL is only known once the server has bound its port
    let route = Route::new()
        .at(
            "/api/ebooks/ielts-guide/download",
            post(make_sync(|req: Request| {
                let host = req
                    .headers()
                    .get("host")
                    .and_then(|h| h.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                json(
                    StatusCode::OK,
                    json!({
                        "status": true,
                        "data": { "downloadUrl": format!("http://{host}/storage/pdfs/ielts-guide.pdf?sig=xyz") }
                    }),
                )
            })),
        )
        .at(
            "/storage/pdfs/ielts-guide.pdf",
            get(make_sync(|_: Request| {
                Response::builder()
                    .content_type("application/pdf")
                    .body(PDF_BYTES)
            })),
        );
    let backend = spawn(route).await;
    let h = harness(&backend.origin, &[("token", "abc")], TIMEOUT);
    let dir = tempfile::tempdir().unwrap();

    let flow = DownloadFlow::new(h.api.ebooks(), h.api.public_service().clone());
    let path = flow.run("ielts-guide", &lead(), dir.path()).await.unwrap();

    assert_eq!(path, dir.path().join("ielts-guide.pdf"));
    assert_eq!(std::fs::read(&path).unwrap(), PDF_BYTES);

    let requests = backend.recorder.all();
    assert_eq!(requests.len(), 2);
    assert_eq!(
        requests[0].json(),
        json!({ "name": "Ana Lima", "email": "ana@example.com", "mobile": "+919876543210" })
    );
    assert_eq!(requests[1].query.as_deref(), Some("sig=xyz"));
    assert!(requests.iter().all(|r| r.authorization.is_none()));
}

#[tokio::test]
async fn invalid_form_never_reaches_the_server() {
    let backend = spawn(Route::new()).await;
    let h = harness(&backend.origin, &[], TIMEOUT);
    let dir = tempfile::tempdir().unwrap();

    let flow = DownloadFlow::new(h.api.ebooks(), h.api.public_service().clone());
    let form = LeadForm {
        email: "nope".into(),
        ..lead()
    };
    match flow.run("ielts-guide", &form, dir.path()).await {
        Err(DownloadError::Invalid(e)) => {
            assert_eq!(e.errors.len(), 1);
            assert_eq!(e.errors[0].0, LeadField::Email);
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(backend.recorder.all().is_empty());
}

#[tokio::test]
async fn expired_signed_url_is_reported_without_ending_session() {
    let route = Route::new()
        .at(
            "/api/ebooks/guide/download",
            post(make_sync(|req: Request| {
                let host = req
                    .headers()
                    .get("host")
                    .and_then(|h| h.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                json(
                    StatusCode::OK,
                    json!({ "status": true, "data": { "url": format!("http://{host}/storage/guide.pdf"), "fileName": "Guide.pdf" } }),
                )
            })),
        )
        .at(
            "/storage/guide.pdf",
            get(make_sync(|_: Request| {
                Response::builder()
                    .status(StatusCode::FORBIDDEN)
                    .body("expired")
            })),
        );
    let backend = spawn(route).await;
    let h = harness(&backend.origin, &[("token", "abc")], TIMEOUT);
    let dir = tempfile::tempdir().unwrap();

    let flow = DownloadFlow::new(h.api.ebooks(), h.api.public_service().clone());
    let err = flow.run("guide", &lead(), dir.path()).await.unwrap_err();
    match err {
        DownloadError::Api(e) => assert_eq!(e.status(), Some(403)),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!dir.path().join("Guide.pdf").exists());
    assert_eq!(h.navigator.redirects(), 0);
    assert_eq!(h.session.token().await.unwrap().as_deref(), Some("abc"));
}
