//! Router-level tests against an in-memory SQLite store.

use std::{collections::HashMap, sync::Arc, time::Duration};

use archive_store_sqlite::SqliteStore;
use axum::{
  Form, Json, Router,
  body::Body,
  http::{HeaderName, HeaderValue, Request, StatusCode},
  routing::post,
};
use serde_json::{Value, json};
use tower::ServiceExt as _;

use crate::{
  AppState, api_router,
  captcha::{Captcha, RemoteVerifier},
};

// ─── Harness ─────────────────────────────────────────────────────────────────

async fn state() -> AppState<SqliteStore> {
  let store = SqliteStore::open_in_memory().await.expect("in-memory store");
  AppState::new(Arc::new(store))
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
  call_with(app, method, uri, body, &[]).await
}

async fn call_with(
  app: &Router,
  method: &str,
  uri: &str,
  body: Option<Value>,
  headers: &[(&str, &str)],
) -> (StatusCode, Value) {
  let mut req = Request::builder().method(method).uri(uri);
  for (name, value) in headers {
    req = req.header(*name, *value);
  }
  let req = match body {
    Some(body) => req
      .header("content-type", "application/json")
      .body(Body::from(body.to_string())),
    None => req.body(Body::empty()),
  }
  .unwrap();

  let resp = app.clone().oneshot(req).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let value = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap()
  };
  (status, value)
}

/// Create a work and return `(id, edit_token)`.
async fn create_work(app: &Router, title: &str, tags: Value) -> (String, String) {
  let mut body = json!({
    "title": title,
    "summary": "A quiet story.",
    "chapter_body": "It was a *dark* night.",
  });
  if let (Some(body), Some(tags)) = (body.as_object_mut(), tags.as_object()) {
    body.extend(tags.clone());
  }
  let (status, resp) = call(app, "POST", "/works", Some(body)).await;
  assert_eq!(status, StatusCode::CREATED, "{resp}");
  (
    resp["work"]["work_id"].as_str().unwrap().to_owned(),
    resp["edit_token"].as_str().unwrap().to_owned(),
  )
}

/// A local siteverify stand-in: accepts the response token `good` when the
/// expected secret is sent.
async fn captcha_stub() -> String {
  let app = Router::new().route(
    "/verify",
    post(|Form(form): Form<HashMap<String, String>>| async move {
      let ok = form.get("secret").map(String::as_str) == Some("s3cret")
        && form.get("response").map(String::as_str) == Some("good");
      Json(json!({ "success": ok, "hostname": "localhost" }))
    }),
  );
  let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
  format!("http://{addr}/verify")
}

fn remote(url: &str) -> Captcha {
  Captcha::Remote(RemoteVerifier::new(url, "s3cret", Duration::from_secs(5)).unwrap())
}

// ─── Works ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_returns_token_and_rendered_chapter() {
  let app = api_router(state().await);

  let (status, resp) = call(
    &app,
    "POST",
    "/works",
    Some(json!({
      "title": "  Moonrise ",
      "author": "   ",
      "fandoms": ["Original Work", " Original Work ", ""],
      "chapter_body": "It was a *dark* <night>.",
    })),
  )
  .await;

  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(resp["work"]["title"], "Moonrise");
  assert_eq!(resp["work"]["author"], "Anonymous");
  assert_eq!(resp["work"]["rating"], "Not Rated");
  assert_eq!(resp["work"]["fandoms"], json!(["Original Work"]));
  assert_eq!(resp["work"]["chapter_count"], 1);
  assert!(resp["work"].get("token_hash").is_none());
  assert_eq!(resp["chapter"]["position"], 1);
  assert_eq!(resp["chapter"]["format"], "rich_text");
  assert_eq!(
    resp["chapter"]["rendered_html"],
    "It was a <em>dark</em> &lt;night&gt;."
  );
  assert_eq!(resp["edit_token"].as_str().unwrap().len(), 36);
}

#[tokio::test]
async fn create_validates_input() {
  let app = api_router(state().await);

  let cases = [
    json!({ "chapter_body": "x" }),
    json!({ "title": "  ", "chapter_body": "x" }),
    json!({ "title": "t" }),
    json!({ "title": "t", "chapter_body": " \n " }),
    json!({ "title": "t", "chapter_body": "x", "rating": "PG-13" }),
    json!({ "title": "t", "chapter_body": "x", "chapter_format": "markdown" }),
    json!({ "title": 7, "chapter_body": "x" }),
  ];
  for body in cases {
    let (status, resp) = call(&app, "POST", "/works", Some(body.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert!(resp["error"].is_string());
  }

  let (_, list) = call(&app, "GET", "/works", None).await;
  assert_eq!(list["total"], 0);
}

#[tokio::test]
async fn get_work_renders_html_chapters_sanitized() {
  let app = api_router(state().await);
  let (status, resp) = call(
    &app,
    "POST",
    "/works",
    Some(json!({
      "title": "Html",
      "chapter_body": "<p onclick=\"x()\">Hi</p><script>alert(1)</script>",
      "chapter_format": "html",
    })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  let id = resp["work"]["work_id"].as_str().unwrap();

  let (status, detail) = call(&app, "GET", &format!("/works/{id}"), None).await;
  assert_eq!(status, StatusCode::OK);
  let chapter = &detail["chapters"][0];
  assert_eq!(chapter["rendered_html"], "<p>Hi</p>");
  // The stored body is the raw submission.
  assert_eq!(chapter["body"], "<p onclick=\"x()\">Hi</p><script>alert(1)</script>");
}

#[tokio::test]
async fn unknown_work_is_404() {
  let app = api_router(state().await);
  let missing = uuid::Uuid::new_v4();

  for uri in [format!("/works/{missing}"), "/works/not-a-uuid".to_owned()] {
    let (status, resp) = call(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(resp["error"], "work not found");
  }
  let (status, _) = call(&app, "GET", &format!("/works/{missing}/comments"), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_filters_and_paginates() {
  let app = api_router(state().await);
  create_work(&app, "Star Trek fic", json!({ "fandoms": ["Star Trek"] })).await;
  create_work(&app, "Other", json!({ "freeforms": ["star trek"] })).await;
  create_work(&app, "Unrelated", json!({})).await;

  let (_, page) = call(&app, "GET", "/works?tag=STAR%20TREK", None).await;
  assert_eq!(page["total"], 2);

  let (_, page) = call(&app, "GET", "/works?q=unrel", None).await;
  assert_eq!(page["total"], 1);
  assert_eq!(page["works"][0]["title"], "Unrelated");

  let (_, page) = call(&app, "GET", "/works?page=abc", None).await;
  assert_eq!(page["page"], 1);
  assert_eq!(page["total_pages"], 1);
  assert_eq!(page["works"][0]["title"], "Unrelated");
}

// ─── Ownership ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn update_requires_matching_token() {
  let app = api_router(state().await);
  let (id, token) = create_work(&app, "Draft", json!({})).await;
  let uri = format!("/works/{id}");

  let (status, _) = call(&app, "PUT", &uri, Some(json!({ "title": "Hijacked" }))).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);

  let (status, resp) = call(
    &app,
    "PUT",
    &uri,
    Some(json!({ "edit_token": "wrong", "title": "Hijacked" })),
  )
  .await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  assert_eq!(resp["error"], "invalid edit token");

  let (status, resp) = call(
    &app,
    "PUT",
    &uri,
    Some(json!({
      "edit_token": token,
      "title": "Final",
      "rating": "Teen",
      "characters": ["Zed"],
      "kudos_count": 9000,
    })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(resp["work"]["title"], "Final");
  assert_eq!(resp["work"]["rating"], "Teen");
  assert_eq!(resp["work"]["characters"], json!(["Zed"]));
  assert_eq!(resp["work"]["kudos_count"], 0);

  // Verification is repeatable.
  let (status, _) = call(&app, "PUT", &uri, Some(json!({ "edit_token": token }))).await;
  assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn malformed_id_answers_like_an_unknown_work() {
  let app = api_router(state().await);
  let (_, token) = create_work(&app, "Draft", json!({})).await;
  let missing = uuid::Uuid::new_v4();

  for id in ["not-a-uuid".to_owned(), missing.to_string()] {
    let uri = format!("/works/{id}");
    let (status, _) = call(&app, "PUT", &uri, Some(json!({ "title": "x" }))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");

    let (status, _) = call(&app, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");

    let (status, _) = call(
      &app,
      "POST",
      &format!("{uri}/chapters"),
      Some(json!({ "body": "more" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");

    let (status, resp) = call(
      &app,
      "PUT",
      &uri,
      Some(json!({ "edit_token": token, "title": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
    assert_eq!(resp["error"], "work not found");
  }
}

#[tokio::test]
async fn validation_runs_before_authorization() {
  let app = api_router(state().await);
  let (id, _) = create_work(&app, "Draft", json!({})).await;

  let (status, _) = call(
    &app,
    "PUT",
    &format!("/works/{id}"),
    Some(json!({ "edit_token": "wrong", "rating": "Nope" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, _) = call(
    &app,
    "POST",
    &format!("/works/{id}/chapters"),
    Some(json!({ "body": "" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn ownership_lifecycle_end_to_end() {
  let app = api_router(state().await);
  let (id, token) = create_work(&app, "Doomed", json!({})).await;
  let uri = format!("/works/{id}");
  let missing = format!("/works/{}", uuid::Uuid::new_v4());

  let (status, _) = call(&app, "DELETE", &uri, Some(json!({ "edit_token": "nope" }))).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, _) = call(&app, "DELETE", &missing, Some(json!({ "edit_token": token }))).await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  let (status, _) = call(&app, "DELETE", &uri, None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);

  let (status, resp) = call(&app, "DELETE", &uri, Some(json!({ "edit_token": token }))).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(resp, json!({ "success": true }));

  let (status, _) = call(&app, "GET", &uri, None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn another_works_token_is_forbidden() {
  let app = api_router(state().await);
  let (first, _) = create_work(&app, "First", json!({})).await;
  let (_, second_token) = create_work(&app, "Second", json!({})).await;

  let (status, _) = call(
    &app,
    "DELETE",
    &format!("/works/{first}"),
    Some(json!({ "edit_token": second_token })),
  )
  .await;
  assert_eq!(status, StatusCode::FORBIDDEN);
}

// ─── Chapters ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn chapters_append_and_navigate() {
  let app = api_router(state().await);
  let (id, token) = create_work(&app, "Serial", json!({})).await;

  let mut ids = Vec::new();
  for body in ["second part", "third part here"] {
    let (status, resp) = call(
      &app,
      "POST",
      &format!("/works/{id}/chapters"),
      Some(json!({ "edit_token": token, "body": body, "title": " " })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{resp}");
    assert!(resp["chapter"]["title"].is_null());
    ids.push(resp["chapter"]["chapter_id"].as_str().unwrap().to_owned());
  }

  let (_, detail) = call(&app, "GET", &format!("/works/{id}"), None).await;
  assert_eq!(detail["work"]["chapter_count"], 3);
  assert_eq!(detail["work"]["word_count"], 5 + 2 + 3);
  let positions: Vec<u64> = detail["chapters"]
    .as_array()
    .unwrap()
    .iter()
    .map(|c| c["position"].as_u64().unwrap())
    .collect();
  assert_eq!(positions, vec![1, 2, 3]);
  let first = detail["chapters"][0]["chapter_id"].as_str().unwrap();

  let (status, page) = call(&app, "GET", &format!("/works/{id}/chapters/{}", ids[0]), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(page["chapter"]["position"], 2);
  assert_eq!(page["previous_chapter_id"], first);
  assert_eq!(page["next_chapter_id"], ids[1].as_str());

  let (_, page) = call(&app, "GET", &format!("/works/{id}/chapters/{}", ids[1]), None).await;
  assert!(page["next_chapter_id"].is_null());

  let (status, _) = call(
    &app,
    "GET",
    &format!("/works/{id}/chapters/{}", uuid::Uuid::new_v4()),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn chapter_requires_token() {
  let app = api_router(state().await);
  let (id, _) = create_work(&app, "Serial", json!({})).await;

  let (status, _) = call(
    &app,
    "POST",
    &format!("/works/{id}/chapters"),
    Some(json!({ "body": "more" })),
  )
  .await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ─── Comments ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn anonymous_comment_without_verifier() {
  let app = api_router(state().await);
  let (id, _) = create_work(&app, "Open", json!({})).await;
  let uri = format!("/works/{id}/comments");

  let (status, resp) = call(&app, "POST", &uri, Some(json!({ "body": "  lovely  " }))).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(resp["comment"]["name"], "Anonymous");
  assert_eq!(resp["comment"]["body"], "lovely");
  assert_eq!(resp["comment"]["authenticated"], false);

  let (status, _) = call(&app, "POST", &uri, Some(json!({ "body": " " }))).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (_, list) = call(&app, "GET", &uri, None).await;
  assert_eq!(list["comments"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn signed_in_comment_uses_trusted_header() {
  let state = state()
    .await
    .with_identity_header(HeaderName::from_static("x-remote-user"))
    .with_captcha(remote("http://127.0.0.1:9/unused"));
  let app = api_router(state);
  let (id, _) = create_work(&app, "Open", json!({})).await;

  let (status, resp) = call_with(
    &app,
    "POST",
    &format!("/works/{id}/comments"),
    Some(json!({ "name": "Impostor", "body": "hi" })),
    &[("x-remote-user", "Member")],
  )
  .await;
  assert_eq!(status, StatusCode::CREATED, "{resp}");
  assert_eq!(resp["comment"]["name"], "Member");
  assert_eq!(resp["comment"]["authenticated"], true);

  // Signing in grants nothing on works.
  let (status, _) = call_with(
    &app,
    "DELETE",
    &format!("/works/{id}"),
    Some(json!({})),
    &[("x-remote-user", "Member")],
  )
  .await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn signed_in_name_may_be_utf8() {
  let state = state()
    .await
    .with_identity_header(HeaderName::from_static("x-remote-user"))
    .with_captcha(remote("http://127.0.0.1:9/unused"));
  let app = api_router(state);
  let (id, _) = create_work(&app, "Open", json!({})).await;

  let req = Request::builder()
    .method("POST")
    .uri(format!("/works/{id}/comments"))
    .header("content-type", "application/json")
    .header("x-remote-user", HeaderValue::from_bytes("Zoë".as_bytes()).unwrap())
    .body(Body::from(json!({ "body": "hi" }).to_string()))
    .unwrap();
  let resp = app.oneshot(req).await.unwrap();
  assert_eq!(resp.status(), StatusCode::CREATED);
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let resp: Value = serde_json::from_slice(&bytes).unwrap();
  assert_eq!(resp["comment"]["name"], "Zoë");
  assert_eq!(resp["comment"]["authenticated"], true);
}

#[tokio::test]
async fn identity_header_ignored_when_not_configured() {
  let app = api_router(state().await);
  let (id, _) = create_work(&app, "Open", json!({})).await;

  let (_, resp) = call_with(
    &app,
    "POST",
    &format!("/works/{id}/comments"),
    Some(json!({ "name": "Reader", "body": "hi" })),
    &[("x-remote-user", "Member")],
  )
  .await;
  assert_eq!(resp["comment"]["name"], "Reader");
  assert_eq!(resp["comment"]["authenticated"], false);
}

#[tokio::test]
async fn anonymous_comment_is_captcha_checked() {
  let url = captcha_stub().await;
  let app = api_router(state().await.with_captcha(remote(&url)));
  let (id, _) = create_work(&app, "Guarded", json!({})).await;
  let uri = format!("/works/{id}/comments");

  let (status, _) = call(&app, "POST", &uri, Some(json!({ "body": "hi" }))).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, resp) = call(
    &app,
    "POST",
    &uri,
    Some(json!({ "body": "hi", "captcha_token": "bad" })),
  )
  .await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  assert_eq!(resp["error"], "captcha verification failed");

  let (status, _) = call(
    &app,
    "POST",
    &uri,
    Some(json!({ "body": "hi", "captcha_token": "good" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn unreachable_verifier_is_bad_gateway() {
  let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  drop(listener);

  let app = api_router(state().await.with_captcha(remote(&format!("http://{addr}/verify"))));
  let (id, _) = create_work(&app, "Guarded", json!({})).await;

  let (status, _) = call(
    &app,
    "POST",
    &format!("/works/{id}/comments"),
    Some(json!({ "body": "hi", "captcha_token": "good" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_GATEWAY);
}

// ─── Counters & tags ─────────────────────────────────────────────────────────

#[tokio::test]
async fn kudos_and_hits_count_up() {
  let app = api_router(state().await);
  let (id, _) = create_work(&app, "Liked", json!({})).await;

  let (_, resp) = call(&app, "POST", &format!("/works/{id}/kudos"), None).await;
  assert_eq!(resp, json!({ "kudos_count": 1 }));
  let (_, resp) = call(&app, "POST", &format!("/works/{id}/kudos"), None).await;
  assert_eq!(resp, json!({ "kudos_count": 2 }));
  let (_, resp) = call(&app, "POST", &format!("/works/{id}/hits"), None).await;
  assert_eq!(resp, json!({ "hit_count": 1 }));

  let missing = uuid::Uuid::new_v4();
  let (status, _) = call(&app, "POST", &format!("/works/{missing}/kudos"), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn tags_index_and_filters() {
  let app = api_router(state().await);
  create_work(
    &app,
    "One",
    json!({ "fandoms": ["Star Trek"], "freeforms": ["Fluff", "Angst"] }),
  )
  .await;
  create_work(&app, "Two", json!({ "freeforms": ["fluff"] })).await;

  let (_, all) = call(&app, "GET", "/tags", None).await;
  assert_eq!(all["fandoms"], json!(["Star Trek"]));
  assert_eq!(all["freeforms"], json!(["Angst", "Fluff", "fluff"]));
  assert_eq!(all["characters"], json!([]));

  let (_, one) = call(&app, "GET", "/tags?type=freeforms&q=FLU", None).await;
  assert_eq!(one, json!({ "tags": ["Fluff", "fluff"] }));

  let (_, unknown) = call(&app, "GET", "/tags?type=bogus&q=star", None).await;
  assert_eq!(unknown["fandoms"], json!(["Star Trek"]));
  assert_eq!(unknown["freeforms"], json!([]));
}
