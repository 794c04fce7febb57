// ABOUTME: Integration tests for the Graph HTTP client against an in-process fake service
// ABOUTME: Exercises path addressing, error mapping, upload and both conversion response shapes

use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::json;

use recoverlette::auth::StaticTokenCredential;
use recoverlette::engine::fetcher::collect_body;
use recoverlette::graph::{DriveStore, GraphClient};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConversionMode {
    Redirect,
    Direct,
    NotReady,
}

#[derive(Debug, Clone)]
struct Recorded {
    method: Method,
    path: String,
    authorization: Option<String>,
    body_len: usize,
}

struct FakeGraph {
    base_url: Mutex<String>,
    mode: ConversionMode,
    requests: Mutex<Vec<Recorded>>,
}

impl FakeGraph {
    fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    fn find(&self, prefix: &str) -> Recorded {
        self.requests()
            .into_iter()
            .find(|r| r.path.starts_with(prefix))
            .unwrap_or_else(|| panic!("no request starting with {}", prefix))
    }
}

fn graph_error(status: StatusCode, code: &str, message: &str) -> Response {
    (
        status,
        Json(json!({ "error": { "code": code, "message": message } })),
    )
        .into_response()
}

async fn handle(
    State(state): State<Arc<FakeGraph>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_default();
    state.requests.lock().unwrap().push(Recorded {
        method: method.clone(),
        path: path.clone(),
        authorization: headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body_len: body.len(),
    });

    match (method, path.as_str()) {
        (Method::GET, p) if p.starts_with("/me/drive") => {
            Json(json!({ "id": "DRIVE1", "driveType": "personal" })).into_response()
        }
        (Method::GET, p) if p.starts_with("/me") => {
            Json(json!({ "displayName": "Test User" })).into_response()
        }
        (Method::GET, p) if p.starts_with("/drives/DRIVE1/root:/") => {
            if p.contains("Missing") {
                graph_error(
                    StatusCode::NOT_FOUND,
                    "itemNotFound",
                    "The resource could not be found.",
                )
            } else {
                Json(json!({
                    "id": "ITEM1",
                    "name": "Cover Letter.docx",
                    "parentReference": { "id": "FOLDER1", "driveId": "DRIVE1" }
                }))
                .into_response()
            }
        }
        (Method::GET, p) if p.starts_with("/drives/DRIVE1/root") => {
            Json(json!({ "id": "ROOT" })).into_response()
        }
        (Method::GET, "/drives/DRIVE1/items/ITEM1/content") => {
            (StatusCode::OK, b"PK template bytes".to_vec()).into_response()
        }
        (Method::PUT, p) if p.starts_with("/drives/DRIVE1/items/FOLDER1:/") => (
            StatusCode::CREATED,
            Json(json!({ "id": "TEMP1", "name": "temp.docx" })),
        )
            .into_response(),
        (Method::GET, "/drives/DRIVE1/items/TEMP1/content?format=pdf") => match state.mode {
            ConversionMode::Redirect => {
                let location = format!("{}/download/converted.pdf", state.base_url.lock().unwrap());
                (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
            }
            ConversionMode::Direct => (StatusCode::OK, b"%PDF-direct".to_vec()).into_response(),
            ConversionMode::NotReady => graph_error(
                StatusCode::NOT_FOUND,
                "itemNotFound",
                "Item not yet available",
            ),
        },
        (Method::GET, "/download/converted.pdf") => {
            (StatusCode::OK, b"%PDF-redirected".to_vec()).into_response()
        }
        (Method::DELETE, "/drives/DRIVE1/items/TEMP1") => StatusCode::NO_CONTENT.into_response(),
        _ => graph_error(StatusCode::BAD_REQUEST, "invalidRequest", "Unexpected request"),
    }
}

async fn spawn_graph(mode: ConversionMode) -> (GraphClient, Arc<FakeGraph>) {
    let state = Arc::new(FakeGraph {
        base_url: Mutex::new(String::new()),
        mode,
        requests: Mutex::new(Vec::new()),
    });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    *state.base_url.lock().unwrap() = base_url.clone();

    let app = Router::new().fallback(handle).with_state(state.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = GraphClient::new(base_url, Arc::new(StaticTokenCredential::new("test-token")))
        .unwrap();
    (client, state)
}

#[tokio::test]
async fn test_locate_and_download() {
    let (client, graph) = spawn_graph(ConversionMode::Redirect).await;

    let user = client.current_user().await.unwrap();
    assert_eq!(user.display_name.as_deref(), Some("Test User"));

    let drive = client.default_drive().await.unwrap();
    assert_eq!(drive.id.as_deref(), Some("DRIVE1"));

    let item = client
        .item_by_path("DRIVE1", "/Documents/Cover Letter.docx")
        .await
        .unwrap();
    assert_eq!(item.id.as_deref(), Some("ITEM1"));
    assert_eq!(item.parent_id(), Some("FOLDER1"));

    let lookup = graph.find("/drives/DRIVE1/root:/");
    assert!(lookup
        .path
        .starts_with("/drives/DRIVE1/root:/Documents/Cover%20Letter.docx"));
    assert_eq!(lookup.authorization.as_deref(), Some("Bearer test-token"));

    let body = client.download_content("DRIVE1", "ITEM1").await.unwrap();
    assert_eq!(collect_body(body).await.unwrap(), b"PK template bytes");
}

#[tokio::test]
async fn test_not_found_is_mapped() {
    let (client, _graph) = spawn_graph(ConversionMode::Redirect).await;

    let error = client
        .item_by_path("DRIVE1", "Missing/Letter.docx")
        .await
        .unwrap_err();
    assert!(error.is_not_found());
    assert!(error.to_string().contains("itemNotFound"));
}

#[tokio::test]
async fn test_upload_into_parent_folder() {
    let (client, graph) = spawn_graph(ConversionMode::Redirect).await;

    let item = client
        .upload_content("DRIVE1", "FOLDER1", "Cover Letter_temp_abc.docx", vec![7; 2048])
        .await
        .unwrap();
    assert_eq!(item.id.as_deref(), Some("TEMP1"));

    let upload = graph.find("/drives/DRIVE1/items/FOLDER1:/");
    assert_eq!(upload.method, Method::PUT);
    assert_eq!(
        upload.path,
        "/drives/DRIVE1/items/FOLDER1:/Cover%20Letter_temp_abc.docx:/content"
    );
    assert_eq!(upload.body_len, 2048);
}

#[tokio::test]
async fn test_conversion_follows_redirect_without_credential() {
    let (client, graph) = spawn_graph(ConversionMode::Redirect).await;

    let bytes = client
        .download_converted("DRIVE1", "TEMP1", "pdf")
        .await
        .unwrap();
    assert_eq!(bytes, b"%PDF-redirected");

    let conversion = graph.find("/drives/DRIVE1/items/TEMP1/content?format=pdf");
    assert_eq!(conversion.authorization.as_deref(), Some("Bearer test-token"));

    let download = graph.find("/download/converted.pdf");
    assert!(download.authorization.is_none());
}

#[tokio::test]
async fn test_conversion_with_direct_body() {
    let (client, graph) = spawn_graph(ConversionMode::Direct).await;

    let bytes = client
        .download_converted("DRIVE1", "TEMP1", "pdf")
        .await
        .unwrap();
    assert_eq!(bytes, b"%PDF-direct");
    assert!(!graph
        .requests()
        .iter()
        .any(|r| r.path.starts_with("/download/")));
}

#[tokio::test]
async fn test_conversion_not_ready_is_retryable() {
    let (client, _graph) = spawn_graph(ConversionMode::NotReady).await;

    let error = client
        .download_converted("DRIVE1", "TEMP1", "pdf")
        .await
        .unwrap_err();
    assert!(error.is_retryable());
}

#[tokio::test]
async fn test_delete_item() {
    let (client, graph) = spawn_graph(ConversionMode::Direct).await;

    client.delete_item("DRIVE1", "TEMP1").await.unwrap();
    let delete = graph.find("/drives/DRIVE1/items/TEMP1");
    assert_eq!(delete.method, Method::DELETE);
}
