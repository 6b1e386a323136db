//! HTTP handlers for the editor API.

use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};

use crate::configstore::Document;
use crate::server::AppState;
use crate::Error;

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(e: Error) -> ApiError {
    let status = match e {
        Error::Validation(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(ErrorResponse { error: e.to_string() }))
}

fn bad_request(message: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse { error: message.into() }),
    )
}

pub async fn get_settings(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let settings = state.config_store.read(Document::Settings).map_err(api_error)?;
    Ok(Json(settings))
}

pub async fn save_background(
    State(state): State<Arc<AppState>>,
    Json(background): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    state.config_store.set_background(background).map_err(api_error)?;
    Ok(Json(json!({"message": "Background settings saved"})))
}

pub async fn list_backgrounds(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    let entries = state.resolver.list_backgrounds().await.map_err(api_error)?;
    Ok(Json(serde_json::to_value(entries).map_err(|e| {
        api_error(Error::Storage(e.to_string()))
    })?))
}

pub async fn upload_background(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let mut upload: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(e.to_string()))?
    {
        if field.name() == Some("file") {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| bad_request(e.to_string()))?;
            upload = Some((file_name, bytes.to_vec()));
        }
    }

    let (file_name, bytes) =
        upload.ok_or_else(|| api_error(Error::Validation("no file supplied".into())))?;
    let reference = state
        .resolver
        .upload_background(&file_name, &bytes)
        .await
        .map_err(api_error)?;
    Ok(Json(json!({"message": "Background uploaded", "url": reference})))
}

pub async fn get_services(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let services = state.config_store.read(Document::Services).map_err(api_error)?;
    Ok(Json(services))
}

pub async fn save_services(
    State(state): State<Arc<AppState>>,
    Json(services): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    state
        .config_store
        .write(Document::Services, &services)
        .map_err(api_error)?;
    Ok(Json(json!({"message": "Services saved"})))
}

pub async fn get_bookmarks(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let bookmarks = state.config_store.read(Document::Bookmarks).map_err(api_error)?;
    Ok(Json(bookmarks))
}

pub async fn save_bookmarks(
    State(state): State<Arc<AppState>>,
    Json(bookmarks): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    state
        .config_store
        .write(Document::Bookmarks, &bookmarks)
        .map_err(api_error)?;
    Ok(Json(json!({"message": "Bookmarks saved"})))
}

pub async fn get_overview(State(state): State<Arc<AppState>>) -> Json<Value> {
    let overview = state.config_store.overview();
    Json(json!({"groups": overview.groups, "layout": overview.layout}))
}

pub async fn list_containers(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    let containers = state.docker.list_containers().await.map_err(api_error)?;
    Ok(Json(serde_json::to_value(containers).map_err(|e| {
        api_error(Error::Upstream(e.to_string()))
    })?))
}

/// Multipart form: `name`, `href`, optional `description`, `abbr`,
/// `current_icon_url` text fields and an optional `icon_file` upload.
pub async fn prepare_item(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let mut name = String::new();
    let mut href = String::new();
    let mut description = None;
    let mut abbr = None;
    let mut current_icon = None;
    let mut icon_file: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(e.to_string()))?
    {
        let Some(field_name) = field.name().map(String::from) else {
            continue;
        };
        match field_name.as_str() {
            "icon_file" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| bad_request(e.to_string()))?;
                icon_file = Some((file_name, bytes.to_vec()));
            }
            _ => {
                let text = field.text().await.map_err(|e| bad_request(e.to_string()))?;
                match field_name.as_str() {
                    "name" => name = text,
                    "href" => href = text,
                    "description" => description = Some(text),
                    "abbr" => abbr = Some(text),
                    "current_icon_url" => current_icon = Some(text),
                    _ => {}
                }
            }
        }
    }

    let item = state
        .resolver
        .prepare_item(
            &name,
            &href,
            description.as_deref(),
            abbr.as_deref(),
            icon_file.as_ref().map(|(n, b)| (n.as_str(), b.as_slice())),
            current_icon.as_deref(),
        )
        .await
        .map_err(api_error)?;

    Ok(Json(json!({"message": "Item ready", "item": item})))
}
