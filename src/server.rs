//! HTTP front end: thin route handlers that each call exactly one store
//! operation and serialize the outcome through the `api` view layer.

use crate::api::{self, BookmarkView, DeletedView, SavedView};
use crate::auth::TokenDb;
use crate::db::BookmarkDb;
use crate::error::Error;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;

/// Server state: both stores, attached to one shared connection handle.
///
/// The token store has no routes of its own; it rides along so that an
/// external event source (a bot listener, say) can drive it and the
/// bookmark store through the same synchronous operations the HTTP
/// handlers use.
pub struct AppState {
    pub bookmarks: BookmarkDb,
    pub tokens: TokenDb,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Map store outcomes onto the HTTP taxonomy. Conflict gets its own
/// status so callers can tell it apart from a missing record.
fn error_response(err: Error) -> ApiError {
    let status = match &err {
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::Conflict { .. } => StatusCode::CONFLICT,
        Error::InvalidId(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        log::error!("storage failure: {err}");
    }
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}

async fn index() -> &'static str {
    "This is the index"
}

async fn save_bookmark(
    State(state): State<Arc<AppState>>,
    Path((title, uri)): Path<(String, String)>,
) -> Result<Json<SavedView>, ApiError> {
    let id = state.bookmarks.save(&uri, &title).map_err(error_response)?;
    Ok(Json(SavedView::new(id)))
}

async fn get_bookmark(
    State(state): State<Arc<AppState>>,
    Path(bookmark_id): Path<String>,
) -> Result<Json<BookmarkView>, ApiError> {
    let id = api::parse_id(&bookmark_id).map_err(error_response)?;
    let record = state
        .bookmarks
        .get(id)
        .map_err(error_response)?
        .ok_or_else(|| error_response(Error::NotFound(id)))?;
    Ok(Json(BookmarkView::from_record(&record)))
}

async fn get_all_bookmarks(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<BookmarkView>>, ApiError> {
    let records = state.bookmarks.get_all().map_err(error_response)?;

    // An empty store is surfaced as 404 rather than an empty array.
    if records.is_empty() {
        return Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "There are no bookmarks saved".to_string(),
            }),
        ));
    }

    Ok(Json(records.iter().map(BookmarkView::from_record).collect()))
}

async fn delete_bookmark(
    State(state): State<Arc<AppState>>,
    Path(bookmark_id): Path<String>,
) -> Result<Json<DeletedView>, ApiError> {
    let id = api::parse_id(&bookmark_id).map_err(error_response)?;
    let deleted = state.bookmarks.delete(id).map_err(error_response)?;
    Ok(Json(DeletedView {
        uuid: bookmark_id,
        bookmark_deleted: deleted,
    }))
}

async fn update_bookmark_title(
    State(state): State<Arc<AppState>>,
    Path((bookmark_id, title)): Path<(String, String)>,
) -> Result<Json<BookmarkView>, ApiError> {
    let id = api::parse_id(&bookmark_id).map_err(error_response)?;
    let record = state
        .bookmarks
        .update_title(id, &title)
        .map_err(error_response)?;
    Ok(Json(BookmarkView::from_record(&record)))
}

async fn update_bookmark_uri(
    State(state): State<Arc<AppState>>,
    Path((bookmark_id, uri)): Path<(String, String)>,
) -> Result<Json<BookmarkView>, ApiError> {
    let id = api::parse_id(&bookmark_id).map_err(error_response)?;
    let record = state
        .bookmarks
        .update_uri(id, &uri)
        .map_err(error_response)?;
    Ok(Json(BookmarkView::from_record(&record)))
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/save/{title}/{*uri}", get(save_bookmark))
        .route("/getall", get(get_all_bookmarks))
        .route("/get/all", get(get_all_bookmarks))
        .route("/get/{bookmark_id}", get(get_bookmark))
        .route("/delete/{bookmark_id}", get(delete_bookmark))
        .route(
            "/update/title/{bookmark_id}/{title}",
            get(update_bookmark_title),
        )
        .route("/update/uri/{bookmark_id}/{*uri}", get(update_bookmark_uri))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, state: Arc<AppState>) -> crate::error::Result<()> {
    let app = router(state);

    log::info!("Listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
