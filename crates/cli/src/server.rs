use crate::ServeArgs;
use anyhow::Result;
use axum::{
    body::{Body, Bytes},
    extract::Path,
    http::{Response as HttpResponse, StatusCode},
    response::Response,
    routing::{get, post},
    Router,
};
use codemap_protocol::{
    serialize_json, AnalyzeRequest, AnalyzeResponse, ErrorEnvelope, ErrorKind, HealthResponse,
    PatchRequest, PatchResponse, SourceResponse,
};
use codemap_store::{SourceStore, StoreError};
use codemap_structure::{ParseLimits, StructureError};
use serde::Serialize;
use std::sync::Arc;

pub(crate) struct AppState {
    store: SourceStore,
    limits: ParseLimits,
}

pub(crate) async fn serve(args: ServeArgs) -> Result<()> {
    let store = match &args.spool {
        Some(dir) => SourceStore::with_spool(dir.clone()),
        None => SourceStore::new(),
    };
    let state = Arc::new(AppState {
        store,
        limits: args.limits.to_limits(),
    });

    let app = router(state);
    let listener = tokio::net::TcpListener::bind(&args.bind).await?;
    println!("Serving codemap API on http://{}", args.bind);
    axum::serve(listener, app).await?;
    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/analyze",
            post({
                let state = state.clone();
                move |body| analyze_handler(body, state.clone())
            }),
        )
        .route(
            "/patch",
            post({
                let state = state.clone();
                move |body| patch_handler(body, state.clone())
            }),
        )
        .route(
            "/source/:file_id",
            get({
                let state = state.clone();
                move |path| source_handler(path, state.clone())
            }),
        )
        .route("/health", get(health_handler))
}

/// Upload-and-analyze. The source is stored before analysis runs, so a file
/// that fails to parse can still be repaired through the patch endpoint.
/// Analysis failures come back as an `{error, kind}` envelope with HTTP 200;
/// callers check the `error` field.
async fn analyze_handler(body: Bytes, state: Arc<AppState>) -> Result<Response, StatusCode> {
    let request: AnalyzeRequest =
        serde_json::from_slice(&body).map_err(|_| StatusCode::BAD_REQUEST)?;

    if let Err(message) = request.validate() {
        return json_response(
            StatusCode::OK,
            &ErrorEnvelope::new(ErrorKind::InvalidRequest, message),
        );
    }

    let revision = match state.store.put(&request.file_id, request.source.clone()) {
        Ok(revision) => revision,
        Err(err) => {
            return json_response(
                StatusCode::OK,
                &ErrorEnvelope::new(ErrorKind::IoFailure, err.to_string()),
            );
        }
    };

    match codemap_graph::analyze(&request.source, state.limits) {
        Ok(outline) => {
            let root =
                serde_json::to_value(&outline).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
            json_response(
                StatusCode::OK,
                &AnalyzeResponse {
                    file_id: request.file_id,
                    revision,
                    root,
                },
            )
        }
        Err(err) => json_response(StatusCode::OK, &analysis_failure(&err)),
    }
}

async fn patch_handler(body: Bytes, state: Arc<AppState>) -> Result<Response, StatusCode> {
    let request: PatchRequest =
        serde_json::from_slice(&body).map_err(|_| StatusCode::BAD_REQUEST)?;

    let response = match state.store.patch(
        &request.file_id,
        request.start_line,
        request.end_line,
        &request.replacement,
        request.expected_revision,
    ) {
        Ok(patched) => PatchResponse::success(
            format!(
                "replaced lines {}..{} of {}",
                request.start_line, request.end_line, request.file_id
            ),
            patched.revision,
        ),
        Err(err) => patch_failure(&err),
    };

    json_response(StatusCode::OK, &response)
}

async fn source_handler(
    Path(file_id): Path<String>,
    state: Arc<AppState>,
) -> Result<Response, StatusCode> {
    match state.store.get(&file_id) {
        Ok(record) => json_response(
            StatusCode::OK,
            &SourceResponse {
                file_id,
                revision: record.revision,
                source: record.text,
            },
        ),
        Err(err @ StoreError::UnknownFile(_)) => json_response(
            StatusCode::NOT_FOUND,
            &ErrorEnvelope::new(ErrorKind::UnknownFile, err.to_string()),
        ),
        Err(err) => json_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            &ErrorEnvelope::new(ErrorKind::IoFailure, err.to_string()),
        ),
    }
}

async fn health_handler() -> Result<Response, StatusCode> {
    json_response(
        StatusCode::OK,
        &HealthResponse {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
    )
}

pub(crate) fn analysis_failure(err: &StructureError) -> ErrorEnvelope {
    let kind = match err {
        StructureError::EmptySource | StructureError::SourceTooLarge { .. } => {
            ErrorKind::InvalidRequest
        }
        _ => ErrorKind::SyntaxFailure,
    };
    ErrorEnvelope::new(kind, err.to_string())
}

fn patch_failure(err: &StoreError) -> PatchResponse {
    let kind = match err {
        StoreError::InvalidRange { .. } => ErrorKind::InvalidRange,
        StoreError::UnknownFile(_) => ErrorKind::UnknownFile,
        StoreError::StaleRevision { .. } => ErrorKind::StaleRevision,
        StoreError::Io(_) => ErrorKind::IoFailure,
    };
    PatchResponse::failure(kind, err.to_string())
}

fn json_response<T: Serialize>(status: StatusCode, value: &T) -> Result<Response, StatusCode> {
    let bytes = serialize_json(value)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .into_bytes();

    Ok(HttpResponse::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(Body::from(bytes))
        .expect("valid HTTP response"))
}
