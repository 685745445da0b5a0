use crate::error::Result;
use crate::model::{CreateUrlRequest, CreateUrlResponse};
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use snip_core::{ShortCode, ShortenerError};
use tracing::debug;

pub async fn create_url_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CreateUrlRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateUrlResponse>)> {
    let Json(request) = payload?;
    let params = request.into_params()?;

    let record = state.shortener().create_short_url(params).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateUrlResponse::new(record, state.base_url())),
    ))
}

pub async fn redirect_handler(
    Path(short_code): Path<String>,
    State(state): State<AppState>,
) -> Result<Response> {
    // A code that cannot exist is simply not found.
    let code = ShortCode::new(short_code.as_str()).map_err(|e| {
        debug!(code = %short_code, error = %e, "rejecting malformed short code");
        ShortenerError::NotFound(short_code.clone())
    })?;

    let url = state.shortener().resolve_and_record_click(&code).await?;

    Ok((StatusCode::FOUND, [(header::LOCATION, url)]).into_response())
}
