use axum::{
    body::Body,
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use axum_valid::Garde;
use bingelog_dal::series::{CreateSeries, PatchSeries, SeriesFilter, SeriesRepository};
use bingelog_store::ValidPath;
use bingelog_types::utils::file_ext;
use http::{HeaderMap, StatusCode};
use tracing::debug;

use crate::{
    auth::token::Identity,
    error::{ApiError, ApiResult},
    rest_api::filters::parse_id_list,
    state::AppState,
};

crate::repository_from_request!(SeriesRepository);

#[derive(Debug, Default, serde::Deserialize)]
pub struct SeriesQuery {
    tags: Option<String>,
    characters: Option<String>,
}

impl SeriesQuery {
    fn into_filter(self) -> ApiResult<SeriesFilter> {
        Ok(SeriesFilter {
            tag_ids: self.tags.as_deref().map(parse_id_list).transpose()?,
            character_ids: self.characters.as_deref().map(parse_id_list).transpose()?,
        })
    }
}

pub async fn list(
    Identity(owner): Identity,
    repository: SeriesRepository,
    Query(query): Query<SeriesQuery>,
) -> ApiResult<impl IntoResponse> {
    let records = repository.list(owner, query.into_filter()?).await?;

    Ok((StatusCode::OK, Json(records)))
}

pub async fn retrieve(
    Identity(owner): Identity,
    Path(id): Path<i64>,
    repository: SeriesRepository,
) -> ApiResult<impl IntoResponse> {
    let record = repository.get(owner, id).await?;

    Ok((StatusCode::OK, Json(record)))
}

pub async fn create(
    Identity(owner): Identity,
    repository: SeriesRepository,
    Garde(Json(payload)): Garde<Json<CreateSeries>>,
) -> ApiResult<impl IntoResponse> {
    let record = repository.create(owner, payload).await?;

    Ok((StatusCode::CREATED, Json(record)))
}

/// Full replace. Linked tags and characters are reset to the payload's
/// lists, omitted lists clear the links.
pub async fn update(
    Identity(owner): Identity,
    Path(id): Path<i64>,
    repository: SeriesRepository,
    Garde(Json(payload)): Garde<Json<CreateSeries>>,
) -> ApiResult<impl IntoResponse> {
    let record = repository.update(owner, id, payload).await?;

    Ok((StatusCode::OK, Json(record)))
}

/// Partial update, only fields present in the payload are touched.
pub async fn partial_update(
    Identity(owner): Identity,
    Path(id): Path<i64>,
    repository: SeriesRepository,
    Garde(Json(payload)): Garde<Json<PatchSeries>>,
) -> ApiResult<impl IntoResponse> {
    let record = repository.patch(owner, id, payload).await?;

    Ok((StatusCode::OK, Json(record)))
}

pub async fn upload_image(
    State(state): State<AppState>,
    Identity(owner): Identity,
    Path(id): Path<i64>,
    repository: SeriesRepository,
    mut multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    // scope check up front, a foreign id must 404 before any file handling
    repository.get(owner, id).await?;

    let mut file_name = None;
    let mut data = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("image") {
            file_name = field.file_name().map(|s| s.to_string());
            data = Some(field.bytes().await?);
            break;
        }
    }
    let data = data.ok_or_else(|| ApiError::InvalidRequest("Missing image field".into()))?;

    let format = {
        let data = data.clone();
        tokio::task::spawn_blocking(move || {
            let format = image::guess_format(&data)?;
            image::load_from_memory(&data)?;
            Ok::<_, image::ImageError>(format)
        })
        .await
        .map_err(|e| ApiError::InternalError(format!("Image check task failed: {e}")))?
        .map_err(|e| ApiError::InvalidRequest(format!("Not a valid image: {e}")))?
    };

    let ext = file_name
        .as_deref()
        .and_then(file_ext)
        .or_else(|| format.extensions_str().first().map(|s| s.to_string()))
        .ok_or_else(|| ApiError::InvalidRequest("Cannot determine image extension".into()))?;

    let path = bingelog_store::image_path(&ext)?;
    debug!("Storing image for series {id} at {}", path.as_ref());
    state.store().store_data(&path, &data).await?;

    let record = repository.set_image(owner, id, path.as_ref()).await?;

    Ok((StatusCode::OK, Json(record)))
}

pub async fn download_image(
    State(state): State<AppState>,
    Identity(owner): Identity,
    Path(id): Path<i64>,
    repository: SeriesRepository,
) -> ApiResult<impl IntoResponse> {
    let record = repository.get(owner, id).await?;
    let image = record
        .image
        .ok_or_else(|| ApiError::ResourceNotFound("Image".to_string()))?;
    let path = ValidPath::new(image)?;

    let stream = state.store().load_data(&path).await?;
    let size = state.store().size(&path).await?;
    let body = Body::from_stream(stream);

    let mime = file_ext(path.as_ref())
        .and_then(|ext| new_mime_guess::from_ext(&ext).first().map(|m| m.to_string()))
        .unwrap_or_else(|| "application/octet-stream".to_string());

    let mut headers = HeaderMap::new();
    headers.insert(
        http::header::CONTENT_TYPE,
        mime.parse().unwrap(), // safe as MIME is ASCII
    );
    headers.insert(
        http::header::CONTENT_LENGTH,
        size.to_string().parse().unwrap(), // safe - number is ASCII
    );

    Ok((StatusCode::OK, headers, body))
}

pub fn router(upload_limit_mb: usize) -> Router<AppState> {
    Router::new()
        .route("/{id}/image", post(upload_image).get(download_image))
        .layer(DefaultBodyLimit::max(1024 * 1024 * upload_limit_mb))
        .route("/", get(list).post(create))
        .route(
            "/{id}",
            get(retrieve).put(update).patch(partial_update),
        )
}
