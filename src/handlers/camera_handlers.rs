//! HTTP handlers for the cameras resource.
//!
//! Each handler makes at most one `CameraModel` call and answers with a
//! rendered page or a redirect. Failures travel back as `AppError`.

use crate::{
    errors::AppError,
    handlers::camera_form::CameraForm,
    identity::{MaybeUser, RequireUser, User},
    models::camera::{ANONYMOUS, CREATED_BY, CREATED_BY_ID, CameraFields, IMAGE_URL},
    services::images::UploadedImage,
    state::AppState,
    views,
};
use axum::{
    extract::{NestedPath, Path, Query, State},
    response::{Html, Redirect},
};
use serde::Deserialize;
use tracing::info;

/// Cameras shown per list page.
pub const PAGE_SIZE: usize = 10;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(rename = "pageToken")]
    pub page_token: Option<String>,
}

impl ListQuery {
    fn token(&self) -> Option<&str> {
        self.page_token.as_deref().filter(|t| !t.is_empty())
    }
}

/// `GET /` — one page of cameras.
pub async fn list_cameras(
    State(state): State<AppState>,
    base: NestedPath,
    MaybeUser(user): MaybeUser,
    Query(q): Query<ListQuery>,
) -> Result<Html<String>, AppError> {
    let page = state.model.list(PAGE_SIZE, q.token()).await?;
    Ok(Html(views::list(base.as_str(), &page, user.as_ref())))
}

/// `GET /mine` — cameras created by the signed-in caller.
pub async fn list_my_cameras(
    State(state): State<AppState>,
    base: NestedPath,
    RequireUser(user): RequireUser,
    Query(q): Query<ListQuery>,
) -> Result<Html<String>, AppError> {
    let page = state.model.list_by(&user.id, PAGE_SIZE, q.token()).await?;
    Ok(Html(views::list(base.as_str(), &page, Some(&user))))
}

/// `GET /add` — empty form.
pub async fn add_form(
    State(state): State<AppState>,
    base: NestedPath,
    MaybeUser(user): MaybeUser,
) -> Html<String> {
    Html(views::form(
        base.as_str(),
        None,
        "Add",
        state.variant.has_upload(),
        user.as_ref(),
    ))
}

/// `POST /add` — create a camera and redirect to it.
pub async fn create_camera(
    State(state): State<AppState>,
    base: NestedPath,
    MaybeUser(user): MaybeUser,
    form: CameraForm,
) -> Result<Redirect, AppError> {
    let mut data = form.fields;
    stamp_creator(&mut data, user.as_ref());
    attach_image(&state, &mut data, form.image.as_ref()).await?;

    let saved = state.model.create(data).await?;
    info!(id = %saved.id, "camera created");
    Ok(Redirect::to(&format!("{}/{}", base.as_str(), saved.id)))
}

/// `GET /{id}/edit` — form pre-filled with the stored camera.
pub async fn edit_form(
    State(state): State<AppState>,
    base: NestedPath,
    MaybeUser(user): MaybeUser,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let camera = state.model.read(&id).await?;
    Ok(Html(views::form(
        base.as_str(),
        Some(&camera),
        "Edit",
        state.variant.has_upload(),
        user.as_ref(),
    )))
}

/// `POST /{id}/edit` — update a camera and redirect to it.
pub async fn update_camera(
    State(state): State<AppState>,
    base: NestedPath,
    Path(id): Path<String>,
    form: CameraForm,
) -> Result<Redirect, AppError> {
    let mut data = form.fields;
    // Ownership is fixed at creation.
    data.remove(CREATED_BY);
    data.remove(CREATED_BY_ID);
    attach_image(&state, &mut data, form.image.as_ref()).await?;

    let saved = state.model.update(&id, data).await?;
    info!(id = %saved.id, "camera updated");
    Ok(Redirect::to(&format!("{}/{}", base.as_str(), saved.id)))
}

/// `GET /{id}` — detail page.
pub async fn show_camera(
    State(state): State<AppState>,
    base: NestedPath,
    MaybeUser(user): MaybeUser,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let camera = state.model.read(&id).await?;
    Ok(Html(views::detail(base.as_str(), &camera, user.as_ref())))
}

/// `GET /{id}/delete` — delete and return to the list.
pub async fn delete_camera(
    State(state): State<AppState>,
    base: NestedPath,
    Path(id): Path<String>,
) -> Result<Redirect, AppError> {
    state.model.delete(&id).await?;
    info!(id = %id, "camera deleted");
    Ok(Redirect::to(base.as_str()))
}

/// Record who created the camera, or the anonymous sentinel.
fn stamp_creator(data: &mut CameraFields, user: Option<&User>) {
    match user {
        Some(user) => {
            data.insert(CREATED_BY.to_string(), user.display_name.clone());
            data.insert(CREATED_BY_ID.to_string(), user.id.clone());
        }
        None => {
            data.insert(CREATED_BY.to_string(), ANONYMOUS.to_string());
            data.remove(CREATED_BY_ID);
        }
    }
}

/// Upload the submitted image, if any, and point `imageUrl` at it.
async fn attach_image(
    state: &AppState,
    data: &mut CameraFields,
    image: Option<&UploadedImage>,
) -> Result<(), AppError> {
    if let Some(url) = state.images.upload(image).await? {
        data.insert(IMAGE_URL.to_string(), url);
    }
    Ok(())
}
