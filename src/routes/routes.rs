//! Defines routes for the cameras application.
//!
//! ## Structure
//! - **Cameras** (nested under `/cameras`, every response is `text/html`)
//!   - `GET  /`              — list, `?pageToken=` for the next page
//!   - `GET  /mine`          — caller's cameras (with-auth-and-upload only)
//!   - `GET  /add`           — create form
//!   - `POST /add`           — create, redirect to the new camera
//!   - `GET  /{id}`          — detail
//!   - `GET  /{id}/edit`     — edit form
//!   - `POST /{id}/edit`     — update, redirect to the camera
//!   - `GET  /{id}/delete`   — delete, redirect to the list
//!
//! - **Ambient**
//!   - `GET /` redirects to `/cameras`
//!   - `GET /healthz`, `GET /readyz`
//!   - `GET /images/{*key}` — uploaded images

use crate::{
    config::RouterVariant,
    handlers::{
        camera_form::MAX_IMAGE_BYTES,
        camera_handlers::{
            add_form, create_camera, delete_camera, edit_form, list_cameras, list_my_cameras,
            show_camera, update_camera,
        },
        health_handlers::{healthz, readyz},
        image_handlers::get_image,
    },
    state::AppState,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, header},
    response::Redirect,
    routing::get,
};
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};

/// Mount point of the cameras router.
pub const CAMERAS_BASE: &str = "/cameras";

/// Allowance for the text fields and multipart framing around an image.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

/// Build the complete application router around `state`.
pub fn app(state: AppState) -> Router {
    let variant = state.variant;
    Router::new()
        .route("/", get(|| async { Redirect::to(CAMERAS_BASE) }))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/images/{*key}", get(get_image))
        .nest(CAMERAS_BASE, cameras(variant))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// The cameras router, composed with the capabilities of `variant`.
pub fn cameras(variant: RouterVariant) -> Router<AppState> {
    let mut router = Router::new()
        .route("/", get(list_cameras))
        .route("/add", get(add_form).post(create_camera))
        .route("/{id}", get(show_camera))
        .route("/{id}/edit", get(edit_form).post(update_camera))
        .route("/{id}/delete", get(delete_camera));

    if variant.has_auth() {
        router = router.route("/mine", get(list_my_cameras));
    }

    router
        .layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES + FORM_OVERHEAD_BYTES))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/html; charset=utf-8"),
        ))
}
