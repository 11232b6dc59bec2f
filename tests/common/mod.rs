#![allow(dead_code)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, Response, header},
};
use cameras::{
    config::RouterVariant,
    identity::IdentityProvider,
    routes::routes::app,
    services::{images::ImageStore, memory::MemoryModel, model::CameraModel},
    state::AppState,
};
use tempfile::TempDir;
use tower::ServiceExt;

pub const ID_HEADER: &str = "x-user-id";
pub const NAME_HEADER: &str = "x-user-name";
pub const BOUNDARY: &str = "camera-test-boundary";

/// A fully wired application plus handles to inspect what it stored.
pub struct TestApp {
    pub router: Router,
    pub model: CameraModel,
    pub image_dir: TempDir,
}

impl TestApp {
    pub fn with_model(model: CameraModel, variant: RouterVariant) -> Self {
        let image_dir = tempfile::tempdir().unwrap();
        let state = AppState::new(
            model.clone(),
            ImageStore::local(image_dir.path(), "/images"),
            IdentityProvider::trusted_headers(ID_HEADER, NAME_HEADER).unwrap(),
            variant,
        );
        Self {
            router: app(state),
            model,
            image_dir,
        }
    }

    pub fn new(variant: RouterVariant) -> Self {
        Self::with_model(CameraModel::Memory(MemoryModel::new()), variant)
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.send(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }
}

pub fn form_post(uri: &str, body: &str) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// One multipart part: `(name, Some((filename, content_type)), data)`.
pub type Part<'a> = (&'a str, Option<(&'a str, &'a str)>, &'a str);

pub fn multipart_post(uri: &str, parts: &[Part<'_>]) -> Request<Body> {
    let mut body = Vec::new();
    for (name, file, data) in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match file {
            Some((filename, content_type)) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                        name, filename, content_type
                    )
                    .as_bytes(),
                );
            }
            None => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name)
                        .as_bytes(),
                );
            }
        }
        body.extend_from_slice(data.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    Request::post(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

pub fn location(response: &Response<Body>) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .expect("redirect must carry a Location header")
        .to_str()
        .unwrap()
        .to_string()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
