//! Body extractor for camera submissions.
//!
//! Accepts `application/x-www-form-urlencoded` or `multipart/form-data`. In
//! multipart bodies the file part named `image` is kept aside; every other
//! part becomes a text field.

use crate::{
    errors::AppError,
    models::camera::CameraFields,
    services::images::UploadedImage,
};
use axum::{
    Form,
    extract::{FromRequest, Multipart, Request, multipart::MultipartError},
    http::header,
};

/// Name of the single file field accepted with a submission.
pub const IMAGE_FIELD: &str = "image";

/// Upper bound for an uploaded image.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug)]
pub struct CameraForm {
    pub fields: CameraFields,
    pub image: Option<UploadedImage>,
}

impl<S> FromRequest<S> for CameraForm
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("multipart/form-data"));

        if !is_multipart {
            let Form(fields) = Form::<CameraFields>::from_request(req, state)
                .await
                .map_err(|rej| AppError::new(rej.status(), rej.body_text()))?;
            return Ok(Self {
                fields,
                image: None,
            });
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|rej| AppError::new(rej.status(), rej.body_text()))?;

        let mut fields = CameraFields::new();
        let mut image = None;
        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().unwrap_or_default().to_string();
            if name.is_empty() {
                continue;
            }

            if name == IMAGE_FIELD {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let data = field.bytes().await.map_err(multipart_error)?;
                // Browsers send an empty part when no file was chosen.
                if !file_name.is_empty() && !data.is_empty() {
                    image = Some(UploadedImage {
                        file_name,
                        content_type,
                        data,
                    });
                }
                continue;
            }

            let value = field.text().await.map_err(multipart_error)?;
            fields.insert(name, value);
        }

        Ok(Self { fields, image })
    }
}

fn multipart_error(err: MultipartError) -> AppError {
    AppError::new(err.status(), err.body_text())
}
