//! HTML views for the cameras pages.
//!
//! Plain string builders; every interpolated value passes through
//! `html_escape`.

use crate::{
    identity::User,
    models::camera::{CREATED_BY, Camera, IMAGE_URL, Page},
};
use axum::http::StatusCode;

/// Editable attributes shown on the form and the detail page, with labels.
const FORM_FIELDS: [(&str, &str); 3] = [
    ("make", "Make"),
    ("model", "Model"),
    ("releaseDate", "Release date"),
];

fn layout(title: &str, user: Option<&User>, body: &str) -> String {
    let session = match user {
        Some(user) => format!(
            r#"<p class="navbar-text">Signed in as {}</p>"#,
            html_escape(&user.display_name)
        ),
        None => String::new(),
    };

    format!(
        concat!(
            "<!DOCTYPE html>",
            "<html><head><meta charset=\"utf-8\"><title>{title}</title></head>",
            "<body><nav><a href=\"/cameras\">Cameras</a>{session}</nav>",
            "<main>{body}</main></body></html>"
        ),
        title = html_escape(title),
        session = session,
        body = body,
    )
}

/// Page of cameras with a link to the next page when one exists.
pub fn list(base: &str, page: &Page, user: Option<&User>) -> String {
    let mut body = String::from("<h3>Cameras</h3>");
    body.push_str(&format!(
        r#"<a href="{}/add">Add camera</a>"#,
        html_escape(base)
    ));

    if page.cameras.is_empty() {
        body.push_str("<p>No cameras found.</p>");
    }

    for camera in &page.cameras {
        body.push_str(r#"<div class="media">"#);
        body.push_str(&format!(
            r#"<a href="{}/{}">"#,
            html_escape(base),
            html_escape(&camera.id)
        ));
        if let Some(url) = camera.image_url() {
            body.push_str(&format!(
                r#"<img class="thumbnail" src="{}">"#,
                html_escape(url)
            ));
        }
        body.push_str(&format!(
            "<h4>{}</h4>",
            html_escape(&title_of(camera))
        ));
        body.push_str("</a></div>");
    }

    if let Some(token) = &page.next_page_token {
        body.push_str(&format!(
            r#"<nav><a href="?pageToken={}">More</a></nav>"#,
            html_escape(token)
        ));
    }

    layout("Cameras", user, &body)
}

/// Create/edit form; `camera` is `None` for an empty form.
pub fn form(
    base: &str,
    camera: Option<&Camera>,
    action: &str,
    upload_enabled: bool,
    user: Option<&User>,
) -> String {
    let target = match camera {
        Some(camera) => format!("{}/{}/edit", base, camera.id),
        None => format!("{}/add", base),
    };

    let mut body = format!("<h3>{} camera</h3>", html_escape(action));
    body.push_str(&format!(
        r#"<form method="POST" action="{}" enctype="multipart/form-data">"#,
        html_escape(&target)
    ));

    for (key, label) in FORM_FIELDS {
        body.push_str(&format!(
            r#"<label for="{key}">{label}</label><input type="text" name="{key}" id="{key}" value="{value}">"#,
            key = key,
            label = label,
            value = html_escape(field(camera, key)),
        ));
    }
    body.push_str(&format!(
        r#"<label for="description">Description</label><textarea name="description" id="description">{}</textarea>"#,
        html_escape(field(camera, "description"))
    ));

    if upload_enabled {
        body.push_str(
            r#"<label for="image">Image</label><input type="file" name="image" id="image" accept="image/*">"#,
        );
    }
    body.push_str(&format!(
        r#"<input type="hidden" name="{}" value="{}">"#,
        IMAGE_URL,
        html_escape(field(camera, IMAGE_URL))
    ));
    body.push_str(r#"<button type="submit">Save</button></form>"#);

    layout(&format!("{} camera", action), user, &body)
}

/// Detail page for one camera.
pub fn detail(base: &str, camera: &Camera, user: Option<&User>) -> String {
    let base = html_escape(base);
    let id = html_escape(&camera.id);

    let mut body = String::from("<h3>Camera</h3>");
    body.push_str(&format!(
        r#"<a href="{base}/{id}/edit">Edit camera</a> <a href="{base}/{id}/delete">Delete camera</a>"#,
        base = base,
        id = id,
    ));
    body.push_str(r#"<div class="media">"#);
    if let Some(url) = camera.image_url() {
        body.push_str(&format!(
            r#"<img class="camera-image" src="{}">"#,
            html_escape(url)
        ));
    }
    body.push_str(&format!("<h4>{}</h4>", html_escape(&title_of(camera))));
    if let Some(date) = camera.get("releaseDate").filter(|d| !d.is_empty()) {
        body.push_str(&format!("<p>Released {}</p>", html_escape(date)));
    }
    body.push_str(&format!(
        "<small>Added by {}</small>",
        html_escape(camera.get(CREATED_BY).unwrap_or("unknown"))
    ));
    if let Some(description) = camera.get("description") {
        body.push_str(&format!("<p>{}</p>", html_escape(description)));
    }
    body.push_str("</div>");

    layout(&title_of(camera), user, &body)
}

/// Generic error page used by every failure.
pub fn error_page(status: StatusCode, message: &str) -> String {
    let reason = status.canonical_reason().unwrap_or("Error");
    let body = format!(
        "<h3>{} {}</h3><p>{}</p>",
        status.as_u16(),
        html_escape(reason),
        html_escape(message)
    );
    layout(reason, None, &body)
}

fn field<'a>(camera: Option<&'a Camera>, key: &str) -> &'a str {
    camera.and_then(|c| c.get(key)).unwrap_or_default()
}

fn title_of(camera: &Camera) -> String {
    let parts: Vec<&str> = ["make", "model"]
        .iter()
        .filter_map(|key| camera.get(key))
        .filter(|v| !v.is_empty())
        .collect();
    if parts.is_empty() {
        format!("Camera {}", camera.id)
    } else {
        parts.join(" ")
    }
}

fn html_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
