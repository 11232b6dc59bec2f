pub mod camera_form;
pub mod camera_handlers;
pub mod health_handlers;
pub mod image_handlers;
