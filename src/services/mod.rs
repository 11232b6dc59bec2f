//! Collaborators behind the HTTP layer: the camera storage model with its
//! backends, and the image store.

pub mod images;
pub mod memory;
pub mod model;
pub mod sqlite;
