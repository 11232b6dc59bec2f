//! Core data models for the cameras service.
//!
//! A camera is an opaque identifier plus a bag of string attributes. The
//! storage backends persist it and the views render it.

pub mod camera;
