//! AI Video Dubbing Service
//!
//! This library provides the core functionality for the dubber service,
//! which re-voices videos into other languages: it extracts the spoken-word
//! transcript, translates it, synthesizes narration in the target language,
//! and composes the new audio over the original video. Jobs run on spawned
//! tasks; clients poll for progress.

pub mod app_state;
pub mod config;
pub mod models;
pub mod routes;
pub mod services;
