//! Domain logic for the studio portfolio.
//!
//! Everything in this crate is pure: the record model and its validation
//! rules, the built-in showcase set, catalog merging and filtering, media
//! URL helpers, the admin gate and backup export. Network access lives in
//! `creativestalk-store`.

pub mod admin;
pub mod catalog;
pub mod categories;
pub mod error;
pub mod export;
pub mod media;
pub mod portfolio;
pub mod showcase;
pub mod types;
