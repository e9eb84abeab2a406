//! Embedded static assets and HTML templates.

use rust_embed::RustEmbed;

/// Files served under `/static/`.
#[derive(RustEmbed)]
#[folder = "static/"]
pub struct Assets;

/// Jinja templates for the back-office pages.
#[derive(RustEmbed)]
#[folder = "templates/"]
pub struct TemplateFiles;
