//! HTML rendering.
//!
//! Templates are compiled into the binary ([`TemplateFiles`]) and parsed into one
//! [`minijinja::Environment`] at startup, so a broken template fails the boot rather than a
//! request. Files ending in `.html` are auto-escaped.

use axum::response::Html;
use minijinja::{Environment, Value, context};
use tracing::{debug, instrument};

use crate::{
    api::models::cooks::CurrentUser,
    errors::{Error, Result},
    static_assets::TemplateFiles,
};

#[derive(Debug)]
pub struct Templates {
    env: Environment<'static>,
}

impl Templates {
    /// Parse every embedded template.
    pub fn load() -> Result<Self> {
        let mut env = Environment::new();
        for path in TemplateFiles::iter() {
            let Some(file) = TemplateFiles::get(&path) else {
                continue;
            };
            let source = String::from_utf8(file.data.into_owned()).map_err(|e| Error::Internal {
                operation: format!("read template {path}: {e}"),
            })?;
            env.add_template_owned(path.to_string(), source)?;
            debug!("Loaded template {path}");
        }
        Ok(Self { env })
    }

    /// Render `name` with `ctx`, adding the logged-in cook as `user` for the page chrome.
    #[instrument(skip(self, user, ctx), err)]
    pub fn render(&self, name: &str, user: Option<&CurrentUser>, ctx: Value) -> Result<Html<String>> {
        let template = self.env.get_template(name)?;
        let html = template.render(context! { user => user, ..ctx })?;
        Ok(Html(html))
    }
}
