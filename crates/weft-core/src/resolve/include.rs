//! Include tag resolver
//!
//! Expression shape: `INCLUDE <file>`. The file is read asynchronously
//! relative to the configured template directory and its contents are
//! spliced inline as template text for further parsing. A read failure is
//! fatal and names both the tag and the directory.

use crate::error::{WeftError, WeftResult};
use crate::loader::TemplateLoader;
use crate::resolve::Resolution;
use futures::future::BoxFuture;
use std::sync::Arc;

/// Build the deferred load job for an include tag
pub fn job(
    expression: String,
    loader: Arc<dyn TemplateLoader>,
    template_dir: String,
) -> BoxFuture<'static, WeftResult<Resolution>> {
    let name = expression
        .strip_prefix("INCLUDE")
        .unwrap_or(&expression)
        .trim()
        .to_string();
    Box::pin(async move {
        match loader.load(&name).await {
            Ok(source) => Ok(Resolution::Template(source)),
            Err(error) => {
                tracing::debug!(%error, file = %name, "include load failed");
                Err(WeftError::include(expression, template_dir))
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::MapLoader;

    #[tokio::test]
    async fn loads_file_contents_as_template() {
        let loader = Arc::new(MapLoader::new().with("head.tpl", "<head/>"));
        let outcome = job("INCLUDE head.tpl".to_string(), loader, ".".to_string())
            .await
            .unwrap();
        let Resolution::Template(source) = outcome else {
            panic!("include must produce template text");
        };
        assert_eq!(source, "<head/>");
    }

    #[tokio::test]
    async fn failure_names_tag_and_directory() {
        let loader = Arc::new(MapLoader::new());
        let err = job(
            "INCLUDE missing.tpl".to_string(),
            loader,
            "/srv/tpl".to_string(),
        )
        .await
        .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("INCLUDE missing.tpl"));
        assert!(message.contains("/srv/tpl"));
    }
}
