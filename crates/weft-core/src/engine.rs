//! Compilation engine
//!
//! Drives the scan/split/dispatch cycle over the node chain. Parsing is
//! synchronous; function-call and include tags run as deferred jobs in a
//! `FuturesUnordered` set, so sibling template text keeps parsing while a
//! callable or a file read is in flight. Output order is fixed by chain
//! link order at node-creation time, never by job completion order. The
//! first fatal error ends the compile; results of still-outstanding jobs
//! are dropped.

use crate::chain::{Chain, HEAD};
use crate::config::EngineConfig;
use crate::error::{WeftError, WeftResult};
use crate::filters::FilterRegistry;
use crate::functions::{ContextHandle, FunctionRegistry, TemplateFunction};
use crate::loader::{FsLoader, TemplateLoader};
use crate::resolve::{self, Resolution, TagKind, cond, for_loop, func, include, param};
use crate::scanner::{self, ScanOutcome};
use crate::scope::Scope;
use crate::value::Value;
use futures::StreamExt;
use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use indexmap::IndexMap;
use std::collections::VecDeque;
use std::sync::Arc;

type ResolverJob = BoxFuture<'static, (usize, WeftResult<Resolution>)>;

/// Successful compile result
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    /// The fully substituted output text
    pub text: String,
    /// Non-fatal warnings accumulated during compilation, in order
    pub warnings: Vec<String>,
}

/// The template expansion engine
///
/// Construction fixes the configuration, loader and registries; `compile`
/// and `render_str` may then run any number of times.
pub struct Engine {
    config: EngineConfig,
    loader: Arc<dyn TemplateLoader>,
    filters: FilterRegistry,
    functions: FunctionRegistry,
}

impl Engine {
    /// Create an engine reading templates below `config.template_dir`
    pub fn new(config: EngineConfig) -> Self {
        let loader = FsLoader::with_encoding(config.template_dir.clone(), config.encoding);
        Self::with_loader(config, Arc::new(loader))
    }

    /// Create an engine with a custom template loader
    pub fn with_loader(config: EngineConfig, loader: Arc<dyn TemplateLoader>) -> Self {
        Self {
            config,
            loader,
            filters: FilterRegistry::with_builtins(),
            functions: FunctionRegistry::with_builtins(),
        }
    }

    /// The engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Register a filter
    pub fn register_filter<F>(&mut self, name: &str, filter: F)
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.filters.register(name, filter);
    }

    /// Register a callable extension
    pub fn register_function(&mut self, function: Arc<dyn TemplateFunction>) {
        self.functions.register(function);
    }

    /// Compile a named template with the given context handle and parameters
    pub async fn compile(
        &self,
        template: &str,
        cx: ContextHandle,
        params: Value,
    ) -> WeftResult<Rendered> {
        let source = self.loader.load(template).await.map_err(|error| {
            WeftError::template(format!(
                "cannot read template \"{}\": {} (template_dir={})",
                template,
                error,
                self.config.template_dir.display()
            ))
        })?;
        self.render_str(&source, cx, params).await
    }

    /// Compile template source text directly
    pub async fn render_str(
        &self,
        source: &str,
        cx: ContextHandle,
        params: Value,
    ) -> WeftResult<Rendered> {
        let vars = match params {
            Value::Object(map) => map,
            Value::Null => IndexMap::new(),
            other => {
                return Err(WeftError::config(format!(
                    "parameters must be an object, got {}",
                    other.type_name()
                )));
            }
        };

        let mut chain = Chain::new();
        let root = chain.push_after(HEAD, source.to_string(), Scope::root(vars));

        let mut pending: VecDeque<usize> = VecDeque::from([root]);
        let mut jobs: FuturesUnordered<ResolverJob> = FuturesUnordered::new();

        loop {
            while let Some(idx) = pending.pop_front() {
                self.parse_node(&mut chain, idx, &mut pending, &mut jobs, &cx)?;
            }
            match jobs.next().await {
                Some((idx, outcome)) => match outcome? {
                    Resolution::Output(text) => {
                        chain.node_mut(idx).output = text;
                        chain.close(idx);
                    }
                    Resolution::Template(text) => {
                        chain.node_mut(idx).template = text;
                        pending.push_back(idx);
                    }
                    Resolution::Done => chain.close(idx),
                },
                None => break,
            }
        }

        debug_assert_eq!(chain.outstanding(), 0, "all nodes resolved at completion");
        Ok(Rendered {
            text: chain.assemble(),
            warnings: chain.take_warnings(),
        })
    }

    /// Scan one node's template text and split it at its first tag
    fn parse_node(
        &self,
        chain: &mut Chain,
        idx: usize,
        pending: &mut VecDeque<usize>,
        jobs: &mut FuturesUnordered<ResolverJob>,
        cx: &ContextHandle,
    ) -> WeftResult<()> {
        let template = std::mem::take(&mut chain.node_mut(idx).template);
        let scope = chain.node(idx).scope.clone();

        match scanner::scan(&template, &self.config)? {
            ScanOutcome::Text(text) => {
                chain.node_mut(idx).output = text;
                chain.close(idx);
            }
            ScanOutcome::Comment { prefix, rest } => {
                chain.node_mut(idx).output = prefix;
                if !rest.is_empty() {
                    let next = chain.push_after(idx, rest, scope);
                    pending.push_back(next);
                }
                chain.close(idx);
            }
            ScanOutcome::Tag {
                prefix,
                expression,
                rest,
            } => {
                chain.node_mut(idx).output = prefix;

                let kind = TagKind::classify(&expression);
                let (block, rest) = match kind.block_keyword() {
                    Some(keyword) => {
                        crate::matcher::match_block(&rest, keyword, &expression, &self.config)?
                    }
                    None => (String::new(), rest),
                };

                let expression = resolve::preprocess_expression(&expression, &scope, &self.config);
                tracing::debug!(node = idx, ?kind, expression = %expression, "tag node");

                let tag_idx =
                    chain.push_tag_after(idx, String::new(), expression, block, scope.clone());
                if !rest.is_empty() {
                    let next = chain.push_after(tag_idx, rest, scope);
                    pending.push_back(next);
                }

                self.dispatch(chain, tag_idx, kind, pending, jobs, cx)?;
                chain.close(idx);
            }
        }
        Ok(())
    }

    /// Hand a freshly created tag node to its resolver
    fn dispatch(
        &self,
        chain: &mut Chain,
        tag_idx: usize,
        kind: TagKind,
        pending: &mut VecDeque<usize>,
        jobs: &mut FuturesUnordered<ResolverJob>,
        cx: &ContextHandle,
    ) -> WeftResult<()> {
        let expression = chain.node(tag_idx).expression.clone();
        let scope = chain.node(tag_idx).scope.clone();

        match kind {
            TagKind::Param => {
                let text = param::resolve(&expression, &scope, &self.filters, self.config.strict)?;
                chain.node_mut(tag_idx).output = text;
                chain.close(tag_idx);
            }
            TagKind::Func => match func::prepare(&expression, &scope, &self.functions) {
                Ok((function, args)) => {
                    let fut = func::job(expression, function, cx.clone(), args);
                    jobs.push(Box::pin(async move { (tag_idx, fut.await) }));
                }
                Err(message) => {
                    if self.config.strict {
                        return Err(WeftError::eval(expression, message));
                    }
                    chain.warn(format!("\"{expression}\" {message}"));
                    chain.close(tag_idx);
                }
            },
            TagKind::If => {
                let block = chain.node(tag_idx).block.clone();
                let outcome =
                    cond::resolve(&expression, &block, &scope, self.config.strict, &self.config)?;
                if let Some(warning) = outcome.warning {
                    chain.warn(warning);
                }
                chain.node_mut(tag_idx).template = outcome.template;
                pending.push_back(tag_idx);
            }
            TagKind::For => {
                let children = for_loop::resolve(chain, tag_idx, self.config.strict)?;
                pending.extend(children);
                chain.close(tag_idx);
            }
            TagKind::Include => {
                let fut = include::job(
                    expression,
                    self.loader.clone(),
                    self.config.template_dir.display().to_string(),
                );
                jobs.push(Box::pin(async move { (tag_idx, fut.await) }));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::null_context;
    use crate::loader::MapLoader;

    fn engine() -> Engine {
        Engine::with_loader(EngineConfig::default(), Arc::new(MapLoader::new()))
    }

    #[tokio::test]
    async fn identity_law() {
        let rendered = engine()
            .render_str("plain text, no tags", null_context(), Value::Null)
            .await
            .unwrap();
        assert_eq!(rendered.text, "plain text, no tags");
        assert!(rendered.warnings.is_empty());
    }

    #[tokio::test]
    async fn rejects_non_object_parameters() {
        let err = engine()
            .render_str("x", null_context(), Value::Int(1))
            .await
            .unwrap_err();
        assert!(matches!(err, WeftError::Config(_)));
    }

    #[tokio::test]
    async fn missing_top_level_template_fails() {
        let err = engine()
            .compile("absent.tpl", null_context(), Value::Null)
            .await
            .unwrap_err();
        assert!(matches!(err, WeftError::Template(_)));
    }
}
