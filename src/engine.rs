//! Simple language engine - the main entry point for compiling and
//! evaluating expressions

use crate::ast::{Expression, Predicate};
use crate::cache::{CacheStats, ExpressionCache};
use crate::config::LanguageConfig;
use crate::error::{Result, SimpleError};
use crate::evaluator::EvaluationContext;
use crate::extension::FileFunctionResolver;
use crate::model::{SimpleValue, ValueType};
use crate::parser::{
    FunctionCompiler, FunctionResolver, ParseEnvironment, ParseStrategy, TokenRegistry,
    compile_with, current_registry, expression_strategies, predicate_strategies,
};
use crate::resource::{NoopResourceLoader, ResourceLoader};
use once_cell::sync::Lazy;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Registry generation before the first compilation
const NO_GENERATION: u64 = u64::MAX;

/// Compiles Simple expressions and predicates and caches the trees.
///
/// By default the process-wide token registry is used, so delimiters changed
/// with [`change_function_start_token`](crate::parser::change_function_start_token)
/// take effect on the next compilation and invalidate cached trees. A
/// language built with [`with_registry`](Self::with_registry) keeps its own
/// registry instead.
pub struct SimpleLanguage {
    config: LanguageConfig,
    registry: Option<Arc<TokenRegistry>>,
    functions: FunctionCompiler,
    expression_strategies: Vec<Box<dyn ParseStrategy>>,
    predicate_strategies: Vec<Box<dyn ParseStrategy>>,
    loader: Arc<dyn ResourceLoader>,
    expressions: ExpressionCache<Arc<Expression>>,
    predicates: ExpressionCache<Arc<Predicate>>,
    generation: AtomicU64,
}

impl Default for SimpleLanguage {
    fn default() -> Self {
        Self::new()
    }
}

impl SimpleLanguage {
    /// Create a language with the default configuration
    pub fn new() -> Self {
        Self::with_config(LanguageConfig::default())
    }

    /// Create a language with a custom configuration
    pub fn with_config(config: LanguageConfig) -> Self {
        Self {
            registry: None,
            functions: FunctionCompiler::new(),
            expression_strategies: expression_strategies(config.legacy_syntax),
            predicate_strategies: predicate_strategies(config.legacy_syntax),
            loader: Arc::new(NoopResourceLoader),
            expressions: ExpressionCache::new(config.cache_size),
            predicates: ExpressionCache::new(config.cache_size),
            generation: AtomicU64::new(NO_GENERATION),
            config,
        }
    }

    /// Use `registry` instead of the process-wide one
    pub fn with_registry(mut self, registry: TokenRegistry) -> Self {
        self.registry = Some(Arc::new(registry));
        self.clear_cache();
        self
    }

    /// Layer a function resolver ahead of the built-in forms
    pub fn with_resolver(mut self, resolver: Arc<dyn FunctionResolver>) -> Self {
        log::debug!("Adding function resolver {}", resolver.name());
        self.functions = self.functions.with_resolver(resolver);
        self.clear_cache();
        self
    }

    /// Enable the `file:` functions
    pub fn with_file_functions(self) -> Self {
        self.with_resolver(Arc::new(FileFunctionResolver::new()))
    }

    /// Replace sources through `loader` before compiling them
    pub fn with_resource_loader(mut self, loader: impl ResourceLoader + 'static) -> Self {
        self.loader = Arc::new(loader);
        self.clear_cache();
        self
    }

    /// The configuration in use
    pub fn config(&self) -> &LanguageConfig {
        &self.config
    }

    /// The registry the next compilation will use
    pub fn registry(&self) -> Arc<TokenRegistry> {
        match &self.registry {
            Some(registry) => Arc::clone(registry),
            None => current_registry(),
        }
    }

    /// Take a registry snapshot, dropping cached trees compiled against an
    /// older one. Cache entries are also tagged with the generation, so a
    /// tree compiled concurrently against the old registry is never served.
    fn snapshot(&self) -> Arc<TokenRegistry> {
        let registry = self.registry();
        let previous = self.generation.swap(registry.generation(), Ordering::AcqRel);
        if previous != registry.generation() && previous != NO_GENERATION {
            log::debug!(
                "Token registry changed (generation {previous} -> {}), clearing cached expressions",
                registry.generation()
            );
            self.clear_cache();
        }
        registry
    }

    fn compile_source(
        &self,
        strategies: &[Box<dyn ParseStrategy>],
        registry: &TokenRegistry,
        source: &str,
    ) -> Result<Expression> {
        let text = self.loader.resolve(source)?;
        let env = ParseEnvironment {
            registry,
            functions: &self.functions,
            allow_escape: self.config.allow_escape,
            strict_functions: self.config.strict_functions,
        };
        log::debug!("Compiling '{source}'");
        compile_with(strategies, &env, &text).map_err(|e| SimpleError::syntax(source, e))
    }

    /// Compile a template or expression such as `Hello ${header.name}`.
    ///
    /// Operator words are plain text here: `${header.qty} in stock` renders
    /// as `5 in stock`. Use [`compile_predicate`](Self::compile_predicate)
    /// for comparisons.
    ///
    /// Compiling the same text twice returns the same shared tree while it is
    /// cached. Syntax errors are returned and never cached.
    pub fn compile_expression(&self, text: &str) -> Result<Arc<Expression>> {
        let registry = self.snapshot();
        self.expressions.get_or_compile(text, registry.generation(), || {
            self.compile_source(&self.expression_strategies, &registry, text)
                .map(Arc::new)
        })
    }

    /// Compile a predicate such as `${header.foo} == 'abc'`; non-boolean
    /// expressions are read for their truthiness
    pub fn compile_predicate(&self, text: &str) -> Result<Arc<Predicate>> {
        let registry = self.snapshot();
        self.predicates.get_or_compile(text, registry.generation(), || {
            let expression = self.compile_source(&self.predicate_strategies, &registry, text)?;
            Ok(Arc::new(Predicate::new(Expression::from(Predicate::new(expression)))))
        })
    }

    /// Compile an expression whose result is converted to `result_type`.
    ///
    /// `Boolean` compiles the text as a predicate; `Object` leaves the result
    /// as it is.
    pub fn compile_expression_as(&self, text: &str, result_type: ValueType) -> Result<Arc<Expression>> {
        match result_type {
            ValueType::Boolean => {
                let predicate = self.compile_predicate(text)?;
                Ok(Arc::new(predicate.expression().clone()))
            }
            ValueType::Any => self.compile_expression(text),
            target => {
                let expression = self.compile_expression(text)?;
                Ok(Arc::new(Expression::Convert {
                    target,
                    expression: Box::new(expression.as_ref().clone()),
                }))
            }
        }
    }

    /// Compile (or fetch) and evaluate an expression
    pub fn evaluate(&self, text: &str, context: &dyn EvaluationContext) -> Result<SimpleValue> {
        Ok(self.compile_expression(text)?.evaluate(context)?)
    }

    /// Compile (or fetch) and evaluate a predicate
    pub fn matches(&self, text: &str, context: &dyn EvaluationContext) -> Result<bool> {
        Ok(self.compile_predicate(text)?.matches(context)?)
    }

    /// Combined statistics of the expression and predicate caches
    pub fn cache_stats(&self) -> CacheStats {
        self.expressions.stats().merge(self.predicates.stats())
    }

    /// Drop every cached tree
    pub fn clear_cache(&self) {
        self.expressions.clear();
        self.predicates.clear();
    }
}

impl fmt::Debug for SimpleLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimpleLanguage")
            .field("config", &self.config)
            .field("pinned_registry", &self.registry.is_some())
            .field("functions", &self.functions)
            .field("expression_strategies", &self.expression_strategies)
            .field("predicate_strategies", &self.predicate_strategies)
            .field("loader", &self.loader)
            .field("cache", &self.cache_stats())
            .finish()
    }
}

static DEFAULT_LANGUAGE: Lazy<SimpleLanguage> = Lazy::new(SimpleLanguage::new);

/// The shared language used by [`simple`] and [`predicate`]
pub fn default_language() -> &'static SimpleLanguage {
    &DEFAULT_LANGUAGE
}

/// Compile an expression with the shared default language
pub fn simple(text: &str) -> Result<Arc<Expression>> {
    DEFAULT_LANGUAGE.compile_expression(text)
}

/// Compile a predicate with the shared default language
pub fn predicate(text: &str) -> Result<Arc<Predicate>> {
    DEFAULT_LANGUAGE.compile_predicate(text)
}
