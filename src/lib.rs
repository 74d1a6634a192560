//! An implementation of [JMESPath](https://jmespath.org), a query language
//! for JSON-like data: a compiler that turns a textual expression into a
//! reusable tree, and an evaluator that runs that tree against a value.
//!
//! # Overview
//!
//! A JMESPath expression such as `people[?age > `20`].name` is compiled
//! once with [`compile`] into a [`CompiledExpression`], then run against
//! any number of inputs with [`CompiledExpression::search`]. [`search`] is
//! the one-shot convenience that compiles and evaluates in a single call,
//! backed by a process-wide compile cache so repeated calls with the same
//! source string skip re-parsing.
//!
//! # Example
//!
//! ```
//! use jmespath_engine::{search, Value};
//!
//! let data: Value = serde_json::json!({"people": [{"name": "a", "age": 30}]}).into();
//! let result = search("people[0].name", data, None).unwrap();
//! assert_eq!(result, Value::String("a".to_string()));
//! ```
//!
//! # Design
//!
//! Compilation is a conventional two-stage pipeline: [`lexer::tokenize`]
//! turns source text into a flat token list, and [`parser::parse`] runs a
//! Pratt (operator-precedence) parser over that list to build an
//! [`ast::Ast`]. Evaluation is a straightforward tree walk
//! ([`interpreter::eval`]) carrying a [`Value`] as "the current node" down
//! through each AST node, with built-in functions resolved through
//! [`interpreter::functions`].
//!
//! A [`CompiledExpression`] is immutable once built and holds no interior
//! mutability, so it can be shared across threads (e.g. cached behind an
//! `Arc`) and evaluated concurrently without synchronization; only the
//! compile cache and the custom-function registries need locking.

mod ast;
mod cache;
mod error;
mod interpreter;
mod lexer;
mod options;
mod parser;
mod scope;
mod token;
mod util;
mod value;

pub mod compiled;

pub use ast::Ast;
pub use compiled::CompiledExpression;
pub use error::{ErrorKind, JmespathError};
pub use interpreter::functions::{CustomFunction, Functions, ParamSpec, Signature, TypeTag};
pub use options::Options;
pub use value::Value;

use std::sync::Arc;

use once_cell::sync::Lazy;

use cache::CompileCache;

static COMPILE_CACHE: Lazy<CompileCache> = Lazy::new(CompileCache::new);

/// Compile `source` into a reusable [`CompiledExpression`].
///
/// Successful compiles are kept in a process-wide cache keyed by the exact
/// source string, so calling this with an expression already seen in this
/// process returns the cached tree instead of re-lexing/re-parsing it.
pub fn compile(source: &str) -> Result<CompiledExpression, JmespathError> {
    if let Some(cached) = COMPILE_CACHE.get(source) {
        return Ok((*cached).clone());
    }
    let ast = parser::parse(source).map_err(|e| e.with_expression(source))?;
    let compiled = CompiledExpression::new(source, ast);
    COMPILE_CACHE.insert(source.to_string(), Arc::new(compiled.clone()));
    Ok(compiled)
}

/// Clear the process-wide compile cache used by [`compile`].
pub fn purge_cache() {
    COMPILE_CACHE.purge();
}

/// Compile `source` and immediately evaluate it against `data`, using
/// `options` if given (or the defaults otherwise). Equivalent to
/// `compile(source)?.search(data, &options.unwrap_or_default())`.
pub fn search(
    source: &str,
    data: Value,
    options: Option<Options>,
) -> Result<Value, JmespathError> {
    let compiled = compile(source)?;
    let options = options.unwrap_or_default();
    compiled.search(data, &options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_then_search_round_trips_through_the_cache() {
        let data = Value::from(serde_json::json!({"a": {"b": 1}}));
        let first = search("a.b", data.clone(), None).unwrap();
        assert_eq!(first, Value::Number(1.0));
        // Second call should hit COMPILE_CACHE rather than re-parsing.
        let second = search("a.b", data, None).unwrap();
        assert_eq!(second, Value::Number(1.0));
    }

    #[test]
    fn search_propagates_a_compile_error() {
        let err = search("a=b", Value::Null, None).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::LexerError { .. }));
    }

    #[test]
    fn custom_function_registered_globally_is_reachable() {
        Functions::register(
            "double",
            CustomFunction::new(Signature::fixed(vec![ParamSpec::new(&[TypeTag::Number])]), |_ctx, args| {
                Ok(Value::Number(args[0].as_number().unwrap() * 2.0))
            }),
        );
        let result = search("double(@)", Value::Number(21.0), None).unwrap();
        assert_eq!(result, Value::Number(42.0));
        Functions::unregister("double");
    }

    #[test]
    fn purge_cache_does_not_break_subsequent_compiles() {
        search("a.b", Value::from(serde_json::json!({"a": {"b": 1}})), None).unwrap();
        purge_cache();
        let result = search("a.b", Value::from(serde_json::json!({"a": {"b": 2}})), None).unwrap();
        assert_eq!(result, Value::Number(2.0));
    }
}
