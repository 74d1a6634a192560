use std::borrow::Cow;
use std::sync::Arc;

use ptree::TreeItem;

use crate::ast::Ast;
use crate::error::JmespathError;
use crate::interpreter::{eval, EvalContext};
use crate::options::Options;
use crate::scope::ScopeStack;
use crate::value::Value;

/// A parsed expression, ready to be evaluated against any number of inputs.
/// Immutable after construction: the tree holds no interior mutability, so
/// the same `CompiledExpression` can be shared across threads (wrapped in
/// an `Arc`, as the compile cache does) and evaluated concurrently.
#[derive(Debug, Clone)]
pub struct CompiledExpression {
    source: String,
    root: Arc<Ast>,
}

impl CompiledExpression {
    pub(crate) fn new(source: impl Into<String>, root: Ast) -> Self {
        Self {
            source: source.into(),
            root: Arc::new(root),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Evaluate this expression against `data` with the given `options`.
    pub fn search(&self, data: Value, options: &Options) -> Result<Value, JmespathError> {
        let mut scope = ScopeStack::new();
        let mut ctx = EvalContext {
            options,
            scope: &mut scope,
        };
        eval(&self.root, &data, &mut ctx).map_err(|e| e.with_expression(self.source.clone()))
    }

    /// Render the parsed tree for debugging, one line per node.
    pub fn print_tree(&self) -> std::io::Result<()> {
        ptree::print_tree(&*self.root)
    }
}

impl TreeItem for Ast {
    type Child = Ast;

    fn write_self<W: std::io::Write>(&self, f: &mut W, _: &ptree::Style) -> std::io::Result<()> {
        write!(f, "{}", describe(self))
    }

    fn children(&self) -> Cow<[Self::Child]> {
        Cow::from(children(self))
    }
}

fn describe(node: &Ast) -> String {
    match node {
        Ast::Identity => "Identity".to_string(),
        Ast::CurrentNode => "CurrentNode".to_string(),
        Ast::Field(name) => format!("Field({})", name),
        Ast::Index(i) => format!("Index({})", i),
        Ast::Slice { start, stop, step } => format!("Slice({:?}, {:?}, {})", start, stop, step),
        Ast::SubExpression(..) => "SubExpression".to_string(),
        Ast::IndexExpression(..) => "IndexExpression".to_string(),
        Ast::Projection(..) => "Projection".to_string(),
        Ast::ValueProjection(..) => "ValueProjection".to_string(),
        Ast::FilterProjection { .. } => "FilterProjection".to_string(),
        Ast::Flatten(..) => "Flatten".to_string(),
        Ast::MultiSelectList(items) => format!("MultiSelectList({} items)", items.len()),
        Ast::MultiSelectHash(pairs) => format!("MultiSelectHash({} pairs)", pairs.len()),
        Ast::Literal(value) => format!("Literal({})", value),
        Ast::Comparator(op, ..) => format!("Comparator({:?})", op),
        Ast::OrExpression(..) => "OrExpression".to_string(),
        Ast::AndExpression(..) => "AndExpression".to_string(),
        Ast::NotExpression(..) => "NotExpression".to_string(),
        Ast::Pipe(..) => "Pipe".to_string(),
        Ast::ExpressionReference(..) => "ExpressionReference".to_string(),
        Ast::FunctionExpression(name, args) => format!("FunctionExpression({}, {} args)", name, args.len()),
    }
}

fn children(node: &Ast) -> Vec<Ast> {
    match node {
        Ast::SubExpression(l, r)
        | Ast::IndexExpression(l, r)
        | Ast::Projection(l, r)
        | Ast::ValueProjection(l, r)
        | Ast::OrExpression(l, r)
        | Ast::AndExpression(l, r)
        | Ast::Pipe(l, r) => vec![(**l).clone(), (**r).clone()],
        Ast::FilterProjection { left, right, predicate } => {
            vec![(**left).clone(), (**predicate).clone(), (**right).clone()]
        }
        Ast::Flatten(c) | Ast::NotExpression(c) | Ast::ExpressionReference(c) => vec![(**c).clone()],
        Ast::Comparator(_, l, r) => vec![(**l).clone(), (**r).clone()],
        Ast::MultiSelectList(items) => items.clone(),
        Ast::MultiSelectHash(pairs) => pairs.iter().map(|(_, v)| v.clone()).collect(),
        Ast::FunctionExpression(_, args) => args.clone(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn search_evaluates_the_parsed_tree() {
        let ast = parse("foo.bar").unwrap();
        let compiled = CompiledExpression::new("foo.bar", ast);
        let mut obj = indexmap::IndexMap::new();
        let mut inner = indexmap::IndexMap::new();
        inner.insert("bar".to_string(), Value::Number(42.0));
        obj.insert("foo".to_string(), Value::Object(inner));
        let result = compiled.search(Value::Object(obj), &Options::new()).unwrap();
        assert_eq!(result, Value::Number(42.0));
    }

    #[test]
    fn search_error_carries_the_source_expression() {
        let ast = parse("abs(@)").unwrap();
        let compiled = CompiledExpression::new("abs(@)", ast);
        let err = compiled
            .search(Value::String("not a number".into()), &Options::new())
            .unwrap_err();
        assert_eq!(err.expression.as_deref(), Some("abs(@)"));
    }
}
