use crate::value::Value;

/// Comparator operators recognised by the `Comparator` AST node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
}

/// The parsed, immutable abstract syntax tree. One variant per grammar
/// production of the dialect (spec §3.3, §6.2).
///
/// `KeyValPair` is not a separate variant: the only place it is ever
/// produced is as an entry of `MultiSelectHash`, so it is folded directly
/// into that variant's `Vec<(String, Ast)>` payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Ast {
    Identity,
    CurrentNode,
    Field(String),
    Index(i64),
    Slice {
        start: Option<i64>,
        stop: Option<i64>,
        step: i64,
    },
    SubExpression(Box<Ast>, Box<Ast>),
    IndexExpression(Box<Ast>, Box<Ast>),
    Projection(Box<Ast>, Box<Ast>),
    ValueProjection(Box<Ast>, Box<Ast>),
    FilterProjection {
        left: Box<Ast>,
        right: Box<Ast>,
        predicate: Box<Ast>,
    },
    Flatten(Box<Ast>),
    MultiSelectList(Vec<Ast>),
    MultiSelectHash(Vec<(String, Ast)>),
    Literal(Value),
    Comparator(Comparator, Box<Ast>, Box<Ast>),
    OrExpression(Box<Ast>, Box<Ast>),
    AndExpression(Box<Ast>, Box<Ast>),
    NotExpression(Box<Ast>),
    Pipe(Box<Ast>, Box<Ast>),
    ExpressionReference(Box<Ast>),
    FunctionExpression(String, Vec<Ast>),
}

impl Ast {
    pub fn field(name: impl Into<String>) -> Self {
        Ast::Field(name.into())
    }
}
