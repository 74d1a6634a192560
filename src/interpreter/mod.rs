pub mod functions;

use std::sync::Arc;

use indexmap::IndexMap;

use crate::ast::{Ast, Comparator};
use crate::error::{ErrorKind, JmespathError};
use crate::options::Options;
use crate::scope::ScopeStack;
use crate::value::Value;

/// Call-scoped evaluation state: the options in effect and the (normally
/// empty) lexical scope stack. No state here outlives a single `eval` call.
pub struct EvalContext<'a> {
    pub options: &'a Options,
    pub scope: &'a mut ScopeStack,
}

/// Evaluate `node` against `current`. Pure function of its arguments: no
/// shared mutable state crosses calls except through `ctx.scope`, which
/// stays empty unless a future grammar extension pushes a frame.
pub fn eval(node: &Ast, current: &Value, ctx: &mut EvalContext) -> Result<Value, JmespathError> {
    match node {
        Ast::Identity | Ast::CurrentNode => Ok(current.clone()),
        Ast::Field(name) => Ok(match current {
            Value::Object(obj) => obj.get(name).cloned().unwrap_or(Value::Null),
            _ => Value::Null,
        }),
        Ast::Index(i) => Ok(match current {
            Value::Array(arr) => index_array(arr, *i).cloned().unwrap_or(Value::Null),
            _ => Value::Null,
        }),
        Ast::Slice { start, stop, step } => eval_slice(current, *start, *stop, *step),
        Ast::SubExpression(left, right) | Ast::IndexExpression(left, right) => {
            let left_value = eval(left, current, ctx)?;
            if left_value == Value::Null {
                Ok(Value::Null)
            } else {
                eval(right, &left_value, ctx)
            }
        }
        Ast::Projection(left, right) => {
            let left_value = eval(left, current, ctx)?;
            match left_value {
                Value::Array(items) => project(&items, right, ctx),
                _ => Ok(Value::Null),
            }
        }
        Ast::ValueProjection(left, right) => {
            let left_value = eval(left, current, ctx)?;
            match left_value {
                Value::Object(obj) => {
                    let items: Vec<Value> = obj.into_values().collect();
                    project(&items, right, ctx)
                }
                _ => Ok(Value::Null),
            }
        }
        Ast::FilterProjection {
            left,
            right,
            predicate,
        } => {
            let left_value = eval(left, current, ctx)?;
            match left_value {
                Value::Array(items) => {
                    let mut kept = Vec::new();
                    for item in &items {
                        if eval(predicate, item, ctx)?.is_truthy() {
                            kept.push(item.clone());
                        }
                    }
                    project(&kept, right, ctx)
                }
                _ => Ok(Value::Null),
            }
        }
        Ast::Flatten(child) => {
            let value = eval(child, current, ctx)?;
            match value {
                Value::Array(items) => {
                    let mut flattened = Vec::with_capacity(items.len());
                    for item in items {
                        match item {
                            Value::Array(inner) => flattened.extend(inner),
                            other => flattened.push(other),
                        }
                    }
                    Ok(Value::Array(flattened))
                }
                _ => Ok(Value::Null),
            }
        }
        Ast::OrExpression(left, right) => {
            let left_value = eval(left, current, ctx)?;
            if left_value.is_truthy() {
                Ok(left_value)
            } else {
                eval(right, current, ctx)
            }
        }
        Ast::AndExpression(left, right) => {
            let left_value = eval(left, current, ctx)?;
            if !left_value.is_truthy() {
                Ok(left_value)
            } else {
                eval(right, current, ctx)
            }
        }
        Ast::NotExpression(child) => {
            let value = eval(child, current, ctx)?;
            Ok(Value::Bool(!value.is_truthy()))
        }
        Ast::Comparator(op, left, right) => {
            let l = eval(left, current, ctx)?;
            let r = eval(right, current, ctx)?;
            eval_comparator(*op, &l, &r)
        }
        Ast::MultiSelectList(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(eval(item, current, ctx)?);
            }
            Ok(Value::Array(out))
        }
        Ast::MultiSelectHash(pairs) => {
            let mut out = IndexMap::with_capacity(pairs.len());
            for (key, expr) in pairs {
                out.insert(key.clone(), eval(expr, current, ctx)?);
            }
            Ok(Value::Object(out))
        }
        Ast::Literal(value) => Ok(value.clone()),
        Ast::Pipe(left, right) => {
            let left_value = eval(left, current, ctx)?;
            eval(right, &left_value, ctx)
        }
        Ast::ExpressionReference(child) => Ok(Value::Expref(Arc::new((**child).clone()))),
        Ast::FunctionExpression(name, args) => {
            let mut values = Vec::with_capacity(args.len());
            for arg in args {
                values.push(eval(arg, current, ctx)?);
            }
            log::trace!("dispatching function {}/{}", name, values.len());
            functions::call(ctx, name, values)
        }
    }
}

fn project(items: &[Value], right: &Ast, ctx: &mut EvalContext) -> Result<Value, JmespathError> {
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        let projected = eval(right, item, ctx)?;
        if projected != Value::Null {
            out.push(projected);
        }
    }
    Ok(Value::Array(out))
}

fn index_array(arr: &[Value], i: i64) -> Option<&Value> {
    let len = arr.len() as i64;
    let idx = if i < 0 { i + len } else { i };
    if idx < 0 || idx >= len {
        None
    } else {
        arr.get(idx as usize)
    }
}

fn eval_comparator(op: Comparator, l: &Value, r: &Value) -> Result<Value, JmespathError> {
    match op {
        Comparator::Eq => Ok(Value::Bool(l == r)),
        Comparator::Ne => Ok(Value::Bool(l != r)),
        Comparator::Lt | Comparator::Lte | Comparator::Gt | Comparator::Gte => {
            match (l.as_number(), r.as_number()) {
                (Some(a), Some(b)) => {
                    let result = match op {
                        Comparator::Lt => a < b,
                        Comparator::Lte => a <= b,
                        Comparator::Gt => a > b,
                        Comparator::Gte => a >= b,
                        _ => unreachable!(),
                    };
                    Ok(Value::Bool(result))
                }
                _ => Ok(Value::Null),
            }
        }
    }
}

fn eval_slice(
    current: &Value,
    start: Option<i64>,
    stop: Option<i64>,
    step: i64,
) -> Result<Value, JmespathError> {
    let arr = match current {
        Value::Array(a) => a,
        _ => return Ok(Value::Null),
    };
    if step == 0 {
        return Err(JmespathError::new(
            ErrorKind::InvalidValue {
                message: "invalid slice: step cannot be 0".into(),
            },
            None,
        ));
    }
    let indices = slice_indices(arr.len() as i64, start, stop, step);
    Ok(Value::Array(indices.into_iter().map(|i| arr[i].clone()).collect()))
}

fn adjust_slice_index(i: i64, length: i64, lo: i64, hi: i64) -> i64 {
    let idx = if i < 0 { i + length } else { i };
    idx.clamp(lo, hi)
}

/// Replicates Python's `slice.indices()` semantics (the reference
/// implementation delegates slicing directly to a Python `slice` object).
fn slice_indices(length: i64, start: Option<i64>, stop: Option<i64>, step: i64) -> Vec<usize> {
    let mut out = Vec::new();
    if step > 0 {
        let lower = start.map_or(0, |s| adjust_slice_index(s, length, 0, length));
        let upper = stop.map_or(length, |s| adjust_slice_index(s, length, 0, length));
        let mut cur = lower;
        while cur < upper {
            out.push(cur as usize);
            cur += step;
        }
    } else {
        let upper = start.map_or(length - 1, |s| adjust_slice_index(s, length, -1, length - 1));
        let lower = stop.map_or(-1, |s| adjust_slice_index(s, length, -1, length - 1));
        let mut cur = upper;
        while cur > lower {
            if cur >= 0 && cur < length {
                out.push(cur as usize);
            }
            cur += step;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(node: &Ast, current: Value) -> Value {
        let options = Options::new();
        let mut scope = ScopeStack::new();
        let mut ctx = EvalContext {
            options: &options,
            scope: &mut scope,
        };
        eval(node, &current, &mut ctx).unwrap()
    }

    #[test]
    fn identity_returns_input_unchanged() {
        let value = Value::String("hello".into());
        assert_eq!(run(&Ast::Identity, value.clone()), value);
    }

    #[test]
    fn field_on_non_object_is_null() {
        assert_eq!(run(&Ast::field("x"), Value::Number(1.0)), Value::Null);
    }

    #[test]
    fn projection_drops_null_results() {
        let mut with_bar = IndexMap::new();
        with_bar.insert("bar".to_string(), Value::Number(1.0));
        let without_bar = IndexMap::new();
        let arr = Value::Array(vec![Value::Object(with_bar), Value::Object(without_bar)]);
        let node = Ast::Projection(Box::new(Ast::Identity), Box::new(Ast::field("bar")));
        assert_eq!(run(&node, arr), Value::Array(vec![Value::Number(1.0)]));
    }

    #[test]
    fn flatten_concatenates_one_level() {
        let arr = Value::Array(vec![
            Value::Array(vec![Value::Number(1.0), Value::Number(2.0)]),
            Value::Array(vec![Value::Number(3.0)]),
        ]);
        let node = Ast::Flatten(Box::new(Ast::Identity));
        assert_eq!(
            run(&node, arr),
            Value::Array(vec![Value::Number(1.0), Value::Number(2.0), Value::Number(3.0)])
        );
    }

    #[test]
    fn negative_index_counts_from_the_end() {
        let arr = Value::Array(vec![Value::Number(1.0), Value::Number(2.0), Value::Number(3.0)]);
        assert_eq!(run(&Ast::Index(-1), arr), Value::Number(3.0));
    }

    #[test]
    fn slice_with_reversed_negative_step() {
        let arr = Value::Array(
            (0..5).map(|n| Value::Number(n as f64)).collect(),
        );
        let node = Ast::Slice {
            start: None,
            stop: None,
            step: -1,
        };
        let result = run(&node, arr);
        assert_eq!(
            result,
            Value::Array(vec![
                Value::Number(4.0),
                Value::Number(3.0),
                Value::Number(2.0),
                Value::Number(1.0),
                Value::Number(0.0),
            ])
        );
    }

    #[test]
    fn pipe_stops_projection_from_the_right_hand_side() {
        let mut item0 = IndexMap::new();
        item0.insert("b".to_string(), Value::Number(1.0));
        let mut item1 = IndexMap::new();
        item1.insert("b".to_string(), Value::Number(2.0));
        let arr = Value::Array(vec![Value::Object(item0), Value::Object(item1)]);

        let projected = Ast::Projection(Box::new(Ast::Identity), Box::new(Ast::field("b")));
        let piped = Ast::Pipe(Box::new(projected), Box::new(Ast::Index(0)));
        assert_eq!(run(&piped, arr), Value::Number(1.0));
    }

    #[test]
    fn and_or_short_circuit_on_the_left_value() {
        let node_or = Ast::OrExpression(
            Box::new(Ast::Literal(Value::Null)),
            Box::new(Ast::Literal(Value::Number(5.0))),
        );
        assert_eq!(run(&node_or, Value::Null), Value::Number(5.0));

        let node_and = Ast::AndExpression(
            Box::new(Ast::Literal(Value::Null)),
            Box::new(Ast::Literal(Value::Number(5.0))),
        );
        assert_eq!(run(&node_and, Value::Null), Value::Null);
    }

    #[test]
    fn comparator_ordering_on_non_numbers_is_null() {
        let node = Ast::Comparator(
            Comparator::Lt,
            Box::new(Ast::Literal(Value::String("a".into()))),
            Box::new(Ast::Literal(Value::Number(1.0))),
        );
        assert_eq!(run(&node, Value::Null), Value::Null);
    }
}
