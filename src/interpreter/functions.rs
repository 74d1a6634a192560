use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use indexmap::IndexMap;
use once_cell::sync::Lazy;

use crate::error::{ErrorKind, JmespathError};
use crate::interpreter::{eval, EvalContext};
use crate::value::Value;

/// The set of type tags a function parameter can accept (spec §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeTag {
    Number,
    String,
    Boolean,
    Null,
    Array,
    Object,
    Expref,
    ArrayNumber,
    ArrayString,
    Any,
}

/// One positional parameter's accepted tags.
#[derive(Debug, Clone)]
pub struct ParamSpec(pub Vec<TypeTag>);

impl ParamSpec {
    pub fn new(tags: &[TypeTag]) -> Self {
        Self(tags.to_vec())
    }
}

/// A function's declared arity and parameter specs, consulted by the
/// parser for arity checking and by the interpreter for type checking.
#[derive(Debug, Clone)]
pub struct Signature {
    pub params: Vec<ParamSpec>,
    pub variadic: bool,
}

impl Signature {
    pub fn fixed(params: Vec<ParamSpec>) -> Self {
        Self {
            params,
            variadic: false,
        }
    }

    pub fn variadic(params: Vec<ParamSpec>) -> Self {
        Self {
            params,
            variadic: true,
        }
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    pub fn check_arity(&self, function_name: &str, actual: usize) -> Result<(), JmespathError> {
        let expected = self.arity();
        if self.variadic {
            if actual < expected {
                return Err(JmespathError::new(
                    ErrorKind::VariadicArity {
                        function_name: function_name.to_string(),
                        expected_arity: expected,
                        actual_arity: actual,
                    },
                    None,
                ));
            }
        } else if actual != expected {
            return Err(JmespathError::new(
                ErrorKind::InvalidArity {
                    function_name: function_name.to_string(),
                    expected_arity: expected,
                    actual_arity: actual,
                },
                None,
            ));
        }
        Ok(())
    }

    fn spec_for(&self, index: usize) -> &ParamSpec {
        if self.variadic && index >= self.params.len() {
            self.params.last().expect("variadic signature needs at least one param spec")
        } else {
            &self.params[index]
        }
    }

    pub fn check_types(&self, function_name: &str, args: &[Value]) -> Result<(), JmespathError> {
        for (i, arg) in args.iter().enumerate() {
            check_arg_type(function_name, self.spec_for(i), arg)?;
        }
        Ok(())
    }
}

fn base_tag(value: &Value) -> TypeTag {
    match value {
        Value::Null => TypeTag::Null,
        Value::Bool(_) => TypeTag::Boolean,
        Value::Number(_) => TypeTag::Number,
        Value::String(_) => TypeTag::String,
        Value::Array(_) => TypeTag::Array,
        Value::Object(_) => TypeTag::Object,
        Value::Expref(_) => TypeTag::Expref,
    }
}

fn tags_description(tags: &[TypeTag]) -> String {
    tags.iter()
        .map(|t| {
            match t {
                TypeTag::Number => "number",
                TypeTag::String => "string",
                TypeTag::Boolean => "boolean",
                TypeTag::Null => "null",
                TypeTag::Array => "array",
                TypeTag::Object => "object",
                TypeTag::Expref => "expref",
                TypeTag::ArrayNumber => "array[number]",
                TypeTag::ArrayString => "array[string]",
                TypeTag::Any => "any",
            }
            .to_string()
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn invalid_type(function_name: &str, tags: &[TypeTag], actual: &Value) -> JmespathError {
    JmespathError::new(
        ErrorKind::InvalidType {
            function_name: function_name.to_string(),
            expected_types: tags_description(tags),
            actual_type: actual.type_name().to_string(),
        },
        None,
    )
}

fn check_arg_type(function_name: &str, spec: &ParamSpec, value: &Value) -> Result<(), JmespathError> {
    if spec.0.contains(&TypeTag::Any) {
        return Ok(());
    }
    let tag = base_tag(value);
    if tag == TypeTag::Array {
        if spec.0.contains(&TypeTag::Array) {
            return Ok(());
        }
        let wants_number = spec.0.contains(&TypeTag::ArrayNumber);
        let wants_string = spec.0.contains(&TypeTag::ArrayString);
        if !wants_number && !wants_string {
            return Err(invalid_type(function_name, &spec.0, value));
        }
        let arr = value.as_array().unwrap();
        if arr.is_empty() {
            return Ok(());
        }
        let first = base_tag(&arr[0]);
        let pinned_ok = (first == TypeTag::Number && wants_number)
            || (first == TypeTag::String && wants_string);
        if !pinned_ok {
            return Err(invalid_type(function_name, &spec.0, value));
        }
        for element in arr.iter() {
            if base_tag(element) != first {
                return Err(invalid_type(function_name, &spec.0, element));
            }
        }
        return Ok(());
    }
    if spec.0.contains(&tag) {
        Ok(())
    } else {
        Err(invalid_type(function_name, &spec.0, value))
    }
}

/// A user-supplied function implementation, boxed so it can close over
/// arbitrary state and be shared across threads via `Arc` (see
/// `Options.custom_functions` and `Functions::register`).
pub struct CustomFunction {
    pub signature: Signature,
    pub call: Box<dyn Fn(&mut EvalContext, Vec<Value>) -> Result<Value, JmespathError> + Send + Sync>,
}

impl CustomFunction {
    pub fn new(
        signature: Signature,
        call: impl Fn(&mut EvalContext, Vec<Value>) -> Result<Value, JmespathError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            signature,
            call: Box::new(call),
        }
    }
}

type BuiltinFn = fn(&mut EvalContext, &str, Vec<Value>) -> Result<Value, JmespathError>;

struct Builtin {
    signature: Signature,
    call: BuiltinFn,
}

static BUILTINS: Lazy<HashMap<&'static str, Builtin>> = Lazy::new(builtin_table);

/// Process-global registry of additional functions, consulted by the
/// parser (for arity/name resolution at parse time) and by the
/// interpreter, alongside the built-in table. See DESIGN.md Open
/// Questions for why this exists instead of threading `Options` through
/// `compile`.
static CUSTOM_REGISTRY: Lazy<RwLock<HashMap<String, Arc<CustomFunction>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

pub struct Functions;

impl Functions {
    /// Register a function under `name`, visible to every subsequent
    /// `compile`/`parse` call in this process. A name already served by a
    /// built-in is shadowed for evaluation purposes but the built-in's
    /// arity still governs parse-time checking, since built-ins are
    /// consulted first.
    pub fn register(name: impl Into<String>, function: CustomFunction) {
        CUSTOM_REGISTRY
            .write()
            .unwrap()
            .insert(name.into(), Arc::new(function));
    }

    pub fn unregister(name: &str) {
        CUSTOM_REGISTRY.write().unwrap().remove(name);
    }
}

/// Look up a function's signature for parse-time arity checking, built-ins
/// first, falling back to the global custom registry.
pub fn lookup_signature(name: &str) -> Option<Signature> {
    if let Some(b) = BUILTINS.get(name) {
        return Some(b.signature.clone());
    }
    CUSTOM_REGISTRY
        .read()
        .unwrap()
        .get(name)
        .map(|f| f.signature.clone())
}

/// Resolve and invoke a function by name at evaluation time. Resolution
/// order: `options.custom_functions` (per-call overrides/extensions),
/// then the global custom registry, then built-ins.
pub fn call(
    ctx: &mut EvalContext,
    name: &str,
    args: Vec<Value>,
) -> Result<Value, JmespathError> {
    if let Some(custom) = ctx.options.custom_functions.get(name).cloned() {
        custom.signature.check_types(name, &args)?;
        return (custom.call)(ctx, args);
    }
    if let Some(custom) = CUSTOM_REGISTRY.read().unwrap().get(name).cloned() {
        custom.signature.check_types(name, &args)?;
        return (custom.call)(ctx, args);
    }
    if let Some(builtin) = BUILTINS.get(name) {
        builtin.signature.check_types(name, &args)?;
        return (builtin.call)(ctx, name, args);
    }
    Err(JmespathError::new(
        ErrorKind::UnknownFunction {
            function_name: name.to_string(),
        },
        None,
    ))
}

fn builtin_table() -> HashMap<&'static str, Builtin> {
    use TypeTag::*;

    let mut m: HashMap<&'static str, Builtin> = HashMap::new();
    macro_rules! def {
        ($name:literal, $sig:expr, $call:expr) => {
            m.insert(
                $name,
                Builtin {
                    signature: $sig,
                    call: $call,
                },
            );
        };
    }

    def!("abs", Signature::fixed(vec![ParamSpec::new(&[Number])]), fn_abs);
    def!(
        "avg",
        Signature::fixed(vec![ParamSpec::new(&[ArrayNumber])]),
        fn_avg
    );
    def!("ceil", Signature::fixed(vec![ParamSpec::new(&[Number])]), fn_ceil);
    def!(
        "contains",
        Signature::fixed(vec![ParamSpec::new(&[Array, String]), ParamSpec::new(&[Any])]),
        fn_contains
    );
    def!(
        "ends_with",
        Signature::fixed(vec![ParamSpec::new(&[String]), ParamSpec::new(&[String])]),
        fn_ends_with
    );
    def!("floor", Signature::fixed(vec![ParamSpec::new(&[Number])]), fn_floor);
    def!(
        "join",
        Signature::fixed(vec![ParamSpec::new(&[String]), ParamSpec::new(&[ArrayString])]),
        fn_join
    );
    def!("keys", Signature::fixed(vec![ParamSpec::new(&[Object])]), fn_keys);
    def!(
        "length",
        Signature::fixed(vec![ParamSpec::new(&[String, Array, Object])]),
        fn_length
    );
    def!(
        "map",
        Signature::fixed(vec![ParamSpec::new(&[Expref]), ParamSpec::new(&[Array])]),
        fn_map
    );
    def!(
        "max",
        Signature::fixed(vec![ParamSpec::new(&[ArrayNumber, ArrayString])]),
        fn_max
    );
    def!(
        "max_by",
        Signature::fixed(vec![ParamSpec::new(&[Array]), ParamSpec::new(&[Expref])]),
        fn_max_by
    );
    def!(
        "min",
        Signature::fixed(vec![ParamSpec::new(&[ArrayNumber, ArrayString])]),
        fn_min
    );
    def!(
        "min_by",
        Signature::fixed(vec![ParamSpec::new(&[Array]), ParamSpec::new(&[Expref])]),
        fn_min_by
    );
    def!(
        "not_null",
        Signature::variadic(vec![ParamSpec::new(&[Any])]),
        fn_not_null
    );
    def!(
        "reverse",
        Signature::fixed(vec![ParamSpec::new(&[Array, String])]),
        fn_reverse
    );
    def!(
        "sort",
        Signature::fixed(vec![ParamSpec::new(&[ArrayNumber, ArrayString])]),
        fn_sort
    );
    def!(
        "sort_by",
        Signature::fixed(vec![ParamSpec::new(&[Array]), ParamSpec::new(&[Expref])]),
        fn_sort_by
    );
    def!(
        "starts_with",
        Signature::fixed(vec![ParamSpec::new(&[String]), ParamSpec::new(&[String])]),
        fn_starts_with
    );
    def!("sum", Signature::fixed(vec![ParamSpec::new(&[ArrayNumber])]), fn_sum);
    def!("to_array", Signature::fixed(vec![ParamSpec::new(&[Any])]), fn_to_array);
    def!(
        "to_number",
        Signature::fixed(vec![ParamSpec::new(&[Any])]),
        fn_to_number
    );
    def!(
        "to_string",
        Signature::fixed(vec![ParamSpec::new(&[Any])]),
        fn_to_string
    );
    def!("type", Signature::fixed(vec![ParamSpec::new(&[Any])]), fn_type);
    def!("values", Signature::fixed(vec![ParamSpec::new(&[Object])]), fn_values);

    m
}

fn fn_abs(_ctx: &mut EvalContext, _name: &str, args: Vec<Value>) -> Result<Value, JmespathError> {
    Ok(Value::Number(args[0].as_number().unwrap().abs()))
}

fn fn_avg(_ctx: &mut EvalContext, _name: &str, args: Vec<Value>) -> Result<Value, JmespathError> {
    let arr = args[0].as_array().unwrap();
    if arr.is_empty() {
        return Ok(Value::Null);
    }
    let sum: f64 = arr.iter().map(|v| v.as_number().unwrap()).sum();
    Ok(Value::Number(sum / arr.len() as f64))
}

fn fn_ceil(_ctx: &mut EvalContext, _name: &str, args: Vec<Value>) -> Result<Value, JmespathError> {
    Ok(Value::Number(args[0].as_number().unwrap().ceil()))
}

fn fn_contains(_ctx: &mut EvalContext, _name: &str, args: Vec<Value>) -> Result<Value, JmespathError> {
    let found = match &args[0] {
        Value::Array(arr) => arr.contains(&args[1]),
        Value::String(s) => match &args[1] {
            Value::String(needle) => s.contains(needle.as_str()),
            _ => false,
        },
        _ => unreachable!("signature restricts first argument to array or string"),
    };
    Ok(Value::Bool(found))
}

fn fn_ends_with(_ctx: &mut EvalContext, _name: &str, args: Vec<Value>) -> Result<Value, JmespathError> {
    let s = args[0].as_str().unwrap();
    let suffix = args[1].as_str().unwrap();
    Ok(Value::Bool(s.ends_with(suffix)))
}

fn fn_floor(_ctx: &mut EvalContext, _name: &str, args: Vec<Value>) -> Result<Value, JmespathError> {
    Ok(Value::Number(args[0].as_number().unwrap().floor()))
}

fn fn_join(_ctx: &mut EvalContext, _name: &str, args: Vec<Value>) -> Result<Value, JmespathError> {
    let sep = args[0].as_str().unwrap();
    let parts: Vec<&str> = args[1]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    Ok(Value::String(parts.join(sep)))
}

fn fn_keys(_ctx: &mut EvalContext, _name: &str, args: Vec<Value>) -> Result<Value, JmespathError> {
    let obj = args[0].as_object().unwrap();
    Ok(Value::Array(
        obj.keys().map(|k| Value::String(k.clone())).collect(),
    ))
}

fn fn_length(_ctx: &mut EvalContext, _name: &str, args: Vec<Value>) -> Result<Value, JmespathError> {
    let n = match &args[0] {
        Value::String(s) => s.chars().count(),
        Value::Array(a) => a.len(),
        Value::Object(o) => o.len(),
        _ => unreachable!("signature restricts argument to string, array or object"),
    };
    Ok(Value::Number(n as f64))
}

fn fn_map(ctx: &mut EvalContext, _name: &str, args: Vec<Value>) -> Result<Value, JmespathError> {
    let expref = match &args[0] {
        Value::Expref(ast) => ast.clone(),
        _ => unreachable!("signature restricts first argument to expref"),
    };
    let arr = args[1].as_array().unwrap();
    let mut out = Vec::with_capacity(arr.len());
    for element in arr {
        out.push(eval(&expref, element, ctx)?);
    }
    Ok(Value::Array(out))
}

fn fn_max(_ctx: &mut EvalContext, name: &str, args: Vec<Value>) -> Result<Value, JmespathError> {
    extremum(name, args[0].as_array().unwrap(), Ordering::Greater)
}

fn fn_min(_ctx: &mut EvalContext, name: &str, args: Vec<Value>) -> Result<Value, JmespathError> {
    extremum(name, args[0].as_array().unwrap(), Ordering::Less)
}

use std::cmp::Ordering;

fn extremum(name: &str, arr: &[Value], want: Ordering) -> Result<Value, JmespathError> {
    if arr.is_empty() {
        return Ok(Value::Null);
    }
    let mut best = &arr[0];
    for candidate in &arr[1..] {
        let ord = compare_numbers_or_strings(name, candidate, best)?;
        if ord == want {
            best = candidate;
        }
    }
    Ok(best.clone())
}

fn compare_numbers_or_strings(name: &str, a: &Value, b: &Value) -> Result<Ordering, JmespathError> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            Ok(x.partial_cmp(y).unwrap_or(Ordering::Equal))
        }
        (Value::String(x), Value::String(y)) => Ok(x.cmp(y)),
        _ => Err(invalid_type(name, &[TypeTag::ArrayNumber, TypeTag::ArrayString], a)),
    }
}

fn fn_max_by(ctx: &mut EvalContext, name: &str, args: Vec<Value>) -> Result<Value, JmespathError> {
    extremum_by(ctx, name, args, Ordering::Greater)
}

fn fn_min_by(ctx: &mut EvalContext, name: &str, args: Vec<Value>) -> Result<Value, JmespathError> {
    extremum_by(ctx, name, args, Ordering::Less)
}

fn extremum_by(
    ctx: &mut EvalContext,
    name: &str,
    args: Vec<Value>,
    want: Ordering,
) -> Result<Value, JmespathError> {
    let arr = args[0].as_array().unwrap();
    let expref = match &args[1] {
        Value::Expref(ast) => ast.clone(),
        _ => unreachable!("signature restricts second argument to expref"),
    };
    if arr.is_empty() {
        return Ok(Value::Null);
    }
    let keys: Vec<Value> = arr
        .iter()
        .map(|el| eval(&expref, el, ctx))
        .collect::<Result<_, _>>()?;
    let pinned = base_tag(&keys[0]);
    if pinned != TypeTag::Number && pinned != TypeTag::String {
        return Err(invalid_type(name, &[TypeTag::Number, TypeTag::String], &keys[0]));
    }
    let mut best_index = 0;
    for (i, key) in keys.iter().enumerate().skip(1) {
        if base_tag(key) != pinned {
            return Err(invalid_type(name, &[TypeTag::Number, TypeTag::String], key));
        }
        let ord = compare_numbers_or_strings(name, key, &keys[best_index])?;
        if ord == want {
            best_index = i;
        }
    }
    Ok(arr[best_index].clone())
}

fn fn_not_null(_ctx: &mut EvalContext, _name: &str, args: Vec<Value>) -> Result<Value, JmespathError> {
    Ok(args
        .into_iter()
        .find(|v| !matches!(v, Value::Null))
        .unwrap_or(Value::Null))
}

fn fn_reverse(_ctx: &mut EvalContext, _name: &str, args: Vec<Value>) -> Result<Value, JmespathError> {
    match args.into_iter().next().unwrap() {
        Value::Array(mut a) => {
            a.reverse();
            Ok(Value::Array(a))
        }
        Value::String(s) => Ok(Value::String(s.chars().rev().collect())),
        _ => unreachable!("signature restricts argument to array or string"),
    }
}

fn fn_sort(_ctx: &mut EvalContext, name: &str, args: Vec<Value>) -> Result<Value, JmespathError> {
    let mut arr = match args.into_iter().next().unwrap() {
        Value::Array(a) => a,
        _ => unreachable!(),
    };
    let mut sort_err = None;
    arr.sort_by(|a, b| {
        compare_numbers_or_strings(name, a, b).unwrap_or_else(|e| {
            sort_err.get_or_insert(e);
            Ordering::Equal
        })
    });
    match sort_err {
        Some(e) => Err(e),
        None => Ok(Value::Array(arr)),
    }
}

fn fn_sort_by(ctx: &mut EvalContext, name: &str, args: Vec<Value>) -> Result<Value, JmespathError> {
    let arr = match &args[0] {
        Value::Array(a) => a.clone(),
        _ => unreachable!(),
    };
    let expref = match &args[1] {
        Value::Expref(ast) => ast.clone(),
        _ => unreachable!(),
    };
    if arr.is_empty() {
        return Ok(Value::Array(Vec::new()));
    }
    let mut keyed: Vec<(Value, Value)> = Vec::with_capacity(arr.len());
    for element in arr {
        let key = eval(&expref, &element, ctx)?;
        keyed.push((key, element));
    }
    let pinned = base_tag(&keyed[0].0);
    if pinned != TypeTag::Number && pinned != TypeTag::String {
        return Err(invalid_type(name, &[TypeTag::Number, TypeTag::String], &keyed[0].0));
    }
    for (key, _) in &keyed {
        if base_tag(key) != pinned {
            return Err(invalid_type(name, &[TypeTag::Number, TypeTag::String], key));
        }
    }
    let mut sort_err = None;
    keyed.sort_by(|a, b| {
        compare_numbers_or_strings(name, &a.0, &b.0).unwrap_or_else(|e| {
            sort_err.get_or_insert(e.clone());
            Ordering::Equal
        })
    });
    if let Some(e) = sort_err {
        return Err(e);
    }
    Ok(Value::Array(keyed.into_iter().map(|(_, v)| v).collect()))
}

fn fn_starts_with(_ctx: &mut EvalContext, _name: &str, args: Vec<Value>) -> Result<Value, JmespathError> {
    let s = args[0].as_str().unwrap();
    let prefix = args[1].as_str().unwrap();
    Ok(Value::Bool(s.starts_with(prefix)))
}

fn fn_sum(_ctx: &mut EvalContext, _name: &str, args: Vec<Value>) -> Result<Value, JmespathError> {
    let arr = args[0].as_array().unwrap();
    let sum: f64 = arr.iter().map(|v| v.as_number().unwrap()).sum();
    Ok(Value::Number(sum))
}

fn fn_to_array(_ctx: &mut EvalContext, _name: &str, args: Vec<Value>) -> Result<Value, JmespathError> {
    let value = args.into_iter().next().unwrap();
    match value {
        Value::Array(_) => Ok(value),
        other => Ok(Value::Array(vec![other])),
    }
}

fn fn_to_number(_ctx: &mut EvalContext, _name: &str, args: Vec<Value>) -> Result<Value, JmespathError> {
    let value = args.into_iter().next().unwrap();
    Ok(match value {
        Value::Number(n) => Value::Number(n),
        Value::String(s) => s
            .parse::<f64>()
            .map(Value::Number)
            .unwrap_or(Value::Null),
        _ => Value::Null,
    })
}

fn fn_to_string(_ctx: &mut EvalContext, _name: &str, args: Vec<Value>) -> Result<Value, JmespathError> {
    let value = args.into_iter().next().unwrap();
    Ok(match value {
        Value::String(s) => Value::String(s),
        // `Value::to_json_string` reuses the whole-number rule from
        // `Value::Display` at every nesting level, so `to_string(\`3\`)` is
        // `"3"` and `to_string(\`[1,2,3]\`)` is `"[1,2,3]"` rather than the
        // `serde_json::Value`-backed `"3.0"` / `"[1.0,2.0,3.0]"`.
        other => Value::String(other.to_json_string()),
    })
}

fn fn_type(_ctx: &mut EvalContext, _name: &str, args: Vec<Value>) -> Result<Value, JmespathError> {
    Ok(Value::String(args[0].type_name().to_string()))
}

fn fn_values(_ctx: &mut EvalContext, _name: &str, args: Vec<Value>) -> Result<Value, JmespathError> {
    let obj: IndexMap<String, Value> = match args.into_iter().next().unwrap() {
        Value::Object(o) => o,
        _ => unreachable!(),
    };
    Ok(Value::Array(obj.into_values().collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Ast;
    use crate::options::Options;
    use crate::scope::ScopeStack;

    fn ctx<'a>(options: &'a Options, scope: &'a mut ScopeStack) -> EvalContext<'a> {
        EvalContext { options, scope }
    }

    #[test]
    fn abs_of_negative_number() {
        let options = Options::new();
        let mut scope = ScopeStack::new();
        let mut c = ctx(&options, &mut scope);
        let result = call(&mut c, "abs", vec![Value::Number(-3.0)]).unwrap();
        assert_eq!(result, Value::Number(3.0));
    }

    #[test]
    fn length_counts_unicode_codepoints() {
        let options = Options::new();
        let mut scope = ScopeStack::new();
        let mut c = ctx(&options, &mut scope);
        let result = call(&mut c, "length", vec![Value::String("héllo".into())]).unwrap();
        assert_eq!(result, Value::Number(5.0));
    }

    #[test]
    fn sum_of_empty_array_is_zero() {
        let options = Options::new();
        let mut scope = ScopeStack::new();
        let mut c = ctx(&options, &mut scope);
        let result = call(&mut c, "sum", vec![Value::Array(vec![])]).unwrap();
        assert_eq!(result, Value::Number(0.0));
    }

    #[test]
    fn avg_of_empty_array_is_null() {
        let options = Options::new();
        let mut scope = ScopeStack::new();
        let mut c = ctx(&options, &mut scope);
        let result = call(&mut c, "avg", vec![Value::Array(vec![])]).unwrap();
        assert_eq!(result, Value::Null);
    }

    #[test]
    fn unknown_function_is_reported() {
        let options = Options::new();
        let mut scope = ScopeStack::new();
        let mut c = ctx(&options, &mut scope);
        let err = call(&mut c, "does_not_exist", vec![]).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::UnknownFunction { .. }));
    }

    #[test]
    fn sort_by_rejects_mixed_key_types() {
        let options = Options::new();
        let mut scope = ScopeStack::new();
        let mut c = ctx(&options, &mut scope);
        let arr = Value::Array(vec![Value::Number(1.0), Value::String("x".into())]);
        let expref = Value::Expref(Arc::new(Ast::Identity));
        let err = call(&mut c, "sort_by", vec![arr, expref]).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::InvalidType { .. }));
    }

    #[test]
    fn to_string_renders_whole_numbers_without_a_trailing_zero() {
        let options = Options::new();
        let mut scope = ScopeStack::new();
        let mut c = ctx(&options, &mut scope);
        let result = call(&mut c, "to_string", vec![Value::Number(3.0)]).unwrap();
        assert_eq!(result, Value::String("3".into()));
    }

    #[test]
    fn to_string_renders_nested_whole_numbers_without_a_trailing_zero() {
        let options = Options::new();
        let mut scope = ScopeStack::new();
        let mut c = ctx(&options, &mut scope);
        let arr = Value::Array(vec![Value::Number(1.0), Value::Number(2.0), Value::Number(3.0)]);
        let result = call(&mut c, "to_string", vec![arr]).unwrap();
        assert_eq!(result, Value::String("[1,2,3]".into()));
    }
}
