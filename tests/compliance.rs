use jmespath_engine::{compile, search, CustomFunction, Functions, Options, ParamSpec, Signature, TypeTag, Value};

fn v(json: serde_json::Value) -> Value {
    Value::from(json)
}

fn run(expr: &str, data: serde_json::Value) -> Value {
    // Lets `RUST_LOG=trace cargo test -- --nocapture` surface the lexer's
    // JEP-12 fallback and the interpreter's per-function dispatch trace.
    let _ = env_logger::try_init();
    search(expr, v(data), None).unwrap()
}

#[test]
fn field_and_subexpression() {
    let data = serde_json::json!({"a": {"b": {"c": "value"}}});
    assert_eq!(run("a.b.c", data), Value::String("value".into()));
}

#[test]
fn index_and_negative_index() {
    let data = serde_json::json!({"items": [10, 20, 30]});
    assert_eq!(run("items[1]", data.clone()), Value::Number(20.0));
    assert_eq!(run("items[-1]", data), Value::Number(30.0));
}

#[test]
fn slice_with_step_and_reverse() {
    let data = serde_json::json!([0, 1, 2, 3, 4, 5]);
    assert_eq!(
        run("[0:6:2]", data.clone()),
        v(serde_json::json!([0, 2, 4]))
    );
    assert_eq!(run("[::-1]", data), v(serde_json::json!([5, 4, 3, 2, 1, 0])));
}

#[test]
fn wildcard_projection_then_subexpression() {
    let data = serde_json::json!({
        "people": [
            {"name": "a", "age": 30},
            {"name": "b", "age": 25}
        ]
    });
    assert_eq!(
        run("people[*].name", data),
        v(serde_json::json!(["a", "b"]))
    );
}

#[test]
fn flatten_after_wildcard_projection_flattens_the_projected_array() {
    let data = serde_json::json!([[1, 2], [3, 4]]);
    assert_eq!(run("[*][]", data), v(serde_json::json!([1, 2, 3, 4])));
}

#[test]
fn flatten_merges_one_level() {
    let data = serde_json::json!({"reservations": [{"instances": [1, 2]}, {"instances": [3]}]});
    assert_eq!(
        run("reservations[].instances[]", data),
        v(serde_json::json!([1, 2, 3]))
    );
}

#[test]
fn filter_projection_keeps_matching_elements() {
    let data = serde_json::json!({
        "people": [
            {"name": "a", "age": 30},
            {"name": "b", "age": 10}
        ]
    });
    assert_eq!(
        run("people[?age > `20`].name", data),
        v(serde_json::json!(["a"]))
    );
}

#[test]
fn multi_select_list_and_hash() {
    let data = serde_json::json!({"a": 1, "b": 2});
    assert_eq!(run("[a, b]", data.clone()), v(serde_json::json!([1, 2])));
    assert_eq!(
        run("{x: a, y: b}", data),
        v(serde_json::json!({"x": 1, "y": 2}))
    );
}

#[test]
fn pipe_stops_projection_propagation() {
    let data = serde_json::json!({"people": [{"first": "a"}, {"first": "b"}]});
    assert_eq!(run("people[*].first | [0]", data), Value::String("a".into()));
}

#[test]
fn or_and_not_expressions() {
    assert_eq!(run(r#"foo || `"default"`"#, serde_json::json!({})), Value::String("default".into()));
    assert_eq!(run("!foo", serde_json::json!({"foo": false})), Value::Bool(true));
}

#[test]
fn and_expression_short_circuits_on_falsey_left() {
    let data = serde_json::json!({"a": true, "b": "yes"});
    assert_eq!(run("a && b", data.clone()), Value::String("yes".into()));
    assert_eq!(run("a && b", serde_json::json!({"a": false, "b": "yes"})), Value::Bool(false));
}

#[test]
fn built_in_functions_cover_common_cases() {
    assert_eq!(run("length(@)", serde_json::json!("hello")), Value::Number(5.0));
    assert_eq!(run("sum(@)", serde_json::json!([1, 2, 3])), Value::Number(6.0));
    assert_eq!(run("sort(@)", serde_json::json!([3, 1, 2])), v(serde_json::json!([1, 2, 3])));
    assert_eq!(
        run("max_by(@, &age)", serde_json::json!([{"age": 10}, {"age": 30}, {"age": 20}])),
        v(serde_json::json!({"age": 30}))
    );
    assert_eq!(run("type(@)", serde_json::json!(null)), Value::String("null".into()));
}

#[test]
fn expressions_reusable_across_repeated_compiles() {
    let compiled = compile("a.b").unwrap();
    let first = compiled.search(v(serde_json::json!({"a": {"b": 1}})), &Options::new()).unwrap();
    let second = compiled.search(v(serde_json::json!({"a": {"b": 2}})), &Options::new()).unwrap();
    assert_eq!(first, Value::Number(1.0));
    assert_eq!(second, Value::Number(2.0));
}

#[test]
fn custom_function_overrides_via_options() {
    let options = Options::new().with_custom_function(
        "greet",
        CustomFunction::new(Signature::fixed(vec![ParamSpec::new(&[TypeTag::String])]), |_ctx, args| {
            Ok(Value::String(format!("hello, {}", args[0].as_str().unwrap())))
        }),
    );
    // Registering the name globally first is required so the parser's
    // parse-time arity check recognises it; the `Options` value supplies
    // the actual implementation used at evaluation time.
    Functions::register(
        "greet",
        CustomFunction::new(Signature::fixed(vec![ParamSpec::new(&[TypeTag::String])]), |_ctx, _args| {
            unreachable!("shadowed by the per-call Options implementation")
        }),
    );
    let compiled = compile("greet(@)").unwrap();
    let result = compiled.search(Value::String("world".into()), &options).unwrap();
    assert_eq!(result, Value::String("hello, world".into()));
    Functions::unregister("greet");
}

#[test]
fn unknown_field_on_missing_path_is_null_not_an_error() {
    assert_eq!(run("a.b.c", serde_json::json!({})), Value::Null);
}

#[test]
fn comparator_returns_null_for_non_numeric_ordering() {
    assert_eq!(run("a < b", serde_json::json!({"a": "x", "b": 1})), Value::Null);
}
