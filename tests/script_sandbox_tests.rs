use chart_option::script::{
    CHARTING_NAMESPACE, Sandbox, SandboxLimits, ScriptError, ScriptValue, into_object,
};
use serde_json::{Value, json};

fn sandbox() -> Sandbox {
    Sandbox::new("$DATA", ScriptValue::Null, SandboxLimits::default())
}

fn with_data(data: Value) -> Sandbox {
    Sandbox::new("$DATA", ScriptValue::from_json(&data), SandboxLimits::default())
}

fn eval(source: &str) -> Value {
    sandbox()
        .eval_expression(source)
        .unwrap_or_else(|err| panic!("{source}: {err}"))
        .to_json()
}

#[test]
fn arithmetic_follows_operator_precedence() {
    assert_eq!(eval("1 + 2 * 3"), json!(7));
    assert_eq!(eval("(1 + 2) * 3"), json!(9));
    assert_eq!(eval("10 % 4 - -1"), json!(3));
    assert_eq!(eval("7 / 2"), json!(3.5));
    assert_eq!(eval("'n' + 1 + 2"), json!("n12"));
}

#[test]
fn comparisons_and_logic_short_circuit() {
    assert_eq!(eval("1 < 2 && 'a' === 'a'"), json!(true));
    assert_eq!(eval("0 || 'fallback'"), json!("fallback"));
    assert_eq!(eval("null ?? 5"), json!(5));
    assert_eq!(eval("0 ?? 5"), json!(0));
    assert_eq!(eval("1 == '1'"), json!(true));
    assert_eq!(eval("1 === '1'"), json!(false));
    assert_eq!(eval("!0 ? 'yes' : 'no'"), json!("yes"));
    assert_eq!(eval("typeof 'x'"), json!("string"));
}

#[test]
fn template_literals_interpolate_expressions() {
    assert_eq!(eval("`a${1 + 1}b${'c'.toUpperCase()}`"), json!("a2bC"));
}

#[test]
fn object_and_array_spread_merge_in_order() {
    assert_eq!(
        eval("{ ...{ a: 1, b: 2 }, b: 3, ['c' + 1]: 4 }"),
        json!({ "a": 1, "b": 3, "c1": 4 })
    );
    assert_eq!(eval("[0, ...[1, 2], 3]"), json!([0, 1, 2, 3]));
}

#[test]
fn optional_chaining_short_circuits_on_nullish_links() {
    let sandbox = with_data(json!({ "a": null, "b": { "c": 1 } }));
    let eval = |source: &str| sandbox.eval_expression(source).expect(source).to_json();
    assert_eq!(eval("$DATA.a?.b"), Value::Null);
    assert_eq!(eval("$DATA.b?.c"), json!(1));
    assert_eq!(eval("$DATA.missing?.x ?? 'none'"), json!("none"));
}

#[test]
fn array_builtins_cover_common_transformations() {
    let sandbox = with_data(json!([3, 1, 2]));
    let eval = |source: &str| sandbox.eval_expression(source).expect(source).to_json();
    assert_eq!(eval("$DATA.map((x) => x * 10)"), json!([30, 10, 20]));
    assert_eq!(eval("$DATA.filter((x) => x > 1)"), json!([3, 2]));
    assert_eq!(eval("$DATA.find((x) => x < 3)"), json!(1));
    assert_eq!(eval("$DATA.some((x) => x > 2)"), json!(true));
    assert_eq!(eval("$DATA.every((x) => x > 2)"), json!(false));
    assert_eq!(eval("$DATA.reduce((a, b) => a + b, 0)"), json!(6));
    assert_eq!(eval("$DATA.slice(1)"), json!([1, 2]));
    assert_eq!(eval("$DATA.concat([4], 5)"), json!([3, 1, 2, 4, 5]));
    assert_eq!(eval("$DATA.join('-')"), json!("3-1-2"));
    assert_eq!(eval("$DATA.includes(2)"), json!(true));
    assert_eq!(eval("$DATA.indexOf(2)"), json!(2));
    assert_eq!(eval("$DATA.length"), json!(3));
    assert_eq!(eval("[...$DATA].sort((a, b) => a - b)"), json!([1, 2, 3]));
    assert_eq!(eval("[...$DATA].reverse()"), json!([2, 1, 3]));
}

#[test]
fn string_and_number_builtins() {
    assert_eq!(eval("'Sales'.toLowerCase()"), json!("sales"));
    assert_eq!(eval("'abc'.length"), json!(3));
    assert_eq!(eval("(2.345).toFixed(1)"), json!("2.3"));
    assert_eq!(eval("'a,b'.split(',')"), json!(["a", "b"]));
}

#[test]
fn program_bodies_support_functions_loops_and_branches() {
    let source = r#"
        function double(x) { return x * 2; }
        let total = 0;
        for (let i = 0; i < 5; i++) {
          if (i % 2 === 0) { total += i; } else { total -= 1; }
        }
        option = { total, doubled: double(total) };
    "#;
    let option = into_object(sandbox().run_option_body(source).expect("run")).expect("object");
    assert_eq!(Value::Object(option), json!({ "total": 4, "doubled": 8 }));
}

#[test]
fn member_paths_can_be_assigned() {
    let source = "option = { series: [{}] }; option.series[0].type = 'bar'; option.grid = { top: 1 };";
    let option = sandbox().run_option_body(source).expect("run").to_json();
    assert_eq!(option, json!({ "series": [{ "type": "bar" }], "grid": { "top": 1 } }));
}

#[test]
fn only_the_two_injected_bindings_are_visible() {
    for name in ["window", "globalThis", "process", "require", "fetch", "document", "Function"] {
        assert_eq!(
            sandbox().eval_expression(name),
            Err(ScriptError::UnknownBinding(name.to_owned())),
            "{name}"
        );
    }
    assert!(sandbox().eval_expression(CHARTING_NAMESPACE).is_ok());
    assert_eq!(
        with_data(json!([1])).eval_expression("$DATA").map(|v| v.to_json()),
        Ok(json!([1]))
    );
}

#[test]
fn program_declarations_do_not_leak_between_runs() {
    let sandbox = sandbox();
    sandbox
        .run_option_body("var leaked = 1; option = {};")
        .expect("first run");
    assert_eq!(
        sandbox.eval_expression("leaked"),
        Err(ScriptError::UnknownBinding("leaked".to_owned()))
    );
}

#[test]
fn gradients_construct_with_or_without_new() {
    let linear = eval("new echarts.graphic.LinearGradient(0, 0, 1, 0, [{ offset: 0, color: 'red' }])");
    assert_eq!(
        linear,
        json!({
            "type": "linear",
            "x": 0,
            "y": 0,
            "x2": 1,
            "y2": 0,
            "colorStops": [{ "offset": 0, "color": "red" }],
            "global": false,
        })
    );
    let radial = eval("echarts.graphic.RadialGradient(0.5, 0.5, 0.8, [])");
    assert_eq!(radial["type"], json!("radial"));
    assert_eq!(radial["r"], json!(0.8));
}

#[test]
fn only_namespace_constructors_can_be_instantiated() {
    let err = sandbox()
        .run_option_body("function F() {} option = { f: new F() };")
        .expect_err("new on plain function");
    assert!(matches!(err, ScriptError::Runtime(_)), "{err}");
}

#[test]
fn json_conversion_drops_functions_and_undefined() {
    let value = eval("{ f: () => 1, u: undefined, n: null, list: [() => 1, undefined, 2] }");
    assert_eq!(value, json!({ "n": null, "list": [null, null, 2] }));
    assert_eq!(eval("1 / 0"), Value::Null);
}

#[test]
fn non_objects_are_rejected_as_configs() {
    for source in ["[1, 2]", "'text'", "42", "null"] {
        let value = sandbox().eval_expression(source).expect(source);
        assert_eq!(into_object(value), Err(ScriptError::NotAnObject), "{source}");
    }
}

#[test]
fn syntax_errors_carry_their_position() {
    match sandbox().eval_expression("{ a: 1,, }") {
        Err(ScriptError::Parse { span, .. }) => assert!(span.start >= 6, "{span}"),
        other => panic!("expected parse error, got {other:?}"),
    }
    assert!(matches!(
        sandbox().eval_expression("'unterminated"),
        Err(ScriptError::Lex { .. })
    ));
}

#[test]
fn recursion_is_bounded_by_the_depth_budget() {
    let limits = SandboxLimits {
        max_steps: 1_000_000,
        max_depth: 32,
        ..SandboxLimits::default()
    };
    let sandbox = Sandbox::new("$DATA", ScriptValue::Null, limits);
    let err = sandbox
        .run_option_body("function f(n) { return f(n + 1); } option = { v: f(0) };")
        .expect_err("unbounded recursion");
    assert_eq!(err, ScriptError::DepthLimit(32));
}

fn limited(max_value_bytes: usize) -> Sandbox {
    let limits = SandboxLimits {
        max_value_bytes,
        ..SandboxLimits::default()
    };
    Sandbox::new("$DATA", ScriptValue::Null, limits)
}

#[test]
fn sort_tolerates_inconsistent_comparators() {
    let data: Vec<u64> = (0..96).map(|n| (n * 37) % 101).collect();
    let sorted = with_data(json!(data))
        .eval_expression("[...$DATA].sort((a, b) => ((a * 31 + b * 17 + 1) % 3) - 1)")
        .expect("sort finishes")
        .to_json();
    let mut sorted: Vec<u64> = serde_json::from_value(sorted).expect("numbers");
    sorted.sort_unstable();
    let mut expected = data.clone();
    expected.sort_unstable();
    assert_eq!(sorted, expected);

    let ascending = with_data(json!(data))
        .eval_expression("[...$DATA].sort((a, b) => a - b)")
        .expect("sort")
        .to_json();
    assert_eq!(ascending, json!(expected));
}

#[test]
fn sort_is_stable_and_treats_nan_as_equal() {
    let source = "$DATA.map((v, i) => { return { k: v % 3, i: i }; })\
        .sort((a, b) => a.k - b.k).map((r) => r.i)";
    let data: Vec<u64> = (0..70).collect();
    let order = with_data(json!(data)).eval_expression(source).expect("sort").to_json();
    let order: Vec<u64> = serde_json::from_value(order).expect("indices");
    let expected: Vec<u64> = (0..3).flat_map(|k| (0..70).filter(move |i| i % 3 == k)).collect();
    assert_eq!(order, expected);

    assert_eq!(eval("[3, 1, 2].sort((a, b) => 'x' * 1)"), json!([3, 1, 2]));
}

#[test]
fn sort_stops_at_the_first_comparator_error() {
    let err = sandbox()
        .eval_expression("[3, 1, 2].sort((a, b) => a.missing.deeper)")
        .expect_err("comparator throws");
    assert!(matches!(err, ScriptError::Runtime(_)), "{err:?}");
}

#[test]
fn string_doubling_hits_the_size_budget() {
    let source = "let s = 'xxxxxxxx'; \
        for (let i = 0; i < 26; i = i + 1) { s = s + s; } option = { n: s.length };";
    assert_eq!(
        sandbox().run_option_body(source),
        Err(ScriptError::SizeLimit(64 * 1024 * 1024))
    );
    assert!(chart_option::parse_config(source).is_err());
}

#[test]
fn growing_collections_hit_the_size_budget() {
    let cases = [
        "let a = [1]; for (let i = 0; i < 20; i = i + 1) { a = [...a, ...a]; } option = {};",
        "let a = ['xxxxxxxx']; for (let i = 0; i < 20; i = i + 1) { a = a.concat(a); } option = {};",
        "let o = { k: 'xxxxxxxx' }; for (let i = 0; i < 20; i = i + 1) { o = { ...o, [i]: `${o.k}${o.k}` }; o.k = o[i]; } option = {};",
        "let a = []; a[100000] = 1; option = {};",
        "let a = []; for (let i = 0; i < 200; i = i + 1) { a.push('xxxxxxxxxxxxxxxx'); } option = {};",
        "let a = ['xxxxxxxxxxxxxxxx']; for (let i = 0; i < 12; i = i + 1) { a = a.map((s) => s + s); } option = {};",
        "let s = 'xxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx'; let a = [s, s, s, s, s, s, s, s]; option = { s: a.join(a.join('')) };",
    ];
    for source in cases {
        assert_eq!(
            limited(1024).run_option_body(source),
            Err(ScriptError::SizeLimit(1024)),
            "{source}"
        );
    }
    assert!(limited(1024).run_option_body("option = { a: [1, 2, 3].concat([4]) };").is_ok());
}
