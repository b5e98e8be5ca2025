use chart_option::api::{
    CompilerConfig, ConfigParser, OptionCompiler, ParseStrategy, parse_config,
};
use chart_option::script::{Sandbox, SandboxLimits, ScriptError, ScriptValue};
use chart_option::{ChartError, ChartResult};
use serde_json::json;

fn parser() -> ConfigParser {
    ConfigParser::new("$DATA", SandboxLimits::default()).expect("parser init")
}

fn parse_value(text: &str) -> ChartResult<serde_json::Value> {
    parse_config(text).map(serde_json::Value::Object)
}

#[test]
fn bare_object_literal_parses_by_brace_scan() {
    let (option, strategy) = parser()
        .parse_with_strategy("{ title: { text: 'Hi' } }")
        .expect("parse");
    assert_eq!(strategy, ParseStrategy::BraceScan);
    assert_eq!(serde_json::Value::Object(option), json!({ "title": { "text": "Hi" } }));
}

#[test]
fn option_assignment_runs_as_full_execution() {
    let text = "option = { title: { text: 'Sales' }, series: [{ type: 'bar', data: [1, 2, 3] }] };";
    let (option, strategy) = parser().parse_with_strategy(text).expect("parse");
    assert_eq!(strategy, ParseStrategy::FullExecution);
    assert_eq!(
        serde_json::Value::Object(option),
        json!({
            "title": { "text": "Sales" },
            "series": [{ "type": "bar", "data": [1, 2, 3] }],
        })
    );
}

#[test]
fn declared_option_with_statements_builds_the_object() {
    let text = r#"
        const months = ['Jan', 'Feb', 'Mar'];
        const values = [120, 200, 150];
        let option = {
          xAxis: { type: 'category', data: months },
          yAxis: { type: 'value' },
          series: [],
        };
        option.series.push({ type: 'line', data: values.map((v) => v * 2) });
        option.title = { text: `Total ${values.reduce((a, b) => a + b, 0)}` };
    "#;
    let option = parse_value(text).expect("parse");
    assert_eq!(option["xAxis"]["data"], json!(["Jan", "Feb", "Mar"]));
    assert_eq!(option["series"][0]["data"], json!([240, 400, 300]));
    assert_eq!(option["title"]["text"], json!("Total 470"));
}

#[test]
fn explicit_return_wins_over_option_binding() {
    let text = "option = { a: 1 };\nreturn { b: 2 };";
    assert_eq!(parse_value(text).expect("parse"), json!({ "b": 2 }));
}

#[test]
fn typescript_annotations_are_stripped_before_evaluation() {
    let text = r#"
        interface SalesRow { month: string; sales: number }
        type Palette = string[];
        const rows: SalesRow[] = [{ month: 'Jan', sales: 10 }, { month: 'Feb', sales: 20 }];
        const colors = ['#111', '#222'] as Palette;
        function label(row: SalesRow, upper?: boolean): string {
          return upper ? row.month.toUpperCase() : row.month;
        }
        const option: EChartsOption = {
          color: colors,
          xAxis: { data: rows.map((r: SalesRow) => label(r, true)) },
          series: [{ type: 'bar', data: rows.map((r: SalesRow): number => r.sales) }],
        };
    "#;
    let option = parse_value(text).expect("parse");
    assert_eq!(option["color"], json!(["#111", "#222"]));
    assert_eq!(option["xAxis"]["data"], json!(["JAN", "FEB"]));
    assert_eq!(option["series"][0]["data"], json!([10, 20]));
}

#[test]
fn config_assignment_is_extracted() {
    let (option, strategy) = parser()
        .parse_with_strategy("var config = { legend: { show: false } };")
        .expect("parse");
    assert_eq!(strategy, ParseStrategy::AssignmentExtraction);
    assert_eq!(serde_json::Value::Object(option), json!({ "legend": { "show": false } }));
}

#[test]
fn object_surrounded_by_prose_is_found_by_brace_scan() {
    let text = "Paste this into the editor: { grid: { left: 10 } } -- done";
    let (option, strategy) = parser().parse_with_strategy(text).expect("parse");
    assert_eq!(strategy, ParseStrategy::BraceScan);
    assert_eq!(serde_json::Value::Object(option), json!({ "grid": { "left": 10 } }));
}

#[test]
fn option_token_inside_a_string_falls_through_to_later_strategies() {
    let text = "{ title: { text: 'options overview' } }";
    let (option, strategy) = parser().parse_with_strategy(text).expect("parse");
    assert_eq!(strategy, ParseStrategy::BraceScan);
    assert_eq!(option["title"]["text"], json!("options overview"));
}

#[test]
fn placeholder_parses_to_its_own_token() {
    let option = parse_value("option = { dataset: { source: $DATA } };").expect("parse");
    assert_eq!(option["dataset"]["source"], json!("$DATA"));
}

#[test]
fn charting_namespace_gradients_are_plain_objects() {
    let text = r#"
        option = {
          series: [{
            type: 'bar',
            itemStyle: {
              color: new echarts.graphic.LinearGradient(0, 0, 0, 1, [
                { offset: 0, color: '#83bff6' },
                { offset: 1, color: '#188df0' },
              ]),
            },
          }],
        };
    "#;
    let option = parse_value(text).expect("parse");
    let color = &option["series"][0]["itemStyle"]["color"];
    assert_eq!(color["type"], json!("linear"));
    assert_eq!(color["y2"], json!(1));
    assert_eq!(color["colorStops"][1]["color"], json!("#188df0"));
}

#[test]
fn function_values_are_dropped_from_the_result() {
    let text = "option = { tooltip: { formatter: (p) => p.name, trigger: 'item' } };";
    let option = parse_value(text).expect("parse");
    assert_eq!(option["tooltip"], json!({ "trigger": "item" }));
}

#[test]
fn ambient_globals_are_not_reachable() {
    for text in [
        "option = { a: window.location };",
        "option = { a: fetch('/x') };",
        "option = { a: process.env };",
    ] {
        let err = parse_config(text).expect_err("ambient access must fail");
        assert!(matches!(err, ChartError::ConfigParse(_)), "{text}: {err}");
    }
}

#[test]
fn text_without_any_object_fails_with_one_error() {
    let err = parse_config("just some words").expect_err("no object");
    assert!(matches!(err, ChartError::ConfigParse(_)));
    assert!(err.to_string().starts_with("no valid configuration object found"));
}

#[test]
fn non_object_results_are_rejected() {
    assert!(parse_config("option = [1, 2, 3];").is_err());
    assert!(parse_config("option = null;").is_err());
}

#[test]
fn runaway_loops_hit_the_step_budget() {
    let limits = SandboxLimits {
        max_steps: 500,
        max_depth: 64,
        ..SandboxLimits::default()
    };
    let source = "let option = {}; for (;;) { option.x = 1; }";
    let sandbox = Sandbox::new("$DATA", ScriptValue::Null, limits);
    assert_eq!(
        sandbox.run_option_body(source),
        Err(ScriptError::StepLimit(500))
    );

    let compiler = OptionCompiler::new(CompilerConfig::new().with_limits(limits)).expect("compiler");
    assert!(compiler.parse(source).is_err());
}

#[test]
fn deep_nesting_hits_the_depth_budget() {
    let compiler = OptionCompiler::new(
        CompilerConfig::new().with_limits(SandboxLimits {
            max_steps: 100_000,
            max_depth: 16,
            ..SandboxLimits::default()
        }),
    )
    .expect("compiler");
    let nested = format!("option = {{ a: {}1{} }};", "[".repeat(40), "]".repeat(40));
    assert!(compiler.parse(&nested).is_err());
}
