use chart_option::api::{CompilerConfig, DATA_PLACEHOLDER, OptionCompiler};
use chart_option::core::{rows_from_value, rows_to_value};
use chart_option::{Row, interpolate, is_templated, prepare_for_storage, serialize_option};
use serde_json::{Value, json};

fn sales_rows() -> Vec<Row> {
    rows_from_value(&json!([
        { "month": "Jan", "sales": 100 },
        { "month": "Feb", "sales": 150 },
    ]))
    .expect("rows")
}

#[test]
fn quoted_placeholder_in_json_text_is_substituted() {
    let text = r#"{"dataset":{"source":"$DATA"},"series":[{"type":"bar"}]}"#;
    let option = interpolate(text, &sales_rows());
    assert_eq!(
        option["dataset"]["source"],
        json!([
            { "month": "Jan", "sales": 100 },
            { "month": "Feb", "sales": 150 },
        ])
    );
    assert_eq!(option["series"][0]["type"], json!("bar"));
}

#[test]
fn bare_placeholder_in_option_code_is_substituted_then_evaluated() {
    let text = "option = {\n  dataset: { source: $DATA },\n  series: [{ type: 'line' }]\n};";
    let option = interpolate(text, &sales_rows());
    assert_eq!(option["dataset"]["source"][1]["month"], json!("Feb"));
    assert_eq!(option["series"][0]["type"], json!("line"));
}

#[test]
fn member_access_on_placeholder_evaluates_against_rows() {
    let text = r#"
        option = {
          xAxis: { type: 'category', data: $DATA.map((r) => r.month) },
          series: [{ type: 'bar', data: $DATA.map((r) => r.sales) }],
        };
    "#;
    let option = interpolate(text, &sales_rows());
    assert_eq!(option["xAxis"]["data"], json!(["Jan", "Feb"]));
    assert_eq!(option["series"][0]["data"], json!([100, 150]));
}

#[test]
fn index_access_and_spread_are_expression_uses() {
    let option = interpolate(
        "{ title: { text: $DATA[0].month }, dataset: { source: [...$DATA, { month: 'Mar', sales: 0 }] } }",
        &sales_rows(),
    );
    assert_eq!(option["title"]["text"], json!("Jan"));
    assert_eq!(option["dataset"]["source"].as_array().map(Vec::len), Some(3));
    assert_eq!(option["dataset"]["source"][2]["month"], json!("Mar"));
}

#[test]
fn statements_before_the_option_are_evaluated() {
    let text = r#"
        const total = $DATA.reduce((sum, r) => sum + r.sales, 0);
        option = { title: { text: 'Total ' + total } };
    "#;
    let option = interpolate(text, &sales_rows());
    assert_eq!(option["title"]["text"], json!("Total 250"));
}

#[test]
fn typescript_annotations_are_tolerated_in_templates() {
    let text = "const option: EChartsOption = { series: [{ type: 'bar', data: $DATA.map((r: Row): number => r.sales) }] };";
    let option = interpolate(text, &sales_rows());
    assert_eq!(option["series"][0]["data"], json!([100, 150]));
}

#[test]
fn unresolvable_templates_degrade_to_an_empty_option() {
    for text in [
        "option = { broken: $DATA.( };",
        "option = { a: secretGlobal.read($DATA) };",
        "not even close to code $DATA",
        "",
    ] {
        assert!(interpolate(text, &sales_rows()).is_empty(), "{text:?}");
    }
}

#[test]
fn templated_detection_scans_text_and_objects() {
    assert!(is_templated(&json!("option = { dataset: { source: $DATA } };")));
    assert!(is_templated(&json!({ "dataset": { "source": DATA_PLACEHOLDER } })));
    assert!(!is_templated(&json!({ "dataset": { "source": [] } })));
    assert!(!is_templated(&json!("option = { series: [] };")));
}

#[test]
fn storage_replaces_embedded_rows_with_the_placeholder() {
    let config = json!({
        "dataset": { "source": [{ "month": "Jan", "sales": 100 }] },
        "series": [{ "type": "bar" }],
    });
    let stored = prepare_for_storage(&config);
    assert_eq!(stored["dataset"]["source"], json!("$DATA"));
    assert_eq!(stored["series"], config["series"]);
}

#[test]
fn storage_handles_dataset_arrays() {
    let config = json!({
        "dataset": [
            { "source": [[1, 2], [3, 4]] },
            { "transform": { "type": "filter" } },
        ],
    });
    let stored = prepare_for_storage(&config);
    assert_eq!(stored["dataset"][0]["source"], json!("$DATA"));
    assert_eq!(stored["dataset"][1], config["dataset"][1]);
}

#[test]
fn storage_passes_through_text_templated_and_datasetless_configs() {
    let text = json!("option = { dataset: { source: [1, 2] } };");
    assert_eq!(prepare_for_storage(&text), text);

    let templated = json!({ "dataset": { "source": "$DATA" }, "extra": [1] });
    assert_eq!(prepare_for_storage(&templated), templated);

    let plain = json!({ "series": [{ "type": "pie", "data": [1, 2] }] });
    assert_eq!(prepare_for_storage(&plain), plain);
}

#[test]
fn stored_and_reinterpolated_config_reproduces_the_rows() {
    let rows = sales_rows();
    let config = json!({
        "dataset": { "source": rows_to_value(&rows) },
        "xAxis": { "type": "category" },
        "series": [{ "type": "bar", "encode": { "x": "month", "y": "sales" } }],
    });
    let Value::Object(stored) = prepare_for_storage(&config) else {
        panic!("stored config must stay an object");
    };
    let text = serialize_option(&stored);
    assert!(text.contains("'$DATA'"));

    let option = interpolate(&text, &rows);
    assert_eq!(option["dataset"]["source"], config["dataset"]["source"]);
    assert_eq!(option["series"], config["series"]);
}

#[test]
fn custom_placeholder_tokens_are_honored() {
    let compiler = OptionCompiler::new(CompilerConfig::new().with_placeholder("__ROWS__"))
        .expect("compiler");
    assert_eq!(compiler.placeholder(), "__ROWS__");

    let option = compiler.interpolate(
        "option = { series: [{ type: 'bar', data: __ROWS__.map((r) => r.sales) }] };",
        &sales_rows(),
    );
    assert_eq!(option["series"][0]["data"], json!([100, 150]));

    let stored = compiler.prepare_for_storage(&json!({ "dataset": { "source": [{ "a": 1 }] } }));
    assert_eq!(stored["dataset"]["source"], json!("__ROWS__"));
    assert!(compiler.is_templated(&stored));
}
