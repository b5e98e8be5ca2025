use chart_option::api::{
    CHART_DOCUMENT_JSON_SCHEMA_V1, ChartDocument, ChartStore, MemoryChartStore, RowSource,
    StaticRowSource, preview,
};
use chart_option::core::{ChartConfig, ChartType, rows_from_value, rows_to_value};
use chart_option::{ChartError, Row};
use serde_json::{Value, json};

fn sales_rows() -> Vec<Row> {
    rows_from_value(&json!([
        { "month": "Jan", "sales": 100 },
        { "month": "Feb", "sales": 150 },
    ]))
    .expect("rows")
}

const EMBEDDED: &str = r#"option = {
  dataset: { source: [{ month: 'Jan', sales: 100 }, { month: 'Feb', sales: 150 }] },
  xAxis: { type: 'category' },
  yAxis: {},
  series: [{ type: 'line', encode: { x: 'month', y: 'sales' } }]
};"#;

#[test]
fn documents_without_custom_text_render_through_the_generator() {
    let document = ChartDocument::new(ChartType::Bar, ChartConfig::new());
    let option = document.render(&sales_rows());
    assert_eq!(option["series"][0]["name"], json!("sales"));
    assert_eq!(option["series"][0]["type"], json!("bar"));
}

#[test]
fn custom_text_wins_over_generation() {
    let document = ChartDocument::new(ChartType::Bar, ChartConfig::new()).with_custom_option(
        "option = { series: [{ type: 'pie', data: $DATA.map((r) => ({ name: r.month, value: r.sales })) }] };",
    );
    assert!(document.is_templated());
    let option = document.render(&sales_rows());
    assert_eq!(option["series"][0]["type"], json!("pie"));
    assert_eq!(
        option["series"][0]["data"],
        json!([{ "name": "Jan", "value": 100 }, { "name": "Feb", "value": 150 }])
    );
}

#[test]
fn broken_custom_text_renders_empty() {
    let document =
        ChartDocument::new(ChartType::Line, ChartConfig::new()).with_custom_option("option = {");
    assert!(document.render(&sales_rows()).is_empty());
}

#[test]
fn storage_form_templates_embedded_rows() {
    let document =
        ChartDocument::new(ChartType::Line, ChartConfig::new()).with_custom_option(EMBEDDED);
    assert!(!document.is_templated());

    let stored = document.for_storage();
    let text = stored.custom_option.as_deref().expect("custom text");
    assert!(stored.is_templated());
    assert!(text.starts_with("option = {"));
    assert!(text.contains("source: '$DATA'"));
    assert!(!text.contains("Jan"));

    let rendered = stored.render(&sales_rows());
    assert_eq!(rendered["dataset"]["source"], rows_to_value(&sales_rows()));
    assert_eq!(rendered["series"][0]["encode"], json!({ "x": "month", "y": "sales" }));
}

#[test]
fn storage_form_keeps_text_it_cannot_or_need_not_rewrite() {
    for text in [
        "option = { dataset: { source: $DATA }, series: [{ type: 'bar' }] };",
        "option = { series: [{ type: 'bar', label: { formatter: (p) => p.value } }] };",
        "option = { dataset: { source: [] } };",
        "option = { broken",
    ] {
        let document =
            ChartDocument::new(ChartType::Bar, ChartConfig::new()).with_custom_option(text);
        assert_eq!(document.for_storage(), document, "{text}");
    }
    let plain = ChartDocument::new(ChartType::Pie, ChartConfig::new());
    assert_eq!(plain.for_storage(), plain);
}

#[test]
fn memory_store_keeps_documents_in_stored_form() {
    let store = MemoryChartStore::new();
    assert!(store.is_empty());

    let document =
        ChartDocument::new(ChartType::Line, ChartConfig::new()).with_custom_option(EMBEDDED);
    store.save("chart-1", &document).expect("save");
    assert_eq!(store.len(), 1);

    let loaded = store.load("chart-1").expect("load");
    assert!(loaded.is_templated());
    assert_eq!(loaded.chart_type, ChartType::Line);

    store.save("chart-1", &loaded).expect("overwrite");
    assert_eq!(store.len(), 1);
}

#[test]
fn missing_documents_and_datasets_are_errors() {
    let store = MemoryChartStore::new();
    assert!(matches!(store.load("nope"), Err(ChartError::Store(_))));

    let source = StaticRowSource::new();
    assert!(matches!(source.fetch_rows("nope"), Err(ChartError::RowSource(_))));
    let document = ChartDocument::new(ChartType::Bar, ChartConfig::new());
    assert!(matches!(
        preview(&source, "nope", &document),
        Err(ChartError::RowSource(_))
    ));
}

#[test]
fn preview_fetches_rows_then_renders() {
    let source = StaticRowSource::new().with_dataset("sales", sales_rows());
    let store = MemoryChartStore::new();
    let document =
        ChartDocument::new(ChartType::Line, ChartConfig::new()).with_custom_option(EMBEDDED);
    store.save("chart-1", &document).expect("save");

    let loaded = store.load("chart-1").expect("load");
    let option = preview(&source, "sales", &loaded).expect("preview");
    assert_eq!(option["dataset"]["source"], rows_to_value(&sales_rows()));
}

#[test]
fn json_contract_v1_round_trips() {
    let config = ChartConfig::from_value(json!({
        "xColumn": "month",
        "yColumns": ["sales"],
        "title": { "text": "Sales", "show": true },
        "customFlag": 7,
    }))
    .expect("config");
    let document = ChartDocument::new(ChartType::Area, config).with_custom_option("{ a: 1 }");

    let payload = document.to_json_contract_v1_pretty().expect("serialize");
    let raw: Value = serde_json::from_str(&payload).expect("json");
    assert_eq!(raw["schema_version"], json!(CHART_DOCUMENT_JSON_SCHEMA_V1));
    assert_eq!(raw["document"]["chartType"], json!("area"));
    assert_eq!(raw["document"]["config"]["xColumn"], json!("month"));
    assert_eq!(raw["document"]["config"]["customFlag"], json!(7));
    assert_eq!(raw["document"]["customOption"], json!("{ a: 1 }"));

    let restored = ChartDocument::from_json_compat_str(&payload).expect("restore");
    assert_eq!(restored, document);
}

#[test]
fn bare_documents_with_legacy_fields_are_accepted() {
    let restored = ChartDocument::from_json_compat_str(
        r##"{ "chartType": "sankey", "config": { "labelColumn": "from", "colorScheme": ["#fff"] } }"##,
    )
    .expect("bare document");
    assert_eq!(restored.chart_type, ChartType::Other("sankey".to_owned()));
    assert_eq!(restored.config.x_column.as_deref(), Some("from"));
    assert_eq!(restored.config.colors, Some(vec!["#fff".to_owned()]));

    let canonical = restored.config.to_value().expect("config json");
    assert!(canonical.get("labelColumn").is_none());
    assert!(canonical.get("colorScheme").is_none());
    assert_eq!(canonical["colors"], json!(["#fff"]));
}

#[test]
fn unknown_schema_versions_are_rejected() {
    let err = ChartDocument::from_json_compat_str(
        r#"{ "schema_version": 2, "document": { "chartType": "bar" } }"#,
    )
    .expect_err("future schema");
    assert!(matches!(err, ChartError::Serialization(_)));
    assert!(err.to_string().contains("unsupported chart document schema version: 2"));

    assert!(matches!(
        ChartDocument::from_json_compat_str("[]"),
        Err(ChartError::Serialization(_))
    ));
}
