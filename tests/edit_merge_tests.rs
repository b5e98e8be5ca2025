use chart_option::api::{EditedConfig, OptionCompiler, merge_edited_option};
use chart_option::core::{ChartConfig, ChartType, DisplayBlock, rows_from_value};
use chart_option::{CompilerConfig, generate_option, serialize_option};
use serde_json::{Map, json};

fn compiler() -> OptionCompiler {
    OptionCompiler::new(CompilerConfig::default()).expect("compiler")
}

#[test]
fn text_with_series_is_used_as_a_complete_option() {
    let text = "option = { title: { text: 'Mine' }, series: [{ type: 'pie', data: [1, 2] }] };";
    let edited = compiler()
        .apply_edited_text(text, &ChartConfig::new())
        .expect("parse");
    let EditedConfig::Spec(option) = edited else {
        panic!("series must bypass the config merge");
    };
    assert_eq!(option["series"][0]["type"], json!("pie"));
}

#[test]
fn display_blocks_replace_config_blocks() {
    let config = ChartConfig::new()
        .with_x_column("month")
        .with_title(DisplayBlock::default().with_field("text", json!("Old")))
        .with_legend(DisplayBlock::default().with_field("top", json!(0)));
    let text = r#"
        option = {
          title: { text: 'New', subtext: 'edited' },
          legend: { show: false },
          xAxis: { name: 'Month' },
          color: ['#111111', '#222222'],
          dataZoom: [{ type: 'inside' }],
        };
    "#;
    let EditedConfig::Config(merged) = compiler().apply_edited_text(text, &config).expect("parse")
    else {
        panic!("no series means a config merge");
    };

    let title = merged.title.as_ref().expect("title");
    assert_eq!(title.fields["text"], json!("New"));
    assert_eq!(title.fields["subtext"], json!("edited"));
    assert!(merged.legend.as_ref().is_some_and(DisplayBlock::is_hidden));
    assert!(!merged.legend.as_ref().expect("legend").fields.contains_key("top"));
    assert_eq!(
        merged.x_axis.as_ref().expect("x axis").fields["name"],
        json!("Month")
    );
    assert_eq!(
        merged.colors,
        Some(vec!["#111111".to_owned(), "#222222".to_owned()])
    );
    assert_eq!(merged.x_column.as_deref(), Some("month"));
    assert!(!merged.extra.contains_key("dataZoom"));
}

#[test]
fn non_object_blocks_and_empty_colors_are_ignored() {
    let config = ChartConfig::new().with_colors(["#abcdef"]);
    let mut option = Map::new();
    option.insert("title".to_owned(), json!("just text"));
    option.insert("color".to_owned(), json!([]));
    option.insert("grid".to_owned(), json!({ "top": 10 }));

    let EditedConfig::Config(merged) = merge_edited_option(option, &config) else {
        panic!("config merge expected");
    };
    assert!(merged.title.is_none());
    assert_eq!(merged.colors, Some(vec!["#abcdef".to_owned()]));
    assert_eq!(merged.grid.expect("grid").fields["top"], json!(10));
}

#[test]
fn merged_config_flows_back_into_generation() {
    let rows = rows_from_value(&json!([
        { "month": "Jan", "sales": 100 },
        { "month": "Feb", "sales": 150 },
    ]))
    .expect("rows");
    let config = ChartConfig::new();
    let generated = generate_option(&ChartType::Bar, &rows, &config);

    let mut edited = generated.clone();
    edited.remove("series");
    edited.insert("title".to_owned(), json!({ "text": "Edited", "left": "right" }));
    let text = serialize_option(&edited);

    let EditedConfig::Config(merged) = compiler().apply_edited_text(&text, &config).expect("parse")
    else {
        panic!("config merge expected");
    };
    let regenerated = generate_option(&ChartType::Bar, &rows, &merged);
    assert_eq!(regenerated["title"]["text"], json!("Edited"));
    assert_eq!(regenerated["title"]["left"], json!("right"));
    assert_eq!(regenerated["series"], generated["series"]);
}

#[test]
fn unparsable_edits_surface_one_error() {
    let err = compiler()
        .apply_edited_text("this is not code", &ChartConfig::new())
        .expect_err("unparsable");
    assert!(err.to_string().contains("no valid configuration object found"));
}
