#![cfg(unix)]

mod common;

use std::io::Cursor;

use common::{app, config, diagram, entries, within, TWO_STEP};
use pumlpad::app::messages::{BridgeRequest, BridgeResponse, SaveResult};
use pumlpad::app::runtime::serve;
use pumlpad::dialogs::PresetDialogs;
use pumlpad::engine::FramingMode;
use serde_json::{json, Value};
use tempfile::TempDir;

const RENDER_TIMEOUT_MS: u64 = 5_000;

#[tokio::test]
async fn save_as_appends_source_extension() {
    let temp = TempDir::new().unwrap();
    let dest = TempDir::new().unwrap();
    let app = app(
        &config(FramingMode::Delimiter, RENDER_TIMEOUT_MS, temp.path()),
        PresetDialogs::canceling().with_save(dest.path().join("notes")),
    );

    let result = within(app.save_file_as(TWO_STEP)).await;

    let expected = dest.path().join("notes.puml");
    assert_eq!(result, SaveResult::saved(expected.clone()));
    assert_eq!(std::fs::read_to_string(&expected).unwrap(), TWO_STEP);
    assert_eq!(entries(dest.path()), vec![expected]);
}

#[tokio::test]
async fn save_as_into_directory_uses_untitled_name() {
    let temp = TempDir::new().unwrap();
    let dest = TempDir::new().unwrap();
    let app = app(
        &config(FramingMode::Delimiter, RENDER_TIMEOUT_MS, temp.path()),
        PresetDialogs::canceling().with_save(dest.path()),
    );

    let result = within(app.save_file_as("@startuml\n@enduml\n")).await;

    assert!(result.success, "{result:?}");
    assert_eq!(result.file_path, Some(dest.path().join("untitled.puml")));
}

#[tokio::test]
async fn opened_file_can_be_saved_back_in_place() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("flow.plantuml");
    std::fs::write(&source, diagram("A -> B")).unwrap();
    let app = app(
        &config(FramingMode::Delimiter, RENDER_TIMEOUT_MS, temp.path()),
        PresetDialogs::canceling().with_open(&source),
    );

    let opened = within(app.open_file()).await;
    assert!(!opened.canceled);
    assert_eq!(opened.file_path.as_deref(), Some(source.as_path()));
    assert_eq!(opened.content.as_deref(), Some(diagram("A -> B").as_str()));

    let edited = diagram("A -> C");
    let saved = within(app.save_file(&source, &edited)).await;
    assert_eq!(saved, SaveResult::written());
    assert_eq!(std::fs::read_to_string(&source).unwrap(), edited);
}

#[tokio::test]
async fn unreadable_pick_reports_error_instead_of_cancel() {
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("gone.puml");
    let app = app(
        &config(FramingMode::Delimiter, RENDER_TIMEOUT_MS, temp.path()),
        PresetDialogs::canceling().with_open(&missing),
    );

    match within(app.handle(BridgeRequest::OpenFile)).await {
        BridgeResponse::Open(result) => {
            assert!(!result.canceled);
            assert!(result.content.is_none());
            assert!(result.error.unwrap().contains("gone.puml"));
        }
        other => panic!("unexpected response: {other:?}"),
    }
}

#[tokio::test]
async fn serve_answers_json_lines_with_engine_output() {
    let temp = TempDir::new().unwrap();
    let dest = TempDir::new().unwrap();
    let app = app(
        &config(FramingMode::Delimiter, RENDER_TIMEOUT_MS, temp.path()),
        PresetDialogs::canceling().with_save(dest.path().join("served")),
    );

    let requests = [
        json!({"id": 1, "op": "render", "markup": TWO_STEP}),
        json!({"id": 2, "op": "render", "markup": diagram("Carol -> Dave: hello")}),
        json!({"id": 3, "op": "saveFileAs", "content": TWO_STEP}),
        json!({"op": "render", "markup": TWO_STEP}),
    ];
    let input: String = requests.iter().map(|request| format!("{request}\n")).collect();

    let output = within(serve(std::sync::Arc::clone(&app), Cursor::new(input.into_bytes()), Vec::new()))
        .await
        .unwrap();
    app.shutdown().await;

    let responses: Vec<Value> = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(responses.len(), 4);

    let by_id = |id: u64| {
        responses
            .iter()
            .find(|response| response["id"] == json!(id))
            .unwrap_or_else(|| panic!("no response for {id}"))
    };

    let first = &by_id(1)["result"];
    assert_eq!(first["success"], json!(true));
    assert!(first["svg"].as_str().unwrap().contains("step two"));

    let second = &by_id(2)["result"];
    let svg = second["svg"].as_str().unwrap();
    assert!(svg.contains("Carol -> Dave: hello"), "{svg}");
    assert!(!svg.contains("step one"), "{svg}");

    let third = &by_id(3)["result"];
    assert_eq!(third["success"], json!(true));
    assert!(third["filePath"].as_str().unwrap().ends_with("served.puml"));

    let rejected = responses
        .iter()
        .find(|response| response["id"].is_null())
        .expect("error response without id");
    assert!(rejected["error"].as_str().unwrap().contains("id"));
}
