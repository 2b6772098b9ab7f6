//! Fuzz target for the JSON-lines progress parser.

#![no_main]

use arbitrary::Arbitrary;
use compose_events::compose::parse_json_events;
use libfuzzer_sys::fuzz_target;

/// A record built from the fields the parser looks at, so the fuzzer spends
/// its time past the JSON decoder.
#[derive(Debug, Arbitrary)]
struct FuzzRecord {
    id: Option<String>,
    parent_id: Option<String>,
    status: Option<String>,
    text: Option<String>,
    level: Option<String>,
    msg: Option<String>,
    tail: Option<bool>,
    error: Option<bool>,
}

#[derive(Debug, Arbitrary)]
enum FuzzLine {
    Record(FuzzRecord),
    Raw(String),
}

fn render(record: &FuzzRecord) -> String {
    let mut object = serde_json::Map::new();
    let fields = [
        ("id", &record.id),
        ("parent_id", &record.parent_id),
        ("status", &record.status),
        ("text", &record.text),
        ("level", &record.level),
        ("msg", &record.msg),
    ];
    for (key, value) in fields {
        if let Some(value) = value {
            object.insert(key.to_string(), value.clone().into());
        }
    }
    if let Some(tail) = record.tail {
        object.insert("tail".to_string(), tail.into());
    }
    if let Some(error) = record.error {
        object.insert("error".to_string(), error.into());
    }
    serde_json::Value::Object(object).to_string()
}

fuzz_target!(|lines: Vec<FuzzLine>| {
    let stderr: String = lines
        .iter()
        .map(|line| match line {
            FuzzLine::Record(record) => render(record),
            FuzzLine::Raw(raw) => raw.clone(),
        })
        .collect::<Vec<_>>()
        .join("\n");

    let result = parse_json_events(stderr.as_bytes(), |_| {});
    if lines.iter().all(|line| matches!(line, FuzzLine::Record(_))) {
        assert!(result.is_ok(), "well-formed records must decode: {result:?}");
    }
});
