use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_handbookd");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn handbookd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn error_code(value: &serde_json::Value) -> Option<&str> {
    value
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
}

#[test]
fn every_section_resolves_in_both_categories() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    for category in ["basicEducation", "college"] {
        for n in 1..=20 {
            let id = format!("{category}-{n}");
            let res = request_ok(
                &mut stdin,
                &mut reader,
                &id,
                "handbook.section",
                json!({ "category": category, "section": n }),
            );
            let section = &res["section"];
            assert_eq!(section["id"], n, "{id}");
            assert!(
                !section["heading"].as_str().unwrap_or("").is_empty(),
                "{id} has no heading"
            );
            assert!(
                !section["blocks"].as_array().expect("blocks").is_empty(),
                "{id} has no blocks"
            );
        }
    }
}

#[test]
fn college_sections_carry_their_headings() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    for (n, heading) in [(3, "GRADING SYSTEM"), (4, "ATTENDANCE"), (5, "RETENTION POLICY")] {
        let res = request_ok(
            &mut stdin,
            &mut reader,
            &format!("c{n}"),
            "handbook.section",
            json!({ "category": "college", "section": n }),
        );
        assert_eq!(res["section"]["heading"], heading);
    }
}

#[test]
fn sidebars_have_expected_lengths_and_numbering() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let basic = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "handbook.sidebar",
        json!({ "category": "basicEducation" }),
    );
    let entries = basic["entries"].as_array().expect("entries");
    assert_eq!(entries.len(), 17);
    assert_eq!(entries[0]["number"], "I");
    assert_eq!(entries[0]["section"], 1);

    let college = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "handbook.sidebar",
        json!({ "category": "college" }),
    );
    let entries = college["entries"].as_array().expect("entries");
    assert_eq!(entries.len(), 20);
    let sections: Vec<i64> = entries
        .iter()
        .map(|e| e["section"].as_i64().expect("section"))
        .collect();
    assert_eq!(sections, (1..=20).collect::<Vec<_>>());
}

#[test]
fn bad_lookups_are_rejected() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    for (i, params) in [
        json!({ "category": "college", "section": 0 }),
        json!({ "category": "college", "section": 21 }),
        json!({ "category": "graduate", "section": 1 }),
        json!({ "category": "college" }),
    ]
    .into_iter()
    .enumerate()
    {
        let resp = request(
            &mut stdin,
            &mut reader,
            &format!("bad-{i}"),
            "handbook.section",
            params,
        );
        assert_eq!(error_code(&resp), Some("bad_params"), "{}", resp);
    }
}

#[test]
fn departments_map_to_categories() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let res = request_ok(&mut stdin, &mut reader, "1", "handbook.departments", json!({}));
    assert_eq!(
        res["departments"],
        json!([
            { "department": "Elementary", "category": "basicEducation" },
            { "department": "Junior High School", "category": "basicEducation" },
            { "department": "Senior High School", "category": "basicEducation" },
            { "department": "College", "category": "college" }
        ])
    );
}
