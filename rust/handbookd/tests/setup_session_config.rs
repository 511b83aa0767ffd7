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
fn setup_defaults_and_validation() {
    let workspace = temp_dir("handbook-setup-defaults");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let before = request(&mut stdin, &mut reader, "0", "setup.get", json!({}));
    assert_eq!(error_code(&before), Some("no_workspace"));

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let setup = request_ok(&mut stdin, &mut reader, "2", "setup.get", json!({}));
    assert_eq!(
        setup["session"],
        json!({
            "loginRoute": "/login",
            "userKey": "user",
            "anonymousModeKey": "anonymousOfflineMode"
        })
    );
    assert_eq!(setup["page"], json!({ "reselectResetsScroll": true }));

    for (i, patch) in [
        json!({ "section": "session", "patch": { "loginRoute": "login" } }),
        json!({ "section": "session", "patch": { "userKey": "" } }),
        json!({ "section": "session", "patch": { "userKey": "anonymousOfflineMode" } }),
        json!({ "section": "page", "patch": { "reselectResetsScroll": "yes" } }),
        json!({ "section": "page", "patch": { "theme": "dark" } }),
        json!({ "section": "printer", "patch": {} }),
    ]
    .into_iter()
    .enumerate()
    {
        let resp = request(&mut stdin, &mut reader, &format!("bad-{i}"), "setup.update", patch);
        assert_eq!(error_code(&resp), Some("bad_params"), "{}", resp);
    }

    let setup = request_ok(&mut stdin, &mut reader, "3", "setup.get", json!({}));
    assert_eq!(setup["session"]["loginRoute"], "/login");
}

#[test]
fn custom_login_route_and_keys_drive_the_page() {
    let workspace = temp_dir("handbook-setup-custom");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "setup.update",
        json!({
            "section": "session",
            "patch": { "loginRoute": "/auth/sign-in", "userKey": "currentUser" }
        }),
    );

    let mounted = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "page.mount",
        json!({ "online": true }),
    );
    assert_eq!(
        mounted["effects"],
        json!([{ "kind": "navigate", "to": "/auth/sign-in" }])
    );

    // The old key is no longer consulted.
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "store.set",
        json!({ "key": "user", "value": "{\"department\":\"College\"}" }),
    );
    let still_out = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "page.mount",
        json!({ "online": true }),
    );
    assert_eq!(still_out["view"]["state"], "redirect");

    let login = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "session.login",
        json!({ "user": { "department": "College" } }),
    );
    assert_eq!(login["key"], "currentUser");
    let keys = request_ok(&mut stdin, &mut reader, "7", "store.keys", json!({}));
    assert_eq!(keys["keys"], json!(["currentUser", "user"]));

    let mounted = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "page.mount",
        json!({ "online": true }),
    );
    assert_eq!(mounted["view"]["state"], "content");
}

#[test]
fn reselect_policy_can_turn_off_scroll_reset() {
    let workspace = temp_dir("handbook-setup-reselect");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "setup.update",
        json!({ "section": "page", "patch": { "reselectResetsScroll": false } }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "session.anonymousMode.set",
        json!({ "enabled": true }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "page.mount",
        json!({ "online": false }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "page.scroll",
        json!({ "offset": 450 }),
    );

    let same = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "page.selectSection",
        json!({ "section": 1 }),
    );
    assert_eq!(same["effects"], json!([]));
    assert_eq!(same["view"]["scrollOffset"], 450);
    assert_eq!(same["view"]["scrollResets"], 0);

    let moved = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "page.selectSection",
        json!({ "section": 2 }),
    );
    assert_eq!(moved["effects"], json!([{ "kind": "scrollToTop" }]));
    assert_eq!(moved["view"]["scrollOffset"], 0);
}

#[test]
fn settings_persist_across_processes() {
    let workspace = temp_dir("handbook-setup-persist");
    {
        let (mut child, mut stdin, mut reader) = spawn_sidecar();
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            "1",
            "workspace.select",
            json!({ "path": workspace.to_string_lossy() }),
        );
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            "2",
            "setup.update",
            json!({ "section": "session", "patch": { "loginRoute": "/portal" } }),
        );
        drop(stdin);
        let _ = child.wait();
    }

    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let setup = request_ok(&mut stdin, &mut reader, "2", "setup.get", json!({}));
    assert_eq!(setup["session"]["loginRoute"], "/portal");
}
