use std::fs;
use std::io::Read;
use std::net::TcpListener;
use std::path::Path;
use std::thread;
use std::time::Duration;

use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;
use tempfile::tempdir;
use tiny_http::{Response, Server, StatusCode};

const MAP: &str = r#"{"version":3,"sources":["../src/app.js"],"names":[],"mappings":"AAAA"}"#;

fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("mkdir");
    }
    fs::write(path, content).expect("write");
}

fn create_project(root: &Path) {
    write_file(&root.join("src/app.js"), "console.log('app')\n");
    write_file(&root.join("dist/app.js.map"), MAP);
    write_file(&root.join("dist/app.js"), "console.log('app')");
}

struct TestService {
    base_url: String,
    handle: thread::JoinHandle<Vec<(String, String)>>,
}

impl TestService {
    /// URLs and bodies of the requests received.
    fn join(self) -> Vec<(String, String)> {
        self.handle.join().expect("join server")
    }
}

fn spawn_service(statuses: Vec<u16>) -> TestService {
    let server = Server::http("127.0.0.1:0").expect("server");
    let base_url = format!("http://{}", server.server_addr());
    let handle = thread::spawn(move || {
        let mut seen = Vec::new();
        for status in statuses {
            let mut req = match server.recv_timeout(Duration::from_secs(5)) {
                Ok(Some(req)) => req,
                _ => break,
            };
            let mut body = String::new();
            req.as_reader().read_to_string(&mut body).expect("body");
            seen.push((req.url().to_string(), body));
            let resp = Response::from_string("").with_status_code(StatusCode(status));
            req.respond(resp).expect("respond");
        }
        seen
    });
    TestService { base_url, handle }
}

fn mapship() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("mapship"));
    cmd.env_remove("MAPSHIP_RETRY_INTERVAL_MS")
        .env_remove("MAPSHIP_TIMEOUT_MS");
    cmd
}

#[test]
fn help_lists_subcommands() {
    mapship()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("upload-browser"))
        .stdout(contains("upload-node"))
        .stdout(contains("upload-react-native"));
}

#[test]
fn api_key_is_required() {
    mapship()
        .args(["upload-node", "--directory", "dist"])
        .assert()
        .failure()
        .stderr(contains("--api-key"));
}

#[test]
fn browser_upload_succeeds() {
    let td = tempdir().expect("tempdir");
    create_project(td.path());
    let service = spawn_service(vec![200]);

    mapship()
        .args(["upload-browser", "--api-key", "KEY", "--app-version", "1.0.0"])
        .args(["--source-map", "dist/app.js.map", "--bundle", "dist/app.js"])
        .args(["--bundle-url", "https://example.com/app.js"])
        .arg("--project-root")
        .arg(td.path())
        .args(["--endpoint", &service.base_url])
        .assert()
        .success()
        .stderr(contains("[info] Preparing upload of browser source map"))
        .stderr(contains("[success] Success, uploaded dist/app.js.map and dist/app.js"));

    let requests = service.join();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].0, "/sourcemap");
    assert!(requests[0].1.contains(r#""sources":["src/app.js"]"#));
}

#[test]
fn invalid_api_key_is_explained_once() {
    let td = tempdir().expect("tempdir");
    create_project(td.path());
    let service = spawn_service(vec![401]);

    mapship()
        .args(["upload-node", "--api-key", "WRONG"])
        .args(["--source-map", "dist/app.js.map", "--bundle", "dist/app.js"])
        .arg("--project-root")
        .arg(td.path())
        .args(["--endpoint", &service.base_url])
        .assert()
        .failure()
        .stderr(contains("[error] The provided API key was invalid."))
        .stderr(contains("Error:").not());

    assert_eq!(service.join().len(), 1);
}

#[test]
fn config_file_supplies_endpoint_and_retry_policy() {
    let td = tempdir().expect("tempdir");
    create_project(td.path());
    let service = spawn_service(vec![500, 200]);
    write_file(
        &td.path().join(".mapship.toml"),
        &format!(
            "[upload]\nendpoint = \"{}\"\n\n[retry]\nmax_attempts = 2\ninterval = \"10ms\"\n",
            service.base_url
        ),
    );

    mapship()
        .args(["upload-node", "--api-key", "KEY", "--directory", "dist"])
        .arg("--project-root")
        .arg(td.path())
        .assert()
        .success()
        .stderr(contains("[info] 1 of 1"));

    assert_eq!(service.join().len(), 2);
}

#[test]
fn batch_without_maps_is_not_an_error() {
    let td = tempdir().expect("tempdir");
    fs::create_dir_all(td.path().join("dist")).expect("mkdir");

    mapship()
        .args(["upload-browser", "--api-key", "KEY"])
        .args(["--directory", "dist", "--base-url", "https://cdn.example.com"])
        .arg("--project-root")
        .arg(td.path())
        .args(["--endpoint", "http://127.0.0.1:9"])
        .assert()
        .success()
        .stderr(contains("[warn] No source maps found."));
}

#[test]
fn quiet_hides_progress_but_keeps_success() {
    let td = tempdir().expect("tempdir");
    create_project(td.path());
    let service = spawn_service(vec![200]);

    mapship()
        .args(["upload-browser", "--api-key", "KEY", "--quiet"])
        .args(["--source-map", "dist/app.js.map"])
        .args(["--bundle-url", "https://example.com/app.js"])
        .arg("--project-root")
        .arg(td.path())
        .args(["--endpoint", &service.base_url])
        .assert()
        .success()
        .stderr(contains("[info]").not())
        .stderr(contains("[success] Success, uploaded dist/app.js.map"));

    service.join();
}

#[test]
fn conflicting_versions_are_rejected() {
    let td = tempdir().expect("tempdir");

    mapship()
        .args(["upload-browser", "--api-key", "KEY"])
        .args(["--app-version", "1.0.0", "--code-bundle-id", "abc"])
        .args(["--source-map", "dist/app.js.map"])
        .args(["--bundle-url", "https://example.com/app.js"])
        .arg("--project-root")
        .arg(td.path())
        .assert()
        .failure()
        .stderr(contains(
            "[error] --app-version and --code-bundle-id cannot both be given",
        ));
}

#[test]
fn react_native_fetch_reports_unreachable_bundler() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let bundler = format!("http://{}", listener.local_addr().expect("addr"));
    drop(listener);
    let td = tempdir().expect("tempdir");

    mapship()
        .args(["upload-react-native", "--api-key", "KEY", "--platform", "android"])
        .args(["--app-version", "3.0.0", "--fetch", "--bundler-url", &bundler])
        .arg("--project-root")
        .arg(td.path())
        .args(["--endpoint", "http://127.0.0.1:9"])
        .assert()
        .failure()
        .stderr(contains(format!(
            "Unable to connect to {bundler}. Is the server running?"
        )));
}

#[test]
fn invalid_duration_flag_is_reported() {
    mapship()
        .args(["upload-node", "--api-key", "KEY", "--directory", "dist"])
        .args(["--timeout", "soon"])
        .assert()
        .failure()
        .stderr(contains("invalid duration: soon"));
}
