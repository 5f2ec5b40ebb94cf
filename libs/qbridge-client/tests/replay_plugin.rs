//! Sessions driven through the replay transport loaded as a shared library.

use std::env::consts::{DLL_PREFIX, DLL_SUFFIX};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;

use qbridge_api::{BridgeError, ErrorKind, Scalar, StaticValue, Table, VectorData};
use qbridge_client::{connect, PluginTransport};
use transport_replay::ReplayTransport;

const FIXTURES: &str = r#"
    refuse_port = 5999

    [[reply]]
    expr = "2+2"
    value = '{"Scalar":{"Int64":4}}'

    [[reply]]
    expr = ".u.upd"
    value = '"Unit"'

    [[reply]]
    expr = "`a+1"
    error = "type"
"#;

fn find_library(dir: &Path) -> Option<PathBuf> {
    let prefix = format!("{DLL_PREFIX}transport_replay");
    std::fs::read_dir(dir)
        .ok()?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .find(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(&prefix) && name.ends_with(DLL_SUFFIX))
        })
}

/// The cdylib cargo built next to this test, or a fresh build of it.
fn replay_library() -> &'static Path {
    static LIBRARY: OnceLock<PathBuf> = OnceLock::new();
    LIBRARY.get_or_init(|| {
        let exe = std::env::current_exe().unwrap();
        let deps = exe.parent().unwrap();
        let profile = deps.parent().unwrap();
        if let Some(found) = find_library(deps).or_else(|| find_library(profile)) {
            return found;
        }

        // Separate target dir: the outer build still holds the lock on ours.
        let target = Path::new(env!("CARGO_TARGET_TMPDIR")).join("replay-plugin");
        let status = Command::new(env!("CARGO"))
            .args(["build", "-p", "transport-replay", "--target-dir"])
            .arg(&target)
            .current_dir(env!("CARGO_MANIFEST_DIR"))
            .status()
            .unwrap();
        assert!(status.success(), "building transport-replay failed");
        find_library(&target.join("debug")).expect("transport-replay cdylib after build")
    })
}

fn fixtures() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(FIXTURES.as_bytes()).unwrap();
    file
}

fn load(fixtures: &Path) -> Result<PluginTransport, BridgeError> {
    let config = serde_json::json!({ "fixtures": fixtures }).to_string();
    PluginTransport::load(replay_library().to_str().unwrap(), &config)
}

fn trades() -> StaticValue {
    Table::new(
        ["sym", "size"],
        vec![StaticValue::symbols(["ibm", "msft"]), VectorData::Int64(vec![100, 200]).into()],
    )
    .into()
}

#[test]
fn session_through_the_loaded_library() {
    let file = fixtures();
    let mut conn = connect(load(file.path()).unwrap(), "localhost", 5001).unwrap();
    assert!(conn.handle() > 0);

    assert_eq!(conn.evaluate("2+2").unwrap(), StaticValue::Scalar(Scalar::Int64(4)));
    assert_eq!(conn.remote_call(".u.upd", &trades()).unwrap(), StaticValue::Unit);
    assert_eq!(conn.evaluate("`a+1").unwrap_err().remote_message(), Some("type"));
    conn.evaluate_async("upd[`t;()]").unwrap();
    conn.remote_call_async(".u.upd", &trades()).unwrap();

    conn.close().unwrap();
    assert!(!conn.is_open());
}

#[test]
fn unknown_expression_comes_back_as_a_remote_error() {
    let file = fixtures();
    let mut conn = connect(load(file.path()).unwrap(), "localhost", 5001).unwrap();
    let err = conn.evaluate("til 3").unwrap_err();
    assert_eq!(err.remote_message(), Some("til 3: unknown expression"));
}

#[test]
fn refused_session_is_a_connection_failure() {
    let file = fixtures();
    let err = connect(load(file.path()).unwrap(), "localhost", 5999).err().unwrap();
    assert!(matches!(err, BridgeError::ConnectionFailure(ref m) if m.contains("localhost:5999")));
}

#[test]
fn creation_errors_keep_their_kind_across_the_boundary() {
    match load(Path::new("/nonexistent/replies.toml")) {
        Err(BridgeError::Plugin(e)) => {
            assert_eq!(e.kind(), ErrorKind::Io);
            assert!(e.message().contains("/nonexistent/replies.toml"));
        }
        other => panic!("unexpected result: {:?}", other.err()),
    }

    let no_fixtures = PluginTransport::load(replay_library().to_str().unwrap(), "{}");
    match no_fixtures {
        Err(BridgeError::Plugin(e)) => assert_eq!(e.kind(), ErrorKind::Config),
        other => panic!("unexpected result: {:?}", other.err()),
    }
}

#[test]
fn loaded_and_linked_transports_agree() {
    let file = fixtures();
    let mut loaded = connect(load(file.path()).unwrap(), "localhost", 5001).unwrap();
    let mut linked =
        connect(ReplayTransport::parse(FIXTURES).unwrap(), "localhost", 5001).unwrap();

    for expr in ["2+2", ".u.upd"] {
        assert_eq!(loaded.evaluate(expr).unwrap(), linked.evaluate(expr).unwrap());
    }
}
