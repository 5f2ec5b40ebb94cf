use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use qbridge_api::{
    BridgeError, ErrorKind, Kind, PluginError, Scalar, SendMode, StaticValue, Table, Transport,
    VectorData, K,
};
use qbridge_client::connect;
use qbridge_codec::decode;

#[derive(Default)]
struct Script {
    handle: i32,
    replies: HashMap<String, K>,
    sent: Vec<(String, Option<K>, SendMode)>,
    closed: Vec<i32>,
    fail_sends: bool,
}

/// In-process engine stand-in. State is shared so the test can inspect it
/// after the connection has taken the transport.
#[derive(Clone)]
struct Scripted(Arc<Mutex<Script>>);

impl Scripted {
    fn new(handle: i32) -> Self {
        Scripted(Arc::new(Mutex::new(Script { handle, ..Script::default() })))
    }

    fn reply(self, expr: &str, k: K) -> Self {
        self.0.lock().unwrap().replies.insert(expr.to_string(), k);
        self
    }

    fn script(&self) -> std::sync::MutexGuard<'_, Script> {
        self.0.lock().unwrap()
    }
}

impl Transport for Scripted {
    fn open(&mut self, _host: &str, _port: u16) -> Result<i32, PluginError> {
        Ok(self.script().handle)
    }

    fn send(
        &mut self,
        handle: i32,
        expr: &str,
        arg: Option<K>,
        mode: SendMode,
    ) -> Result<Option<K>, PluginError> {
        let mut s = self.script();
        assert_eq!(handle, s.handle);
        if s.fail_sends {
            return Err(PluginError::io("connection reset by peer"));
        }
        s.sent.push((expr.to_string(), arg, mode));
        Ok(match mode {
            SendMode::Sync => s.replies.get(expr).cloned(),
            SendMode::Async => None,
        })
    }

    fn close(&mut self, handle: i32) -> Result<(), PluginError> {
        self.script().closed.push(handle);
        Ok(())
    }
}

fn trade_table() -> StaticValue {
    Table::new(
        ["sym", "price"],
        vec![
            StaticValue::symbols(["ibm", "msft"]),
            VectorData::Float64(vec![101.5, 250.25]).into(),
        ],
    )
    .into()
}

#[test]
fn evaluate_returns_the_decoded_reply() {
    let t = Scripted::new(3).reply("2+2", K::long(4));
    let mut conn = connect(t, "localhost", 5001).unwrap();
    assert_eq!(conn.handle(), 3);
    assert_eq!(conn.evaluate("2+2").unwrap(), StaticValue::Scalar(Scalar::Int64(4)));
}

#[test]
fn reply_handle_is_released_after_decode() {
    let reply = K::list(vec![K::long(1), K::long(2)]);
    let held = reply.clone();
    let t = Scripted::new(1).reply("x", reply);
    let mut conn = connect(t, "localhost", 5001).unwrap();

    // ours + the script's copy
    assert_eq!(held.ref_count(), 2);
    conn.evaluate("x").unwrap();
    assert_eq!(held.ref_count(), 2);
}

#[test]
fn reply_handle_is_released_when_decode_fails() {
    let reply = K::list(vec![K::long(1), K::error("type")]);
    let held = reply.clone();
    let t = Scripted::new(1).reply("f[]", reply);
    let mut conn = connect(t, "localhost", 5001).unwrap();

    let err = conn.evaluate("f[]").unwrap_err();
    assert_eq!(err.remote_message(), Some("type"));
    assert_eq!(held.ref_count(), 2);
}

#[test]
fn remote_call_hands_the_argument_to_the_transport() {
    let t = Scripted::new(1).reply(".u.upd", K::unit());
    let script = t.clone();
    let mut conn = connect(t, "localhost", 5001).unwrap();

    let table = trade_table();
    assert_eq!(conn.remote_call(".u.upd", &table).unwrap(), StaticValue::Unit);

    let s = script.script();
    let (expr, arg, mode) = &s.sent[0];
    assert_eq!(expr, ".u.upd");
    assert_eq!(*mode, SendMode::Sync);
    let arg = arg.as_ref().unwrap();
    assert_eq!(arg.ref_count(), 1);
    assert_eq!(decode(arg).unwrap(), table);
}

#[test]
fn async_sends_read_no_reply() {
    let t = Scripted::new(1);
    let script = t.clone();
    let mut conn = connect(t, "localhost", 5001).unwrap();

    conn.evaluate_async("upd[`t;()]").unwrap();
    conn.remote_call_async(".u.upd", &trade_table()).unwrap();

    let s = script.script();
    assert_eq!(s.sent.len(), 2);
    assert!(s.sent.iter().all(|(_, _, mode)| *mode == SendMode::Async));
    assert!(s.sent[0].1.is_none());
    assert!(s.sent[1].1.is_some());
}

#[test]
fn missing_sync_reply_is_a_connection_failure() {
    let mut conn = connect(Scripted::new(1), "localhost", 5001).unwrap();
    assert!(matches!(conn.evaluate("nothing"), Err(BridgeError::ConnectionFailure(_))));
}

#[test]
fn non_positive_handle_is_a_connection_failure() {
    for handle in [0, -1] {
        let err = connect(Scripted::new(handle), "kdb1", 5002).err().expect("connect must fail");
        match err {
            BridgeError::ConnectionFailure(msg) => assert!(msg.contains("kdb1:5002")),
            other => panic!("unexpected error: {other}"),
        }
    }
}

#[test]
fn transport_errors_during_a_call_keep_their_kind() {
    let t = Scripted::new(1);
    t.script().fail_sends = true;
    let mut conn = connect(t, "localhost", 5001).unwrap();
    match conn.evaluate("1") {
        Err(BridgeError::Plugin(e)) => assert_eq!(e.kind(), ErrorKind::Io),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn close_is_idempotent_and_drop_does_not_close_twice() {
    let t = Scripted::new(7);
    let script = t.clone();
    let mut conn = connect(t, "localhost", 5001).unwrap();

    conn.close().unwrap();
    conn.close().unwrap();
    assert!(!conn.is_open());
    assert!(matches!(conn.evaluate("1"), Err(BridgeError::ConnectionFailure(_))));
    drop(conn);

    assert_eq!(script.script().closed, [7]);
}

#[test]
fn drop_closes_an_open_session() {
    let t = Scripted::new(9);
    let script = t.clone();
    drop(connect(t, "localhost", 5001).unwrap());
    assert_eq!(script.script().closed, [9]);
}

#[test]
fn connection_can_be_shared_behind_a_mutex() {
    let til3 = bytemuck::cast_slice::<i64, u8>(&[0, 1, 2]).to_vec();
    let t = Scripted::new(1).reply("til 3", K::vector_from_bytes(Kind::Int64, til3).unwrap());
    let conn = Arc::new(Mutex::new(connect(t, "localhost", 5001).unwrap()));
    let worker = {
        let conn = Arc::clone(&conn);
        std::thread::spawn(move || conn.lock().unwrap().evaluate("til 3").unwrap())
    };
    assert_eq!(worker.join().unwrap(), StaticValue::from(VectorData::Int64(vec![0, 1, 2])));
}
