use qbridge_api::{BridgeError, SendMode, StaticValue, Transport, K};
use qbridge_codec::{decode, encode};

/// An open engine session.
///
/// Calls take `&mut self`: one caller at a time. To share a connection
/// across threads, wrap it in a `Mutex`. The session is closed by `close()`
/// or, failing that, when the connection is dropped.
pub struct Connection {
    transport: Box<dyn Transport>,
    handle: i32,
    host: String,
    port: u16,
    open: bool,
}

/// Open a session on `host:port` through `transport`.
///
/// A handle that is not positive, or a transport error, is a
/// `ConnectionFailure`.
pub fn connect(
    transport: impl Transport + 'static,
    host: &str,
    port: u16,
) -> Result<Connection, BridgeError> {
    let mut transport: Box<dyn Transport> = Box::new(transport);
    let handle = transport.open(host, port).map_err(|e| {
        BridgeError::ConnectionFailure(format!("{host}:{port}: {e}"))
    })?;
    if handle <= 0 {
        tracing::warn!(host, port, handle, "engine refused the session");
        return Err(BridgeError::ConnectionFailure(format!(
            "{host}:{port}: invalid session handle {handle}"
        )));
    }
    tracing::info!(host, port, handle, "connected");
    Ok(Connection { transport, handle, host: host.to_string(), port, open: true })
}

impl Connection {
    pub fn handle(&self) -> i32 {
        self.handle
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Send `expr` one-way. No reply is read.
    pub fn evaluate_async(&mut self, expr: &str) -> Result<(), BridgeError> {
        self.send(expr, None, SendMode::Async)?;
        Ok(())
    }

    /// Evaluate `expr` and return the decoded reply.
    pub fn evaluate(&mut self, expr: &str) -> Result<StaticValue, BridgeError> {
        let reply = self.request(expr, None)?;
        decode_reply(reply)
    }

    /// Call `expr` with `arg` one-way. The encoded argument goes to the
    /// transport, which releases it.
    pub fn remote_call_async(&mut self, expr: &str, arg: &StaticValue) -> Result<(), BridgeError> {
        let arg = encode(arg)?;
        self.send(expr, Some(arg), SendMode::Async)?;
        Ok(())
    }

    /// Call `expr` with `arg` and return the decoded reply.
    pub fn remote_call(&mut self, expr: &str, arg: &StaticValue) -> Result<StaticValue, BridgeError> {
        let arg = encode(arg)?;
        let reply = self.request(expr, Some(arg))?;
        decode_reply(reply)
    }

    /// Close the session. Closing twice is a no-op.
    pub fn close(&mut self) -> Result<(), BridgeError> {
        if !self.open {
            return Ok(());
        }
        self.open = false;
        self.transport.close(self.handle)?;
        tracing::info!(host = %self.host, port = self.port, handle = self.handle, "disconnected");
        Ok(())
    }

    fn request(&mut self, expr: &str, arg: Option<K>) -> Result<K, BridgeError> {
        self.send(expr, arg, SendMode::Sync)?.ok_or_else(|| {
            BridgeError::ConnectionFailure(format!(
                "{}:{}: no reply to synchronous request",
                self.host, self.port
            ))
        })
    }

    fn send(&mut self, expr: &str, arg: Option<K>, mode: SendMode) -> Result<Option<K>, BridgeError> {
        if !self.open {
            return Err(BridgeError::ConnectionFailure(format!(
                "{}:{}: connection is closed",
                self.host, self.port
            )));
        }
        tracing::debug!(handle = self.handle, expr, ?mode, with_arg = arg.is_some(), "send");
        self.transport.send(self.handle, expr, arg, mode).map_err(|e| {
            tracing::warn!(handle = self.handle, expr, error = %e, "send failed");
            BridgeError::from(e)
        })
    }
}

/// Decode a reply and release it, whether or not decoding succeeded.
fn decode_reply(reply: K) -> Result<StaticValue, BridgeError> {
    let result = decode(&reply);
    drop(reply);
    result
}

impl Drop for Connection {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!(host = %self.host, port = self.port, error = %e, "close on drop failed");
        }
    }
}
