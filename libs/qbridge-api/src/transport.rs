use qbridge_kobj::K;

use crate::error::PluginError;

/// How a request is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendMode {
    /// Block until the engine replies.
    Sync,
    /// One-way: the transport returns as soon as the request is written.
    Async,
}

/// Engine session transport.
///
/// The wire protocol behind it is opaque to this crate. A transport is used
/// by one caller at a time; it has no multiplexing of in-flight requests.
pub trait Transport: Send {
    /// Open a session and return the transport's handle for it. Only
    /// positive handles denote an open session.
    fn open(&mut self, host: &str, port: u16) -> Result<i32, PluginError>;

    /// Send `expr`, with an optional argument, on an open session.
    ///
    /// The argument is moved into the transport, which releases it once
    /// written. `SendMode::Sync` returns `Some(reply)`; `SendMode::Async`
    /// returns `None`.
    fn send(
        &mut self,
        handle: i32,
        expr: &str,
        arg: Option<K>,
        mode: SendMode,
    ) -> Result<Option<K>, PluginError>;

    fn close(&mut self, handle: i32) -> Result<(), PluginError>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn open(&mut self, host: &str, port: u16) -> Result<i32, PluginError> {
        (**self).open(host, port)
    }

    fn send(
        &mut self,
        handle: i32,
        expr: &str,
        arg: Option<K>,
        mode: SendMode,
    ) -> Result<Option<K>, PluginError> {
        (**self).send(handle, expr, arg, mode)
    }

    fn close(&mut self, handle: i32) -> Result<(), PluginError> {
        (**self).close(handle)
    }
}
