//! Transport that answers expressions from a fixture file instead of a live
//! engine.
//!
//! ```toml
//! refuse_port = 5999
//!
//! [[reply]]
//! expr = "2+2"
//! value = '{"Scalar":{"Int64":4}}'
//!
//! [[reply]]
//! expr = "`a+1"
//! error = "type"
//! ```

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::Deserialize;

use qbridge_api::{PluginError, SendMode, StaticValue, Transport, K};

#[derive(Deserialize)]
struct FixtureFile {
    #[serde(default)]
    refuse_port: Option<u16>,
    #[serde(default)]
    reply: Vec<FixtureEntry>,
}

#[derive(Deserialize)]
struct FixtureEntry {
    expr: String,
    /// JSON-encoded `StaticValue`.
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

enum Outcome {
    Value(StaticValue),
    Error(String),
}

pub struct ReplayTransport {
    replies: HashMap<String, Outcome>,
    refuse_port: Option<u16>,
    next_handle: i32,
    open: HashSet<i32>,
    one_way: Vec<String>,
}

impl ReplayTransport {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PluginError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| PluginError::io(format!("fixtures '{}': {e}", path.display())))?;
        Self::parse(&content).map_err(|e| e.with_context(path.display()))
    }

    pub fn parse(content: &str) -> Result<Self, PluginError> {
        let file: FixtureFile =
            toml::from_str(content).map_err(|e| PluginError::config(e.to_string()))?;

        let mut replies = HashMap::with_capacity(file.reply.len());
        for entry in file.reply {
            let outcome = match (entry.value, entry.error) {
                (Some(json), None) => {
                    let value = serde_json::from_str(&json).map_err(|e| {
                        PluginError::config(format!("reply '{}': value: {e}", entry.expr))
                    })?;
                    Outcome::Value(value)
                }
                (None, Some(message)) => Outcome::Error(message),
                _ => {
                    return Err(PluginError::config(format!(
                        "reply '{}': exactly one of `value` and `error` is required",
                        entry.expr
                    )));
                }
            };
            replies.insert(entry.expr, outcome);
        }

        Ok(Self {
            replies,
            refuse_port: file.refuse_port,
            next_handle: 1,
            open: HashSet::new(),
            one_way: Vec::new(),
        })
    }

    /// Expressions received one-way, oldest first.
    pub fn one_way_log(&self) -> &[String] {
        &self.one_way
    }

    fn reply_to(&self, expr: &str) -> Result<K, PluginError> {
        match self.replies.get(expr) {
            Some(Outcome::Value(value)) => qbridge_codec::encode(value)
                .map_err(|e| PluginError::protocol(format!("reply '{expr}': {e}"))),
            Some(Outcome::Error(message)) => Ok(K::error(message.as_str())),
            None => Ok(K::error(format!("{expr}: unknown expression"))),
        }
    }
}

impl Transport for ReplayTransport {
    fn open(&mut self, host: &str, port: u16) -> Result<i32, PluginError> {
        if self.refuse_port == Some(port) {
            tracing::info!(host, port, "replay refusing session");
            return Ok(0);
        }
        let handle = self.next_handle;
        self.next_handle += 1;
        self.open.insert(handle);
        tracing::info!(host, port, handle, "replay session opened");
        Ok(handle)
    }

    fn send(
        &mut self,
        handle: i32,
        expr: &str,
        arg: Option<K>,
        mode: SendMode,
    ) -> Result<Option<K>, PluginError> {
        if !self.open.contains(&handle) {
            return Err(PluginError::session(format!("unknown session handle {handle}")));
        }
        if let Some(arg) = &arg {
            tracing::debug!(handle, expr, arg_type = arg.type_code(), "argument received");
        }
        drop(arg);

        match mode {
            SendMode::Async => {
                self.one_way.push(expr.to_string());
                Ok(None)
            }
            SendMode::Sync => self.reply_to(expr).map(Some),
        }
    }

    fn close(&mut self, handle: i32) -> Result<(), PluginError> {
        if !self.open.remove(&handle) {
            return Err(PluginError::session(format!("unknown session handle {handle}")));
        }
        tracing::info!(handle, "replay session closed");
        Ok(())
    }
}

// ---- plugin exports ----

/// JSON config handed over by the host.
#[derive(Deserialize)]
struct ReplayConfig {
    fixtures: String,
}

fn create(config: ReplayConfig) -> Result<ReplayTransport, PluginError> {
    tracing::debug!(fixtures = %config.fixtures, "creating replay transport");
    ReplayTransport::from_file(&config.fixtures)
}

qbridge_api::export_transport!(ReplayConfig, create);
