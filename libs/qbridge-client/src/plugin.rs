use libloading::Library;

use qbridge_api::{
    AbiVersionFn, BridgeError, CreateTransportFn, DestroyTransportFn, PluginError, SendMode,
    Transport, K, QB_ABI_VERSION,
};

/// Transport created by a dynamically loaded plugin library.
///
/// The transport is handed back to the library's `qb_destroy_transport`
/// before the library is unloaded.
pub struct PluginTransport {
    inner: Option<Box<dyn Transport>>,
    destroy: DestroyTransportFn,
    // Last field: dropped after `Drop::drop` has released `inner`.
    _lib: Library,
}

/// Copy an exported function pointer out of `lib`.
fn lookup<F: Copy>(lib: &Library, path: &str, name: &str) -> Result<F, BridgeError> {
    let symbol = unsafe { lib.get::<F>(name.as_bytes()) }
        .map_err(|e| BridgeError::Config(format!("{path}: missing export `{name}`: {e}")))?;
    Ok(*symbol)
}

impl PluginTransport {
    /// Load the library at `path` and create its transport from
    /// `config_json`.
    ///
    /// Loading problems are `Config` errors; an error raised by the plugin
    /// while creating the transport keeps its own kind.
    pub fn load(path: &str, config_json: &str) -> Result<Self, BridgeError> {
        let lib = unsafe { Library::new(path) }
            .map_err(|e| BridgeError::Config(format!("{path}: {e}")))?;

        let abi_version: AbiVersionFn = lookup(&lib, path, "qb_abi_version")?;
        let found = unsafe { abi_version() };
        if found != QB_ABI_VERSION {
            return Err(BridgeError::Config(format!(
                "{path}: plugin ABI {found}, this build speaks {QB_ABI_VERSION}"
            )));
        }
        let create: CreateTransportFn = lookup(&lib, path, "qb_create_transport")?;
        let destroy: DestroyTransportFn = lookup(&lib, path, "qb_destroy_transport")?;

        let created = unsafe { create(config_json.as_ptr(), config_json.len()) };
        let inner = unsafe { created.into_result() }.map_err(|e| e.with_context(path))?;
        tracing::debug!(plugin = path, "transport plugin loaded");
        Ok(PluginTransport { inner: Some(inner), destroy, _lib: lib })
    }

    fn transport(&mut self) -> Result<&mut (dyn Transport + 'static), PluginError> {
        self.inner
            .as_deref_mut()
            .ok_or_else(|| PluginError::session("plugin transport already released"))
    }
}

impl Transport for PluginTransport {
    fn open(&mut self, host: &str, port: u16) -> Result<i32, PluginError> {
        self.transport()?.open(host, port)
    }

    fn send(
        &mut self,
        handle: i32,
        expr: &str,
        arg: Option<K>,
        mode: SendMode,
    ) -> Result<Option<K>, PluginError> {
        self.transport()?.send(handle, expr, arg, mode)
    }

    fn close(&mut self, handle: i32) -> Result<(), PluginError> {
        self.transport()?.close(handle)
    }
}

impl Drop for PluginTransport {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.take() {
            unsafe { (self.destroy)(qbridge_api::ffi::into_raw_transport(inner)) };
            tracing::debug!("transport plugin released");
        }
    }
}
