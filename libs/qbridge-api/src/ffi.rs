//! C ABI between the host and a transport plugin library.
//!
//! A plugin exports `qb_abi_version`, `qb_create_transport` and
//! `qb_destroy_transport`, all generated by [`export_transport!`]. Host and
//! plugin are built by the same compiler in one workspace, so the Rust layout
//! of `Box<dyn Transport>` and `PluginError` agrees on both sides.

use std::ptr;

use serde::de::DeserializeOwned;

use crate::{PluginError, Transport};

/// Bump whenever `Transport`, `K`, `CreatedTransport` or the exported
/// signatures change in a binary-incompatible way.
pub const QB_ABI_VERSION: u32 = 1;

pub type AbiVersionFn = unsafe extern "C" fn() -> u32;

pub type CreateTransportFn =
    unsafe extern "C" fn(config_ptr: *const u8, config_len: usize) -> CreatedTransport;

pub type DestroyTransportFn = unsafe extern "C" fn(transport: *mut ());

/// What `qb_create_transport` hands back: exactly one pointer is set.
///
/// `transport` points to a `Box<Box<dyn Transport>>` (the outer box makes the
/// pointer thin), `error` to a `Box<PluginError>`.
#[repr(C)]
pub struct CreatedTransport {
    transport: *mut (),
    error: *mut (),
}

impl CreatedTransport {
    pub fn new(result: Result<Box<dyn Transport>, PluginError>) -> Self {
        match result {
            Ok(transport) => CreatedTransport {
                transport: Box::into_raw(Box::new(transport)) as *mut (),
                error: ptr::null_mut(),
            },
            Err(error) => CreatedTransport {
                transport: ptr::null_mut(),
                error: Box::into_raw(Box::new(error)) as *mut (),
            },
        }
    }

    /// Take ownership of whichever side was set.
    ///
    /// The returned transport must be released with the library's
    /// `qb_destroy_transport` while the library is still loaded.
    ///
    /// # Safety
    /// `self` must come from [`CreatedTransport::new`] in a library built
    /// against this crate, and is consumed once.
    pub unsafe fn into_result(self) -> Result<Box<dyn Transport>, PluginError> {
        if !self.error.is_null() {
            let error = unsafe { Box::from_raw(self.error as *mut PluginError) };
            return Err(*error);
        }
        if self.transport.is_null() {
            return Err(PluginError::protocol("plugin returned neither a transport nor an error"));
        }
        let transport = unsafe { Box::from_raw(self.transport as *mut Box<dyn Transport>) };
        Ok(*transport)
    }
}

/// Hand a transport back to the library that created it, as the argument of
/// its `qb_destroy_transport`.
pub fn into_raw_transport(transport: Box<dyn Transport>) -> *mut () {
    Box::into_raw(Box::new(transport)) as *mut ()
}

/// Body of `qb_destroy_transport`.
///
/// # Safety
/// `transport` is null or came from [`into_raw_transport`] and has not been
/// released before.
pub unsafe fn destroy_transport(transport: *mut ()) {
    if transport.is_null() {
        return;
    }
    drop(unsafe { Box::from_raw(transport as *mut Box<dyn Transport>) });
}

/// Decode the JSON transport config passed to `qb_create_transport`.
///
/// # Safety
/// `config_ptr` must point to `config_len` readable bytes.
pub unsafe fn transport_config<T: DeserializeOwned>(
    config_ptr: *const u8,
    config_len: usize,
) -> Result<T, PluginError> {
    if config_ptr.is_null() {
        return Err(PluginError::config("missing transport config"));
    }
    let bytes = unsafe { std::slice::from_raw_parts(config_ptr, config_len) };
    serde_json::from_slice(bytes)
        .map_err(|e| PluginError::config(format!("transport config: {e}")))
}

/// Export a transport plugin from the crate root.
///
/// `$config` is the deserialized config type, `$build` a
/// `fn($config) -> Result<impl Transport + 'static, PluginError>`.
///
/// ```ignore
/// qbridge_api::export_transport!(ReplayConfig, ReplayTransport::build);
/// ```
#[macro_export]
macro_rules! export_transport {
    ($config:ty, $build:path) => {
        #[unsafe(no_mangle)]
        pub extern "C" fn qb_abi_version() -> u32 {
            $crate::QB_ABI_VERSION
        }

        /// # Safety
        /// `config_ptr` must point to `config_len` readable bytes.
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn qb_create_transport(
            config_ptr: *const u8,
            config_len: usize,
        ) -> $crate::CreatedTransport {
            let config = unsafe { $crate::ffi::transport_config::<$config>(config_ptr, config_len) };
            let result = config
                .and_then($build)
                .map(|t| ::std::boxed::Box::new(t) as ::std::boxed::Box<dyn $crate::Transport>);
            $crate::CreatedTransport::new(result)
        }

        /// # Safety
        /// `transport` must come from this library's `qb_create_transport`.
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn qb_destroy_transport(transport: *mut ()) {
            unsafe { $crate::ffi::destroy_transport(transport) }
        }
    };
}
