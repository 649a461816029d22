//! Compile-time backend selection.
//!
//! The CPU `NdArray` backend is the default. Building with the `wgpu`
//! feature moves training and inference onto the GPU. Training always
//! wraps the inner backend in `Autodiff`; validation and inference run on
//! the inner backend directly.

#[cfg(not(feature = "wgpu"))]
pub type InnerBackend = burn::backend::NdArray;

#[cfg(feature = "wgpu")]
pub type InnerBackend = burn::backend::Wgpu;

pub type TrainBackend = burn::backend::Autodiff<InnerBackend>;

pub type Device = <InnerBackend as burn::tensor::backend::Backend>::Device;

pub fn default_device() -> Device {
    Device::default()
}

/// Name of the active backend, for logs.
pub fn backend_name() -> &'static str {
    if cfg!(feature = "wgpu") {
        "wgpu"
    } else {
        "ndarray"
    }
}
