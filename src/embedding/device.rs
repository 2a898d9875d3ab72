use candle_core::Device;
use tracing::{debug, warn};
#[cfg(any(feature = "metal", feature = "cuda"))]
use tracing::info;

use super::error::EmbeddingError;

/// Picks the compute device for both models.
///
/// GPU backends are tried in feature order (Metal, then CUDA); any failure falls
/// back to CPU. Both models call this once at load time, so they always agree.
pub fn select_device() -> Result<Device, EmbeddingError> {
    #[cfg_attr(not(any(feature = "metal", feature = "cuda")), allow(unused_mut))]
    let mut failures: Vec<String> = Vec::new();

    #[cfg(feature = "metal")]
    match Device::new_metal(0) {
        Ok(device) => {
            info!(backend = "metal", "Inference device selected");
            return Ok(device);
        }
        Err(e) => failures.push(format!("metal: {e}")),
    }

    #[cfg(feature = "cuda")]
    match Device::new_cuda(0) {
        Ok(device) => {
            info!(backend = "cuda", "Inference device selected");
            return Ok(device);
        }
        Err(e) => failures.push(format!("cuda: {e}")),
    }

    if failures.is_empty() {
        debug!(backend = "cpu", "No GPU backend compiled, using CPU");
    } else {
        warn!(failures = %failures.join("; "), "GPU unavailable, falling back to CPU");
    }

    Ok(Device::Cpu)
}

/// Short backend name for logs and readiness output.
pub fn device_label(device: &Device) -> &'static str {
    match device {
        Device::Cpu => "cpu",
        Device::Cuda(_) => "cuda",
        Device::Metal(_) => "metal",
    }
}
