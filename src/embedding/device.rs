use candle_core::{DType, Device};
use tracing::{debug, warn};

#[cfg(any(feature = "metal", feature = "cuda"))]
use tracing::info;

/// Where and in which precision the encoder runs.
#[derive(Debug, Clone)]
pub struct ComputeTarget {
    pub device: Device,
    /// Weight/activation dtype used for the forward pass.
    pub dtype: DType,
    /// Half precision was requested but the device computes in F32; outputs are
    /// rounded through f16 instead.
    pub round_outputs_to_f16: bool,
}

impl ComputeTarget {
    /// Resolves the precision for `device` given the half-precision hint.
    pub fn for_device(device: Device, use_fp16: bool) -> Self {
        let gpu = !matches!(device, Device::Cpu);
        let (dtype, round_outputs_to_f16) = match (use_fp16, gpu) {
            (true, true) => (DType::F16, false),
            (true, false) => (DType::F32, true),
            (false, _) => (DType::F32, false),
        };

        if use_fp16 && !gpu {
            debug!("fp16 requested on CPU; computing in F32 and rounding outputs");
        }

        Self {
            device,
            dtype,
            round_outputs_to_f16,
        }
    }
}

/// Selects the compute device based on enabled features (falls back to CPU).
pub fn select_device() -> Device {
    #[cfg(any(feature = "metal", feature = "cuda"))]
    let mut failures: Vec<String> = Vec::new();

    #[cfg(not(any(feature = "metal", feature = "cuda")))]
    let failures: Vec<String> = Vec::new();

    #[cfg(feature = "metal")]
    {
        match Device::new_metal(0) {
            Ok(device) => {
                info!("Using Metal GPU acceleration");
                return device;
            }
            Err(e) => {
                warn!(error = %e, "Metal device unavailable");
                failures.push(format!("metal: {e}"));
            }
        }
    }

    #[cfg(feature = "cuda")]
    {
        match Device::new_cuda(0) {
            Ok(device) => {
                info!("Using CUDA GPU acceleration");
                return device;
            }
            Err(e) => {
                warn!(error = %e, "CUDA device unavailable");
                failures.push(format!("cuda: {e}"));
            }
        }
    }

    let reason = if failures.is_empty() {
        "no GPU backend compiled".to_string()
    } else {
        failures.join("; ")
    };

    warn!(reason = %reason, "Falling back to CPU device");
    Device::Cpu
}
