//! Maps `Box<dyn Error>` from trait boundaries to typed `TrainerError`.
//!
//! The traits in `trainer_traits` use `Box<dyn Error + Send + Sync>` so any
//! transport can plug in; this module converts those to our typed error enum,
//! with an optional feature-gated path for `trainer_hardware::HwError`.

use crate::error::TrainerError;

/// Map a trait-boundary error to a typed `TrainerError`.
///
/// Attempts to downcast known transport error types first, then falls back
/// to string-based heuristics.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> TrainerError {
    #[cfg(feature = "hardware-errors")]
    {
        use trainer_hardware::error::HwError;
        if let Some(hw) = e.downcast_ref::<HwError>() {
            return match hw {
                HwError::Timeout => TrainerError::Timeout,
                HwError::Disconnected => TrainerError::NotConnected,
                HwError::StopRejected(msg) => TrainerError::StopFailed(msg.clone()),
                other @ HwError::Poisoned => TrainerError::Transport(other.to_string()),
            };
        }
    }

    let s = e.to_string();
    let lower = s.to_lowercase();
    if lower.contains("timeout") || lower.contains("timed out") {
        TrainerError::Timeout
    } else if lower.contains("disconnected") || lower.contains("not connected") {
        TrainerError::NotConnected
    } else {
        TrainerError::Transport(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Opaque(&'static str);

    impl std::fmt::Display for Opaque {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str(self.0)
        }
    }

    impl std::error::Error for Opaque {}

    #[test]
    fn falls_back_to_message_heuristics() {
        assert_eq!(map_hw_error(&Opaque("read timed out")), TrainerError::Timeout);
        assert_eq!(
            map_hw_error(&Opaque("peripheral disconnected")),
            TrainerError::NotConnected
        );
        assert_eq!(
            map_hw_error(&Opaque("gatt write failed")),
            TrainerError::Transport("gatt write failed".into())
        );
    }

    #[cfg(feature = "hardware-errors")]
    #[test]
    fn downcasts_simulator_errors() {
        use trainer_hardware::error::HwError;
        let e = HwError::StopRejected("busy".into());
        assert_eq!(map_hw_error(&e), TrainerError::StopFailed("busy".into()));
        assert_eq!(map_hw_error(&HwError::Disconnected), TrainerError::NotConnected);
    }
}
