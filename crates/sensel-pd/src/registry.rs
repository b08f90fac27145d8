//! Process-wide claimed-device registry
//!
//! Prevents two plugin instances from opening the same physical Morph. One
//! registry exists per process, created at plugin load and handed to each
//! instance as `Arc<DeviceRegistry>`; it resets on host reload, nothing is
//! persisted.

use sensel_sdk::MAX_DEVICES;
use std::sync::Mutex;

/// Error type for claim operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("device '{0}' is already claimed by another instance")]
    Busy(String),

    #[error("device registry is full ({MAX_DEVICES} devices)")]
    Full,
}

/// Bounded set of claimed device serial numbers
///
/// Claim/release only happen on the host's serialized dispatch thread, but
/// the internal mutex keeps the registry safe if a host ever relaxes that.
/// Matching is by serial string equality.
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    claimed: Mutex<Vec<String>>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim a serial for exclusive use
    pub fn claim(&self, serial: &str) -> Result<(), RegistryError> {
        let mut claimed = self.claimed.lock().expect("registry mutex poisoned");
        if claimed.iter().any(|s| s == serial) {
            return Err(RegistryError::Busy(serial.to_string()));
        }
        if claimed.len() >= MAX_DEVICES {
            return Err(RegistryError::Full);
        }
        claimed.push(serial.to_string());
        Ok(())
    }

    /// Release a claim; releasing an unclaimed serial is a no-op
    pub fn release(&self, serial: &str) {
        let mut claimed = self.claimed.lock().expect("registry mutex poisoned");
        claimed.retain(|s| s != serial);
    }

    /// Whether a serial is currently claimed by any instance
    pub fn is_claimed(&self, serial: &str) -> bool {
        let claimed = self.claimed.lock().expect("registry mutex poisoned");
        claimed.iter().any(|s| s == serial)
    }

    /// Number of claimed devices
    pub fn len(&self) -> usize {
        self.claimed.lock().expect("registry mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_release_cycle() {
        let registry = DeviceRegistry::new();
        assert!(!registry.is_claimed("SM-001"));

        registry.claim("SM-001").unwrap();
        assert!(registry.is_claimed("SM-001"));
        assert_eq!(registry.len(), 1);

        registry.release("SM-001");
        assert!(!registry.is_claimed("SM-001"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_double_claim_is_busy() {
        let registry = DeviceRegistry::new();
        registry.claim("SM-001").unwrap();

        assert_eq!(
            registry.claim("SM-001"),
            Err(RegistryError::Busy("SM-001".to_string()))
        );

        // Release makes it claimable again
        registry.release("SM-001");
        assert!(registry.claim("SM-001").is_ok());
    }

    #[test]
    fn test_release_unclaimed_is_noop() {
        let registry = DeviceRegistry::new();
        registry.release("SM-001");
        assert!(registry.is_empty());
    }

    #[test]
    fn test_capacity_bound() {
        let registry = DeviceRegistry::new();
        for i in 0..MAX_DEVICES {
            registry.claim(&format!("SM-{i:03}")).unwrap();
        }
        assert_eq!(registry.claim("SM-overflow"), Err(RegistryError::Full));

        // Freeing one slot clears the capacity error
        registry.release("SM-000");
        assert!(registry.claim("SM-overflow").is_ok());
    }
}
