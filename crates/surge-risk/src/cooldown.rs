//! Per-symbol re-entry cooldowns.

use parking_lot::Mutex;
use std::collections::HashMap;
use surge_core::Symbol;

/// Tracks when each symbol may be traded again.
///
/// Each accepted signal arms a cooldown for its tier's duration; signals
/// arriving before expiry are rejected. The registry is shared between
/// the gate and the engine, hence the interior mutex.
pub struct CooldownRegistry {
    until_ms: Mutex<HashMap<Symbol, u64>>,
}

impl CooldownRegistry {
    pub fn new() -> Self {
        Self {
            until_ms: Mutex::new(HashMap::new()),
        }
    }

    /// Arm a cooldown lasting `cooldown_secs` from `now_ms`.
    pub fn arm(&self, symbol: &Symbol, cooldown_secs: u64, now_ms: u64) {
        let until = now_ms + cooldown_secs * 1000;
        self.until_ms.lock().insert(symbol.clone(), until);
    }

    /// Whether the symbol is still cooling down at `now_ms`.
    pub fn is_active(&self, symbol: &Symbol, now_ms: u64) -> bool {
        match self.until_ms.lock().get(symbol) {
            Some(&until) => now_ms < until,
            None => false,
        }
    }

    /// Drop expired entries. Called periodically by the engine.
    pub fn prune(&self, now_ms: u64) {
        self.until_ms.lock().retain(|_, &mut until| now_ms < until);
    }
}

impl Default for CooldownRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cooldown_expires() {
        let registry = CooldownRegistry::new();
        let symbol = Symbol::from("DOGEUSDT");
        let now = 1_000_000;

        assert!(!registry.is_active(&symbol, now));
        registry.arm(&symbol, 60, now);
        assert!(registry.is_active(&symbol, now));
        assert!(registry.is_active(&symbol, now + 59_999));
        assert!(!registry.is_active(&symbol, now + 60_000));
    }

    #[test]
    fn test_prune_keeps_live_entries() {
        let registry = CooldownRegistry::new();
        let a = Symbol::from("AUSDT");
        let b = Symbol::from("BUSDT");
        registry.arm(&a, 30, 0);
        registry.arm(&b, 120, 0);

        registry.prune(60_000);
        assert!(!registry.is_active(&a, 60_000));
        assert!(registry.is_active(&b, 60_000));
    }
}
