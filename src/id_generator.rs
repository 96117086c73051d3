use crate::geometry::FeatureId;
use std::sync::atomic::{AtomicI64, Ordering};
use uuid::Uuid;

/// Decides how feature ids are issued and which ids are acceptable.
pub trait IdStrategy {
    fn get_id(&self) -> FeatureId;
    fn is_valid_id(&self, id: &FeatureId) -> bool;
}

/// Random v4 UUID strings, 36 characters long. The default strategy.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIdStrategy;

impl IdStrategy for UuidIdStrategy {
    fn get_id(&self) -> FeatureId {
        FeatureId::String(Uuid::new_v4().to_string())
    }

    fn is_valid_id(&self, id: &FeatureId) -> bool {
        match id {
            FeatureId::String(s) => s.len() == 36 && Uuid::parse_str(s).is_ok(),
            FeatureId::Number(_) => false,
        }
    }
}

/// Increasing positive integers, starting at 1 per strategy instance
#[derive(Debug)]
pub struct SequentialIdStrategy {
    next: AtomicI64,
}

impl Default for SequentialIdStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl SequentialIdStrategy {
    pub fn new() -> Self {
        Self {
            next: AtomicI64::new(1),
        }
    }
}

impl IdStrategy for SequentialIdStrategy {
    fn get_id(&self) -> FeatureId {
        FeatureId::Number(self.next.fetch_add(1, Ordering::SeqCst))
    }

    fn is_valid_id(&self, id: &FeatureId) -> bool {
        matches!(id, FeatureId::Number(n) if *n > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uuid_ids_are_valid_and_unique() {
        let strategy = UuidIdStrategy;
        let a = strategy.get_id();
        let b = strategy.get_id();
        assert_ne!(a, b);
        assert!(strategy.is_valid_id(&a));
        assert!(!strategy.is_valid_id(&FeatureId::from("not-a-uuid")));
        assert!(!strategy.is_valid_id(&FeatureId::Number(1)));
    }

    #[test]
    fn test_sequential_ids_increase() {
        let strategy = SequentialIdStrategy::new();
        assert_eq!(strategy.get_id(), FeatureId::Number(1));
        assert_eq!(strategy.get_id(), FeatureId::Number(2));
        assert!(!strategy.is_valid_id(&FeatureId::Number(0)));
    }
}
