// Active effect selection: ordered set of effect ids for one card instance.
// Insertion order is paint order (first = bottom layer, last = top layer).

use tracing::debug;

use crate::registry::EffectRegistry;
use crate::types::*;

/// Result of a toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggled {
    /// Appended to the top of the stack.
    Added,
    /// Removed from the stack.
    Removed,
    /// Unknown, disabled, or unsupported for this card type. Nothing changed.
    Ignored,
}

impl Toggled {
    pub fn changed(&self) -> bool {
        !matches!(self, Toggled::Ignored)
    }
}

/// Ordered, duplicate-free list of active effect ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveEffectSet {
    order: Vec<EffectId>,
}

impl ActiveEffectSet {
    pub fn new() -> Self {
        ActiveEffectSet { order: Vec::new() }
    }

    /// Remove `id` if active, otherwise append it when the registry accepts it.
    /// Ids that are unknown or disabled are ignored; they may come from stale saved data.
    pub fn toggle(
        &mut self,
        id: &EffectId,
        registry: &EffectRegistry,
        card_type: Option<&CardType>,
    ) -> Toggled {
        if self.remove(id) {
            return Toggled::Removed;
        }
        if self.insert(id, registry, card_type) {
            Toggled::Added
        } else {
            Toggled::Ignored
        }
    }

    /// Append `id` if it is not active yet and the registry accepts it.
    pub fn insert(
        &mut self,
        id: &EffectId,
        registry: &EffectRegistry,
        card_type: Option<&CardType>,
    ) -> bool {
        if self.contains(id) {
            return false;
        }
        let Some(definition) = registry.get(id) else {
            debug!(effect = %id, "Ignoring unknown effect");
            return false;
        };
        if !definition.enabled {
            debug!(effect = %id, "Ignoring disabled effect");
            return false;
        }
        if let Some(card_type) = card_type {
            if !definition.supports(card_type) {
                debug!(effect = %id, card_type = card_type.as_str(), "Effect not supported for card type");
                return false;
            }
        }
        self.order.push(id.clone());
        true
    }

    /// Returns true if `id` was active.
    pub fn remove(&mut self, id: &EffectId) -> bool {
        match self.order.iter().position(|e| e == id) {
            Some(pos) => {
                self.order.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.order.clear();
    }

    pub fn contains(&self, id: &EffectId) -> bool {
        self.order.iter().any(|e| e == id)
    }

    /// Active ids in paint order.
    pub fn order(&self) -> &[EffectId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
