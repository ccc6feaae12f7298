//! Compile-once cache of codecs, keyed by schema text.

use std::sync::{Arc, Mutex, PoisonError};

use fxhash::FxHashMap;
use once_cell::sync::OnceCell;

use super::Codec;
use crate::schema::SchemaError;

type Slot = Arc<OnceCell<Arc<Codec>>>;

/// A cache of compiled codecs owned by its caller.
///
/// Each schema text is compiled at most once, even when several threads ask
/// for it at the same time. The map lock is only held while looking up the
/// slot, so compiling one schema does not block lookups of another.
#[derive(Default)]
pub struct CodecRegistry {
    slots: Mutex<FxHashMap<String, Slot>>,
}

impl CodecRegistry {
    pub fn new() -> CodecRegistry {
        CodecRegistry::default()
    }

    /// The codec for `source`, compiling it if this is the first request.
    ///
    /// Failed compilations are not cached, so a later request retries.
    pub fn get_or_compile(&self, source: &str) -> Result<Arc<Codec>, SchemaError> {
        let slot = self.slot(source);
        match slot.get_or_try_init(|| Codec::from_source(source).map(Arc::new)) {
            Ok(codec) => Ok(Arc::clone(codec)),
            Err(error) => {
                self.forget(source, &slot);
                Err(error)
            }
        }
    }

    /// The codec for `source`, if it has already been compiled.
    pub fn get(&self, source: &str) -> Option<Arc<Codec>> {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.get(source)?.get().cloned()
    }

    pub fn len(&self) -> usize {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.values().filter(|slot| slot.get().is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop the empty slot left behind by a failed compilation.
    fn forget(&self, source: &str, slot: &Slot) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let is_same_empty_slot = match slots.get(source) {
            Some(current) => Arc::ptr_eq(current, slot) && current.get().is_none(),
            None => false,
        };
        if is_same_empty_slot {
            slots.remove(source);
        }
    }

    fn slot(&self, source: &str) -> Slot {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        match slots.get(source) {
            Some(slot) => Arc::clone(slot),
            None => {
                let slot = Slot::default();
                slots.insert(source.to_owned(), Arc::clone(&slot));
                slot
            }
        }
    }
}
