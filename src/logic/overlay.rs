use super::pool::Reserves;
use ahash::HashMap;
use alloy_primitives::Address;

/// Projected post-transaction reserves for the pools a pending transaction touches.
///
/// Built once per transaction and only read afterwards; never written back to the pools.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReserveOverlay {
    entries: HashMap<Address, Reserves>,
}

impl ReserveOverlay {
    pub fn get(&self, pool: &Address) -> Option<&Reserves> {
        self.entries.get(pool)
    }

    pub fn insert(&mut self, pool: Address, reserves: Reserves) {
        self.entries.insert(pool, reserves);
    }

    pub fn contains(&self, pool: &Address) -> bool {
        self.entries.contains_key(pool)
    }

    pub fn pools(&self) -> impl Iterator<Item = &Address> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
