//! Fixed-size object pool with generation-tagged slots
//!
//! Every slot carries a generation that moves on each time the slot is freed.
//! A handle holds the index and the generation it was issued with, so a handle
//! to a deleted object never reaches an object later created in the same slot.

pub struct ObjPool<T, const N: usize> {
    slots: [Option<T>; N],
    gens: [u8; N],
}

impl<T, const N: usize> ObjPool<T, N> {
    pub const fn new() -> Self {
        ObjPool {
            slots: [const { None }; N],
            gens: [0; N],
        }
    }

    /// Empty every slot; generations keep counting
    pub fn clear(&mut self) {
        for (slot, generation) in self.slots.iter_mut().zip(self.gens.iter_mut()) {
            if slot.take().is_some() {
                *generation = generation.wrapping_add(1);
            }
        }
    }

    /// Store an object in the first free slot
    ///
    /// Returns the slot index and its current generation.
    pub fn alloc(&mut self, obj: T) -> Option<(usize, u8)> {
        let idx = self.slots.iter().position(Option::is_none)?;
        self.slots[idx] = Some(obj);
        Some((idx, self.gens[idx]))
    }

    pub fn get(&self, idx: usize, generation: u8) -> Option<&T> {
        if *self.gens.get(idx)? != generation {
            return None;
        }
        self.slots[idx].as_ref()
    }

    pub fn get_mut(&mut self, idx: usize, generation: u8) -> Option<&mut T> {
        if *self.gens.get(idx)? != generation {
            return None;
        }
        self.slots[idx].as_mut()
    }

    /// Take the object out and retire the generation
    pub fn free(&mut self, idx: usize, generation: u8) -> Option<T> {
        self.get(idx, generation)?;
        self.gens[idx] = self.gens[idx].wrapping_add(1);
        self.slots[idx].take()
    }
}

impl<T, const N: usize> Default for ObjPool<T, N> {
    fn default() -> Self {
        Self::new()
    }
}
