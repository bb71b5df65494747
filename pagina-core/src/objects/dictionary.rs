//! Name-keyed dictionary backed by an open-addressing hash table.
//!
//! Entries live in a vector in insertion order; the table holds indices into
//! it. The table size is a power of two starting at 8 and doubles once three
//! quarters of it are in use. Probing steps by an odd stride taken from the
//! high bits of the hash, so every slot is reachable.

use crate::objects::Object;
use std::fmt;

const INITIAL_EXP: u32 = 3;
const HASH_SEED: u64 = 0x100;
const HASH_MULTIPLIER: u64 = 1_111_111_111_111_111_111;

/// FNV-1a style hash over the key bytes plus a terminating zero byte.
pub(crate) fn hash_key(key: &[u8]) -> u64 {
    let mut hash = HASH_SEED;
    for &byte in key.iter().chain(std::iter::once(&0u8)) {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(HASH_MULTIPLIER);
    }
    hash ^ (hash >> 32)
}

#[derive(Debug, Clone)]
struct Entry {
    hash: u64,
    key: String,
    value: Object,
}

#[derive(Clone)]
pub struct Dictionary {
    entries: Vec<Entry>,
    slots: Vec<Option<usize>>,
    exp: u32,
}

enum Probe {
    Found(usize),
    Vacant(usize),
}

impl Dictionary {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            slots: vec![None; 1 << INITIAL_EXP],
            exp: INITIAL_EXP,
        }
    }

    /// Create a dictionary whose table holds `capacity` entries without rehashing
    pub fn with_capacity(capacity: usize) -> Self {
        let mut exp = INITIAL_EXP;
        while (1usize << exp) * 3 <= capacity * 4 {
            exp += 1;
        }
        Self {
            entries: Vec::with_capacity(capacity),
            slots: vec![None; 1 << exp],
            exp,
        }
    }

    fn probe(&self, key: &str, hash: u64) -> Probe {
        let mask = self.slots.len() - 1;
        let step = ((hash >> (64 - self.exp)) | 1) as usize;
        let mut slot = hash as usize & mask;
        loop {
            match self.slots[slot] {
                None => return Probe::Vacant(slot),
                Some(index) => {
                    let entry = &self.entries[index];
                    if entry.hash == hash && entry.key == key {
                        return Probe::Found(index);
                    }
                }
            }
            slot = (slot + step) & mask;
        }
    }

    fn rebuild(&mut self, exp: u32) {
        self.exp = exp;
        self.slots = vec![None; 1 << exp];
        for index in 0..self.entries.len() {
            let entry = &self.entries[index];
            if let Probe::Vacant(slot) = self.probe(&entry.key, entry.hash) {
                self.slots[slot] = Some(index);
            }
        }
    }

    /// Insert or overwrite. Returns the previous value for the key.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Object>) -> Option<Object> {
        let key = key.into();
        let value = value.into();
        let hash = hash_key(key.as_bytes());

        if let Probe::Found(index) = self.probe(&key, hash) {
            return Some(std::mem::replace(&mut self.entries[index].value, value));
        }

        if self.entries.len() * 4 >= self.slots.len() * 3 {
            self.rebuild(self.exp + 1);
        }
        if let Probe::Vacant(slot) = self.probe(&key, hash) {
            self.slots[slot] = Some(self.entries.len());
            self.entries.push(Entry { hash, key, value });
        }
        None
    }

    pub fn get(&self, key: &str) -> Option<&Object> {
        match self.probe(key, hash_key(key.as_bytes())) {
            Probe::Found(index) => Some(&self.entries[index].value),
            Probe::Vacant(_) => None,
        }
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Object> {
        match self.probe(key, hash_key(key.as_bytes())) {
            Probe::Found(index) => Some(&mut self.entries[index].value),
            Probe::Vacant(_) => None,
        }
    }

    /// Remove a key. Later entries keep their relative order.
    pub fn remove(&mut self, key: &str) -> Option<Object> {
        match self.probe(key, hash_key(key.as_bytes())) {
            Probe::Found(index) => {
                let entry = self.entries.remove(index);
                self.rebuild(self.exp);
                Some(entry.value)
            }
            Probe::Vacant(_) => None,
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of hash slots currently allocated.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.slots.iter_mut().for_each(|slot| *slot = None);
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.iter().map(|e| &e.key)
    }

    pub fn values(&self) -> impl Iterator<Item = &Object> {
        self.entries.iter().map(|e| &e.value)
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Object)> {
        self.entries.iter().map(|e| (&e.key, &e.value))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&String, &mut Object)> {
        self.entries.iter_mut().map(|e| (&e.key, &mut e.value))
    }

    pub fn get_dict(&self, key: &str) -> Option<&Dictionary> {
        self.get(key).and_then(Object::as_dict)
    }

    pub fn get_integer(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Object::as_integer)
    }

    pub fn get_name(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Object::as_name)
    }
}

impl Default for Dictionary {
    fn default() -> Self {
        Self::new()
    }
}

/// Equal when both hold the same keys with equal values, in any order.
impl PartialEq for Dictionary {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(key, value)| other.get(key) == Some(value))
    }
}

impl fmt::Debug for Dictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Into<String>> FromIterator<(K, Object)> for Dictionary {
    fn from_iter<T: IntoIterator<Item = (K, Object)>>(iter: T) -> Self {
        let mut dict = Dictionary::new();
        for (key, value) in iter {
            dict.set(key, value);
        }
        dict
    }
}
