use std::sync::{Arc, Mutex};

use uuid::Uuid;

/// IdGenerator trait for abstracting alert identifier generation
pub trait IdGenerator: Send + Sync {
    /// Generate a new UUID v4 in hyphenated lowercase format
    fn uuid_v4(&self) -> String;
}

/// Production implementation using random UUID generation
#[derive(Debug, Clone, Default)]
pub struct RandomIdGenerator;

impl RandomIdGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl IdGenerator for RandomIdGenerator {
    fn uuid_v4(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Test implementation returning a fixed sequence of identifiers
/// Wraps around when the sequence is exhausted
#[derive(Debug, Clone)]
pub struct FixedIdGenerator {
    uuids: Vec<String>,
    index: Arc<Mutex<usize>>,
}

impl FixedIdGenerator {
    pub fn new(uuids: Vec<String>) -> Self {
        Self {
            uuids,
            index: Arc::new(Mutex::new(0)),
        }
    }

    /// A generator that always returns the same identifier
    pub fn single(uuid: String) -> Self {
        Self::new(vec![uuid])
    }

    pub fn from_strings(uuid_strs: &[&str]) -> Self {
        Self::new(uuid_strs.iter().map(|s| s.to_string()).collect())
    }
}

impl IdGenerator for FixedIdGenerator {
    fn uuid_v4(&self) -> String {
        let mut index = self.index.lock().unwrap();
        let uuid = self.uuids[*index % self.uuids.len()].clone();
        *index += 1;
        uuid
    }
}
