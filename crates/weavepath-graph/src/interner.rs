use std::collections::HashMap;

/// Maps string labels to dense keys, storing each distinct label once.
#[derive(Debug, Clone, Default)]
pub struct LabelInterner {
    labels: Vec<Box<str>>,
    keys: HashMap<Box<str>, usize>,
}

impl LabelInterner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Key of `label`, allocating the next key on first sight.
    pub fn intern(&mut self, label: &str) -> usize {
        if let Some(&key) = self.keys.get(label) {
            return key;
        }

        let key = self.labels.len();
        self.labels.push(label.into());
        self.keys.insert(label.into(), key);
        key
    }

    pub fn resolve(&self, key: usize) -> Option<&str> {
        self.labels.get(key).map(|label| &**label)
    }

    pub fn key_of(&self, label: &str) -> Option<usize> {
        self.keys.get(label).copied()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
