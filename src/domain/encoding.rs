//! First-appearance category encodings.
//!
//! A `CategoryEncoding` assigns `0, 1, 2, ...` to distinct labels in the order
//! they first occur. The same instance must back both training features and
//! forecast inputs; codes from a different encoding are meaningless to a model.

use std::collections::HashMap;

use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategoryEncoding {
    labels: Vec<String>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl CategoryEncoding {
    /// Build an encoding from labels in observation order.
    pub fn from_labels<'a, I>(values: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut enc = Self::default();
        for v in values {
            enc.insert(v);
        }
        enc
    }

    fn insert(&mut self, label: &str) -> usize {
        if let Some(&code) = self.index.get(label) {
            return code;
        }
        let code = self.labels.len();
        self.labels.push(label.to_string());
        self.index.insert(label.to_string(), code);
        code
    }

    pub fn code(&self, label: &str) -> Option<usize> {
        self.index.get(label).copied()
    }

    pub fn label(&self, code: usize) -> Option<&str> {
        self.labels.get(code).map(String::as_str)
    }

    /// Labels in code order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Every assigned code, ascending.
    pub fn codes(&self) -> Vec<usize> {
        (0..self.labels.len()).collect()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// `n` codes cycling through the assigned codes (`[0, 1, 2, 0, 1]` for
    /// three labels and `n = 5`). Empty when the encoding is empty.
    pub fn cycled_codes(&self, n: usize) -> Vec<usize> {
        if self.labels.is_empty() {
            return Vec::new();
        }
        (0..self.labels.len()).cycle().take(n).collect()
    }
}
