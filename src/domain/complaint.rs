// ============================================================
// Layer 3 — Complaint Domain Type
// ============================================================
// Represents a single tourism complaint and its category labels.
// This is the core concept of multi-label classification:
//   - We have a complaint text
//   - We have up to 8 category names attached to it
//   - The target is a MULTI-HOT vector over the fixed
//     8-category vocabulary (zero or more bits set)
//
// This is different from multi-class classification where
// exactly one category applies. A complaint about a dirty
// bus can be both 旅游交通 (transport) and 卫生 (hygiene).
//
// Reference: Rust Book §5 (Structs)

use serde::{Deserialize, Serialize};

/// Number of complaint categories. Fixed by the labelling scheme.
pub const NUM_CATEGORIES: usize = 8;

/// The fixed category vocabulary, in label-index order.
/// Index i in a multi-hot vector corresponds to CATEGORIES[i].
pub const CATEGORIES: [&str; NUM_CATEGORIES] = [
    "旅游交通",       // transport
    "游览",           // sightseeing
    "旅游安全",       // safety
    "卫生",           // hygiene
    "邮电",           // post & telecom
    "旅游购物",       // shopping
    "经营管理",       // business management
    "资源和环境保护", // resource & environment protection
];

/// Look up a category name in the fixed vocabulary.
/// Returns the label index, or `None` for unrecognized names.
pub fn category_index(name: &str) -> Option<usize> {
    CATEGORIES.iter().position(|c| *c == name)
}

/// A raw labelled complaint as loaded from a dataset row.
/// The label strings are still unencoded category names —
/// encoding to a multi-hot vector happens in `multi_hot()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Complaint {
    /// The complaint text to classify
    pub description: String,

    /// The raw label-column values from the dataset row.
    /// May contain empty strings or names outside the vocabulary.
    pub labels: Vec<String>,
}

impl Complaint {
    pub fn new(description: impl Into<String>, labels: Vec<String>) -> Self {
        Self {
            description: description.into(),
            labels,
        }
    }

    /// Encode the raw label strings into a multi-hot target vector.
    ///
    /// Exactly the categories present in the fixed vocabulary are set.
    /// Unrecognized or empty label strings are dropped without raising —
    /// a sample can legitimately end up with zero set bits.
    pub fn multi_hot(&self) -> [f32; NUM_CATEGORIES] {
        let mut one_hot = [0.0f32; NUM_CATEGORIES];
        for label in &self.labels {
            if let Some(idx) = category_index(label) {
                one_hot[idx] = 1.0;
            }
        }
        one_hot
    }
}
