//! Deduplicated attribute value table.

use crate::proto;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

/// A numeric attribute value.
///
/// Equality and hashing are structural: two doubles are equal when their bit
/// patterns are, and an `Int` never equals a `Double`.
#[derive(Debug, Clone, Copy)]
pub enum AttributeValue {
    /// Encoded as `int_value`.
    Int(i64),
    /// Encoded as `double_value`.
    Double(f64),
}

impl AttributeValue {
    /// `Int` when `value` is integral and fits in an `i64`, otherwise `Double`.
    pub fn from_f64(value: f64) -> Self {
        if value.fract() == 0.0 && value >= i64::MIN as f64 && value < i64::MAX as f64 {
            AttributeValue::Int(value as i64)
        } else {
            AttributeValue::Double(value)
        }
    }

    /// The protobuf value message.
    pub fn to_proto(self) -> proto::Value {
        match self {
            AttributeValue::Int(v) => proto::Value {
                int_value: Some(v),
                ..Default::default()
            },
            AttributeValue::Double(v) => proto::Value {
                double_value: Some(v),
                ..Default::default()
            },
        }
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Int(value)
    }
}

impl PartialEq for AttributeValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (AttributeValue::Int(a), AttributeValue::Int(b)) => a == b,
            (AttributeValue::Double(a), AttributeValue::Double(b)) => a.to_bits() == b.to_bits(),
            _ => false,
        }
    }
}

impl Eq for AttributeValue {}

impl Hash for AttributeValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            AttributeValue::Int(v) => v.hash(state),
            AttributeValue::Double(v) => v.to_bits().hash(state),
        }
    }
}

/// Ordered table of distinct values, addressed by insertion index.
#[derive(Debug, Clone, Default)]
pub struct ValueTable {
    values: Vec<AttributeValue>,
    index: HashMap<AttributeValue, u32>,
}

impl ValueTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of `value`, appending it if not already present.
    pub fn insert(&mut self, value: AttributeValue) -> u32 {
        if let Some(&idx) = self.index.get(&value) {
            return idx;
        }
        let idx = self.values.len() as u32;
        self.values.push(value);
        self.index.insert(value, idx);
        idx
    }

    /// Value at `idx`.
    pub fn get(&self, idx: u32) -> Option<AttributeValue> {
        self.values.get(idx as usize).copied()
    }

    /// Number of distinct values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Values in insertion order, as protobuf messages.
    pub fn into_proto(self) -> Vec<proto::Value> {
        self.values.into_iter().map(AttributeValue::to_proto).collect()
    }
}
