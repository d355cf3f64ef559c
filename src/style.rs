use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Style keys with geometry-relevant meaning. Everything outside this
/// list is opaque to the engine and passes through untouched for the
/// renderer to interpret.
pub mod keys {
    pub const ROTATION: &str = "rotation";
    pub const PERIMETER: &str = "perimeter";
    pub const PERIMETER_SPACING: &str = "perimeterSpacing";
    pub const SOURCE_PERIMETER_SPACING: &str = "sourcePerimeterSpacing";
    pub const TARGET_PERIMETER_SPACING: &str = "targetPerimeterSpacing";
    pub const ROUTING: &str = "routing";
    pub const NO_ROUTING: &str = "noRouting";
    pub const ORTHOGONAL: &str = "orthogonal";
    pub const EXIT_X: &str = "exitX";
    pub const EXIT_Y: &str = "exitY";
    pub const EXIT_DX: &str = "exitDx";
    pub const EXIT_DY: &str = "exitDy";
    pub const EXIT_PERIMETER: &str = "exitPerimeter";
    pub const ENTRY_X: &str = "entryX";
    pub const ENTRY_Y: &str = "entryY";
    pub const ENTRY_DX: &str = "entryDx";
    pub const ENTRY_DY: &str = "entryDy";
    pub const ENTRY_PERIMETER: &str = "entryPerimeter";
    pub const LABEL_POSITION: &str = "labelPosition";
    pub const VERTICAL_LABEL_POSITION: &str = "verticalLabelPosition";
    pub const DIRECTION: &str = "direction";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StyleValue {
    Flag(bool),
    Num(f32),
    Text(String),
}

/// Opaque key -> value mapping carried by every cell. The engine reads
/// only the keys in [`keys`]; collaborators own the rest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Style {
    entries: BTreeMap<String, StyleValue>,
}

impl Style {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_num(mut self, key: &str, value: f32) -> Self {
        self.entries.insert(key.to_string(), StyleValue::Num(value));
        self
    }

    pub fn with_flag(mut self, key: &str, value: bool) -> Self {
        self.entries.insert(key.to_string(), StyleValue::Flag(value));
        self
    }

    pub fn with_text(mut self, key: &str, value: &str) -> Self {
        self.entries
            .insert(key.to_string(), StyleValue::Text(value.to_string()));
        self
    }

    pub fn set(&mut self, key: &str, value: StyleValue) {
        self.entries.insert(key.to_string(), value);
    }

    pub fn remove(&mut self, key: &str) -> Option<StyleValue> {
        self.entries.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&StyleValue> {
        self.entries.get(key)
    }

    pub fn num(&self, key: &str) -> Option<f32> {
        match self.entries.get(key)? {
            StyleValue::Num(value) => Some(*value),
            _ => None,
        }
    }

    pub fn num_or(&self, key: &str, default: f32) -> f32 {
        self.num(key).unwrap_or(default)
    }

    pub fn flag(&self, key: &str) -> Option<bool> {
        match self.entries.get(key)? {
            StyleValue::Flag(value) => Some(*value),
            // A numeric 0/1 also reads as a flag, the way loosely typed
            // style sheets tend to spell booleans.
            StyleValue::Num(value) => Some(*value != 0.0),
            _ => None,
        }
    }

    pub fn flag_or(&self, key: &str, default: bool) -> bool {
        self.flag(key).unwrap_or(default)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        match self.entries.get(key)? {
            StyleValue::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &StyleValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}
