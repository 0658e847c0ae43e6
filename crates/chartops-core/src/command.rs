//! Chart operation commands
//!
//! [`FieldMapping`] is the loose key/value shape every recovery stage produces.
//! [`ChartOperationCommand`] is the validated form built from it by
//! [`canonicalize`](crate::canonical::canonicalize); once built it is never mutated.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Field names a command may carry, in scan order
pub const ALLOWED_FIELDS: [&str; 6] = [PLOT_NAME, OPERATION, PLOT_TYPE, SIZE, X_AXIS, Y_AXIS];

pub const PLOT_NAME: &str = "plotName";
pub const OPERATION: &str = "operation";
pub const PLOT_TYPE: &str = "plotType";
pub const SIZE: &str = "size";
pub const X_AXIS: &str = "xAxis";
pub const Y_AXIS: &str = "yAxis";

/// Unordered key/value pairs recovered from a completion.
///
/// Keys are not restricted here; anything outside [`ALLOWED_FIELDS`] is dropped
/// during canonicalization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMapping {
    fields: BTreeMap<String, String>,
}

impl FieldMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.fields.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.fields.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Keep only the entries for which `keep` returns true
    pub fn retain(&mut self, mut keep: impl FnMut(&str, &str) -> bool) {
        self.fields.retain(|k, v| keep(k, v));
    }

    /// Apply `f` to the value stored under `key`, if any
    pub fn update(&mut self, key: &str, f: impl FnOnce(&str) -> String) {
        if let Some(value) = self.fields.get_mut(key) {
            *value = f(value);
        }
    }
}

impl<K, V> FromIterator<(K, V)> for FieldMapping
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// What a command does to a chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Update,
    Delete,
}

/// Chart rendering kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlotType {
    Line,
    Bar,
    Scatter,
    Pie,
    Area,
    Histogram,
    Heatmap,
}

/// Dashboard footprint of a chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartSize {
    Small,
    Medium,
    Large,
}

/// Parse failure for one of the enumerated command fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant(pub String);

macro_rules! keyword_enum {
    ($ty:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            pub const ALL: &'static [$ty] = &[$($ty::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $text),+
                }
            }
        }

        impl FromStr for $ty {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($ty::$variant),)+
                    other => Err(UnknownVariant(other.to_string())),
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

keyword_enum!(Operation {
    Create => "create",
    Update => "update",
    Delete => "delete",
});

keyword_enum!(PlotType {
    Line => "line",
    Bar => "bar",
    Scatter => "scatter",
    Pie => "pie",
    Area => "area",
    Histogram => "histogram",
    Heatmap => "heatmap",
});

keyword_enum!(ChartSize {
    Small => "small",
    Medium => "medium",
    Large => "large",
});

/// A fully validated chart operation.
///
/// Invariants upheld by construction through canonicalization:
/// - `plot_name` is non-empty
/// - a create carries `plot_type`, `size` and both axes (one is enough for pie)
/// - a delete carries nothing besides `plot_name` and `operation`
/// - the two axes, when both present, differ
///
/// Deserialization goes through [`FieldMapping`] and canonicalization, so a
/// command read from configuration obeys the same rules as a recovered one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "FieldMapping")]
pub struct ChartOperationCommand {
    pub(crate) plot_name: String,
    pub(crate) operation: Operation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) plot_type: Option<PlotType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) size: Option<ChartSize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) x_axis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) y_axis: Option<String>,
}

impl ChartOperationCommand {
    pub fn plot_name(&self) -> &str {
        &self.plot_name
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn plot_type(&self) -> Option<PlotType> {
        self.plot_type
    }

    pub fn size(&self) -> Option<ChartSize> {
        self.size
    }

    pub fn x_axis(&self) -> Option<&str> {
        self.x_axis.as_deref()
    }

    pub fn y_axis(&self) -> Option<&str> {
        self.y_axis.as_deref()
    }

    /// Render the command back into the loose mapping shape
    pub fn to_field_mapping(&self) -> FieldMapping {
        let mut mapping = FieldMapping::new();
        mapping.insert(PLOT_NAME, self.plot_name.clone());
        mapping.insert(OPERATION, self.operation.as_str());
        if let Some(plot_type) = self.plot_type {
            mapping.insert(PLOT_TYPE, plot_type.as_str());
        }
        if let Some(size) = self.size {
            mapping.insert(SIZE, size.as_str());
        }
        if let Some(x) = &self.x_axis {
            mapping.insert(X_AXIS, x.clone());
        }
        if let Some(y) = &self.y_axis {
            mapping.insert(Y_AXIS, y.clone());
        }
        mapping
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_round_trip() {
        for op in Operation::ALL {
            assert_eq!(op.as_str().parse::<Operation>().unwrap(), *op);
        }
        assert_eq!("heatmap".parse::<PlotType>().unwrap(), PlotType::Heatmap);
        assert_eq!(
            "Large".parse::<ChartSize>(),
            Err(UnknownVariant("Large".to_string()))
        );
    }

    #[test]
    fn test_command_serializes_camel_case_without_absent_fields() {
        let command = ChartOperationCommand {
            plot_name: "x".to_string(),
            operation: Operation::Delete,
            plot_type: None,
            size: None,
            x_axis: None,
            y_axis: None,
        };

        let json = serde_json::to_value(&command).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "plotName": "x", "operation": "delete" })
        );
    }

    #[test]
    fn test_to_field_mapping_uses_wire_names() {
        let command = ChartOperationCommand {
            plot_name: "flow".to_string(),
            operation: Operation::Create,
            plot_type: Some(PlotType::Pie),
            size: Some(ChartSize::Small),
            x_axis: None,
            y_axis: Some("FlowRate".to_string()),
        };

        let mapping = command.to_field_mapping();
        assert_eq!(mapping.get("plotType"), Some("pie"));
        assert_eq!(mapping.get("yAxis"), Some("FlowRate"));
        assert!(!mapping.contains_key("xAxis"));
        assert_eq!(mapping.len(), 5);
    }

    #[test]
    fn test_field_mapping_retain_and_update() {
        let mut mapping: FieldMapping = [("operation", "CREATE"), ("colour", "red")]
            .into_iter()
            .collect();

        mapping.update("operation", str::to_lowercase);
        mapping.retain(|k, _| ALLOWED_FIELDS.contains(&k));

        assert_eq!(mapping.get("operation"), Some("create"));
        assert!(!mapping.contains_key("colour"));
        assert_eq!(mapping.keys().collect::<Vec<_>>(), vec!["operation"]);

        mapping.retain(|_, _| false);
        assert!(mapping.is_empty());
    }
}
