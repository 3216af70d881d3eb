//! Dataset type inference.
//!
//! A `DatasetType` describes the shape of the sample data a model consumes or
//! produces. It is derived from a JSON sample and stored on the model record.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    Bool,
    Int,
    Float,
    Str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DatasetType {
    Null,
    Primitive {
        kind: PrimitiveKind,
    },
    /// Homogeneous sequence. `size` is `None` when nested lengths disagree.
    List {
        item: Box<DatasetType>,
        size: Option<usize>,
    },
    /// Heterogeneous sequence.
    Tuple {
        items: Vec<DatasetType>,
    },
    Dict {
        fields: BTreeMap<String, DatasetType>,
    },
}

impl DatasetType {
    pub fn primitive(kind: PrimitiveKind) -> Self {
        Self::Primitive { kind }
    }

    /// Infer the type of a JSON sample.
    pub fn analyze(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::primitive(PrimitiveKind::Bool),
            Value::Number(n) if n.is_i64() || n.is_u64() => Self::primitive(PrimitiveKind::Int),
            Value::Number(_) => Self::primitive(PrimitiveKind::Float),
            Value::String(_) => Self::primitive(PrimitiveKind::Str),
            Value::Array(items) => Self::analyze_sequence(items),
            Value::Object(map) => Self::Dict {
                fields: map
                    .iter()
                    .map(|(k, v)| (k.clone(), Self::analyze(v)))
                    .collect(),
            },
        }
    }

    fn analyze_sequence(items: &[Value]) -> Self {
        let types: Vec<DatasetType> = items.iter().map(Self::analyze).collect();

        let Some(first) = types.first().cloned() else {
            return Self::List {
                item: Box::new(Self::Null),
                size: Some(0),
            };
        };

        let unified = types
            .iter()
            .skip(1)
            .try_fold(first, |acc, t| acc.unify(t));

        match unified {
            Some(item) => Self::List {
                item: Box::new(item),
                size: Some(items.len()),
            },
            None => Self::Tuple { items: types },
        }
    }

    /// Smallest type covering both `self` and `other`, if one exists.
    fn unify(self, other: &DatasetType) -> Option<DatasetType> {
        use PrimitiveKind::{Float, Int};

        match (self, other) {
            (a, b) if a == *b => Some(a),
            (Self::Primitive { kind: Int }, Self::Primitive { kind: Float })
            | (Self::Primitive { kind: Float }, Self::Primitive { kind: Int }) => {
                Some(Self::primitive(Float))
            }
            (
                Self::List { item: a, size: sa },
                Self::List { item: b, size: sb },
            ) => {
                let item = (*a).unify(b)?;
                let size = if sa == *sb { sa } else { None };
                Some(Self::List {
                    item: Box::new(item),
                    size,
                })
            }
            (Self::Dict { fields: a }, Self::Dict { fields: b }) => {
                if a.len() != b.len() || !a.keys().all(|k| b.contains_key(k)) {
                    return None;
                }
                let mut fields = BTreeMap::new();
                for (k, ta) in a {
                    let merged = ta.unify(&b[&k])?;
                    fields.insert(k, merged);
                }
                Some(Self::Dict { fields })
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn empty_array_is_zero_sized_list() {
        assert_eq!(
            DatasetType::analyze(&json!([])),
            DatasetType::List {
                item: Box::new(DatasetType::Null),
                size: Some(0)
            }
        );
    }

    #[test]
    fn mixed_ints_and_floats_widen_to_float() {
        let t = DatasetType::analyze(&json!([1, 2.5, 3]));
        assert_eq!(
            t,
            DatasetType::List {
                item: Box::new(DatasetType::primitive(PrimitiveKind::Float)),
                size: Some(3)
            }
        );
    }

    #[test]
    fn heterogeneous_array_is_tuple() {
        let t = DatasetType::analyze(&json!([1, "a"]));
        assert_eq!(
            t,
            DatasetType::Tuple {
                items: vec![
                    DatasetType::primitive(PrimitiveKind::Int),
                    DatasetType::primitive(PrimitiveKind::Str)
                ]
            }
        );
    }

    #[test]
    fn ragged_matrix_loses_inner_size() {
        let t = DatasetType::analyze(&json!([[1, 2], [3]]));
        assert_eq!(
            t,
            DatasetType::List {
                item: Box::new(DatasetType::List {
                    item: Box::new(DatasetType::primitive(PrimitiveKind::Int)),
                    size: None
                }),
                size: Some(2)
            }
        );
    }

    #[test]
    fn records_with_same_keys_unify() {
        let t = DatasetType::analyze(&json!([{"a": 1, "b": "x"}, {"a": 2.0, "b": "y"}]));
        let DatasetType::List { item, size } = t else {
            panic!("expected list");
        };
        assert_eq!(size, Some(2));
        let DatasetType::Dict { fields } = *item else {
            panic!("expected dict");
        };
        assert_eq!(fields["a"], DatasetType::primitive(PrimitiveKind::Float));
        assert_eq!(fields["b"], DatasetType::primitive(PrimitiveKind::Str));
    }

    #[test]
    fn records_with_different_keys_form_tuple() {
        let t = DatasetType::analyze(&json!([{"a": 1}, {"b": 1}]));
        assert!(matches!(t, DatasetType::Tuple { ref items } if items.len() == 2));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 128,
            ..ProptestConfig::default()
        })]

        /// Property: any non-empty integer array is a list of ints sized by its length.
        #[test]
        fn integer_arrays_are_sized_int_lists(values in prop::collection::vec(any::<i64>(), 1..64)) {
            let t = DatasetType::analyze(&json!(values));
            prop_assert_eq!(
                t,
                DatasetType::List {
                    item: Box::new(DatasetType::primitive(PrimitiveKind::Int)),
                    size: Some(values.len())
                }
            );
        }

        /// Property: a rectangular matrix keeps both dimensions.
        #[test]
        fn rectangular_matrices_keep_both_sizes(rows in 1usize..8, cols in 1usize..8) {
            let matrix: Vec<Vec<f64>> = (0..rows).map(|r| (0..cols).map(|c| (r * cols + c) as f64 + 0.5).collect()).collect();
            let t = DatasetType::analyze(&json!(matrix));
            prop_assert_eq!(
                t,
                DatasetType::List {
                    item: Box::new(DatasetType::List {
                        item: Box::new(DatasetType::primitive(PrimitiveKind::Float)),
                        size: Some(cols)
                    }),
                    size: Some(rows)
                }
            );
        }
    }
}
