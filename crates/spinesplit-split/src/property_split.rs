//! Per-component-kind property windowing.
//!
//! Scalar and distribution properties (`Fixed`/`Uniform`/`Normal`/`Poisson`)
//! are always cloned verbatim into every sub-component regardless of kind or
//! connectivity. Only `ValueList` needs re-indexing, and the re-indexing rule
//! depends on which component owns the property:
//!
//! - `Population`/`Neuron`: window to the sub-population's own index range.
//! - `PostSynapse`: window to the destination sub-range, always — a
//!   post-synapse instance exists per destination target regardless of the
//!   synapse's connectivity kind.
//! - `WeightUpdate`: depends on connectivity ([`WeightUpdateWindow`]).

use std::collections::BTreeMap;

use spinesplit_model::{Property, PropertyValue};

/// How a `WeightUpdate`'s `ValueList` properties are re-indexed, chosen by
/// the synapse's connectivity kind.
pub enum WeightUpdateWindow {
    /// `AllToAll`: the parent's flattened `src * dst_pop_size + dst` index
    /// space is windowed to this sub-synapse's (src, dst) sub-range and
    /// reindexed row-major within it.
    Flattened {
        /// This sub-synapse's source sub-index.
        src_sub: u32,
        /// Size of the source sub-population.
        src_sub_size: u32,
        /// This sub-synapse's destination sub-index.
        dst_sub: u32,
        /// Size of the destination sub-population.
        target_sub_size: u32,
        /// Total (unsplit) destination population size.
        dst_pop_size: u32,
        /// Build-time sub-population cap.
        cap: u32,
    },
    /// `OneToOne`: indexed directly by neuron position, windowed exactly like
    /// a population property.
    Direct {
        /// The shared sub-index (source and destination coincide).
        sub_idx: u32,
        /// Size of this sub-population.
        sub_size: u32,
        /// Build-time sub-population cap.
        cap: u32,
    },
    /// `ConnectionList`: re-indexed by an explicit `(parent_index ->
    /// sub_index)` map built while the connection list itself was split.
    ByInstanceMap {
        /// Pairs of (dense index in the parent list, dense index in this
        /// sub-synapse's list), in no particular order.
        map: Vec<(u32, u32)>,
    },
    /// `FixedProbability`: there is no stable per-shard index mapping for a
    /// probabilistically realized connectivity, so a `ValueList` (if present)
    /// is cloned through unchanged.
    CloneVerbatim,
}

fn window_value_list(entries: &BTreeMap<u32, f64>, sub_idx: u32, cap: u32, sub_size: u32) -> BTreeMap<u32, f64> {
    let start = sub_idx * cap;
    let end = start + sub_size;
    entries
        .iter()
        .filter(|&(&idx, _)| idx >= start && idx < end)
        .map(|(&idx, &value)| (idx - start, value))
        .collect()
}

fn split_value_list_weight_update(entries: &BTreeMap<u32, f64>, window: &WeightUpdateWindow) -> BTreeMap<u32, f64> {
    match window {
        WeightUpdateWindow::Direct { sub_idx, sub_size, cap } => {
            window_value_list(entries, *sub_idx, *cap, *sub_size)
        }
        WeightUpdateWindow::Flattened {
            src_sub,
            src_sub_size,
            dst_sub,
            target_sub_size,
            dst_pop_size,
            cap,
        } => {
            let src_start = src_sub * cap;
            let dst_start = dst_sub * cap;
            let mut out = BTreeMap::new();
            for (&global_idx, &value) in entries {
                let src_global = global_idx / dst_pop_size;
                let dst_global = global_idx % dst_pop_size;
                if src_global >= src_start
                    && src_global < src_start + src_sub_size
                    && dst_global >= dst_start
                    && dst_global < dst_start + target_sub_size
                {
                    let src_local = src_global - src_start;
                    let dst_local = dst_global - dst_start;
                    out.insert(src_local * target_sub_size + dst_local, value);
                }
            }
            out
        }
        WeightUpdateWindow::ByInstanceMap { map } => {
            let mut out = BTreeMap::new();
            for &(parent_idx, sub_idx) in map {
                if let Some(&value) = entries.get(&parent_idx) {
                    out.insert(sub_idx, value);
                }
            }
            out
        }
        WeightUpdateWindow::CloneVerbatim => entries.clone(),
    }
}

/// Split one `Property` for a `Population`/`Neuron`, or `None` if a
/// `ValueList` windows down to nothing and should be dropped.
pub fn split_population_property(property: &Property, sub_idx: u32, cap: u32, sub_size: u32) -> Option<Property> {
    match &property.value {
        PropertyValue::ValueList { entries } => {
            let windowed = window_value_list(entries, sub_idx, cap, sub_size);
            if windowed.is_empty() {
                None
            } else {
                Some(Property::new(
                    property.name.clone(),
                    PropertyValue::ValueList { entries: windowed },
                ))
            }
        }
        other => Some(Property::new(property.name.clone(), other.clone())),
    }
}

/// Split an entire property list for a `Population`/`Neuron`.
pub fn split_population_properties(properties: &[Property], sub_idx: u32, cap: u32, sub_size: u32) -> Vec<Property> {
    properties
        .iter()
        .filter_map(|p| split_population_property(p, sub_idx, cap, sub_size))
        .collect()
}

/// Split one `Property` for a `PostSynapse`: always windowed to the
/// destination sub-range.
pub fn split_post_synapse_property(property: &Property, dst_sub: u32, cap: u32, target_sub_size: u32) -> Option<Property> {
    split_population_property(property, dst_sub, cap, target_sub_size)
}

/// Split an entire property list for a `PostSynapse`.
pub fn split_post_synapse_properties(
    properties: &[Property],
    dst_sub: u32,
    cap: u32,
    target_sub_size: u32,
) -> Vec<Property> {
    properties
        .iter()
        .filter_map(|p| split_post_synapse_property(p, dst_sub, cap, target_sub_size))
        .collect()
}

/// Split one `Property` for a `WeightUpdate`.
pub fn split_weight_update_property(property: &Property, window: &WeightUpdateWindow) -> Option<Property> {
    match &property.value {
        PropertyValue::ValueList { entries } => {
            let windowed = split_value_list_weight_update(entries, window);
            if windowed.is_empty() {
                None
            } else {
                Some(Property::new(
                    property.name.clone(),
                    PropertyValue::ValueList { entries: windowed },
                ))
            }
        }
        other => Some(Property::new(property.name.clone(), other.clone())),
    }
}

/// Split an entire property list for a `WeightUpdate`.
pub fn split_weight_update_properties(properties: &[Property], window: &WeightUpdateWindow) -> Vec<Property> {
    properties
        .iter()
        .filter_map(|p| split_weight_update_property(p, window))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value_list(pairs: &[(u32, f64)]) -> Property {
        Property::new(
            "w",
            PropertyValue::ValueList {
                entries: pairs.iter().copied().collect(),
            },
        )
    }

    #[test]
    fn population_window_reindexes_to_zero_based() {
        let prop = value_list(&[(4, 1.0), (5, 2.0), (9, 3.0)]);
        let split = split_population_property(&prop, 1, 4, 4).unwrap();
        match split.value {
            PropertyValue::ValueList { entries } => {
                assert_eq!(entries.get(&0), Some(&1.0));
                assert_eq!(entries.get(&1), Some(&2.0));
                assert_eq!(entries.get(&5), None);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn population_window_drops_entirely_empty_list() {
        let prop = value_list(&[(0, 1.0)]);
        assert!(split_population_property(&prop, 1, 4, 4).is_none());
    }

    #[test]
    fn fixed_property_always_clones_through() {
        let prop = Property::new("tau", PropertyValue::Fixed { value: 20.0 });
        let split = split_population_property(&prop, 0, 4, 4).unwrap();
        assert_eq!(split.value, PropertyValue::Fixed { value: 20.0 });
    }

    #[test]
    fn flattened_window_reindexes_row_major_within_sub_block() {
        // src pop size 8, dst pop size 6, cap 4: global index = src*6+dst.
        // sub (src_sub=1, dst_sub=1): src in [4,8), dst in [4,6) (size 2).
        let mut entries = BTreeMap::new();
        entries.insert(4 * 6 + 4, 10.0); // (src=4,dst=4) -> local (0,0)
        entries.insert(5 * 6 + 5, 20.0); // (src=5,dst=5) -> local (1,1)
        entries.insert(0 * 6 + 0, 99.0); // outside window, dropped
        let prop = Property::new("w", PropertyValue::ValueList { entries });
        let window = WeightUpdateWindow::Flattened {
            src_sub: 1,
            src_sub_size: 4,
            dst_sub: 1,
            target_sub_size: 2,
            dst_pop_size: 6,
            cap: 4,
        };
        let split = split_weight_update_property(&prop, &window).unwrap();
        match split.value {
            PropertyValue::ValueList { entries } => {
                assert_eq!(entries.len(), 2);
                assert_eq!(entries.get(&(0 * 2 + 0)), Some(&10.0));
                assert_eq!(entries.get(&(1 * 2 + 1)), Some(&20.0));
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn by_instance_map_remaps_sparse_entries() {
        let mut entries = BTreeMap::new();
        entries.insert(3, 1.5);
        entries.insert(7, 2.5);
        let prop = Property::new("w", PropertyValue::ValueList { entries });
        let window = WeightUpdateWindow::ByInstanceMap {
            map: vec![(3, 0), (7, 1), (99, 2)],
        };
        let split = split_weight_update_property(&prop, &window).unwrap();
        match split.value {
            PropertyValue::ValueList { entries } => {
                assert_eq!(entries.get(&0), Some(&1.5));
                assert_eq!(entries.get(&1), Some(&2.5));
                assert_eq!(entries.get(&2), None);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn clone_verbatim_window_keeps_entries_unchanged() {
        let prop = value_list(&[(0, 1.0), (50, 2.0)]);
        let split = split_weight_update_property(&prop, &WeightUpdateWindow::CloneVerbatim).unwrap();
        match split.value {
            PropertyValue::ValueList { entries } => {
                assert_eq!(entries.get(&0), Some(&1.0));
                assert_eq!(entries.get(&50), Some(&2.0));
            }
            _ => unreachable!(),
        }
    }
}
