//! `ComponentInfo`: the sizing-stage record built by the InfoPass before any
//! connections are materialized.

use crate::connection::ConnectivityKind;
use crate::error::{ModelError, Result};

/// One component's sizing information, as known after the InfoPass sees it
/// declared but before `calculate_dimensions` resolves derived sizes.
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentInfo {
    /// A top-level Population; its size is known directly from the XML.
    Population {
        /// Component name.
        name: String,
        /// Declared neuron count.
        size: u32,
    },
    /// A WeightUpdate component; its size is derived from its projection's
    /// endpoints and connectivity kind once every population has been seen.
    WeightUpdate {
        /// Component name.
        name: String,
        /// The peer population this projection targets (or originates from).
        proj_population: String,
        /// Size of the projection's source population.
        src_pop_size: u32,
        /// Size of the projection's destination population.
        dst_pop_size: u32,
        /// Declared connectivity kind.
        connectivity: ConnectivityKind,
        /// Instance count, known only for `ConnectionList` connectivity.
        list_count: Option<u32>,
        /// Resolved size, filled in by `calculate_dimensions`.
        size: Option<u32>,
    },
    /// A PostSynapse component; sized identically to its synapse's destination.
    PostSynapse {
        /// Component name.
        name: String,
        /// The peer population this projection targets.
        proj_population: String,
        /// Name of the sibling WeightUpdate within the same Synapse, whose
        /// resolved size this PostSynapse inherits.
        weight_update_name: String,
        /// Resolved size, filled in by `calculate_dimensions`.
        size: Option<u32>,
    },
}

impl ComponentInfo {
    /// The component's unique name.
    pub fn name(&self) -> &str {
        match self {
            ComponentInfo::Population { name, .. } => name,
            ComponentInfo::WeightUpdate { name, .. } => name,
            ComponentInfo::PostSynapse { name, .. } => name,
        }
    }

    /// The resolved size, if known. Populations are always resolved; others
    /// only after `calculate_dimensions` has run.
    pub fn size(&self) -> Option<u32> {
        match self {
            ComponentInfo::Population { size, .. } => Some(*size),
            ComponentInfo::WeightUpdate { size, .. } => *size,
            ComponentInfo::PostSynapse { size, .. } => *size,
        }
    }
}

/// Resolve the sizes of weight-update and post-synapse components:
/// all-to-all/fixed-probability → `src*dst`; one-to-one →
/// `src == dst` (else fatal); lists → `list_count`. PostSynapse always takes
/// the weight-update's resolved size for the same projection.
pub fn calculate_dimensions(infos: &mut [ComponentInfo]) -> Result<()> {
    // First resolve every WeightUpdate, since PostSynapse borrows its size.
    let mut wu_sizes: Vec<(String, u32)> = Vec::new();
    for info in infos.iter_mut() {
        if let ComponentInfo::WeightUpdate {
            name,
            src_pop_size,
            dst_pop_size,
            connectivity,
            list_count,
            size,
            ..
        } = info
        {
            let resolved = match connectivity {
                ConnectivityKind::AllToAll | ConnectivityKind::FixedProbability => {
                    (*src_pop_size as u64) * (*dst_pop_size as u64)
                }
                ConnectivityKind::OneToOne => {
                    if src_pop_size != dst_pop_size {
                        return Err(ModelError::OneToOneSizeMismatch {
                            src_name: name.clone(),
                            src_size: *src_pop_size,
                            dst_name: name.clone(),
                            dst_size: *dst_pop_size,
                        });
                    }
                    *src_pop_size as u64
                }
                ConnectivityKind::ConnectionList => list_count.ok_or_else(|| {
                    ModelError::invalid(format!(
                        "connection list count unknown for '{}' at dimension-resolution time",
                        name
                    ))
                })? as u64,
            };
            let resolved = u32::try_from(resolved).map_err(|_| {
                ModelError::invalid(format!("resolved size for '{}' overflows u32", name))
            })?;
            *size = Some(resolved);
            wu_sizes.push((name.clone(), resolved));
        }
    }

    for info in infos.iter_mut() {
        if let ComponentInfo::PostSynapse {
            weight_update_name,
            size,
            ..
        } = info
        {
            if let Some((_, wu_size)) = wu_sizes
                .iter()
                .find(|(wu_name, _)| wu_name == weight_update_name)
            {
                *size = Some(*wu_size);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_to_all_resolves_to_product() {
        let mut infos = vec![ComponentInfo::WeightUpdate {
            name: "wu".into(),
            proj_population: "B".into(),
            src_pop_size: 6,
            dst_pop_size: 5,
            connectivity: ConnectivityKind::AllToAll,
            list_count: None,
            size: None,
        }];
        calculate_dimensions(&mut infos).unwrap();
        assert_eq!(infos[0].size(), Some(30));
    }

    #[test]
    fn one_to_one_mismatch_is_fatal() {
        let mut infos = vec![ComponentInfo::WeightUpdate {
            name: "wu".into(),
            proj_population: "B".into(),
            src_pop_size: 6,
            dst_pop_size: 5,
            connectivity: ConnectivityKind::OneToOne,
            list_count: None,
            size: None,
        }];
        assert!(calculate_dimensions(&mut infos).is_err());
    }

    #[test]
    fn post_synapse_inherits_weight_update_size() {
        let mut infos = vec![
            ComponentInfo::WeightUpdate {
                name: "shared".into(),
                proj_population: "B".into(),
                src_pop_size: 3,
                dst_pop_size: 3,
                connectivity: ConnectivityKind::OneToOne,
                list_count: None,
                size: None,
            },
            ComponentInfo::PostSynapse {
                name: "ps".into(),
                proj_population: "B".into(),
                weight_update_name: "shared".into(),
                size: None,
            },
        ];
        calculate_dimensions(&mut infos).unwrap();
        assert_eq!(infos[1].size(), Some(3));
    }
}
