//! Typed in-memory representation of a SpineML Low-Level network.
//!
//! This crate owns no I/O: `spinesplit-parser` builds these types from XML,
//! `spinesplit-split` transforms them, and `spinesplit-writers` serializes
//! them back out. Every polymorphic shape (`PropertyValue`,
//! `AbstractionConnection`, `ComponentInfo`) is a tagged `enum` consumed with
//! an exhaustive `match` — there is no dynamic dispatch in the model layer.

pub mod component;
pub mod connection;
pub mod error;
pub mod experiment;
pub mod ids;
pub mod input;
pub mod mode;
pub mod neuron;
pub mod population;
pub mod projection;
pub mod property;
pub mod synapse;

pub use component::{calculate_dimensions, ComponentInfo};
pub use connection::{AbstractionConnection, ConnectionInstance, ConnectionMatrix, ConnectivityKind, Orientation};
pub use error::{ModelError, Result};
pub use experiment::{EulerIntegration, Experiment, LogOutput};
pub use ids::{GlobalPlacement, NeuronIndex};
pub use input::Input;
pub use mode::{SplitterMode, SplitterModeCell};
pub use neuron::Neuron;
pub use population::{sub_count, sub_name, sub_pair_name, sub_population_size, Population};
pub use projection::Projection;
pub use property::{clone_delay, Property, PropertyValue};
pub use synapse::{PostSynapse, Synapse, WeightUpdate};

/// Default build-time bound on a sub-population's size.
pub const DEFAULT_CAP: u32 = 100;
