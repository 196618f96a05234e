#![allow(dead_code)]

pub mod bbox;
pub mod errors;
pub mod fuse;
pub mod interactivity;
pub mod metrics;
pub mod model;
pub mod optimize;
pub mod paint_order;
pub mod pipeline;
pub mod serialize;
pub mod simplify;
pub mod snapshot;

pub use errors::ProjectionError;
pub use model::{
    AxFacts, Bounds, ComputedStyles, EnhancedDomNode, NodeType, ScrollInfo, SelectorMap,
    SerializedDomState, SimplifiedNode, SnapshotFacts, VirtualChild,
};
pub use pipeline::build;
