// src/transform/registry.rs
//! Name-keyed lookup of the available transformers.

use super::{IdentityTransformer, KmerLayout, PermutationTransformer, Transformer};
use crate::error::ConfigurationError;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Selectors accepted by [`TransformerKind::from_str`], as shown in the CLI help.
pub const AVAILABLE_METHODS: &[&str] = &[
    "identity",
    "random",
    "random_nucl",
    "inverse",
    "cyclic[=<pos>]",
    "zigzag",
    "permutation=<i0,i1,...>",
];

/// Every transformer the index can be built with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformerKind {
    Identity,
    RandomPermutation,
    Inverse,
    /// Rotation starting at the given position; 1 when no position is given.
    Cyclic(usize),
    ZigZag,
    /// A user supplied permutation of `[0, k)`, validated against the layout in [`build`](Self::build).
    Explicit(Vec<usize>),
}

impl TransformerKind {
    pub fn build(&self, layout: KmerLayout) -> Result<Arc<dyn Transformer>, ConfigurationError> {
        let transformer: Arc<dyn Transformer> = match self {
            TransformerKind::Identity => Arc::new(IdentityTransformer::new(layout)),
            TransformerKind::RandomPermutation => Arc::new(PermutationTransformer::random(layout)),
            TransformerKind::Inverse => Arc::new(PermutationTransformer::inverse(layout)),
            TransformerKind::Cyclic(pivot) => Arc::new(PermutationTransformer::cyclic_from(layout, *pivot)),
            TransformerKind::ZigZag => Arc::new(PermutationTransformer::zigzag(layout)),
            TransformerKind::Explicit(permutation) => {
                Arc::new(PermutationTransformer::new(layout, permutation.clone(), None)?)
            }
        };
        Ok(transformer)
    }
}

impl FromStr for TransformerKind {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let selector = s.trim();
        let unknown = || ConfigurationError::UnknownTransformer(selector.to_string());

        if let Some(positions) = selector.strip_prefix("permutation=") {
            let permutation = positions
                .split(',')
                .map(|p| p.trim().parse::<usize>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|_| unknown())?;
            return Ok(TransformerKind::Explicit(permutation));
        }
        if let Some(pivot) = selector.strip_prefix("cyclic=") {
            let pivot = pivot.trim().parse::<usize>().map_err(|_| unknown())?;
            return Ok(TransformerKind::Cyclic(pivot));
        }

        match selector.to_ascii_lowercase().as_str() {
            "identity" => Ok(TransformerKind::Identity),
            "random" | "random_nucl" => Ok(TransformerKind::RandomPermutation),
            "inverse" => Ok(TransformerKind::Inverse),
            "cyclic" => Ok(TransformerKind::Cyclic(1)),
            "zigzag" => Ok(TransformerKind::ZigZag),
            _ => Err(unknown()),
        }
    }
}

impl fmt::Display for TransformerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransformerKind::Identity => write!(f, "identity"),
            TransformerKind::RandomPermutation => write!(f, "random"),
            TransformerKind::Inverse => write!(f, "inverse"),
            TransformerKind::Cyclic(1) => write!(f, "cyclic"),
            TransformerKind::Cyclic(pivot) => write!(f, "cyclic={}", pivot),
            TransformerKind::ZigZag => write!(f, "zigzag"),
            TransformerKind::Explicit(permutation) => {
                let positions: Vec<String> = permutation.iter().map(|p| p.to_string()).collect();
                write!(f, "permutation={}", positions.join(","))
            }
        }
    }
}
