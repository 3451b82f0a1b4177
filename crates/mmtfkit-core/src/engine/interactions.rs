use super::spatial::SpatialGrid;
use crate::core::error::ValidationError;
use crate::core::models::structure::Structure;
use serde::Serialize;
use tracing::{debug, instrument};

/// One atom pair within the cutoff, as a flat dataset row.
///
/// `residue1`/`atom1`/`element1`/`index1` describe the target-group atom.
/// Indices are 0-based positions in the structure's atom arrays.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InteractionRecord {
    #[serde(rename = "structureId")]
    pub structure_id: String,
    pub residue1: String,
    pub atom1: String,
    pub element1: String,
    pub index1: u32,
    pub residue2: String,
    pub atom2: String,
    pub element2: String,
    pub index2: u32,
    pub distance: f64,
}

/// Column names of [`InteractionRecord`] in output order.
pub const COLUMNS: [&str; 10] = [
    "structureId",
    "residue1",
    "atom1",
    "element1",
    "index1",
    "residue2",
    "atom2",
    "element2",
    "index2",
    "distance",
];

/// Lazy iterator over the interactions of one search.
///
/// Produced by [`find_interactions`]. Emission order is unspecified.
pub struct Interactions<'a> {
    structure: &'a Structure,
    grid: SpatialGrid,
    cutoff: f64,
    is_target_group: Vec<bool>,
    targets: std::vec::IntoIter<u32>,
    current: u32,
    pending: Vec<u32>,
}

/// Finds every atom pair within `cutoff` (inclusive) in which at least one
/// atom belongs to a group whose chemical component id is `target_group`.
///
/// Atoms of the same group instance are never paired, and in multi-model
/// structures only atoms of the same model are paired. When both atoms belong
/// to (different) target groups the pair is emitted once, with the lower atom
/// index as `residue1`. A target that matches no group yields an empty
/// iterator.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidCutoff`] if `cutoff` is not a positive
/// finite number.
#[instrument(skip(structure), fields(structure_id = structure.structure_id()))]
pub fn find_interactions<'a>(
    structure: &'a Structure,
    target_group: &str,
    cutoff: f64,
) -> Result<Interactions<'a>, ValidationError> {
    if !(cutoff.is_finite() && cutoff > 0.0) {
        return Err(ValidationError::InvalidCutoff(cutoff));
    }

    let is_target_group: Vec<bool> = (0..structure.num_groups())
        .map(|g| structure.chem_comp_id(g) == Some(target_group))
        .collect();
    let targets: Vec<u32> = structure
        .groups()
        .filter(|g| is_target_group[g.group_index as usize])
        .flat_map(|g| g.atom_range())
        .map(|i| i as u32)
        .collect();

    let grid = if targets.is_empty() {
        SpatialGrid::new(cutoff)?
    } else {
        SpatialGrid::from_points(
            (0..structure.num_atoms()).map(|i| structure.position(i)),
            cutoff,
        )?
    };
    debug!(
        target_atoms = targets.len(),
        occupied_cells = grid.occupied_cells(),
        "Prepared interaction search"
    );

    Ok(Interactions {
        structure,
        grid,
        cutoff,
        is_target_group,
        targets: targets.into_iter(),
        current: 0,
        pending: Vec::new(),
    })
}

impl Interactions<'_> {
    fn accepts(&self, target: usize, candidate: usize) -> Option<f64> {
        let s = self.structure;
        let target_group = s.group_of_atom(target)?;
        let candidate_group = s.group_of_atom(candidate)?;
        if target_group == candidate_group
            || s.model_of_group(target_group) != s.model_of_group(candidate_group)
        {
            return None;
        }
        if self.is_target_group[candidate_group] && candidate < target {
            return None;
        }
        let distance = (s.position(target) - s.position(candidate)).norm();
        (distance <= self.cutoff).then_some(distance)
    }

    fn record(&self, target: usize, candidate: usize, distance: f64) -> Option<InteractionRecord> {
        let s = self.structure;
        let a = s.atom(target)?;
        let b = s.atom(candidate)?;
        Some(InteractionRecord {
            structure_id: s.structure_id().to_string(),
            residue1: s.chem_comp_id(a.group_index as usize)?.to_string(),
            atom1: a.name.to_string(),
            element1: a.element.to_string(),
            index1: a.index,
            residue2: s.chem_comp_id(b.group_index as usize)?.to_string(),
            atom2: b.name.to_string(),
            element2: b.element.to_string(),
            index2: b.index,
            distance,
        })
    }
}

impl Iterator for Interactions<'_> {
    type Item = InteractionRecord;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            while let Some(candidate) = self.pending.pop() {
                let (target, candidate) = (self.current as usize, candidate as usize);
                if let Some(distance) = self.accepts(target, candidate) {
                    if let Some(record) = self.record(target, candidate, distance) {
                        return Some(record);
                    }
                }
            }
            self.current = self.targets.next()?;
            let position = self.structure.position(self.current as usize);
            self.pending.extend(self.grid.neighbors(&position));
        }
    }
}
