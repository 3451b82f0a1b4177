use super::atom::AtomSite;
use super::structure::Structure;
use crate::core::error::DecodeError;
use crate::core::metadata::{EntityRecord, GroupRecord};

/// Decoded, not yet validated structure fields, in MMTF field order.
///
/// Optional per-atom and per-group arrays fall back to defaults when absent:
/// b-factor `0.0`, occupancy `1.0`, alt loc and insertion code `'\0'`,
/// atom id `index + 1`, sequence index and secondary structure `-1`, chain
/// name equal to chain id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructureData {
    pub structure_id: String,
    pub title: Option<String>,
    pub num_atoms: usize,
    pub num_groups: usize,
    pub num_chains: usize,
    pub num_models: usize,

    pub group_list: Vec<GroupRecord>,
    pub group_type_list: Vec<i32>,
    pub group_id_list: Vec<i32>,
    pub ins_code_list: Option<Vec<char>>,
    pub sequence_index_list: Option<Vec<i32>>,
    pub sec_struct_list: Option<Vec<i32>>,

    pub x_coord_list: Vec<f64>,
    pub y_coord_list: Vec<f64>,
    pub z_coord_list: Vec<f64>,
    pub b_factor_list: Option<Vec<f64>>,
    pub occupancy_list: Option<Vec<f64>>,
    pub alt_loc_list: Option<Vec<char>>,
    pub atom_id_list: Option<Vec<i32>>,

    pub chain_id_list: Vec<String>,
    pub chain_name_list: Option<Vec<String>>,
    pub groups_per_chain: Vec<i32>,
    pub chains_per_model: Vec<i32>,

    pub entity_list: Vec<EntityRecord>,
}

fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<(), DecodeError> {
    if expected != actual {
        return Err(DecodeError::ArityMismatch {
            what,
            expected,
            actual,
        });
    }
    Ok(())
}

fn optional_or<T: Clone>(
    what: &'static str,
    list: Option<Vec<T>>,
    expected: usize,
    default: T,
) -> Result<Vec<T>, DecodeError> {
    match list {
        Some(values) => {
            check_len(what, expected, values.len())?;
            Ok(values)
        }
        None => Ok(vec![default; expected]),
    }
}

fn counts(what: &'static str, values: &[i32]) -> Result<Vec<u32>, DecodeError> {
    values
        .iter()
        .map(|&v| {
            u32::try_from(v).map_err(|_| DecodeError::ValueOutOfRange {
                value: i64::from(v),
                target: what,
            })
        })
        .collect()
}

fn starts_and_owners(per_owner: &[u32]) -> (Vec<u32>, Vec<u32>) {
    let mut starts = Vec::with_capacity(per_owner.len());
    let mut owners = Vec::new();
    let mut next = 0u32;
    for (owner, &count) in per_owner.iter().enumerate() {
        starts.push(next);
        next += count;
        owners.extend(std::iter::repeat_n(owner as u32, count as usize));
    }
    (starts, owners)
}

impl StructureData {
    /// Validates the decoded arrays against each other and joins them into an
    /// immutable [`Structure`].
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::ArityMismatch`] when any count disagrees: the
    /// atoms implied by group atom counts versus `num_atoms`, groups per chain
    /// versus `num_groups`, chains per model versus `num_chains`, or any
    /// per-atom / per-group array length versus its declared total.
    /// Returns [`DecodeError::IndexOutOfRange`] for a group type that does
    /// not exist in the group list.
    pub fn assemble(self) -> Result<Structure, DecodeError> {
        let n_atoms = self.num_atoms;
        let n_groups = self.num_groups;
        let n_chains = self.num_chains;

        check_len("group type list", n_groups, self.group_type_list.len())?;
        check_len("group id list", n_groups, self.group_id_list.len())?;
        check_len("x coordinate list", n_atoms, self.x_coord_list.len())?;
        check_len("y coordinate list", n_atoms, self.y_coord_list.len())?;
        check_len("z coordinate list", n_atoms, self.z_coord_list.len())?;
        check_len("chain id list", n_chains, self.chain_id_list.len())?;
        check_len("groups per chain list", n_chains, self.groups_per_chain.len())?;
        check_len("chains per model list", self.num_models, self.chains_per_model.len())?;

        let group_types = self
            .group_type_list
            .iter()
            .map(|&t| {
                usize::try_from(t)
                    .ok()
                    .filter(|&t| t < self.group_list.len())
                    .map(|t| t as u32)
                    .ok_or(DecodeError::IndexOutOfRange {
                        what: "group type",
                        index: i64::from(t),
                        len: self.group_list.len(),
                    })
            })
            .collect::<Result<Vec<u32>, _>>()?;

        let atoms_per_group: Vec<u32> = group_types
            .iter()
            .map(|&t| self.group_list[t as usize].atom_count() as u32)
            .collect();
        let implied_atoms: usize = atoms_per_group.iter().map(|&c| c as usize).sum();
        check_len("atoms implied by group atom counts", n_atoms, implied_atoms)?;

        let groups_per_chain = counts("groups per chain", &self.groups_per_chain)?;
        let implied_groups: usize = groups_per_chain.iter().map(|&c| c as usize).sum();
        check_len("groups implied by chain group counts", n_groups, implied_groups)?;

        let chains_per_model = counts("chains per model", &self.chains_per_model)?;
        let implied_chains: usize = chains_per_model.iter().map(|&c| c as usize).sum();
        check_len("chains implied by model chain counts", n_chains, implied_chains)?;

        let (group_atom_starts, atom_groups) = starts_and_owners(&atoms_per_group);
        let (chain_group_starts, group_chains) = starts_and_owners(&groups_per_chain);
        let (_, chain_models) = starts_and_owners(&chains_per_model);

        let atom_ids = match self.atom_id_list {
            Some(ids) => {
                check_len("atom id list", n_atoms, ids.len())?;
                ids
            }
            None => (1..=n_atoms as i32).collect(),
        };
        let occupancies = optional_or("occupancy list", self.occupancy_list, n_atoms, 1.0)?
            .into_iter()
            .map(|o| o as f32)
            .collect();
        let sec_structs = optional_or(
            "secondary structure list",
            self.sec_struct_list,
            n_groups,
            -1,
        )?
        .into_iter()
        .map(|s| {
            i8::try_from(s).map_err(|_| DecodeError::ValueOutOfRange {
                value: i64::from(s),
                target: "secondary structure code",
            })
        })
        .collect::<Result<Vec<i8>, _>>()?;
        let chain_names = optional_or(
            "chain name list",
            self.chain_name_list,
            n_chains,
            String::new(),
        )?;
        let chain_names = chain_names
            .into_iter()
            .zip(&self.chain_id_list)
            .map(|(name, id)| if name.is_empty() { id.clone() } else { name })
            .collect();

        Ok(Structure {
            structure_id: self.structure_id,
            title: self.title,
            atom_ids,
            x_coords: self.x_coord_list,
            y_coords: self.y_coord_list,
            z_coords: self.z_coord_list,
            b_factors: optional_or("b-factor list", self.b_factor_list, n_atoms, 0.0)?,
            occupancies,
            alt_locs: optional_or("alt loc list", self.alt_loc_list, n_atoms, '\0')?,
            atom_groups,
            group_list: self.group_list,
            group_types,
            group_numbers: self.group_id_list,
            ins_codes: optional_or("insertion code list", self.ins_code_list, n_groups, '\0')?,
            sequence_indices: optional_or(
                "sequence index list",
                self.sequence_index_list,
                n_groups,
                -1,
            )?,
            sec_structs,
            group_atom_starts,
            group_chains,
            chain_ids: self.chain_id_list,
            chain_names,
            chain_group_starts,
            groups_per_chain,
            chain_models,
            chains_per_model,
            entities: self.entity_list,
        })
    }
}

impl Structure {
    /// Disassembles the structure back into its field arrays, with every
    /// optional array present.
    pub fn to_data(&self) -> StructureData {
        StructureData {
            structure_id: self.structure_id.clone(),
            title: self.title.clone(),
            num_atoms: self.num_atoms(),
            num_groups: self.num_groups(),
            num_chains: self.num_chains(),
            num_models: self.num_models(),
            group_list: self.group_list.clone(),
            group_type_list: self.group_types.iter().map(|&t| t as i32).collect(),
            group_id_list: self.group_numbers.clone(),
            ins_code_list: Some(self.ins_codes.clone()),
            sequence_index_list: Some(self.sequence_indices.clone()),
            sec_struct_list: Some(self.sec_structs.iter().map(|&s| i32::from(s)).collect()),
            x_coord_list: self.x_coords.clone(),
            y_coord_list: self.y_coords.clone(),
            z_coord_list: self.z_coords.clone(),
            b_factor_list: Some(self.b_factors.clone()),
            occupancy_list: Some(self.occupancies.iter().map(|&o| f64::from(o)).collect()),
            alt_loc_list: Some(self.alt_locs.clone()),
            atom_id_list: Some(self.atom_ids.clone()),
            chain_id_list: self.chain_ids.clone(),
            chain_name_list: Some(self.chain_names.clone()),
            groups_per_chain: self.groups_per_chain.iter().map(|&c| c as i32).collect(),
            chains_per_model: self.chains_per_model.iter().map(|&c| c as i32).collect(),
            entity_list: self.entities.clone(),
        }
    }
}

/// Incremental model → chain → group → atom construction.
///
/// Missing enclosing levels are opened implicitly: a group started with no
/// chain opens chain `"A"`, and a chain started with no model opens a model.
/// Consistency is checked once, in [`build`](Self::build).
#[derive(Debug, Default)]
pub struct StructureBuilder {
    data: StructureData,
    atoms_added: Vec<usize>,
    orphan_atoms: usize,
}

impl StructureBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(&mut self, title: &str) -> &mut Self {
        self.data.title = Some(title.to_string());
        self
    }

    pub fn start_model(&mut self) -> &mut Self {
        self.data.chains_per_model.push(0);
        self.data.num_models += 1;
        self
    }

    pub fn start_chain(&mut self, id: &str, name: &str) -> &mut Self {
        if self.data.chains_per_model.is_empty() {
            self.start_model();
        }
        if let Some(last) = self.data.chains_per_model.last_mut() {
            *last += 1;
        }
        self.data.chain_id_list.push(id.to_string());
        self.data
            .chain_name_list
            .get_or_insert_with(Vec::new)
            .push(name.to_string());
        self.data.groups_per_chain.push(0);
        self.data.num_chains += 1;
        self
    }

    /// Opens a group instance of type `record`. Identical records share one
    /// entry in the group list.
    pub fn start_group(&mut self, record: GroupRecord, group_number: i32, ins_code: char) -> &mut Self {
        if self.data.groups_per_chain.is_empty() {
            self.start_chain("A", "A");
        }
        let type_index = match self.data.group_list.iter().position(|r| *r == record) {
            Some(i) => i,
            None => {
                self.data.group_list.push(record);
                self.data.group_list.len() - 1
            }
        };
        self.data.group_type_list.push(type_index as i32);
        self.data.group_id_list.push(group_number);
        self.data
            .ins_code_list
            .get_or_insert_with(Vec::new)
            .push(ins_code);
        self.data
            .sequence_index_list
            .get_or_insert_with(Vec::new)
            .push(-1);
        self.data
            .sec_struct_list
            .get_or_insert_with(Vec::new)
            .push(-1);
        if let Some(last) = self.data.groups_per_chain.last_mut() {
            *last += 1;
        }
        self.data.num_groups += 1;
        self.atoms_added.push(0);
        self
    }

    /// Sets the entity sequence position and DSSP code of the current group.
    /// Does nothing before the first group.
    pub fn annotate_group(&mut self, sequence_index: i32, sec_struct: i8) -> &mut Self {
        if self.data.num_groups == 0 {
            return self;
        }
        if let Some(last) = self
            .data
            .sequence_index_list
            .as_mut()
            .and_then(|l| l.last_mut())
        {
            *last = sequence_index;
        }
        if let Some(last) = self.data.sec_struct_list.as_mut().and_then(|l| l.last_mut()) {
            *last = i32::from(sec_struct);
        }
        self
    }

    /// Adds the next atom of the current group. Name and element are taken
    /// from the group record by position.
    pub fn add_atom(&mut self, site: AtomSite) -> &mut Self {
        let Some(count) = self.atoms_added.last_mut() else {
            self.orphan_atoms += 1;
            return self;
        };
        *count += 1;
        let data = &mut self.data;
        data.x_coord_list.push(site.position.x);
        data.y_coord_list.push(site.position.y);
        data.z_coord_list.push(site.position.z);
        data.b_factor_list
            .get_or_insert_with(Vec::new)
            .push(site.b_factor);
        data.occupancy_list
            .get_or_insert_with(Vec::new)
            .push(f64::from(site.occupancy));
        data.alt_loc_list
            .get_or_insert_with(Vec::new)
            .push(site.alt_loc_id);
        data.num_atoms += 1;
        data.atom_id_list
            .get_or_insert_with(Vec::new)
            .push(data.num_atoms as i32);
        self
    }

    pub fn add_entity(&mut self, entity: EntityRecord) -> &mut Self {
        self.data.entity_list.push(entity);
        self
    }

    /// Finishes construction.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::ArityMismatch`] if atoms were added outside a
    /// group, or a group received a different number of atoms than its
    /// record lists.
    pub fn build(self, structure_id: &str) -> Result<Structure, DecodeError> {
        check_len("atoms added outside a group", 0, self.orphan_atoms)?;
        for (group, &added) in self.atoms_added.iter().enumerate() {
            let type_index = self.data.group_type_list[group] as usize;
            check_len(
                "atoms added to group",
                self.data.group_list[type_index].atom_count(),
                added,
            )?;
        }
        let mut data = self.data;
        data.structure_id = structure_id.to_string();
        data.assemble()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn water() -> GroupRecord {
        GroupRecord::new("HOH", "NON-POLYMER", '?', &[("O", "O")])
    }

    fn two_waters() -> StructureData {
        StructureData {
            structure_id: "1WAT".into(),
            num_atoms: 2,
            num_groups: 2,
            num_chains: 1,
            num_models: 1,
            group_list: vec![water()],
            group_type_list: vec![0, 0],
            group_id_list: vec![1, 2],
            x_coord_list: vec![0.0, 3.0],
            y_coord_list: vec![0.0, 0.0],
            z_coord_list: vec![0.0, 0.0],
            chain_id_list: vec!["A".into()],
            groups_per_chain: vec![2],
            chains_per_model: vec![1],
            ..Default::default()
        }
    }

    #[test]
    fn assemble_fills_defaults_for_absent_optional_arrays() {
        let s = two_waters().assemble().unwrap();
        let atom = s.atom(1).unwrap();
        assert_eq!(atom.id, 2);
        assert_eq!(atom.occupancy, 1.0);
        assert_eq!(atom.alt_loc_id, '\0');
        assert_eq!(s.group(1).unwrap().sequence_index, -1);
        assert_eq!(s.chain(0).unwrap().name, "A");
    }

    #[test]
    fn group_atom_counts_must_sum_to_atom_total() {
        let mut data = two_waters();
        data.group_type_list = vec![0];
        data.group_id_list = vec![1];
        data.num_groups = 1;
        data.groups_per_chain = vec![1];
        assert_eq!(
            data.assemble(),
            Err(DecodeError::ArityMismatch {
                what: "atoms implied by group atom counts",
                expected: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn secondary_structure_codes_outside_i8_are_rejected() {
        let mut data = two_waters();
        data.sec_struct_list = Some(vec![200, 1]);
        assert_eq!(
            data.assemble(),
            Err(DecodeError::ValueOutOfRange {
                value: 200,
                target: "secondary structure code",
            })
        );
    }

    #[test]
    fn annotate_group_sets_current_group_only() {
        let mut builder = StructureBuilder::new();
        builder.annotate_group(5, 2);
        builder.start_group(water(), 1, '\0');
        builder.add_atom(AtomSite::at(0.0, 0.0, 0.0));
        builder.start_group(water(), 2, '\0');
        builder.annotate_group(7, 3);
        builder.add_atom(AtomSite::at(3.0, 0.0, 0.0));
        let s = builder.build("2WAT").unwrap();

        let first = s.group(0).unwrap();
        assert_eq!((first.sequence_index, first.sec_struct), (-1, -1));
        let second = s.group(1).unwrap();
        assert_eq!((second.sequence_index, second.sec_struct), (7, 3));
    }

    #[test]
    fn groups_per_chain_must_sum_to_group_total() {
        let mut data = two_waters();
        data.groups_per_chain = vec![3];
        assert!(matches!(
            data.assemble(),
            Err(DecodeError::ArityMismatch {
                what: "groups implied by chain group counts",
                ..
            })
        ));
    }

    #[test]
    fn chains_per_model_must_sum_to_chain_total() {
        let mut data = two_waters();
        data.chains_per_model = vec![2];
        assert!(matches!(
            data.assemble(),
            Err(DecodeError::ArityMismatch {
                what: "chains implied by model chain counts",
                ..
            })
        ));
    }

    #[test]
    fn coordinate_arrays_must_match_atom_total() {
        let mut data = two_waters();
        data.z_coord_list.pop();
        assert!(matches!(
            data.assemble(),
            Err(DecodeError::ArityMismatch {
                what: "z coordinate list",
                ..
            })
        ));
    }

    #[test]
    fn present_optional_array_must_have_full_length() {
        let mut data = two_waters();
        data.alt_loc_list = Some(vec!['A']);
        assert!(matches!(
            data.assemble(),
            Err(DecodeError::ArityMismatch {
                what: "alt loc list",
                ..
            })
        ));
    }

    #[test]
    fn unknown_group_type_is_out_of_range() {
        let mut data = two_waters();
        data.group_type_list = vec![0, 4];
        assert_eq!(
            data.assemble(),
            Err(DecodeError::IndexOutOfRange {
                what: "group type",
                index: 4,
                len: 1
            })
        );
    }

    #[test]
    fn negative_chain_group_count_is_rejected() {
        let mut data = two_waters();
        data.groups_per_chain = vec![-2];
        assert!(matches!(
            data.assemble(),
            Err(DecodeError::ValueOutOfRange { .. })
        ));
    }

    #[test]
    fn to_data_reassembles_to_an_equal_structure() {
        let s = two_waters().assemble().unwrap();
        assert_eq!(s.to_data().assemble().unwrap(), s);
    }

    #[test]
    fn builder_deduplicates_identical_group_records() {
        let mut builder = StructureBuilder::new();
        builder.start_group(water(), 1, '\0');
        builder.add_atom(AtomSite::at(0.0, 0.0, 0.0));
        builder.start_group(water(), 2, '\0');
        builder.add_atom(AtomSite::at(1.0, 0.0, 0.0));
        let s = builder.build("1WAT").unwrap();
        assert_eq!(s.group_list().len(), 1);
        assert_eq!(s.num_chains(), 1);
        assert_eq!(s.num_models(), 1);
    }

    #[test]
    fn builder_rejects_group_with_missing_atoms() {
        let mut builder = StructureBuilder::new();
        builder.start_group(
            GroupRecord::new("ALA", "L-PEPTIDE LINKING", 'A', &[("N", "N"), ("CA", "C")]),
            1,
            '\0',
        );
        builder.add_atom(AtomSite::at(0.0, 0.0, 0.0));
        assert_eq!(
            builder.build("1ALA").unwrap_err(),
            DecodeError::ArityMismatch {
                what: "atoms added to group",
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn builder_rejects_atoms_outside_a_group() {
        let mut builder = StructureBuilder::new();
        builder.add_atom(AtomSite::at(0.0, 0.0, 0.0));
        assert!(matches!(
            builder.build("1BAD"),
            Err(DecodeError::ArityMismatch {
                what: "atoms added outside a group",
                ..
            })
        ));
    }

    #[test]
    fn empty_builder_produces_empty_structure() {
        let s = StructureBuilder::new().build("EMPTY").unwrap();
        assert_eq!(s.num_atoms(), 0);
        assert_eq!(s.num_models(), 0);
    }
}
