use super::atom::Atom;
use super::chain::Chain;
use super::group::Group;
use crate::core::metadata::{EntityRecord, GroupRecord};
use nalgebra::Point3;

/// A decoded macromolecular structure in parallel-array layout.
///
/// Built once per input by [`StructureData::assemble`](super::builder::StructureData::assemble)
/// or [`StructureBuilder`](super::builder::StructureBuilder) and immutable
/// afterwards. All data is owned, so a `Structure` can be shared read-only
/// across threads.
#[derive(Debug, Clone, PartialEq)]
pub struct Structure {
    pub(crate) structure_id: String,
    pub(crate) title: Option<String>,

    pub(crate) atom_ids: Vec<i32>,
    pub(crate) x_coords: Vec<f64>,
    pub(crate) y_coords: Vec<f64>,
    pub(crate) z_coords: Vec<f64>,
    pub(crate) b_factors: Vec<f64>,
    pub(crate) occupancies: Vec<f32>,
    pub(crate) alt_locs: Vec<char>,
    /// Owning group of each atom, derived from group atom counts.
    pub(crate) atom_groups: Vec<u32>,

    pub(crate) group_list: Vec<GroupRecord>,
    pub(crate) group_types: Vec<u32>,
    pub(crate) group_numbers: Vec<i32>,
    pub(crate) ins_codes: Vec<char>,
    pub(crate) sequence_indices: Vec<i32>,
    pub(crate) sec_structs: Vec<i8>,
    pub(crate) group_atom_starts: Vec<u32>,
    pub(crate) group_chains: Vec<u32>,

    pub(crate) chain_ids: Vec<String>,
    pub(crate) chain_names: Vec<String>,
    pub(crate) chain_group_starts: Vec<u32>,
    pub(crate) groups_per_chain: Vec<u32>,
    pub(crate) chain_models: Vec<u32>,

    pub(crate) chains_per_model: Vec<u32>,
    pub(crate) entities: Vec<EntityRecord>,
}

impl Structure {
    pub fn structure_id(&self) -> &str {
        &self.structure_id
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn num_atoms(&self) -> usize {
        self.x_coords.len()
    }

    pub fn num_groups(&self) -> usize {
        self.group_types.len()
    }

    pub fn num_chains(&self) -> usize {
        self.chain_ids.len()
    }

    pub fn num_models(&self) -> usize {
        self.chains_per_model.len()
    }

    /// Distinct group records referenced by group instances.
    pub fn group_list(&self) -> &[GroupRecord] {
        &self.group_list
    }

    pub fn entities(&self) -> &[EntityRecord] {
        &self.entities
    }

    /// Coordinates of atom `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.num_atoms()`.
    #[inline]
    pub fn position(&self, index: usize) -> Point3<f64> {
        Point3::new(self.x_coords[index], self.y_coords[index], self.z_coords[index])
    }

    /// Index of the group owning atom `index`.
    pub fn group_of_atom(&self, index: usize) -> Option<usize> {
        self.atom_groups.get(index).map(|&g| g as usize)
    }

    /// Model that group `index` belongs to.
    pub fn model_of_group(&self, index: usize) -> Option<usize> {
        let chain = *self.group_chains.get(index)? as usize;
        self.chain_models.get(chain).map(|&m| m as usize)
    }

    /// Chemical component identifier of group `index`.
    pub fn chem_comp_id(&self, group_index: usize) -> Option<&str> {
        self.group_types
            .get(group_index)
            .and_then(|&t| self.group_list[t as usize].group_name.as_deref())
    }

    pub fn atom(&self, index: usize) -> Option<Atom<'_>> {
        let group_index = *self.atom_groups.get(index)? as usize;
        let record = &self.group_list[self.group_types[group_index] as usize];
        let offset = index - self.group_atom_starts[group_index] as usize;
        Some(Atom {
            index: index as u32,
            id: self.atom_ids[index],
            name: record.atom_name_list.get(offset).map_or("", String::as_str),
            element: record.element_list.get(offset).map_or("", String::as_str),
            position: self.position(index),
            b_factor: self.b_factors[index],
            alt_loc_id: self.alt_locs[index],
            occupancy: self.occupancies[index],
            group_index: group_index as u32,
        })
    }

    pub fn atoms(&self) -> impl Iterator<Item = Atom<'_>> + '_ {
        (0..self.num_atoms()).filter_map(move |i| self.atom(i))
    }

    pub fn group(&self, index: usize) -> Option<Group<'_>> {
        let record = &self.group_list[*self.group_types.get(index)? as usize];
        Some(Group {
            group_index: index as u32,
            chem_comp_id: record.group_name.as_deref().unwrap_or(""),
            single_letter_code: record.single_letter(),
            group_number: self.group_numbers[index],
            ins_code: self.ins_codes[index],
            atom_start: self.group_atom_starts[index],
            atom_count: record.atom_count() as u32,
            chain_index: self.group_chains[index],
            sequence_index: self.sequence_indices[index],
            sec_struct: self.sec_structs[index],
            record,
        })
    }

    pub fn groups(&self) -> impl Iterator<Item = Group<'_>> + '_ {
        (0..self.num_groups()).filter_map(move |i| self.group(i))
    }

    pub fn chain(&self, index: usize) -> Option<Chain<'_>> {
        Some(Chain {
            chain_index: index as u32,
            id: self.chain_ids.get(index).map(String::as_str)?,
            name: &self.chain_names[index],
            group_start: self.chain_group_starts[index],
            group_count: self.groups_per_chain[index],
            model_index: self.chain_models[index],
        })
    }

    pub fn chains(&self) -> impl Iterator<Item = Chain<'_>> + '_ {
        (0..self.num_chains()).filter_map(move |i| self.chain(i))
    }

    /// Number of chains in each model, in model order.
    pub fn chains_per_model(&self) -> &[u32] {
        &self.chains_per_model
    }

    /// Whether any atom carries an alternate location identifier.
    pub fn has_alternative_locations(&self) -> bool {
        self.alt_locs.iter().any(|&c| c != '\0')
    }
}

#[cfg(test)]
mod tests {
    use crate::core::metadata::{EntityRecord, GroupRecord};
    use crate::core::models::atom::AtomSite;
    use crate::core::models::builder::StructureBuilder;
    use crate::core::models::structure::Structure;
    use nalgebra::Point3;

    fn zinc_site() -> Structure {
        let his = GroupRecord::new(
            "HIS",
            "L-PEPTIDE LINKING",
            'H',
            &[("N", "N"), ("CA", "C"), ("NE2", "N")],
        );
        let zn = GroupRecord::new("ZN", "NON-POLYMER", '?', &[("ZN", "Zn")]);

        let mut builder = StructureBuilder::new();
        builder.start_model();
        builder.start_chain("A", "A");
        builder.start_group(his.clone(), 57, '\0');
        builder.add_atom(AtomSite::at(0.0, 0.0, 0.0));
        builder.add_atom(AtomSite::at(1.5, 0.0, 0.0));
        builder.add_atom(AtomSite::at(2.0, 1.0, 0.0).with_alt_loc('A'));
        builder.start_group(his, 63, 'A');
        builder.add_atom(AtomSite::at(5.0, 0.0, 0.0));
        builder.add_atom(AtomSite::at(6.0, 0.0, 0.0));
        builder.add_atom(AtomSite::at(7.0, 0.0, 0.0));
        builder.start_chain("B", "A");
        builder.start_group(zn, 401, '\0');
        builder.add_atom(AtomSite::at(3.0, 1.0, 0.0));
        builder.add_entity(EntityRecord::new("ZINC ION", "non-polymer", "", &[1]));
        builder.build("1ZNC").unwrap()
    }

    #[test]
    fn counts_reflect_construction() {
        let s = zinc_site();
        assert_eq!(s.structure_id(), "1ZNC");
        assert_eq!(s.num_atoms(), 7);
        assert_eq!(s.num_groups(), 3);
        assert_eq!(s.num_chains(), 2);
        assert_eq!(s.num_models(), 1);
        assert_eq!(s.group_list().len(), 2);
        assert_eq!(s.entities().len(), 1);
    }

    #[test]
    fn atom_view_resolves_names_from_group_record() {
        let s = zinc_site();
        let atom = s.atom(5).unwrap();
        assert_eq!(atom.name, "NE2");
        assert_eq!(atom.element, "N");
        assert_eq!(atom.group_index, 1);
        assert_eq!(atom.id, 6);
        assert_eq!(atom.position, Point3::new(7.0, 0.0, 0.0));
        assert!(s.atom(7).is_none());
    }

    #[test]
    fn every_atom_refers_to_exactly_one_group() {
        let s = zinc_site();
        let groups: Vec<_> = s.atoms().map(|a| a.group_index).collect();
        assert_eq!(groups, vec![0, 0, 0, 1, 1, 1, 2]);
        for group in s.groups() {
            for i in group.atom_range() {
                assert_eq!(s.group_of_atom(i), Some(group.group_index as usize));
            }
        }
    }

    #[test]
    fn group_view_exposes_instance_properties() {
        let s = zinc_site();
        let g = s.group(1).unwrap();
        assert_eq!(g.chem_comp_id, "HIS");
        assert_eq!(g.single_letter_code, 'H');
        assert_eq!(g.group_number, 63);
        assert_eq!(g.ins_code, 'A');
        assert_eq!(g.atom_start, 3);
        assert_eq!(g.atom_count, 3);
        assert_eq!(g.chain_index, 0);
        assert_eq!(s.chem_comp_id(2), Some("ZN"));
    }

    #[test]
    fn chain_view_exposes_group_span_and_model() {
        let s = zinc_site();
        let b = s.chain(1).unwrap();
        assert_eq!(b.id, "B");
        assert_eq!(b.name, "A");
        assert_eq!(b.group_range(), 2..3);
        assert_eq!(b.model_index, 0);
        assert!(s.chain(2).is_none());
    }

    #[test]
    fn detects_alternative_locations() {
        assert!(zinc_site().has_alternative_locations());

        let mut builder = StructureBuilder::new();
        builder.start_group(GroupRecord::new("HOH", "NON-POLYMER", '?', &[("O", "O")]), 1, '\0');
        builder.add_atom(AtomSite::at(0.0, 0.0, 0.0));
        assert!(!builder.build("1HOH").unwrap().has_alternative_locations());
    }
}
