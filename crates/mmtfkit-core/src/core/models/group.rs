use crate::core::metadata::GroupRecord;

/// Borrowed view of one group (residue instance).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Group<'a> {
    pub group_index: u32,
    /// Chemical component identifier, e.g. `"HIS"` or `"ZN"`.
    pub chem_comp_id: &'a str,
    pub single_letter_code: char,
    /// Residue number from the source file.
    pub group_number: i32,
    /// Insertion code, `'\0'` when absent.
    pub ins_code: char,
    pub atom_start: u32,
    pub atom_count: u32,
    pub chain_index: u32,
    /// Index into the entity sequence, `-1` when the group is not part of it.
    pub sequence_index: i32,
    /// DSSP code as stored in the file, `-1` when undefined.
    pub sec_struct: i8,
    pub record: &'a GroupRecord,
}

impl Group<'_> {
    /// Atom indices belonging to this group.
    pub fn atom_range(&self) -> std::ops::Range<usize> {
        let start = self.atom_start as usize;
        start..start + self.atom_count as usize
    }
}
