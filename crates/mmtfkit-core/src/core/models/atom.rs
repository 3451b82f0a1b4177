use nalgebra::Point3;

/// Borrowed view of one atom in a [`Structure`](super::structure::Structure).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Atom<'a> {
    /// Position of the atom in the structure's atom arrays.
    pub index: u32,
    /// Serial number from the source file.
    pub id: i32,
    pub name: &'a str,
    pub element: &'a str,
    pub position: Point3<f64>,
    pub b_factor: f64,
    /// `'\0'` when the atom has no alternate location.
    pub alt_loc_id: char,
    pub occupancy: f32,
    pub group_index: u32,
}

/// Per-atom input for [`StructureBuilder`](super::builder::StructureBuilder).
///
/// Name and element come from the owning group's record, so only the
/// per-instance properties are carried here.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AtomSite {
    pub position: Point3<f64>,
    pub b_factor: f64,
    pub occupancy: f32,
    pub alt_loc_id: char,
}

impl AtomSite {
    /// An atom at `(x, y, z)` with full occupancy and no alternate location.
    pub fn at(x: f64, y: f64, z: f64) -> Self {
        Self {
            position: Point3::new(x, y, z),
            b_factor: 0.0,
            occupancy: 1.0,
            alt_loc_id: '\0',
        }
    }

    pub fn with_alt_loc(mut self, alt_loc_id: char) -> Self {
        self.alt_loc_id = alt_loc_id;
        self
    }

    pub fn with_occupancy(mut self, occupancy: f32) -> Self {
        self.occupancy = occupancy;
        self
    }

    pub fn with_b_factor(mut self, b_factor: f64) -> Self {
        self.b_factor = b_factor;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn site_defaults_to_full_occupancy_without_alt_loc() {
        let site = AtomSite::at(1.0, 2.0, 3.0);
        assert_eq!(site.position, Point3::new(1.0, 2.0, 3.0));
        assert_eq!(site.occupancy, 1.0);
        assert_eq!(site.alt_loc_id, '\0');
        assert_eq!(site.b_factor, 0.0);
    }

    #[test]
    fn site_modifiers_override_defaults() {
        let site = AtomSite::at(0.0, 0.0, 0.0)
            .with_alt_loc('A')
            .with_occupancy(0.5)
            .with_b_factor(12.5);
        assert_eq!(site.alt_loc_id, 'A');
        assert_eq!(site.occupancy, 0.5);
        assert_eq!(site.b_factor, 12.5);
    }
}
