/// Borrowed view of one chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chain<'a> {
    pub chain_index: u32,
    /// Label asym id, e.g. `"A"`.
    pub id: &'a str,
    /// Author chain name.
    pub name: &'a str,
    pub group_start: u32,
    pub group_count: u32,
    pub model_index: u32,
}

impl Chain<'_> {
    /// Group indices belonging to this chain.
    pub fn group_range(&self) -> std::ops::Range<usize> {
        let start = self.group_start as usize;
        start..start + self.group_count as usize
    }
}
