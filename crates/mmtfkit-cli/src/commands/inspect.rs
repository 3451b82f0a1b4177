use crate::cli::InspectArgs;
use crate::error::{CliError, Result};
use mmtfkit::core::io::mmtf::MmtfFile;
use mmtfkit::core::io::traits::StructureFile;
use mmtfkit::core::models::structure::Structure;
use std::collections::BTreeMap;
use std::fmt::Write;
use tracing::info;

pub fn run(args: InspectArgs) -> Result<()> {
    info!("Loading structure from {:?}", &args.input);
    let structure = MmtfFile::read_from_path(&args.input).map_err(|e| CliError::FileParsing {
        path: args.input.clone(),
        source: e.into(),
    })?;
    print!("{}", summarize(&structure, args.entities));
    Ok(())
}

/// Human-readable overview of a structure.
pub fn summarize(structure: &Structure, with_entities: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Structure:   {}", structure.structure_id());
    if let Some(title) = structure.title() {
        let _ = writeln!(out, "Title:       {}", title);
    }
    let _ = writeln!(
        out,
        "Contents:    {} model(s), {} chain(s), {} group(s), {} atom(s)",
        structure.num_models(),
        structure.num_chains(),
        structure.num_groups(),
        structure.num_atoms()
    );
    let _ = writeln!(
        out,
        "Alt locs:    {}",
        if structure.has_alternative_locations() {
            "yes"
        } else {
            "no"
        }
    );

    let chains: Vec<String> = structure
        .chains()
        .map(|c| format!("{}({})", c.id, c.group_count))
        .collect();
    let _ = writeln!(out, "Chains:      {}", chains.join(" "));

    let mut composition: BTreeMap<&str, usize> = BTreeMap::new();
    for group in structure.groups() {
        *composition.entry(group.chem_comp_id).or_default() += 1;
    }
    let composition: Vec<String> = composition
        .into_iter()
        .map(|(id, n)| format!("{id}x{n}"))
        .collect();
    let _ = writeln!(out, "Groups:      {}", composition.join(" "));

    if with_entities {
        for (i, entity) in structure.entities().iter().enumerate() {
            let chains = entity
                .chain_indices()
                .map(|c| {
                    c.iter()
                        .map(|i| i.to_string())
                        .collect::<Vec<_>>()
                        .join(",")
                })
                .unwrap_or_default();
            let _ = writeln!(
                out,
                "Entity {}:    {} [{}] chains {}",
                i,
                entity.description.as_deref().unwrap_or("?"),
                entity.entity_type.as_deref().unwrap_or("?"),
                chains
            );
        }
    }
    out
}
