use crate::cli::ConvertArgs;
use crate::error::{CliError, Result};
use mmtfkit::core::io::mmtf::{MmtfFile, MmtfWriteOptions};
use mmtfkit::core::io::traits::StructureFile;
use tracing::info;

pub fn run(args: ConvertArgs) -> Result<()> {
    info!("Loading structure from {:?}", &args.input);
    let structure = MmtfFile::read_from_path(&args.input).map_err(|e| CliError::FileParsing {
        path: args.input.clone(),
        source: e.into(),
    })?;

    let options = MmtfWriteOptions {
        compressed: args.gzip,
    };
    MmtfFile::write_to_path(&structure, &options, &args.output).map_err(|e| {
        CliError::FileParsing {
            path: args.output.clone(),
            source: e.into(),
        }
    })?;

    println!(
        "✓ {} ({} atoms) written to: {}",
        structure.structure_id(),
        structure.num_atoms(),
        args.output.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mmtfkit::core::metadata::GroupRecord;
    use mmtfkit::core::models::atom::AtomSite;
    use mmtfkit::core::models::builder::StructureBuilder;

    #[test]
    fn compresses_plain_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("1hoh.mmtf");
        let output = dir.path().join("1hoh.mmtf.gz");

        let mut builder = StructureBuilder::new();
        builder.start_group(GroupRecord::new("HOH", "NON-POLYMER", '?', &[("O", "O")]), 1, '\0');
        builder.add_atom(AtomSite::at(1.0, 2.0, 3.0));
        let structure = builder.build("1HOH").unwrap();
        MmtfFile::write_to_path(&structure, &MmtfWriteOptions::default(), &input).unwrap();

        run(ConvertArgs {
            input,
            output: output.clone(),
            gzip: true,
        })
        .unwrap();

        let bytes = std::fs::read(&output).unwrap();
        assert_eq!(&bytes[..2], &[0x1f, 0x8b]);
        let decoded = MmtfFile::read_bytes(&bytes).unwrap();
        assert_eq!(decoded.structure_id(), "1HOH");
        assert_eq!(decoded.num_atoms(), 1);
    }

    #[test]
    fn unreadable_input_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("missing.mmtf");
        let err = run(ConvertArgs {
            input: input.clone(),
            output: dir.path().join("out.mmtf"),
            gzip: false,
        })
        .unwrap_err();
        assert!(matches!(err, CliError::FileParsing { path, .. } if path == input));
    }
}
