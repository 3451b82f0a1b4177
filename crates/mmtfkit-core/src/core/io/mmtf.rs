use super::msgpack;
use super::traits::StructureFile;
use crate::core::codec::{DecodedArray, Strategy, decode_binary, encode_binary};
use crate::core::error::{DecodeError, ValidationError};
use crate::core::metadata::{RawRecord, RawValue, normalize_entity, normalize_group};
use crate::core::models::builder::StructureData;
use crate::core::models::structure::Structure;
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use std::io::{self, Read, Write};
use thiserror::Error;
use tracing::debug;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const MMTF_VERSION: &str = "1.0.0";
const MMTF_PRODUCER: &str = concat!("mmtfkit/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum MmtfError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Malformed MessagePack: {0}")]
    MsgPack(String),
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
    #[error("Field '{field}' could not be decoded: {source}")]
    Field {
        field: &'static str,
        #[source]
        source: DecodeError,
    },
    #[error("Structure is inconsistent: {0}")]
    Decode(#[from] DecodeError),
    #[error("Invalid metadata: {0}")]
    Validation(#[from] ValidationError),
}

/// Options for [`MmtfFile::write_to`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MmtfWriteOptions {
    /// Gzip-compress the encoded MessagePack.
    pub compressed: bool,
}

/// The MMTF container: a MessagePack map of header fields and binary arrays,
/// optionally gzip compressed.
pub struct MmtfFile;

impl MmtfFile {
    /// Decodes a structure from an in-memory MMTF buffer. Gzip input is
    /// detected by its magic bytes.
    ///
    /// # Errors
    ///
    /// Returns [`MmtfError::MissingField`] when a required field is absent,
    /// [`MmtfError::Field`] when a binary array cannot be decoded, and
    /// [`MmtfError::Decode`] when the decoded arrays disagree with each other.
    pub fn read_bytes(bytes: &[u8]) -> Result<Structure, MmtfError> {
        let data = decompress_if_gzip(bytes)?;
        let root = msgpack::decode(&data)?;
        if !matches!(root, RawValue::Map(_)) {
            return Err(MmtfError::MsgPack("top-level value is not a map".into()));
        }
        let structure = read_structure(&root)?;
        debug!(
            structure_id = structure.structure_id(),
            atoms = structure.num_atoms(),
            groups = structure.num_groups(),
            "Decoded MMTF structure"
        );
        Ok(structure)
    }

    /// Encodes `structure` with the canonical MMTF strategies.
    ///
    /// # Errors
    ///
    /// Returns [`MmtfError::Field`] when a value does not fit its field's
    /// wire type (for example a chain id longer than four bytes).
    pub fn write_bytes(structure: &Structure, compressed: bool) -> Result<Vec<u8>, MmtfError> {
        let encoded = msgpack::encode(&write_structure(structure)?)?;
        if !compressed {
            return Ok(encoded);
        }
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&encoded)?;
        Ok(encoder.finish()?)
    }
}

impl StructureFile for MmtfFile {
    type Options = MmtfWriteOptions;
    type Error = MmtfError;

    fn read_from(reader: &mut impl Read) -> Result<Structure, Self::Error> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Self::read_bytes(&bytes)
    }

    fn write_to(
        structure: &Structure,
        options: &Self::Options,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error> {
        writer.write_all(&Self::write_bytes(structure, options.compressed)?)?;
        Ok(())
    }
}

fn decompress_if_gzip(bytes: &[u8]) -> Result<Vec<u8>, MmtfError> {
    if bytes.starts_with(&GZIP_MAGIC) {
        let mut decoder = GzDecoder::new(bytes);
        let mut out = Vec::new();
        decoder.read_to_end(&mut out)?;
        Ok(out)
    } else {
        Ok(bytes.to_vec())
    }
}

fn required<'a>(root: &'a RawValue, field: &'static str) -> Result<&'a RawValue, MmtfError> {
    root.get(field).ok_or(MmtfError::MissingField(field))
}

fn field_error(field: &'static str) -> impl Fn(DecodeError) -> MmtfError {
    move |source| MmtfError::Field { field, source }
}

fn count(root: &RawValue, field: &'static str) -> Result<usize, MmtfError> {
    let value = required(root, field)?;
    let raw = value.as_i64().ok_or(ValidationError::UnexpectedType {
        field: field.to_string(),
        expected: "integer",
    })?;
    usize::try_from(raw).map_err(|_| {
        field_error(field)(DecodeError::ValueOutOfRange {
            value: raw,
            target: "count",
        })
    })
}

fn int_list(root: &RawValue, field: &'static str) -> Result<Vec<i32>, MmtfError> {
    required(root, field)?
        .to_int_list(field)?
        .into_iter()
        .map(|v| {
            i32::try_from(v).map_err(|_| {
                field_error(field)(DecodeError::ValueOutOfRange {
                    value: v,
                    target: "i32",
                })
            })
        })
        .collect()
}

fn binary(root: &RawValue, field: &'static str) -> Result<Option<DecodedArray>, MmtfError> {
    match root.get(field) {
        None | Some(RawValue::Nil) => Ok(None),
        Some(RawValue::Bytes(bytes)) => decode_binary(bytes).map(Some).map_err(field_error(field)),
        Some(_) => Err(ValidationError::UnexpectedType {
            field: field.to_string(),
            expected: "binary array",
        }
        .into()),
    }
}

fn required_binary(root: &RawValue, field: &'static str) -> Result<DecodedArray, MmtfError> {
    binary(root, field)?.ok_or(MmtfError::MissingField(field))
}

fn optional_text(root: &RawValue, field: &'static str) -> Result<Option<String>, MmtfError> {
    match root.get(field) {
        None | Some(RawValue::Nil) => Ok(None),
        Some(value) => Ok(Some(value.to_text(field)?)),
    }
}

fn records(root: &RawValue, field: &'static str) -> Result<Vec<RawRecord>, MmtfError> {
    let items = match root.get(field) {
        None | Some(RawValue::Nil) => return Ok(Vec::new()),
        Some(RawValue::Array(items)) => items,
        Some(_) => {
            return Err(ValidationError::UnexpectedType {
                field: field.to_string(),
                expected: "list of maps",
            }
            .into());
        }
    };
    Ok(items
        .iter()
        .map(|item| item.to_record(field))
        .collect::<Result<_, _>>()?)
}

fn read_structure(root: &RawValue) -> Result<Structure, MmtfError> {
    let structure_id = required(root, "structureId")?.to_text("structureId")?;

    required(root, "groupList")?;
    let group_list = records(root, "groupList")?
        .iter()
        .map(normalize_group)
        .collect::<Result<Vec<_>, _>>()?;
    let entity_list = records(root, "entityList")?
        .iter()
        .map(normalize_entity)
        .collect::<Result<Vec<_>, _>>()?;

    let floats = |field: &'static str| -> Result<Vec<f64>, MmtfError> {
        required_binary(root, field)?
            .into_floats()
            .map_err(field_error(field))
    };
    let ints = |field: &'static str| -> Result<Vec<i32>, MmtfError> {
        required_binary(root, field)?
            .into_ints()
            .map_err(field_error(field))
    };

    let data = StructureData {
        structure_id,
        title: optional_text(root, "title")?,
        num_atoms: count(root, "numAtoms")?,
        num_groups: count(root, "numGroups")?,
        num_chains: count(root, "numChains")?,
        num_models: count(root, "numModels")?,
        group_list,
        group_type_list: ints("groupTypeList")?,
        group_id_list: ints("groupIdList")?,
        ins_code_list: binary(root, "insCodeList")?
            .map(|a| a.into_chars().map_err(field_error("insCodeList")))
            .transpose()?,
        sequence_index_list: binary(root, "sequenceIndexList")?
            .map(|a| a.into_ints().map_err(field_error("sequenceIndexList")))
            .transpose()?,
        sec_struct_list: binary(root, "secStructList")?
            .map(|a| a.into_ints().map_err(field_error("secStructList")))
            .transpose()?,
        x_coord_list: floats("xCoordList")?,
        y_coord_list: floats("yCoordList")?,
        z_coord_list: floats("zCoordList")?,
        b_factor_list: binary(root, "bFactorList")?
            .map(|a| a.into_floats().map_err(field_error("bFactorList")))
            .transpose()?,
        occupancy_list: binary(root, "occupancyList")?
            .map(|a| a.into_floats().map_err(field_error("occupancyList")))
            .transpose()?,
        alt_loc_list: binary(root, "altLocList")?
            .map(|a| a.into_chars().map_err(field_error("altLocList")))
            .transpose()?,
        atom_id_list: binary(root, "atomIdList")?
            .map(|a| a.into_ints().map_err(field_error("atomIdList")))
            .transpose()?,
        chain_id_list: required_binary(root, "chainIdList")?
            .into_text()
            .map_err(field_error("chainIdList"))?,
        chain_name_list: binary(root, "chainNameList")?
            .map(|a| a.into_text().map_err(field_error("chainNameList")))
            .transpose()?,
        groups_per_chain: int_list(root, "groupsPerChain")?,
        chains_per_model: int_list(root, "chainsPerModel")?,
        entity_list,
    };
    Ok(data.assemble()?)
}

fn text(key: &str) -> RawValue {
    RawValue::Text(key.to_string())
}

fn int_array(values: &[i32]) -> RawValue {
    RawValue::Array(values.iter().map(|&v| RawValue::Int(i64::from(v))).collect())
}

fn encode_field(
    field: &'static str,
    array: DecodedArray,
    strategy: Strategy,
    param: i32,
) -> Result<(RawValue, RawValue), MmtfError> {
    let bytes = encode_binary(&array, strategy, param).map_err(field_error(field))?;
    Ok((text(field), RawValue::Bytes(bytes)))
}

fn write_structure(structure: &Structure) -> Result<RawValue, MmtfError> {
    let data = structure.to_data();
    let as_count = |n: usize| RawValue::Int(n as i64);

    let mut entries = vec![
        (text("mmtfVersion"), text(MMTF_VERSION)),
        (text("mmtfProducer"), text(MMTF_PRODUCER)),
        (text("structureId"), text(&data.structure_id)),
        (text("numAtoms"), as_count(data.num_atoms)),
        (text("numGroups"), as_count(data.num_groups)),
        (text("numChains"), as_count(data.num_chains)),
        (text("numModels"), as_count(data.num_models)),
        (text("numBonds"), RawValue::Int(0)),
        (
            text("groupList"),
            RawValue::Array(data.group_list.iter().map(|g| g.to_raw()).collect()),
        ),
        (
            text("entityList"),
            RawValue::Array(data.entity_list.iter().map(|e| e.to_raw()).collect()),
        ),
        (text("groupsPerChain"), int_array(&data.groups_per_chain)),
        (text("chainsPerModel"), int_array(&data.chains_per_model)),
    ];
    if let Some(title) = &data.title {
        entries.push((text("title"), text(title)));
    }

    let coords = Strategy::RecursiveDeltaFloat;
    entries.extend([
        encode_field("xCoordList", DecodedArray::Float(data.x_coord_list), coords, 1000)?,
        encode_field("yCoordList", DecodedArray::Float(data.y_coord_list), coords, 1000)?,
        encode_field("zCoordList", DecodedArray::Float(data.z_coord_list), coords, 1000)?,
        encode_field(
            "bFactorList",
            DecodedArray::Float(data.b_factor_list.unwrap_or_default()),
            Strategy::RecursiveDeltaFloat,
            100,
        )?,
        encode_field(
            "occupancyList",
            DecodedArray::Float(data.occupancy_list.unwrap_or_default()),
            Strategy::RunLengthFloat,
            100,
        )?,
        encode_field(
            "altLocList",
            DecodedArray::Char(data.alt_loc_list.unwrap_or_default()),
            Strategy::RunLengthChar,
            0,
        )?,
        encode_field(
            "atomIdList",
            DecodedArray::Int(data.atom_id_list.unwrap_or_default()),
            Strategy::RunLengthDelta,
            0,
        )?,
        encode_field(
            "groupIdList",
            DecodedArray::Int(data.group_id_list),
            Strategy::RunLengthDelta,
            0,
        )?,
        encode_field(
            "groupTypeList",
            DecodedArray::Int(data.group_type_list),
            Strategy::Int32,
            0,
        )?,
        encode_field(
            "insCodeList",
            DecodedArray::Char(data.ins_code_list.unwrap_or_default()),
            Strategy::RunLengthChar,
            0,
        )?,
        encode_field(
            "sequenceIndexList",
            DecodedArray::Int(data.sequence_index_list.unwrap_or_default()),
            Strategy::RunLengthDelta,
            0,
        )?,
        encode_field(
            "secStructList",
            DecodedArray::Int(data.sec_struct_list.unwrap_or_default()),
            Strategy::Int8,
            0,
        )?,
        encode_field(
            "chainIdList",
            DecodedArray::Text(data.chain_id_list),
            Strategy::FixedString,
            4,
        )?,
        encode_field(
            "chainNameList",
            DecodedArray::Text(data.chain_name_list.unwrap_or_default()),
            Strategy::FixedString,
            4,
        )?,
    ]);
    Ok(RawValue::Map(entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::metadata::{EntityRecord, GroupRecord};
    use crate::core::models::atom::AtomSite;
    use crate::core::models::builder::StructureBuilder;
    use tempfile::tempdir;

    fn zinc_site() -> Structure {
        let his = GroupRecord::new(
            "HIS",
            "L-PEPTIDE LINKING",
            'H',
            &[("N", "N"), ("CA", "C"), ("NE2", "N")],
        );
        let zn = GroupRecord::new("ZN", "NON-POLYMER", '?', &[("ZN", "Zn")]);

        let mut builder = StructureBuilder::new();
        builder.title("ZINC SITE");
        builder.start_model();
        builder.start_chain("A", "A");
        builder.start_group(his.clone(), 57, '\0');
        builder.add_atom(AtomSite::at(10.125, -3.5, 0.0).with_b_factor(12.34));
        builder.add_atom(AtomSite::at(11.0, -3.25, 0.75).with_occupancy(0.5).with_alt_loc('A'));
        builder.add_atom(AtomSite::at(80.0, 2.0, -1.0));
        builder.start_group(his, 58, 'B');
        builder.add_atom(AtomSite::at(12.0, 0.0, 1.0));
        builder.add_atom(AtomSite::at(13.5, 0.5, 1.5));
        builder.add_atom(AtomSite::at(14.0, 1.0, 2.0));
        builder.start_chain("B", "A");
        builder.start_group(zn, 401, '\0');
        builder.add_atom(AtomSite::at(-40.0, 0.001, 3.0));
        builder.add_entity(EntityRecord::new("PROTEIN", "polymer", "HH", &[0]));
        builder.add_entity(EntityRecord::new("ZINC ION", "non-polymer", "", &[1]));
        builder.build("1ZNC").unwrap()
    }

    fn assert_same_structure(a: &Structure, b: &Structure) {
        assert_eq!(a.structure_id(), b.structure_id());
        assert_eq!(a.title(), b.title());
        assert_eq!(a.num_atoms(), b.num_atoms());
        assert_eq!(a.num_groups(), b.num_groups());
        assert_eq!(a.num_chains(), b.num_chains());
        assert_eq!(a.num_models(), b.num_models());
        for (x, y) in a.atoms().zip(b.atoms()) {
            assert!((x.position - y.position).norm() < 1e-3);
            assert!((x.b_factor - y.b_factor).abs() < 1e-2);
            assert!((x.occupancy - y.occupancy).abs() < 1e-2);
            assert_eq!((x.id, x.name, x.element, x.alt_loc_id), (y.id, y.name, y.element, y.alt_loc_id));
            assert_eq!(x.group_index, y.group_index);
        }
        for (x, y) in a.groups().zip(b.groups()) {
            assert_eq!(
                (x.chem_comp_id, x.group_number, x.ins_code, x.chain_index),
                (y.chem_comp_id, y.group_number, y.ins_code, y.chain_index)
            );
        }
        for (x, y) in a.chains().zip(b.chains()) {
            assert_eq!(x, y);
        }
        assert_eq!(a.entities(), b.entities());
    }

    #[test]
    fn written_structure_reads_back() {
        let original = zinc_site();
        let bytes = MmtfFile::write_bytes(&original, false).unwrap();
        let decoded = MmtfFile::read_bytes(&bytes).unwrap();
        assert_same_structure(&original, &decoded);
    }

    #[test]
    fn gzip_output_is_detected_on_read() {
        let original = zinc_site();
        let bytes = MmtfFile::write_bytes(&original, true).unwrap();
        assert_eq!(&bytes[..2], &GZIP_MAGIC);
        let decoded = MmtfFile::read_bytes(&bytes).unwrap();
        assert_same_structure(&original, &decoded);
    }

    #[test]
    fn path_round_trip_through_trait() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("1znc.mmtf.gz");
        let original = zinc_site();
        MmtfFile::write_to_path(&original, &MmtfWriteOptions { compressed: true }, &path).unwrap();
        let decoded = MmtfFile::read_from_path(&path).unwrap();
        assert_same_structure(&original, &decoded);
    }

    fn minimal_root() -> Vec<(RawValue, RawValue)> {
        let blob = |array: DecodedArray, strategy: Strategy, param: i32| {
            RawValue::Bytes(encode_binary(&array, strategy, param).unwrap())
        };
        let water = GroupRecord::new("HOH", "NON-POLYMER", '?', &[("O", "O")]);
        vec![
            (text("structureId"), RawValue::Bytes(b"1WAT".to_vec())),
            (text("numAtoms"), RawValue::Int(1)),
            (text("numGroups"), RawValue::Int(1)),
            (text("numChains"), RawValue::Int(1)),
            (text("numModels"), RawValue::Int(1)),
            (text("groupList"), RawValue::Array(vec![water.to_raw()])),
            (
                text("xCoordList"),
                blob(DecodedArray::Float(vec![1.5]), Strategy::RecursiveDeltaFloat, 1000),
            ),
            (
                text("yCoordList"),
                blob(DecodedArray::Float(vec![2.5]), Strategy::RecursiveDeltaFloat, 1000),
            ),
            (
                text("zCoordList"),
                blob(DecodedArray::Float(vec![-3.0]), Strategy::RecursiveDeltaFloat, 1000),
            ),
            (text("groupIdList"), blob(DecodedArray::Int(vec![7]), Strategy::RunLengthDelta, 0)),
            (text("groupTypeList"), blob(DecodedArray::Int(vec![0]), Strategy::Int32, 0)),
            (
                text("chainIdList"),
                blob(DecodedArray::Text(vec!["W".into()]), Strategy::FixedString, 4),
            ),
            (text("groupsPerChain"), int_array(&[1])),
            (text("chainsPerModel"), int_array(&[1])),
        ]
    }

    #[test]
    fn optional_fields_take_defaults() {
        let bytes = msgpack::encode(&RawValue::Map(minimal_root())).unwrap();
        let s = MmtfFile::read_bytes(&bytes).unwrap();
        let atom = s.atom(0).unwrap();
        assert_eq!(s.structure_id(), "1WAT");
        assert_eq!(atom.id, 1);
        assert_eq!(atom.occupancy, 1.0);
        assert_eq!(atom.b_factor, 0.0);
        assert_eq!(atom.alt_loc_id, '\0');
        assert!((atom.position.x - 1.5).abs() < 1e-9);
        assert_eq!(s.chain(0).unwrap().name, "W");
        assert!(s.entities().is_empty());
    }

    #[test]
    fn missing_required_field_is_reported() {
        let mut root = minimal_root();
        root.retain(|(k, _)| *k != text("zCoordList"));
        let bytes = msgpack::encode(&RawValue::Map(root)).unwrap();
        assert!(matches!(
            MmtfFile::read_bytes(&bytes),
            Err(MmtfError::MissingField("zCoordList"))
        ));
    }

    #[test]
    fn inconsistent_counts_fail_assembly() {
        let mut root = minimal_root();
        for (k, v) in root.iter_mut() {
            if *k == text("numAtoms") {
                *v = RawValue::Int(2);
            }
        }
        let bytes = msgpack::encode(&RawValue::Map(root)).unwrap();
        assert!(matches!(
            MmtfFile::read_bytes(&bytes),
            Err(MmtfError::Decode(DecodeError::ArityMismatch { .. }))
        ));
    }

    #[test]
    fn corrupt_binary_array_names_the_field() {
        let mut root = minimal_root();
        for (k, v) in root.iter_mut() {
            if *k == text("groupIdList") {
                *v = RawValue::Bytes(vec![0, 0, 0, 8, 0, 0, 0, 1]);
            }
        }
        let bytes = msgpack::encode(&RawValue::Map(root)).unwrap();
        assert!(matches!(
            MmtfFile::read_bytes(&bytes),
            Err(MmtfError::Field {
                field: "groupIdList",
                source: DecodeError::Truncated { .. }
            })
        ));
    }

    #[test]
    fn non_map_top_level_is_rejected() {
        let bytes = msgpack::encode(&RawValue::Int(3)).unwrap();
        assert!(matches!(MmtfFile::read_bytes(&bytes), Err(MmtfError::MsgPack(_))));
    }

    #[test]
    fn long_chain_id_cannot_be_written() {
        let mut builder = StructureBuilder::new();
        builder.start_chain("TOOLONG", "TOOLONG");
        builder.start_group(GroupRecord::new("HOH", "NON-POLYMER", '?', &[("O", "O")]), 1, '\0');
        builder.add_atom(AtomSite::at(0.0, 0.0, 0.0));
        let s = builder.build("1BAD").unwrap();
        assert!(matches!(
            MmtfFile::write_bytes(&s, false),
            Err(MmtfError::Field {
                field: "chainIdList",
                ..
            })
        ));
    }
}
