#![allow(clippy::pedantic)]
//! End-to-end scenarios (spec §8, S1-S9) against an in-memory/filesystem
//! mock of the external `VfsFile`/`ReadVirtual` collaborators.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use hdf5_vds::{
    DatasetAccess, DelegateSelection, Error, HyperslabSelection, SELF_FILE, VdsDatasetEntry, VdsDescriptor,
    VfsFile, VirtualReadStream,
};

struct MockFile {
    datasets: HashMap<String, Vec<i32>>,
    folder: PathBuf,
}

impl MockFile {
    fn in_memory(datasets: &[(&str, &[i32])]) -> Self {
        Self {
            datasets: datasets.iter().map(|(n, v)| (n.to_string(), v.to_vec())).collect(),
            folder: PathBuf::from("."),
        }
    }
}

impl VfsFile for MockFile {
    type Dataset = Vec<i32>;

    fn open_read(path: &Path) -> hdf5_vds::Result<Self> {
        let text = fs::read_to_string(path)?;
        let mut datasets = HashMap::new();
        for line in text.lines() {
            let (name, rest) = line.split_once(':').expect("malformed fixture line");
            let values: Vec<i32> = rest.split(',').filter(|s| !s.is_empty()).map(|s| s.parse().unwrap()).collect();
            datasets.insert(name.to_string(), values);
        }
        Ok(Self {
            datasets,
            folder: path.parent().unwrap_or(Path::new(".")).to_path_buf(),
        })
    }

    fn link_exists(&self, path: &str) -> bool {
        self.datasets.contains_key(path)
    }

    fn dataset(&self, path: &str) -> hdf5_vds::Result<Self::Dataset> {
        self.datasets
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such dataset").into())
    }

    fn folder_path(&self) -> &Path {
        &self.folder
    }

    fn close(self) -> hdf5_vds::Result<()> {
        Ok(())
    }
}

fn copy_callback(
    dataset: &Vec<i32>,
    dest: &mut [i32],
    mut selection: DelegateSelection<'_>,
    _access: &DatasetAccess,
) -> hdf5_vds::Result<()> {
    let mut cursor = 0usize;
    while let Some((coords, count)) = selection.next_step()? {
        let base = coords[0] as usize;
        let count = count as usize;
        dest[cursor..cursor + count].copy_from_slice(&dataset[base..base + count]);
        cursor += count;
    }
    Ok(())
}

fn entry(source_file_name: &str, source_dataset: &str, virtual_sel: HyperslabSelection, source_sel: HyperslabSelection) -> VdsDatasetEntry {
    VdsDatasetEntry {
        source_file_name: source_file_name.to_string(),
        source_dataset: source_dataset.to_string(),
        virtual_selection: virtual_sel,
        source_selection: source_sel,
    }
}

#[test]
fn s1_identity_mapping_with_no_external_file() {
    let virtual_dims = vec![10u64];
    let host = MockFile::in_memory(&[("/source", &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9])]);
    let e = entry(
        SELF_FILE,
        "/source",
        HyperslabSelection::all(&virtual_dims),
        HyperslabSelection::all(&[10]),
    );
    let descriptor = VdsDescriptor::new(virtual_dims, vec![e]).unwrap();
    let mut stream = VirtualReadStream::new(descriptor, &host, DatasetAccess::new(), Some(-1), copy_callback);

    let mut buffer = vec![0i32; 10];
    stream.read_virtual(&mut buffer).unwrap();
    assert_eq!(buffer, vec![0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
}

#[test]
fn s2_gap_is_filled_with_the_configured_fill_value() {
    let virtual_dims = vec![10u64];
    let host = MockFile::in_memory(&[("/source", &[100, 101, 102])]);
    let e = entry(
        SELF_FILE,
        "/source",
        HyperslabSelection::new([2u64], [3u64], [1u64], [3u64], &virtual_dims).unwrap(),
        HyperslabSelection::all(&[3]),
    );
    let descriptor = VdsDescriptor::new(virtual_dims, vec![e]).unwrap();
    let mut stream = VirtualReadStream::new(descriptor, &host, DatasetAccess::new(), Some(-1), copy_callback);

    let mut buffer = vec![0i32; 10];
    stream.read_virtual(&mut buffer).unwrap();
    assert_eq!(buffer, vec![-1, -1, 100, 101, 102, -1, -1, -1, -1, -1]);
}

#[test]
fn s3_overlapping_entries_tie_break_to_the_first_in_order() {
    let virtual_dims = vec![10u64];
    let host = MockFile::in_memory(&[
        ("/a", &[100, 101, 102, 103, 104]),
        ("/b", &[200, 201, 202, 203, 204]),
    ]);
    // A covers virtual [0..5), B covers virtual [3..8); they disagree on 3..5,
    // and A must win there because it appears first in the mapping table.
    let a = entry(
        SELF_FILE,
        "/a",
        HyperslabSelection::new([0u64], [5u64], [1u64], [5u64], &virtual_dims).unwrap(),
        HyperslabSelection::all(&[5]),
    );
    let b = entry(
        SELF_FILE,
        "/b",
        HyperslabSelection::new([3u64], [5u64], [1u64], [5u64], &virtual_dims).unwrap(),
        HyperslabSelection::all(&[5]),
    );
    let descriptor = VdsDescriptor::new(virtual_dims, vec![a, b]).unwrap();
    let mut stream = VirtualReadStream::new(descriptor, &host, DatasetAccess::new(), Some(-1), copy_callback);

    let mut buffer = vec![0i32; 10];
    stream.read_virtual(&mut buffer).unwrap();
    // positions 0..5 from A; 5..8 from B at source offset (pos - 3); rest fill.
    assert_eq!(buffer, vec![100, 101, 102, 103, 104, 202, 203, 204, -1, -1]);
}

#[test]
fn s4_strided_virtual_selection_maps_from_a_contiguous_source_run() {
    let virtual_dims = vec![10u64];
    let host = MockFile::in_memory(&[("/source", &[1, 2, 3, 4, 5, 6])]);
    let e = entry(
        SELF_FILE,
        "/source",
        HyperslabSelection::new([0u64], [4u64], [3u64], [2u64], &virtual_dims).unwrap(),
        HyperslabSelection::new([0u64], [6u64], [1u64], [6u64], &[6]).unwrap(),
    );
    let descriptor = VdsDescriptor::new(virtual_dims, vec![e]).unwrap();
    let mut stream = VirtualReadStream::new(descriptor, &host, DatasetAccess::new(), Some(0), copy_callback);

    let mut buffer = vec![9i32; 10];
    stream.read_virtual(&mut buffer).unwrap();
    assert_eq!(buffer, vec![1, 2, 0, 0, 3, 4, 0, 0, 5, 6]);
}

#[test]
fn s5_missing_external_file_falls_back_to_fill_for_the_whole_read() {
    let dir = tempfile::tempdir().unwrap();
    let virtual_dims = vec![4u64];
    let host = MockFile {
        datasets: HashMap::new(),
        folder: dir.path().to_path_buf(),
    };
    let e = entry(
        "missing.h5",
        "/data",
        HyperslabSelection::all(&virtual_dims),
        HyperslabSelection::all(&[4]),
    );
    let descriptor = VdsDescriptor::new(virtual_dims, vec![e]).unwrap();
    let mut stream = VirtualReadStream::new(descriptor, &host, DatasetAccess::new(), Some(-7), copy_callback);

    let mut buffer = vec![0i32; 4];
    stream.read_virtual(&mut buffer).unwrap();
    assert_eq!(buffer, vec![-7, -7, -7, -7]);
}

#[test]
fn s6_unlimited_virtual_dimension_is_rejected_at_construction() {
    let dims = vec![hdf5_vds::coords::UNLIMITED];
    let e = entry(
        SELF_FILE,
        "/source",
        HyperslabSelection::all(&[1]),
        HyperslabSelection::all(&[1]),
    );
    let err = VdsDescriptor::new(dims, vec![e]).unwrap_err();
    assert!(matches!(err, Error::UnlimitedDimension { axis: 0 }));
}

#[test]
fn s7_external_file_prefix_wins_over_an_adjacent_same_named_file() {
    let adjacent_dir = tempfile::tempdir().unwrap();
    let prefix_dir = tempfile::tempdir().unwrap();
    fs::write(adjacent_dir.path().join("source.h5"), "/data:1,2,3\n").unwrap();
    fs::write(prefix_dir.path().join("source.h5"), "/data:9,9,9\n").unwrap();

    let virtual_dims = vec![3u64];
    let host = MockFile {
        datasets: HashMap::new(),
        folder: adjacent_dir.path().to_path_buf(),
    };
    let e = entry(
        "source.h5",
        "/data",
        HyperslabSelection::all(&virtual_dims),
        HyperslabSelection::all(&[3]),
    );
    let descriptor = VdsDescriptor::new(virtual_dims, vec![e]).unwrap();
    let access = DatasetAccess::new().external_file_prefix(prefix_dir.path().to_str().unwrap());
    let mut stream = VirtualReadStream::new(descriptor, &host, access, Some(0), copy_callback);

    let mut buffer = vec![0i32; 3];
    stream.read_virtual(&mut buffer).unwrap();
    assert_eq!(buffer, vec![9, 9, 9]);
}

#[test]
fn s8_entries_sharing_a_source_reuse_the_same_resolved_handle() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("shared.h5"), "/data:7,8,9,10\n").unwrap();

    let virtual_dims = vec![8u64];
    let host = MockFile {
        datasets: HashMap::new(),
        folder: dir.path().to_path_buf(),
    };
    // Two entries, disjoint virtual ranges, both naming the same external
    // source file and dataset.
    let first = entry(
        "shared.h5",
        "/data",
        HyperslabSelection::new([0u64], [4u64], [1u64], [4u64], &virtual_dims).unwrap(),
        HyperslabSelection::all(&[4]),
    );
    let second = entry(
        "shared.h5",
        "/data",
        HyperslabSelection::new([4u64], [4u64], [1u64], [4u64], &virtual_dims).unwrap(),
        HyperslabSelection::all(&[4]),
    );
    let descriptor = VdsDescriptor::new(virtual_dims, vec![first, second]).unwrap();
    let mut stream = VirtualReadStream::new(descriptor, &host, DatasetAccess::new(), Some(0), copy_callback);

    let mut buffer = vec![0i32; 8];
    stream.read_virtual(&mut buffer).unwrap();
    assert_eq!(buffer, vec![7, 8, 9, 10, 7, 8, 9, 10]);
}

#[test]
fn s9_multidimensional_coordinate_round_trip_over_a_non_trivial_hyperslab() {
    let dims = [3u64, 4u64, 5u64];
    let sel = HyperslabSelection::new(
        [1u64, 0u64, 1u64],
        [2u64, 2u64, 2u64],
        [1u64, 2u64, 2u64],
        [1u64, 1u64, 2u64],
        &dims,
    )
    .unwrap();
    let total = sel.element_count();
    for linear in 0..total {
        let mut coords = [0u64; 3];
        let run = sel.to_coordinates(&dims, linear, &mut coords).unwrap();
        assert!(run >= 1);
        let lookup = sel.to_linear_index(&dims, &coords).unwrap();
        assert!(lookup.success);
        assert_eq!(lookup.linear_index, linear);
    }
}

#[test]
fn closing_the_stream_disposes_externally_opened_files_but_not_the_host() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("source.h5"), "/data:1,2,3\n").unwrap();
    let virtual_dims = vec![3u64];
    let host = MockFile {
        datasets: HashMap::new(),
        folder: dir.path().to_path_buf(),
    };
    let e = entry(
        "source.h5",
        "/data",
        HyperslabSelection::all(&virtual_dims),
        HyperslabSelection::all(&[3]),
    );
    let descriptor = VdsDescriptor::new(virtual_dims, vec![e]).unwrap();
    let mut stream = VirtualReadStream::new(descriptor, &host, DatasetAccess::new(), Some(0), copy_callback);

    let mut buffer = vec![0i32; 3];
    stream.read_virtual(&mut buffer).unwrap();
    stream.close().unwrap();
    // The host value is still usable afterward; closing the stream never
    // touches it.
    assert!(!host.link_exists("nothing"));
}

#[test]
fn seek_then_read_matches_a_suffix_of_a_read_from_the_start() {
    let virtual_dims = vec![6u64];
    let host = MockFile::in_memory(&[("/source", &[10, 11, 12, 13, 14, 15])]);
    let e = entry(
        SELF_FILE,
        "/source",
        HyperslabSelection::all(&virtual_dims),
        HyperslabSelection::all(&[6]),
    );

    let descriptor_a = VdsDescriptor::new(virtual_dims.clone(), vec![e.clone()]).unwrap();
    let mut whole = VirtualReadStream::new(descriptor_a, &host, DatasetAccess::new(), Some(-1), copy_callback);
    let mut whole_buffer = vec![0i32; 6];
    whole.read_virtual(&mut whole_buffer).unwrap();

    let descriptor_b = VdsDescriptor::new(virtual_dims, vec![e]).unwrap();
    let mut seeked = VirtualReadStream::new(descriptor_b, &host, DatasetAccess::new(), Some(-1), copy_callback);
    seeked.seek(std::io::SeekFrom::Start(2)).unwrap();
    let mut tail_buffer = vec![0i32; 4];
    seeked.read_virtual(&mut tail_buffer).unwrap();

    assert_eq!(tail_buffer, whole_buffer[2..]);
}
