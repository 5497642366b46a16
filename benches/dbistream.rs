//! Benchmarks for DBI stream decoding.
//!
//! Tests decoding performance for synthetic streams of increasing size:
//! - Module-record scanning
//! - File-info resolution, well-formed and with out-of-bounds name indices
//! - Full stream decoding from a slice and from a seekable source

extern crate dbiscope;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use dbiscope::dbi::{DbiStream, Diagnostics, FileIndexSummary, FileInfo, ModuleIter, ParseOptions};
use std::{hint::black_box, io::Cursor};

/// Module-record region with `count` records named `module_<n>.obj`.
fn module_region(count: usize) -> Vec<u8> {
    let mut data = Vec::new();
    for index in 0..count {
        let mut record = vec![0u8; 64];
        record[34..36].copy_from_slice(&(index as i16).to_le_bytes());
        data.extend_from_slice(&record);
        data.extend_from_slice(format!("d:\\build\\obj\\module_{index}.obj\0").as_bytes());
        data.extend_from_slice(b"d:\\build\\lib\\runtime.lib\0");
        while data.len() % 4 != 0 {
            data.push(0);
        }
    }
    data
}

/// File info where every module references `per_module` names out of a shared pool.
fn file_info(modules: usize, per_module: usize) -> FileInfo {
    let mut names = Vec::new();
    let mut offsets = Vec::new();
    for index in 0..per_module * 4 {
        offsets.push(names.len() as u32);
        names.extend_from_slice(format!("d:\\src\\include\\header_{index}.h\0").as_bytes());
    }

    let module_starts = (0..modules)
        .map(|module| ((module * per_module) % (per_module * 3)) as u16)
        .collect();

    FileInfo {
        summary: FileIndexSummary {
            module_count: modules as u16,
            reference_count: offsets.len() as u16,
        },
        module_starts,
        reference_counts: vec![per_module as u16; modules],
        name_offsets: offsets,
        names,
    }
}

/// Complete stream with the given module region and file info.
fn stream(modules: &[u8], info: &FileInfo) -> Vec<u8> {
    let mut file_info = Vec::new();
    file_info.extend_from_slice(&info.summary.module_count.to_le_bytes());
    file_info.extend_from_slice(&info.summary.reference_count.to_le_bytes());
    for start in &info.module_starts {
        file_info.extend_from_slice(&start.to_le_bytes());
    }
    for count in &info.reference_counts {
        file_info.extend_from_slice(&count.to_le_bytes());
    }
    for offset in &info.name_offsets {
        file_info.extend_from_slice(&offset.to_le_bytes());
    }
    file_info.extend_from_slice(&info.names);

    let mut data = vec![0xFF, 0xFF, 0xFF, 0xFF];
    data.extend_from_slice(&19_990_903_u32.to_le_bytes());
    data.extend_from_slice(&[0u8; 16]);
    data.extend_from_slice(&(modules.len() as u32).to_le_bytes());
    data.extend_from_slice(&0_u32.to_le_bytes());
    data.extend_from_slice(&0_u32.to_le_bytes());
    data.extend_from_slice(&(file_info.len() as u32).to_le_bytes());
    data.extend_from_slice(&0_u32.to_le_bytes());
    data.extend_from_slice(&0_u32.to_le_bytes());
    data.extend_from_slice(&22_u32.to_le_bytes());
    data.extend_from_slice(&0_u32.to_le_bytes());
    data.extend_from_slice(&0_u16.to_le_bytes());
    data.extend_from_slice(&0x8664_u16.to_le_bytes());
    data.extend_from_slice(&0_u32.to_le_bytes());

    data.extend_from_slice(modules);
    data.extend_from_slice(&file_info);
    data.extend_from_slice(&[0xFF; 22]);
    data
}

fn bench_module_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("module_scan");
    for count in [16, 256, 4096] {
        let region = module_region(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &region, |b, region| {
            b.iter(|| {
                let modules = ModuleIter::new(black_box(region), 4).unwrap().count();
                black_box(modules)
            });
        });
    }
    group.finish();
}

fn bench_resolve(c: &mut Criterion) {
    let info = file_info(1024, 24);
    c.bench_function("resolve_well_formed", |b| {
        b.iter(|| {
            let files = black_box(&info).resolve(&ParseOptions::default(), &Diagnostics::new());
            black_box(files)
        });
    });

    let mut broken = file_info(1024, 24);
    for start in broken.module_starts.iter_mut().skip(512) {
        *start = u16::MAX - 8;
    }
    c.bench_function("resolve_out_of_bounds", |b| {
        b.iter(|| {
            let files = black_box(&broken).resolve(&ParseOptions::default(), &Diagnostics::new());
            black_box(files)
        });
    });
}

fn bench_full_stream(c: &mut Criterion) {
    let data = stream(&module_region(2048), &file_info(2048, 16));

    c.bench_function("dbistream_parse_slice", |b| {
        b.iter(|| {
            let dbi = DbiStream::parse(black_box(&data)).unwrap();
            black_box(dbi)
        });
    });

    c.bench_function("dbistream_parse_stream", |b| {
        b.iter(|| {
            let dbi = DbiStream::parse_stream(Cursor::new(black_box(&data))).unwrap();
            black_box(dbi)
        });
    });
}

criterion_group!(benches, bench_module_scan, bench_resolve, bench_full_stream);
criterion_main!(benches);
