//! Integration tests for the ingestion adapters.
//!
//! All six variants describe the same logical matrix and must land in
//! identical canonical storage: NaN for every missing cell, the stored
//! value everywhere else.

use gblink::adapter::{
    build_dataset, ArrayAdapter, Batch, BatchAccumulator, CscAdapter, CsrAdapter, DataIter,
    DenseAdapter, ProxyFeed, ProxySlot,
};
use gblink::Dataset;
use rstest::rstest;

const MISSING: f32 = -1.0;

/// The logical matrix, with `None` marking missing cells.
const EXPECTED: [[Option<f32>; 4]; 3] = [
    [Some(1.0), None, Some(3.5), None],
    [Some(0.0), Some(2.0), None, Some(4.0)],
    [None, None, None, None],
];

/// Dense rendition: missing cells carry the sentinel (or NaN, which is
/// always missing regardless of sentinel).
fn dense_values() -> Vec<f32> {
    vec![
        1.0, MISSING, 3.5, f32::NAN, //
        0.0, 2.0, MISSING, 4.0, //
        MISSING, MISSING, MISSING, MISSING,
    ]
}

fn from_dense() -> Dataset {
    let values = dense_values();
    let adapter = DenseAdapter::new(&values, 3, 4).unwrap();
    build_dataset(&adapter, MISSING, 1)
}

fn from_csr() -> Dataset {
    // Only the present cells are stored.
    let indptr = [0usize, 2, 5, 5];
    let indices = [0u32, 2, 0, 1, 3];
    let values = [1.0f32, 3.5, 0.0, 2.0, 4.0];
    let adapter = CsrAdapter::new(&indptr, &indices, &values, 4).unwrap();
    build_dataset(&adapter, MISSING, 1)
}

fn from_csc() -> Dataset {
    // Same cells, grouped by column.
    let colptr = [0usize, 2, 3, 4, 5];
    let indices = [0u32, 1, 1, 0, 1];
    let values = [1.0f32, 0.0, 2.0, 3.5, 4.0];
    let adapter = CscAdapter::new(&colptr, &indices, &values, 3).unwrap();
    build_dataset(&adapter, MISSING, 1)
}

fn from_array_interface() -> Dataset {
    let mut buf = Vec::new();
    for v in dense_values() {
        buf.extend_from_slice(&f64::from(v).to_le_bytes());
    }
    let descriptor = r#"{"shape": [3, 4], "typestr": "<f8", "version": 3}"#;
    let adapter = ArrayAdapter::from_interface(descriptor, &buf).unwrap();
    build_dataset(&adapter, MISSING, 1)
}

/// Batch source yielding the matrix as a 2-row batch then a 1-row batch,
/// reusing one scratch buffer between calls the way a foreign caller would.
struct TwoBatchSource {
    cursor: usize,
    scratch: Vec<f32>,
}

impl TwoBatchSource {
    fn new() -> Self {
        Self { cursor: 0, scratch: Vec::new() }
    }

    fn fill(&mut self) -> Option<(usize, usize)> {
        let all = dense_values();
        let (start, rows) = match self.cursor {
            0 => (0, 2),
            1 => (8, 1),
            _ => return None,
        };
        self.scratch.clear();
        self.scratch.extend_from_slice(&all[start..start + rows * 4]);
        self.cursor += 1;
        Some((rows, 4))
    }
}

impl DataIter for TwoBatchSource {
    fn reset(&mut self) {
        self.cursor = 0;
    }

    fn next(&mut self) -> Option<Batch<'_>> {
        let (num_row, num_col) = self.fill()?;
        Some(Batch { values: &self.scratch, num_row, num_col })
    }
}

impl ProxyFeed for TwoBatchSource {
    fn reset(&mut self) {
        self.cursor = 0;
    }

    fn next(&mut self, proxy: &mut ProxySlot) -> bool {
        match self.fill() {
            Some((num_row, num_col)) => {
                proxy
                    .set_dense_values(&self.scratch, num_row, num_col)
                    .unwrap();
                true
            }
            None => false,
        }
    }
}

fn from_iter() -> Dataset {
    let mut accumulator = BatchAccumulator::new();
    accumulator.drain_iter(&mut TwoBatchSource::new()).unwrap();
    accumulator.finish(MISSING, 1).unwrap()
}

fn from_proxy() -> Dataset {
    let mut accumulator = BatchAccumulator::new();
    let mut proxy = ProxySlot::default();
    accumulator
        .drain_proxy(&mut TwoBatchSource::new(), &mut proxy)
        .unwrap();
    accumulator.finish(MISSING, 1).unwrap()
}

fn assert_canonical(dataset: &Dataset, variant: &str) {
    assert_eq!(dataset.num_row(), 3, "{variant}: row count");
    assert_eq!(dataset.num_col(), 4, "{variant}: column count");
    for (r, row) in EXPECTED.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            let got = dataset.value(r, c);
            match cell {
                Some(v) => assert_eq!(got, *v, "{variant}: cell ({r}, {c})"),
                None => assert!(got.is_nan(), "{variant}: cell ({r}, {c}) should be missing"),
            }
        }
    }
}

#[rstest]
#[case::dense(from_dense, "dense")]
#[case::csr(from_csr, "csr")]
#[case::csc(from_csc, "csc")]
#[case::array(from_array_interface, "array")]
#[case::iter(from_iter, "iter")]
#[case::proxy(from_proxy, "proxy")]
fn every_variant_lands_in_canonical_storage(
    #[case] build: fn() -> Dataset,
    #[case] name: &str,
) {
    assert_canonical(&build(), name);
}

#[test]
fn parallel_fill_matches_sequential() {
    let values: Vec<f32> = (0..4096).map(|i| (i % 97) as f32).collect();
    let adapter = DenseAdapter::new(&values, 1024, 4).unwrap();
    let sequential = build_dataset(&adapter, -1.0, 1);
    let parallel = build_dataset(&adapter, -1.0, 0);
    for r in 0..1024 {
        for c in 0..4 {
            let (s, p) = (sequential.value(r, c), parallel.value(r, c));
            assert!(s == p || (s.is_nan() && p.is_nan()), "cell ({r}, {c})");
        }
    }
}

#[test]
fn zero_row_stream_yields_empty_dataset() {
    struct Empty;
    impl DataIter for Empty {
        fn reset(&mut self) {}
        fn next(&mut self) -> Option<Batch<'_>> {
            None
        }
    }
    let mut accumulator = BatchAccumulator::new();
    accumulator.drain_iter(&mut Empty).unwrap();
    let dataset = accumulator.finish(f32::NAN, 1).unwrap();
    assert_eq!(dataset.num_row(), 0);
}
