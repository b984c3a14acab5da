mod common;

use std::fs;
use std::path::{Path, PathBuf};

use pdf2csv::{Attempt, Extraction, ExtractionSettings, Extractor, Flavor, Strategy};

use common::{borderless_table, boxed_table, compressed_pdf, paragraph, pdf, ruled_table};

const FRUIT: &[&[&str]] = &[&["Name", "Qty"], &["Apple", "3"], &["Pear", "12"]];

fn write_pdf(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, bytes).unwrap();
    path
}

fn extract_csv(extractor: &Extractor, pdf_bytes: &[u8]) -> (Flavor, String) {
    let dir = tempfile::tempdir().unwrap();
    let path = write_pdf(dir.path(), "input.pdf", pdf_bytes);

    match extractor.extract(&path).unwrap() {
        Extraction::Csv { path, flavor, .. } => (flavor, fs::read_to_string(path).unwrap()),
        other => panic!("expected CSV, got {:?}", other),
    }
}

#[test]
fn ruled_table_uses_lattice() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_pdf(dir.path(), "report.pdf", &pdf(&[ruled_table(50.0, 700.0, FRUIT)]));

    let extraction = Extractor::default().extract(&path).unwrap();
    let Extraction::Csv {
        path: csv_path,
        flavor,
        tables,
        rows,
    } = extraction
    else {
        panic!("expected CSV, got {:?}", extraction);
    };

    assert_eq!(csv_path, dir.path().join("report.csv"));
    assert_eq!(flavor, Flavor::Lattice);
    assert_eq!(tables, 1);
    assert_eq!(rows, FRUIT.len());
    assert_eq!(fs::read_to_string(csv_path).unwrap(), "Name,Qty\nApple,3\nPear,12\n");
}

#[test]
fn borderless_table_falls_back_to_stream() {
    let (flavor, csv) = extract_csv(&Extractor::default(), &pdf(&[borderless_table(50.0, 700.0, FRUIT)]));
    assert_eq!(flavor, Flavor::Stream);
    assert_eq!(csv, "Name,Qty\nApple,3\nPear,12\n");
}

#[test]
fn cells_drawn_as_boxes() {
    let (flavor, csv) = extract_csv(&Extractor::default(), &pdf(&[boxed_table(72.0, 600.0, FRUIT)]));
    assert_eq!(flavor, Flavor::Lattice);
    assert_eq!(csv, "Name,Qty\nApple,3\nPear,12\n");
}

#[test]
fn compressed_content_streams() {
    let (flavor, csv) = extract_csv(&Extractor::default(), &compressed_pdf(&[ruled_table(50.0, 700.0, FRUIT)]));
    assert_eq!(flavor, Flavor::Lattice);
    assert_eq!(csv, "Name,Qty\nApple,3\nPear,12\n");
}

#[test]
fn prose_has_no_tables() {
    let dir = tempfile::tempdir().unwrap();
    let content = paragraph(
        72.0,
        720.0,
        &["The quick brown fox", "jumps over the lazy dog", "and keeps on running."],
    );
    let path = write_pdf(dir.path(), "letter.pdf", &pdf(&[content]));

    match Extractor::default().extract(&path).unwrap() {
        Extraction::NoTables { lattice, stream } => {
            assert!(matches!(lattice, Attempt::Empty));
            assert!(matches!(stream, Attempt::Empty));
        }
        other => panic!("expected no tables, got {:?}", other),
    }
    assert!(!dir.path().join("letter.csv").exists());
}

#[test]
fn garbage_input_records_both_failures() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_pdf(dir.path(), "fake.pdf", b"this is a text file, not a PDF");

    match Extractor::default().extract(&path).unwrap() {
        Extraction::NoTables { lattice, stream } => {
            assert!(matches!(lattice, Attempt::Failed(_)));
            assert!(matches!(stream, Attempt::Failed(_)));
        }
        other => panic!("expected no tables, got {:?}", other),
    }
}

#[test]
fn tables_concatenate_in_page_order() {
    let pages = [
        ruled_table(50.0, 700.0, &[&["A", "1"], &["B", "2"]]),
        ruled_table(50.0, 700.0, &[&["C", "3"], &["D", "4"]]),
    ];
    let (_, csv) = extract_csv(&Extractor::default(), &pdf(&pages));
    assert_eq!(csv, "A,1\nB,2\nC,3\nD,4\n");
}

#[test]
fn tables_on_one_page_run_top_to_bottom() {
    // Drawn bottom table first; output still follows the page layout
    let content = ruled_table(50.0, 400.0, &[&["low", "2"], &["x", "y"]])
        + &ruled_table(50.0, 700.0, &[&["high", "1"], &["p", "q"]]);
    let (_, csv) = extract_csv(&Extractor::default(), &pdf(&[content]));
    assert_eq!(csv, "high,1\np,q\nlow,2\nx,y\n");
}

#[test]
fn narrower_tables_are_padded() {
    let pages = [
        ruled_table(50.0, 700.0, &[&["A", "1"], &["B", "2"]]),
        ruled_table(50.0, 700.0, &[&["C", "3", "x"], &["D", "4", "y"]]),
    ];
    let (_, csv) = extract_csv(&Extractor::default(), &pdf(&pages));
    assert_eq!(csv, "A,1,\nB,2,\nC,3,x\nD,4,y\n");
}

#[test]
fn cells_needing_quotes() {
    let rows: &[&[&str]] = &[&["Item", "Note"], &["Bolts, steel", "say \"hi\""]];
    let (_, csv) = extract_csv(&Extractor::default(), &pdf(&[ruled_table(50.0, 700.0, rows)]));
    assert_eq!(csv, "Item,Note\n\"Bolts, steel\",\"say \"\"hi\"\"\"\n");
}

#[test]
fn column_index_header_row() {
    let extractor = Extractor::new(ExtractionSettings {
        column_index_header: true,
        ..ExtractionSettings::default()
    });
    let (_, csv) = extract_csv(&extractor, &pdf(&[ruled_table(50.0, 700.0, FRUIT)]));
    assert_eq!(csv, "0,1\nName,Qty\nApple,3\nPear,12\n");
}

#[test]
fn same_input_gives_identical_output() {
    let bytes = pdf(&[
        ruled_table(50.0, 700.0, FRUIT),
        borderless_table(50.0, 700.0, &[&["k", "v"], &["x", "y"]]),
    ]);
    let first = extract_csv(&Extractor::default(), &bytes);
    let second = extract_csv(&Extractor::default(), &bytes);
    assert_eq!(first, second);
}

#[test]
fn single_flavor_strategies() {
    let dir = tempfile::tempdir().unwrap();
    let borderless = write_pdf(dir.path(), "plain.pdf", &pdf(&[borderless_table(50.0, 700.0, FRUIT)]));
    let out = dir.path().join("out.csv");

    match Extractor::default()
        .extract_to(&borderless, &out, Strategy::Only(Flavor::Lattice))
        .unwrap()
    {
        Extraction::NoTables { lattice, stream } => {
            assert!(matches!(lattice, Attempt::Empty));
            assert!(matches!(stream, Attempt::Skipped));
        }
        other => panic!("expected no tables, got {:?}", other),
    }
    assert!(!out.exists());

    let ruled = write_pdf(dir.path(), "ruled.pdf", &pdf(&[ruled_table(50.0, 700.0, FRUIT)]));
    match Extractor::default()
        .extract_to(&ruled, &out, Strategy::Only(Flavor::Stream))
        .unwrap()
    {
        Extraction::Csv { flavor, rows, .. } => {
            assert_eq!(flavor, Flavor::Stream);
            assert_eq!(rows, 3);
        }
        other => panic!("expected CSV, got {:?}", other),
    }
    assert_eq!(fs::read_to_string(&out).unwrap(), "Name,Qty\nApple,3\nPear,12\n");
}

#[test]
fn attempt_reports_table_count() {
    let bytes = pdf(&[ruled_table(50.0, 700.0, FRUIT), ruled_table(50.0, 700.0, FRUIT)]);
    let attempt = Extractor::default().attempt(&bytes, Flavor::Lattice);
    assert_eq!(attempt.table_count(), 2);
    assert_eq!(attempt.to_string(), "found 2 table(s)");
}
