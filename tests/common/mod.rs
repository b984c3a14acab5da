//! Minimal PDF writer for integration tests.
//!
//! Pages use one Courier font (`/F1`, 600/1000 em per glyph), so every
//! character drawn at 10pt advances exactly 6pt.

#![allow(dead_code)]

use std::io::Write;

use flate2::Compression;
use flate2::write::ZlibEncoder;

pub const FONT_SIZE: f64 = 10.0;
pub const COL_WIDTH: f64 = 100.0;
pub const ROW_HEIGHT: f64 = 20.0;

/// Assemble a PDF with one page per content stream
pub fn pdf(pages: &[String]) -> Vec<u8> {
    write_pdf(pages, false)
}

/// Like [`pdf`], with Flate-compressed content streams
pub fn compressed_pdf(pages: &[String]) -> Vec<u8> {
    write_pdf(pages, true)
}

fn write_pdf(pages: &[String], compress: bool) -> Vec<u8> {
    let mut objects: Vec<Vec<u8>> = Vec::new();

    let kids: Vec<String> = (0..pages.len()).map(|i| format!("{} 0 R", 4 + 2 * i)).collect();
    objects.push(b"<< /Type /Catalog /Pages 2 0 R >>".to_vec());
    objects.push(format!("<< /Type /Pages /Kids [{}] /Count {} >>", kids.join(" "), pages.len()).into_bytes());
    objects.push(b"<< /Type /Font /Subtype /Type1 /BaseFont /Courier >>".to_vec());

    for (i, content) in pages.iter().enumerate() {
        objects.push(
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
                 /Resources << /Font << /F1 3 0 R >> >> /Contents {} 0 R >>",
                5 + 2 * i
            )
            .into_bytes(),
        );

        let (data, filter) = if compress {
            let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(content.as_bytes()).unwrap();
            (encoder.finish().unwrap(), " /Filter /FlateDecode")
        } else {
            (content.as_bytes().to_vec(), "")
        };
        let mut stream = format!("<< /Length {}{} >>\nstream\n", data.len(), filter).into_bytes();
        stream.extend(data);
        stream.extend(b"\nendstream");
        objects.push(stream);
    }

    let mut out = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::new();
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend(format!("{} 0 obj\n", i + 1).into_bytes());
        out.extend(body);
        out.extend(b"\nendobj\n");
    }

    let xref_pos = out.len();
    out.extend(format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).into_bytes());
    for offset in offsets {
        out.extend(format!("{:010} 00000 n \n", offset).into_bytes());
    }
    out.extend(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_pos
        )
        .into_bytes(),
    );
    out
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('(', "\\(").replace(')', "\\)")
}

/// One line of text with its baseline origin at (x, y)
pub fn text(x: f64, y: f64, s: &str) -> String {
    format!("BT /F1 {} Tf {} {} Td ({}) Tj ET\n", FONT_SIZE, x, y, escape(s))
}

/// Cell text laid out on a grid whose top-left corner is (x, top)
fn cell_text(x: f64, top: f64, rows: &[&[&str]]) -> String {
    let mut out = String::new();
    for (r, row) in rows.iter().enumerate() {
        let baseline = top - (r as f64 + 1.0) * ROW_HEIGHT + 6.0;
        for (c, cell) in row.iter().enumerate() {
            if !cell.is_empty() {
                out.push_str(&text(x + c as f64 * COL_WIDTH + 4.0, baseline, cell));
            }
        }
    }
    out
}

/// A table with every cell boundary stroked
pub fn ruled_table(x: f64, top: f64, rows: &[&[&str]]) -> String {
    let cols = rows.iter().map(|r| r.len()).max().unwrap_or(0);
    let width = cols as f64 * COL_WIDTH;
    let height = rows.len() as f64 * ROW_HEIGHT;

    let mut out = String::from("0.5 w\n");
    for r in 0..=rows.len() {
        let y = top - r as f64 * ROW_HEIGHT;
        out.push_str(&format!("{} {} m {} {} l S\n", x, y, x + width, y));
    }
    for c in 0..=cols {
        let cx = x + c as f64 * COL_WIDTH;
        out.push_str(&format!("{} {} m {} {} l S\n", cx, top, cx, top - height));
    }
    out + &cell_text(x, top, rows)
}

/// The same table drawn with `re` boxes per cell instead of lines
pub fn boxed_table(x: f64, top: f64, rows: &[&[&str]]) -> String {
    let mut out = String::new();
    for (r, row) in rows.iter().enumerate() {
        for c in 0..row.len() {
            let cx = x + c as f64 * COL_WIDTH;
            let cy = top - (r as f64 + 1.0) * ROW_HEIGHT;
            out.push_str(&format!("{} {} {} {} re S\n", cx, cy, COL_WIDTH, ROW_HEIGHT));
        }
    }
    out + &cell_text(x, top, rows)
}

/// A table with no lines at all, only aligned text
pub fn borderless_table(x: f64, top: f64, rows: &[&[&str]]) -> String {
    cell_text(x, top, rows)
}

/// Plain paragraph lines, one phrase per line
pub fn paragraph(x: f64, top: f64, lines: &[&str]) -> String {
    lines
        .iter()
        .enumerate()
        .map(|(i, line)| text(x, top - i as f64 * 14.0, line))
        .collect()
}
