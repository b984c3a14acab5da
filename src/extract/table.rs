/// Extracted table with rows and columns
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub rows: Vec<Vec<String>>,
    pub num_columns: usize,
}

impl Table {
    /// Build a table from rows of cells; short rows are padded to the widest
    pub fn from_rows(rows: Vec<Vec<String>>) -> Self {
        let num_columns = rows.iter().map(Vec::len).max().unwrap_or(0);
        let mut table = Table { rows, num_columns };
        table.pad_to(num_columns);
        table
    }

    /// Append empty cells on the right until every row has `width` cells
    pub fn pad_to(&mut self, width: usize) {
        self.num_columns = self.num_columns.max(width);
        for row in &mut self.rows {
            if row.len() < self.num_columns {
                row.resize(self.num_columns, String::new());
            }
        }
    }

    /// Stack tables row-wise in the given order
    pub fn concat(tables: &[Table]) -> Self {
        let width = tables.iter().map(|t| t.num_columns).max().unwrap_or(0);
        let rows = tables.iter().flat_map(|t| t.rows.iter().cloned()).collect();

        let mut combined = Table {
            rows,
            num_columns: width,
        };
        combined.pad_to(width);
        combined
    }

    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(|row| row.iter().all(|cell| cell.is_empty()))
    }

    /// Convert table to CSV string; every row ends with a newline
    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        for row in &self.rows {
            let line = row.iter().map(|cell| escape_csv(cell)).collect::<Vec<_>>().join(",");
            out.push_str(&line);
            out.push('\n');
        }
        out
    }

    /// Convert table to plain text with aligned columns
    pub fn to_text(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }

        // Calculate column widths
        let mut widths: Vec<usize> = vec![0; self.num_columns];
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                if i < widths.len() {
                    widths[i] = widths[i].max(cell.chars().count());
                }
            }
        }

        // Build output with padding
        self.rows
            .iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .map(|(i, cell)| {
                        let width = widths.get(i).copied().unwrap_or(0);
                        format!("{:<width$}", cell, width = width)
                    })
                    .collect::<Vec<_>>()
                    .join("  ")
                    .trim_end()
                    .to_string()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Escape a string for CSV output
fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: &[&[&str]]) -> Table {
        Table::from_rows(
            rows.iter()
                .map(|row| row.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn test_csv_output() {
        let t = table(&[&["Name", "Value"], &["Test, Item", "123"], &["say \"hi\"", ""]]);
        assert_eq!(t.to_csv(), "Name,Value\n\"Test, Item\",123\n\"say \"\"hi\"\"\",\n");
    }

    #[test]
    fn test_from_rows_pads_short_rows() {
        let t = table(&[&["a", "b", "c"], &["d"]]);
        assert_eq!(t.num_columns, 3);
        assert_eq!(t.rows[1], vec!["d", "", ""]);
    }

    #[test]
    fn test_concat_keeps_order_and_pads() {
        let first = table(&[&["A", "1"], &["B", "2"]]);
        let second = table(&[&["C", "3", "x"], &["D", "4", "y"]]);

        let combined = Table::concat(&[first, second]);
        assert_eq!(combined.num_columns, 3);
        assert_eq!(combined.to_csv(), "A,1,\nB,2,\nC,3,x\nD,4,y\n");
    }

    #[test]
    fn test_is_empty() {
        assert!(table(&[&["", ""]]).is_empty());
        assert!(!table(&[&["", "x"]]).is_empty());
    }

    #[test]
    fn test_text_output_aligns_columns() {
        let t = table(&[&["Col1", "C"], &["a", "Data2"]]);
        assert_eq!(t.to_text(), "Col1  C\na     Data2");
    }
}
