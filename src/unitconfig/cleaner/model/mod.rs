use serde::{Deserialize, Serialize};

/// One data row. Cells are stored positionally and always line up with the
/// owning table's columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    cells: Vec<String>,
}

impl Record {
    /// Returns the cell at the given column index, or an empty string when the
    /// index is out of range.
    pub fn get(&self, column: usize) -> &str {
        self.cells.get(column).map(String::as_str).unwrap_or("")
    }

    /// All cells in column order.
    pub fn cells(&self) -> &[String] {
        &self.cells
    }
}

/// Ordered rows sharing one header row. Values are kept as text exactly as
/// read; the column set can only change through [`Table::set_column`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Record>,
}

impl Table {
    /// Creates an empty table with the provided headers.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Appends a row. Short rows are padded with empty cells; rows wider than
    /// the header are rejected and handed back to the caller.
    pub fn push_row(&mut self, mut cells: Vec<String>) -> std::result::Result<(), Vec<String>> {
        if cells.len() > self.columns.len() {
            return Err(cells);
        }
        cells.resize(self.columns.len(), String::new());
        self.rows.push(Record { cells });
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the first column whose header equals `name` exactly.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// Values of one column in row order.
    pub fn column_values(&self, column: usize) -> Vec<&str> {
        self.rows.iter().map(|row| row.get(column)).collect()
    }

    /// Keeps only the rows whose index is accepted by `keep`, preserving order.
    pub fn retain_rows(&mut self, mut keep: impl FnMut(usize) -> bool) {
        let mut index = 0;
        self.rows.retain(|_| {
            let retained = keep(index);
            index += 1;
            retained
        });
    }

    /// Writes `values` into the column named `name`, overwriting the first
    /// column with that exact header or appending a new column at the end.
    /// Returns the index of the written column.
    pub fn set_column(&mut self, name: &str, values: Vec<String>) -> usize {
        let column = match self.column_index(name) {
            Some(index) => index,
            None => {
                self.columns.push(name.to_string());
                for row in &mut self.rows {
                    row.cells.push(String::new());
                }
                self.columns.len() - 1
            }
        };
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.cells[column] = value;
        }
        column
    }

    /// Applies `map` to every cell of every row.
    pub fn map_cells(&mut self, mut map: impl FnMut(&str) -> Option<String>) {
        for row in &mut self.rows {
            for cell in &mut row.cells {
                if let Some(replacement) = map(cell) {
                    *cell = replacement;
                }
            }
        }
    }
}
