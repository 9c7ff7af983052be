//! CSV persistence for results tables and consolidation of tables written
//! by separate batch runs.

use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

use tracing::{debug, info};
use crate::{
    error::{Result, StatsError},
    types::{FilenameColumn, ResultsTable, StatisticRow},
};

/// Index column names pandas writes when the index was not dropped.
const INDEX_COLUMNS: [&str; 2] = ["", "Unnamed: 0"];

fn format_value(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        value.to_string()
    }
}

fn parse_value(field: &str, line: u64) -> Result<f64> {
    let field = field.trim();
    if field.is_empty() || field.eq_ignore_ascii_case("nan") {
        return Ok(f64::NAN);
    }
    field
        .parse::<f64>()
        .map_err(|_| StatsError::InvalidTable(format!("line {line}: '{field}' is not a number")))
}

impl ResultsTable {
    /// Write the table as CSV; NaN becomes an empty field.
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(self.header())?;
        for row in &self.rows {
            let mut record = Vec::with_capacity(row.values.len() + 1);
            if self.filename_column == FilenameColumn::Leading {
                record.push(row.filename.clone());
            }
            record.extend(row.values.iter().map(|&v| format_value(v)));
            if self.filename_column == FilenameColumn::Trailing {
                record.push(row.filename.clone());
            }
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Read a table written by [`ResultsTable::write_csv`] or by pandas.
    ///
    /// The filename column must be the first or last column; a leading
    /// unnamed index column is dropped.
    pub fn read_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path.as_ref())?;
        let mut header: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

        let skip_index = header.len() > 1 && INDEX_COLUMNS.contains(&header[0].as_str());
        if skip_index {
            header.remove(0);
        }

        let filename_column = if header.first().map(String::as_str) == Some(Self::FILENAME) {
            FilenameColumn::Leading
        } else if header.last().map(String::as_str) == Some(Self::FILENAME) {
            FilenameColumn::Trailing
        } else {
            return Err(StatsError::InvalidTable(format!(
                "{} has no leading or trailing '{}' column",
                path.as_ref().display(),
                Self::FILENAME
            )));
        };

        let columns = match filename_column {
            FilenameColumn::Leading => header[1..].to_vec(),
            FilenameColumn::Trailing => header[..header.len() - 1].to_vec(),
        };
        let mut table = Self::new(columns, filename_column);

        for record in reader.records() {
            let record = record?;
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            let fields: Vec<&str> = record.iter().skip(usize::from(skip_index)).collect();
            let (filename, values) = match filename_column {
                FilenameColumn::Leading => (fields[0], &fields[1..]),
                FilenameColumn::Trailing => (fields[fields.len() - 1], &fields[..fields.len() - 1]),
            };
            let values = values
                .iter()
                .map(|field| parse_value(field, line))
                .collect::<Result<Vec<_>>>()?;
            table.push(StatisticRow {
                filename: filename.to_string(),
                values,
            });
        }

        Ok(table)
    }
}

/// Index into `found` for each of the `expected` columns, matched by name.
/// Repeated names pair up by occurrence. `None` when the column sets differ.
fn column_order(expected: &[String], found: &[String]) -> Option<Vec<usize>> {
    if expected.len() != found.len() {
        return None;
    }
    let mut taken = vec![false; found.len()];
    expected
        .iter()
        .map(|name| {
            let index = found
                .iter()
                .enumerate()
                .position(|(i, candidate)| !taken[i] && candidate == name)?;
            taken[index] = true;
            Some(index)
        })
        .collect()
}

/// Filenames already present in a previous results file.
pub fn processed_filenames<P: AsRef<Path>>(path: P) -> Result<HashSet<String>> {
    let table = ResultsTable::read_csv(path)?;
    Ok(table.filenames().map(str::to_string).collect())
}

/// Merges results tables from several runs into one.
#[derive(Debug, Clone)]
pub struct ResultsAssembler {
    /// Replacement for missing statistics
    pub fill_value: f64,
    /// Extension of the table files to pick up
    pub extension: String,
}

impl Default for ResultsAssembler {
    fn default() -> Self {
        Self {
            fill_value: 0.0,
            extension: "csv".to_string(),
        }
    }
}

impl ResultsAssembler {
    fn table_files(&self, folder: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(folder)? {
            let path = entry?.path();
            let matches = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case(&self.extension));
            if path.is_file() && matches {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Concatenate every table in `folder` (sorted by file name), then
    /// replace missing values with the fill value.
    ///
    /// Columns are matched by name, so later tables may order them (and the
    /// filename column) differently; the first table's layout is kept.
    pub fn consolidate<P: AsRef<Path>>(&self, folder: P) -> Result<ResultsTable> {
        let folder = folder.as_ref();
        let files = self.table_files(folder)?;

        let mut merged: Option<ResultsTable> = None;
        for file in &files {
            let table = ResultsTable::read_csv(file)?;
            debug!("Loaded {} rows from {}", table.len(), file.display());

            let Some(acc) = merged.as_mut() else {
                merged = Some(table);
                continue;
            };
            let Some(order) = column_order(&acc.columns, &table.columns) else {
                return Err(StatsError::SchemaMismatch {
                    file: file.display().to_string(),
                    expected: acc.header(),
                    found: table.header(),
                });
            };
            acc.rows.extend(table.rows.into_iter().map(|row| StatisticRow {
                values: order.iter().map(|&i| row.values[i]).collect(),
                filename: row.filename,
            }));
        }

        let mut merged =
            merged.ok_or_else(|| StatsError::EmptyFolder(folder.display().to_string()))?;
        merged.fill_nan(self.fill_value);
        info!(
            "Consolidated {} tables into {} rows",
            files.len(),
            merged.len()
        );
        Ok(merged)
    }
}

/// [`ResultsAssembler::consolidate`] with the default zero fill.
pub fn consolidate<P: AsRef<Path>>(folder: P) -> Result<ResultsTable> {
    ResultsAssembler::default().consolidate(folder)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(columns: &[&str], rows: &[(&str, Vec<f64>)]) -> ResultsTable {
        let mut table = ResultsTable::new(
            columns.iter().map(|c| c.to_string()).collect(),
            FilenameColumn::Leading,
        );
        for (name, values) in rows {
            table.push(StatisticRow {
                filename: name.to_string(),
                values: values.clone(),
            });
        }
        table
    }

    #[test]
    fn test_csv_round_trip_keeps_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("batch.csv");
        let original = table(
            &["greenspace_ratio", "tree_ratio"],
            &[("a.npy", vec![62.5, f64::NAN]), ("b.npy", vec![25.0, 100.0])],
        );
        original.write_csv(&path).unwrap();

        let loaded = ResultsTable::read_csv(&path).unwrap();
        assert_eq!(loaded.header(), original.header());
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.rows[0].filename, "a.npy");
        assert_eq!(loaded.rows[0].values[0], 62.5);
        assert!(loaded.rows[0].values[1].is_nan());
        assert_eq!(loaded.rows[1].values, vec![25.0, 100.0]);
    }

    #[test]
    fn test_trailing_filename_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("green.csv");
        let mut green = ResultsTable::new(
            vec!["g_green_joint".to_string(), "g_green_perc".to_string()],
            FilenameColumn::Trailing,
        );
        green.push(StatisticRow {
            filename: "img_001".to_string(),
            values: vec![80.0, 12.5],
        });
        green.write_csv(&path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("g_green_joint,g_green_perc,filename"));

        let loaded = ResultsTable::read_csv(&path).unwrap();
        assert_eq!(loaded.filename_column, FilenameColumn::Trailing);
        assert_eq!(loaded.rows[0].filename, "img_001");
    }

    #[test]
    fn test_reads_pandas_index_and_nan() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pandas.csv");
        fs::write(&path, ",filename,sky_ratio\n0,x.npy,NaN\n1,y.npy,40.0\n").unwrap();

        let loaded = ResultsTable::read_csv(&path).unwrap();
        assert_eq!(loaded.columns, vec!["sky_ratio"]);
        assert!(loaded.rows[0].values[0].is_nan());
        assert_eq!(loaded.rows[1].values[0], 40.0);
    }

    #[test]
    fn test_rejects_table_without_filename() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(&path, "a,b\n1,2\n").unwrap();
        assert!(matches!(
            ResultsTable::read_csv(&path),
            Err(StatsError::InvalidTable(_))
        ));
    }

    #[test]
    fn test_consolidate_concatenates_and_fills() {
        let dir = tempfile::tempdir().unwrap();
        let columns = ["greenspace_ratio", "tree_ratio"];
        table(
            &columns,
            &[("a.npy", vec![10.0, f64::NAN]), ("b.npy", vec![20.0, 30.0])],
        )
        .write_csv(dir.path().join("batch_1.csv"))
        .unwrap();
        table(
            &columns,
            &[
                ("c.npy", vec![f64::NAN, 40.0]),
                ("d.npy", vec![50.0, 60.0]),
                ("e.npy", vec![70.0, 80.0]),
            ],
        )
        .write_csv(dir.path().join("batch_2.csv"))
        .unwrap();

        let merged = consolidate(dir.path()).unwrap();
        assert_eq!(merged.len(), 5);
        let names: Vec<&str> = merged.filenames().collect();
        assert_eq!(names, vec!["a.npy", "b.npy", "c.npy", "d.npy", "e.npy"]);
        assert_eq!(merged.rows[0].values, vec![10.0, 0.0]);
        assert_eq!(merged.rows[2].values, vec![0.0, 40.0]);
        assert_eq!(merged.rows[4].values, vec![70.0, 80.0]);
        assert!(merged.rows.iter().all(|r| r.values.iter().all(|v| !v.is_nan())));
    }

    #[test]
    fn test_consolidate_detects_schema_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        table(&["greenspace_ratio"], &[("a.npy", vec![1.0])])
            .write_csv(dir.path().join("batch_1.csv"))
            .unwrap();
        table(&["bluespace_ratio"], &[("b.npy", vec![2.0])])
            .write_csv(dir.path().join("batch_2.csv"))
            .unwrap();

        assert!(matches!(
            consolidate(dir.path()),
            Err(StatsError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn test_consolidate_aligns_columns_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let first = "filename,tree_ratio,grass_ratio\nx.npy,10,20\n";
        let second = "grass_ratio,tree_ratio,filename\n40,,y.npy\n";
        fs::write(dir.path().join("a.csv"), first).unwrap();
        fs::write(dir.path().join("b.csv"), second).unwrap();

        let merged = consolidate(dir.path()).unwrap();
        assert_eq!(merged.header(), vec!["filename", "tree_ratio", "grass_ratio"]);
        assert_eq!(merged.rows[0].values, vec![10.0, 20.0]);
        assert_eq!(merged.rows[1].filename, "y.npy");
        assert_eq!(merged.rows[1].values, vec![0.0, 40.0]);
    }

    #[test]
    fn test_column_order_pairs_repeated_names() {
        let names = |cols: &[&str]| cols.iter().map(|c| c.to_string()).collect::<Vec<_>>();
        let expected = names(&["sidewalk_ratio", "path_ratio", "sidewalk_ratio"]);
        let found = names(&["path_ratio", "sidewalk_ratio", "sidewalk_ratio"]);
        assert_eq!(column_order(&expected, &found), Some(vec![1, 0, 2]));
        assert_eq!(column_order(&expected, &names(&["path_ratio", "sidewalk_ratio"])), None);
        assert_eq!(
            column_order(&expected, &names(&["path_ratio", "path_ratio", "sidewalk_ratio"])),
            None
        );
    }

    #[test]
    fn test_consolidate_empty_folder() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("notes.txt"), "not a table").unwrap();
        assert!(matches!(
            consolidate(dir.path()),
            Err(StatsError::EmptyFolder(_))
        ));
    }

    #[test]
    fn test_processed_filenames() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("previous.csv");
        table(&["sky_ratio"], &[("a.npy", vec![1.0]), ("b.npy", vec![2.0])])
            .write_csv(&path)
            .unwrap();

        let done = processed_filenames(&path).unwrap();
        assert_eq!(done, HashSet::from(["a.npy".to_string(), "b.npy".to_string()]));
    }
}
