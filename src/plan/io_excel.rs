// Reading the source tables from Excel workbooks.
//
// The first row of the worksheet holds the column names. The cells are
// converted to text and deserialized with the same row formats as the CSV
// files.

use calamine::{open_workbook, DataType, Range, Reader, Xlsx};
use csv::StringRecord;

use crate::plan::*;

pub fn read_excel_table<T: DeserializeOwned>(
    path: &str,
    worksheet_name: Option<String>,
) -> PlanResult<Vec<T>> {
    let wrange = get_range(path, worksheet_name)?;
    let mut iter = wrange.rows();
    let header = iter.next().context(EmptyExcelSnafu { path })?;
    let header_cells: Vec<String> = header
        .iter()
        .map(|c| cell_to_string(c, path, 1))
        .collect::<PlanResult<Vec<String>>>()?;
    let headers = StringRecord::from(header_cells);
    debug!("read_excel_table: header: {:?}", headers);

    let mut res: Vec<T> = Vec::new();
    for (idx, row) in iter.enumerate() {
        let lineno = idx + 2;
        let cells: Vec<String> = row
            .iter()
            .map(|c| cell_to_string(c, path, lineno))
            .collect::<PlanResult<Vec<String>>>()?;
        if cells.iter().all(|c| c.is_empty()) {
            debug!("read_excel_table: skipping blank line {}", lineno);
            continue;
        }
        let record = StringRecord::from(cells);
        let line: T = record
            .deserialize(Some(&headers))
            .context(CsvLineParseSnafu { path, lineno })?;
        res.push(line);
    }
    debug!("read_excel_table: {:?}: {} lines", path, res.len());
    Ok(res)
}

fn get_range(path: &str, worksheet_name: Option<String>) -> PlanResult<Range<DataType>> {
    debug!("get_range: path: {:?} worksheet: {:?}", path, worksheet_name);
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;
    match worksheet_name {
        Some(name) => {
            let wrange = workbook
                .worksheet_range(&name)
                .context(MissingWorksheetSnafu {
                    path,
                    name: name.clone(),
                })?
                .context(OpeningExcelSnafu { path })?;
            Ok(wrange)
        }
        None => {
            let wrange = workbook
                .worksheet_range_at(0)
                .context(EmptyExcelSnafu { path })?
                .context(OpeningExcelSnafu { path })?;
            Ok(wrange)
        }
    }
}

fn cell_to_string(cell: &DataType, path: &str, lineno: usize) -> PlanResult<String> {
    match cell {
        DataType::String(s) => Ok(s.trim().to_string()),
        // Counts are stored as floats by most spreadsheets.
        DataType::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => Ok(format!("{}", *f as i64)),
        DataType::Float(f) => Ok(f.to_string()),
        DataType::Int(i) => Ok(i.to_string()),
        DataType::Bool(b) => Ok(b.to_string()),
        DataType::Empty => Ok(String::new()),
        _ => ExcelWrongCellTypeSnafu {
            path,
            lineno,
            content: format!("{:?}", cell),
        }
        .fail(),
    }
}
