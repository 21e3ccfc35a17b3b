// Primitives for reading CSV files.

use crate::plan::*;

/// Reads every line of a CSV file with a header row. Columns are matched by
/// name, extra columns are ignored.
pub fn read_csv_table<T: DeserializeOwned>(path: &str) -> PlanResult<Vec<T>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    let mut res: Vec<T> = Vec::new();
    for (idx, line_r) in rdr.deserialize().enumerate() {
        // The header is line 1.
        let lineno = idx + 2;
        let line: T = line_r.context(CsvLineParseSnafu { path, lineno })?;
        res.push(line);
    }
    debug!("read_csv_table: {:?}: {} lines", path, res.len());
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::io_common::*;

    fn write_temp(name: &str, contents: &str) -> String {
        let p = std::env::temp_dir()
            .join(format!("sampleplan-csv-{}-{}", std::process::id(), name))
            .display()
            .to_string();
        fs::write(&p, contents).unwrap();
        p
    }

    #[test]
    fn reads_zones() {
        let p = write_temp(
            "zones.csv",
            "UF,MUNICIPIO,ZONA,ELEITORES_TOTAL,ELEITORES_FEMININO,ELEITORES_MASCULINO,SECOES\n\
             SP, Campinas ,33,150000,79000,71000,400\n",
        );
        let rows: Vec<ZoneRow> = read_csv_table(&p).unwrap();
        let _ = fs::remove_file(&p);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].municipality, "Campinas");
        assert_eq!(rows[0].zone, "33");
        assert_eq!(rows[0].electors_total, 150_000);
    }

    #[test]
    fn empty_optional_columns() {
        let p = write_temp(
            "population.csv",
            "UF,MUNICIPIO,POPULACAO_TOTAL,IDH,ID_IBGE\nSP,Americana,237112,,3501608\nSP,Sumaré,,0.762,\n",
        );
        let rows: Vec<PopulationRow> = read_csv_table(&p).unwrap();
        let _ = fs::remove_file(&p);
        assert_eq!(rows[0].population_total, Some(237_112));
        assert_eq!(rows[0].hdi, None);
        assert_eq!(rows[1].population_total, None);
        assert_eq!(rows[1].hdi, Some(0.762));
    }

    #[test]
    fn bad_line() {
        let p = write_temp(
            "bad_profile.csv",
            "UF,MUNICIPIO,DIMENSAO,CATEGORIA,QT_ELEITORES\nSP,Campinas,INSTRUCAO,ANALFABETO,many\n",
        );
        let res: PlanResult<Vec<ProfileRow>> = read_csv_table(&p);
        let _ = fs::remove_file(&p);
        assert!(matches!(res, Err(PlanError::CsvLineParse { lineno: 2, .. })));
    }
}
