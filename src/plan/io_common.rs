// Row formats of the source tables and the helpers shared by the readers.

use std::collections::BTreeSet;

use serde::Deserialize;

use crate::plan::*;

/// A line of the electorate table: one electoral zone.
#[derive(PartialEq, Eq, Debug, Clone, Deserialize)]
pub struct ZoneRow {
    #[serde(rename = "UF")]
    pub uf: String,
    #[serde(rename = "MUNICIPIO")]
    pub municipality: String,
    #[serde(rename = "ZONA")]
    pub zone: String,
    #[serde(rename = "ELEITORES_TOTAL")]
    pub electors_total: u64,
    #[serde(rename = "ELEITORES_FEMININO")]
    pub electors_female: u64,
    #[serde(rename = "ELEITORES_MASCULINO")]
    pub electors_male: u64,
    #[serde(rename = "SECOES")]
    pub sections: u32,
}

/// A line of the population table: one municipality.
#[derive(PartialEq, Debug, Clone, Deserialize)]
pub struct PopulationRow {
    #[serde(rename = "UF")]
    pub uf: String,
    #[serde(rename = "MUNICIPIO")]
    pub municipality: String,
    #[serde(rename = "POPULACAO_TOTAL")]
    pub population_total: Option<u64>,
    #[serde(rename = "IDH")]
    pub hdi: Option<f64>,
}

/// A line of the profile table.
#[derive(PartialEq, Eq, Debug, Clone, Deserialize)]
pub struct ProfileRow {
    #[serde(rename = "UF")]
    pub uf: String,
    #[serde(rename = "MUNICIPIO")]
    pub municipality: String,
    #[serde(rename = "DIMENSAO")]
    pub dimension: String,
    #[serde(rename = "CATEGORIA")]
    pub category: String,
    #[serde(rename = "QT_ELEITORES")]
    pub elector_count: u64,
}

/// State codes are compared in upper case, names in lower case, both trimmed.
pub fn same_municipality(uf: &str, name: &str, row_uf: &str, row_name: &str) -> bool {
    uf.trim().to_uppercase() == row_uf.trim().to_uppercase()
        && name.trim().to_lowercase() == row_name.trim().to_lowercase()
}

pub fn parse_dimension(s: &str) -> Option<ProfileDimension> {
    match normalize_label(s).as_str() {
        "GENERO" | "GÊNERO" | "GENDER" => Some(ProfileDimension::Gender),
        "INSTRUCAO" | "INSTRUÇÃO" | "GRAU DE INSTRUCAO" | "GRAU DE INSTRUÇÃO" | "EDUCATION" => {
            Some(ProfileDimension::Education)
        }
        "FAIXA_ETARIA" | "FAIXA ETARIA" | "FAIXA ETÁRIA" | "AGE" | "AGE GROUP" => Some(ProfileDimension::Age),
        _ => None,
    }
}

/// Zone numbers are written with 4 digits ("33" becomes "0033"), whether the
/// cell was read as text or as a number.
pub fn normalize_zone_id(zone: &str) -> String {
    let zone = zone.trim();
    if !zone.is_empty() && zone.chars().all(|c| c.is_ascii_digit()) {
        format!("{:0>4}", zone)
    } else {
        zone.to_string()
    }
}

/// Converts a row of the electorate table. The electors without a declared
/// gender are counted as female.
pub fn zone_from_row(row: &ZoneRow) -> Zone {
    let declared = row.electors_female + row.electors_male;
    let electors_female = if declared < row.electors_total {
        warn!(
            "zone {} of {}: completing {} electors without gender",
            row.zone,
            row.municipality,
            row.electors_total - declared
        );
        row.electors_female + (row.electors_total - declared)
    } else {
        row.electors_female
    };
    Zone {
        zone_id: normalize_zone_id(&row.zone),
        electors_total: row.electors_total,
        electors_female,
        electors_male: row.electors_male,
        sections: row.sections,
    }
}

/// The distinct state codes, sorted.
pub fn list_ufs(rows: &[PopulationRow]) -> Vec<String> {
    let ufs: BTreeSet<String> = rows.iter().map(|r| r.uf.trim().to_uppercase()).collect();
    ufs.into_iter().collect()
}

/// The municipalities of a state (or of all the states), sorted by state then
/// name.
pub fn list_municipalities(rows: &[PopulationRow], uf: Option<&str>) -> Vec<(String, String)> {
    let mut res: Vec<(String, String)> = rows
        .iter()
        .filter(|r| match uf {
            Some(uf) => r.uf.trim().to_uppercase() == uf.trim().to_uppercase(),
            None => true,
        })
        .map(|r| (r.uf.trim().to_uppercase(), r.municipality.trim().to_string()))
        .collect();
    res.sort();
    res.dedup();
    res
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zone_row(total: u64, female: u64, male: u64) -> ZoneRow {
        ZoneRow {
            uf: "SP".to_string(),
            municipality: "Campinas".to_string(),
            zone: " 0274 ".to_string(),
            electors_total: total,
            electors_female: female,
            electors_male: male,
            sections: 330,
        }
    }

    fn population_row(uf: &str, name: &str) -> PopulationRow {
        PopulationRow {
            uf: uf.to_string(),
            municipality: name.to_string(),
            population_total: None,
            hdi: None,
        }
    }

    #[test]
    fn municipality_matching() {
        assert!(same_municipality("sp", " campinas", "SP", "Campinas"));
        assert!(same_municipality("RJ", "NITERÓI", "RJ", "Niterói"));
        assert!(!same_municipality("RJ", "Campinas", "SP", "Campinas"));
        assert!(!same_municipality("SP", "Campina", "SP", "Campinas"));
    }

    #[test]
    fn dimensions() {
        assert_eq!(parse_dimension("GENERO"), Some(ProfileDimension::Gender));
        assert_eq!(parse_dimension("instrucao"), Some(ProfileDimension::Education));
        assert_eq!(parse_dimension(" FAIXA_ETARIA "), Some(ProfileDimension::Age));
        assert_eq!(parse_dimension("RACA"), None);
    }

    #[test]
    fn gender_completion() {
        let z = zone_from_row(&zone_row(120_000, 62_000, 56_000));
        assert_eq!(z.zone_id, "0274");
        assert_eq!(z.electors_female, 64_000);
        assert_eq!(z.electors_male, 56_000);

        let z = zone_from_row(&zone_row(120_000, 64_000, 56_000));
        assert_eq!(z.electors_female, 64_000);
    }

    #[test]
    fn zone_ids() {
        assert_eq!(normalize_zone_id("33"), "0033");
        assert_eq!(normalize_zone_id(" 0033 "), "0033");
        assert_eq!(normalize_zone_id("0274"), "0274");
        assert_eq!(normalize_zone_id("12345"), "12345");
        assert_eq!(normalize_zone_id("ZE-3"), "ZE-3");
        let mut row = zone_row(120_000, 64_000, 56_000);
        row.zone = "274".to_string();
        assert_eq!(zone_from_row(&row).zone_id, "0274");
    }

    #[test]
    fn listings() {
        let rows = vec![
            population_row("sp", "Valinhos"),
            population_row("RJ", "Niterói"),
            population_row("SP", "Campinas"),
            population_row("SP", "Campinas"),
        ];
        assert_eq!(list_ufs(&rows), vec!["RJ".to_string(), "SP".to_string()]);
        assert_eq!(
            list_municipalities(&rows, Some("SP")),
            vec![
                ("SP".to_string(), "Campinas".to_string()),
                ("SP".to_string(), "Valinhos".to_string())
            ]
        );
        assert_eq!(list_municipalities(&rows, None).len(), 3);
    }
}
