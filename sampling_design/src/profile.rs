//! Benchmark stratification of the sample along gender, education and age.
//!
//! Gender is anchored on the zone electorate. Education and age come from the
//! detailed municipal profile, whose free-text labels are mapped onto a fixed
//! set of canonical categories through ordered lookup tables. Labels that
//! match no rule are counted and reported, never silently dropped.

use log::{debug, info, warn};

use crate::apportion::apportion;
use crate::config::*;
use crate::sizing::round_to;

pub const GENDER_SOURCE: &str = "TSE (municipal electorate by zone)";
pub const PROFILE_SOURCE: &str = "TSE (municipal profile by polling section)";

const METHODOLOGY: &str = "Municipal stratification: quotas computed with the largest remainder (Hamilton) \
     method, adding up exactly to the final sample. Proportions are derived only from official data observed \
     for the municipality (TSE), without fixed benchmark percentages.";

const MISSING_PROFILE_NOTE: &str =
    "Detailed municipal profile (education / age group) not found for this municipality.";

/// The outcome of mapping a raw source label.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Mapping<C> {
    Mapped(C),
    Unmapped,
}

/// A closed set of categories with a fixed presentation order.
pub trait CanonicalCategory: Copy + Eq + 'static {
    /// All the categories, in canonical order.
    const ALL: &'static [Self];

    fn label(&self) -> &'static str;

    fn position(&self) -> Option<usize> {
        Self::ALL.iter().position(|c| c == self)
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Gender {
    Female,
    Male,
}

impl CanonicalCategory for Gender {
    const ALL: &'static [Gender] = &[Gender::Female, Gender::Male];

    fn label(&self) -> &'static str {
        match self {
            Gender::Female => "Female",
            Gender::Male => "Male",
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum EducationLevel {
    Illiterate,
    ReadsAndWrites,
    Elementary,
    HighSchool,
    Higher,
}

impl CanonicalCategory for EducationLevel {
    const ALL: &'static [EducationLevel] = &[
        EducationLevel::Illiterate,
        EducationLevel::ReadsAndWrites,
        EducationLevel::Elementary,
        EducationLevel::HighSchool,
        EducationLevel::Higher,
    ];

    fn label(&self) -> &'static str {
        match self {
            EducationLevel::Illiterate => "Illiterate",
            EducationLevel::ReadsAndWrites => "Reads and writes",
            EducationLevel::Elementary => "Elementary school",
            EducationLevel::HighSchool => "High school",
            EducationLevel::Higher => "Higher education",
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum AgeBracket {
    From16To24,
    From25To34,
    From35To44,
    From45To59,
    From60,
}

impl CanonicalCategory for AgeBracket {
    const ALL: &'static [AgeBracket] = &[
        AgeBracket::From16To24,
        AgeBracket::From25To34,
        AgeBracket::From35To44,
        AgeBracket::From45To59,
        AgeBracket::From60,
    ];

    fn label(&self) -> &'static str {
        match self {
            AgeBracket::From16To24 => "16 to 24 years",
            AgeBracket::From25To34 => "25 to 34 years",
            AgeBracket::From35To44 => "35 to 44 years",
            AgeBracket::From45To59 => "45 to 59 years",
            AgeBracket::From60 => "60 years and over",
        }
    }
}

// A rule matches when the normalized label contains any of its patterns. The
// first matching rule wins.
type Rules<C> = [(&'static [&'static str], C)];

const GENDER_RULES: &Rules<Gender> = &[
    (&["FEMININO", "FEMALE"], Gender::Female),
    (&["MASCULINO", "MALE"], Gender::Male),
];

const EDUCATION_RULES: &Rules<EducationLevel> = &[
    (&["ANALFAB"], EducationLevel::Illiterate),
    (&["LE E ESCREVE", "LÊ E ESCREVE"], EducationLevel::ReadsAndWrites),
    (&["FUNDAMENTAL"], EducationLevel::Elementary),
    (&["MEDIO", "MÉDIO"], EducationLevel::HighSchool),
    (&["SUPERIOR"], EducationLevel::Higher),
];

// The registry writes brackets such as "21 A 24 ANOS" or "100 ANOS OU MAIS":
// any age number inside the bracket identifies it.
const AGE_RULES: &Rules<AgeBracket> = &[
    (
        &["16", "17", "18", "19", "20", "21", "22", "23", "24"],
        AgeBracket::From16To24,
    ),
    (
        &["25", "26", "27", "28", "29", "30", "31", "32", "33", "34"],
        AgeBracket::From25To34,
    ),
    (
        &["35", "36", "37", "38", "39", "40", "41", "42", "43", "44"],
        AgeBracket::From35To44,
    ),
    (
        &[
            "45", "46", "47", "48", "49", "50", "51", "52", "53", "54", "55", "56", "57", "58", "59",
        ],
        AgeBracket::From45To59,
    ),
    (
        &[
            "60", "61", "62", "63", "64", "65", "66", "67", "68", "69", "70", "71", "72", "73", "74", "75",
            "79", "80", "84", "89", "94", "95", "99", "100",
        ],
        AgeBracket::From60,
    ),
];

/// Trims, upper-cases and collapses the inner whitespace of a label.
pub fn normalize_label(label: &str) -> String {
    label.split_whitespace().collect::<Vec<&str>>().join(" ").to_uppercase()
}

fn apply_rules<C: Copy>(rules: &Rules<C>, label: &str) -> Mapping<C> {
    let norm = normalize_label(label);
    if norm.is_empty() {
        return Mapping::Unmapped;
    }
    for (patterns, category) in rules.iter() {
        if patterns.iter().any(|p| norm.contains(p)) {
            return Mapping::Mapped(*category);
        }
    }
    Mapping::Unmapped
}

pub fn map_gender(label: &str) -> Mapping<Gender> {
    // FEMALE contains MALE: the female rule must stay first.
    apply_rules(GENDER_RULES, label)
}

pub fn map_education(label: &str) -> Mapping<EducationLevel> {
    apply_rules(EDUCATION_RULES, label)
}

pub fn map_age(label: &str) -> Mapping<AgeBracket> {
    apply_rules(AGE_RULES, label)
}

fn build_table(
    dimension: ProfileDimension,
    source: &str,
    labels: &[&'static str],
    percentages: &[f64],
    mapped_electors: u64,
    unmapped_electors: u64,
    sample: u64,
) -> Result<DimensionTable, SamplingErrors> {
    let allocated = apportion(sample, percentages);
    let categories: Vec<CategoryShare> = labels
        .iter()
        .zip(percentages.iter())
        .zip(allocated.iter())
        .map(|((label, percentage), count)| CategoryShare {
            label: label.to_string(),
            percentage: *percentage,
            allocated_count: *count,
            sample_percentage: if sample > 0 {
                round_to(*count as f64 / sample as f64 * 100.0, 2)
            } else {
                0.0
            },
        })
        .collect();
    DimensionTable::new(dimension, source, categories, mapped_electors, unmapped_electors, sample)
}

/// The gender table, from the elector counts of the zones.
pub fn gender_table(zones: &[Zone], sample: u64) -> Result<DimensionTable, SamplingErrors> {
    let total: u64 = zones.iter().map(|z| z.electors_total).sum();
    let female: u64 = zones.iter().map(|z| z.electors_female).sum();
    let female_pct = if total > 0 {
        round_to(female as f64 / total as f64 * 100.0, 2)
    } else {
        50.0
    };
    let male_pct = round_to(100.0 - female_pct, 2);
    debug!("gender_table: female={} total={} -> {}% / {}%", female, total, female_pct, male_pct);
    let labels: Vec<&'static str> = Gender::ALL.iter().map(|g| g.label()).collect();
    build_table(
        ProfileDimension::Gender,
        GENDER_SOURCE,
        &labels,
        &[female_pct, male_pct],
        total,
        0,
        sample,
    )
}

fn category_table<C: CanonicalCategory>(
    dimension: ProfileDimension,
    records: &[ProfileRecord],
    mapper: fn(&str) -> Mapping<C>,
    sample: u64,
) -> Result<DimensionTable, SamplingErrors> {
    let mut counts: Vec<u64> = vec![0; C::ALL.len()];
    let mut unmapped: u64 = 0;
    for r in records.iter().filter(|r| r.dimension == dimension) {
        match mapper(&r.raw_label).into_position() {
            Some(idx) => counts[idx] += r.elector_count,
            None => {
                debug!(
                    "category_table: {}: unmapped label {:?} ({} electors)",
                    dimension.title(),
                    r.raw_label,
                    r.elector_count
                );
                unmapped += r.elector_count;
            }
        }
    }
    let mapped: u64 = counts.iter().sum();
    if mapped == 0 {
        return Ok(DimensionTable::empty(dimension, PROFILE_SOURCE, unmapped, sample));
    }
    let percentages: Vec<f64> = counts
        .iter()
        .map(|c| round_to(*c as f64 / mapped as f64 * 100.0, 6))
        .collect();
    let labels: Vec<&'static str> = C::ALL.iter().map(|c| c.label()).collect();
    build_table(dimension, PROFILE_SOURCE, &labels, &percentages, mapped, unmapped, sample)
}

impl<C: CanonicalCategory> Mapping<C> {
    fn into_position(self) -> Option<usize> {
        match self {
            Mapping::Mapped(c) => c.position(),
            Mapping::Unmapped => None,
        }
    }
}

/// The table of one dimension built from the profile records of that
/// dimension. Records of other dimensions are ignored.
///
/// The table is empty when no record maps to a canonical category.
pub fn dimension_table(
    dimension: ProfileDimension,
    records: &[ProfileRecord],
    sample: u64,
) -> Result<DimensionTable, SamplingErrors> {
    match dimension {
        ProfileDimension::Gender => category_table(dimension, records, map_gender, sample),
        ProfileDimension::Education => category_table(dimension, records, map_education, sample),
        ProfileDimension::Age => category_table(dimension, records, map_age, sample),
    }
}

/// Builds the gender, education and age benchmark tables of a sample.
///
/// Gender always comes from the zones. Without a profile, the education and
/// age tables are empty and a note says so.
pub fn profile_strata(
    zones: &[Zone],
    profile: Option<&[ProfileRecord]>,
    sample: u64,
) -> Result<StratificationBenchmark, SamplingErrors> {
    let mut tables: Vec<DimensionTable> = vec![gender_table(zones, sample)?];
    let mut notes: Vec<String> = Vec::new();

    match profile {
        Some(records) if !records.is_empty() => {
            for dimension in [ProfileDimension::Education, ProfileDimension::Age] {
                let table = dimension_table(dimension, records, sample)?;
                if table.is_empty() {
                    warn!("No usable {} data in the municipal profile", dimension.title());
                    notes.push(format!(
                        "No {} category of the municipal profile could be used: the table is left empty.",
                        dimension.title()
                    ));
                }
                if table.unmapped_electors() > 0 {
                    warn!(
                        "{} electors with an unknown {} label",
                        table.unmapped_electors(),
                        dimension.title()
                    );
                    notes.push(format!(
                        "{}: {} electors ({:.2}%) have a category label outside the canonical categories and are not represented.",
                        dimension.title(),
                        table.unmapped_electors(),
                        table.unmapped_share() * 100.0
                    ));
                }
                tables.push(table);
            }
        }
        _ => {
            warn!("No municipal profile, education and age tables are empty");
            notes.push(MISSING_PROFILE_NOTE.to_string());
            tables.push(DimensionTable::empty(ProfileDimension::Education, PROFILE_SOURCE, 0, sample));
            tables.push(DimensionTable::empty(ProfileDimension::Age, PROFILE_SOURCE, 0, sample));
        }
    }
    info!(
        "Benchmark tables: {}",
        tables
            .iter()
            .map(|t| format!("{}={}", t.title(), t.categories().len()))
            .collect::<Vec<String>>()
            .join(" ")
    );
    Ok(StratificationBenchmark {
        methodology: METHODOLOGY.to_string(),
        notes,
        tables,
    })
}
