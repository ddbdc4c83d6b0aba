//! CSV loaders for the three tabular sources
//!
//! Every row is coerced by a total function that either yields a typed
//! record or an explicit skip reason. Skips never abort a load; they are
//! collected into a [`LoadReport`].

use super::models::{
    Project, Publication, Researcher, DEFAULT_DEGREE, DEFAULT_DISCIPLINE, DEFAULT_ROLE,
};
use crate::errors::{AppError, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Why a source row was dropped
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    MalformedRow(String),
    MissingId,
    InvalidId(String),
    DuplicateId(i64),
    MissingKey,
    InvalidYear(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MalformedRow(e) => write!(f, "malformed row: {e}"),
            SkipReason::MissingId => write!(f, "missing id"),
            SkipReason::InvalidId(raw) => write!(f, "id is not numeric: {raw}"),
            SkipReason::DuplicateId(id) => write!(f, "duplicate id {id}"),
            SkipReason::MissingKey => write!(f, "missing rut_ir"),
            SkipReason::InvalidYear(raw) => write!(f, "year is not numeric: {raw}"),
        }
    }
}

/// Result of coercing one source row
#[derive(Debug)]
pub enum RowOutcome<T> {
    Loaded(T),
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedRow {
    /// 1-based line in the source, header included
    pub line: u64,
    pub reason: SkipReason,
}

/// Aggregated loader outcome for one source
#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    pub source: String,
    pub loaded: usize,
    pub skipped: Vec<SkippedRow>,
}

impl LoadReport {
    fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
            loaded: 0,
            skipped: Vec::new(),
        }
    }

    /// Report for a source that was absent and treated as empty
    pub fn empty(source: &str) -> Self {
        Self::new(source)
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ResearcherRow {
    id: Option<String>,
    name: Option<String>,
    grado_mayor: Option<String>,
    orcid: Option<String>,
    email: Option<String>,
    ocde_2: Option<String>,
    rut_ir: Option<String>,
    unidad_contrato: Option<String>,
    programa: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProjectRow {
    rut_ir: Option<String>,
    codigo: Option<String>,
    titulo: Option<String>,
    #[serde(rename = "año")]
    year: Option<String>,
    #[serde(alias = "ocde_2")]
    disciplina: Option<String>,
    tipo_proyecto: Option<String>,
    rol: Option<String>,
    investigador_responsable: Option<String>,
    co_investigador: Option<String>,
    unidad: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PublicationRow {
    rut_ir: Option<String>,
    #[serde(rename = "año")]
    year: Option<String>,
    titulo: Option<String>,
    revista: Option<String>,
    cuartil: Option<String>,
    autor: Option<String>,
    wos_id: Option<String>,
    liderado: Option<String>,
    url: Option<String>,
    doi: Option<String>,
}

/// Load researchers from a CSV file
pub fn load_researchers(path: &Path) -> Result<(Vec<Researcher>, LoadReport)> {
    read_researchers(open_source(path, "researchers")?)
}

/// Load projects from a CSV file
pub fn load_projects(path: &Path) -> Result<(Vec<Project>, LoadReport)> {
    read_projects(open_source(path, "projects")?)
}

/// Load publications from a CSV file
pub fn load_publications(path: &Path) -> Result<(Vec<Publication>, LoadReport)> {
    read_publications(open_source(path, "publications")?)
}

pub fn read_researchers<R: Read>(reader: R) -> Result<(Vec<Researcher>, LoadReport)> {
    let mut seen = HashSet::new();
    read_rows("researchers", reader, |row: ResearcherRow| {
        researcher_from_row(row, &mut seen)
    })
}

pub fn read_projects<R: Read>(reader: R) -> Result<(Vec<Project>, LoadReport)> {
    read_rows("projects", reader, project_from_row)
}

pub fn read_publications<R: Read>(reader: R) -> Result<(Vec<Publication>, LoadReport)> {
    read_rows("publications", reader, publication_from_row)
}

fn open_source(path: &Path, source: &str) -> Result<File> {
    File::open(path).map_err(|e| AppError::DataLoad {
        source_name: source.to_string(),
        message: format!("{}: {}", path.display(), e),
    })
}

fn read_rows<R, Row, T, F>(source: &str, reader: R, mut convert: F) -> Result<(Vec<T>, LoadReport)>
where
    R: Read,
    Row: DeserializeOwned,
    F: FnMut(Row) -> RowOutcome<T>,
{
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers: StringRecord = rdr.headers()?.iter().map(clean_header).collect();

    let mut records = Vec::new();
    let mut report = LoadReport::new(source);

    for (index, result) in rdr.records().enumerate() {
        let line = index as u64 + 2;

        let row: Row = match result.and_then(|record| record.deserialize(Some(&headers))) {
            Ok(row) => row,
            Err(e) => {
                report.skipped.push(SkippedRow {
                    line,
                    reason: SkipReason::MalformedRow(e.to_string()),
                });
                continue;
            }
        };

        match convert(row) {
            RowOutcome::Loaded(record) => {
                records.push(record);
                report.loaded += 1;
            }
            RowOutcome::Skipped(reason) => {
                debug!(source, line, reason = %reason, "Skipping row");
                report.skipped.push(SkippedRow { line, reason });
            }
        }
    }

    info!(
        source,
        loaded = report.loaded,
        skipped = report.skipped_count(),
        "Source loaded"
    );
    crate::metrics::record_load(source, report.loaded, report.skipped_count());

    Ok((records, report))
}

fn researcher_from_row(row: ResearcherRow, seen: &mut HashSet<i64>) -> RowOutcome<Researcher> {
    let id = match cell(row.id) {
        None => return RowOutcome::Skipped(SkipReason::MissingId),
        Some(raw) => match parse_integer(&raw) {
            Some(id) => id,
            None => return RowOutcome::Skipped(SkipReason::InvalidId(raw)),
        },
    };

    if !seen.insert(id) {
        return RowOutcome::Skipped(SkipReason::DuplicateId(id));
    }

    RowOutcome::Loaded(Researcher {
        id,
        name: cell(row.name).unwrap_or_default(),
        degree: cell(row.grado_mayor).unwrap_or_else(|| DEFAULT_DEGREE.to_string()),
        orcid: cell(row.orcid).unwrap_or_default(),
        email: cell(row.email).unwrap_or_default(),
        areas: cell(row.ocde_2).map(|raw| split_areas(&raw)).unwrap_or_default(),
        rut_ir: cell(row.rut_ir).map(|k| normalize_key(&k)).unwrap_or_default(),
        unit: cell(row.unidad_contrato).unwrap_or_default(),
        program: cell(row.programa),
    })
}

fn project_from_row(row: ProjectRow) -> RowOutcome<Project> {
    let Some(rut_ir) = cell(row.rut_ir).map(|k| normalize_key(&k)) else {
        return RowOutcome::Skipped(SkipReason::MissingKey);
    };

    let year = match parse_year(row.year) {
        Ok(year) => year,
        Err(reason) => return RowOutcome::Skipped(reason),
    };

    RowOutcome::Loaded(Project {
        rut_ir,
        code: cell(row.codigo).unwrap_or_default(),
        title: cell(row.titulo).unwrap_or_default(),
        year,
        discipline: cell(row.disciplina).unwrap_or_else(|| DEFAULT_DISCIPLINE.to_string()),
        project_type: cell(row.tipo_proyecto).unwrap_or_default(),
        role: cell(row.rol)
            .map(|r| r.replace(';', "").trim().to_string())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| DEFAULT_ROLE.to_string()),
        lead_investigator: cell(row.investigador_responsable).unwrap_or_default(),
        co_investigator: cell(row.co_investigador).unwrap_or_default(),
        unit: cell(row.unidad).unwrap_or_default(),
    })
}

fn publication_from_row(row: PublicationRow) -> RowOutcome<Publication> {
    let Some(rut_ir) = cell(row.rut_ir).map(|k| normalize_key(&k)) else {
        return RowOutcome::Skipped(SkipReason::MissingKey);
    };

    let year = match parse_year(row.year) {
        Ok(year) => year,
        Err(reason) => return RowOutcome::Skipped(reason),
    };

    RowOutcome::Loaded(Publication {
        rut_ir,
        year,
        title: cell(row.titulo).unwrap_or_default(),
        journal: cell(row.revista).unwrap_or_default(),
        quartile: cell(row.cuartil).unwrap_or_default(),
        author: cell(row.autor).unwrap_or_default(),
        wos_id: cell(row.wos_id).unwrap_or_default(),
        led: cell(row.liderado).unwrap_or_default(),
        url: cell(row.url).unwrap_or_default(),
        doi: cell(row.doi).unwrap_or_default(),
    })
}

/// Normalize a raw cell: trimmed, `None` for blanks and spreadsheet `nan`
fn cell(raw: Option<String>) -> Option<String> {
    raw.map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("nan"))
}

fn clean_header(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}').trim().to_string()
}

/// Integer coercion that also accepts whole floats such as `12.0`
fn parse_integer(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(value) = raw.parse::<i64>() {
        return Some(value);
    }

    let value = raw.parse::<f64>().ok()?;
    if value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Some(value as i64)
    } else {
        None
    }
}

/// Blank years become 0; present but non-numeric years drop the row
fn parse_year(raw: Option<String>) -> std::result::Result<i32, SkipReason> {
    match cell(raw) {
        None => Ok(0),
        Some(raw) => parse_integer(&raw)
            .and_then(|y| i32::try_from(y).ok())
            .ok_or(SkipReason::InvalidYear(raw)),
    }
}

/// Spreadsheet exports sometimes turn numeric keys into floats
fn normalize_key(raw: &str) -> String {
    match parse_integer(raw) {
        Some(value) => value.to_string(),
        None => raw.trim().to_string(),
    }
}

/// Split the stored `#`-delimited area column (`,` also accepted)
pub fn split_areas(raw: &str) -> Vec<String> {
    let mut areas: Vec<String> = Vec::new();
    for area in raw.split(['#', ',']).map(str::trim).filter(|a| !a.is_empty()) {
        if !areas.iter().any(|existing| existing == area) {
            areas.push(area.to_string());
        }
    }
    areas
}
