use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info};

use super::normalize::normalize_name;
use crate::error::LookupError;

/// Row of the `authors` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthorRow {
    pub variant_name: String,
    pub authorized_name: String,
    #[serde(rename = "dll_id_author")]
    pub author_id: String,
}

/// Row of the `works` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorkRow {
    pub title: String,
    #[serde(rename = "dll_id_work")]
    pub work_id: String,
    #[serde(rename = "dll_id_author")]
    pub author_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorRecord {
    pub authorized_name: String,
    pub author_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkRecord {
    pub work_id: String,
    pub author_id: String,
}

/// Variant-name and title lookup tables.
#[derive(Debug, Clone, Default)]
pub struct Lookups {
    /// Keyed by [`normalize_name`] of the variant name.
    pub name_to_author: HashMap<String, AuthorRecord>,
    /// Keyed by the literal title.
    pub title_to_work: HashMap<String, WorkRecord>,
}

impl Lookups {
    /// Normalizes `raw_name` and looks it up among the variant names.
    pub fn match_author(&self, raw_name: &str) -> Option<&AuthorRecord> {
        self.name_to_author.get(&normalize_name(raw_name))
    }

    /// Exact title lookup. Titles are not normalized.
    pub fn match_title(&self, title: &str) -> Option<&WorkRecord> {
        self.title_to_work.get(title)
    }

    pub fn into_parts(self) -> (HashMap<String, AuthorRecord>, HashMap<String, WorkRecord>) {
        (self.name_to_author, self.title_to_work)
    }
}

/// Builds both lookup tables in one pass over each input.
/// On key collisions the later row wins.
pub fn build_lookups<A, W>(authors: A, works: W) -> Lookups
where
    A: IntoIterator<Item = AuthorRow>,
    W: IntoIterator<Item = WorkRow>,
{
    let mut name_to_author = HashMap::new();
    for row in authors {
        let key = normalize_name(&row.variant_name);
        if let Some(previous) = name_to_author.insert(
            key,
            AuthorRecord {
                authorized_name: row.authorized_name,
                author_id: row.author_id,
            },
        ) {
            debug!(
                "Variant '{}' replaces earlier mapping to {}",
                row.variant_name, previous.author_id
            );
        }
    }

    let title_to_work = works
        .into_iter()
        .map(|row| {
            (
                row.title,
                WorkRecord {
                    work_id: row.work_id,
                    author_id: row.author_id,
                },
            )
        })
        .collect();

    Lookups {
        name_to_author,
        title_to_work,
    }
}

/// Reads the `authors` table from CSV with a header row.
pub fn read_authors<R: Read>(reader: R) -> Result<Vec<AuthorRow>, LookupError> {
    read_rows(reader)
}

/// Reads the `works` table from CSV with a header row.
pub fn read_works<R: Read>(reader: R) -> Result<Vec<WorkRow>, LookupError> {
    read_rows(reader)
}

fn read_rows<R, T>(reader: R) -> Result<Vec<T>, LookupError>
where
    R: Read,
    T: for<'de> Deserialize<'de>,
{
    let mut rows = Vec::new();
    for record in csv::Reader::from_reader(reader).deserialize() {
        rows.push(record?);
    }
    Ok(rows)
}

/// Reads both CSV tables from disk and builds the lookups.
pub fn load_lookups(authors_path: &Path, works_path: &Path) -> Result<Lookups, LookupError> {
    let authors = read_authors(open_table(authors_path)?)?;
    let works = read_works(open_table(works_path)?)?;
    let lookups = build_lookups(authors, works);
    info!(
        "Built lookups: {} author variants, {} titles",
        lookups.name_to_author.len(),
        lookups.title_to_work.len()
    );
    Ok(lookups)
}

fn open_table(path: &Path) -> Result<File, LookupError> {
    File::open(path).map_err(|source| LookupError::Open {
        path: path.display().to_string(),
        source,
    })
}
