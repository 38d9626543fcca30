use crate::matcher::Candidate;
use ahash::AHashMap;
use color_eyre::eyre::{Result, WrapErr};
use serde::Deserialize;
use std::{path::Path, sync::Arc};

/// A school as it comes over the wire (or out of the dataset file).
///
/// Everything is optional here, [`SchoolRecord`] is the validated version.
#[derive(Debug, Deserialize, Default)]
#[non_exhaustive]
pub struct RawSchoolRecord {
    pub name: Option<String>,
    pub country: Option<String>,
    pub alpha_two_code: Option<String>,
    #[serde(rename = "state-province")]
    pub state_province: Option<String>,
    #[serde(default)]
    pub domains: Vec<String>,
    #[serde(default)]
    pub web_pages: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchoolRecord {
    /// Display name, eg. Massachusetts Institute of Technology
    pub name: String,
    pub country: Option<String>,
    /// ISO 3166-1 alpha-2, eg. US
    pub alpha_two_code: Option<String>,
    pub state_province: Option<String>,
    pub domains: Vec<String>,
    pub web_pages: Vec<String>,
}

impl SchoolRecord {
    /// A moderator added school, all we know is the name.
    pub fn custom(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            country: None,
            alpha_two_code: None,
            state_province: None,
            domains: vec![],
            web_pages: vec![],
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

impl TryFrom<RawSchoolRecord> for SchoolRecord {
    type Error = RawSchoolRecord;

    fn try_from(raw: RawSchoolRecord) -> Result<Self, Self::Error> {
        let Some(name) = raw.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) else {
            return Err(raw);
        };

        Ok(Self {
            name: name.to_owned(),
            country: non_blank(raw.country),
            alpha_two_code: non_blank(raw.alpha_two_code),
            state_province: non_blank(raw.state_province),
            domains: raw.domains,
            web_pages: raw.web_pages,
        })
    }
}

/// Read only table of schools, looked up by exact name.
#[derive(Debug, Default)]
pub struct SchoolCatalog {
    records: Vec<SchoolRecord>,
    by_name: AHashMap<String, usize>,
}

impl SchoolCatalog {
    /// Builds the catalog, dropping records without a name.
    /// The first record wins when names repeat.
    pub fn from_raw(raw_records: impl IntoIterator<Item = RawSchoolRecord>) -> Self {
        let mut catalog = Self::default();

        for raw in raw_records {
            match SchoolRecord::try_from(raw) {
                Ok(record) => {
                    if catalog.by_name.contains_key(&record.name) {
                        continue;
                    }
                    catalog
                        .by_name
                        .insert(record.name.clone(), catalog.records.len());
                    catalog.records.push(record);
                }
                Err(raw) => tracing::warn!("Dropping school record without a name: {:?}", raw),
            }
        }

        catalog
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let raw: Vec<RawSchoolRecord> =
            serde_json::from_str(json).wrap_err("Could not parse school list")?;

        Ok(Self::from_raw(raw))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Arc<Self>> {
        let path = path.as_ref();
        let instant = std::time::Instant::now();
        let file = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Could not read school list {}", path.display()))?;

        let catalog = Self::from_json(&file)?;

        tracing::info!(
            "Loaded {} schools in {}ms",
            catalog.len(),
            instant.elapsed().as_millis()
        );

        Ok(Arc::new(catalog))
    }

    pub fn get(&self, name: &str) -> Option<&SchoolRecord> {
        self.by_name.get(name).map(|&index| &self.records[index])
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|record| record.name.as_str())
    }

    /// Names together with their web domains, for matching.
    pub fn candidates(&self) -> impl Iterator<Item = Candidate<'_>> {
        self.records.iter().map(|record| Candidate {
            name: &record.name,
            domains: &record.domains,
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The dataset record if there is one, otherwise a bare custom record.
    pub fn resolve(&self, name: &str) -> SchoolRecord {
        self.get(name)
            .cloned()
            .unwrap_or_else(|| SchoolRecord::custom(name))
    }
}

#[cfg(test)]
pub(crate) fn test_catalog() -> SchoolCatalog {
    let names = [
        "Massachusetts Institute of Technology",
        "Manipal Institute of Technology",
        "Harvard University",
        "Stanford University",
        "University of Oxford",
        "University of Cambridge",
        "Yale University",
        "Princeton University",
        "University College London",
        "Imperial College London",
        "University of Tokyo",
        "University of Utah",
    ];

    SchoolCatalog::from_raw(names.into_iter().map(|name| RawSchoolRecord {
        name: Some(name.to_owned()),
        country: Some("Somewhere".to_owned()),
        ..Default::default()
    }))
}
