// Copyright 2023 Remi Bernotavicius

//! Loading the ingredient catalogue, a JSON array of
//! `{"name": "...", "measurement_unit": "..."}` objects.

use crate::database::models::NewIngredient;
use crate::database::{self, query};
use crate::Result;
use diesel::prelude::Connection as _;
use serde::Deserialize;
use std::path::Path;

const BATCH_SIZE: usize = 100;

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct IngredientRecord {
    pub name: String,
    pub measurement_unit: String,
}

pub trait Importer {
    fn done(&self) -> bool;
    fn num_imported(&self) -> usize;
    fn percent_done(&self) -> f32;
    fn import_one(&mut self, conn: &mut database::Connection) -> Result<()>;
}

pub struct IngredientImporter {
    records: Vec<IngredientRecord>,
    total: usize,
    num_processed: usize,
    num_imported: usize,
}

impl IngredientImporter {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .map_err(|e| format!("failed to open {}: {e}", path.display()))?;
        let records: Vec<IngredientRecord> =
            serde_json::from_reader(std::io::BufReader::new(file))?;
        Ok(Self::from_records(records))
    }

    pub fn from_records(records: Vec<IngredientRecord>) -> Self {
        Self {
            total: records.len(),
            records,
            num_processed: 0,
            num_imported: 0,
        }
    }

    /// Records already present in the catalogue.
    pub fn num_skipped(&self) -> usize {
        self.num_processed - self.num_imported
    }
}

impl Importer for IngredientImporter {
    fn done(&self) -> bool {
        self.records.is_empty()
    }

    fn num_imported(&self) -> usize {
        self.num_imported
    }

    fn percent_done(&self) -> f32 {
        if self.total == 0 {
            return 1.0;
        }
        self.num_processed as f32 / self.total as f32
    }

    fn import_one(&mut self, conn: &mut database::Connection) -> Result<()> {
        assert!(!self.done());

        let batch_len = self.records.len().min(BATCH_SIZE);
        let batch: Vec<_> = self.records.drain(..batch_len).collect();
        let imported = conn.transaction(|conn| {
            let mut imported = 0;
            for record in &batch {
                let unit_id =
                    query::get_or_add_measurement_unit(conn, record.measurement_unit.trim())?;
                let new_ingredient = NewIngredient {
                    name: record.name.trim(),
                    measurement_unit_id: unit_id,
                };
                if query::add_ingredient_if_missing(conn, &new_ingredient)? {
                    imported += 1;
                }
            }
            Ok::<_, database::Error>(imported)
        })?;

        self.num_processed += batch.len();
        self.num_imported += imported;
        log::debug!(
            "imported {imported} of {} ingredients in batch",
            batch.len()
        );
        Ok(())
    }
}

pub fn import_ingredients(mut conn: database::Connection, path: impl AsRef<Path>) -> Result<()> {
    let mut importer = IngredientImporter::new(path)?;

    while !importer.done() {
        importer.import_one(&mut conn)?;
        log::info!("imported {:.0}%", importer.percent_done() * 100.0);
    }
    log::info!(
        "{} ingredients imported, {} already present",
        importer.num_imported(),
        importer.num_skipped()
    );

    Ok(())
}

#[cfg(test)]
fn records(json: &str) -> Vec<IngredientRecord> {
    serde_json::from_str(json).unwrap()
}

#[cfg(test)]
fn run_to_completion(conn: &mut database::Connection, importer: &mut IngredientImporter) {
    while !importer.done() {
        importer.import_one(conn).unwrap();
    }
}

#[test]
fn import_is_idempotent() {
    let mut conn = database::establish_test_connection();
    let json = r#"[
        {"name": "абрикосовое варенье", "measurement_unit": "г"},
        {"name": "salt", "measurement_unit": "g"},
        {"name": "salt", "measurement_unit": "pinch"},
        {"name": "salt", "measurement_unit": "g"}
    ]"#;

    let mut importer = IngredientImporter::from_records(records(json));
    run_to_completion(&mut conn, &mut importer);
    assert_eq!(importer.num_imported(), 3);
    assert_eq!(importer.num_skipped(), 1);
    assert_eq!(importer.percent_done(), 1.0);

    let mut again = IngredientImporter::from_records(records(json));
    run_to_completion(&mut conn, &mut again);
    assert_eq!(again.num_imported(), 0);

    assert_eq!(query::all_ingredients(&mut conn).unwrap().len(), 3);
    let units: Vec<String> = query::all_measurement_units(&mut conn)
        .unwrap()
        .into_iter()
        .map(|u| u.name)
        .collect();
    assert_eq!(units, ["g", "pinch", "г"]);
}

#[test]
fn import_runs_in_batches() {
    let mut conn = database::establish_test_connection();
    let all: Vec<IngredientRecord> = (0..BATCH_SIZE + 1)
        .map(|i| IngredientRecord {
            name: format!("spice {i}"),
            measurement_unit: "g".into(),
        })
        .collect();

    let mut importer = IngredientImporter::from_records(all);
    importer.import_one(&mut conn).unwrap();
    assert!(!importer.done());
    assert!(importer.percent_done() < 1.0);
    importer.import_one(&mut conn).unwrap();
    assert!(importer.done());
    assert_eq!(importer.num_imported(), BATCH_SIZE + 1);
}

#[test]
fn invalid_record_fails_the_batch() {
    let mut conn = database::establish_test_connection();
    let json = r#"[
        {"name": "pepper", "measurement_unit": "g"},
        {"name": "", "measurement_unit": "g"}
    ]"#;

    let mut importer = IngredientImporter::from_records(records(json));
    assert!(importer.import_one(&mut conn).is_err());
    assert!(query::all_ingredients(&mut conn).unwrap().is_empty());
}

#[test]
fn malformed_file_is_an_error() {
    let path = std::env::temp_dir().join(format!("foodgram-import-{}.json", std::process::id()));
    std::fs::write(&path, r#"{"name": "not an array"}"#).unwrap();
    assert!(IngredientImporter::new(&path).is_err());
    std::fs::remove_file(&path).unwrap();

    assert!(IngredientImporter::new(path.with_extension("missing")).is_err());
}
