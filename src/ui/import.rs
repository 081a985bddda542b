// Copyright 2023 Remi Bernotavicius

use crate::database;
use crate::import::{self, Importer as _};
use eframe::egui;

#[derive(Default)]
pub enum ImportWindow {
    #[default]
    Ready,
    Importing {
        importer: import::IngredientImporter,
    },
    Failed {
        error: crate::Error,
    },
    Success {
        num_imported: usize,
        num_skipped: usize,
    },
}

pub enum UpdateEvent {
    Closed,
    Imported,
}

impl ImportWindow {
    pub fn update(
        &mut self,
        conn: &mut database::Connection,
        ctx: &egui::Context,
    ) -> Vec<UpdateEvent> {
        let mut open = true;
        let mut events = vec![];
        egui::Window::new("Import ingredients")
            .open(&mut open)
            .show(ctx, |ui| {
                let next = match self {
                    Self::Ready => Self::update_ready(ui),
                    Self::Importing { importer } => {
                        ctx.request_repaint_after(std::time::Duration::from_millis(0));
                        Self::update_importing(conn, importer, ui)
                    }
                    Self::Failed { error } => Self::update_failed(error, ui),
                    Self::Success {
                        num_imported,
                        num_skipped,
                    } => Self::update_success(*num_imported, *num_skipped, ui),
                };
                if let Some(next) = next {
                    if matches!(next, Self::Success { .. } | Self::Failed { .. }) {
                        events.push(UpdateEvent::Imported);
                    }
                    *self = next;
                }
            });
        if !open {
            events.push(UpdateEvent::Closed);
        }
        events
    }

    fn update_ready(ui: &mut egui::Ui) -> Option<Self> {
        ui.label("A JSON list of objects with \"name\" and \"measurement_unit\".");
        if ui.button("Choose file").clicked() {
            if let Some(file) = rfd::FileDialog::new()
                .add_filter("json", &["json"])
                .pick_file()
            {
                log::info!("importing ingredients from {}", file.display());
                return Some(match import::IngredientImporter::new(file) {
                    Ok(importer) => Self::Importing { importer },
                    Err(error) => Self::Failed { error },
                });
            }
        }
        None
    }

    fn update_importing(
        conn: &mut database::Connection,
        importer: &mut import::IngredientImporter,
        ui: &mut egui::Ui,
    ) -> Option<Self> {
        ui.label("importing ingredients..");
        ui.add(egui::widgets::ProgressBar::new(importer.percent_done()));

        if !importer.done() {
            if let Err(error) = importer.import_one(conn) {
                log::error!("ingredient import failed: {error}");
                return Some(Self::Failed { error });
            }
        } else {
            return Some(Self::Success {
                num_imported: importer.num_imported(),
                num_skipped: importer.num_skipped(),
            });
        }

        None
    }

    fn update_failed(error: &crate::Error, ui: &mut egui::Ui) -> Option<Self> {
        ui.label(format!("import failed with error: {error}"));
        ui.button("okay").clicked().then_some(Self::Ready)
    }

    fn update_success(num_imported: usize, num_skipped: usize, ui: &mut egui::Ui) -> Option<Self> {
        ui.label(format!(
            "import succeeded. {num_imported} ingredients imported, {num_skipped} already present."
        ));
        ui.button("okay").clicked().then_some(Self::Ready)
    }
}
