// Copyright 2023 Remi Bernotavicius

use super::{image_uri, new_error_toast};
use crate::admin::{
    Cell, ChangeListQuery, DateFilter, FilterChoice, FilterKind, ListFilter, Model, Row,
};
use crate::database;
use eframe::egui;

const THUMBNAIL_HEIGHT: f32 = 40.0;

pub enum UpdateEvent {
    Closed,
    /// Open the change form of a record, or a blank one.
    Open(Option<i32>),
    /// A record was deleted; other lists may have lost rows with it.
    Deleted,
}

pub struct ChangeListWindow {
    model: Model,
    query: ChangeListQuery,
    search_buf: String,
    filter_choices: Vec<(ListFilter, Vec<String>)>,
    rows: Vec<Row>,
    stale: bool,
}

impl ChangeListWindow {
    pub fn new(model: Model) -> Self {
        Self {
            model,
            query: ChangeListQuery::default(),
            search_buf: String::new(),
            filter_choices: vec![],
            rows: vec![],
            stale: true,
        }
    }

    pub fn refresh(&mut self) {
        self.stale = true;
    }

    /// Loads rows and filter choices, returning what failed to load.
    fn reload(&mut self, conn: &mut database::Connection) -> Vec<String> {
        let admin = self.model.admin();
        let mut errors = vec![];
        match admin.changelist(conn, &self.query) {
            Ok(rows) => self.rows = rows,
            Err(error) => errors.push(format!(
                "Couldn't load {}: {error}",
                admin.verbose_name_plural()
            )),
        }

        self.filter_choices.clear();
        for filter in admin.list_filter() {
            let choices = match filter.kind {
                FilterKind::Value => match admin.filter_choices(conn, filter.field) {
                    Ok(choices) => choices,
                    Err(error) => {
                        errors.push(format!("Couldn't load {} filter: {error}", filter.title));
                        vec![]
                    }
                },
                FilterKind::Date => vec![],
            };
            self.filter_choices.push((*filter, choices));
        }
        self.stale = false;
        errors
    }

    fn update_search(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let r = ui.add(
                egui::TextEdit::singleline(&mut self.search_buf)
                    .hint_text("search")
                    .desired_width(240.0),
            );
            let entered = r.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            if ui.button("Search").clicked() || entered {
                self.query.search = self.search_buf.clone();
                self.stale = true;
            }
        });
    }

    fn update_filters(&mut self, ui: &mut egui::Ui) {
        if self.filter_choices.is_empty() {
            return;
        }
        ui.horizontal_wrapped(|ui| {
            ui.label("Filter:");
            for (filter, choices) in &self.filter_choices {
                ui.label(format!("By {}", filter.title));
                let id_salt = ("change list filter", self.model, filter.field);
                match filter.kind {
                    FilterKind::Value => {
                        let mut selected = match self.query.filters.get(filter.field) {
                            Some(FilterChoice::Value(v)) => Some(v.clone()),
                            _ => None,
                        };
                        let before = selected.clone();
                        egui::ComboBox::from_id_salt(id_salt)
                            .selected_text(selected.as_deref().unwrap_or("All"))
                            .show_ui(ui, |ui| {
                                ui.selectable_value(&mut selected, None, "All");
                                for choice in choices {
                                    ui.selectable_value(
                                        &mut selected,
                                        Some(choice.clone()),
                                        choice.as_str(),
                                    );
                                }
                            });
                        if selected != before {
                            match selected {
                                Some(v) => {
                                    self.query.filters.insert(filter.field, FilterChoice::Value(v))
                                }
                                None => self.query.filters.remove(filter.field),
                            };
                            self.stale = true;
                        }
                    }
                    FilterKind::Date => {
                        let mut selected = match self.query.filters.get(filter.field) {
                            Some(FilterChoice::Date(d)) => *d,
                            _ => DateFilter::AnyDate,
                        };
                        let before = selected;
                        egui::ComboBox::from_id_salt(id_salt)
                            .selected_text(selected.to_string())
                            .show_ui(ui, |ui| {
                                for d in DateFilter::iter() {
                                    ui.selectable_value(&mut selected, d, d.to_string());
                                }
                            });
                        if selected != before {
                            if selected == DateFilter::AnyDate {
                                self.query.filters.remove(filter.field);
                            } else {
                                self.query
                                    .filters
                                    .insert(filter.field, FilterChoice::Date(selected));
                            }
                            self.stale = true;
                        }
                    }
                }
            }
        });
    }

    fn update_table(
        &mut self,
        conn: &mut database::Connection,
        toasts: &mut egui_toast::Toasts,
        ui: &mut egui::Ui,
        events: &mut Vec<UpdateEvent>,
    ) {
        let admin = self.model.admin();
        let has_images = self
            .rows
            .iter()
            .any(|r| r.cells.iter().any(|c| matches!(c, Cell::Image(_))));
        let row_height = if has_images {
            THUMBNAIL_HEIGHT + 4.0
        } else {
            20.0
        };

        let available_height = ui.available_height();
        egui_extras::TableBuilder::new(ui)
            .id_salt(("change list table", self.model))
            .striped(true)
            .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
            .columns(
                egui_extras::Column::auto().resizable(true),
                admin.list_display().len(),
            )
            .column(egui_extras::Column::remainder())
            .min_scrolled_height(0.0)
            .max_scroll_height(available_height)
            .header(20.0, |mut header| {
                for name in admin.list_display() {
                    header.col(|ui| {
                        ui.strong(name.replace('_', " "));
                    });
                }
                header.col(|_| {});
            })
            .body(|mut body| {
                for row in &self.rows {
                    body.row(row_height, |mut table_row| {
                        for cell in &row.cells {
                            table_row.col(|ui| match cell {
                                Cell::Image(path) => {
                                    ui.add(
                                        egui::Image::new(image_uri(path))
                                            .max_height(THUMBNAIL_HEIGHT)
                                            .max_width(THUMBNAIL_HEIGHT * 1.5),
                                    );
                                }
                                Cell::Color(color) => {
                                    let [r, g, b] = color.rgb();
                                    let (rect, _) = ui.allocate_exact_size(
                                        egui::vec2(14.0, 14.0),
                                        egui::Sense::hover(),
                                    );
                                    ui.painter().rect_filled(
                                        rect,
                                        2.0,
                                        egui::Color32::from_rgb(r, g, b),
                                    );
                                    ui.label(color.hex());
                                }
                                cell => {
                                    ui.add(egui::Label::new(cell.to_string()).truncate());
                                }
                            });
                        }
                        table_row.col(|ui| {
                            if ui.button("Change").clicked() {
                                events.push(UpdateEvent::Open(Some(row.id)));
                            }
                            if ui.button("Delete").clicked() {
                                match admin.delete(conn, row.id) {
                                    Ok(()) => {
                                        log::info!("deleted {} {}", admin.verbose_name(), row.id);
                                        events.push(UpdateEvent::Deleted);
                                    }
                                    Err(error) => {
                                        toasts.add(new_error_toast(format!(
                                            "Couldn't delete {}: {error}",
                                            admin.verbose_name()
                                        )));
                                    }
                                }
                            }
                        });
                    });
                }
            });
    }

    pub fn update(
        &mut self,
        ctx: &egui::Context,
        conn: &mut database::Connection,
        toasts: &mut egui_toast::Toasts,
    ) -> Vec<UpdateEvent> {
        if self.stale {
            for error in self.reload(conn) {
                log::error!("{error}");
                toasts.add(new_error_toast(error));
            }
        }

        let admin = self.model.admin();
        let mut open = true;
        let mut events = vec![];
        egui::Window::new(format!("Select {} to change", admin.verbose_name()))
            .id(egui::Id::new(("change list", self.model)))
            .open(&mut open)
            .default_width(800.0)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    if ui.button(format!("Add {}", admin.verbose_name())).clicked() {
                        events.push(UpdateEvent::Open(None));
                    }
                    ui.label(format!(
                        "{} {}",
                        self.rows.len(),
                        admin.verbose_name_plural()
                    ));
                });
                self.update_search(ui);
                self.update_filters(ui);
                ui.separator();
                self.update_table(conn, toasts, ui, &mut events);
            });

        if !open {
            events.push(UpdateEvent::Closed);
        }
        events
    }
}

#[test]
fn reload_reports_filter_errors() {
    use diesel::connection::SimpleConnection as _;

    let mut conn = database::establish_test_connection();
    database::query::fixtures::kitchen(&mut conn);

    let mut list = ChangeListWindow::new(Model::Ingredient);
    assert!(list.reload(&mut conn).is_empty());
    assert_eq!(list.rows.len(), 2);
    assert_eq!(list.filter_choices[0].1, ["beet", "cabbage"]);

    conn.batch_execute(
        "PRAGMA foreign_keys = OFF; DROP TABLE ingredient_amounts; DROP TABLE ingredients;",
    )
    .unwrap();
    list.refresh();
    let errors = list.reload(&mut conn);
    assert_eq!(errors.len(), 2);
    assert!(errors[1].starts_with("Couldn't load name filter"));
    assert!(list.filter_choices[0].1.is_empty());
}
