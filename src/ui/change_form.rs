// Copyright 2023 Remi Bernotavicius

use super::search::{self, CachedQuery, SearchWidget};
use super::{image_uri, new_error_toast};
use crate::admin::form::{AmountRow, Choice, Field, Value, Widget};
use crate::admin::{Form, Model};
use crate::database::{self, models::IngredientId, validate};
use eframe::egui;

const EMPTY_CHOICE: &str = "---------";

pub enum UpdateEvent {
    Closed,
    Saved,
}

#[derive(Copy, Clone)]
enum Action {
    Save,
    SaveAndContinue,
    Delete,
}

pub struct ChangeFormWindow {
    model: Model,
    id: Option<i32>,
    form: Form,
    ingredient_searches: Vec<Option<CachedQuery<IngredientId>>>,
    error: Option<String>,
}

impl ChangeFormWindow {
    pub fn new(
        conn: &mut database::Connection,
        model: Model,
        id: Option<i32>,
    ) -> database::Result<Self> {
        Ok(Self {
            model,
            id,
            form: model.admin().form(conn, id)?,
            ingredient_searches: vec![],
            error: None,
        })
    }

    fn update_buttons(&self, ui: &mut egui::Ui) -> Option<Action> {
        let mut action = None;
        ui.horizontal(|ui| {
            if ui.button("Save").clicked() {
                action = Some(Action::Save);
            }
            if ui.button("Save and continue editing").clicked() {
                action = Some(Action::SaveAndContinue);
            }
            if self.id.is_some() && ui.button("Delete").clicked() {
                action = Some(Action::Delete);
            }
        });
        action
    }

    fn perform(
        &mut self,
        action: Action,
        conn: &mut database::Connection,
        toasts: &mut egui_toast::Toasts,
        events: &mut Vec<UpdateEvent>,
    ) {
        let admin = self.model.admin();
        let result = match action {
            Action::Delete => self
                .id
                .map(|id| admin.delete(conn, id))
                .transpose()
                .map(|_| None),
            Action::Save | Action::SaveAndContinue => {
                admin.save(conn, self.id, &self.form).map(Some)
            }
        };

        match result {
            Ok(saved_id) => {
                self.error = None;
                events.push(UpdateEvent::Saved);
                match (action, saved_id) {
                    (Action::SaveAndContinue, Some(id)) => {
                        self.id = Some(id);
                        match admin.form(conn, Some(id)) {
                            Ok(form) => {
                                self.form = form;
                                self.ingredient_searches.clear();
                            }
                            Err(error) => {
                                toasts.add(new_error_toast(error.to_string()));
                            }
                        }
                    }
                    _ => events.push(UpdateEvent::Closed),
                }
            }
            Err(error) => {
                let message = error.to_string();
                toasts.add(new_error_toast(format!(
                    "Couldn't save {}",
                    admin.verbose_name()
                )));
                self.error = Some(message);
            }
        }
    }

    pub fn update(
        &mut self,
        ctx: &egui::Context,
        conn: &mut database::Connection,
        toasts: &mut egui_toast::Toasts,
    ) -> Vec<UpdateEvent> {
        let admin = self.model.admin();
        let title = match self.id {
            Some(id) => format!("Change {} {id}", admin.verbose_name()),
            None => format!("Add {}", admin.verbose_name()),
        };

        let mut open = true;
        let mut events = vec![];
        let mut action = None;
        egui::Window::new(title)
            .id(egui::Id::new(("change form", self.model, self.id)))
            .open(&mut open)
            .show(ctx, |ui| {
                if admin.save_on_top() {
                    action = action.or(self.update_buttons(ui));
                    ui.separator();
                }
                if let Some(error) = &self.error {
                    ui.colored_label(ui.visuals().error_fg_color, error.as_str());
                }
                egui::ScrollArea::vertical()
                    .max_height(ui.available_height() - 40.0)
                    .show(ui, |ui| {
                        for row in &mut self.form.rows {
                            ui.horizontal_top(|ui| {
                                for field in row {
                                    ui.vertical(|ui| {
                                        ui.strong(field.label);
                                        field_ui(
                                            ui,
                                            conn,
                                            (self.model, self.id),
                                            &mut self.ingredient_searches,
                                            field,
                                        );
                                    });
                                }
                            });
                            ui.add_space(6.0);
                        }
                    });
                ui.separator();
                action = action.or(self.update_buttons(ui));
            });

        if let Some(action) = action {
            self.perform(action, conn, toasts, &mut events);
        }
        if !open {
            events.push(UpdateEvent::Closed);
        }
        events
    }
}

fn choice_label(choices: &[Choice], selected: Option<i32>) -> String {
    selected
        .and_then(|id| choices.iter().find(|c| c.id == id))
        .map(|c| c.label.clone())
        .unwrap_or_else(|| EMPTY_CHOICE.into())
}

fn field_ui(
    ui: &mut egui::Ui,
    conn: &mut database::Connection,
    form_key: (Model, Option<i32>),
    ingredient_searches: &mut Vec<Option<CachedQuery<IngredientId>>>,
    field: &mut Field,
) {
    let Field {
        name,
        widget,
        value,
        ..
    } = field;
    match (widget, value) {
        (Widget::Text, Value::Text(text)) => {
            ui.add(egui::TextEdit::singleline(text).desired_width(240.0));
        }
        (Widget::TextArea, Value::Text(text)) => {
            ui.add(
                egui::TextEdit::multiline(text)
                    .desired_rows(6)
                    .desired_width(480.0),
            );
        }
        (Widget::Image, Value::Text(path)) => {
            ui.horizontal(|ui| {
                ui.add(egui::TextEdit::singleline(path).desired_width(320.0));
                if ui.button("Choose file").clicked() {
                    if let Some(file) = rfd::FileDialog::new()
                        .add_filter("image", &["png", "jpg", "jpeg", "gif", "webp"])
                        .pick_file()
                    {
                        *path = file.display().to_string();
                    }
                }
            });
            if !path.trim().is_empty() {
                ui.add(egui::Image::new(image_uri(path)).max_height(120.0));
            }
        }
        (Widget::Number, Value::Number(n)) => {
            ui.add(egui::DragValue::new(n));
        }
        (Widget::Select(choices) | Widget::OptionalSelect(choices), Value::Choice(selected)) => {
            egui::ComboBox::from_id_salt(("form select", form_key, *name))
                .selected_text(choice_label(choices, *selected))
                .width(240.0)
                .show_ui(ui, |ui| {
                    ui.selectable_value(selected, None, EMPTY_CHOICE);
                    for choice in choices.iter() {
                        ui.selectable_value(selected, Some(choice.id), &choice.label);
                    }
                });
        }
        (Widget::FilterVertical(choices), Value::Choices(selected)) => {
            egui::ScrollArea::vertical()
                .id_salt(("form filter vertical", form_key, *name))
                .max_height(120.0)
                .show(ui, |ui| {
                    for choice in choices.iter() {
                        let mut checked = selected.contains(&choice.id);
                        if ui.checkbox(&mut checked, &choice.label).changed() {
                            if checked {
                                selected.insert(choice.id);
                            } else {
                                selected.remove(&choice.id);
                            }
                        }
                    }
                });
        }
        (Widget::IngredientAmounts { .. }, Value::Amounts(rows)) => {
            amounts_ui(ui, conn, form_key, ingredient_searches, rows);
        }
        (widget, value) => {
            log::error!("field {name:?} has widget {widget:?} but value {value:?}");
        }
    }
}

fn amounts_ui(
    ui: &mut egui::Ui,
    conn: &mut database::Connection,
    form_key: (Model, Option<i32>),
    ingredient_searches: &mut Vec<Option<CachedQuery<IngredientId>>>,
    rows: &mut Vec<AmountRow>,
) {
    ingredient_searches.resize_with(rows.len(), || None);

    let mut remove = None;
    egui::Grid::new(("inline amounts", form_key))
        .striped(true)
        .show(ui, |ui| {
            ui.label("Ingredient");
            ui.label("Amount");
            ui.label("");
            ui.end_row();

            for (i, (row, cached)) in rows
                .iter_mut()
                .zip(ingredient_searches.iter_mut())
                .enumerate()
            {
                ui.add(
                    SearchWidget::new(
                        ("inline ingredient", form_key, i),
                        &mut row.name,
                        &mut row.ingredient,
                        |query| search::search_ingredients(conn, cached, query),
                    )
                    .hint_text("search for ingredient")
                    .desired_width(240.0),
                );
                ui.add(
                    egui::DragValue::new(&mut row.amount)
                        .range(validate::MIN_AMOUNT..=validate::MAX_AMOUNT),
                );
                if ui.button("Remove").clicked() {
                    remove = Some(i);
                }
                ui.end_row();
            }
        });

    if let Some(i) = remove {
        rows.remove(i);
        ingredient_searches.remove(i);
    }
    if ui.button("Add another ingredient").clicked() {
        rows.push(AmountRow::blank());
        ingredient_searches.push(None);
    }
}
