// Copyright 2023 Remi Bernotavicius

use crate::admin::{self, App, Model};
use crate::database;
use eframe::egui;
use std::collections::HashMap;
use std::mem;
use std::path::Path;

mod change_form;
mod change_list;
mod import;
mod search;
mod shopping_list;

use change_form::ChangeFormWindow;
use change_list::ChangeListWindow;
use import::ImportWindow;
use shopping_list::ShoppingListWindow;

pub fn new_error_toast(text: impl Into<egui::WidgetText>) -> egui_toast::Toast {
    egui_toast::Toast {
        text: text.into(),
        kind: egui_toast::ToastKind::Error,
        options: egui_toast::ToastOptions::default()
            .duration_in_seconds(3.0)
            .show_progress(false)
            .show_icon(true),
        ..Default::default()
    }
}

/// Relative image paths are stored relative to the media directory.
pub fn image_uri(path: &str) -> String {
    let path = Path::new(path);
    if path.is_absolute() {
        return format!("file://{}", path.display());
    }
    match crate::data_path() {
        Ok(data) => format!("file://{}", data.join("media").join(path).display()),
        Err(error) => {
            log::warn!("no data directory for {}: {error}", path.display());
            format!("file://{}", path.display())
        }
    }
}

pub struct FoodgramAdmin {
    conn: database::Connection,
    toasts: egui_toast::Toasts,
    change_lists: HashMap<Model, ChangeListWindow>,
    change_forms: HashMap<(Model, Option<i32>), ChangeFormWindow>,
    import_window: Option<ImportWindow>,
    shopping_list_window: Option<ShoppingListWindow>,
}

impl FoodgramAdmin {
    pub fn new(conn: database::Connection) -> Self {
        Self {
            conn,
            toasts: egui_toast::Toasts::new()
                .anchor(egui::Align2::RIGHT_BOTTOM, (-10.0, -10.0))
                .direction(egui::Direction::BottomUp),
            change_lists: Default::default(),
            change_forms: Default::default(),
            import_window: None,
            shopping_list_window: None,
        }
    }

    fn refresh_change_lists(&mut self) {
        for list in self.change_lists.values_mut() {
            list.refresh();
        }
    }

    fn open_change_form(&mut self, model: Model, id: Option<i32>) {
        if self.change_forms.contains_key(&(model, id)) {
            return;
        }
        match ChangeFormWindow::new(&mut self.conn, model, id) {
            Ok(form) => {
                self.change_forms.insert((model, id), form);
            }
            Err(error) => {
                self.toasts.add(new_error_toast(format!(
                    "Couldn't open {}: {error}",
                    model.admin().verbose_name()
                )));
            }
        }
    }

    fn update_menu(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("menu").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Import ingredients").clicked() && self.import_window.is_none() {
                        self.import_window = Some(ImportWindow::default());
                        ui.close_menu();
                    }
                    if ui.button("Shopping list").clicked() && self.shopping_list_window.is_none()
                    {
                        match ShoppingListWindow::new(&mut self.conn) {
                            Ok(window) => self.shopping_list_window = Some(window),
                            Err(error) => {
                                self.toasts.add(new_error_toast(error.to_string()));
                            }
                        }
                        ui.close_menu();
                    }
                });
            });
        });
    }

    fn update_index(&mut self, ctx: &egui::Context) {
        egui::SidePanel::left("index").show(ctx, |ui| {
            ui.heading(admin::SITE_HEADER);
            ui.separator();
            for app in <App as strum::IntoEnumIterator>::iter() {
                ui.strong(app.to_string());
                for model in Model::iter().filter(|m| m.app() == app) {
                    let mut shown = self.change_lists.contains_key(&model);
                    ui.horizontal(|ui| {
                        ui.toggle_value(&mut shown, model.admin().verbose_name_plural());
                        if ui.small_button("Add").clicked() {
                            self.open_change_form(model, None);
                        }
                    });
                    if shown && !self.change_lists.contains_key(&model) {
                        self.change_lists.insert(model, ChangeListWindow::new(model));
                    } else if !shown {
                        self.change_lists.remove(&model);
                    }
                }
                ui.add_space(8.0);
            }
        });
    }

    fn update_change_lists(&mut self, ctx: &egui::Context) {
        let mut refresh = false;
        for (model, mut list) in mem::take(&mut self.change_lists) {
            let mut closed = false;
            for event in list.update(ctx, &mut self.conn, &mut self.toasts) {
                match event {
                    change_list::UpdateEvent::Closed => closed = true,
                    change_list::UpdateEvent::Open(id) => self.open_change_form(model, id),
                    change_list::UpdateEvent::Deleted => refresh = true,
                }
            }
            if !closed {
                self.change_lists.insert(model, list);
            }
        }
        if refresh {
            self.refresh_change_lists();
        }
    }

    fn update_change_forms(&mut self, ctx: &egui::Context) {
        let mut refresh = false;
        for (key, mut form) in mem::take(&mut self.change_forms) {
            let mut closed = false;
            for event in form.update(ctx, &mut self.conn, &mut self.toasts) {
                match event {
                    change_form::UpdateEvent::Closed => closed = true,
                    change_form::UpdateEvent::Saved => refresh = true,
                }
            }
            if !closed {
                self.change_forms.insert(key, form);
            }
        }
        if refresh {
            self.refresh_change_lists();
        }
    }

    fn update_import_window(&mut self, ctx: &egui::Context) {
        let Some(window) = &mut self.import_window else {
            return;
        };
        let mut refresh = false;
        for event in window.update(&mut self.conn, ctx) {
            match event {
                import::UpdateEvent::Closed => self.import_window = None,
                import::UpdateEvent::Imported => refresh = true,
            }
        }
        if refresh {
            self.refresh_change_lists();
        }
    }

    fn update_shopping_list_window(&mut self, ctx: &egui::Context) {
        let Some(window) = &mut self.shopping_list_window else {
            return;
        };
        let mut refresh = false;
        for event in window.update(ctx, &mut self.conn, &mut self.toasts) {
            match event {
                shopping_list::UpdateEvent::Closed => self.shopping_list_window = None,
                shopping_list::UpdateEvent::Changed => refresh = true,
            }
        }
        if refresh {
            self.refresh_change_lists();
        }
    }
}

impl eframe::App for FoodgramAdmin {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.update_menu(ctx);
        self.update_index(ctx);
        self.update_change_lists(ctx);
        self.update_change_forms(ctx);
        self.update_import_window(ctx);
        self.update_shopping_list_window(ctx);
        self.toasts.show(ctx);
    }
}

#[test]
fn relative_images_resolve_under_media() {
    assert_eq!(image_uri("/tmp/dish.png"), "file:///tmp/dish.png");
    let uri = image_uri("recipes/images/dish.png");
    assert!(uri.starts_with("file://"));
    assert!(uri.ends_with("recipes/images/dish.png"));
}
