// Copyright 2023 Remi Bernotavicius

use super::new_error_toast;
use crate::database::models::{RecipeHandle, RecipeId, User};
use crate::database::{self, query};
use crate::shopping_list;
use eframe::egui;

pub enum UpdateEvent {
    Closed,
    /// The user's cart or favorites changed.
    Changed,
}

enum Action {
    RemoveFromCart(RecipeId),
    AddToCart(RecipeId),
    Unfavorite(RecipeId),
}

/// Picks a user, manages their cart and writes out the ingredients in it.
pub struct ShoppingListWindow {
    users: Vec<User>,
    selected: Option<usize>,
    cart: Vec<RecipeHandle>,
    favorites: Vec<RecipeHandle>,
    last_written: Option<String>,
}

impl ShoppingListWindow {
    pub fn new(conn: &mut database::Connection) -> database::Result<Self> {
        Ok(Self {
            users: query::all_users(conn)?,
            selected: None,
            cart: vec![],
            favorites: vec![],
            last_written: None,
        })
    }

    fn user(&self) -> Option<&User> {
        self.selected.and_then(|i| self.users.get(i))
    }

    fn load_recipes(&mut self, conn: &mut database::Connection) -> database::Result<()> {
        let Some(user) = self.user().map(|u| u.id) else {
            self.cart.clear();
            self.favorites.clear();
            return Ok(());
        };
        self.cart = query::cart_recipes(conn, user)?;
        self.favorites = query::favorite_recipes(conn, user)?;
        Ok(())
    }

    fn perform(&mut self, conn: &mut database::Connection, action: Action) -> database::Result<()> {
        let Some(user) = self.user().map(|u| u.id) else {
            return Ok(());
        };
        match action {
            Action::RemoveFromCart(recipe) => {
                query::remove_from_cart(conn, user, recipe)?;
            }
            Action::AddToCart(recipe) => {
                query::add_to_cart(conn, user, recipe)?;
            }
            Action::Unfavorite(recipe) => {
                query::remove_favorite(conn, user, recipe)?;
            }
        }
        self.load_recipes(conn)
    }

    fn update_recipes(&self, ui: &mut egui::Ui) -> Option<Action> {
        let mut action = None;
        ui.strong("Shopping cart");
        if self.cart.is_empty() {
            ui.label("The shopping cart is empty.");
        }
        egui::Grid::new("shopping cart recipes").show(ui, |ui| {
            for recipe in &self.cart {
                ui.label(&recipe.name);
                if ui.small_button("Remove").clicked() {
                    action = Some(Action::RemoveFromCart(recipe.id));
                }
                ui.end_row();
            }
        });

        ui.separator();
        ui.strong("Favorites");
        egui::Grid::new("favorite recipes").show(ui, |ui| {
            for recipe in &self.favorites {
                ui.label(&recipe.name);
                let in_cart = self.cart.iter().any(|r| r.id == recipe.id);
                if ui
                    .add_enabled(!in_cart, egui::Button::new("Add to cart").small())
                    .clicked()
                {
                    action = Some(Action::AddToCart(recipe.id));
                }
                if ui.small_button("Unfavorite").clicked() {
                    action = Some(Action::Unfavorite(recipe.id));
                }
                ui.end_row();
            }
        });
        action
    }

    pub fn update(
        &mut self,
        ctx: &egui::Context,
        conn: &mut database::Connection,
        toasts: &mut egui_toast::Toasts,
    ) -> Vec<UpdateEvent> {
        let mut open = true;
        let mut events = vec![];
        let mut reselected = false;
        let mut action = None;
        let mut generate = false;
        egui::Window::new("Shopping list")
            .open(&mut open)
            .show(ctx, |ui| {
                let selected_text = self
                    .user()
                    .map(|u| u.username.clone())
                    .unwrap_or_else(|| "choose a user".into());
                let before = self.selected;
                egui::ComboBox::from_id_salt("shopping list user")
                    .selected_text(selected_text)
                    .show_ui(ui, |ui| {
                        for (i, user) in self.users.iter().enumerate() {
                            ui.selectable_value(&mut self.selected, Some(i), user.to_string());
                        }
                    });
                reselected = before != self.selected;

                if self.user().is_some() {
                    action = self.update_recipes(ui);
                    ui.separator();
                }
                generate = ui
                    .add_enabled(self.user().is_some(), egui::Button::new("Generate"))
                    .clicked();
                if let Some(path) = &self.last_written {
                    ui.label(format!("written to {path}"));
                }
            });

        if reselected {
            if let Err(error) = self.load_recipes(conn) {
                toasts.add(new_error_toast(format!("Couldn't load recipes: {error}")));
            }
        }
        if let Some(action) = action {
            match self.perform(conn, action) {
                Ok(()) => events.push(UpdateEvent::Changed),
                Err(error) => {
                    toasts.add(new_error_toast(error.to_string()));
                }
            }
        }
        if generate {
            if let Some(user) = self.user() {
                match shopping_list::generate_and_open(conn, user) {
                    Ok(path) => self.last_written = Some(path.display().to_string()),
                    Err(error) => {
                        log::error!("shopping list for {}: {error}", user.username);
                        toasts.add(new_error_toast(format!(
                            "Couldn't generate shopping list: {error}"
                        )));
                    }
                }
            }
        }
        if !open {
            events.push(UpdateEvent::Closed);
        }
        events
    }
}

#[test]
fn cart_and_favorites_actions() {
    let mut conn = database::establish_test_connection();
    let k = query::fixtures::kitchen(&mut conn);
    query::add_favorite(&mut conn, k.reader, k.borscht).unwrap();

    let mut window = ShoppingListWindow::new(&mut conn).unwrap();
    window.selected = window.users.iter().position(|u| u.id == k.reader);
    window.load_recipes(&mut conn).unwrap();
    assert!(window.cart.is_empty());
    assert_eq!(window.favorites.len(), 1);

    window.perform(&mut conn, Action::AddToCart(k.borscht)).unwrap();
    assert_eq!(window.cart, window.favorites);

    window
        .perform(&mut conn, Action::RemoveFromCart(k.borscht))
        .unwrap();
    window.perform(&mut conn, Action::Unfavorite(k.borscht)).unwrap();
    assert!(window.cart.is_empty());
    assert!(window.favorites.is_empty());
}
