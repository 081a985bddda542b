// Copyright 2023 Remi Bernotavicius

//! Favorites and shopping carts: both link a user to a recipe.

use super::form::{Field, Form};
use super::recipes::recipe_choices;
use super::users::{user_choices, username, users_by_id};
use super::{ListFilter, ModelAdmin, Row};
use crate::database::models::{NewFavoriteRecipe, NewShoppingCart, RecipeId, UserId};
use crate::database::{self, query, Connection};
use std::collections::HashMap;

fn link_rows(
    conn: &mut Connection,
    links: impl IntoIterator<Item = (i32, UserId, RecipeId)>,
) -> database::Result<Vec<Row>> {
    let users = users_by_id(conn)?;
    let recipes: HashMap<RecipeId, String> = query::all_recipes(conn)?
        .into_iter()
        .map(|r| (r.id, r.name))
        .collect();
    Ok(links
        .into_iter()
        .map(|(id, user_id, recipe_id)| {
            let user = username(&users, user_id);
            let recipe = recipes.get(&recipe_id).map(String::as_str).unwrap_or("");
            Row::new(id)
                .text(id)
                .text(user)
                .text(recipe)
                .lookup("id", [id.to_string()])
                .lookup("user", [user])
                .lookup("recipe", [recipe])
        })
        .collect())
}

fn link_form(
    conn: &mut Connection,
    link: Option<(UserId, RecipeId)>,
) -> database::Result<Form> {
    Ok(Form::new(vec![
        vec![Field::select(
            "user",
            "User",
            user_choices(conn)?,
            link.map(|(u, _)| u.into()),
        )],
        vec![Field::select(
            "recipe",
            "Recipe",
            recipe_choices(conn)?,
            link.map(|(_, r)| r.into()),
        )],
    ]))
}

fn link_from_form(form: &Form) -> database::Result<(UserId, RecipeId)> {
    Ok((
        form.required_choice("user")?.into(),
        form.required_choice("recipe")?.into(),
    ))
}

pub struct FavoriteRecipeAdmin;

impl ModelAdmin for FavoriteRecipeAdmin {
    fn verbose_name(&self) -> &'static str {
        "favorite recipe"
    }

    fn verbose_name_plural(&self) -> &'static str {
        "favorite recipes"
    }

    fn list_display(&self) -> &'static [&'static str] {
        &["id", "user", "recipe"]
    }

    fn search_fields(&self) -> &'static [&'static str] {
        &["recipe"]
    }

    fn list_filter(&self) -> &'static [ListFilter] {
        const FILTERS: &[ListFilter] = &[
            ListFilter::value("id", "id"),
            ListFilter::value("user", "user"),
            ListFilter::value("recipe", "recipe"),
        ];
        FILTERS
    }

    fn rows(&self, conn: &mut Connection) -> database::Result<Vec<Row>> {
        let favorites = query::all_favorites(conn)?;
        link_rows(
            conn,
            favorites
                .into_iter()
                .map(|f| (f.id.into(), f.user_id, f.recipe_id)),
        )
    }

    fn form(&self, conn: &mut Connection, id: Option<i32>) -> database::Result<Form> {
        let link = id
            .map(|id| query::get_favorite(conn, id.into()))
            .transpose()?
            .map(|f| (f.user_id, f.recipe_id));
        link_form(conn, link)
    }

    fn save(&self, conn: &mut Connection, id: Option<i32>, form: &Form) -> database::Result<i32> {
        let (user_id, recipe_id) = link_from_form(form)?;
        match id {
            Some(id) => {
                let changes = NewFavoriteRecipe { user_id, recipe_id };
                query::update_favorite(conn, id.into(), &changes)?;
                Ok(id)
            }
            None => Ok(query::add_favorite(conn, user_id, recipe_id)?.into()),
        }
    }

    fn delete(&self, conn: &mut Connection, id: i32) -> database::Result<()> {
        query::delete_favorite(conn, id.into())
    }
}

pub struct ShoppingCartAdmin;

impl ModelAdmin for ShoppingCartAdmin {
    fn verbose_name(&self) -> &'static str {
        "shopping cart"
    }

    fn verbose_name_plural(&self) -> &'static str {
        "shopping carts"
    }

    fn list_display(&self) -> &'static [&'static str] {
        &["id", "user", "recipe"]
    }

    fn search_fields(&self) -> &'static [&'static str] {
        &["user", "recipe"]
    }

    fn list_filter(&self) -> &'static [ListFilter] {
        const FILTERS: &[ListFilter] = &[
            ListFilter::value("user", "user"),
            ListFilter::value("recipe", "recipe"),
        ];
        FILTERS
    }

    fn rows(&self, conn: &mut Connection) -> database::Result<Vec<Row>> {
        let entries = query::all_cart_entries(conn)?;
        link_rows(
            conn,
            entries
                .into_iter()
                .map(|c| (c.id.into(), c.user_id, c.recipe_id)),
        )
    }

    fn form(&self, conn: &mut Connection, id: Option<i32>) -> database::Result<Form> {
        let link = id
            .map(|id| query::get_cart_entry(conn, id.into()))
            .transpose()?
            .map(|c| (c.user_id, c.recipe_id));
        link_form(conn, link)
    }

    fn save(&self, conn: &mut Connection, id: Option<i32>, form: &Form) -> database::Result<i32> {
        let (user_id, recipe_id) = link_from_form(form)?;
        match id {
            Some(id) => {
                let changes = NewShoppingCart { user_id, recipe_id };
                query::update_cart_entry(conn, id.into(), &changes)?;
                Ok(id)
            }
            None => Ok(query::add_to_cart(conn, user_id, recipe_id)?.into()),
        }
    }

    fn delete(&self, conn: &mut Connection, id: i32) -> database::Result<()> {
        query::delete_cart_entry(conn, id.into())
    }
}

#[cfg(test)]
use super::form::Value;
#[cfg(test)]
use super::{ChangeListQuery, FilterChoice};
#[cfg(test)]
use crate::database::establish_test_connection;
#[cfg(test)]
use crate::database::query::fixtures;

#[test]
fn favorite_rows_search_by_recipe() {
    let mut conn = establish_test_connection();
    let k = fixtures::kitchen(&mut conn);
    query::add_favorite(&mut conn, k.reader, k.borscht).unwrap();

    let rows = FavoriteRecipeAdmin.rows(&mut conn).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].cells[1].to_string(), "reader");
    assert_eq!(rows[0].cells[2].to_string(), "Borscht");

    // Only the recipe is searched.
    let query = ChangeListQuery::default().search("reader");
    assert!(FavoriteRecipeAdmin
        .changelist(&mut conn, &query)
        .unwrap()
        .is_empty());
}

#[test]
fn cart_filter_by_user_and_duplicate_entry() {
    let mut conn = establish_test_connection();
    let k = fixtures::kitchen(&mut conn);
    query::add_to_cart(&mut conn, k.reader, k.borscht).unwrap();
    query::add_to_cart(&mut conn, k.author, k.borscht).unwrap();

    let query = ChangeListQuery::default().filter("user", FilterChoice::Value("author".into()));
    let rows = ShoppingCartAdmin.changelist(&mut conn, &query).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].cells[1].to_string(), "author");

    let mut form = ShoppingCartAdmin.form(&mut conn, None).unwrap();
    form.field_mut("user").unwrap().value = Value::Choice(Some(k.reader.into()));
    form.field_mut("recipe").unwrap().value = Value::Choice(Some(k.borscht.into()));
    let error = ShoppingCartAdmin.save(&mut conn, None, &form).unwrap_err();
    assert_eq!(
        error.integrity_kind(),
        Some(database::IntegrityKind::Unique)
    );
}
