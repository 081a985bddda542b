// Copyright 2023 Remi Bernotavicius

use super::form::{AmountRow, Choice, Field, Form};
use super::users::{user_choices, username, users_by_id};
use super::{ListFilter, ModelAdmin, Row};
use crate::database::models::{
    IngredientHandle, IngredientId, NewIngredientAmount, NewRecipe, RecipeId, TagId,
};
use crate::database::{self, query, validate, Connection};
use std::collections::HashMap;

/// Filled-in ingredient rows a recipe must have.
pub const INLINE_MIN_NUM: usize = 1;

/// Blank ingredient rows offered on top of the stored ones.
pub const INLINE_EXTRA: usize = 2;

pub(crate) fn recipe_choices(conn: &mut Connection) -> database::Result<Vec<Choice>> {
    Ok(query::all_recipes(conn)?
        .into_iter()
        .map(|r| Choice::new(r.id, r.name))
        .collect())
}

fn ingredient_choices(conn: &mut Connection) -> database::Result<Vec<Choice>> {
    Ok(query::all_ingredients(conn)?
        .into_iter()
        .map(|i| Choice::new(i.id, &i))
        .collect())
}

pub struct RecipeAdmin;

impl ModelAdmin for RecipeAdmin {
    fn verbose_name(&self) -> &'static str {
        "recipe"
    }

    fn verbose_name_plural(&self) -> &'static str {
        "recipes"
    }

    fn list_display(&self) -> &'static [&'static str] {
        &[
            "id",
            "name",
            "author",
            "text",
            "image",
            "pub_date",
            "favorite_count",
        ]
    }

    fn search_fields(&self) -> &'static [&'static str] {
        &["name", "author__username", "tags__name"]
    }

    fn list_filter(&self) -> &'static [ListFilter] {
        const FILTERS: &[ListFilter] = &[
            ListFilter::value("name", "name"),
            ListFilter::value("author__username", "author"),
            ListFilter::value("tags__name", "tags"),
            ListFilter::date("pub_date", "publication date"),
        ];
        FILTERS
    }

    fn save_on_top(&self) -> bool {
        true
    }

    fn rows(&self, conn: &mut Connection) -> database::Result<Vec<Row>> {
        let users = users_by_id(conn)?;
        let favorite_counts = query::favorite_counts(conn)?;
        let mut tags: HashMap<RecipeId, Vec<String>> = HashMap::new();
        for (recipe, tag) in query::all_recipe_tag_names(conn)? {
            tags.entry(recipe).or_default().push(tag);
        }

        Ok(query::recipes_by_date(conn)?
            .into_iter()
            .map(|r| {
                let author = username(&users, r.author_id);
                let favorites = favorite_counts.get(&r.id).copied().unwrap_or(0);
                Row::new(r.id)
                    .text(r.id)
                    .text(&r.name)
                    .text(author)
                    .text(&r.text)
                    .image(&r.image)
                    .text(r.pub_date.format("%Y-%m-%d %H:%M"))
                    .text(favorites)
                    .lookup("name", [r.name])
                    .lookup("author__username", [author])
                    .lookup("tags__name", tags.remove(&r.id).unwrap_or_default())
                    .date("pub_date", r.pub_date)
            })
            .collect())
    }

    fn form(&self, conn: &mut Connection, id: Option<i32>) -> database::Result<Form> {
        let authors = user_choices(conn)?;
        let tag_choices = query::all_tags(conn)?
            .into_iter()
            .map(|t| Choice::new(t.id, t.name))
            .collect();

        let mut amounts: Vec<AmountRow> = vec![];
        let (recipe, selected_tags) = match id {
            Some(id) => {
                let recipe = query::get_recipe(conn, id.into())?;
                let selected_tags: Vec<i32> = query::recipe_tags(conn, recipe.id)?
                    .into_iter()
                    .map(|t| t.id.into())
                    .collect();
                for (amount, ingredient) in query::recipe_ingredients(conn, recipe.id)? {
                    amounts.push(AmountRow {
                        ingredient: Some(ingredient.id),
                        name: ingredient.to_string(),
                        amount: amount.amount,
                    });
                }
                (Some(recipe), selected_tags)
            }
            None => {
                amounts.extend((0..INLINE_MIN_NUM).map(|_| AmountRow::blank()));
                (None, vec![])
            }
        };
        amounts.extend((0..INLINE_EXTRA).map(|_| AmountRow::blank()));

        let text = |f: fn(&database::models::Recipe) -> &str| {
            recipe.as_ref().map(f).unwrap_or("").to_owned()
        };
        Ok(Form::new(vec![
            vec![
                Field::text("name", "Name", text(|r| &r.name)),
                Field::number(
                    "cooking_time",
                    "Cooking time (minutes)",
                    recipe
                        .as_ref()
                        .map(|r| r.cooking_time)
                        .unwrap_or(validate::MIN_COOKING_TIME),
                ),
            ],
            vec![
                Field::select(
                    "author",
                    "Author",
                    authors,
                    recipe.as_ref().map(|r| r.author_id.into()),
                ),
                Field::filter_vertical("tags", "Tags", tag_choices, selected_tags),
            ],
            vec![Field::text_area("text", "Description", text(|r| &r.text))],
            vec![Field::image("image", "Image", text(|r| &r.image))],
            vec![Field::amounts(
                "ingredients",
                "Ingredients",
                INLINE_MIN_NUM,
                amounts,
            )],
        ]))
    }

    fn save(&self, conn: &mut Connection, id: Option<i32>, form: &Form) -> database::Result<i32> {
        let recipe = NewRecipe {
            author_id: form.required_choice("author")?.into(),
            name: form.text("name").trim(),
            image: form.text("image").trim(),
            text: form.text("text"),
            cooking_time: form.number("cooking_time"),
        };
        let tags: Vec<TagId> = form.choices("tags").into_iter().map(Into::into).collect();
        let amounts = form.amounts("ingredients", INLINE_MIN_NUM)?;
        match id {
            Some(id) => {
                query::update_recipe(conn, id.into(), &recipe, &tags, &amounts)?;
                Ok(id)
            }
            None => Ok(query::add_recipe(conn, &recipe, &tags, &amounts)?.into()),
        }
    }

    fn delete(&self, conn: &mut Connection, id: i32) -> database::Result<()> {
        query::delete_recipe(conn, id.into())
    }
}

pub struct IngredientAmountAdmin;

impl ModelAdmin for IngredientAmountAdmin {
    fn verbose_name(&self) -> &'static str {
        "ingredient amount"
    }

    fn verbose_name_plural(&self) -> &'static str {
        "ingredient amounts"
    }

    fn list_display(&self) -> &'static [&'static str] {
        &["id", "recipe", "ingredient", "amount"]
    }

    fn search_fields(&self) -> &'static [&'static str] {
        &["recipe", "ingredient"]
    }

    fn list_filter(&self) -> &'static [ListFilter] {
        const FILTERS: &[ListFilter] = &[
            ListFilter::value("id", "id"),
            ListFilter::value("recipe", "recipe"),
            ListFilter::value("ingredient", "ingredient"),
        ];
        FILTERS
    }

    fn rows(&self, conn: &mut Connection) -> database::Result<Vec<Row>> {
        let recipes: HashMap<RecipeId, String> = query::all_recipes(conn)?
            .into_iter()
            .map(|r| (r.id, r.name))
            .collect();
        let ingredients: HashMap<IngredientId, IngredientHandle> = query::all_ingredients(conn)?
            .into_iter()
            .map(|i| (i.id, i))
            .collect();

        Ok(query::all_ingredient_amounts(conn)?
            .into_iter()
            .map(|a| {
                let recipe = recipes.get(&a.recipe_id).cloned().unwrap_or_default();
                let ingredient = ingredients
                    .get(&a.ingredient_id)
                    .map(ToString::to_string)
                    .unwrap_or_default();
                Row::new(a.id)
                    .text(a.id)
                    .text(&recipe)
                    .text(&ingredient)
                    .text(a.amount)
                    .lookup("id", [a.id.to_string()])
                    .lookup("recipe", [recipe])
                    .lookup("ingredient", [ingredient])
            })
            .collect())
    }

    fn form(&self, conn: &mut Connection, id: Option<i32>) -> database::Result<Form> {
        let amount = id
            .map(|id| query::get_ingredient_amount(conn, id.into()))
            .transpose()?;
        Ok(Form::new(vec![
            vec![Field::select(
                "recipe",
                "Recipe",
                recipe_choices(conn)?,
                amount.as_ref().map(|a| a.recipe_id.into()),
            )],
            vec![Field::select(
                "ingredient",
                "Ingredient",
                ingredient_choices(conn)?,
                amount.as_ref().map(|a| a.ingredient_id.into()),
            )],
            vec![Field::number(
                "amount",
                "Amount",
                amount.map(|a| a.amount).unwrap_or(validate::MIN_AMOUNT),
            )],
        ]))
    }

    fn save(&self, conn: &mut Connection, id: Option<i32>, form: &Form) -> database::Result<i32> {
        let amount = NewIngredientAmount {
            recipe_id: form.required_choice("recipe")?.into(),
            ingredient_id: form.required_choice("ingredient")?.into(),
            amount: form.number("amount"),
        };
        match id {
            Some(id) => {
                query::update_ingredient_amount(conn, id.into(), &amount)?;
                Ok(id)
            }
            None => Ok(query::add_ingredient_amount(conn, &amount)?.into()),
        }
    }

    fn delete(&self, conn: &mut Connection, id: i32) -> database::Result<()> {
        query::delete_ingredient_amount(conn, id.into())
    }
}

#[cfg(test)]
use super::form::Value;
#[cfg(test)]
use super::{Cell, ChangeListQuery, DateFilter, FilterChoice};
#[cfg(test)]
use crate::database::establish_test_connection;
#[cfg(test)]
use crate::database::query::fixtures;

#[cfg(test)]
fn names(rows: &[Row]) -> Vec<String> {
    rows.iter().map(|r| r.cells[1].to_string()).collect()
}

#[test]
fn recipe_rows_carry_favorite_count() {
    let mut conn = establish_test_connection();
    let k = fixtures::kitchen(&mut conn);
    let salad = query::add_recipe(
        &mut conn,
        &fixtures::new_recipe(k.reader, "Salad"),
        &[],
        &[(k.cabbage, 100)],
    )
    .unwrap();
    query::add_favorite(&mut conn, k.reader, k.borscht).unwrap();
    query::add_favorite(&mut conn, k.author, k.borscht).unwrap();

    let rows = RecipeAdmin.rows(&mut conn).unwrap();
    let count = |id: RecipeId| {
        let row = rows.iter().find(|r| r.id == i32::from(id)).unwrap();
        row.cells[6].to_string()
    };
    assert_eq!(count(k.borscht), "2");
    assert_eq!(count(salad), "0");

    let borscht = rows.iter().find(|r| r.id == i32::from(k.borscht)).unwrap();
    assert_eq!(borscht.cells[2].to_string(), "author");
    assert_eq!(
        borscht.cells[4],
        Cell::Image("recipes/images/dish.png".into())
    );
}

#[test]
fn recipe_search_and_filters() {
    let mut conn = establish_test_connection();
    let k = fixtures::kitchen(&mut conn);
    query::add_recipe(
        &mut conn,
        &fixtures::new_recipe(k.reader, "Salad"),
        &[],
        &[(k.cabbage, 100)],
    )
    .unwrap();

    let search = |conn: &mut Connection, q: &str| {
        let query = ChangeListQuery::default().search(q);
        names(&RecipeAdmin.changelist(conn, &query).unwrap())
    };
    assert_eq!(search(&mut conn, "soup"), ["Borscht"]);
    assert_eq!(search(&mut conn, "READ"), ["Salad"]);
    assert!(search(&mut conn, "pie").is_empty());

    let query = ChangeListQuery::default()
        .filter("author__username", FilterChoice::Value("author".into()));
    let rows = RecipeAdmin.changelist(&mut conn, &query).unwrap();
    assert_eq!(names(&rows), ["Borscht"]);

    let today = chrono::Utc::now().date_naive();
    let query = ChangeListQuery::default()
        .filter("pub_date", FilterChoice::Date(DateFilter::Today))
        .filter("tags__name", FilterChoice::Value("Soup".into()));
    let rows = RecipeAdmin.changelist_at(&mut conn, &query, today).unwrap();
    assert_eq!(names(&rows), ["Borscht"]);

    let long_ago = today.checked_sub_days(chrono::Days::new(400)).unwrap();
    let query = ChangeListQuery::default().filter("pub_date", FilterChoice::Date(DateFilter::ThisYear));
    let rows = RecipeAdmin.changelist_at(&mut conn, &query, long_ago).unwrap();
    assert!(rows.is_empty());

    assert_eq!(
        RecipeAdmin.filter_choices(&mut conn, "tags__name").unwrap(),
        ["Soup"]
    );
}

#[test]
fn recipe_form_offers_extra_rows() {
    let mut conn = establish_test_connection();
    let k = fixtures::kitchen(&mut conn);

    let blank = RecipeAdmin.form(&mut conn, None).unwrap();
    assert_eq!(
        blank.amount_rows("ingredients").len(),
        INLINE_MIN_NUM + INLINE_EXTRA
    );
    assert_eq!(blank.number("cooking_time"), validate::MIN_COOKING_TIME);

    let stored = RecipeAdmin.form(&mut conn, Some(k.borscht.into())).unwrap();
    let rows = stored.amount_rows("ingredients");
    assert_eq!(rows.len(), 2 + INLINE_EXTRA);
    assert_eq!(rows[0].name, "beet, g");
    assert_eq!(rows[0].amount, 300);
    assert_eq!(stored.choices("tags"), [i32::from(k.soup)]);
    assert_eq!(stored.choice("author"), Some(k.author.into()));
}

#[test]
fn recipe_form_save() {
    let mut conn = establish_test_connection();
    let k = fixtures::kitchen(&mut conn);

    let mut form = RecipeAdmin.form(&mut conn, None).unwrap();
    let mut set = |name: &str, value: Value| form.field_mut(name).unwrap().value = value;
    set("name", Value::Text("Stew".into()));
    set("text", Value::Text("Simmer for hours.".into()));
    set("image", Value::Text("recipes/images/stew.png".into()));
    set("cooking_time", Value::Number(120));
    set("author", Value::Choice(Some(k.reader.into())));
    set("tags", Value::Choices([i32::from(k.soup)].into()));

    let error = RecipeAdmin.save(&mut conn, None, &form).unwrap_err();
    assert!(matches!(error, database::Error::Validation(e) if e.field == "ingredients"));

    let Some(Field {
        value: Value::Amounts(rows),
        ..
    }) = form.field_mut("ingredients")
    else {
        panic!("missing inline field");
    };
    rows[1] = AmountRow {
        ingredient: Some(k.beet),
        name: "beet, g".into(),
        amount: 500,
    };
    let id = RecipeAdmin.save(&mut conn, None, &form).unwrap();

    let amounts = query::recipe_ingredients(&mut conn, id.into()).unwrap();
    assert_eq!(amounts.len(), 1);
    assert_eq!(amounts[0].0.amount, 500);
    let tags = query::recipe_tags(&mut conn, id.into()).unwrap();
    assert_eq!(tags[0].id, k.soup);
}

#[test]
fn ingredient_amount_rows() {
    let mut conn = establish_test_connection();
    fixtures::kitchen(&mut conn);

    let rows = IngredientAmountAdmin.rows(&mut conn).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].cells[1].to_string(), "Borscht");
    assert_eq!(rows[0].cells[2].to_string(), "beet, g");
    assert_eq!(rows[0].cells[3].to_string(), "300");

    let query = ChangeListQuery::default().search("cabb");
    let rows = IngredientAmountAdmin.changelist(&mut conn, &query).unwrap();
    assert_eq!(rows.len(), 1);

    let mut form = IngredientAmountAdmin.form(&mut conn, Some(rows[0].id)).unwrap();
    form.field_mut("amount").unwrap().value = Value::Number(validate::MAX_AMOUNT + 1);
    let error = IngredientAmountAdmin
        .save(&mut conn, Some(rows[0].id), &form)
        .unwrap_err();
    assert!(matches!(error, database::Error::Validation(_)));
}
