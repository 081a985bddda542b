// Copyright 2023 Remi Bernotavicius

use super::form::{Choice, Field, Form};
use super::{ListFilter, ModelAdmin, Row};
use crate::database::models::{NewIngredient, NewTag, TagColor};
use crate::database::{self, query, Connection};

fn color_choices() -> Vec<Choice> {
    TagColor::iter()
        .enumerate()
        .map(|(i, c)| Choice {
            id: i as i32,
            label: format!("{c} ({})", c.hex()),
        })
        .collect()
}

fn color_choice(color: TagColor) -> i32 {
    TagColor::iter().position(|c| c == color).unwrap_or(0) as i32
}

fn color_from_choice(choice: i32) -> Option<TagColor> {
    usize::try_from(choice)
        .ok()
        .and_then(|i| TagColor::iter().nth(i))
}

pub struct TagAdmin;

impl ModelAdmin for TagAdmin {
    fn verbose_name(&self) -> &'static str {
        "tag"
    }

    fn verbose_name_plural(&self) -> &'static str {
        "tags"
    }

    fn list_display(&self) -> &'static [&'static str] {
        &["id", "name", "color", "slug"]
    }

    fn search_fields(&self) -> &'static [&'static str] {
        &["name", "slug"]
    }

    fn list_filter(&self) -> &'static [ListFilter] {
        const FILTERS: &[ListFilter] = &[
            ListFilter::value("name", "name"),
            ListFilter::value("slug", "slug"),
        ];
        FILTERS
    }

    fn rows(&self, conn: &mut Connection) -> database::Result<Vec<Row>> {
        Ok(query::all_tags(conn)?
            .into_iter()
            .map(|t| {
                Row::new(t.id)
                    .text(t.id)
                    .text(&t.name)
                    .color(t.color)
                    .text(&t.slug)
                    .lookup("name", [t.name])
                    .lookup("slug", [t.slug])
            })
            .collect())
    }

    fn form(&self, conn: &mut Connection, id: Option<i32>) -> database::Result<Form> {
        let (name, color, slug) = match id {
            Some(id) => {
                let tag = query::get_tag(conn, id.into())?;
                (tag.name, tag.color, tag.slug)
            }
            None => (String::new(), Some(TagColor::default()), String::new()),
        };
        Ok(Form::new(vec![
            vec![Field::text("name", "Name", name)],
            vec![Field::optional_select(
                "color",
                "Color",
                color_choices(),
                color.map(color_choice),
            )],
            vec![Field::text("slug", "Slug", slug)],
        ]))
    }

    fn save(&self, conn: &mut Connection, id: Option<i32>, form: &Form) -> database::Result<i32> {
        let tag = NewTag {
            name: form.text("name").trim(),
            color: form.choice("color").and_then(color_from_choice),
            slug: form.text("slug").trim(),
        };
        match id {
            Some(id) => {
                query::update_tag(conn, id.into(), &tag)?;
                Ok(id)
            }
            None => Ok(query::add_tag(conn, &tag)?.into()),
        }
    }

    fn delete(&self, conn: &mut Connection, id: i32) -> database::Result<()> {
        query::delete_tag(conn, id.into())
    }
}

pub struct MeasurementUnitAdmin;

impl ModelAdmin for MeasurementUnitAdmin {
    fn verbose_name(&self) -> &'static str {
        "measurement unit"
    }

    fn verbose_name_plural(&self) -> &'static str {
        "measurement units"
    }

    fn list_display(&self) -> &'static [&'static str] {
        &["id", "name"]
    }

    fn search_fields(&self) -> &'static [&'static str] {
        &["name"]
    }

    fn list_filter(&self) -> &'static [ListFilter] {
        &[]
    }

    fn rows(&self, conn: &mut Connection) -> database::Result<Vec<Row>> {
        Ok(query::all_measurement_units(conn)?
            .into_iter()
            .map(|u| Row::new(u.id).text(u.id).text(&u.name).lookup("name", [u.name]))
            .collect())
    }

    fn form(&self, conn: &mut Connection, id: Option<i32>) -> database::Result<Form> {
        let name = match id {
            Some(id) => query::get_measurement_unit(conn, id.into())?.name,
            None => String::new(),
        };
        Ok(Form::new(vec![vec![Field::text("name", "Name", name)]]))
    }

    fn save(&self, conn: &mut Connection, id: Option<i32>, form: &Form) -> database::Result<i32> {
        let name = form.text("name").trim();
        match id {
            Some(id) => {
                query::update_measurement_unit(conn, id.into(), name)?;
                Ok(id)
            }
            None => Ok(query::add_measurement_unit(conn, name)?.into()),
        }
    }

    fn delete(&self, conn: &mut Connection, id: i32) -> database::Result<()> {
        query::delete_measurement_unit(conn, id.into())
    }
}

pub struct IngredientAdmin;

impl ModelAdmin for IngredientAdmin {
    fn verbose_name(&self) -> &'static str {
        "ingredient"
    }

    fn verbose_name_plural(&self) -> &'static str {
        "ingredients"
    }

    fn list_display(&self) -> &'static [&'static str] {
        &["id", "name", "measurement_unit"]
    }

    fn search_fields(&self) -> &'static [&'static str] {
        &["name"]
    }

    fn list_filter(&self) -> &'static [ListFilter] {
        const FILTERS: &[ListFilter] = &[ListFilter::value("name", "name")];
        FILTERS
    }

    fn rows(&self, conn: &mut Connection) -> database::Result<Vec<Row>> {
        Ok(query::all_ingredients(conn)?
            .into_iter()
            .map(|i| {
                Row::new(i.id)
                    .text(i.id)
                    .text(&i.name)
                    .text(&i.measurement_unit)
                    .lookup("name", [i.name])
            })
            .collect())
    }

    fn form(&self, conn: &mut Connection, id: Option<i32>) -> database::Result<Form> {
        let ingredient = id
            .map(|id| query::get_ingredient(conn, id.into()))
            .transpose()?;
        let units = query::all_measurement_units(conn)?
            .into_iter()
            .map(|u| Choice::new(u.id, u.name))
            .collect();
        Ok(Form::new(vec![
            vec![Field::text(
                "name",
                "Name",
                ingredient.as_ref().map(|i| i.name.as_str()).unwrap_or(""),
            )],
            vec![Field::select(
                "measurement_unit",
                "Measurement unit",
                units,
                ingredient.map(|i| i.measurement_unit_id.into()),
            )],
        ]))
    }

    fn save(&self, conn: &mut Connection, id: Option<i32>, form: &Form) -> database::Result<i32> {
        let ingredient = NewIngredient {
            name: form.text("name").trim(),
            measurement_unit_id: form.required_choice("measurement_unit")?.into(),
        };
        match id {
            Some(id) => {
                query::update_ingredient(conn, id.into(), &ingredient)?;
                Ok(id)
            }
            None => Ok(query::add_ingredient(conn, &ingredient)?.into()),
        }
    }

    fn delete(&self, conn: &mut Connection, id: i32) -> database::Result<()> {
        query::delete_ingredient(conn, id.into())
    }
}

#[cfg(test)]
use super::{ChangeListQuery, Cell};
#[cfg(test)]
use crate::database::establish_test_connection;
#[cfg(test)]
use crate::database::query::fixtures;

#[test]
fn tag_color_choice_round_trip() {
    let mut conn = establish_test_connection();

    let mut form = TagAdmin.form(&mut conn, None).unwrap();
    assert_eq!(
        form.choice("color").and_then(color_from_choice),
        Some(TagColor::Green)
    );
    form.field_mut("name").unwrap().value = super::form::Value::Text("Breakfast".into());
    form.field_mut("slug").unwrap().value = super::form::Value::Text("breakfast".into());
    form.field_mut("color").unwrap().value =
        super::form::Value::Choice(Some(color_choice(TagColor::Orange)));
    let id = TagAdmin.save(&mut conn, None, &form).unwrap();

    let form = TagAdmin.form(&mut conn, Some(id)).unwrap();
    assert_eq!(
        form.choice("color").and_then(color_from_choice),
        Some(TagColor::Orange)
    );

    let rows = TagAdmin.rows(&mut conn).unwrap();
    assert_eq!(rows[0].cells[2], Cell::Color(TagColor::Orange));
    assert_eq!(rows[0].cells[2].to_string(), "#FFA500");
    assert_eq!(color_from_choice(-1), None);
}

#[test]
fn tag_without_color_shows_empty_value() {
    let mut conn = establish_test_connection();
    fixtures::kitchen(&mut conn);

    let rows = TagAdmin.rows(&mut conn).unwrap();
    assert_eq!(rows[0].cells[2], Cell::Empty);
}

#[test]
fn ingredient_search_and_unit_column() {
    let mut conn = establish_test_connection();
    fixtures::kitchen(&mut conn);

    let query = ChangeListQuery::default().search("bag");
    let rows = IngredientAdmin.changelist(&mut conn, &query).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].cells[1].to_string(), "cabbage");
    assert_eq!(rows[0].cells[2].to_string(), "g");
}

#[test]
fn measurement_unit_in_use_is_kept() {
    let mut conn = establish_test_connection();
    let k = fixtures::kitchen(&mut conn);

    let error = MeasurementUnitAdmin
        .delete(&mut conn, k.grams.into())
        .unwrap_err();
    assert_eq!(
        error.integrity_kind(),
        Some(database::IntegrityKind::ForeignKey)
    );
    assert_eq!(MeasurementUnitAdmin.rows(&mut conn).unwrap().len(), 1);
}
