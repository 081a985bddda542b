// Copyright 2023 Remi Bernotavicius

use super::form::{Choice, Field, Form};
use super::{ListFilter, ModelAdmin, Row};
use crate::database::models::{NewSubscribe, NewUser, User, UserId};
use crate::database::{self, query, Connection};
use std::collections::HashMap;

pub(crate) fn users_by_id(conn: &mut Connection) -> database::Result<HashMap<UserId, User>> {
    Ok(query::all_users(conn)?
        .into_iter()
        .map(|u| (u.id, u))
        .collect())
}

pub(crate) fn user_choices(conn: &mut Connection) -> database::Result<Vec<Choice>> {
    Ok(query::all_users(conn)?
        .into_iter()
        .map(|u| Choice::new(u.id, u))
        .collect())
}

pub(crate) fn username(users: &HashMap<UserId, User>, id: UserId) -> &str {
    users.get(&id).map(|u| u.username.as_str()).unwrap_or("")
}

pub struct UserAdmin;

impl ModelAdmin for UserAdmin {
    fn verbose_name(&self) -> &'static str {
        "user"
    }

    fn verbose_name_plural(&self) -> &'static str {
        "users"
    }

    fn list_display(&self) -> &'static [&'static str] {
        &["id", "username", "first_name", "last_name", "email"]
    }

    fn search_fields(&self) -> &'static [&'static str] {
        &["username", "email"]
    }

    fn list_filter(&self) -> &'static [ListFilter] {
        const FILTERS: &[ListFilter] = &[
            ListFilter::value("first_name", "first name"),
            ListFilter::value("email", "email"),
        ];
        FILTERS
    }

    fn save_on_top(&self) -> bool {
        true
    }

    fn rows(&self, conn: &mut Connection) -> database::Result<Vec<Row>> {
        Ok(query::all_users(conn)?
            .into_iter()
            .map(|u| {
                Row::new(u.id)
                    .text(u.id)
                    .text(&u.username)
                    .text(&u.first_name)
                    .text(&u.last_name)
                    .text(&u.email)
                    .lookup("username", [u.username])
                    .lookup("email", [u.email])
                    .lookup("first_name", [u.first_name])
            })
            .collect())
    }

    fn form(&self, conn: &mut Connection, id: Option<i32>) -> database::Result<Form> {
        let user = id.map(|id| query::get_user(conn, id.into())).transpose()?;
        let value = |f: fn(&User) -> &str| user.as_ref().map(f).unwrap_or("").to_owned();
        Ok(Form::new(vec![
            vec![
                Field::text("username", "Username", value(|u| &u.username)),
                Field::text("email", "Email", value(|u| &u.email)),
            ],
            vec![
                Field::text("first_name", "First name", value(|u| &u.first_name)),
                Field::text("last_name", "Last name", value(|u| &u.last_name)),
            ],
        ]))
    }

    fn save(&self, conn: &mut Connection, id: Option<i32>, form: &Form) -> database::Result<i32> {
        let user = NewUser {
            username: form.text("username").trim(),
            email: form.text("email").trim(),
            first_name: form.text("first_name").trim(),
            last_name: form.text("last_name").trim(),
        };
        match id {
            Some(id) => {
                query::update_user(conn, id.into(), &user)?;
                Ok(id)
            }
            None => Ok(query::add_user(conn, &user)?.into()),
        }
    }

    fn delete(&self, conn: &mut Connection, id: i32) -> database::Result<()> {
        query::delete_user(conn, id.into())
    }
}

pub struct SubscribeAdmin;

impl ModelAdmin for SubscribeAdmin {
    fn verbose_name(&self) -> &'static str {
        "subscription"
    }

    fn verbose_name_plural(&self) -> &'static str {
        "subscriptions"
    }

    fn list_display(&self) -> &'static [&'static str] {
        &["id", "author", "user", "created"]
    }

    fn search_fields(&self) -> &'static [&'static str] {
        &["author", "created"]
    }

    fn list_filter(&self) -> &'static [ListFilter] {
        const FILTERS: &[ListFilter] = &[
            ListFilter::value("author", "author"),
            ListFilter::value("user", "user"),
            ListFilter::date("created", "created"),
        ];
        FILTERS
    }

    fn rows(&self, conn: &mut Connection) -> database::Result<Vec<Row>> {
        let users = users_by_id(conn)?;
        Ok(query::all_subscriptions(conn)?
            .into_iter()
            .map(|s| {
                let author = username(&users, s.author_id);
                let user = username(&users, s.user_id);
                Row::new(s.id)
                    .text(s.id)
                    .text(author)
                    .text(user)
                    .text(s.created.format("%Y-%m-%d %H:%M"))
                    .lookup("author", [author])
                    .lookup("user", [user])
                    .date("created", s.created)
            })
            .collect())
    }

    fn form(&self, conn: &mut Connection, id: Option<i32>) -> database::Result<Form> {
        let subscription = id
            .map(|id| query::get_subscription(conn, id.into()))
            .transpose()?;
        let choices = user_choices(conn)?;
        Ok(Form::new(vec![
            vec![Field::select(
                "user",
                "User",
                choices.clone(),
                subscription.as_ref().map(|s| s.user_id.into()),
            )],
            vec![Field::select(
                "author",
                "Author",
                choices,
                subscription.as_ref().map(|s| s.author_id.into()),
            )],
        ]))
    }

    fn save(&self, conn: &mut Connection, id: Option<i32>, form: &Form) -> database::Result<i32> {
        let subscription = NewSubscribe {
            user_id: form.required_choice("user")?.into(),
            author_id: form.required_choice("author")?.into(),
        };
        match id {
            Some(id) => {
                query::update_subscription(conn, id.into(), &subscription)?;
                Ok(id)
            }
            None => Ok(query::add_subscription(conn, &subscription)?.into()),
        }
    }

    fn delete(&self, conn: &mut Connection, id: i32) -> database::Result<()> {
        query::delete_subscription(conn, id.into())
    }
}

#[cfg(test)]
use super::{ChangeListQuery, FilterChoice};
#[cfg(test)]
use crate::database::establish_test_connection;
#[cfg(test)]
use crate::database::query::fixtures;

#[test]
fn user_search_and_filter() {
    let mut conn = establish_test_connection();
    fixtures::kitchen(&mut conn);
    query::add_user(
        &mut conn,
        &NewUser {
            first_name: "Ann",
            ..fixtures::new_user("ann", "ann@mail.example")
        },
    )
    .unwrap();

    let usernames = |rows: Vec<Row>| -> Vec<String> {
        rows.into_iter().map(|r| r.cells[1].to_string()).collect()
    };

    let all = UserAdmin.changelist(&mut conn, &ChangeListQuery::default());
    assert_eq!(usernames(all.unwrap()), ["ann", "author", "reader"]);

    let query = ChangeListQuery::default().search("FOODGRAM.example");
    let found = UserAdmin.changelist(&mut conn, &query).unwrap();
    assert_eq!(usernames(found), ["author", "reader"]);

    let query = ChangeListQuery::default().filter("first_name", FilterChoice::Value("Ann".into()));
    let found = UserAdmin.changelist(&mut conn, &query).unwrap();
    assert_eq!(usernames(found), ["ann"]);

    assert_eq!(
        UserAdmin.filter_choices(&mut conn, "first_name").unwrap(),
        ["Ann", "Test"]
    );
}

#[test]
fn user_form_round_trip() {
    let mut conn = establish_test_connection();

    let mut form = UserAdmin.form(&mut conn, None).unwrap();
    assert_eq!(form.rows.len(), 2);
    for (name, value) in [
        ("username", "julia"),
        ("email", "julia@foodgram.example"),
        ("first_name", "Julia"),
        ("last_name", "Child"),
    ] {
        form.field_mut(name).unwrap().value = super::form::Value::Text(value.into());
    }
    let id = UserAdmin.save(&mut conn, None, &form).unwrap();

    let mut form = UserAdmin.form(&mut conn, Some(id)).unwrap();
    assert_eq!(form.text("email"), "julia@foodgram.example");

    form.field_mut("email").unwrap().value = super::form::Value::Text("julia".into());
    let error = UserAdmin.save(&mut conn, Some(id), &form).unwrap_err();
    assert!(matches!(error, database::Error::Validation(e) if e.field == "email"));

    UserAdmin.delete(&mut conn, id).unwrap();
    assert!(UserAdmin.rows(&mut conn).unwrap().is_empty());
}

#[test]
fn subscription_rows_and_form() {
    let mut conn = establish_test_connection();
    let k = fixtures::kitchen(&mut conn);

    let mut form = SubscribeAdmin.form(&mut conn, None).unwrap();
    let error = SubscribeAdmin.save(&mut conn, None, &form).unwrap_err();
    assert!(matches!(error, database::Error::Validation(e) if e.field == "user"));

    form.field_mut("user").unwrap().value = super::form::Value::Choice(Some(k.reader.into()));
    form.field_mut("author").unwrap().value = super::form::Value::Choice(Some(k.author.into()));
    SubscribeAdmin.save(&mut conn, None, &form).unwrap();

    let rows = SubscribeAdmin.rows(&mut conn).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].cells[1].to_string(), "author");
    assert_eq!(rows[0].cells[2].to_string(), "reader");

    let query = ChangeListQuery::default()
        .filter("created", FilterChoice::Date(super::DateFilter::ThisYear));
    assert_eq!(SubscribeAdmin.changelist(&mut conn, &query).unwrap().len(), 1);

    let query = ChangeListQuery::default().search("reader");
    assert!(SubscribeAdmin.changelist(&mut conn, &query).unwrap().is_empty());
}
