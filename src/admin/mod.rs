// Copyright 2023 Remi Bernotavicius

//! Per-model admin registrations: which columns a change list shows, what the
//! search box looks at, which filters are offered and how the edit form is laid
//! out. The `ui` module renders these without knowing about any particular model.

use crate::database::models::TagColor;
use crate::database::{self, Connection};
use chrono::{Datelike as _, Days, Months, NaiveDate, NaiveDateTime, NaiveTime};
use derive_more::Display;
use std::collections::{BTreeMap, BTreeSet};
use strum::EnumIter;

pub mod catalogue;
pub mod form;
pub mod recipes;
pub mod relations;
pub mod users;

pub use form::Form;

pub const SITE_HEADER: &str = "Foodgram administration";
pub const EMPTY_VALUE_DISPLAY: &str = "Value not specified";

/// The application a model is grouped under on the index page.
#[derive(Debug, Display, EnumIter, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum App {
    Users,
    Recipes,
}

#[derive(Debug, Display, EnumIter, Hash, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Model {
    User,
    Subscribe,
    Tag,
    MeasurementUnit,
    Ingredient,
    Recipe,
    IngredientAmount,
    FavoriteRecipe,
    ShoppingCart,
}

impl Model {
    pub fn app(&self) -> App {
        match self {
            Self::User | Self::Subscribe => App::Users,
            _ => App::Recipes,
        }
    }

    pub fn admin(&self) -> &'static dyn ModelAdmin {
        match self {
            Self::User => &users::UserAdmin,
            Self::Subscribe => &users::SubscribeAdmin,
            Self::Tag => &catalogue::TagAdmin,
            Self::MeasurementUnit => &catalogue::MeasurementUnitAdmin,
            Self::Ingredient => &catalogue::IngredientAdmin,
            Self::Recipe => &recipes::RecipeAdmin,
            Self::IngredientAmount => &recipes::IngredientAmountAdmin,
            Self::FavoriteRecipe => &relations::FavoriteRecipeAdmin,
            Self::ShoppingCart => &relations::ShoppingCartAdmin,
        }
    }

    pub fn iter() -> impl Iterator<Item = Self> {
        <Self as strum::IntoEnumIterator>::iter()
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FilterKind {
    Value,
    Date,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ListFilter {
    pub field: &'static str,
    pub title: &'static str,
    pub kind: FilterKind,
}

impl ListFilter {
    pub const fn value(field: &'static str, title: &'static str) -> Self {
        Self {
            field,
            title,
            kind: FilterKind::Value,
        }
    }

    pub const fn date(field: &'static str, title: &'static str) -> Self {
        Self {
            field,
            title,
            kind: FilterKind::Date,
        }
    }
}

#[derive(Debug, Display, EnumIter, Default, Copy, Clone, PartialEq, Eq)]
pub enum DateFilter {
    #[default]
    #[display("Any date")]
    AnyDate,
    #[display("Today")]
    Today,
    #[display("Past 7 days")]
    PastSevenDays,
    #[display("This month")]
    ThisMonth,
    #[display("This year")]
    ThisYear,
}

impl DateFilter {
    pub fn iter() -> impl Iterator<Item = Self> {
        <Self as strum::IntoEnumIterator>::iter()
    }

    /// Half-open `[start, end)` range selected relative to `today`, `None` for any date.
    pub fn range(&self, today: NaiveDate) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let tomorrow = today.succ_opt()?;
        let (start, end) = match self {
            Self::AnyDate => return None,
            Self::Today => (today, tomorrow),
            Self::PastSevenDays => (today.checked_sub_days(Days::new(7))?, tomorrow),
            Self::ThisMonth => {
                let first = today.with_day(1)?;
                (first, first.checked_add_months(Months::new(1))?)
            }
            Self::ThisYear => {
                let first = NaiveDate::from_ymd_opt(today.year(), 1, 1)?;
                (first, first.checked_add_months(Months::new(12))?)
            }
        };
        Some((start.and_time(NaiveTime::MIN), end.and_time(NaiveTime::MIN)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterChoice {
    Value(String),
    Date(DateFilter),
}

#[derive(Debug, Default, Clone)]
pub struct ChangeListQuery {
    pub search: String,
    pub filters: BTreeMap<&'static str, FilterChoice>,
}

impl ChangeListQuery {
    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn filter(mut self, field: &'static str, choice: FilterChoice) -> Self {
        self.filters.insert(field, choice);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Text(String),
    /// Path of an uploaded image, shown as a thumbnail.
    Image(String),
    /// Shown as a swatch next to its hex code.
    Color(TagColor),
    Empty,
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(s) | Self::Image(s) => write!(f, "{s}"),
            Self::Color(c) => write!(f, "{}", c.hex()),
            Self::Empty => write!(f, "{EMPTY_VALUE_DISPLAY}"),
        }
    }
}

/// One change list entry: the displayed cells plus the values search and
/// filters look at.
#[derive(Debug, Clone)]
pub struct Row {
    pub id: i32,
    pub cells: Vec<Cell>,
    lookups: Vec<(&'static str, Vec<String>)>,
    dates: Vec<(&'static str, NaiveDateTime)>,
}

impl Row {
    pub fn new(id: impl Into<i32>) -> Self {
        Self {
            id: id.into(),
            cells: vec![],
            lookups: vec![],
            dates: vec![],
        }
    }

    pub fn text(mut self, value: impl std::fmt::Display) -> Self {
        let value = value.to_string();
        self.cells.push(if value.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(value)
        });
        self
    }

    pub fn optional(self, value: Option<impl std::fmt::Display>) -> Self {
        match value {
            Some(value) => self.text(value),
            None => self.cell(Cell::Empty),
        }
    }

    pub fn image(self, path: &str) -> Self {
        if path.is_empty() {
            self.cell(Cell::Empty)
        } else {
            self.cell(Cell::Image(path.into()))
        }
    }

    pub fn color(self, color: Option<TagColor>) -> Self {
        self.cell(color.map_or(Cell::Empty, Cell::Color))
    }

    pub fn cell(mut self, cell: Cell) -> Self {
        self.cells.push(cell);
        self
    }

    pub fn lookup<S: Into<String>>(
        mut self,
        field: &'static str,
        values: impl IntoIterator<Item = S>,
    ) -> Self {
        self.lookups
            .push((field, values.into_iter().map(Into::into).collect()));
        self
    }

    pub fn date(mut self, field: &'static str, value: NaiveDateTime) -> Self {
        self.dates.push((field, value));
        self
    }

    fn lookup_values(&self, field: &str) -> &[String] {
        self.lookups
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, v)| &v[..])
            .unwrap_or(&[])
    }

    fn date_value(&self, field: &str) -> Option<NaiveDateTime> {
        self.dates.iter().find(|(f, _)| *f == field).map(|(_, d)| *d)
    }

    fn matches_search(&self, search_fields: &[&str], search: &str) -> bool {
        let search = search.trim().to_lowercase();
        if search.is_empty() {
            return true;
        }
        search_fields.iter().any(|field| {
            let text_matches = self
                .lookup_values(field)
                .iter()
                .any(|v| v.to_lowercase().contains(&search));
            let date_matches = self
                .date_value(field)
                .is_some_and(|d| d.to_string().contains(&search));
            text_matches || date_matches
        })
    }

    fn matches_filter(&self, field: &str, choice: &FilterChoice, today: NaiveDate) -> bool {
        match choice {
            FilterChoice::Value(value) => self.lookup_values(field).contains(value),
            FilterChoice::Date(filter) => match filter.range(today) {
                None => true,
                Some((start, end)) => self
                    .date_value(field)
                    .is_some_and(|d| start <= d && d < end),
            },
        }
    }
}

pub trait ModelAdmin {
    fn verbose_name(&self) -> &'static str;
    fn verbose_name_plural(&self) -> &'static str;

    /// Column headers, one per `Row` cell.
    fn list_display(&self) -> &'static [&'static str];
    fn search_fields(&self) -> &'static [&'static str];
    fn list_filter(&self) -> &'static [ListFilter];

    fn save_on_top(&self) -> bool {
        false
    }

    /// Every row of the model, in its default ordering.
    fn rows(&self, conn: &mut Connection) -> database::Result<Vec<Row>>;

    /// A blank form when `id` is `None`, otherwise one holding the stored record.
    fn form(&self, conn: &mut Connection, id: Option<i32>) -> database::Result<Form>;

    /// Inserts or updates the record, returning its id.
    fn save(&self, conn: &mut Connection, id: Option<i32>, form: &Form) -> database::Result<i32>;

    fn delete(&self, conn: &mut Connection, id: i32) -> database::Result<()>;

    fn changelist(
        &self,
        conn: &mut Connection,
        query: &ChangeListQuery,
    ) -> database::Result<Vec<Row>> {
        self.changelist_at(conn, query, chrono::Utc::now().date_naive())
    }

    fn changelist_at(
        &self,
        conn: &mut Connection,
        query: &ChangeListQuery,
        today: NaiveDate,
    ) -> database::Result<Vec<Row>> {
        let rows = self.rows(conn)?;
        Ok(rows
            .into_iter()
            .filter(|row| row.matches_search(self.search_fields(), &query.search))
            .filter(|row| {
                query
                    .filters
                    .iter()
                    .all(|(field, choice)| row.matches_filter(field, choice, today))
            })
            .collect())
    }

    /// Distinct values present for a value filter.
    fn filter_choices(&self, conn: &mut Connection, field: &str) -> database::Result<Vec<String>> {
        let values: BTreeSet<String> = self
            .rows(conn)?
            .iter()
            .flat_map(|row| row.lookup_values(field).iter().cloned())
            .collect();
        let mut values: Vec<String> = values.into_iter().collect();
        values.sort_by_key(|v| v.parse::<i64>().ok());
        Ok(values)
    }
}

#[cfg(test)]
fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn date_filter_ranges() {
    let today = date(2023, 12, 31);
    let midnight = |d: NaiveDate| d.and_time(NaiveTime::MIN);

    assert_eq!(DateFilter::AnyDate.range(today), None);
    assert_eq!(
        DateFilter::Today.range(today),
        Some((midnight(today), midnight(date(2024, 1, 1))))
    );
    assert_eq!(
        DateFilter::PastSevenDays.range(today),
        Some((midnight(date(2023, 12, 24)), midnight(date(2024, 1, 1))))
    );
    assert_eq!(
        DateFilter::ThisMonth.range(date(2024, 2, 10)),
        Some((midnight(date(2024, 2, 1)), midnight(date(2024, 3, 1))))
    );
    assert_eq!(
        DateFilter::ThisYear.range(today),
        Some((midnight(date(2023, 1, 1)), midnight(date(2024, 1, 1))))
    );
}

#[test]
fn row_search_and_filters() {
    let today = date(2023, 6, 15);
    let row = Row::new(7)
        .text("Borscht")
        .text("")
        .lookup("name", ["Borscht"])
        .lookup("tags__name", ["Soup", "Dinner"])
        .date("pub_date", date(2023, 6, 14).and_time(NaiveTime::MIN));

    assert_eq!(row.cells[1], Cell::Empty);
    assert_eq!(row.cells[1].to_string(), EMPTY_VALUE_DISPLAY);

    assert!(row.matches_search(&["name"], "  bORSch "));
    assert!(row.matches_search(&["name", "tags__name"], "dinn"));
    assert!(!row.matches_search(&["name"], "dinn"));
    assert!(row.matches_search(&["name"], ""));

    let dinner = FilterChoice::Value("Dinner".into());
    assert!(row.matches_filter("tags__name", &dinner, today));
    assert!(!row.matches_filter("name", &dinner, today));

    let today_only = FilterChoice::Date(DateFilter::Today);
    let this_week = FilterChoice::Date(DateFilter::PastSevenDays);
    assert!(!row.matches_filter("pub_date", &today_only, today));
    assert!(row.matches_filter("pub_date", &this_week, today));
}

#[test]
fn every_model_is_registered() {
    let users: Vec<_> = Model::iter().filter(|m| m.app() == App::Users).collect();
    assert_eq!(users, [Model::User, Model::Subscribe]);

    for model in Model::iter() {
        let admin = model.admin();
        for filter in admin.list_filter() {
            assert!(!filter.title.is_empty(), "{model}");
        }
        assert!(admin.list_display().contains(&"id"), "{model}");
    }
    assert!(Model::Recipe.admin().save_on_top());
    assert!(Model::User.admin().save_on_top());
    assert!(!Model::Tag.admin().save_on_top());
}
