// Copyright 2023 Remi Bernotavicius

use crate::database::models::IngredientId;
use crate::database::ValidationError;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub id: i32,
    pub label: String,
}

impl Choice {
    pub fn new(id: impl Into<i32>, label: impl std::fmt::Display) -> Self {
        Self {
            id: id.into(),
            label: label.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Widget {
    Text,
    TextArea,
    Number,
    /// Path of an image file on disk.
    Image,
    Select(Vec<Choice>),
    OptionalSelect(Vec<Choice>),
    /// Multi-select shown as a vertical list of check boxes.
    FilterVertical(Vec<Choice>),
    /// Inline ingredient amount rows with an autocomplete ingredient field.
    IngredientAmounts { min_num: usize },
}

/// An inline ingredient row. `name` is the autocomplete buffer.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AmountRow {
    pub ingredient: Option<IngredientId>,
    pub name: String,
    pub amount: i32,
}

impl AmountRow {
    pub fn blank() -> Self {
        Self {
            amount: 1,
            ..Default::default()
        }
    }

    pub fn is_blank(&self) -> bool {
        self.ingredient.is_none() && self.name.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Text(String),
    Number(i32),
    Choice(Option<i32>),
    Choices(BTreeSet<i32>),
    Amounts(Vec<AmountRow>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: &'static str,
    pub label: &'static str,
    pub widget: Widget,
    pub value: Value,
}

impl Field {
    pub fn text(name: &'static str, label: &'static str, value: impl Into<String>) -> Self {
        Self {
            name,
            label,
            widget: Widget::Text,
            value: Value::Text(value.into()),
        }
    }

    pub fn text_area(name: &'static str, label: &'static str, value: impl Into<String>) -> Self {
        Self {
            widget: Widget::TextArea,
            ..Self::text(name, label, value)
        }
    }

    pub fn image(name: &'static str, label: &'static str, value: impl Into<String>) -> Self {
        Self {
            widget: Widget::Image,
            ..Self::text(name, label, value)
        }
    }

    pub fn number(name: &'static str, label: &'static str, value: i32) -> Self {
        Self {
            name,
            label,
            widget: Widget::Number,
            value: Value::Number(value),
        }
    }

    pub fn select(
        name: &'static str,
        label: &'static str,
        choices: Vec<Choice>,
        value: Option<i32>,
    ) -> Self {
        Self {
            name,
            label,
            widget: Widget::Select(choices),
            value: Value::Choice(value),
        }
    }

    pub fn optional_select(
        name: &'static str,
        label: &'static str,
        choices: Vec<Choice>,
        value: Option<i32>,
    ) -> Self {
        Self {
            name,
            label,
            widget: Widget::OptionalSelect(choices),
            value: Value::Choice(value),
        }
    }

    pub fn filter_vertical(
        name: &'static str,
        label: &'static str,
        choices: Vec<Choice>,
        value: impl IntoIterator<Item = i32>,
    ) -> Self {
        Self {
            name,
            label,
            widget: Widget::FilterVertical(choices),
            value: Value::Choices(value.into_iter().collect()),
        }
    }

    pub fn amounts(
        name: &'static str,
        label: &'static str,
        min_num: usize,
        rows: Vec<AmountRow>,
    ) -> Self {
        Self {
            name,
            label,
            widget: Widget::IngredientAmounts { min_num },
            value: Value::Amounts(rows),
        }
    }
}

/// Form fields laid out in rows; fields sharing a row are shown side by side.
#[derive(Debug, Clone, PartialEq)]
pub struct Form {
    pub rows: Vec<Vec<Field>>,
}

impl Form {
    pub fn new(rows: Vec<Vec<Field>>) -> Self {
        Self { rows }
    }

    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.rows.iter().flatten()
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut Field> {
        self.rows.iter_mut().flatten().find(|f| f.name == name)
    }

    fn value(&self, name: &str) -> Option<&Value> {
        self.fields().find(|f| f.name == name).map(|f| &f.value)
    }

    pub fn text(&self, name: &str) -> &str {
        match self.value(name) {
            Some(Value::Text(text)) => text,
            _ => "",
        }
    }

    pub fn number(&self, name: &str) -> i32 {
        match self.value(name) {
            Some(Value::Number(n)) => *n,
            _ => 0,
        }
    }

    pub fn choice(&self, name: &str) -> Option<i32> {
        match self.value(name) {
            Some(Value::Choice(choice)) => *choice,
            _ => None,
        }
    }

    pub fn required_choice(&self, name: &'static str) -> Result<i32, ValidationError> {
        self.choice(name)
            .ok_or_else(|| ValidationError::new(name, "This field is required."))
    }

    pub fn choices(&self, name: &str) -> Vec<i32> {
        match self.value(name) {
            Some(Value::Choices(choices)) => choices.iter().copied().collect(),
            _ => vec![],
        }
    }

    pub fn amount_rows(&self, name: &str) -> &[AmountRow] {
        match self.value(name) {
            Some(Value::Amounts(rows)) => rows,
            _ => &[],
        }
    }

    /// The filled-in inline rows, requiring at least `min_num` of them and a
    /// known ingredient on each.
    pub fn amounts(
        &self,
        name: &'static str,
        min_num: usize,
    ) -> Result<Vec<(IngredientId, i32)>, ValidationError> {
        let mut amounts = vec![];
        for row in self.amount_rows(name).iter().filter(|r| !r.is_blank()) {
            let ingredient = row.ingredient.ok_or_else(|| {
                ValidationError::new(
                    name,
                    format!(
                        "Select a valid choice. {:?} is not one of the available choices.",
                        row.name
                    ),
                )
            })?;
            amounts.push((ingredient, row.amount));
        }
        if amounts.len() < min_num {
            return Err(ValidationError::new(
                name,
                format!("Please submit at least {min_num} form."),
            ));
        }
        Ok(amounts)
    }
}

#[test]
fn amounts_skip_blank_rows() {
    let form = Form::new(vec![vec![Field::amounts(
        "ingredients",
        "Ingredients",
        1,
        vec![
            AmountRow {
                ingredient: Some(3.into()),
                name: "beet, g".into(),
                amount: 200,
            },
            AmountRow::blank(),
            AmountRow::blank(),
        ],
    )]]);
    assert_eq!(
        form.amounts("ingredients", 1).unwrap(),
        [(IngredientId::from(3), 200)]
    );
}

#[test]
fn amounts_require_minimum_and_known_ingredient() {
    let mut form = Form::new(vec![vec![Field::amounts(
        "ingredients",
        "Ingredients",
        1,
        vec![AmountRow::blank(), AmountRow::blank()],
    )]]);
    let error = form.amounts("ingredients", 1).unwrap_err();
    assert_eq!(error.message, "Please submit at least 1 form.");

    let Some(Field {
        value: Value::Amounts(rows),
        ..
    }) = form.field_mut("ingredients")
    else {
        panic!("missing inline field");
    };
    rows[0].name = "unobtainium".into();
    let error = form.amounts("ingredients", 1).unwrap_err();
    assert!(error.message.contains("unobtainium"));
}

#[test]
fn accessors_default_when_missing() {
    let form = Form::new(vec![vec![
        Field::text("name", "Name", "Soup"),
        Field::number("cooking_time", "Cooking time", 20),
    ]]);
    assert_eq!(form.text("name"), "Soup");
    assert_eq!(form.number("cooking_time"), 20);
    assert_eq!(form.text("missing"), "");
    assert_eq!(form.choice("author"), None);
    assert_eq!(form.required_choice("author").unwrap_err().field, "author");
}
