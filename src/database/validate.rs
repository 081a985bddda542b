// Copyright 2023 Remi Bernotavicius

use super::error::ValidationError;
use super::models::{
    NewIngredient, NewIngredientAmount, NewRecipe, NewTag, NewUser, MAX_LEN,
};

pub const MIN_COOKING_TIME: i32 = 1;
pub const MIN_AMOUNT: i32 = 1;
pub const MAX_AMOUNT: i32 = 10000;

type Result = std::result::Result<(), ValidationError>;

pub trait Validate {
    fn validate(&self) -> Result;
}

pub fn required(field: &'static str, value: &str) -> Result {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "This field is required."));
    }
    Ok(())
}

pub fn max_length(field: &'static str, value: &str, limit: usize) -> Result {
    let len = value.chars().count();
    if len > limit {
        return Err(ValidationError::new(
            field,
            format!("Ensure this value has at most {limit} characters (it has {len})."),
        ));
    }
    Ok(())
}

fn char_field(field: &'static str, value: &str) -> Result {
    required(field, value)?;
    max_length(field, value, MAX_LEN)
}

pub fn min_value(field: &'static str, value: i32, min: i32, message: &str) -> Result {
    if value < min {
        return Err(ValidationError::new(field, message));
    }
    Ok(())
}

pub fn max_value(field: &'static str, value: i32, max: i32, message: &str) -> Result {
    if value > max {
        return Err(ValidationError::new(field, message));
    }
    Ok(())
}

const DOMAIN_ALLOWLIST: &[&str] = &["localhost"];

pub fn email(field: &'static str, value: &str) -> Result {
    let invalid = || ValidationError::new(field, "Enter a valid email address.");

    let (local, domain) = value.rsplit_once('@').ok_or_else(invalid)?;
    // Dotless domains are only accepted from the allowlist.
    let domain_ok = DOMAIN_ALLOWLIST.contains(&domain)
        || (domain.contains('.')
            && !domain.starts_with('.')
            && !domain.ends_with('.')
            && !domain.contains(".."));
    let well_formed = !local.is_empty()
        && !local.contains('@')
        && !value.chars().any(char::is_whitespace)
        && domain_ok;
    if !well_formed {
        return Err(invalid());
    }
    Ok(())
}

pub fn slug(field: &'static str, value: &str) -> Result {
    let valid = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid {
        return Err(ValidationError::new(
            field,
            "Enter a valid \"slug\" consisting of letters, numbers, underscores or hyphens.",
        ));
    }
    Ok(())
}

pub fn measurement_unit_name(name: &str) -> Result {
    char_field("name", name)
}

impl Validate for NewUser<'_> {
    fn validate(&self) -> Result {
        char_field("username", self.username)?;
        char_field("email", self.email)?;
        email("email", self.email)?;
        char_field("first_name", self.first_name)?;
        char_field("last_name", self.last_name)
    }
}

impl Validate for NewTag<'_> {
    fn validate(&self) -> Result {
        char_field("name", self.name)?;
        max_length("slug", self.slug, MAX_LEN)?;
        slug("slug", self.slug)
    }
}

impl Validate for NewIngredient<'_> {
    fn validate(&self) -> Result {
        char_field("name", self.name)
    }
}

impl Validate for NewRecipe<'_> {
    fn validate(&self) -> Result {
        char_field("name", self.name)?;
        required("text", self.text)?;
        required("image", self.image)?;
        min_value(
            "cooking_time",
            self.cooking_time,
            MIN_COOKING_TIME,
            "Minimum 1 minute",
        )
    }
}

impl Validate for NewIngredientAmount {
    fn validate(&self) -> Result {
        min_value("amount", self.amount, MIN_AMOUNT, "Minimum 1")?;
        max_value("amount", self.amount, MAX_AMOUNT, "Maximum 10000")
    }
}

#[test]
fn email_addresses() {
    assert!(email("email", "cook@foodgram.example").is_ok());
    assert!(email("email", "first.last@mail.co.uk").is_ok());
    assert!(email("email", "admin@localhost").is_ok());

    for bad in ["", "cook", "@foodgram.example", "cook@", "cook@intranet", "a b@c.d", "a@b..c"] {
        assert!(email("email", bad).is_err(), "{bad:?} should be rejected");
    }
}

#[test]
fn slugs() {
    assert!(slug("slug", "breakfast").is_ok());
    assert!(slug("slug", "late_night-snacks2").is_ok());
    assert!(slug("slug", "").is_err());
    assert!(slug("slug", "with space").is_err());
    assert!(slug("slug", "завтрак").is_err());
}

#[test]
fn recipe_bounds() {
    let mut recipe = NewRecipe {
        author_id: 1.into(),
        name: "Borscht",
        image: "recipes/images/borscht.png",
        text: "Boil the beets.",
        cooking_time: 1,
    };
    assert!(recipe.validate().is_ok());

    recipe.cooking_time = 0;
    let error = recipe.validate().unwrap_err();
    assert_eq!(error.field, "cooking_time");

    recipe.cooking_time = 90;
    recipe.name = "";
    assert_eq!(recipe.validate().unwrap_err().field, "name");

    let long_name = "x".repeat(MAX_LEN + 1);
    recipe.name = &long_name;
    assert_eq!(recipe.validate().unwrap_err().field, "name");
}

#[test]
fn amount_bounds() {
    let amount = |amount| NewIngredientAmount {
        recipe_id: 1.into(),
        ingredient_id: 1.into(),
        amount,
    };
    assert!(amount(MIN_AMOUNT).validate().is_ok());
    assert!(amount(MAX_AMOUNT).validate().is_ok());
    assert!(amount(0).validate().is_err());
    assert!(amount(MAX_AMOUNT + 1).validate().is_err());
}

#[test]
fn user_fields() {
    let user = NewUser {
        username: "chef",
        email: "chef@foodgram.example",
        first_name: "Julia",
        last_name: "Child",
    };
    assert!(user.validate().is_ok());

    let user = NewUser {
        last_name: " ",
        ..user
    };
    assert_eq!(user.validate().unwrap_err().field, "last_name");
}
