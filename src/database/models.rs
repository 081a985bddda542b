// Copyright 2023 Remi Bernotavicius

use derive_more::{Display, From, Into};
use diesel::associations::{Associations, Identifiable};
use diesel::deserialize::Queryable;
use diesel::expression::Selectable;
use diesel::prelude::{AsChangeset, Insertable};
use diesel_derive_enum::DbEnum;
use diesel_derive_newtype::DieselNewType;
use strum::EnumIter;

use crate::database::schema::{
    favorite_recipes, ingredient_amounts, ingredients, measurement_units, recipes, shopping_carts,
    subscriptions, tags, users,
};

/// Upper bound for every character column.
pub const MAX_LEN: usize = 255;

#[derive(
    DieselNewType, Debug, Display, From, Into, Hash, PartialEq, Eq, PartialOrd, Ord, Copy, Clone,
)]
pub struct UserId(i32);

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = users)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl std::fmt::Display for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}", self.username, self.email)
    }
}

#[derive(Insertable, AsChangeset, Debug, Clone, Copy)]
#[diesel(table_name = users)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
}

#[derive(
    DieselNewType, Debug, Display, From, Into, Hash, PartialEq, Eq, PartialOrd, Ord, Copy, Clone,
)]
pub struct SubscribeId(i32);

#[derive(Queryable, Selectable, Identifiable, Associations, Debug, Clone, PartialEq, Eq)]
#[diesel(belongs_to(User))]
#[diesel(table_name = subscriptions)]
pub struct Subscribe {
    pub id: SubscribeId,
    pub user_id: UserId,
    pub author_id: UserId,
    pub created: chrono::NaiveDateTime,
}

#[derive(Insertable, AsChangeset, Debug, Clone, Copy)]
#[diesel(table_name = subscriptions)]
pub struct NewSubscribe {
    pub user_id: UserId,
    pub author_id: UserId,
}

#[derive(
    DieselNewType, Debug, Display, From, Into, Hash, PartialEq, Eq, PartialOrd, Ord, Copy, Clone,
)]
pub struct MeasurementUnitId(i32);

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = measurement_units)]
pub struct MeasurementUnit {
    pub id: MeasurementUnitId,
    pub name: String,
}

/// The fixed palette a tag may be colored with, stored as its hex code.
#[derive(
    Debug, Display, EnumIter, Default, Hash, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, DbEnum,
)]
pub enum TagColor {
    #[display("Blue")]
    #[db_rename = "#0000FF"]
    Blue,
    #[display("Orange")]
    #[db_rename = "#FFA500"]
    Orange,
    #[display("Green")]
    #[db_rename = "#008000"]
    #[default]
    Green,
    #[display("Purple")]
    #[db_rename = "#800080"]
    Purple,
    #[display("Yellow")]
    #[db_rename = "#FFFF00"]
    Yellow,
    #[display("Red")]
    #[db_rename = "#FF0000"]
    Red,
}

impl TagColor {
    pub fn hex(&self) -> &'static str {
        match self {
            Self::Blue => "#0000FF",
            Self::Orange => "#FFA500",
            Self::Green => "#008000",
            Self::Purple => "#800080",
            Self::Yellow => "#FFFF00",
            Self::Red => "#FF0000",
        }
    }

    pub fn rgb(&self) -> [u8; 3] {
        let hex = &self.hex()[1..];
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).unwrap_or(0);
        [channel(0), channel(2), channel(4)]
    }

    pub fn iter() -> impl Iterator<Item = Self> {
        <Self as strum::IntoEnumIterator>::iter()
    }
}

#[derive(
    DieselNewType, Debug, Display, From, Into, Hash, PartialEq, Eq, PartialOrd, Ord, Copy, Clone,
)]
pub struct TagId(i32);

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = tags)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
    pub color: Option<TagColor>,
    pub slug: String,
}

#[derive(Insertable, AsChangeset, Debug, Clone, Copy)]
#[diesel(table_name = tags)]
#[diesel(treat_none_as_null = true, treat_none_as_default_value = false)]
pub struct NewTag<'a> {
    pub name: &'a str,
    pub color: Option<TagColor>,
    pub slug: &'a str,
}

#[derive(
    DieselNewType, Debug, Display, From, Into, Hash, PartialEq, Eq, PartialOrd, Ord, Copy, Clone,
)]
pub struct IngredientId(i32);

#[derive(Queryable, Selectable, Identifiable, Associations, Debug, Clone, PartialEq, Eq)]
#[diesel(belongs_to(MeasurementUnit))]
#[diesel(table_name = ingredients)]
pub struct Ingredient {
    pub id: IngredientId,
    pub name: String,
    pub measurement_unit_id: MeasurementUnitId,
}

#[derive(Insertable, AsChangeset, Debug, Clone, Copy)]
#[diesel(table_name = ingredients)]
pub struct NewIngredient<'a> {
    pub name: &'a str,
    pub measurement_unit_id: MeasurementUnitId,
}

/// An ingredient together with the name of its measurement unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngredientHandle {
    pub id: IngredientId,
    pub name: String,
    pub measurement_unit: String,
}

impl std::fmt::Display for IngredientHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}", self.name, self.measurement_unit)
    }
}

#[derive(
    DieselNewType, Debug, Display, From, Into, Hash, PartialEq, Eq, PartialOrd, Ord, Copy, Clone,
)]
pub struct RecipeId(i32);

#[derive(Associations, Queryable, Selectable, Identifiable, Debug, Clone, PartialEq, Eq)]
#[diesel(belongs_to(User, foreign_key = author_id))]
#[diesel(table_name = recipes)]
pub struct Recipe {
    pub id: RecipeId,
    pub author_id: UserId,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
    pub pub_date: chrono::NaiveDateTime,
}

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = recipes)]
pub struct RecipeHandle {
    pub id: RecipeId,
    pub name: String,
}

#[derive(Insertable, AsChangeset, Debug, Clone, Copy)]
#[diesel(table_name = recipes)]
pub struct NewRecipe<'a> {
    pub author_id: UserId,
    pub name: &'a str,
    pub image: &'a str,
    pub text: &'a str,
    pub cooking_time: i32,
}

#[derive(
    DieselNewType, Debug, Display, From, Into, Hash, PartialEq, Eq, PartialOrd, Ord, Copy, Clone,
)]
pub struct IngredientAmountId(i32);

#[derive(Associations, Queryable, Selectable, Identifiable, Debug, Clone, PartialEq, Eq)]
#[diesel(belongs_to(Recipe))]
#[diesel(belongs_to(Ingredient))]
#[diesel(table_name = ingredient_amounts)]
pub struct IngredientAmount {
    pub id: IngredientAmountId,
    pub recipe_id: RecipeId,
    pub ingredient_id: IngredientId,
    pub amount: i32,
}

#[derive(Insertable, AsChangeset, Debug, Clone, Copy, PartialEq, Eq)]
#[diesel(table_name = ingredient_amounts)]
pub struct NewIngredientAmount {
    pub recipe_id: RecipeId,
    pub ingredient_id: IngredientId,
    pub amount: i32,
}

#[derive(
    DieselNewType, Debug, Display, From, Into, Hash, PartialEq, Eq, PartialOrd, Ord, Copy, Clone,
)]
pub struct FavoriteRecipeId(i32);

#[derive(Associations, Queryable, Selectable, Identifiable, Debug, Clone, PartialEq, Eq)]
#[diesel(belongs_to(User))]
#[diesel(belongs_to(Recipe))]
#[diesel(table_name = favorite_recipes)]
pub struct FavoriteRecipe {
    pub id: FavoriteRecipeId,
    pub user_id: UserId,
    pub recipe_id: RecipeId,
}

#[derive(Insertable, AsChangeset, Debug, Clone, Copy)]
#[diesel(table_name = favorite_recipes)]
pub struct NewFavoriteRecipe {
    pub user_id: UserId,
    pub recipe_id: RecipeId,
}

#[derive(
    DieselNewType, Debug, Display, From, Into, Hash, PartialEq, Eq, PartialOrd, Ord, Copy, Clone,
)]
pub struct ShoppingCartId(i32);

#[derive(Associations, Queryable, Selectable, Identifiable, Debug, Clone, PartialEq, Eq)]
#[diesel(belongs_to(User))]
#[diesel(belongs_to(Recipe))]
#[diesel(table_name = shopping_carts)]
pub struct ShoppingCart {
    pub id: ShoppingCartId,
    pub user_id: UserId,
    pub recipe_id: RecipeId,
}

#[derive(Insertable, AsChangeset, Debug, Clone, Copy)]
#[diesel(table_name = shopping_carts)]
pub struct NewShoppingCart {
    pub user_id: UserId,
    pub recipe_id: RecipeId,
}

#[test]
fn tag_color_hex_codes() {
    assert_eq!(TagColor::default().hex(), "#008000");
    assert_eq!(TagColor::Purple.rgb(), [0x80, 0x00, 0x80]);
    assert_eq!(TagColor::iter().count(), 6);
}
