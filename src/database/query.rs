// Copyright 2023 Remi Bernotavicius

use super::models::{
    FavoriteRecipe, FavoriteRecipeId, Ingredient, IngredientAmount, IngredientAmountId,
    IngredientHandle, IngredientId, MeasurementUnit, MeasurementUnitId, NewFavoriteRecipe,
    NewIngredient, NewIngredientAmount, NewRecipe, NewShoppingCart, NewSubscribe, NewTag, NewUser,
    Recipe, RecipeHandle, RecipeId, ShoppingCart, ShoppingCartId, Subscribe, SubscribeId, Tag,
    TagId, User, UserId,
};
use super::schema;
use super::validate::{self, Validate as _};
use super::{Connection, Error, Result};
use diesel::prelude::Connection as _;
use diesel::prelude::OptionalExtension as _;
use diesel::ExpressionMethods as _;
use diesel::JoinOnDsl as _;
use diesel::QueryDsl as _;
use diesel::RunQueryDsl as _;
use diesel::SelectableHelper as _;
use std::collections::{BTreeSet, HashMap};

fn expect_affected(rows: usize) -> Result<()> {
    if rows == 0 {
        return Err(Error::NotFound);
    }
    Ok(())
}

pub fn add_user(conn: &mut Connection, new_user: &NewUser<'_>) -> Result<UserId> {
    use schema::users::dsl::*;

    new_user.validate()?;
    let new_id = diesel::insert_into(users)
        .values(new_user)
        .returning(id)
        .get_result(conn)?;
    log::info!("added user {:?} as {new_id}", new_user.username);
    Ok(new_id)
}

pub fn update_user(conn: &mut Connection, user_id: UserId, changes: &NewUser<'_>) -> Result<()> {
    use schema::users::dsl::*;

    changes.validate()?;
    let rows = diesel::update(users.filter(id.eq(user_id)))
        .set(changes)
        .execute(conn)?;
    expect_affected(rows)
}

pub fn delete_user(conn: &mut Connection, user_id: UserId) -> Result<()> {
    use schema::users::dsl::*;

    let rows = diesel::delete(users.filter(id.eq(user_id))).execute(conn)?;
    expect_affected(rows)?;
    log::info!("deleted user {user_id}");
    Ok(())
}

pub fn get_user(conn: &mut Connection, user_id: UserId) -> Result<User> {
    use schema::users::dsl::*;

    Ok(users
        .select(User::as_select())
        .filter(id.eq(user_id))
        .get_result(conn)?)
}

pub fn find_user_by_username(conn: &mut Connection, name: &str) -> Result<Option<User>> {
    use schema::users::dsl::*;

    Ok(users
        .select(User::as_select())
        .filter(username.eq(name))
        .get_result(conn)
        .optional()?)
}

pub fn all_users(conn: &mut Connection) -> Result<Vec<User>> {
    use schema::users::dsl::*;

    Ok(users
        .select(User::as_select())
        .order_by(username.asc())
        .load(conn)?)
}

pub fn subscribe(conn: &mut Connection, follower: UserId, author: UserId) -> Result<SubscribeId> {
    add_subscription(
        conn,
        &NewSubscribe {
            user_id: follower,
            author_id: author,
        },
    )
}

pub fn add_subscription(conn: &mut Connection, new: &NewSubscribe) -> Result<SubscribeId> {
    use schema::subscriptions::dsl::*;

    Ok(diesel::insert_into(subscriptions)
        .values(new)
        .returning(id)
        .get_result(conn)?)
}

pub fn update_subscription(
    conn: &mut Connection,
    subscription_id: SubscribeId,
    changes: &NewSubscribe,
) -> Result<()> {
    use schema::subscriptions::dsl::*;

    let rows = diesel::update(subscriptions.filter(id.eq(subscription_id)))
        .set(changes)
        .execute(conn)?;
    expect_affected(rows)
}

pub fn delete_subscription(conn: &mut Connection, subscription_id: SubscribeId) -> Result<()> {
    use schema::subscriptions::dsl::*;

    let rows = diesel::delete(subscriptions.filter(id.eq(subscription_id))).execute(conn)?;
    expect_affected(rows)
}

/// Returns whether a subscription existed.
pub fn unsubscribe(conn: &mut Connection, follower: UserId, author: UserId) -> Result<bool> {
    use schema::subscriptions::dsl::*;

    let rows = diesel::delete(
        subscriptions
            .filter(user_id.eq(follower))
            .filter(author_id.eq(author)),
    )
    .execute(conn)?;
    Ok(rows > 0)
}

pub fn get_subscription(conn: &mut Connection, subscription_id: SubscribeId) -> Result<Subscribe> {
    use schema::subscriptions::dsl::*;

    Ok(subscriptions
        .select(Subscribe::as_select())
        .filter(id.eq(subscription_id))
        .get_result(conn)?)
}

/// Newest first.
pub fn all_subscriptions(conn: &mut Connection) -> Result<Vec<Subscribe>> {
    use schema::subscriptions::dsl::*;

    Ok(subscriptions
        .select(Subscribe::as_select())
        .order_by(id.desc())
        .load(conn)?)
}

/// The authors `follower` is subscribed to.
pub fn following(conn: &mut Connection, follower: UserId) -> Result<Vec<User>> {
    use schema::{subscriptions, users};

    Ok(subscriptions::table
        .inner_join(users::table.on(users::id.eq(subscriptions::author_id)))
        .filter(subscriptions::user_id.eq(follower))
        .select(User::as_select())
        .order_by(users::username.asc())
        .load(conn)?)
}

/// The users subscribed to `author`.
pub fn subscribers(conn: &mut Connection, author: UserId) -> Result<Vec<User>> {
    use schema::{subscriptions, users};

    Ok(subscriptions::table
        .inner_join(users::table.on(users::id.eq(subscriptions::user_id)))
        .filter(subscriptions::author_id.eq(author))
        .select(User::as_select())
        .order_by(users::username.asc())
        .load(conn)?)
}

pub fn add_tag(conn: &mut Connection, new_tag: &NewTag<'_>) -> Result<TagId> {
    use schema::tags::dsl::*;

    new_tag.validate()?;
    Ok(diesel::insert_into(tags)
        .values(new_tag)
        .returning(id)
        .get_result(conn)?)
}

pub fn update_tag(conn: &mut Connection, tag_id: TagId, changes: &NewTag<'_>) -> Result<()> {
    use schema::tags::dsl::*;

    changes.validate()?;
    let rows = diesel::update(tags.filter(id.eq(tag_id)))
        .set(changes)
        .execute(conn)?;
    expect_affected(rows)
}

pub fn delete_tag(conn: &mut Connection, tag_id: TagId) -> Result<()> {
    use schema::tags::dsl::*;

    let rows = diesel::delete(tags.filter(id.eq(tag_id))).execute(conn)?;
    expect_affected(rows)
}

pub fn get_tag(conn: &mut Connection, tag_id: TagId) -> Result<Tag> {
    use schema::tags::dsl::*;

    Ok(tags
        .select(Tag::as_select())
        .filter(id.eq(tag_id))
        .get_result(conn)?)
}

pub fn all_tags(conn: &mut Connection) -> Result<Vec<Tag>> {
    use schema::tags::dsl::*;

    Ok(tags.select(Tag::as_select()).order_by(name.asc()).load(conn)?)
}

pub fn add_measurement_unit(conn: &mut Connection, new_name: &str) -> Result<MeasurementUnitId> {
    use schema::measurement_units::dsl::*;

    validate::measurement_unit_name(new_name)?;
    Ok(diesel::insert_into(measurement_units)
        .values(name.eq(new_name))
        .returning(id)
        .get_result(conn)?)
}

pub fn get_or_add_measurement_unit(
    conn: &mut Connection,
    unit_name: &str,
) -> Result<MeasurementUnitId> {
    use schema::measurement_units::dsl::*;

    let existing = measurement_units
        .select(id)
        .filter(name.eq(unit_name))
        .get_result(conn)
        .optional()?;
    match existing {
        Some(existing) => Ok(existing),
        None => add_measurement_unit(conn, unit_name),
    }
}

pub fn update_measurement_unit(
    conn: &mut Connection,
    unit_id: MeasurementUnitId,
    new_name: &str,
) -> Result<()> {
    use schema::measurement_units::dsl::*;

    validate::measurement_unit_name(new_name)?;
    let rows = diesel::update(measurement_units.filter(id.eq(unit_id)))
        .set(name.eq(new_name))
        .execute(conn)?;
    expect_affected(rows)
}

/// Fails with a foreign key integrity error while ingredients still use the unit.
pub fn delete_measurement_unit(conn: &mut Connection, unit_id: MeasurementUnitId) -> Result<()> {
    use schema::measurement_units::dsl::*;

    let rows = diesel::delete(measurement_units.filter(id.eq(unit_id))).execute(conn)?;
    expect_affected(rows)
}

pub fn get_measurement_unit(
    conn: &mut Connection,
    unit_id: MeasurementUnitId,
) -> Result<MeasurementUnit> {
    use schema::measurement_units::dsl::*;

    Ok(measurement_units
        .select(MeasurementUnit::as_select())
        .filter(id.eq(unit_id))
        .get_result(conn)?)
}

pub fn all_measurement_units(conn: &mut Connection) -> Result<Vec<MeasurementUnit>> {
    use schema::measurement_units::dsl::*;

    Ok(measurement_units
        .select(MeasurementUnit::as_select())
        .order_by(name.asc())
        .load(conn)?)
}

pub fn add_ingredient(conn: &mut Connection, new: &NewIngredient<'_>) -> Result<IngredientId> {
    use schema::ingredients::dsl::*;

    new.validate()?;
    Ok(diesel::insert_into(ingredients)
        .values(new)
        .returning(id)
        .get_result(conn)?)
}

/// Inserts the ingredient unless the same (name, unit) pair is already stored.
/// Returns whether a row was added.
pub fn add_ingredient_if_missing(conn: &mut Connection, new: &NewIngredient<'_>) -> Result<bool> {
    use schema::ingredients::dsl::*;

    new.validate()?;
    let rows = diesel::insert_or_ignore_into(ingredients)
        .values(new)
        .execute(conn)?;
    Ok(rows > 0)
}

pub fn update_ingredient(
    conn: &mut Connection,
    ingredient_id: IngredientId,
    changes: &NewIngredient<'_>,
) -> Result<()> {
    use schema::ingredients::dsl::*;

    changes.validate()?;
    let rows = diesel::update(ingredients.filter(id.eq(ingredient_id)))
        .set(changes)
        .execute(conn)?;
    expect_affected(rows)
}

pub fn delete_ingredient(conn: &mut Connection, ingredient_id: IngredientId) -> Result<()> {
    use schema::ingredients::dsl::*;

    let rows = diesel::delete(ingredients.filter(id.eq(ingredient_id))).execute(conn)?;
    expect_affected(rows)
}

pub fn get_ingredient(conn: &mut Connection, ingredient_id: IngredientId) -> Result<Ingredient> {
    use schema::ingredients::dsl::*;

    Ok(ingredients
        .select(Ingredient::as_select())
        .filter(id.eq(ingredient_id))
        .get_result(conn)?)
}

fn into_handles(rows: Vec<(IngredientId, String, String)>) -> Vec<IngredientHandle> {
    rows.into_iter()
        .map(|(id, name, measurement_unit)| IngredientHandle {
            id,
            name,
            measurement_unit,
        })
        .collect()
}

pub fn all_ingredients(conn: &mut Connection) -> Result<Vec<IngredientHandle>> {
    use schema::{ingredients, measurement_units};

    let rows = ingredients::table
        .inner_join(measurement_units::table)
        .select((ingredients::id, ingredients::name, measurement_units::name))
        .order_by(ingredients::id.asc())
        .load(conn)?;
    Ok(into_handles(rows))
}

/// Ingredients whose name contains `query`, case-insensitively. SQLite's
/// `LIKE` only folds ASCII, so matching happens here.
pub fn search_ingredients(
    conn: &mut Connection,
    query: &str,
    limit: i64,
) -> Result<Vec<IngredientHandle>> {
    use schema::{ingredients, measurement_units};

    let query = query.to_lowercase();
    let limit = usize::try_from(limit).unwrap_or(0);
    let rows: Vec<(IngredientId, String, String)> = ingredients::table
        .inner_join(measurement_units::table)
        .select((ingredients::id, ingredients::name, measurement_units::name))
        .order_by(ingredients::name.asc())
        .load(conn)?;
    Ok(into_handles(
        rows.into_iter()
            .filter(|(_, name, _)| name.to_lowercase().contains(&query))
            .take(limit)
            .collect(),
    ))
}

pub fn add_recipe(
    conn: &mut Connection,
    new_recipe: &NewRecipe<'_>,
    recipe_tags: &[TagId],
    amounts: &[(IngredientId, i32)],
) -> Result<RecipeId> {
    use schema::recipes::dsl::*;

    new_recipe.validate()?;
    let recipe_id = conn.transaction(|conn| {
        let new_id = diesel::insert_into(recipes)
            .values(new_recipe)
            .returning(id)
            .get_result(conn)?;
        set_recipe_tags(conn, new_id, recipe_tags)?;
        set_recipe_ingredients(conn, new_id, amounts)?;
        Ok::<_, Error>(new_id)
    })?;
    log::info!("added recipe {:?} as {recipe_id}", new_recipe.name);
    Ok(recipe_id)
}

/// Replaces the whole recipe record, its tags and its ingredient amounts.
pub fn update_recipe(
    conn: &mut Connection,
    recipe_id: RecipeId,
    changes: &NewRecipe<'_>,
    recipe_tags: &[TagId],
    amounts: &[(IngredientId, i32)],
) -> Result<()> {
    use schema::recipes::dsl::*;

    changes.validate()?;
    conn.transaction(|conn| {
        let rows = diesel::update(recipes.filter(id.eq(recipe_id)))
            .set(changes)
            .execute(conn)?;
        expect_affected(rows)?;
        set_recipe_tags(conn, recipe_id, recipe_tags)?;
        set_recipe_ingredients(conn, recipe_id, amounts)
    })
}

pub fn set_recipe_tags(conn: &mut Connection, recipe: RecipeId, new_tags: &[TagId]) -> Result<()> {
    use schema::recipe_tags::dsl::*;

    let unique: BTreeSet<TagId> = new_tags.iter().copied().collect();
    let rows: Vec<_> = unique
        .into_iter()
        .map(|tag| (recipe_id.eq(recipe), tag_id.eq(tag)))
        .collect();

    conn.transaction(|conn| {
        diesel::delete(recipe_tags.filter(recipe_id.eq(recipe))).execute(conn)?;
        if !rows.is_empty() {
            diesel::insert_into(recipe_tags).values(rows).execute(conn)?;
        }
        Ok(())
    })
}

pub fn set_recipe_ingredients(
    conn: &mut Connection,
    recipe: RecipeId,
    amounts: &[(IngredientId, i32)],
) -> Result<()> {
    use schema::ingredient_amounts::dsl::*;

    let rows: Vec<NewIngredientAmount> = amounts
        .iter()
        .map(|&(ingredient, value)| NewIngredientAmount {
            recipe_id: recipe,
            ingredient_id: ingredient,
            amount: value,
        })
        .collect();
    for row in &rows {
        row.validate()?;
    }

    conn.transaction(|conn| {
        diesel::delete(ingredient_amounts.filter(recipe_id.eq(recipe))).execute(conn)?;
        for row in &rows {
            diesel::insert_into(ingredient_amounts)
                .values(row)
                .execute(conn)?;
        }
        Ok(())
    })
}

pub fn delete_recipe(conn: &mut Connection, recipe_id: RecipeId) -> Result<()> {
    use schema::recipes::dsl::*;

    let rows = diesel::delete(recipes.filter(id.eq(recipe_id))).execute(conn)?;
    expect_affected(rows)?;
    log::info!("deleted recipe {recipe_id}");
    Ok(())
}

pub fn get_recipe(conn: &mut Connection, recipe_id: RecipeId) -> Result<Recipe> {
    use schema::recipes::dsl::*;

    Ok(recipes
        .select(Recipe::as_select())
        .filter(id.eq(recipe_id))
        .get_result(conn)?)
}

pub fn all_recipes(conn: &mut Connection) -> Result<Vec<RecipeHandle>> {
    use schema::recipes::dsl::*;

    Ok(recipes
        .select(RecipeHandle::as_select())
        .order_by(name.asc())
        .load(conn)?)
}

/// Newest first.
pub fn recipes_by_date(conn: &mut Connection) -> Result<Vec<Recipe>> {
    use schema::recipes::dsl::*;

    Ok(recipes
        .select(Recipe::as_select())
        .order_by((pub_date.desc(), id.desc()))
        .load(conn)?)
}

/// (recipe, tag name) for every tag link.
pub fn all_recipe_tag_names(conn: &mut Connection) -> Result<Vec<(RecipeId, String)>> {
    use schema::{recipe_tags, tags};

    Ok(recipe_tags::table
        .inner_join(tags::table)
        .select((recipe_tags::recipe_id, tags::name))
        .order_by(tags::name.asc())
        .load(conn)?)
}

pub fn recipe_tags(conn: &mut Connection, recipe: RecipeId) -> Result<Vec<Tag>> {
    use schema::{recipe_tags, tags};

    Ok(recipe_tags::table
        .inner_join(tags::table)
        .filter(recipe_tags::recipe_id.eq(recipe))
        .select(Tag::as_select())
        .order_by(tags::name.asc())
        .load(conn)?)
}

pub fn recipe_ingredients(
    conn: &mut Connection,
    recipe: RecipeId,
) -> Result<Vec<(IngredientAmount, IngredientHandle)>> {
    use schema::{ingredient_amounts, ingredients, measurement_units};

    let rows: Vec<(IngredientAmount, String, String)> = ingredient_amounts::table
        .inner_join(ingredients::table.inner_join(measurement_units::table))
        .filter(ingredient_amounts::recipe_id.eq(recipe))
        .select((
            IngredientAmount::as_select(),
            ingredients::name,
            measurement_units::name,
        ))
        .order_by(ingredient_amounts::id.asc())
        .load(conn)?;
    Ok(rows
        .into_iter()
        .map(|(amount, name, measurement_unit)| {
            let handle = IngredientHandle {
                id: amount.ingredient_id,
                name,
                measurement_unit,
            };
            (amount, handle)
        })
        .collect())
}

pub fn add_ingredient_amount(
    conn: &mut Connection,
    new: &NewIngredientAmount,
) -> Result<IngredientAmountId> {
    use schema::ingredient_amounts::dsl::*;

    new.validate()?;
    Ok(diesel::insert_into(ingredient_amounts)
        .values(new)
        .returning(id)
        .get_result(conn)?)
}

pub fn update_ingredient_amount(
    conn: &mut Connection,
    amount_id: IngredientAmountId,
    changes: &NewIngredientAmount,
) -> Result<()> {
    use schema::ingredient_amounts::dsl::*;

    changes.validate()?;
    let rows = diesel::update(ingredient_amounts.filter(id.eq(amount_id)))
        .set(changes)
        .execute(conn)?;
    expect_affected(rows)
}

pub fn delete_ingredient_amount(conn: &mut Connection, amount_id: IngredientAmountId) -> Result<()> {
    use schema::ingredient_amounts::dsl::*;

    let rows = diesel::delete(ingredient_amounts.filter(id.eq(amount_id))).execute(conn)?;
    expect_affected(rows)
}

pub fn get_ingredient_amount(
    conn: &mut Connection,
    amount_id: IngredientAmountId,
) -> Result<IngredientAmount> {
    use schema::ingredient_amounts::dsl::*;

    Ok(ingredient_amounts
        .select(IngredientAmount::as_select())
        .filter(id.eq(amount_id))
        .get_result(conn)?)
}

pub fn all_ingredient_amounts(conn: &mut Connection) -> Result<Vec<IngredientAmount>> {
    use schema::ingredient_amounts::dsl::*;

    Ok(ingredient_amounts
        .select(IngredientAmount::as_select())
        .order_by(id.asc())
        .load(conn)?)
}

pub fn add_favorite(
    conn: &mut Connection,
    user: UserId,
    recipe: RecipeId,
) -> Result<FavoriteRecipeId> {
    use schema::favorite_recipes::dsl::*;

    let new = NewFavoriteRecipe {
        user_id: user,
        recipe_id: recipe,
    };
    Ok(diesel::insert_into(favorite_recipes)
        .values(&new)
        .returning(id)
        .get_result(conn)?)
}

pub fn update_favorite(
    conn: &mut Connection,
    favorite_id: FavoriteRecipeId,
    changes: &NewFavoriteRecipe,
) -> Result<()> {
    use schema::favorite_recipes::dsl::*;

    let rows = diesel::update(favorite_recipes.filter(id.eq(favorite_id)))
        .set(changes)
        .execute(conn)?;
    expect_affected(rows)
}

pub fn delete_favorite(conn: &mut Connection, favorite_id: FavoriteRecipeId) -> Result<()> {
    use schema::favorite_recipes::dsl::*;

    let rows = diesel::delete(favorite_recipes.filter(id.eq(favorite_id))).execute(conn)?;
    expect_affected(rows)
}

/// Returns whether the recipe was a favorite.
pub fn remove_favorite(conn: &mut Connection, user: UserId, recipe: RecipeId) -> Result<bool> {
    use schema::favorite_recipes::dsl::*;

    let rows = diesel::delete(
        favorite_recipes
            .filter(user_id.eq(user))
            .filter(recipe_id.eq(recipe)),
    )
    .execute(conn)?;
    Ok(rows > 0)
}

pub fn get_favorite(conn: &mut Connection, favorite_id: FavoriteRecipeId) -> Result<FavoriteRecipe> {
    use schema::favorite_recipes::dsl::*;

    Ok(favorite_recipes
        .select(FavoriteRecipe::as_select())
        .filter(id.eq(favorite_id))
        .get_result(conn)?)
}

pub fn favorite_recipes(conn: &mut Connection, user: UserId) -> Result<Vec<RecipeHandle>> {
    use schema::{favorite_recipes, recipes};

    Ok(favorite_recipes::table
        .inner_join(recipes::table)
        .filter(favorite_recipes::user_id.eq(user))
        .select(RecipeHandle::as_select())
        .order_by(recipes::name.asc())
        .load(conn)?)
}

pub fn all_favorites(conn: &mut Connection) -> Result<Vec<FavoriteRecipe>> {
    use schema::favorite_recipes::dsl::*;

    Ok(favorite_recipes
        .select(FavoriteRecipe::as_select())
        .order_by(id.asc())
        .load(conn)?)
}

/// Number of favorites per recipe; recipes nobody favorited are absent.
pub fn favorite_counts(conn: &mut Connection) -> Result<HashMap<RecipeId, i64>> {
    use diesel::dsl::count;
    use schema::favorite_recipes::dsl::*;

    Ok(favorite_recipes
        .group_by(recipe_id)
        .select((recipe_id, count(id)))
        .load::<(RecipeId, i64)>(conn)?
        .into_iter()
        .collect())
}

pub fn add_to_cart(conn: &mut Connection, user: UserId, recipe: RecipeId) -> Result<ShoppingCartId> {
    use schema::shopping_carts::dsl::*;

    let new = NewShoppingCart {
        user_id: user,
        recipe_id: recipe,
    };
    Ok(diesel::insert_into(shopping_carts)
        .values(&new)
        .returning(id)
        .get_result(conn)?)
}

pub fn update_cart_entry(
    conn: &mut Connection,
    entry_id: ShoppingCartId,
    changes: &NewShoppingCart,
) -> Result<()> {
    use schema::shopping_carts::dsl::*;

    let rows = diesel::update(shopping_carts.filter(id.eq(entry_id)))
        .set(changes)
        .execute(conn)?;
    expect_affected(rows)
}

pub fn delete_cart_entry(conn: &mut Connection, entry_id: ShoppingCartId) -> Result<()> {
    use schema::shopping_carts::dsl::*;

    let rows = diesel::delete(shopping_carts.filter(id.eq(entry_id))).execute(conn)?;
    expect_affected(rows)
}

/// Returns whether the recipe was in the cart.
pub fn remove_from_cart(conn: &mut Connection, user: UserId, recipe: RecipeId) -> Result<bool> {
    use schema::shopping_carts::dsl::*;

    let rows = diesel::delete(
        shopping_carts
            .filter(user_id.eq(user))
            .filter(recipe_id.eq(recipe)),
    )
    .execute(conn)?;
    Ok(rows > 0)
}

pub fn get_cart_entry(conn: &mut Connection, entry_id: ShoppingCartId) -> Result<ShoppingCart> {
    use schema::shopping_carts::dsl::*;

    Ok(shopping_carts
        .select(ShoppingCart::as_select())
        .filter(id.eq(entry_id))
        .get_result(conn)?)
}

pub fn all_cart_entries(conn: &mut Connection) -> Result<Vec<ShoppingCart>> {
    use schema::shopping_carts::dsl::*;

    Ok(shopping_carts
        .select(ShoppingCart::as_select())
        .order_by(id.asc())
        .load(conn)?)
}

pub fn cart_recipes(conn: &mut Connection, user: UserId) -> Result<Vec<RecipeHandle>> {
    use schema::{recipes, shopping_carts};

    Ok(shopping_carts::table
        .inner_join(recipes::table)
        .filter(shopping_carts::user_id.eq(user))
        .select(RecipeHandle::as_select())
        .order_by(recipes::name.asc())
        .load(conn)?)
}

/// Every (ingredient name, measurement unit, amount) used by the recipes in the cart.
pub fn cart_ingredients(conn: &mut Connection, user: UserId) -> Result<Vec<(String, String, i32)>> {
    use schema::{ingredient_amounts, ingredients, measurement_units, shopping_carts};

    let recipes_in_cart: Vec<RecipeId> = shopping_carts::table
        .filter(shopping_carts::user_id.eq(user))
        .select(shopping_carts::recipe_id)
        .load(conn)?;

    Ok(ingredient_amounts::table
        .inner_join(ingredients::table.inner_join(measurement_units::table))
        .filter(ingredient_amounts::recipe_id.eq_any(recipes_in_cart))
        .select((
            ingredients::name,
            measurement_units::name,
            ingredient_amounts::amount,
        ))
        .load(conn)?)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub struct Kitchen {
        pub author: UserId,
        pub reader: UserId,
        pub grams: MeasurementUnitId,
        pub beet: IngredientId,
        pub cabbage: IngredientId,
        pub soup: TagId,
        pub borscht: RecipeId,
    }

    pub fn new_user<'a>(username: &'a str, email: &'a str) -> NewUser<'a> {
        NewUser {
            username,
            email,
            first_name: "Test",
            last_name: "Cook",
        }
    }

    pub fn new_recipe(author_id: UserId, name: &str) -> NewRecipe<'_> {
        NewRecipe {
            author_id,
            name,
            image: "recipes/images/dish.png",
            text: "Cook it.",
            cooking_time: 30,
        }
    }

    pub fn kitchen(conn: &mut Connection) -> Kitchen {
        let author = add_user(conn, &new_user("author", "author@foodgram.example")).unwrap();
        let reader = add_user(conn, &new_user("reader", "reader@foodgram.example")).unwrap();
        let grams = add_measurement_unit(conn, "g").unwrap();
        let beet = add_ingredient(
            conn,
            &NewIngredient {
                name: "beet",
                measurement_unit_id: grams,
            },
        )
        .unwrap();
        let cabbage = add_ingredient(
            conn,
            &NewIngredient {
                name: "cabbage",
                measurement_unit_id: grams,
            },
        )
        .unwrap();
        let soup = add_tag(
            conn,
            &NewTag {
                name: "Soup",
                color: None,
                slug: "soup",
            },
        )
        .unwrap();
        let borscht = add_recipe(
            conn,
            &new_recipe(author, "Borscht"),
            &[soup],
            &[(beet, 300), (cabbage, 200)],
        )
        .unwrap();
        Kitchen {
            author,
            reader,
            grams,
            beet,
            cabbage,
            soup,
            borscht,
        }
    }
}

#[cfg(test)]
use super::IntegrityKind;
#[cfg(test)]
use super::establish_test_connection;

#[cfg(test)]
macro_rules! count_rows {
    ($conn:expr, $table:expr) => {
        $table.count().get_result::<i64>($conn).unwrap()
    };
}

#[test]
fn ingredient_name_and_unit_pair_is_unique() {
    let mut conn = establish_test_connection();
    let k = fixtures::kitchen(&mut conn);

    let error = add_ingredient(
        &mut conn,
        &NewIngredient {
            name: "beet",
            measurement_unit_id: k.grams,
        },
    )
    .unwrap_err();
    assert_eq!(error.integrity_kind(), Some(IntegrityKind::Unique));

    let pieces = add_measurement_unit(&mut conn, "pcs").unwrap();
    add_ingredient(
        &mut conn,
        &NewIngredient {
            name: "beet",
            measurement_unit_id: pieces,
        },
    )
    .unwrap();
}

#[test]
fn recipe_name_and_author_pair_is_unique() {
    let mut conn = establish_test_connection();
    let k = fixtures::kitchen(&mut conn);

    let error = add_recipe(
        &mut conn,
        &fixtures::new_recipe(k.author, "Borscht"),
        &[],
        &[(k.beet, 1)],
    )
    .unwrap_err();
    assert_eq!(error.integrity_kind(), Some(IntegrityKind::Unique));

    add_recipe(
        &mut conn,
        &fixtures::new_recipe(k.reader, "Borscht"),
        &[],
        &[(k.beet, 1)],
    )
    .unwrap();
}

#[test]
fn recipe_check_constraints_hold_without_validation() {
    use schema::recipes;

    let mut conn = establish_test_connection();
    let k = fixtures::kitchen(&mut conn);

    let mut raw = fixtures::new_recipe(k.author, "Pancakes");
    raw.cooking_time = 0;
    let error: Error = diesel::insert_into(recipes::table)
        .values(&raw)
        .execute(&mut conn)
        .unwrap_err()
        .into();
    assert_eq!(error.integrity_kind(), Some(IntegrityKind::Check));

    let mut raw = fixtures::new_recipe(k.author, "");
    raw.cooking_time = 5;
    let error: Error = diesel::insert_into(recipes::table)
        .values(&raw)
        .execute(&mut conn)
        .unwrap_err()
        .into();
    assert_eq!(error.integrity_kind(), Some(IntegrityKind::Check));

    let mut invalid = fixtures::new_recipe(k.author, "Pancakes");
    invalid.cooking_time = 0;
    let error = add_recipe(&mut conn, &invalid, &[], &[]).unwrap_err();
    assert!(matches!(error, Error::Validation(e) if e.field == "cooking_time"));
}

#[test]
fn tag_color_outside_palette_is_rejected() {
    use super::models::TagColor;

    let mut conn = establish_test_connection();

    let error: Error = diesel::sql_query(
        "INSERT INTO tags (name, color, slug) VALUES ('Teal', '#123456', 'teal')",
    )
    .execute(&mut conn)
    .unwrap_err()
    .into();
    assert_eq!(error.integrity_kind(), Some(IntegrityKind::Check));

    diesel::sql_query("INSERT INTO tags (name, color, slug) VALUES ('Plain', NULL, 'plain')")
        .execute(&mut conn)
        .unwrap();
    diesel::sql_query("INSERT INTO tags (name, slug) VALUES ('Fresh', 'fresh')")
        .execute(&mut conn)
        .unwrap();
    let colors: Vec<Option<TagColor>> = all_tags(&mut conn)
        .unwrap()
        .into_iter()
        .map(|t| t.color)
        .collect();
    assert_eq!(colors, [Some(TagColor::Green), None]);
}

#[test]
fn ingredient_amount_pair_is_unique_and_bounded() {
    use schema::ingredient_amounts;

    let mut conn = establish_test_connection();
    let k = fixtures::kitchen(&mut conn);

    let duplicate = NewIngredientAmount {
        recipe_id: k.borscht,
        ingredient_id: k.beet,
        amount: 5,
    };
    let error = add_ingredient_amount(&mut conn, &duplicate).unwrap_err();
    assert_eq!(error.integrity_kind(), Some(IntegrityKind::Unique));

    let error = set_recipe_ingredients(&mut conn, k.borscht, &[(k.beet, 1), (k.beet, 2)])
        .unwrap_err();
    assert_eq!(error.integrity_kind(), Some(IntegrityKind::Unique));

    for amount in [0, validate::MAX_AMOUNT + 1] {
        let error = set_recipe_ingredients(&mut conn, k.borscht, &[(k.beet, amount)])
            .unwrap_err();
        assert!(matches!(error, Error::Validation(_)));

        diesel::delete(ingredient_amounts::table)
            .execute(&mut conn)
            .unwrap();
        let raw = NewIngredientAmount {
            recipe_id: k.borscht,
            ingredient_id: k.beet,
            amount,
        };
        let error: Error = diesel::insert_into(ingredient_amounts::table)
            .values(&raw)
            .execute(&mut conn)
            .unwrap_err()
            .into();
        assert_eq!(error.integrity_kind(), Some(IntegrityKind::Check));
    }
}

#[test]
fn relation_pairs_are_unique() {
    let mut conn = establish_test_connection();
    let k = fixtures::kitchen(&mut conn);

    add_favorite(&mut conn, k.reader, k.borscht).unwrap();
    let error = add_favorite(&mut conn, k.reader, k.borscht).unwrap_err();
    assert_eq!(error.integrity_kind(), Some(IntegrityKind::Unique));

    add_to_cart(&mut conn, k.reader, k.borscht).unwrap();
    let error = add_to_cart(&mut conn, k.reader, k.borscht).unwrap_err();
    assert_eq!(error.integrity_kind(), Some(IntegrityKind::Unique));

    subscribe(&mut conn, k.reader, k.author).unwrap();
    let error = subscribe(&mut conn, k.reader, k.author).unwrap_err();
    assert_eq!(error.integrity_kind(), Some(IntegrityKind::Unique));

    // The reverse direction is a different subscription.
    subscribe(&mut conn, k.author, k.reader).unwrap();
}

#[test]
fn unfavorite_and_remove_from_cart() {
    let mut conn = establish_test_connection();
    let k = fixtures::kitchen(&mut conn);

    add_favorite(&mut conn, k.reader, k.borscht).unwrap();
    add_to_cart(&mut conn, k.reader, k.borscht).unwrap();
    let borscht = get_recipe(&mut conn, k.borscht).unwrap();
    let handle = RecipeHandle {
        id: borscht.id,
        name: borscht.name,
    };
    assert_eq!(favorite_recipes(&mut conn, k.reader).unwrap(), [handle.clone()]);
    assert_eq!(cart_recipes(&mut conn, k.reader).unwrap(), [handle]);
    assert!(favorite_recipes(&mut conn, k.author).unwrap().is_empty());

    assert!(remove_favorite(&mut conn, k.reader, k.borscht).unwrap());
    assert!(!remove_favorite(&mut conn, k.reader, k.borscht).unwrap());
    assert!(favorite_recipes(&mut conn, k.reader).unwrap().is_empty());
    assert_eq!(count_rows!(&mut conn, schema::favorite_recipes::table), 0);

    assert!(remove_from_cart(&mut conn, k.reader, k.borscht).unwrap());
    assert!(!remove_from_cart(&mut conn, k.reader, k.borscht).unwrap());
    assert!(cart_recipes(&mut conn, k.reader).unwrap().is_empty());
    assert!(cart_ingredients(&mut conn, k.reader).unwrap().is_empty());
}

#[test]
fn username_and_email_are_unique() {
    let mut conn = establish_test_connection();
    fixtures::kitchen(&mut conn);

    let error = add_user(
        &mut conn,
        &fixtures::new_user("author", "other@foodgram.example"),
    )
    .unwrap_err();
    assert_eq!(error.integrity_kind(), Some(IntegrityKind::Unique));

    let error = add_user(
        &mut conn,
        &fixtures::new_user("other", "author@foodgram.example"),
    )
    .unwrap_err();
    assert_eq!(error.integrity_kind(), Some(IntegrityKind::Unique));
}

#[test]
fn tag_name_color_and_slug_are_unique() {
    use super::models::TagColor;

    let mut conn = establish_test_connection();
    fixtures::kitchen(&mut conn);

    let salads = NewTag {
        name: "Salads",
        color: Some(TagColor::Green),
        slug: "salads",
    };
    add_tag(&mut conn, &salads).unwrap();

    let same_color = NewTag {
        name: "Greens",
        slug: "greens",
        ..salads
    };
    let error = add_tag(&mut conn, &same_color).unwrap_err();
    assert_eq!(error.integrity_kind(), Some(IntegrityKind::Unique));

    let same_slug = NewTag {
        name: "Greens",
        color: Some(TagColor::Red),
        ..salads
    };
    let error = add_tag(&mut conn, &same_slug).unwrap_err();
    assert_eq!(error.integrity_kind(), Some(IntegrityKind::Unique));

    // Tags without a color don't collide with each other.
    let desserts = NewTag {
        name: "Desserts",
        color: None,
        slug: "desserts",
    };
    let desserts = add_tag(&mut conn, &desserts).unwrap();
    assert_eq!(get_tag(&mut conn, desserts).unwrap().color, None);
}

#[test]
fn deleting_recipe_cascades() {
    use schema::{favorite_recipes, ingredient_amounts, recipe_tags, shopping_carts};

    let mut conn = establish_test_connection();
    let k = fixtures::kitchen(&mut conn);
    add_favorite(&mut conn, k.reader, k.borscht).unwrap();
    add_to_cart(&mut conn, k.reader, k.borscht).unwrap();

    assert_eq!(count_rows!(&mut conn, ingredient_amounts::table), 2);
    delete_recipe(&mut conn, k.borscht).unwrap();

    assert_eq!(count_rows!(&mut conn, ingredient_amounts::table), 0);
    assert_eq!(count_rows!(&mut conn, favorite_recipes::table), 0);
    assert_eq!(count_rows!(&mut conn, shopping_carts::table), 0);
    assert_eq!(count_rows!(&mut conn, recipe_tags::table), 0);

    // The catalogue is untouched.
    get_ingredient(&mut conn, k.beet).unwrap();
    get_tag(&mut conn, k.soup).unwrap();
    assert!(matches!(
        delete_recipe(&mut conn, k.borscht),
        Err(Error::NotFound)
    ));
}

#[test]
fn deleting_user_cascades() {
    use schema::{favorite_recipes, ingredient_amounts, recipes, shopping_carts, subscriptions};

    let mut conn = establish_test_connection();
    let k = fixtures::kitchen(&mut conn);
    let readers_recipe = add_recipe(
        &mut conn,
        &fixtures::new_recipe(k.reader, "Salad"),
        &[],
        &[(k.cabbage, 100)],
    )
    .unwrap();
    add_favorite(&mut conn, k.author, readers_recipe).unwrap();
    add_favorite(&mut conn, k.reader, k.borscht).unwrap();
    add_to_cart(&mut conn, k.author, readers_recipe).unwrap();
    add_to_cart(&mut conn, k.reader, k.borscht).unwrap();
    subscribe(&mut conn, k.reader, k.author).unwrap();
    subscribe(&mut conn, k.author, k.reader).unwrap();

    delete_user(&mut conn, k.author).unwrap();

    let remaining: Vec<RecipeId> = recipes::table
        .select(recipes::id)
        .load(&mut conn)
        .unwrap();
    assert_eq!(remaining, vec![readers_recipe]);
    assert_eq!(count_rows!(&mut conn, ingredient_amounts::table), 1);
    assert_eq!(count_rows!(&mut conn, subscriptions::table), 0);

    // Rows owned by the author, or pointing at the author's recipe, are gone.
    assert_eq!(count_rows!(&mut conn, favorite_recipes::table), 0);
    assert_eq!(count_rows!(&mut conn, shopping_carts::table), 0);
    get_user(&mut conn, k.reader).unwrap();
}

#[test]
fn measurement_unit_in_use_cannot_be_deleted() {
    let mut conn = establish_test_connection();
    let k = fixtures::kitchen(&mut conn);

    let error = delete_measurement_unit(&mut conn, k.grams).unwrap_err();
    assert_eq!(error.integrity_kind(), Some(IntegrityKind::ForeignKey));

    delete_ingredient(&mut conn, k.beet).unwrap();
    delete_ingredient(&mut conn, k.cabbage).unwrap();
    delete_measurement_unit(&mut conn, k.grams).unwrap();
    assert!(recipe_ingredients(&mut conn, k.borscht).unwrap().is_empty());
}

#[test]
fn following_and_subscribers() {
    let mut conn = establish_test_connection();
    let k = fixtures::kitchen(&mut conn);
    let critic = add_user(
        &mut conn,
        &fixtures::new_user("critic", "critic@foodgram.example"),
    )
    .unwrap();
    subscribe(&mut conn, k.reader, k.author).unwrap();
    subscribe(&mut conn, critic, k.author).unwrap();

    let names = |users: Vec<User>| users.into_iter().map(|u| u.username).collect::<Vec<_>>();
    assert_eq!(
        names(subscribers(&mut conn, k.author).unwrap()),
        ["critic", "reader"]
    );
    assert_eq!(names(following(&mut conn, k.reader).unwrap()), ["author"]);
    assert!(following(&mut conn, k.author).unwrap().is_empty());

    assert!(unsubscribe(&mut conn, k.reader, k.author).unwrap());
    assert!(!unsubscribe(&mut conn, k.reader, k.author).unwrap());
    assert_eq!(names(subscribers(&mut conn, k.author).unwrap()), ["critic"]);
}

#[test]
fn update_recipe_replaces_tags_and_amounts() {
    let mut conn = establish_test_connection();
    let k = fixtures::kitchen(&mut conn);
    let before = get_recipe(&mut conn, k.borscht).unwrap();

    let mut changes = fixtures::new_recipe(k.author, "Green borscht");
    changes.cooking_time = 45;
    update_recipe(&mut conn, k.borscht, &changes, &[], &[(k.cabbage, 250)]).unwrap();

    let after = get_recipe(&mut conn, k.borscht).unwrap();
    assert_eq!(after.name, "Green borscht");
    assert_eq!(after.cooking_time, 45);
    assert_eq!(after.pub_date, before.pub_date);
    assert!(recipe_tags(&mut conn, k.borscht).unwrap().is_empty());

    let amounts = recipe_ingredients(&mut conn, k.borscht).unwrap();
    assert_eq!(amounts.len(), 1);
    assert_eq!(amounts[0].0.amount, 250);
    assert_eq!(amounts[0].1.to_string(), "cabbage, g");
}

#[test]
fn favorite_counts_per_recipe() {
    use maplit::hashmap;

    let mut conn = establish_test_connection();
    let k = fixtures::kitchen(&mut conn);
    let salad = add_recipe(
        &mut conn,
        &fixtures::new_recipe(k.reader, "Salad"),
        &[],
        &[],
    )
    .unwrap();
    add_recipe(&mut conn, &fixtures::new_recipe(k.reader, "Toast"), &[], &[]).unwrap();
    add_favorite(&mut conn, k.reader, k.borscht).unwrap();
    add_favorite(&mut conn, k.author, k.borscht).unwrap();
    add_favorite(&mut conn, k.author, salad).unwrap();

    assert_eq!(
        favorite_counts(&mut conn).unwrap(),
        hashmap! { k.borscht => 2, salad => 1 }
    );
}

#[test]
fn search_ingredients_by_substring() {
    let mut conn = establish_test_connection();
    fixtures::kitchen(&mut conn);

    let found = search_ingredients(&mut conn, "AbB", 10).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "cabbage");
    assert_eq!(search_ingredients(&mut conn, "", 1).unwrap().len(), 1);
}

#[test]
fn search_ingredients_folds_cyrillic_case() {
    let mut conn = establish_test_connection();
    let unit = add_measurement_unit(&mut conn, "г").unwrap();
    add_ingredient(
        &mut conn,
        &NewIngredient {
            name: "абрикосовое варенье",
            measurement_unit_id: unit,
        },
    )
    .unwrap();

    let found = search_ingredients(&mut conn, "АБРИКОС", 10).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].to_string(), "абрикосовое варенье, г");
    assert!(search_ingredients(&mut conn, "Варенье", 0).unwrap().is_empty());
}
