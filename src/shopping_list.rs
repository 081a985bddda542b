// Copyright 2023 Remi Bernotavicius

use crate::database::models::User;
use crate::database::{self, query};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Ingredient totals across every recipe in a user's shopping cart.
pub struct ShoppingList {
    username: String,
    items: BTreeMap<(String, String), i64>,
}

impl ShoppingList {
    pub fn new(
        username: impl Into<String>,
        amounts: impl IntoIterator<Item = (String, String, i32)>,
    ) -> Self {
        let mut items = BTreeMap::new();
        for (name, unit, amount) in amounts {
            *items.entry((name, unit)).or_default() += i64::from(amount);
        }
        Self {
            username: username.into(),
            items,
        }
    }

    pub fn for_user(conn: &mut database::Connection, user: &User) -> database::Result<Self> {
        Ok(Self::new(
            &user.username,
            query::cart_ingredients(conn, user.id)?,
        ))
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> impl Iterator<Item = (&str, &str, i64)> {
        self.items
            .iter()
            .map(|((name, unit), amount)| (name.as_str(), unit.as_str(), *amount))
    }

    /// Usernames may hold path separators, so anything outside the characters
    /// a username normally uses becomes `_`.
    pub fn file_name(&self) -> String {
        let username: String = self
            .username
            .chars()
            .map(|c| {
                if c.is_alphanumeric() || matches!(c, '.' | '@' | '+' | '-' | '_') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        format!("shopping-list-{username}.txt")
    }

    /// Where the list is written inside `dir`; always a direct child of it.
    pub fn path_in(&self, dir: &Path) -> PathBuf {
        dir.join(self.file_name())
    }

    pub fn write(&self, path: impl AsRef<Path>) -> crate::Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_string())?;
        log::info!("wrote shopping list to {}", path.display());
        Ok(())
    }
}

impl fmt::Display for ShoppingList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Shopping list for {}", self.username)?;
        writeln!(f)?;
        if self.is_empty() {
            return writeln!(f, "The shopping cart is empty.");
        }
        for (name, unit, amount) in self.items() {
            writeln!(f, "{name} ({unit}): {amount}")?;
        }
        Ok(())
    }
}

fn lookup_user(conn: &mut database::Connection, username: &str) -> crate::Result<User> {
    query::find_user_by_username(conn, username)?
        .ok_or_else(|| format!("no user named {username:?}").into())
}

/// Writes the list under the data directory and opens it.
pub fn generate_and_open(conn: &mut database::Connection, user: &User) -> crate::Result<PathBuf> {
    let list = ShoppingList::for_user(conn, user)?;
    let path = list.path_in(&crate::data_path()?.join("shopping_lists"));
    list.write(&path)?;
    open::that(&path)?;
    Ok(path)
}

pub fn write_shopping_list(
    mut conn: database::Connection,
    username: &str,
    output: Option<PathBuf>,
) -> crate::Result<()> {
    let user = lookup_user(&mut conn, username)?;
    let list = ShoppingList::for_user(&mut conn, &user)?;
    match output {
        Some(path) => list.write(path)?,
        None => print!("{list}"),
    }
    Ok(())
}

#[test]
fn sums_amounts_per_ingredient() {
    use maplit::btreemap;

    let list = ShoppingList::new(
        "reader",
        [
            ("sugar".to_owned(), "g".to_owned(), 100),
            ("eggs".to_owned(), "pcs".to_owned(), 2),
            ("sugar".to_owned(), "g".to_owned(), 50),
            ("sugar".to_owned(), "tbsp".to_owned(), 1),
        ],
    );
    assert_eq!(
        list.items,
        btreemap! {
            ("eggs".to_owned(), "pcs".to_owned()) => 2,
            ("sugar".to_owned(), "g".to_owned()) => 150,
            ("sugar".to_owned(), "tbsp".to_owned()) => 1,
        }
    );
    assert_eq!(
        list.to_string(),
        "Shopping list for reader\n\neggs (pcs): 2\nsugar (g): 150\nsugar (tbsp): 1\n"
    );
}

#[test]
fn file_name_stays_inside_directory() {
    let dir = Path::new("/data/shopping_lists");
    for username in ["../../escape", "a/b\\c", "..", "/etc/passwd"] {
        let list = ShoppingList::new(username, []);
        let path = list.path_in(dir);
        assert_eq!(path.parent(), Some(dir), "{username}");
        assert_eq!(path.components().count(), dir.components().count() + 1);
    }
    assert_eq!(
        ShoppingList::new("../../escape", []).file_name(),
        "shopping-list-.._.._escape.txt"
    );
    assert_eq!(
        ShoppingList::new("cook.name+1@home", []).file_name(),
        "shopping-list-cook.name+1@home.txt"
    );
}

#[test]
fn empty_cart() {
    let list = ShoppingList::new("reader", []);
    assert!(list.is_empty());
    assert!(list.to_string().ends_with("The shopping cart is empty.\n"));
}

#[test]
fn list_from_cart() {
    use crate::database::models::NewRecipe;

    let mut conn = database::establish_test_connection();
    let k = query::fixtures::kitchen(&mut conn);
    let salad = query::add_recipe(
        &mut conn,
        &NewRecipe {
            name: "Salad",
            ..query::fixtures::new_recipe(k.author, "")
        },
        &[],
        &[(k.beet, 50), (k.cabbage, 100)],
    )
    .unwrap();
    query::add_to_cart(&mut conn, k.reader, k.borscht).unwrap();
    query::add_to_cart(&mut conn, k.reader, salad).unwrap();

    let reader = query::get_user(&mut conn, k.reader).unwrap();
    let list = ShoppingList::for_user(&mut conn, &reader).unwrap();
    let items: Vec<_> = list.items().collect();
    assert_eq!(items, [("beet", "g", 350), ("cabbage", "g", 300)]);

    assert!(lookup_user(&mut conn, "nobody").is_err());

    let path = std::env::temp_dir()
        .join(format!("foodgram-{}", std::process::id()))
        .join(list.file_name());
    list.write(&path).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), list.to_string());
    std::fs::remove_dir_all(path.parent().unwrap()).unwrap();
}
