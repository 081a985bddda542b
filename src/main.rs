// Copyright 2023 Remi Bernotavicius

use clap::Parser;
use clap::Subcommand;
use std::path::PathBuf;

mod admin;
mod database;
mod import;
mod shopping_list;
mod ui;

type Error = Box<dyn std::error::Error + Send + Sync + 'static>;
type Result<T> = std::result::Result<T, Error>;

#[derive(Parser, Debug)]
#[command(version, about = "Foodgram administration")]
struct Args {
    /// SQLite database file, created if missing. Defaults to `data.sqlite` in the data directory.
    #[arg(long, global = true, env = "FOODGRAM_DATABASE")]
    database: Option<PathBuf>,

    #[arg(long, global = true, default_value = "info")]
    log_level: log::LevelFilter,

    #[command(subcommand)]
    commands: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Open the admin panel.
    Run,
    /// Load the ingredient catalogue from a JSON file.
    ImportIngredients { path: PathBuf },
    /// Write the summed ingredients of a user's shopping cart.
    ShoppingList {
        username: String,
        /// Print to stdout when not given.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    CreateUser {
        username: String,
        email: String,
        first_name: String,
        last_name: String,
    },
}

/// This is where the database and other user-data lives on-disk. On Linux it should be like:
/// `~/.local/share/foodgram/`
fn data_path() -> Result<PathBuf> {
    let dirs = directories::BaseDirs::new().ok_or("failed to get user home directory")?;
    let path = dirs.data_dir().join("foodgram");
    std::fs::create_dir_all(&path)?;
    Ok(path)
}

fn run(conn: database::Connection) -> Result<()> {
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_maximized(true),
        ..Default::default()
    };
    eframe::run_native(
        admin::SITE_HEADER,
        native_options,
        Box::new(|cc| {
            egui_extras::install_image_loaders(&cc.egui_ctx);
            Ok(Box::new(ui::FoodgramAdmin::new(conn)))
        }),
    )
    .map_err(|e| e.to_string())?;

    Ok(())
}

fn create_user(
    mut conn: database::Connection,
    user: database::models::NewUser<'_>,
) -> Result<()> {
    let id = database::query::add_user(&mut conn, &user)?;
    println!("created user {} with id {id}", user.username);
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    simple_logger::SimpleLogger::new()
        .with_level(args.log_level)
        .env()
        .init()?;

    let database_path = match args.database {
        Some(path) => path,
        None => data_path()?.join("data.sqlite"),
    };
    log::debug!("using database {}", database_path.display());
    let conn = database::establish_connection(database_path)?;

    match args.commands {
        Commands::Run => run(conn)?,
        Commands::ImportIngredients { path } => import::import_ingredients(conn, path)?,
        Commands::ShoppingList { username, output } => {
            shopping_list::write_shopping_list(conn, &username, output)?
        }
        Commands::CreateUser {
            username,
            email,
            first_name,
            last_name,
        } => create_user(
            conn,
            database::models::NewUser {
                username: &username,
                email: &email,
                first_name: &first_name,
                last_name: &last_name,
            },
        )?,
    }
    Ok(())
}
