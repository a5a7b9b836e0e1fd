use clap::{Parser, Subcommand};
use dialoguer::{Confirm, Input};
use dotenvy::dotenv;

use classhero_cli::seeder::{self, AdminOutcome, SeedConfig};

#[derive(Parser)]
#[command(name = "classhero-cli")]
#[command(about = "ClassHero CLI - Administrative tools for ClassHero", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an administrator, or promote an existing account
    CreateAdmin {
        /// Email address
        #[arg(short = 'e', long)]
        email: Option<String>,

        /// Display name
        #[arg(short = 'n', long)]
        name: Option<String>,
    },
    /// Seed the database with fake courses, disciplines, users and classes
    Seed {
        #[arg(long, default_value = "5")]
        courses: usize,

        #[arg(long, default_value = "20")]
        disciplines: usize,

        #[arg(long, default_value = "10")]
        teachers: usize,

        #[arg(long, default_value = "200")]
        students: usize,

        #[arg(long, default_value = "10")]
        classes: usize,
    },
    /// Clear all data except admin accounts
    ClearSeed {
        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    let cli = Cli::parse();

    let pool = match connect().await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::CreateAdmin { email, name } => handle_create_admin(&pool, email, name).await,
        Commands::Seed {
            courses,
            disciplines,
            teachers,
            students,
            classes,
        } => {
            let config = SeedConfig {
                courses,
                disciplines,
                teachers,
                students,
                classes,
                ..SeedConfig::default()
            };
            seeder::seed_all(&pool, config).await
        }
        Commands::ClearSeed { yes } => handle_clear_seed(&pool, yes).await,
    };

    if let Err(e) = result {
        eprintln!("\n❌ {}", e);
        std::process::exit(1);
    }
}

async fn connect() -> Result<sqlx::PgPool, Box<dyn std::error::Error>> {
    let database_url =
        classhero_db::database_url_from_env().map_err(|_| "DATABASE_URL must be set")?;
    let pool = classhero_db::init_db_pool(&database_url)
        .await
        .map_err(|e| format!("Failed to connect to database: {}", e))?;
    classhero_db::run_migrations(&pool)
        .await
        .map_err(|e| format!("Failed to run migrations: {}", e))?;
    Ok(pool)
}

async fn handle_create_admin(
    pool: &sqlx::PgPool,
    email: Option<String>,
    name: Option<String>,
) -> seeder::SeedResult<()> {
    let email = match email {
        Some(email) => email,
        None => Input::new().with_prompt("Email address").interact_text()?,
    };

    let name = match name {
        Some(name) => name,
        None => Input::new()
            .with_prompt("Name")
            .allow_empty(true)
            .interact_text()?,
    };

    match seeder::create_admin(pool, &email, &name).await? {
        AdminOutcome::Created => println!("\n✅ Admin created successfully!"),
        AdminOutcome::Promoted => println!("\n✅ Existing account promoted to admin"),
    }
    println!("   Email: {}", email.trim().to_lowercase());

    Ok(())
}

async fn handle_clear_seed(pool: &sqlx::PgPool, yes: bool) -> seeder::SeedResult<()> {
    let confirmed = yes
        || Confirm::new()
            .with_prompt("Delete all classes, courses, disciplines and non-admin users?")
            .default(false)
            .interact()?;

    if !confirmed {
        println!("Aborted");
        return Ok(());
    }

    seeder::clear_all(pool).await
}
