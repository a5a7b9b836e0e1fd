//! Fake data for development databases.
//!
//! Rows are generated in parallel with Rayon and written with multi-row
//! `INSERT` statements, one transaction per entity kind. Seeded accounts use
//! the [`SEED_EMAIL_DOMAIN`] domain and are validated so they can sign in
//! right away.

mod catalog;
mod classes;
mod models;
mod users;

use std::time::Instant;

use sqlx::PgPool;

pub use catalog::{seed_courses, seed_disciplines};
pub use classes::seed_classes;
pub use models::SeedConfig;
pub use users::{AdminOutcome, create_admin, seed_users};

pub type SeedResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Rows per multi-row `INSERT`.
pub(crate) const BATCH_SIZE: usize = 500;

pub const SEED_EMAIL_DOMAIN: &str = "seed.classhero.test";

pub async fn seed_all(db: &PgPool, config: SeedConfig) -> SeedResult<()> {
    let start_time = Instant::now();

    println!("🌱 Starting database seeding...");
    println!(
        "   - {} courses, {} disciplines, {} classes",
        config.courses, config.disciplines, config.classes
    );
    println!(
        "   - {} teachers, {} students",
        config.teachers, config.students
    );
    println!();

    let course_ids = seed_courses(db, config.courses).await?;
    let discipline_ids = seed_disciplines(db, config.disciplines, &course_ids).await?;
    let (teacher_emails, student_emails) =
        seed_users(db, config.teachers, config.students).await?;
    seed_classes(
        db,
        &config,
        &discipline_ids,
        &teacher_emails,
        &student_emails,
    )
    .await?;

    println!("\n✅ Seeding complete in {:?}", start_time.elapsed());
    println!("   Seeded accounts sign in with a code sent to their @{} address", SEED_EMAIL_DOMAIN);

    Ok(())
}

/// Removes classes, the catalog and every non-admin account.
pub async fn clear_all(db: &PgPool) -> SeedResult<()> {
    let start_time = Instant::now();
    println!("🗑️  Clearing seeded data...");

    let mut tx = db.begin().await?;

    // Classes first: class_disciplines restricts discipline deletes.
    let classes = sqlx::query("DELETE FROM classes")
        .execute(&mut *tx)
        .await?
        .rows_affected();
    sqlx::query("DELETE FROM courses_disciplines")
        .execute(&mut *tx)
        .await?;
    let disciplines = sqlx::query("DELETE FROM disciplines")
        .execute(&mut *tx)
        .await?
        .rows_affected();
    let courses = sqlx::query("DELETE FROM courses")
        .execute(&mut *tx)
        .await?
        .rows_affected();
    let users = sqlx::query("DELETE FROM users WHERE NOT is_a_admin")
        .execute(&mut *tx)
        .await?
        .rows_affected();
    sqlx::query("DELETE FROM otps").execute(&mut *tx).await?;

    tx.commit().await?;

    println!(
        "   ✓ Deleted {} classes, {} disciplines, {} courses and {} users in {:?}",
        classes,
        disciplines,
        courses,
        users,
        start_time.elapsed()
    );

    Ok(())
}
