//! Teacher, student and admin accounts.

use std::time::Instant;

use fake::Fake;
use fake::faker::name::en::{FirstName, LastName};
use rayon::prelude::*;
use sqlx::PgPool;

use super::models::UserSeed;
use super::{BATCH_SIZE, SEED_EMAIL_DOMAIN, SeedResult};

/// Outcome of [`create_admin`].
#[derive(Debug, PartialEq, Eq)]
pub enum AdminOutcome {
    Created,
    Promoted,
}

pub fn generate_users(teachers: usize, students: usize) -> Vec<UserSeed> {
    (0..teachers + students)
        .into_par_iter()
        .map(|idx| {
            let is_a_teacher = idx < teachers;
            let first_name: String = FirstName().fake();
            let last_name: String = LastName().fake();
            let role = if is_a_teacher { "teacher" } else { "student" };

            UserSeed {
                email: format!(
                    "{}.{}+{}{}@{}",
                    first_name.to_lowercase(),
                    last_name.to_lowercase(),
                    role,
                    idx,
                    SEED_EMAIL_DOMAIN
                ),
                name: format!("{} {}", first_name, last_name),
                is_a_teacher,
                is_a_student: !is_a_teacher,
            }
        })
        .collect()
}

/// Inserts validated seed accounts. Returns the teacher and student emails
/// that were actually inserted.
pub async fn seed_users(
    db: &PgPool,
    teachers: usize,
    students: usize,
) -> SeedResult<(Vec<String>, Vec<String>)> {
    let start_time = Instant::now();
    println!("👥 Seeding {} teachers and {} students...", teachers, students);

    let users = generate_users(teachers, students);
    let mut tx = db.begin().await?;
    let mut inserted: Vec<(String, bool)> = Vec::with_capacity(users.len());

    for chunk in users.chunks(BATCH_SIZE) {
        let mut query = String::from(
            "INSERT INTO users (email, name, is_a_teacher, is_a_student, is_validated) VALUES ",
        );
        for i in 0..chunk.len() {
            if i > 0 {
                query.push_str(", ");
            }
            let idx = i * 4;
            query.push_str(&format!(
                "(${}, ${}, ${}, ${}, TRUE)",
                idx + 1,
                idx + 2,
                idx + 3,
                idx + 4
            ));
        }
        query.push_str(" ON CONFLICT (email) DO NOTHING RETURNING email, is_a_teacher");

        let mut q = sqlx::query_as::<_, (String, bool)>(&query);
        for user in chunk {
            q = q
                .bind(&user.email)
                .bind(&user.name)
                .bind(user.is_a_teacher)
                .bind(user.is_a_student);
        }
        inserted.extend(q.fetch_all(&mut *tx).await?);
    }

    tx.commit().await?;

    let (teacher_rows, student_rows): (Vec<_>, Vec<_>) =
        inserted.into_iter().partition(|(_, is_a_teacher)| *is_a_teacher);
    let teacher_emails: Vec<String> = teacher_rows.into_iter().map(|(email, _)| email).collect();
    let student_emails: Vec<String> = student_rows.into_iter().map(|(email, _)| email).collect();

    println!(
        "   ✓ Inserted {} teachers and {} students in {:?}",
        teacher_emails.len(),
        student_emails.len(),
        start_time.elapsed()
    );

    Ok((teacher_emails, student_emails))
}

/// Creates a validated admin, or promotes the existing account with that email.
pub async fn create_admin(db: &PgPool, email: &str, name: &str) -> SeedResult<AdminOutcome> {
    let email = email.trim().to_lowercase();
    let name = name.trim();

    let created = sqlx::query_scalar::<_, bool>(
        r#"INSERT INTO users (email, name, is_a_admin, is_validated)
           VALUES ($1, NULLIF($2, ''), TRUE, TRUE)
           ON CONFLICT (email) DO UPDATE
           SET is_a_admin = TRUE,
               is_validated = TRUE,
               name = COALESCE(NULLIF($2, ''), users.name),
               updated_at = NOW()
           RETURNING (xmax = 0)"#,
    )
    .bind(&email)
    .bind(name)
    .fetch_one(db)
    .await?;

    Ok(if created {
        AdminOutcome::Created
    } else {
        AdminOutcome::Promoted
    })
}
