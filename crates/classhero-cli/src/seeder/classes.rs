//! Class offerings with their disciplines, teachers and students.

use std::time::Instant;

use rand::Rng;
use rand::seq::SliceRandom;
use rayon::prelude::*;
use sqlx::PgPool;
use uuid::Uuid;

use super::models::{ClassDisciplineSeed, ClassSeed, SeedConfig};
use super::{BATCH_SIZE, SeedResult};

pub fn generate_classes(count: usize) -> Vec<ClassSeed> {
    let suffix: u16 = rand::thread_rng().gen_range(0..1000);

    (0..count)
        .into_par_iter()
        .map(|idx| {
            let semester = (idx % 2) as i32 + 1;
            ClassSeed {
                code: format!("CL{:03}-{:04}", suffix, idx + 1),
                year: 2025,
                semester,
            }
        })
        .collect()
}

/// Picks `per_class` random disciplines for every class, each taught by a
/// random teacher when there are any.
pub fn assign_disciplines(
    class_ids: &[Uuid],
    discipline_ids: &[Uuid],
    teacher_emails: &[String],
    per_class: usize,
) -> Vec<ClassDisciplineSeed> {
    let mut rng = rand::thread_rng();
    let per_class = per_class.min(discipline_ids.len());

    class_ids
        .iter()
        .flat_map(|&class_id| {
            discipline_ids
                .choose_multiple(&mut rng, per_class)
                .map(|&discipline_id| ClassDisciplineSeed {
                    class_id,
                    discipline_id,
                    teacher_email: teacher_emails.choose(&mut rng).cloned(),
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

pub async fn seed_classes(
    db: &PgPool,
    config: &SeedConfig,
    discipline_ids: &[Uuid],
    teacher_emails: &[String],
    student_emails: &[String],
) -> SeedResult<Vec<Uuid>> {
    let start_time = Instant::now();
    println!("🏫 Seeding {} classes...", config.classes);

    let classes = generate_classes(config.classes);
    let mut tx = db.begin().await?;
    let mut class_ids = Vec::with_capacity(classes.len());

    for chunk in classes.chunks(BATCH_SIZE) {
        let mut query = String::from("INSERT INTO classes (code, year, semester) VALUES ");
        for i in 0..chunk.len() {
            if i > 0 {
                query.push_str(", ");
            }
            let idx = i * 3;
            query.push_str(&format!("(${}, ${}, ${})", idx + 1, idx + 2, idx + 3));
        }
        query.push_str(" ON CONFLICT DO NOTHING RETURNING class_id");

        let mut q = sqlx::query_scalar::<_, Uuid>(&query);
        for class in chunk {
            q = q.bind(&class.code).bind(class.year).bind(class.semester);
        }
        class_ids.extend(q.fetch_all(&mut *tx).await?);
    }

    let links = assign_disciplines(
        &class_ids,
        discipline_ids,
        teacher_emails,
        config.disciplines_per_class,
    );
    for chunk in links.chunks(BATCH_SIZE) {
        let mut query = String::from(
            "INSERT INTO class_disciplines (class_id, discipline_id, teacher_email) VALUES ",
        );
        for i in 0..chunk.len() {
            if i > 0 {
                query.push_str(", ");
            }
            let idx = i * 3;
            query.push_str(&format!("(${}, ${}, ${})", idx + 1, idx + 2, idx + 3));
        }

        let mut q = sqlx::query(&query);
        for link in chunk {
            q = q
                .bind(link.class_id)
                .bind(link.discipline_id)
                .bind(&link.teacher_email);
        }
        q.execute(&mut *tx).await?;
    }

    let enrollments: Vec<(Uuid, String)> = {
        let mut rng = rand::thread_rng();
        let per_class = config.students_per_class.min(student_emails.len());
        class_ids
            .iter()
            .flat_map(|&class_id| {
                student_emails
                    .choose_multiple(&mut rng, per_class)
                    .map(|email| (class_id, email.clone()))
                    .collect::<Vec<_>>()
            })
            .collect()
    };
    for chunk in enrollments.chunks(BATCH_SIZE) {
        let mut query = String::from("INSERT INTO class_users (class_id, user_email) VALUES ");
        for i in 0..chunk.len() {
            if i > 0 {
                query.push_str(", ");
            }
            query.push_str(&format!("(${}, ${})", i * 2 + 1, i * 2 + 2));
        }

        let mut q = sqlx::query(&query);
        for (class_id, email) in chunk {
            q = q.bind(class_id).bind(email);
        }
        q.execute(&mut *tx).await?;
    }

    tx.commit().await?;

    println!(
        "   ✓ Inserted {} classes, {} class disciplines and {} enrollments in {:?}",
        class_ids.len(),
        links.len(),
        enrollments.len(),
        start_time.elapsed()
    );

    Ok(class_ids)
}
