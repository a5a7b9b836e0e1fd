//! Courses, disciplines and the links between them.

use std::time::Instant;

use fake::Fake;
use fake::faker::company::en::{Buzzword, Industry};
use fake::faker::lorem::en::Sentence;
use rand::Rng;
use rand::seq::SliceRandom;
use rayon::prelude::*;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::models::{CourseSeed, DisciplineSeed};
use super::{BATCH_SIZE, SeedResult};

/// Upper-case initials of up to four words.
pub fn initials(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|word| word.chars().next())
        .filter(|c| c.is_alphanumeric())
        .take(4)
        .collect::<String>()
        .to_uppercase()
}

pub fn generate_courses(count: usize) -> Vec<CourseSeed> {
    (0..count)
        .into_par_iter()
        .map(|idx| {
            let industry: String = Industry().fake();
            let name = format!("{} {}", industry, idx + 1);
            let acronym = format!("{}{}", initials(&industry), idx + 1);

            CourseSeed { name, acronym }
        })
        .collect()
}

pub fn generate_disciplines(count: usize) -> Vec<DisciplineSeed> {
    (0..count)
        .into_par_iter()
        .map(|idx| {
            let topic: String = Buzzword().fake();
            let mut rng = rand::thread_rng();

            DisciplineSeed {
                name: format!("Introduction to {} {}", topic, idx + 1),
                syllabus: Sentence(8..16).fake(),
                workload_hours: rng.gen_range(2..=8) * 10,
            }
        })
        .collect()
}

/// Inserts courses, skipping names or acronyms that already exist.
pub async fn seed_courses(db: &PgPool, count: usize) -> SeedResult<Vec<Uuid>> {
    let start_time = Instant::now();
    println!("📚 Seeding {} courses...", count);

    let courses = generate_courses(count);
    let mut tx = db.begin().await?;
    let mut ids = Vec::with_capacity(courses.len());

    for chunk in courses.chunks(BATCH_SIZE) {
        let mut query = String::from("INSERT INTO courses (name, acronym, status) VALUES ");
        for i in 0..chunk.len() {
            if i > 0 {
                query.push_str(", ");
            }
            query.push_str(&format!("(${}, ${}, 'active')", i * 2 + 1, i * 2 + 2));
        }
        query.push_str(" ON CONFLICT DO NOTHING RETURNING course_id");

        let mut q = sqlx::query_scalar::<_, Uuid>(&query);
        for course in chunk {
            q = q.bind(&course.name).bind(&course.acronym);
        }
        ids.extend(q.fetch_all(&mut *tx).await?);
    }

    tx.commit().await?;

    println!("   ✓ Inserted {} courses in {:?}", ids.len(), start_time.elapsed());

    Ok(ids)
}

/// Inserts disciplines and links each one to one or two random courses.
pub async fn seed_disciplines(
    db: &PgPool,
    count: usize,
    course_ids: &[Uuid],
) -> SeedResult<Vec<Uuid>> {
    let start_time = Instant::now();
    println!("📖 Seeding {} disciplines...", count);

    let disciplines = generate_disciplines(count);
    let mut tx = db.begin().await?;
    let mut ids = Vec::with_capacity(disciplines.len());

    for chunk in disciplines.chunks(BATCH_SIZE) {
        ids.extend(insert_disciplines_chunk(&mut tx, chunk).await?);
    }

    let links: Vec<(Uuid, Uuid)> = {
        let mut rng = rand::thread_rng();
        ids.iter()
            .flat_map(|&discipline_id| {
                let picks = rng.gen_range(1..=2).min(course_ids.len());
                course_ids
                    .choose_multiple(&mut rng, picks)
                    .map(|&course_id| (course_id, discipline_id))
                    .collect::<Vec<_>>()
            })
            .collect()
    };

    for chunk in links.chunks(BATCH_SIZE) {
        let mut query =
            String::from("INSERT INTO courses_disciplines (course_id, discipline_id) VALUES ");
        for i in 0..chunk.len() {
            if i > 0 {
                query.push_str(", ");
            }
            query.push_str(&format!("(${}, ${})", i * 2 + 1, i * 2 + 2));
        }
        query.push_str(" ON CONFLICT DO NOTHING");

        let mut q = sqlx::query(&query);
        for (course_id, discipline_id) in chunk {
            q = q.bind(course_id).bind(discipline_id);
        }
        q.execute(&mut *tx).await?;
    }

    tx.commit().await?;

    println!(
        "   ✓ Inserted {} disciplines and {} course links in {:?}",
        ids.len(),
        links.len(),
        start_time.elapsed()
    );

    Ok(ids)
}

async fn insert_disciplines_chunk(
    tx: &mut Transaction<'_, Postgres>,
    disciplines: &[DisciplineSeed],
) -> SeedResult<Vec<Uuid>> {
    if disciplines.is_empty() {
        return Ok(Vec::new());
    }

    let mut query =
        String::from("INSERT INTO disciplines (name, syllabus, workload_hours) VALUES ");
    for i in 0..disciplines.len() {
        if i > 0 {
            query.push_str(", ");
        }
        let idx = i * 3;
        query.push_str(&format!("(${}, ${}, ${})", idx + 1, idx + 2, idx + 3));
    }
    query.push_str(" RETURNING discipline_id");

    let mut q = sqlx::query_scalar::<_, Uuid>(&query);
    for discipline in disciplines {
        q = q
            .bind(&discipline.name)
            .bind(&discipline.syllabus)
            .bind(discipline.workload_hours);
    }

    Ok(q.fetch_all(&mut **tx).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initials() {
        assert_eq!(initials("Computer Science"), "CS");
        assert_eq!(initials("  applied   mathematics and data  analysis "), "AMAD");
    }

    #[test]
    fn test_generated_courses_are_unique() {
        let courses = generate_courses(50);
        let mut names: Vec<_> = courses.iter().map(|c| c.name.clone()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 50);
    }

    #[test]
    fn test_generated_disciplines_have_workload() {
        for discipline in generate_disciplines(20) {
            assert!(discipline.workload_hours >= 20);
            assert!(discipline.workload_hours <= 80);
        }
    }
}
