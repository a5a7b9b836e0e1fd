//! Seed rows and seeding configuration.

use uuid::Uuid;

pub struct CourseSeed {
    pub name: String,
    pub acronym: String,
}

pub struct DisciplineSeed {
    pub name: String,
    pub syllabus: String,
    pub workload_hours: i32,
}

pub struct UserSeed {
    pub email: String,
    pub name: String,
    pub is_a_teacher: bool,
    pub is_a_student: bool,
}

pub struct ClassSeed {
    pub code: String,
    pub year: i32,
    pub semester: i32,
}

/// A discipline offered in a class, with its teacher.
pub struct ClassDisciplineSeed {
    pub class_id: Uuid,
    pub discipline_id: Uuid,
    pub teacher_email: Option<String>,
}

/// How many rows of each kind `seed_all` creates.
#[derive(Clone, Debug)]
pub struct SeedConfig {
    pub courses: usize,
    pub disciplines: usize,
    pub teachers: usize,
    pub students: usize,
    pub classes: usize,
    /// Disciplines offered in each class
    pub disciplines_per_class: usize,
    /// Students enrolled in each class
    pub students_per_class: usize,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            courses: 5,
            disciplines: 20,
            teachers: 10,
            students: 200,
            classes: 10,
            disciplines_per_class: 4,
            students_per_class: 25,
        }
    }
}
