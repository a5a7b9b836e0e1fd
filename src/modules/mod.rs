pub mod auth;
pub mod classes;
pub mod courses;
pub mod disciplines;
pub mod quizzes;
pub mod theme_materials;
pub mod themes;
pub mod users;
