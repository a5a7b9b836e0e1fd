use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use classhero_core::{PaginationMeta, PaginationParams};

use crate::modules::auth::model::{AuthResponse, RefreshTokenRequest, SendCodeDto, VerifyCodeDto};
use crate::modules::classes::model::{
    ClassDetail, ClassDto, ClassResponse, ClassSummary, CreateClassResponse,
    DisciplineAssignmentDto, PaginatedClassesResponse,
};
use crate::modules::courses::model::{
    Course, CourseOption, CourseResponse, CourseStatus, CourseSummary, CreateCourseDto,
    PaginatedCoursesResponse, UpdateCourseDto,
};
use crate::modules::disciplines::model::{
    CreateDisciplineDto, CreateDisciplineResponse, Discipline, DisciplineOption,
    DisciplineResponse, DisciplineWithCourses, PaginatedDisciplinesResponse, UpdateDisciplineDto,
};
use crate::modules::quizzes::model::{PaginatedQuestionsResponse, QuizQuestion};
use crate::modules::theme_materials::model::{
    CreateMaterialForm, MaterialType, ThemeMaterial, ThemeMaterialResponse, UpdateMaterialForm,
};
use crate::modules::themes::model::{
    CreateThemeDto, Theme, ThemeListResponse, ThemeResponse, UpdateThemeDto,
};
use crate::modules::users::model::{
    AvatarUploadForm, AvatarUploadResponse, PaginatedUsersResponse, SetAvatarByUrlDto,
    SetAvatarResponse, UpdateUserInfoDto, User, UserOption, UserResponse, UserWithAvatars,
};
use crate::utils::response::{ErrorResponse, MessageResponse};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::auth::controller::send_code,
        crate::modules::auth::controller::verify_code,
        crate::modules::auth::controller::refresh_tokens,
        crate::modules::users::controller::get_users,
        crate::modules::users::controller::get_user_options,
        crate::modules::users::controller::get_user_by_email,
        crate::modules::users::controller::get_me,
        crate::modules::users::controller::upload_avatar,
        crate::modules::users::controller::set_avatar_by_url,
        crate::modules::users::controller::update_user_info,
        crate::modules::users::controller::delete_user,
        crate::modules::courses::controller::create_course,
        crate::modules::courses::controller::get_courses,
        crate::modules::courses::controller::search_courses,
        crate::modules::courses::controller::get_course_by_id,
        crate::modules::courses::controller::update_course,
        crate::modules::courses::controller::delete_course,
        crate::modules::disciplines::controller::get_disciplines,
        crate::modules::disciplines::controller::search_disciplines,
        crate::modules::disciplines::controller::get_discipline_by_id,
        crate::modules::disciplines::controller::create_discipline,
        crate::modules::disciplines::controller::update_discipline,
        crate::modules::disciplines::controller::delete_discipline,
        crate::modules::classes::controller::get_classes,
        crate::modules::classes::controller::get_class_by_id,
        crate::modules::classes::controller::create_class,
        crate::modules::classes::controller::update_class,
        crate::modules::classes::controller::delete_class,
        crate::modules::themes::controller::get_themes_by_class_discipline,
        crate::modules::themes::controller::create_theme,
        crate::modules::themes::controller::update_theme,
        crate::modules::themes::controller::delete_theme,
        crate::modules::theme_materials::controller::create_material,
        crate::modules::theme_materials::controller::get_materials_by_theme,
        crate::modules::theme_materials::controller::update_material,
        crate::modules::theme_materials::controller::delete_material,
        crate::modules::quizzes::controller::get_questions,
        crate::modules::quizzes::controller::get_question,
    ),
    components(
        schemas(
            SendCodeDto,
            VerifyCodeDto,
            RefreshTokenRequest,
            AuthResponse,
            User,
            UserWithAvatars,
            UserResponse,
            UserOption,
            PaginatedUsersResponse,
            UpdateUserInfoDto,
            SetAvatarByUrlDto,
            SetAvatarResponse,
            AvatarUploadForm,
            AvatarUploadResponse,
            Course,
            CourseStatus,
            CourseSummary,
            CourseOption,
            CourseResponse,
            CreateCourseDto,
            UpdateCourseDto,
            PaginatedCoursesResponse,
            Discipline,
            DisciplineOption,
            DisciplineWithCourses,
            DisciplineResponse,
            CreateDisciplineDto,
            CreateDisciplineResponse,
            UpdateDisciplineDto,
            PaginatedDisciplinesResponse,
            ClassSummary,
            ClassDetail,
            ClassResponse,
            ClassDto,
            DisciplineAssignmentDto,
            CreateClassResponse,
            PaginatedClassesResponse,
            Theme,
            ThemeResponse,
            ThemeListResponse,
            CreateThemeDto,
            UpdateThemeDto,
            MaterialType,
            ThemeMaterial,
            ThemeMaterialResponse,
            CreateMaterialForm,
            UpdateMaterialForm,
            QuizQuestion,
            PaginatedQuestionsResponse,
            MessageResponse,
            ErrorResponse,
            PaginationMeta,
            PaginationParams,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Access codes and tokens"),
        (name = "Users", description = "Accounts, avatars and profile validation"),
        (name = "Courses", description = "Course catalog"),
        (name = "Disciplines", description = "Disciplines and their courses"),
        (name = "Classes", description = "Class offerings with teachers and students"),
        (name = "Themes", description = "Topics of a class discipline"),
        (name = "Theme Materials", description = "Learning resources attached to a theme"),
        (name = "Quizzes", description = "Generated quiz questions")
    ),
    info(
        title = "ClassHero API",
        version = "0.1.0",
        description = "School administration and learning content API built with Rust, Axum, and PostgreSQL.",
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_every_module() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/auth/send-code",
            "/api/users/me",
            "/api/courses/{id}",
            "/api/disciplines/all",
            "/api/classes",
            "/api/themes/by-class-discipline/{id}",
            "/api/theme-materials/{id}",
            "/api/quizzes/{question_id}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
    }

    #[test]
    fn test_bearer_scheme_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
