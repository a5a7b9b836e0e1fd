use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use classhero_auth::RoleFlags;
use classhero_core::serde::{deserialize_optional_bool, deserialize_optional_string};
use classhero_core::{PaginationMeta, PaginationParams};

/// Column list shared by every query returning a [`User`].
pub const USER_COLUMNS: &str = "user_id, email, name, is_a_admin, is_a_teacher, is_a_student, is_validated, created_at, updated_at";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub user_id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub is_a_admin: bool,
    pub is_a_teacher: bool,
    pub is_a_student: bool,
    pub is_validated: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn roles(&self) -> RoleFlags {
        RoleFlags {
            is_a_admin: self.is_a_admin,
            is_a_teacher: self.is_a_teacher,
            is_a_student: self.is_a_student,
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct UserAvatar {
    pub avatar_url: String,
    pub is_active: bool,
}

/// A user with every avatar it ever uploaded.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserWithAvatars {
    #[serde(flatten)]
    pub user: User,
    pub users_avatars: Vec<UserAvatar>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub data: UserWithAvatars,
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserFilterParams {
    /// Matches email or name, case-insensitive
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub search: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_bool")]
    pub is_a_admin: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_optional_bool")]
    pub is_a_teacher: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_optional_bool")]
    pub is_a_student: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_optional_bool")]
    pub is_validated: Option<bool>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedUsersResponse {
    pub data: Vec<UserWithAvatars>,
    pub meta: PaginationMeta,
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserOptionsParams {
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub search: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_bool")]
    pub is_a_student: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_optional_bool")]
    pub is_a_teacher: Option<bool>,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct UserOption {
    pub email: String,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserByEmailParams {
    pub email: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateUserInfoDto {
    /// Account to edit; the caller when omitted
    #[validate(email(message = "Invalid email"))]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: Option<String>,
    pub is_a_admin: Option<bool>,
    pub is_a_teacher: Option<bool>,
    pub is_a_student: Option<bool>,
    pub is_validated: Option<bool>,
}

impl UpdateUserInfoDto {
    /// Keeps only the name and flags the account for validation.
    #[must_use]
    pub fn restricted_to_name(self) -> Self {
        Self {
            email: self.email,
            name: self.name,
            is_a_admin: None,
            is_a_teacher: None,
            is_a_student: None,
            is_validated: Some(false),
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SetAvatarByUrlDto {
    #[validate(url(message = "Invalid avatar URL"))]
    pub avatar_url: String,
    #[validate(email(message = "Invalid email"))]
    pub email: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AvatarUploadResponse {
    pub message: String,
    pub avatar_url: String,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct AvatarUserSummary {
    pub email: String,
    pub avatar_url: String,
    pub is_validated: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SetAvatarResponse {
    pub message: String,
    pub user: AvatarUserSummary,
}

/// Multipart body of `POST /api/users/avatar`.
#[derive(ToSchema)]
pub struct AvatarUploadForm {
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
    /// Account to update (admins only); the caller when omitted
    pub email: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restricted_to_name_drops_role_flags() {
        let dto = UpdateUserInfoDto {
            email: None,
            name: Some("New Name".to_string()),
            is_a_admin: Some(true),
            is_a_teacher: Some(false),
            is_a_student: Some(true),
            is_validated: Some(true),
        }
        .restricted_to_name();

        assert_eq!(dto.name.as_deref(), Some("New Name"));
        assert_eq!(dto.is_a_admin, None);
        assert_eq!(dto.is_a_teacher, None);
        assert_eq!(dto.is_a_student, None);
        assert_eq!(dto.is_validated, Some(false));
    }
}
