use crate::models::{Article, Comment, Like, Role, Tag, User};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response as AxumResponse},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

// ============================================================================
// Response envelope
// ============================================================================

/// Paging information attached to every list response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub page: i64,
    pub size: i64,
    pub order: String,
    pub total_data: i64,
    pub total_pages: i64,
}

/// Success branch of the `{status_code, message, error, data, meta}` envelope
///
/// `error` is always null here; `meta` is only filled for list endpoints.
#[derive(Debug, Serialize, Deserialize)]
pub struct Response<T> {
    pub status_code: u16,
    pub message: String,
    pub error: Option<String>,
    pub data: Option<T>,
    pub meta: Option<Metadata>,
}

impl<T: Serialize> Response<T> {
    pub fn new(status: StatusCode, message: impl Into<String>, data: T) -> Self {
        Response {
            status_code: status.as_u16(),
            message: message.into(),
            error: None,
            data: Some(data),
            meta: None,
        }
    }

    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Response::new(StatusCode::OK, message, data)
    }

    pub fn created(message: impl Into<String>, data: T) -> Self {
        Response::new(StatusCode::CREATED, message, data)
    }

    pub fn with_meta(mut self, meta: Metadata) -> Self {
        self.meta = Some(meta);
        self
    }
}

impl<T: Serialize> IntoResponse for Response<T> {
    fn into_response(self) -> AxumResponse {
        let status = StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::OK);
        (status, Json(self)).into_response()
    }
}

// ============================================================================
// Query DTOs
// ============================================================================

/// Query string shared by the tag, user and comment listings
#[derive(Debug, Default, Clone, Serialize, Deserialize, Validate)]
pub struct ListQueryDto {
    #[validate(range(min = 1))]
    pub page: Option<i64>,

    #[validate(range(min = 1, max = 100))]
    pub size: Option<i64>,

    pub order: Option<String>,
    pub field: Option<String>,
    pub s: Option<String>,
}

/// Blog listing query; adds a date window and tag containment
///
/// `tags` is a comma separated list of tag ids, e.g. `tags=1,4`.
#[derive(Debug, Default, Clone, Serialize, Deserialize, Validate)]
pub struct BlogQueryDto {
    #[validate(range(min = 1))]
    pub page: Option<i64>,

    #[validate(range(min = 1, max = 100))]
    pub size: Option<i64>,

    pub order: Option<String>,
    pub field: Option<String>,
    pub s: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub tags: Option<String>,
}

impl BlogQueryDto {
    pub fn list_query(&self) -> ListQueryDto {
        ListQueryDto {
            page: self.page,
            size: self.size,
            order: self.order.clone(),
            field: self.field.clone(),
            s: self.s.clone(),
        }
    }
}

// ============================================================================
// Authentication DTOs
// ============================================================================

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct RegisterUserDto {
    #[validate(length(min = 5, message = "full_name must be at least 5 characters"))]
    pub full_name: String,

    #[validate(email(message = "Email is invalid"))]
    pub email: String,

    #[validate(length(min = 5, message = "Password must be at least 5 characters"))]
    pub password: String,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct LoginUserDto {
    #[validate(email(message = "Email is invalid"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponseDto {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
    pub role: Role,
}

/// Query the identity provider sends back to the callback route
///
/// Both fields are optional at the extractor level so a missing one is
/// reported as an invalid exchange instead of an axum rejection.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct GoogleCallbackQueryDto {
    pub state: Option<String>,
    pub code: Option<String>,
}

// ============================================================================
// Tag DTOs
// ============================================================================

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct TagDto {
    #[validate(length(min = 5, message = "name must be at least 5 characters"))]
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FilterTagDto {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FilterTagDto {
    pub fn filter_tag(tag: &Tag) -> Self {
        FilterTagDto {
            id: tag.id,
            name: tag.name.to_owned(),
            created_at: tag.created_at,
            updated_at: tag.updated_at,
        }
    }

    pub fn filter_tags(tags: &[Tag]) -> Vec<FilterTagDto> {
        tags.iter().map(FilterTagDto::filter_tag).collect()
    }
}

// ============================================================================
// User DTOs
// ============================================================================

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct UpdateUserDto {
    #[validate(length(min = 5, message = "full_name must be at least 5 characters"))]
    pub full_name: String,

    #[validate(email(message = "Email is invalid"))]
    pub email: String,

    #[validate(length(min = 5, message = "Password must be at least 5 characters"))]
    pub password: Option<String>,
}

/// User data safe to hand to clients (no password hash)
#[derive(Debug, Serialize, Deserialize)]
pub struct FilterUserDto {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FilterUserDto {
    pub fn filter_user(user: &User) -> Self {
        FilterUserDto {
            id: user.id,
            full_name: user.full_name.to_owned(),
            email: user.email.to_owned(),
            role: user.role,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }

    pub fn filter_users(users: &[User]) -> Vec<FilterUserDto> {
        users.iter().map(FilterUserDto::filter_user).collect()
    }
}

// ============================================================================
// Blog DTOs
// ============================================================================

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct CreateBlogDto {
    #[validate(length(min = 5, max = 50, message = "title must be 5 to 50 characters"))]
    pub title: String,

    #[validate(length(min = 100, message = "body must be at least 100 characters"))]
    pub body: String,

    #[validate(length(min = 5, message = "footer must be at least 5 characters"))]
    pub footer: String,

    #[validate(length(min = 1, message = "at least one tag is required"))]
    pub tags: Vec<i64>,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct UpdateBlogDto {
    #[validate(length(min = 5, max = 50, message = "title must be 5 to 50 characters"))]
    pub title: String,

    #[validate(length(min = 100, message = "body must be at least 100 characters"))]
    pub body: String,

    #[validate(length(min = 5, message = "footer must be at least 5 characters"))]
    pub footer: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FilterBlogDto {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub body: String,
    pub footer: String,
    pub user_id: i64,
    pub tags: Vec<i64>,
    pub comments: Vec<i64>,
    pub likes: Vec<i64>,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub updated_at: DateTime<Utc>,
}

impl FilterBlogDto {
    pub fn filter_blog(article: &Article) -> Self {
        FilterBlogDto {
            id: article.id,
            title: article.title.to_owned(),
            slug: article.slug.to_owned(),
            body: article.body.to_owned(),
            footer: article.footer.to_owned(),
            user_id: article.user_id,
            tags: article.tags.clone(),
            comments: article.comments.clone(),
            likes: article.likes.clone(),
            created_at: article.created_at,
            created_by: article.created_by.to_owned(),
            updated_at: article.updated_at,
        }
    }

    pub fn filter_blogs(articles: &[Article]) -> Vec<FilterBlogDto> {
        articles.iter().map(FilterBlogDto::filter_blog).collect()
    }
}

// ============================================================================
// Comment & Like DTOs
// ============================================================================

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct CommentDto {
    #[validate(length(min = 1, max = 1000, message = "comment must be 1 to 1000 characters"))]
    pub comment: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FilterCommentDto {
    pub id: i64,
    pub comment: String,
    pub article_id: i64,
    pub user_id: i64,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FilterCommentDto {
    pub fn filter_comment(comment: &Comment) -> Self {
        FilterCommentDto {
            id: comment.id,
            comment: comment.comment.to_owned(),
            article_id: comment.article_id,
            user_id: comment.user_id,
            created_by: comment.created_by.to_owned(),
            created_at: comment.created_at,
            updated_at: comment.updated_at,
        }
    }

    pub fn filter_comments(comments: &[Comment]) -> Vec<FilterCommentDto> {
        comments
            .iter()
            .map(FilterCommentDto::filter_comment)
            .collect()
    }
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct LikeDto {
    #[validate(range(min = 0, max = 1, message = "like must be 0 or 1"))]
    pub like: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FilterLikeDto {
    pub id: i64,
    pub like: i32,
    pub article_id: i64,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}

impl FilterLikeDto {
    pub fn filter_like(like: &Like) -> Self {
        FilterLikeDto {
            id: like.id,
            like: like.like_count,
            article_id: like.article_id,
            user_id: like.user_id,
            created_at: like.created_at,
        }
    }
}
