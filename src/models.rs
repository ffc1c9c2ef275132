use chrono::prelude::*;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Fixed set of roles used for role-based access control
///
/// Stored in the `role` table and referenced from `"user".role_id`, so the
/// discriminants are the seeded row ids. `sqlx::Type` with `repr(i64)` lets a
/// `role_id` column decode straight into the enum.
///
/// Serialized with the variant name ("Superadmin", "Author", "Guest"), which
/// is also what travels in the `role_name` token claim.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Hash)]
#[repr(i64)]
pub enum Role {
    Superadmin = 1,
    Author = 2,
    Guest = 3,
}

impl Role {
    pub fn id(&self) -> i64 {
        *self as i64
    }

    pub fn from_id(id: i64) -> Option<Role> {
        match id {
            1 => Some(Role::Superadmin),
            2 => Some(Role::Author),
            3 => Some(Role::Guest),
            _ => None,
        }
    }

    pub fn to_str(&self) -> &'static str {
        match self {
            Role::Superadmin => "Superadmin",
            Role::Author => "Author",
            Role::Guest => "Guest",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_str())
    }
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Superadmin" => Ok(Role::Superadmin),
            "Author" => Ok(Role::Author),
            "Guest" => Ok(Role::Guest),
            _ => Err(()),
        }
    }
}

/// Who a request is made by, as carried in the bearer token
///
/// Attached to request extensions by the auth middleware. It is the only
/// identity a handler sees; there is no user id in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub full_name: String,
    pub email: String,
    pub role: Role,
}

/// Row of the `"user"` table
///
/// `password` is an Argon2 PHC string, or empty for accounts provisioned by
/// Google sign-in (those cannot use local login).
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct User {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub password: String,
    #[sqlx(rename = "role_id")]
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<String>,
}

impl User {
    pub fn identity(&self) -> Identity {
        Identity {
            full_name: self.full_name.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }

    pub fn is_oauth_only(&self) -> bool {
        self.password.is_empty()
    }
}

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<String>,
}

/// Row of the `article` table
///
/// `comments` and `likes` cache the ids of the child rows. They are only ever
/// changed in the same transaction as the child insert or delete.
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct Article {
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
    pub updated_by: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct Comment {
    pub id: i64,
    pub comment: String,
    pub article_id: i64,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct Like {
    pub id: i64,
    pub like_count: i32,
    pub article_id: i64,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<String>,
}
