//! In-memory stand-ins for the store, state cache and identity provider.

use chrono::Utc;
use std::{
    collections::HashMap,
    net::IpAddr,
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use crate::{
    db::{BlogExt, CommentExt, LikeExt, NewArticle, NewUser, TagExt, UserExt},
    error::ServiceError,
    http::{GoogleUserInfo, IdentityProvider},
    models::{Article, Comment, Like, Role, Tag, User},
    redisdb::{LoginAttemptsExt, OAuthStateExt},
    utils::{
        pagination::{BlogFilter, ListParams, SortOrder},
        password,
    },
};

#[derive(Default)]
struct MemoryState {
    next_id: i64,
    users: Vec<User>,
    tags: Vec<Tag>,
    articles: Vec<Article>,
    comments: Vec<Comment>,
    likes: Vec<Like>,
}

impl MemoryState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Whole relational store behind one lock; counts every mutation
#[derive(Default)]
pub(crate) struct MemoryStore {
    state: Mutex<MemoryState>,
    writes: AtomicUsize,
}

fn page<T: Clone>(mut rows: Vec<T>, params: &ListParams) -> (Vec<T>, i64) {
    if params.order == SortOrder::Desc {
        rows.reverse();
    }
    let total = rows.len() as i64;
    let rows = rows
        .into_iter()
        .skip(params.offset() as usize)
        .take(params.fetch_limit() as usize)
        .collect();
    (rows, total)
}

fn matches(pattern: &Option<String>, haystacks: &[&str]) -> bool {
    match pattern {
        None => true,
        Some(term) => {
            let term = term.to_lowercase();
            haystacks.iter().any(|h| h.to_lowercase().contains(&term))
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mutations performed through the store traits so far
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn wrote(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }

    pub fn seed_user(&self, full_name: &str, email: &str, plain: Option<&str>, role: Role) -> User {
        let password = match plain {
            Some(plain) => password::hash(plain).unwrap(),
            None => String::new(),
        };
        let mut state = self.state.lock().unwrap();
        let user = User {
            id: state.next_id(),
            full_name: full_name.to_string(),
            email: email.to_string(),
            password,
            role,
            created_at: Utc::now(),
            created_by: full_name.to_string(),
            updated_at: Utc::now(),
            updated_by: None,
        };
        state.users.push(user.clone());
        user
    }

    pub fn seed_tag(&self, name: &str) -> Tag {
        let mut state = self.state.lock().unwrap();
        let tag = Tag {
            id: state.next_id(),
            name: name.to_string(),
            created_at: Utc::now(),
            created_by: "seed".to_string(),
            updated_at: Utc::now(),
            updated_by: None,
        };
        state.tags.push(tag.clone());
        tag
    }

    pub fn seed_article(&self, user_id: i64, title: &str, slug: &str, tags: Vec<i64>) -> Article {
        let mut state = self.state.lock().unwrap();
        let article = Article {
            id: state.next_id(),
            title: title.to_string(),
            slug: slug.to_string(),
            body: "b".repeat(100),
            footer: "footer".to_string(),
            user_id,
            tags,
            comments: Vec::new(),
            likes: Vec::new(),
            created_at: Utc::now(),
            created_by: "seed".to_string(),
            updated_at: Utc::now(),
            updated_by: None,
        };
        state.articles.push(article.clone());
        article
    }

    pub fn article(&self, article_id: i64) -> Option<Article> {
        let state = self.state.lock().unwrap();
        state.articles.iter().find(|a| a.id == article_id).cloned()
    }

    pub fn comment(&self, comment_id: i64) -> Option<Comment> {
        let state = self.state.lock().unwrap();
        state.comments.iter().find(|c| c.id == comment_id).cloned()
    }

    pub fn like(&self, like_id: i64) -> Option<Like> {
        let state = self.state.lock().unwrap();
        state.likes.iter().find(|l| l.id == like_id).cloned()
    }

    pub fn user_count(&self) -> usize {
        self.state.lock().unwrap().users.len()
    }
}

impl UserExt for MemoryStore {
    async fn get_user_by_id(&self, user_id: i64) -> Result<Option<User>, sqlx::Error> {
        let state = self.state.lock().unwrap();
        Ok(state.users.iter().find(|u| u.id == user_id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        let state = self.state.lock().unwrap();
        Ok(state.users.iter().find(|u| u.email == email).cloned())
    }

    async fn get_users(
        &self,
        params: &ListParams,
        role: Role,
    ) -> Result<(Vec<User>, i64), sqlx::Error> {
        let pattern = params.search.clone();
        let state = self.state.lock().unwrap();
        let rows = state
            .users
            .iter()
            .filter(|u| u.role == role)
            .filter(|u| matches(&pattern, &[u.full_name.as_str(), u.email.as_str()]))
            .cloned()
            .collect();
        Ok(page(rows, params))
    }

    async fn save_user(&self, user: NewUser<'_>, created_by: &str) -> Result<User, sqlx::Error> {
        self.wrote();
        let mut state = self.state.lock().unwrap();
        let saved = User {
            id: state.next_id(),
            full_name: user.full_name.to_string(),
            email: user.email.to_string(),
            password: user.password.to_string(),
            role: user.role,
            created_at: Utc::now(),
            created_by: created_by.to_string(),
            updated_at: Utc::now(),
            updated_by: None,
        };
        state.users.push(saved.clone());
        Ok(saved)
    }

    async fn update_user(
        &self,
        user_id: i64,
        full_name: &str,
        email: &str,
        password: Option<&str>,
        updated_by: &str,
    ) -> Result<User, sqlx::Error> {
        self.wrote();
        let mut state = self.state.lock().unwrap();
        let user = state
            .users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or(sqlx::Error::RowNotFound)?;
        user.full_name = full_name.to_string();
        user.email = email.to_string();
        if let Some(password) = password {
            user.password = password.to_string();
        }
        user.updated_at = Utc::now();
        user.updated_by = Some(updated_by.to_string());
        Ok(user.clone())
    }

    async fn delete_user(&self, user_id: i64) -> Result<(), sqlx::Error> {
        self.wrote();
        let mut guard = self.state.lock().unwrap();
        let state = &mut *guard;
        let before = state.users.len();
        state.users.retain(|u| u.id != user_id);
        if state.users.len() == before {
            return Err(sqlx::Error::RowNotFound);
        }

        // Same cascade as the schema: the user's articles with their
        // children, then the user's own comments and likes.
        let owned: Vec<i64> = state
            .articles
            .iter()
            .filter(|a| a.user_id == user_id)
            .map(|a| a.id)
            .collect();
        state.articles.retain(|a| a.user_id != user_id);
        state
            .comments
            .retain(|c| c.user_id != user_id && !owned.contains(&c.article_id));
        state
            .likes
            .retain(|l| l.user_id != user_id && !owned.contains(&l.article_id));

        let comments = &state.comments;
        let likes = &state.likes;
        for article in state.articles.iter_mut() {
            article.comments.retain(|id| comments.iter().any(|c| c.id == *id));
            article.likes.retain(|id| likes.iter().any(|l| l.id == *id));
        }
        Ok(())
    }

    async fn email_taken(&self, email: &str, user_id: i64) -> Result<bool, sqlx::Error> {
        let state = self.state.lock().unwrap();
        Ok(state
            .users
            .iter()
            .any(|u| u.email == email && u.id != user_id))
    }
}

impl TagExt for MemoryStore {
    async fn get_tag(&self, tag_id: i64) -> Result<Option<Tag>, sqlx::Error> {
        let state = self.state.lock().unwrap();
        Ok(state.tags.iter().find(|t| t.id == tag_id).cloned())
    }

    async fn get_tags(&self, params: &ListParams) -> Result<(Vec<Tag>, i64), sqlx::Error> {
        let pattern = params.search.clone();
        let state = self.state.lock().unwrap();
        let rows = state
            .tags
            .iter()
            .filter(|t| matches(&pattern, &[t.name.as_str()]))
            .cloned()
            .collect();
        Ok(page(rows, params))
    }

    async fn tag_name_exists(
        &self,
        name: &str,
        except_id: Option<i64>,
    ) -> Result<bool, sqlx::Error> {
        let state = self.state.lock().unwrap();
        Ok(state
            .tags
            .iter()
            .any(|t| t.name.eq_ignore_ascii_case(name) && Some(t.id) != except_id))
    }

    async fn existing_tag_ids(&self, tag_ids: &[i64]) -> Result<Vec<i64>, sqlx::Error> {
        let state = self.state.lock().unwrap();
        Ok(state
            .tags
            .iter()
            .map(|t| t.id)
            .filter(|id| tag_ids.contains(id))
            .collect())
    }

    async fn save_tag(&self, name: &str, created_by: &str) -> Result<Tag, sqlx::Error> {
        self.wrote();
        let mut state = self.state.lock().unwrap();
        let tag = Tag {
            id: state.next_id(),
            name: name.to_string(),
            created_at: Utc::now(),
            created_by: created_by.to_string(),
            updated_at: Utc::now(),
            updated_by: None,
        };
        state.tags.push(tag.clone());
        Ok(tag)
    }

    async fn update_tag(
        &self,
        tag_id: i64,
        name: &str,
        updated_by: &str,
    ) -> Result<Tag, sqlx::Error> {
        self.wrote();
        let mut state = self.state.lock().unwrap();
        let tag = state
            .tags
            .iter_mut()
            .find(|t| t.id == tag_id)
            .ok_or(sqlx::Error::RowNotFound)?;
        tag.name = name.to_string();
        tag.updated_at = Utc::now();
        tag.updated_by = Some(updated_by.to_string());
        Ok(tag.clone())
    }

    async fn delete_tag(&self, tag_id: i64) -> Result<(), sqlx::Error> {
        self.wrote();
        let mut state = self.state.lock().unwrap();
        for article in state.articles.iter_mut() {
            article.tags.retain(|id| *id != tag_id);
        }
        let before = state.tags.len();
        state.tags.retain(|t| t.id != tag_id);
        if state.tags.len() == before {
            return Err(sqlx::Error::RowNotFound);
        }
        Ok(())
    }
}

impl BlogExt for MemoryStore {
    async fn get_blog_by_id(&self, article_id: i64) -> Result<Option<Article>, sqlx::Error> {
        Ok(self.article(article_id))
    }

    async fn get_blog_by_slug(&self, slug: &str) -> Result<Option<Article>, sqlx::Error> {
        let state = self.state.lock().unwrap();
        Ok(state.articles.iter().find(|a| a.slug == slug).cloned())
    }

    async fn get_blogs(
        &self,
        params: &ListParams,
        filter: &BlogFilter,
    ) -> Result<(Vec<Article>, i64), sqlx::Error> {
        let pattern = params.search.clone();
        let state = self.state.lock().unwrap();
        let rows = state
            .articles
            .iter()
            .filter(|a| matches(&pattern, &[a.title.as_str(), a.body.as_str()]))
            .filter(|a| filter.tags.iter().all(|t| a.tags.contains(t)))
            .filter(|a| match filter.date_range {
                None => true,
                Some((start, end)) => {
                    let day = a.created_at.date_naive();
                    day >= start && day <= end
                }
            })
            .cloned()
            .collect();
        Ok(page(rows, params))
    }

    async fn slug_exists(&self, slug: &str, except_id: Option<i64>) -> Result<bool, sqlx::Error> {
        let state = self.state.lock().unwrap();
        Ok(state
            .articles
            .iter()
            .any(|a| a.slug == slug && Some(a.id) != except_id))
    }

    async fn save_blog(
        &self,
        article: NewArticle<'_>,
        created_by: &str,
    ) -> Result<Article, sqlx::Error> {
        self.wrote();
        let mut state = self.state.lock().unwrap();
        let saved = Article {
            id: state.next_id(),
            title: article.title.to_string(),
            slug: article.slug.to_string(),
            body: article.body.to_string(),
            footer: article.footer.to_string(),
            user_id: article.user_id,
            tags: article.tags.to_vec(),
            comments: Vec::new(),
            likes: Vec::new(),
            created_at: Utc::now(),
            created_by: created_by.to_string(),
            updated_at: Utc::now(),
            updated_by: None,
        };
        state.articles.push(saved.clone());
        Ok(saved)
    }

    async fn update_blog(
        &self,
        article_id: i64,
        title: &str,
        slug: &str,
        body: &str,
        footer: &str,
        updated_by: &str,
    ) -> Result<Article, sqlx::Error> {
        self.wrote();
        let mut state = self.state.lock().unwrap();
        let article = state
            .articles
            .iter_mut()
            .find(|a| a.id == article_id)
            .ok_or(sqlx::Error::RowNotFound)?;
        article.title = title.to_string();
        article.slug = slug.to_string();
        article.body = body.to_string();
        article.footer = footer.to_string();
        article.updated_at = Utc::now();
        article.updated_by = Some(updated_by.to_string());
        Ok(article.clone())
    }

    async fn delete_blog(&self, article_id: i64) -> Result<(), sqlx::Error> {
        self.wrote();
        let mut state = self.state.lock().unwrap();
        let before = state.articles.len();
        state.articles.retain(|a| a.id != article_id);
        if state.articles.len() == before {
            return Err(sqlx::Error::RowNotFound);
        }
        state.comments.retain(|c| c.article_id != article_id);
        state.likes.retain(|l| l.article_id != article_id);
        Ok(())
    }
}

impl CommentExt for MemoryStore {
    async fn get_comment(&self, comment_id: i64) -> Result<Option<Comment>, sqlx::Error> {
        Ok(self.comment(comment_id))
    }

    async fn get_comments(
        &self,
        article_id: i64,
        params: &ListParams,
    ) -> Result<(Vec<Comment>, i64), sqlx::Error> {
        let pattern = params.search.clone();
        let state = self.state.lock().unwrap();
        let rows = state
            .comments
            .iter()
            .filter(|c| c.article_id == article_id && matches(&pattern, &[c.comment.as_str()]))
            .cloned()
            .collect();
        Ok(page(rows, params))
    }

    async fn save_comment(
        &self,
        article_id: i64,
        user_id: i64,
        comment: &str,
        created_by: &str,
    ) -> Result<Comment, sqlx::Error> {
        self.wrote();
        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        let article = state
            .articles
            .iter_mut()
            .find(|a| a.id == article_id)
            .ok_or(sqlx::Error::RowNotFound)?;
        article.comments.push(id);

        let saved = Comment {
            id,
            comment: comment.to_string(),
            article_id,
            user_id,
            created_at: Utc::now(),
            created_by: created_by.to_string(),
            updated_at: Utc::now(),
            updated_by: None,
        };
        state.comments.push(saved.clone());
        Ok(saved)
    }

    async fn update_comment(
        &self,
        comment_id: i64,
        comment: &str,
        updated_by: &str,
    ) -> Result<Comment, sqlx::Error> {
        self.wrote();
        let mut state = self.state.lock().unwrap();
        let row = state
            .comments
            .iter_mut()
            .find(|c| c.id == comment_id)
            .ok_or(sqlx::Error::RowNotFound)?;
        row.comment = comment.to_string();
        row.updated_at = Utc::now();
        row.updated_by = Some(updated_by.to_string());
        Ok(row.clone())
    }

    async fn delete_comment(&self, article_id: i64, comment_id: i64) -> Result<(), sqlx::Error> {
        self.wrote();
        let mut state = self.state.lock().unwrap();
        let before = state.comments.len();
        state
            .comments
            .retain(|c| !(c.id == comment_id && c.article_id == article_id));
        if state.comments.len() == before {
            return Err(sqlx::Error::RowNotFound);
        }
        if let Some(article) = state.articles.iter_mut().find(|a| a.id == article_id) {
            article.comments.retain(|id| *id != comment_id);
        }
        Ok(())
    }
}

impl LikeExt for MemoryStore {
    async fn get_like(&self, like_id: i64) -> Result<Option<Like>, sqlx::Error> {
        let state = self.state.lock().unwrap();
        Ok(state.likes.iter().find(|l| l.id == like_id).cloned())
    }

    async fn get_like_by_user(
        &self,
        article_id: i64,
        user_id: i64,
    ) -> Result<Option<Like>, sqlx::Error> {
        let state = self.state.lock().unwrap();
        Ok(state
            .likes
            .iter()
            .find(|l| l.article_id == article_id && l.user_id == user_id)
            .cloned())
    }

    async fn save_like(
        &self,
        article_id: i64,
        user_id: i64,
        like_count: i32,
        created_by: &str,
    ) -> Result<Like, sqlx::Error> {
        self.wrote();
        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        let article = state
            .articles
            .iter_mut()
            .find(|a| a.id == article_id)
            .ok_or(sqlx::Error::RowNotFound)?;
        article.likes.push(id);

        let saved = Like {
            id,
            like_count,
            article_id,
            user_id,
            created_at: Utc::now(),
            created_by: created_by.to_string(),
            updated_at: Utc::now(),
            updated_by: None,
        };
        state.likes.push(saved.clone());
        Ok(saved)
    }

    async fn delete_like(&self, article_id: i64, like_id: i64) -> Result<(), sqlx::Error> {
        self.wrote();
        let mut state = self.state.lock().unwrap();
        let before = state.likes.len();
        state
            .likes
            .retain(|l| !(l.id == like_id && l.article_id == article_id));
        if state.likes.len() == before {
            return Err(sqlx::Error::RowNotFound);
        }
        if let Some(article) = state.articles.iter_mut().find(|a| a.id == article_id) {
            article.likes.retain(|id| *id != like_id);
        }
        Ok(())
    }
}

/// State cache keyed like the Redis one; can be told to fail every call
#[derive(Default)]
pub(crate) struct MemoryCache {
    entries: Mutex<HashMap<String, String>>,
    login_attempts: Mutex<HashMap<IpAddr, i64>>,
    unavailable: bool,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    fn check(&self) -> redis::RedisResult<()> {
        if self.unavailable {
            return Err(redis::RedisError::from((
                redis::ErrorKind::IoError,
                "connection refused",
            )));
        }
        Ok(())
    }
}

impl LoginAttemptsExt for MemoryCache {
    async fn hit_login_attempts(&self, ip: IpAddr) -> redis::RedisResult<i64> {
        self.check()?;
        let mut attempts = self.login_attempts.lock().unwrap();
        let count = attempts.entry(ip).or_insert(0);
        *count += 1;
        Ok(*count)
    }
}

impl OAuthStateExt for MemoryCache {
    async fn save_oauth_state(&self, state: &str, _ttl_secs: u64) -> redis::RedisResult<()> {
        self.check()?;
        self.entries
            .lock()
            .unwrap()
            .insert(format!("oauth_state:{}", state), state.to_string());
        Ok(())
    }

    async fn take_oauth_state(&self, state: &str) -> redis::RedisResult<Option<String>> {
        self.check()?;
        Ok(self
            .entries
            .lock()
            .unwrap()
            .remove(&format!("oauth_state:{}", state)))
    }
}

/// Identity provider that always signs in the same profile
pub(crate) struct FakeProvider {
    pub profile: GoogleUserInfo,
    exchanges: AtomicUsize,
}

impl FakeProvider {
    pub fn new(email: &str, name: &str) -> Self {
        Self {
            profile: GoogleUserInfo {
                id: "1234567890".to_string(),
                email: email.to_string(),
                name: name.to_string(),
            },
            exchanges: AtomicUsize::new(0),
        }
    }

    pub fn exchanges(&self) -> usize {
        self.exchanges.load(Ordering::SeqCst)
    }
}

impl IdentityProvider for FakeProvider {
    fn authorization_url(&self, state: &str) -> Result<String, ServiceError> {
        Ok(format!("https://accounts.example.test/auth?state={}", state))
    }

    async fn fetch_user_info(&self, _code: &str) -> Result<GoogleUserInfo, ServiceError> {
        self.exchanges.fetch_add(1, Ordering::SeqCst);
        Ok(self.profile.clone())
    }
}
