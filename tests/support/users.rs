use chrono::{DateTime, Utc};
use document_repo::{
    Database, Field, FieldValue, Filter, Model, Operator, OrderBy, ReadOptions, Repository,
    RepositoryError,
};
use serde::{Deserialize, Serialize};

pub const COLLECTION: &str = "users";

#[derive(Debug, Clone, PartialEq, Deserialize, Model)]
#[model(data = UserData, patch = UserPatch)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub status: String,
    pub age: i64,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub visits: i64,
    #[serde(default, with = "document_repo::date::option")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "document_repo::date::option")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    pub id: Field<String>,
    pub name: String,
    pub status: String,
    pub age: i64,
    pub tags: Vec<String>,
    pub nickname: Field<String>,
}

impl UserData {
    pub fn new(name: &str, status: &str, age: i64) -> Self {
        Self {
            id: Field::Absent,
            name: name.to_string(),
            status: status.to_string(),
            age,
            tags: Vec::new(),
            nickname: Field::Absent,
        }
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|tag| tag.to_string()).collect();
        self
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    pub id: Field<String>,
    pub name: Field<String>,
    pub status: Field<String>,
    pub nickname: Field<String>,
    pub visits: Field<FieldValue>,
    pub created_at: Field<String>,
}

/// Domain queries composed over the generic repository.
#[derive(Clone)]
pub struct UserRepository {
    repo: Repository<User>,
}

impl UserRepository {
    pub fn new(db: Database) -> Self {
        Self {
            repo: Repository::new(db, COLLECTION),
        }
    }

    pub fn repo(&self) -> &Repository<User> {
        &self.repo
    }

    pub async fn active_adults(&self) -> Result<Vec<User>, RepositoryError> {
        self.repo
            .get_where_many(
                [
                    Filter::equals("status", "active"),
                    Filter::new("age", Operator::Gte, 18),
                ],
                None,
                Some(OrderBy::asc("age")),
                ReadOptions::default(),
            )
            .await
    }

    pub async fn by_name(&self, name: &str) -> Result<Option<User>, RepositoryError> {
        self.repo
            .get_one_where(Filter::equals("name", name), None, ReadOptions::default())
            .await
    }
}

pub fn assert_timestamps_present(user: &User) {
    assert!(user.created_at().is_some(), "createdAt should be set");
}
