//! Document store: typed per-collection access over JSON document tables.
//!
//! Each collection is a table `(id, doc)` where `doc` is the serde-JSON form of
//! an entity. Queries address document fields by JSON path through
//! [`DocFilter`]; paths and values are always bound as parameters. The store
//! knows nothing about relationships between collections.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use expo_core::entities::{Company, Exhibition, Knowledge, Project, Review, Role, SchoolClass, User};
use expo_core::enums::EntityType;

use crate::ExpoDb;
use crate::error::DatabaseError;
use crate::helpers::{escape_like, json_to_sql};

// ---------------------------------------------------------------------------
// Collections
// ---------------------------------------------------------------------------

/// One table per entity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Users,
    Roles,
    Exhibitions,
    Projects,
    Reviews,
    Companies,
    Classes,
    Knowledge,
}

impl Collection {
    #[must_use]
    pub const fn table(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Roles => "roles",
            Self::Exhibitions => "exhibitions",
            Self::Projects => "projects",
            Self::Reviews => "reviews",
            Self::Companies => "companies",
            Self::Classes => "classes",
            Self::Knowledge => "knowledge",
        }
    }

    #[must_use]
    pub const fn entity(self) -> EntityType {
        match self {
            Self::Users => EntityType::User,
            Self::Roles => EntityType::Role,
            Self::Exhibitions => EntityType::Exhibition,
            Self::Projects => EntityType::Project,
            Self::Reviews => EntityType::Review,
            Self::Companies => EntityType::Company,
            Self::Classes => EntityType::Class,
            Self::Knowledge => EntityType::Knowledge,
        }
    }

    /// Exhaustive mapping back from the entity kind.
    #[must_use]
    pub const fn for_entity(entity: EntityType) -> Self {
        match entity {
            EntityType::User => Self::Users,
            EntityType::Role => Self::Roles,
            EntityType::Exhibition => Self::Exhibitions,
            EntityType::Project => Self::Projects,
            EntityType::Review => Self::Reviews,
            EntityType::Company => Self::Companies,
            EntityType::Class => Self::Classes,
            EntityType::Knowledge => Self::Knowledge,
        }
    }
}

/// An entity stored as a document in one collection.
pub trait Document: Serialize + DeserializeOwned + Send + Sync {
    const COLLECTION: Collection;

    fn id(&self) -> &str;
}

macro_rules! document {
    ($ty:ty, $collection:expr) => {
        impl Document for $ty {
            const COLLECTION: Collection = $collection;

            fn id(&self) -> &str {
                &self.id
            }
        }
    };
}

document!(User, Collection::Users);
document!(Role, Collection::Roles);
document!(Exhibition, Collection::Exhibitions);
document!(Project, Collection::Projects);
document!(Review, Collection::Reviews);
document!(Company, Collection::Companies);
document!(SchoolClass, Collection::Classes);
document!(Knowledge, Collection::Knowledge);

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Condition {
    Id(String),
    IdIn(Vec<String>),
    IdNotIn(Vec<String>),
    Eq(&'static str, Value),
    EqIgnoreCase(&'static str, String),
    IsNull(&'static str),
    Contains(&'static str, String),
    /// Some object in the array at `array` has `field` equal to the value.
    AnyElement {
        array: &'static str,
        field: &'static str,
        value: Value,
    },
    /// The scalar array at `array` contains the value.
    ArrayContains(&'static str, Value),
}

/// Conjunction of conditions over document JSON paths.
///
/// An empty filter matches every document. Paths are `SQLite` JSON paths
/// (`$.project.id`); they are bound as parameters like values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocFilter {
    conditions: Vec<Condition>,
}

impl DocFilter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.conditions.push(Condition::Id(id.into()));
        self
    }

    /// Matches documents whose id is in `ids`. An empty set matches nothing.
    #[must_use]
    pub fn id_in(mut self, ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.conditions
            .push(Condition::IdIn(ids.into_iter().map(Into::into).collect()));
        self
    }

    /// Excludes documents whose id is in `ids`. An empty set excludes nothing.
    #[must_use]
    pub fn id_not_in(mut self, ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.conditions
            .push(Condition::IdNotIn(ids.into_iter().map(Into::into).collect()));
        self
    }

    #[must_use]
    pub fn eq(mut self, path: &'static str, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Eq(path, value.into()));
        self
    }

    #[must_use]
    pub fn eq_ignore_case(mut self, path: &'static str, value: impl Into<String>) -> Self {
        self.conditions
            .push(Condition::EqIgnoreCase(path, value.into()));
        self
    }

    /// Field is JSON null or absent.
    #[must_use]
    pub fn is_null(mut self, path: &'static str) -> Self {
        self.conditions.push(Condition::IsNull(path));
        self
    }

    /// Case-insensitive substring match.
    #[must_use]
    pub fn contains(mut self, path: &'static str, needle: impl Into<String>) -> Self {
        self.conditions
            .push(Condition::Contains(path, needle.into()));
        self
    }

    #[must_use]
    pub fn any_element(
        mut self,
        array: &'static str,
        field: &'static str,
        value: impl Into<Value>,
    ) -> Self {
        self.conditions.push(Condition::AnyElement {
            array,
            field,
            value: value.into(),
        });
        self
    }

    #[must_use]
    pub fn array_contains(mut self, array: &'static str, value: impl Into<Value>) -> Self {
        self.conditions
            .push(Condition::ArrayContains(array, value.into()));
        self
    }

    /// Render as a `WHERE` body, numbering placeholders from `first_param`.
    ///
    /// Returns `("1", [])` for an empty filter.
    #[must_use]
    pub fn to_sql(&self, first_param: usize) -> (String, Vec<libsql::Value>) {
        let mut clauses = Vec::with_capacity(self.conditions.len());
        let mut params: Vec<libsql::Value> = Vec::new();

        for condition in &self.conditions {
            let p = first_param + params.len();
            let clause = match condition {
                Condition::Id(id) => {
                    params.push(libsql::Value::Text(id.clone()));
                    format!("id = ?{p}")
                }
                Condition::IdIn(ids) | Condition::IdNotIn(ids) if ids.is_empty() => {
                    if matches!(condition, Condition::IdIn(_)) {
                        "0".to_string()
                    } else {
                        "1".to_string()
                    }
                }
                Condition::IdIn(ids) | Condition::IdNotIn(ids) => {
                    let placeholders: Vec<String> =
                        (0..ids.len()).map(|i| format!("?{}", p + i)).collect();
                    params.extend(ids.iter().cloned().map(libsql::Value::Text));
                    let op = if matches!(condition, Condition::IdIn(_)) {
                        "IN"
                    } else {
                        "NOT IN"
                    };
                    format!("id {op} ({})", placeholders.join(", "))
                }
                Condition::Eq(path, value) => {
                    params.push(libsql::Value::Text((*path).to_string()));
                    params.push(json_to_sql(value));
                    format!("json_extract(doc, ?{p}) = ?{}", p + 1)
                }
                Condition::EqIgnoreCase(path, value) => {
                    params.push(libsql::Value::Text((*path).to_string()));
                    params.push(libsql::Value::Text(value.clone()));
                    format!("lower(json_extract(doc, ?{p})) = lower(?{})", p + 1)
                }
                Condition::IsNull(path) => {
                    params.push(libsql::Value::Text((*path).to_string()));
                    format!("json_extract(doc, ?{p}) IS NULL")
                }
                Condition::Contains(path, needle) => {
                    params.push(libsql::Value::Text((*path).to_string()));
                    params.push(libsql::Value::Text(format!(
                        "%{}%",
                        escape_like(&needle.to_lowercase())
                    )));
                    format!(
                        "lower(json_extract(doc, ?{p})) LIKE ?{} ESCAPE '\\'",
                        p + 1
                    )
                }
                Condition::AnyElement {
                    array,
                    field,
                    value,
                } => {
                    params.push(libsql::Value::Text((*array).to_string()));
                    params.push(libsql::Value::Text((*field).to_string()));
                    params.push(json_to_sql(value));
                    format!(
                        "EXISTS (SELECT 1 FROM json_each(doc, ?{p}) \
                         WHERE json_extract(json_each.value, ?{}) = ?{})",
                        p + 1,
                        p + 2
                    )
                }
                Condition::ArrayContains(array, value) => {
                    params.push(libsql::Value::Text((*array).to_string()));
                    params.push(json_to_sql(value));
                    format!(
                        "EXISTS (SELECT 1 FROM json_each(doc, ?{p}) WHERE json_each.value = ?{})",
                        p + 1
                    )
                }
            };
            clauses.push(clause);
        }

        if clauses.is_empty() {
            ("1".to_string(), params)
        } else {
            (clauses.join(" AND "), params)
        }
    }
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

impl ExpoDb {
    /// Fetch one document. Absence is `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails or the stored document does
    /// not deserialize.
    pub async fn find_by_id<T: Document>(&self, id: &str) -> Result<Option<T>, DatabaseError> {
        let sql = format!("SELECT doc FROM {} WHERE id = ?1", T::COLLECTION.table());
        let mut rows = self.query_with(&sql, || [id]).await?;
        match rows.next().await? {
            Some(row) => Ok(Some(serde_json::from_str(&row.get::<String>(0)?)?)),
            None => Ok(None),
        }
    }

    /// Fetch every document matching `filter`, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails or a document does not
    /// deserialize.
    pub async fn find_many<T: Document>(&self, filter: &DocFilter) -> Result<Vec<T>, DatabaseError> {
        let (clause, params) = filter.to_sql(1);
        let sql = format!(
            "SELECT doc FROM {} WHERE {clause} ORDER BY rowid",
            T::COLLECTION.table()
        );
        let mut rows = self
            .query_with(&sql, || libsql::params_from_iter(params.clone()))
            .await?;
        let mut docs = Vec::new();
        while let Some(row) = rows.next().await? {
            docs.push(serde_json::from_str(&row.get::<String>(0)?)?);
        }
        Ok(docs)
    }

    /// First document matching `filter`, if any.
    ///
    /// # Errors
    ///
    /// Same as [`Self::find_many`].
    pub async fn find_one<T: Document>(&self, filter: &DocFilter) -> Result<Option<T>, DatabaseError> {
        let (clause, params) = filter.to_sql(1);
        let sql = format!(
            "SELECT doc FROM {} WHERE {clause} ORDER BY rowid LIMIT 1",
            T::COLLECTION.table()
        );
        let mut rows = self
            .query_with(&sql, || libsql::params_from_iter(params.clone()))
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(serde_json::from_str(&row.get::<String>(0)?)?)),
            None => Ok(None),
        }
    }

    /// Number of documents in `collection` matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn count(&self, collection: Collection, filter: &DocFilter) -> Result<u64, DatabaseError> {
        let (clause, params) = filter.to_sql(1);
        let sql = format!("SELECT COUNT(*) FROM {} WHERE {clause}", collection.table());
        let mut rows = self
            .query_with(&sql, || libsql::params_from_iter(params.clone()))
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        let n = row.get::<i64>(0)?;
        Ok(u64::try_from(n).unwrap_or_default())
    }

    /// Insert a new document.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` on serialization failure or constraint
    /// violation (duplicate id, duplicate email).
    pub async fn insert<T: Document>(&self, doc: &T) -> Result<u64, DatabaseError> {
        let json = serde_json::to_string(doc)?;
        let sql = format!("INSERT INTO {} (id, doc) VALUES (?1, ?2)", T::COLLECTION.table());
        self.execute_with(&sql, || libsql::params![doc.id(), json.as_str()])
            .await
    }

    /// Apply an RFC 7396 merge patch to one document. A `null` member removes
    /// the field.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the update fails.
    pub async fn update_fields(
        &self,
        collection: Collection,
        id: &str,
        patch: &Value,
    ) -> Result<u64, DatabaseError> {
        let json = patch.to_string();
        let sql = format!(
            "UPDATE {} SET doc = json_patch(doc, ?1) WHERE id = ?2",
            collection.table()
        );
        self.execute_with(&sql, || libsql::params![json.as_str(), id])
            .await
    }

    /// Write only the top-level `fields` of `doc`; the rest of the stored
    /// document is left as it is. A field `doc` does not serialize is removed.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` on serialization failure or if the update fails.
    pub async fn write_fields<T: Document>(
        &self,
        doc: &T,
        fields: &[&str],
    ) -> Result<u64, DatabaseError> {
        let Value::Object(mut full) = serde_json::to_value(doc)? else {
            return Err(DatabaseError::InvalidState(format!(
                "{} '{}' does not serialize to an object",
                T::COLLECTION.table(),
                doc.id()
            )));
        };
        let patch: serde_json::Map<String, Value> = fields
            .iter()
            .map(|field| ((*field).to_string(), full.remove(*field).unwrap_or(Value::Null)))
            .collect();
        self.update_fields(T::COLLECTION, doc.id(), &Value::Object(patch))
            .await
    }

    /// Append the scalar `value` to the array at `array` in every document
    /// matching `filter` that does not hold it yet.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the update fails.
    pub async fn add_to_set_where(
        &self,
        collection: Collection,
        array: &'static str,
        value: &Value,
        filter: &DocFilter,
    ) -> Result<u64, DatabaseError> {
        let (clause, mut params) = filter.to_sql(4);
        params.insert(0, json_to_sql(value));
        params.insert(0, libsql::Value::Text(value.to_string()));
        params.insert(0, libsql::Value::Text(array.to_string()));
        let sql = format!(
            "UPDATE {} SET doc = json_insert(doc, ?1 || '[#]', json(?2))
             WHERE NOT EXISTS (SELECT 1 FROM json_each(doc, ?1) WHERE json_each.value = ?3)
               AND {clause}",
            collection.table()
        );
        self.execute_with(&sql, || libsql::params_from_iter(params.clone()))
            .await
    }

    /// Remove every occurrence of the scalar `value` from the array at `array`
    /// in documents matching `filter`. Documents without it are not written.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the update fails.
    pub async fn pull_where(
        &self,
        collection: Collection,
        array: &'static str,
        value: &Value,
        filter: &DocFilter,
    ) -> Result<u64, DatabaseError> {
        let (clause, mut params) = filter.to_sql(3);
        params.insert(0, json_to_sql(value));
        params.insert(0, libsql::Value::Text(array.to_string()));
        let sql = format!(
            "UPDATE {} SET doc = json_set(doc, ?1, json((
                 SELECT json_group_array(json_each.value) FROM json_each(doc, ?1)
                 WHERE json_each.value != ?2)))
             WHERE EXISTS (SELECT 1 FROM json_each(doc, ?1) WHERE json_each.value = ?2)
               AND {clause}",
            collection.table()
        );
        self.execute_with(&sql, || libsql::params_from_iter(params.clone()))
            .await
    }

    /// Overwrite a document if it still matches `precondition`.
    ///
    /// Returns 0 when the document is gone or the precondition no longer holds.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the update fails.
    pub async fn replace_if<T: Document>(
        &self,
        doc: &T,
        precondition: &DocFilter,
    ) -> Result<u64, DatabaseError> {
        let json = serde_json::to_string(doc)?;
        let (clause, mut params) = precondition.to_sql(3);
        params.insert(0, libsql::Value::Text(doc.id().to_string()));
        params.insert(0, libsql::Value::Text(json));
        let sql = format!(
            "UPDATE {} SET doc = ?1 WHERE id = ?2 AND {clause}",
            T::COLLECTION.table()
        );
        self.execute_with(&sql, || libsql::params_from_iter(params.clone()))
            .await
    }

    /// Overwrite a document unconditionally.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the update fails.
    pub async fn replace<T: Document>(&self, doc: &T) -> Result<u64, DatabaseError> {
        self.replace_if(doc, &DocFilter::new()).await
    }

    /// Set `path` to `value` in every document matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the update fails.
    pub async fn set_path_where(
        &self,
        collection: Collection,
        path: &'static str,
        value: &Value,
        filter: &DocFilter,
    ) -> Result<u64, DatabaseError> {
        let (clause, mut params) = filter.to_sql(3);
        params.insert(0, libsql::Value::Text(value.to_string()));
        params.insert(0, libsql::Value::Text(path.to_string()));
        let sql = format!(
            "UPDATE {} SET doc = json_set(doc, ?1, json(?2)) WHERE {clause}",
            collection.table()
        );
        self.execute_with(&sql, || libsql::params_from_iter(params.clone()))
            .await
    }

    /// Remove `path` from every document matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the update fails.
    pub async fn remove_path_where(
        &self,
        collection: Collection,
        path: &'static str,
        filter: &DocFilter,
    ) -> Result<u64, DatabaseError> {
        let (clause, mut params) = filter.to_sql(2);
        params.insert(0, libsql::Value::Text(path.to_string()));
        let sql = format!(
            "UPDATE {} SET doc = json_remove(doc, ?1) WHERE {clause}",
            collection.table()
        );
        self.execute_with(&sql, || libsql::params_from_iter(params.clone()))
            .await
    }

    /// Read-modify-write every document matching `filter`.
    ///
    /// `edit` returns whether it changed the document; unchanged documents are
    /// not written. Returns the number of documents written.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if a read or write fails.
    pub async fn modify_where<T, F>(&self, filter: &DocFilter, mut edit: F) -> Result<u64, DatabaseError>
    where
        T: Document,
        F: FnMut(&mut T) -> bool,
    {
        let mut written = 0;
        for mut doc in self.find_many::<T>(filter).await? {
            if edit(&mut doc) {
                written += self.replace(&doc).await?;
            }
        }
        Ok(written)
    }

    /// Delete one document.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the delete fails.
    pub async fn delete(&self, collection: Collection, id: &str) -> Result<u64, DatabaseError> {
        let sql = format!("DELETE FROM {} WHERE id = ?1", collection.table());
        self.execute_with(&sql, || [id]).await
    }

    /// Stamp `deactivation_date` on one document.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the update fails.
    pub async fn deactivate(
        &self,
        collection: Collection,
        id: &str,
        at: DateTime<Utc>,
    ) -> Result<u64, DatabaseError> {
        self.set_path_where(
            collection,
            "$.deactivation_date",
            &serde_json::to_value(at)?,
            &DocFilter::new().id(id),
        )
        .await
    }
}
