//! libSQL backend: implements the settings and profile stores.
//!
//! Supports local file and in-memory databases.

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::onboarding::model::{NewProfile, Profile, ProfileId};
use crate::store::migrations;
use crate::store::traits::{ProfileStore, SettingsStore};

/// libSQL database backend.
///
/// Stores a single connection that is reused for all operations.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let backend = Self::from_database(db)?;
        backend.init_schema().await?;
        info!(path = %path.display(), "Database opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Pool(format!("Failed to create in-memory database: {e}"))
            })?;

        let backend = Self::from_database(db)?;
        backend.init_schema().await?;
        Ok(backend)
    }

    fn from_database(db: LibSqlDatabase) -> Result<Self, DatabaseError> {
        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;
        Ok(Self {
            db: Arc::new(db),
            conn,
        })
    }

    /// Run all pending schema migrations.
    pub async fn init_schema(&self) -> Result<(), DatabaseError> {
        migrations::run_migrations(self.conn()).await
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }
}

// ── Helper functions ────────────────────────────────────────────────

/// Parse an RFC 3339 or SQLite datetime string into DateTime<Utc>.
fn parse_datetime(s: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return ndt.and_utc();
    }
    DateTime::<Utc>::MIN_UTC
}

/// Convert `Option<u32>` to libsql Value.
fn opt_int(v: Option<u32>) -> libsql::Value {
    match v {
        Some(v) => libsql::Value::Integer(i64::from(v)),
        None => libsql::Value::Null,
    }
}

/// Convert `Option<f64>` to libsql Value.
fn opt_real(v: Option<f64>) -> libsql::Value {
    match v {
        Some(v) => libsql::Value::Real(v),
        None => libsql::Value::Null,
    }
}

/// Convert `Option<&str>` to libsql Value.
fn opt_text(s: Option<&str>) -> libsql::Value {
    match s {
        Some(s) => libsql::Value::Text(s.to_string()),
        None => libsql::Value::Null,
    }
}

fn to_json_text<T: Serialize + ?Sized>(value: &T) -> Result<String, DatabaseError> {
    serde_json::to_string(value).map_err(|e| DatabaseError::Serialization(e.to_string()))
}

fn from_json_text<T: DeserializeOwned>(column: &str, raw: &str) -> Result<T, DatabaseError> {
    serde_json::from_str(raw)
        .map_err(|e| DatabaseError::Serialization(format!("{column}: {e}")))
}

fn parse_column<T>(column: &str, raw: &str) -> Result<T, DatabaseError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse()
        .map_err(|e| DatabaseError::Serialization(format!("{column}: {e}")))
}

fn to_u32(column: &str, v: i64) -> Result<u32, DatabaseError> {
    u32::try_from(v).map_err(|e| DatabaseError::Serialization(format!("{column}: {e}")))
}

const PROFILE_COLUMNS: &str = "id, name, age, sex, height_cm, weight_kg, \
     fitness_goal, experience_level, days_per_week, session_duration, equipment, constraints, workout_style, \
     dietary_style, allergens, favorite_ingredients, disliked_ingredients, meals_per_day, meal_prep_time, cooking_tools, \
     created_at, updated_at";

fn row_to_profile(row: &libsql::Row) -> Result<Profile, DatabaseError> {
    let get_text = |idx: i32, column: &str| -> Result<String, DatabaseError> {
        row.get::<String>(idx)
            .map_err(|e| DatabaseError::Serialization(format!("{column}: {e}")))
    };
    let get_int = |idx: i32, column: &str| -> Result<u32, DatabaseError> {
        let v = row
            .get::<i64>(idx)
            .map_err(|e| DatabaseError::Serialization(format!("{column}: {e}")))?;
        to_u32(column, v)
    };

    let id: Uuid = parse_column("id", &get_text(0, "id")?)?;
    let age = row.get::<i64>(2).ok().map(|v| to_u32("age", v)).transpose()?;
    let sex = row
        .get::<String>(3)
        .ok()
        .map(|s| parse_column("sex", &s))
        .transpose()?;
    let height_cm = row
        .get::<i64>(4)
        .ok()
        .map(|v| to_u32("height_cm", v))
        .transpose()?;
    let weight_kg = row.get::<f64>(5).ok();

    let fields = NewProfile {
        name: get_text(1, "name")?,
        age,
        sex,
        height_cm,
        weight_kg,
        fitness_goal: parse_column("fitness_goal", &get_text(6, "fitness_goal")?)?,
        experience_level: parse_column("experience_level", &get_text(7, "experience_level")?)?,
        days_per_week: get_int(8, "days_per_week")?,
        session_duration: get_int(9, "session_duration")?,
        equipment: from_json_text("equipment", &get_text(10, "equipment")?)?,
        constraints: from_json_text("constraints", &get_text(11, "constraints")?)?,
        workout_style: parse_column("workout_style", &get_text(12, "workout_style")?)?,
        dietary_style: parse_column("dietary_style", &get_text(13, "dietary_style")?)?,
        allergens: from_json_text("allergens", &get_text(14, "allergens")?)?,
        favorite_ingredients: from_json_text(
            "favorite_ingredients",
            &get_text(15, "favorite_ingredients")?,
        )?,
        disliked_ingredients: from_json_text(
            "disliked_ingredients",
            &get_text(16, "disliked_ingredients")?,
        )?,
        meals_per_day: get_int(17, "meals_per_day")?,
        meal_prep_time: get_int(18, "meal_prep_time")?,
        cooking_tools: from_json_text("cooking_tools", &get_text(19, "cooking_tools")?)?,
    };

    Ok(Profile {
        id: ProfileId(id),
        fields,
        created_at: parse_datetime(&get_text(20, "created_at")?),
        updated_at: parse_datetime(&get_text(21, "updated_at")?),
    })
}

// ── Settings ────────────────────────────────────────────────────────

#[async_trait]
impl SettingsStore for LibSqlBackend {
    async fn get_setting(
        &self,
        user_id: &str,
        key: &str,
    ) -> Result<Option<serde_json::Value>, DatabaseError> {
        let conn = self.conn();
        let mut rows = conn
            .query(
                "SELECT value FROM settings WHERE user_id = ?1 AND key = ?2",
                params![user_id, key],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_setting: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let value_str: String = row.get(0).unwrap_or_else(|_| "null".to_string());
                let value: serde_json::Value =
                    serde_json::from_str(&value_str).unwrap_or(serde_json::Value::Null);
                Ok(Some(value))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("get_setting: {e}"))),
        }
    }

    async fn set_setting(
        &self,
        user_id: &str,
        key: &str,
        value: &serde_json::Value,
    ) -> Result<(), DatabaseError> {
        let conn = self.conn();
        let now = Utc::now().to_rfc3339();
        let value_str = to_json_text(value)?;

        conn.execute(
            "INSERT INTO settings (user_id, key, value, updated_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (user_id, key) DO UPDATE SET value = ?3, updated_at = ?4",
            params![user_id, key, value_str, now],
        )
        .await
        .map_err(|e| DatabaseError::Query(format!("set_setting: {e}")))?;

        debug!(user_id, key, "Setting stored");
        Ok(())
    }

    async fn delete_setting(&self, user_id: &str, key: &str) -> Result<bool, DatabaseError> {
        let conn = self.conn();
        let count = conn
            .execute(
                "DELETE FROM settings WHERE user_id = ?1 AND key = ?2",
                params![user_id, key],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("delete_setting: {e}")))?;
        Ok(count > 0)
    }
}

// ── Profiles ────────────────────────────────────────────────────────

#[async_trait]
impl ProfileStore for LibSqlBackend {
    async fn insert_profile(&self, profile: &NewProfile) -> Result<Profile, DatabaseError> {
        let conn = self.conn();
        let id = Uuid::new_v4();
        let now = Utc::now();
        let now_str = now.to_rfc3339();

        conn.execute(
            &format!(
                "INSERT INTO user_profiles ({PROFILE_COLUMNS}) VALUES \
                 (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22)"
            ),
            params![
                id.to_string(),
                profile.name.clone(),
                opt_int(profile.age),
                opt_text(profile.sex.map(|s| s.as_str())),
                opt_int(profile.height_cm),
                opt_real(profile.weight_kg),
                profile.fitness_goal.as_str(),
                profile.experience_level.as_str(),
                i64::from(profile.days_per_week),
                i64::from(profile.session_duration),
                to_json_text(&profile.equipment)?,
                to_json_text(&profile.constraints)?,
                profile.workout_style.as_str(),
                profile.dietary_style.as_str(),
                to_json_text(&profile.allergens)?,
                to_json_text(&profile.favorite_ingredients)?,
                to_json_text(&profile.disliked_ingredients)?,
                i64::from(profile.meals_per_day),
                i64::from(profile.meal_prep_time),
                to_json_text(&profile.cooking_tools)?,
                now_str.clone(),
                now_str,
            ],
        )
        .await
        .map_err(|e| DatabaseError::Query(format!("insert_profile: {e}")))?;

        info!(profile_id = %id, "Profile inserted");

        // Round-trip through the formatted timestamp so the returned record
        // matches what a later `get_profile` yields.
        let stored_at = parse_datetime(&now.to_rfc3339());
        Ok(Profile {
            id: ProfileId(id),
            fields: profile.clone(),
            created_at: stored_at,
            updated_at: stored_at,
        })
    }

    async fn get_profile(&self, id: ProfileId) -> Result<Option<Profile>, DatabaseError> {
        let conn = self.conn();
        let mut rows = conn
            .query(
                &format!("SELECT {PROFILE_COLUMNS} FROM user_profiles WHERE id = ?1"),
                params![id.to_string()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_profile: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => row_to_profile(&row).map(Some),
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("get_profile: {e}"))),
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::onboarding::model::{
        Allergen, Constraint, CookingTool, DietaryStyle, Equipment, ExperienceLevel, FitnessGoal,
        Sex, WorkoutStyle,
    };

    async fn test_db() -> LibSqlBackend {
        LibSqlBackend::new_memory().await.unwrap()
    }

    fn make_profile() -> NewProfile {
        NewProfile {
            name: "Alex".to_string(),
            age: Some(34),
            sex: Some(Sex::Female),
            height_cm: None,
            weight_kg: Some(61.5),
            fitness_goal: FitnessGoal::Strength,
            experience_level: ExperienceLevel::Intermediate,
            days_per_week: 4,
            session_duration: 60,
            equipment: vec![Equipment::Barbell, Equipment::Dumbbells],
            constraints: vec![Constraint::LowBack],
            workout_style: WorkoutStyle::Powerlifting,
            dietary_style: DietaryStyle::HighProtein,
            allergens: vec![Allergen::Shellfish],
            favorite_ingredients: vec!["salmon".to_string(), "rice".to_string()],
            disliked_ingredients: vec!["olives".to_string()],
            meals_per_day: 4,
            meal_prep_time: 45,
            cooking_tools: vec![CookingTool::Oven, CookingTool::AirFryer],
        }
    }

    // ── Settings tests ──────────────────────────────────────────────

    #[tokio::test]
    async fn settings_crud() {
        let db = test_db().await;
        let value = serde_json::json!({"version": 1, "step": 2});

        db.set_setting("user1", "onboarding_draft", &value)
            .await
            .unwrap();

        let fetched = db
            .get_setting("user1", "onboarding_draft")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched["step"], 2);

        // Update (upsert)
        let updated = serde_json::json!({"version": 1, "step": 3});
        db.set_setting("user1", "onboarding_draft", &updated)
            .await
            .unwrap();
        let fetched2 = db
            .get_setting("user1", "onboarding_draft")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched2["step"], 3);

        let deleted = db.delete_setting("user1", "onboarding_draft").await.unwrap();
        assert!(deleted);
        let gone = db.get_setting("user1", "onboarding_draft").await.unwrap();
        assert!(gone.is_none());

        // Delete non-existent
        let again = db.delete_setting("user1", "onboarding_draft").await.unwrap();
        assert!(!again);
    }

    #[tokio::test]
    async fn settings_user_isolation() {
        let db = test_db().await;

        db.set_setting("user1", "session", &serde_json::json!("a"))
            .await
            .unwrap();
        db.set_setting("user2", "session", &serde_json::json!("b"))
            .await
            .unwrap();

        let v1 = db.get_setting("user1", "session").await.unwrap().unwrap();
        let v2 = db.get_setting("user2", "session").await.unwrap().unwrap();
        assert_eq!(v1, "a");
        assert_eq!(v2, "b");
    }

    #[tokio::test]
    async fn settings_get_nonexistent() {
        let db = test_db().await;
        let result = db.get_setting("nobody", "nothing").await.unwrap();
        assert!(result.is_none());
    }

    // ── Profile tests ───────────────────────────────────────────────

    #[tokio::test]
    async fn insert_and_get_profile() {
        let db = test_db().await;
        let new_profile = make_profile();

        let inserted = db.insert_profile(&new_profile).await.unwrap();
        assert_eq!(inserted.fields, new_profile);

        let fetched = db.get_profile(inserted.id).await.unwrap().unwrap();
        assert_eq!(fetched, inserted);
        assert_eq!(fetched.fields.height_cm, None);
        assert_eq!(fetched.fields.weight_kg, Some(61.5));
        assert_eq!(
            fetched.fields.cooking_tools,
            vec![CookingTool::Oven, CookingTool::AirFryer]
        );
    }

    #[tokio::test]
    async fn each_insert_gets_a_fresh_id() {
        let db = test_db().await;
        let a = db.insert_profile(&make_profile()).await.unwrap();
        let b = db.insert_profile(&make_profile()).await.unwrap();
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn get_profile_not_found() {
        let db = test_db().await;
        let result = db.get_profile(ProfileId(Uuid::new_v4())).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn data_survives_reopen() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("fitgoal.db");

        let id = {
            let db = LibSqlBackend::new_local(&path).await.unwrap();
            db.set_setting("default", "session", &serde_json::json!("x"))
                .await
                .unwrap();
            db.insert_profile(&make_profile()).await.unwrap().id
        };

        let db = LibSqlBackend::new_local(&path).await.unwrap();
        assert_eq!(
            db.get_setting("default", "session").await.unwrap(),
            Some(serde_json::json!("x"))
        );
        assert!(db.get_profile(id).await.unwrap().is_some());
    }
}
