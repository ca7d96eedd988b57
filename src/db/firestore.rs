// SPDX-License-Identifier: MIT

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Trainers and trainer apps (account storage)
//! - Clients, locations and sessions (scheduling data)
//! - Session exercises, exercise sets and templates (workout records)
//! - Payments (append-only ledger)
//!
//! Queries stick to equality filters plus a single order-by; richer
//! predicates (status sets, date windows) are applied in memory by the
//! services layer so they stay testable without a live database.

use crate::db::collections;
use crate::error::AppError;
use crate::models::{
    Client, ExerciseSet, ExerciseTemplate, Location, Payment, SessionExercise, SessionGroup,
    Trainer, TrainerApp, TrainingSession,
};
use futures_util::{stream, StreamExt};

const MAX_CONCURRENT_DB_OPS: usize = 50;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        // Use ExternalJwtFunctionSource to provide a dummy token without needing async-trait
        // or a custom TokenSource implementation struct.
        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn fs(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── Trainer Operations ──────────────────────────────────────

    /// Get a trainer by ID.
    pub async fn get_trainer(&self, trainer_id: u64) -> Result<Option<Trainer>, AppError> {
        self.fs()?
            .fluent()
            .select()
            .by_id_in(collections::TRAINERS)
            .obj()
            .one(&trainer_id.to_string())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a trainer by email (used at sign-in).
    pub async fn find_trainer_by_email(&self, email: &str) -> Result<Option<Trainer>, AppError> {
        let email = email.to_string();
        let mut trainers: Vec<Trainer> = self
            .fs()?
            .fluent()
            .select()
            .from(collections::TRAINERS)
            .filter(move |q| q.field("email").eq(email.clone()))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(trainers.pop())
    }

    /// Create or update a trainer.
    pub async fn upsert_trainer(&self, trainer: &Trainer) -> Result<(), AppError> {
        let _: () = self
            .fs()?
            .fluent()
            .update()
            .in_col(collections::TRAINERS)
            .document_id(trainer.id.to_string())
            .object(trainer)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Trainer App Operations ──────────────────────────────────

    pub async fn get_trainer_app(&self, app_id: u64) -> Result<Option<TrainerApp>, AppError> {
        self.fs()?
            .fluent()
            .select()
            .by_id_in(collections::TRAINER_APPS)
            .obj()
            .one(&app_id.to_string())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn list_apps_for_trainer(
        &self,
        trainer_id: u64,
    ) -> Result<Vec<TrainerApp>, AppError> {
        self.fs()?
            .fluent()
            .select()
            .from(collections::TRAINER_APPS)
            .filter(move |q| q.field("trainer_id").eq(trainer_id))
            .order_by([("name", firestore::FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn upsert_trainer_app(&self, app: &TrainerApp) -> Result<(), AppError> {
        let _: () = self
            .fs()?
            .fluent()
            .update()
            .in_col(collections::TRAINER_APPS)
            .document_id(app.id.to_string())
            .object(app)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    pub async fn delete_trainer_app(&self, app_id: u64) -> Result<(), AppError> {
        self.fs()?
            .fluent()
            .delete()
            .from(collections::TRAINER_APPS)
            .document_id(app_id.to_string())
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Client Operations ───────────────────────────────────────

    pub async fn get_client(&self, client_id: u64) -> Result<Option<Client>, AppError> {
        self.fs()?
            .fluent()
            .select()
            .by_id_in(collections::CLIENTS)
            .obj()
            .one(&client_id.to_string())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// All clients of a trainer, tombstoned ones included. Callers filter
    /// soft-deleted rows out when listing.
    pub async fn list_clients_for_trainer(&self, trainer_id: u64) -> Result<Vec<Client>, AppError> {
        self.fs()?
            .fluent()
            .select()
            .from(collections::CLIENTS)
            .filter(move |q| q.field("trainer_id").eq(trainer_id))
            .order_by([("name", firestore::FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn upsert_client(&self, client: &Client) -> Result<(), AppError> {
        let _: () = self
            .fs()?
            .fluent()
            .update()
            .in_col(collections::CLIENTS)
            .document_id(client.id.to_string())
            .object(client)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Location Operations ─────────────────────────────────────

    pub async fn get_location(&self, location_id: u64) -> Result<Option<Location>, AppError> {
        self.fs()?
            .fluent()
            .select()
            .by_id_in(collections::LOCATIONS)
            .obj()
            .one(&location_id.to_string())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn list_locations_for_trainer(
        &self,
        trainer_id: u64,
    ) -> Result<Vec<Location>, AppError> {
        self.fs()?
            .fluent()
            .select()
            .from(collections::LOCATIONS)
            .filter(move |q| q.field("trainer_id").eq(trainer_id))
            .order_by([("name", firestore::FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn upsert_location(&self, location: &Location) -> Result<(), AppError> {
        let _: () = self
            .fs()?
            .fluent()
            .update()
            .in_col(collections::LOCATIONS)
            .document_id(location.id.to_string())
            .object(location)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    pub async fn delete_location(&self, location_id: u64) -> Result<(), AppError> {
        self.fs()?
            .fluent()
            .delete()
            .from(collections::LOCATIONS)
            .document_id(location_id.to_string())
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Exercise Template Operations ────────────────────────────

    pub async fn get_template(
        &self,
        template_id: u64,
    ) -> Result<Option<ExerciseTemplate>, AppError> {
        self.fs()?
            .fluent()
            .select()
            .by_id_in(collections::EXERCISE_TEMPLATES)
            .obj()
            .one(&template_id.to_string())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn list_templates_for_app(
        &self,
        trainer_app_id: u64,
    ) -> Result<Vec<ExerciseTemplate>, AppError> {
        self.fs()?
            .fluent()
            .select()
            .from(collections::EXERCISE_TEMPLATES)
            .filter(move |q| q.field("trainer_app_id").eq(trainer_app_id))
            .order_by([("name", firestore::FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn upsert_template(&self, template: &ExerciseTemplate) -> Result<(), AppError> {
        let _: () = self
            .fs()?
            .fluent()
            .update()
            .in_col(collections::EXERCISE_TEMPLATES)
            .document_id(template.id.to_string())
            .object(template)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    pub async fn delete_template(&self, template_id: u64) -> Result<(), AppError> {
        self.fs()?
            .fluent()
            .delete()
            .from(collections::EXERCISE_TEMPLATES)
            .document_id(template_id.to_string())
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Exercises still referencing a template (used to detach them when the
    /// template is deleted).
    pub async fn list_exercises_for_template(
        &self,
        template_id: u64,
    ) -> Result<Vec<SessionExercise>, AppError> {
        self.fs()?
            .fluent()
            .select()
            .from(collections::SESSION_EXERCISES)
            .filter(move |q| q.field("exercise_template_id").eq(template_id))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Session Operations ──────────────────────────────────────

    pub async fn get_session(&self, session_id: u64) -> Result<Option<TrainingSession>, AppError> {
        self.fs()?
            .fluent()
            .select()
            .by_id_in(collections::SESSIONS)
            .obj()
            .one(&session_id.to_string())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn upsert_session(&self, session: &TrainingSession) -> Result<(), AppError> {
        let _: () = self
            .fs()?
            .fluent()
            .update()
            .in_col(collections::SESSIONS)
            .document_id(session.id.to_string())
            .object(session)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// All sessions of a trainer in chronological order. Date-window and
    /// status filtering happens in the caller.
    pub async fn list_sessions_for_trainer(
        &self,
        trainer_id: u64,
    ) -> Result<Vec<TrainingSession>, AppError> {
        self.fs()?
            .fluent()
            .select()
            .from(collections::SESSIONS)
            .filter(move |q| q.field("trainer_id").eq(trainer_id))
            .order_by([(
                "scheduled_at",
                firestore::FirestoreQueryDirection::Ascending,
            )])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// A client's session history, newest first.
    pub async fn list_sessions_for_client(
        &self,
        client_id: u64,
    ) -> Result<Vec<TrainingSession>, AppError> {
        self.fs()?
            .fluent()
            .select()
            .from(collections::SESSIONS)
            .filter(move |q| q.field("client_id").eq(client_id))
            .order_by([(
                "scheduled_at",
                firestore::FirestoreQueryDirection::Descending,
            )])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Sessions currently in progress for a trainer.
    pub async fn list_in_progress_sessions(
        &self,
        trainer_id: u64,
    ) -> Result<Vec<TrainingSession>, AppError> {
        self.fs()?
            .fluent()
            .select()
            .from(collections::SESSIONS)
            .filter(move |q| {
                q.for_all([
                    q.field("trainer_id").eq(trainer_id),
                    q.field("status").eq("in_progress"),
                ])
            })
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Sessions still in `scheduled` state for a trainer (near-now matching
    /// happens in the caller).
    pub async fn list_scheduled_sessions(
        &self,
        trainer_id: u64,
    ) -> Result<Vec<TrainingSession>, AppError> {
        self.fs()?
            .fluent()
            .select()
            .from(collections::SESSIONS)
            .filter(move |q| {
                q.for_all([
                    q.field("trainer_id").eq(trainer_id),
                    q.field("status").eq("scheduled"),
                ])
            })
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Child sessions of a session group.
    pub async fn list_sessions_in_group(
        &self,
        session_group_id: u64,
    ) -> Result<Vec<TrainingSession>, AppError> {
        self.fs()?
            .fluent()
            .select()
            .from(collections::SESSIONS)
            .filter(move |q| q.field("session_group_id").eq(session_group_id))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Session Group Operations ────────────────────────────────

    pub async fn get_group(&self, group_id: u64) -> Result<Option<SessionGroup>, AppError> {
        self.fs()?
            .fluent()
            .select()
            .by_id_in(collections::SESSION_GROUPS)
            .obj()
            .one(&group_id.to_string())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn upsert_group(&self, group: &SessionGroup) -> Result<(), AppError> {
        let _: () = self
            .fs()?
            .fluent()
            .update()
            .in_col(collections::SESSION_GROUPS)
            .document_id(group.id.to_string())
            .object(group)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// All groups of a trainer, newest slot first.
    pub async fn list_groups_for_trainer(
        &self,
        trainer_id: u64,
    ) -> Result<Vec<SessionGroup>, AppError> {
        self.fs()?
            .fluent()
            .select()
            .from(collections::SESSION_GROUPS)
            .filter(move |q| q.field("trainer_id").eq(trainer_id))
            .order_by([(
                "scheduled_at",
                firestore::FirestoreQueryDirection::Descending,
            )])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Session Exercise Operations ─────────────────────────────

    pub async fn get_exercise(
        &self,
        exercise_id: u64,
    ) -> Result<Option<SessionExercise>, AppError> {
        self.fs()?
            .fluent()
            .select()
            .by_id_in(collections::SESSION_EXERCISES)
            .obj()
            .one(&exercise_id.to_string())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn upsert_exercise(&self, exercise: &SessionExercise) -> Result<(), AppError> {
        let _: () = self
            .fs()?
            .fluent()
            .update()
            .in_col(collections::SESSION_EXERCISES)
            .document_id(exercise.id.to_string())
            .object(exercise)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    pub async fn delete_exercise(&self, exercise_id: u64) -> Result<(), AppError> {
        self.fs()?
            .fluent()
            .delete()
            .from(collections::SESSION_EXERCISES)
            .document_id(exercise_id.to_string())
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    pub async fn list_exercises_for_session(
        &self,
        session_id: u64,
    ) -> Result<Vec<SessionExercise>, AppError> {
        self.fs()?
            .fluent()
            .select()
            .from(collections::SESSION_EXERCISES)
            .filter(move |q| q.field("session_id").eq(session_id))
            .order_by([(
                "order_index",
                firestore::FirestoreQueryDirection::Ascending,
            )])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn list_exercises_for_group(
        &self,
        session_group_id: u64,
    ) -> Result<Vec<SessionExercise>, AppError> {
        self.fs()?
            .fluent()
            .select()
            .from(collections::SESSION_EXERCISES)
            .filter(move |q| q.field("session_group_id").eq(session_group_id))
            .order_by([(
                "order_index",
                firestore::FirestoreQueryDirection::Ascending,
            )])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn list_exercises_in_set(
        &self,
        exercise_set_id: u64,
    ) -> Result<Vec<SessionExercise>, AppError> {
        self.fs()?
            .fluent()
            .select()
            .from(collections::SESSION_EXERCISES)
            .filter(move |q| q.field("exercise_set_id").eq(exercise_set_id))
            .order_by([(
                "order_index",
                firestore::FirestoreQueryDirection::Ascending,
            )])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Fetch exercises for many sessions concurrently (history aggregation).
    ///
    /// Uses concurrent reads with a limit to avoid overloading Firestore.
    pub async fn list_exercises_for_sessions(
        &self,
        session_ids: &[u64],
    ) -> Result<Vec<SessionExercise>, AppError> {
        let results = stream::iter(session_ids.to_vec())
            .map(|session_id| async move { self.list_exercises_for_session(session_id).await })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<Vec<SessionExercise>, AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<Vec<SessionExercise>>, AppError>>()?;

        Ok(results.into_iter().flatten().collect())
    }

    // ─── Exercise Set Operations ─────────────────────────────────

    pub async fn get_set(&self, set_id: u64) -> Result<Option<ExerciseSet>, AppError> {
        self.fs()?
            .fluent()
            .select()
            .by_id_in(collections::EXERCISE_SETS)
            .obj()
            .one(&set_id.to_string())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn upsert_set(&self, set: &ExerciseSet) -> Result<(), AppError> {
        let _: () = self
            .fs()?
            .fluent()
            .update()
            .in_col(collections::EXERCISE_SETS)
            .document_id(set.id.to_string())
            .object(set)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    pub async fn list_sets_for_session(
        &self,
        session_id: u64,
    ) -> Result<Vec<ExerciseSet>, AppError> {
        self.fs()?
            .fluent()
            .select()
            .from(collections::EXERCISE_SETS)
            .filter(move |q| q.field("session_id").eq(session_id))
            .order_by([(
                "order_index",
                firestore::FirestoreQueryDirection::Ascending,
            )])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn list_sets_for_group(
        &self,
        session_group_id: u64,
    ) -> Result<Vec<ExerciseSet>, AppError> {
        self.fs()?
            .fluent()
            .select()
            .from(collections::EXERCISE_SETS)
            .filter(move |q| q.field("session_group_id").eq(session_group_id))
            .order_by([(
                "order_index",
                firestore::FirestoreQueryDirection::Ascending,
            )])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete an exercise set together with the exercises it owns, in one
    /// transaction.
    pub async fn delete_set_cascade(
        &self,
        set_id: u64,
        exercise_ids: &[u64],
    ) -> Result<(), AppError> {
        let client = self.fs()?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        for exercise_id in exercise_ids {
            client
                .fluent()
                .delete()
                .from(collections::SESSION_EXERCISES)
                .document_id(exercise_id.to_string())
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!("Failed to add deletion to transaction: {}", e))
                })?;
        }

        client
            .fluent()
            .delete()
            .from(collections::EXERCISE_SETS)
            .document_id(set_id.to_string())
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add deletion to transaction: {}", e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::debug!(
            set_id,
            exercises = exercise_ids.len(),
            "Exercise set deleted with its exercises"
        );

        Ok(())
    }

    // ─── Payment Operations ──────────────────────────────────────

    /// A client's payment ledger, most recent payment first.
    pub async fn list_payments_for_client(
        &self,
        client_id: u64,
    ) -> Result<Vec<Payment>, AppError> {
        self.fs()?
            .fluent()
            .select()
            .from(collections::PAYMENTS)
            .filter(move |q| q.field("client_id").eq(client_id))
            .order_by([(
                "payment_date",
                firestore::FirestoreQueryDirection::Descending,
            )])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Atomic Multi-Document Writes ────────────────────────────

    /// Atomically record a payment and mark the sessions it covers as paid.
    ///
    /// The ledger entry and every session update land in one Firestore
    /// transaction, so a crash can never leave a payment recorded without
    /// its markings or vice versa.
    pub async fn record_payment_atomic(
        &self,
        payment: &Payment,
        marked_sessions: &[TrainingSession],
    ) -> Result<(), AppError> {
        let client = self.fs()?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        client
            .fluent()
            .update()
            .in_col(collections::PAYMENTS)
            .document_id(payment.id.to_string())
            .object(payment)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add payment to transaction: {}", e))
            })?;

        for session in marked_sessions {
            client
                .fluent()
                .update()
                .in_col(collections::SESSIONS)
                .document_id(session.id.to_string())
                .object(session)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!("Failed to add session to transaction: {}", e))
                })?;
        }

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::info!(
            payment_id = payment.id,
            client_id = payment.client_id,
            sessions_marked = marked_sessions.len(),
            "Payment recorded atomically"
        );

        Ok(())
    }

    /// Atomically write a batch of session updates (group cancellation).
    pub async fn update_sessions_atomic(
        &self,
        sessions: &[TrainingSession],
    ) -> Result<(), AppError> {
        let client = self.fs()?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        for session in sessions {
            client
                .fluent()
                .update()
                .in_col(collections::SESSIONS)
                .document_id(session.id.to_string())
                .object(session)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!("Failed to add session to transaction: {}", e))
                })?;
        }

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        Ok(())
    }
}
