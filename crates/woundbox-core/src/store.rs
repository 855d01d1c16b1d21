//! The `WoundStore` trait.
//!
//! The trait is implemented by storage backends (e.g.
//! `woundbox-store-sqlite`). The HTTP layer depends on this abstraction, not
//! on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  annotation::{AnnotationSet, CategoryCount, NewAnnotation},
  assessment::{AssessmentRef, AssessmentStatus, WoundAssessment},
  triage::{StatusAction, TriageEntry, TriageQueue},
  user::{NewUser, Role, User},
};

/// Abstraction over a Woundbox storage backend.
///
/// Mutating operations are all-or-nothing: on failure the prior state is
/// left untouched. `save_annotations` in particular is a transactional
/// replace — concurrent readers must never observe its intermediate
/// deleted-but-not-reinserted state.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait WoundStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Create a user. The caller supplies the password hash; the store
  /// assigns `user_id` and `created_at`. Fails on a duplicate username.
  fn create_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  /// Look up a user by username, active or not. Returns `None` if unknown.
  fn find_user_by_username<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  /// Look up a user by id. Returns `None` if unknown.
  fn get_user(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Record a successful login.
  fn touch_last_login(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// List all accounts, active and deactivated.
  fn list_users(
    &self,
  ) -> impl Future<Output = Result<Vec<User>, Self::Error>> + Send + '_;

  /// Change a user's role. Returns `false` when the user is unknown.
  fn set_user_role(
    &self,
    user_id: Uuid,
    role: Role,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Deactivate an account. Users are never hard-deleted.
  /// Returns `false` when the user is unknown.
  fn deactivate_user(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Replace a user's password hash. Returns `false` when unknown.
  fn update_password_hash(
    &self,
    user_id: Uuid,
    password_hash: String,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Image catalog (read-only) ─────────────────────────────────────────

  /// All known assessments as `{id, path}` pairs, ordered by path.
  fn list_assessments(
    &self,
  ) -> impl Future<Output = Result<Vec<AssessmentRef>, Self::Error>> + Send + '_;

  /// All assessments with their annotation status and contributing
  /// annotators resolved in a single query.
  fn list_assessments_with_status(
    &self,
  ) -> impl Future<Output = Result<Vec<AssessmentStatus>, Self::Error>> + Send + '_;

  /// Clinical metadata for one assessment. `None` if unknown.
  fn get_assessment(
    &self,
    assessment_id: i64,
  ) -> impl Future<Output = Result<Option<WoundAssessment>, Self::Error>> + Send + '_;

  /// Raw image bytes for one assessment. `None` if unknown or imageless.
  fn get_image_bytes(
    &self,
    assessment_id: i64,
  ) -> impl Future<Output = Result<Option<Vec<u8>>, Self::Error>> + Send + '_;

  // ── Annotations ───────────────────────────────────────────────────────

  /// Current annotation set for an assessment, ordered by creation time.
  /// An assessment with no annotations yields an empty set, not an error.
  fn get_annotations(
    &self,
    assessment_id: i64,
  ) -> impl Future<Output = Result<AnnotationSet, Self::Error>> + Send + '_;

  /// Transactional replace of the assessment's annotation set.
  ///
  /// The whole batch is validated before any deletion; an invalid box
  /// fails the save and leaves the prior set intact. Each stored box is
  /// stamped with `last_modified_by = acting_user` and a shared
  /// `last_modified_at`; supplied `created_by`/`created_at` are preserved.
  fn save_annotations(
    &self,
    assessment_id: i64,
    batch: Vec<NewAnnotation>,
    acting_user: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Annotation counts grouped by category across all assessments.
  /// NULL/empty categories are bucketed under `"Uncategorized"`.
  fn count_by_category(
    &self,
  ) -> impl Future<Output = Result<Vec<CategoryCount>, Self::Error>> + Send + '_;

  // ── Triage queues ─────────────────────────────────────────────────────

  /// Apply a status action. Adds are idempotent upserts (a re-add keeps
  /// the original timestamp); clears are idempotent deletes.
  fn set_status(
    &self,
    assessment_id: i64,
    action: StatusAction,
    acting_user: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Current membership of a queue, ordered by insertion time ascending.
  fn list_queue(
    &self,
    queue: TriageQueue,
  ) -> impl Future<Output = Result<Vec<TriageEntry>, Self::Error>> + Send + '_;
}
