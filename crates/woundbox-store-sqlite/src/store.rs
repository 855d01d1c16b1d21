//! [`SqliteStore`] — the SQLite implementation of [`WoundStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use woundbox_core::{
  annotation::{self, Annotation, AnnotationSet, CategoryCount, NewAnnotation, UNCATEGORIZED},
  assessment::{AssessmentRef, AssessmentStatus, WoundAssessment},
  store::WoundStore,
  triage::{StatusAction, TriageEntry, TriageQueue},
  user::{NewUser, Role, User},
};

use crate::{
  encode::{
    RawAnnotation, RawTriageEntry, RawUser, encode_dt, encode_queue, encode_role, encode_uuid,
  },
  schema::SCHEMA,
  Error, Result,
};

// ─── Row mappers ─────────────────────────────────────────────────────────────

fn raw_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawUser> {
  Ok(RawUser {
    user_id:       row.get(0)?,
    username:      row.get(1)?,
    password_hash: row.get(2)?,
    full_name:     row.get(3)?,
    email:         row.get(4)?,
    role:          row.get(5)?,
    is_active:     row.get(6)?,
    created_at:    row.get(7)?,
    last_login:    row.get(8)?,
  })
}

const USER_COLS: &str = "user_id, username, password_hash, full_name, email, \
                         role, is_active, created_at, last_login";

fn raw_annotation(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawAnnotation> {
  Ok(RawAnnotation {
    annotation_id:    row.get(0)?,
    assessment_id:    row.get(1)?,
    category:         row.get(2)?,
    location_label:   row.get(3)?,
    body_map_id:      row.get(4)?,
    x:                row.get(5)?,
    y:                row.get(6)?,
    width:            row.get(7)?,
    height:           row.get(8)?,
    created_by:       row.get(9)?,
    created_at:       row.get(10)?,
    last_modified_by: row.get(11)?,
    last_modified_at: row.get(12)?,
    doctor_notes:     row.get(13)?,
    severity:         row.get(14)?,
  })
}

const ANNOTATION_COLS: &str =
  "annotation_id, assessment_id, category, location_label, body_map_id, \
   x, y, width, height, created_by, created_at, \
   last_modified_by, last_modified_at, doctor_notes, severity";

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Woundbox store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. The
/// connection is a pool-of-one: every statement runs on its dedicated
/// thread, so mutations are serialised across all clones.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Insert an assessment row. The catalog is read-only from the HTTP
  /// surface; this exists for the ingestion/bootstrap path and for tests.
  pub async fn insert_assessment(
    &self,
    assessment: WoundAssessment,
    image: Option<Vec<u8>>,
  ) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO wound_assessments
             (assessment_id, wound_type, body_location, patient_id, storage_path, image)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            assessment.assessment_id,
            assessment.wound_type,
            assessment.body_location,
            assessment.patient_id,
            assessment.storage_path,
            image,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Test hook: run an arbitrary statement, bypassing save-time validation.
  /// Used to simulate legacy rows that predate the current invariants.
  #[cfg(test)]
  pub(crate) async fn execute_raw(&self, sql: &'static str) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute(sql, [])?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── WoundStore impl ─────────────────────────────────────────────────────────

impl WoundStore for SqliteStore {
  type Error = Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn create_user(&self, input: NewUser) -> Result<User> {
    let username = input.username.clone();
    let taken: bool = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM users WHERE username = ?1",
              rusqlite::params![username],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false),
        )
      })
      .await?;
    if taken {
      return Err(Error::Core(woundbox_core::Error::UsernameTaken(
        input.username,
      )));
    }

    let user = User {
      user_id:       Uuid::new_v4(),
      username:      input.username,
      password_hash: input.password_hash,
      full_name:     input.full_name,
      email:         input.email,
      role:          input.role,
      is_active:     true,
      created_at:    Utc::now(),
      last_login:    None,
    };

    let id_str   = encode_uuid(user.user_id);
    let at_str   = encode_dt(user.created_at);
    let role_str = encode_role(user.role).to_owned();
    let row      = user.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO users
             (user_id, username, password_hash, full_name, email, role,
              is_active, created_at, last_login)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7, NULL)",
          rusqlite::params![
            id_str,
            row.username,
            row.password_hash,
            row.full_name,
            row.email,
            role_str,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(user)
  }

  async fn find_user_by_username<'a>(&'a self, username: &'a str) -> Result<Option<User>> {
    let username = username.to_owned();
    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {USER_COLS} FROM users WHERE username = ?1"),
              rusqlite::params![username],
              raw_user,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn get_user(&self, user_id: Uuid) -> Result<Option<User>> {
    let id_str = encode_uuid(user_id);
    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {USER_COLS} FROM users WHERE user_id = ?1"),
              rusqlite::params![id_str],
              raw_user,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn touch_last_login(&self, user_id: Uuid) -> Result<()> {
    let id_str = encode_uuid(user_id);
    let at_str = encode_dt(Utc::now());
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE users SET last_login = ?1 WHERE user_id = ?2",
          rusqlite::params![at_str, id_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn list_users(&self) -> Result<Vec<User>> {
    let raws: Vec<RawUser> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare(&format!("SELECT {USER_COLS} FROM users ORDER BY username"))?;
        let rows = stmt
          .query_map([], raw_user)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawUser::into_user).collect()
  }

  async fn set_user_role(&self, user_id: Uuid, role: Role) -> Result<bool> {
    let id_str   = encode_uuid(user_id);
    let role_str = encode_role(role).to_owned();
    let changed: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE users SET role = ?1 WHERE user_id = ?2",
          rusqlite::params![role_str, id_str],
        )?)
      })
      .await?;
    Ok(changed > 0)
  }

  async fn deactivate_user(&self, user_id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(user_id);
    let changed: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE users SET is_active = 0 WHERE user_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;
    Ok(changed > 0)
  }

  async fn update_password_hash(&self, user_id: Uuid, password_hash: String) -> Result<bool> {
    let id_str = encode_uuid(user_id);
    let changed: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE users SET password_hash = ?1 WHERE user_id = ?2",
          rusqlite::params![password_hash, id_str],
        )?)
      })
      .await?;
    Ok(changed > 0)
  }

  // ── Image catalog ─────────────────────────────────────────────────────────

  async fn list_assessments(&self) -> Result<Vec<AssessmentRef>> {
    let refs: Vec<AssessmentRef> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT assessment_id, storage_path
           FROM wound_assessments
           ORDER BY storage_path",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(AssessmentRef { id: row.get(0)?, path: row.get(1)? })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(refs)
  }

  async fn list_assessments_with_status(&self) -> Result<Vec<AssessmentStatus>> {
    let rows: Vec<AssessmentStatus> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT
             w.assessment_id,
             w.storage_path,
             COUNT(a.annotation_id) AS n,
             GROUP_CONCAT(DISTINCT a.created_by) AS annotators
           FROM wound_assessments w
           LEFT JOIN annotations a ON a.assessment_id = w.assessment_id
           GROUP BY w.assessment_id, w.storage_path
           ORDER BY w.storage_path",
        )?;
        let rows = stmt
          .query_map([], |row| {
            let n: i64 = row.get(2)?;
            let annotators: Option<String> = row.get(3)?;
            Ok(AssessmentStatus {
              id:         row.get(0)?,
              path:       row.get(1)?,
              annotated:  n > 0,
              annotators: annotators.unwrap_or_else(|| "-".to_owned()),
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }

  async fn get_assessment(&self, assessment_id: i64) -> Result<Option<WoundAssessment>> {
    let found: Option<WoundAssessment> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT assessment_id, wound_type, body_location, patient_id, storage_path
               FROM wound_assessments
               WHERE assessment_id = ?1",
              rusqlite::params![assessment_id],
              |row| {
                let wound_type: Option<String>    = row.get(1)?;
                let body_location: Option<String> = row.get(2)?;
                Ok(WoundAssessment {
                  assessment_id: row.get(0)?,
                  // Upstream rows may lack clinical metadata.
                  wound_type:    wound_type.unwrap_or_else(|| "Unknown".to_owned()),
                  body_location: body_location.unwrap_or_else(|| "Unknown".to_owned()),
                  patient_id:    row.get(3)?,
                  storage_path:  row.get(4)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;
    Ok(found)
  }

  async fn get_image_bytes(&self, assessment_id: i64) -> Result<Option<Vec<u8>>> {
    let bytes: Option<Vec<u8>> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT image FROM wound_assessments WHERE assessment_id = ?1",
              rusqlite::params![assessment_id],
              |row| row.get::<_, Option<Vec<u8>>>(0),
            )
            .optional()?
            .flatten(),
        )
      })
      .await?;
    Ok(bytes)
  }

  // ── Annotations ───────────────────────────────────────────────────────────

  async fn get_annotations(&self, assessment_id: i64) -> Result<AnnotationSet> {
    let raws: Vec<RawAnnotation> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {ANNOTATION_COLS}
           FROM annotations
           WHERE assessment_id = ?1
           ORDER BY created_at, rowid"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![assessment_id], raw_annotation)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let boxes: Vec<Annotation> = raws
      .into_iter()
      .map(RawAnnotation::into_annotation)
      .collect::<Result<_>>()?;
    Ok(AnnotationSet { boxes })
  }

  async fn save_annotations(
    &self,
    assessment_id: i64,
    batch: Vec<NewAnnotation>,
    acting_user: String,
  ) -> Result<()> {
    // Validate the whole batch before touching any row, so a bad box
    // leaves the prior set intact.
    annotation::validate_batch(&batch)?;

    let now = Utc::now();
    let records: Vec<Annotation> = batch
      .into_iter()
      .map(|ann| ann.into_record(assessment_id, &acting_user, now))
      .collect();

    // The delete and the inserts commit as one transaction; a failure
    // mid-way rolls back to the prior set.
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "DELETE FROM annotations WHERE assessment_id = ?1",
          rusqlite::params![assessment_id],
        )?;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO annotations (
               annotation_id, assessment_id, category, location_label,
               body_map_id, x, y, width, height,
               created_by, created_at, last_modified_by, last_modified_at,
               doctor_notes, severity
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
          )?;
          for rec in &records {
            stmt.execute(rusqlite::params![
              encode_uuid(rec.annotation_id),
              rec.assessment_id,
              rec.category,
              rec.location_label,
              rec.body_map_id,
              rec.x,
              rec.y,
              rec.width,
              rec.height,
              rec.created_by,
              encode_dt(rec.created_at),
              rec.last_modified_by,
              encode_dt(rec.last_modified_at),
              rec.doctor_notes,
              rec.severity,
            ])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn count_by_category(&self) -> Result<Vec<CategoryCount>> {
    let uncategorized = UNCATEGORIZED.to_owned();
    let counts: Vec<CategoryCount> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT
             CASE WHEN category IS NULL OR category = ''
                  THEN ?1 ELSE category END AS bucket,
             COUNT(*) AS count
           FROM annotations
           GROUP BY bucket
           ORDER BY bucket",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![uncategorized], |row| {
            Ok(CategoryCount { category: row.get(0)?, count: row.get(1)? })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(counts)
  }

  // ── Triage queues ─────────────────────────────────────────────────────────

  async fn set_status(
    &self,
    assessment_id: i64,
    action: StatusAction,
    acting_user: String,
  ) -> Result<()> {
    let queue_str = encode_queue(action.queue()).to_owned();

    if action.is_add() {
      let at_str = encode_dt(Utc::now());
      self
        .conn
        .call(move |conn| {
          // Re-adding an already-queued assessment keeps the original
          // requested_by/requested_at.
          conn.execute(
            "INSERT INTO triage_entries (assessment_id, queue, requested_by, requested_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (assessment_id, queue) DO NOTHING",
            rusqlite::params![assessment_id, queue_str, acting_user, at_str],
          )?;
          Ok(())
        })
        .await?;
    } else {
      self
        .conn
        .call(move |conn| {
          // Clearing a non-member is a no-op success.
          conn.execute(
            "DELETE FROM triage_entries WHERE assessment_id = ?1 AND queue = ?2",
            rusqlite::params![assessment_id, queue_str],
          )?;
          Ok(())
        })
        .await?;
    }
    Ok(())
  }

  async fn list_queue(&self, queue: TriageQueue) -> Result<Vec<TriageEntry>> {
    let queue_str = encode_queue(queue).to_owned();
    let raws: Vec<RawTriageEntry> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT assessment_id, queue, requested_by, requested_at
           FROM triage_entries
           WHERE queue = ?1
           ORDER BY requested_at, rowid",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![queue_str], |row| {
            Ok(RawTriageEntry {
              assessment_id: row.get(0)?,
              queue:         row.get(1)?,
              requested_by:  row.get(2)?,
              requested_at:  row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawTriageEntry::into_entry).collect()
  }
}
