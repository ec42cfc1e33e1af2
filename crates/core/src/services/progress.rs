//! Progress service.

use std::sync::Arc;

use chrono::Utc;
use pingspot_common::{
    AppError, AppResult, StorageBackend, generate_storage_key, is_allowed_attachment,
};
use pingspot_db::{
    entities::report_progress,
    repositories::{ReportProgressRepository, ReportRepository},
};
use pingspot_domain::{ProgressView, VoteType};
use sea_orm::{NotSet, Set};
use tracing::{info, warn};

use crate::views;

/// Attachments allowed on one progress update.
pub const MAX_ATTACHMENTS: usize = 2;

/// A file sent with a progress update.
#[derive(Debug, Clone)]
pub struct AttachmentUpload {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Input for a progress update.
#[derive(Debug, Clone)]
pub struct SubmitProgressInput {
    pub status: VoteType,
    pub notes: Option<String>,
    pub attachments: Vec<AttachmentUpload>,
}

/// Progress service for business logic.
#[derive(Clone)]
pub struct ProgressService {
    report_repo: ReportRepository,
    progress_repo: ReportProgressRepository,
    storage: Arc<dyn StorageBackend>,
    max_attachment_bytes: usize,
}

impl ProgressService {
    /// Create a new progress service.
    #[must_use]
    pub fn new(
        report_repo: ReportRepository,
        progress_repo: ReportProgressRepository,
        storage: Arc<dyn StorageBackend>,
        max_attachment_bytes: usize,
    ) -> Self {
        Self {
            report_repo,
            progress_repo,
            storage,
            max_attachment_bytes,
        }
    }

    /// Post an owner progress update.
    ///
    /// The submitted status becomes the report status and the entry is
    /// appended to the history in one transaction. Attachments are stored
    /// first and removed again if the transaction fails.
    pub async fn submit(
        &self,
        user_id: i64,
        report_id: i64,
        input: SubmitProgressInput,
    ) -> AppResult<ProgressView> {
        self.validate_attachments(&input.attachments)?;

        // Fail fast before anything is uploaded; the rules run again under the lock.
        let report = self.report_repo.get_by_id(report_id).await?;
        let state = report.lifecycle_state();
        state.ensure_owner(user_id)?;
        state.check_progress()?;

        let mut stored = Vec::with_capacity(input.attachments.len());
        for attachment in &input.attachments {
            let key = generate_storage_key(report_id, &attachment.file_name);
            match self
                .storage
                .upload(&key, &attachment.data, &attachment.content_type)
                .await
            {
                Ok(file) => stored.push(file),
                Err(e) => {
                    self.discard(&stored).await;
                    return Err(e);
                }
            }
        }

        let notes = input
            .notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        let urls: Vec<String> = stored.iter().map(|f| f.url.clone()).collect();

        match self
            .record(user_id, report_id, input.status, notes, &urls)
            .await
        {
            Ok(progress) => Ok(views::progress_view(progress)),
            Err(e) => {
                self.discard(&stored).await;
                Err(e)
            }
        }
    }

    /// Progress history of a report, newest first.
    pub async fn list(&self, report_id: i64) -> AppResult<Vec<ProgressView>> {
        self.report_repo.get_by_id(report_id).await?;
        Ok(self
            .progress_repo
            .find_by_report(report_id)
            .await?
            .into_iter()
            .map(views::progress_view)
            .collect())
    }

    async fn record(
        &self,
        user_id: i64,
        report_id: i64,
        status: VoteType,
        notes: Option<String>,
        urls: &[String],
    ) -> AppResult<report_progress::Model> {
        let txn = self.report_repo.begin().await?;
        let report = self.report_repo.lock_in(&txn, report_id).await?;
        let mut state = report.lifecycle_state();
        state.ensure_owner(user_id)?;

        let now = Utc::now();
        let transition = state.apply_progress(status, now)?;
        self.report_repo
            .save_state_in(&txn, report, &state, now)
            .await?;

        let progress = self
            .progress_repo
            .create_in(
                &txn,
                report_progress::ActiveModel {
                    id: NotSet,
                    report_id: Set(report_id),
                    status: Set(status),
                    notes: Set(notes),
                    attachment1: Set(urls.first().cloned()),
                    attachment2: Set(urls.get(1).cloned()),
                    created_at: Set(now.into()),
                },
            )
            .await?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        info!(
            report_id,
            from = %transition.from,
            to = %transition.to,
            by = %transition.by,
            "Report status changed by owner progress"
        );
        Ok(progress)
    }

    fn validate_attachments(&self, attachments: &[AttachmentUpload]) -> AppResult<()> {
        if attachments.len() > MAX_ATTACHMENTS {
            return Err(AppError::BadRequest(format!(
                "At most {MAX_ATTACHMENTS} attachments are allowed"
            )));
        }
        for attachment in attachments {
            if !is_allowed_attachment(&attachment.content_type) {
                return Err(AppError::BadRequest(format!(
                    "Unsupported attachment type: {}",
                    attachment.content_type
                )));
            }
            if attachment.data.len() > self.max_attachment_bytes {
                return Err(AppError::BadRequest(format!(
                    "Attachment {} exceeds {} bytes",
                    attachment.file_name, self.max_attachment_bytes
                )));
            }
        }
        Ok(())
    }

    async fn discard(&self, files: &[pingspot_common::UploadedFile]) {
        for file in files {
            if let Err(e) = self.storage.delete(&file.key).await {
                warn!(key = %file.key, error = %e, "Failed to remove orphaned attachment");
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pingspot_common::UploadedFile;
    use pingspot_db::entities::report;
    use pingspot_db::test_utils::fixtures;
    use pingspot_domain::{LifecycleError, ReportStatus, UpdatedBy};
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Mutex;

    const OWNER: i64 = 1;

    /// Keeps uploads in memory.
    #[derive(Default)]
    struct MemoryStorage {
        keys: Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl StorageBackend for MemoryStorage {
        async fn upload(
            &self,
            key: &str,
            data: &[u8],
            content_type: &str,
        ) -> AppResult<UploadedFile> {
            self.keys.lock().unwrap().push(key.to_string());
            Ok(UploadedFile {
                key: key.to_string(),
                url: self.public_url(key),
                size: data.len() as u64,
                content_type: content_type.to_string(),
                md5: String::new(),
            })
        }

        async fn delete(&self, key: &str) -> AppResult<()> {
            self.keys.lock().unwrap().retain(|k| k != key);
            Ok(())
        }

        fn public_url(&self, key: &str) -> String {
            format!("https://files.test/{key}")
        }

        async fn exists(&self, key: &str) -> AppResult<bool> {
            Ok(self.keys.lock().unwrap().iter().any(|k| k == key))
        }
    }

    fn service(db: MockDatabase, storage: Arc<MemoryStorage>) -> ProgressService {
        let db = Arc::new(db.into_connection());
        ProgressService::new(
            ReportRepository::new(db.clone()),
            ReportProgressRepository::new(db),
            storage,
            1024,
        )
    }

    fn png(name: &str) -> AttachmentUpload {
        AttachmentUpload {
            file_name: name.to_string(),
            content_type: "image/png".to_string(),
            data: vec![0u8; 16],
        }
    }

    #[tokio::test]
    async fn test_owner_resolves_report() {
        let report = fixtures::report(5, OWNER, ReportStatus::OnProgress);
        let mut saved = report.clone();
        saved.status = ReportStatus::Resolved;
        saved.last_updated_by = Some(UpdatedBy::Owner);
        let mut entry = fixtures::progress(3, 5, VoteType::Resolved);
        entry.attachment1 = Some("https://files.test/a.png".to_string());

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[report.clone()]])
            .append_query_results([[report]])
            .append_query_results([[saved]])
            .append_query_results([[entry]]);
        let storage = Arc::new(MemoryStorage::default());

        let view = service(db, storage.clone())
            .submit(
                OWNER,
                5,
                SubmitProgressInput {
                    status: VoteType::Resolved,
                    notes: Some("  Fixed by the city  ".to_string()),
                    attachments: vec![png("a.png")],
                },
            )
            .await
            .unwrap();

        assert_eq!(view.status, VoteType::Resolved);
        assert_eq!(view.report_id, 5);
        assert_eq!(storage.keys.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_non_owner_is_rejected_before_upload() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[fixtures::report(5, OWNER, ReportStatus::OnProgress)]]);
        let storage = Arc::new(MemoryStorage::default());

        let result = service(db, storage.clone())
            .submit(
                2,
                5,
                SubmitProgressInput {
                    status: VoteType::Resolved,
                    notes: None,
                    attachments: vec![png("a.png")],
                },
            )
            .await;

        assert!(matches!(
            result,
            Err(AppError::Lifecycle(LifecycleError::NotOwner))
        ));
        assert!(storage.keys.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_resolved_report_takes_no_more_progress() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[fixtures::report(5, OWNER, ReportStatus::Resolved)]]);

        let result = service(db, Arc::new(MemoryStorage::default()))
            .submit(
                OWNER,
                5,
                SubmitProgressInput {
                    status: VoteType::OnProgress,
                    notes: None,
                    attachments: vec![],
                },
            )
            .await;

        assert!(matches!(
            result,
            Err(AppError::Lifecycle(LifecycleError::AlreadyResolved))
        ));
    }

    #[tokio::test]
    async fn test_failed_transaction_removes_uploads() {
        let report = fixtures::report(5, OWNER, ReportStatus::Expired);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[report]])
            .append_query_results([Vec::<report::Model>::new()]);
        let storage = Arc::new(MemoryStorage::default());

        let result = service(db, storage.clone())
            .submit(
                OWNER,
                5,
                SubmitProgressInput {
                    status: VoteType::OnProgress,
                    notes: None,
                    attachments: vec![png("a.png"), png("b.png")],
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::ReportNotFound(5))));
        assert!(storage.keys.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_attachment_limits() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres),
            Arc::new(MemoryStorage::default()),
        );

        let too_many = vec![png("a.png"), png("b.png"), png("c.png")];
        assert!(matches!(
            service.validate_attachments(&too_many),
            Err(AppError::BadRequest(_))
        ));

        let mut pdf = png("a.pdf");
        pdf.content_type = "application/pdf".to_string();
        assert!(service.validate_attachments(&[pdf]).is_err());

        let mut big = png("big.png");
        big.data = vec![0u8; 2048];
        assert!(service.validate_attachments(&[big]).is_err());

        assert!(service.validate_attachments(&[png("ok.png")]).is_ok());
    }
}
