//! Upload policy: which files each role may attach

use serde::{Deserialize, Serialize};
use sglgb_types::{LifecycleError, LifecycleResult, Role};

const MB: u64 = 1024 * 1024;

/// Limits for one class of uploader
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadRule {
    /// Largest accepted file
    pub max_bytes: u64,
    /// Accepted extensions, lowercase, without the dot
    pub extensions: Vec<String>,
    /// Accepted MIME types. Parameters (`; charset=...`) are ignored.
    pub content_types: Vec<String>,
}

impl UploadRule {
    fn blgu_default() -> Self {
        Self {
            max_bytes: 10 * MB,
            extensions: strings(&["pdf", "doc", "docx", "jpg", "jpeg", "png"]),
            content_types: strings(&[
                "application/pdf",
                "application/msword",
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
                "image/jpeg",
                "image/png",
            ]),
        }
    }

    fn assessor_default() -> Self {
        Self {
            max_bytes: 100 * MB,
            extensions: strings(&[
                "pdf", "doc", "docx", "xls", "xlsx", "jpg", "jpeg", "png", "gif", "mp4", "mov",
            ]),
            content_types: strings(&[
                "application/pdf",
                "application/msword",
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
                "application/vnd.ms-excel",
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
                "image/jpeg",
                "image/png",
                "image/gif",
                "video/mp4",
                "video/quicktime",
            ]),
        }
    }

    /// Check a file against this rule
    pub fn check(&self, filename: &str, content_type: &str, size: u64) -> LifecycleResult<()> {
        if size == 0 {
            return Err(LifecycleError::InvalidEvidence(format!(
                "{} is empty",
                filename
            )));
        }
        if size > self.max_bytes {
            return Err(LifecycleError::InvalidEvidence(format!(
                "{} is {} bytes; the limit is {} bytes",
                filename, size, self.max_bytes
            )));
        }

        let extension = filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        if !self.extensions.iter().any(|e| e == &extension) {
            return Err(LifecycleError::InvalidEvidence(format!(
                "{}: file type .{} is not accepted",
                filename, extension
            )));
        }

        let mime = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        if !self.content_types.iter().any(|c| c == &mime) {
            return Err(LifecycleError::InvalidEvidence(format!(
                "{}: content type {} is not accepted",
                filename, mime
            )));
        }
        Ok(())
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Per-role upload rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadPolicy {
    #[serde(default = "UploadRule::blgu_default")]
    pub blgu: UploadRule,
    #[serde(default = "UploadRule::assessor_default")]
    pub assessor: UploadRule,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            blgu: UploadRule::blgu_default(),
            assessor: UploadRule::assessor_default(),
        }
    }
}

impl UploadPolicy {
    /// Check an upload by the given role. Administrators upload under the
    /// assessor rule.
    pub fn check(
        &self,
        role: Role,
        filename: &str,
        content_type: &str,
        size: u64,
    ) -> LifecycleResult<()> {
        let rule = match role {
            Role::BlguUser => &self.blgu,
            Role::AreaAssessor | Role::SystemAdmin => &self.assessor,
        };
        rule.check(filename, content_type, size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blgu_accepts_documents() {
        let policy = UploadPolicy::default();
        assert!(policy
            .check(Role::BlguUser, "Budget.PDF", "application/pdf", 2048)
            .is_ok());
        assert!(policy
            .check(Role::BlguUser, "photo.jpg", "image/jpeg; charset=binary", 2048)
            .is_ok());
    }

    #[test]
    fn test_blgu_rejects_video_and_oversize() {
        let policy = UploadPolicy::default();
        assert!(matches!(
            policy.check(Role::BlguUser, "visit.mp4", "video/mp4", 2048),
            Err(LifecycleError::InvalidEvidence(_))
        ));
        assert!(matches!(
            policy.check(Role::BlguUser, "scan.pdf", "application/pdf", 11 * MB),
            Err(LifecycleError::InvalidEvidence(_))
        ));
        assert!(matches!(
            policy.check(Role::BlguUser, "noext", "application/pdf", 10),
            Err(LifecycleError::InvalidEvidence(_))
        ));
    }

    #[test]
    fn test_assessor_rule_is_broader() {
        let policy = UploadPolicy::default();
        assert!(policy
            .check(Role::AreaAssessor, "visit.mp4", "video/mp4", 50 * MB)
            .is_ok());
        assert!(policy
            .check(Role::AreaAssessor, "visit.mp4", "video/mp4", 101 * MB)
            .is_err());
    }

    #[test]
    fn test_empty_upload_rejected() {
        let policy = UploadPolicy::default();
        assert!(policy
            .check(Role::BlguUser, "a.pdf", "application/pdf", 0)
            .is_err());
    }
}
