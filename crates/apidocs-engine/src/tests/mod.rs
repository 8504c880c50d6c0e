//! Shared fixtures for unit tests across the engine.

use chrono::{DateTime, Duration, TimeZone, Utc};
use tempfile::TempDir;

use crate::models::{NamedDocument, ProjectId, Snapshot};

/// A small documentation set with headings at every level
pub fn sample_files() -> Vec<NamedDocument> {
    vec![
        NamedDocument::new(
            "intro.mdx",
            "# Introduction\n\nWelcome to the Petstore API.\n\n## Base URL\n\nAll requests go to `https://api.example.com`.",
        ),
        NamedDocument::new(
            "auth.mdx",
            "# Authentication\n\n## Tokens\n\nSend this header:\n\n```\nAuthorization: Token\n```\n\n### Expiry\n\nTokens last one hour.",
        ),
        NamedDocument::new(
            "pets.mdx",
            "# Pets\n\n## List pets\n\n`GET /pets`\n\n## Create a pet\n\n`POST /pets`",
        ),
    ]
}

pub fn project(id: &str) -> ProjectId {
    ProjectId::new(id).unwrap()
}

/// Snapshot with a deterministic timestamp `minutes` after a fixed epoch
pub fn snapshot_at(full_text: &str, minutes: i64) -> Snapshot {
    Snapshot::at(full_text, base_time() + Duration::minutes(minutes))
}

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

pub fn create_test_store_dir() -> TempDir {
    TempDir::new().unwrap()
}
