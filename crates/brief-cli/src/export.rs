use crate::config::write_atomic;
use brief_core::session::{ChatTurn, SummaryResult};
use brief_core::summarize::Plan;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use uuid::Uuid;

const METADATA_FILE: &str = "session.toml";
const TRANSCRIPT_FILE: &str = "transcript.jsonl";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("export io error: {0}")]
    Io(#[from] io::Error),
    #[error("export metadata error: {0}")]
    Metadata(#[from] toml::ser::Error),
    #[error("export transcript error: {0}")]
    Transcript(#[from] serde_json::Error),
    #[error("export time error: {0}")]
    Time(#[from] time::error::Format),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionMetadata {
    pub id: String,
    pub created_at: String,
    pub updated_at: Option<String>,
    pub source: String,
    pub provider: String,
    pub model: String,
    pub invocations: usize,
    pub summary_file: String,
    pub transcript_file: Option<String>,
    pub plan: Plan,
}

impl SessionMetadata {
    pub fn new(result: &SummaryResult) -> Result<Self, ExportError> {
        Ok(Self {
            id: Uuid::now_v7().to_string(),
            created_at: OffsetDateTime::now_utc().format(&Rfc3339)?,
            updated_at: None,
            source: result.source.clone(),
            provider: result.provider().to_string(),
            model: result.model().to_string(),
            invocations: result.invocations,
            summary_file: result.artifact().file_name.to_string(),
            transcript_file: None,
            plan: result.plan,
        })
    }
}

/// One exported run: `<export_dir>/<id>/` holding the summary artifact,
/// `session.toml` and, after a chat, `transcript.jsonl`.
#[derive(Debug)]
pub struct ExportHandle {
    dir: PathBuf,
    metadata: SessionMetadata,
}

impl ExportHandle {
    pub fn write(export_dir: &Path, result: &SummaryResult) -> Result<Self, ExportError> {
        let metadata = SessionMetadata::new(result)?;
        let dir = export_dir.join(&metadata.id);
        fs::create_dir_all(&dir)?;

        let artifact = result.artifact();
        write_atomic(&dir.join(artifact.file_name), artifact.contents.as_bytes())?;
        write_metadata(&dir.join(METADATA_FILE), &metadata)?;
        tracing::info!(dir = %dir.display(), "summary exported");

        Ok(Self { dir, metadata })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[cfg(test)]
    pub fn metadata(&self) -> &SessionMetadata {
        &self.metadata
    }

    /// Write the Q&A transcript, one JSON object per turn.
    pub fn write_transcript(&mut self, turns: &[ChatTurn]) -> Result<(), ExportError> {
        if turns.is_empty() {
            return Ok(());
        }
        let mut contents = String::new();
        for turn in turns {
            contents.push_str(&serde_json::to_string(turn)?);
            contents.push('\n');
        }
        write_atomic(&self.dir.join(TRANSCRIPT_FILE), contents.as_bytes())?;

        self.metadata.transcript_file = Some(TRANSCRIPT_FILE.to_string());
        self.metadata.updated_at = Some(OffsetDateTime::now_utc().format(&Rfc3339)?);
        write_metadata(&self.dir.join(METADATA_FILE), &self.metadata)?;
        Ok(())
    }
}

fn write_metadata(path: &Path, metadata: &SessionMetadata) -> Result<(), ExportError> {
    let contents = toml::to_string_pretty(metadata)?;
    write_atomic(path, contents.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{ExportHandle, SessionMetadata};
    use brief_core::client::{ClientFactory, ClientOptions, ModelClient, SharedClient};
    use brief_core::env::EnvSnapshot;
    use brief_core::provider::ProviderId;
    use brief_core::session::{GenerateRequest, Role, Session};
    use brief_core::summarize::Plan;
    use brief_core::InvokeError;
    use std::fs;
    use std::sync::Arc;

    struct CannedClient(String);

    impl ModelClient for CannedClient {
        fn provider(&self) -> ProviderId {
            ProviderId::Ollama
        }

        fn model(&self) -> &str {
            &self.0
        }

        fn invoke(&self, _prompt: &str) -> Result<String, InvokeError> {
            Ok("canned summary".to_string())
        }
    }

    fn summarized_session() -> Session {
        let mut factory = ClientFactory::new(ClientOptions::default());
        factory.register(ProviderId::Ollama, |params| {
            let client: SharedClient = Arc::new(CannedClient(params.model));
            Ok(client)
        });
        let mut session = Session::default();
        let request = GenerateRequest {
            provider: "ollama".to_string(),
            model: "phi3".to_string(),
            credential: String::new(),
        };
        session
            .generate(&factory, &EnvSnapshot::new(), &request, "short text", "notes.txt")
            .unwrap();
        session
    }

    #[test]
    fn write_creates_artifact_and_metadata() {
        let temp = tempfile::tempdir().unwrap();
        let session = summarized_session();
        let result = session.current().unwrap();
        let handle = ExportHandle::write(temp.path(), result).unwrap();

        let summary = fs::read_to_string(handle.dir().join("document_summary.txt")).unwrap();
        assert_eq!(summary, "canned summary");

        let raw = fs::read_to_string(handle.dir().join("session.toml")).unwrap();
        let metadata: SessionMetadata = toml::from_str(&raw).unwrap();
        assert_eq!(metadata.id, handle.metadata().id);
        assert_eq!(metadata.provider, "Ollama");
        assert_eq!(metadata.model, "phi3");
        assert_eq!(metadata.source, "notes.txt");
        assert_eq!(metadata.plan, Plan::SinglePass);
        assert_eq!(metadata.transcript_file, None);
        assert!(metadata.created_at.contains('T'));
    }

    #[test]
    fn transcript_is_written_as_json_lines() {
        let temp = tempfile::tempdir().unwrap();
        let mut session = summarized_session();
        session.ask("what?").unwrap();
        let mut handle = ExportHandle::write(temp.path(), session.current().unwrap()).unwrap();
        handle.write_transcript(session.transcript()).unwrap();

        let raw = fs::read_to_string(handle.dir().join("transcript.jsonl")).unwrap();
        let lines: Vec<&str> = raw.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], r#"{"role":"user","content":"what?"}"#);
        let second: brief_core::session::ChatTurn = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second.role, Role::Assistant);
        assert_eq!(
            handle.metadata().transcript_file.as_deref(),
            Some("transcript.jsonl")
        );
        assert!(handle.metadata().updated_at.is_some());
    }

    #[test]
    fn empty_transcript_writes_nothing() {
        let temp = tempfile::tempdir().unwrap();
        let session = summarized_session();
        let mut handle = ExportHandle::write(temp.path(), session.current().unwrap()).unwrap();
        handle.write_transcript(&[]).unwrap();
        assert!(!handle.dir().join("transcript.jsonl").exists());
    }
}
