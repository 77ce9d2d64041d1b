//! Transcript persistence
//!
//! Each run writes one `<prefix>_<N>.txt` file, N being the smallest unused
//! positive integer in the transcript directory.

use std::io::ErrorKind;
use std::path::PathBuf;

use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::config::TranscriptSettings;
use crate::conversation::Conversation;

#[derive(Debug, thiserror::Error)]
pub enum TranscriptError {
    #[error("Failed to write transcript in {}: {source}", .dir.display())]
    Io {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Writes run transcripts into a dedicated directory
#[derive(Debug, Clone)]
pub struct TranscriptStore {
    dir: PathBuf,
    prefix: String,
}

impl TranscriptStore {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
        }
    }

    pub fn from_settings(settings: &TranscriptSettings) -> Self {
        Self::new(settings.dir.clone(), settings.prefix.clone())
    }

    /// Persist the conversation and resolved answer, returning the file written
    pub async fn save(
        &self,
        conversation: &Conversation,
        final_answer: &str,
    ) -> Result<PathBuf, TranscriptError> {
        let data = render(conversation, final_answer);
        let path = self.write_next(data.as_bytes()).await.map_err(|source| TranscriptError::Io {
            dir: self.dir.clone(),
            source,
        })?;

        info!(path = %path.display(), "Saved transcript");
        Ok(path)
    }

    async fn write_next(&self, data: &[u8]) -> std::io::Result<PathBuf> {
        fs::create_dir_all(&self.dir).await?;

        // create_new makes claiming a suffix atomic, so another process that
        // grabbed the same number pushes us on to the next one.
        let mut suffix: u64 = 1;
        loop {
            let path = self.dir.join(format!("{}_{}.txt", self.prefix, suffix));
            match OpenOptions::new().write(true).create_new(true).open(&path).await {
                Ok(mut file) => {
                    file.write_all(data).await?;
                    file.flush().await?;
                    return Ok(path);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => suffix += 1,
                Err(e) => return Err(e),
            }
        }
    }
}

/// Transcript body: every turn as `role: content`, then the resolved answer
pub fn render(conversation: &Conversation, final_answer: &str) -> String {
    format!(
        "Messages:\n{}\n\nSmartGPT Final Answer:\n{}",
        conversation.render(),
        final_answer
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_conversation() -> Conversation {
        let mut conversation = Conversation::from_user("Question. What is 2+2?");
        conversation.add_assistant("Answer Option 1: 4\n\n").unwrap();
        conversation
    }

    #[test]
    fn test_render_layout() {
        let text = render(&sample_conversation(), "4");
        assert_eq!(
            text,
            "Messages:\nuser: Question. What is 2+2?\nassistant: Answer Option 1: 4\n\n\n\nSmartGPT Final Answer:\n4"
        );
    }

    #[tokio::test]
    async fn test_creates_directory_and_numbers_from_one() {
        let temp = tempfile::tempdir().unwrap();
        let store = TranscriptStore::new(temp.path().join("conversations"), "question");

        let first = store.save(&sample_conversation(), "4").await.unwrap();
        let second = store.save(&sample_conversation(), "four").await.unwrap();

        assert_eq!(first.file_name().unwrap(), "question_1.txt");
        assert_eq!(second.file_name().unwrap(), "question_2.txt");
        assert!(std::fs::read_to_string(&second).unwrap().ends_with("SmartGPT Final Answer:\nfour"));
    }

    #[tokio::test]
    async fn test_never_overwrites_existing_files() {
        let temp = tempfile::tempdir().unwrap();
        for n in 1..=3 {
            std::fs::write(temp.path().join(format!("question_{n}.txt")), "old").unwrap();
        }

        let store = TranscriptStore::new(temp.path(), "question");
        let path = store.save(&sample_conversation(), "4").await.unwrap();

        assert_eq!(path.file_name().unwrap(), "question_4.txt");
        assert_eq!(std::fs::read_to_string(temp.path().join("question_2.txt")).unwrap(), "old");
    }

    #[tokio::test]
    async fn test_fills_smallest_gap() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(temp.path().join("question_1.txt"), "old").unwrap();
        std::fs::write(temp.path().join("question_3.txt"), "old").unwrap();

        let store = TranscriptStore::new(temp.path(), "question");
        let path = store.save(&sample_conversation(), "4").await.unwrap();

        assert_eq!(path.file_name().unwrap(), "question_2.txt");
    }

    #[tokio::test]
    async fn test_unwritable_directory_errors() {
        let temp = tempfile::tempdir().unwrap();
        let blocker = temp.path().join("not_a_dir");
        std::fs::write(&blocker, "file").unwrap();

        let store = TranscriptStore::new(&blocker, "question");
        let err = store.save(&sample_conversation(), "4").await.unwrap_err();
        assert!(matches!(err, TranscriptError::Io { .. }));
    }
}
