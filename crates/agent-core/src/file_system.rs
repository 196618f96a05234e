//! The `FileSystem` collaborator: a plain-text, append-friendly scratchpad
//! the orchestrator hands to the action registry (`ActionFileSystem`) and
//! consults directly when composing `<agent_state>` (`describe`,
//! `get_todo_contents`).

use std::path::PathBuf;
use std::sync::Mutex;

use action_registry::ActionFileSystem;

/// A directory-backed file system scoped to a single agent run.
///
/// `extracted_content_<n>.md` files accumulate `extract` results that were
/// too large to inline in the prompt (see `ActionResult::once`); `todo.md`
/// is a plain checklist the agent can read and rewrite across steps.
pub struct LocalFileSystem {
    root: PathBuf,
    extraction_count: Mutex<u32>,
}

impl LocalFileSystem {
    pub fn new(root: impl Into<PathBuf>) -> std::io::Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            extraction_count: Mutex::new(0),
        })
    }

    pub fn todo_path(&self) -> PathBuf {
        self.root.join("todo.md")
    }

    pub fn state_path(&self) -> PathBuf {
        self.root.join("state.json")
    }

    /// One-paragraph description of the scratchpad's current contents,
    /// inlined into `<agent_state>`.
    pub fn describe(&self) -> String {
        let mut entries: Vec<String> = match std::fs::read_dir(&self.root) {
            Ok(dir) => dir
                .filter_map(|e| e.ok())
                .filter_map(|e| e.file_name().into_string().ok())
                .collect(),
            Err(_) => Vec::new(),
        };
        entries.sort();
        if entries.is_empty() {
            "File system is empty. No files written yet.".to_string()
        } else {
            format!("Files available: {}", entries.join(", "))
        }
    }

    pub fn get_todo_contents(&self) -> String {
        std::fs::read_to_string(self.todo_path()).unwrap_or_default()
    }

    pub fn write_todo_contents(&self, contents: &str) -> std::io::Result<()> {
        std::fs::write(self.todo_path(), contents)
    }

    pub fn save_extracted_content(&self, content: &str) -> std::io::Result<String> {
        let mut count = self.extraction_count.lock().unwrap();
        *count += 1;
        let filename = format!("extracted_content_{}.md", *count);
        std::fs::write(self.root.join(&filename), content)?;
        Ok(filename)
    }

    /// Persists a JSON snapshot of orchestrator-visible state (current URL,
    /// detected variables, ...) so a crashed run can resume with context.
    pub fn save_state(&self, state: &serde_json::Value) -> std::io::Result<()> {
        std::fs::write(self.state_path(), serde_json::to_vec_pretty(state)?)
    }

    pub fn load_state(&self) -> Option<serde_json::Value> {
        std::fs::read_to_string(self.state_path())
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
    }
}

impl ActionFileSystem for LocalFileSystem {
    fn save(&self, name: &str, content: &str) -> std::io::Result<String> {
        std::fs::write(self.root.join(name), content)?;
        Ok(name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describes_empty_filesystem() {
        let dir = tempdir();
        let fs = LocalFileSystem::new(&dir).unwrap();
        assert!(fs.describe().contains("empty"));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn saves_and_lists_extracted_content() {
        let dir = tempdir();
        let fs = LocalFileSystem::new(&dir).unwrap();
        let name = fs.save_extracted_content("some long page text").unwrap();
        assert_eq!(name, "extracted_content_1.md");
        assert!(fs.describe().contains(&name));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn todo_round_trips() {
        let dir = tempdir();
        let fs = LocalFileSystem::new(&dir).unwrap();
        fs.write_todo_contents("- [ ] step one").unwrap();
        assert_eq!(fs.get_todo_contents(), "- [ ] step one");
        std::fs::remove_dir_all(&dir).ok();
    }

    fn tempdir() -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("agent-core-fs-test-{}", uuid::Uuid::new_v4()));
        path
    }
}
