//! FileTransport - appends one timestamped line per publish

use contracts::{ContractError, MessageId, PublishRequest, PublishTransport};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, error, instrument};

/// Transport that appends `<rfc3339> <topic> <payload>` lines to a file
pub struct FileTransport {
    name: String,
    path: PathBuf,
    file: Option<File>,
    line: String,
    next_id: u32,
}

impl FileTransport {
    /// Open (or create) `path` for appending
    pub fn new(name: impl Into<String>, path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            name: name.into(),
            path,
            file: Some(file),
            line: String::new(),
            next_id: 1,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append_line(&mut self, request: &PublishRequest) -> std::io::Result<()> {
        self.line.clear();
        self.line
            .push_str(&chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true));
        self.line.push(' ');
        self.line.push_str(&request.topic);
        self.line.push(' ');
        self.line.push_str(&String::from_utf8_lossy(&request.payload));
        self.line.push('\n');

        let file = self
            .file
            .as_mut()
            .ok_or_else(|| std::io::Error::other("transport closed"))?;
        file.write_all(self.line.as_bytes())
    }
}

impl PublishTransport for FileTransport {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "file_transport_publish",
        skip(self, request),
        fields(transport = %self.name, bytes = request.payload.len())
    )]
    async fn publish(&mut self, request: &PublishRequest) -> Result<MessageId, ContractError> {
        self.append_line(request).map_err(|e| {
            error!(transport = %self.name, error = %e, "Append failed");
            ContractError::publish(&self.name, e.to_string())
        })?;

        let id = MessageId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        Ok(id)
    }

    #[instrument(name = "file_transport_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        if let Some(mut file) = self.file.take() {
            file.flush()?;
        }
        debug!(transport = %self.name, path = %self.path.display(), "FileTransport closed");
        Ok(())
    }
}
