use axum::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use crate::models::{Participant, PrintRecord};
use crate::store::{StoreError, UserTable, Worksheet};

/// A user table kept in a local CSV file.
///
/// Writes rewrite the whole file through a sibling temp file and a rename,
/// serialized by `write_lock` so concurrent prints cannot interleave.
pub struct CsvUserTable {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl CsvUserTable {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    async fn load(&self) -> Result<Worksheet, StoreError> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || read_worksheet(&path)).await?
    }
}

#[async_trait]
impl UserTable for CsvUserTable {
    async fn find_participant(&self, id_card: &str) -> Result<Option<Participant>, StoreError> {
        self.load().await?.participant(id_card)
    }

    async fn record_print(&self, id_card: &str, record: &PrintRecord) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;

        let mut worksheet = self.load().await?;
        let updates = worksheet.apply_print(id_card, record)?;
        tracing::debug!(
            "Writing {} cell(s) to {}",
            updates.len(),
            self.path.display()
        );

        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_worksheet(&path, &worksheet)).await?
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.load().await.map(|_| ())
    }

    fn is_writable(&self) -> bool {
        true
    }

    fn describe(&self) -> String {
        format!("csv:{}", self.path.display())
    }
}

pub fn read_worksheet(path: &Path) -> Result<Worksheet, StoreError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let rows = reader
        .records()
        .map(|record| record.map(|r| r.iter().map(|cell| cell.trim().to_string()).collect()))
        .collect::<Result<Vec<Vec<String>>, csv::Error>>()?;

    Ok(Worksheet::new(rows))
}

pub fn write_worksheet(path: &Path, worksheet: &Worksheet) -> Result<(), StoreError> {
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    {
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_path(&tmp_path)?;
        for row in worksheet.rows() {
            writer.write_record(row)?;
        }
        writer.flush()?;
    }

    std::fs::rename(&tmp_path, path)?;
    Ok(())
}
