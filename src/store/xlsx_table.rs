use axum::async_trait;
use calamine::{open_workbook, Data, Reader, Xlsx};
use std::path::{Path, PathBuf};

use crate::models::{Participant, PrintRecord};
use crate::store::worksheet::format_number;
use crate::store::{StoreError, UserTable, Worksheet};

/// A read-only user table in an Excel workbook.
pub struct XlsxUserTable {
    path: PathBuf,
    sheet: Option<String>,
}

impl XlsxUserTable {
    pub fn new(path: PathBuf, sheet: Option<String>) -> Self {
        Self { path, sheet }
    }

    async fn load(&self) -> Result<Worksheet, StoreError> {
        let path = self.path.clone();
        let sheet = self.sheet.clone();
        tokio::task::spawn_blocking(move || read_worksheet(&path, sheet.as_deref())).await?
    }
}

#[async_trait]
impl UserTable for XlsxUserTable {
    async fn find_participant(&self, id_card: &str) -> Result<Option<Participant>, StoreError> {
        self.load().await?.participant(id_card)
    }

    async fn record_print(&self, _id_card: &str, _record: &PrintRecord) -> Result<(), StoreError> {
        Err(StoreError::ReadOnly)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.load().await.map(|_| ())
    }

    fn is_writable(&self) -> bool {
        false
    }

    fn describe(&self) -> String {
        match &self.sheet {
            Some(sheet) => format!("xlsx:{}#{sheet}", self.path.display()),
            None => format!("xlsx:{}", self.path.display()),
        }
    }
}

/// Reads the named sheet, or the first one.
///
/// calamine trims the range to the first used cell; the grid is padded back
/// so it stays anchored at A1.
pub fn read_worksheet(path: &Path, sheet: Option<&str>) -> Result<Worksheet, StoreError> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;

    let range = match sheet {
        Some(name) => {
            if !workbook.sheet_names().iter().any(|existing| existing == name) {
                return Err(StoreError::MissingSheet(format!(
                    "{} has no sheet named {name}",
                    path.display()
                )));
            }
            workbook.worksheet_range(name)?
        }
        None => workbook
            .worksheet_range_at(0)
            .ok_or_else(|| StoreError::MissingSheet(format!("{} has no sheets", path.display())))??,
    };

    let (start_row, start_column) = range.start().unwrap_or((0, 0));
    let mut rows: Vec<Vec<String>> = vec![Vec::new(); start_row as usize];
    rows.extend(range.rows().map(|row| {
        std::iter::repeat(String::new())
            .take(start_column as usize)
            .chain(row.iter().map(cell_text))
            .collect()
    }));

    Ok(Worksheet::new(rows))
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(text) => text.trim().to_string(),
        Data::Float(value) => format_number(*value),
        Data::Int(value) => value.to_string(),
        Data::Bool(value) => value.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(&Data::Float(912345678.0)), "912345678");
        assert_eq!(cell_text(&Data::String(" Lin ".to_string())), "Lin");
        assert_eq!(cell_text(&Data::Int(7)), "7");
        assert_eq!(cell_text(&Data::Empty), "");
    }

    #[tokio::test]
    async fn test_table_is_read_only() {
        let table = XlsxUserTable::new(PathBuf::from("users.xlsx"), None);
        let record = PrintRecord {
            printed_at: "2025-06-01 08:00:00".to_string(),
            uploaded_url: "https://www.strava.com/activities/1".to_string(),
        };

        assert!(!table.is_writable());
        assert!(matches!(
            table.record_print("A123456789", &record).await,
            Err(StoreError::ReadOnly)
        ));
        assert_eq!(table.describe(), "xlsx:users.xlsx");
    }

    fn fixture() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/users.xlsx")
    }

    #[tokio::test]
    async fn test_first_sheet_by_default() {
        let table = XlsxUserTable::new(fixture(), None);

        let lin = table.find_participant("a123456789").await.unwrap().unwrap();
        assert_eq!(lin.id_card, "A123456789");
        // Stored as a number in the workbook.
        assert_eq!(lin.phone, "912345678");
        assert_eq!(lin.name, "Lin Mei");
        assert_eq!(lin.user_number, "A001");

        let chen = table.find_participant("B987654321").await.unwrap().unwrap();
        assert_eq!(chen.phone, "0922000111");

        assert!(table.find_participant("C000000000").await.unwrap().is_none());
        assert!(table.health_check().await.is_ok());
    }

    #[tokio::test]
    async fn test_named_sheet_starting_below_a1() {
        let table = XlsxUserTable::new(fixture(), Some("roster".to_string()));

        let wang = table.find_participant("C000000000").await.unwrap().unwrap();
        assert_eq!(wang.phone, "933000000");
        assert_eq!(wang.name, "Wang Fang");
        assert_eq!(wang.user_number, "A003");
        assert!(table.find_participant("A123456789").await.unwrap().is_none());

        let worksheet = read_worksheet(&fixture(), Some("roster")).unwrap();
        assert_eq!(worksheet.column_index("id_card"), Some(1));
        assert_eq!(worksheet.cell(2, 1), "C000000000");
    }

    #[tokio::test]
    async fn test_missing_sheet() {
        let table = XlsxUserTable::new(fixture(), Some("archive".to_string()));
        assert!(matches!(
            table.find_participant("A123456789").await,
            Err(StoreError::MissingSheet(_))
        ));
        assert!(table.health_check().await.is_err());
    }

    #[tokio::test]
    async fn test_missing_workbook() {
        let table = XlsxUserTable::new(PathBuf::from("/nonexistent/users.xlsx"), None);
        assert!(table.find_participant("A123456789").await.is_err());
    }
}
