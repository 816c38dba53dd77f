use crate::models::{Participant, PrintRecord};
use crate::store::StoreError;

pub const ID_CARD_COLUMN: &str = "id_card";
pub const PHONE_COLUMN: &str = "phone";
pub const NAME_COLUMN: &str = "name";
pub const USER_NUMBER_COLUMN: &str = "user_number";
pub const LAST_PRINT_COLUMN: &str = "last_print";
pub const UPLOADED_URL_COLUMN: &str = "uploaded_url";

/// One cell to write back, zero-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellUpdate {
    pub row: usize,
    pub column: usize,
    pub value: String,
}

/// An in-memory grid of text cells anchored at A1. The first row with any
/// text is the header row; blank rows above it are kept so row indices stay
/// absolute.
///
/// Rows may be ragged; missing trailing cells read as empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Worksheet {
    rows: Vec<Vec<String>>,
    header_row: usize,
}

impl Worksheet {
    pub fn new(mut rows: Vec<Vec<String>>) -> Self {
        if let Some(first) = rows.first_mut().and_then(|header| header.first_mut()) {
            // Spreadsheet exports often start with a UTF-8 BOM.
            *first = first.trim_start_matches('\u{feff}').to_string();
        }
        let header_row = rows
            .iter()
            .position(|row| row.iter().any(|cell| !cell.trim().is_empty()))
            .unwrap_or(0);
        Self { rows, header_row }
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Vec<String>> {
        self.rows
    }

    pub fn headers(&self) -> &[String] {
        self.rows
            .get(self.header_row)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers()
            .iter()
            .position(|header| header.trim().eq_ignore_ascii_case(name))
    }

    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(column))
            .map(|cell| cell.trim())
            .unwrap_or("")
    }

    /// Finds the data row whose `id_card` cell matches, ignoring ASCII case.
    pub fn find_participant_row(&self, id_card: &str) -> Result<Option<usize>, StoreError> {
        let id_column = self
            .column_index(ID_CARD_COLUMN)
            .ok_or_else(|| StoreError::MissingColumn(ID_CARD_COLUMN.to_string()))?;
        let id_card = id_card.trim();
        if id_card.is_empty() {
            return Ok(None);
        }

        Ok((self.header_row + 1..self.rows.len()).find(|&row| self.cell(row, id_column).eq_ignore_ascii_case(id_card)))
    }

    pub fn participant(&self, id_card: &str) -> Result<Option<Participant>, StoreError> {
        let Some(row) = self.find_participant_row(id_card)? else {
            return Ok(None);
        };

        let phone_column = self
            .column_index(PHONE_COLUMN)
            .ok_or_else(|| StoreError::MissingColumn(PHONE_COLUMN.to_string()))?;
        let optional = |name: &str| -> String {
            self.column_index(name)
                .map(|column| self.cell(row, column).to_string())
                .unwrap_or_default()
        };
        let audit = |name: &str| Some(optional(name)).filter(|value| !value.is_empty());

        Ok(Some(Participant {
            id_card: self.cell(row, self.column_index(ID_CARD_COLUMN).unwrap_or(0)).to_string(),
            phone: self.cell(row, phone_column).to_string(),
            name: optional(NAME_COLUMN),
            user_number: optional(USER_NUMBER_COLUMN),
            last_print: audit(LAST_PRINT_COLUMN),
            uploaded_url: audit(UPLOADED_URL_COLUMN),
        }))
    }

    /// Writes the print record into the participant's row, appending the
    /// audit columns to the header row when they are missing.
    ///
    /// Returns every cell that changed so remote tables can apply the same
    /// edit cell by cell.
    pub fn apply_print(
        &mut self,
        id_card: &str,
        record: &PrintRecord,
    ) -> Result<Vec<CellUpdate>, StoreError> {
        let row = self
            .find_participant_row(id_card)?
            .ok_or(StoreError::ParticipantNotFound)?;

        let mut updates = Vec::with_capacity(4);
        let last_print = self.ensure_column(LAST_PRINT_COLUMN, &mut updates);
        let uploaded_url = self.ensure_column(UPLOADED_URL_COLUMN, &mut updates);

        self.set_cell(row, last_print, record.printed_at.clone(), &mut updates);
        self.set_cell(row, uploaded_url, record.uploaded_url.clone(), &mut updates);

        Ok(updates)
    }

    fn ensure_column(&mut self, name: &str, updates: &mut Vec<CellUpdate>) -> usize {
        if let Some(column) = self.column_index(name) {
            return column;
        }
        let column = self.headers().len();
        self.set_cell(self.header_row, column, name.to_string(), updates);
        column
    }

    fn set_cell(&mut self, row: usize, column: usize, value: String, updates: &mut Vec<CellUpdate>) {
        if self.rows.len() <= row {
            self.rows.resize_with(row + 1, Vec::new);
        }
        let cells = &mut self.rows[row];
        if cells.len() <= column {
            cells.resize(column + 1, String::new());
        }
        cells[column] = value.clone();
        updates.push(CellUpdate { row, column, value });
    }
}

/// Renders a numeric cell the way a person typed it: `912345678.0` becomes
/// `912345678`.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// Converts a zero-based column index to A1 letters (`0` -> `A`, `26` -> `AA`).
pub fn column_letter(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let remainder = (n - 1) % 26;
        letters.push(b'A' + remainder as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(rows: &[&[&str]]) -> Worksheet {
        Worksheet::new(
            rows.iter()
                .map(|row| row.iter().map(|cell| cell.to_string()).collect())
                .collect(),
        )
    }

    fn record() -> PrintRecord {
        PrintRecord {
            printed_at: "2025-06-01 08:00:00".to_string(),
            uploaded_url: "https://www.strava.com/activities/1".to_string(),
        }
    }

    #[test]
    fn test_participant_lookup() {
        let ws = sheet(&[
            &["\u{feff}id_card", "phone", "name", "user_number"],
            &["A123456789", "912345678", "Lin", "A001"],
            &["B223456789", "0987654321", "Chen"],
        ]);

        let lin = ws.participant("a123456789").unwrap().unwrap();
        assert_eq!(lin.id_card, "A123456789");
        assert_eq!(lin.phone, "912345678");
        assert_eq!(lin.user_number, "A001");
        assert_eq!(lin.last_print, None);

        let chen = ws.participant("B223456789").unwrap().unwrap();
        assert_eq!(chen.user_number, "");

        assert!(ws.participant("C000000000").unwrap().is_none());
        assert!(ws.participant("  ").unwrap().is_none());
    }

    #[test]
    fn test_missing_id_column() {
        let ws = sheet(&[&["phone"], &["0912345678"]]);
        assert!(matches!(
            ws.participant("A123456789"),
            Err(StoreError::MissingColumn(column)) if column == "id_card"
        ));
    }

    #[test]
    fn test_apply_print_appends_missing_columns() {
        let mut ws = sheet(&[
            &["id_card", "phone", "name", "user_number"],
            &["A123456789", "0912345678", "Lin", "A001"],
        ]);

        let updates = ws.apply_print("A123456789", &record()).unwrap();

        assert_eq!(
            updates,
            vec![
                CellUpdate { row: 0, column: 4, value: "last_print".to_string() },
                CellUpdate { row: 0, column: 5, value: "uploaded_url".to_string() },
                CellUpdate { row: 1, column: 4, value: "2025-06-01 08:00:00".to_string() },
                CellUpdate {
                    row: 1,
                    column: 5,
                    value: "https://www.strava.com/activities/1".to_string()
                },
            ]
        );

        let participant = ws.participant("A123456789").unwrap().unwrap();
        assert_eq!(participant.last_print.as_deref(), Some("2025-06-01 08:00:00"));
    }

    #[test]
    fn test_apply_print_reuses_existing_columns() {
        let mut ws = sheet(&[
            &["id_card", "phone", "last_print", "name", "uploaded_url"],
            &["A123456789", "0912345678", "old", "Lin", "old-url"],
        ]);

        let updates = ws.apply_print("A123456789", &record()).unwrap();

        assert_eq!(updates.len(), 2);
        assert_eq!(ws.cell(1, 2), "2025-06-01 08:00:00");
        assert_eq!(ws.cell(1, 4), "https://www.strava.com/activities/1");
    }

    #[test]
    fn test_header_below_blank_rows() {
        let mut ws = sheet(&[
            &[],
            &["", "id_card", "phone", "name"],
            &["", "C000000000", "933000000", "Wang"],
        ]);

        assert_eq!(ws.column_index("phone"), Some(2));
        let wang = ws.participant("C000000000").unwrap().unwrap();
        assert_eq!(wang.phone, "933000000");
        assert_eq!(wang.name, "Wang");

        let updates = ws.apply_print("C000000000", &record()).unwrap();
        assert_eq!(
            updates[0],
            CellUpdate { row: 1, column: 4, value: "last_print".to_string() }
        );
        assert_eq!(updates[2].row, 2);
        assert_eq!(ws.cell(2, 4), "2025-06-01 08:00:00");
    }

    #[test]
    fn test_apply_print_unknown_participant() {
        let mut ws = sheet(&[&["id_card", "phone"], &["A123456789", "0912345678"]]);
        assert!(matches!(
            ws.apply_print("Z999999999", &record()),
            Err(StoreError::ParticipantNotFound)
        ));
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(912345678.0), "912345678");
        assert_eq!(format_number(1.5), "1.5");
    }

    #[test]
    fn test_column_letter() {
        assert_eq!(column_letter(0), "A");
        assert_eq!(column_letter(25), "Z");
        assert_eq!(column_letter(26), "AA");
        assert_eq!(column_letter(27), "AB");
        assert_eq!(column_letter(701), "ZZ");
        assert_eq!(column_letter(702), "AAA");
    }
}
