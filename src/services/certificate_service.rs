use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference};
use std::path::Path;
use uuid::Uuid;

use crate::models::{ActivityStats, Participant};

// US Letter, in points.
const PAGE_WIDTH_PT: f32 = 612.0;
const PAGE_HEIGHT_PT: f32 = 792.0;
const LEFT_MARGIN_PT: f32 = 100.0;
const FIRST_LINE_PT: f32 = 750.0;
const LINE_SPACING_PT: f32 = 20.0;
const SERIAL_LINE_PT: f32 = 60.0;
const FONT_SIZE: f32 = 12.0;
const SERIAL_FONT_SIZE: f32 = 8.0;

#[derive(Debug, thiserror::Error)]
pub enum CertificateError {
    #[error("Failed to read font {path}: {source}")]
    FontUnreadable {
        path: String,
        source: std::io::Error,
    },
    #[error("PDF rendering failed: {0}")]
    Render(#[from] printpdf::Error),
}

/// Field labels and placeholders printed on the certificate.
#[derive(Debug, Clone, PartialEq)]
pub struct CertificateLabels {
    pub name: &'static str,
    pub bib: &'static str,
    pub title: &'static str,
    pub distance: &'static str,
    pub time: &'static str,
    pub date: &'static str,
    pub pace: &'static str,
    pub elevation: &'static str,
    pub serial: &'static str,
    pub missing_title: &'static str,
    pub missing_distance: &'static str,
    pub missing_time: &'static str,
    pub missing_date: &'static str,
}

pub const CHINESE_LABELS: CertificateLabels = CertificateLabels {
    name: "姓名",
    bib: "選手編號",
    title: "活動名稱",
    distance: "距離",
    time: "花費時間",
    date: "日期",
    pace: "配速",
    elevation: "爬升",
    serial: "證書編號",
    missing_title: "無法讀取標題",
    missing_distance: "無法讀取距離",
    missing_time: "無法讀取時間",
    missing_date: "無法讀取日期",
};

pub const ENGLISH_LABELS: CertificateLabels = CertificateLabels {
    name: "Name",
    bib: "Bib number",
    title: "Activity",
    distance: "Distance",
    time: "Elapsed time",
    date: "Date",
    pace: "Pace",
    elevation: "Elevation gain",
    serial: "Certificate No.",
    missing_title: "Unable to read title",
    missing_distance: "Unable to read distance",
    missing_time: "Unable to read time",
    missing_date: "Unable to read date",
};

/// A rendered certificate ready to download.
#[derive(Debug, Clone)]
pub struct Certificate {
    pub serial: Uuid,
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Renders one-page finisher certificates.
///
/// With a TrueType font (e.g. Noto Sans TC) the certificate is labelled in
/// Traditional Chinese; the builtin Helvetica fallback only covers Latin
/// text, so English labels are used instead.
pub struct CertificateService {
    font: Option<Vec<u8>>,
}

impl CertificateService {
    pub fn new(font_path: Option<&Path>) -> Result<Self, CertificateError> {
        let font = match font_path {
            Some(path) => {
                let bytes =
                    std::fs::read(path).map_err(|source| CertificateError::FontUnreadable {
                        path: path.display().to_string(),
                        source,
                    })?;
                tracing::info!("Loaded certificate font {}", path.display());
                Some(bytes)
            }
            None => {
                tracing::warn!("No certificate font configured, using Helvetica with English labels");
                None
            }
        };

        Ok(Self { font })
    }

    pub fn labels(&self) -> &'static CertificateLabels {
        if self.font.is_some() {
            &CHINESE_LABELS
        } else {
            &ENGLISH_LABELS
        }
    }

    /// The text lines of the certificate, top to bottom.
    pub fn lines(&self, participant: &Participant, stats: &ActivityStats) -> Vec<String> {
        let labels = self.labels();
        let or = |value: Option<String>, missing: &str| value.unwrap_or_else(|| missing.to_string());

        let mut lines = vec![
            format!("{}: {}", labels.name, participant.display_name()),
            format!("{}: {}", labels.bib, participant.display_number()),
            format!("{}: {}", labels.title, or(stats.title.clone(), labels.missing_title)),
            format!(
                "{}: {}",
                labels.distance,
                or(stats.distance_display(), labels.missing_distance)
            ),
            format!(
                "{}: {}",
                labels.time,
                or(stats.elapsed_display(), labels.missing_time)
            ),
            format!("{}: {}", labels.date, or(stats.date.clone(), labels.missing_date)),
        ];

        if let Some(pace) = stats.pace_display() {
            lines.push(format!("{}: {}", labels.pace, pace));
        }
        if let Some(elevation) = stats.elevation_display() {
            lines.push(format!("{}: {}", labels.elevation, elevation));
        }

        lines
    }

    pub fn render(
        &self,
        participant: &Participant,
        stats: &ActivityStats,
    ) -> Result<Certificate, CertificateError> {
        let serial = Uuid::new_v4();
        let (doc, page, layer) = PdfDocument::new(
            "Finisher Certificate",
            pt_to_mm(PAGE_WIDTH_PT),
            pt_to_mm(PAGE_HEIGHT_PT),
            "Certificate",
        );
        let font = self.load_font(&doc)?;
        let layer = doc.get_page(page).get_layer(layer);

        for (index, line) in self.lines(participant, stats).into_iter().enumerate() {
            let y = FIRST_LINE_PT - LINE_SPACING_PT * index as f32;
            layer.use_text(line, FONT_SIZE, pt_to_mm(LEFT_MARGIN_PT), pt_to_mm(y), &font);
        }
        layer.use_text(
            format!("{}: {}", self.labels().serial, serial),
            SERIAL_FONT_SIZE,
            pt_to_mm(LEFT_MARGIN_PT),
            pt_to_mm(SERIAL_LINE_PT),
            &font,
        );

        let bytes = doc.save_to_bytes()?;
        tracing::debug!(
            "Rendered certificate {} for {} ({} bytes)",
            serial,
            participant.display_number(),
            bytes.len()
        );

        Ok(Certificate {
            serial,
            filename: certificate_filename(participant.display_number()),
            bytes,
        })
    }

    fn load_font(&self, doc: &PdfDocumentReference) -> Result<IndirectFontRef, CertificateError> {
        let font = match &self.font {
            Some(bytes) => doc.add_external_font(bytes.as_slice())?,
            None => doc.add_builtin_font(BuiltinFont::Helvetica)?,
        };
        Ok(font)
    }
}

/// `{user_number}_cert.pdf`, restricted to characters that are safe in a
/// `Content-Disposition` header.
pub fn certificate_filename(user_number: &str) -> String {
    let stem: String = user_number
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{stem}_cert.pdf")
}

fn pt_to_mm(points: f32) -> Mm {
    Mm(points * 25.4 / 72.0)
}
