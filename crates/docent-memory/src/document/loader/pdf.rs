use std::path::Path;
use std::pin::Pin;

use super::super::{DEFAULT_MAX_FILE_SIZE, DocumentError, DocumentLoader, SourceDocument};

pub struct PdfLoader {
    pub max_file_size: u64,
}

impl Default for PdfLoader {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

impl DocumentLoader for PdfLoader {
    fn load(
        &self,
        path: &Path,
    ) -> Pin<Box<dyn std::future::Future<Output = Result<SourceDocument, DocumentError>> + Send + '_>>
    {
        let path = path.to_path_buf();
        let max_size = self.max_file_size;
        Box::pin(async move {
            let path = tokio::fs::canonicalize(&path).await?;

            let meta = tokio::fs::metadata(&path).await?;
            if meta.len() > max_size {
                return Err(DocumentError::FileTooLarge(meta.len()));
            }

            let source = path.display().to_string();
            let pages = tokio::task::spawn_blocking(move || {
                pdf_extract::extract_text_by_pages(&path)
                    .map_err(|e| DocumentError::Pdf(e.to_string()))
            })
            .await
            .map_err(|e| DocumentError::Io(std::io::Error::other(e)))??;

            Ok(SourceDocument {
                path: source,
                page_count: Some(pages.len()),
                raw_text: pages.join("\n"),
                content_type: "application/pdf",
            })
        })
    }

    fn supported_extensions(&self) -> &[&str] {
        &["pdf"]
    }
}

/// Minimal uncompressed PDF with one Helvetica text line per page.
#[cfg(test)]
pub(crate) fn sample_pdf(pages: &[&str]) -> Vec<u8> {
    let page_ids: Vec<usize> = (0..pages.len()).map(|i| 4 + 2 * i).collect();
    let kids = page_ids
        .iter()
        .map(|id| format!("{id} 0 R"))
        .collect::<Vec<_>>()
        .join(" ");

    let mut objects = vec![
        "<< /Type /Catalog /Pages 2 0 R >>".to_owned(),
        format!("<< /Type /Pages /Kids [{kids}] /Count {} >>", pages.len()),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_owned(),
    ];
    for (text, id) in pages.iter().zip(&page_ids) {
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
             /Resources << /Font << /F1 3 0 R >> >> /Contents {} 0 R >>",
            id + 1
        ));
        let content = format!("BT /F1 24 Tf 72 700 Td ({text}) Tj ET");
        objects.push(format!(
            "<< /Length {} >>\nstream\n{content}\nendstream",
            content.len()
        ));
    }

    let mut out = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n{body}\nendobj\n", i + 1).as_bytes());
    }
    let xref = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).as_bytes());
    for off in offsets {
        out.extend_from_slice(format!("{off:010} 00000 n \n").as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref}\n%%EOF\n",
            objects.len() + 1
        )
        .as_bytes(),
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn multi_page_pdf_is_one_document() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("guide.pdf");
        std::fs::write(&file, sample_pdf(&["alpha page", "omega page"])).unwrap();

        let doc = PdfLoader::default().load(&file).await.unwrap();
        assert_eq!(doc.page_count, Some(2));
        assert_eq!(doc.content_type, "application/pdf");
        assert!(doc.path.ends_with("guide.pdf"));

        let first = doc.raw_text.find("alpha").unwrap();
        let second = doc.raw_text.find("omega").unwrap();
        assert!(first < second, "{:?}", doc.raw_text);
    }

    #[tokio::test]
    async fn oversized_pdf_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("big.pdf");
        std::fs::write(&file, sample_pdf(&["x"])).unwrap();

        let result = PdfLoader { max_file_size: 16 }.load(&file).await;
        assert!(matches!(result, Err(DocumentError::FileTooLarge(_))));
    }

    #[test]
    fn supports_pdf_only() {
        assert_eq!(PdfLoader::default().supported_extensions(), &["pdf"]);
    }

    #[tokio::test]
    async fn corrupt_pdf_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("broken.pdf");
        std::fs::write(&file, b"not really a pdf").unwrap();

        let result = PdfLoader::default().load(&file).await;
        assert!(result.is_err());
    }
}
