// src/services/document_service.rs

//! Leitura dos PDFs enviados: grava todos os arquivos e extrai o texto dos PDFs.

use crate::{
    models::{ai::ExtractionWarning, development::StoredFile},
    services::storage::UploadStore,
};

/// Arquivo recebido no multipart, ainda em memória.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Default)]
pub struct ExtractedDocuments {
    /// Texto de todas as páginas, na ordem dos arquivos, cada página seguida de linha em branco.
    pub text: String,
    pub stored: Vec<StoredFile>,
    pub warnings: Vec<ExtractionWarning>,
}

impl ExtractedDocuments {
    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

pub fn is_pdf(name: &str) -> bool {
    name.to_ascii_lowercase().ends_with(".pdf")
}

/// Extrai o texto de um PDF em memória. Roda no pool bloqueante;
/// um pânico do parser vira erro deste arquivo apenas.
pub async fn pdf_text(bytes: Vec<u8>) -> Result<String, String> {
    let pages = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem_by_pages(&bytes))
        .await
        .map_err(|e| format!("falha no leitor de PDF: {}", e))?
        .map_err(|e| e.to_string())?;

    let mut text = String::new();
    for page in pages {
        text.push_str(&page);
        text.push_str("\n\n");
    }
    Ok(text)
}

#[derive(Debug, Clone)]
pub struct DocumentService {
    store: UploadStore,
}

impl DocumentService {
    pub fn new(store: UploadStore) -> Self {
        Self { store }
    }

    /// Nunca falha: problemas por arquivo viram avisos e o lote continua.
    pub async fn extract(&self, files: Vec<UploadedFile>) -> ExtractedDocuments {
        let mut result = ExtractedDocuments::default();

        for file in files {
            match self.store.save(&file.name, &file.bytes).await {
                Ok(stored) => result.stored.push(stored),
                Err(e) => {
                    tracing::warn!("Falha ao gravar o arquivo {}: {}", file.name, e);
                    result.warnings.push(ExtractionWarning::FileNotStored {
                        file: file.name.clone(),
                        reason: e.to_string(),
                    });
                }
            }

            if !is_pdf(&file.name) {
                continue;
            }

            match pdf_text(file.bytes).await {
                Ok(text) => result.text.push_str(&text),
                Err(reason) => {
                    tracing::warn!("Erro ao processar o arquivo {}: {}", file.name, reason);
                    result.warnings.push(ExtractionWarning::FileUnreadable { file: file.name, reason });
                }
            }
        }

        if !result.has_text() {
            result.warnings.push(ExtractionWarning::NoTextExtracted);
        }

        tracing::info!(
            "📄 {} arquivo(s) gravado(s), {} caractere(s) extraído(s)",
            result.stored.len(),
            result.text.chars().count()
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// PDF mínimo com uma página por item, em Helvetica; item vazio vira página em branco.
    fn simple_pdf(pages: &[&str]) -> Vec<u8> {
        let first_page = 4;
        let kids: Vec<String> = (0..pages.len()).map(|i| format!("{} 0 R", first_page + 2 * i)).collect();

        let mut objects = vec![
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            format!("<< /Type /Pages /Kids [{}] /Count {} >>", kids.join(" "), pages.len()),
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
        ];
        for (i, text) in pages.iter().enumerate() {
            let content = if text.is_empty() {
                String::new()
            } else {
                format!("BT /F1 12 Tf 72 720 Td ({}) Tj ET", text)
            };
            objects.push(format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Resources << /Font << /F1 3 0 R >> >> /Contents {} 0 R >>",
                first_page + 2 * i + 1
            ));
            objects.push(format!("<< /Length {} >>\nstream\n{}\nendstream", content.len(), content));
        }

        let mut pdf = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::with_capacity(objects.len());
        for (i, body) in objects.iter().enumerate() {
            offsets.push(pdf.len());
            pdf.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
        }

        let xref_at = pdf.len();
        let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
        for offset in offsets {
            xref.push_str(&format!("{:010} 00000 n \n", offset));
        }
        xref.push_str(&format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_at
        ));
        pdf.extend_from_slice(xref.as_bytes());
        pdf
    }

    #[tokio::test]
    async fn pages_of_every_pdf_are_joined_in_upload_order() {
        let dir = tempfile::tempdir().unwrap();
        let service = DocumentService::new(UploadStore::new(dir.path()));

        let result = service
            .extract(vec![
                UploadedFile { name: "book.pdf".into(), bytes: simple_pdf(&["Alpha page one", "Alpha page two"]) },
                UploadedFile { name: "tabela.pdf".into(), bytes: simple_pdf(&["Beta"]) },
            ])
            .await;

        assert_eq!(result.text, "\n\nAlpha page one\n\n\n\nAlpha page two\n\n\n\nBeta\n\n");
        assert_eq!(result.stored.len(), 2);
        assert!(result.warnings.is_empty());
    }

    #[tokio::test]
    async fn blank_pdf_is_kept_but_yields_no_text() {
        let dir = tempfile::tempdir().unwrap();
        let service = DocumentService::new(UploadStore::new(dir.path()));

        let result = service
            .extract(vec![UploadedFile { name: "em_branco.pdf".into(), bytes: simple_pdf(&[""]) }])
            .await;

        assert_eq!(result.stored.len(), 1);
        assert!(!result.has_text());
        assert_eq!(result.warnings, vec![ExtractionWarning::NoTextExtracted]);
    }

    #[test]
    fn pdf_detection_ignores_case() {
        assert!(is_pdf("Book.PDF"));
        assert!(is_pdf("tabela.pdf"));
        assert!(!is_pdf("planta.png"));
        assert!(!is_pdf("pdf"));
    }

    #[tokio::test]
    async fn non_pdf_is_stored_without_text() {
        let dir = tempfile::tempdir().unwrap();
        let service = DocumentService::new(UploadStore::new(dir.path()));

        let result = service
            .extract(vec![UploadedFile { name: "planta.png".into(), bytes: vec![1, 2, 3] }])
            .await;

        assert_eq!(result.stored.len(), 1);
        assert_eq!(result.stored[0].original_name, "planta.png");
        assert!(!result.has_text());
        assert_eq!(result.warnings, vec![ExtractionWarning::NoTextExtracted]);
        assert!(dir.path().join(&result.stored[0].stored_name).exists());
    }

    #[tokio::test]
    async fn broken_pdf_warns_and_the_batch_continues() {
        let dir = tempfile::tempdir().unwrap();
        let service = DocumentService::new(UploadStore::new(dir.path()));

        let result = service
            .extract(vec![
                UploadedFile { name: "quebrado.pdf".into(), bytes: b"isto nao e um pdf".to_vec() },
                UploadedFile { name: "foto.jpg".into(), bytes: vec![0xff, 0xd8] },
            ])
            .await;

        // Os dois arquivos continuam anexáveis
        assert_eq!(result.stored.len(), 2);
        assert!(matches!(
            &result.warnings[0],
            ExtractionWarning::FileUnreadable { file, .. } if file == "quebrado.pdf"
        ));
        assert_eq!(result.warnings.last(), Some(&ExtractionWarning::NoTextExtracted));
    }
}
