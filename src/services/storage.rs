// src/services/storage.rs

//! Arquivos enviados (PDFs, books, tabelas) gravados no diretório de uploads.

use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::{common::error::AppError, models::development::StoredFile};

const FALLBACK_NAME: &str = "arquivo";

// Colunas `materials.original_name` e `stored_name` são VARCHAR(200); o nome
// seguro deixa espaço para o timestamp e o prefixo de colisão.
const MAX_SECURE_NAME: usize = 180;
const MAX_DISPLAY_NAME: usize = 200;

fn fold_char(c: char) -> Option<char> {
    let folded = match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
        'Á' | 'À' | 'Â' | 'Ã' | 'Ä' => 'A',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'É' | 'È' | 'Ê' | 'Ë' => 'E',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'Í' | 'Ì' | 'Î' | 'Ï' => 'I',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'Ó' | 'Ò' | 'Ô' | 'Õ' | 'Ö' => 'O',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'Ú' | 'Ù' | 'Û' | 'Ü' => 'U',
        'ç' => 'c',
        'Ç' => 'C',
        'ñ' => 'n',
        'Ñ' => 'N',
        c if c.is_whitespace() => '_',
        c if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') => c,
        _ => return None,
    };
    Some(folded)
}

/// Nome seguro para o disco: sem acentos, sem separadores de caminho,
/// espaços viram `_`.
pub fn secure_filename(original: &str) -> String {
    // Só o último componente, venha de Windows ou de Unix
    let base = original.rsplit(['/', '\\']).next().unwrap_or(original);
    let cleaned: String = base.chars().filter_map(fold_char).collect();
    let trimmed = cleaned.trim_matches(|c| c == '.' || c == '_');
    if trimmed.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        cap_length(trimmed)
    }
}

// Corta o nome (só ASCII neste ponto) mantendo a extensão
fn cap_length(name: &str) -> String {
    if name.len() <= MAX_SECURE_NAME {
        return name.to_string();
    }
    let extension = name
        .rfind('.')
        .map(|idx| &name[idx..])
        .filter(|ext| ext.len() <= 10)
        .unwrap_or("");
    let stem = &name[..MAX_SECURE_NAME - extension.len()];
    format!("{}{}", stem.trim_end_matches(['.', '_']), extension)
}

pub fn stored_name(now: NaiveDateTime, original: &str) -> String {
    format!("{}_{}", now.format("%Y%m%d%H%M%S"), secure_filename(original))
}

/// Rejeita nomes que escapariam do diretório de uploads.
pub fn is_safe_stored_name(name: &str) -> bool {
    !name.is_empty() && !name.contains('/') && !name.contains('\\') && !name.contains("..")
}

/// Lê o campo oculto "original|armazenado,original|armazenado".
pub fn parse_uploaded_pairs(field: &str) -> Result<Vec<StoredFile>, AppError> {
    field
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (original, stored) = entry
                .split_once('|')
                .ok_or_else(|| AppError::InvalidUpload(format!("par de arquivo malformado: {}", entry)))?;
            let (original, stored) = (original.trim(), stored.trim());
            if !is_safe_stored_name(stored) {
                return Err(AppError::InvalidUpload(format!("nome de arquivo inválido: {}", stored)));
            }
            Ok(StoredFile {
                original_name: original.to_string(),
                stored_name: stored.to_string(),
            })
        })
        .collect()
}

pub fn format_uploaded_pairs(files: &[StoredFile]) -> String {
    files
        .iter()
        .map(|f| format!("{}|{}", f.original_name, f.stored_name))
        .collect::<Vec<_>>()
        .join(",")
}

// '|' e ',' são separadores do campo oculto
fn display_name(original: &str) -> String {
    original
        .trim()
        .replace(['|', ','], " ")
        .chars()
        .take(MAX_DISPLAY_NAME)
        .collect()
}

// Falha no meio da gravação não deixa arquivo truncado para trás
async fn write_or_discard<W: AsyncWrite + Unpin>(mut writer: W, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let written = match writer.write_all(bytes).await {
        Ok(()) => writer.flush().await,
        Err(e) => Err(e),
    };
    if let Err(e) = written {
        drop(writer);
        if let Err(cleanup) = tokio::fs::remove_file(path).await {
            tracing::warn!("Não foi possível remover {}: {}", path.display(), cleanup);
        }
        return Err(e);
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn ensure_dir(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await
    }

    /// Grava o arquivo com nome único (`<timestamp>_<nome seguro>`).
    pub async fn save(&self, original: &str, bytes: &[u8]) -> std::io::Result<StoredFile> {
        self.ensure_dir().await?;

        let base = stored_name(Local::now().naive_local(), original);
        let mut candidate = base.clone();
        let mut attempt = 1;

        loop {
            let path = self.dir.join(&candidate);
            let opened = tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await;

            match opened {
                Ok(file) => {
                    write_or_discard(file, &path, bytes).await?;
                    return Ok(StoredFile {
                        original_name: display_name(original),
                        stored_name: candidate,
                    });
                }
                // Mesmo nome no mesmo segundo: prefixa um contador
                Err(e) if e.kind() == ErrorKind::AlreadyExists && attempt < 100 => {
                    candidate = format!("{}_{}", attempt, base);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    pub fn path_for(&self, stored: &str) -> Result<PathBuf, AppError> {
        if !is_safe_stored_name(stored) {
            return Err(AppError::InvalidUpload(format!("nome de arquivo inválido: {}", stored)));
        }
        Ok(self.dir.join(stored))
    }

    pub async fn read(&self, stored: &str) -> Result<Vec<u8>, AppError> {
        let path = self.path_for(stored)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(AppError::NotFound("Arquivo")),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn remove(&self, stored: &str) -> Result<(), AppError> {
        let path = self.path_for(stored)?;
        tokio::fs::remove_file(&path).await?;
        Ok(())
    }

    /// Roda `persist` (em geral a transação que registra `saved`). Se falhar,
    /// os arquivos recém-gravados saem do disco antes de o erro subir.
    pub async fn persist_or_discard<T, F>(&self, saved: &[StoredFile], persist: F) -> Result<T, AppError>
    where
        F: Future<Output = Result<T, AppError>>,
    {
        match persist.await {
            Ok(value) => Ok(value),
            Err(e) => {
                for file in saved {
                    if let Err(remove_err) = self.remove(&file.stored_name).await {
                        tracing::warn!("Arquivo órfão {} não removido: {}", file.stored_name, remove_err);
                    }
                }
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn secure_filename_strips_paths_and_accents() {
        assert_eq!(secure_filename("Book de Lançamento.pdf"), "Book_de_Lancamento.pdf");
        assert_eq!(secure_filename("../../etc/passwd"), "passwd");
        assert_eq!(secure_filename("C:\\Docs\\tabela preços.PDF"), "tabela_precos.PDF");
        assert_eq!(secure_filename("..."), "arquivo");
        assert_eq!(secure_filename("???"), "arquivo");
    }

    #[test]
    fn long_names_are_capped_keeping_the_extension() {
        let long = format!("{}.pdf", "Tabela de Precos ".repeat(30));
        let secure = secure_filename(&long);
        assert!(secure.len() <= MAX_SECURE_NAME);
        assert!(secure.ends_with(".pdf"));
        assert!(secure.starts_with("Tabela_de_Precos_"));

        let now = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap().and_hms_opt(3, 4, 5).unwrap();
        // timestamp + prefixo de colisão ainda cabem em VARCHAR(200)
        assert!(format!("99_{}", stored_name(now, &long)).len() <= 200);

        assert_eq!(display_name(&"a".repeat(300)).chars().count(), MAX_DISPLAY_NAME);
    }

    // Disco cheio: toda escrita falha
    struct FullDisk;

    impl AsyncWrite for FullDisk {
        fn poll_write(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
            _buf: &[u8],
        ) -> std::task::Poll<std::io::Result<usize>> {
            std::task::Poll::Ready(Err(std::io::Error::other("sem espaço")))
        }

        fn poll_flush(self: std::pin::Pin<&mut Self>, _cx: &mut std::task::Context<'_>) -> std::task::Poll<std::io::Result<()>> {
            std::task::Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: std::pin::Pin<&mut Self>, _cx: &mut std::task::Context<'_>) -> std::task::Poll<std::io::Result<()>> {
            std::task::Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn failed_write_leaves_no_file_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("20250101000000_book.pdf");
        std::fs::write(&path, b"").unwrap();

        assert!(write_or_discard(FullDisk, &path, b"conteudo").await.is_err());
        assert!(!path.exists());

        let ok = dir.path().join("20250101000000_planta.pdf");
        let file = tokio::fs::File::create(&ok).await.unwrap();
        write_or_discard(file, &ok, b"planta").await.unwrap();
        assert_eq!(std::fs::read(&ok).unwrap(), b"planta");
    }

    #[tokio::test]
    async fn files_are_discarded_when_persisting_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path());
        let saved = vec![
            store.save("book.pdf", b"book").await.unwrap(),
            store.save("planta.png", b"planta").await.unwrap(),
        ];

        let failed: Result<(), AppError> = store
            .persist_or_discard(&saved, async { Err(AppError::InvalidUpload("falhou no banco".into())) })
            .await;
        assert!(matches!(failed, Err(AppError::InvalidUpload(_))));
        for file in &saved {
            assert!(!dir.path().join(&file.stored_name).exists());
        }

        let kept = vec![store.save("tabela.pdf", b"tabela").await.unwrap()];
        let count = store.persist_or_discard(&kept, async { Ok(kept.len()) }).await.unwrap();
        assert_eq!(count, 1);
        assert_eq!(store.read(&kept[0].stored_name).await.unwrap(), b"tabela");
    }

    #[test]
    fn stored_name_is_prefixed_with_timestamp() {
        let now = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap().and_hms_opt(3, 4, 5).unwrap();
        assert_eq!(stored_name(now, "book.pdf"), "20250102030405_book.pdf");
    }

    #[test]
    fn uploaded_pairs_are_parsed_and_formatted() {
        let files = parse_uploaded_pairs("book.pdf|20250101_book.pdf, planta.png|20250101_planta.png,").unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[1].original_name, "planta.png");
        assert_eq!(files[1].stored_name, "20250101_planta.png");
        assert_eq!(
            format_uploaded_pairs(&files),
            "book.pdf|20250101_book.pdf,planta.png|20250101_planta.png"
        );
        assert!(parse_uploaded_pairs("").unwrap().is_empty());
    }

    #[test]
    fn uploaded_pairs_reject_traversal() {
        assert!(matches!(
            parse_uploaded_pairs("x.pdf|../../segredo"),
            Err(AppError::InvalidUpload(_))
        ));
        assert!(matches!(
            parse_uploaded_pairs("x.pdf|sub/arquivo.pdf"),
            Err(AppError::InvalidUpload(_))
        ));
        assert!(matches!(parse_uploaded_pairs("sem-separador"), Err(AppError::InvalidUpload(_))));
    }

    #[tokio::test]
    async fn save_read_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path().join("uploads"));

        let first = store.save("Tabela, Preços|2025.pdf", b"conteudo").await.unwrap();
        let second = store.save("Tabela, Preços|2025.pdf", b"outro").await.unwrap();
        assert_ne!(first.stored_name, second.stored_name);
        assert_eq!(first.original_name, "Tabela  Preços 2025.pdf");

        assert_eq!(store.read(&first.stored_name).await.unwrap(), b"conteudo");
        store.remove(&first.stored_name).await.unwrap();
        assert!(matches!(store.read(&first.stored_name).await, Err(AppError::NotFound(_))));
        assert!(store.remove(&first.stored_name).await.is_err());
        assert!(matches!(store.read("../x").await, Err(AppError::InvalidUpload(_))));
    }
}
