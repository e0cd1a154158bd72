//! # Download Commands
//!
//! Fetches a PDF or spreadsheet from the server and writes it to disk.
//! Without an explicit directory, files go to `downloads.dir` from the
//! config.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use contable_api::services::reports::{ReportFormat, ReportKind};
use contable_api::Download;
use contable_core::Permission;
use serde::Serialize;
use tracing::{debug, info};
use ts_rs::TS;

use crate::error::CommandResult;
use crate::state::AppState;

/// A file written to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SavedFile {
    #[ts(as = "String")]
    pub path: PathBuf,
    pub filename: String,
    pub content_type: String,
    pub bytes: usize,
}

pub async fn download_invoice_pdf(
    state: &AppState,
    invoice_id: i64,
    dir: Option<&Path>,
) -> CommandResult<SavedFile> {
    debug!(invoice_id, "download_invoice_pdf command");
    state.require(Permission::InvoicesView)?;

    let download = state.api().invoicing().download_pdf(invoice_id).await?;
    save(state, dir, &download).await
}

pub async fn download_report(
    state: &AppState,
    kind: ReportKind,
    from: NaiveDate,
    to: NaiveDate,
    format: ReportFormat,
    dir: Option<&Path>,
) -> CommandResult<SavedFile> {
    debug!(report = %kind, "download_report command");
    state.require(Permission::ReportsView)?;

    let download = state.api().reports().download(kind, from, to, format).await?;
    save(state, dir, &download).await
}

async fn save(state: &AppState, dir: Option<&Path>, download: &Download) -> CommandResult<SavedFile> {
    let dir = match dir {
        Some(dir) => dir.to_path_buf(),
        None => state.config().downloads.resolve_dir(),
    };
    let filename = safe_filename(&download.filename);
    let path = dir.join(&filename);

    tokio::fs::create_dir_all(&dir).await?;
    tokio::fs::write(&path, &download.bytes).await?;

    info!(path = %path.display(), bytes = download.len(), "File saved");
    Ok(SavedFile {
        path,
        filename,
        content_type: download.content_type.clone(),
        bytes: download.len(),
    })
}

/// Last path component of a server-supplied name, so it cannot escape the
/// target directory.
fn safe_filename(name: &str) -> String {
    Path::new(name.trim())
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .unwrap_or("download")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::state::test_support::signed_in;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_safe_filename() {
        assert_eq!(safe_filename("factura-12.pdf"), "factura-12.pdf");
        assert_eq!(safe_filename("../../etc/passwd"), "passwd");
        assert_eq!(safe_filename(".."), "download");
        assert_eq!(safe_filename(""), "download");
    }

    #[tokio::test]
    async fn test_invoice_pdf_written_to_dir() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/contabilidad/facturas/12/pdf/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Content-Disposition", "attachment; filename=\"F-0012.pdf\"")
                    .set_body_raw(b"%PDF-1.7".to_vec(), "application/pdf"),
            )
            .mount(&server)
            .await;
        let state = signed_in(&server, &["contabilidad.view_factura"]).await;
        let dir = tempfile::tempdir().unwrap();

        let saved = download_invoice_pdf(&state, 12, Some(dir.path())).await.unwrap();
        assert_eq!(saved.filename, "F-0012.pdf");
        assert_eq!(saved.bytes, 8);
        assert_eq!(std::fs::read(dir.path().join("F-0012.pdf")).unwrap(), b"%PDF-1.7");
    }

    #[tokio::test]
    async fn test_report_uses_configured_dir() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/contabilidad/reportes/resumen-iva/"))
            .and(query_param("formato", "xlsx"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                b"PK".to_vec(),
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            ))
            .mount(&server)
            .await;
        let state = signed_in(&server, &["contabilidad.view_reporte"]).await;
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("reportes");

        let from = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(2026, 3, 31).unwrap();
        let saved = download_report(
            &state,
            ReportKind::VatSummary,
            from,
            to,
            ReportFormat::Xlsx,
            Some(&target),
        )
        .await
        .unwrap();

        assert_eq!(saved.filename, "resumen-iva_2026-01-01_2026-03-31.xlsx");
        assert!(saved.path.starts_with(&target));
        assert!(saved.path.is_file());
    }

    #[tokio::test]
    async fn test_requires_permission() {
        let server = MockServer::start().await;
        let state = signed_in(&server, &["pos.add_venta"]).await;

        let err = download_invoice_pdf(&state, 1, None).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
        assert!(server.received_requests().await.unwrap().is_empty());
    }
}
