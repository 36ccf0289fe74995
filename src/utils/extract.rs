// src/utils/extract.rs

use std::fmt;
use std::path::Path;

/// Errors raised while turning an uploaded document into plain text.
/// None of these are retried; the caller may re-upload a readable file.
#[derive(Debug)]
pub enum ExtractError {
    Io(String),
    Pdf(String),
    Docx(String),
    UnsupportedType(String),
}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractError::Io(msg) => write!(f, "io error: {}", msg),
            ExtractError::Pdf(msg) => write!(f, "pdf parsing error: {}", msg),
            ExtractError::Docx(msg) => write!(f, "docx parsing error: {}", msg),
            ExtractError::UnsupportedType(t) => write!(f, "unsupported file type: {}", t),
        }
    }
}

impl std::error::Error for ExtractError {}

/// Extracts plain text from a study material on disk.
///
/// Dispatches on the declared file type recorded at upload time, not on the
/// stored file name. Blocking; call through `tokio::task::spawn_blocking`
/// from async context.
pub fn extract_text(path: &Path, file_type: &str) -> Result<String, ExtractError> {
    let file_type = file_type.to_lowercase();
    if file_type.contains("pdf") {
        extract_pdf(path)
    } else if file_type.contains("doc") {
        extract_docx(path)
    } else {
        Err(ExtractError::UnsupportedType(file_type))
    }
}

fn extract_pdf(path: &Path) -> Result<String, ExtractError> {
    pdf_extract::extract_text(path).map_err(|e| ExtractError::Pdf(e.to_string()))
}

fn extract_docx(path: &Path) -> Result<String, ExtractError> {
    let bytes = std::fs::read(path).map_err(|e| ExtractError::Io(e.to_string()))?;
    let docx = docx_rs::read_docx(&bytes).map_err(|e| ExtractError::Docx(e.to_string()))?;

    let mut text = String::new();
    for child in &docx.document.children {
        match child {
            docx_rs::DocumentChild::Paragraph(para) => {
                let line = paragraph_text(para);
                if !line.trim().is_empty() {
                    text.push_str(line.trim());
                    text.push('\n');
                }
            }
            docx_rs::DocumentChild::Table(table) => {
                table_text(table, &mut text);
            }
            _ => {}
        }
    }

    Ok(text)
}

fn paragraph_text(para: &docx_rs::Paragraph) -> String {
    let mut line = String::new();
    for child in &para.children {
        match child {
            docx_rs::ParagraphChild::Run(run) => run_text(run, &mut line),
            docx_rs::ParagraphChild::Hyperlink(link) => {
                for inner in &link.children {
                    if let docx_rs::ParagraphChild::Run(run) = inner {
                        run_text(run, &mut line);
                    }
                }
            }
            _ => {}
        }
    }
    line
}

fn run_text(run: &docx_rs::Run, out: &mut String) {
    for child in &run.children {
        match child {
            docx_rs::RunChild::Text(t) => out.push_str(&t.text),
            docx_rs::RunChild::Tab(_) => out.push(' '),
            docx_rs::RunChild::Break(_) => out.push('\n'),
            _ => {}
        }
    }
}

fn table_text(table: &docx_rs::Table, out: &mut String) {
    for tc in &table.rows {
        #[allow(irrefutable_let_patterns)]
        if let docx_rs::TableChild::TableRow(row) = tc {
            let mut cells: Vec<String> = Vec::new();
            for rc in &row.cells {
                #[allow(irrefutable_let_patterns)]
                if let docx_rs::TableRowChild::TableCell(cell) = rc {
                    let mut cell_text = String::new();
                    for cc in &cell.children {
                        if let docx_rs::TableCellContent::Paragraph(para) = cc {
                            let t = paragraph_text(para);
                            if !t.trim().is_empty() {
                                if !cell_text.is_empty() {
                                    cell_text.push(' ');
                                }
                                cell_text.push_str(t.trim());
                            }
                        }
                    }
                    cells.push(cell_text);
                }
            }
            if cells.iter().any(|c| !c.is_empty()) {
                out.push_str(&cells.join(" | "));
                out.push('\n');
            }
        }
    }
}
