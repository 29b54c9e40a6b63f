//! Resume intake: turns an uploaded PDF or text file into `ResumeData`.

use bytes::Bytes;
use tracing::{debug, warn};

use crate::errors::AppError;
use crate::flow::state::ResumeData;

pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;
/// Longer resumes are truncated before they reach the LLM.
const MAX_RESUME_CHARS: usize = 20_000;

fn is_pdf(file_name: &str, content_type: Option<&str>, bytes: &[u8]) -> bool {
    content_type == Some("application/pdf")
        || file_name.to_ascii_lowercase().ends_with(".pdf")
        || bytes.starts_with(b"%PDF")
}

/// Collapses runs of blank lines and trims each line.
fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0;
    for line in text.lines().map(str::trim) {
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }
    out.trim().to_string()
}

pub fn parse_resume(
    file_name: &str,
    content_type: Option<&str>,
    bytes: Bytes,
) -> Result<ResumeData, AppError> {
    if bytes.is_empty() {
        return Err(AppError::Validation("resume file is empty".to_string()));
    }
    if bytes.len() > MAX_UPLOAD_BYTES {
        return Err(AppError::Validation(format!(
            "resume file exceeds {} MB",
            MAX_UPLOAD_BYTES / (1024 * 1024)
        )));
    }

    let raw = if is_pdf(file_name, content_type, &bytes) {
        pdf_extract::extract_text_from_mem(&bytes).map_err(|e| {
            warn!("PDF text extraction failed for '{file_name}': {e}");
            AppError::Validation("could not read text from the PDF".to_string())
        })?
    } else {
        String::from_utf8(bytes.to_vec())
            .map_err(|_| AppError::Validation("resume must be a PDF or UTF-8 text".to_string()))?
    };

    let mut text = normalize(&raw);
    if text.is_empty() {
        return Err(AppError::Validation(
            "no readable text found in resume".to_string(),
        ));
    }
    if let Some((cut, _)) = text.char_indices().nth(MAX_RESUME_CHARS) {
        debug!("Truncating resume '{file_name}' to {MAX_RESUME_CHARS} chars");
        text.truncate(cut);
    }

    Ok(ResumeData {
        file_name: file_name.to_string(),
        char_count: text.chars().count(),
        text,
    })
}
