//! Resume text extraction — best-effort contact fields from an uploaded file.
//!
//! PDF and DOCX only; anything else is the one user-visible hard failure in
//! the interview flow. Field detection is regex-heuristic and any field may
//! come back `None` — extraction never fails solely because a field is
//! missing. Missing fields are collected conversationally afterwards.

use std::io::{Cursor, Read};
use std::sync::OnceLock;

use regex::Regex;

use crate::errors::AppError;
use crate::interview::session::CandidateDetails;

pub const PDF_MIME: &str = "application/pdf";
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[a-zA-Z0-9._-]+@[a-zA-Z0-9._-]+\.[a-zA-Z0-9_-]+").expect("valid email regex")
    })
}

fn phone_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // (123) 456-7890, 123-456-7890, +1 123 456 7890, optional extension
        Regex::new(r"(?:\+?\d{1,3})?[-. (]*\d{3}[-. )]*\d{3}[-. ]*\d{4}(?: *x\d+)?")
            .expect("valid phone regex")
    })
}

/// Extracts `{name, email, phone}` from raw file bytes and a declared MIME
/// type.
pub fn extract_candidate_fields(bytes: &[u8], mime: &str) -> Result<CandidateDetails, AppError> {
    let text = match mime {
        PDF_MIME => pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| AppError::Validation(format!("Could not read PDF: {e}")))?,
        DOCX_MIME => extract_docx_text(bytes)?,
        other => {
            return Err(AppError::UnsupportedFileType(format!(
                "'{other}' is not supported. Please upload a PDF or DOCX."
            )))
        }
    };

    Ok(extract_details(&text))
}

/// Pulls the main document text out of a DOCX archive. Paragraph ends become
/// newlines so the name heuristic still sees lines.
fn extract_docx_text(bytes: &[u8]) -> Result<String, AppError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| AppError::Validation(format!("Could not read DOCX: {e}")))?;

    let mut document = archive
        .by_name("word/document.xml")
        .map_err(|e| AppError::Validation(format!("Not a valid DOCX file: {e}")))?;

    let mut xml = String::new();
    document
        .read_to_string(&mut xml)
        .map_err(|e| AppError::Validation(format!("Could not read DOCX document: {e}")))?;

    static TAG_RE: OnceLock<Regex> = OnceLock::new();
    let tag_re = TAG_RE.get_or_init(|| Regex::new(r"<[^>]+>").expect("valid tag regex"));

    let xml = xml.replace("</w:p>", "\n");
    Ok(tag_re.replace_all(&xml, "").to_string())
}

/// Heuristic field detection over extracted plain text.
///
/// Name: the first line of 2–3 words containing neither an email nor a phone
/// number (a naive rule, but it works for most standard resume layouts);
/// falls back to the first three words of the very first line.
fn extract_details(text: &str) -> CandidateDetails {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let mut name: Option<String> = None;
    for line in &lines {
        let word_count = line.split_whitespace().count();
        if (2..=3).contains(&word_count) && !email_re().is_match(line) && !phone_re().is_match(line)
        {
            name = Some(line.to_string());
            break;
        }
    }
    if name.is_none() {
        if let Some(first) = lines.first() {
            name = Some(
                first
                    .split_whitespace()
                    .take(3)
                    .collect::<Vec<_>>()
                    .join(" "),
            );
        }
    }

    let email = email_re().find(text).map(|m| m.as_str().to_string());
    let phone = phone_re().find(text).map(|m| m.as_str().trim().to_string());

    CandidateDetails { name, email, phone }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "Jane Doe\n\
        Senior Frontend Engineer\n\
        jane.doe@example.com | (555) 123-4567\n\
        Experience: built interactive dashboards in React.";

    #[test]
    fn test_extracts_all_three_fields() {
        let details = extract_details(SAMPLE);
        assert_eq!(details.name.as_deref(), Some("Jane Doe"));
        assert_eq!(details.email.as_deref(), Some("jane.doe@example.com"));
        assert_eq!(details.phone.as_deref(), Some("(555) 123-4567"));
    }

    #[test]
    fn test_name_skips_contact_lines() {
        let text = "jane@example.com 555 123 4567\nJane Doe\nmore text here follows on";
        let details = extract_details(text);
        assert_eq!(details.name.as_deref(), Some("Jane Doe"));
    }

    #[test]
    fn test_name_falls_back_to_first_line_prefix() {
        let text = "Curriculum Vitae Of A Candidate\nexperience and education sections follow here";
        let details = extract_details(text);
        assert_eq!(details.name.as_deref(), Some("Curriculum Vitae Of"));
    }

    #[test]
    fn test_missing_fields_are_none_not_errors() {
        let details = extract_details("Jane Doe\nno contact information here at all");
        assert_eq!(details.name.as_deref(), Some("Jane Doe"));
        assert!(details.email.is_none());
        assert!(details.phone.is_none());
    }

    #[test]
    fn test_empty_text_yields_nothing() {
        let details = extract_details("");
        assert!(details.name.is_none());
        assert!(details.email.is_none());
        assert!(details.phone.is_none());
    }

    #[test]
    fn test_unsupported_mime_is_rejected() {
        let err = extract_candidate_fields(b"plain text resume", "text/plain").unwrap_err();
        assert!(matches!(err, AppError::UnsupportedFileType(_)));
    }
}
