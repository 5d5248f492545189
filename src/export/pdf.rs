//! PDF export of a practice sheet.
//!
//! We render the sheet as a simple standalone HTML document and hand it to
//! `printpdf` for pagination. The HTML stays deliberately plain: complex
//! CSS and layouts do not survive the HTML-to-PDF conversion.

use std::collections::BTreeMap;

use printpdf::{GeneratePdfOptions, PdfDocument};
use tracing::warn;

use crate::domain::MathProblem;

/// Fixed download filename for the PDF export.
pub const PDF_FILENAME: &str = "Phieu_Bai_Tap_iMath.pdf";

/// Minimal HTML escaping for user-supplied problem text.
fn escape_html(s: &str) -> String {
  s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// Render the three-section sheet: sample problem, practice problems, and
/// the answer key behind an explicit page break.
pub fn render_sheet_html(original_text: &str, problems: &[MathProblem]) -> String {
  let mut html = String::new();
  html.push_str("<!DOCTYPE html><html><head><meta charset=\"utf-8\"><style>");
  html.push_str("@page { size: A4; margin: 20mm; } ");
  html.push_str("body { font-family: sans-serif; font-size: 12pt; } ");
  html.push_str("h1 { text-align: center; text-transform: uppercase; } ");
  html.push_str("h2 { font-size: 13pt; text-transform: uppercase; text-decoration: underline; } ");
  html.push_str(".subtitle { text-align: center; font-style: italic; font-size: 9pt; color: #666666; } ");
  html.push_str(".sample { font-style: italic; } ");
  html.push_str(".page-break { page-break-after: always; } ");
  html.push_str(".footer { text-align: center; font-size: 9pt; color: #888888; }");
  html.push_str("</style></head><body>");

  html.push_str("<h1>Phiếu Bài Tập Tự Luyện</h1>");
  html.push_str("<p class=\"subtitle\">iMath AI generated</p>");

  html.push_str("<h2>I. Đề bài mẫu</h2>");
  html.push_str(&format!("<p class=\"sample\">{}</p>", escape_html(original_text)));

  html.push_str("<h2>II. Bài tập luyện tập</h2>");
  for (i, p) in problems.iter().enumerate() {
    html.push_str(&format!(
      "<p><b>Bài {}. </b>{}</p>",
      i + 1,
      escape_html(&p.question)
    ));
  }

  // Answers start on a fresh page.
  html.push_str("<div class=\"page-break\"></div>");

  html.push_str("<h2>III. Đáp án chi tiết</h2>");
  for (i, p) in problems.iter().enumerate() {
    html.push_str(&format!(
      "<p><b>Bài {}. </b>{}</p>",
      i + 1,
      escape_html(&p.solution)
    ));
  }

  html.push_str("<p class=\"footer\">Created by iMath AI</p>");
  html.push_str("</body></html>");
  html
}

/// Convert the rendered sheet into paginated PDF bytes.
pub fn build_pdf(original_text: &str, problems: &[MathProblem]) -> Result<Vec<u8>, String> {
  let html = render_sheet_html(original_text, problems);
  let mut warnings = Vec::new();

  // Empty maps: we embed no external images or fonts.
  let doc = PdfDocument::from_html(
    &html,
    &BTreeMap::new(),
    &BTreeMap::new(),
    &GeneratePdfOptions::default(),
    &mut warnings,
  )
  .map_err(|e| format!("PDF conversion failed: {}", e))?;

  if !warnings.is_empty() {
    warn!(target: "export", count = warnings.len(), "PDF generation produced warnings");
  }

  let bytes = doc.save(&Default::default(), &mut warnings);
  Ok(bytes)
}
