//! Word export of a practice sheet via `docx-rs`.
//!
//! Layout mirrors the printed sheet: centered title, the sample problem in
//! italics, numbered practice questions, then the answer key on its own
//! page, closed by a small gray watermark.

use std::io::Cursor;

use docx_rs::{AlignmentType, Docx, Paragraph, Run};

use crate::domain::MathProblem;

/// Fixed download filename for the Word export.
pub const DOCX_FILENAME: &str = "Bai_Tap_Tu_Luyen.docx";

/// Build the practice-sheet .docx and return its bytes.
pub fn build_docx(original_text: &str, problems: &[MathProblem]) -> Result<Vec<u8>, String> {
  let mut docx = Docx::new();

  docx = docx.add_paragraph(
    Paragraph::new()
      .add_run(Run::new().add_text("PHIẾU BÀI TẬP TỰ LUYỆN").bold().size(32))
      .align(AlignmentType::Center),
  );

  docx = docx.add_paragraph(
    Paragraph::new().add_run(Run::new().add_text("ĐỀ BÀI MẪU:").bold().size(26)),
  );
  docx = docx.add_paragraph(
    Paragraph::new().add_run(Run::new().add_text(original_text).italic()),
  );

  docx = docx.add_paragraph(
    Paragraph::new().add_run(Run::new().add_text("BÀI TẬP TƯƠNG TỰ:").bold().size(26)),
  );
  for (i, p) in problems.iter().enumerate() {
    docx = docx.add_paragraph(
      Paragraph::new()
        .add_run(Run::new().add_text(format!("Bài {}: ", i + 1)).bold())
        .add_run(Run::new().add_text(p.question.as_str())),
    );
  }

  // Answer key always starts on its own page.
  docx = docx.add_paragraph(
    Paragraph::new()
      .add_run(Run::new().add_text("ĐÁP ÁN & HƯỚNG DẪN GIẢI").bold().size(26))
      .align(AlignmentType::Center)
      .page_break_before(true),
  );
  for (i, p) in problems.iter().enumerate() {
    docx = docx.add_paragraph(
      Paragraph::new()
        .add_run(Run::new().add_text(format!("Bài {}: ", i + 1)).bold())
        .add_run(Run::new().add_text(p.solution.as_str())),
    );
  }

  docx = docx.add_paragraph(
    Paragraph::new()
      .add_run(Run::new().add_text("iMath AI").color("888888").size(20))
      .align(AlignmentType::Center),
  );

  let mut buffer = Vec::new();
  docx
    .build()
    .pack(&mut Cursor::new(&mut buffer))
    .map_err(|e| e.to_string())?;
  Ok(buffer)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn problems() -> Vec<MathProblem> {
    vec![
      MathProblem { question: "Giải ${3x+5=11}$".into(), solution: "${x=2}$".into() },
      MathProblem { question: "Giải ${5x-2=8}$".into(), solution: "${x=2}$".into() },
    ]
  }

  #[test]
  fn build_docx_produces_a_zip_container() {
    let bytes = build_docx("Giải ${2x+3=7}$", &problems()).unwrap();
    // .docx is a ZIP archive; check the local-file-header magic
    assert!(bytes.len() > 4);
    assert_eq!(&bytes[..4], b"PK\x03\x04");
  }

  #[test]
  fn build_docx_accepts_empty_problem_list() {
    let bytes = build_docx("đề mẫu", &[]).unwrap();
    assert!(!bytes.is_empty());
  }
}
