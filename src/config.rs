//! Prompt configuration for the generation client, loadable from TOML.
//!
//! See `AppConfig` and `Prompts` for the expected schema. The defaults
//! reproduce the iMath prompt set (Vietnamese, strict LaTeX formatting
//! rules); override them via PROMPTS_CONFIG_PATH if you need to tune tone
//! or structure.

use serde::Deserialize;
use tracing::{error, info};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AppConfig {
  #[serde(default)]
  pub prompts: Prompts,
}

/// Prompt templates used by the Gemini client, filled with
/// `util::fill_template`. Placeholders: {total_questions}, {level1},
/// {level2}, {level3}, {request_details}, {extra_note}, {input}, {extra}.
/// Literal `${ }$` pairs are LaTeX delimiters the model must emit, not
/// placeholders.
#[derive(Clone, Debug, Deserialize)]
pub struct Prompts {
  /// System instruction: role + LaTeX formatting rules.
  pub system_instruction: String,
  /// Per-tier breakdown of the requested question counts.
  pub request_details_template: String,
  /// User part when the input is an image/PDF attachment.
  pub attachment_user_template: String,
  /// User part when the input is typed text.
  pub text_user_template: String,
  /// Optional trailing note carrying the user's extra instructions.
  pub extra_note_template: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      system_instruction: r#"Bạn là một giáo viên dạy toán giỏi và chuyên gia về soạn thảo LaTeX. Hãy tạo ra các bài tập chất lượng cao.

QUY TẮC ĐỊNH DẠNG VĂN BẢN VÀ LATEX (BẮT BUỘC TUÂN THỦ TUYỆT ĐỐI):

1. ĐỊNH DẠNG CÔNG THỨC TOÁN:
   - Toàn bộ công thức toán, biểu thức số học, đại số và các kí hiệu hình học (điểm, đoạn thẳng, tam giác, đường tròn...) PHẢI được chuyển sang định dạng LaTeX và nằm trong cặp dấu ${ }$.
   - Ví dụ ĐÚNG: ${2x-3}$, ${\Delta ABC}$, ${A \in d}$, ${BC = 5cm}$.
   - Ví dụ SAI: $2x-3$, 2x-3, (O).

2. QUY TẮC DẤU NGOẶC TRONG CÔNG THỨC (Nằm trong ${ }$):
   - Ngoặc đơn ( ): Chuyển thành \left( \right). Ví dụ: ${(x+1)}$ -> ${\left(x+1\right)}$.
   - Ngoặc vuông [ ]: Chuyển thành \left[ \right]. Ví dụ: ${[a,b]}$ -> ${\left[a,b\right]}$.
   - Ngoặc nhọn { }: Chuyển thành \left\{ \right\}. Ví dụ: ${{1; 2}}$ -> ${\left\{1; 2\right\}}$.
   - Giá trị tuyệt đối | |: Chuyển thành \left| \right|. Ví dụ: ${|x|}$ -> ${\left|x\right|}$.
   - Ngoại lệ: Hệ phương trình hoặc các cấu trúc LaTeX phức tạp (như \begin{cases}...) thì giữ nguyên cấu trúc nội tại, không bọc thêm \left \right nếu không cần thiết.

3. PHÂN BIỆT VĂN BẢN VÀ CÔNG THỨC:
   - Các dấu ngoặc chứa văn bản chú thích (không phải biểu thức toán) thì GIỮ NGUYÊN, không đưa vào ${ }$.
   - Ví dụ: "(1 điểm)", "(đề thi gồm 01 trang)", "(dành cho học sinh giỏi)".

4. KÍ HIỆU HÌNH HỌC & ĐƠN VỊ ĐẶC BIỆT:
   - Góc: Sử dụng \widehat{...}. Ví dụ: góc ABC -> ${\widehat{ABC}}$.
   - Độ: Sử dụng {}^\circ. Ví dụ: 90 độ -> ${90{}^\circ}$.
   - Tam giác: Từ "tam giác" hoặc kí hiệu tam giác -> đổi thành \Delta. Ví dụ: tam giác ABC -> ${\Delta ABC}$.

5. CÁC QUY TẮC KHÁC:
   - Dấu trừ "-": Không để khoảng trắng trước và sau dấu trừ trong công thức. Ví dụ: ${a-b}$.
   - Loại bỏ dòng thừa: Bỏ qua các dòng chứa nhiều dấu chấm liên tiếp (..............) dùng để điền khuyết.
   - Xử lý khoảng trắng: Xóa bỏ các khoảng trắng thừa liên tiếp.
   - Nếu biểu thức quá dài hoặc dạng MathType phức tạp không thể chuyển đổi chính xác, hãy ghi chú lại thay vì chuyển đổi sai.

Nhiệm vụ của bạn là trích xuất (nếu là file) hoặc nhận đề bài, sau đó tạo ra {total_questions} bài toán tương tự tuân thủ chính xác các quy tắc trên và cấu hình mức độ khó yêu cầu."#.into(),

      request_details_template: r#"YÊU CẦU VỀ SỐ LƯỢNG VÀ MỨC ĐỘ KHÓ (Tổng {total_questions} câu):
1. Mức độ Nhận biết/Cơ bản: {level1} câu.
   - Đặc điểm: Thay số liệu, giữ nguyên cấu trúc và dạng toán, tương tự hoàn toàn đề gốc.
2. Mức độ Thông hiểu/Vận dụng: {level2} câu.
   - Đặc điểm: Thay đổi nhẹ về ngữ cảnh, cách đặt câu hỏi hoặc yêu cầu suy luận thêm một bước nhỏ.
3. Mức độ Vận dụng cao/Nâng cao: {level3} câu.
   - Đặc điểm: Bài toán mở rộng, khó hơn, yêu cầu tư duy sâu hơn hoặc tổng hợp kiến thức từ đề gốc."#.into(),

      attachment_user_template: r#"Hãy phân tích file đính kèm (ảnh hoặc PDF) để tìm đề bài toán.

Nhiệm vụ:
1. Trích xuất chính xác nội dung đề bài toán gốc từ file theo đúng định dạng LaTeX đặc biệt đã quy định (${ }$).
2. Tạo ra {total_questions} bài toán tương tự theo cấu trúc sau:
{request_details}

Yêu cầu về nội dung:
- Giữ nguyên dạng toán của đề gốc.
- Cung cấp đáp án/lời giải vắn tắt (cũng định dạng LaTeX).
{extra_note}"#.into(),

      text_user_template: r#"Dựa vào đề bài toán mẫu dưới đây, hãy tạo ra các bài toán tương tự.

Đề bài mẫu: "{input}"

{request_details}
{extra_note}

Yêu cầu:
1. Tuân thủ tuyệt đối quy tắc định dạng LaTeX trong System Instruction (đặc biệt là ${ }$ và \left \right).
2. Có đáp án cho từng câu."#.into(),

      extra_note_template: "Lưu ý thêm từ người dùng: {extra}".into(),
    }
  }
}

/// Attempt to load `AppConfig` from PROMPTS_CONFIG_PATH. On any parsing/IO
/// error, returns None and the caller falls back to the defaults.
pub fn load_app_config_from_env() -> Option<AppConfig> {
  let path = std::env::var("PROMPTS_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<AppConfig>(&s) {
      Ok(cfg) => {
        info!(target: "imath_backend", %path, "Loaded prompts config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "imath_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "imath_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::util::fill_template;

  #[test]
  fn default_templates_fill_cleanly() {
    let p = Prompts::default();
    let system = fill_template(&p.system_instruction, &[("total_questions", "10")]);
    assert!(system.contains("tạo ra 10 bài toán tương tự"));
    // LaTeX delimiters must survive templating untouched
    assert!(system.contains("${ }$"));

    let details = fill_template(
      &p.request_details_template,
      &[("total_questions", "10"), ("level1", "4"), ("level2", "4"), ("level3", "2")],
    );
    assert!(details.contains("Tổng 10 câu"));
    assert!(details.contains("Nhận biết/Cơ bản: 4 câu"));
    assert!(details.contains("Vận dụng cao/Nâng cao: 2 câu"));
  }

  #[test]
  fn prompts_parse_from_partial_toml() {
    // A file without a [prompts] table keeps the defaults.
    let cfg: AppConfig = toml::from_str("").unwrap();
    assert!(cfg.prompts.system_instruction.contains("LaTeX"));
  }
}
