//! HTTP endpoint handlers. These are thin wrappers that forward to the
//! controller, the history store, and the exporters. Each handler is
//! instrumented and logs parameters and basic result info.

use std::sync::Arc;

use axum::{
  extract::{Path, State},
  http::{header, StatusCode},
  response::IntoResponse,
  Json,
};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use tracing::{error, info, instrument};

use crate::controller::{self, SubmitRejection};
use crate::domain::GenerationInput;
use crate::export::{docx, pdf};
use crate::history::HistoryRepository;
use crate::protocol::*;
use crate::state::AppState;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse {
  Json(HealthOut { ok: true })
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_session(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(to_out(&controller::snapshot(&state).await))
}

#[instrument(level = "info", skip(state, body), fields(has_attachment = body.attachment.is_some(), total = body.config.total()))]
pub async fn http_post_generate(
  State(state): State<Arc<AppState>>,
  Json(body): Json<GenerateIn>,
) -> impl IntoResponse {
  let input = match body.attachment {
    Some(att) => {
      let bytes = match BASE64.decode(att.data_base64.as_bytes()) {
        Ok(b) => b,
        Err(e) => {
          error!(target: "generation", error = %e, "Attachment payload is not valid base64");
          return (
            StatusCode::BAD_REQUEST,
            Json(ErrorOut { message: "File đính kèm không hợp lệ.".into() }),
          )
            .into_response();
        }
      };
      GenerationInput::Attachment { mime_type: att.mime_type, bytes, file_name: att.file_name }
    }
    None => GenerationInput::Text(body.text.unwrap_or_default()),
  };

  match controller::run_generation(&state, input, body.config, body.additional_instructions).await {
    Ok(session) => {
      info!(target: "generation", status = ?session.status, problems = session.problems.len(), "HTTP generate resolved");
      Json(to_out(&session)).into_response()
    }
    Err(SubmitRejection::Busy) => (
      StatusCode::CONFLICT,
      Json(ErrorOut { message: "Đang xử lý dữ liệu...".into() }),
    )
      .into_response(),
    Err(SubmitRejection::Invalid(message)) => {
      (StatusCode::BAD_REQUEST, Json(ErrorOut { message })).into_response()
    }
  }
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_history(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(state.history.load())
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_post_history_load(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> impl IntoResponse {
  match controller::load_history_item(&state, &id).await {
    Some(session) => Json(to_out(&session)).into_response(),
    None => (
      StatusCode::NOT_FOUND,
      Json(ErrorOut { message: "Không tìm thấy mục lịch sử.".into() }),
    )
      .into_response(),
  }
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_delete_history(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> impl IntoResponse {
  state.history.delete(&id);
  Json(state.history.load())
}

#[instrument(level = "info", skip(body), fields(problem_count = body.problems.len()))]
pub async fn http_post_export_docx(Json(body): Json<ExportIn>) -> impl IntoResponse {
  match docx::build_docx(&body.original_text, &body.problems) {
    Ok(bytes) => {
      info!(target: "export", size = bytes.len(), "Word export built");
      (
        [
          (
            header::CONTENT_TYPE,
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document".to_string(),
          ),
          (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", docx::DOCX_FILENAME),
          ),
        ],
        bytes,
      )
        .into_response()
    }
    Err(e) => {
      error!(target: "export", error = %e, "Word export failed");
      (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorOut { message: "Không thể tạo file Word. Vui lòng thử lại.".into() }),
      )
        .into_response()
    }
  }
}

#[instrument(level = "info", skip(body), fields(problem_count = body.problems.len()))]
pub async fn http_post_export_pdf(Json(body): Json<ExportIn>) -> impl IntoResponse {
  match pdf::build_pdf(&body.original_text, &body.problems) {
    Ok(bytes) => {
      info!(target: "export", size = bytes.len(), "PDF export built");
      (
        [
          (header::CONTENT_TYPE, "application/pdf".to_string()),
          (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", pdf::PDF_FILENAME),
          ),
        ],
        bytes,
      )
        .into_response()
    }
    Err(e) => {
      error!(target: "export", error = %e, "PDF export failed");
      (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorOut { message: "Không thể tạo file PDF. Vui lòng thử lại.".into() }),
      )
        .into_response()
    }
  }
}
