use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BookCaptureError {
    #[error("화면 자동화 기능을 사용할 수 없습니다: {reason}")]
    AutomationUnavailable { reason: String },

    #[error("화면 캡쳐에 실패했습니다: {reason}")]
    CaptureFailure { reason: String },

    #[error("입력 시뮬레이션에 실패했습니다: {reason}")]
    InputFailure { reason: String },

    #[error("마우스 포인터가 화면 모서리로 이동되어 자동화를 중단합니다")]
    FailsafeTriggered,

    #[error("사용자에 의해 캡쳐가 중단되었습니다")]
    Interrupted,

    #[error("이미지 디렉토리에 캡쳐된 이미지가 없습니다: {}", dir.display())]
    NoImages { dir: PathBuf },

    #[error("PDF 생성에 실패했습니다: {reason}")]
    PdfGenerationFailure { reason: String },

    #[error("IO 오류: {0}")]
    Io(#[from] std::io::Error),

    #[error("이미지 처리 오류: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, BookCaptureError>;
