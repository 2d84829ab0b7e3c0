mod capture;
mod cli;
mod config;
mod error;
mod keyboard;
mod pdf_generator;
mod screen;
mod window;

use anyhow::Result;
use error::BookCaptureError;
use log::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // 로깅 초기화
    env_logger::init();

    info!("전자책 캡쳐 프로그램 시작");

    match cli::run().await {
        Ok(_) => {
            info!("프로그램이 성공적으로 완료되었습니다.");
        }
        Err(BookCaptureError::Interrupted) => {
            // 중단은 실패가 아님: 저장된 이미지를 남긴 채 정상 종료 메시지 출력
            println!("\n⚠️ 캡쳐가 중단되었습니다. 저장된 이미지는 그대로 남아 있습니다.");
            std::process::exit(130);
        }
        Err(BookCaptureError::FailsafeTriggered) => {
            println!("\n⚠️ 마우스 포인터가 화면 모서리로 이동되어 자동화를 중단했습니다.");
            std::process::exit(130);
        }
        Err(e) => {
            error!("오류가 발생했습니다: {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}
