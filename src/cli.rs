use crate::config::{self, CaptureConfig};
use crate::error::Result;
use crate::{capture, pdf_generator, screen, window};
use log::{info, warn};
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub async fn run() -> Result<()> {
    println!("=== 전자책 캡쳐 & PDF 변환기 v0.1 ===\n");

    // 1. 자동화 기능 사용 가능 여부 검사 (어떤 작업보다 먼저)
    screen::startup_check()?;

    // 2. 세션 설정 수집
    let config = config::collect()?;
    print_session_summary(&config);

    // 3. 이미지 디렉토리 준비 (이전 실행 이미지 제거)
    capture::prepare_folder(&config.images_dir)?;

    // 4. 리더 윈도우 검색 및 활성화 (실패해도 계속 진행)
    match window::find_reader_window(&config.window_keyword).await? {
        Some(reader) => {
            println!("📖 리더 윈도우 발견: {}", reader.title);
            window::activate(&reader).await?;
        }
        None => {
            println!("리더 윈도우를 찾지 못했습니다. 카운트다운 동안 직접 창을 활성화해주세요.");
        }
    }

    // 5. Ctrl+C 감시 시작
    let interrupted = spawn_interrupt_watcher();

    // 6. 캡쳐 실행
    println!(
        "\n시작 시간: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    let outcome = capture::capture_pages(&config, interrupted).await?;

    if outcome.end_detected {
        println!(
            "\n✅ 책의 끝을 감지하여 {}페이지를 캡쳐했습니다.",
            outcome.pages_captured
        );
    } else {
        println!(
            "\n✅ 설정된 {}페이지를 모두 캡쳐했습니다.",
            outcome.pages_captured
        );
    }

    // 7. PDF 생성
    let pdf_path =
        pdf_generator::create_pdf(&config.images_dir, &config.output_pdf, &config.book_name)
            .await?;

    println!("\n🎉 캡쳐가 완료되었습니다!");
    println!("📁 PDF 파일: {}", pdf_path.display());
    println!(
        "종료 시간: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );

    // 8. 캡쳐 이미지 정리 (옵션)
    cleanup_images(&config)?;

    Ok(())
}

fn print_session_summary(config: &CaptureConfig) {
    println!("\n📚 책 제목: {}", config.book_name);
    println!("📄 캡쳐할 페이지 수: {}", config.total_pages);
    println!("🧭 페이지 이동 방법: {:?}", config.navigation);
    println!("📂 이미지 디렉토리: {}", config.images_dir.display());
    println!("📕 출력 PDF: {}\n", config.output_pdf.display());
}

/// Ctrl+C를 감시하는 백그라운드 태스크를 띄우고 중단 플래그를 반환합니다
fn spawn_interrupt_watcher() -> Arc<AtomicBool> {
    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = interrupted.clone();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("중단 신호 수신");
            flag.store(true, Ordering::SeqCst);
        }
    });

    interrupted
}

fn cleanup_images(config: &CaptureConfig) -> Result<()> {
    print!("캡쳐 이미지 파일을 삭제하시겠습니까? (y/N): ");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    if input.trim().eq_ignore_ascii_case("y") {
        for path in capture::list_image_files(&config.images_dir)? {
            if let Err(e) = std::fs::remove_file(&path) {
                warn!("이미지 파일 삭제 실패: {} - {}", path.display(), e);
            }
        }
        println!("🗑️ 캡쳐 이미지 정리 완료");
    }

    Ok(())
}
