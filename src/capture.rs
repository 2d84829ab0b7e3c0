use crate::config::CaptureConfig;
use crate::error::{BookCaptureError, Result};
use crate::keyboard::Navigator;
use crate::screen;
use image::RgbaImage;
use log::{debug, info};
use sha2::{Digest, Sha256};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::time::{sleep, Duration};

/// 캡쳐 이미지로 인정하는 확장자
pub const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

// 이 횟수만큼 연속으로 동일한 프레임이 나오면 마지막 페이지로 판단
const MAX_SAME_PAGE_COUNT: u32 = 3;
// 마지막 페이지 판정 시 삭제할 중복 캡쳐 수
const DUPLICATE_IMAGES_TO_REMOVE: usize = 2;
const COUNTDOWN_SECS: u32 = 3;

/// 프레임 픽셀 내용의 결정적 지문. 동일성 비교에만 사용됩니다.
pub type Fingerprint = [u8; 32];

/// 연속 중복 프레임 카운터
#[derive(Debug, Default)]
pub struct DuplicateTracker {
    last: Option<Fingerprint>,
    streak: u32,
}

impl DuplicateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// 새 지문을 기록하고 현재 프레임에서 끝나는 연속 중복 길이를 반환합니다
    pub fn observe(&mut self, fingerprint: Fingerprint) -> u32 {
        match self.last {
            Some(previous) if previous == fingerprint => self.streak += 1,
            _ => self.streak = 1,
        }
        self.last = Some(fingerprint);
        self.streak
    }
}

/// 이미지 픽셀 내용에 대한 지문을 계산합니다
pub fn fingerprint(image: &RgbaImage) -> Fingerprint {
    let mut hasher = Sha256::new();
    hasher.update(image.width().to_le_bytes());
    hasher.update(image.height().to_le_bytes());
    hasher.update(image.as_raw());
    hasher.finalize().into()
}

/// 이미지 디렉토리를 생성하고 이전 실행에서 남은 이미지를 삭제합니다
pub fn prepare_folder(images_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(images_dir)?;

    let stale_images = list_image_files(images_dir)?;
    if !stale_images.is_empty() {
        info!("이전 실행 이미지 {}개 삭제", stale_images.len());
    }
    for path in stale_images {
        std::fs::remove_file(&path)?;
    }

    Ok(())
}

/// 인식 가능한 확장자의 이미지 파일을 파일명 순으로 나열합니다
///
/// `page_%04d` 파일명은 사전순 정렬이 캡쳐 순서와 일치하도록 설계되어 있습니다.
pub fn list_image_files(images_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in std::fs::read_dir(images_dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }

        let recognized = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let ext = ext.to_lowercase();
                IMAGE_EXTENSIONS.iter().any(|known| *known == ext)
            })
            .unwrap_or(false);

        if recognized {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

/// 캡쳐 루프 결과 요약
#[derive(Debug)]
pub struct CaptureOutcome {
    pub pages_captured: u32,
    pub end_detected: bool,
}

/// 페이지를 순서대로 캡쳐하고 저장하며, 책이 끝났는지 스스로 판단합니다
///
/// 중단 플래그는 캡쳐 직전과 각 대기 직후에 확인되며, 설정된 경우 이미 저장된
/// 이미지를 그대로 남겨둔 채 `Interrupted`로 반환합니다.
pub async fn capture_pages(
    config: &CaptureConfig,
    interrupted: Arc<AtomicBool>,
) -> Result<CaptureOutcome> {
    let screen_size = screen::screen_size()?;
    debug!("화면 해상도: {}x{}", screen_size.0, screen_size.1);

    let mut navigator = Navigator::new(config.navigation, screen_size, config.failsafe);
    let mut tracker = DuplicateTracker::new();

    countdown().await;

    for page in 1..=config.total_pages {
        check_interrupted(&interrupted)?;

        let image = screen::capture_full_screen().await?;
        let image_path = config.images_dir.join(format!("page_{:04}.png", page));
        image.save(&image_path)?;
        println!(
            "📸 페이지 {}/{} 캡쳐 완료: {}",
            page,
            config.total_pages,
            image_path.display()
        );

        let streak = tracker.observe(fingerprint(&image));
        if streak > 1 {
            println!(
                "  → 동일한 페이지 감지 ({}/{})",
                streak, MAX_SAME_PAGE_COUNT
            );
        }

        if streak >= MAX_SAME_PAGE_COUNT {
            println!("\n마지막 페이지에 도달했습니다. 캡쳐를 종료합니다.");
            remove_last_images(&config.images_dir, DUPLICATE_IMAGES_TO_REMOVE)?;
            return Ok(CaptureOutcome {
                pages_captured: page - DUPLICATE_IMAGES_TO_REMOVE as u32,
                end_detected: true,
            });
        }

        if page == config.total_pages {
            break;
        }

        sleep(config.capture_interval).await;
        check_interrupted(&interrupted)?;

        navigator.advance().await?;

        sleep(config.page_change_interval).await;
        check_interrupted(&interrupted)?;
    }

    info!("모든 페이지 캡쳐 완료");
    Ok(CaptureOutcome {
        pages_captured: config.total_pages,
        end_detected: false,
    })
}

async fn countdown() {
    println!("리더 창에 첫 페이지를 띄우고 포커스를 유지해주세요.");
    println!("캡쳐를 시작합니다...");
    for remaining in (1..=COUNTDOWN_SECS).rev() {
        print!("{}... ", remaining);
        io::stdout().flush().unwrap();
        sleep(Duration::from_secs(1)).await;
    }
    println!("시작!\n");
}

/// 파일명 순으로 마지막 `count`개의 이미지를 삭제합니다
fn remove_last_images(images_dir: &Path, count: usize) -> Result<()> {
    let files = list_image_files(images_dir)?;
    let start = files.len().saturating_sub(count);

    for path in &files[start..] {
        info!("중복 이미지 삭제: {}", path.display());
        std::fs::remove_file(path)?;
    }

    Ok(())
}

fn check_interrupted(flag: &AtomicBool) -> Result<()> {
    if flag.load(Ordering::SeqCst) {
        return Err(BookCaptureError::Interrupted);
    }
    Ok(())
}
