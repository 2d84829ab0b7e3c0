use crate::error::{BookCaptureError, Result};
use image::{ImageBuffer, RgbaImage};
use log::{debug, warn};
use scrap::{Capturer, Display};
use std::io::ErrorKind;
use tokio::time::{sleep, Duration};

/// 화면 캡쳐 기능이 동작하는지 시작 전에 확인합니다
pub fn startup_check() -> Result<()> {
    Display::primary().map_err(|e| BookCaptureError::AutomationUnavailable {
        reason: format!("주 디스플레이에 접근할 수 없습니다: {}", e),
    })?;
    Ok(())
}

/// 주 디스플레이의 픽셀 크기를 반환합니다
pub fn screen_size() -> Result<(usize, usize)> {
    let display = Display::primary().map_err(|e| BookCaptureError::CaptureFailure {
        reason: format!("주 디스플레이 가져오기 실패: {}", e),
    })?;
    Ok((display.width(), display.height()))
}

/// 전체 화면을 캡쳐하여 RGBA 이미지로 반환합니다
pub async fn capture_full_screen() -> Result<RgbaImage> {
    let display = Display::primary().map_err(|e| BookCaptureError::CaptureFailure {
        reason: format!("주 디스플레이 가져오기 실패: {}", e),
    })?;

    let mut capturer = Capturer::new(display).map_err(|e| BookCaptureError::CaptureFailure {
        reason: format!("캡쳐러 생성 실패: {}", e),
    })?;

    let width = capturer.width();
    let height = capturer.height();
    debug!("캡쳐 해상도: {}x{}", width, height);

    // 첫 번째 프레임 건너뛰기 (보통 비어있음)
    let _ = capturer.frame();
    sleep(Duration::from_millis(100)).await;

    for attempt in 1..=3 {
        match capturer.frame() {
            Ok(frame) if !frame.is_empty() => {
                debug!("프레임 획득: {} bytes", frame.len());
                return frame_to_rgba(&frame, width, height);
            }
            Ok(_) => warn!("빈 프레임 수신 (시도 {}/3)", attempt),
            Err(e) if e.kind() == ErrorKind::WouldBlock => {
                debug!("프레임 대기 중 (시도 {}/3)", attempt);
            }
            Err(e) => warn!("프레임 캡쳐 실패 (시도 {}/3): {}", attempt, e),
        }
        sleep(Duration::from_millis(500)).await;
    }

    Err(BookCaptureError::CaptureFailure {
        reason: "최대 재시도 횟수 초과".to_string(),
    })
}

/// BGRA 프레임을 RGBA 이미지로 변환합니다
///
/// 캡쳐 드라이버에 따라 각 행 끝에 패딩이 붙을 수 있으므로 행 단위 stride로
/// 순회합니다. BGR0 프레임은 알파가 0으로 채워져 오는 경우가 있어 알파는
/// 항상 불투명으로 기록합니다.
fn frame_to_rgba(frame: &[u8], width: usize, height: usize) -> Result<RgbaImage> {
    let row_bytes = width * 4;

    if width == 0 || height == 0 || frame.len() < row_bytes * height {
        return Err(BookCaptureError::CaptureFailure {
            reason: format!(
                "지원되지 않는 프레임 크기: {} bytes ({}x{} BGRA = {})",
                frame.len(),
                width,
                height,
                row_bytes * height
            ),
        });
    }

    let stride = frame.len() / height;
    let mut rgba_data = Vec::with_capacity(row_bytes * height);

    for row in 0..height {
        let line = &frame[row * stride..row * stride + row_bytes];
        for pixel in line.chunks_exact(4) {
            rgba_data.push(pixel[2]); // R
            rgba_data.push(pixel[1]); // G
            rgba_data.push(pixel[0]); // B
            rgba_data.push(255); // A (불투명)
        }
    }

    ImageBuffer::from_raw(width as u32, height as u32, rgba_data).ok_or_else(|| {
        BookCaptureError::CaptureFailure {
            reason: "RGBA ImageBuffer 생성 실패".to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_to_rgba_swaps_channels() {
        // 2x1 BGRA: 파란 픽셀, 빨간 픽셀
        let frame = [255u8, 0, 0, 0, 0, 0, 255, 0];
        let image = frame_to_rgba(&frame, 2, 1).unwrap();

        assert_eq!(image.get_pixel(0, 0).0, [0, 0, 255, 255]);
        assert_eq!(image.get_pixel(1, 0).0, [255, 0, 0, 255]);
    }

    #[test]
    fn test_frame_to_rgba_honors_row_stride() {
        // 1x2 프레임, 행마다 4바이트 패딩
        let frame = [
            1u8, 2, 3, 4, 0, 0, 0, 0, // 1행: 픽셀 + 패딩
            5, 6, 7, 8, 0, 0, 0, 0, // 2행
        ];
        let image = frame_to_rgba(&frame, 1, 2).unwrap();

        assert_eq!(image.get_pixel(0, 0).0, [3, 2, 1, 255]);
        assert_eq!(image.get_pixel(0, 1).0, [7, 6, 5, 255]);
    }

    #[test]
    fn test_frame_to_rgba_rejects_short_buffer() {
        let frame = [0u8; 7];
        assert!(frame_to_rgba(&frame, 2, 1).is_err());
    }
}
