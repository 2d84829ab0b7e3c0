use crate::error::{BookCaptureError, Result};
use enigo::{Enigo, Key, KeyboardControllable, MouseButton, MouseControllable};
use log::{debug, info};
use tokio::time::{sleep, Duration};

// 포인터가 모서리에서 이 거리 안에 있으면 페일세이프 발동
const FAILSAFE_MARGIN: i32 = 10;

/// 페이지 넘김 방법을 정의하는 열거형
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationMethod {
    RightArrow,
    LeftArrow,
    PageDown,
    ClickRight,
    ClickLeft,
}

impl NavigationMethod {
    /// 설정 단계의 한 글자 선택지를 해석합니다
    pub fn from_choice(choice: &str) -> Option<Self> {
        match choice.trim().to_uppercase().as_str() {
            "R" => Some(NavigationMethod::RightArrow),
            "L" => Some(NavigationMethod::LeftArrow),
            "D" => Some(NavigationMethod::PageDown),
            "C" => Some(NavigationMethod::ClickRight),
            "X" => Some(NavigationMethod::ClickLeft),
            _ => None,
        }
    }

    /// 클릭 방식일 때 화면 크기 비율로부터 클릭 좌표를 계산합니다
    pub(crate) fn click_position(
        &self,
        screen_width: usize,
        screen_height: usize,
    ) -> Option<(i32, i32)> {
        let x_ratio = match self {
            NavigationMethod::ClickRight => 0.9,
            NavigationMethod::ClickLeft => 0.1,
            _ => return None,
        };

        let x = (screen_width as f64 * x_ratio) as i32;
        let y = (screen_height as f64 * 0.5) as i32;
        Some((x, y))
    }
}

/// 페이지 넘김 입력을 전송합니다
pub struct Navigator {
    enigo: Enigo,
    method: NavigationMethod,
    screen_width: usize,
    screen_height: usize,
    failsafe: bool,
}

impl Navigator {
    pub fn new(method: NavigationMethod, screen_size: (usize, usize), failsafe: bool) -> Self {
        Self {
            enigo: Enigo::new(),
            method,
            screen_width: screen_size.0,
            screen_height: screen_size.1,
            failsafe,
        }
    }

    /// 다음 페이지로 이동하는 입력을 한 번 보냅니다 (키 누르고 떼기 또는 클릭)
    pub async fn advance(&mut self) -> Result<()> {
        if self.failsafe {
            self.check_failsafe()?;
        }

        match self.method {
            NavigationMethod::RightArrow => self.press_key(Key::RightArrow).await,
            NavigationMethod::LeftArrow => self.press_key(Key::LeftArrow).await,
            NavigationMethod::PageDown => self.press_key(Key::PageDown).await,
            NavigationMethod::ClickRight | NavigationMethod::ClickLeft => {
                let (x, y) = self
                    .method
                    .click_position(self.screen_width, self.screen_height)
                    .ok_or_else(|| BookCaptureError::InputFailure {
                        reason: "클릭 좌표 계산 실패".to_string(),
                    })?;
                self.click_at(x, y).await
            }
        }
    }

    async fn press_key(&mut self, key: Key) -> Result<()> {
        debug!("키 입력 전송: {:?}", key);

        // 더 안정적인 키 입력을 위한 짧은 대기
        sleep(Duration::from_millis(100)).await;
        self.enigo.key_click(key);
        sleep(Duration::from_millis(200)).await;

        debug!("키 입력 완료");
        Ok(())
    }

    async fn click_at(&mut self, x: i32, y: i32) -> Result<()> {
        debug!("마우스 클릭: ({}, {})", x, y);

        self.enigo.mouse_move_to(x, y);
        sleep(Duration::from_millis(100)).await;
        self.enigo.mouse_click(MouseButton::Left);
        sleep(Duration::from_millis(100)).await;

        Ok(())
    }

    /// 사용자가 포인터를 화면 모서리로 옮기면 자동화를 즉시 중단합니다
    fn check_failsafe(&self) -> Result<()> {
        let Some((x, y)) = pointer_position() else {
            return Ok(());
        };

        if is_in_corner(
            x,
            y,
            self.screen_width as i32,
            self.screen_height as i32,
        ) {
            info!("페일세이프 발동: 포인터 위치 ({}, {})", x, y);
            return Err(BookCaptureError::FailsafeTriggered);
        }

        Ok(())
    }
}

#[cfg(windows)]
fn pointer_position() -> Option<(i32, i32)> {
    use winapi::shared::windef::POINT;
    use winapi::um::winuser::GetCursorPos;

    let mut point = POINT { x: 0, y: 0 };
    unsafe {
        if GetCursorPos(&mut point) != 0 {
            Some((point.x, point.y))
        } else {
            log::warn!("포인터 위치 조회 실패");
            None
        }
    }
}

#[cfg(not(windows))]
fn pointer_position() -> Option<(i32, i32)> {
    // 이 플랫폼에서는 포인터 위치 조회를 지원하지 않으므로 검사를 건너뜀
    None
}

fn is_in_corner(x: i32, y: i32, screen_width: i32, screen_height: i32) -> bool {
    let near_x_edge = x <= FAILSAFE_MARGIN || x >= screen_width - 1 - FAILSAFE_MARGIN;
    let near_y_edge = y <= FAILSAFE_MARGIN || y >= screen_height - 1 - FAILSAFE_MARGIN;
    near_x_edge && near_y_edge
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_choice_accepts_documented_letters() {
        assert_eq!(
            NavigationMethod::from_choice("R"),
            Some(NavigationMethod::RightArrow)
        );
        assert_eq!(
            NavigationMethod::from_choice(" l "),
            Some(NavigationMethod::LeftArrow)
        );
        assert_eq!(
            NavigationMethod::from_choice("d"),
            Some(NavigationMethod::PageDown)
        );
        assert_eq!(
            NavigationMethod::from_choice("C"),
            Some(NavigationMethod::ClickRight)
        );
        assert_eq!(
            NavigationMethod::from_choice("x"),
            Some(NavigationMethod::ClickLeft)
        );
    }

    #[test]
    fn test_from_choice_rejects_everything_else() {
        assert_eq!(NavigationMethod::from_choice(""), None);
        assert_eq!(NavigationMethod::from_choice("Q"), None);
        assert_eq!(NavigationMethod::from_choice("RL"), None);
    }

    #[test]
    fn test_click_position_ratios() {
        assert_eq!(
            NavigationMethod::ClickRight.click_position(1920, 1080),
            Some((1728, 540))
        );
        assert_eq!(
            NavigationMethod::ClickLeft.click_position(1920, 1080),
            Some((192, 540))
        );
        assert_eq!(NavigationMethod::RightArrow.click_position(1920, 1080), None);
    }

    #[test]
    fn test_is_in_corner_detects_all_four_corners() {
        assert!(is_in_corner(0, 0, 1920, 1080));
        assert!(is_in_corner(1919, 0, 1920, 1080));
        assert!(is_in_corner(0, 1079, 1920, 1080));
        assert!(is_in_corner(1915, 1075, 1920, 1080));
    }

    #[test]
    fn test_is_in_corner_ignores_edges_and_center() {
        // 모서리가 아닌 가장자리는 해당되지 않음
        assert!(!is_in_corner(960, 0, 1920, 1080));
        assert!(!is_in_corner(0, 540, 1920, 1080));
        assert!(!is_in_corner(960, 540, 1920, 1080));
    }
}
