use crate::error::Result;
use log::info;
use tokio::time::{sleep, Duration};

/// 발견된 리더 윈도우 정보
#[derive(Debug, Clone)]
pub struct WindowInfo {
    pub title: String,
    #[cfg(windows)]
    hwnd: winapi::shared::windef::HWND,
}

/// 제목에 키워드가 포함된 보이는 윈도우를 찾습니다 (대소문자 무시)
///
/// Windows 이외의 플랫폼에서는 검색을 지원하지 않으므로 항상 None을 반환하고,
/// 호출 측은 카운트다운 동안 사용자가 직접 창을 활성화하도록 안내합니다.
pub async fn find_reader_window(keyword: &str) -> Result<Option<WindowInfo>> {
    info!("리더 윈도우 검색 중: \"{}\"", keyword);

    #[cfg(windows)]
    {
        Ok(windows_impl::find_window(keyword))
    }

    #[cfg(not(windows))]
    {
        log::debug!("이 플랫폼에서는 윈도우 검색을 지원하지 않음: {}", keyword);
        Ok(None)
    }
}

/// 윈도우를 전면으로 가져와 활성화합니다. 실패는 경고로만 처리됩니다.
pub async fn activate(window: &WindowInfo) -> Result<()> {
    info!("윈도우 활성화: {}", window.title);

    #[cfg(windows)]
    {
        if let Err(reason) = windows_impl::bring_to_front(window) {
            log::warn!("윈도우 활성화 실패: {}", reason);
        }
    }

    // 윈도우가 전면으로 올라올 때까지 대기
    sleep(Duration::from_millis(500)).await;
    Ok(())
}

#[allow(dead_code)]
fn title_matches(title: &str, keyword_lower: &str) -> bool {
    !keyword_lower.is_empty() && title.to_lowercase().contains(keyword_lower)
}

// Windows 구현
#[cfg(windows)]
mod windows_impl {
    use super::{title_matches, WindowInfo};
    use std::ffi::OsString;
    use std::os::windows::ffi::OsStringExt;
    use winapi::shared::windef::HWND;
    use winapi::um::winuser::{
        EnumWindows, GetWindowTextW, IsIconic, IsWindowVisible, SetForegroundWindow, ShowWindow,
        SW_RESTORE, SW_SHOW,
    };

    struct SearchState {
        keyword: String,
        found: Option<WindowInfo>,
    }

    pub fn find_window(keyword: &str) -> Option<WindowInfo> {
        let mut state = SearchState {
            keyword: keyword.to_lowercase(),
            found: None,
        };

        unsafe {
            EnumWindows(
                Some(enum_windows_proc),
                &mut state as *mut SearchState as isize,
            );
        }

        state.found
    }

    unsafe extern "system" fn enum_windows_proc(hwnd: HWND, lparam: isize) -> i32 {
        let state = &mut *(lparam as *mut SearchState);

        if IsWindowVisible(hwnd) == 0 {
            return 1; // 계속 열거
        }

        let mut title_buffer = [0u16; 256];
        let title_len = GetWindowTextW(hwnd, title_buffer.as_mut_ptr(), 256);
        if title_len <= 0 {
            return 1;
        }

        let title = OsString::from_wide(&title_buffer[..title_len as usize])
            .to_string_lossy()
            .to_string();

        if title_matches(&title, &state.keyword) {
            state.found = Some(WindowInfo { title, hwnd });
            return 0; // 검색 종료
        }

        1
    }

    pub fn bring_to_front(window: &WindowInfo) -> Result<(), String> {
        unsafe {
            if IsIconic(window.hwnd) != 0 {
                // 최소화된 경우에만 복원
                ShowWindow(window.hwnd, SW_RESTORE);
            } else {
                ShowWindow(window.hwnd, SW_SHOW);
            }

            if SetForegroundWindow(window.hwnd) == 0 {
                return Err("SetForegroundWindow 실패".to_string());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_matches_is_case_insensitive() {
        assert!(title_matches("Kindle for PC - 나의 책", "kindle"));
        assert!(title_matches("RIDIBOOKS Viewer", "ridibooks"));
        assert!(!title_matches("Visual Studio Code", "kindle"));
    }

    #[test]
    fn test_title_matches_rejects_empty_keyword() {
        assert!(!title_matches("아무 창", ""));
    }
}
