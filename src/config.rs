use crate::error::Result;
use crate::keyboard::NavigationMethod;
use log::debug;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_BOOK_NAME: &str = "MyBook";
const DEFAULT_WINDOW_KEYWORD: &str = "kindle";
const DEFAULT_CAPTURE_INTERVAL_SECS: f64 = 0.5;
const DEFAULT_PAGE_CHANGE_INTERVAL_SECS: f64 = 1.0;
// page_%04d 파일명 폭이 수용할 수 있는 최대 페이지 수
const MAX_PAGE_COUNT: u32 = 9999;
const FALLBACK_DIR_NAME: &str = "book";

/// 캡쳐 세션 설정
///
/// 세션 시작 시 한 번 수집되며 이후 변경되지 않습니다.
/// 캡쳐 루프와 PDF 생성 단계에 값으로 전달됩니다.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    pub book_name: String,
    pub total_pages: u32,
    pub navigation: NavigationMethod,
    pub capture_interval: Duration,
    pub page_change_interval: Duration,
    pub window_keyword: String,
    pub failsafe: bool,
    pub images_dir: PathBuf,
    pub output_pdf: PathBuf,
}

/// 대화형 프롬프트로 세션 설정을 수집합니다
///
/// 파일시스템은 건드리지 않습니다. 디렉토리 생성은 캡쳐 준비 단계의 몫입니다.
pub fn collect() -> Result<CaptureConfig> {
    let book_name = prompt("책 제목을 입력하세요", DEFAULT_BOOK_NAME)?;

    // 페이지 수: 유효한 값이 들어올 때까지 재입력
    let total_pages = loop {
        let input = prompt(&format!("캡쳐할 페이지 수 (1-{})", MAX_PAGE_COUNT), "1")?;
        match parse_page_count(&input) {
            Some(count) => break count,
            None => println!("1 이상 {} 이하의 정수를 입력해주세요.", MAX_PAGE_COUNT),
        }
    };

    println!(
        "페이지 이동 방법: R(오른쪽 화살표), L(왼쪽 화살표), D(Page Down), \
         C(화면 오른쪽 클릭), X(화면 왼쪽 클릭)"
    );
    let navigation = loop {
        let input = prompt("이동 방법을 선택하세요", "R")?;
        match NavigationMethod::from_choice(&input) {
            Some(method) => break method,
            None => println!("잘못된 선택입니다. R/L/D/C/X 중 하나를 입력해주세요."),
        }
    };

    // 대기 시간: 잘못된 값은 조용히 기본값으로 대체
    let capture_interval_input = prompt("캡쳐 후 대기 시간(초)", "0.5")?;
    let capture_interval =
        parse_interval(&capture_interval_input, DEFAULT_CAPTURE_INTERVAL_SECS);

    let page_change_input = prompt("페이지 이동 후 대기 시간(초)", "1.0")?;
    let page_change_interval =
        parse_interval(&page_change_input, DEFAULT_PAGE_CHANGE_INTERVAL_SECS);

    let window_keyword = prompt("리더 윈도우 검색 키워드", &default_window_keyword())?;

    let sanitized = sanitize_book_name(&book_name);
    let (images_dir, output_pdf) = derive_paths(&base_output_dir(), &sanitized);

    debug!(
        "설정 수집 완료: {}페이지, {:?}, 이미지 디렉토리 {}",
        total_pages,
        navigation,
        images_dir.display()
    );

    Ok(CaptureConfig {
        book_name,
        total_pages,
        navigation,
        capture_interval: Duration::from_secs_f64(capture_interval),
        page_change_interval: Duration::from_secs_f64(page_change_interval),
        window_keyword,
        failsafe: failsafe_enabled(),
        images_dir,
        output_pdf,
    })
}

fn prompt(text: &str, default: &str) -> Result<String> {
    print!("{} [{}]: ", text, default);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    let trimmed = input.trim();
    if trimmed.is_empty() {
        Ok(default.to_string())
    } else {
        Ok(trimmed.to_string())
    }
}

pub(crate) fn parse_page_count(input: &str) -> Option<u32> {
    input
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|count| (1..=MAX_PAGE_COUNT).contains(count))
}

/// 초 단위 대기 시간을 파싱합니다. 숫자가 아니거나 음수면 기본값을 반환합니다.
pub(crate) fn parse_interval(input: &str, default: f64) -> f64 {
    input
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && *value >= 0.0)
        .unwrap_or(default)
}

/// 책 제목을 디렉토리 이름으로 사용할 수 있게 정리합니다
///
/// 영숫자와 `-` 이외의 문자(공백, `\ / : * ? " < > |` 포함)는 `_`로 바뀌고
/// 연속된 `_`는 하나로 합쳐집니다. 결과가 비어 있으면 고정 이름을 사용합니다.
pub fn sanitize_book_name(name: &str) -> String {
    let mut sanitized = String::with_capacity(name.len());

    for ch in name.trim().chars() {
        if ch.is_alphanumeric() || ch == '-' {
            sanitized.push(ch);
        } else if !sanitized.ends_with('_') {
            sanitized.push('_');
        }
    }

    if sanitized.is_empty() {
        FALLBACK_DIR_NAME.to_string()
    } else {
        sanitized
    }
}

pub(crate) fn derive_paths(base: &Path, sanitized: &str) -> (PathBuf, PathBuf) {
    let book_dir = base.join(sanitized);
    let images_dir = book_dir.join("images");
    let output_pdf = book_dir.join(format!("{}.pdf", sanitized));
    (images_dir, output_pdf)
}

fn base_output_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("BOOKCAPTURE_OUTPUT_DIR") {
        if !dir.trim().is_empty() {
            return PathBuf::from(dir);
        }
    }

    dirs::home_dir()
        .map(|home| home.join("book_capture"))
        .unwrap_or_else(|| PathBuf::from("book_capture"))
}

fn default_window_keyword() -> String {
    std::env::var("BOOKCAPTURE_WINDOW_KEYWORD")
        .ok()
        .map(|keyword| keyword.trim().to_string())
        .filter(|keyword| !keyword.is_empty())
        .unwrap_or_else(|| DEFAULT_WINDOW_KEYWORD.to_string())
}

fn failsafe_enabled() -> bool {
    std::env::var("BOOKCAPTURE_FAILSAFE")
        .map(|value| parse_failsafe(&value))
        .unwrap_or(true)
}

pub(crate) fn parse_failsafe(value: &str) -> bool {
    !matches!(value.trim().to_lowercase().as_str(), "0" | "false" | "off")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_replaces_illegal_chars() {
        assert_eq!(sanitize_book_name(r#"a\b/c:d*e?f"g<h>i|j"#), "a_b_c_d_e_f_g_h_i_j");
    }

    #[test]
    fn test_sanitize_collapses_whitespace_runs() {
        assert_eq!(sanitize_book_name("나의   전자책  모음"), "나의_전자책_모음");
        assert_eq!(sanitize_book_name("My Book!"), "My_Book_");
    }

    #[test]
    fn test_sanitize_empty_falls_back() {
        assert_eq!(sanitize_book_name(""), "book");
        assert_eq!(sanitize_book_name("   "), "book");
    }

    #[test]
    fn test_sanitize_keeps_plain_names() {
        assert_eq!(sanitize_book_name("rust-in-action"), "rust-in-action");
        assert_eq!(sanitize_book_name("전자책2024"), "전자책2024");
    }

    #[test]
    fn test_parse_page_count_rejects_invalid() {
        assert_eq!(parse_page_count("abc"), None);
        assert_eq!(parse_page_count("0"), None);
        assert_eq!(parse_page_count("-3"), None);
        assert_eq!(parse_page_count("3.5"), None);
        assert_eq!(parse_page_count("10000"), None);
    }

    #[test]
    fn test_parse_page_count_accepts_valid() {
        assert_eq!(parse_page_count("1"), Some(1));
        assert_eq!(parse_page_count(" 250 "), Some(250));
        assert_eq!(parse_page_count("9999"), Some(9999));
    }

    #[test]
    fn test_parse_interval_silently_defaults() {
        assert_eq!(parse_interval("abc", 0.5), 0.5);
        assert_eq!(parse_interval("-1.0", 0.5), 0.5);
        assert_eq!(parse_interval("NaN", 1.0), 1.0);
        assert_eq!(parse_interval("", 1.0), 1.0);
    }

    #[test]
    fn test_parse_interval_accepts_valid() {
        assert_eq!(parse_interval("0", 0.5), 0.0);
        assert_eq!(parse_interval("2.5", 0.5), 2.5);
    }

    #[test]
    fn test_derive_paths_layout() {
        let (images_dir, output_pdf) = derive_paths(Path::new("/base"), "My_Book_");
        assert_eq!(images_dir, Path::new("/base/My_Book_/images"));
        assert_eq!(output_pdf, Path::new("/base/My_Book_/My_Book_.pdf"));
    }

    #[test]
    fn test_parse_failsafe() {
        assert!(parse_failsafe("1"));
        assert!(parse_failsafe("true"));
        assert!(!parse_failsafe("0"));
        assert!(!parse_failsafe("FALSE"));
        assert!(!parse_failsafe("off"));
    }
}
