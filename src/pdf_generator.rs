use crate::capture;
use crate::error::{BookCaptureError, Result};
use image::{io::Reader, DynamicImage};
use log::{debug, info};
use printpdf::{
    ColorBits, ColorSpace, Image, ImageTransform, ImageXObject, Mm, PdfDocument,
    PdfDocumentReference, PdfLayerReference, Px,
};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// 캡쳐된 이미지들을 파일명 순으로 읽어 단일 PDF로 통합합니다
///
/// 디렉토리에 인식 가능한 이미지가 하나도 없으면 일반 IO 오류와 구분되는
/// `NoImages`를 반환합니다. 캡쳐 단계가 아무것도 남기지 못했다는 신호입니다.
pub async fn create_pdf(images_dir: &Path, output_pdf: &Path, title: &str) -> Result<PathBuf> {
    let image_files = capture::list_image_files(images_dir)?;

    if image_files.is_empty() {
        return Err(BookCaptureError::NoImages {
            dir: images_dir.to_path_buf(),
        });
    }

    info!("PDF 생성 시작: {} 페이지", image_files.len());

    // 첫 번째 이미지가 1페이지가 되고 문서 제목 페이지 크기를 정함
    let first_image = load_image(&image_files[0])?;
    let (doc_width, doc_height) = page_size_for_image(&first_image);

    let (doc, page1, layer1) = PdfDocument::new(title, doc_width, doc_height, "Layer 1");
    let mut current_layer = doc.get_page(page1).get_layer(layer1);
    add_image_to_page(&first_image, &mut current_layer)?;

    // 나머지 이미지들을 새 페이지로 추가
    for (index, image_path) in image_files.iter().skip(1).enumerate() {
        debug!(
            "PDF에 이미지 추가: {} ({}/{})",
            image_path.display(),
            index + 2,
            image_files.len()
        );

        let image = load_image(image_path)?;
        let (page_width, page_height) = page_size_for_image(&image);

        let (page_index, layer_index) = doc.add_page(page_width, page_height, "Layer 1");
        let mut layer = doc.get_page(page_index).get_layer(layer_index);
        add_image_to_page(&image, &mut layer)?;
    }

    if let Some(parent) = output_pdf.parent() {
        std::fs::create_dir_all(parent)?;
    }
    save_pdf_document(doc, output_pdf)?;

    info!("PDF 생성 완료: {}", output_pdf.display());
    Ok(output_pdf.to_path_buf())
}

fn load_image(image_path: &Path) -> Result<DynamicImage> {
    Reader::open(image_path)
        .map_err(|e| BookCaptureError::PdfGenerationFailure {
            reason: format!("이미지 파일 열기 실패 {}: {}", image_path.display(), e),
        })?
        .decode()
        .map_err(|e| BookCaptureError::PdfGenerationFailure {
            reason: format!("이미지 디코딩 실패 {}: {}", image_path.display(), e),
        })
}

/// 이미지 크기를 기반으로 PDF 페이지 크기를 계산합니다 (300 DPI 기준)
fn page_size_for_image(image: &DynamicImage) -> (Mm, Mm) {
    let width = image.width() as f64;
    let height = image.height() as f64;

    let dpi = 300.0;
    let mm_per_inch = 25.4;

    let width_mm = width / dpi * mm_per_inch;
    let height_mm = height / dpi * mm_per_inch;

    (Mm(width_mm as f32), Mm(height_mm as f32))
}

fn add_image_to_page(image: &DynamicImage, layer: &mut PdfLayerReference) -> Result<()> {
    // 알파 채널이나 인덱스 컬러는 PDF에 그대로 넣을 수 없으므로 RGB로 정규화
    let rgb_image = image.to_rgb8();
    let width = rgb_image.width();
    let height = rgb_image.height();

    let image_object = ImageXObject {
        width: Px(width as usize),
        height: Px(height as usize),
        color_space: ColorSpace::Rgb,
        bits_per_component: ColorBits::Bit8,
        interpolate: true,
        image_data: rgb_image.into_raw(),
        image_filter: None,
        clipping_bbox: None,
    };

    let pdf_image = Image::from(image_object);

    // 페이지 크기가 이미지 크기에 맞춰져 있으므로 좌하단 (0,0)에 1:1 배치
    let transform = ImageTransform {
        translate_x: Some(Mm(0.0)),
        translate_y: Some(Mm(0.0)),
        scale_x: Some(1.0),
        scale_y: Some(1.0),
        rotate: None,
        dpi: Some(300.0),
    };

    pdf_image.add_to_layer(layer.clone(), transform);

    Ok(())
}

fn save_pdf_document(doc: PdfDocumentReference, pdf_path: &Path) -> Result<()> {
    let file = File::create(pdf_path).map_err(|e| BookCaptureError::PdfGenerationFailure {
        reason: format!("PDF 파일 생성 실패: {}", e),
    })?;

    let mut writer = BufWriter::new(file);

    doc.save(&mut writer)
        .map_err(|e| BookCaptureError::PdfGenerationFailure {
            reason: format!("PDF 저장 실패: {}", e),
        })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Rgba, RgbaImage};
    use tempfile::tempdir;

    fn write_rgba_page(dir: &Path, page: u32, shade: u8) {
        let mut image = RgbaImage::new(8, 12);
        for pixel in image.pixels_mut() {
            // 알파가 있는 픽셀 형식으로 저장해 정규화 경로를 거치게 함
            *pixel = Rgba([shade, shade, shade, 200]);
        }
        image
            .save(dir.join(format!("page_{:04}.png", page)))
            .unwrap();
    }

    #[tokio::test]
    async fn test_create_pdf_from_images() {
        let dir = tempdir().unwrap();
        write_rgba_page(dir.path(), 1, 10);
        write_rgba_page(dir.path(), 2, 120);

        // 그레이스케일 이미지도 RGB로 정규화되어야 함
        GrayImage::new(8, 12)
            .save(dir.path().join("page_0003.png"))
            .unwrap();

        let output = dir.path().join("out").join("book.pdf");
        let result = create_pdf(dir.path(), &output, "테스트 책").await.unwrap();

        assert_eq!(result, output);
        let bytes = std::fs::read(&output).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert!(bytes.len() > 100);
    }

    #[tokio::test]
    async fn test_create_pdf_empty_directory_is_distinct_error() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("book.pdf");

        let result = create_pdf(dir.path(), &output, "빈 책").await;

        assert!(matches!(result, Err(BookCaptureError::NoImages { .. })));
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_create_pdf_ignores_non_image_files() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("log.txt"), b"not an image").unwrap();

        let output = dir.path().join("book.pdf");
        let result = create_pdf(dir.path(), &output, "책").await;

        assert!(matches!(result, Err(BookCaptureError::NoImages { .. })));
    }
}
