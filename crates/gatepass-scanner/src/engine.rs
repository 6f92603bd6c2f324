//! Production symbol engine backed by `rxing`.
//!
//! [`MultiFormatEngine`] reads PDF417, QR, Data Matrix and Code 128 from a
//! luma frame. Reader state is built per call, so one engine can be shared
//! across capture tasks.

use gatepass_core::SymbolFormat;
use gatepass_hardware::types::Frame;
use rxing::common::HybridBinarizer;
use rxing::{
    BarcodeFormat, BinaryBitmap, DecodeHintType, DecodeHintValue, DecodingHintDictionary,
    Exceptions, Luma8LuminanceSource, MultiFormatReader, Reader,
};
use std::collections::HashSet;
use tracing::trace;

use crate::decoder::{DecodeHints, EngineError, Symbol, SymbolEngine};

#[derive(Debug, Clone, Copy, Default)]
pub struct MultiFormatEngine;

impl MultiFormatEngine {
    pub fn new() -> Self {
        Self
    }
}

impl SymbolEngine for MultiFormatEngine {
    fn decode(&self, frame: &Frame, hints: &DecodeHints) -> Result<Symbol, EngineError> {
        if hints.formats.is_empty() {
            return Err(EngineError::Unsupported("no symbol formats requested".to_string()));
        }

        let source = Luma8LuminanceSource::new(frame.luma.clone(), frame.width, frame.height);
        let mut bitmap = BinaryBitmap::new(HybridBinarizer::new(source));
        let mut reader = MultiFormatReader::default();

        let result = reader
            .decode_with_hints(&mut bitmap, &hint_dictionary(hints))
            .map_err(engine_error)?;

        let format = symbol_format(result.getBarcodeFormat()).ok_or_else(|| {
            EngineError::Format(format!("unexpected format {}", result.getBarcodeFormat()))
        })?;
        trace!(frame = frame.sequence, %format, "symbol decoded");

        Ok(Symbol::new(result.getText(), format))
    }
}

fn hint_dictionary(hints: &DecodeHints) -> DecodingHintDictionary {
    let formats: HashSet<BarcodeFormat> = hints.formats.iter().map(|f| barcode_format(*f)).collect();

    let mut dictionary = DecodingHintDictionary::new();
    dictionary.insert(
        DecodeHintType::POSSIBLE_FORMATS,
        DecodeHintValue::PossibleFormats(formats),
    );
    if hints.try_harder {
        dictionary.insert(DecodeHintType::TRY_HARDER, DecodeHintValue::TryHarder(true));
    }
    dictionary
}

fn barcode_format(format: SymbolFormat) -> BarcodeFormat {
    match format {
        SymbolFormat::Pdf417 => BarcodeFormat::PDF_417,
        SymbolFormat::QrCode => BarcodeFormat::QR_CODE,
        SymbolFormat::DataMatrix => BarcodeFormat::DATA_MATRIX,
        SymbolFormat::Code128 => BarcodeFormat::CODE_128,
    }
}

fn symbol_format(format: &BarcodeFormat) -> Option<SymbolFormat> {
    match format {
        BarcodeFormat::PDF_417 => Some(SymbolFormat::Pdf417),
        BarcodeFormat::QR_CODE => Some(SymbolFormat::QrCode),
        BarcodeFormat::DATA_MATRIX => Some(SymbolFormat::DataMatrix),
        BarcodeFormat::CODE_128 => Some(SymbolFormat::Code128),
        _ => None,
    }
}

fn engine_error(error: Exceptions) -> EngineError {
    match error {
        Exceptions::NotFoundException(_) => EngineError::NotFound,
        Exceptions::ChecksumException(_) => EngineError::Checksum,
        Exceptions::IndexOutOfBoundsException(_) => EngineError::OutOfRange(error.to_string()),
        Exceptions::FormatException(_) => EngineError::Format(error.to_string()),
        Exceptions::UnsupportedOperationException(_) => EngineError::Unsupported(error.to_string()),
        other => EngineError::Other(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::{DecodeEvent, Decoder, SimulatedPlateRecognizer};
    use gatepass_core::ScanType;
    use gatepass_hardware::types::CapturedImage;
    use qrcode::{Color, QrCode};
    use std::sync::Arc;

    const SCALE: usize = 4;
    const QUIET_ZONE: usize = 4;

    fn qr_image(text: &str) -> image::GrayImage {
        let code = QrCode::new(text.as_bytes()).unwrap();
        let modules = code.width();
        let colors = code.to_colors();
        let side = ((modules + 2 * QUIET_ZONE) * SCALE) as u32;

        image::GrayImage::from_fn(side, side, |x, y| {
            let mx = (x as usize / SCALE).checked_sub(QUIET_ZONE);
            let my = (y as usize / SCALE).checked_sub(QUIET_ZONE);
            match (mx, my) {
                (Some(mx), Some(my))
                    if mx < modules && my < modules && colors[my * modules + mx] == Color::Dark =>
                {
                    image::Luma([0])
                }
                _ => image::Luma([255]),
            }
        })
    }

    fn qr_frame(text: &str) -> Frame {
        let img = qr_image(text);
        let (width, height) = img.dimensions();
        Frame::new(width, height, img.into_raw(), 1).unwrap()
    }

    fn id_hints() -> DecodeHints {
        DecodeHints::for_scan_type(ScanType::IdDocument)
    }

    #[test]
    fn test_decodes_rendered_qr() {
        let symbol = MultiFormatEngine::new()
            .decode(&qr_frame("8001015009087"), &id_hints())
            .unwrap();

        assert_eq!(symbol, Symbol::new("8001015009087", SymbolFormat::QrCode));
    }

    #[test]
    fn test_blank_frame_not_found() {
        let frame = Frame::new(64, 64, vec![255; 64 * 64], 0).unwrap();
        assert_eq!(
            MultiFormatEngine::new().decode(&frame, &id_hints()),
            Err(EngineError::NotFound)
        );
    }

    #[test]
    fn test_restricted_formats_skip_qr() {
        let hints = DecodeHints {
            formats: vec![SymbolFormat::Code128],
            try_harder: true,
        };
        assert_eq!(
            MultiFormatEngine::new().decode(&qr_frame("8001015009087"), &hints),
            Err(EngineError::NotFound)
        );
    }

    #[test]
    fn test_no_formats_is_unsupported() {
        let hints = DecodeHints {
            formats: Vec::new(),
            try_harder: false,
        };
        assert!(matches!(
            MultiFormatEngine::new().decode(&qr_frame("x"), &hints),
            Err(EngineError::Unsupported(_))
        ));
    }

    #[test]
    fn test_error_mapping() {
        assert_eq!(engine_error(Exceptions::NotFoundException(String::new())), EngineError::NotFound);
        assert_eq!(engine_error(Exceptions::ChecksumException(String::new())), EngineError::Checksum);
        assert!(matches!(
            engine_error(Exceptions::IndexOutOfBoundsException(String::new())),
            EngineError::OutOfRange(_)
        ));
        assert!(matches!(
            engine_error(Exceptions::FormatException(String::new())),
            EngineError::Format(_)
        ));
        assert!(matches!(
            engine_error(Exceptions::IllegalArgumentException(String::new())),
            EngineError::Other(_)
        ));
    }

    #[test]
    fn test_decoder_reads_png_capture() {
        let mut bytes = Vec::new();
        qr_image("8001015009087")
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        let decoder = Decoder::new(
            ScanType::IdDocument,
            Arc::new(MultiFormatEngine::new()),
            Arc::new(SimulatedPlateRecognizer::default()),
        );

        assert_eq!(
            decoder.decode_image(&CapturedImage::Bytes(bytes)),
            DecodeEvent::Success {
                text: "8001015009087".to_string(),
                format: Some(SymbolFormat::QrCode),
            }
        );
    }
}
