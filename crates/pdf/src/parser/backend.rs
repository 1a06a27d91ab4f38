use std::collections::BTreeMap;

use lopdf::{self, content::Content};

use crate::PdfError;

// ---------------------------------------------------------------------------
// Type aliases
// ---------------------------------------------------------------------------

/// A page identifier mirroring `lopdf::ObjectId`: (object number, generation number).
pub type PageId = (u32, u16);

// ---------------------------------------------------------------------------
// Supporting types
// ---------------------------------------------------------------------------

/// Font resource entry of a page, reduced to what the text pass needs.
#[derive(Debug, Clone)]
pub struct BackendFontInfo {
    /// Resource key as used by `Tf` (e.g. `b"F1"`).
    pub name: Vec<u8>,
    /// `BaseFont` entry, if present.
    pub base_font: Option<String>,
}

/// Backend-neutral PDF value, so the layout pass never touches
/// `lopdf::Object` directly.
#[derive(Debug, Clone, PartialEq)]
pub enum PdfValue {
    Null,
    Bool(bool),
    Integer(i64),
    Real(f32),
    Name(Vec<u8>),
    Str(Vec<u8>),
    Array(Vec<PdfValue>),
    Dict(Vec<(Vec<u8>, PdfValue)>),
    Reference(PageId),
}

/// One content-stream operator with its operands.
#[derive(Debug, Clone)]
pub struct ContentOp {
    pub operator: String,
    pub operands: Vec<PdfValue>,
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Numeric operand as `f32`; `Integer` and `Real` both qualify.
pub fn get_number_from_value(val: &PdfValue) -> Option<f32> {
    match val {
        PdfValue::Integer(i) => Some(*i as f32),
        PdfValue::Real(f) => Some(*f),
        _ => None,
    }
}

/// Convert a `lopdf::Object` into a [`PdfValue`]. Stream payloads are
/// dropped; only their dictionary survives.
pub fn convert_object(obj: &lopdf::Object) -> PdfValue {
    match obj {
        lopdf::Object::Null => PdfValue::Null,
        lopdf::Object::Boolean(b) => PdfValue::Bool(*b),
        lopdf::Object::Integer(i) => PdfValue::Integer(*i),
        lopdf::Object::Real(f) => PdfValue::Real(*f),
        lopdf::Object::Name(n) => PdfValue::Name(n.clone()),
        lopdf::Object::String(s, _) => PdfValue::Str(s.clone()),
        lopdf::Object::Array(arr) => PdfValue::Array(arr.iter().map(convert_object).collect()),
        lopdf::Object::Dictionary(dict) => PdfValue::Dict(convert_dict(dict)),
        lopdf::Object::Stream(stream) => PdfValue::Dict(convert_dict(&stream.dict)),
        lopdf::Object::Reference(id) => PdfValue::Reference(*id),
    }
}

fn convert_dict(dict: &lopdf::Dictionary) -> Vec<(Vec<u8>, PdfValue)> {
    dict.iter()
        .map(|(k, v)| (k.clone(), convert_object(v)))
        .collect()
}

/// Best-effort decoding of raw PDF string bytes.
///
/// UTF-16BE with BOM first, then UTF-8, then Latin-1 as the catch-all.
pub fn decode_text_simple(bytes: &[u8]) -> String {
    if let Some(payload) = bytes.strip_prefix(&[0xFE_u8, 0xFF][..]) {
        let code_units: Vec<u16> = payload
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&code_units);
    }

    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    bytes.iter().map(|&b| b as char).collect()
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Turns the operand of a text-showing operator into text, for one page.
pub trait TextDecoder {
    /// `font_name` is the resource key selected by the last `Tf`.
    fn decode(&self, font_name: &[u8], bytes: &[u8]) -> String;
}

/// Decoder for backends without font encodings: [`decode_text_simple`].
pub struct SimpleTextDecoder;

impl TextDecoder for SimpleTextDecoder {
    fn decode(&self, _font_name: &[u8], bytes: &[u8]) -> String {
        decode_text_simple(bytes)
    }
}

/// Everything the two extraction passes need from a parsed PDF.
///
/// Both passes walk content operators page by page. Tests substitute a mock.
pub trait PdfBackend {
    /// 1-based page number to [`PageId`].
    fn pages(&self) -> BTreeMap<u32, PageId>;

    /// Fonts referenced by the page's resource dictionary.
    fn page_fonts(&self, page: PageId) -> Result<Vec<BackendFontInfo>, PdfError>;

    /// Raw (possibly compressed) content stream of the page.
    fn page_content(&self, page: PageId) -> Result<Vec<u8>, PdfError>;

    /// Decode content-stream bytes into operators.
    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>, PdfError>;

    /// String decoder for the fonts of one page.
    fn text_decoder(&self, page: PageId) -> Box<dyn TextDecoder + '_>;
}

// ---------------------------------------------------------------------------
// LopdfBackend
// ---------------------------------------------------------------------------

/// [`PdfBackend`] over an in-memory [`lopdf::Document`].
pub struct LopdfBackend {
    doc: lopdf::Document,
}

impl LopdfBackend {
    /// Parse a PDF from bytes. Encrypted documents are refused.
    pub fn load_bytes(data: &[u8]) -> Result<Self, PdfError> {
        let doc = lopdf::Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;
        Self::from_document(doc)
    }

    /// Wrap an already parsed document. lopdf decrypts files protected by an
    /// empty user password while loading; anything still encrypted is refused.
    pub fn from_document(doc: lopdf::Document) -> Result<Self, PdfError> {
        if doc.is_encrypted() {
            return Err(PdfError::Encrypted);
        }

        Ok(Self { doc })
    }

    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    /// String entries of the trailer's Info dictionary (`Title`, `Author`,
    /// `Creator`, `Producer`, `Subject`, `Keywords`).
    pub fn metadata(&self) -> BTreeMap<String, String> {
        let mut meta = BTreeMap::new();

        let info_dict = match self.doc.trailer.get(b"Info") {
            Ok(lopdf::Object::Reference(id)) => match self.doc.get_object(*id) {
                Ok(lopdf::Object::Dictionary(d)) => d,
                _ => return meta,
            },
            Ok(lopdf::Object::Dictionary(d)) => d,
            _ => return meta,
        };

        let keys: &[&[u8]] = &[
            b"Title",
            b"Author",
            b"Creator",
            b"Producer",
            b"Subject",
            b"Keywords",
        ];

        for key in keys {
            let value = match info_dict.get(key) {
                Ok(lopdf::Object::String(bytes, _)) => decode_text_simple(bytes),
                Ok(lopdf::Object::Name(bytes)) => String::from_utf8_lossy(bytes).into_owned(),
                _ => continue,
            };
            let value = value.trim().to_string();
            if !value.is_empty() {
                meta.insert(String::from_utf8_lossy(key).into_owned(), value);
            }
        }

        meta
    }
}

fn name_entry(dict: &lopdf::Dictionary, key: &[u8]) -> Option<String> {
    dict.get(key)
        .ok()
        .and_then(|o| o.as_name().ok())
        .map(|n| String::from_utf8_lossy(n).into_owned())
}

impl PdfBackend for LopdfBackend {
    fn pages(&self) -> BTreeMap<u32, PageId> {
        self.doc.get_pages()
    }

    fn page_fonts(&self, page: PageId) -> Result<Vec<BackendFontInfo>, PdfError> {
        let fonts = self
            .doc
            .get_page_fonts(page)
            .map_err(|e| PdfError::Parse(format!("cannot get page fonts: {}", e)))?;

        Ok(fonts
            .iter()
            .map(|(name, dict)| BackendFontInfo {
                name: name.clone(),
                base_font: name_entry(dict, b"BaseFont"),
            })
            .collect())
    }

    fn page_content(&self, page: PageId) -> Result<Vec<u8>, PdfError> {
        self.doc
            .get_page_content(page)
            .map_err(|e| PdfError::Parse(format!("cannot get page content: {}", e)))
    }

    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>, PdfError> {
        let content = Content::decode(data)
            .map_err(|e| PdfError::Parse(format!("content stream decode error: {}", e)))?;

        Ok(content
            .operations
            .into_iter()
            .map(|op| ContentOp {
                operands: op.operands.iter().map(convert_object).collect(),
                operator: op.operator,
            })
            .collect())
    }

    fn text_decoder(&self, page: PageId) -> Box<dyn TextDecoder + '_> {
        let fonts = match self.doc.get_page_fonts(page) {
            Ok(fonts) => fonts,
            Err(e) => {
                log::warn!("page {:?}: cannot read fonts: {}", page, e);
                return Box::new(SimpleTextDecoder);
            }
        };

        let encodings = fonts
            .into_iter()
            .filter_map(|(name, font)| match font.get_font_encoding(&self.doc) {
                Ok(encoding) => Some((name, encoding)),
                Err(e) => {
                    log::debug!(
                        "font {}: no usable encoding: {}",
                        String::from_utf8_lossy(&name),
                        e
                    );
                    None
                }
            })
            .collect();

        Box::new(FontEncodings { encodings })
    }
}

/// The page's font encodings, resolved once per page.
struct FontEncodings<'a> {
    encodings: BTreeMap<Vec<u8>, lopdf::Encoding<'a>>,
}

impl TextDecoder for FontEncodings<'_> {
    fn decode(&self, font_name: &[u8], bytes: &[u8]) -> String {
        self.encodings
            .get(font_name)
            .and_then(|encoding| lopdf::Document::decode_text(encoding, bytes).ok())
            .unwrap_or_else(|| decode_text_simple(bytes))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
