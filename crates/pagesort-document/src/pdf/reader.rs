// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader — opens scanned PDFs, pulls each page's scan image out of its
// resources, and copies page subsets into new documents using `lopdf`.

use std::collections::HashMap;
use std::path::Path;

use image::{DynamicImage, GrayImage, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};
use pagesort_core::error::{PagesortError, Result};
use tracing::{debug, info, instrument, warn};

use crate::image::processor::ImageProcessor;
use crate::scan::traits::PageRenderer;

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guard against malformed page trees whose /Parent chain loops.
const MAX_TREE_DEPTH: usize = 32;

/// Default page raster resolution.
const DEFAULT_DPI: u32 = 300;

/// A scanned PDF opened for page rendering and splitting.
pub struct PdfReader {
    document: Document,
    /// Source path, if opened from a file (useful for diagnostics).
    source_path: Option<String>,
    /// Page images larger than the page size at this resolution are scaled down.
    render_dpi: u32,
}

impl PdfReader {
    // -- Construction ---------------------------------------------------------

    /// Open a PDF from the filesystem.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path_ref = path.as_ref();
        info!("Opening PDF: {}", path_ref.display());

        let document = Document::load(path_ref).map_err(|err| {
            PagesortError::PdfError(format!("failed to open {}: {}", path_ref.display(), err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded");

        Ok(Self {
            document,
            source_path: Some(path_ref.display().to_string()),
            render_dpi: DEFAULT_DPI,
        })
    }

    /// Create a reader from raw PDF bytes already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let document = Document::load_mem(data).map_err(|err| {
            PagesortError::PdfError(format!("failed to load PDF from memory: {}", err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded from bytes");

        Ok(Self {
            document,
            source_path: None,
            render_dpi: DEFAULT_DPI,
        })
    }

    /// Set the resolution page images are capped at.
    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.render_dpi = dpi.max(1);
        self
    }

    // -- Inspection -----------------------------------------------------------

    pub fn page_count(&self) -> u32 {
        self.document.get_pages().len() as u32
    }

    pub fn source_path(&self) -> Option<&str> {
        self.source_path.as_deref()
    }

    // -- Rendering ------------------------------------------------------------

    /// The scan image of page `page_number` (1-indexed).
    ///
    /// Takes the largest image XObject in the page resources. JPEG
    /// (`DCTDecode`) and Flate-compressed or raw 1/8-bit gray and RGB samples
    /// are decoded; any other encoding is a render error for this page.
    #[instrument(skip(self), fields(page = page_number))]
    pub fn page_image(&self, page_number: u32) -> Result<DynamicImage> {
        let render_err = |reason: String| PagesortError::Render {
            page: page_number,
            reason,
        };

        let page_id = self.page_id(page_number)?;
        let page = self
            .document
            .get_dictionary(page_id)
            .map_err(|err| render_err(format!("cannot read page dictionary: {}", err)))?;

        let resources = inherited(&self.document, page, b"Resources")
            .and_then(|obj| resolve_dict(&self.document, obj))
            .ok_or_else(|| render_err("page has no resources".to_string()))?;

        let xobjects = resources
            .get(b"XObject")
            .ok()
            .and_then(|obj| resolve_dict(&self.document, obj))
            .ok_or_else(|| render_err("page has no XObjects".to_string()))?;

        let stream = xobjects
            .iter()
            .filter_map(|(_, obj)| obj.as_reference().ok())
            .filter_map(|id| self.document.get_object(id).ok())
            .filter_map(|obj| match obj {
                Object::Stream(stream) if is_image(stream) => Some(stream),
                _ => None,
            })
            .max_by_key(|stream| {
                u64::from(dimension(&stream.dict, b"Width").unwrap_or(0))
                    * u64::from(dimension(&stream.dict, b"Height").unwrap_or(0))
            })
            .ok_or_else(|| render_err("page has no image XObject".to_string()))?;

        let image = decode_image(&self.document, stream).map_err(render_err)?;

        let image = match self.target_size(page) {
            Some((max_w, max_h)) if image.width() > max_w || image.height() > max_h => {
                debug!(max_w, max_h, "Scaling page image to render resolution");
                ImageProcessor::from_dynamic(image)
                    .resize(max_w, max_h)
                    .into_dynamic()
            }
            _ => image,
        };

        debug!(width = image.width(), height = image.height(), "Page image extracted");
        Ok(image)
    }

    /// Pixel size of the page's media box at the render resolution.
    fn target_size(&self, page: &Dictionary) -> Option<(u32, u32)> {
        let media_box = match inherited(&self.document, page, b"MediaBox")? {
            Object::Array(values) => values,
            Object::Reference(id) => match self.document.get_object(*id).ok()? {
                Object::Array(values) => values,
                _ => return None,
            },
            _ => return None,
        };
        let coords: Vec<f32> = media_box.iter().filter_map(number).collect();
        if coords.len() != 4 {
            return None;
        }
        let scale = self.render_dpi as f32 / 72.0;
        let width = ((coords[2] - coords[0]).abs() * scale).round() as u32;
        let height = ((coords[3] - coords[1]).abs() * scale).round() as u32;
        (width > 0 && height > 0).then_some((width, height))
    }

    // -- Extraction -----------------------------------------------------------

    /// Copy the given pages (1-indexed), in the given order, into a new
    /// standalone PDF and return its bytes.
    #[instrument(skip(self), fields(pages = page_numbers.len()))]
    pub fn extract_pages(&self, page_numbers: &[u32]) -> Result<Vec<u8>> {
        if page_numbers.is_empty() {
            return Err(PagesortError::PdfError(
                "no pages requested for extraction".to_string(),
            ));
        }

        let mut new_doc = Document::with_version("1.5");
        let pages_id = new_doc.new_object_id();
        let mut copied: HashMap<ObjectId, ObjectId> = HashMap::new();
        let mut kids = Vec::with_capacity(page_numbers.len());

        for &page_number in page_numbers {
            let page_id = self.page_id(page_number)?;
            let cloned = clone_page_into(&self.document, &mut new_doc, page_id, pages_id, &mut copied)?;
            kids.push(Object::Reference(cloned));
        }

        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_numbers.len() as i64,
        };
        new_doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = new_doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        new_doc.trailer.set("Root", catalog_id);

        let mut output = Vec::new();
        new_doc.save_to(&mut output).map_err(|err| {
            PagesortError::PdfError(format!("failed to serialise extracted pages: {}", err))
        })?;

        debug!(output_bytes = output.len(), "Pages extracted");
        Ok(output)
    }

    // -- Helpers --------------------------------------------------------------

    fn page_id(&self, page_number: u32) -> Result<ObjectId> {
        let pages = self.document.get_pages();
        pages.get(&page_number).copied().ok_or_else(|| {
            PagesortError::PdfError(format!(
                "page {} out of range (document has {} pages)",
                page_number,
                pages.len()
            ))
        })
    }
}

impl PageRenderer for PdfReader {
    fn page_count(&self) -> u32 {
        PdfReader::page_count(self)
    }

    fn render_page(&self, page_number: u32) -> Result<DynamicImage> {
        self.page_image(page_number)
    }
}

// -- Page tree ----------------------------------------------------------------

fn resolve_dict<'a>(document: &'a Document, object: &'a Object) -> Option<&'a Dictionary> {
    match object {
        Object::Dictionary(dict) => Some(dict),
        Object::Reference(id) => document.get_dictionary(*id).ok(),
        _ => None,
    }
}

/// Look `key` up on the page, then on its ancestors.
fn inherited<'a>(document: &'a Document, page: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
    let mut node = page;
    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = node.get(key) {
            return Some(value);
        }
        node = node
            .get(b"Parent")
            .ok()
            .and_then(|parent| resolve_dict(document, parent))?;
    }
    None
}

fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(value) => Some(*value as f32),
        Object::Real(value) => Some(*value as f32),
        _ => None,
    }
}

fn dimension(dict: &Dictionary, key: &[u8]) -> Option<u32> {
    dict.get(key)
        .ok()
        .and_then(|value| value.as_i64().ok())
        .and_then(|value| u32::try_from(value).ok())
}

// -- Image decoding -----------------------------------------------------------

fn is_image(stream: &Stream) -> bool {
    stream
        .dict
        .get(b"Subtype")
        .ok()
        .and_then(|subtype| subtype.as_name().ok())
        == Some(b"Image".as_slice())
}

/// Names in the stream's /Filter entry, which may be a name or an array.
fn filters(stream: &Stream) -> Vec<Vec<u8>> {
    match stream.dict.get(b"Filter") {
        Ok(Object::Name(name)) => vec![name.clone()],
        Ok(Object::Array(names)) => names
            .iter()
            .filter_map(|name| name.as_name().ok())
            .map(<[u8]>::to_vec)
            .collect(),
        _ => Vec::new(),
    }
}

/// Colour components per sample for the stream's /ColorSpace.
fn components(document: &Document, stream: &Stream) -> Option<u32> {
    let colour_space = match stream.dict.get(b"ColorSpace").ok()? {
        Object::Reference(id) => document.get_object(*id).ok()?,
        other => other,
    };
    match colour_space {
        Object::Name(name) => match name.as_slice() {
            b"DeviceGray" | b"CalGray" => Some(1),
            b"DeviceRGB" | b"CalRGB" => Some(3),
            _ => None,
        },
        // [/ICCBased <stream>] carries its component count as /N.
        Object::Array(parts) if parts.first().and_then(|p| p.as_name().ok()) == Some(b"ICCBased".as_slice()) => {
            let id = parts.get(1)?.as_reference().ok()?;
            match document.get_object(id).ok()? {
                Object::Stream(profile) => dimension(&profile.dict, b"N"),
                _ => None,
            }
        }
        _ => None,
    }
}

fn decode_image(document: &Document, stream: &Stream) -> std::result::Result<DynamicImage, String> {
    let filters = filters(stream);

    if filters.last().map(Vec::as_slice) == Some(b"DCTDecode".as_slice()) {
        let data = if filters.len() > 1 {
            stream
                .decompressed_content()
                .map_err(|err| format!("cannot decompress JPEG stream: {}", err))?
        } else {
            stream.content.clone()
        };
        return ImageProcessor::from_bytes(&data)
            .map(ImageProcessor::into_dynamic)
            .map_err(|err| err.to_string());
    }

    if let Some(other) = filters.iter().find(|f| f.as_slice() != b"FlateDecode") {
        return Err(format!(
            "unsupported image encoding {}",
            String::from_utf8_lossy(other)
        ));
    }

    let width = dimension(&stream.dict, b"Width").ok_or("image has no /Width")?;
    let height = dimension(&stream.dict, b"Height").ok_or("image has no /Height")?;
    let bits = dimension(&stream.dict, b"BitsPerComponent").unwrap_or(8);
    let channels = components(document, stream).ok_or("unsupported colour space")?;

    let samples = if filters.is_empty() {
        stream.content.clone()
    } else {
        stream
            .decompressed_content()
            .map_err(|err| format!("cannot decompress image stream: {}", err))?
    };

    match (bits, channels) {
        (8, 1) => GrayImage::from_raw(width, height, truncate(samples, width * height))
            .map(DynamicImage::ImageLuma8)
            .ok_or_else(|| "gray sample data too short".to_string()),
        (8, 3) => RgbImage::from_raw(width, height, truncate(samples, width * height * 3))
            .map(DynamicImage::ImageRgb8)
            .ok_or_else(|| "RGB sample data too short".to_string()),
        (1, 1) => unpack_bilevel(&samples, width, height).map(DynamicImage::ImageLuma8),
        _ => Err(format!("unsupported sample layout: {} bits x {} channels", bits, channels)),
    }
}

fn truncate(mut samples: Vec<u8>, len: u32) -> Vec<u8> {
    samples.truncate(len as usize);
    samples
}

/// Expand 1-bit gray samples (rows padded to a byte, 1 = white).
fn unpack_bilevel(samples: &[u8], width: u32, height: u32) -> std::result::Result<GrayImage, String> {
    let row_bytes = width.div_ceil(8) as usize;
    if samples.len() < row_bytes * height as usize {
        return Err("bilevel sample data too short".to_string());
    }
    Ok(GrayImage::from_fn(width, height, |x, y| {
        let byte = samples[y as usize * row_bytes + (x / 8) as usize];
        let bit = (byte >> (7 - (x % 8))) & 1;
        image::Luma([if bit == 1 { 255 } else { 0 }])
    }))
}

// -- Page copying -------------------------------------------------------------

/// Clone page `page_id` of `source` (and everything it references) into
/// `target` under the page tree node `parent_id`, returning the new page id.
///
/// Attributes the page inherits from the source page tree are copied onto the
/// page itself, since the source tree is not copied.
fn clone_page_into(
    source: &Document,
    target: &mut Document,
    page_id: ObjectId,
    parent_id: ObjectId,
    copied: &mut HashMap<ObjectId, ObjectId>,
) -> Result<ObjectId> {
    let page = source.get_dictionary(page_id).map_err(|err| {
        PagesortError::PdfError(format!("cannot read page object {:?}: {}", page_id, err))
    })?;

    let mut cloned = match deep_clone_object(source, target, &Object::Dictionary(page.clone()), copied) {
        Object::Dictionary(dict) => dict,
        _ => {
            return Err(PagesortError::PdfError(format!(
                "page object {:?} is not a dictionary",
                page_id
            )));
        }
    };

    for key in INHERITABLE {
        if cloned.has(key) {
            continue;
        }
        if let Some(value) = inherited(source, page, key) {
            let value = deep_clone_object(source, target, value, copied);
            cloned.set(key.to_vec(), value);
        }
    }

    cloned.set("Parent", Object::Reference(parent_id));
    Ok(target.add_object(Object::Dictionary(cloned)))
}

/// Deep-clone a lopdf Object, copying each referenced object into `target`
/// once (tracked in `copied`). /Parent entries are skipped; the caller
/// re-parents pages.
fn deep_clone_object(
    source: &Document,
    target: &mut Document,
    object: &Object,
    copied: &mut HashMap<ObjectId, ObjectId>,
) -> Object {
    match object {
        Object::Dictionary(dict) => Object::Dictionary(clone_dictionary(source, target, dict, copied)),
        Object::Array(arr) => Object::Array(
            arr.iter()
                .map(|item| deep_clone_object(source, target, item, copied))
                .collect(),
        ),
        Object::Reference(ref_id) => {
            if let Some(new_id) = copied.get(ref_id) {
                return Object::Reference(*new_id);
            }
            match source.get_object(*ref_id) {
                Ok(referenced) => {
                    // Reserve the id first so reference cycles resolve to it.
                    let new_id = target.new_object_id();
                    copied.insert(*ref_id, new_id);
                    let cloned = deep_clone_object(source, target, referenced, copied);
                    target.objects.insert(new_id, cloned);
                    Object::Reference(new_id)
                }
                Err(err) => {
                    warn!(?ref_id, %err, "Cannot resolve reference, using Null");
                    Object::Null
                }
            }
        }
        Object::Stream(stream) => Object::Stream(Stream::new(
            clone_dictionary(source, target, &stream.dict, copied),
            stream.content.clone(),
        )),
        other => other.clone(),
    }
}

fn clone_dictionary(
    source: &Document,
    target: &mut Document,
    dict: &Dictionary,
    copied: &mut HashMap<ObjectId, ObjectId>,
) -> Dictionary {
    let mut new_dict = Dictionary::new();
    for (key, value) in dict.iter() {
        if key == b"Parent" {
            continue;
        }
        new_dict.set(key.clone(), deep_clone_object(source, target, value, copied));
    }
    new_dict
}
