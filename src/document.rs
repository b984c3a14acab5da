use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use log::{debug, warn};
use regex::bytes::Regex;

use crate::content::{ContentParser, Form, IDENTITY, PageContent, Resources};
use crate::decode::decode_stream;
use crate::error::{PdfError, Result};
use crate::font::Font;
use crate::parser::Parser;
use crate::types::{Dict, ObjRef, PdfObject};

/// "N G obj" header, for rebuilding a damaged xref
static OBJECT_HEADER: LazyLock<std::result::Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"(?-u)([0-9]+)[\x00\t\n\x0C\r ]+([0-9]+)[\x00\t\n\x0C\r ]+obj\b"));

/// US Letter, used when no node in the page tree carries a `/MediaBox`
const DEFAULT_MEDIA_BOX: [f64; 4] = [0.0, 0.0, 612.0, 792.0];

const MAX_PAGE_TREE_DEPTH: usize = 64;

/// Form XObjects nested deeper than this are not loaded
const MAX_FORM_NESTING: usize = 8;

/// Entry in the cross-reference table
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum XRefEntry {
    Free,
    InUse { offset: usize, generation: u16 },
    /// Stored inside an object stream
    Compressed { stream: u32, index: usize },
}

/// One leaf of the page tree with its inherited attributes resolved
#[derive(Debug, Clone)]
pub struct Page {
    pub dict: Dict,
    pub resources: Dict,
    pub media_box: [f64; 4],
}

#[derive(Debug, Clone, Default)]
struct Inherited {
    resources: Option<Dict>,
    media_box: Option<[f64; 4]>,
}

struct XRefSection {
    entries: Vec<(u32, XRefEntry)>,
    trailer: Dict,
}

/// Parsed PDF document
pub struct Document<'a> {
    data: &'a [u8],
    /// Object number -> xref entry
    xref: HashMap<u32, XRefEntry>,
    /// Trailer dictionary
    trailer: Dict,
    /// Cache of parsed objects
    cache: HashMap<ObjRef, PdfObject>,
    fonts: HashMap<ObjRef, Font>,
    pages: Option<Vec<Page>>,
}

impl<'a> Document<'a> {
    /// Parse a PDF document from bytes
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        // Some producers put junk before the header; offsets count from it
        let header = find_bytes(&data[..data.len().min(1024)], b"%PDF-").ok_or(PdfError::MissingHeader)?;
        let data = &data[header..];

        let mut doc = match Self::load_xref_chain(data) {
            Ok((xref, trailer)) => Self::from_parts(data, xref, trailer),
            Err(e) => {
                warn!("Cross-reference data unusable ({}), scanning for objects", e);
                return Self::recovered(data);
            }
        };

        if doc.trailer.contains_key("Encrypt") {
            return Err(PdfError::Encrypted);
        }

        // Offsets that point at the wrong bytes are common after careless edits
        if let Err(e) = doc.catalog() {
            warn!("Catalog unreachable through xref ({}), scanning for objects", e);
            doc = Self::recovered(data)?;
        }

        Ok(doc)
    }

    fn from_parts(data: &'a [u8], xref: HashMap<u32, XRefEntry>, trailer: Dict) -> Self {
        Document {
            data,
            xref,
            trailer,
            cache: HashMap::new(),
            fonts: HashMap::new(),
            pages: None,
        }
    }

    /// Find "startxref" by searching backwards from EOF
    fn find_startxref(data: &[u8]) -> Result<usize> {
        let search = b"startxref";
        let search_region = data.len().saturating_sub(1024); // Last 1KB

        for i in (search_region..data.len().saturating_sub(search.len())).rev() {
            if &data[i..i + search.len()] == search {
                return Ok(i);
            }
        }

        Err(PdfError::MissingEof)
    }

    /// Parse the xref offset after "startxref"
    fn parse_startxref(data: &[u8], pos: usize) -> Result<usize> {
        let mut parser = Parser::new(data);
        parser.seek(pos + b"startxref".len());

        match parser.parse_object()? {
            Some(PdfObject::Int(offset)) if offset >= 0 => Ok(offset as usize),
            _ => Err(PdfError::Parse {
                position: pos,
                message: "Expected xref offset after startxref".into(),
            }),
        }
    }

    /// Follow `startxref` through every `/Prev` and `/XRefStm` section.
    ///
    /// Sections are visited newest first, so the first entry seen for an
    /// object number wins and the first trailer is the effective one.
    fn load_xref_chain(data: &[u8]) -> Result<(HashMap<u32, XRefEntry>, Dict)> {
        let start = Self::parse_startxref(data, Self::find_startxref(data)?)?;

        let mut xref = HashMap::new();
        let mut trailer: Option<Dict> = None;
        let mut pending = vec![start];
        let mut visited = HashSet::new();

        while let Some(offset) = pending.pop() {
            if !visited.insert(offset) {
                continue;
            }

            let section = Self::parse_xref_section(data, offset)?;
            for (num, entry) in section.entries {
                xref.entry(num).or_insert(entry);
            }

            if let Some(prev) = section.trailer.get("Prev").and_then(|p| p.as_int()) {
                pending.push(prev.max(0) as usize);
            }
            // Hybrid files: the stream section outranks /Prev
            if let Some(stm) = section.trailer.get("XRefStm").and_then(|p| p.as_int()) {
                pending.push(stm.max(0) as usize);
            }
            if trailer.is_none() {
                trailer = Some(section.trailer);
            }
        }

        let trailer = trailer.ok_or(PdfError::InvalidXref)?;
        debug!("Loaded {} xref entries from {} sections", xref.len(), visited.len());
        Ok((xref, trailer))
    }

    fn parse_xref_section(data: &[u8], offset: usize) -> Result<XRefSection> {
        let mut pos = offset;
        while data.get(pos).is_some_and(|b| b.is_ascii_whitespace()) {
            pos += 1;
        }
        if pos >= data.len() {
            return Err(PdfError::InvalidXref);
        }

        if data[pos..].starts_with(b"xref") {
            let entries = Self::parse_traditional_xref(data, pos)?;
            let trailer = Self::find_and_parse_trailer(data, pos)?;
            return Ok(XRefSection { entries, trailer });
        }

        // PDF 1.5 cross-reference stream
        let mut parser = Parser::new(data);
        parser.seek(pos);
        match parser.parse_indirect()? {
            (_, PdfObject::Stream { dict, data: raw })
                if dict.get("Type").and_then(|t| t.as_name()) == Some("XRef") =>
            {
                let entries = parse_xref_stream(&dict, &raw)?;
                Ok(XRefSection { entries, trailer: dict })
            }
            _ => Err(PdfError::InvalidXref),
        }
    }

    /// Parse traditional xref table
    fn parse_traditional_xref(data: &[u8], offset: usize) -> Result<Vec<(u32, XRefEntry)>> {
        let mut entries = Vec::new();
        let mut pos = offset + b"xref".len();

        // Skip whitespace after "xref"
        while pos < data.len() && matches!(data[pos], b' ' | b'\t' | b'\n' | b'\r') {
            pos += 1;
        }

        // Parse subsections
        while pos < data.len() && !data[pos..].starts_with(b"trailer") {
            // Subsection header: "start_obj count"
            let header_end = line_end(data, pos);
            let header_line = std::str::from_utf8(&data[pos..header_end]).map_err(|_| PdfError::InvalidXref)?;

            let parts: Vec<&str> = header_line.split_whitespace().collect();
            let [start_obj, count] = parts[..] else {
                break;
            };
            let start_obj: u32 = start_obj.parse().map_err(|_| PdfError::InvalidXref)?;
            let count: u32 = count.parse().map_err(|_| PdfError::InvalidXref)?;
            pos = skip_eol(data, header_end);

            for i in 0..count {
                let entry_end = line_end(data, pos);
                let entry_line = &data[pos..entry_end];

                // "nnnnnnnnnn ggggg n": offset, generation, in-use flag
                if entry_line.len() < 18 {
                    return Err(PdfError::InvalidXref);
                }

                let field = |range: std::ops::Range<usize>| -> Result<u64> {
                    std::str::from_utf8(&entry_line[range])
                        .ok()
                        .and_then(|s| s.trim().parse().ok())
                        .ok_or(PdfError::InvalidXref)
                };
                let entry_offset = field(0..10)?;
                let generation = field(11..16)?;

                let entry = if entry_line[17] == b'n' {
                    XRefEntry::InUse {
                        offset: entry_offset as usize,
                        generation: generation as u16,
                    }
                } else {
                    XRefEntry::Free
                };
                entries.push((start_obj + i, entry));

                pos = skip_eol(data, entry_end);
            }

            while pos < data.len() && data[pos].is_ascii_whitespace() {
                pos += 1;
            }
        }

        Ok(entries)
    }

    /// Find and parse trailer dictionary
    fn find_and_parse_trailer(data: &[u8], xref_offset: usize) -> Result<Dict> {
        let pos = find_bytes(&data[xref_offset..], b"trailer")
            .map(|p| xref_offset + p)
            .ok_or_else(|| PdfError::InvalidStructure("Missing trailer".into()))?;

        let mut parser = Parser::new(data);
        parser.seek(pos + b"trailer".len());

        match parser.parse_object()? {
            Some(PdfObject::Dict(dict)) => Ok(dict),
            _ => Err(PdfError::InvalidStructure("Trailer must be dictionary".into())),
        }
    }

    /// Rebuild the xref by scanning for "N G obj" headers
    fn recovered(data: &'a [u8]) -> Result<Self> {
        let header = OBJECT_HEADER
            .as_ref()
            .map_err(|e| PdfError::InvalidStructure(e.to_string()))?;

        let mut xref = HashMap::new();
        for caps in header.captures_iter(data) {
            let (Some(whole), Some(num), Some(generation)) = (caps.get(0), caps.get(1), caps.get(2)) else {
                continue;
            };
            let num = std::str::from_utf8(num.as_bytes()).ok().and_then(|s| s.parse::<u32>().ok());
            let generation = std::str::from_utf8(generation.as_bytes()).ok().and_then(|s| s.parse::<u16>().ok());
            if let (Some(num), Some(generation)) = (num, generation) {
                // Later definitions are incremental updates and win
                xref.insert(
                    num,
                    XRefEntry::InUse {
                        offset: whole.start(),
                        generation,
                    },
                );
            }
        }

        if xref.is_empty() {
            return Err(PdfError::InvalidStructure("No objects found".into()));
        }

        let trailer = data
            .windows(b"trailer".len())
            .rposition(|w| w == b"trailer")
            .and_then(|pos| Self::find_and_parse_trailer(data, pos).ok())
            .unwrap_or_default();

        let mut doc = Self::from_parts(data, xref, trailer);
        doc.recover_compressed_entries();

        if doc.trailer.contains_key("Encrypt") {
            return Err(PdfError::Encrypted);
        }
        if doc.catalog().is_err() {
            let root = doc
                .find_catalog()
                .ok_or_else(|| PdfError::InvalidStructure("No document catalog found".into()))?;
            doc.trailer.insert("Root".into(), PdfObject::Ref(root));
        }

        warn!("Recovered {} objects by scanning", doc.xref.len());
        Ok(doc)
    }

    /// Object streams are invisible to the header scan; their xref streams
    /// still describe them
    fn recover_compressed_entries(&mut self) {
        let mut found = Vec::new();
        for num in self.sorted_object_numbers() {
            let Some(XRefEntry::InUse { generation, .. }) = self.xref.get(&num).copied() else {
                continue;
            };
            let xref_dict = match self.resolve(ObjRef::new(num, generation)) {
                Ok(PdfObject::Stream { dict, data }) if dict.get("Type").and_then(|t| t.as_name()) == Some("XRef") => {
                    if let Ok(entries) = parse_xref_stream(dict, data) {
                        found.extend(entries);
                    }
                    Some(dict.clone())
                }
                _ => None,
            };
            if let Some(dict) = xref_dict {
                if !self.trailer.contains_key("Root") {
                    self.trailer = dict;
                }
            }
        }

        for (num, entry) in found {
            if matches!(entry, XRefEntry::Compressed { .. }) {
                self.xref.entry(num).or_insert(entry);
            }
        }
    }

    fn find_catalog(&mut self) -> Option<ObjRef> {
        for num in self.sorted_object_numbers().into_iter().rev() {
            let Some(XRefEntry::InUse { generation, .. }) = self.xref.get(&num).copied() else {
                continue;
            };
            let obj_ref = ObjRef::new(num, generation);
            let is_catalog = self
                .resolve(obj_ref)
                .ok()
                .and_then(|obj| obj.as_dict())
                .and_then(|d| d.get("Type"))
                .and_then(|t| t.as_name())
                == Some("Catalog");
            if is_catalog {
                return Some(obj_ref);
            }
        }
        None
    }

    fn sorted_object_numbers(&self) -> Vec<u32> {
        let mut nums: Vec<u32> = self.xref.keys().copied().collect();
        nums.sort_unstable();
        nums
    }

    /// Get the trailer dictionary
    pub fn trailer(&self) -> &Dict {
        &self.trailer
    }

    /// Get number of objects in xref
    pub fn object_count(&self) -> usize {
        self.xref
            .values()
            .filter(|e| !matches!(e, XRefEntry::Free))
            .count()
    }

    /// Resolve an object reference
    pub fn resolve(&mut self, obj_ref: ObjRef) -> Result<&PdfObject> {
        if !self.cache.contains_key(&obj_ref) {
            match self.xref.get(&obj_ref.obj_num).copied() {
                Some(XRefEntry::InUse { offset, .. }) => {
                    let mut parser = Parser::new(self.data);
                    parser.seek(offset);
                    let obj = parser.parse_indirect_object(obj_ref)?;
                    self.cache.insert(obj_ref, obj);
                }
                Some(XRefEntry::Compressed { stream, .. }) => self.load_object_stream(stream)?,
                Some(XRefEntry::Free) | None => {}
            }
        }

        self.cache
            .get(&obj_ref)
            .ok_or(PdfError::ObjectNotFound(obj_ref.obj_num, obj_ref.gen_num))
    }

    /// Parse every object an object stream holds into the cache
    fn load_object_stream(&mut self, stream_num: u32) -> Result<()> {
        let Some(XRefEntry::InUse { generation, .. }) = self.xref.get(&stream_num).copied() else {
            return Err(PdfError::InvalidStructure(format!(
                "Object stream {} is not a plain object",
                stream_num
            )));
        };

        let (decoded, count, first) = match self.resolve(ObjRef::new(stream_num, generation))? {
            PdfObject::Stream { dict, data } => (
                decode_stream(dict, data)?,
                dict.get("N").and_then(|n| n.as_int()).unwrap_or(0).max(0) as usize,
                dict.get("First").and_then(|f| f.as_int()).unwrap_or(0).max(0) as usize,
            ),
            _ => return Err(PdfError::InvalidStructure("Expected object stream".into())),
        };

        let mut parser = Parser::new(&decoded);
        let mut headers = Vec::with_capacity(count);
        for _ in 0..count {
            let num = parser.parse_object()?.and_then(|n| n.as_int());
            let offset = parser.parse_object()?.and_then(|o| o.as_int());
            match (num, offset) {
                (Some(num), Some(offset)) if num >= 0 && offset >= 0 => {
                    headers.push((num as u32, offset as usize));
                }
                _ => return Err(PdfError::InvalidStructure("Bad object stream header".into())),
            }
        }

        for (index, (num, offset)) in headers.into_iter().enumerate() {
            let expected = XRefEntry::Compressed {
                stream: stream_num,
                index,
            };
            // Superseded copies stay out of the cache
            if self.xref.get(&num) != Some(&expected) {
                continue;
            }
            parser.seek(first + offset);
            match parser.parse_object() {
                Ok(Some(obj)) => {
                    self.cache.entry(ObjRef::new(num, 0)).or_insert(obj);
                }
                Ok(None) => {}
                Err(e) => debug!("Object {} in stream {} unreadable: {}", num, stream_num, e),
            }
        }

        Ok(())
    }

    /// Get an object, resolving references automatically
    pub fn get_object(&mut self, obj: &PdfObject) -> Result<PdfObject> {
        match obj {
            PdfObject::Ref(r) => self.resolve(*r).cloned(),
            other => Ok(other.clone()),
        }
    }

    /// Resolve to a dictionary, or the dictionary of a stream
    fn get_dict(&mut self, obj: Option<&PdfObject>) -> Option<Dict> {
        match self.get_object(obj?).ok()? {
            PdfObject::Dict(dict) | PdfObject::Stream { dict, .. } => Some(dict),
            _ => None,
        }
    }

    /// Get document catalog
    pub fn catalog(&mut self) -> Result<PdfObject> {
        let root_ref = self
            .trailer
            .get("Root")
            .ok_or_else(|| PdfError::InvalidStructure("Missing Root in trailer".into()))?
            .as_ref()
            .ok_or_else(|| PdfError::InvalidStructure("Root must be reference".into()))?;

        let catalog = self.resolve(root_ref)?;
        if catalog.as_dict().is_none() {
            return Err(PdfError::InvalidStructure("Catalog must be dictionary".into()));
        }
        Ok(catalog.clone())
    }

    /// Get page count
    pub fn page_count(&mut self) -> Result<usize> {
        Ok(self.pages()?.len())
    }

    /// Leaves of the page tree in document order
    pub fn pages(&mut self) -> Result<&[Page]> {
        if self.pages.is_none() {
            let catalog = self.catalog()?;
            let root = catalog
                .as_dict()
                .and_then(|d| d.get("Pages"))
                .ok_or_else(|| PdfError::InvalidStructure("Missing Pages in catalog".into()))?;

            let mut pages = Vec::new();
            let mut visited = HashSet::new();
            self.walk_page_tree(root, &Inherited::default(), 0, &mut visited, &mut pages)?;
            self.pages = Some(pages);
        }

        Ok(self.pages.as_deref().unwrap_or_default())
    }

    fn walk_page_tree(
        &mut self,
        node: &PdfObject,
        inherited: &Inherited,
        depth: usize,
        visited: &mut HashSet<ObjRef>,
        pages: &mut Vec<Page>,
    ) -> Result<()> {
        if depth > MAX_PAGE_TREE_DEPTH {
            return Err(PdfError::InvalidStructure("Page tree too deep".into()));
        }
        if let Some(r) = node.as_ref() {
            if !visited.insert(r) {
                warn!("Page tree revisits object {}, skipping", r.obj_num);
                return Ok(());
            }
        }

        let Some(dict) = self.get_dict(Some(node)) else {
            return Ok(());
        };

        let mut inherited = inherited.clone();
        if let Some(resources) = self.get_dict(dict.get("Resources")) {
            inherited.resources = Some(resources);
        }
        if let Some(media_box) = dict
            .get("MediaBox")
            .and_then(|m| self.get_object(m).ok())
            .and_then(|m| m.as_numbers::<4>())
        {
            let [x0, y0, x1, y1] = media_box;
            inherited.media_box = Some([x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1)]);
        }

        let is_node = dict.get("Type").and_then(|t| t.as_name()) == Some("Pages") || dict.contains_key("Kids");
        if !is_node {
            pages.push(Page {
                dict,
                resources: inherited.resources.unwrap_or_default(),
                media_box: inherited.media_box.unwrap_or(DEFAULT_MEDIA_BOX),
            });
            return Ok(());
        }

        let kids = match dict.get("Kids").map(|k| self.get_object(k)) {
            Some(Ok(PdfObject::Array(kids))) => kids,
            _ => Vec::new(),
        };
        for kid in &kids {
            if let Err(e) = self.walk_page_tree(kid, &inherited, depth + 1, visited, pages) {
                warn!("Skipping broken page tree node: {}", e);
            }
        }

        Ok(())
    }

    /// Get decoded stream content from an object reference
    pub fn get_stream_data(&mut self, obj_ref: ObjRef) -> Result<Vec<u8>> {
        match self.resolve(obj_ref)? {
            PdfObject::Stream { dict, data } => decode_stream(dict, data),
            _ => Err(PdfError::InvalidStructure("Expected stream object".into())),
        }
    }

    /// Get content stream(s) from a page
    pub fn get_page_contents(&mut self, page: &Dict) -> Result<Vec<u8>> {
        let Some(contents) = page.get("Contents") else {
            return Ok(Vec::new());
        };

        match self.get_object(contents)? {
            PdfObject::Stream { dict, data } => decode_stream(&dict, &data),
            PdfObject::Array(arr) => {
                // Multiple content streams - concatenate
                let mut result = Vec::new();
                for item in arr.iter().filter_map(|i| i.as_ref()) {
                    match self.get_stream_data(item) {
                        Ok(data) => {
                            result.extend(data);
                            result.push(b'\n'); // Separate streams
                        }
                        Err(e) => warn!("Skipping content stream {}: {}", item.obj_num, e),
                    }
                }
                Ok(result)
            }
            PdfObject::Null => Ok(Vec::new()),
            _ => Err(PdfError::InvalidStructure("Invalid Contents type".into())),
        }
    }

    /// Interpret one page (0-based) into spans and ruling geometry
    pub fn extract_page(&mut self, index: usize) -> Result<PageContent> {
        let page = self
            .pages()?
            .get(index)
            .cloned()
            .ok_or_else(|| PdfError::InvalidStructure(format!("Page {} not found", index)))?;

        let resources = self.load_resources(&page.resources, &mut Vec::new());
        let content = self.get_page_contents(&page.dict)?;

        let mut out = ContentParser::new(&resources).parse(&content)?;
        out.media_box = page.media_box;
        Ok(out)
    }

    /// Load fonts and form XObjects named by a resource dictionary.
    ///
    /// `forms_on_path` holds the forms being loaded above this one so a
    /// form that names itself is not followed.
    fn load_resources(&mut self, dict: &Dict, forms_on_path: &mut Vec<ObjRef>) -> Resources {
        let mut resources = Resources::default();

        if let Some(fonts) = self.get_dict(dict.get("Font")) {
            for (name, font_obj) in fonts {
                if let Some(font) = self.load_font(&font_obj) {
                    resources.fonts.insert(name, font);
                }
            }
        }

        let Some(xobjects) = self.get_dict(dict.get("XObject")) else {
            return resources;
        };

        for (name, xobject) in xobjects {
            let Some(r) = xobject.as_ref() else { continue };
            if forms_on_path.contains(&r) || forms_on_path.len() >= MAX_FORM_NESTING {
                continue;
            }

            let (content, matrix, form_resources) = match self.resolve(r) {
                Ok(PdfObject::Stream { dict: form, data })
                    if form.get("Subtype").and_then(|s| s.as_name()) == Some("Form") =>
                {
                    let content = match decode_stream(form, data) {
                        Ok(content) => content,
                        Err(e) => {
                            debug!("Form {} unreadable: {}", name, e);
                            continue;
                        }
                    };
                    let matrix = form.get("Matrix").and_then(|m| m.as_numbers::<6>()).unwrap_or(IDENTITY);
                    (content, matrix, form.get("Resources").cloned())
                }
                _ => continue,
            };

            // Forms without their own resources use the enclosing ones
            let form_dict = self.get_dict(form_resources.as_ref()).unwrap_or_else(|| dict.clone());

            forms_on_path.push(r);
            let nested = self.load_resources(&form_dict, forms_on_path);
            forms_on_path.pop();

            resources.forms.insert(
                name,
                Form {
                    content,
                    matrix,
                    resources: nested,
                },
            );
        }

        resources
    }

    fn load_font(&mut self, font_obj: &PdfObject) -> Option<Font> {
        let font_ref = font_obj.as_ref();
        if let Some(font) = font_ref.and_then(|r| self.fonts.get(&r)) {
            return Some(font.clone());
        }

        let dict = self.get_dict(Some(font_obj))?;
        let font = Font::load(self, &dict);
        if let Some(r) = font_ref {
            self.fonts.insert(r, font.clone());
        }
        Some(font)
    }
}

/// Decode the binary rows of a cross-reference stream
fn parse_xref_stream(dict: &Dict, raw: &[u8]) -> Result<Vec<(u32, XRefEntry)>> {
    let decoded = decode_stream(dict, raw)?;

    let widths = dict
        .get("W")
        .and_then(|w| w.as_numbers::<3>())
        .ok_or(PdfError::InvalidXref)?
        .map(|w| w.max(0.0) as usize);
    let row_len: usize = widths.iter().sum();
    if row_len == 0 || widths.iter().any(|&w| w > 8) {
        return Err(PdfError::InvalidXref);
    }

    let size = dict.get("Size").and_then(|s| s.as_int()).unwrap_or(0);
    let index: Vec<i64> = dict
        .get("Index")
        .and_then(|i| i.as_array())
        .map(|items| items.iter().filter_map(|i| i.as_int()).collect())
        .unwrap_or_else(|| vec![0, size]);

    let mut rows = decoded.chunks_exact(row_len);
    let mut entries = Vec::new();

    'sections: for pair in index.chunks(2) {
        let [first, count] = pair else { break };
        for i in 0..(*count).max(0) {
            let Some(row) = rows.next() else {
                break 'sections;
            };

            let (kind, rest) = row.split_at(widths[0]);
            let (f2, f3) = rest.split_at(widths[1]);
            // A zero-width type field defaults to "in use"
            let kind = if widths[0] == 0 { 1 } else { read_be(kind) };

            let entry = match kind {
                0 => XRefEntry::Free,
                1 => XRefEntry::InUse {
                    offset: read_be(f2) as usize,
                    generation: read_be(f3) as u16,
                },
                2 => XRefEntry::Compressed {
                    stream: read_be(f2) as u32,
                    index: read_be(f3) as usize,
                },
                _ => continue,
            };
            entries.push(((first + i) as u32, entry));
        }
    }

    Ok(entries)
}

fn read_be(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64)
}

fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn line_end(data: &[u8], pos: usize) -> usize {
    data[pos..]
        .iter()
        .position(|&b| b == b'\n' || b == b'\r')
        .map(|p| pos + p)
        .unwrap_or(data.len())
}

/// Skip one line ending (LF, CR or CRLF)
fn skip_eol(data: &[u8], mut pos: usize) -> usize {
    if data.get(pos) == Some(&b'\r') {
        pos += 1;
    }
    if data.get(pos) == Some(&b'\n') {
        pos += 1;
    }
    pos
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Numbered objects 1..=n with an exact classic xref table
    fn build_pdf(objects: &[String], trailer_extra: &str) -> Vec<u8> {
        let mut out = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::new();
        for (i, body) in objects.iter().enumerate() {
            offsets.push(out.len());
            out.extend(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).into_bytes());
        }

        let xref_pos = out.len();
        out.extend(format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).into_bytes());
        for offset in offsets {
            out.extend(format!("{:010} 00000 n \n", offset).into_bytes());
        }
        out.extend(
            format!(
                "trailer\n<< /Size {} /Root 1 0 R {} >>\nstartxref\n{}\n%%EOF\n",
                objects.len() + 1,
                trailer_extra,
                xref_pos
            )
            .into_bytes(),
        );
        out
    }

    fn stream(content: &str) -> String {
        format!("<< /Length {} >>\nstream\n{}\nendstream", content.len(), content)
    }

    fn one_page_pdf(content: &str) -> Vec<u8> {
        build_pdf(
            &[
                "<< /Type /Catalog /Pages 2 0 R >>".into(),
                "<< /Type /Pages /Kids [3 0 R] /Count 1 /MediaBox [0 0 595 842] \
                 /Resources << /Font << /F1 5 0 R >> >> >>"
                    .into(),
                "<< /Type /Page /Parent 2 0 R /Contents 4 0 R >>".into(),
                stream(content),
                "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /FirstChar 65 /Widths [700 600] >>".into(),
            ],
            "",
        )
    }

    #[test]
    fn test_find_startxref() {
        let data = b"%PDF-1.4\n%%EOF\nstartxref\n1234\n%%EOF";
        let pos = Document::find_startxref(data).unwrap();
        assert!(data[pos..].starts_with(b"startxref"));
    }

    #[test]
    fn test_pages_inherit_media_box_and_resources() {
        let data = one_page_pdf("BT /F1 10 Tf 72 700 Td (AB) Tj ET");
        let mut doc = Document::parse(&data).unwrap();

        assert_eq!(doc.page_count().unwrap(), 1);
        let page = doc.extract_page(0).unwrap();
        assert_eq!(page.media_box, [0.0, 0.0, 595.0, 842.0]);
        assert_eq!(page.spans.len(), 1);
        assert_eq!(page.spans[0].text, "AB");
        // Widths come from the font dictionary: 7pt + 6pt
        assert!((page.spans[0].width - 13.0).abs() < 1e-9);
    }

    #[test]
    fn test_traditional_xref_with_two_subsections() {
        let data = b"xref\n0 2\n0000000000 65535 f \n0000000017 00000 n \n\
                     7 1\r\n0000000421 00002 n\r\ntrailer\n<< /Size 8 >>";
        let entries = Document::parse_traditional_xref(data, 0).unwrap();

        assert_eq!(
            entries,
            vec![
                (0, XRefEntry::Free),
                (1, XRefEntry::InUse { offset: 17, generation: 0 }),
                (7, XRefEntry::InUse { offset: 421, generation: 2 }),
            ]
        );
    }

    #[test]
    fn test_missing_header() {
        assert!(matches!(Document::parse(b"hello"), Err(PdfError::MissingHeader)));
    }

    #[test]
    fn test_encrypted_is_rejected() {
        let data = build_pdf(
            &["<< /Type /Catalog /Pages 2 0 R >>".into(), "<< /Type /Pages /Kids [] /Count 0 >>".into()],
            "/Encrypt << /Filter /Standard >>",
        );
        assert!(matches!(Document::parse(&data), Err(PdfError::Encrypted)));
    }

    #[test]
    fn test_recovers_from_bad_startxref() {
        let mut data = one_page_pdf("BT 10 10 Td (x) Tj ET");
        let pos = data.windows(9).rposition(|w| w == b"startxref").unwrap();
        data.truncate(pos);
        data.extend_from_slice(b"startxref\n999999\n%%EOF\n");

        let mut doc = Document::parse(&data).unwrap();
        assert_eq!(doc.page_count().unwrap(), 1);
        assert_eq!(doc.extract_page(0).unwrap().spans[0].text, "x");
    }

    #[test]
    fn test_xref_stream_and_object_stream() {
        // Objects 1-2 live in object stream 3; 4 is the xref stream
        let objstm_body = "1 0 2 33 << /Type /Catalog /Pages 2 0 R >> << /Type /Pages /Kids [] /Count 0 >>";
        let first = "1 0 2 33 ".len();
        let mut out = b"%PDF-1.5\n".to_vec();

        let objstm_offset = out.len();
        out.extend(
            format!(
                "3 0 obj\n<< /Type /ObjStm /N 2 /First {} /Length {} >>\nstream\n{}\nendstream\nendobj\n",
                first,
                objstm_body.len(),
                objstm_body
            )
            .into_bytes(),
        );

        let xref_offset = out.len();
        // W [1 2 1]: type, field 2 (offset / stream number), field 3
        let mut rows: Vec<u8> = vec![0, 0, 0, 255];
        rows.extend([2, 0, 3, 0]);
        rows.extend([2, 0, 3, 1]);
        rows.extend([1, (objstm_offset >> 8) as u8, objstm_offset as u8, 0]);
        rows.extend([1, (xref_offset >> 8) as u8, xref_offset as u8, 0]);

        out.extend(
            format!(
                "4 0 obj\n<< /Type /XRef /Size 5 /W [1 2 1] /Root 1 0 R /Length {} >>\nstream\n",
                rows.len()
            )
            .into_bytes(),
        );
        out.extend(&rows);
        out.extend(format!("\nendstream\nendobj\nstartxref\n{}\n%%EOF\n", xref_offset).into_bytes());

        let mut doc = Document::parse(&out).unwrap();
        assert_eq!(doc.page_count().unwrap(), 0);
        let catalog = doc.catalog().unwrap();
        assert_eq!(
            catalog.as_dict().and_then(|d| d.get("Type")).and_then(|t| t.as_name()),
            Some("Catalog")
        );
    }

    #[test]
    fn test_incremental_update_prefers_newest_object() {
        let mut data = one_page_pdf("BT 10 10 Td (old) Tj ET");
        let first_xref = {
            let pos = data.windows(9).rposition(|w| w == b"startxref").unwrap();
            let tail = std::str::from_utf8(&data[pos + 9..]).unwrap();
            tail.split_whitespace().next().unwrap().to_string()
        };

        let new_content = stream("BT 10 10 Td (new) Tj ET");
        let obj_offset = data.len();
        data.extend(format!("4 0 obj\n{}\nendobj\n", new_content).into_bytes());
        let xref_offset = data.len();
        data.extend(
            format!(
                "xref\n4 1\n{:010} 00000 n \ntrailer\n<< /Size 6 /Root 1 0 R /Prev {} >>\nstartxref\n{}\n%%EOF\n",
                obj_offset, first_xref, xref_offset
            )
            .into_bytes(),
        );

        let mut doc = Document::parse(&data).unwrap();
        assert_eq!(doc.extract_page(0).unwrap().spans[0].text, "new");
    }
}
