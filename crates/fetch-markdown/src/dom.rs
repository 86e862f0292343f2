//! Arena-backed HTML document tree
//!
//! A small forgiving HTML parser that builds an owned node table with
//! integer indices for parent/child links. The extraction heuristic
//! mutates the tree (detaching boilerplate subtrees) and repeatedly
//! walks it to score candidates, which is awkward with pointer-based
//! trees but straightforward over an arena.
//!
//! The parser is tolerant by design: unknown tags are kept, stray
//! closing tags are ignored, unclosed elements are closed implicitly
//! at end of input.

/// Index of a node in the arena
pub type NodeId = usize;

/// Elements that never have children
const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose content is raw text, not markup
const RAW_TEXT_TAGS: &[&str] = &["script", "style"];

/// Block-level tags that implicitly close an open `<p>`
const P_CLOSERS: &[&str] = &[
    "address", "article", "aside", "blockquote", "div", "dl", "fieldset", "figure", "footer",
    "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "main", "nav", "ol", "p", "pre",
    "section", "table", "ul",
];

/// Node payload
#[derive(Debug, Clone)]
pub enum NodeData {
    /// Synthetic root
    Document,
    /// Element with lowercase tag name and decoded attributes
    Element {
        name: String,
        attrs: Vec<(String, String)>,
    },
    /// Text content with entities decoded
    Text(String),
}

/// A node in the arena
#[derive(Debug, Clone)]
pub struct Node {
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub data: NodeData,
}

/// Owned document tree
#[derive(Debug)]
pub struct Dom {
    nodes: Vec<Node>,
}

impl Dom {
    /// Parse an HTML document or fragment
    pub fn parse(html: &str) -> Self {
        let mut dom = Dom {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                data: NodeData::Document,
            }],
        };
        let mut stack: Vec<NodeId> = vec![0];
        let mut i = 0;

        while i < html.len() {
            let rest = &html[i..];
            let Some(lt) = rest.find('<') else {
                dom.push_text(*stack.last().unwrap(), rest);
                break;
            };
            if lt > 0 {
                dom.push_text(*stack.last().unwrap(), &rest[..lt]);
                i += lt;
            }
            let tail = &html[i..];

            if tail.starts_with("<!--") {
                // Comment
                match tail.find("-->") {
                    Some(end) => i += end + 3,
                    None => break,
                }
            } else if tail.starts_with("<!") || tail.starts_with("<?") {
                // Doctype or processing instruction
                match tail.find('>') {
                    Some(end) => i += end + 1,
                    None => break,
                }
            } else if let Some(after) = tail.strip_prefix("</") {
                // Closing tag
                match after.find('>') {
                    Some(end) => {
                        let name = tag_name(&after[..end]);
                        close_element(&mut stack, &dom, &name);
                        i += end + 3;
                    }
                    None => break,
                }
            } else if tail[1..]
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic())
            {
                // Opening tag
                let Some(end) = find_tag_end(tail) else {
                    break;
                };
                let inner = tail[1..end].trim_end_matches('/');
                let self_closing = tail[1..end].ends_with('/');
                let (name, attrs) = parse_tag(inner);
                i += end + 1;

                // Implied end tags
                if P_CLOSERS.contains(&name.as_str()) {
                    close_if_open(&mut stack, &dom, "p");
                }
                if name == "li" {
                    close_if_open(&mut stack, &dom, "li");
                }

                let id = dom.append_element(*stack.last().unwrap(), name.clone(), attrs);
                if self_closing || VOID_TAGS.contains(&name.as_str()) {
                    continue;
                }
                if RAW_TEXT_TAGS.contains(&name.as_str()) {
                    let closer = format!("</{}", name);
                    let hay = &html[i..];
                    match find_ci(hay, &closer) {
                        Some(off) => {
                            if off > 0 {
                                dom.push_raw_text(id, &hay[..off]);
                            }
                            let after = &hay[off..];
                            i += off + after.find('>').map_or(after.len(), |p| p + 1);
                        }
                        None => {
                            dom.push_raw_text(id, hay);
                            break;
                        }
                    }
                } else {
                    stack.push(id);
                }
            } else {
                // Stray '<' that does not open a tag, keep it as text
                dom.push_text(*stack.last().unwrap(), "<");
                i += 1;
            }
        }

        dom
    }

    /// Synthetic document root
    pub fn root(&self) -> NodeId {
        0
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    /// Lowercase tag name, `None` for text and the root
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id].data {
            NodeData::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Attribute value by lowercase name
    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        match &self.nodes[id].data {
            NodeData::Element { attrs, .. } => attrs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].parent
    }

    /// Preorder walk of the subtree rooted at `id`, excluding `id` itself
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut pending: Vec<NodeId> = self.nodes[id].children.iter().rev().copied().collect();
        while let Some(next) = pending.pop() {
            out.push(next);
            pending.extend(self.nodes[next].children.iter().rev().copied());
        }
        out
    }

    /// Concatenated text of the subtree rooted at `id`
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match &self.nodes[id].data {
            NodeData::Text(text) => out.push_str(text),
            _ => {
                for &child in &self.nodes[id].children {
                    self.collect_text(child, out);
                }
            }
        }
    }

    /// All elements with the given tag name, in document order
    pub fn elements_by_tag(&self, tag: &str) -> Vec<NodeId> {
        self.descendants(self.root())
            .into_iter()
            .filter(|&id| self.tag(id) == Some(tag))
            .collect()
    }

    /// Remove `id` from its parent's child list; the subtree stays in
    /// the arena but becomes unreachable from the root
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id].parent.take() {
            self.nodes[parent].children.retain(|&c| c != id);
        }
    }

    fn append_element(
        &mut self,
        parent: NodeId,
        name: String,
        attrs: Vec<(String, String)>,
    ) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            parent: Some(parent),
            children: Vec::new(),
            data: NodeData::Element { name, attrs },
        });
        self.nodes[parent].children.push(id);
        id
    }

    fn push_text(&mut self, parent: NodeId, raw: &str) {
        if raw.is_empty() {
            return;
        }
        let id = self.nodes.len();
        self.nodes.push(Node {
            parent: Some(parent),
            children: Vec::new(),
            data: NodeData::Text(decode_entities(raw)),
        });
        self.nodes[parent].children.push(id);
    }

    fn push_raw_text(&mut self, parent: NodeId, raw: &str) {
        let id = self.nodes.len();
        self.nodes.push(Node {
            parent: Some(parent),
            children: Vec::new(),
            data: NodeData::Text(raw.to_string()),
        });
        self.nodes[parent].children.push(id);
    }
}

/// Close the innermost open element named `name`, ignoring the tag when
/// no such element is open
fn close_element(stack: &mut Vec<NodeId>, dom: &Dom, name: &str) {
    if name.is_empty() {
        return;
    }
    if let Some(pos) = stack
        .iter()
        .rposition(|&id| dom.tag(id) == Some(name))
        .filter(|&pos| pos > 0)
    {
        stack.truncate(pos);
    }
}

/// Close the innermost open element named `name` if it is currently open
fn close_if_open(stack: &mut Vec<NodeId>, dom: &Dom, name: &str) {
    if stack.len() > 1 && dom.tag(*stack.last().unwrap()) == Some(name) {
        stack.pop();
    }
}

/// Index of the `>` ending the tag that starts at `tail[0]`, honoring
/// quoted attribute values
fn find_tag_end(tail: &str) -> Option<usize> {
    let bytes = tail.as_bytes();
    let mut quote: Option<u8> = None;
    for (idx, &b) in bytes.iter().enumerate().skip(1) {
        match quote {
            Some(q) => {
                if b == q {
                    quote = None;
                }
            }
            None => match b {
                b'"' | b'\'' => quote = Some(b),
                b'>' => return Some(idx),
                _ => {}
            },
        }
    }
    None
}

/// Lowercase tag name from the inside of a tag
fn tag_name(inner: &str) -> String {
    inner
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase()
}

/// Split a tag's inside into name and decoded attributes
fn parse_tag(inner: &str) -> (String, Vec<(String, String)>) {
    let name = tag_name(inner);
    let mut attrs = Vec::new();
    let rest = inner.trim_start();
    let rest = &rest[name.len().min(rest.len())..];

    let mut chars = rest.char_indices().peekable();
    while let Some(&(start, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        // Attribute name
        let mut end = start;
        while let Some(&(idx, c)) = chars.peek() {
            if c.is_whitespace() || c == '=' {
                break;
            }
            end = idx + c.len_utf8();
            chars.next();
        }
        let attr_name = rest[start..end].to_ascii_lowercase();
        // Skip whitespace before a possible '='
        while chars.peek().is_some_and(|&(_, c)| c.is_whitespace()) {
            chars.next();
        }
        let mut value = String::new();
        if chars.peek().is_some_and(|&(_, c)| c == '=') {
            chars.next();
            while chars.peek().is_some_and(|&(_, c)| c.is_whitespace()) {
                chars.next();
            }
            match chars.peek().copied() {
                Some((vstart, q)) if q == '"' || q == '\'' => {
                    chars.next();
                    let mut vend = vstart + 1;
                    for (idx, c) in chars.by_ref() {
                        if c == q {
                            break;
                        }
                        vend = idx + c.len_utf8();
                    }
                    value = rest[vstart + 1..vend].to_string();
                }
                Some((vstart, _)) => {
                    let mut vend = vstart;
                    while let Some(&(idx, c)) = chars.peek() {
                        if c.is_whitespace() {
                            break;
                        }
                        vend = idx + c.len_utf8();
                        chars.next();
                    }
                    value = rest[vstart..vend].to_string();
                }
                None => {}
            }
        }
        if !attr_name.is_empty() {
            attrs.push((attr_name, decode_entities(&value)));
        }
    }

    (name, attrs)
}

/// ASCII case-insensitive substring search
fn find_ci(haystack: &str, needle: &str) -> Option<usize> {
    let hay = haystack.as_bytes();
    let pat = needle.as_bytes();
    if pat.is_empty() || hay.len() < pat.len() {
        return None;
    }
    hay.windows(pat.len())
        .position(|window| window.eq_ignore_ascii_case(pat))
}

/// Decode HTML entities in a text run
pub fn decode_entities(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '&' {
            out.push(c);
            continue;
        }
        let mut entity = String::new();
        let mut terminated = false;
        while let Some(&next) = chars.peek() {
            if next == ';' {
                chars.next();
                terminated = true;
                break;
            }
            if next.is_whitespace() || next == '&' || entity.len() > 10 {
                break;
            }
            entity.push(chars.next().unwrap());
        }
        if !terminated {
            out.push('&');
            out.push_str(&entity);
            continue;
        }
        match entity.as_str() {
            "amp" => out.push('&'),
            "lt" => out.push('<'),
            "gt" => out.push('>'),
            "quot" => out.push('"'),
            "apos" => out.push('\''),
            "nbsp" => out.push(' '),
            "mdash" => out.push('—'),
            "ndash" => out.push('–'),
            "copy" => out.push('©'),
            "reg" => out.push('®'),
            _ => {
                if let Some(num) = entity.strip_prefix('#') {
                    let code = if let Some(hex) = num.strip_prefix('x').or(num.strip_prefix('X')) {
                        u32::from_str_radix(hex, 16).ok()
                    } else {
                        num.parse::<u32>().ok()
                    };
                    match code.and_then(char::from_u32) {
                        Some(ch) => out.push(ch),
                        None => {
                            out.push('&');
                            out.push_str(&entity);
                            out.push(';');
                        }
                    }
                } else {
                    out.push('&');
                    out.push_str(&entity);
                    out.push(';');
                }
            }
        }
    }

    out
}
