/// Returns the index of the first occurrence of `needle` in `haystack`.
pub fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Splits `haystack` on every occurrence of `needle`, returning the pieces
/// between occurrences (excluding the needle itself).
pub fn split_on<'a>(haystack: &'a [u8], needle: &[u8]) -> Vec<&'a [u8]> {
    let mut result = Vec::new();
    let mut start = 0;
    while start <= haystack.len() {
        if let Some(pos) = find_subsequence(&haystack[start..], needle) {
            result.push(&haystack[start..start + pos]);
            start += pos + needle.len();
        } else {
            result.push(&haystack[start..]);
            break;
        }
    }
    result
}

/// Extracts the boundary token from a Content-Type header value like
/// `multipart/form-data; boundary=----WebKitFormBoundaryXXX`.
pub fn extract_boundary(content_type: &str) -> Option<String> {
    content_type
        .split(';')
        .map(|s| s.trim())
        .find(|s| s.starts_with("boundary="))
        .map(|s| s["boundary=".len()..].trim_matches('"').to_owned())
}

/// A file part of a multipart/form-data body.
#[derive(Debug, Clone, PartialEq)]
pub struct FilePart {
    pub bytes: Vec<u8>,
    /// The part's own `Content-Type`, or `application/octet-stream`.
    pub content_type: String,
    pub filename: Option<String>,
}

/// Extracts the file part named `field_name` from a multipart/form-data body.
/// Returns `None` if not found or on parse error.
pub fn extract_file_part(body: &[u8], boundary: &str, field_name: &str) -> Option<FilePart> {
    let delimiter = format!("--{}", boundary);
    let parts = split_on(body, delimiter.as_bytes());

    for part in parts {
        let sep = b"\r\n\r\n";
        if let Some(sep_pos) = find_subsequence(part, sep) {
            let header_section = &part[..sep_pos];
            let headers_str = String::from_utf8_lossy(header_section);
            let has_name     = parse_quoted(&headers_str, "; name=\"").as_deref() == Some(field_name);
            let has_filename = headers_str.contains("filename=");
            if has_name && has_filename {
                let data_start = sep_pos + sep.len();
                let raw = &part[data_start..];
                let trimmed = raw.strip_suffix(b"\r\n").unwrap_or(raw);
                return Some(FilePart {
                    bytes: trimmed.to_vec(),
                    content_type: parse_part_content_type(&headers_str)
                        .unwrap_or_else(|| "application/octet-stream".to_owned()),
                    filename: parse_quoted(&headers_str, "filename=\""),
                });
            }
        }
    }
    None
}

/// Parses the `Content-Type:` line of a part's header block.
fn parse_part_content_type(headers: &str) -> Option<String> {
    headers
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-type"))
        .map(|(_, value)| value.trim().to_owned())
}

/// Returns the text between `key` and the next `"`.
fn parse_quoted(headers: &str, key: &str) -> Option<String> {
    let pos = headers.find(key)?;
    let rest = &headers[pos + key.len()..];
    let end = rest.find('"')?;
    Some(rest[..end].to_owned())
}
