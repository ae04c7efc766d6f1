//! Splitting the engine's stdout into documents.
//!
//! In streaming mode the engine writes one document per request into a single
//! unbounded stream. [`FrameDecoder`] accumulates raw bytes as they arrive and
//! yields each completed document, either at a delimiter line the engine was
//! asked to print (`-pipedelimitor`) or right after the closing marker of the
//! document.

use crate::config::EngineConfig;
use memchr::memmem;
use serde::{Deserialize, Serialize};

/// Closing-document marker of SVG output
pub const SVG_CLOSING_MARKER: &str = "</svg>";

/// How document boundaries are recognised, as named in configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FramingMode {
    /// The engine prints a delimiter line after every document
    #[default]
    Delimiter,
    /// A document ends at its closing marker
    ClosingMarker,
}

/// Resolved framing rule with its token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Framing {
    Delimiter(String),
    ClosingMarker(String),
}

impl Framing {
    pub fn from_config(config: &EngineConfig) -> Self {
        match config.framing {
            FramingMode::Delimiter => Self::Delimiter(config.delimiter.clone()),
            FramingMode::ClosingMarker => Self::ClosingMarker(SVG_CLOSING_MARKER.to_string()),
        }
    }

    /// The delimiter the engine must be told to print, if any
    pub fn pipe_delimiter(&self) -> Option<&str> {
        match self {
            Self::Delimiter(delimiter) => Some(delimiter),
            Self::ClosingMarker(_) => None,
        }
    }

    fn token(&self) -> &[u8] {
        match self {
            Self::Delimiter(token) | Self::ClosingMarker(token) => token.as_bytes(),
        }
    }
}

/// Incremental document splitter fed with stdout chunks
#[derive(Debug)]
pub struct FrameDecoder {
    framing: Framing,
    buffer: Vec<u8>,
    /// Offset before which the token is known not to start
    scan_from: usize,
}

impl FrameDecoder {
    pub fn new(framing: Framing) -> Self {
        Self {
            framing,
            buffer: Vec::new(),
            scan_from: 0,
        }
    }

    /// Append a chunk and return every document it completed, in order.
    ///
    /// Documents are trimmed of surrounding whitespace. In delimiter mode the
    /// delimiter must end its line and start either a line or right after a
    /// tag's `>`; it is not part of the document. In marker mode the marker
    /// is kept as the document's tail.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut documents = Vec::new();
        while let Some(document) = self.next_document() {
            documents.push(document);
        }
        documents
    }

    /// Bytes received but not yet part of a completed document
    pub fn pending_len(&self) -> usize {
        self.buffer.len()
    }

    fn next_document(&mut self) -> Option<String> {
        let token_len = self.framing.token().len();
        let finder = memmem::Finder::new(self.framing.token());

        loop {
            let Some(found) = finder.find(&self.buffer[self.scan_from..]) else {
                // Keep the tail that could still begin a split token.
                self.scan_from = self.buffer.len().saturating_sub(token_len.saturating_sub(1));
                return None;
            };
            let start = self.scan_from + found;

            match self.framing {
                Framing::Delimiter(_) => {
                    let after = start + token_len;
                    let line_end = match &self.buffer[after..] {
                        [b'\n', ..] => 1,
                        [b'\r', b'\n', ..] => 2,
                        [] | [b'\r'] => {
                            // Wait for the rest of the line.
                            self.scan_from = start;
                            return None;
                        }
                        _ => 0,
                    };
                    // The engine prints the delimiter right after the image,
                    // so it may follow the closing `>` on the same line.
                    let bounded = start == 0 || matches!(self.buffer[start - 1], b'\n' | b'>');
                    if line_end == 0 || !bounded {
                        self.scan_from = start + 1;
                        continue;
                    }
                    let document = decode(&self.buffer[..start]);
                    self.buffer.drain(..after + line_end);
                    self.scan_from = 0;
                    return Some(document);
                }
                Framing::ClosingMarker(_) => {
                    let end = start + token_len;
                    let document = decode(&self.buffer[..end]);
                    self.buffer.drain(..end);
                    self.scan_from = 0;
                    return Some(document);
                }
            }
        }
    }
}

fn decode(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const DELIM: &str = "__END__";

    fn delimiter_decoder() -> FrameDecoder {
        FrameDecoder::new(Framing::Delimiter(DELIM.to_string()))
    }

    fn marker_decoder() -> FrameDecoder {
        FrameDecoder::new(Framing::ClosingMarker(SVG_CLOSING_MARKER.to_string()))
    }

    #[test]
    fn delimiter_mode_splits_on_delimiter_lines() {
        let mut decoder = delimiter_decoder();
        let docs = decoder.push(b"<svg>a</svg>\n__END__\n<svg>b</svg>\n__END__\n");
        assert_eq!(docs, vec!["<svg>a</svg>", "<svg>b</svg>"]);
        assert_eq!(decoder.pending_len(), 0);
    }

    #[test]
    fn delimiter_directly_after_closing_tag_ends_the_document() {
        let mut decoder = delimiter_decoder();
        let docs = decoder.push(b"<?xml?><svg>a</svg>__END__\n<?xml?><svg>b</svg>__END__\r\n");
        assert_eq!(docs, vec!["<?xml?><svg>a</svg>", "<?xml?><svg>b</svg>"]);
        assert_eq!(decoder.pending_len(), 0);
    }

    #[test]
    fn delimiter_waits_for_its_line_end() {
        let mut decoder = delimiter_decoder();
        assert!(decoder.push(b"<svg>a</svg>__END__").is_empty());
        assert!(decoder.push(b"\r").is_empty());
        assert_eq!(decoder.push(b"\n"), vec!["<svg>a</svg>"]);
    }

    #[test]
    fn delimiter_followed_by_text_is_content() {
        let mut decoder = delimiter_decoder();
        let docs = decoder.push(b"<svg><text>__END__more</text></svg>__END__\n");
        assert_eq!(docs, vec!["<svg><text>__END__more</text></svg>"]);
    }

    #[test]
    fn delimiter_inside_a_line_is_content() {
        let mut decoder = delimiter_decoder();
        let docs = decoder.push(b"<text>x__END__</text>\n__END__\n");
        assert_eq!(docs, vec!["<text>x__END__</text>"]);
    }

    #[test]
    fn empty_document_still_counts() {
        let mut decoder = delimiter_decoder();
        assert_eq!(decoder.push(b"__END__\n"), vec![String::new()]);
    }

    #[test]
    fn marker_mode_keeps_marker_and_splits_after_it() {
        let mut decoder = marker_decoder();
        let docs = decoder.push(b"<?xml?><svg>one</svg>\n<svg>tw");
        assert_eq!(docs, vec!["<?xml?><svg>one</svg>"]);

        let docs = decoder.push(b"o</svg>");
        assert_eq!(docs, vec!["<svg>two</svg>"]);
        assert_eq!(decoder.pending_len(), 0);
    }

    #[test]
    fn marker_split_across_chunks_is_found() {
        let mut decoder = marker_decoder();
        assert!(decoder.push(b"<svg>x</s").is_empty());
        assert!(decoder.push(b"v").is_empty());
        assert_eq!(decoder.push(b"g>"), vec!["<svg>x</svg>"]);
    }

    #[test]
    fn incomplete_document_is_held_back() {
        let mut decoder = marker_decoder();
        assert!(decoder.push(b"<svg><text>waiting").is_empty());
        assert_eq!(decoder.pending_len(), 18);
    }

    #[test]
    fn multibyte_text_split_mid_character_survives() {
        let text = "<svg>步骤一</svg>".as_bytes();
        let mut decoder = marker_decoder();
        assert!(decoder.push(&text[..7]).is_empty());
        assert_eq!(decoder.push(&text[7..]), vec!["<svg>步骤一</svg>"]);
    }

    #[test]
    fn pipe_delimiter_only_in_delimiter_mode() {
        assert_eq!(
            Framing::Delimiter(DELIM.to_string()).pipe_delimiter(),
            Some(DELIM)
        );
        assert_eq!(
            Framing::ClosingMarker(SVG_CLOSING_MARKER.to_string()).pipe_delimiter(),
            None
        );
    }

    fn stream() -> &'static str {
        "<svg>first</svg>__END__\n\n<svg>x__END__y</svg>\n__END__\n<svg>third</svg>__END__\r\n"
    }

    proptest! {
        #[test]
        fn delimiter_decoding_ignores_chunk_boundaries(cuts in proptest::collection::vec(0usize..80, 0..8)) {
            let bytes = stream().as_bytes();
            let mut cuts: Vec<usize> = cuts.into_iter().map(|c| c.min(bytes.len())).collect();
            cuts.sort_unstable();

            let mut decoder = delimiter_decoder();
            let mut docs = Vec::new();
            let mut last = 0;
            for cut in cuts.into_iter().chain(std::iter::once(bytes.len())) {
                docs.extend(decoder.push(&bytes[last..cut]));
                last = cut;
            }

            prop_assert_eq!(docs, vec!["<svg>first</svg>", "<svg>x__END__y</svg>", "<svg>third</svg>"]);
        }

        #[test]
        fn marker_documents_hold_exactly_one_marker(cuts in proptest::collection::vec(0usize..60, 0..8)) {
            let bytes = "<svg>a</svg>\n<svg>b</svg><svg>c</svg>\n".as_bytes();
            let mut cuts: Vec<usize> = cuts.into_iter().map(|c| c.min(bytes.len())).collect();
            cuts.sort_unstable();

            let mut decoder = marker_decoder();
            let mut docs = Vec::new();
            let mut last = 0;
            for cut in cuts.into_iter().chain(std::iter::once(bytes.len())) {
                docs.extend(decoder.push(&bytes[last..cut]));
                last = cut;
            }

            prop_assert_eq!(docs.len(), 3);
            for doc in &docs {
                prop_assert_eq!(doc.matches(SVG_CLOSING_MARKER).count(), 1);
            }
        }
    }
}
