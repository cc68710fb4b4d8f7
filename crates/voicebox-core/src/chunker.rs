//! Sentence-respecting text chunker.
//!
//! Sentences end at `.`, `!` or `?` followed by whitespace. Sentences are
//! packed greedily into chunks of at most `max_size` characters; a sentence
//! longer than that becomes its own oversized chunk. Only input with no
//! sentence punctuation anywhere is cut mid-sentence, at the last whitespace
//! that fits.
//!
//! Lengths are counted in characters, not bytes.

const SENTENCE_END: [char; 3] = ['.', '!', '?'];

/// Split `text` into sentences at punctuation followed by whitespace
///
/// The whitespace run at each boundary is dropped. Returned slices borrow
/// from `text`.
#[must_use]
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        if !SENTENCE_END.contains(&ch) {
            continue;
        }
        if !matches!(chars.peek(), Some((_, next)) if next.is_whitespace()) {
            continue;
        }

        let end = idx + ch.len_utf8();
        sentences.push(&text[start..end]);

        // consume the whole whitespace run
        start = text.len();
        while let Some(&(ws_idx, ws)) = chars.peek() {
            if !ws.is_whitespace() {
                start = ws_idx;
                break;
            }
            chars.next();
        }
    }

    if start < text.len() {
        sentences.push(&text[start..]);
    }
    sentences
}

/// Split `text` into ordered, non-empty chunks of at most `max_size` chars
///
/// A `max_size` of zero is treated as one.
#[must_use]
pub fn chunk(text: &str, max_size: usize) -> Vec<String> {
    let max_size = max_size.max(1);
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }

    let sentences: Vec<&str> = split_sentences(text)
        .into_iter()
        .map(str::trim)
        .filter(|sentence| !sentence.is_empty())
        .collect();

    if !text.contains(&SENTENCE_END[..]) && char_len(text) > max_size {
        return split_by_length(text, max_size);
    }

    pack_sentences(&sentences, max_size)
}

fn pack_sentences(sentences: &[&str], max_size: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for sentence in sentences {
        let sentence_len = char_len(sentence);
        if !current.is_empty() && current_len + sentence_len + 1 > max_size {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if !current.is_empty() {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(sentence);
        current_len += sentence_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

fn split_by_length(text: &str, max_size: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut rest = text;

    while !rest.is_empty() {
        if char_len(rest) <= max_size {
            chunks.push(rest.to_string());
            break;
        }

        let cut = cut_point(rest, max_size);
        let head = rest[..cut].trim();
        if !head.is_empty() {
            chunks.push(head.to_string());
        }
        rest = rest[cut..].trim_start();
    }
    chunks
}

/// Byte offset of the last whitespace within the first `max_size + 1`
/// chars, or of char `max_size` when there is none
fn cut_point(text: &str, max_size: usize) -> usize {
    let mut hard_cut = text.len();
    let mut last_space = None;

    for (count, (idx, ch)) in text.char_indices().enumerate() {
        if count == max_size {
            hard_cut = idx;
        }
        if count > max_size {
            break;
        }
        if ch.is_whitespace() && idx > 0 {
            last_space = Some(idx);
        }
    }

    last_space.unwrap_or(hard_cut)
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}
