//! Discord message sizing
//!
//! Replies are split into Discord-sized messages without tearing a listing
//! entry in half: blank-line separated blocks are packed whole, oversized
//! blocks fall back to line splits, and oversized lines to character splits.
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.1.0: Keep blank-line separated blocks together for birthday listings
//! - 1.0.0: Line-aware chunking

/// Discord message content limit
pub const MESSAGE_LIMIT: usize = 2000;

const BLOCK_SEPARATOR: &str = "\n\n";

/// Split `text` into pieces of at most `limit` bytes (UTF-8 safe)
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    let text = text.trim_end();
    if text.is_empty() {
        return Vec::new();
    }
    if text.len() <= limit {
        return vec![text.to_string()];
    }

    let mut messages = Vec::new();
    let mut current = String::new();
    for block in text.split(BLOCK_SEPARATOR) {
        if block.len() > limit {
            finish(&mut messages, &mut current);
            messages.extend(split_block(block, limit));
        } else {
            pack(&mut messages, &mut current, block, BLOCK_SEPARATOR, limit);
        }
    }
    finish(&mut messages, &mut current);
    messages
}

/// Split text for a Discord message
pub fn chunk_for_message(text: &str) -> Vec<String> {
    split_message(text, MESSAGE_LIMIT)
}

fn split_block(block: &str, limit: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    for line in block.lines() {
        if line.len() > limit {
            finish(&mut pieces, &mut current);
            pieces.extend(split_line(line, limit));
        } else {
            pack(&mut pieces, &mut current, line, "\n", limit);
        }
    }
    finish(&mut pieces, &mut current);
    pieces
}

fn split_line(line: &str, limit: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    for ch in line.chars() {
        if current.len() + ch.len_utf8() > limit {
            finish(&mut pieces, &mut current);
        }
        current.push(ch);
    }
    finish(&mut pieces, &mut current);
    pieces
}

/// Append `piece` to `current`, starting a new message when it would overflow
fn pack(out: &mut Vec<String>, current: &mut String, piece: &str, separator: &str, limit: usize) {
    if !current.is_empty() && current.len() + separator.len() + piece.len() > limit {
        finish(out, current);
    }
    if !current.is_empty() {
        current.push_str(separator);
    }
    current.push_str(piece);
}

fn finish(out: &mut Vec<String>, current: &mut String) {
    let piece = std::mem::take(current);
    if !piece.trim().is_empty() {
        out.push(piece);
    }
}
