pub const DEFAULT_CHUNK_LINES: usize = 60;

/// Split lyrics into groups of at most `max_lines` lines, keeping order.
/// Text without lines comes back as a single chunk.
pub fn chunk_lyrics(lyrics: &str, max_lines: usize) -> Vec<String> {
    let max_lines = max_lines.max(1);
    let lines: Vec<&str> = lyrics.split('\n').collect();

    let chunks: Vec<String> = lines.chunks(max_lines).map(|c| c.join("\n")).collect();
    if chunks.is_empty() {
        vec![lyrics.to_string()]
    } else {
        chunks
    }
}
