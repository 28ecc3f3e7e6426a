//! Assembly of retrieved chunks into a length-bounded context block.

use crate::document::SearchResult;

/// Separator placed between blocks; each block already ends in a newline,
/// so this leaves one blank line between them.
const BLOCK_SEPARATOR: &str = "\n";

/// Format one result as `[Source i: <source>]\n<content>\n`.
fn format_block(position: usize, result: &SearchResult) -> String {
    format!("[Source {position}: {}]\n{}\n", result.metadata.source_or_unknown(), result.content)
}

/// Format ranked results into a context block of at most `max_length` characters.
///
/// Results are taken in the given order and numbered by their 1-based
/// position in `results`. Blocks are appended while they fit; the first
/// block that would push the total past `max_length` ends assembly, even if
/// a later, shorter block would still fit. Lengths count characters, and
/// the separators between blocks count towards the limit.
pub fn build_context(results: &[SearchResult], max_length: usize) -> String {
    let mut context = String::new();
    let mut total = 0;

    for (i, result) in results.iter().enumerate() {
        let block = format_block(i + 1, result);
        let separator = if context.is_empty() { "" } else { BLOCK_SEPARATOR };
        let added = separator.chars().count() + block.chars().count();

        if total + added > max_length {
            break;
        }

        context.push_str(separator);
        context.push_str(&block);
        total += added;
    }

    context
}
