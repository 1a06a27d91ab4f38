use crate::prompt::Message;

/// Chat-format framing tokens charged per message.
const TOKENS_PER_MESSAGE: usize = 3;

/// Tokens that prime the assistant's reply.
const REPLY_PRIMING_TOKENS: usize = 3;

/// Maps text to a token count.
///
/// Chunk sizing and cost estimation must share one implementation so that
/// the two stay consistent.
pub trait TokenCounter {
    fn count(&self, text: &str) -> usize;

    /// Tokens for a whole request: framing per message, the role name and
    /// the content, plus reply priming.
    fn count_messages(&self, messages: &[Message]) -> usize {
        messages
            .iter()
            .map(|m| TOKENS_PER_MESSAGE + self.count(m.role.as_str()) + self.count(&m.content))
            .sum::<usize>()
            + REPLY_PRIMING_TOKENS
    }
}

/// Script-aware heuristic counter; no vocabulary needed.
///
/// ASCII and other alphabetic scripts at ~4 chars per token, CJK at ~2,
/// Arabic at ~5. Rounds up, so any non-empty text is at least one token.
#[derive(Debug, Clone, Copy, Default)]
pub struct EstimateTokenCounter;

impl TokenCounter for EstimateTokenCounter {
    fn count(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }

        if text.is_ascii() {
            return text.len().div_ceil(4);
        }

        let mut chars: usize = 0;
        let mut cjk: usize = 0;
        let mut arabic = 0;
        for c in text.chars() {
            chars += 1;
            if is_cjk_char(c) {
                cjk += 1;
            } else if is_arabic_char(c) {
                arabic += 1;
            }
        }

        if cjk > 0 {
            cjk.div_ceil(2) + (chars - cjk).div_ceil(4)
        } else if arabic > chars / 2 {
            chars.div_ceil(5)
        } else {
            chars.div_ceil(4)
        }
    }
}

#[inline]
fn is_cjk_char(c: char) -> bool {
    matches!(
        c as u32,
        0x4E00..=0x9FFF // CJK Unified Ideographs
        | 0x3040..=0x309F // Hiragana
        | 0x30A0..=0x30FF // Katakana
        | 0xAC00..=0xD7AF // Hangul
    )
}

#[inline]
fn is_arabic_char(c: char) -> bool {
    matches!(
        c as u32,
        0x0600..=0x06FF | 0x0750..=0x077F | 0x08A0..=0x08FF | 0xFB50..=0xFDFF | 0xFE70..=0xFEFF
    )
}
