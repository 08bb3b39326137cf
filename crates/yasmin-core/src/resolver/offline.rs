//! Offline canned replies -- the terminal tier of the fallback chain.
//!
//! When both providers fail, the latest user message is looked up in a
//! small fixed table; an unmatched message gets the generic apology.
//! This tier never fails.

/// Fixed offline replies keyed by common Arabic phrases.
///
/// Keys are compared against the trimmed, lowercased latest user
/// message. This backend-side table is intentionally smaller than the
/// client's predefined-response table: it only covers the phrases worth
/// answering when every provider is unreachable.
const OFFLINE_REPLIES: &[(&str, &str)] = &[
    (
        "السلام عليكم",
        "وعليكم السلام! أنا ياسمين. للأسف، لا يوجد اتصال بالإنترنت حاليًا.",
    ),
    (
        "كيف حالك",
        "أنا بخير شكراً لك. لكن لا يمكنني الوصول للنماذج الذكية الآن بسبب انقطاع الإنترنت.",
    ),
    (
        "مرحبا",
        "أهلاً بك! أنا ياسمين. أعتذر، خدمة الإنترنت غير متوفرة حاليًا.",
    ),
    ("شكرا", "على الرحب والسعة! أتمنى أن يعود الاتصال قريباً."),
    (
        "مع السلامة",
        "إلى اللقاء! آمل أن أتمكن من مساعدتك بشكل أفضل عند عودة الإنترنت.",
    ),
];

/// Reply used when no offline key matches.
const DEFAULT_OFFLINE_REPLY: &str =
    "أعتذر، لا يمكنني معالجة طلبك الآن. يبدو أن هناك مشكلة في الاتصال بالإنترنت.";

/// Lookup table for offline canned replies.
#[derive(Debug, Default)]
pub struct OfflineReplies;

impl OfflineReplies {
    pub fn new() -> Self {
        Self
    }

    /// Resolve the latest user message to a canned reply.
    ///
    /// Exact match on the trimmed, lowercased message; falls back to the
    /// generic apology. Never fails.
    pub fn reply_for(&self, latest_user_message: &str) -> &'static str {
        let normalized = latest_user_message.trim().to_lowercase();
        OFFLINE_REPLIES
            .iter()
            .find(|(key, _)| *key == normalized)
            .map(|(_, reply)| *reply)
            .unwrap_or(DEFAULT_OFFLINE_REPLY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_phrase_gets_its_reply() {
        let offline = OfflineReplies::new();
        let reply = offline.reply_for("السلام عليكم");
        assert!(reply.contains("وعليكم السلام"));
    }

    #[test]
    fn test_trims_surrounding_whitespace() {
        let offline = OfflineReplies::new();
        assert_eq!(
            offline.reply_for("  مرحبا  "),
            offline.reply_for("مرحبا")
        );
    }

    #[test]
    fn test_unknown_phrase_gets_default() {
        let offline = OfflineReplies::new();
        let reply = offline.reply_for("اشرح لي الحوسبة الكمية");
        assert_eq!(reply, DEFAULT_OFFLINE_REPLY);
    }

    #[test]
    fn test_empty_message_gets_default() {
        let offline = OfflineReplies::new();
        assert_eq!(offline.reply_for(""), DEFAULT_OFFLINE_REPLY);
    }
}
