//! Predefined-response matcher.
//!
//! Intercepts common canned queries before any network call. Both the
//! stored keys and the input are normalized (lowercase, punctuation and
//! diacritic runs collapsed to single spaces, interchangeable Arabic
//! letter variants unified) and compared for exact equality or a
//! key-plus-word-boundary prefix. First matching key in table order wins.
//!
//! Pure: no network or persistence side effects.

/// Fixed reply table, checked in order.
const PREDEFINED_RESPONSES: &[(&str, &str)] = &[
    // Greetings & basic interaction
    (
        "السلام عليكم",
        "وعليكم السلام ورحمة الله وبركاته! كيف يمكنني خدمتك اليوم؟",
    ),
    ("اهلا", "أهلاً بك! أنا هنا لمساعدتك."),
    ("مرحبا", "مرحباً! بماذا يمكنني أن أخدمك؟"),
    ("صباح الخير", "صباح النور والسرور!"),
    ("مساء الخير", "مساء النور! كيف يمكنني المساعدة؟"),
    (
        "كيف حالك",
        "أنا بخير حال، شكراً لسؤالك! كيف يمكنني مساعدتك اليوم؟",
    ),
    ("شكرا", "على الرحب والسعة! يسعدني تقديم المساعدة."),
    (
        "شكرا لك",
        "لا شكر على واجب. هل هناك أي شيء آخر يمكنني المساعدة به؟",
    ),
    ("عفوا", "أهلاً بك."),
    ("مع السلامة", "إلى اللقاء! أتمنى لك يوماً سعيداً."),
    ("وداعا", "في أمان الله."),
    // About the assistant
    (
        "من انت",
        "أنا ياسمين، مساعدة رقمية تجيب على استفساراتك وتساعدك في تنفيذ بعض المهام.",
    ),
    ("ما اسمك", "يمكنك مناداتي ياسمين."),
    (
        "من صنعك",
        "تم تطويري وبرمجتي بواسطة فريق المطورين في ياسمين.",
    ),
    (
        "من طورك",
        "تم تطويري وبرمجتي بواسطة فريق المطورين في ياسمين.",
    ),
    (
        "ماذا يمكنك ان تفعل",
        "يمكنني الإجابة على مجموعة واسعة من الأسئلة، المساعدة في كتابة النصوص، تقديم المعلومات العامة، وشرح المفاهيم التقنية. جرب أن تسألني شيئاً!",
    ),
    (
        "ما هي قدراتك",
        "أستطيع فهم اللغة العربية والإنجليزية، إنشاء محتوى نصي، والإجابة على استفساراتك العامة. قدراتي تعتمد على النموذج اللغوي الذي تم اختياره في الإعدادات.",
    ),
    // Common questions
    (
        "ما هو الوقت",
        "أنا آسفة، ليس لدي وصول مباشر للوقت الحالي. يمكنك التحقق من ساعة جهازك.",
    ),
    (
        "ما هو تاريخ اليوم",
        "أعتذر، لا يمكنني الوصول إلى التاريخ الحالي بشكل مباشر. يرجى التحقق من تقويم جهازك.",
    ),
    (
        "احكي لي نكتة",
        "مرة مهندس برمجيات قابل لمبة، قالها: إنتي منورة النهاردة ليه؟ قالتله: عشان عاملة update!",
    ),
    (
        "ما هو الذكاء الاصطناعي",
        "الذكاء الاصطناعي (AI) هو فرع من علوم الحاسوب يهدف إلى إنشاء أنظمة قادرة على أداء مهام تتطلب عادةً ذكاءً بشرياً، مثل التعلم، حل المشكلات، فهم اللغة، واتخاذ القرارات.",
    ),
];

/// Separator characters collapsed to a single space: question/exclamation
/// marks (both scripts), commas, periods, and whitespace.
fn is_separator(c: char) -> bool {
    c.is_whitespace() || matches!(c, '?' | '؟' | '!' | ',' | '.')
}

/// Characters removed outright: Arabic diacritics (U+064B..=U+065F) and
/// tatweel (U+0640). Stripping rather than collapsing keeps vocalized
/// words intact.
fn is_stripped(c: char) -> bool {
    ('\u{064B}'..='\u{065F}').contains(&c) || c == '\u{0640}'
}

/// Normalize text for comparison: lowercase, strip diacritics, collapse
/// separator runs to single spaces, trim, unify interchangeable Arabic
/// letter variants.
fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;

    for c in text.to_lowercase().chars() {
        if is_stripped(c) {
            continue;
        }
        if is_separator(c) {
            pending_space = !out.is_empty();
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        out.push(match c {
            'أ' | 'إ' | 'آ' => 'ا',
            'ى' => 'ي',
            'ة' => 'ه',
            other => other,
        });
    }

    out
}

/// Look up a canned reply for the given user text.
///
/// Returns the first matching key's reply, or `None` when no key matches
/// exactly or as a word-boundary prefix. Very short keys (under three
/// characters) never match as prefixes.
pub fn match_reply(user_text: &str) -> Option<&'static str> {
    let normalized = normalize(user_text);
    if normalized.is_empty() {
        return None;
    }

    for (key, reply) in PREDEFINED_RESPONSES {
        let normalized_key = normalize(key);
        if normalized == normalized_key {
            return Some(reply);
        }
        if normalized_key.chars().count() > 2
            && normalized.starts_with(&format!("{normalized_key} "))
        {
            return Some(reply);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        let reply = match_reply("السلام عليكم").unwrap();
        assert!(reply.contains("وعليكم السلام"));
    }

    #[test]
    fn test_whitespace_and_punctuation_normalized() {
        let clean = match_reply("السلام عليكم").unwrap();
        let messy = match_reply(" السلام   عليكم؟ ").unwrap();
        assert_eq!(clean, messy);
    }

    #[test]
    fn test_key_embedded_in_longer_word_does_not_match() {
        assert!(match_reply("السلامي عليكم غريب").is_none());
    }

    #[test]
    fn test_prefix_with_word_boundary_matches() {
        let reply = match_reply("السلام عليكم ورحمة الله").unwrap();
        assert!(reply.contains("وعليكم السلام"));
    }

    #[test]
    fn test_alif_variants_unified() {
        // "أهلا" with hamza matches the key stored as "اهلا".
        let reply = match_reply("أهلا").unwrap();
        assert!(reply.contains("أهلاً بك"));
    }

    #[test]
    fn test_teh_marbuta_unified() {
        // "نكته" and "نكتة" normalize identically.
        assert_eq!(match_reply("احكي لي نكته"), match_reply("احكي لي نكتة"));
        assert!(match_reply("احكي لي نكتة").is_some());
    }

    #[test]
    fn test_diacritics_stripped() {
        // Fully vocalized greeting still matches.
        assert!(match_reply("مَرْحَبًا").is_some());
    }

    #[test]
    fn test_table_order_wins() {
        // "شكرا لك" starts with the earlier key "شكرا" plus a word
        // boundary, so the first table entry answers.
        let reply = match_reply("شكرا لك").unwrap();
        assert!(reply.contains("على الرحب والسعة"));
    }

    #[test]
    fn test_unknown_text_no_match() {
        assert!(match_reply("اشرح لي نظرية النسبية").is_none());
        assert!(match_reply("").is_none());
        assert!(match_reply("   ").is_none());
    }

    #[test]
    fn test_normalize_collapses_runs() {
        assert_eq!(normalize("  كيف   حالك؟؟ "), "كيف حالك");
        assert_eq!(normalize("ما هو الوقت."), "ما هو الوقت");
    }
}
