//! Speech bridge wrapping the browser's speech-to-text and
//! text-to-speech engines behind a small start/stop/speak/cancel
//! contract.
//!
//! Capability is decided once at construction: an absent engine means
//! the capability is off and callers branch on `can_listen()` /
//! `can_speak()` instead of null-checking at every call site. The bridge
//! owns the two UI-visible invariants: the recording indicator is always
//! cleared when recognition ends or errors, and at most one utterance is
//! speaking with no stale "speaking" indicator.

use thiserror::Error;

/// Recognition target locale.
const RECOGNITION_LANG: &str = "ar-SA";

/// Preferred synthesis locale, then language family.
const SYNTHESIS_LOCALE: &str = "ar-SA";
const SYNTHESIS_LANG_PREFIX: &str = "ar";

#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("capability not supported")]
    NotSupported,

    #[error("already recording")]
    AlreadyRecording,

    #[error("engine error: {0}")]
    Engine(String),
}

/// Recognition failure kinds, mapped to distinct user-facing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecognitionErrorKind {
    PermissionDenied,
    NoSpeech,
    CaptureFailed,
    Network,
    Other,
}

impl RecognitionErrorKind {
    /// The user-facing message for this failure.
    pub fn user_message(self) -> &'static str {
        match self {
            RecognitionErrorKind::PermissionDenied => {
                "تم رفض الوصول إلى الميكروفون. يرجى السماح للموقع بالوصول من إعدادات المتصفح."
            }
            RecognitionErrorKind::NoSpeech => "لم يتم الكشف عن صوت. يرجى التحدث بوضوح.",
            RecognitionErrorKind::CaptureFailed => {
                "فشل التقاط الصوت. تأكد من توصيل وعمل الميكروفون."
            }
            RecognitionErrorKind::Network => "مشكلة في الشبكة أثناء التعرف الصوتي.",
            RecognitionErrorKind::Other => "حدث خطأ في التعرف على الصوت.",
        }
    }
}

/// A synthesis voice as reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceInfo {
    pub name: String,
    /// BCP 47 language tag, e.g. "ar-SA".
    pub lang: String,
    /// Whether the platform flags this voice as its default.
    pub is_default: bool,
}

/// Speech-to-text engine boundary (the browser recognition API).
pub trait RecognitionEngine {
    /// Begin listening in the given locale.
    fn start(&mut self, lang: &str) -> Result<(), SpeechError>;

    /// Stop listening. The engine later signals end-of-recognition.
    fn stop(&mut self);
}

/// Text-to-speech engine boundary (the browser synthesis API).
pub trait SynthesisEngine {
    /// Voices currently available on the platform.
    fn voices(&self) -> Vec<VoiceInfo>;

    /// Speak the text with the chosen voice (platform default when None).
    fn speak(&mut self, text: &str, voice: Option<&VoiceInfo>) -> Result<(), SpeechError>;

    /// Cancel the current utterance immediately.
    fn cancel(&mut self);
}

/// Select a synthesis voice by the fixed preference order: exact target
/// locale, then same language family, then the platform default flag,
/// then the first available voice.
pub fn select_voice(voices: &[VoiceInfo]) -> Option<&VoiceInfo> {
    voices
        .iter()
        .find(|v| v.lang == SYNTHESIS_LOCALE)
        .or_else(|| voices.iter().find(|v| v.lang.starts_with(SYNTHESIS_LANG_PREFIX)))
        .or_else(|| voices.iter().find(|v| v.is_default))
        .or_else(|| voices.first())
}

/// The speech bridge.
///
/// Generic over the two engine traits; either may be absent when the
/// platform lacks the capability.
pub struct SpeechBridge<R: RecognitionEngine, S: SynthesisEngine> {
    recognizer: Option<R>,
    synthesizer: Option<S>,
    recording: bool,
    speaking: bool,
    input_buffer: String,
}

impl<R: RecognitionEngine, S: SynthesisEngine> SpeechBridge<R, S> {
    pub fn new(recognizer: Option<R>, synthesizer: Option<S>) -> Self {
        if recognizer.is_none() {
            tracing::debug!("Speech recognition not supported on this platform");
        }
        if synthesizer.is_none() {
            tracing::debug!("Speech synthesis not supported on this platform");
        }
        Self {
            recognizer,
            synthesizer,
            recording: false,
            speaking: false,
            input_buffer: String::new(),
        }
    }

    // --- Capabilities ---

    pub fn can_listen(&self) -> bool {
        self.recognizer.is_some()
    }

    pub fn can_speak(&self) -> bool {
        self.synthesizer.is_some()
    }

    // --- Speech-to-text ---

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// The input text accumulated from finalized transcript segments.
    pub fn input(&self) -> &str {
        &self.input_buffer
    }

    /// Take the accumulated input, clearing the buffer.
    pub fn take_input(&mut self) -> String {
        std::mem::take(&mut self.input_buffer)
    }

    /// Seed the buffer with the text already typed into the input field.
    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input_buffer = text.into();
    }

    /// Begin listening.
    pub fn start_listening(&mut self) -> Result<(), SpeechError> {
        let Some(recognizer) = self.recognizer.as_mut() else {
            return Err(SpeechError::NotSupported);
        };
        if self.recording {
            return Err(SpeechError::AlreadyRecording);
        }
        recognizer.start(RECOGNITION_LANG)?;
        self.recording = true;
        Ok(())
    }

    /// Stop listening. The recording flag is cleared when the engine
    /// signals the end, via [`Self::on_recognition_end`].
    pub fn stop_listening(&mut self) {
        if let Some(recognizer) = self.recognizer.as_mut() {
            recognizer.stop();
        }
    }

    /// A finalized transcript segment arrived.
    ///
    /// Appended to the existing input with a single separating space
    /// unless the input already ends in whitespace. Interim results are
    /// never delivered here, so the field never flickers.
    pub fn on_final_transcript(&mut self, segment: &str) {
        if segment.is_empty() {
            return;
        }
        if !self.input_buffer.is_empty()
            && !self.input_buffer.ends_with(|c: char| c.is_whitespace())
        {
            self.input_buffer.push(' ');
        }
        self.input_buffer.push_str(segment);
    }

    /// Recognition failed. Returns the user-facing message; the bridge
    /// is left in the not-recording state.
    pub fn on_recognition_error(&mut self, kind: RecognitionErrorKind) -> &'static str {
        self.recording = false;
        tracing::warn!(?kind, "Speech recognition error");
        kind.user_message()
    }

    /// Recognition ended, normally or otherwise. Always leaves the
    /// bridge in the not-recording state, even if `stop_listening` was
    /// never called.
    pub fn on_recognition_end(&mut self) {
        self.recording = false;
    }

    // --- Text-to-speech ---

    pub fn is_speaking(&self) -> bool {
        self.speaking
    }

    /// Speak the text, cancelling any current utterance first.
    pub fn speak(&mut self, text: &str) -> Result<(), SpeechError> {
        let Some(synthesizer) = self.synthesizer.as_mut() else {
            return Err(SpeechError::NotSupported);
        };

        if self.speaking {
            synthesizer.cancel();
            self.speaking = false;
        }

        let voices = synthesizer.voices();
        let voice = select_voice(&voices);
        match synthesizer.speak(text, voice) {
            Ok(()) => {
                self.speaking = true;
                Ok(())
            }
            Err(e) => {
                self.speaking = false;
                Err(e)
            }
        }
    }

    /// Cancel the current utterance immediately.
    pub fn stop_speaking(&mut self) {
        if let Some(synthesizer) = self.synthesizer.as_mut() {
            synthesizer.cancel();
        }
        self.speaking = false;
    }

    /// The current utterance finished or errored.
    pub fn on_speech_end(&mut self) {
        self.speaking = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    // --- Scripted fakes ---

    #[derive(Default)]
    struct FakeRecognizer {
        started: bool,
        fail_start: bool,
    }

    impl RecognitionEngine for FakeRecognizer {
        fn start(&mut self, lang: &str) -> Result<(), SpeechError> {
            assert_eq!(lang, "ar-SA");
            if self.fail_start {
                return Err(SpeechError::Engine("mic unavailable".to_string()));
            }
            self.started = true;
            Ok(())
        }

        fn stop(&mut self) {
            self.started = false;
        }
    }

    struct FakeSynthesizer {
        voices: Vec<VoiceInfo>,
        cancels: Arc<AtomicU32>,
        spoken: Vec<(String, Option<String>)>,
    }

    impl FakeSynthesizer {
        fn with_voices(voices: Vec<VoiceInfo>) -> Self {
            Self {
                voices,
                cancels: Arc::new(AtomicU32::new(0)),
                spoken: Vec::new(),
            }
        }
    }

    impl SynthesisEngine for FakeSynthesizer {
        fn voices(&self) -> Vec<VoiceInfo> {
            self.voices.clone()
        }

        fn speak(&mut self, text: &str, voice: Option<&VoiceInfo>) -> Result<(), SpeechError> {
            self.spoken
                .push((text.to_string(), voice.map(|v| v.name.clone())));
            Ok(())
        }

        fn cancel(&mut self) {
            self.cancels.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn voice(name: &str, lang: &str, is_default: bool) -> VoiceInfo {
        VoiceInfo {
            name: name.to_string(),
            lang: lang.to_string(),
            is_default,
        }
    }

    type TestBridge = SpeechBridge<FakeRecognizer, FakeSynthesizer>;

    // --- Capability model ---

    #[test]
    fn test_capabilities_decided_at_construction() {
        let bridge: TestBridge = SpeechBridge::new(None, None);
        assert!(!bridge.can_listen());
        assert!(!bridge.can_speak());

        let bridge: TestBridge =
            SpeechBridge::new(Some(FakeRecognizer::default()), None);
        assert!(bridge.can_listen());
        assert!(!bridge.can_speak());
    }

    #[test]
    fn test_unsupported_operations_fail_cleanly() {
        let mut bridge: TestBridge = SpeechBridge::new(None, None);
        assert!(matches!(
            bridge.start_listening(),
            Err(SpeechError::NotSupported)
        ));
        assert!(matches!(bridge.speak("مرحبا"), Err(SpeechError::NotSupported)));
        // stop calls are no-ops, never panics
        bridge.stop_listening();
        bridge.stop_speaking();
    }

    // --- Speech-to-text ---

    #[test]
    fn test_transcript_appended_with_single_space() {
        let mut bridge: TestBridge =
            SpeechBridge::new(Some(FakeRecognizer::default()), None);

        bridge.set_input("مرحبا");
        bridge.on_final_transcript("كيف حالك");
        assert_eq!(bridge.input(), "مرحبا كيف حالك");
    }

    #[test]
    fn test_transcript_no_extra_space_after_whitespace() {
        let mut bridge: TestBridge =
            SpeechBridge::new(Some(FakeRecognizer::default()), None);

        bridge.set_input("مرحبا ");
        bridge.on_final_transcript("بكم");
        assert_eq!(bridge.input(), "مرحبا بكم");

        let mut bridge: TestBridge =
            SpeechBridge::new(Some(FakeRecognizer::default()), None);
        bridge.on_final_transcript("أول");
        assert_eq!(bridge.input(), "أول");
    }

    #[test]
    fn test_double_start_rejected() {
        let mut bridge: TestBridge =
            SpeechBridge::new(Some(FakeRecognizer::default()), None);

        bridge.start_listening().unwrap();
        assert!(bridge.is_recording());
        assert!(matches!(
            bridge.start_listening(),
            Err(SpeechError::AlreadyRecording)
        ));
    }

    #[test]
    fn test_failed_start_leaves_not_recording() {
        let recognizer = FakeRecognizer {
            fail_start: true,
            ..Default::default()
        };
        let mut bridge: TestBridge = SpeechBridge::new(Some(recognizer), None);

        assert!(bridge.start_listening().is_err());
        assert!(!bridge.is_recording());
    }

    #[test]
    fn test_recognition_end_always_clears_recording() {
        let mut bridge: TestBridge =
            SpeechBridge::new(Some(FakeRecognizer::default()), None);

        bridge.start_listening().unwrap();
        // Engine ends on its own without an explicit stop call.
        bridge.on_recognition_end();
        assert!(!bridge.is_recording());
    }

    #[test]
    fn test_recognition_errors_map_to_distinct_messages() {
        let mut bridge: TestBridge =
            SpeechBridge::new(Some(FakeRecognizer::default()), None);
        bridge.start_listening().unwrap();

        let msg = bridge.on_recognition_error(RecognitionErrorKind::PermissionDenied);
        assert!(msg.contains("الميكروفون"));
        assert!(!bridge.is_recording());

        let messages: Vec<&str> = [
            RecognitionErrorKind::PermissionDenied,
            RecognitionErrorKind::NoSpeech,
            RecognitionErrorKind::CaptureFailed,
            RecognitionErrorKind::Network,
            RecognitionErrorKind::Other,
        ]
        .iter()
        .map(|kind| kind.user_message())
        .collect();
        let unique: std::collections::HashSet<_> = messages.iter().collect();
        assert_eq!(unique.len(), messages.len());
    }

    // --- Voice selection ---

    #[test]
    fn test_voice_preference_order() {
        let exact = voice("Laila", "ar-SA", false);
        let family = voice("Amira", "ar-EG", false);
        let default = voice("Daniel", "en-GB", true);
        let first = voice("Moira", "en-IE", false);

        let all = vec![first.clone(), default.clone(), family.clone(), exact.clone()];
        assert_eq!(select_voice(&all), Some(&all[3]));

        let no_exact = vec![first.clone(), default.clone(), family.clone()];
        assert_eq!(select_voice(&no_exact).unwrap().name, "Amira");

        let no_arabic = vec![first.clone(), default.clone()];
        assert_eq!(select_voice(&no_arabic).unwrap().name, "Daniel");

        let no_default = vec![first.clone()];
        assert_eq!(select_voice(&no_default).unwrap().name, "Moira");

        assert_eq!(select_voice(&[]), None);
    }

    // --- Text-to-speech ---

    #[test]
    fn test_speak_selects_arabic_voice() {
        let synthesizer = FakeSynthesizer::with_voices(vec![
            voice("Daniel", "en-GB", true),
            voice("Laila", "ar-SA", false),
        ]);
        let mut bridge: TestBridge = SpeechBridge::new(None, Some(synthesizer));

        bridge.speak("أهلاً").unwrap();
        assert!(bridge.is_speaking());
        let synthesizer = bridge.synthesizer.as_ref().unwrap();
        assert_eq!(synthesizer.spoken[0].1.as_deref(), Some("Laila"));
    }

    #[test]
    fn test_speak_cancels_previous_utterance() {
        let synthesizer = FakeSynthesizer::with_voices(vec![voice("Laila", "ar-SA", false)]);
        let cancels = synthesizer.cancels.clone();
        let mut bridge: TestBridge = SpeechBridge::new(None, Some(synthesizer));

        bridge.speak("الأولى").unwrap();
        bridge.speak("الثانية").unwrap();

        assert_eq!(cancels.load(Ordering::SeqCst), 1);
        assert!(bridge.is_speaking());
        assert_eq!(bridge.synthesizer.as_ref().unwrap().spoken.len(), 2);
    }

    #[test]
    fn test_no_stale_speaking_indicator() {
        let synthesizer = FakeSynthesizer::with_voices(vec![voice("Laila", "ar-SA", false)]);
        let mut bridge: TestBridge = SpeechBridge::new(None, Some(synthesizer));

        bridge.speak("نص").unwrap();
        bridge.on_speech_end();
        assert!(!bridge.is_speaking());

        bridge.speak("نص آخر").unwrap();
        bridge.stop_speaking();
        assert!(!bridge.is_speaking());
    }
}
