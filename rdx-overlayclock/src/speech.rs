//! The text-to-speech side-channel fed by new messages.
//!
//! The store only sees a [`Notifier`]. The production notifier is a
//! [`SpeechQueue`]: an unbounded channel drained in FIFO order by a
//! [`SpeechWorker`] task, which hands each line to a [`Speaker`]. Speaking
//! happens entirely outside the store's lock, and a failing speaker is logged
//! and skipped.

use crate::config::SpeechConfig;
use std::fmt::Debug;
use std::future::Future;
use std::process::Stdio;
use std::sync::Arc;
use thiserror::Error;
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use whatlang::Lang;

/// Receives message text from the store. Must not block and must not fail.
pub trait Notifier: Send + Sync + Debug {
    fn notify(&self, text: &str);
}

/// A notifier that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _text: &str) {}
}

#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("failed to launch `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{command}` exited with {status}: {stderr}")]
    Exited {
        command: String,
        status: std::process::ExitStatus,
        stderr: String,
    },
}

/// Something that can say a line of text out loud.
pub trait Speaker: Send + 'static {
    fn speak(&mut self, text: &str) -> impl Future<Output = Result<(), SpeechError>> + Send;
}

/// Runs an external synthesizer (e.g. `espeak-ng`) once per line.
#[derive(Debug, Clone)]
pub struct CommandSpeaker {
    command: String,
    args: Vec<String>,
    language: String,
    detect_language: bool,
}

impl CommandSpeaker {
    pub fn new(config: &SpeechConfig) -> Self {
        Self {
            command: config.command.clone(),
            args: config.args.clone(),
            language: config.language.clone(),
            detect_language: config.detect_language,
        }
    }

    /// The voice for `text`: the detected language, or the configured one.
    fn language_for(&self, text: &str) -> &str {
        if self.detect_language {
            if let Some(code) = detect_language(text) {
                return code;
            }
        }
        &self.language
    }

    /// Expands `{language}` and `{text}` in the configured argument list.
    fn render_args(&self, text: &str) -> Vec<String> {
        let language = self.language_for(text);
        debug!(language, "Rendering synthesizer arguments.");
        self.args
            .iter()
            .map(|arg| arg.replace("{language}", language).replace("{text}", text))
            .collect()
    }
}

/// Detects the language of `text` as an `espeak-ng` voice name.
///
/// Returns `None` when the detector is unsure or the language has no mapped voice.
pub fn detect_language(text: &str) -> Option<&'static str> {
    let info = whatlang::detect(text)?;
    if !info.is_reliable() {
        return None;
    }
    let voice = match info.lang() {
        Lang::Eng => "en",
        Lang::Fra => "fr",
        Lang::Deu => "de",
        Lang::Spa => "es",
        Lang::Ita => "it",
        Lang::Por => "pt",
        Lang::Nld => "nl",
        Lang::Pol => "pl",
        Lang::Ces => "cs",
        Lang::Swe => "sv",
        Lang::Dan => "da",
        Lang::Nob => "nb",
        Lang::Fin => "fi",
        Lang::Tur => "tr",
        Lang::Rus => "ru",
        Lang::Ukr => "uk",
        Lang::Jpn => "ja",
        Lang::Cmn => "cmn",
        _ => return None,
    };
    Some(voice)
}

impl Speaker for CommandSpeaker {
    async fn speak(&mut self, text: &str) -> Result<(), SpeechError> {
        let output = Command::new(&self.command)
            .args(self.render_args(text))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| SpeechError::Spawn {
                command: self.command.clone(),
                source,
            })?;
        if !output.status.success() {
            return Err(SpeechError::Exited {
                command: self.command.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

/// Logs each line instead of speaking it. Used when speech is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSpeaker;

impl Speaker for LogSpeaker {
    async fn speak(&mut self, text: &str) -> Result<(), SpeechError> {
        info!(text, "Speech disabled, not speaking message.");
        Ok(())
    }
}

/// The sending half of the speech queue. Cheap to clone.
#[derive(Debug, Clone)]
pub struct SpeechQueue {
    sender: mpsc::UnboundedSender<String>,
}

impl SpeechQueue {
    /// Creates the queue and spawns its worker on the current Tokio runtime.
    ///
    /// The worker exits once every clone of the returned queue is dropped.
    pub fn spawn<S: Speaker>(speaker: S) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let worker = SpeechWorker { receiver, speaker };
        let handle = tokio::spawn(worker.run());
        (Self { sender }, handle)
    }

    /// Spawns the speaker the configuration asks for and returns it as a notifier.
    pub fn from_config(config: &SpeechConfig) -> (Arc<dyn Notifier>, JoinHandle<()>) {
        let (queue, handle) = if config.enabled {
            info!(command = %config.command, language = %config.language, "Speech enabled.");
            Self::spawn(CommandSpeaker::new(config))
        } else {
            Self::spawn(LogSpeaker)
        };
        let notifier: Arc<dyn Notifier> = Arc::new(queue);
        (notifier, handle)
    }
}

impl Notifier for SpeechQueue {
    fn notify(&self, text: &str) {
        let cleaned = clean_text(text);
        if cleaned.is_empty() {
            return;
        }
        if self.sender.send(cleaned).is_err() {
            warn!("Speech worker has stopped; dropping message.");
        }
    }
}

/// Drains the speech queue one line at a time.
struct SpeechWorker<S> {
    receiver: mpsc::UnboundedReceiver<String>,
    speaker: S,
}

impl<S: Speaker> SpeechWorker<S> {
    async fn run(mut self) {
        debug!("Speech worker started.");
        while let Some(text) = self.receiver.recv().await {
            if let Err(e) = self.speaker.speak(&text).await {
                warn!(error = %e, "Failed to speak message.");
            }
        }
        debug!("Speech worker stopped.");
    }
}

/// Emoji and pictographs that synthesizers would read out as noise.
fn is_pictograph(c: char) -> bool {
    matches!(
        c as u32,
        0x1F600..=0x1F64F // emoticons
            | 0x1F300..=0x1F5FF // symbols & pictographs
            | 0x1F680..=0x1F6FF // transport & map
            | 0x1F1E0..=0x1F1FF // flags
            | 0x1F900..=0x1FAFF // supplemental symbols
            | 0x2600..=0x27BF // misc symbols & dingbats
            | 0xFE0F // variation selector
            | 0x200D // zero-width joiner
    )
}

/// Strips pictographs and collapses runs of whitespace.
pub fn clean_text(text: &str) -> String {
    let stripped: String = text.chars().filter(|c| !is_pictograph(*c)).collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records every line and fails on the word "boom".
    struct RecordingSpeaker {
        spoken: Arc<Mutex<Vec<String>>>,
    }

    impl Speaker for RecordingSpeaker {
        async fn speak(&mut self, text: &str) -> Result<(), SpeechError> {
            self.spoken.lock().unwrap().push(text.to_string());
            if text == "boom" {
                return Err(SpeechError::Spawn {
                    command: "test".into(),
                    source: std::io::Error::other("boom"),
                });
            }
            Ok(())
        }
    }

    #[test]
    fn clean_text_strips_emoji_and_spacing() {
        assert_eq!(clean_text("  Hello 🎉  world ⚡ "), "Hello world");
        assert_eq!(clean_text("🎉🎉"), "");
        assert_eq!(clean_text("Grüße, ça va?"), "Grüße, ça va?");
    }

    fn fixed_voice_speaker() -> CommandSpeaker {
        CommandSpeaker::new(&SpeechConfig {
            detect_language: false,
            ..SpeechConfig::default()
        })
    }

    #[test]
    fn command_args_are_rendered() {
        let speaker = fixed_voice_speaker();
        assert_eq!(speaker.render_args("salut"), vec!["-v", "fr", "--", "salut"]);
    }

    #[test]
    fn dashed_text_is_never_an_option() {
        let speaker = fixed_voice_speaker();
        let args = speaker.render_args("-w/tmp/x.wav hello");
        assert_eq!(args, vec!["-v", "fr", "--", "-w/tmp/x.wav hello"]);
        assert_eq!(
            speaker.render_args("-5 minutes left").last().map(String::as_str),
            Some("-5 minutes left")
        );
    }

    #[test]
    fn voice_follows_detected_language() {
        let speaker = CommandSpeaker::new(&SpeechConfig::default());
        let german = "Vielen Dank für den Follow, wir sehen uns morgen wieder hier im Stream mit \
                      neuen Spielen und guter Laune.";
        assert_eq!(speaker.render_args(german)[1], "de");
        let english = "Thank you so much for the follow, we will see you again tomorrow here \
                       on the stream with new games and a lot of fun.";
        assert_eq!(speaker.render_args(english)[1], "en");
    }

    #[test]
    fn unsure_detection_falls_back_to_configured_voice() {
        assert_eq!(detect_language(""), None);
        let speaker = CommandSpeaker::new(&SpeechConfig {
            language: "it".into(),
            ..SpeechConfig::default()
        });
        assert_eq!(speaker.render_args("42")[1], "it");
        let german = "Vielen Dank für den Follow, wir sehen uns morgen wieder hier im Stream.";
        assert_eq!(fixed_voice_speaker().render_args(german)[1], "fr");
    }

    #[tokio::test]
    async fn worker_speaks_in_order_and_survives_failures() {
        let spoken = Arc::new(Mutex::new(Vec::new()));
        let (queue, handle) = SpeechQueue::spawn(RecordingSpeaker {
            spoken: spoken.clone(),
        });

        queue.notify("first");
        queue.notify("boom");
        queue.notify("   ");
        queue.notify("🎉 last");
        drop(queue);
        handle.await.unwrap();

        assert_eq!(*spoken.lock().unwrap(), vec!["first", "boom", "last"]);
    }

    #[tokio::test]
    async fn notify_after_worker_exit_is_swallowed() {
        let (queue, handle) = SpeechQueue::spawn(LogSpeaker);
        handle.abort();
        let _ = handle.await;
        queue.notify("nobody is listening");
    }

    #[tokio::test]
    async fn missing_command_is_a_spawn_error() {
        let mut speaker = CommandSpeaker::new(&SpeechConfig {
            command: "overlayclock-no-such-synthesizer".into(),
            ..SpeechConfig::default()
        });
        let err = speaker.speak("hello").await.unwrap_err();
        assert!(matches!(err, SpeechError::Spawn { .. }));
    }
}
