//! Audible alerts.
//!
//! [`Beeper`] tries the platform's sound player first and falls back to
//! terminal bell patterns that differ per condition kind. [`AudibleAlerts`]
//! plays them off the consumer loop on a dedicated thread.

use crate::alert::AlertSink;
use crate::core::model::{Condition, ConditionKind, Reading, Severity};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::io::Write;
use std::process::Command;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Alerts queued while a sound is still playing.
const ALERT_QUEUE_CAPACITY: usize = 16;

/// Freedesktop sound files tried in order on Linux.
#[cfg(target_os = "linux")]
const LINUX_SOUND_FILES: &[&str] = &[
    "/usr/share/sounds/freedesktop/stereo/bell.oga",
    "/usr/share/sounds/freedesktop/stereo/complete.oga",
    "/usr/share/sounds/sound-icons/bell.wav",
];

/// Errors from the system sound path.
#[derive(Debug)]
pub enum BeepError {
    NoPlayer(&'static str),
    PlayerFailed(String),
}

impl std::fmt::Display for BeepError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BeepError::NoPlayer(os) => write!(f, "No suitable audio player found for OS: {os}"),
            BeepError::PlayerFailed(e) => write!(f, "Audio player failed: {e}"),
        }
    }
}

impl std::error::Error for BeepError {}

/// Pauses after each terminal bell for a condition.
///
/// One entry per bell; the pause follows the bell.
pub fn beep_pattern(kind: ConditionKind, severity: Severity) -> Vec<Duration> {
    let count = match severity {
        Severity::Mild => 1,
        Severity::Moderate => 2,
        Severity::Severe => 3,
    };

    match kind {
        ConditionKind::Tachycardia => vec![Duration::from_millis(100); count],
        ConditionKind::Bradycardia => vec![Duration::from_millis(300); count],
        ConditionKind::Arrhythmia if severity == Severity::Severe => vec![
            Duration::from_millis(100),
            Duration::from_millis(300),
            Duration::from_millis(100),
            Duration::ZERO,
        ],
        ConditionKind::Arrhythmia => vec![Duration::from_millis(200), Duration::ZERO],
    }
}

/// Plays alert sounds synchronously.
#[derive(Debug, Clone)]
pub struct Beeper {
    enabled: bool,
}

impl Beeper {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Sound an alert for `condition`, blocking until done.
    pub fn beep_for_condition(&self, condition: &Condition) {
        if !self.enabled {
            return;
        }

        if let Err(e) = self.play_system_sound() {
            tracing::warn!("System sound failed: {}, falling back to console beep", e);
            self.play_bell_pattern(&beep_pattern(condition.kind, condition.severity));
        }
    }

    /// Play the platform alert sound.
    pub fn play_system_sound(&self) -> Result<(), BeepError> {
        if !self.enabled {
            return Ok(());
        }

        let mut command = system_sound_command()?;
        let status = command
            .status()
            .map_err(|e| BeepError::PlayerFailed(e.to_string()))?;

        if status.success() {
            Ok(())
        } else {
            Err(BeepError::PlayerFailed(format!("exited with {status}")))
        }
    }

    fn play_bell_pattern(&self, pauses: &[Duration]) {
        let mut stdout = std::io::stdout();
        for pause in pauses {
            let _ = stdout.write_all(b"\x07");
            let _ = stdout.flush();
            if !pause.is_zero() {
                thread::sleep(*pause);
            }
        }
    }
}

#[cfg(target_os = "linux")]
fn system_sound_command() -> Result<Command, BeepError> {
    if !command_exists("paplay") {
        return Err(BeepError::NoPlayer("linux"));
    }
    let sound = LINUX_SOUND_FILES
        .iter()
        .find(|path| std::path::Path::new(path).exists())
        .copied()
        .unwrap_or(LINUX_SOUND_FILES[LINUX_SOUND_FILES.len() - 1]);

    let mut command = Command::new("paplay");
    command.arg(sound);
    Ok(command)
}

#[cfg(target_os = "macos")]
fn system_sound_command() -> Result<Command, BeepError> {
    let mut command = Command::new("afplay");
    command.arg("/System/Library/Sounds/Ping.aiff");
    Ok(command)
}

#[cfg(target_os = "windows")]
fn system_sound_command() -> Result<Command, BeepError> {
    let mut command = Command::new("powershell");
    command.args(["-c", "[console]::beep(1000,500)"]);
    Ok(command)
}

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
fn system_sound_command() -> Result<Command, BeepError> {
    Err(BeepError::NoPlayer(std::env::consts::OS))
}

/// Whether `program` resolves to a file on `PATH`.
#[cfg(target_os = "linux")]
fn command_exists(program: &str) -> bool {
    std::env::var_os("PATH")
        .map(|paths| std::env::split_paths(&paths).any(|dir| dir.join(program).is_file()))
        .unwrap_or(false)
}

/// Alert sink that plays sounds on a background thread.
///
/// Dropping it discards sounds still queued and waits only for the one
/// currently playing.
pub struct AudibleAlerts {
    sender: Option<Sender<Condition>>,
    pending: Receiver<Condition>,
    worker: Option<JoinHandle<()>>,
}

impl AudibleAlerts {
    /// Spawn the sound worker for `beeper`.
    pub fn spawn(beeper: Beeper) -> std::io::Result<Self> {
        Self::spawn_with(move |condition| {
            tracing::debug!(
                "Attempting to beep for {} (severity: {})",
                condition.kind,
                condition.severity
            );
            beeper.beep_for_condition(condition);
        })
    }

    fn spawn_with<F>(play: F) -> std::io::Result<Self>
    where
        F: Fn(&Condition) + Send + 'static,
    {
        let (sender, receiver) = bounded::<Condition>(ALERT_QUEUE_CAPACITY);
        let pending = receiver.clone();

        let worker = thread::Builder::new()
            .name("ecg-beeper".to_string())
            .spawn(move || {
                for condition in receiver {
                    play(&condition);
                }
            })?;

        Ok(Self {
            sender: Some(sender),
            pending,
            worker: Some(worker),
        })
    }
}

impl AlertSink for AudibleAlerts {
    fn record_condition(&self, condition: &Condition) {
        let Some(sender) = &self.sender else {
            return;
        };
        match sender.try_send(condition.clone()) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                tracing::debug!("Beeper busy, dropping {} alert sound", condition.kind);
            }
            Err(TrySendError::Disconnected(_)) => {
                tracing::warn!("Beeper worker stopped, alert sound skipped");
            }
        }
    }

    fn record_normal(&self, _reading: &Reading) {}
}

impl Drop for AudibleAlerts {
    fn drop(&mut self) {
        // Closing the channel ends the worker loop.
        self.sender.take();
        let skipped = self.pending.try_iter().count();
        if skipped > 0 {
            tracing::debug!("Discarded {} queued alert sounds", skipped);
        }
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
