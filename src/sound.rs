//! Audio feedback for window notifications.
//!
//! Tones are synthesised, so nothing is embedded in the binary. Playback is
//! only compiled in with `--features sound`; without it every cue is traced
//! and dropped.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::get_settings;
use crate::core::Notification;

static MUTED: AtomicBool = AtomicBool::new(false);

/// Silence every cue for this run without touching the saved settings.
pub fn mute() {
    MUTED.store(true, Ordering::Relaxed);
}

// ── Sound catalogue ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sound {
    Open,
    Close,
    Click,
    Minimize,
    Restore,
    Maximize,
}

impl Sound {
    /// Focus changes click; power off plays the close cue once.
    pub fn for_notification(event: Notification) -> Option<Sound> {
        match event {
            Notification::Open(_) => Some(Sound::Open),
            Notification::Close(_) | Notification::PowerOff => Some(Sound::Close),
            Notification::Minimize(_) => Some(Sound::Minimize),
            Notification::Restore(_) => Some(Sound::Restore),
            Notification::Maximize(_) => Some(Sound::Maximize),
            Notification::Click | Notification::FocusChanged(_) => Some(Sound::Click),
        }
    }

    /// (frequency in Hz, duration in ms) steps.
    pub fn tones(self) -> &'static [(f32, u64)] {
        match self {
            Sound::Open     => &[(523.0, 40), (659.0, 40), (784.0, 60)],
            Sound::Close    => &[(784.0, 40), (659.0, 40), (523.0, 60)],
            Sound::Click    => &[(1200.0, 15)],
            Sound::Minimize => &[(660.0, 35), (440.0, 45)],
            Sound::Restore  => &[(440.0, 35), (660.0, 45)],
            Sound::Maximize => &[(440.0, 30), (880.0, 50)],
        }
    }
}

// ── Playback ──────────────────────────────────────────────────────────────────

/// Play a sound on a background thread. No-op if sound is disabled.
pub fn play(sound: Sound) {
    if MUTED.load(Ordering::Relaxed) || !get_settings().sound {
        return;
    }
    #[cfg(feature = "sound")]
    std::thread::spawn(move || {
        if let Err(err) = play_tones(sound.tones()) {
            tracing::debug!("audio unavailable: {err:#}");
        }
    });
    #[cfg(not(feature = "sound"))]
    tracing::trace!(?sound, "sound support not compiled in");
}

#[cfg(feature = "sound")]
fn play_tones(tones: &'static [(f32, u64)]) -> anyhow::Result<()> {
    use rodio::source::{SineWave, Source};
    use rodio::{OutputStream, Sink};
    use std::time::Duration;

    // Keep _stream alive for the full duration; dropping it stops audio.
    let (_stream, stream_handle) = OutputStream::try_default()?;
    let sink = Sink::try_new(&stream_handle)?;
    for &(freq, ms) in tones {
        sink.append(
            SineWave::new(freq)
                .take_duration(Duration::from_millis(ms))
                .amplify(0.15),
        );
    }
    sink.sleep_until_end();
    Ok(())
}

/// Play the cue for each drained notification.
pub fn play_notifications(events: &[Notification]) {
    for sound in events.iter().copied().filter_map(Sound::for_notification) {
        play(sound);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::WindowId;

    #[test]
    fn focus_changes_click() {
        let id = WindowId::from_raw(1);
        assert_eq!(Sound::for_notification(Notification::Click), Some(Sound::Click));
        assert_eq!(
            Sound::for_notification(Notification::FocusChanged(id)),
            Some(Sound::Click)
        );
        assert_eq!(Sound::for_notification(Notification::PowerOff), Some(Sound::Close));
    }

    #[test]
    fn every_cue_has_tones() {
        for s in [
            Sound::Open,
            Sound::Close,
            Sound::Click,
            Sound::Minimize,
            Sound::Restore,
            Sound::Maximize,
        ] {
            assert!(!s.tones().is_empty());
        }
    }
}
