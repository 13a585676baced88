//! Consumer page (0x0C) usages for media keys.
//!
//! Media keys are not keyboard keys: they travel on their own report ID as a
//! 16-bit usage code, and a zero usage means "nothing pressed".

use serde::{Deserialize, Serialize};

/// Consumer-control usages the remote can send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum ConsumerUsage {
    NextTrack = 0x00B5,
    PreviousTrack = 0x00B6,
    Stop = 0x00B7,
    PlayPause = 0x00CD,
    Mute = 0x00E2,
    VolumeUp = 0x00E9,
    VolumeDown = 0x00EA,
}

const MEDIA_NAMES: &[(&str, ConsumerUsage)] = &[
    ("volume_up", ConsumerUsage::VolumeUp),
    ("volume_down", ConsumerUsage::VolumeDown),
    ("mute", ConsumerUsage::Mute),
    ("media_play_pause", ConsumerUsage::PlayPause),
    ("media_next", ConsumerUsage::NextTrack),
    ("media_previous", ConsumerUsage::PreviousTrack),
    ("media_stop", ConsumerUsage::Stop),
];

impl ConsumerUsage {
    /// Returns the 16-bit usage code.
    pub fn as_u16(self) -> u16 {
        self as u16
    }

    /// Looks up a media-key name, ignoring ASCII case.
    pub fn from_name(name: &str) -> Option<Self> {
        MEDIA_NAMES
            .iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
            .map(|&(_, usage)| usage)
    }

    /// Every media-key name accepted by [`ConsumerUsage::from_name`].
    pub fn names() -> impl Iterator<Item = &'static str> {
        MEDIA_NAMES.iter().map(|&(name, _)| name)
    }
}
