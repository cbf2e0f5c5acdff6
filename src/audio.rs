// Tone playback: in-memory sine WAV clips, cached by pitch and length

use crate::scene::ToneRequest;

pub const SAMPLE_RATE: u32 = 22_050;
pub const FADE_SECS: f32 = 0.1;
pub const MASTER_GAIN: f32 = 0.2;
const FADE_FLOOR: f32 = 0.001;
const PEAK: f32 = 0.8;

/// Mono 16-bit PCM WAV of a sine at `frequency` held for `duration` seconds,
/// then ramped exponentially down to silence over [`FADE_SECS`].
pub fn synthesize_tone(frequency: f32, duration: f32) -> Vec<u8> {
    let duration = duration.max(0.0);
    let total = ((duration + FADE_SECS) * SAMPLE_RATE as f32).ceil() as usize;
    let mut pcm = Vec::with_capacity(total * 2);
    for n in 0..total {
        let t = n as f32 / SAMPLE_RATE as f32;
        let envelope = if t < duration {
            1.0
        } else {
            FADE_FLOOR.powf((t - duration) / FADE_SECS)
        };
        let sample = (t * frequency * std::f32::consts::TAU).sin() * envelope * PEAK;
        pcm.extend_from_slice(&((sample * i16::MAX as f32) as i16).to_le_bytes());
    }
    wav_container(&pcm)
}

fn wav_container(pcm: &[u8]) -> Vec<u8> {
    let channels: u16 = 1;
    let bits: u16 = 16;
    let block_align = channels * bits / 8;
    let byte_rate = SAMPLE_RATE * block_align as u32;
    let data_len = pcm.len() as u32;

    let mut out = Vec::with_capacity(44 + pcm.len());
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // PCM
    out.extend_from_slice(&channels.to_le_bytes());
    out.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&bits.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    out.extend_from_slice(pcm);
    out
}

/// Cache key: pitch in hundredths of a hertz, duration in whole milliseconds.
pub fn tone_key(tone: &ToneRequest) -> (u32, u32) {
    let pitch = (tone.frequency.max(0.0) * 100.0).round() as u32;
    let millis = (tone.duration.max(0.0) * 1000.0).round() as u32;
    (pitch, millis)
}

/// Requests waiting for their delay to elapse, ordered by arrival.
#[derive(Debug, Default)]
pub struct PendingTones {
    queue: Vec<(f64, ToneRequest)>,
}

impl PendingTones {
    pub fn schedule(&mut self, tone: ToneRequest, now: f64) {
        self.queue.push((now + tone.delay as f64, tone));
    }

    pub fn take_due(&mut self, now: f64) -> Vec<ToneRequest> {
        let mut due = Vec::new();
        self.queue.retain(|(at, tone)| {
            if *at <= now {
                due.push(*tone);
                false
            } else {
                true
            }
        });
        due
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.queue.len()
    }
}

pub use player::TonePlayer;

mod player {
    use macroquad::audio::{load_sound_from_bytes, play_sound, PlaySoundParams, Sound};
    use std::collections::HashMap;
    use tracing::{info, warn};

    use super::{synthesize_tone, tone_key, PendingTones, MASTER_GAIN};
    use crate::scene::ToneRequest;

    const MAX_CACHED: usize = 512;

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    enum AudioState {
        Dormant,
        Ready,
        Unavailable,
    }

    pub struct TonePlayer {
        state: AudioState,
        cache: HashMap<(u32, u32), Sound>,
        pending: PendingTones,
    }

    impl TonePlayer {
        pub fn new() -> Self {
            Self {
                state: AudioState::Dormant,
                cache: HashMap::new(),
                pending: PendingTones::default(),
            }
        }

        // called on the first pointer press
        pub fn activate(&mut self) {
            if self.state == AudioState::Dormant {
                self.state = AudioState::Ready;
                info!("audio activated");
            }
        }

        pub fn submit(&mut self, tones: &[ToneRequest], now: f64) {
            if self.state != AudioState::Ready {
                return;
            }
            for tone in tones {
                self.pending.schedule(*tone, now);
            }
        }

        pub async fn pump(&mut self, now: f64) {
            for tone in self.pending.take_due(now) {
                if self.state != AudioState::Ready {
                    self.pending.clear();
                    return;
                }
                self.play(tone).await;
            }
        }

        async fn play(&mut self, tone: ToneRequest) {
            let key = tone_key(&tone);
            if !self.cache.contains_key(&key) {
                let wav = synthesize_tone(tone.frequency, key.1 as f32 / 1000.0);
                match load_sound_from_bytes(&wav).await {
                    Ok(sound) => {
                        if self.cache.len() >= MAX_CACHED {
                            self.cache.clear();
                        }
                        self.cache.insert(key, sound);
                    }
                    Err(err) => {
                        warn!(error = ?err, "audio unavailable, continuing silently");
                        self.state = AudioState::Unavailable;
                        return;
                    }
                }
            }
            if let Some(sound) = self.cache.get(&key) {
                play_sound(
                    sound,
                    PlaySoundParams {
                        looped: false,
                        volume: (tone.volume * MASTER_GAIN).clamp(0.0, 1.0),
                    },
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wav_header_is_well_formed() {
        let wav = synthesize_tone(440.0, 0.1);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(&wav[36..40], b"data");
        let samples = ((0.1 + FADE_SECS) * SAMPLE_RATE as f32).ceil() as usize;
        let data_len = u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]) as usize;
        assert_eq!(data_len, samples * 2);
        assert_eq!(wav.len(), 44 + data_len);
        let riff_len = u32::from_le_bytes([wav[4], wav[5], wav[6], wav[7]]) as usize;
        assert_eq!(riff_len, wav.len() - 8);
    }

    #[test]
    fn tail_fades_out() {
        let wav = synthesize_tone(300.0, 0.05);
        let pcm: Vec<i16> = wav[44..]
            .chunks_exact(2)
            .map(|c| i16::from_le_bytes([c[0], c[1]]))
            .collect();
        let peak = |s: &[i16]| s.iter().map(|v| v.unsigned_abs()).max().unwrap_or(0);
        let head = peak(&pcm[..pcm.len() / 4]);
        let tail = peak(&pcm[pcm.len() - 200..]);
        assert!(head > 20_000);
        assert!(tail < 1_000, "tail peak {tail}");
    }

    #[test]
    fn keys_keep_arpeggio_pitches_apart() {
        let root = tone_key(&ToneRequest::now(220.0, 0.3, 0.1));
        let third = tone_key(&ToneRequest::now(277.18, 0.3, 0.1));
        let fifth = tone_key(&ToneRequest::now(329.63, 0.3, 0.1));
        assert_eq!(root, (22_000, 300));
        assert_eq!(third, (27_718, 300));
        assert_eq!(fifth, (32_963, 300));
        // volume does not split the cache
        assert_eq!(third, tone_key(&ToneRequest::now(277.18, 0.3, 0.9)));
    }

    #[test]
    fn clip_pitch_matches_the_request() {
        // count rising zero crossings over the held part of the clip
        let wav = synthesize_tone(277.18, 1.0);
        let pcm: Vec<i16> = wav[44..]
            .chunks_exact(2)
            .map(|c| i16::from_le_bytes([c[0], c[1]]))
            .take(SAMPLE_RATE as usize)
            .collect();
        let rising = pcm.windows(2).filter(|w| w[0] < 0 && w[1] >= 0).count();
        assert!((276..=278).contains(&rising), "{rising} cycles in one second");
    }

    #[test]
    fn delayed_tones_wait_their_turn() {
        let mut pending = PendingTones::default();
        let base = ToneRequest::now(220.0, 0.3, 0.1);
        pending.schedule(base, 10.0);
        pending.schedule(base.delayed(0.1), 10.0);
        pending.schedule(base.delayed(0.2), 10.0);
        assert_eq!(pending.take_due(10.0).len(), 1);
        assert_eq!(pending.take_due(10.05).len(), 0);
        assert_eq!(pending.take_due(10.15).len(), 1);
        assert_eq!(pending.len(), 1);
        assert_eq!(pending.take_due(11.0).len(), 1);
        assert_eq!(pending.len(), 0);
    }
}
