//! Channel downmixing and sample-rate conversion.
//!
//! Whisper wants 16 kHz mono `f32`; input devices commonly deliver 44.1 or
//! 48 kHz with two interleaved channels.  Linear interpolation is plenty for
//! speech recognition input.

/// Average interleaved `channels`-channel audio down to a single channel.
///
/// A trailing partial frame is dropped.
///
/// ```rust
/// use voice_assistant::audio::downmix;
///
/// let stereo = [0.5_f32, -0.5, 0.25, 0.75];
/// assert_eq!(downmix(&stereo, 2), vec![0.0, 0.5]);
/// ```
pub fn downmix(samples: &[f32], channels: u16) -> Vec<f32> {
    match channels {
        0 => Vec::new(),
        1 => samples.to_vec(),
        n => {
            let width = usize::from(n);
            samples
                .chunks_exact(width)
                .map(|frame| frame.iter().sum::<f32>() / width as f32)
                .collect()
        }
    }
}

/// Convert mono `samples` from `from_rate` Hz to `to_rate` Hz.
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || samples.is_empty() || from_rate == 0 {
        return samples.to_vec();
    }

    let step = f64::from(from_rate) / f64::from(to_rate);
    let out_len = ((samples.len() as f64) / step).floor() as usize;
    let last = samples.len() - 1;

    (0..out_len)
        .map(|i| {
            let pos = i as f64 * step;
            let idx = (pos as usize).min(last);
            let next = (idx + 1).min(last);
            let frac = (pos - idx as f64) as f32;
            samples[idx] + (samples[next] - samples[idx]) * frac
        })
        .collect()
}
