//! Audio file loading via symphonia with container-format fallback.
//!
//! The dialer exports recordings with unreliable extensions (an `.mp3` file
//! is occasionally a renamed WAV or M4A). Loading therefore probes with the
//! extension hint first and then retries with an explicit hint for each of
//! the remaining supported containers before giving up with `LoadFailure`.

use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::default::{get_codecs, get_probe};
use tracing::{debug, warn};

use crate::audio::AudioClip;
use crate::error::{CallscanError, Result};

/// Extensions accepted by the batch orchestrator and this loader.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["mp3", "wav", "m4a", "mp4"];

/// Decode a recording into an interleaved f32 clip.
///
/// # Errors
/// `CallscanError::LoadFailure` when no supported container format decodes
/// the file.
pub fn load_clip(path: &Path) -> Result<AudioClip> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    // First attempt: trust the file extension.
    if let Some(ext) = ext.as_deref() {
        match decode_with_hint(path, Some(ext)) {
            Ok(clip) => return Ok(clip),
            Err(e) => {
                debug!(path = %path.display(), ext, error = %e, "extension-hinted decode failed")
            }
        }
    }

    // Fallback: retry with each remaining supported container hint.
    for alt in SUPPORTED_EXTENSIONS {
        if ext.as_deref() == Some(alt) {
            continue;
        }
        match decode_with_hint(path, Some(alt)) {
            Ok(clip) => {
                debug!(path = %path.display(), format = alt, "decoded under fallback format");
                return Ok(clip);
            }
            Err(e) => debug!(path = %path.display(), format = alt, error = %e, "fallback decode failed"),
        }
    }

    warn!(path = %path.display(), "all decode attempts failed");
    Err(CallscanError::LoadFailure {
        path: path.to_path_buf(),
    })
}

fn decode_with_hint(path: &Path, ext: Option<&str>) -> anyhow::Result<AudioClip> {
    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = ext {
        hint.with_extension(ext);
    }

    let probed = get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;
    let mut format = probed.format;

    let (track_id, codec_params) = {
        let track = format
            .default_track()
            .ok_or_else(|| anyhow::anyhow!("no default audio track"))?;
        (track.id, track.codec_params.clone())
    };

    let mut decoder = get_codecs().make(&codec_params, &DecoderOptions::default())?;

    let sample_rate = codec_params
        .sample_rate
        .ok_or_else(|| anyhow::anyhow!("unknown sample rate"))?;
    let channels = codec_params
        .channels
        .map(|c| c.count() as u16)
        .unwrap_or(1);

    let mut sample_buf: Option<SampleBuffer<f32>> = None;
    let mut samples = Vec::<f32>::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::ResetRequired) => {
                decoder.reset();
                continue;
            }
            Err(SymphoniaError::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(err) => return Err(err.into()),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            // Skip corrupt packets; the remaining audio is still usable.
            Err(SymphoniaError::DecodeError(_)) => continue,
            Err(err) => return Err(err.into()),
        };

        let spec = *decoded.spec();
        if sample_buf
            .as_ref()
            .map(|b| b.capacity() < decoded.capacity())
            .unwrap_or(true)
        {
            sample_buf = Some(SampleBuffer::<f32>::new(decoded.capacity() as u64, spec));
        }
        if let Some(buf) = sample_buf.as_mut() {
            buf.copy_interleaved_ref(decoded);
            samples.extend_from_slice(buf.samples());
        }
    }

    if samples.is_empty() {
        // A mis-hinted container can probe successfully yet decode nothing;
        // treat that as a failed attempt so the next hint gets its turn.
        anyhow::bail!("no audio packets decoded");
    }

    Ok(AudioClip::new(samples, sample_rate, channels))
}
