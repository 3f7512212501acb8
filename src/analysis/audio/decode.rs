use std::io::Cursor;

use symphonia::core::{
    audio::SampleBuffer, codecs::DecoderOptions, errors::Error, formats::FormatOptions,
    io::MediaSourceStream, meta::MetadataOptions, probe::Hint,
};
use tracing::debug;

use crate::error::PipelineError;

/// Raw decoded audio in interleaved `f32` samples.
pub(super) struct DecodedAudio {
    pub(super) samples: Vec<f32>,
    pub(super) sample_rate: u32,
    pub(super) channels: u16,
}

/// Decode an in-memory audio container into interleaved samples.
///
/// RIFF/WAVE payloads take the hound fast path; everything else, and WAV
/// variants hound rejects, goes through the symphonia probe.
pub(super) fn decode_bytes(bytes: &[u8]) -> Result<DecodedAudio, PipelineError> {
    if bytes.is_empty() {
        return Err(PipelineError::decode("upload contains no bytes"));
    }
    if is_riff_wave(bytes) {
        match decode_wav(bytes) {
            Ok(decoded) => return ensure_samples(decoded),
            Err(err) => debug!("hound rejected WAV payload, probing with symphonia: {err}"),
        }
    }
    ensure_samples(decode_with_symphonia(bytes)?)
}

fn ensure_samples(decoded: DecodedAudio) -> Result<DecodedAudio, PipelineError> {
    if decoded.samples.is_empty() {
        return Err(PipelineError::decode("decoded 0 samples"));
    }
    Ok(decoded)
}

fn is_riff_wave(bytes: &[u8]) -> bool {
    bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WAVE"
}

fn decode_wav(bytes: &[u8]) -> Result<DecodedAudio, hound::Error> {
    let mut reader = hound::WavReader::new(Cursor::new(bytes))?;
    let spec = reader.spec();
    let samples = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<Vec<_>, _>>()?,
        hound::SampleFormat::Int => {
            let scale = 1.0 / (1u64 << (spec.bits_per_sample.max(1) - 1)) as f32;
            if spec.bits_per_sample <= 16 {
                reader
                    .samples::<i16>()
                    .map(|sample| sample.map(|value| value as f32 * scale))
                    .collect::<Result<Vec<_>, _>>()?
            } else {
                reader
                    .samples::<i32>()
                    .map(|sample| sample.map(|value| value as f32 * scale))
                    .collect::<Result<Vec<_>, _>>()?
            }
        }
    };
    Ok(DecodedAudio {
        samples,
        sample_rate: spec.sample_rate.max(1),
        channels: spec.channels.max(1),
    })
}

fn decode_with_symphonia(bytes: &[u8]) -> Result<DecodedAudio, PipelineError> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes.to_vec())), Default::default());
    let probed = symphonia::default::get_probe()
        .format(
            &Hint::new(),
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|err| PipelineError::decode(format!("unsupported audio format: {err}")))?;
    let mut format = probed.format;
    let track = format
        .default_track()
        .ok_or_else(|| PipelineError::decode("no default audio track"))?;
    let track_id = track.id;
    let codec_params = track.codec_params.clone();
    let sample_rate = codec_params
        .sample_rate
        .ok_or_else(|| PipelineError::decode("missing sample rate"))?;
    let mut channels = codec_params.channels.map(|c| c.count() as u16).unwrap_or(0);

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|err| PipelineError::decode(format!("no decoder for track: {err}")))?;

    let mut samples = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(Error::IoError(_)) => break,
            Err(err) => {
                return Err(PipelineError::decode(format!("packet read failed: {err}")));
            }
        };
        if packet.track_id() != track_id {
            continue;
        }
        let audio_buf = match decoder.decode(&packet) {
            Ok(audio_buf) => audio_buf,
            Err(Error::DecodeError(_)) => continue,
            Err(err) => return Err(PipelineError::decode(format!("decode failed: {err}"))),
        };
        let spec = *audio_buf.spec();
        if channels == 0 {
            channels = spec.channels.count() as u16;
        }
        let mut sample_buf = SampleBuffer::<f32>::new(audio_buf.capacity() as u64, spec);
        sample_buf.copy_interleaved_ref(audio_buf);
        samples.extend_from_slice(sample_buf.samples());
    }

    Ok(DecodedAudio {
        samples,
        sample_rate: sample_rate.max(1),
        channels: channels.max(1),
    })
}

/// Average interleaved channels into one, replacing non-finite samples with silence.
///
/// Float overs (|x| > 1) pass through unchanged.
pub(super) fn downmix_to_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    let channels = channels.max(1) as usize;
    if channels == 1 {
        return samples.iter().copied().map(sanitize_sample).collect();
    }
    samples
        .chunks_exact(channels)
        .map(|frame| frame.iter().copied().map(sanitize_sample).sum::<f32>() / channels as f32)
        .collect()
}

fn sanitize_sample(sample: f32) -> f32 {
    if sample.is_finite() { sample } else { 0.0 }
}
