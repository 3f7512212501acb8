use std::f32::consts::PI;
use std::io::Cursor;

/// Encode mono float samples as an in-memory WAV file.
pub fn wav_bytes(samples: &[f32], sample_rate: u32) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).expect("create wav writer");
        for &sample in samples {
            writer.write_sample(sample).expect("write wav sample");
        }
        writer.finalize().expect("finalize wav");
    }
    cursor.into_inner()
}

/// Amplitude-modulated tone, loosely cry-shaped.
pub fn cry_like(sample_rate: u32, seconds: f32) -> Vec<f32> {
    let len = (sample_rate as f32 * seconds) as usize;
    (0..len)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            let envelope = 0.5 + 0.4 * (2.0 * PI * 3.0 * t).sin();
            envelope * (2.0 * PI * 450.0 * t).sin() * 0.6
        })
        .collect()
}

pub fn silence(sample_rate: u32, seconds: f32) -> Vec<f32> {
    vec![0.0; (sample_rate as f32 * seconds) as usize]
}
