//! WAV response decoding.

use std::io::Cursor;

use hound::{SampleFormat, WavReader};

use super::error::Result;

/// Decodes a WAV file into its sample rate and mono 16-bit samples.
///
/// Float and wider integer samples are converted to 16 bits; multi-channel
/// audio is averaged down to one channel.
pub fn decode_wav(data: &[u8]) -> Result<(u32, Vec<i16>)> {
    let reader = WavReader::new(Cursor::new(data))?;
    let spec = reader.spec();

    let samples: Vec<i16> = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Int, 16) => reader.into_samples::<i16>().collect::<std::result::Result<_, _>>()?,
        (SampleFormat::Int, bits) => {
            let shift = i32::from(bits) - 16;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| rescale(v, shift)))
                .collect::<std::result::Result<_, _>>()?
        }
        (SampleFormat::Float, _) => reader
            .into_samples::<f32>()
            .map(|s| s.map(float_to_i16))
            .collect::<std::result::Result<_, _>>()?,
    };

    Ok((spec.sample_rate, downmix(samples, spec.channels)))
}

fn rescale(v: i32, shift: i32) -> i16 {
    let scaled = if shift >= 0 { v >> shift } else { v << -shift };
    scaled.clamp(i16::MIN as i32, i16::MAX as i32) as i16
}

fn float_to_i16(v: f32) -> i16 {
    (v.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

fn downmix(samples: Vec<i16>, channels: u16) -> Vec<i16> {
    if channels <= 1 {
        return samples;
    }
    samples
        .chunks(channels as usize)
        .map(|frame| {
            let sum: i32 = frame.iter().map(|&s| s as i32).sum();
            (sum / frame.len() as i32) as i16
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{WavSpec, WavWriter};

    fn encode<S: hound::Sample + Copy>(spec: WavSpec, samples: &[S]) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = WavWriter::new(&mut cursor, spec).unwrap();
            for &s in samples {
                writer.write_sample(s).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    fn spec(channels: u16, bits: u16, format: SampleFormat) -> WavSpec {
        WavSpec {
            channels,
            sample_rate: 32000,
            bits_per_sample: bits,
            sample_format: format,
        }
    }

    #[test]
    fn test_decode_i16_mono() {
        let data = encode(spec(1, 16, SampleFormat::Int), &[0i16, 100, -100, i16::MAX]);
        let (rate, samples) = decode_wav(&data).unwrap();
        assert_eq!(rate, 32000);
        assert_eq!(samples, vec![0, 100, -100, i16::MAX]);
    }

    #[test]
    fn test_decode_stereo_downmix() {
        let data = encode(spec(2, 16, SampleFormat::Int), &[100i16, 300, -50, -150]);
        let (_, samples) = decode_wav(&data).unwrap();
        assert_eq!(samples, vec![200, -100]);
    }

    #[test]
    fn test_decode_float() {
        let data = encode(spec(1, 32, SampleFormat::Float), &[0.0f32, 1.0, -1.0, 2.0]);
        let (_, samples) = decode_wav(&data).unwrap();
        assert_eq!(samples, vec![0, i16::MAX, -i16::MAX, i16::MAX]);
    }

    #[test]
    fn test_decode_24_bit() {
        let data = encode(spec(1, 24, SampleFormat::Int), &[256i32, -512]);
        let (_, samples) = decode_wav(&data).unwrap();
        assert_eq!(samples, vec![1, -2]);
    }

    #[test]
    fn test_decode_garbage() {
        assert!(decode_wav(b"{\"message\": \"nope\"}").is_err());
    }
}
