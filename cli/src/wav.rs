//! WAV and data URI encoding of synthesized audio.

use std::io::Cursor;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

/// MIME prefix of an encoded WAV data URI.
pub const WAV_DATA_URI_PREFIX: &str = "data:audio/wav;base64,";

/// Encodes mono 16-bit samples as a WAV file.
pub fn encode_wav(sample_rate: u32, samples: &[i16]) -> Result<Vec<u8>, hound::Error> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::with_capacity(44 + samples.len() * 2));
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        for &s in samples {
            writer.write_sample(s)?;
        }
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}

/// Wraps WAV bytes in a `data:audio/wav;base64,` URI.
pub fn wav_data_uri(wav: &[u8]) -> String {
    let mut uri = String::with_capacity(WAV_DATA_URI_PREFIX.len() + wav.len().div_ceil(3) * 4);
    uri.push_str(WAV_DATA_URI_PREFIX);
    STANDARD.encode_string(wav, &mut uri);
    uri
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_wav_header() {
        let wav = encode_wav(32000, &[0, 1, -1, i16::MAX, i16::MIN]).unwrap();
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(wav.len(), 44 + 10);

        let mut reader = hound::WavReader::new(Cursor::new(wav)).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.sample_rate, 32000);
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.bits_per_sample, 16);
        let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![0, 1, -1, i16::MAX, i16::MIN]);
    }

    #[test]
    fn test_encode_empty() {
        let wav = encode_wav(16000, &[]).unwrap();
        assert_eq!(wav.len(), 44);
    }

    #[test]
    fn test_data_uri() {
        let uri = wav_data_uri(b"RIFF");
        assert_eq!(uri, "data:audio/wav;base64,UklGRg==");

        let wav = encode_wav(24000, &[7; 3]).unwrap();
        let uri = wav_data_uri(&wav);
        let decoded = STANDARD
            .decode(uri.strip_prefix(WAV_DATA_URI_PREFIX).unwrap())
            .unwrap();
        assert_eq!(decoded, wav);
    }
}
