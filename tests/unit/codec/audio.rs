use super::*;

fn tone(frames: usize, channels: u16) -> AudioData {
    let samples = (0..frames * usize::from(channels))
        .map(|i| ((i % 200) as i16 - 100) * 100)
        .collect();
    AudioData::new(8_000, channels, SampleBuffer::I16(samples)).unwrap()
}

#[test]
fn sixteen_bit_conversion_rules() {
    assert_eq!(SampleBuffer::U8(vec![0, 128, 255]).to_i16(), vec![-32768, 128, 32767]);
    assert_eq!(SampleBuffer::I8(vec![-128, 1]).to_i16(), vec![-32768, 256]);
    assert_eq!(SampleBuffer::U16(vec![0, 65535]).to_i16(), vec![-32768, 32767]);
    assert_eq!(SampleBuffer::I32(vec![65536 * 3, -65536]).to_i16(), vec![3, -1]);
    assert_eq!(SampleBuffer::F32(vec![0.5, -0.25]).to_i16(), vec![32767, -16383]);
    assert_eq!(SampleBuffer::F64(vec![0.0, 0.0]).to_i16(), vec![0, 0]);
}

#[test]
fn new_rejects_ragged_channels() {
    assert!(AudioData::new(8_000, 2, SampleBuffer::I16(vec![0; 3])).is_err());
    assert!(AudioData::new(0, 1, SampleBuffer::I16(vec![])).is_err());
}

#[test]
fn wav_round_trip_keeps_shape() {
    let audio = tone(400, 2);
    let back = read_wav(&write_wav(&audio).unwrap()).unwrap();
    assert_eq!(back, audio);
    assert!((back.duration_secs() - 0.05).abs() < 1e-9);
}

#[test]
fn oversized_header_fields_are_errors() {
    let fast = AudioData::new(u32::MAX, 2, SampleBuffer::I16(vec![0, 0])).unwrap();
    let err = write_wav(&fast).unwrap_err();
    assert!(matches!(err, BindError::UnsupportedFormat(_)), "{err}");
    assert!(encode_audio(&fast, "wav").is_err());

    let wide = AudioData::new(8_000, u16::MAX, SampleBuffer::I16(vec![0; 65535])).unwrap_err();
    assert!(wide.is_validation(), "{wide}");
    let widest = AudioData::new(8_000, MAX_CHANNELS, SampleBuffer::I16(vec![0; 32767])).unwrap();
    assert_eq!(write_wav(&widest).unwrap().len(), 44 + 2 * 32767);
}

#[test]
fn float_wav_is_read() {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(36u32 + 8).to_le_bytes());
    bytes.extend_from_slice(b"WAVEfmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&3u16.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&16_000u32.to_le_bytes());
    bytes.extend_from_slice(&64_000u32.to_le_bytes());
    bytes.extend_from_slice(&4u16.to_le_bytes());
    bytes.extend_from_slice(&32u16.to_le_bytes());
    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&8u32.to_le_bytes());
    bytes.extend_from_slice(&0.5f32.to_le_bytes());
    bytes.extend_from_slice(&(-1.0f32).to_le_bytes());

    let audio = read_wav(&bytes).unwrap();
    assert_eq!(audio.sample_rate, 16_000);
    assert_eq!(audio.samples, SampleBuffer::F32(vec![0.5, -1.0]));
}

#[test]
fn unknown_data_length_reads_to_end() {
    let mut bytes = write_wav(&tone(10, 1)).unwrap();
    bytes[40..44].copy_from_slice(&u32::MAX.to_le_bytes());
    assert_eq!(read_wav(&bytes).unwrap().frames(), 10);
}

#[test]
fn non_wav_is_unsupported() {
    assert!(matches!(
        read_wav(b"ID3\x03garbage-garbage"),
        Err(BindError::UnsupportedFormat(_))
    ));
}

#[test]
fn crop_uses_percentages() {
    let audio = tone(100, 2);
    let c = audio.crop(25.0, 75.0);
    assert_eq!(c.frames(), 50);
    assert_eq!(c.channels, 2);
}

#[test]
fn load_audio_reads_and_crops_wav() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("a.wav");
    std::fs::write(&p, write_wav(&tone(200, 1)).unwrap()).unwrap();
    assert_eq!(load_audio(&p, None).unwrap().frames(), 200);
    assert_eq!(load_audio(&p, Some((0.0, 50.0))).unwrap().frames(), 100);
}

#[test]
fn save_audio_names_file_by_format() {
    let dir = tempfile::tempdir().unwrap();
    let cache = ContentCache::at(dir.path()).unwrap();
    let p = save_audio(&cache, &tone(10, 1), "wav").unwrap();
    assert_eq!(p.file_name().unwrap(), "audio.wav");
}

#[cfg(not(feature = "media-ffmpeg"))]
#[test]
fn non_wav_encode_needs_ffmpeg() {
    let err = encode_audio(&tone(10, 1), "mp3").unwrap_err();
    assert!(err.to_string().contains("media-ffmpeg"), "{err}");
}
