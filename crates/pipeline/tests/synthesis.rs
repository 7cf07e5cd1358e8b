//! End-to-end synthesis over the stub backend

use std::path::Path;
use std::sync::Arc;

use vietvoice_config::Settings;
use vietvoice_core::{Area, Gender, ReferenceVoice, VoiceFilter};
use vietvoice_pipeline::{
    create_stub_engine, load_wav_mono, write_wav, SharedEngine, SpeechSynthesizer,
    SynthesisRequest, SynthesisService, VoiceCatalog,
};

const SAMPLE_RATE: u32 = 24000;
const REFERENCE_TEXT: &str = "Một giây âm thanh mẫu.";

fn write_tone(path: &Path, sample_rate: u32, secs: f32) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    let len = (sample_rate as f32 * secs) as usize;
    for i in 0..len {
        let t = i as f32 / sample_rate as f32;
        let s = (0.25 * (std::f32::consts::TAU * 200.0 * t).sin() * 32767.0) as i16;
        writer.write_sample(s).unwrap();
    }
    writer.finalize().unwrap();
}

fn long_text() -> String {
    "Hôm nay trời rất đẹp và chúng ta cùng nhau đi dạo trong công viên. ".repeat(30)
}

fn stub_service(catalog: VoiceCatalog) -> SynthesisService<vietvoice_pipeline::StubBackend> {
    let engine = Arc::new(SharedEngine::new(|| create_stub_engine(&Settings::default())));
    SynthesisService::new(engine, catalog, SAMPLE_RATE)
}

#[test]
fn test_multi_chunk_length_accounts_for_crossfades() {
    let engine = create_stub_engine(&Settings::default()).unwrap();
    let reference = ReferenceVoice::new(vec![0.05f32; 24000], SAMPLE_RATE, REFERENCE_TEXT);
    let params = engine.default_params();
    let text = long_text();

    let inputs = engine.prepare_inputs(&reference, &text, &params).unwrap();
    assert!(inputs.len() >= 3);
    let chunk_lengths: Vec<usize> = inputs
        .iter()
        .map(|input| input.target_frames() * engine.config().hop_length)
        .collect();
    let crossfade = engine.config().cross_fade_samples();
    assert!(chunk_lengths.iter().all(|&len| len > crossfade));

    let result = engine.synthesize(&text, &reference, &params).unwrap();
    let expected = chunk_lengths.iter().sum::<usize>() - (chunk_lengths.len() - 1) * crossfade;
    assert_eq!(result.chunk_count, inputs.len());
    assert_eq!(result.waveform.samples.len(), expected);

    let peak = result.waveform.samples.iter().map(|s| s.unsigned_abs()).max().unwrap();
    assert_eq!(peak, (0.9 * i16::MAX as f32).round() as u16);
}

#[test]
fn test_waveform_survives_wav_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let engine = create_stub_engine(&Settings::default()).unwrap();
    let reference = ReferenceVoice::new(vec![0.05f32; 24000], SAMPLE_RATE, REFERENCE_TEXT);
    let result = engine
        .synthesize("Xin chào Việt Nam.", &reference, &engine.default_params())
        .unwrap();

    let path = dir.path().join("hello.wav");
    write_wav(&path, &result.waveform).unwrap();

    let decoded = load_wav_mono(&path, SAMPLE_RATE).unwrap();
    assert_eq!(decoded.len(), result.waveform.samples.len());
    let original = result.waveform.samples[100] as f32 / 32768.0;
    assert!((decoded[100] - original).abs() < 1e-3);
}

#[tokio::test]
async fn test_catalog_voice_to_wav() {
    let dir = tempfile::tempdir().unwrap();
    write_tone(&dir.path().join("female/central/story_01.wav"), 16000, 2.0);
    // flat layout, resolved through the file-name fallback
    write_tone(&dir.path().join("news_01.wav"), SAMPLE_RATE, 1.5);

    let catalog_path = dir.path().join("catalog.yaml");
    std::fs::write(
        &catalog_path,
        r#"
samples:
  - filename: female/central/story_01.wav
    gender: female
    group: story
    area: central
    emotion: neutral
    text: "Ngày xửa ngày xưa, có một cô bé."
  - filename: male/northern/news_01.wav
    gender: Male
    group: News
    area: Northern
    emotion: Serious
    text: "Bản tin thời sự buổi sáng."
"#,
    )
    .unwrap();

    let service = stub_service(VoiceCatalog::load(&catalog_path).unwrap());
    assert_eq!(service.catalog().len(), 2);

    let output = dir.path().join("out.wav");
    let request = SynthesisRequest::new("Chào buổi sáng, chúc bạn một ngày tốt lành!")
        .with_filter(VoiceFilter::default().with_gender(Gender::Female).with_area(Area::Central))
        .with_output_path(&output);
    let result = service.synthesize(request).await.unwrap();

    assert_eq!(result.sample_rate, SAMPLE_RATE);
    assert!(output.exists());
    let reader = hound::WavReader::open(&output).unwrap();
    assert_eq!(reader.spec().sample_rate, SAMPLE_RATE);
    assert_eq!(reader.spec().bits_per_sample, 16);
    assert_eq!(reader.len() as usize, result.waveform.samples.len());

    let male = SynthesisRequest::new("Tin tức hôm nay.")
        .with_filter(VoiceFilter::parse(Some("MALE"), None, None, None).unwrap());
    assert!(service.synthesize(male).await.is_ok());
}

#[tokio::test]
async fn test_same_seed_same_audio() {
    let dir = tempfile::tempdir().unwrap();
    let reference = dir.path().join("ref.wav");
    write_tone(&reference, SAMPLE_RATE, 1.0);

    let service = stub_service(VoiceCatalog::empty(dir.path()));
    let request = SynthesisRequest::new(long_text())
        .with_reference(&reference, REFERENCE_TEXT)
        .with_seed(42);

    let a = service.synthesize(request.clone()).await.unwrap();
    let b = service.synthesize(request.clone()).await.unwrap();
    let c = service.synthesize(request.with_seed(43)).await.unwrap();

    assert!(a.chunk_count > 1);
    assert_eq!(a.waveform, b.waveform);
    assert_ne!(a.waveform.samples, c.waveform.samples);
}

#[tokio::test]
async fn test_missing_reference_file() {
    let dir = tempfile::tempdir().unwrap();
    let service = stub_service(VoiceCatalog::empty(dir.path()));
    let request = SynthesisRequest::new("xin chào")
        .with_reference(dir.path().join("absent.wav"), REFERENCE_TEXT);

    let err = service.synthesize(request).await.unwrap_err();
    assert!(matches!(err, vietvoice_core::Error::Resource(_)));
}
