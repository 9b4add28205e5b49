//! Example: Check Provider Configuration
//!
//! This example verifies that your provider credentials are configured
//! correctly: it reads the environment, reports what is set, and makes a
//! small live request to the translation and voice providers.
//!
//! Usage:
//!   cargo run --example check_providers
//!
//! Prerequisites:
//!   - .env file with OPENAI_API_KEY (and optionally VIDEODB_API_KEY,
//!     ELEVENLABS_API_KEY)

use std::sync::Arc;
use std::time::Duration;

use dubber::config::AppConfig;
use dubber::models::transcript::TranscriptSegment;
use dubber::services::translate::{OpenAiTranslator, Translator};
use dubber::services::voice::{ElevenLabsClient, Synthesizer};

fn masked(key: &str) -> String {
    format!("{}***", &key[..8.min(key.len())])
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    println!("🔎 Provider Configuration Check\n");

    let config = AppConfig::from_env()?;

    println!("📋 Configuration:");
    println!(
        "   VideoDB key: {}",
        if config.videodb_api_key.is_empty() {
            "NOT SET (ingestion will fail)".to_string()
        } else {
            masked(&config.videodb_api_key)
        }
    );
    println!(
        "   OpenAI key: {}",
        if config.openai_api_key.is_empty() {
            "NOT SET (translation will fail)".to_string()
        } else {
            masked(&config.openai_api_key)
        }
    );
    println!(
        "   ElevenLabs key: {}",
        match config.elevenlabs_api_key.as_deref() {
            Some(key) if !key.is_empty() => masked(key),
            _ => "NOT SET (jobs will complete in demo mode)".to_string(),
        }
    );
    println!("   Languages: {}", config.supported_languages.join(", "));
    println!();

    let timeout = Duration::from_secs(30);

    // Translation round trip
    if config.openai_api_key.is_empty() {
        println!("🌍 Skipping translation test (no OPENAI_API_KEY)\n");
    } else {
        println!("🌍 Testing translation ({})...", config.openai_model);
        let translator = Arc::new(OpenAiTranslator::new(
            &config.openai_base_url,
            &config.openai_api_key,
            &config.openai_model,
            timeout,
        ));
        let segments = vec![TranscriptSegment {
            start: 0.0,
            end: 2.0,
            text: "Hello, welcome to the show".to_string(),
        }];
        match translator.translate(&segments, "es").await {
            Ok(translated) => {
                println!("✅ Translation works:");
                println!("   \"{}\" -> \"{}\"", segments[0].text, translated[0].text);
            }
            Err(e) => println!("❌ Translation failed: {}", e),
        }
        println!();
    }

    // Voice catalogue
    println!("🎙️  Fetching voice catalogue...");
    let synthesizer = Arc::new(ElevenLabsClient::new(
        &config.elevenlabs_base_url,
        config.elevenlabs_api_key.clone(),
        timeout,
    ));
    if !synthesizer.available() {
        println!("⚠️  Voice provider not configured; the demo catalogue will be served");
    }
    match synthesizer.voices(None).await {
        Ok(voices) => {
            println!("✅ {} voices available:", voices.len());
            for voice in voices.iter().take(5) {
                println!("   {} ({})", voice.name, voice.voice_id);
            }
        }
        Err(e) => println!("❌ Voice listing failed: {}", e),
    }

    println!("\n✨ Done. Start the server with `cargo run` once the required keys are set.");

    Ok(())
}
