pub mod api; // HTTP + WebSocket surface
pub mod config;
pub mod detector; // Lexicon + scanner + queue + session engine
pub mod narration; // Clinical whisper via the local speech service
pub mod sessions; // Live session registry
