//! Shared test infrastructure for speakr-tts integration tests
//!
//! - FakeDeviceFactory: in-memory output device with open/close accounting
//! - FakeGenerator: scripted speech generator
//! - PCM payload builders

#![allow(dead_code)]

pub mod fake_device;
pub mod fake_generator;
pub mod payloads;

pub use fake_device::FakeDeviceFactory;
pub use fake_generator::FakeGenerator;
pub use payloads::{payload_from_samples, pcm_bytes, sine_samples};
