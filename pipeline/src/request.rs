//! Clone requests and output naming.

use std::path::PathBuf;

use chrono::Local;
use uuid::Uuid;

use crate::CloneError;

/// Longest accepted output file name, extension included.
pub const MAX_OUTPUT_NAME_LEN: usize = 128;

/// Accepted speaking rates, inclusive.
pub const SPEED_RANGE: std::ops::RangeInclusive<f32> = 0.25..=4.0;

const EXTENSION: &str = ".wav";

/// Where a request's reference sample comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum ReferenceAudio {
    /// Base64 text, optionally wrapped in a `data:` URL.
    Transport(String),
    /// Raw WAV bytes, e.g. from a multipart upload.
    Bytes(Vec<u8>),
    /// A WAV file on disk. The pipeline reads a private copy and never
    /// deletes the original.
    File(PathBuf),
}

/// One unit of work for the [`Pipeline`](crate::Pipeline).
#[derive(Debug, Clone, PartialEq)]
pub struct CloneRequest {
    pub text: String,
    pub reference: ReferenceAudio,
    /// Speaking rate, 1.0 is normal.
    pub speed: f32,
    /// Language tag such as `en` or `zh-CN`.
    pub language: String,
    /// Requested output file name; generated when absent.
    pub output_name: Option<String>,
}

impl CloneRequest {
    pub fn new(text: impl Into<String>, reference: ReferenceAudio) -> Self {
        Self {
            text: text.into(),
            reference,
            speed: 1.0,
            language: "en".to_string(),
            output_name: None,
        }
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_output_name(mut self, name: impl Into<String>) -> Self {
        self.output_name = Some(name.into());
        self
    }

    /// Checks the request and resolves the output file name.
    pub fn validate(&self, token: &Uuid) -> Result<String, CloneError> {
        if self.text.trim().is_empty() {
            return Err(CloneError::Validation("text must not be empty".to_string()));
        }
        if !SPEED_RANGE.contains(&self.speed) {
            return Err(CloneError::Validation(format!(
                "speed must be between {} and {}, got {}",
                SPEED_RANGE.start(),
                SPEED_RANGE.end(),
                self.speed
            )));
        }
        match &self.output_name {
            Some(name) => normalize_output_name(name).map_err(CloneError::Validation),
            None => Ok(generated_output_name(token)),
        }
    }
}

/// Turns a caller-supplied name into a safe file name ending in `.wav`.
///
/// Path separators, parent references and hidden names are rejected.
/// Characters outside `[A-Za-z0-9._-]` become `_`. A trailing `.wav` in any
/// case is kept once; any other suffix gets `.wav` appended.
pub fn normalize_output_name(name: &str) -> Result<String, String> {
    let name = name.trim();
    if name.is_empty() {
        return Err("output filename must not be empty".to_string());
    }
    if name.contains(['/', '\\']) {
        return Err(format!("output filename must not contain path separators: {name}"));
    }
    if name.starts_with('.') {
        return Err(format!("output filename must not start with '.': {name}"));
    }

    let stem = match name.len().checked_sub(EXTENSION.len()) {
        Some(cut) if name.is_char_boundary(cut) && name[cut..].eq_ignore_ascii_case(EXTENSION) => &name[..cut],
        _ => name,
    };
    let stem: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() {
        return Err(format!("output filename has no name before the extension: {name}"));
    }
    if stem.len() + EXTENSION.len() > MAX_OUTPUT_NAME_LEN {
        return Err(format!(
            "output filename is longer than {MAX_OUTPUT_NAME_LEN} characters"
        ));
    }
    Ok(format!("{stem}{EXTENSION}"))
}

/// Returns `cloned_voice_<timestamp>_<token prefix>.wav`.
pub fn generated_output_name(token: &Uuid) -> String {
    let token = token.simple().to_string();
    format!(
        "cloned_voice_{}_{}{EXTENSION}",
        Local::now().format("%Y%m%d_%H%M%S"),
        &token[..8]
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_names() {
        assert_eq!(normalize_output_name("out").unwrap(), "out.wav");
        assert_eq!(normalize_output_name("out.wav").unwrap(), "out.wav");
        assert_eq!(normalize_output_name("out.WAV").unwrap(), "out.wav");
        assert_eq!(normalize_output_name("out.mp3").unwrap(), "out.mp3.wav");
        assert_eq!(normalize_output_name(" my voice! ").unwrap(), "my_voice_.wav");
        assert_eq!(normalize_output_name("take-2_final").unwrap(), "take-2_final.wav");
        assert_eq!(normalize_output_name("声音").unwrap(), "__.wav");
    }

    #[test]
    fn reject_unsafe_names() {
        assert!(normalize_output_name("").is_err());
        assert!(normalize_output_name("   ").is_err());
        assert!(normalize_output_name("../etc/passwd").is_err());
        assert!(normalize_output_name("a/b.wav").is_err());
        assert!(normalize_output_name("a\\b.wav").is_err());
        assert!(normalize_output_name(".hidden").is_err());
        assert!(normalize_output_name("..").is_err());
        assert!(normalize_output_name(".wav").is_err());
        assert!(normalize_output_name(&"x".repeat(200)).is_err());
        assert!(normalize_output_name(&"x".repeat(124)).is_ok());
    }

    #[test]
    fn generated_names_are_unique() {
        let a = generated_output_name(&Uuid::new_v4());
        let b = generated_output_name(&Uuid::new_v4());
        assert!(a.starts_with("cloned_voice_"));
        assert!(a.ends_with(".wav"));
        assert_ne!(a, b);
        assert_eq!(normalize_output_name(&a).unwrap(), a);
    }

    #[test]
    fn validate_request() {
        let token = Uuid::new_v4();
        let req = CloneRequest::new("Hello", ReferenceAudio::Bytes(vec![]));
        assert!(req.validate(&token).unwrap().starts_with("cloned_voice_"));

        let named = req.clone().with_output_name("mine");
        assert_eq!(named.validate(&token).unwrap(), "mine.wav");

        for bad in [
            req.clone().with_speed(0.0),
            req.clone().with_speed(-1.0),
            req.clone().with_speed(f32::INFINITY),
            req.clone().with_speed(f32::NAN),
            req.clone().with_speed(1e-30),
            req.clone().with_speed(0.2),
            req.clone().with_speed(4.5),
            CloneRequest::new("  \n", ReferenceAudio::Bytes(vec![])),
            req.clone().with_output_name("../x"),
        ] {
            assert!(matches!(bad.validate(&token), Err(CloneError::Validation(_))));
        }
        for ok in [0.25, 0.5, 2.0, 4.0] {
            assert!(req.clone().with_speed(ok).validate(&token).is_ok(), "speed {ok}");
        }
    }
}
