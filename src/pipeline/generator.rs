// Pattern generation is an outside service: it takes a free-text style prompt
// and answers with a JSON pattern description. Whatever comes back is
// sanitized here before it can reach the sequencer, and a failure never
// touches the current pattern.

use std::process::Command;

use serde::Deserialize;

use crate::shared::{GENERATED_NAME_FALLBACK, GENERATED_TEMPO_FALLBACK, Instrument};

use super::pattern::{Pattern, sanitize_track};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GenerateError {
    /// The service could not be reached or did not answer successfully.
    #[error("pattern service unavailable: {0}")]
    Transport(String),

    /// It answered, but not with a usable pattern.
    #[error("malformed pattern response: {0}")]
    Malformed(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct GeneratedPattern {
    pub name: String,
    pub tempo: f64, // as supplied; clamping happens when it is applied to the transport
    pub pattern: Pattern,
}

pub trait PatternGenerator: Send + Sync {
    fn generate(&self, prompt: &str) -> Result<GeneratedPattern, GenerateError>;
}

#[derive(Deserialize)]
struct RawResponse {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    tempo: Option<f64>,
    steps: RawSteps,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "UPPERCASE", default)]
struct RawSteps {
    kick: Option<Vec<Option<bool>>>,
    snare: Option<Vec<Option<bool>>>,
    hihat: Option<Vec<Option<bool>>>,
    synth: Option<Vec<Option<bool>>>,
}

impl RawSteps {
    fn get(&self, instrument: Instrument) -> &[Option<bool>] {
        let track = match instrument {
            Instrument::Kick => &self.kick,
            Instrument::Snare => &self.snare,
            Instrument::Hihat => &self.hihat,
            Instrument::Synth => &self.synth,
        };
        track.as_deref().unwrap_or(&[])
    }
}

/// Parse and sanitize a service response: every track becomes exactly
/// sixteen steps, a missing/zero tempo becomes 120, a missing/empty name the
/// placeholder.
pub fn parse_response(text: &str) -> Result<GeneratedPattern, GenerateError> {
    let raw: RawResponse =
        serde_json::from_str(text.trim()).map_err(|e| GenerateError::Malformed(e.to_string()))?;

    let mut pattern = Pattern::default();
    for instrument in Instrument::ALL {
        pattern.set_track(instrument, sanitize_track(raw.steps.get(instrument)));
    }

    let tempo = match raw.tempo {
        Some(t) if t != 0.0 && t.is_finite() => t,
        _ => GENERATED_TEMPO_FALLBACK,
    };
    let name = raw
        .name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| GENERATED_NAME_FALLBACK.to_string());

    Ok(GeneratedPattern { name, tempo, pattern })
}

/// Runs an external program with the prompt as its last argument and reads
/// the JSON answer from its stdout.
#[derive(Clone, Debug)]
pub struct CommandGenerator {
    program: String,
    args: Vec<String>,
}

impl CommandGenerator {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl PatternGenerator for CommandGenerator {
    fn generate(&self, prompt: &str) -> Result<GeneratedPattern, GenerateError> {
        tracing::debug!(program = %self.program, prompt, "requesting pattern");
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(prompt)
            .output()
            .map_err(|e| GenerateError::Transport(format!("{}: {e}", self.program)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GenerateError::Transport(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8(output.stdout)
            .map_err(|e| GenerateError::Malformed(e.to_string()))?;
        parse_response(&stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::NUM_STEPS;

    #[test]
    fn short_track_is_padded_and_defaults_apply() {
        let generated = parse_response(r#"{"steps": {"KICK": [true, true]}}"#).unwrap();
        let kick = generated.pattern.track(Instrument::Kick);
        assert_eq!(kick.len(), NUM_STEPS);
        assert!(kick[0] && kick[1]);
        assert!(kick[2..].iter().all(|s| !s));
        assert!(generated.pattern.track(Instrument::Snare).iter().all(|s| !s));
        assert_eq!(generated.tempo, 120.0);
        assert_eq!(generated.name, "AI Groove");
    }

    #[test]
    fn full_response_is_kept() {
        let text = r#"{
            "name": "Latin Anthem",
            "tempo": 104,
            "steps": {
                "KICK":  [true,false,false,false,true,false,false,false,true,false,false,false,true,false,false,false],
                "SNARE": [false,false,false,false,true,false,false,false,false,false,false,false,true,false,false,false],
                "HIHAT": [true,true,true,true,true,true,true,true,true,true,true,true,true,true,true,true,true,true],
                "SYNTH": [false,false,true,null]
            }
        }"#;
        let generated = parse_response(text).unwrap();
        assert_eq!(generated.name, "Latin Anthem");
        assert_eq!(generated.tempo, 104.0);
        assert!(generated.pattern.track(Instrument::Hihat).iter().all(|s| *s));
        assert_eq!(generated.pattern.active_at(2).collect::<Vec<_>>(), vec![Instrument::Hihat, Instrument::Synth]);
        assert!(!generated.pattern.is_active(Instrument::Synth, 3));
    }

    #[test]
    fn out_of_range_tempo_is_passed_through() {
        let generated = parse_response(r#"{"tempo": 240, "steps": {}}"#).unwrap();
        assert_eq!(generated.tempo, 240.0);
        let generated = parse_response(r#"{"tempo": 0, "name": "", "steps": {}}"#).unwrap();
        assert_eq!(generated.tempo, 120.0);
        assert_eq!(generated.name, "AI Groove");
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(matches!(parse_response("not json"), Err(GenerateError::Malformed(_))));
        assert!(matches!(parse_response(r#"{"name": "x"}"#), Err(GenerateError::Malformed(_))));
        assert!(matches!(
            parse_response(r#"{"steps": {"KICK": [1, 0]}}"#),
            Err(GenerateError::Malformed(_))
        ));
    }

    #[test]
    fn missing_program_is_a_transport_failure() {
        let generator = CommandGenerator::new("beatbox-no-such-generator-binary", vec![]);
        assert!(matches!(generator.generate("anything"), Err(GenerateError::Transport(_))));
    }

    #[cfg(unix)]
    #[test]
    fn command_output_is_parsed() {
        let generator = CommandGenerator::new(
            "sh",
            vec!["-c".into(), r#"echo '{"name":"Echo","tempo":90,"steps":{"KICK":[true]}}'"#.into()],
        );
        let generated = generator.generate("ignored prompt").unwrap();
        assert_eq!(generated.name, "Echo");
        assert_eq!(generated.tempo, 90.0);
        assert!(generated.pattern.is_active(Instrument::Kick, 0));
    }

    #[cfg(unix)]
    #[test]
    fn failing_command_is_a_transport_failure() {
        let generator = CommandGenerator::new("sh", vec!["-c".into(), "exit 3".into()]);
        assert!(matches!(generator.generate("p"), Err(GenerateError::Transport(_))));
    }
}
