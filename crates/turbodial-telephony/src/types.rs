// SPDX-FileCopyrightText: 2026 Turbodial Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook payload types posted by the telephony provider.
//!
//! The provider sends `application/x-www-form-urlencoded` bodies with
//! PascalCase field names; every struct here is deserialized with
//! `serde_urlencoded`. Unknown fields are ignored so provider-side payload
//! additions never break the gateway.

use serde::Deserialize;

/// Callback posted when an outbound call is answered (the answer URL).
///
/// Also posted again when a held call is redirected back for its second
/// rep claim; that second invocation carries no `AnsweredBy`.
#[derive(Debug, Clone, Deserialize)]
pub struct AnswerCallback {
    /// Provider call handle.
    #[serde(rename = "CallSid")]
    pub call_sid: String,

    /// Machine-detection verdict: `human`, `machine_start`, `machine_end_beep`,
    /// `fax`, or `unknown`. Absent when detection was not requested.
    #[serde(rename = "AnsweredBy")]
    pub answered_by: Option<String>,

    /// Dialed number.
    #[serde(rename = "To")]
    pub to: Option<String>,

    /// Caller ID presented.
    #[serde(rename = "From")]
    pub from: Option<String>,
}

/// Lifecycle status callback posted as a call progresses.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusCallback {
    /// Provider call handle.
    #[serde(rename = "CallSid")]
    pub call_sid: String,

    /// Provider status: `initiated`, `ringing`, `in-progress`, `completed`,
    /// `busy`, `no-answer`, `failed`, `canceled`.
    #[serde(rename = "CallStatus")]
    pub call_status: String,

    /// Total call duration in seconds, present on terminal events.
    #[serde(rename = "CallDuration")]
    pub call_duration: Option<String>,
}

impl StatusCallback {
    /// Parsed duration in seconds; zero when absent or unparseable.
    pub fn duration_secs(&self) -> u64 {
        self.call_duration
            .as_deref()
            .and_then(|d| d.parse().ok())
            .unwrap_or(0)
    }
}

/// Conference event callback (participant join/leave, conference end).
#[derive(Debug, Clone, Deserialize)]
pub struct ConferenceCallback {
    /// Conference room name.
    #[serde(rename = "FriendlyName")]
    pub friendly_name: String,

    /// Event kind: `participant-join`, `participant-leave`, `conference-end`,
    /// `conference-start`.
    #[serde(rename = "StatusCallbackEvent")]
    pub event: String,

    /// Call handle of the participant the event concerns, when applicable.
    #[serde(rename = "CallSid")]
    pub call_sid: Option<String>,
}

/// Recording / voicemail callback, posted when a recording completes and
/// again when its transcription is ready.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordingCallback {
    /// Provider call handle.
    #[serde(rename = "CallSid")]
    pub call_sid: String,

    /// URL of the stored recording.
    #[serde(rename = "RecordingUrl")]
    pub recording_url: Option<String>,

    /// Transcription text, present only on the transcription callback.
    #[serde(rename = "TranscriptionText")]
    pub transcription_text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answer_callback_parses_form_body() {
        let body = "CallSid=CA123&AnsweredBy=machine_end_beep&To=%2B15551230000&From=%2B15550001111&Extra=ignored";
        let cb: AnswerCallback = serde_urlencoded::from_str(body).unwrap();
        assert_eq!(cb.call_sid, "CA123");
        assert_eq!(cb.answered_by.as_deref(), Some("machine_end_beep"));
        assert_eq!(cb.to.as_deref(), Some("+15551230000"));
    }

    #[test]
    fn answer_callback_without_answered_by() {
        let cb: AnswerCallback = serde_urlencoded::from_str("CallSid=CA1").unwrap();
        assert!(cb.answered_by.is_none());
    }

    #[test]
    fn status_callback_duration_parsing() {
        let cb: StatusCallback =
            serde_urlencoded::from_str("CallSid=CA1&CallStatus=completed&CallDuration=42").unwrap();
        assert_eq!(cb.duration_secs(), 42);

        let cb: StatusCallback =
            serde_urlencoded::from_str("CallSid=CA1&CallStatus=no-answer").unwrap();
        assert_eq!(cb.duration_secs(), 0);
    }

    #[test]
    fn conference_callback_parses() {
        let cb: ConferenceCallback = serde_urlencoded::from_str(
            "FriendlyName=turbo-org1-rep1-9&StatusCallbackEvent=participant-leave&CallSid=CA7",
        )
        .unwrap();
        assert_eq!(cb.friendly_name, "turbo-org1-rep1-9");
        assert_eq!(cb.event, "participant-leave");
        assert_eq!(cb.call_sid.as_deref(), Some("CA7"));
    }
}
