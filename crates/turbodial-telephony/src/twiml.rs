// SPDX-FileCopyrightText: 2026 Turbodial Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Call-control XML (TwiML-style) response builders.
//!
//! Webhook handlers answer the provider with small XML documents telling it
//! what to do with the live call: join a conference, pause and redirect,
//! record a voicemail, or hang up.

const XML_HEADER: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>";

/// Escape the five XML special characters in attribute/text content.
fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Join the lead into the rep's conference room.
///
/// `startConferenceOnEnter` is false so the lead hears hold music until the
/// rep (who starts the conference) is bridged in, and `endConferenceOnExit`
/// is false so a lead hangup does not tear down the rep's room.
pub fn conference_join(conference_name: &str, status_callback_url: &str) -> String {
    format!(
        "{XML_HEADER}<Response><Dial><Conference \
         startConferenceOnEnter=\"false\" endConferenceOnExit=\"false\" \
         statusCallback=\"{}\" statusCallbackEvent=\"start end join leave\">{}</Conference>\
         </Dial></Response>",
        escape(status_callback_url),
        escape(conference_name)
    )
}

/// Pause briefly, then redirect the call back to the answer URL for a second
/// rep claim.
pub fn hold_and_retry(pause_secs: u64, answer_url: &str) -> String {
    format!(
        "{XML_HEADER}<Response><Pause length=\"{pause_secs}\"/>\
         <Redirect method=\"POST\">{}</Redirect></Response>",
        escape(answer_url)
    )
}

/// Play an apology prompt and record a voicemail with transcription.
pub fn record_voicemail(prompt: &str, recording_callback_url: &str) -> String {
    format!(
        "{XML_HEADER}<Response><Say>{}</Say>\
         <Record maxLength=\"120\" playBeep=\"true\" transcribe=\"true\" \
         transcribeCallback=\"{}\" recordingStatusCallback=\"{}\"/>\
         <Hangup/></Response>",
        escape(prompt),
        escape(recording_callback_url),
        escape(recording_callback_url)
    )
}

/// Hang up immediately.
pub fn hangup() -> String {
    format!("{XML_HEADER}<Response><Hangup/></Response>")
}

/// Empty response: acknowledge without issuing any call instruction.
pub fn empty() -> String {
    format!("{XML_HEADER}<Response/>")
}
