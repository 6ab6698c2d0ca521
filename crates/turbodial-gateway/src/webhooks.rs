// SPDX-FileCopyrightText: 2026 Turbodial Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider webhook endpoints.
//!
//! Every handler acknowledges with 200 regardless of processing outcome:
//! the provider retries non-2xx responses, and a replayed event is always
//! safe because the engine's transitions are idempotent. The only non-200
//! is 403 for a request that fails signature validation, which is not a
//! provider delivery at all.

use axum::{
    extract::{RawForm, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};
use turbodial_core::TurbodialError;
use turbodial_dialer::{
    AnswerAction, finish_voicemail, handle_answer, process_conference_event,
    process_status_event,
};
use turbodial_telephony::types::{
    AnswerCallback, ConferenceCallback, RecordingCallback, StatusCallback,
};
use turbodial_telephony::{signature, twiml};

use crate::server::GatewayState;

const SIGNATURE_HEADER: &str = "x-provider-signature";

fn xml_response(body: String) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/xml")],
        body,
    )
        .into_response()
}

/// Validate the webhook signature when validation is enabled.
///
/// The signed URL is the engine-derived webhook URL for this route, which
/// matches what the provider was told to call.
fn verify_signature(
    state: &GatewayState,
    url: &str,
    headers: &HeaderMap,
    params: &[(String, String)],
) -> bool {
    if !state.signature.validate {
        return true;
    }
    let Some(auth_token) = &state.signature.auth_token else {
        // Config validation rejects this combination at startup.
        warn!("signature validation enabled without an auth token");
        return false;
    };
    let Some(provided) = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok()) else {
        return false;
    };
    signature::validate_signature(auth_token, url, params, provided)
}

fn parse_params(body: &[u8]) -> Vec<(String, String)> {
    serde_urlencoded::from_bytes(body).unwrap_or_default()
}

/// POST /hooks/answer — a placed call was answered (or redirected back
/// after a hold).
pub async fn post_answer(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    RawForm(body): RawForm,
) -> Response {
    let params = parse_params(&body);
    if !verify_signature(&state, state.engine.answer_url(), &headers, &params) {
        return StatusCode::FORBIDDEN.into_response();
    }

    let callback: AnswerCallback = match serde_urlencoded::from_bytes(&body) {
        Ok(cb) => cb,
        Err(e) => {
            warn!(error = %e, "malformed answer callback");
            return xml_response(twiml::empty());
        }
    };

    let action = handle_answer(
        &state.engine,
        &callback.call_sid,
        callback.answered_by.as_deref(),
    )
    .await;

    let body = match action {
        Ok(AnswerAction::HangupMachine) => twiml::hangup(),
        Ok(AnswerAction::Bridge { conference_name }) => {
            twiml::conference_join(&conference_name, state.engine.conference_url())
        }
        Ok(AnswerAction::Hold { pause_secs }) => {
            twiml::hold_and_retry(pause_secs, state.engine.answer_url())
        }
        Ok(AnswerAction::Voicemail) => twiml::record_voicemail(
            "All of our representatives are busy. Please leave a message after the tone.",
            state.engine.recording_url(),
        ),
        Ok(AnswerAction::Ignore) => twiml::empty(),
        Err(TurbodialError::UntrackedCallback { call_handle }) => {
            debug!(call_handle, "answer event for untracked call");
            twiml::empty()
        }
        Err(e) => {
            // Degrade to the nearest safe outcome: the call just ends.
            warn!(call_sid = %callback.call_sid, error = %e, "answer handling failed");
            twiml::hangup()
        }
    };
    xml_response(body)
}

/// POST /hooks/status — call lifecycle events.
pub async fn post_status(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    RawForm(body): RawForm,
) -> Response {
    let params = parse_params(&body);
    if !verify_signature(&state, state.engine.status_url(), &headers, &params) {
        return StatusCode::FORBIDDEN.into_response();
    }

    let callback: StatusCallback = match serde_urlencoded::from_bytes(&body) {
        Ok(cb) => cb,
        Err(e) => {
            warn!(error = %e, "malformed status callback");
            return xml_response(twiml::empty());
        }
    };

    if let Err(e) = process_status_event(
        &state.engine,
        &callback.call_sid,
        &callback.call_status,
        callback.duration_secs(),
    )
    .await
    {
        warn!(call_sid = %callback.call_sid, error = %e, "status processing failed");
    }
    xml_response(twiml::empty())
}

/// POST /hooks/conference — conference membership events.
pub async fn post_conference(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    RawForm(body): RawForm,
) -> Response {
    let params = parse_params(&body);
    if !verify_signature(&state, state.engine.conference_url(), &headers, &params) {
        return StatusCode::FORBIDDEN.into_response();
    }

    let callback: ConferenceCallback = match serde_urlencoded::from_bytes(&body) {
        Ok(cb) => cb,
        Err(e) => {
            warn!(error = %e, "malformed conference callback");
            return xml_response(twiml::empty());
        }
    };

    if let Err(e) =
        process_conference_event(&state.engine, &callback.friendly_name, &callback.event).await
    {
        warn!(conference = %callback.friendly_name, error = %e, "conference processing failed");
    }
    xml_response(twiml::empty())
}

/// POST /hooks/recording — recording and transcription completions.
pub async fn post_recording(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    RawForm(body): RawForm,
) -> Response {
    let params = parse_params(&body);
    if !verify_signature(&state, state.engine.recording_url(), &headers, &params) {
        return StatusCode::FORBIDDEN.into_response();
    }

    let callback: RecordingCallback = match serde_urlencoded::from_bytes(&body) {
        Ok(cb) => cb,
        Err(e) => {
            warn!(error = %e, "malformed recording callback");
            return xml_response(twiml::empty());
        }
    };

    if let Err(e) = finish_voicemail(
        &state.engine,
        &callback.call_sid,
        callback.recording_url.as_deref(),
        callback.transcription_text.as_deref(),
    )
    .await
    {
        warn!(call_sid = %callback.call_sid, error = %e, "recording processing failed");
    }
    xml_response(twiml::empty())
}
