//! Mic-button window: egui/eframe application.
//!
//! # Architecture
//!
//! [`AssistantApp`] is the top-level [`eframe::App`].  It is a trigger
//! surface and a viewer, nothing more:
//!
//! * `trigger_tx` sends [`TriggerEvent::MicButton`] to the trigger loop.
//! * `state` is the router's [`SharedState`]; each frame takes a short lock
//!   and copies out what it renders.
//!
//! The mic button goes through the same [`TriggerGate`] as the global
//! hotkey and is disabled while a cycle is in flight.
//!
//! # Window States
//!
//! | Phase | Visual |
//! |-------|--------|
//! | `Idle` | Mic button + last result |
//! | `Listening` | "Listening..." in red |
//! | `Classifying` / `Executing` / `Speaking` | Spinner + phase label |
//! | `ExecutingSequence` | Spinner + "Presenting..." |

use std::sync::Arc;
use std::time::Duration;

use eframe::egui;
use tokio::sync::mpsc;

use crate::config::AppConfig;
use crate::router::{CyclePhase, DispatchResult, Intent, SharedState};
use crate::trigger::{TriggerEvent, TriggerGate};

// ---------------------------------------------------------------------------
// Mic button
// ---------------------------------------------------------------------------

/// Outcome of one click on the mic button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MicPress {
    /// A cycle was started.
    Sent,
    /// A cycle is already running.
    Busy,
    /// The trigger loop is not accepting events; the gate was re-armed.
    Dropped,
}

/// Offer a mic-button trigger through `gate`.
pub fn press_mic(gate: &TriggerGate, tx: &mpsc::Sender<TriggerEvent>) -> MicPress {
    if !gate.try_fire() {
        return MicPress::Busy;
    }
    match tx.try_send(TriggerEvent::MicButton) {
        Ok(()) => MicPress::Sent,
        Err(e) => {
            log::warn!("app: mic trigger not delivered: {e}");
            gate.rearm();
            MicPress::Dropped
        }
    }
}

// ---------------------------------------------------------------------------
// Frame snapshot
// ---------------------------------------------------------------------------

/// What one frame renders, copied out of [`SharedState`].
#[derive(Debug, Clone, Default)]
struct Snapshot {
    phase: CyclePhase,
    utterance: Option<String>,
    intent: Option<Intent>,
    result: Option<DispatchResult>,
}

impl Snapshot {
    fn take(state: &SharedState) -> Self {
        let st = state.lock().unwrap();
        Self {
            phase: st.phase,
            utterance: st.last_utterance.clone(),
            intent: st.last_intent,
            result: st.last_result.clone(),
        }
    }
}

/// One-line summary of a finished cycle for the window.
pub fn result_line(result: &DispatchResult) -> String {
    match (&result.spoken_response, result.succeeded) {
        (Some(spoken), _) => spoken.clone(),
        (None, true) => "Done".into(),
        (None, false) => match result.error_kind {
            Some(kind) => format!("Failed ({kind:?})"),
            None => "Failed".into(),
        },
    }
}

// ---------------------------------------------------------------------------
// AssistantApp
// ---------------------------------------------------------------------------

/// eframe application for the floating mic window.
pub struct AssistantApp {
    state: SharedState,
    gate: Arc<TriggerGate>,
    trigger_tx: mpsc::Sender<TriggerEvent>,
    config: AppConfig,
    /// Spinner animation phase (increases each frame).
    spinner_phase: f32,
}

impl AssistantApp {
    pub fn new(
        state: SharedState,
        gate: Arc<TriggerGate>,
        trigger_tx: mpsc::Sender<TriggerEvent>,
        config: AppConfig,
    ) -> Self {
        Self {
            state,
            gate,
            trigger_tx,
            config,
            spinner_phase: 0.0,
        }
    }

    // ── Title bar ────────────────────────────────────────────────────────

    fn draw_title_bar(&self, ui: &mut egui::Ui, ctx: &egui::Context, phase: CyclePhase) {
        ui.horizontal(|ui| {
            ui.label(egui::RichText::new("●").color(phase_color(phase)));

            let title_resp = ui.label(
                egui::RichText::new("Assistant")
                    .color(egui::Color32::from_rgb(200, 200, 200))
                    .size(13.0),
            );
            if title_resp.is_pointer_button_down_on() {
                if let Some(outer_rect) = ctx.input(|i| i.viewport().outer_rect) {
                    let delta = ctx.input(|i| i.pointer.delta());
                    ctx.send_viewport_cmd(egui::ViewportCommand::OuterPosition(
                        outer_rect.min + delta,
                    ));
                }
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui
                    .add(
                        egui::Button::new(
                            egui::RichText::new("x")
                                .color(egui::Color32::from_rgb(200, 100, 100))
                                .size(12.0),
                        )
                        .frame(false),
                    )
                    .clicked()
                {
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                }
                if ui
                    .add(
                        egui::Button::new(
                            egui::RichText::new("-")
                                .color(egui::Color32::from_rgb(150, 150, 150))
                                .size(12.0),
                        )
                        .frame(false),
                    )
                    .clicked()
                {
                    ctx.send_viewport_cmd(egui::ViewportCommand::Minimized(true));
                }
            });
        });
    }

    // ── Body ─────────────────────────────────────────────────────────────

    fn draw_idle(&self, ui: &mut egui::Ui, snap: &Snapshot) {
        ui.add_space(4.0);
        ui.horizontal(|ui| {
            let mic = egui::Button::new(egui::RichText::new("🎤 Speak").size(14.0))
                .min_size(egui::vec2(90.0, 28.0));
            if ui.add_enabled(!snap.phase.is_busy(), mic).clicked() {
                match press_mic(&self.gate, &self.trigger_tx) {
                    MicPress::Sent => log::debug!("app: mic pressed"),
                    MicPress::Busy => log::debug!("app: busy, mic press ignored"),
                    MicPress::Dropped => {}
                }
            }
            ui.label(
                egui::RichText::new(format!("or press {}", self.config.hotkey.push_to_talk_key))
                    .color(egui::Color32::from_rgb(120, 120, 120))
                    .size(11.0),
            );
        });
        self.draw_last_cycle(ui, snap);
    }

    fn draw_busy(&self, ui: &mut egui::Ui, snap: &Snapshot) {
        ui.add_space(8.0);
        let text = match snap.phase {
            CyclePhase::Listening => "Listening...".to_string(),
            phase => format!("{} {}...", self.spinner_char(), phase.label()),
        };
        ui.label(
            egui::RichText::new(text)
                .color(phase_color(snap.phase))
                .size(13.0),
        );
        if snap.phase != CyclePhase::Listening {
            if let Some(ref utterance) = snap.utterance {
                ui.label(
                    egui::RichText::new(format!("\"{utterance}\""))
                        .color(egui::Color32::from_rgb(130, 130, 130))
                        .italics()
                        .size(11.0),
                );
            }
        }
    }

    /// Utterance, intent and outcome of the previous cycle.
    fn draw_last_cycle(&self, ui: &mut egui::Ui, snap: &Snapshot) {
        let Some(ref result) = snap.result else {
            return;
        };

        ui.add_space(4.0);
        if let Some(ref utterance) = snap.utterance {
            let intent = snap.intent.map(|i| i.label()).unwrap_or("-");
            ui.label(
                egui::RichText::new(format!("\"{utterance}\" → {intent}"))
                    .color(egui::Color32::from_rgb(130, 130, 130))
                    .italics()
                    .size(11.0),
            );
        }
        let color = if result.succeeded {
            egui::Color32::from_rgb(80, 200, 120)
        } else {
            egui::Color32::from_rgb(255, 136, 68)
        };
        ui.label(egui::RichText::new(result_line(result)).color(color).size(12.0));
    }

    // ── Helpers ───────────────────────────────────────────────────────────

    fn spinner_char(&self) -> char {
        let chars = ['|', '/', '-', '\\'];
        let idx = (self.spinner_phase as usize) % chars.len();
        chars[idx]
    }
}

fn phase_color(phase: CyclePhase) -> egui::Color32 {
    match phase {
        CyclePhase::Idle => egui::Color32::from_rgb(100, 100, 100),
        CyclePhase::Listening => egui::Color32::from_rgb(255, 68, 68),
        CyclePhase::Classifying | CyclePhase::Executing | CyclePhase::ExecutingSequence => {
            egui::Color32::from_rgb(68, 136, 255)
        }
        CyclePhase::Speaking => egui::Color32::from_rgb(80, 200, 120),
    }
}

// ---------------------------------------------------------------------------
// eframe::App impl
// ---------------------------------------------------------------------------

impl eframe::App for AssistantApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let snap = Snapshot::take(&self.state);

        self.spinner_phase += 0.08;
        if self.spinner_phase >= 4.0 {
            self.spinner_phase = 0.0;
        }

        // The router changes state off the UI thread, so keep polling.
        if snap.phase.is_busy() {
            ctx.request_repaint_after(Duration::from_millis(66));
        } else {
            ctx.request_repaint_after(Duration::from_millis(250));
        }

        let frame = egui::Frame::new()
            .fill(egui::Color32::from_rgba_premultiplied(30, 30, 30, 220))
            .corner_radius(egui::CornerRadius::same(8))
            .inner_margin(egui::Margin::same(8));

        egui::CentralPanel::default().frame(frame).show(ctx, |ui| {
            self.draw_title_bar(ui, ctx, snap.phase);
            ui.separator();

            if snap.phase.is_busy() {
                self.draw_busy(ui, &snap);
            } else {
                self.draw_idle(ui, &snap);
            }
        });
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        log::info!("app: window closing");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::{new_shared_state, ErrorKind};

    #[test]
    fn mic_press_sends_once_per_cycle() {
        let gate = TriggerGate::new();
        let (tx, mut rx) = mpsc::channel(4);

        assert_eq!(press_mic(&gate, &tx), MicPress::Sent);
        assert_eq!(press_mic(&gate, &tx), MicPress::Busy);
        assert_eq!(rx.try_recv().unwrap(), TriggerEvent::MicButton);
        assert!(rx.try_recv().is_err());

        gate.rearm();
        assert_eq!(press_mic(&gate, &tx), MicPress::Sent);
    }

    #[test]
    fn undelivered_press_rearms_gate() {
        let gate = TriggerGate::new();
        let (tx, rx) = mpsc::channel(1);
        drop(rx);

        assert_eq!(press_mic(&gate, &tx), MicPress::Dropped);
        assert!(gate.is_armed());
    }

    #[test]
    fn result_line_prefers_spoken_text() {
        let ok = DispatchResult::success(Some("Opening calculator".into()));
        assert_eq!(result_line(&ok), "Opening calculator");

        let quiet = DispatchResult::success(None);
        assert_eq!(result_line(&quiet), "Done");

        let failed = DispatchResult::failure(ErrorKind::ProviderFailure, None);
        assert_eq!(result_line(&failed), "Failed (ProviderFailure)");
    }

    #[test]
    fn snapshot_copies_shared_state() {
        let state = new_shared_state();
        {
            let mut st = state.lock().unwrap();
            st.last_utterance = Some("what time is it".into());
            st.last_intent = Some(Intent::Time);
        }
        let snap = Snapshot::take(&state);
        assert_eq!(snap.phase, CyclePhase::Idle);
        assert_eq!(snap.intent, Some(Intent::Time));
        assert_eq!(snap.utterance.as_deref(), Some("what time is it"));
        assert!(snap.result.is_none());
    }
}
