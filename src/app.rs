use crate::event::AppEvent;
use crate::gemini::{split_data_uri, GeminiClient, GenerationPayload};
use crate::keystore::{self, KeyStore};
use crate::panel::{Panel, PanelPhase, RequestKind};
use crate::router::ViewRouter;
use crate::theme::Theme;
use base64::Engine;
use eframe::egui::{self, Color32, RichText, ScrollArea};
use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::warn;

const LANGUAGE_OPTIONS: [&str; 3] = ["Vietnamese", "English", "Spanish"];
const STYLE_OPTIONS: [&str; 4] = ["Dark/Mystery", "Cinematic", "Documentary", "Minimalist"];

/// Decoded evidence image, cached so the data URI is only base64-decoded once
/// per result. The `loader_uri` keys egui's byte loader and must change when
/// the payload does.
struct EvidenceView {
    data_uri: String,
    loader_uri: String,
    mime: String,
    bytes: Vec<u8>,
}

pub struct CasedeskApp {
    rx: Receiver<AppEvent>,
    gemini: GeminiClient,
    keystore: KeyStore,
    api_key: String,
    router: ViewRouter,
    panels: [Panel; 5],
    theme: Theme,
    evidence: Option<EvidenceView>,
    evidence_seq: u64,
    save_notice: Option<String>,
    key_save_error: Option<String>,
}

impl CasedeskApp {
    pub fn new(rx: Receiver<AppEvent>, gemini: GeminiClient, keystore: KeyStore) -> Self {
        let api_key = keystore.load();
        let router = ViewRouter::new(keystore::is_present(&api_key));
        Self {
            rx,
            gemini,
            keystore,
            api_key,
            router,
            panels: RequestKind::ALL.map(Panel::new),
            theme: Theme::default(),
            evidence: None,
            evidence_seq: 0,
            save_notice: None,
            key_save_error: None,
        }
    }

    fn timestamp() -> u64 {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(duration) => duration.as_secs(),
            Err(_) => 0,
        }
    }

    fn drain_events(&mut self) {
        loop {
            match self.rx.try_recv() {
                Ok(AppEvent::GenerationFinished { kind, outcome }) => {
                    self.panels[kind.index()].finish(outcome);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    warn!("generation event channel disconnected");
                    break;
                }
            }
        }
    }

    fn persist_key(&mut self) {
        match self.keystore.save(&self.api_key) {
            Ok(()) => self.key_save_error = None,
            Err(err) => {
                warn!("failed to persist API key: {err}");
                self.key_save_error = Some(format!("Could not save key: {err}"));
            }
        }
    }

    fn submit_active(&mut self) {
        let kind = self.router.active();
        let api_key = self.api_key.clone();
        let gemini = self.gemini.clone();
        self.save_notice = None;
        self.panels[kind.index()].submit(&api_key, &gemini);
    }

    /// Keep the decoded-image cache in sync with the active image result.
    fn refresh_evidence(&mut self) {
        let phase = self.panels[RequestKind::EvidenceImage.index()].phase();
        let data_uri = match phase {
            PanelPhase::Succeeded(GenerationPayload::Image { data_uri }) => data_uri.clone(),
            _ => {
                self.evidence = None;
                return;
            }
        };

        if self
            .evidence
            .as_ref()
            .is_some_and(|view| view.data_uri == data_uri)
        {
            return;
        }

        let Some((mime, payload)) = split_data_uri(&data_uri) else {
            warn!("image result is not a data URI");
            self.evidence = None;
            return;
        };
        let mime = mime.to_string();
        let decoded = base64::engine::general_purpose::STANDARD.decode(payload);
        match decoded {
            Ok(bytes) => {
                self.evidence_seq += 1;
                self.evidence = Some(EvidenceView {
                    mime,
                    loader_uri: format!("bytes://evidence-{}", self.evidence_seq),
                    bytes,
                    data_uri,
                });
            }
            Err(err) => {
                warn!("image payload failed to decode: {err}");
                self.evidence = None;
            }
        }
    }

    fn save_evidence(&mut self) {
        let Some(view) = &self.evidence else {
            return;
        };
        let extension = if view.mime == "image/jpeg" { "jpg" } else { "png" };
        let file_name = format!("evidence-{}.{extension}", Self::timestamp());
        match std::fs::write(&file_name, &view.bytes) {
            Ok(()) => self.save_notice = Some(format!("Saved {file_name}")),
            Err(err) => {
                warn!("failed to save evidence image: {err}");
                self.save_notice = Some(format!("Save failed: {err}"));
            }
        }
    }

    fn render_top_bar(&mut self, ctx: &egui::Context) {
        let theme = self.theme.clone();
        egui::TopBottomPanel::top("top_bar")
            .frame(theme.panel_frame(theme.surface_2, theme.spacing_12 as i8))
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.strong(
                        RichText::new("CASEDESK")
                            .color(theme.accent_primary)
                            .size(17.0),
                    );
                    ui.label(RichText::new("CRIMINAL MIND MASTER").strong());
                    ui.label(
                        RichText::new("BEHAVIORAL PROFILING STUDIO")
                            .small()
                            .color(theme.text_muted),
                    );

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("Config").clicked() {
                            self.router.open_settings();
                        }
                        let (badge, color) = if keystore::is_present(&self.api_key) {
                            ("LINKED", theme.success)
                        } else {
                            ("MISSING", theme.danger)
                        };
                        ui.label(RichText::new(badge).small().strong().color(color));
                        ui.label(RichText::new("KEY").small().color(theme.text_muted));
                    });
                });
            });
    }

    fn render_sidebar(&mut self, ctx: &egui::Context) {
        let theme = self.theme.clone();
        egui::SidePanel::left("persona_panel")
            .resizable(false)
            .default_width(220.0)
            .show(ctx, |ui| {
                ui.add_space(theme.spacing_8);
                let mut clicked = None;
                for kind in RequestKind::ALL {
                    let active = self.router.active() == kind;
                    let fill = if active {
                        theme.surface_3
                    } else {
                        Color32::TRANSPARENT
                    };
                    let text_color = if active {
                        theme.accent_primary
                    } else {
                        theme.text_muted
                    };
                    let button = egui::Button::new(
                        RichText::new(kind.label()).strong().color(text_color),
                    )
                    .fill(fill)
                    .min_size(egui::vec2(ui.available_width(), 34.0));
                    if ui.add(button).clicked() {
                        clicked = Some(kind);
                    }
                    ui.label(RichText::new(kind.subtitle()).small().color(theme.text_muted));
                    ui.add_space(theme.spacing_8);
                }
                if let Some(kind) = clicked {
                    self.router.select(kind);
                }
            });
    }

    fn render_settings_window(&mut self, ctx: &egui::Context) {
        if !self.router.settings_open() {
            return;
        }

        let theme = self.theme.clone();
        let mut open = true;
        let mut close_clicked = false;
        egui::Window::new("EVIDENCE LOCKER")
            .open(&mut open)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.label(
                    RichText::new("ACCESS KEY")
                        .small()
                        .strong()
                        .color(theme.text_muted),
                );
                ui.hyperlink_to(
                    "Get Gemini API Key",
                    "https://aistudio.google.com/app/api-keys",
                );
                ui.add_space(theme.spacing_8);

                ui.label("Enter Gemini API Key");
                let response = ui.add(
                    egui::TextEdit::singleline(&mut self.api_key)
                        .password(true)
                        .desired_width(320.0)
                        .hint_text("AIzaSy..."),
                );
                if response.changed() {
                    self.persist_key();
                }

                if let Some(message) = &self.key_save_error {
                    ui.colored_label(theme.danger, message);
                }

                ui.add_space(theme.spacing_8);
                if ui.button("SAVE & CLOSE").clicked() {
                    close_clicked = true;
                }
            });

        if close_clicked || !open {
            self.persist_key();
            self.router.close_settings();
        }
    }

    fn render_active_panel(&mut self, ctx: &egui::Context) {
        let theme = self.theme.clone();
        let kind = self.router.active();
        let mut submit = false;
        let mut discard = false;
        let mut save_image = false;

        egui::CentralPanel::default().show(ctx, |ui| {
            let panel = &mut self.panels[kind.index()];

            theme.card_frame().show(ui, |ui| {
                ui.heading(kind.heading());
                ui.add_space(theme.spacing_8);

                ui.label(
                    RichText::new("TOPIC")
                        .small()
                        .strong()
                        .color(theme.text_muted),
                );
                ui.add(
                    egui::TextEdit::singleline(&mut panel.form.topic)
                        .desired_width(f32::INFINITY)
                        .hint_text(kind.topic_hint()),
                );

                if kind == RequestKind::ScriptConstruction {
                    ui.add_space(theme.spacing_8);
                    ui.horizontal(|ui| {
                        ui.label(
                            RichText::new("DURATION (MIN)")
                                .small()
                                .strong()
                                .color(theme.text_muted),
                        );
                        ui.add(
                            egui::DragValue::new(&mut panel.form.duration_minutes)
                                .speed(0.5)
                                .range(0.5..=60.0),
                        );
                        ui.label(
                            RichText::new(format!(
                                "Scenes (8s/shot): ~{}   Words: ~{}",
                                panel.form.estimated_scenes(),
                                panel.form.estimated_words()
                            ))
                            .small()
                            .color(theme.text_muted),
                        );
                    });
                    ui.horizontal(|ui| {
                        ui.label(
                            RichText::new("TARGET LANGUAGE")
                                .small()
                                .strong()
                                .color(theme.text_muted),
                        );
                        egui::ComboBox::from_id_salt("script_language")
                            .selected_text(panel.form.language.clone())
                            .show_ui(ui, |ui| {
                                for option in LANGUAGE_OPTIONS {
                                    ui.selectable_value(
                                        &mut panel.form.language,
                                        option.to_string(),
                                        option,
                                    );
                                }
                            });
                        ui.label(
                            RichText::new("VISUAL STYLE")
                                .small()
                                .strong()
                                .color(theme.text_muted),
                        );
                        egui::ComboBox::from_id_salt("script_style")
                            .selected_text(panel.form.style.clone())
                            .show_ui(ui, |ui| {
                                for option in STYLE_OPTIONS {
                                    ui.selectable_value(
                                        &mut panel.form.style,
                                        option.to_string(),
                                        option,
                                    );
                                }
                            });
                    });
                }

                ui.add_space(theme.spacing_8);
                ui.horizontal(|ui| {
                    let trigger = ui.add_enabled(
                        panel.can_submit(),
                        egui::Button::new(RichText::new(kind.submit_label()).strong()),
                    );
                    if trigger.clicked() {
                        submit = true;
                    }
                    if panel.is_pending() {
                        ui.add(egui::Spinner::new().color(theme.accent_primary));
                    }
                    if ui.button("Clear Input").clicked() {
                        panel.form.topic.clear();
                    }
                    if matches!(
                        panel.phase(),
                        PanelPhase::Succeeded(_) | PanelPhase::Failed(_)
                    ) && ui.button("Discard Result").clicked()
                    {
                        discard = true;
                    }
                });
            });

            ui.add_space(theme.spacing_8);

            theme.result_frame().show(ui, |ui| {
                ui.set_min_height(240.0);
                match self.panels[kind.index()].phase().clone() {
                    PanelPhase::Idle => {
                        ui.centered_and_justified(|ui| {
                            ui.label(
                                RichText::new("Awaiting instructions.").color(theme.text_muted),
                            );
                        });
                    }
                    PanelPhase::Pending => {
                        ui.centered_and_justified(|ui| {
                            ui.vertical_centered(|ui| {
                                ui.add(egui::Spinner::new().color(theme.accent_primary));
                                ui.label(
                                    RichText::new("Processing evidence...")
                                        .color(theme.text_muted),
                                );
                            });
                        });
                    }
                    PanelPhase::Failed(message) => {
                        ui.colored_label(theme.danger, message);
                    }
                    PanelPhase::Succeeded(GenerationPayload::Text(text)) => {
                        ScrollArea::vertical()
                            .id_salt("result_text")
                            .max_height(ui.available_height())
                            .show(ui, |ui| {
                                ui.label(RichText::new(text).monospace());
                            });
                    }
                    PanelPhase::Succeeded(GenerationPayload::Image { .. }) => {
                        match &self.evidence {
                            Some(view) => {
                                ScrollArea::vertical().id_salt("result_image").show(ui, |ui| {
                                    ui.add(
                                        egui::Image::from_bytes(
                                            view.loader_uri.clone(),
                                            view.bytes.clone(),
                                        )
                                        .max_width(ui.available_width()),
                                    );
                                    if ui.button("Save Evidence").clicked() {
                                        save_image = true;
                                    }
                                    if let Some(notice) = &self.save_notice {
                                        ui.label(
                                            RichText::new(notice).small().color(theme.text_muted),
                                        );
                                    }
                                });
                            }
                            None => {
                                ui.colored_label(theme.danger, "Image payload could not be decoded.");
                            }
                        }
                    }
                }
            });
        });

        if submit {
            self.submit_active();
        }
        if discard {
            self.panels[kind.index()].reset();
            self.save_notice = None;
        }
        if save_image {
            self.save_evidence();
        }
    }
}

impl eframe::App for CasedeskApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_events();
        self.refresh_evidence();
        self.render_top_bar(ctx);
        self.render_sidebar(ctx);
        self.render_settings_window(ctx);
        self.render_active_panel(ctx);

        // Completions arrive on a plain channel; poll while any call is out.
        if self.panels.iter().any(Panel::is_pending) {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }
}
