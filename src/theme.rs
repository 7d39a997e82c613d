use eframe::egui::{self, Color32, CornerRadius, FontId, Frame, Margin, Stroke, TextStyle};

/// Noir palette for the investigation desk: near-black surfaces, blood-red
/// accents, desaturated slate text.
#[derive(Debug, Clone)]
pub struct Theme {
    pub surface_0: Color32,
    pub surface_1: Color32,
    pub surface_2: Color32,
    pub surface_3: Color32,
    pub accent_primary: Color32,
    pub accent_muted: Color32,
    pub success: Color32,
    pub danger: Color32,
    pub text_primary: Color32,
    pub text_muted: Color32,
    pub border_subtle: Color32,
    pub spacing_8: f32,
    pub spacing_12: f32,
    pub spacing_16: f32,
    pub radius_8: u8,
    pub radius_12: u8,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            surface_0: Color32::from_rgb(0x0A, 0x0A, 0x0A),
            surface_1: Color32::from_rgb(0x0F, 0x0F, 0x11),
            surface_2: Color32::from_rgb(0x1A, 0x05, 0x05),
            surface_3: Color32::from_rgb(0x26, 0x0A, 0x0A),
            accent_primary: Color32::from_rgb(0xEF, 0x44, 0x44),
            accent_muted: Color32::from_rgb(0x7F, 0x1D, 0x1D),
            success: Color32::from_rgb(0x22, 0xC5, 0x5E),
            danger: Color32::from_rgb(0xEF, 0x44, 0x44),
            text_primary: Color32::from_rgb(0xE2, 0xE8, 0xF0),
            text_muted: Color32::from_rgb(0x8B, 0x94, 0x9E),
            border_subtle: Color32::from_rgba_premultiplied(255, 255, 255, 13),
            spacing_8: 8.0,
            spacing_12: 12.0,
            spacing_16: 16.0,
            radius_8: 8,
            radius_12: 12,
        }
    }
}

impl Theme {
    pub fn apply_visuals(&self, ctx: &egui::Context) {
        let mut visuals = egui::Visuals::dark();
        visuals.panel_fill = self.surface_0;
        visuals.override_text_color = Some(self.text_primary);
        visuals.widgets.noninteractive.fg_stroke.color = self.text_primary;
        visuals.widgets.noninteractive.bg_fill = self.surface_1;
        visuals.widgets.noninteractive.weak_bg_fill = self.surface_1;
        visuals.widgets.noninteractive.bg_stroke = Stroke::new(1.0, self.border_subtle);
        visuals.widgets.inactive.bg_fill = self.surface_2;
        visuals.widgets.inactive.fg_stroke.color = self.text_primary;
        visuals.widgets.inactive.bg_stroke = Stroke::NONE;
        visuals.widgets.hovered.bg_fill = self.surface_3;
        visuals.widgets.hovered.bg_stroke = Stroke::NONE;
        visuals.widgets.hovered.fg_stroke.color = self.text_primary;
        visuals.widgets.active.bg_fill = self.accent_muted;
        visuals.widgets.active.bg_stroke = Stroke::NONE;
        visuals.widgets.active.fg_stroke.color = self.text_primary;
        visuals.widgets.open.bg_fill = self.surface_3;
        visuals.widgets.open.bg_stroke = Stroke::NONE;
        visuals.selection.bg_fill = self.accent_muted;
        visuals.hyperlink_color = self.accent_primary;
        visuals.window_fill = self.surface_2;
        visuals.window_stroke = Stroke::new(1.0, self.border_subtle);
        visuals.window_corner_radius = CornerRadius::same(self.radius_12);
        visuals.window_shadow = egui::epaint::Shadow {
            offset: [0, 8],
            blur: 24,
            spread: 0,
            color: Color32::from_rgba_premultiplied(0, 0, 0, 64),
        };
        let mut style = (*ctx.style()).clone();
        style.visuals = visuals;
        style.spacing.item_spacing = egui::vec2(10.0, 10.0);
        style.spacing.button_padding = egui::vec2(12.0, 8.0);
        style.text_styles.insert(TextStyle::Heading, FontId::proportional(17.0));
        style.text_styles.insert(TextStyle::Body, FontId::proportional(14.0));
        style.text_styles.insert(TextStyle::Monospace, FontId::monospace(13.0));
        style.text_styles.insert(TextStyle::Small, FontId::proportional(12.0));
        ctx.set_style(style);
    }

    pub fn panel_frame(&self, fill: Color32, inner_padding: i8) -> Frame {
        Frame::new()
            .fill(fill)
            .inner_margin(Margin::same(inner_padding))
            .corner_radius(CornerRadius::same(self.radius_12))
            .stroke(Stroke::new(1.0, self.border_subtle))
    }

    pub fn card_frame(&self) -> Frame {
        self.panel_frame(self.surface_1, self.spacing_16 as i8)
    }

    pub fn result_frame(&self) -> Frame {
        self.panel_frame(self.surface_0, self.spacing_12 as i8)
    }
}
